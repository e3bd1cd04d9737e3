//! Chromium driver for the automation engine, built on the DevTools
//! protocol via `chromiumoxide`.

pub mod backend;
pub mod cdp;

pub use backend::HeadlessBackend;
