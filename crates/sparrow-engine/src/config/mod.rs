pub mod loader;
pub mod schema;

pub use loader::{ConfigError, ConfigLoader};
pub use schema::{CommenterConfig, FilesConfig, SiteConfig, SparrowConfig, TimingConfig};
