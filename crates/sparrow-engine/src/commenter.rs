//! AI comment generation against an OpenAI-compatible endpoint.
//!
//! One bounded call per article, no retries: a failed generation only
//! means the article is harvested without a comment.

use crate::config::CommenterConfig;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

const SYSTEM_PROMPT: &str = "\
你是一位热爱在知识社区分享见解的深度读者，评论风格真诚、有洞察力。\
请为下面的文章撰写一条大约100-150字的精选评论：\
必须引用或转述文章中的一个具体观点作为起点，分享由它触发的个人联想或疑问，\
禁止使用“写得真好”“学到了”“感谢分享”这类空洞的套话。";

/// Placeholder recorded when no comment could be generated.
pub const NO_COMMENT: &str = "未生成评论";

#[derive(Error, Debug)]
pub enum CommentError {
    #[error("API key not set (expected in ${0})")]
    MissingApiKey(String),

    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Malformed response: {0}")]
    Malformed(String),
}

/// Seam for scenarios: anything that can turn an article into a comment.
#[async_trait]
pub trait CommentSource: Send + Sync {
    async fn generate(&self, title: &str, excerpt: &str) -> Result<String, CommentError>;
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    stream: bool,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: String,
}

pub struct CommentClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl CommentClient {
    /// Build a client from config, reading the key from the configured
    /// environment variable.
    pub fn from_config(config: &CommenterConfig) -> Result<Self, CommentError> {
        let api_key = std::env::var(&config.api_key_env)
            .map_err(|_| CommentError::MissingApiKey(config.api_key_env.clone()))?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self {
            http,
            endpoint: format!("{}/chat/completions", config.api_base.trim_end_matches('/')),
            api_key,
            model: config.model.clone(),
        })
    }

    /// Char-safe excerpt of the article body used as generation context.
    pub fn excerpt(content: &str, max_chars: usize) -> String {
        content.chars().take(max_chars).collect()
    }
}

#[async_trait]
impl CommentSource for CommentClient {
    async fn generate(&self, title: &str, excerpt: &str) -> Result<String, CommentError> {
        let user_prompt = format!("文章标题：《{title}》\n核心内容：{excerpt}");
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                Message {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                Message {
                    role: "user",
                    content: &user_prompt,
                },
            ],
            stream: false,
            max_tokens: 512,
            temperature: 0.8,
        };

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?
            .error_for_status()?;

        let body: ChatResponse = response.json().await?;
        let comment = body
            .choices
            .first()
            .map(|c| c.message.content.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or_else(|| CommentError::Malformed("empty choices".into()))?;
        Ok(comment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn excerpt_respects_char_boundaries() {
        let text = "一二三四五";
        assert_eq!(CommentClient::excerpt(text, 3), "一二三");
        assert_eq!(CommentClient::excerpt(text, 50), text);
    }
}
