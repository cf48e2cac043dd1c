//! LLM client for schema refinement

use crate::config::{LLMProvider, RefineConfig};
use crate::refine::{RefineError, RefineResult};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_SYSTEM_PROMPT: &str = "You are an expert in knowledge graph schema design.";

pub struct LLMClient {
    client: Client,
    config: RefineConfig,
    api_base_url: String,
}

impl LLMClient {
    pub fn new(config: &RefineConfig) -> RefineResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| RefineError::ConfigError(e.to_string()))?;

        let api_base_url = config.api_base_url.clone().unwrap_or_else(|| {
            match config.provider {
                LLMProvider::OpenAI => "https://api.openai.com/v1".to_string(),
                LLMProvider::Ollama => "http://localhost:11434".to_string(),
                LLMProvider::Gemini => "https://generativelanguage.googleapis.com/v1beta".to_string(),
                LLMProvider::Mock => String::new(),
            }
        });

        let mut config = config.clone();
        if config.api_key.is_none() {
            config.api_key = match config.provider {
                LLMProvider::OpenAI => std::env::var("OPENAI_API_KEY").ok(),
                LLMProvider::Gemini => std::env::var("GEMINI_API_KEY").ok(),
                _ => None,
            };
        }

        Ok(Self {
            client,
            config,
            api_base_url,
        })
    }

    pub fn provider(&self) -> LLMProvider {
        self.config.provider
    }

    /// Send a prompt and return the model's text unchanged
    pub async fn generate(&self, prompt: &str) -> RefineResult<String> {
        match self.config.provider {
            LLMProvider::OpenAI => self.openai_chat(prompt).await,
            LLMProvider::Ollama => self.ollama_chat(prompt).await,
            LLMProvider::Gemini => self.gemini_chat(prompt).await,
            // Echo, so callers can see exactly what would have been sent
            LLMProvider::Mock => Ok(prompt.to_string()),
        }
    }

    fn system_prompt(&self) -> String {
        self.config
            .system_prompt
            .clone()
            .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string())
    }

    async fn openai_chat(&self, prompt: &str) -> RefineResult<String> {
        #[derive(Serialize)]
        struct Message {
            role: String,
            content: String,
        }

        #[derive(Serialize)]
        struct Request<'a> {
            model: &'a str,
            messages: Vec<Message>,
            #[serde(skip_serializing_if = "Option::is_none")]
            temperature: Option<f32>,
        }

        #[derive(Deserialize)]
        struct Response {
            choices: Vec<Choice>,
        }

        #[derive(Deserialize)]
        struct Choice {
            message: MessageContent,
        }

        #[derive(Deserialize)]
        struct MessageContent {
            content: String,
        }

        let api_key = self.config.api_key.as_ref().ok_or_else(|| RefineError::ConfigError("OpenAI requires API key".to_string()))?;

        let url = format!("{}/chat/completions", self.api_base_url);
        let resp = self.client.post(&url)
            .header("Authorization", format!("Bearer {}", api_key))
            .json(&Request {
                model: &self.config.model,
                messages: vec![
                    Message { role: "system".to_string(), content: self.system_prompt() },
                    Message { role: "user".to_string(), content: prompt.to_string() },
                ],
                temperature: self.config.temperature,
            })
            .send()
            .await
            .map_err(|e| RefineError::NetworkError(e.without_url().to_string()))?;

        if !resp.status().is_success() {
            return Err(RefineError::ApiError(format!("OpenAI error: {}", resp.status())));
        }

        let result: Response = resp.json().await.map_err(|e| RefineError::SerializationError(e.without_url().to_string()))?;
        Ok(result.choices.first().map(|c| c.message.content.clone()).unwrap_or_default())
    }

    async fn ollama_chat(&self, prompt: &str) -> RefineResult<String> {
        #[derive(Serialize)]
        struct Options {
            temperature: f32,
        }

        #[derive(Serialize)]
        struct Request<'a> {
            model: &'a str,
            prompt: String,
            system: String,
            stream: bool,
            #[serde(skip_serializing_if = "Option::is_none")]
            options: Option<Options>,
        }

        #[derive(Deserialize)]
        struct Response {
            response: String,
        }

        let url = format!("{}/api/generate", self.api_base_url);
        let resp = self.client.post(&url)
            .json(&Request {
                model: &self.config.model,
                prompt: prompt.to_string(),
                system: self.system_prompt(),
                stream: false,
                options: self.config.temperature.map(|temperature| Options { temperature }),
            })
            .send()
            .await
            .map_err(|e| RefineError::NetworkError(e.without_url().to_string()))?;

        if !resp.status().is_success() {
            return Err(RefineError::ApiError(format!("Ollama error: {}", resp.status())));
        }

        let result: Response = resp.json().await.map_err(|e| RefineError::SerializationError(e.without_url().to_string()))?;
        Ok(result.response)
    }

    async fn gemini_chat(&self, prompt: &str) -> RefineResult<String> {
        #[derive(Serialize)]
        struct Request {
            contents: Vec<Content>,
            #[serde(rename = "generationConfig", skip_serializing_if = "Option::is_none")]
            generation_config: Option<GenerationConfig>,
        }

        #[derive(Serialize, Deserialize)]
        struct Content {
            role: Option<String>,
            parts: Vec<Part>,
        }

        #[derive(Serialize, Deserialize)]
        struct Part {
            text: String,
        }

        #[derive(Serialize)]
        struct GenerationConfig {
            temperature: f32,
        }

        #[derive(Deserialize)]
        struct Response {
            candidates: Option<Vec<Candidate>>,
        }

        #[derive(Deserialize)]
        struct Candidate {
            content: Content,
        }

        let api_key = self.config.api_key.as_ref().ok_or_else(|| RefineError::ConfigError("Gemini requires API key".to_string()))?;

        // No system role on this endpoint; prepend the instruction instead
        let full_prompt = format!("{}\n\n{}", self.system_prompt(), prompt);

        let url = format!("{}/models/{}:generateContent", self.api_base_url, self.config.model);

        // Key travels in a header so it never shows up in error URLs
        let resp = self.client.post(&url)
            .header("x-goog-api-key", api_key)
            .json(&Request {
                contents: vec![
                    Content {
                        role: Some("user".to_string()),
                        parts: vec![Part { text: full_prompt }],
                    }
                ],
                generation_config: self.config.temperature.map(|temperature| GenerationConfig { temperature }),
            })
            .send()
            .await
            .map_err(|e| RefineError::NetworkError(e.without_url().to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let detail = match resp.text().await {
                Ok(body) if !body.is_empty() => body,
                Ok(_) => "empty response body".to_string(),
                Err(e) => format!("unreadable response body: {}", e.without_url()),
            };
            return Err(RefineError::ApiError(format!("Gemini error: {} {}", status, detail)));
        }

        let result: Response = resp.json().await.map_err(|e| RefineError::SerializationError(e.without_url().to_string()))?;

        // Multi-part answers are joined rather than truncated to the first part
        let text = result
            .candidates
            .and_then(|c| c.into_iter().next())
            .map(|c| {
                c.content
                    .parts
                    .into_iter()
                    .map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_base_urls() {
        let gemini = LLMClient::new(&RefineConfig::default()).unwrap();
        assert_eq!(gemini.api_base_url, "https://generativelanguage.googleapis.com/v1beta");

        let ollama = LLMClient::new(&RefineConfig {
            provider: LLMProvider::Ollama,
            ..Default::default()
        })
        .unwrap();
        assert_eq!(ollama.api_base_url, "http://localhost:11434");

        let custom = LLMClient::new(&RefineConfig {
            provider: LLMProvider::OpenAI,
            api_base_url: Some("http://proxy.local/v1".to_string()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(custom.api_base_url, "http://proxy.local/v1");
    }

    #[tokio::test]
    async fn test_mock_echoes_prompt() {
        let client = LLMClient::new(&RefineConfig {
            provider: LLMProvider::Mock,
            ..Default::default()
        })
        .unwrap();
        assert_eq!(client.generate("hello").await.unwrap(), "hello");
    }

    #[tokio::test]
    async fn test_openai_without_key_is_config_error() {
        let client = LLMClient::new(&RefineConfig {
            provider: LLMProvider::OpenAI,
            model: "gpt-4o".to_string(),
            api_key: None,
            ..Default::default()
        })
        .unwrap();
        if client.config.api_key.is_some() {
            // OPENAI_API_KEY is set in this environment
            return;
        }
        assert!(matches!(
            client.generate("hello").await,
            Err(RefineError::ConfigError(_))
        ));
    }

    #[tokio::test]
    async fn test_gemini_network_error_hides_api_key() {
        let client = LLMClient::new(&RefineConfig {
            provider: LLMProvider::Gemini,
            api_key: Some("SECRET-KEY-123".to_string()),
            api_base_url: Some("http://127.0.0.1:1".to_string()),
            ..Default::default()
        })
        .unwrap();

        let err = client.generate("hi").await.unwrap_err();
        assert!(matches!(err, RefineError::NetworkError(_)));
        assert!(!err.to_string().contains("SECRET-KEY-123"));
    }

    /// Accept one request, answer with `status_line` and an empty body,
    /// and hand back the raw request text
    async fn serve_once(status_line: &'static str) -> (String, tokio::task::JoinHandle<String>) {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            let mut chunk = [0u8; 4096];
            loop {
                let n = socket.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                buf.extend_from_slice(&chunk[..n]);
                let text = String::from_utf8_lossy(&buf).to_ascii_lowercase();
                if let Some(end) = text.find("\r\n\r\n") {
                    let length = text[..end]
                        .lines()
                        .find_map(|l| l.strip_prefix("content-length:"))
                        .map(|v| v.trim().parse::<usize>().unwrap())
                        .unwrap_or(0);
                    if buf.len() >= end + 4 + length {
                        break;
                    }
                }
            }
            let response = format!("{status_line}\r\ncontent-length: 0\r\nconnection: close\r\n\r\n");
            socket.write_all(response.as_bytes()).await.unwrap();
            String::from_utf8_lossy(&buf).into_owned()
        });
        (base, handle)
    }

    #[tokio::test]
    async fn test_gemini_failure_reports_status() {
        let (base, server) = serve_once("HTTP/1.1 500 Internal Server Error").await;
        let client = LLMClient::new(&RefineConfig {
            provider: LLMProvider::Gemini,
            api_key: Some("SECRET-KEY-123".to_string()),
            api_base_url: Some(base),
            ..Default::default()
        })
        .unwrap();

        let err = client.generate("hi").await.unwrap_err().to_string();
        assert!(err.contains("500"), "{err}");
        assert!(!err.contains("SECRET-KEY-123"));

        let request = server.await.unwrap();
        let request_line = request.lines().next().unwrap();
        assert!(request_line.starts_with("POST /models/gemini-1.5-flash:generateContent "));
        assert!(!request_line.contains("key="));
        assert!(request.to_ascii_lowercase().contains("x-goog-api-key: secret-key-123"));
    }
}
