use crate::{ChatSession, SessionConfig, SessionConnector};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use shared::settings::ProviderAuth;
use std::env;
use std::sync::Arc;
use std::time::Duration;

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Environment variables checked, in order, when settings carry no key
const KEY_VARS: [&str; 2] = ["API_KEY", "GEMINI_API_KEY"];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<GeminiPart>,
}

impl GeminiContent {
    fn text(role: Option<&str>, text: &str) -> Self {
        Self {
            role: role.map(str::to_string),
            parts: vec![GeminiPart {
                text: text.to_string(),
            }],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct GeminiPart {
    text: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct GeminiRequest<'a> {
    contents: &'a [GeminiContent],
    system_instruction: GeminiContent,
    generation_config: GenerationConfig,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidateContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiCandidateContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

impl GeminiResponse {
    /// Concatenated text of the first candidate
    fn reply_text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|c| c.parts.iter().map(|p| p.text.as_str()).collect())
            .unwrap_or_default()
    }
}

/// Pick the API key: settings first, then the environment
fn resolve_key(auth: &ProviderAuth, lookup: impl Fn(&str) -> Option<String>) -> Option<String> {
    auth.api_key
        .clone()
        .filter(|k| !k.trim().is_empty())
        .or_else(|| {
            KEY_VARS
                .iter()
                .filter_map(|var| lookup(var))
                .find(|k| !k.trim().is_empty())
        })
}

/// Opens [`GeminiSession`]s with the configured credential
pub struct GeminiConnector {
    auth: ProviderAuth,
}

impl GeminiConnector {
    pub fn new(auth: ProviderAuth) -> Self {
        Self { auth }
    }
}

impl SessionConnector for GeminiConnector {
    fn open(&self, config: &SessionConfig) -> Result<Arc<dyn ChatSession>> {
        let key = resolve_key(&self.auth, |var| env::var(var).ok())
            .ok_or_else(|| anyhow!("No Gemini API key configured (settings, API_KEY or GEMINI_API_KEY)"))?;
        Ok(Arc::new(GeminiSession::new(config.clone(), key)?))
    }
}

/// Multi-turn chat against `generateContent`. History lives client side.
pub struct GeminiSession {
    http: Client,
    base_url: String,
    auth_token: String,
    config: SessionConfig,
    history: Mutex<Vec<GeminiContent>>,
}

impl GeminiSession {
    pub fn new(config: SessionConfig, auth_token: String) -> Result<Self> {
        Ok(Self {
            http: Client::builder().timeout(Duration::from_secs(45)).build()?,
            base_url: API_BASE.to_string(),
            auth_token,
            config,
            history: Mutex::new(Vec::new()),
        })
    }

    /// Number of recorded turns (user and model)
    pub fn history_len(&self) -> usize {
        self.history.lock().len()
    }

    fn build_contents(&self, message: &str) -> Vec<GeminiContent> {
        let mut contents = self.history.lock().clone();
        contents.push(GeminiContent::text(Some("user"), message));
        contents
    }
}

#[async_trait]
impl ChatSession for GeminiSession {
    async fn send_message(&self, message: &str) -> Result<String> {
        let url = format!("{}/{}:generateContent", self.base_url, self.config.model);
        let contents = self.build_contents(message);
        let req = GeminiRequest {
            contents: &contents,
            system_instruction: GeminiContent::text(None, &self.config.system_instruction),
            generation_config: GenerationConfig {
                temperature: self.config.temperature,
            },
        };

        // the key travels in a header so transport errors never carry it
        let resp = self
            .http
            .post(url)
            .header("x-goog-api-key", self.auth_token.as_str())
            .json(&req)
            .send()
            .await
            .map_err(reqwest::Error::without_url)?;
        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            let body = body.trim();
            if body.is_empty() {
                return Err(anyhow!("gemini error: {}", status));
            }
            let body: String = body.chars().take(800).collect();
            return Err(anyhow!("gemini error: {}\n{}", status, body));
        }

        let body: GeminiResponse = resp.json().await.map_err(reqwest::Error::without_url)?;
        let text = body.reply_text();
        if text.trim().is_empty() {
            return Err(anyhow!("gemini returned an empty reply"));
        }

        let mut history = self.history.lock();
        history.push(GeminiContent::text(Some("user"), message));
        history.push(GeminiContent::text(Some("model"), &text));
        tracing::debug!(turns = history.len(), "gemini session history updated");
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SessionConfig {
        SessionConfig {
            model: "gemini-2.5-flash".into(),
            system_instruction: "be brief".into(),
            temperature: 0.7,
        }
    }

    #[test]
    fn test_settings_key_wins_over_env() {
        let auth = ProviderAuth {
            api_key: Some("from-settings".into()),
        };
        let key = resolve_key(&auth, |_| Some("from-env".into()));
        assert_eq!(key.as_deref(), Some("from-settings"));
    }

    #[test]
    fn test_env_lookup_order() {
        let auth = ProviderAuth { api_key: None };
        let key = resolve_key(&auth, |var| match var {
            "API_KEY" => Some("primary".into()),
            "GEMINI_API_KEY" => Some("secondary".into()),
            _ => None,
        });
        assert_eq!(key.as_deref(), Some("primary"));

        let key = resolve_key(&auth, |var| (var == "GEMINI_API_KEY").then(|| "secondary".into()));
        assert_eq!(key.as_deref(), Some("secondary"));
    }

    #[test]
    fn test_blank_keys_are_ignored() {
        let auth = ProviderAuth {
            api_key: Some("  ".into()),
        };
        assert!(resolve_key(&auth, |_| Some(String::new())).is_none());
    }

    #[test]
    fn test_request_body_shape() {
        let session = GeminiSession::new(config(), "k".into()).unwrap();
        let contents = session.build_contents("hello");
        let req = GeminiRequest {
            contents: &contents,
            system_instruction: GeminiContent::text(None, "be brief"),
            generation_config: GenerationConfig { temperature: 0.7 },
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["contents"][0]["role"], "user");
        assert_eq!(json["contents"][0]["parts"][0]["text"], "hello");
        assert_eq!(json["system_instruction"]["parts"][0]["text"], "be brief");
        assert!(json["system_instruction"].get("role").is_none());
        assert!((json["generation_config"]["temperature"].as_f64().unwrap() - 0.7).abs() < 1e-6);
        assert_eq!(session.history_len(), 0);
    }

    #[test]
    fn test_reply_text_joins_parts() {
        let body: GeminiResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"好的 "},{"text":"[VIEW:CAD]"}]}}]}"#,
        )
        .unwrap();
        assert_eq!(body.reply_text(), "好的 [VIEW:CAD]");

        let empty: GeminiResponse = serde_json::from_str(r#"{"candidates":[]}"#).unwrap();
        assert_eq!(empty.reply_text(), "");
    }

    #[tokio::test]
    async fn test_transport_error_hides_key() {
        let mut session = GeminiSession::new(config(), "SECRET-KEY-123".into()).unwrap();
        // nothing listens on port 1
        session.base_url = "http://127.0.0.1:1/v1beta/models".into();

        let err = session.send_message("hi").await.unwrap_err();
        let shown = format!("{err:#} {err:?}");
        assert!(!shown.contains("SECRET-KEY-123"), "{shown}");
        assert_eq!(session.history_len(), 0);
    }
}
