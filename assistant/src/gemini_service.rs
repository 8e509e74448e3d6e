use crate::config::AssistantConfig;
use crate::error::{AssistantError, Result};
use crate::models::*;
use reqwest::Client;

/// Dialogue context held between turns; replayed to the model on every send.
#[derive(Debug, Clone, Default)]
pub struct ChatThread {
    contents: Vec<GeminiContent>,
}

impl ChatThread {
    pub fn turns(&self) -> usize {
        self.contents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contents.is_empty()
    }
}

pub struct GeminiService {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    generation_config: GeminiGenerationConfig,
}

impl GeminiService {
    pub fn new(config: &AssistantConfig) -> Result<Self> {
        let api_key = config.require_api_key()?.to_string();
        Ok(Self::build(api_key, config))
    }

    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        let api_key = api_key.into();
        let mut config = AssistantConfig::with_api_key(api_key.clone());
        config.api_base = base_url.into();
        Self::build(api_key, &config)
    }

    fn build(api_key: String, config: &AssistantConfig) -> Self {
        Self {
            client: Client::new(),
            api_key,
            model: config.model.clone(),
            base_url: config.api_base.trim_end_matches('/').to_string(),
            generation_config: GeminiGenerationConfig {
                temperature: config.temperature,
                max_output_tokens: config.max_output_tokens,
            },
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn start_chat(&self) -> ChatThread {
        ChatThread::default()
    }

    /// The thread only grows when the model answered.
    pub async fn send_message(&self, thread: &mut ChatThread, prompt: &str) -> Result<String> {
        let user_turn = GeminiContent::text(Role::User, prompt);

        let mut contents = thread.contents.clone();
        contents.push(user_turn.clone());

        let request = GeminiRequest {
            contents,
            generation_config: Some(self.generation_config.clone()),
        };

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await
            .map_err(|e| AssistantError::Gemini(e.without_url().to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            log::error!("Gemini API returned HTTP {}", status);
            return Err(AssistantError::Gemini(api_error_message(status.as_u16(), &error_text)));
        }

        let gemini_response: GeminiResponse = response
            .json()
            .await
            .map_err(|e| AssistantError::Gemini(e.without_url().to_string()))?;

        let answer = gemini_response
            .candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(GeminiContent::joined_text)
            .filter(|text| !text.trim().is_empty())
            .ok_or(AssistantError::EmptyResponse)?;

        thread.contents.push(user_turn);
        thread
            .contents
            .push(GeminiContent::text(Role::Assistant, answer.clone()));

        Ok(answer)
    }
}

fn api_error_message(status: u16, body: &str) -> String {
    match serde_json::from_str::<GeminiErrorBody>(body) {
        Ok(parsed) if !parsed.error.message.is_empty() => {
            format!("{} ({})", parsed.error.message, parsed.error.code)
        }
        _ if body.trim().is_empty() => format!("HTTP {status}"),
        _ => format!("HTTP {status}: {}", body.trim()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const GENERATE_PATH: &str = "/v1beta/models/gemini-2.5-flash:generateContent";

    fn reply(text: &str) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{
                "content": { "role": "model", "parts": [{ "text": text }] },
                "finishReason": "STOP"
            }]
        }))
    }

    #[test]
    fn new_requires_api_key() {
        let mut config = AssistantConfig::with_api_key("k");
        config.api_key = None;
        assert!(matches!(
            GeminiService::new(&config),
            Err(AssistantError::MissingApiKey)
        ));
    }

    #[tokio::test]
    async fn send_message_appends_both_turns() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(GENERATE_PATH))
            .and(query_param("key", "test-key"))
            .respond_with(reply("First answer"))
            .expect(1)
            .mount(&server)
            .await;

        let service = GeminiService::with_base_url("test-key", server.uri());
        let mut thread = service.start_chat();

        let answer = service.send_message(&mut thread, "hello").await.unwrap();
        assert_eq!(answer, "First answer");
        assert_eq!(thread.turns(), 2);
    }

    #[tokio::test]
    async fn later_turns_replay_history() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(GENERATE_PATH))
            .and(body_partial_json(json!({
                "contents": [
                    { "role": "user", "parts": [{ "text": "one" }] },
                    { "role": "model", "parts": [{ "text": "reply" }] },
                    { "role": "user", "parts": [{ "text": "two" }] }
                ]
            })))
            .respond_with(reply("second"))
            .with_priority(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(GENERATE_PATH))
            .respond_with(reply("reply"))
            .mount(&server)
            .await;

        let service = GeminiService::with_base_url("test-key", server.uri());
        let mut thread = service.start_chat();

        service.send_message(&mut thread, "one").await.unwrap();
        let second = service.send_message(&mut thread, "two").await.unwrap();
        assert_eq!(second, "second");
        assert_eq!(thread.turns(), 4);
    }

    #[tokio::test]
    async fn failed_send_leaves_thread_untouched() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(GENERATE_PATH))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": { "code": 400, "message": "API key not valid", "status": "INVALID_ARGUMENT" }
            })))
            .mount(&server)
            .await;

        let service = GeminiService::with_base_url("bad-key", server.uri());
        let mut thread = service.start_chat();

        let err = service.send_message(&mut thread, "hello").await.unwrap_err();
        match err {
            AssistantError::Gemini(message) => assert!(message.contains("API key not valid")),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(thread.is_empty());
    }

    #[tokio::test]
    async fn blocked_prompt_is_an_empty_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(GENERATE_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "promptFeedback": { "blockReason": "SAFETY" }
            })))
            .mount(&server)
            .await;

        let service = GeminiService::with_base_url("test-key", server.uri());
        let mut thread = service.start_chat();

        let err = service.send_message(&mut thread, "hello").await.unwrap_err();
        assert!(matches!(err, AssistantError::EmptyResponse));
        assert!(thread.is_empty());
    }

    #[test]
    fn error_message_falls_back_to_body() {
        assert_eq!(api_error_message(500, ""), "HTTP 500");
        assert_eq!(api_error_message(503, "overloaded"), "HTTP 503: overloaded");
    }
}
