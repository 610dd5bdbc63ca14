//! OpenAI-compatible chat-completions provider
//!
//! Gemini, OpenRouter and OpenAI all accept the same request shape at
//! `{api_base}/chat/completions`; only the base URL and default model differ.

use crate::*;
use reqwest::{Client, StatusCode};
use serde_json::json;
use tracing::{debug, trace};

const GEMINI_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/openai";
const OPENROUTER_BASE: &str = "https://openrouter.ai/api/v1";
const OPENAI_BASE: &str = "https://api.openai.com/v1";

/// Which hosted service a key or base URL points at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Gemini,
    OpenRouter,
    OpenAi,
}

impl Endpoint {
    /// Guess the service from the key prefix, then the base URL
    pub fn detect(api_key: &str, api_base: Option<&str>) -> Self {
        if api_key.starts_with("AIza") || api_base.is_some_and(|b| b.contains("googleapis")) {
            Endpoint::Gemini
        } else if api_key.starts_with("sk-or-")
            || api_base.is_some_and(|b| b.contains("openrouter"))
        {
            Endpoint::OpenRouter
        } else {
            Endpoint::OpenAi
        }
    }

    pub fn default_base(self) -> &'static str {
        match self {
            Endpoint::Gemini => GEMINI_BASE,
            Endpoint::OpenRouter => OPENROUTER_BASE,
            Endpoint::OpenAi => OPENAI_BASE,
        }
    }

    pub fn default_model(self) -> &'static str {
        match self {
            Endpoint::Gemini => "gemini-2.0-flash",
            Endpoint::OpenRouter => "google/gemini-2.0-flash-001",
            Endpoint::OpenAi => "gpt-4o-mini",
        }
    }
}

pub struct OpenAiCompatibleProvider {
    client: Client,
    api_key: String,
    api_base: String,
    default_model: String,
    endpoint: Endpoint,
}

impl OpenAiCompatibleProvider {
    pub fn new(
        api_key: impl Into<String>,
        api_base: Option<String>,
        default_model: Option<String>,
    ) -> Self {
        let api_key = api_key.into();
        let endpoint = Endpoint::detect(&api_key, api_base.as_deref());

        let api_base = api_base
            .unwrap_or_else(|| endpoint.default_base().to_string())
            .trim_end_matches('/')
            .to_string();
        let default_model =
            default_model.unwrap_or_else(|| endpoint.default_model().to_string());

        Self {
            client: Client::new(),
            api_key,
            api_base,
            default_model,
            endpoint,
        }
    }

    pub fn endpoint(&self) -> Endpoint {
        self.endpoint
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    fn build_request(&self, params: &ChatParams) -> serde_json::Value {
        let model = if params.model.is_empty() {
            self.default_model.clone()
        } else {
            params.model.clone()
        };

        let messages: Vec<serde_json::Value> = params
            .messages
            .iter()
            .map(|m| {
                let mut obj = json!({ "role": &m.role });
                if let Some(content) = &m.content {
                    obj["content"] = json!(content);
                }
                if let Some(tool_calls) = &m.tool_calls {
                    // The wire format carries arguments as a JSON-encoded string
                    let calls: Vec<serde_json::Value> = tool_calls
                        .iter()
                        .map(|c| {
                            let arguments = match &c.function.arguments {
                                serde_json::Value::String(s) => s.clone(),
                                other => other.to_string(),
                            };
                            json!({
                                "id": &c.id,
                                "type": &c.call_type,
                                "function": {
                                    "name": &c.function.name,
                                    "arguments": arguments,
                                }
                            })
                        })
                        .collect();
                    obj["tool_calls"] = json!(calls);
                }
                if let Some(tool_call_id) = &m.tool_call_id {
                    obj["tool_call_id"] = json!(tool_call_id);
                }
                if let Some(name) = &m.name {
                    obj["name"] = json!(name);
                }
                obj
            })
            .collect();

        let mut body = json!({
            "model": model,
            "messages": messages,
            "max_tokens": params.max_tokens,
            "temperature": params.temperature,
        });

        if !params.tools.is_empty() {
            body["tools"] = json!(params.tools);
            body["tool_choice"] = json!("auto");
        }

        body
    }

    fn parse_response(&self, json: serde_json::Value) -> Result<ChatResponse> {
        let choice = json["choices"]
            .get(0)
            .ok_or(ProviderError::InvalidResponse)?;
        let message = &choice["message"];
        let content = message["content"].as_str().map(|s| s.to_string());
        let finish_reason = choice["finish_reason"]
            .as_str()
            .unwrap_or("stop")
            .to_string();

        let mut tool_calls = Vec::new();
        if let Some(calls) = message["tool_calls"].as_array() {
            for (index, call) in calls.iter().enumerate() {
                let function = &call["function"];
                let args = function["arguments"]
                    .as_str()
                    .and_then(|s| serde_json::from_str(s).ok())
                    .unwrap_or_else(|| function["arguments"].clone());

                // Gemini may omit call ids; synthesize stable ones per response
                let id = call["id"]
                    .as_str()
                    .filter(|s| !s.is_empty())
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| format!("call_{}", index));

                tool_calls.push(ToolCall {
                    id,
                    name: function["name"].as_str().unwrap_or("").to_string(),
                    arguments: args,
                });
            }
        }

        let usage = json["usage"]
            .as_object()
            .map(|usage| {
                let count = |key: &str| usage.get(key).and_then(|v| v.as_u64()).unwrap_or(0) as u32;
                Usage {
                    prompt_tokens: count("prompt_tokens"),
                    completion_tokens: count("completion_tokens"),
                    total_tokens: count("total_tokens"),
                }
            })
            .unwrap_or_default();

        Ok(ChatResponse {
            content,
            tool_calls,
            finish_reason,
            usage,
        })
    }
}

/// Error text from a failed response body.
///
/// Gemini wraps errors in a one-element array; anything that is not JSON is
/// reported as raw text, or the status reason when the body is empty.
fn error_message(body: &str, status: StatusCode) -> String {
    const MAX_LEN: usize = 200;

    if let Ok(json) = serde_json::from_str::<serde_json::Value>(body) {
        let message = json["error"]["message"]
            .as_str()
            .or_else(|| json[0]["error"]["message"].as_str());
        if let Some(message) = message {
            return message.to_string();
        }
    }

    let text = body.trim();
    if text.is_empty() {
        status.canonical_reason().unwrap_or("unknown error").to_string()
    } else {
        text.chars().take(MAX_LEN).collect()
    }
}

#[async_trait::async_trait]
impl Provider for OpenAiCompatibleProvider {
    async fn chat(&self, params: ChatParams) -> Result<ChatResponse> {
        if self.api_key.is_empty() {
            return Err(ProviderError::NoApiKey);
        }

        trace!("POST {}/chat/completions", self.api_base);

        let url = format!("{}/chat/completions", self.api_base);
        let body = self.build_request(&params);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ProviderError::RateLimited);
        }

        // Error bodies are not always JSON
        let text = response.text().await?;

        if !status.is_success() {
            return Err(ProviderError::Api(format!(
                "{} ({})",
                error_message(&text, status),
                status
            )));
        }

        let json: serde_json::Value = serde_json::from_str(&text)?;

        debug!(
            "model response: {} tool calls",
            json["choices"][0]["message"]["tool_calls"]
                .as_array()
                .map(|v| v.len())
                .unwrap_or(0)
        );

        self.parse_response(json)
    }

    fn default_model(&self) -> String {
        self.default_model.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve one canned HTTP response on a local port; returns the base URL
    async fn serve_once(status_line: &str, content_type: &str, body: &str) -> String {
        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status_line,
            content_type,
            body.len(),
            body
        );

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            read_request(&mut socket).await;
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
        });

        format!("http://{}/v1", addr)
    }

    /// Drain headers and body so the client sees a clean close
    async fn read_request(socket: &mut tokio::net::TcpStream) {
        let mut request = Vec::new();
        let mut buf = [0u8; 4096];

        loop {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                return;
            }
            request.extend_from_slice(&buf[..n]);

            let text = String::from_utf8_lossy(&request);
            if let Some(end) = text.find("\r\n\r\n") {
                let content_length = text[..end]
                    .lines()
                    .find_map(|line| {
                        let (name, value) = line.split_once(':')?;
                        name.eq_ignore_ascii_case("content-length")
                            .then(|| value.trim().parse::<usize>().ok())
                            .flatten()
                    })
                    .unwrap_or(0);
                if request.len() >= end + 4 + content_length {
                    return;
                }
            }
        }
    }

    fn local_provider(base: String) -> OpenAiCompatibleProvider {
        OpenAiCompatibleProvider::new("test-key", Some(base), Some("local-model".to_string()))
    }

    fn weather_params() -> ChatParams {
        ChatParams {
            messages: vec![Message::user("What's the weather like in New York?")],
            ..Default::default()
        }
    }

    #[test]
    fn test_detect_gemini_key() {
        let provider = OpenAiCompatibleProvider::new("AIzaSyTest", None, None);
        assert_eq!(provider.endpoint(), Endpoint::Gemini);
        assert_eq!(provider.api_base(), GEMINI_BASE);
        assert_eq!(provider.default_model(), "gemini-2.0-flash");
    }

    #[test]
    fn test_detect_openrouter_key() {
        let provider = OpenAiCompatibleProvider::new("sk-or-test123", None, None);
        assert_eq!(provider.endpoint(), Endpoint::OpenRouter);
        assert_eq!(provider.api_base(), OPENROUTER_BASE);
    }

    #[test]
    fn test_detect_openai_fallback() {
        let provider = OpenAiCompatibleProvider::new("sk-proj-123", None, None);
        assert_eq!(provider.endpoint(), Endpoint::OpenAi);
        assert_eq!(provider.api_base(), OPENAI_BASE);
        assert_eq!(provider.default_model(), "gpt-4o-mini");
    }

    #[test]
    fn test_custom_base_trailing_slash_trimmed() {
        let provider = OpenAiCompatibleProvider::new(
            "key",
            Some("http://localhost:8080/v1/".to_string()),
            Some("local-model".to_string()),
        );
        assert_eq!(provider.api_base(), "http://localhost:8080/v1");
        assert_eq!(provider.default_model(), "local-model");
    }

    #[tokio::test]
    async fn test_chat_without_key_fails_fast() {
        let provider = OpenAiCompatibleProvider::new("", None, None);
        let result = provider.chat(ChatParams::default()).await;
        assert!(matches!(result, Err(ProviderError::NoApiKey)));
    }

    #[test]
    fn test_build_request_uses_default_model_when_empty() {
        let provider = OpenAiCompatibleProvider::new("AIza", None, None);
        let params = ChatParams {
            messages: vec![Message::user("What time is it in New York?")],
            ..Default::default()
        };

        let request = provider.build_request(&params);
        assert_eq!(request["model"], "gemini-2.0-flash");
        assert!(request.get("tools").is_none());
        assert_eq!(request["messages"][0]["content"], "What time is it in New York?");
    }

    #[test]
    fn test_build_request_with_tools() {
        let provider = OpenAiCompatibleProvider::new("AIza", None, None);
        let params = ChatParams {
            model: "gemini-2.0-flash".to_string(),
            messages: vec![Message::user("Weather?")],
            tools: vec![Tool::new(
                "get_weather",
                "Weather report",
                object_schema(&[("city", "City name", true)]),
            )],
            ..Default::default()
        };

        let request = provider.build_request(&params);
        assert_eq!(request["tool_choice"], "auto");
        assert_eq!(request["tools"][0]["type"], "function");
        assert_eq!(request["tools"][0]["function"]["name"], "get_weather");
        assert_eq!(
            request["tools"][0]["function"]["parameters"]["required"],
            json!(["city"])
        );
    }

    #[test]
    fn test_build_request_encodes_tool_call_arguments_as_string() {
        let provider = OpenAiCompatibleProvider::new("AIza", None, None);
        let mut assistant = Message::assistant("");
        assistant.tool_calls = Some(vec![ToolCallDef::new(
            "call_0",
            "get_weather",
            json!({"city": "New York"}),
        )]);

        let params = ChatParams {
            messages: vec![
                assistant,
                Message::tool("call_0", "get_weather", r#"{"status":"success","report":"r"}"#),
            ],
            ..Default::default()
        };

        let request = provider.build_request(&params);
        let call = &request["messages"][0]["tool_calls"][0];
        assert_eq!(call["id"], "call_0");
        assert_eq!(call["function"]["arguments"], r#"{"city":"New York"}"#);
        assert_eq!(request["messages"][1]["tool_call_id"], "call_0");
        assert_eq!(request["messages"][1]["name"], "get_weather");
    }

    #[test]
    fn test_parse_text_response() {
        let provider = OpenAiCompatibleProvider::new("AIza", None, None);
        let json = json!({
            "choices": [{
                "message": {"role": "assistant", "content": "It is sunny in New York."},
                "finish_reason": "stop"
            }],
            "usage": {"prompt_tokens": 12, "completion_tokens": 8, "total_tokens": 20}
        });

        let response = provider.parse_response(json).unwrap();
        assert_eq!(response.content.as_deref(), Some("It is sunny in New York."));
        assert!(!response.has_tool_calls());
        assert_eq!(response.usage.total_tokens, 20);
    }

    #[test]
    fn test_parse_tool_call_response() {
        let provider = OpenAiCompatibleProvider::new("AIza", None, None);
        let json = json!({
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "",
                        "type": "function",
                        "function": {"name": "get_weather", "arguments": "{\"city\":\"London\"}"}
                    }]
                },
                "finish_reason": "tool_calls"
            }]
        });

        let response = provider.parse_response(json).unwrap();
        assert!(response.content.is_none());
        assert_eq!(response.tool_calls.len(), 1);
        assert_eq!(response.tool_calls[0].id, "call_0");
        assert_eq!(response.tool_calls[0].name, "get_weather");
        assert_eq!(response.tool_calls[0].arguments, json!({"city": "London"}));
        assert_eq!(response.usage.total_tokens, 0);
    }

    #[test]
    fn test_parse_response_without_choices() {
        let provider = OpenAiCompatibleProvider::new("AIza", None, None);
        let result = provider.parse_response(json!({"choices": []}));
        assert!(matches!(result, Err(ProviderError::InvalidResponse)));
    }

    #[tokio::test]
    async fn test_chat_html_error_body_keeps_status() {
        let base = serve_once("502 Bad Gateway", "text/html", "<html>502 Bad Gateway</html>").await;
        let err = local_provider(base).chat(weather_params()).await.unwrap_err();

        match err {
            ProviderError::Api(message) => {
                assert!(message.contains("<html>502 Bad Gateway</html>"), "{}", message);
                assert!(message.contains("502"), "{}", message);
            }
            other => panic!("expected Api error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_chat_json_error_body_uses_message() {
        let body = r#"{"error":{"message":"API key not valid"}}"#;
        let base = serve_once("400 Bad Request", "application/json", body).await;
        let err = local_provider(base).chat(weather_params()).await.unwrap_err();

        match err {
            ProviderError::Api(message) => {
                assert!(message.starts_with("API key not valid"), "{}", message);
                assert!(message.contains("400"), "{}", message);
            }
            other => panic!("expected Api error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_chat_empty_error_body_uses_reason() {
        let base = serve_once("503 Service Unavailable", "text/plain", "").await;
        let err = local_provider(base).chat(weather_params()).await.unwrap_err();

        match err {
            ProviderError::Api(message) => {
                assert!(message.starts_with("Service Unavailable"), "{}", message)
            }
            other => panic!("expected Api error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_chat_rate_limited() {
        let base = serve_once("429 Too Many Requests", "application/json", "{}").await;
        let err = local_provider(base).chat(weather_params()).await.unwrap_err();
        assert!(matches!(err, ProviderError::RateLimited));
    }

    #[tokio::test]
    async fn test_chat_success_body_not_json() {
        let base = serve_once("200 OK", "text/html", "<html>login</html>").await;
        let err = local_provider(base).chat(weather_params()).await.unwrap_err();
        assert!(matches!(err, ProviderError::Json(_)));
    }

    #[tokio::test]
    async fn test_chat_success_round_trip() {
        let body = json!({
            "choices": [{
                "message": {"role": "assistant", "content": "It is sunny in New York."},
                "finish_reason": "stop"
            }]
        })
        .to_string();
        let base = serve_once("200 OK", "application/json", &body).await;

        let response = local_provider(base).chat(weather_params()).await.unwrap();
        assert_eq!(response.content.as_deref(), Some("It is sunny in New York."));
    }
}
