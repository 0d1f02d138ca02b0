//! Backend for OpenAI-compatible chat-completion endpoints.
//!
//! Uses the function-calling dialect of `/v1/chat/completions`: schemas go
//! out under `functions`, the model's choice comes back as
//! `message.function_call` with JSON-encoded arguments.

use crate::backend::{
    ChatMessage, ChatReply, ChatRequest, ChatRole, FunctionCall, FunctionSchema, LlmBackend,
};
use crate::error::LlmError;
use async_trait::async_trait;
use reqwest::{StatusCode, header};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Connection settings for an OpenAI-compatible endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    /// Base URL, without the `/v1` suffix.
    pub base_url: String,
    /// Model identifier.
    pub model: String,
    /// API key, sent as a bearer token when present.
    pub api_key: Option<String>,
    /// Optional request timeout in seconds.
    pub timeout_secs: Option<u64>,
}

impl OpenAiConfig {
    /// Creates a configuration for the given endpoint and model.
    #[must_use]
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            model: model.into(),
            api_key: None,
            timeout_secs: None,
        }
    }

    /// Sets the API key.
    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    fn completions_url(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

/// Chat-completion client for OpenAI-compatible APIs.
#[derive(Debug, Clone)]
pub struct OpenAiBackend {
    client: reqwest::Client,
    config: OpenAiConfig,
}

impl OpenAiBackend {
    /// Creates a backend from its configuration.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the HTTP client cannot be built.
    pub fn new(config: OpenAiConfig) -> Result<Self, LlmError> {
        if config.model.trim().is_empty() {
            return Err(LlmError::InvalidConfig {
                reason: "model name is empty".to_string(),
            });
        }

        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder.build().map_err(|e| LlmError::InvalidConfig {
            reason: e.to_string(),
        })?;

        Ok(Self { client, config })
    }
}

#[async_trait]
impl LlmBackend for OpenAiBackend {
    #[instrument(skip_all, fields(model = %self.config.model, messages = request.messages.len()))]
    async fn complete(&self, request: &ChatRequest) -> Result<ChatReply, LlmError> {
        let url = self.config.completions_url();
        let body = WireRequest::from_request(&self.config.model, request);

        let mut http = self.client.post(&url).json(&body);
        if let Some(api_key) = &self.config.api_key
            && !api_key.is_empty()
        {
            http = http.bearer_auth(api_key);
        }

        let response = http.send().await.map_err(|e| {
            warn!(error = %e, endpoint = %url, "chat completion request failed");
            if e.is_timeout() {
                LlmError::Timeout
            } else if e.is_connect() {
                LlmError::ProviderUnavailable {
                    provider: url.clone(),
                    reason: e.to_string(),
                }
            } else {
                LlmError::RequestFailed {
                    reason: e.to_string(),
                }
            }
        })?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get(header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse().ok());
            return Err(LlmError::RateLimited { retry_after_secs });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, body = %body, "chat completion endpoint returned error");
            return Err(LlmError::RequestFailed {
                reason: format!("HTTP {status}: {body}"),
            });
        }

        let parsed: WireResponse =
            response
                .json()
                .await
                .map_err(|e| LlmError::ResponseParseFailed {
                    reason: e.to_string(),
                })?;

        let reply = parsed.into_reply()?;
        debug!(
            function_call = matches!(reply, ChatReply::FunctionCall(_)),
            "received chat completion"
        );
        Ok(reply)
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}

#[derive(Serialize)]
struct WireRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    functions: Option<&'a [FunctionSchema]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    function_call: Option<&'static str>,
}

impl<'a> WireRequest<'a> {
    fn from_request(model: &'a str, request: &'a ChatRequest) -> Self {
        let mut messages = Vec::with_capacity(request.messages.len() + 1);
        messages.push(WireMessage::from(&ChatMessage::system(
            request.system_prompt.as_str(),
        )));
        messages.extend(request.messages.iter().map(WireMessage::from));

        let functions = if request.allows_function_call() {
            request.functions.as_deref()
        } else {
            None
        };

        Self {
            model,
            messages,
            function_call: functions.map(|_| "auto"),
            functions,
        }
    }
}

#[derive(Serialize, Deserialize)]
struct WireMessage {
    role: ChatRole,
    #[serde(default)]
    content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    function_call: Option<WireFunctionCall>,
    #[serde(default, skip_serializing)]
    tool_calls: Option<Vec<WireToolCall>>,
}

impl From<&ChatMessage> for WireMessage {
    fn from(message: &ChatMessage) -> Self {
        Self {
            role: message.role,
            content: message.content.clone(),
            name: message.name.clone(),
            function_call: message.function_call.as_ref().map(|call| WireFunctionCall {
                name: call.name.clone(),
                arguments: call.arguments.to_string(),
            }),
            tool_calls: None,
        }
    }
}

#[derive(Serialize, Deserialize)]
struct WireFunctionCall {
    name: String,
    #[serde(default)]
    arguments: String,
}

impl WireFunctionCall {
    fn decode(self) -> Result<FunctionCall, LlmError> {
        let arguments = if self.arguments.trim().is_empty() {
            JsonValue::Object(Default::default())
        } else {
            serde_json::from_str(&self.arguments).map_err(|e| LlmError::ResponseParseFailed {
                reason: format!("arguments for '{}' are not valid JSON: {e}", self.name),
            })?
        };
        Ok(FunctionCall::new(self.name, arguments))
    }
}

/// Some compatible servers answer in the newer `tool_calls` shape even when
/// asked with `functions`.
#[derive(Deserialize)]
struct WireToolCall {
    function: WireFunctionCall,
}

#[derive(Deserialize)]
struct WireResponse {
    choices: Vec<WireChoice>,
}

#[derive(Deserialize)]
struct WireChoice {
    message: WireMessage,
}

impl WireResponse {
    fn into_reply(self) -> Result<ChatReply, LlmError> {
        let message = self
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::ResponseParseFailed {
                reason: "response contained no choices".to_string(),
            })?
            .message;

        let call = message.function_call.or_else(|| {
            message
                .tool_calls
                .and_then(|calls| calls.into_iter().next())
                .map(|tool| tool.function)
        });

        match call {
            Some(call) => Ok(ChatReply::FunctionCall(call.decode()?)),
            None => Ok(ChatReply::text(message.content.unwrap_or_default())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn backend(server: &MockServer) -> OpenAiBackend {
        OpenAiBackend::new(
            OpenAiConfig::new(server.uri(), "llama-3.1-8b").with_api_key("sk-test"),
        )
        .expect("backend")
    }

    fn completion(message: JsonValue) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({
            "id": "chatcmpl-1",
            "choices": [{ "index": 0, "message": message, "finish_reason": "stop" }]
        }))
    }

    fn recommend_schema() -> FunctionSchema {
        FunctionSchema::new(
            "recommend_restaurants",
            "Suggest restaurants",
            json!({"type": "object", "properties": {"party_size": {"type": "integer"}}}),
        )
    }

    #[tokio::test]
    async fn text_reply_is_returned() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(json!({
                "model": "llama-3.1-8b",
                "function_call": "auto"
            })))
            .respond_with(completion(json!({"role": "assistant", "content": "Hi there!"})))
            .expect(1)
            .mount(&server)
            .await;

        let request = ChatRequest::new("Be brief.", vec![ChatMessage::user("hello")])
            .with_functions(vec![recommend_schema()]);
        let reply = backend(&server).complete(&request).await.expect("reply");

        assert_eq!(reply, ChatReply::text("Hi there!"));

        let received = server.received_requests().await.expect("recording enabled");
        let body: JsonValue = received[0].body_json().expect("json body");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][0]["content"], "Be brief.");
        assert_eq!(body["messages"][1]["content"], "hello");
        assert_eq!(body["functions"][0]["name"], "recommend_restaurants");
    }

    #[tokio::test]
    async fn function_call_arguments_are_decoded() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(completion(json!({
                "role": "assistant",
                "content": null,
                "function_call": {
                    "name": "recommend_restaurants",
                    "arguments": "{\"cuisine\": \"Italian\", \"party_size\": 2}"
                }
            })))
            .mount(&server)
            .await;

        let request = ChatRequest::new("Be brief.", vec![ChatMessage::user("italian for 2")])
            .with_functions(vec![recommend_schema()]);
        let reply = backend(&server).complete(&request).await.expect("reply");

        assert_eq!(
            reply,
            ChatReply::function_call(
                "recommend_restaurants",
                json!({"cuisine": "Italian", "party_size": 2})
            )
        );
    }

    #[tokio::test]
    async fn tool_calls_shape_is_accepted() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(completion(json!({
                "role": "assistant",
                "tool_calls": [{
                    "id": "call_1",
                    "type": "function",
                    "function": {"name": "booking_tool", "arguments": "{\"party_size\": 4}"}
                }]
            })))
            .mount(&server)
            .await;

        let request = ChatRequest::new("Be brief.", vec![ChatMessage::user("book it")]);
        let reply = backend(&server).complete(&request).await.expect("reply");

        assert_eq!(
            reply,
            ChatReply::function_call("booking_tool", json!({"party_size": 4}))
        );
    }

    #[tokio::test]
    async fn request_without_functions_omits_schema() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(completion(json!({"role": "assistant", "content": "Done."})))
            .mount(&server)
            .await;

        let history = vec![
            ChatMessage::user("book a table"),
            ChatMessage::assistant_function_call(FunctionCall::new(
                "booking_tool",
                json!({"party_size": 2}),
            )),
            ChatMessage::function("booking_tool", "{\"reservation_id\":1}"),
        ];
        let request = ChatRequest::new("Be brief.", history);
        backend(&server).complete(&request).await.expect("reply");

        let received = server.received_requests().await.expect("recording enabled");
        let body: JsonValue = received[0].body_json().expect("json body");
        assert!(body.get("functions").is_none());
        assert!(body.get("function_call").is_none());
        assert_eq!(body["messages"][2]["function_call"]["arguments"], "{\"party_size\":2}");
        assert_eq!(body["messages"][3]["role"], "function");
        assert_eq!(body["messages"][3]["name"], "booking_tool");
    }

    #[tokio::test]
    async fn rate_limit_reads_retry_after() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "7"))
            .mount(&server)
            .await;

        let request = ChatRequest::new("Be brief.", vec![ChatMessage::user("hi")]);
        let err = backend(&server).complete(&request).await.unwrap_err();

        assert_eq!(
            err,
            LlmError::RateLimited {
                retry_after_secs: Some(7)
            }
        );
    }

    #[tokio::test]
    async fn server_error_is_request_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let request = ChatRequest::new("Be brief.", vec![ChatMessage::user("hi")]);
        let err = backend(&server).complete(&request).await.unwrap_err();

        match err {
            LlmError::RequestFailed { reason } => {
                assert!(reason.contains("500"));
                assert!(reason.contains("boom"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn malformed_arguments_fail_parsing() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(completion(json!({
                "role": "assistant",
                "function_call": {"name": "booking_tool", "arguments": "{not json"}
            })))
            .mount(&server)
            .await;

        let request = ChatRequest::new("Be brief.", vec![ChatMessage::user("hi")]);
        let err = backend(&server).complete(&request).await.unwrap_err();

        assert!(matches!(err, LlmError::ResponseParseFailed { .. }));
    }

    #[test]
    fn empty_model_is_rejected() {
        let err = OpenAiBackend::new(OpenAiConfig::new("http://localhost", " ")).unwrap_err();
        assert!(matches!(err, LlmError::InvalidConfig { .. }));
    }

    #[test]
    fn completions_url_trims_trailing_slash() {
        let config = OpenAiConfig::new("http://localhost:8080/", "m");
        assert_eq!(
            config.completions_url(),
            "http://localhost:8080/v1/chat/completions"
        );
    }
}
