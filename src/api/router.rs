//! Action-based message routing
//!
//! Messages are JSON objects with an `action` tag. Every message gets a
//! structured [`Response`]; failures are reported in it, never raised.

use crate::background::BackgroundService;
use crate::editor::BackgroundClient;
use crate::error::{ErrorKind, Result, WriteRightError};
use crate::settings::{Settings, StatsDelta};
use crate::types::{CheckOutcome, CheckResult, OptionOverrides};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Actions the router understands
pub const ACTIONS: &[&str] = &[
    "checkGrammar",
    "getSettings",
    "saveSettings",
    "updateStats",
    "getStats",
    "clearCache",
    "reportError",
    "checkHealth",
    "toggleExtension",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Request {
    CheckGrammar {
        text: String,
        #[serde(default)]
        options: OptionOverrides,
    },
    GetSettings,
    SaveSettings {
        settings: Value,
    },
    UpdateStats {
        stats: StatsDelta,
    },
    GetStats,
    ClearCache,
    ReportError {
        #[serde(default)]
        error: Value,
    },
    CheckHealth,
    ToggleExtension,
}

impl Request {
    pub fn action(&self) -> &'static str {
        match self {
            Request::CheckGrammar { .. } => "checkGrammar",
            Request::GetSettings => "getSettings",
            Request::SaveSettings { .. } => "saveSettings",
            Request::UpdateStats { .. } => "updateStats",
            Request::GetStats => "getStats",
            Request::ClearCache => "clearCache",
            Request::ReportError { .. } => "reportError",
            Request::CheckHealth => "checkHealth",
            Request::ToggleExtension => "toggleExtension",
        }
    }
}

/// Error carried in a failed response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorPayload {
    pub kind: ErrorKind,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_after_ms: Option<u64>,
}

impl From<&WriteRightError> for ErrorPayload {
    fn from(err: &WriteRightError) -> Self {
        let retry_after_ms = match err {
            WriteRightError::RateLimited(wait) => Some(wait.as_millis() as u64),
            _ => None,
        };
        Self {
            kind: err.kind(),
            message: err.to_string(),
            retry_after_ms,
        }
    }
}

impl ErrorPayload {
    /// Rebuild an error on the receiving side of the message boundary
    pub fn into_error(self) -> WriteRightError {
        match self.kind {
            ErrorKind::InvalidInput => WriteRightError::InvalidInput(self.message),
            ErrorKind::RateLimited => WriteRightError::RateLimited(Duration::from_millis(
                self.retry_after_ms.unwrap_or_default(),
            )),
            ErrorKind::UpstreamUnavailable => WriteRightError::UpstreamUnavailable(self.message),
            ErrorKind::UnknownAction => WriteRightError::UnknownAction(self.message),
            ErrorKind::StorageFailure => WriteRightError::StorageFailure(self.message),
            ErrorKind::Internal => WriteRightError::Other(self.message),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    /// Set on `checkGrammar` responses
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cached: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorPayload>,
}

impl Response {
    pub fn ok(data: impl Serialize) -> Self {
        match serde_json::to_value(data) {
            Ok(data) => Self {
                success: true,
                data: Some(data),
                cached: None,
                error: None,
            },
            Err(e) => Self::error(&WriteRightError::Serialization(e)),
        }
    }

    pub fn empty() -> Self {
        Self {
            success: true,
            data: None,
            cached: None,
            error: None,
        }
    }

    pub fn error(err: &WriteRightError) -> Self {
        Self {
            success: false,
            data: None,
            cached: None,
            error: Some(err.into()),
        }
    }

    fn from_result<T: Serialize>(result: Result<T>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(e) => Self::error(&e),
        }
    }

    /// Payload as `T`, or the carried error
    pub fn into_data<T: serde::de::DeserializeOwned>(self) -> Result<T> {
        if let Some(error) = self.error {
            return Err(error.into_error());
        }
        let data = self.data.unwrap_or(Value::Null);
        Ok(serde_json::from_value(data)?)
    }
}

/// Dispatches messages onto the background service
#[derive(Clone)]
pub struct MessageRouter {
    service: Arc<BackgroundService>,
}

impl MessageRouter {
    pub fn new(service: Arc<BackgroundService>) -> Self {
        Self { service }
    }

    pub fn service(&self) -> &Arc<BackgroundService> {
        &self.service
    }

    /// Route `action` with the fields of `payload` (an object or null)
    pub async fn dispatch(&self, action: &str, payload: Value) -> Response {
        let mut message = match payload {
            Value::Object(fields) => fields,
            Value::Null => Map::new(),
            _ => {
                return Response::error(&WriteRightError::InvalidInput(
                    "payload must be a JSON object".to_string(),
                ))
            }
        };
        message.insert("action".to_string(), Value::String(action.to_string()));
        self.dispatch_value(Value::Object(message)).await
    }

    /// Route a raw message object
    pub async fn dispatch_value(&self, message: Value) -> Response {
        let Some(action) = message.get("action").and_then(Value::as_str).map(str::to_string) else {
            return Response::error(&WriteRightError::InvalidInput(
                "message has no action".to_string(),
            ));
        };

        match serde_json::from_value::<Request>(message) {
            Ok(request) => self.handle(request).await,
            Err(_) if !ACTIONS.contains(&action.as_str()) => {
                warn!("Unknown action: {}", action);
                Response::error(&WriteRightError::UnknownAction(action))
            }
            Err(e) => Response::error(&WriteRightError::InvalidInput(format!(
                "malformed {} message: {}",
                action, e
            ))),
        }
    }

    pub async fn handle(&self, request: Request) -> Response {
        debug!("Message received: {}", request.action());

        match request {
            Request::CheckGrammar { text, options } => {
                match self.service.check_grammar(text, options).await {
                    Ok(outcome) => {
                        let mut response = Response::ok(outcome.result.as_ref());
                        response.cached = Some(outcome.cached);
                        response
                    }
                    Err(e) => Response::error(&e),
                }
            }
            Request::GetSettings => Response::from_result(self.service.settings().await),
            Request::SaveSettings { settings } => {
                Response::from_result(self.service.save_settings(&settings).await)
            }
            Request::UpdateStats { stats } => {
                Response::from_result(self.service.update_stats(stats).await)
            }
            Request::GetStats => Response::from_result(self.service.stats().await),
            Request::ClearCache => {
                self.service.clear_cache();
                Response::empty()
            }
            Request::ReportError { error } => {
                let id = self.service.report_error(&error);
                Response::ok(serde_json::json!({ "reportId": id }))
            }
            Request::CheckHealth => Response::ok(self.service.health()),
            Request::ToggleExtension => match self.service.toggle().await {
                Ok(enabled) => Response::ok(serde_json::json!({ "enabled": enabled })),
                Err(e) => Response::error(&e),
            },
        }
    }
}

#[async_trait]
impl BackgroundClient for MessageRouter {
    async fn check_grammar(
        &self,
        text: String,
        overrides: OptionOverrides,
    ) -> Result<CheckOutcome> {
        let response = self
            .handle(Request::CheckGrammar {
                text,
                options: overrides,
            })
            .await;
        let cached = response.cached.unwrap_or(false);
        let result: CheckResult = response.into_data()?;
        Ok(CheckOutcome {
            result: Arc::new(result),
            cached,
        })
    }

    async fn update_stats(&self, delta: StatsDelta) -> Result<()> {
        let response = self.handle(Request::UpdateStats { stats: delta }).await;
        response.into_data::<Value>().map(|_| ())
    }

    async fn settings(&self) -> Result<Settings> {
        self.handle(Request::GetSettings).await.into_data()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WriteRightConfig;
    use crate::services::grammar::MockGrammarBackend;
    use crate::storage::MemoryStore;
    use serde_json::json;

    #[test]
    fn test_request_parsing() {
        let request: Request = serde_json::from_value(json!({
            "action": "checkGrammar",
            "text": "I teh best",
            "options": {"language": "en-GB"}
        }))
        .unwrap();
        assert_eq!(
            request,
            Request::CheckGrammar {
                text: "I teh best".to_string(),
                options: OptionOverrides {
                    language: Some("en-GB".to_string()),
                    ..Default::default()
                },
            }
        );

        let request: Request = serde_json::from_value(json!({"action": "checkHealth"})).unwrap();
        assert_eq!(request.action(), "checkHealth");
    }

    #[test]
    fn test_every_action_is_listed() {
        let requests = [
            json!({"action": "checkGrammar", "text": "x"}),
            json!({"action": "getSettings"}),
            json!({"action": "saveSettings", "settings": {}}),
            json!({"action": "updateStats", "stats": {}}),
            json!({"action": "getStats"}),
            json!({"action": "clearCache"}),
            json!({"action": "reportError"}),
            json!({"action": "checkHealth"}),
            json!({"action": "toggleExtension"}),
        ];
        for value in requests {
            let request: Request = serde_json::from_value(value).unwrap();
            assert!(ACTIONS.contains(&request.action()));
        }
    }

    fn router(backend: MockGrammarBackend) -> MessageRouter {
        MessageRouter::new(Arc::new(BackgroundService::new(
            WriteRightConfig::default(),
            Arc::new(backend),
            Arc::new(MemoryStore::new()),
            Arc::new(MemoryStore::new()),
        )))
    }

    #[tokio::test]
    async fn test_unknown_and_malformed_messages() {
        let router = router(MockGrammarBackend::new());

        let response = router.dispatch("translate", json!({"text": "hi"})).await;
        assert!(!response.success);
        assert_eq!(response.error.unwrap().kind, ErrorKind::UnknownAction);

        let response = router.dispatch("checkGrammar", json!({"options": {}})).await;
        assert_eq!(response.error.unwrap().kind, ErrorKind::InvalidInput);

        let response = router.dispatch_value(json!({"text": "no action"})).await;
        assert_eq!(response.error.unwrap().kind, ErrorKind::InvalidInput);

        let response = router.dispatch("getStats", json!([1, 2])).await;
        assert_eq!(response.error.unwrap().kind, ErrorKind::InvalidInput);
    }

    #[tokio::test]
    async fn test_check_grammar_reports_cached() {
        let mut backend = MockGrammarBackend::new();
        backend.expect_check().times(1).returning(|_| Ok(vec![]));
        let router = router(backend);

        let first = router.dispatch("checkGrammar", json!({"text": "All good here."})).await;
        assert!(first.success);
        assert_eq!(first.cached, Some(false));
        assert_eq!(first.data.unwrap()["matches"], json!([]));

        let second = router.dispatch("checkGrammar", json!({"text": "All good here."})).await;
        assert_eq!(second.cached, Some(true));

        let stats = router.dispatch("getStats", Value::Null).await;
        assert_eq!(stats.data.unwrap()["checksPerformed"], json!(1));
    }

    #[tokio::test]
    async fn test_empty_text_is_invalid() {
        let mut backend = MockGrammarBackend::new();
        backend.expect_check().times(0);
        let router = router(backend);

        let response = router.dispatch("checkGrammar", json!({"text": "  "})).await;
        assert!(!response.success);
        assert_eq!(response.error.unwrap().kind, ErrorKind::InvalidInput);
    }

    #[tokio::test]
    async fn test_settings_and_toggle() {
        let router = router(MockGrammarBackend::new());

        let saved = router
            .dispatch("saveSettings", json!({"settings": {"language": "de-DE"}}))
            .await;
        assert!(saved.success);
        assert_eq!(saved.data.unwrap()["language"], json!("de-DE"));

        let toggled = router.dispatch("toggleExtension", Value::Null).await;
        assert_eq!(toggled.data.unwrap()["enabled"], json!(false));

        let settings = BackgroundClient::settings(&router).await.unwrap();
        assert!(!settings.enabled);
        assert_eq!(settings.language, "de-DE");
    }

    #[tokio::test]
    async fn test_report_error_and_health() {
        let router = router(MockGrammarBackend::new());

        let report = router
            .dispatch("reportError", json!({"error": {"message": "boom"}}))
            .await;
        assert!(report.data.unwrap()["reportId"].as_str().is_some());

        let health = router.dispatch("checkHealth", Value::Null).await;
        let data = health.data.unwrap();
        assert_eq!(data["status"], json!("ok"));
        assert_eq!(data["rateLimit"], json!(20));

        let cleared = router.dispatch("clearCache", Value::Null).await;
        assert!(cleared.success);
        assert!(cleared.data.is_none());
    }

    #[test]
    fn test_error_payload_round_trip() {
        let err = WriteRightError::RateLimited(Duration::from_millis(1200));
        let response = Response::error(&err);

        let wire = serde_json::to_value(&response).unwrap();
        assert_eq!(wire["success"], json!(false));
        assert_eq!(wire["error"]["kind"], json!("rateLimited"));
        assert_eq!(wire["error"]["retryAfterMs"], json!(1200));

        let back: Response = serde_json::from_value(wire).unwrap();
        match back.into_data::<Value>() {
            Err(WriteRightError::RateLimited(wait)) => {
                assert_eq!(wait, Duration::from_millis(1200))
            }
            other => panic!("expected RateLimited, got {:?}", other),
        }
    }
}
