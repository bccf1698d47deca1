//! Callback sink: posts component actions back to the hub.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::components::ComponentAction;
use crate::error::{TransportError, TransportResult};

/// Seconds the hub waits before emitting the follow-up push event.
const DEFAULT_DELAY_SECONDS: f64 = 5.0;

#[derive(Debug, Serialize)]
struct CallbackRequest<'a> {
    action: &'a str,
    component_type: &'a str,
    data: Value,
    delay_seconds: f64,
}

#[derive(Debug, Deserialize)]
pub struct CallbackResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub scheduled_event: Option<String>,
}

/// Fire-and-forget dispatcher for card actions. Cheap to clone.
#[derive(Debug, Clone)]
pub struct CallbackSink {
    http: reqwest::Client,
    callback_url: Url,
}

impl CallbackSink {
    pub fn new(http: reqwest::Client, callback_url: Url) -> Self {
        Self { http, callback_url }
    }

    /// Posts the action in the background. Failures are logged, not
    /// surfaced; the card's local state already moved on.
    pub fn dispatch(&self, action: ComponentAction) {
        let sink = self.clone();
        tokio::spawn(async move {
            match sink.post(&action).await {
                Ok(response) => {
                    debug!(
                        action = action.action(),
                        component = action.component_type(),
                        success = response.success,
                        scheduled = response.scheduled_event.as_deref(),
                        "callback delivered"
                    );
                }
                Err(err) => {
                    warn!(
                        action = action.action(),
                        component = action.component_type(),
                        error = %err,
                        "callback failed"
                    );
                }
            }
        });
    }

    async fn post(&self, action: &ComponentAction) -> TransportResult<CallbackResponse> {
        let request = CallbackRequest {
            action: action.action(),
            component_type: action.component_type(),
            data: action.payload(),
            delay_seconds: DEFAULT_DELAY_SECONDS,
        };
        let response = self
            .http
            .post(self.callback_url.clone())
            .json(&request)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::http_status(status, &body));
        }
        response
            .json::<CallbackResponse>()
            .await
            .map_err(|err| TransportError::parse(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::LogDraftData;

    #[test]
    fn request_serializes_with_snake_case_envelope() {
        let action = ComponentAction::SaveLogDraft {
            draft: LogDraftData {
                workspace_id: "ws1".into(),
                task_content: "wrote docs".into(),
                date: "2026-08-28".into(),
                duration: 30,
                tags: vec!["docs".into()],
                mood: None,
            },
        };
        let request = CallbackRequest {
            action: action.action(),
            component_type: action.component_type(),
            data: action.payload(),
            delay_seconds: DEFAULT_DELAY_SECONDS,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["action"], "save");
        assert_eq!(json["component_type"], "log-draft-card");
        assert_eq!(json["delay_seconds"], 5.0);
        assert_eq!(json["data"]["taskContent"], "wrote docs");
    }
}
