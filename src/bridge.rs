//! Method-call surface: the platform-neutral equivalent of the plugin's
//! method channel. Hosts hand in serialized requests and relay serialized
//! responses; the event stream side is a plain status subscription.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::controller::TunnelController;
use crate::error::{BridgeError, Result};
use crate::keys::{self, KeyPair};
use crate::stats::TunnelStatistics;
use crate::status::ConnectionStatus;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum BridgeRequest {
    GenerateKeyPair,
    SetupTunnel { tunnel_name: String },
    CheckTunnelConfiguration { tunnel_name: String },
    Connect { cfg: String },
    Disconnect,
    Status,
    TunnelStatistics,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum BridgeResponse {
    Unit,
    Bool(bool),
    KeyPair(KeyPair),
    Status { status: ConnectionStatus },
    Statistics(Option<TunnelStatistics>),
    Error {
        code: String,
        message: String,
        details: Option<String>,
    },
}

impl BridgeResponse {
    fn error(err: &BridgeError) -> Self {
        Self::Error {
            code: err.code().to_string(),
            message: err.to_string(),
            details: err.details(),
        }
    }
}

/// Record pushed on the event stream for every status transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEvent {
    pub status: ConnectionStatus,
}

impl From<ConnectionStatus> for StatusEvent {
    fn from(status: ConnectionStatus) -> Self {
        Self { status }
    }
}

/// Execute one bridge request against the controller. Never panics; every
/// failure comes back as an `Error` response with the diagnostic preserved.
pub async fn dispatch(controller: &TunnelController, request: BridgeRequest) -> BridgeResponse {
    debug!(request = ?request, "bridge_request");
    match handle(controller, request).await {
        Ok(response) => response,
        Err(err) => BridgeResponse::error(&err),
    }
}

/// Dispatch a JSON-encoded request, returning a JSON-encoded response.
/// Transport shims (method channels, JNI, FFI) call this directly.
pub async fn dispatch_json(controller: &TunnelController, request_json: &str) -> String {
    let response = match serde_json::from_str::<BridgeRequest>(request_json) {
        Ok(request) => dispatch(controller, request).await,
        Err(err) => BridgeResponse::error(&BridgeError::Json(err)),
    };
    // BridgeResponse serialization cannot fail; all fields are plain data.
    serde_json::to_string(&response).expect("serialize bridge response")
}

async fn handle(controller: &TunnelController, request: BridgeRequest) -> Result<BridgeResponse> {
    match request {
        BridgeRequest::GenerateKeyPair => Ok(BridgeResponse::KeyPair(keys::generate_key_pair())),
        BridgeRequest::SetupTunnel { tunnel_name } => {
            controller.setup_tunnel(&tunnel_name).await?;
            Ok(BridgeResponse::Unit)
        }
        BridgeRequest::CheckTunnelConfiguration { tunnel_name } => Ok(BridgeResponse::Bool(
            controller.check_tunnel_configuration(&tunnel_name).await,
        )),
        BridgeRequest::Connect { cfg } => {
            controller.connect(&cfg).await?;
            Ok(BridgeResponse::Unit)
        }
        BridgeRequest::Disconnect => {
            controller.disconnect().await?;
            Ok(BridgeResponse::Unit)
        }
        BridgeRequest::Status => Ok(BridgeResponse::Status {
            status: controller.current_status(),
        }),
        BridgeRequest::TunnelStatistics => Ok(BridgeResponse::Statistics(
            controller.statistics_snapshot(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::controller::ControllerConfig;
    use crate::test_support::FakeBackend;

    fn controller(backend: Arc<FakeBackend>) -> TunnelController {
        TunnelController::with_config(
            backend,
            ControllerConfig {
                poll_interval: Duration::from_millis(20),
            },
        )
    }

    #[test]
    fn test_request_wire_format() {
        let request: BridgeRequest =
            serde_json::from_str(r#"{"method":"setup_tunnel","tunnel_name":"peer1"}"#).unwrap();
        assert!(matches!(
            request,
            BridgeRequest::SetupTunnel { ref tunnel_name } if tunnel_name == "peer1"
        ));

        let request: BridgeRequest =
            serde_json::from_str(r#"{"method":"connect","cfg":"[Interface]"}"#).unwrap();
        assert!(matches!(request, BridgeRequest::Connect { .. }));

        let request: BridgeRequest = serde_json::from_str(r#"{"method":"status"}"#).unwrap();
        assert!(matches!(request, BridgeRequest::Status));
    }

    #[test]
    fn test_status_event_wire_format() {
        let event = StatusEvent::from(ConnectionStatus::Connected);
        assert_eq!(
            serde_json::to_string(&event).unwrap(),
            r#"{"status":"connected"}"#
        );
    }

    #[tokio::test]
    async fn test_generate_key_pair_response() {
        let ctrl = controller(FakeBackend::new());
        let response = dispatch(&ctrl, BridgeRequest::GenerateKeyPair).await;
        match response {
            BridgeResponse::KeyPair(pair) => {
                assert!(!pair.private_key.is_empty());
                assert!(!pair.public_key.is_empty());
            }
            other => panic!("unexpected response: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_connect_before_setup_maps_to_error_code() {
        let ctrl = controller(FakeBackend::new());
        let response = dispatch(
            &ctrl,
            BridgeRequest::Connect {
                cfg: "[Interface]\n".to_string(),
            },
        )
        .await;
        match response {
            BridgeResponse::Error { code, .. } => assert_eq!(code, "NOT_CONFIGURED"),
            other => panic!("unexpected response: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_connect_failure_carries_backend_details() {
        let backend = FakeBackend::new();
        backend.fail_up(crate::error::BackendError::config("bad config"));
        let ctrl = controller(backend);
        ctrl.setup_tunnel("peer1").await.unwrap();

        let response = dispatch(
            &ctrl,
            BridgeRequest::Connect {
                cfg: "[Interface]\n".to_string(),
            },
        )
        .await;
        match response {
            BridgeResponse::Error {
                code,
                message,
                details,
            } => {
                assert_eq!(code, "CONNECT_FAILED");
                assert!(message.contains("peer1"));
                assert_eq!(details.as_deref(), Some("bad config"));
            }
            other => panic!("unexpected response: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_full_json_round_trip() {
        let ctrl = controller(FakeBackend::new());

        let response =
            dispatch_json(&ctrl, r#"{"method":"setup_tunnel","tunnel_name":"peer1"}"#).await;
        assert_eq!(response, r#"{"kind":"unit"}"#);

        let response = dispatch_json(&ctrl, r#"{"method":"status"}"#).await;
        assert_eq!(
            response,
            r#"{"kind":"status","value":{"status":"disconnected"}}"#
        );

        let response = dispatch_json(&ctrl, r#"{"method":"tunnel_statistics"}"#).await;
        assert_eq!(response, r#"{"kind":"statistics","value":null}"#);
    }

    #[tokio::test]
    async fn test_malformed_json_is_reported() {
        let ctrl = controller(FakeBackend::new());
        let response = dispatch_json(&ctrl, "{not json").await;
        assert!(response.contains("\"code\":\"NATIVE_ERR\""));
    }
}
