//! API Server Module
//!
//! JSON-RPC server through which clients submit transactions. Each
//! submission is validated against current ledger state and answered with
//! either an acceptance or the result codes explaining the rejection.

use crate::{
    config::ApiConfig,
    error::ValidationError,
    results::{ResultCodes, ValidationResult},
    transaction::{TransactionEnvelope, TransactionFrame},
    types::AccountId,
    validation::{cancellation, ValidationManager},
};
use axum::{extract::State, routing::post, Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// JSON-RPC error codes used by the gateway.
pub const METHOD_NOT_FOUND: i32 = -32601;
pub const INVALID_PARAMS: i32 = -32602;
pub const INTERNAL_ERROR: i32 = -32603;
/// Validation could not finish; the client should submit again later.
pub const RETRYABLE: i32 = -32002;

/// Shared application state that is accessible across all request handlers
#[derive(Clone)]
pub struct AppState {
    manager: Arc<ValidationManager>,
    timeout: Duration,
}

impl AppState {
    /// # Arguments
    /// * `manager` - Validation manager shared by all requests
    /// * `timeout` - How long one submission may spend validating
    pub fn new(manager: Arc<ValidationManager>, timeout: Duration) -> Self {
        Self { manager, timeout }
    }
}

/// Builds the router serving JSON-RPC on `POST /`.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", post(handle_rpc))
        .with_state(state)
}

/// The main API server struct
pub struct Server {
    config: ApiConfig,
    state: AppState,
}

impl Server {
    /// Creates a new API server instance
    ///
    /// # Arguments
    /// * `config` - Address to bind
    /// * `state` - Handler state built in `main`
    pub fn new(config: ApiConfig, state: AppState) -> Self {
        Self { config, state }
    }

    /// Binds the configured address and serves until the listener fails.
    pub async fn start(self) -> anyhow::Result<()> {
        let app = router(self.state);

        let addr = format!("{}:{}", self.config.host, self.config.port);
        info!("API server listening on {}", addr);

        let listener = tokio::net::TcpListener::bind(&addr).await?;
        axum::serve(listener, app).await?;

        Ok(())
    }
}

/// JSON-RPC 2.0 request structure
#[derive(Debug, Deserialize)]
struct JsonRpcRequest {
    #[allow(dead_code)]
    jsonrpc: String,
    method: String,
    #[serde(default)]
    params: Value,
    id: Value,
}

/// JSON-RPC 2.0 response structure. Exactly one of `result` and `error`
/// is set.
#[derive(Debug, Serialize)]
struct JsonRpcResponse {
    jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Submission>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<JsonRpcError>,
    id: Value,
}

#[derive(Debug, Serialize)]
struct JsonRpcError {
    code: i32,
    message: String,
}

impl JsonRpcResponse {
    fn result(id: Value, submission: Submission) -> Json<Self> {
        Json(Self {
            jsonrpc: "2.0".to_string(),
            result: Some(submission),
            error: None,
            id,
        })
    }

    fn error(id: Value, code: i32, message: impl Into<String>) -> Json<Self> {
        Json(Self {
            jsonrpc: "2.0".to_string(),
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
            }),
            id,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum SubmissionStatus {
    /// Would be accepted by the ledger as it stands now.
    Accepted,
    /// Definitively invalid; resubmitting unchanged will not help.
    Rejected,
}

/// Answer to `submitTransaction`.
#[derive(Debug, Serialize)]
struct Submission {
    status: SubmissionStatus,
    source_account: AccountId,
    seq_num: i64,
    result_codes: ResultCodes,
}

impl Submission {
    fn from_result(frame: &TransactionFrame, result: &ValidationResult) -> Self {
        let status = if result.is_success() {
            SubmissionStatus::Accepted
        } else {
            SubmissionStatus::Rejected
        };
        Self {
            status,
            source_account: frame.source_account().clone(),
            seq_num: frame.seq_num(),
            result_codes: result.result_codes(),
        }
    }
}

/// Main RPC handler that dispatches requests to specific methods
///
/// # Arguments
/// * `state` - Shared application state (injected by Axum)
/// * `request` - The JSON-RPC request
///
/// # Returns
/// A JSON-RPC response (either a submission result or an error)
async fn handle_rpc(
    State(state): State<AppState>,
    Json(request): Json<JsonRpcRequest>,
) -> Json<JsonRpcResponse> {
    info!("Received RPC request: {}", request.method);

    match request.method.as_str() {
        "submitTransaction" => handle_submit_transaction(state, request).await,
        _ => JsonRpcResponse::error(request.id, METHOD_NOT_FOUND, "Method not found"),
    }
}

/// Handles the "submitTransaction" RPC method
///
/// # Process
/// 1. Deserializes the envelope from the params
/// 2. Builds the transaction frame stamped with the current time
/// 3. Validates it in its own task under the configured timeout
/// 4. Answers accepted, rejected with result codes, or with an error
///
/// When the deadline passes the task is told to stop at the next operation
/// boundary and the client gets a retryable error.
///
/// # Arguments
/// * `state` - Shared application state
/// * `request` - The JSON-RPC request containing the envelope
///
/// # Returns
/// A JSON-RPC response carrying a `Submission` or an error code
async fn handle_submit_transaction(
    state: AppState,
    request: JsonRpcRequest,
) -> Json<JsonRpcResponse> {
    // Step 1: Deserialize the envelope from the request parameters
    let envelope: TransactionEnvelope = match serde_json::from_value(request.params) {
        Ok(envelope) => envelope,
        Err(e) => {
            error!("Failed to deserialize transaction: {}", e);
            return JsonRpcResponse::error(request.id, INVALID_PARAMS, format!("Invalid params: {}", e));
        }
    };

    // Step 2: Time bounds are judged against the moment of arrival
    let mut frame = TransactionFrame::new(envelope, Utc::now());
    info!(
        "Processing transaction {}:{} with {} operations",
        frame.source_account(),
        frame.seq_num(),
        frame.operations().len()
    );

    // Step 3: Validate off the request task so a timeout can abandon it
    let (handle, signal) = cancellation();
    let manager = state.manager.clone();
    let task = tokio::spawn(async move {
        let outcome = manager.validate_with_cancel(&mut frame, &signal).await;
        (frame, outcome)
    });

    // Step 4: Map the outcome onto the response
    match tokio::time::timeout(state.timeout, task).await {
        Ok(Ok((frame, Ok(result)))) => {
            if !result.is_success() {
                warn!(
                    "Transaction {}:{} rejected: {}",
                    frame.source_account(),
                    frame.seq_num(),
                    result.code()
                );
            }
            JsonRpcResponse::result(request.id, Submission::from_result(&frame, &result))
        }
        Ok(Ok((_, Err(e)))) => validation_error(request.id, e),
        Ok(Err(join_error)) => {
            error!("Validation task failed: {}", join_error);
            JsonRpcResponse::error(request.id, INTERNAL_ERROR, "Internal error")
        }
        Err(_) => {
            handle.cancel();
            warn!("Validation timed out after {:?}", state.timeout);
            JsonRpcResponse::error(request.id, RETRYABLE, "Validation timed out, retry later")
        }
    }
}

fn validation_error(id: Value, err: ValidationError) -> Json<JsonRpcResponse> {
    if err.is_retryable() {
        warn!("Validation could not complete: {}", err);
        JsonRpcResponse::error(id, RETRYABLE, format!("Retryable: {}", err))
    } else {
        error!("Validation failed: {}", err);
        JsonRpcResponse::error(id, INTERNAL_ERROR, "Internal error")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::amount::Amount;
    use crate::history::{AccountHistoryCache, MemoryHistory};
    use crate::restrictions::RestrictionPolicy;
    use crate::state::MemoryLedger;
    use crate::types::{AccountEntry, LedgerHeader};
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::json;
    use tower::ServiceExt;

    async fn test_router() -> (Router, Arc<MemoryLedger>) {
        let ledger = Arc::new(MemoryLedger::new(LedgerHeader {
            sequence: 100,
            close_time: 1_700_000_000,
            base_fee: 100,
            base_reserve: Amount::from_whole(10).unwrap(),
            inflation_seq: 0,
            max_tx_set_size: 100,
        }));
        for (name, balance) in [("GA", 1000), ("GB", 0)] {
            ledger
                .put_account(AccountEntry::new(
                    AccountId::new(name),
                    Amount::from_whole(balance).unwrap(),
                    1,
                ))
                .await;
        }
        let cache = Arc::new(AccountHistoryCache::new(Arc::new(MemoryHistory::new())));
        let manager = Arc::new(ValidationManager::new(
            ledger.clone(),
            cache,
            RestrictionPolicy::unlimited(),
        ));
        let state = AppState::new(manager, Duration::from_secs(5));
        (router(state), ledger)
    }

    async fn call(app: Router, body: Value) -> Value {
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn submit(seq_num: i64, amount: &str) -> Value {
        json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "submitTransaction",
            "params": {
                "source_account": "GA",
                "fee": 100,
                "seq_num": seq_num,
                "operations": [
                    {"body": {"type": "payment", "destination": "GB",
                              "asset": {"type": "native"}, "amount": amount}}
                ]
            }
        })
    }

    #[tokio::test]
    async fn test_accepted_submission() {
        let (app, _) = test_router().await;
        let response = call(app, submit(2, "90")).await;
        assert_eq!(response["result"]["status"], "accepted");
        assert_eq!(response["result"]["result_codes"]["transaction"], "tx_success");
        assert_eq!(response["id"], 1);
    }

    #[tokio::test]
    async fn test_rejected_submission_carries_codes() {
        let (app, _) = test_router().await;
        let response = call(app, submit(7, "90")).await;
        assert_eq!(response["result"]["status"], "rejected");
        assert_eq!(response["result"]["result_codes"]["transaction"], "tx_bad_seq");
        assert_eq!(
            response["result"]["result_codes"]["operations"],
            json!(["op_not_attempted"])
        );
    }

    #[tokio::test]
    async fn test_store_outage_is_retryable() {
        let (app, ledger) = test_router().await;
        ledger.set_unavailable(true).await;
        let response = call(app, submit(2, "90")).await;
        assert_eq!(response["error"]["code"], RETRYABLE);
        assert!(response.get("result").is_none());
    }

    #[tokio::test]
    async fn test_unknown_method_and_bad_params() {
        let (app, _) = test_router().await;
        let response = call(
            app.clone(),
            json!({"jsonrpc": "2.0", "id": 2, "method": "sendTransaction", "params": {}}),
        )
        .await;
        assert_eq!(response["error"]["code"], METHOD_NOT_FOUND);

        let mut bad = submit(2, "90");
        bad["params"]["operations"][0]["body"]["type"] = json!("teleport");
        let response = call(app, bad).await;
        assert_eq!(response["error"]["code"], INVALID_PARAMS);
    }
}
