//! HTTP surface: one streamed session route plus the one-shot JSON routes.

use std::convert::Infallible;

use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use chainprobe_core::estimate::Estimator;
use chainprobe_core::multiplexer::frame_channel;
use chainprobe_core::transport::EVENT_STREAM_CONTENT_TYPE;
use chainprobe_core::{Multiplexer, NetworkSelector, Outcome};
use futures::stream;
use serde::Serialize;
use tracing::{info, warn};

use crate::error::ApiError;

/// Frames buffered between the session task and the response body.
const FRAME_BUFFER: usize = 32;

#[derive(Clone)]
pub struct AppState {
    pub multiplexer: Multiplexer,
    pub estimator: Estimator,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/test-transaction-stream", post(stream_session))
        .route(
            "/api/test-transaction",
            post(run_selected).get(describe_routes),
        )
        .route("/api/test-transaction-simple", post(quick_estimate))
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct SingleResponse {
    success: bool,
    result: Outcome,
}

#[derive(Debug, Serialize)]
struct AllResponse {
    success: bool,
    results: Vec<Outcome>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RoutesResponse {
    message: &'static str,
    available_networks: [&'static str; 4],
}

async fn stream_session(State(state): State<AppState>) -> Response {
    let (writer, frames) = frame_channel(FRAME_BUFFER);
    tokio::spawn(async move {
        let report = state.multiplexer.run(writer).await;
        info!(
            session_id = %report.session_id,
            events = report.log.len(),
            end = ?report.end,
            "stream session closed"
        );
    });

    let body = Body::from_stream(stream::unfold(frames, |mut frames| async move {
        frames
            .recv()
            .await
            .map(|frame| (Ok::<_, Infallible>(frame), frames))
    }));
    (
        [
            (header::CONTENT_TYPE, EVENT_STREAM_CONTENT_TYPE),
            (header::CACHE_CONTROL, "no-cache"),
            (header::CONNECTION, "keep-alive"),
        ],
        body,
    )
        .into_response()
}

async fn run_selected(State(state): State<AppState>, body: Bytes) -> Result<Response, ApiError> {
    let selector = read_selector(&body, "Failed to execute test transaction")?;
    Ok(match selector {
        NetworkSelector::One(network) => Json(SingleResponse {
            success: true,
            result: state.multiplexer.run_single(network).await,
        })
        .into_response(),
        NetworkSelector::All => Json(AllResponse {
            success: true,
            results: state.multiplexer.run_quiet().await,
        })
        .into_response(),
    })
}

async fn quick_estimate(State(state): State<AppState>, body: Bytes) -> Result<Response, ApiError> {
    match read_selector(&body, "Failed to execute test")? {
        NetworkSelector::All => Ok(Json(AllResponse {
            success: true,
            results: state.estimator.estimate_all().await,
        })
        .into_response()),
        NetworkSelector::One(_) => Err(ApiError::InvalidNetwork),
    }
}

async fn describe_routes() -> Json<RoutesResponse> {
    Json(RoutesResponse {
        message: "Use POST to test transactions",
        available_networks: NetworkSelector::AVAILABLE,
    })
}

fn read_selector(body: &[u8], context: &'static str) -> Result<NetworkSelector, ApiError> {
    let request: serde_json::Value =
        serde_json::from_slice(body).map_err(|e| ApiError::UnreadableBody {
            context,
            details: e.to_string(),
        })?;
    let selector = request.get("network");
    let Some(raw) = selector.and_then(serde_json::Value::as_str) else {
        warn!(?selector, "selector is not a string");
        return Err(ApiError::InvalidNetwork);
    };
    raw.parse().map_err(|err| {
        warn!(error = %err, "rejected selector");
        ApiError::InvalidNetwork
    })
}
