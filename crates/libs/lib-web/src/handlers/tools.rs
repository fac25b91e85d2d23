//! # Tool Handlers
//!
//! Coin-gated image tool endpoints. Every run follows the same contract:
//! validate the input first (free), then reserve the tool price, run the
//! CPU-bound pipeline on a blocking thread, and settle the hold - commit on
//! success, release on failure so a broken image never costs coins.

use crate::services::{ActionGate, Hold};
use axum::extract::{Extension, Json, State};
use lib_auth::Claims;
use lib_core::dto::{RemoveBackgroundRequest, ResizeRequest, ToolRunResponse};
use lib_core::{AppError, Result, ToolId};
use lib_tools::{BackgroundRemover, ImageTool, Resizer, ToolError};
use lib_utils::{b64_decode, data_url_png};
use tracing::{debug, info, instrument, warn};

/// `POST /api/tools/resize` - scale an image by a factor in [0.5, 4.0].
#[instrument(skip(claims, gate, req), fields(username = %claims.username, scale = req.scale))]
pub async fn resize(
    Extension(claims): Extension<Claims>,
    State(gate): State<ActionGate>,
    Json(req): Json<ResizeRequest>,
) -> Result<Json<ToolRunResponse>> {
    // Scale validation is free; no coins move for a bad request
    let resizer = Resizer::new(req.scale).map_err(invalid_input)?;
    run_gated(&claims, &gate, ToolId::Resize, resizer, &req.image).await
}

/// `POST /api/tools/remove-background` - make background pixels transparent.
#[instrument(skip(claims, gate, req), fields(username = %claims.username))]
pub async fn remove_background(
    Extension(claims): Extension<Claims>,
    State(gate): State<ActionGate>,
    Json(req): Json<RemoveBackgroundRequest>,
) -> Result<Json<ToolRunResponse>> {
    run_gated(
        &claims,
        &gate,
        ToolId::RemoveBackground,
        BackgroundRemover::new(),
        &req.image,
    )
    .await
}

/// Reserve, run, settle.
///
/// The sequence runs on a spawned task the handler merely awaits. When a
/// client disconnects mid-run, axum drops the handler future but the task
/// keeps going, so every hold is still committed or released.
async fn run_gated<T>(
    claims: &Claims,
    gate: &ActionGate,
    tool_id: ToolId,
    tool: T,
    image_b64: &str,
) -> Result<Json<ToolRunResponse>>
where
    T: ImageTool + Send + 'static,
{
    let user_id = claims
        .user_id()
        .map_err(|e| AppError::Unauthenticated(e.to_string()))?;

    let input = b64_decode(image_b64)
        .map_err(|_| AppError::InvalidInput("Image is not valid base64".to_string()))?;
    if input.is_empty() {
        return Err(AppError::InvalidInput("Image payload is empty".to_string()));
    }

    let gate = gate.clone();
    let task = tokio::spawn(async move {
        let hold = gate.reserve(user_id, tool_id).await?;

        info!(
            user_id,
            tool = %tool_id,
            input_bytes = input.len(),
            "[TOOLS] Pipeline starting"
        );

        let name = tool.name();
        let run = tokio::task::spawn_blocking(move || {
            let mut progress = |pct: u8| {
                debug!(tool = name, pct, "[TOOLS] Progress");
            };
            tool.process(&input, &mut progress)
        })
        .await;

        let result = match run {
            Ok(result) => result,
            Err(e) => {
                // Worker panicked; refund before reporting
                warn!(user_id, tool = %tool_id, "[TOOLS] Worker failed: {}", e);
                settle_failure(&gate, hold).await;
                return Err(AppError::Internal(format!("Tool worker failed: {}", e)));
            }
        };

        match result {
            Ok(processed) => {
                let balance = gate.commit(hold).await?;
                info!(
                    user_id,
                    tool = %tool_id,
                    width = processed.width,
                    height = processed.height,
                    charged = hold.amount,
                    balance,
                    "[TOOLS] Pipeline complete"
                );
                Ok(Json(ToolRunResponse {
                    data_url: data_url_png(&processed.png),
                    width: processed.width,
                    height: processed.height,
                    charged: hold.amount,
                    balance,
                }))
            }
            Err(e) => {
                warn!(user_id, tool = %tool_id, "[TOOLS] Pipeline failed: {}", e);
                settle_failure(&gate, hold).await;
                Err(AppError::Processing(e.to_string()))
            }
        }
    });

    task.await
        .map_err(|e| AppError::Internal(format!("Tool task failed: {}", e)))?
}

/// Release a hold after a failed run; a failed refund is logged, never
/// surfaced over the original failure.
async fn settle_failure(gate: &ActionGate, hold: Hold) {
    if let Err(e) = gate.release(hold).await {
        warn!(entry_id = hold.entry_id, "[TOOLS] Refund failed: {}", e);
    }
}

fn invalid_input(e: ToolError) -> AppError {
    AppError::InvalidInput(e.to_string())
}
