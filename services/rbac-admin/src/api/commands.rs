//! Free-text command endpoint.
//!
//! # Purpose
//! Accepts `{ "command": "..." }`, hands the text to the
//! [`CommandInterpreter`](crate::interpreter::CommandInterpreter), and returns
//! its reply. Interpreter outcomes, failures included, are always a 200; a
//! missing or non-string `command` is a 400, and a body that cannot be parsed
//! or an aborted interpreter task is a 500.
use crate::api::error::{ApiError, api_internal_message, api_validation_error};
use crate::api::types::CommandResponse;
use crate::app::AppState;
use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use serde_json::Value;

const COMMAND_REQUIRED: &str = "Command is required";
const COMMAND_FAILED: &str = "Failed to process command";

/// Pull the `command` string out of an arbitrary JSON body. An empty string
/// counts as missing; whitespace is left for the interpreter to judge.
fn command_text(body: &Value) -> Option<&str> {
    body.get("command")
        .and_then(Value::as_str)
        .filter(|command| !command.is_empty())
}

#[utoipa::path(
    post,
    path = "/natural-language",
    tag = "commands",
    request_body = crate::api::types::CommandRequest,
    responses(
        (status = 200, description = "Interpreter reply", body = CommandResponse),
        (status = 400, description = "Missing or non-string command", body = crate::api::types::ErrorResponse),
        (status = 500, description = "Unreadable body or command processing aborted", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn run_command(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<CommandResponse>, ApiError> {
    let body: Value = serde_json::from_slice(&body).map_err(|err| {
        tracing::warn!(error = %err, "unreadable command body");
        api_internal_message(COMMAND_FAILED)
    })?;
    let command = command_text(&body)
        .ok_or_else(|| api_validation_error(COMMAND_REQUIRED))?
        .trim();
    let text = if state.lowercase_commands {
        command.to_lowercase()
    } else {
        command.to_string()
    };

    let interpreter = state.interpreter.clone();
    let reply = tokio::spawn(async move { interpreter.evaluate(&text).await })
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, "command task aborted");
            api_internal_message(COMMAND_FAILED)
        })?;
    Ok(Json(CommandResponse {
        result: reply.message,
        status: reply.status.as_str().to_string(),
    }))
}
