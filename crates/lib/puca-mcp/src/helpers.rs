use std::borrow::Cow;
use std::fmt::Display;

use puca_core::control::ControlError;
use rmcp::ErrorData;
use rmcp::model::{CallToolResult, Content, ErrorCode};
use tracing::warn;

pub(crate) fn mcp_err(code: ErrorCode, message: impl Into<Cow<'static, str>>) -> ErrorData {
    ErrorData {
        code,
        message: message.into(),
        data: None,
    }
}

/// Renders a successful control-plane result as text. Failures the caller can
/// act on become error results; only cancellation is a protocol error.
pub(crate) fn tool_result<T: Display>(
    result: Result<T, ControlError>,
) -> Result<CallToolResult, ErrorData> {
    match result {
        Ok(body) => Ok(CallToolResult::success(vec![Content::text(body.to_string())])),
        Err(err) => tool_error(&err),
    }
}

pub(crate) fn tool_error(err: &ControlError) -> Result<CallToolResult, ErrorData> {
    if matches!(err, ControlError::Cancelled) {
        return Err(mcp_err(ErrorCode::INTERNAL_ERROR, "request cancelled"));
    }
    warn!(error = %err, "tool request failed");
    Ok(CallToolResult::error(vec![Content::text(err.to_string())]))
}
