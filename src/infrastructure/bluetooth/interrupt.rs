//! Cancellation helpers for pipeline suspension points.

use crate::domain::errors::PipelineError;
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Drive `fut` unless `token` fires first.
pub async fn until_cancelled<F>(
    token: &CancellationToken,
    fut: F,
) -> Result<F::Output, PipelineError>
where
    F: Future,
{
    if token.is_cancelled() {
        return Err(PipelineError::Interrupted);
    }
    tokio::select! {
        biased;
        _ = token.cancelled() => Err(PipelineError::Interrupted),
        out = fut => Ok(out),
    }
}

pub async fn sleep(token: &CancellationToken, duration: Duration) -> Result<(), PipelineError> {
    until_cancelled(token, tokio::time::sleep(duration)).await
}
