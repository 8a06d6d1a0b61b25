use std::time::Duration;

use adflux_core::AdfluxError;

/// Join a collection of tasks and apply an optional deadline.
///
/// This wraps `futures::future::join_all(tasks)`; results keep the order of
/// `tasks`. On expiry returns `AdfluxError::RequestTimeout(operation)`.
///
/// # Errors
/// Returns `RequestTimeout` when the deadline elapses before every task
/// completes.
pub async fn join_with_deadline<I, F, T>(
    tasks: I,
    deadline: Option<Duration>,
    operation: &str,
) -> Result<Vec<T>, AdfluxError>
where
    I: IntoIterator<Item = F>,
    F: std::future::Future<Output = T>,
{
    crate::core::with_request_deadline(deadline, operation, futures::future::join_all(tasks)).await
}
