// src/core/deadline.rs

//! Bounded execution for blocking calls that may never return.
//!
//! The closure runs on its own detached OS thread. If it has not produced a
//! value when the deadline passes, the caller gets [`DeadlineError::Elapsed`]
//! and the thread is left to finish (or hang) on its own.

use std::thread;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::oneshot;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum DeadlineError {
    #[error("'{task}' did not finish within {deadline:?}")]
    Elapsed { task: String, deadline: Duration },

    #[error("'{task}' stopped without producing a result")]
    Abandoned { task: String },

    #[error("failed to spawn worker for '{task}': {source}")]
    Spawn {
        task: String,
        #[source]
        source: std::io::Error,
    },
}

/// Runs `f` on a detached worker thread and waits at most `deadline` for its result.
///
/// A panic inside `f` surfaces as [`DeadlineError::Abandoned`].
pub async fn run_with_deadline<T, F>(task: &str, deadline: Duration, f: F) -> Result<T, DeadlineError>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    let (tx, rx) = oneshot::channel();

    debug!(task, ?deadline, "Spawning deadline-bound worker.");
    thread::Builder::new()
        .name(format!("deadline-{task}"))
        .spawn(move || {
            // The receiver is gone once the deadline has passed; the value is simply dropped.
            let _ = tx.send(f());
        })
        .map_err(|source| DeadlineError::Spawn { task: task.to_string(), source })?;

    match tokio::time::timeout(deadline, rx).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(_)) => {
            warn!(task, "Worker ended without sending a result.");
            Err(DeadlineError::Abandoned { task: task.to_string() })
        }
        Err(_) => {
            warn!(task, ?deadline, "Deadline exceeded, detaching worker.");
            Err(DeadlineError::Elapsed { task: task.to_string(), deadline })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[tokio::test]
    async fn returns_value_when_call_is_fast() {
        let value = run_with_deadline("fast", Duration::from_secs(1), || 21 * 2).await.unwrap();
        assert_eq!(value, 42);
    }

    #[tokio::test]
    async fn hung_call_is_abandoned_at_the_deadline() {
        let started = Instant::now();
        let result = run_with_deadline("hang", Duration::from_millis(200), || -> u32 {
            loop {
                thread::park();
            }
        })
        .await;

        assert!(matches!(result, Err(DeadlineError::Elapsed { .. })));
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn panicking_call_is_reported() {
        let result: Result<(), _> =
            run_with_deadline("boom", Duration::from_secs(1), || panic!("worker failure")).await;
        assert!(matches!(result, Err(DeadlineError::Abandoned { .. })));
    }
}
