//! Structured fan-out of independent tasks.
//!
//! Spawns every task, joins all of them, and returns one result per key.
//! A failing, panicking or timed-out task only affects its own entry.

use futures::FutureExt;
use std::any::Any;
use std::collections::HashMap;
use std::fmt::Display;
use std::future::Future;
use std::hash::Hash;
use std::panic::AssertUnwindSafe;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinSet;
use tracing::{debug, warn};

/// Why a fanned-out task produced no value.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TaskError {
    #[error("{0}")]
    Failed(String),

    #[error("Timed out after {0:?}")]
    TimedOut(Duration),

    #[error("Task panicked: {0}")]
    Panicked(String),

    #[error("Task did not complete")]
    Lost,
}

/// Run every task concurrently and collect `key -> result`.
///
/// Keys must be unique. `deadline` bounds each task individually.
/// `on_complete` is called on the joining task as results arrive.
pub async fn fan_out<K, T, E, Fut, F>(
    tasks: Vec<(K, Fut)>,
    deadline: Option<Duration>,
    mut on_complete: F,
) -> HashMap<K, Result<T, TaskError>>
where
    K: Eq + Hash + Clone + Send + 'static,
    T: Send + 'static,
    E: Display + Send + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
    F: FnMut(&K, &Result<T, TaskError>),
{
    let keys: Vec<K> = tasks.iter().map(|(key, _)| key.clone()).collect();
    let mut set = JoinSet::new();

    for (key, task) in tasks {
        set.spawn(async move {
            let guarded = AssertUnwindSafe(task).catch_unwind();

            let outcome = match deadline {
                Some(limit) => match tokio::time::timeout(limit, guarded).await {
                    Ok(outcome) => outcome,
                    Err(_) => return (key, Err(TaskError::TimedOut(limit))),
                },
                None => guarded.await,
            };

            let result = match outcome {
                Ok(Ok(value)) => Ok(value),
                Ok(Err(e)) => Err(TaskError::Failed(e.to_string())),
                Err(panic) => Err(TaskError::Panicked(panic_message(panic.as_ref()))),
            };
            (key, result)
        });
    }

    debug!("Dispatched {} tasks", keys.len());

    let mut results = HashMap::with_capacity(keys.len());
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok((key, result)) => {
                on_complete(&key, &result);
                results.insert(key, result);
            }
            Err(e) => warn!("Task ended abnormally: {}", e),
        }
    }

    for key in keys {
        if !results.contains_key(&key) {
            let lost = Err(TaskError::Lost);
            on_complete(&key, &lost);
            results.insert(key, lost);
        }
    }

    results
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
