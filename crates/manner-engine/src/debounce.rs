//! Debounced evaluators.
//!
//! A debounced evaluator waits out a delay before running the wrapped one.
//! If the evaluation is cancelled during the wait, the wrapped evaluator is
//! never called.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use manner_core::{EngineError, FieldValues, Kind, Result, StatusMap};
use tokio_util::sync::CancellationToken;
use tracing::trace;

use crate::rule::Evaluator;

/// An evaluator that sleeps for `delay` before delegating.
pub struct Debounced<K: Kind> {
    delay: Duration,
    inner: Arc<dyn Evaluator<K>>,
}

impl<K: Kind> Debounced<K> {
    /// Wrap `inner` behind a delay.
    pub fn new(delay: Duration, inner: Arc<dyn Evaluator<K>>) -> Self {
        Self { delay, inner }
    }

    /// The configured delay.
    pub fn delay(&self) -> Duration {
        self.delay
    }
}

#[async_trait]
impl<K: Kind> Evaluator<K> for Debounced<K> {
    async fn evaluate(
        &self,
        values: &FieldValues,
        cancel: &CancellationToken,
    ) -> Result<StatusMap<K>> {
        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                trace!(delay_ms = self.delay.as_millis(), "debounce interrupted");
                return Err(EngineError::Cancelled);
            }
            () = tokio::time::sleep(self.delay) => {}
        }
        self.inner.evaluate(values, cancel).await
    }
}

/// Wrap `evaluator` so each call first waits `delay`.
pub fn debounce<K: Kind>(delay: Duration, evaluator: Arc<dyn Evaluator<K>>) -> Arc<dyn Evaluator<K>> {
    Arc::new(Debounced::new(delay, evaluator))
}
