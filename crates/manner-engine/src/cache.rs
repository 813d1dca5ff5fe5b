//! Per-rule memoization with cancel-and-restart.
//!
//! Each rule tracks the input of its last successful evaluation and at most
//! one attempt in flight. Updating a rule:
//!
//! 1. cancels the attempt in flight, if any
//! 2. returns the cached result when the input equals the last input
//! 3. otherwise starts a new attempt
//!
//! Every attempt is tagged with a ticket. Settlements are broadcast on a
//! per-rule `watch` channel, so a caller whose attempt was superseded waits
//! for a later ticket to settle and returns that instead. Cancellation
//! itself never reaches a caller.

use std::collections::HashMap;
use std::fmt;

use manner_core::{EngineError, FieldValues, Kind, Result, StatusMap};
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::rule::{Rule, RuleId};

#[derive(Clone, Debug)]
enum Outcome<K: Kind> {
    Resolved(StatusMap<K>),
    Failed(EngineError),
    Abandoned,
}

type Settlement<K> = Option<(u64, Outcome<K>)>;

struct Entry<K: Kind> {
    latest: u64,
    last: Option<(FieldValues, StatusMap<K>)>,
    pending: Option<(u64, CancellationToken)>,
    settled: watch::Sender<Settlement<K>>,
}

impl<K: Kind> Entry<K> {
    fn new() -> Self {
        let (settled, _) = watch::channel(None);
        Self {
            latest: 0,
            last: None,
            pending: None,
            settled,
        }
    }

    fn cached_for(&self, input: &FieldValues) -> Option<StatusMap<K>> {
        self.last
            .as_ref()
            .filter(|(last_input, _)| last_input == input)
            .map(|(_, result)| result.clone())
    }

    fn fallback(&self) -> StatusMap<K> {
        self.last
            .as_ref()
            .map(|(_, result)| result.clone())
            .unwrap_or_default()
    }

    fn is_current(&self, ticket: u64) -> bool {
        self.pending.as_ref().is_some_and(|(t, _)| *t == ticket)
    }

    fn publish(&self, ticket: u64, outcome: Outcome<K>) {
        let _ = self.settled.send_replace(Some((ticket, outcome)));
    }

    /// Cancel the attempt in flight and release everyone waiting on it.
    fn abandon(&mut self) {
        if let Some((_, token)) = self.pending.take() {
            token.cancel();
        }
        self.publish(self.latest, Outcome::Abandoned);
    }
}

enum Finish<K: Kind> {
    Fresh(StatusMap<K>),
    Fallback(StatusMap<K>),
    Failed(EngineError),
}

/// Releases waiters if an attempt's future is dropped before settling.
struct AbandonOnDrop<'a, K: Kind> {
    cache: &'a EvaluationCache<K>,
    id: RuleId,
    ticket: u64,
    armed: bool,
}

impl<K: Kind> Drop for AbandonOnDrop<'_, K> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut entries = self.cache.entries.lock();
        if let Some(entry) = entries.get_mut(&self.id) {
            if entry.is_current(self.ticket) {
                debug!(id = %self.id, ticket = self.ticket, "evaluation dropped before settling");
                entry.abandon();
            }
        }
    }
}

/// Memoized, cancellable evaluation state for the rules of one rule set.
pub struct EvaluationCache<K: Kind> {
    entries: Mutex<HashMap<RuleId, Entry<K>>>,
}

impl<K: Kind> EvaluationCache<K> {
    /// An empty cache.
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Bring rule `id` up to date with `input`.
    ///
    /// Returns the cached result when `input` equals the last successful
    /// input. Otherwise evaluates `rule`, cancelling any attempt still in
    /// flight for `id`. A superseded caller resolves with the outcome of the
    /// latest attempt. `on_result` is called once with a fresh result before
    /// this returns; cache hits and superseded callers do not call it.
    ///
    /// A failed evaluation leaves the cached result untouched.
    pub async fn update(
        &self,
        id: RuleId,
        rule: &Rule<K>,
        input: FieldValues,
        on_result: Option<&(dyn Fn(&StatusMap<K>) + Send + Sync)>,
    ) -> Result<StatusMap<K>> {
        let (ticket, cancel, settled) = {
            let mut entries = self.entries.lock();
            let entry = entries.entry(id).or_insert_with(Entry::new);

            if let Some((superseded, token)) = entry.pending.take() {
                debug!(rule = rule.name(), %id, superseded, "cancelling superseded evaluation");
                token.cancel();
            }

            entry.latest += 1;
            let ticket = entry.latest;

            if let Some(result) = entry.cached_for(&input) {
                debug!(rule = rule.name(), %id, "cache hit");
                entry.publish(ticket, Outcome::Resolved(result.clone()));
                return Ok(result);
            }

            let cancel = CancellationToken::new();
            entry.pending = Some((ticket, cancel.clone()));
            (ticket, cancel, entry.settled.subscribe())
        };

        trace!(rule = rule.name(), %id, ticket, "evaluating");
        let mut guard = AbandonOnDrop {
            cache: self,
            id,
            ticket,
            armed: true,
        };
        let outcome = tokio::select! {
            biased;
            () = cancel.cancelled() => Err(EngineError::Cancelled),
            result = rule.evaluate(&input, &cancel) => result,
        };
        guard.armed = false;

        let finish = {
            let mut entries = self.entries.lock();
            entries
                .get_mut(&id)
                .filter(|entry| entry.is_current(ticket))
                .map(|entry| {
                    entry.pending = None;
                    let (published, finish) = match outcome {
                        Ok(result) => {
                            entry.last = Some((input, result.clone()));
                            (Outcome::Resolved(result.clone()), Finish::Fresh(result))
                        }
                        Err(err) if err.is_cancelled() && cancel.is_cancelled() => {
                            (Outcome::Abandoned, Finish::Fallback(entry.fallback()))
                        }
                        Err(err) => {
                            let err = as_evaluation_error(rule, err);
                            (Outcome::Failed(err.clone()), Finish::Failed(err))
                        }
                    };
                    entry.publish(ticket, published);
                    finish
                })
        };

        match finish {
            Some(Finish::Fresh(result)) => {
                debug!(rule = rule.name(), %id, ticket, fields = result.len(), "evaluation settled");
                if let Some(callback) = on_result {
                    callback(&result);
                }
                Ok(result)
            }
            Some(Finish::Fallback(result)) => {
                debug!(rule = rule.name(), %id, ticket, "evaluation gave up");
                Ok(result)
            }
            Some(Finish::Failed(err)) => {
                warn!(rule = rule.name(), %id, ticket, error = %err, "evaluation failed");
                Err(err)
            }
            None => {
                trace!(rule = rule.name(), %id, ticket, "superseded, awaiting latest");
                self.await_latest(id, ticket, settled).await
            }
        }
    }

    async fn await_latest(
        &self,
        id: RuleId,
        ticket: u64,
        mut settled: watch::Receiver<Settlement<K>>,
    ) -> Result<StatusMap<K>> {
        let outcome = match settled
            .wait_for(|s| s.as_ref().is_some_and(|(t, _)| *t >= ticket))
            .await
        {
            Ok(state) => (*state).as_ref().map(|(_, outcome)| outcome.clone()),
            Err(_) => None,
        };
        match outcome {
            Some(Outcome::Resolved(result)) => Ok(result),
            Some(Outcome::Failed(err)) => Err(err),
            Some(Outcome::Abandoned) | None => Ok(self.cached(id).unwrap_or_default()),
        }
    }

    /// The last successful result for `id`, if any.
    pub fn cached(&self, id: RuleId) -> Option<StatusMap<K>> {
        self.entries
            .lock()
            .get(&id)
            .and_then(|entry| entry.last.as_ref().map(|(_, result)| result.clone()))
    }

    /// Whether `id` has a cached result.
    pub fn is_cached(&self, id: RuleId) -> bool {
        self.entries
            .lock()
            .get(&id)
            .is_some_and(|entry| entry.last.is_some())
    }

    /// Whether an evaluation of `id` is in flight.
    pub fn is_pending(&self, id: RuleId) -> bool {
        self.entries
            .lock()
            .get(&id)
            .is_some_and(|entry| entry.pending.is_some())
    }

    /// Forget the cached result of `id` and cancel its evaluation in flight.
    pub fn invalidate(&self, id: RuleId) {
        let mut entries = self.entries.lock();
        if let Some(entry) = entries.get_mut(&id) {
            debug!(%id, "invalidating cached result");
            entry.last = None;
            entry.abandon();
        }
    }

    /// Forget everything and cancel every evaluation in flight.
    pub fn clear(&self) {
        let mut entries = self.entries.lock();
        debug!(rules = entries.len(), "clearing evaluation cache");
        for entry in entries.values_mut() {
            entry.abandon();
        }
        entries.clear();
    }
}

fn as_evaluation_error<K: Kind>(rule: &Rule<K>, err: EngineError) -> EngineError {
    match err {
        EngineError::Evaluation { .. } => err,
        other => EngineError::Evaluation {
            rule: rule.name().to_owned(),
            message: other.to_string(),
        },
    }
}

impl<K: Kind> Default for EvaluationCache<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Kind> fmt::Debug for EvaluationCache<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EvaluationCache")
            .field("rules", &self.entries.lock().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use assert_matches::assert_matches;
    use manner_core::{Status, Validity};
    use serde_json::{Value, json};

    fn input(v: Value) -> FieldValues {
        std::iter::once(("a".to_string(), v)).collect()
    }

    /// Marks `a` invalid with its own value after `delay`, counting calls.
    fn slow_echo(delay: Duration, calls: Arc<AtomicUsize>) -> Rule<Validity> {
        Rule::from_fn(["a"], move |values: FieldValues| {
            let calls = Arc::clone(&calls);
            async move {
                let _ = calls.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(delay).await;
                let mut out = StatusMap::new();
                let _ = out.insert(
                    "a".to_string(),
                    Status::invalid(values["a"].to_string()),
                );
                Ok(out)
            }
        })
        .unwrap()
    }

    fn message(map: &StatusMap<Validity>) -> Option<String> {
        map.get("a")
            .and_then(|s| s.render(&manner_core::LocaleBundle::english()))
    }

    #[tokio::test]
    async fn second_update_with_same_input_is_a_hit() {
        let calls = Arc::new(AtomicUsize::new(0));
        let rule = slow_echo(Duration::ZERO, Arc::clone(&calls));
        let cache = EvaluationCache::new();
        let id = RuleId::new(0);

        let first = cache.update(id, &rule, input(json!(1)), None).await.unwrap();
        let second = cache.update(id, &rule, input(json!(1)), None).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(first, second);
        assert!(cache.is_cached(id));
        assert!(!cache.is_pending(id));
    }

    #[tokio::test]
    async fn changed_input_re_evaluates() {
        let calls = Arc::new(AtomicUsize::new(0));
        let rule = slow_echo(Duration::ZERO, Arc::clone(&calls));
        let cache = EvaluationCache::new();
        let id = RuleId::new(0);

        let _ = cache.update(id, &rule, input(json!(1)), None).await.unwrap();
        let out = cache.update(id, &rule, input(json!(2)), None).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(message(&out).as_deref(), Some("2"));
    }

    #[tokio::test(start_paused = true)]
    async fn superseded_caller_gets_latest_result() {
        let calls = Arc::new(AtomicUsize::new(0));
        let rule = slow_echo(Duration::from_millis(100), Arc::clone(&calls));
        let cache = EvaluationCache::new();
        let id = RuleId::new(0);

        let stale = cache.update(id, &rule, input(json!("stale")), None);
        let fresh = async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            cache.update(id, &rule, input(json!("fresh")), None).await
        };
        let (stale, fresh) = tokio::join!(stale, fresh);

        assert_eq!(message(&stale.unwrap()).as_deref(), Some("\"fresh\""));
        assert_eq!(message(&fresh.unwrap()).as_deref(), Some("\"fresh\""));
        assert_eq!(
            message(&cache.cached(id).unwrap()).as_deref(),
            Some("\"fresh\"")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_attempt_never_lands_in_cache() {
        let calls = Arc::new(AtomicUsize::new(0));
        let rule = slow_echo(Duration::from_millis(100), Arc::clone(&calls));
        let cache = EvaluationCache::new();
        let id = RuleId::new(0);

        let stale = cache.update(id, &rule, input(json!(1)), None);
        let fresh = async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            let out = cache.update(id, &rule, input(json!(2)), None).await;
            // Give the first attempt's timer a chance to have fired.
            tokio::time::sleep(Duration::from_millis(200)).await;
            out
        };
        let _ = tokio::join!(stale, fresh);

        let cached = cache.cached(id).unwrap();
        assert_eq!(message(&cached).as_deref(), Some("2"));
    }

    #[tokio::test]
    async fn failure_keeps_cache_and_retry_re_evaluates() {
        let fail = Arc::new(std::sync::atomic::AtomicBool::new(false));
        let calls = Arc::new(AtomicUsize::new(0));
        let rule = {
            let fail = Arc::clone(&fail);
            let calls = Arc::clone(&calls);
            Rule::<Validity>::from_fn(["a"], move |_| {
                let fail = fail.load(Ordering::SeqCst);
                let _ = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if fail {
                        Err(EngineError::Predicate("backend down".into()))
                    } else {
                        Ok(StatusMap::new())
                    }
                }
            })
            .unwrap()
            .named("lookup")
        };
        let cache = EvaluationCache::new();
        let id = RuleId::new(0);

        let _ = cache.update(id, &rule, input(json!(1)), None).await.unwrap();

        fail.store(true, Ordering::SeqCst);
        let err = cache
            .update(id, &rule, input(json!(2)), None)
            .await
            .unwrap_err();
        assert_matches!(err, EngineError::Evaluation { ref rule, .. } if rule == "lookup");
        assert!(cache.is_cached(id));
        assert!(!cache.is_pending(id));

        let again = cache.update(id, &rule, input(json!(2)), None).await;
        assert!(again.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);

        // The earlier success is still served.
        let _ = cache.update(id, &rule, input(json!(1)), None).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn cancelled_error_without_cancellation_is_a_failure() {
        let rule = Rule::<Validity>::from_fn(["a"], |values: FieldValues| async move {
            if values["a"] == json!(1) {
                let mut out = StatusMap::new();
                let _ = out.insert("a".to_string(), Status::invalid("for input 1"));
                Ok(out)
            } else {
                Err(EngineError::Cancelled)
            }
        })
        .unwrap()
        .named("aborting");
        let cache = EvaluationCache::new();
        let id = RuleId::new(0);

        let _ = cache.update(id, &rule, input(json!(1)), None).await.unwrap();
        let err = cache
            .update(id, &rule, input(json!(2)), None)
            .await
            .unwrap_err();

        assert_matches!(err, EngineError::Evaluation { ref rule, .. } if rule == "aborting");
        assert!(!cache.is_pending(id));
        assert_eq!(
            message(&cache.cached(id).unwrap()).as_deref(),
            Some("for input 1")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn returning_to_cached_input_cancels_pending_and_hits() {
        let calls = Arc::new(AtomicUsize::new(0));
        let rule = slow_echo(Duration::from_millis(100), Arc::clone(&calls));
        let cache = EvaluationCache::new();
        let id = RuleId::new(0);

        let _ = cache.update(id, &rule, input(json!(0)), None).await.unwrap();

        let superseded = cache.update(id, &rule, input(json!(1)), None);
        let back = async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            assert!(cache.is_pending(id));
            cache.update(id, &rule, input(json!(0)), None).await
        };
        let (superseded, back) = tokio::join!(superseded, back);

        assert_eq!(message(&superseded.unwrap()).as_deref(), Some("0"));
        assert_eq!(message(&back.unwrap()).as_deref(), Some("0"));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(!cache.is_pending(id));

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(message(&cache.cached(id).unwrap()).as_deref(), Some("0"));
    }

    #[tokio::test]
    async fn callback_sees_fresh_results_only() {
        let calls = Arc::new(AtomicUsize::new(0));
        let rule = slow_echo(Duration::ZERO, Arc::new(AtomicUsize::new(0)));
        let cache = EvaluationCache::new();
        let id = RuleId::new(0);
        let seen = Arc::clone(&calls);
        let callback = move |_: &StatusMap<Validity>| {
            let _ = seen.fetch_add(1, Ordering::SeqCst);
        };

        let _ = cache
            .update(id, &rule, input(json!(1)), Some(&callback))
            .await
            .unwrap();
        let _ = cache
            .update(id, &rule, input(json!(1)), Some(&callback))
            .await
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_attempt_releases_waiters() {
        let rule = slow_echo(Duration::from_millis(100), Arc::new(AtomicUsize::new(0)));
        let cache = EvaluationCache::new();
        let id = RuleId::new(0);

        let first = cache.update(id, &rule, input(json!(1)), None);
        let second = async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            // Start the latest attempt, then abandon it.
            let latest = cache.update(id, &rule, input(json!(2)), None);
            let _ = tokio::time::timeout(Duration::from_millis(10), latest).await;
        };
        let (first, ()) = tokio::join!(first, second);

        assert!(first.unwrap().is_empty());
        assert!(!cache.is_pending(id));
        assert!(!cache.is_cached(id));
    }

    #[tokio::test(start_paused = true)]
    async fn clear_releases_waiters() {
        let rule = slow_echo(Duration::from_millis(100), Arc::new(AtomicUsize::new(0)));
        let cache = EvaluationCache::new();
        let id = RuleId::new(0);

        let pending = cache.update(id, &rule, input(json!(1)), None);
        let clear = async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            assert!(cache.is_pending(id));
            cache.clear();
        };
        let (out, ()) = tokio::join!(pending, clear);

        assert!(out.unwrap().is_empty());
        assert!(!cache.is_cached(id));
    }

    #[tokio::test]
    async fn invalidate_forces_re_evaluation() {
        let calls = Arc::new(AtomicUsize::new(0));
        let rule = slow_echo(Duration::ZERO, Arc::clone(&calls));
        let cache = EvaluationCache::new();
        let id = RuleId::new(0);

        let _ = cache.update(id, &rule, input(json!(1)), None).await.unwrap();
        cache.invalidate(id);
        assert!(!cache.is_cached(id));
        let _ = cache.update(id, &rule, input(json!(1)), None).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn rules_are_cached_independently() {
        let calls = Arc::new(AtomicUsize::new(0));
        let rule = slow_echo(Duration::ZERO, Arc::clone(&calls));
        let cache = EvaluationCache::new();

        let _ = cache
            .update(RuleId::new(0), &rule, input(json!(1)), None)
            .await
            .unwrap();
        let _ = cache
            .update(RuleId::new(1), &rule, input(json!(1)), None)
            .await
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(format!("{cache:?}"), "EvaluationCache { rules: 2 }");
    }
}
