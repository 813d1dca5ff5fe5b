//! # manner-engine
//!
//! Incremental evaluation of field rules against a changing model.
//!
//! A [`RuleSet`] slices the model once per [`Rule`], asks its
//! [`EvaluationCache`] to bring each rule up to date, and merges the
//! per-field outputs with the status combiner.
//!
//! ## Evaluation model
//!
//! - **Memoized**: a rule whose input slice is unchanged is never re-run.
//! - **Latest input wins**: a new input for a rule cancels the evaluation
//!   still in flight for it. Cancellation is absorbed by the cache and never
//!   reaches the caller.
//! - **Concurrent**: all rules of one call run concurrently on the calling
//!   task; the merge order is the declaration order.
//!
//! ## Example
//!
//! ```rust,ignore
//! use manner_engine::{Conditions, bind_single, enable, when};
//! use manner_predicates::at_least;
//!
//! let adults = bind_single("age", at_least(18))?;
//! let conditions = Conditions::new(vec![when(adults, vec![enable(["license"])])?]);
//! let statuses = conditions.evaluate(&serde_json::json!({"age": 16})).await?;
//! ```

#![deny(unsafe_code)]

pub mod bind;
pub mod cache;
pub mod conditions;
pub mod debounce;
pub mod locale;
pub mod logging;
pub mod rule;
pub mod ruleset;

pub use bind::{any, bind_many, bind_single};
pub use cache::EvaluationCache;
pub use conditions::{Action, disable, enable, hide, show, when};
pub use debounce::{Debounced, debounce};
pub use locale::load_bundle;
pub use logging::init_logging;
pub use rule::{Evaluator, Rule, RuleId};
pub use ruleset::{Conditions, RuleSet, RuleSetOptions, Validators};
