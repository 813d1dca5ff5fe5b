//! # manner-predicates
//!
//! Predicates check field values and answer with a validity [`Status`].
//!
//! - [`Predicate`]: the async trait every check implements
//! - [`leaves`]: ready-made checks (`at_least`, `not_empty`, `matches`, ...)
//!   with localized failure messages from the `predicates` bundle category
//! - [`combinators`]: `and`, `or` and `with_message`
//! - [`predicate::from_fn`], [`predicate::from_bool`], [`predicate::multi`]:
//!   adapt plain closures
//!
//! [`Status`]: manner_core::Status

#![deny(unsafe_code)]

pub mod combinators;
pub mod leaves;
pub mod predicate;
pub mod semantics;

pub use combinators::{and, or, with_message};
pub use leaves::*;
pub use predicate::{Predicate, SharedPredicate, from_bool, from_fn, multi};
