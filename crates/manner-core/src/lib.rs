//! # manner-core
//!
//! Foundation types shared by every manner crate.
//!
//! - **Kinds**: [`Validity`] and [`Condition`], each carrying its own dominance order
//! - **Status**: [`Status`], an immutable kind plus a lazily rendered [`Message`]
//! - **Combiner**: [`combine_with_priority`] and [`merge_status_maps`]
//! - **Values**: [`FieldValues`], [`StatusMap`] and the read-only [`Model`] accessor
//! - **Localization**: [`LocaleBundle`], passed opaquely to message functions
//! - **Errors**: [`EngineError`] via `thiserror`

#![deny(unsafe_code)]

pub mod combine;
pub mod errors;
pub mod i18n;
pub mod logging;
pub mod status;
pub mod values;

pub use combine::{combine_with_priority, merge_status_maps};
pub use errors::{EngineError, Result};
pub use i18n::{LocaleBundle, Template};
pub use status::{Condition, ConditionStatus, Kind, Message, Status, Validity, ValidityStatus};
pub use values::{FieldValues, Model, StatusMap, slice};
