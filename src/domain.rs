//! Domain module - job records and the rules that normalize them
//!
//! Everything here is pure: no I/O, no async. The infrastructure layer
//! produces `EnrichedRecord`s, this layer turns them into `CanonicalRecord`s.

pub mod job;
pub mod normalizer;
pub mod role;

pub use job::{
    CanonicalRecord, Column, DetailAttributes, EnrichedRecord, JobRow, RawListingRecord,
    RecordError,
};
pub use normalizer::{ColumnRule, FieldNormalizer, RuleAction};
pub use role::{RoleCategory, infer_role, infer_roles};
