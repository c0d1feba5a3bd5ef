//! Multi-attribute linear-hashed file: a partial-match storage engine.
//!
//! A relation is stored as three files, `<name>.info`, `<name>.data`,
//! `<name>.ovflow`, addressed by a linear-hashed choice of composite-hash
//! bits, so that queries naming only some attributes can skip buckets that
//! cannot possibly hold a match instead of scanning the whole relation.

pub const PAGESIZE: usize = 1024;

pub mod aligned;
pub mod bits;
pub mod choicevec;
pub mod error;
pub mod hash;
pub mod page;
pub mod projection;
pub mod relation;
pub mod selection;
pub mod storage;
pub mod tuple;

#[cfg(test)]
mod testutils;

pub use choicevec::ChoiceVector;
pub use error::Error;
pub use page::{PageId, NO_PAGE};
pub use projection::Projection;
pub use relation::{BucketSummary, PageSummary, Relation, RelationStats};
pub use selection::Selection;
pub use tuple::{Pattern, Tuple};
