//! Space listing and enrichment
//!
//! - [`parse`] - Decodes directory pages and room state
//! - [`enrich`] - Bounded-concurrency fan-out over the listed spaces
//! - [`model`] - The [`Space`] record
//! - [`error`] - Decode, transport and cancellation failures

pub mod enrich;
pub mod error;
pub mod model;
pub mod parse;

pub use enrich::{
    listing_request, state_path, Enricher, DEFAULT_CONCURRENCY_LIMIT,
    DEFAULT_ENRICH_TIMEOUT, DEFAULT_LISTING_LIMIT, PUBLIC_ROOMS_PATH,
};
pub use error::{CancelReason, DecodeError, EnrichError, ErrorKind};
pub use model::{ChildRelations, Space};
pub use parse::{parse_detail, parse_listing};
