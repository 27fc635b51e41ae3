//! Trending token collection from public listing APIs.
//!
//! ## Architecture
//!
//! - `adapter/` - Source-specific fetching and response normalization
//! - `alias` - Ordered field-name aliases per canonical attribute
//! - `coordinator` - Priority-ordered fallback across adapters

pub mod adapter;
pub mod alias;
pub mod coordinator;
pub mod error;

pub use adapter::{
    default_adapters, http_client, AggregatorAdapter, ListingAdapter, SourceAdapter,
    DEFAULT_FETCH_TIMEOUT,
};
pub use alias::{FieldAliases, AGGREGATOR_FIELDS, LISTING_FIELDS};
pub use coordinator::*;
pub use error::*;
