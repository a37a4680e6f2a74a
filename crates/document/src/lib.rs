//! # Document
//!
//! The document model shared by every pipeline stage: a multi-valued
//! property bag keyed by content identity, its merge rules, and its JSON
//! wire format.
//!
//! ```text
//! CDX line ─┐
//! revisit ──┼──► Document (per capture) ──► group by IdentityKey ──► merge_group ──► Document
//! parse ────┘
//! ```
//!
//! ## Key types
//!
//! | Type | Role |
//! |------|------|
//! | [`Document`] | property bag plus ordered link list |
//! | [`PropertyValue`] | one value (`Single`) or a set of distinct values (`Multi`) |
//! | [`IdentityKey`] | `"<url> <algorithm:digest>"` grouping key |
//! | [`MergeConfig`] | merge-stage options |
//!
//! ## Example
//!
//! ```rust
//! use document::{merge_group, Document};
//!
//! let mut parsed = Document::new();
//! parsed.set("url", "http://example.com/");
//! parsed.set("digest", "sha1:ABC");
//! parsed.set("date", "20100501120000");
//!
//! let mut cdx = Document::new();
//! cdx.set("url", "http://example.com/");
//! cdx.set("digest", "sha1:ABC");
//! cdx.set("date", "20081219000000");
//!
//! let merged = merge_group([parsed, cdx]).unwrap();
//! assert_eq!(merged.get_all("date").len(), 2);
//! assert_eq!(
//!     merged.identity_key().unwrap().to_string(),
//!     "http://example.com/ sha1:ABC"
//! );
//! ```

mod document;
mod error;
mod json;
mod key;
mod merge;
mod value;

pub use crate::document::{names, Document, Link};
pub use crate::error::DocumentError;
pub use crate::key::IdentityKey;
pub use crate::merge::{merge_group, merge_json_group, MergeConfig};
pub use crate::value::PropertyValue;
