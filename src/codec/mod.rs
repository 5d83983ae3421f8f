//! Typed URL value codecs.
//!
//! Every value the sync layer keeps in the query string goes through a
//! [`Codec`]: a pure encode/decode pair plus a content-equality check used to
//! skip redundant writes. Codecs never fail loudly. A value that does not
//! decode yields `None`, and [`decode_or_default`] substitutes the field's
//! default without touching sibling fields.
//!
//! - [`integer`]: positive integers (`perPage`) and one-based pages (`page`)
//! - [`sorting`]: JSON array of `{id, desc}` validated against known columns
//! - [`filters`]: JSON array of `{id, value, variant, operator}`
//!
//! # Example
//!
//! ```
//! use tablesync::codec::{decode_or_default, Codec, PageCodec};
//!
//! let page = PageCodec;
//! assert_eq!(page.encode(&0), "1");
//! assert_eq!(decode_or_default(&page, Some("3"), 0), 2);
//! assert_eq!(decode_or_default(&page, Some("-1"), 0), 0);
//! ```

pub mod filters;
pub mod integer;
pub mod sorting;

pub use filters::FiltersCodec;
pub use integer::{IntegerCodec, PageCodec, StringCodec};
pub use sorting::SortingCodec;

/// Lossless, validated mapping between a typed value and its URL string.
pub trait Codec {
    /// In-memory value type.
    type Value: Clone + PartialEq;

    /// Serializes `value` for the query string.
    fn encode(&self, value: &Self::Value) -> String;

    /// Parses a raw query-string value. Returns `None` on any malformed or
    /// invalid input.
    fn decode(&self, raw: &str) -> Option<Self::Value>;

    /// Content equality, used to skip URL writes that would not change
    /// anything.
    fn eq(&self, a: &Self::Value, b: &Self::Value) -> bool {
        a == b
    }
}

/// Decodes `raw`, falling back to `default` when the parameter is absent or
/// does not decode.
pub fn decode_or_default<C: Codec>(codec: &C, raw: Option<&str>, default: C::Value) -> C::Value {
    let Some(raw) = raw else {
        return default;
    };
    codec.decode(raw).unwrap_or_else(|| {
        tracing::debug!(raw = %raw, "url value rejected, using default");
        default
    })
}
