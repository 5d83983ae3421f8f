//! Scalar codecs: positive integers, one-based pages and plain strings.

use super::Codec;

/// Positive integer, e.g. `perPage`. Zero, negatives and non-numeric input
/// do not decode.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntegerCodec;

impl Codec for IntegerCodec {
    type Value = usize;

    fn encode(&self, value: &usize) -> String {
        value.to_string()
    }

    fn decode(&self, raw: &str) -> Option<usize> {
        raw.trim().parse::<usize>().ok().filter(|n| *n > 0)
    }
}

/// Zero-based page index stored as a one-based page number.
///
/// `encode(&0) == "1"`; a decoded page `<= 0` is rejected so the caller falls
/// back to its default.
#[derive(Debug, Clone, Copy, Default)]
pub struct PageCodec;

impl Codec for PageCodec {
    type Value = usize;

    fn encode(&self, page_index: &usize) -> String {
        page_index.saturating_add(1).to_string()
    }

    fn decode(&self, raw: &str) -> Option<usize> {
        IntegerCodec.decode(raw).map(|page| page - 1)
    }
}

/// Free text, e.g. the global search.
#[derive(Debug, Clone, Copy, Default)]
pub struct StringCodec;

impl Codec for StringCodec {
    type Value = String;

    fn encode(&self, value: &String) -> String {
        value.clone()
    }

    fn decode(&self, raw: &str) -> Option<String> {
        Some(raw.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_rejects_non_positive_and_garbage() {
        assert_eq!(IntegerCodec.decode("25"), Some(25));
        assert_eq!(IntegerCodec.decode(" 7 "), Some(7));
        assert_eq!(IntegerCodec.decode("0"), None);
        assert_eq!(IntegerCodec.decode("-3"), None);
        assert_eq!(IntegerCodec.decode("ten"), None);
        assert_eq!(IntegerCodec.decode("1.5"), None);
        assert_eq!(IntegerCodec.decode(""), None);
    }

    #[test]
    fn page_translation_is_symmetric() {
        for index in [0usize, 1, 4, 99] {
            assert_eq!(PageCodec.decode(&PageCodec.encode(&index)), Some(index));
        }
        assert_eq!(PageCodec.encode(&0), "1");
        assert_eq!(PageCodec.decode("0"), None);
    }
}
