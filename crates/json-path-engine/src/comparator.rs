//! Scalar comparison.

use std::cmp::Ordering;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use regex::{Regex, RegexBuilder};
use serde_json::{Number, Value as Json};

use crate::error::EngineError;

/// String ordering used by `>`-style comparisons.
pub trait Collation: fmt::Debug + Send + Sync {
    fn compare(&self, left: &str, right: &str) -> Ordering;
}

/// Locale-aware order from the Unicode Collation Algorithm with the CLDR
/// root tailoring: `"B" > "a"` and `"é" < "f"`.
pub struct UnicodeCollation {
    collator: Mutex<feruca::Collator>,
}

impl Default for UnicodeCollation {
    fn default() -> Self {
        Self {
            collator: Mutex::new(feruca::Collator::default()),
        }
    }
}

impl fmt::Debug for UnicodeCollation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("UnicodeCollation")
    }
}

impl Collation for UnicodeCollation {
    fn compare(&self, left: &str, right: &str) -> Ordering {
        // The collator only caches lookups, so a poisoned lock is still usable.
        let mut collator = self.collator.lock().unwrap_or_else(PoisonError::into_inner);
        collator.collate(left, right)
    }
}

/// Unicode code point order.
#[derive(Debug, Clone, Copy, Default)]
pub struct CodepointCollation;

impl Collation for CodepointCollation {
    fn compare(&self, left: &str, right: &str) -> Ordering {
        left.cmp(right)
    }
}

/// Code point order after lowercasing both sides.
#[derive(Debug, Clone, Copy, Default)]
pub struct CaseInsensitiveCollation;

impl Collation for CaseInsensitiveCollation {
    fn compare(&self, left: &str, right: &str) -> Ordering {
        left.chars()
            .flat_map(char::to_lowercase)
            .cmp(right.chars().flat_map(char::to_lowercase))
    }
}

/// Comparisons between two scalars.
#[derive(Debug, Clone)]
pub struct Comparators {
    collation: Arc<dyn Collation>,
}

impl Default for Comparators {
    fn default() -> Self {
        Self::new(Arc::new(UnicodeCollation::default()))
    }
}

impl Comparators {
    pub fn new(collation: Arc<dyn Collation>) -> Self {
        Self { collation }
    }

    /// Strict equality: same type and same value. Integers never equal
    /// floats, so `5 != 5.0`. Containers are never equal.
    pub fn is_equal(&self, left: &Json, right: &Json) -> bool {
        match (left, right) {
            (Json::Null, Json::Null) => true,
            (Json::Bool(a), Json::Bool(b)) => a == b,
            (Json::Number(a), Json::Number(b)) => {
                a.is_f64() == b.is_f64() && compare_numbers(a, b) == Some(Ordering::Equal)
            }
            (Json::String(a), Json::String(b)) => a == b,
            _ => false,
        }
    }

    /// Numbers by value, strings through the collation. Other pairs are
    /// unordered.
    pub fn is_greater(&self, left: &Json, right: &Json) -> bool {
        match (left, right) {
            (Json::Number(a), Json::Number(b)) => compare_numbers(a, b) == Some(Ordering::Greater),
            (Json::String(a), Json::String(b)) => self.collation.compare(a, b).is_gt(),
            _ => false,
        }
    }
}

pub(crate) fn compare_numbers(left: &Number, right: &Number) -> Option<Ordering> {
    if let (Some(a), Some(b)) = (left.as_i64(), right.as_i64()) {
        return Some(a.cmp(&b));
    }
    if let (Some(a), Some(b)) = (left.as_u64(), right.as_u64()) {
        return Some(a.cmp(&b));
    }
    left.as_f64()?.partial_cmp(&right.as_f64()?)
}

/// A compiled `/body/flags` pattern.
#[derive(Debug, Clone)]
pub struct RegExpMatcher {
    regex: Regex,
}

impl RegExpMatcher {
    /// Compiles `/body/flags` (flags from `imsxu`, `u` has no effect) or a
    /// bare body.
    pub fn new(pattern: &str) -> Result<Self, EngineError> {
        let invalid = |reason: String| EngineError::InvalidRegExp {
            pattern: pattern.to_string(),
            reason,
        };
        let (body, flags) = match pattern.strip_prefix('/').and_then(|rest| {
            rest.rfind('/').map(|end| (&rest[..end], &rest[end + 1..]))
        }) {
            Some(parts) => parts,
            None => (pattern, ""),
        };
        let mut builder = RegexBuilder::new(body);
        for flag in flags.chars() {
            match flag {
                'i' => builder.case_insensitive(true),
                'm' => builder.multi_line(true),
                's' => builder.dot_matches_new_line(true),
                'x' => builder.ignore_whitespace(true),
                'u' => &mut builder,
                other => return Err(invalid(format!("unsupported flag '{other}'"))),
            };
        }
        let regex = builder.build().map_err(|err| invalid(err.to_string()))?;
        Ok(Self { regex })
    }

    /// Only strings can match.
    pub fn is_match(&self, data: &Json) -> bool {
        match data {
            Json::String(text) => self.regex.is_match(text),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_equality_is_strict() {
        let cmp = Comparators::default();
        assert!(cmp.is_equal(&json!(5), &json!(5)));
        assert!(!cmp.is_equal(&json!(5), &json!(5.0)));
        assert!(cmp.is_equal(&json!(5.0), &json!(5.0)));
        assert!(cmp.is_equal(&json!(u64::MAX), &json!(u64::MAX)));
        assert!(!cmp.is_equal(&json!("5"), &json!(5)));
        assert!(!cmp.is_equal(&json!(null), &json!(false)));
        assert!(!cmp.is_equal(&json!([1]), &json!([1])));
        assert!(!cmp.is_equal(&json!({}), &json!({})));
    }

    #[test]
    fn test_greater() {
        let cmp = Comparators::default();
        assert!(cmp.is_greater(&json!(10), &json!(9.5)));
        assert!(!cmp.is_greater(&json!(-1), &json!(u64::MAX)));
        assert!(cmp.is_greater(&json!("b"), &json!("a")));
        assert!(cmp.is_greater(&json!("B"), &json!("a")));
        assert!(cmp.is_greater(&json!("f"), &json!("é")));
        assert!(cmp.is_greater(&json!("é"), &json!("e")));
        assert!(!cmp.is_greater(&json!("1"), &json!(0)));
        assert!(!cmp.is_greater(&json!(true), &json!(false)));
        // Ordering stays numeric across encodings.
        assert!(!cmp.is_greater(&json!(5), &json!(5.0)));
        assert!(cmp.is_greater(&json!(5.5), &json!(5)));
    }

    #[test]
    fn test_codepoint_collation() {
        let cmp = Comparators::new(Arc::new(CodepointCollation));
        assert!(!cmp.is_greater(&json!("B"), &json!("a")));
        assert!(cmp.is_greater(&json!("é"), &json!("f")));
    }

    #[test]
    fn test_case_insensitive_collation() {
        let cmp = Comparators::new(Arc::new(CaseInsensitiveCollation));
        assert!(cmp.is_greater(&json!("B"), &json!("a")));
        assert!(!cmp.is_greater(&json!("A"), &json!("a")));
    }

    #[test]
    fn test_regexp_delimiters_and_flags() {
        let re = RegExpMatcher::new("/^ni/i").unwrap();
        assert!(re.is_match(&json!("Nigel Rees")));
        assert!(!re.is_match(&json!(1)));
        let bare = RegExpMatcher::new("ee").unwrap();
        assert!(bare.is_match(&json!("Nigel Rees")));
        let unicode = RegExpMatcher::new("/^a.c$/su").unwrap();
        assert!(unicode.is_match(&json!("a\nc")));
    }

    #[test]
    fn test_regexp_errors() {
        assert!(matches!(
            RegExpMatcher::new("/a/q"),
            Err(EngineError::InvalidRegExp { .. })
        ));
        assert!(matches!(
            RegExpMatcher::new("/(/"),
            Err(EngineError::InvalidRegExp { .. })
        ));
    }
}
