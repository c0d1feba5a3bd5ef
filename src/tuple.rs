//! Tuples and query patterns: comma-separated text records, `%`/`?`
//! wildcard matching.

use crate::error::Error;

/// Maximum serialized length of a tuple, including its `\0` terminator.
pub const MAXTUPLEN: usize = 200;

/// A validated, comma-separated tuple of `nattrs` text values.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tuple {
    raw: String,
}

impl Tuple {
    /// Parses one line of input into a tuple with exactly `nattrs` fields.
    pub fn parse(line: &str, nattrs: usize) -> Result<Tuple, Error> {
        let raw = line.trim_end_matches(['\n', '\r']).to_string();
        if raw.len() + 1 > MAXTUPLEN {
            return Err(Error::TupleTooLarge { len: raw.len() });
        }
        let nfields = raw.split(',').count();
        if nfields != nattrs {
            return Err(Error::malformed(format!(
                "expected {nattrs} comma-separated attributes, found {nfields} in {raw:?}"
            )));
        }
        Ok(Tuple { raw })
    }

    /// Wraps an already-validated tuple string without reparsing it, used
    /// when reading tuples back off a page, which only ever holds tuples
    /// this module wrote in the first place.
    pub(crate) fn from_raw(raw: String) -> Tuple {
        Tuple { raw }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn values(&self) -> Vec<&str> {
        self.raw.split(',').collect()
    }

    pub fn len(&self) -> usize {
        self.raw.len()
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }
}

impl std::fmt::Display for Tuple {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

/// A partial-match query: one value per attribute, where `?` means "don't
/// care about this attribute at all" and a value containing `%` is matched
/// with SQL-LIKE-style substring wildcarding.
#[derive(Clone, Debug)]
pub struct Pattern {
    values: Vec<String>,
}

impl Pattern {
    pub fn parse(line: &str, nattrs: usize) -> Result<Pattern, Error> {
        let values: Vec<String> = line
            .trim_end_matches(['\n', '\r'])
            .split(',')
            .map(String::from)
            .collect();
        if values.len() != nattrs {
            return Err(Error::malformed(format!(
                "expected {nattrs} comma-separated attributes in query, found {}",
                values.len()
            )));
        }
        Ok(Pattern { values })
    }

    fn is_known(value: &str) -> bool {
        value != "?" && !value.contains('%')
    }

    /// Per-attribute known/unknown flags, indexed by attribute number.
    pub fn known_attrs(&self) -> Vec<bool> {
        self.values.iter().map(|v| Pattern::is_known(v)).collect()
    }

    /// Raw query values, suitable for `ChoiceVector::tuple_hash`. Bits
    /// belonging to unknown attributes get masked out by `known_mask`
    /// regardless of what those attributes hash to.
    pub fn raw_values(&self) -> Vec<&str> {
        self.values.iter().map(String::as_str).collect()
    }

    /// Whether `tuple` matches every known (non-`?`) attribute of this
    /// pattern, applying `%` wildcarding per attribute.
    pub fn matches(&self, tuple: &Tuple) -> bool {
        let tuple_values = tuple.values();
        if tuple_values.len() != self.values.len() {
            return false;
        }
        self.values
            .iter()
            .zip(tuple_values.iter())
            .all(|(pat, val)| pat == "?" || str_match(pat, val))
    }
}

/// SQL-LIKE-style `%` wildcard match: `%` stands for zero or more
/// characters. A pattern with no `%` must equal `value` exactly. Otherwise
/// the pattern is split on `%` into literal segments, and each segment is
/// located in order, left to right: the first occurrence found is taken
/// (no backtracking), and if the pattern has no leading/trailing `%`, the
/// first/last segment's occurrence must land at the very start/end of
/// `value`.
pub fn str_match(pattern: &str, value: &str) -> bool {
    if !pattern.contains('%') {
        return pattern == value;
    }

    let p = pattern.as_bytes();
    let s = value.as_bytes();
    let anchored_start = p.first() != Some(&b'%');
    let anchored_end = p.last() != Some(&b'%');
    let segments: Vec<&[u8]> = pattern.split('%').filter(|seg| !seg.is_empty()).map(str::as_bytes).collect();

    if segments.is_empty() {
        // an all-`%` (or empty) pattern matches anything.
        return true;
    }

    let mut cursor = 0usize;
    let last = segments.len() - 1;
    for (i, seg) in segments.iter().enumerate() {
        let found = find_from(s, seg, cursor);
        let at = match found {
            Some(at) => at,
            None => return false,
        };
        if i == 0 && anchored_start && at != 0 {
            return false;
        }
        if i == last && anchored_end && at != s.len() - seg.len() {
            return false;
        }
        cursor = at + seg.len();
    }
    true
}

fn find_from(haystack: &[u8], needle: &[u8], start: usize) -> Option<usize> {
    if needle.is_empty() {
        return Some(start);
    }
    let mut i = start;
    while i + needle.len() <= haystack.len() {
        if &haystack[i..i + needle.len()] == needle {
            return Some(i);
        }
        i += 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_rejects_wrong_arity() {
        assert!(Tuple::parse("a,b,c", 2).is_err());
        assert!(Tuple::parse("a,b", 2).is_ok());
    }

    #[test]
    fn parse_rejects_oversized_tuple() {
        let huge = "x".repeat(MAXTUPLEN);
        assert!(Tuple::parse(&huge, 1).is_err());
    }

    #[test]
    fn values_split_on_comma() {
        let t = Tuple::parse("alice,30,nyc", 3).unwrap();
        assert_eq!(t.values(), vec!["alice", "30", "nyc"]);
    }

    #[test]
    fn no_wildcard_requires_exact_match() {
        assert!(str_match("nyc", "nyc"));
        assert!(!str_match("nyc", "nyc "));
    }

    #[test]
    fn trailing_wildcard() {
        assert!(str_match("a%", "apple"));
        assert!(!str_match("a%", "banana"));
    }

    #[test]
    fn leading_wildcard() {
        assert!(str_match("%e", "apple"));
        assert!(!str_match("%e", "cherry"));
    }

    #[test]
    fn interior_wildcard_unanchored() {
        assert!(str_match("%an%", "banana"));
        assert!(!str_match("%an%", "apple"));
    }

    #[test]
    fn all_wildcard_matches_anything() {
        assert!(str_match("%", ""));
        assert!(str_match("%", "anything"));
    }

    #[test]
    fn pattern_matching_skips_question_mark_attributes() {
        let pattern = Pattern::parse("?,30,?", 3).unwrap();
        assert_eq!(pattern.known_attrs(), vec![false, true, false]);
        let tuple = Tuple::parse("alice,30,nyc", 3).unwrap();
        assert!(pattern.matches(&tuple));
        let other = Tuple::parse("bob,31,nyc", 3).unwrap();
        assert!(!other.values().is_empty());
        assert!(!pattern.matches(&other));
    }
}
