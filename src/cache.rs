//! The per-stream rolling string cache.
//!
//! Writers replace repeated map keys and tag identifiers with short cache
//! codes (`^0`, `^1`, ..., `^[[`). A reader rebuilds the same table by
//! recording every cacheable string in first-seen order, so that a code can
//! be resolved back to the string it stands for.

use crate::{Error, Result};
use tracing::debug;

/// Prefix of every cache code.
pub const SUB: char = '^';

/// The map-as-array sentinel. Starts with [`SUB`] but is never a cache code.
pub const MAP_AS_ARRAY: &str = "^ ";

const CACHE_CODE_DIGITS: usize = 44;
const BASE_CHAR_IDX: u8 = 48;
const MIN_SIZE_CACHEABLE: usize = 4;

/// Number of entries after which the writer (and so the reader) starts over.
pub const CACHE_SIZE: usize = CACHE_CODE_DIGITS * CACHE_CODE_DIGITS;

/// Decode side of the rolling cache.
///
/// One cache belongs to exactly one stream; create a fresh one per stream.
///
/// # Examples
///
/// ```rust
/// use serde_transit::RollingCache;
///
/// let mut cache = RollingCache::new();
/// assert_eq!(cache.decode("name".to_string(), true).unwrap(), "name");
/// assert_eq!(cache.decode("^0".to_string(), true).unwrap(), "name");
/// assert!(cache.decode("^1".to_string(), false).is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct RollingCache {
    entries: Vec<String>,
}

impl RollingCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if `s` has the lexical form of a cache code.
    #[must_use]
    pub fn is_cache_code(s: &str) -> bool {
        s.starts_with(SUB) && s != MAP_AS_ARRAY
    }

    /// Returns `true` if `s` would be recorded when seen in this position.
    ///
    /// Map keys of four or more characters are cacheable, as are keywords,
    /// symbols and tag identifiers of that length in any position.
    #[must_use]
    pub fn is_cacheable(s: &str, as_map_key: bool) -> bool {
        s.chars().nth(MIN_SIZE_CACHEABLE - 1).is_some()
            && (as_map_key || s.starts_with("~#") || s.starts_with("~$") || s.starts_with("~:"))
    }

    /// Resolves a cache code, or records a cacheable string and returns it.
    ///
    /// Strings that are neither codes nor cacheable pass through untouched.
    pub fn decode(&mut self, s: String, as_map_key: bool) -> Result<String> {
        if Self::is_cache_code(&s) {
            return self.lookup(&s).map(str::to_owned);
        }
        if Self::is_cacheable(&s, as_map_key) {
            self.insert(s.clone());
        }
        Ok(s)
    }

    /// Returns the string recorded under `code`.
    pub fn lookup(&self, code: &str) -> Result<&str> {
        code_to_index(code)
            .and_then(|index| self.entries.get(index))
            .map(String::as_str)
            .ok_or_else(|| Error::unknown_cache_code(code))
    }

    fn insert(&mut self, s: String) {
        if self.entries.len() >= CACHE_SIZE {
            debug!(size = CACHE_SIZE, "rolling cache full, starting over");
            self.entries.clear();
        }
        self.entries.push(s);
    }

    /// Number of strings currently recorded.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Renders the code a writer assigns to the `index`-th cached string.
    ///
    /// Indices wrap at [`CACHE_SIZE`], the same way the cache itself does.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_transit::RollingCache;
    ///
    /// assert_eq!(RollingCache::code_for(0), "^0");
    /// assert_eq!(RollingCache::code_for(43), "^[");
    /// assert_eq!(RollingCache::code_for(44), "^10");
    /// ```
    #[must_use]
    pub fn code_for(index: usize) -> String {
        let index = index % CACHE_SIZE;
        let hi = index / CACHE_CODE_DIGITS;
        let lo = index % CACHE_CODE_DIGITS;
        let digit = |n: usize| char::from(BASE_CHAR_IDX + n as u8);
        if hi == 0 {
            format!("{}{}", SUB, digit(lo))
        } else {
            format!("{}{}{}", SUB, digit(hi), digit(lo))
        }
    }
}

fn code_to_index(code: &str) -> Option<usize> {
    let digits = code.strip_prefix(SUB)?.as_bytes();
    let digit = |b: u8| {
        let n = b.checked_sub(BASE_CHAR_IDX)? as usize;
        (n < CACHE_CODE_DIGITS).then_some(n)
    };
    match digits {
        [lo] => digit(*lo),
        [hi, lo] => Some(digit(*hi)? * CACHE_CODE_DIGITS + digit(*lo)?),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_code_form() {
        assert!(RollingCache::is_cache_code("^0"));
        assert!(RollingCache::is_cache_code("^10"));
        assert!(!RollingCache::is_cache_code(MAP_AS_ARRAY));
        assert!(!RollingCache::is_cache_code("~^0"));
        assert!(!RollingCache::is_cache_code("name"));
    }

    #[test]
    fn test_cacheable_positions() {
        assert!(RollingCache::is_cacheable("name", true));
        assert!(!RollingCache::is_cacheable("name", false));
        assert!(!RollingCache::is_cacheable("abc", true));
        assert!(RollingCache::is_cacheable("~:abc", false));
        assert!(RollingCache::is_cacheable("~#set", false));
        assert!(RollingCache::is_cacheable("~$sym", false));
        assert!(!RollingCache::is_cacheable("~ifoo", false));
    }

    #[test]
    fn test_codes_assigned_in_first_seen_order() {
        let mut cache = RollingCache::new();
        for word in ["alpha", "bravo", "charlie"] {
            cache.decode(word.to_string(), true).unwrap();
        }
        assert_eq!(cache.lookup("^0").unwrap(), "alpha");
        assert_eq!(cache.lookup("^1").unwrap(), "bravo");
        assert_eq!(cache.lookup("^2").unwrap(), "charlie");
    }

    #[test]
    fn test_unknown_code_fails() {
        let cache = RollingCache::new();
        assert!(matches!(
            cache.lookup("^0"),
            Err(Error::UnknownCacheCode(ref code)) if code == "^0"
        ));
        assert!(cache.lookup("^abc").is_err());
        assert!(cache.lookup("^").is_err());
    }

    #[test]
    fn test_resolving_does_not_record() {
        let mut cache = RollingCache::new();
        cache.decode("~#point".to_string(), false).unwrap();
        assert_eq!(cache.decode("^0".to_string(), false).unwrap(), "~#point");
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_code_round_trips_through_index() {
        for index in [0, 1, 43, 44, 45, 100, CACHE_SIZE - 1] {
            assert_eq!(code_to_index(&RollingCache::code_for(index)), Some(index));
        }
    }

    #[test]
    fn test_code_for_wraps_past_capacity() {
        assert_eq!(RollingCache::code_for(CACHE_SIZE), "^0");
        assert_eq!(RollingCache::code_for(CACHE_SIZE + 44), "^10");
        let far = RollingCache::code_for(100_000);
        assert_eq!(code_to_index(&far), Some(100_000 % CACHE_SIZE));
    }

    #[test]
    fn test_wraps_when_full() {
        let mut cache = RollingCache::new();
        for i in 0..CACHE_SIZE {
            cache.decode(format!("key-{}", i), true).unwrap();
        }
        assert_eq!(cache.len(), CACHE_SIZE);
        cache.decode("overflow".to_string(), true).unwrap();
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.lookup("^0").unwrap(), "overflow");
    }
}
