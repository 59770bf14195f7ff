//! The intent extras bag.

/// An ordered key/value bag mirroring the extras of a host intent.
///
/// Insertion order is preserved: the payload-isolation heuristic in the PID
/// response parser takes the first non-empty value in iteration order, so
/// the order the host reported the extras in is significant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extras(Vec<(String, String)>);

impl Extras {
    /// Create an empty bag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `key` to `value`, replacing an existing entry in place.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some((_, v)) => *v = value,
            None => self.0.push((key, value)),
        }
    }

    /// The value stored under `key`, if any.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// The first non-empty value among `keys`, in the order given.
    ///
    /// This is the precedence-table lookup for the vendor key-name
    /// inconsistencies: all known alternates for one logical field are
    /// listed in priority order and the first hit wins.
    pub fn first_non_empty(&self, keys: &[&str]) -> Option<&str> {
        keys.iter()
            .filter_map(|key| self.get(key))
            .find(|value| !value.is_empty())
    }

    /// The first non-empty value in iteration order, regardless of key.
    pub fn first_non_empty_value(&self) -> Option<&str> {
        self.0
            .iter()
            .map(|(_, v)| v.as_str())
            .find(|value| !value.is_empty())
    }

    /// Iterate over the entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Whether the bag holds no entries.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// A `key=value | ...` rendering of every entry, for failure diagnosis.
    pub fn debug_dump(&self) -> String {
        if self.0.is_empty() {
            return "no extras returned".to_owned();
        }
        self.0
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(" | ")
    }
}

impl<K, V> FromIterator<(K, V)> for Extras
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut extras = Self::new();
        for (key, value) in iter {
            extras.insert(key, value);
        }
        extras
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_replaces_in_place() {
        let mut extras = Extras::new();
        extras.insert("a", "1");
        extras.insert("b", "2");
        extras.insert("a", "3");

        assert_eq!(extras.get("a"), Some("3"));
        assert_eq!(extras.iter().count(), 2);
        assert_eq!(extras.iter().next(), Some(("a", "3")));
    }

    #[test]
    fn precedence_lookup_skips_blank_values() {
        let extras = Extras::from_iter([("errCode", ""), ("ERROR_CODE", "510")]);
        assert_eq!(
            extras.first_non_empty(&["errCode", "ERROR_CODE", "error_code"]),
            Some("510")
        );
    }

    #[test]
    fn precedence_lookup_prefers_earlier_keys() {
        let extras = Extras::from_iter([("error_code", "999"), ("ERROR_CODE", "510")]);
        assert_eq!(
            extras.first_non_empty(&["errCode", "ERROR_CODE", "error_code"]),
            Some("510")
        );
    }

    #[test]
    fn first_value_heuristic_follows_insertion_order() {
        let extras = Extras::from_iter([("x", ""), ("y", "<PidData/>"), ("z", "other")]);
        assert_eq!(extras.first_non_empty_value(), Some("<PidData/>"));
    }
}
