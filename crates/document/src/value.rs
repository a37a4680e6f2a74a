//! Property values.
use std::collections::BTreeSet;

/// Value of one document property.
///
/// A property with exactly one distinct value is always [`Single`]; two or
/// more distinct values are always [`Multi`]. Empty strings are never stored.
///
/// [`Single`]: PropertyValue::Single
/// [`Multi`]: PropertyValue::Multi
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PropertyValue {
    Single(String),
    Multi(BTreeSet<String>),
}

impl PropertyValue {
    /// Build a value from arbitrary strings. Values are trimmed, blanks are
    /// dropped, duplicates collapse. Returns `None` if nothing is left.
    pub fn from_values<I, S>(values: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let set: BTreeSet<String> = values
            .into_iter()
            .filter_map(|v| clean(v.as_ref()))
            .collect();
        Self::from_set(set)
    }

    fn from_set(mut set: BTreeSet<String>) -> Option<Self> {
        match set.len() {
            0 => None,
            1 => set.pop_first().map(PropertyValue::Single),
            _ => Some(PropertyValue::Multi(set)),
        }
    }

    /// Insert an already-cleaned value, promoting to `Multi` if needed.
    pub(crate) fn insert(&mut self, value: String) {
        match self {
            PropertyValue::Single(existing) if *existing == value => {}
            PropertyValue::Single(existing) => {
                let existing = std::mem::take(existing);
                *self = PropertyValue::Multi(BTreeSet::from([existing, value]));
            }
            PropertyValue::Multi(set) => {
                set.insert(value);
            }
        }
    }

    /// Remove one value, demoting to `Single` if one remains. Returns `false`
    /// when the property is now empty.
    pub(crate) fn remove(&mut self, value: &str) -> bool {
        match self {
            PropertyValue::Single(existing) => existing != value,
            PropertyValue::Multi(set) => {
                set.remove(value);
                match Self::from_set(std::mem::take(set)) {
                    Some(next) => {
                        *self = next;
                        true
                    }
                    None => false,
                }
            }
        }
    }

    /// One representative value: the single value, or the smallest of a set.
    pub fn first(&self) -> &str {
        match self {
            PropertyValue::Single(value) => value,
            PropertyValue::Multi(set) => set.first().map(String::as_str).unwrap_or_default(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            PropertyValue::Single(_) => 1,
            PropertyValue::Multi(set) => set.len(),
        }
    }

    /// Always false: empty values are never constructed.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, value: &str) -> bool {
        match self {
            PropertyValue::Single(existing) => existing == value,
            PropertyValue::Multi(set) => set.contains(value),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        let (single, multi) = match self {
            PropertyValue::Single(value) => (Some(value.as_str()), None),
            PropertyValue::Multi(set) => (None, Some(set.iter().map(String::as_str))),
        };
        single.into_iter().chain(multi.into_iter().flatten())
    }

    pub fn to_set(&self) -> BTreeSet<String> {
        self.iter().map(str::to_string).collect()
    }
}

/// Trim a raw value; `None` if it is blank.
pub(crate) fn clean(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_value_stays_scalar() {
        let value = PropertyValue::from_values(["a", " a ", ""]).unwrap();
        assert_eq!(value, PropertyValue::Single("a".into()));
    }

    #[test]
    fn blanks_only_is_none() {
        assert!(PropertyValue::from_values(["", "  ", "\n"]).is_none());
        assert!(PropertyValue::from_values(Vec::<String>::new()).is_none());
    }

    #[test]
    fn insert_promotes_and_dedups() {
        let mut value = PropertyValue::Single("b".into());
        value.insert("b".into());
        assert_eq!(value.len(), 1);
        value.insert("a".into());
        assert_eq!(value.len(), 2);
        assert_eq!(value.first(), "a");
        assert_eq!(value.iter().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn remove_demotes() {
        let mut value = PropertyValue::from_values(["a", "b"]).unwrap();
        assert!(value.remove("a"));
        assert_eq!(value, PropertyValue::Single("b".into()));
        assert!(!value.remove("b"));
    }
}
