use std::collections::HashMap;
use std::fmt;

/// Label definitions mapping names to instruction indices.
///
/// Built by the translator and read-only while the machine runs. Entries are
/// append-only within one translation pass; [`LabelTable::reset`] starts over.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LabelTable {
    /// Label names in definition order.
    order: Vec<String>,
    /// Label name to instruction index.
    index: HashMap<String, usize>,
}

impl LabelTable {
    /// Creates an empty label table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes every label.
    pub fn reset(&mut self) {
        self.order.clear();
        self.index.clear();
    }

    /// Registers `name` at instruction index `at`.
    ///
    /// Returns `false` without registering anything if the name is empty or
    /// already defined. Duplicate detection with a proper error belongs to the
    /// translator, which checks [`LabelTable::index_of`] first.
    pub fn add_label(&mut self, name: &str, at: usize) -> bool {
        if name.is_empty() || self.index.contains_key(name) {
            return false;
        }
        self.order.push(name.to_string());
        self.index.insert(name.to_string(), at);
        true
    }

    /// Resolves a label to its instruction index.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Returns the first-defined label at instruction index `at`.
    pub fn label_at(&self, at: usize) -> Option<&str> {
        self.labels()
            .find(|&(_, index)| index == at)
            .map(|(name, _)| name)
    }

    /// Iterates `(name, index)` pairs in definition order.
    pub fn labels(&self) -> impl Iterator<Item = (&str, usize)> + '_ {
        self.order
            .iter()
            .map(|name| (name.as_str(), self.index[name.as_str()]))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl fmt::Display for LabelTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({})", self.order.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_and_resolve() {
        let mut labels = LabelTable::new();
        assert!(labels.add_label("f0", 0));
        assert!(labels.add_label("loop", 3));
        assert_eq!(labels.index_of("f0"), Some(0));
        assert_eq!(labels.index_of("loop"), Some(3));
        assert_eq!(labels.index_of("missing"), None);
    }

    #[test]
    fn empty_name_is_rejected() {
        let mut labels = LabelTable::new();
        assert!(!labels.add_label("", 0));
        assert!(labels.is_empty());
    }

    #[test]
    fn duplicate_keeps_first_definition() {
        let mut labels = LabelTable::new();
        assert!(labels.add_label("f0", 0));
        assert!(!labels.add_label("f0", 5));
        assert_eq!(labels.index_of("f0"), Some(0));
        assert_eq!(labels.len(), 1);
    }

    #[test]
    fn labels_are_case_sensitive() {
        let mut labels = LabelTable::new();
        labels.add_label("f0", 0);
        assert_eq!(labels.index_of("F0"), None);
    }

    #[test]
    fn reverse_lookup() {
        let mut labels = LabelTable::new();
        labels.add_label("f0", 0);
        labels.add_label("skip", 2);
        labels.add_label("end", 2);
        assert_eq!(labels.label_at(0), Some("f0"));
        assert_eq!(labels.label_at(2), Some("skip"));
        assert_eq!(labels.label_at(1), None);
        labels.reset();
        assert_eq!(labels.label_at(0), None);
    }

    #[test]
    fn reset_and_display() {
        let mut labels = LabelTable::new();
        labels.add_label("f0", 0);
        labels.add_label("f1", 1);
        assert_eq!(labels.to_string(), "(f0, f1)");
        assert_eq!(
            labels.labels().collect::<Vec<_>>(),
            vec![("f0", 0), ("f1", 1)]
        );
        labels.reset();
        assert!(labels.is_empty());
        assert_eq!(labels.to_string(), "()");
    }
}
