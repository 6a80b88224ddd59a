use std::collections::HashMap;

/// Dense keys for label strings, assigned in order of first occurrence.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabelMap {
    labels: Vec<String>,
    keys: HashMap<String, usize>,
}

impl LabelMap {
    pub fn from_labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut map = Self::default();
        for label in labels {
            map.insert(label.as_ref());
        }
        map
    }

    /// Key of `label`, assigning the next free one if it is new.
    pub fn insert(&mut self, label: &str) -> usize {
        if let Some(&key) = self.keys.get(label) {
            return key;
        }
        let key = self.labels.len();
        self.labels.push(label.to_string());
        self.keys.insert(label.to_string(), key);
        key
    }

    pub fn key_of(&self, label: &str) -> Option<usize> {
        self.keys.get(label).copied()
    }

    pub fn label_of(&self, key: usize) -> Option<&str> {
        self.labels.get(key).map(String::as_str)
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}
