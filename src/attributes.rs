use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;

/// Read-only view over the string attributes of a rendered element.
pub trait Attributes {
    fn attr(&self, name: &str) -> Option<&str>;
}

impl<S: BuildHasher> Attributes for HashMap<String, String, S> {
    fn attr(&self, name: &str) -> Option<&str> {
        self.get(name).map(String::as_str)
    }
}

impl Attributes for BTreeMap<String, String> {
    fn attr(&self, name: &str) -> Option<&str> {
        self.get(name).map(String::as_str)
    }
}

impl Attributes for [(&str, &str)] {
    fn attr(&self, name: &str) -> Option<&str> {
        self.iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| *value)
    }
}

impl<const N: usize> Attributes for [(&str, &str); N] {
    fn attr(&self, name: &str) -> Option<&str> {
        self.as_slice().attr(name)
    }
}
