use std::collections::HashSet;

/// Insertion-ordered set of product URLs
///
/// Discovery order becomes the FIFO order of the extraction queue, so the
/// set remembers the order in which URLs were first seen.
#[derive(Debug, Clone, Default)]
pub struct LinkSet {
    seen: HashSet<String>,
    order: Vec<String>,
}

impl LinkSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a URL; returns false if it was already present
    pub fn insert(&mut self, url: impl Into<String>) -> bool {
        let url = url.into();
        if self.seen.contains(&url) {
            return false;
        }
        self.seen.insert(url.clone());
        self.order.push(url);
        true
    }

    /// Adds every URL from an iterator, returning how many were new
    pub fn extend<I, S>(&mut self, urls: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        urls.into_iter()
            .map(|url| self.insert(url))
            .filter(|added| *added)
            .count()
    }

    pub fn contains(&self, url: &str) -> bool {
        self.seen.contains(url)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// URLs in first-seen order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Consumes the set, yielding URLs in first-seen order
    pub fn into_vec(self) -> Vec<String> {
        self.order
    }
}

impl<S: Into<String>> FromIterator<S> for LinkSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = LinkSet::new();
        set.extend(iter);
        set
    }
}
