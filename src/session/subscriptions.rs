//! Ordered set of subscription destinations.

/// Destinations in insertion order, without duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubscriptionSet {
    channels: Vec<String>,
}

impl SubscriptionSet {
    /// Empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `name` (trimmed). Returns `false` for blank or duplicate names.
    pub fn insert(&mut self, name: &str) -> bool {
        let name = name.trim();
        if name.is_empty() || self.contains(name) {
            return false;
        }
        self.channels.push(name.to_string());
        true
    }

    /// Remove `name`. Returns whether it was present.
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.channels.len();
        self.channels.retain(|c| c != name);
        self.channels.len() != before
    }

    /// Membership test.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.channels.iter().any(|c| c == name)
    }

    /// Channels in insertion order.
    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        &self.channels
    }

    /// Number of channels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    /// Whether the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}

impl<S: AsRef<str>> FromIterator<S> for SubscriptionSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = Self::new();
        for name in iter {
            set.insert(name.as_ref());
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_preserves_order() {
        let mut set = SubscriptionSet::new();
        assert!(set.insert("/queue/b"));
        assert!(set.insert("/queue/a"));
        assert_eq!(set.as_slice(), ["/queue/b", "/queue/a"]);
    }

    #[test]
    fn test_duplicate_insert_is_noop() {
        let mut set = SubscriptionSet::new();
        set.insert("/queue/a");
        assert!(!set.insert("/queue/a"));
        assert!(!set.insert("  /queue/a "));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_blank_insert_is_noop() {
        let mut set = SubscriptionSet::new();
        assert!(!set.insert(""));
        assert!(!set.insert("   "));
        assert!(set.is_empty());
    }

    #[test]
    fn test_remove() {
        let mut set: SubscriptionSet = ["/a", "/b", "/c"].into_iter().collect();
        assert!(set.remove("/b"));
        assert!(!set.remove("/missing"));
        assert_eq!(set.as_slice(), ["/a", "/c"]);
    }

    #[test]
    fn test_from_iter_dedups() {
        let set: SubscriptionSet = vec!["/a", "/a", "", "/b"].into_iter().collect();
        assert_eq!(set.as_slice(), ["/a", "/b"]);
    }
}
