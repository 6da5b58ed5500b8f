//! Cached population list from the authority

use parking_lot::RwLock;

/// Ordered list of known player names, replaced wholesale on refresh
#[derive(Debug, Default)]
pub struct PlayerNameCache {
    names: RwLock<Vec<String>>,
}

impl PlayerNameCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replace(&self, names: Vec<String>) {
        *self.names.write() = names;
    }

    pub fn snapshot(&self) -> Vec<String> {
        self.names.read().clone()
    }

    pub fn len(&self) -> usize {
        self.names.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replace_is_wholesale_and_keeps_order() {
        let cache = PlayerNameCache::new();
        assert!(cache.is_empty());

        cache.replace(vec!["steve".into(), "alex".into()]);
        assert_eq!(cache.snapshot(), vec!["steve", "alex"]);

        cache.replace(vec!["herobrine".into()]);
        assert_eq!(cache.snapshot(), vec!["herobrine"]);
        assert_eq!(cache.len(), 1);
    }
}
