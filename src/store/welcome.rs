use std::sync::Arc;

use crate::db::state_keys;
use crate::error::AppError;

use super::KeyValueStore;

/// Gates the first-run welcome overlay on the persisted "has visited" flag.
pub struct WelcomeGate {
    store: Arc<dyn KeyValueStore>,
}

impl WelcomeGate {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// True until `dismiss` has been called in this or any earlier session.
    pub fn should_show(&self) -> Result<bool, AppError> {
        Ok(self.store.get(state_keys::HAS_VISITED)?.is_none())
    }

    pub fn dismiss(&self) -> Result<(), AppError> {
        self.store.set(state_keys::HAS_VISITED, "true")
    }

    pub fn reset(&self) -> Result<(), AppError> {
        self.store.remove(state_keys::HAS_VISITED)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn test_first_visit_then_dismissed() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let gate = WelcomeGate::new(store.clone());
        assert!(gate.should_show().unwrap());

        gate.dismiss().unwrap();
        assert!(!gate.should_show().unwrap());

        // A fresh gate over the same store sees the persisted flag.
        assert!(!WelcomeGate::new(store).should_show().unwrap());
    }

    #[test]
    fn test_reset() {
        let gate = WelcomeGate::new(Arc::new(MemoryStore::new()));
        gate.dismiss().unwrap();
        gate.reset().unwrap();
        assert!(gate.should_show().unwrap());
    }
}
