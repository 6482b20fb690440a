//! Known-content-keys registry.
//!
//! The registry is the single source of truth for creation decisions. The
//! first claim of a key reads the store and, when nothing exists, creates
//! placeholder content, all while holding the lock. Later claims of the same
//! key only see the cached resolution, so two callers can never both observe
//! "absent" and both create.

use std::collections::HashMap;
use std::sync::Mutex;

use super::store::{AuthoredContent, ContentStore};
use crate::error::{DocmergeError, DocmergeResult};

#[derive(Debug, Clone)]
enum KeyState {
    Resolved(AuthoredContent),
    Failed(String),
}

/// Tally of registry decisions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegistryStats {
    pub keys: usize,
    pub created: usize,
    pub authored: usize,
    pub failed: usize,
}

#[derive(Debug, Default)]
struct RegistryState {
    keys: HashMap<String, KeyState>,
    created: usize,
}

/// Mutex-guarded map from overlay key to its resolved content.
#[derive(Debug, Default)]
pub struct ContentRegistry {
    state: Mutex<RegistryState>,
}

impl ContentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve `key`, creating placeholder content on first sight if the
    /// store has none. Check and register happen as one step.
    pub fn claim(
        &self,
        key: &str,
        title: &str,
        store: &dyn ContentStore,
    ) -> DocmergeResult<AuthoredContent> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());

        if let Some(known) = state.keys.get(key) {
            return match known {
                KeyState::Resolved(content) => Ok(content.clone()),
                KeyState::Failed(message) => Err(DocmergeError::content_store(key, message.clone())),
            };
        }

        let resolved = match store.read(key) {
            Ok(Some(content)) => Ok(content),
            Ok(None) => store.create_if_absent(key, title).map(|created| {
                if created {
                    state.created += 1;
                }
                AuthoredContent::placeholder()
            }),
            Err(e) => Err(e),
        };

        match resolved {
            Ok(content) => {
                state.keys.insert(key.to_string(), KeyState::Resolved(content.clone()));
                Ok(content)
            }
            Err(e) => {
                state.keys.insert(key.to_string(), KeyState::Failed(e.to_string()));
                Err(e)
            }
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .keys
            .contains_key(key)
    }

    pub fn stats(&self) -> RegistryStats {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let mut stats = RegistryStats {
            keys: state.keys.len(),
            created: state.created,
            ..RegistryStats::default()
        };
        for entry in state.keys.values() {
            match entry {
                KeyState::Resolved(content) if !content.is_placeholder => stats.authored += 1,
                KeyState::Resolved(_) => {}
                KeyState::Failed(_) => stats.failed += 1,
            }
        }
        stats
    }
}
