use crate::parser::FormatParser;
use crate::registry::ParserRegistry;
use std::sync::{Arc, PoisonError, RwLock};

/// Registry handle for runtime registration alongside concurrent lookups.
///
/// Readers take an immutable snapshot and probe without holding the lock.
/// Registration clones the current list, appends, and swaps the snapshot in.
#[derive(Default)]
pub struct SharedRegistry {
    current: RwLock<Arc<ParserRegistry>>,
}

impl SharedRegistry {
    pub fn new(registry: ParserRegistry) -> Self {
        Self {
            current: RwLock::new(Arc::new(registry)),
        }
    }

    /// Current parser list. Later registrations do not affect it.
    pub fn snapshot(&self) -> Arc<ParserRegistry> {
        Arc::clone(&self.current.read().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn register(&self, parser: Box<dyn FormatParser>) {
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        let mut next = ParserRegistry::clone(&current);
        next.register(parser);
        *current = Arc::new(next);
    }

    /// Swap in a whole new parser list.
    pub fn replace(&self, registry: ParserRegistry) {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(registry);
    }
}
