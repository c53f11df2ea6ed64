//! Scoped busy indicator shared between the request side and the renderer.

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

#[derive(Debug, Clone, Default)]
pub struct LoadingIndicator {
    holders: Arc<AtomicUsize>,
}

impl LoadingIndicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the indicator busy until the returned guard is dropped.
    #[must_use = "the indicator clears as soon as the guard is dropped"]
    pub fn acquire(&self) -> LoadingGuard {
        self.holders.fetch_add(1, Ordering::SeqCst);
        LoadingGuard {
            holders: Arc::clone(&self.holders),
        }
    }

    pub fn is_active(&self) -> bool {
        self.holders.load(Ordering::SeqCst) > 0
    }
}

#[derive(Debug)]
pub struct LoadingGuard {
    holders: Arc<AtomicUsize>,
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        self.holders.fetch_sub(1, Ordering::SeqCst);
    }
}
