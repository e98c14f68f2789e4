//! RAII lease that hands a session back to its provider when dropped.

use std::sync::Arc;

use super::SessionProvider;

pub struct SessionLease<P: SessionProvider> {
    provider: Arc<P>,
    id: String,
    handle: Option<P::Handle>,
}

impl<P: SessionProvider> SessionLease<P> {
    /// Check out `id` from `provider`. `None` if the session is unavailable.
    pub fn checkout(provider: &Arc<P>, id: &str) -> Option<Self> {
        let handle = provider.checkout(id)?;
        Some(Self {
            provider: Arc::clone(provider),
            id: id.to_string(),
            handle: Some(handle),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn handle(&self) -> Option<&P::Handle> {
        self.handle.as_ref()
    }

    /// Drop the handle and tell the provider the session is dead.
    pub fn invalidate(mut self) {
        self.handle = None;
        self.provider.invalidate(&self.id);
    }
}

impl<P: SessionProvider> Drop for SessionLease<P> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.provider.release(&self.id, handle);
        }
    }
}
