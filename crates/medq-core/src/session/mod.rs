//! Authenticated sessions and how workers borrow them.
//!
//! The provider owns every handle. A worker checks one out for its whole
//! lifetime and gives it back on exit through a `SessionLease`; a session
//! whose credentials expired is invalidated instead of released.

mod lease;
mod pool;

pub use lease::SessionLease;
pub use pool::SessionPool;

use crate::job::SessionId;

/// Source of authenticated session handles.
pub trait SessionProvider: Send + Sync + 'static {
    type Handle: Send + 'static;

    /// Ids of every session currently known, leased or idle.
    fn session_ids(&self) -> Vec<SessionId>;

    /// Move the handle for `id` out of the provider. `None` if unknown or
    /// already leased.
    fn checkout(&self, id: &str) -> Option<Self::Handle>;

    /// Return a handle previously checked out.
    fn release(&self, id: &str, handle: Self::Handle);

    /// The session's credentials are no longer valid; forget it.
    fn invalidate(&self, id: &str);
}
