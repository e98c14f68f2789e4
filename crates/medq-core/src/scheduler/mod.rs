//! Download scheduling: shared job state, session-bound worker threads,
//! the pool that keeps them in step with the session provider, and the
//! `Engine` facade producers and controllers talk to.

mod engine;
mod pool;
mod shared;
mod worker;

pub use engine::Engine;
pub use pool::RebuildReport;
