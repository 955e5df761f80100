use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared flag recording that a response head has been written to the client
///
/// A stage that streams to the client before the handler chain finishes
/// (early hints, upgrades, chunked preambles) inserts a `ResponseCommit`
/// into the request extensions and calls [`ResponseCommit::commit`] once
/// it has flushed. Layers that still need to modify the response head
/// check the flag and refuse to run on a committed response.
#[derive(Debug, Clone, Default)]
pub struct ResponseCommit(Arc<AtomicBool>);

impl ResponseCommit {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the response head as sent
    pub fn commit(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_committed(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}
