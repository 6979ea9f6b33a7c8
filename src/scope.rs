//! Cancellation tokens for event subscriptions.

use std::cell::Cell;
use std::rc::Rc;

/// Token representing "these subscriptions are live".
///
/// Every listener added to an [`EventBus`](crate::eventbus::EventBus) is tied to
/// a scope. Clones share the same flag, so cancelling any clone cancels all of
/// them. Cancellation is permanent and takes effect synchronously: the bus
/// checks the flag right before each invocation, including in the middle of a
/// batch.
#[derive(Clone, Debug, Default)]
pub struct AttachmentScope {
    cancelled: Rc<Cell<bool>>,
}

impl AttachmentScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stops delivery to every listener registered under this scope. Idempotent.
    pub fn cancel(&self) {
        self.cancelled.set(true);
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.get()
    }

    /// True if both handles share the same flag.
    pub fn same_scope(&self, other: &AttachmentScope) -> bool {
        Rc::ptr_eq(&self.cancelled, &other.cancelled)
    }
}
