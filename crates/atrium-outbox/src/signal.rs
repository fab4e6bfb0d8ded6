//! Post-commit wake-up signal for the dispatchers.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Notify;

use atrium_domain::event::BusinessDomain;

/// Fire-and-forget notification that pending outbox work exists for a
/// domain. Callers ping it after their transaction has committed; it never
/// blocks and never fails. Dispatchers also wake on a periodic timer, so a
/// dropped notification delays delivery but never loses it.
#[derive(Clone)]
pub struct OutboxSignal {
    inner: Arc<HashMap<BusinessDomain, Arc<Notify>>>,
}

impl OutboxSignal {
    pub fn new() -> Self {
        let inner = BusinessDomain::ALL
            .into_iter()
            .map(|domain| (domain, Arc::new(Notify::new())))
            .collect();
        Self {
            inner: Arc::new(inner),
        }
    }

    /// Hint that `domain` has pending rows. Stores a permit if no dispatcher
    /// is currently waiting, so a notify between cycles is not lost.
    pub fn notify(&self, domain: BusinessDomain) {
        self.inner[&domain].notify_one();
    }

    /// The wake handle a dispatcher waits on.
    pub fn wake_handle(&self, domain: BusinessDomain) -> Arc<Notify> {
        Arc::clone(&self.inner[&domain])
    }
}

impl Default for OutboxSignal {
    fn default() -> Self {
        Self::new()
    }
}
