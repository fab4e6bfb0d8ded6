//! Handler registry: `(business domain, event kind) → handler`.
//!
//! Built once at process start from a static table of entries; duplicate
//! keys are a startup error, never a silent overwrite. Handlers receive the
//! decoded typed payload and must be idempotent — delivery is at-least-once
//! and a handler may see the same logical event again after a crash.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use atrium_domain::event::{BusinessDomain, EventKind, EventPayload};

/// Boxed handler future.
pub type HandlerFuture = Pin<Box<dyn Future<Output = Result<(), anyhow::Error>> + Send>>;

/// A registered event handler.
pub type Handler = Arc<dyn Fn(EventPayload) -> HandlerFuture + Send + Sync>;

/// Wrap an async closure into a [`Handler`].
pub fn handler<F, Fut>(f: F) -> Handler
where
    F: Fn(EventPayload) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), anyhow::Error>> + Send + 'static,
{
    Arc::new(move |payload| Box::pin(f(payload)))
}

/// One row of the static registration table.
pub struct HandlerEntry {
    pub domain: BusinessDomain,
    pub kind: EventKind,
    pub handler: Handler,
}

impl HandlerEntry {
    pub fn new(domain: BusinessDomain, kind: EventKind, handler: Handler) -> Self {
        Self {
            domain,
            kind,
            handler,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("duplicate handler registration for ({domain}, {kind:?})")]
    Duplicate {
        domain: BusinessDomain,
        kind: EventKind,
    },
}

/// Immutable handler lookup table.
pub struct HandlerRegistry {
    handlers: HashMap<(BusinessDomain, EventKind), Handler>,
}

impl HandlerRegistry {
    /// Build the registry, rejecting duplicate `(domain, kind)` keys.
    pub fn from_entries(
        entries: impl IntoIterator<Item = HandlerEntry>,
    ) -> Result<Self, RegistryError> {
        let mut handlers = HashMap::new();
        for entry in entries {
            let key = (entry.domain, entry.kind);
            if handlers.insert(key, entry.handler).is_some() {
                return Err(RegistryError::Duplicate {
                    domain: entry.domain,
                    kind: entry.kind,
                });
            }
        }
        Ok(Self { handlers })
    }

    pub fn get(&self, domain: BusinessDomain, kind: EventKind) -> Option<&Handler> {
        self.handlers.get(&(domain, kind))
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
