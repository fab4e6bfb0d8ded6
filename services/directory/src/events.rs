//! Static outbox handler table for the directory service.
//!
//! Every `(business domain, event kind)` pair the service enqueues is wired
//! here, in one place, and validated for duplicates when the registry is
//! built at startup. Mutation events publish to the message bus, audit
//! events land in the audit log, and the managers-changed event triggers the
//! asynchronous quota recomputation. Handlers receive the decoded payload
//! and are idempotent under at-least-once delivery.

use std::sync::Arc;

use anyhow::anyhow;

use atrium_domain::event::{BusinessDomain, EventKind, EventPayload};
use atrium_outbox::{Handler, HandlerEntry, HandlerRegistry, RegistryError, handler};

use crate::domain::repository::{AuditSink, MessageBroker, QuotaRepository};
use crate::usecase::quota::RecomputeManagerQuotasUseCase;

/// Broker topic per mutation kind. Audit and managers-changed events are
/// consumed internally and have no topic.
fn topic(kind: EventKind) -> Option<&'static str> {
    match kind {
        EventKind::AppRegistered => Some("directory.app.registered"),
        EventKind::AppUpdated => Some("directory.app.updated"),
        EventKind::AppDeleted => Some("directory.app.deleted"),
        EventKind::DepartmentCreated => Some("directory.department.created"),
        EventKind::DepartmentRenamed => Some("directory.department.renamed"),
        EventKind::DepartmentDeleted => Some("directory.department.deleted"),
        EventKind::DepartmentUserAssigned => Some("directory.department.user_assigned"),
        EventKind::GroupCreated => Some("directory.group.created"),
        EventKind::GroupUpdated => Some("directory.group.updated"),
        EventKind::GroupDeleted => Some("directory.group.deleted"),
        EventKind::ContactorCreated => Some("directory.contactor.created"),
        EventKind::ContactorUpdated => Some("directory.contactor.updated"),
        EventKind::ContactorDeleted => Some("directory.contactor.deleted"),
        EventKind::OrgPermGranted => Some("directory.org_perm_app.granted"),
        EventKind::OrgPermRevoked => Some("directory.org_perm_app.revoked"),
        EventKind::DepartmentManagersChanged | EventKind::AuditRecorded => None,
    }
}

fn publish_handler(broker: Arc<dyn MessageBroker>) -> Handler {
    handler(move |payload: EventPayload| {
        let broker = Arc::clone(&broker);
        async move {
            let topic = topic(payload.kind())
                .ok_or_else(|| anyhow!("no broker topic for {:?}", payload.kind()))?;
            let body = serde_json::to_value(&payload)?;
            broker.publish(topic, &body).await
        }
    })
}

fn audit_handler(audit: Arc<dyn AuditSink>) -> Handler {
    handler(move |payload: EventPayload| {
        let audit = Arc::clone(&audit);
        async move {
            match payload {
                EventPayload::AuditRecorded {
                    actor_id,
                    operation,
                    subject,
                    ..
                } => audit.record(actor_id, &operation, &subject).await,
                other => Err(anyhow!("audit handler received {:?}", other.kind())),
            }
        }
    })
}

fn quota_handler<Q>(quotas: Q) -> Handler
where
    Q: QuotaRepository + Clone + Send + Sync + 'static,
{
    handler(move |payload: EventPayload| {
        let repo = quotas.clone();
        async move {
            match payload {
                EventPayload::DepartmentManagersChanged {
                    org_id,
                    manager_ids,
                } => RecomputeManagerQuotasUseCase { repo }
                    .execute(org_id, &manager_ids)
                    .await
                    .map_err(anyhow::Error::new),
                other => Err(anyhow!("quota handler received {:?}", other.kind())),
            }
        }
    })
}

/// Build the handler registry from the static table below. Fails at startup
/// on any duplicate `(domain, kind)` pair.
pub fn build_registry<Q>(
    broker: Arc<dyn MessageBroker>,
    audit: Arc<dyn AuditSink>,
    quotas: Q,
) -> Result<HandlerRegistry, RegistryError>
where
    Q: QuotaRepository + Clone + Send + Sync + 'static,
{
    use atrium_domain::event::{BusinessDomain as D, EventKind as K};

    let publish = publish_handler(broker);
    let audit = audit_handler(audit);

    HandlerRegistry::from_entries([
        // App
        HandlerEntry::new(D::App, K::AppRegistered, publish.clone()),
        HandlerEntry::new(D::App, K::AppUpdated, publish.clone()),
        HandlerEntry::new(D::App, K::AppDeleted, publish.clone()),
        HandlerEntry::new(D::App, K::AuditRecorded, audit.clone()),
        // Department
        HandlerEntry::new(D::Department, K::DepartmentCreated, publish.clone()),
        HandlerEntry::new(D::Department, K::DepartmentRenamed, publish.clone()),
        HandlerEntry::new(D::Department, K::DepartmentDeleted, publish.clone()),
        HandlerEntry::new(D::Department, K::DepartmentUserAssigned, publish.clone()),
        HandlerEntry::new(
            D::Department,
            K::DepartmentManagersChanged,
            quota_handler(quotas),
        ),
        HandlerEntry::new(D::Department, K::AuditRecorded, audit.clone()),
        // Group
        HandlerEntry::new(D::Group, K::GroupCreated, publish.clone()),
        HandlerEntry::new(D::Group, K::GroupUpdated, publish.clone()),
        HandlerEntry::new(D::Group, K::GroupDeleted, publish.clone()),
        HandlerEntry::new(D::Group, K::AuditRecorded, audit.clone()),
        // Contactor
        HandlerEntry::new(D::Contactor, K::ContactorCreated, publish.clone()),
        HandlerEntry::new(D::Contactor, K::ContactorUpdated, publish.clone()),
        HandlerEntry::new(D::Contactor, K::ContactorDeleted, publish.clone()),
        HandlerEntry::new(D::Contactor, K::AuditRecorded, audit.clone()),
        // Org-scoped app permissions
        HandlerEntry::new(D::OrgPermApp, K::OrgPermGranted, publish.clone()),
        HandlerEntry::new(D::OrgPermApp, K::OrgPermRevoked, publish),
        HandlerEntry::new(D::OrgPermApp, K::AuditRecorded, audit),
    ])
}
