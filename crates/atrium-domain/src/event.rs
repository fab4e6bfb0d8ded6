//! Outbox event types: business domains, event kinds, and payloads.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Partition of outbox traffic. Events within one domain are delivered in
/// insertion order; across domains there is no ordering relationship.
///
/// Wire format: `i16`, persisted in outbox and lock rows. Never renumber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BusinessDomain {
    App = 1,
    Department = 2,
    Group = 3,
    Contactor = 4,
    OrgPermApp = 5,
    User = 6,
    Config = 7,
    InternalGroup = 8,
    Anonymous = 9,
}

impl BusinessDomain {
    /// Every domain, in wire order. Used to spawn one dispatcher per domain
    /// and to seed the lock table.
    pub const ALL: [Self; 9] = [
        Self::App,
        Self::Department,
        Self::Group,
        Self::Contactor,
        Self::OrgPermApp,
        Self::User,
        Self::Config,
        Self::InternalGroup,
        Self::Anonymous,
    ];

    /// Convert from `i16` wire value. Returns `None` for unknown values.
    pub fn from_i16(v: i16) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.as_i16() == v)
    }

    /// Convert to `i16` wire value.
    pub fn as_i16(self) -> i16 {
        self as i16
    }

    /// Stable lowercase name, used in broker topics and log fields.
    pub fn name(self) -> &'static str {
        match self {
            Self::App => "app",
            Self::Department => "department",
            Self::Group => "group",
            Self::Contactor => "contactor",
            Self::OrgPermApp => "org_perm_app",
            Self::User => "user",
            Self::Config => "config",
            Self::InternalGroup => "internal_group",
            Self::Anonymous => "anonymous",
        }
    }
}

impl std::fmt::Display for BusinessDomain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Logical event type within the outbox.
///
/// Wire format: `i16`, persisted in outbox rows and matched against handler
/// registrations. Append new kinds at the end; never renumber or reuse a
/// value, or persisted rows stop matching their handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    AppRegistered = 1,
    AppUpdated = 2,
    AppDeleted = 3,
    DepartmentCreated = 4,
    DepartmentRenamed = 5,
    DepartmentDeleted = 6,
    DepartmentManagersChanged = 7,
    GroupCreated = 8,
    GroupUpdated = 9,
    GroupDeleted = 10,
    ContactorCreated = 11,
    ContactorUpdated = 12,
    ContactorDeleted = 13,
    OrgPermGranted = 14,
    OrgPermRevoked = 15,
    AuditRecorded = 16,
    DepartmentUserAssigned = 17,
}

impl EventKind {
    /// Convert from `i16` wire value. Returns `None` for unknown values.
    pub fn from_i16(v: i16) -> Option<Self> {
        const ALL: [EventKind; 17] = [
            EventKind::AppRegistered,
            EventKind::AppUpdated,
            EventKind::AppDeleted,
            EventKind::DepartmentCreated,
            EventKind::DepartmentRenamed,
            EventKind::DepartmentDeleted,
            EventKind::DepartmentManagersChanged,
            EventKind::GroupCreated,
            EventKind::GroupUpdated,
            EventKind::GroupDeleted,
            EventKind::ContactorCreated,
            EventKind::ContactorUpdated,
            EventKind::ContactorDeleted,
            EventKind::OrgPermGranted,
            EventKind::OrgPermRevoked,
            EventKind::AuditRecorded,
            EventKind::DepartmentUserAssigned,
        ];
        ALL.into_iter().find(|k| k.as_i16() == v)
    }

    /// Convert to `i16` wire value.
    pub fn as_i16(self) -> i16 {
        self as i16
    }
}

/// Self-contained outbox event payload, one variant per [`EventKind`].
///
/// Captured in full at enqueue time: by delivery time the triggering rows may
/// already be gone, so handlers must never need to read them back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EventPayload {
    AppRegistered {
        app_id: Uuid,
        org_id: Uuid,
        name: String,
    },
    AppUpdated {
        app_id: Uuid,
        org_id: Uuid,
        name: String,
    },
    AppDeleted {
        app_id: Uuid,
        org_id: Uuid,
    },
    DepartmentCreated {
        department_id: Uuid,
        org_id: Uuid,
        path: String,
        name: String,
    },
    DepartmentRenamed {
        department_id: Uuid,
        org_id: Uuid,
        name: String,
    },
    DepartmentDeleted {
        department_id: Uuid,
        org_id: Uuid,
    },
    DepartmentManagersChanged {
        org_id: Uuid,
        manager_ids: Vec<Uuid>,
    },
    DepartmentUserAssigned {
        department_id: Uuid,
        user_id: Uuid,
        org_id: Uuid,
    },
    GroupCreated {
        group_id: Uuid,
        org_id: Uuid,
        name: String,
    },
    GroupUpdated {
        group_id: Uuid,
        org_id: Uuid,
        name: String,
    },
    GroupDeleted {
        group_id: Uuid,
        org_id: Uuid,
    },
    ContactorCreated {
        contactor_id: Uuid,
        org_id: Uuid,
        name: String,
    },
    ContactorUpdated {
        contactor_id: Uuid,
        org_id: Uuid,
        name: String,
    },
    ContactorDeleted {
        contactor_id: Uuid,
        org_id: Uuid,
    },
    OrgPermGranted {
        org_id: Uuid,
        app_id: Uuid,
        actor_id: Uuid,
    },
    OrgPermRevoked {
        org_id: Uuid,
        app_id: Uuid,
        actor_id: Uuid,
    },
    /// Audit entries carry their domain explicitly: every domain enqueues
    /// audit events into its own queue so they stay ordered with the
    /// mutation they describe.
    AuditRecorded {
        domain: BusinessDomain,
        actor_id: Uuid,
        operation: String,
        subject: String,
    },
}

impl EventPayload {
    /// The event kind persisted alongside this payload.
    pub fn kind(&self) -> EventKind {
        match self {
            Self::AppRegistered { .. } => EventKind::AppRegistered,
            Self::AppUpdated { .. } => EventKind::AppUpdated,
            Self::AppDeleted { .. } => EventKind::AppDeleted,
            Self::DepartmentCreated { .. } => EventKind::DepartmentCreated,
            Self::DepartmentRenamed { .. } => EventKind::DepartmentRenamed,
            Self::DepartmentDeleted { .. } => EventKind::DepartmentDeleted,
            Self::DepartmentManagersChanged { .. } => EventKind::DepartmentManagersChanged,
            Self::DepartmentUserAssigned { .. } => EventKind::DepartmentUserAssigned,
            Self::GroupCreated { .. } => EventKind::GroupCreated,
            Self::GroupUpdated { .. } => EventKind::GroupUpdated,
            Self::GroupDeleted { .. } => EventKind::GroupDeleted,
            Self::ContactorCreated { .. } => EventKind::ContactorCreated,
            Self::ContactorUpdated { .. } => EventKind::ContactorUpdated,
            Self::ContactorDeleted { .. } => EventKind::ContactorDeleted,
            Self::OrgPermGranted { .. } => EventKind::OrgPermGranted,
            Self::OrgPermRevoked { .. } => EventKind::OrgPermRevoked,
            Self::AuditRecorded { .. } => EventKind::AuditRecorded,
        }
    }

    /// The business domain whose queue this payload belongs to.
    pub fn domain(&self) -> BusinessDomain {
        match self {
            Self::AppRegistered { .. } | Self::AppUpdated { .. } | Self::AppDeleted { .. } => {
                BusinessDomain::App
            }
            Self::DepartmentCreated { .. }
            | Self::DepartmentRenamed { .. }
            | Self::DepartmentDeleted { .. }
            | Self::DepartmentManagersChanged { .. }
            | Self::DepartmentUserAssigned { .. } => BusinessDomain::Department,
            Self::GroupCreated { .. } | Self::GroupUpdated { .. } | Self::GroupDeleted { .. } => {
                BusinessDomain::Group
            }
            Self::ContactorCreated { .. }
            | Self::ContactorUpdated { .. }
            | Self::ContactorDeleted { .. } => BusinessDomain::Contactor,
            Self::OrgPermGranted { .. } | Self::OrgPermRevoked { .. } => BusinessDomain::OrgPermApp,
            Self::AuditRecorded { domain, .. } => *domain,
        }
    }
}
