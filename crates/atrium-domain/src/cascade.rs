//! Cascade planning for department-subtree deletion.
//!
//! Deleting a department removes its whole subtree. The plan decides, from
//! read-only snapshots taken before the delete transaction opens, which
//! users merely leave the subtree, which lose their last department and move
//! to the unassigned sentinel, which lose their last foothold in the
//! organization entirely, and which managers need their derived quota
//! recomputed. The plan is consumed inside the single delete transaction and
//! discarded after commit; it is never persisted.

use std::collections::BTreeSet;

use uuid::Uuid;

use crate::path::DeptPath;

/// Reserved department id standing in for "no department". Users whose last
/// real membership disappears are relocated here.
pub const UNASSIGNED_DEPARTMENT_ID: Uuid = Uuid::nil();

/// Snapshot of one user's full department membership at planning time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserMemberships {
    pub user_id: Uuid,
    /// Paths of every department the user belongs to, across the whole tree.
    pub paths: Vec<DeptPath>,
}

/// One org-manager assignment: `manager_id` manages `department_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagerRecord {
    pub manager_id: Uuid,
    pub department_id: Uuid,
}

/// The computed cascade for one subtree deletion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CascadePlan {
    /// Users whose only department membership lay inside the deleted
    /// subtree. They are relocated to [`UNASSIGNED_DEPARTMENT_ID`].
    pub users_to_unassign: Vec<Uuid>,
    /// Users with no remaining membership anywhere under the subtree's root
    /// organization. Their user↔organization relation is severed.
    pub users_to_detach_from_org: Vec<Uuid>,
    /// The deleted subtree: the target department plus every descendant.
    /// Scopes relation deletes and per-node deleted events.
    pub affected_department_ids: Vec<Uuid>,
    /// Managers whose managed scope intersects the deleted subtree or any
    /// ancestor of it. Their derived quotas are recomputed asynchronously.
    pub affected_manager_ids: Vec<Uuid>,
}

impl CascadePlan {
    /// Compute the cascade for deleting the subtree rooted at `deleted`.
    ///
    /// * `subtree_ids` — ids of the deleted node and all its descendants.
    /// * `users` — membership snapshots of every user with at least one
    ///   path inside the subtree.
    /// * `managers` — all manager assignments for the organization.
    ///
    /// A user keeps their organization relation if any membership outside
    /// the subtree still lives under the same root organization; a sibling
    /// department is enough. Ancestors of the deleted node are included in
    /// the manager scope because their effective span shrinks even though
    /// they are not themselves deleted.
    pub fn compute(
        deleted: &DeptPath,
        subtree_ids: &[Uuid],
        users: &[UserMemberships],
        managers: &[ManagerRecord],
    ) -> Self {
        let org_id = deleted.root_org();

        let mut users_to_unassign = Vec::new();
        let mut users_to_detach_from_org = Vec::new();
        for user in users {
            let remaining: Vec<&DeptPath> = user
                .paths
                .iter()
                .filter(|p| !deleted.contains(p))
                .collect();
            if remaining.is_empty() {
                users_to_unassign.push(user.user_id);
            }
            if !remaining.iter().any(|p| p.root_org() == org_id) {
                users_to_detach_from_org.push(user.user_id);
            }
        }

        // Managers are matched against the subtree plus every ancestor id.
        let scope: BTreeSet<Uuid> = subtree_ids
            .iter()
            .copied()
            .chain(deleted.ancestor_ids())
            .collect();
        let affected_manager_ids: Vec<Uuid> = managers
            .iter()
            .filter(|m| scope.contains(&m.department_id))
            .map(|m| m.manager_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        Self {
            users_to_unassign,
            users_to_detach_from_org,
            affected_department_ids: subtree_ids.to_vec(),
            affected_manager_ids,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: u128) -> Uuid {
        Uuid::from_u128(n)
    }

    // Tree used throughout: organization R with departments A, B, C laid out
    // as R/A, R/A/B, R/A/C. Deleting R/A/B.
    const R: u128 = 1;
    const A: u128 = 2;
    const B: u128 = 3;
    const C: u128 = 4;

    fn r_a_b() -> DeptPath {
        DeptPath::root(id(R)).child(id(A)).child(id(B))
    }

    fn r_a_c() -> DeptPath {
        DeptPath::root(id(R)).child(id(A)).child(id(C))
    }

    #[test]
    fn should_keep_user_with_sibling_membership() {
        // U1 belongs to both R/A/B and R/A/C: losing B relocates nothing and
        // the organization relation survives via the sibling.
        let u1 = UserMemberships {
            user_id: id(10),
            paths: vec![r_a_b(), r_a_c()],
        };
        let plan = CascadePlan::compute(&r_a_b(), &[id(B)], &[u1], &[]);
        assert!(plan.users_to_unassign.is_empty());
        assert!(plan.users_to_detach_from_org.is_empty());
    }

    #[test]
    fn should_unassign_and_detach_user_with_no_other_membership() {
        let u2 = UserMemberships {
            user_id: id(11),
            paths: vec![r_a_b()],
        };
        let plan = CascadePlan::compute(&r_a_b(), &[id(B)], &[u2], &[]);
        assert_eq!(plan.users_to_unassign, vec![id(11)]);
        assert_eq!(plan.users_to_detach_from_org, vec![id(11)]);
    }

    #[test]
    fn should_detach_but_not_unassign_user_whose_other_membership_is_another_org() {
        // The user keeps a department in organization S, so they are not
        // unassigned, but they lose their last foothold in R.
        let other_org = DeptPath::root(id(20)).child(id(21));
        let user = UserMemberships {
            user_id: id(12),
            paths: vec![r_a_b(), other_org],
        };
        let plan = CascadePlan::compute(&r_a_b(), &[id(B)], &[user], &[]);
        assert!(plan.users_to_unassign.is_empty());
        assert_eq!(plan.users_to_detach_from_org, vec![id(12)]);
    }

    #[test]
    fn should_handle_memberships_deeper_in_the_deleted_subtree() {
        // Membership in a descendant of the deleted node counts as inside.
        let deep = r_a_b().child(id(30));
        let user = UserMemberships {
            user_id: id(13),
            paths: vec![deep],
        };
        let plan = CascadePlan::compute(&r_a_b(), &[id(B), id(30)], &[user], &[]);
        assert_eq!(plan.users_to_unassign, vec![id(13)]);
        assert_eq!(plan.users_to_detach_from_org, vec![id(13)]);
    }

    #[test]
    fn should_include_managers_of_subtree_and_ancestors_only() {
        let managers = vec![
            // Manages the deleted node itself.
            ManagerRecord {
                manager_id: id(40),
                department_id: id(B),
            },
            // Manages an ancestor: effective span shrinks.
            ManagerRecord {
                manager_id: id(41),
                department_id: id(A),
            },
            // Manages the organization root.
            ManagerRecord {
                manager_id: id(42),
                department_id: id(R),
            },
            // Manages an unrelated sibling: untouched.
            ManagerRecord {
                manager_id: id(43),
                department_id: id(C),
            },
        ];
        let plan = CascadePlan::compute(&r_a_b(), &[id(B)], &[], &managers);
        assert_eq!(plan.affected_manager_ids, vec![id(40), id(41), id(42)]);
    }

    #[test]
    fn should_deduplicate_manager_ids_across_assignments() {
        // One manager managing both the node and its parent appears once.
        let managers = vec![
            ManagerRecord {
                manager_id: id(40),
                department_id: id(B),
            },
            ManagerRecord {
                manager_id: id(40),
                department_id: id(A),
            },
        ];
        let plan = CascadePlan::compute(&r_a_b(), &[id(B)], &[], &managers);
        assert_eq!(plan.affected_manager_ids, vec![id(40)]);
    }

    #[test]
    fn should_carry_subtree_ids_into_affected_departments() {
        let subtree = [id(B), id(30), id(31)];
        let plan = CascadePlan::compute(&r_a_b(), &subtree, &[], &[]);
        assert_eq!(plan.affected_department_ids, subtree.to_vec());
    }
}
