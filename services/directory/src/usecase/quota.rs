use uuid::Uuid;

use crate::domain::repository::QuotaRepository;
use crate::error::DirectoryError;

/// Recompute derived space quotas for the given managers.
///
/// Runs inside the managers-changed outbox handler, so it must be idempotent:
/// recomputing from current state always converges to the same values no
/// matter how many times the event is replayed.
pub struct RecomputeManagerQuotasUseCase<R: QuotaRepository> {
    pub repo: R,
}

impl<R: QuotaRepository> RecomputeManagerQuotasUseCase<R> {
    pub async fn execute(
        &self,
        org_id: Uuid,
        manager_ids: &[Uuid],
    ) -> Result<(), DirectoryError> {
        for &manager_id in manager_ids {
            // A manager relocated to the unassigned sentinel has left the
            // organization structure; their quota record is purged.
            if self.repo.is_unassigned(manager_id).await? {
                self.repo.delete_quota(manager_id, org_id).await?;
                continue;
            }

            let paths = self.repo.managed_paths(manager_id, org_id).await?;
            let quota = if paths.is_empty() {
                0
            } else {
                self.repo.sum_user_quota_under(&paths).await?
            };
            self.repo.upsert_quota(manager_id, org_id, quota).await?;
        }
        Ok(())
    }
}
