//! [`EntityStore`] backed by Postgres.

use async_trait::async_trait;
use casting_core::store::{
    BookingPatch, BookingRecord, EntityStore, ProjectPatch, ProjectRecord, RepointBatch,
    RepointCounts, RolePatch, RoleRecord, RowFilter, StoreResult, SubmissionPatch,
    SubmissionRecord, COLLECTION_BOOKINGS, COLLECTION_PROJECTS, COLLECTION_ROLES,
    COLLECTION_SUBMISSIONS,
};
use casting_core::types::EntityId;

use crate::error::store_error;
use crate::repositories::{BookingRepo, ProjectRepo, RoleRepo, SubmissionRepo};
use crate::DbPool;

/// Postgres implementation of the store boundary. Cloning shares the pool.
#[derive(Clone)]
pub struct PgEntityStore {
    pool: DbPool,
}

impl PgEntityStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

fn convert<T, R>(rows: Vec<T>) -> StoreResult<Vec<R>>
where
    R: TryFrom<T, Error = casting_core::store::StoreError>,
{
    rows.into_iter().map(R::try_from).collect()
}

#[async_trait]
impl EntityStore for PgEntityStore {
    async fn find_project(&self, id: &str) -> StoreResult<Option<ProjectRecord>> {
        ProjectRepo::find_by_id(&self.pool, id)
            .await
            .map_err(|e| store_error(COLLECTION_PROJECTS, e))?
            .map(ProjectRecord::try_from)
            .transpose()
    }

    async fn update_project(&self, id: &str, patch: &ProjectPatch) -> StoreResult<bool> {
        let Some(status) = patch.status else {
            // Nothing to change beyond the timestamp; report whether the row exists.
            return Ok(self.find_project(id).await?.is_some());
        };
        ProjectRepo::set_status(&self.pool, id, status, patch.updated_at)
            .await
            .map_err(|e| store_error(COLLECTION_PROJECTS, e))
    }

    async fn list_roles(&self, filter: RowFilter<'_>) -> StoreResult<Vec<RoleRecord>> {
        let rows = match filter {
            RowFilter::All => RoleRepo::list(&self.pool).await,
            RowFilter::ByRole(id) => RoleRepo::find_by_id(&self.pool, id)
                .await
                .map(|row| row.into_iter().collect()),
            RowFilter::ByProject(id) => RoleRepo::list_by_project(&self.pool, id).await,
        }
        .map_err(|e| store_error(COLLECTION_ROLES, e))?;
        convert(rows)
    }

    async fn list_bookings(&self, filter: RowFilter<'_>) -> StoreResult<Vec<BookingRecord>> {
        let rows = match filter {
            RowFilter::All => BookingRepo::list(&self.pool).await,
            RowFilter::ByRole(id) => BookingRepo::list_by_role(&self.pool, id).await,
            RowFilter::ByProject(id) => BookingRepo::list_by_project(&self.pool, id).await,
        }
        .map_err(|e| store_error(COLLECTION_BOOKINGS, e))?;
        convert(rows)
    }

    async fn list_submissions(&self, filter: RowFilter<'_>) -> StoreResult<Vec<SubmissionRecord>> {
        let rows = match filter {
            RowFilter::All => SubmissionRepo::list(&self.pool).await,
            RowFilter::ByRole(id) => SubmissionRepo::list_by_role(&self.pool, id).await,
            RowFilter::ByProject(id) => SubmissionRepo::list_by_project(&self.pool, id).await,
        }
        .map_err(|e| store_error(COLLECTION_SUBMISSIONS, e))?;
        convert(rows)
    }

    async fn update_roles(&self, ids: &[EntityId], patch: &RolePatch) -> StoreResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }
        RoleRepo::apply_patch(&self.pool, ids, patch)
            .await
            .map_err(|e| store_error(COLLECTION_ROLES, e))
    }

    async fn update_bookings(&self, ids: &[EntityId], patch: &BookingPatch) -> StoreResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }
        BookingRepo::apply_patch(&self.pool, ids, patch)
            .await
            .map_err(|e| store_error(COLLECTION_BOOKINGS, e))
    }

    async fn update_submissions(
        &self,
        ids: &[EntityId],
        patch: &SubmissionPatch,
    ) -> StoreResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }
        SubmissionRepo::apply_patch(&self.pool, ids, patch)
            .await
            .map_err(|e| store_error(COLLECTION_SUBMISSIONS, e))
    }

    async fn repoint_role(&self, batch: &RepointBatch) -> StoreResult<RepointCounts> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| store_error(COLLECTION_SUBMISSIONS, e))?;

        let mut counts = RepointCounts::default();
        if !batch.booking_ids.is_empty() {
            counts.bookings = BookingRepo::repoint_role(
                &mut tx,
                &batch.booking_ids,
                &batch.old_role_id,
                &batch.new_role_id,
                batch.updated_at,
            )
            .await
            .map_err(|e| store_error(COLLECTION_BOOKINGS, e))?;
        }
        if !batch.submission_ids.is_empty() {
            counts.submissions = SubmissionRepo::repoint_role(
                &mut tx,
                &batch.submission_ids,
                &batch.old_role_id,
                &batch.new_role_id,
                batch.updated_at,
            )
            .await
            .map_err(|e| store_error(COLLECTION_SUBMISSIONS, e))?;
        }

        // Dropping `tx` on an early return rolls the batch back.
        tx.commit()
            .await
            .map_err(|e| store_error(COLLECTION_SUBMISSIONS, e))?;
        tracing::debug!(
            old_role_id = %batch.old_role_id,
            new_role_id = %batch.new_role_id,
            bookings = counts.bookings,
            submissions = counts.submissions,
            "Repoint batch committed",
        );
        Ok(counts)
    }
}
