//! Legacy booking model. New code records outcomes on submissions instead;
//! bookings are still scanned, repaired and archived.

use casting_core::status::BookingStatus;
use casting_core::store::{normalize_ref, BookingRecord, StoreError, COLLECTION_BOOKINGS};
use casting_core::types::{EntityId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::decode_error;

/// A booking row from the `bookings` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Booking {
    pub id: EntityId,
    pub user_id: EntityId,
    pub role_id: Option<EntityId>,
    pub project_id: EntityId,
    pub profile_id: Option<EntityId>,
    pub talent_name: Option<String>,
    pub status: String,
    pub archived_with_project: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for inserting a booking.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateBooking {
    pub user_id: EntityId,
    pub role_id: Option<EntityId>,
    pub project_id: EntityId,
    pub profile_id: Option<EntityId>,
    pub talent_name: Option<String>,
    /// Defaults to `pending` if omitted.
    pub status: Option<BookingStatus>,
}

impl TryFrom<Booking> for BookingRecord {
    type Error = StoreError;

    fn try_from(row: Booking) -> Result<Self, Self::Error> {
        let status: BookingStatus = row
            .status
            .parse()
            .map_err(|e| decode_error(COLLECTION_BOOKINGS, &row.id, e))?;
        Ok(BookingRecord {
            id: row.id,
            role_id: normalize_ref(row.role_id),
            user_id: row.user_id,
            project_id: row.project_id,
            talent_name: row.talent_name,
            status,
            archived_with_project: row.archived_with_project,
        })
    }
}
