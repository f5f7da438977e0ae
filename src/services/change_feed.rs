use serde::Serialize;
use sqlx::SqlitePool;

use crate::db::ItemRepository;
use crate::error::AppResult;

// ============================================================================
// Change Feed
// ============================================================================

/// Cache-invalidation tuple polled by clients. Any difference from the
/// last-seen value (timestamp or count; a delete can change the count while
/// the newest timestamp stays put) means "refetch the whole list". This is
/// not a diff feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PollState {
    /// RFC 3339 timestamp of the most recent mutation, or "" with no list
    /// or no items.
    pub updated_at: String,
    pub item_count: i64,
}

pub struct ChangeFeed;

impl ChangeFeed {
    pub async fn poll(pool: &SqlitePool, list_id: Option<&str>) -> AppResult<PollState> {
        let list_id = match list_id {
            Some(id) => id,
            None => {
                return Ok(PollState {
                    updated_at: String::new(),
                    item_count: 0,
                })
            }
        };

        let (last_moved, item_count) = ItemRepository::poll_state(pool, list_id).await?;
        Ok(PollState {
            updated_at: last_moved
                .map(|ts| ts.and_utc().to_rfc3339())
                .unwrap_or_default(),
            item_count,
        })
    }
}
