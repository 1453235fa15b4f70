//! Incremental item sync.
//!
//! ## Protocol
//!
//! 1. The client calls `GET /api/items/updated?since=<ms>` with its cursor
//!    (0 on first run).
//! 2. With a zero cursor the server returns every live item as `newItems`
//!    and `isFullRefresh = true`.
//! 3. Otherwise it returns items created after the cursor, items updated
//!    after it but created before it, and tombstoned ids.
//! 4. The client merges with last-write-wins on `updatedAt` and stores
//!    `serverTime` as its next cursor.

mod cache;
mod client;
mod error;
pub mod protocol;
mod store;

pub use cache::{ItemCache, MergeOutcome};
pub use client::{poll, PollStats, SyncClient};
pub use error::SyncError;
pub use protocol::{ChangesQuery, ItemChanges, ItemRecord};
pub use store::CacheStore;
