//! Process-local caches in front of the hottest queries.
//!
//! Both caches are read-through with a short TTL, so a missed invalidation
//! costs staleness measured in seconds. Writers still invalidate on every
//! state change to keep the common path fresh.

use moka::sync::Cache;
use once_cell::sync::Lazy;
use std::time::Duration;

const UNREAD_TTL: Duration = Duration::from_secs(30);
const CATALOG_TTL: Duration = Duration::from_secs(60);

/// Unread notification badge, keyed by user id. Every authenticated
/// request reads this through `ClientCtx`.
static UNREAD_BADGE: Lazy<Cache<i32, i64>> = Lazy::new(|| {
    Cache::builder()
        .time_to_live(UNREAD_TTL)
        .max_capacity(10_000)
        .build()
});

/// The approved-product catalog. A single entry; any review outcome or
/// founder submission drops it.
static CATALOG: Lazy<Cache<(), Vec<crate::products::CatalogItem>>> = Lazy::new(|| {
    Cache::builder()
        .time_to_live(CATALOG_TTL)
        .max_capacity(1)
        .build()
});

/// The user's unread notification count, served from cache when warm.
/// A count the database cannot produce reads as zero rather than failing
/// the surrounding request.
pub async fn get_unread_count(user_id: i32) -> i64 {
    if let Some(count) = UNREAD_BADGE.get(&user_id) {
        return count;
    }

    let count = crate::notifications::count_unread_notifications(user_id)
        .await
        .unwrap_or(0);
    UNREAD_BADGE.insert(user_id, count);
    count
}

pub fn invalidate_unread_count(user_id: i32) {
    UNREAD_BADGE.invalidate(&user_id);
}

/// The investor-facing catalog, rebuilt from the database at most once
/// per TTL window.
pub async fn get_catalog() -> Result<Vec<crate::products::CatalogItem>, sea_orm::DbErr> {
    if let Some(items) = CATALOG.get(&()) {
        return Ok(items);
    }

    let items = crate::products::load_catalog().await?;
    CATALOG.insert((), items.clone());
    Ok(items)
}

pub fn invalidate_catalog() {
    CATALOG.invalidate(&());
}
