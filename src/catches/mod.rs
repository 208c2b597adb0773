//! Catch-status controller.
//!
//! All state lives in the `catch_status` table, one boolean-flag row per
//! `(user, fish)` pair. Every operation commits synchronously; the
//! database's own isolation is the only concurrency guard, so concurrent
//! toggles race last-commit-wins.

use crate::db::{CatchStatus, DbPool, TrackedFish};

/// Create a `is_caught = false` row for every catalog fish the user has no
/// row for yet. Idempotent: the composite primary key absorbs re-runs.
///
/// Called when a user logs in, so the board always covers the full catalog.
pub async fn ensure_catalog_rows(pool: &DbPool, user_id: i64) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO catch_status (user_id, fish_id, is_caught)
        SELECT ?, id, 0 FROM fish WHERE true
        ON CONFLICT (user_id, fish_id) DO NOTHING
        "#,
    )
    .bind(user_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

/// Flip `is_caught` for one row. Returns `None` when the user has no row
/// for that fish: missing rows fail closed instead of being created on
/// demand.
pub async fn toggle(
    pool: &DbPool,
    user_id: i64,
    fish_id: i64,
) -> Result<Option<CatchStatus>, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE catch_status SET is_caught = NOT is_caught WHERE user_id = ? AND fish_id = ?",
    )
    .bind(user_id)
    .bind(fish_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }

    let row = sqlx::query_as::<_, CatchStatus>(
        "SELECT user_id, fish_id, is_caught FROM catch_status WHERE user_id = ? AND fish_id = ?",
    )
    .bind(user_id)
    .bind(fish_id)
    .fetch_one(pool)
    .await?;

    Ok(Some(row))
}

/// Set `is_caught` for each id to the given value. An absolute set per
/// row, never a toggle, so repeating a request cannot double-flip.
/// Ids with no row are skipped. Returns the number of rows updated.
pub async fn bulk_mark(
    pool: &DbPool,
    user_id: i64,
    fish_ids: &[i64],
    caught: bool,
) -> Result<u64, sqlx::Error> {
    let mut updated = 0;
    for fish_id in fish_ids {
        let result = sqlx::query(
            "UPDATE catch_status SET is_caught = ? WHERE user_id = ? AND fish_id = ?",
        )
        .bind(caught)
        .bind(user_id)
        .bind(fish_id)
        .execute(pool)
        .await?;
        updated += result.rows_affected();
    }
    Ok(updated)
}

/// The full catalog joined with one user's catch state, for the board.
pub async fn list_for_user(pool: &DbPool, user_id: i64) -> Result<Vec<TrackedFish>, sqlx::Error> {
    sqlx::query_as::<_, TrackedFish>(
        r#"
        SELECT f.id, f.name, f.icon_url, f.catchphrase, cs.is_caught
        FROM fish f
        JOIN catch_status cs ON cs.fish_id = f.id
        WHERE cs.user_id = ?
        ORDER BY f.name
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;
    use tokio_test::assert_ok;

    async fn insert_user(pool: &DbPool, username: &str) -> i64 {
        sqlx::query(
            "INSERT INTO users (username, email, password_hash, created_at) VALUES (?, ?, 'x', '2024-01-01T00:00:00Z')",
        )
        .bind(username)
        .bind(format!("{username}@example.com"))
        .execute(pool)
        .await
        .unwrap()
        .last_insert_rowid()
    }

    async fn insert_fish(pool: &DbPool, name: &str) -> i64 {
        sqlx::query("INSERT INTO fish (name, icon_url) VALUES (?, ?)")
            .bind(name)
            .bind(format!("https://example.com/{name}.png"))
            .execute(pool)
            .await
            .unwrap()
            .last_insert_rowid()
    }

    async fn row_count(pool: &DbPool, user_id: i64) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM catch_status WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(pool)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn ensure_catalog_rows_is_idempotent() {
        let pool = test_pool().await;
        let user = insert_user(&pool, "marina").await;
        insert_fish(&pool, "koi").await;
        insert_fish(&pool, "pike").await;
        insert_fish(&pool, "char").await;

        let created = tokio_test::assert_ok!(ensure_catalog_rows(&pool, user).await);
        assert_eq!(created, 3);

        let created_again = tokio_test::assert_ok!(ensure_catalog_rows(&pool, user).await);
        assert_eq!(created_again, 0);
        assert_eq!(row_count(&pool, user).await, 3);
    }

    #[tokio::test]
    async fn ensure_catalog_rows_keeps_existing_state() {
        let pool = test_pool().await;
        let user = insert_user(&pool, "marina").await;
        let koi = insert_fish(&pool, "koi").await;

        ensure_catalog_rows(&pool, user).await.unwrap();
        toggle(&pool, user, koi).await.unwrap();

        // A new catalog entry appears later; reconciling must not reset koi.
        insert_fish(&pool, "pike").await;
        ensure_catalog_rows(&pool, user).await.unwrap();

        let board = list_for_user(&pool, user).await.unwrap();
        assert_eq!(board.len(), 2);
        assert!(board.iter().find(|f| f.name == "koi").unwrap().is_caught);
        assert!(!board.iter().find(|f| f.name == "pike").unwrap().is_caught);
    }

    #[tokio::test]
    async fn toggle_flips_one_row_and_leaves_the_rest() {
        let pool = test_pool().await;
        let user = insert_user(&pool, "marina").await;
        let a = insert_fish(&pool, "A").await;
        let b = insert_fish(&pool, "B").await;
        ensure_catalog_rows(&pool, user).await.unwrap();

        let row = toggle(&pool, user, a).await.unwrap().unwrap();
        assert!(row.is_caught);
        assert_eq!(row.user_id, user);
        assert_eq!(row.fish_id, a);

        let board = list_for_user(&pool, user).await.unwrap();
        assert!(board.iter().find(|f| f.id == a).unwrap().is_caught);
        assert!(!board.iter().find(|f| f.id == b).unwrap().is_caught);

        // A second toggle flips it back.
        let row = toggle(&pool, user, a).await.unwrap().unwrap();
        assert!(!row.is_caught);
    }

    #[tokio::test]
    async fn toggle_on_missing_row_fails_closed() {
        let pool = test_pool().await;
        let user = insert_user(&pool, "marina").await;
        insert_fish(&pool, "koi").await;
        // No ensure_catalog_rows: the user has no rows at all.

        assert!(toggle(&pool, user, 999).await.unwrap().is_none());
        assert_eq!(row_count(&pool, user).await, 0);
    }

    #[tokio::test]
    async fn bulk_mark_sets_absolutely() {
        let pool = test_pool().await;
        let user = insert_user(&pool, "marina").await;
        let f1 = insert_fish(&pool, "f1").await;
        let f2 = insert_fish(&pool, "f2").await;
        ensure_catalog_rows(&pool, user).await.unwrap();

        bulk_mark(&pool, user, &[f1, f2], true).await.unwrap();
        bulk_mark(&pool, user, &[f1], false).await.unwrap();

        let board = list_for_user(&pool, user).await.unwrap();
        assert!(!board.iter().find(|f| f.id == f1).unwrap().is_caught);
        assert!(board.iter().find(|f| f.id == f2).unwrap().is_caught);

        // Re-sending the same request is a no-op, not a flip.
        bulk_mark(&pool, user, &[f2], true).await.unwrap();
        let board = list_for_user(&pool, user).await.unwrap();
        assert!(board.iter().find(|f| f.id == f2).unwrap().is_caught);
    }

    #[tokio::test]
    async fn bulk_mark_skips_unknown_ids() {
        let pool = test_pool().await;
        let user = insert_user(&pool, "marina").await;
        let f1 = insert_fish(&pool, "f1").await;
        ensure_catalog_rows(&pool, user).await.unwrap();

        let updated = bulk_mark(&pool, user, &[f1, 999], true).await.unwrap();
        assert_eq!(updated, 1);
    }

    #[tokio::test]
    async fn deleting_a_user_cascades_to_catch_rows() {
        let pool = test_pool().await;
        let user = insert_user(&pool, "marina").await;
        insert_fish(&pool, "koi").await;
        ensure_catalog_rows(&pool, user).await.unwrap();
        assert_eq!(row_count(&pool, user).await, 1);

        sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(user)
            .execute(&pool)
            .await
            .unwrap();

        assert_eq!(row_count(&pool, user).await, 0);
    }
}
