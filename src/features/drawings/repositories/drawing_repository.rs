use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::core::error::Result;
use crate::features::drawings::models::{Drawing, DrawingPatch, NewDrawing};

/// Persistence boundary for drawings
///
/// Every method is a single statement; concurrent callers rely on the
/// store's own isolation.
#[async_trait]
pub trait DrawingRepository: Send + Sync {
    /// All drawings, newest `created` first
    async fn list(&self) -> Result<Vec<Drawing>>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Drawing>>;

    async fn insert(&self, drawing: NewDrawing) -> Result<Drawing>;

    /// Apply `patch`, returning `None` when no row has this id
    async fn update(&self, id: Uuid, patch: DrawingPatch) -> Result<Option<Drawing>>;

    /// Delete by id, returning the removed row
    async fn delete(&self, id: Uuid) -> Result<Option<Drawing>>;
}

/// PostgreSQL-backed drawing repository
pub struct PgDrawingRepository {
    pool: PgPool,
}

impl PgDrawingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DrawingRepository for PgDrawingRepository {
    async fn list(&self) -> Result<Vec<Drawing>> {
        let drawings = sqlx::query_as::<_, Drawing>(
            r#"
            SELECT id, title, file, created
            FROM drawings
            ORDER BY created DESC, id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(drawings)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Drawing>> {
        let drawing = sqlx::query_as::<_, Drawing>(
            r#"
            SELECT id, title, file, created
            FROM drawings
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(drawing)
    }

    async fn insert(&self, drawing: NewDrawing) -> Result<Drawing> {
        let drawing = sqlx::query_as::<_, Drawing>(
            r#"
            INSERT INTO drawings (id, title, file)
            VALUES ($1, $2, $3)
            RETURNING id, title, file, created
            "#,
        )
        .bind(drawing.id)
        .bind(drawing.title)
        .bind(drawing.file)
        .fetch_one(&self.pool)
        .await?;

        Ok(drawing)
    }

    async fn update(&self, id: Uuid, patch: DrawingPatch) -> Result<Option<Drawing>> {
        let drawing = sqlx::query_as::<_, Drawing>(
            r#"
            UPDATE drawings
            SET title = COALESCE($1, title),
                file = COALESCE($2, file)
            WHERE id = $3
            RETURNING id, title, file, created
            "#,
        )
        .bind(patch.title)
        .bind(patch.file)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(drawing)
    }

    async fn delete(&self, id: Uuid) -> Result<Option<Drawing>> {
        let drawing = sqlx::query_as::<_, Drawing>(
            r#"
            DELETE FROM drawings
            WHERE id = $1
            RETURNING id, title, file, created
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(drawing)
    }
}
