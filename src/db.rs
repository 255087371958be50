use chrono::Utc;
use sqlx::{sqlite::SqlitePoolOptions, FromRow, SqlitePool};

use crate::config::ModuleConfig;

#[derive(Debug, Clone, FromRow)]
pub struct Module {
    pub id: String,
    pub title: String,
    pub description: String,
    pub created_at: String,
}

#[derive(Debug, Clone, FromRow)]
pub struct Video {
    pub id: String,
    pub title: String,
    pub youtube_url: String,
    pub module_id: String,
    pub created_at: String,
}

pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }

    pub async fn initialize(&self) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS modules (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                description TEXT NOT NULL,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS videos (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                youtube_url TEXT NOT NULL,
                module_id TEXT NOT NULL REFERENCES modules(id),
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_videos_module_created
            ON videos(module_id, created_at)
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Upsert the configured catalog. Existing rows keep their original
    /// `created_at`, so re-syncing never reorders the catalog.
    pub async fn sync_catalog(&self, modules: &[ModuleConfig]) -> anyhow::Result<()> {
        for module in modules {
            let now = Utc::now().to_rfc3339();
            sqlx::query(
                r#"
                INSERT INTO modules (id, title, description, created_at)
                VALUES (?, ?, ?, ?)
                ON CONFLICT(id) DO UPDATE SET
                    title = excluded.title,
                    description = excluded.description
                "#,
            )
            .bind(&module.id)
            .bind(&module.title)
            .bind(&module.description)
            .bind(&now)
            .execute(&self.pool)
            .await?;

            for video in &module.videos {
                let now = Utc::now().to_rfc3339();
                sqlx::query(
                    r#"
                    INSERT INTO videos (id, title, youtube_url, module_id, created_at)
                    VALUES (?, ?, ?, ?, ?)
                    ON CONFLICT(id) DO UPDATE SET
                        title = excluded.title,
                        youtube_url = excluded.youtube_url,
                        module_id = excluded.module_id
                    "#,
                )
                .bind(&video.id)
                .bind(&video.title)
                .bind(&video.youtube_url)
                .bind(&module.id)
                .bind(&now)
                .execute(&self.pool)
                .await?;
            }
        }
        Ok(())
    }

    pub async fn get_all_modules(&self) -> anyhow::Result<Vec<Module>> {
        let modules =
            sqlx::query_as::<_, Module>("SELECT * FROM modules ORDER BY created_at, rowid")
                .fetch_all(&self.pool)
                .await?;
        Ok(modules)
    }

    pub async fn get_module(&self, module_id: &str) -> anyhow::Result<Option<Module>> {
        let module = sqlx::query_as::<_, Module>("SELECT * FROM modules WHERE id = ?")
            .bind(module_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(module)
    }

    pub async fn get_videos_for_module(&self, module_id: &str) -> anyhow::Result<Vec<Video>> {
        let videos = sqlx::query_as::<_, Video>(
            r#"
            SELECT * FROM videos
            WHERE module_id = ?
            ORDER BY created_at, rowid
            "#,
        )
        .bind(module_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(videos)
    }

    pub async fn get_video_count_for_module(&self, module_id: &str) -> anyhow::Result<i64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM videos WHERE module_id = ?")
            .bind(module_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count.0)
    }
}
