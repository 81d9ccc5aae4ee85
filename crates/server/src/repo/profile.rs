use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use shared_types::{
    AppError, RegisterProfileRequest, SocialLink, UpdateProfileRequest, UserProfile, UserRole,
};
use sqlx::types::Json;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use super::ProfileStore;
use crate::error_convert::SqlxErrorExt;

const USER_COLUMNS: &str = r#"
    id, display_name, date_of_birth, country_code, role, avatar_url, bio,
    social_links, onboarding_completed, lesson_completed, test_completed,
    created_at, updated_at
"#;

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    display_name: String,
    date_of_birth: NaiveDate,
    country_code: String,
    role: String,
    avatar_url: Option<String>,
    bio: Option<String>,
    social_links: Json<Vec<SocialLink>>,
    onboarding_completed: bool,
    lesson_completed: bool,
    test_completed: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<UserRow> for UserProfile {
    fn from(r: UserRow) -> Self {
        UserProfile {
            id: r.id,
            display_name: r.display_name,
            date_of_birth: r.date_of_birth,
            country_code: r.country_code,
            role: UserRole::from_str_or_default(&r.role),
            avatar_url: r.avatar_url,
            bio: r.bio,
            social_links: r.social_links.0,
            onboarding_completed: r.onboarding_completed,
            lesson_completed: r.lesson_completed,
            test_completed: r.test_completed,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

/// Postgres-backed profile store over the `users` table.
#[derive(Clone)]
pub struct PgProfileStore {
    pool: Pool<Postgres>,
}

impl PgProfileStore {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProfileStore for PgProfileStore {
    async fn insert(
        &self,
        id: Uuid,
        req: &RegisterProfileRequest,
    ) -> Result<UserProfile, AppError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            INSERT INTO users (id, display_name, date_of_birth, country_code, role)
            VALUES ($1, $2, $3, $4, 'user')
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(req.display_name.trim())
        .bind(req.date_of_birth)
        .bind(&req.country_code)
        .fetch_one(&self.pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)?;

        Ok(row.into())
    }

    async fn find(&self, id: Uuid) -> Result<Option<UserProfile>, AppError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)?;

        Ok(row.map(UserProfile::from))
    }

    async fn display_name_taken(&self, display_name: &str) -> Result<bool, AppError> {
        let taken = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE lower(display_name) = lower($1))",
        )
        .bind(display_name.trim())
        .fetch_one(&self.pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)?;

        Ok(taken)
    }

    async fn update(
        &self,
        id: Uuid,
        req: &UpdateProfileRequest,
    ) -> Result<Option<UserProfile>, AppError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            UPDATE users SET
                avatar_url           = COALESCE($2, avatar_url),
                bio                  = COALESCE($3, bio),
                social_links         = COALESCE($4, social_links),
                country_code         = COALESCE($5, country_code),
                onboarding_completed = COALESCE($6, onboarding_completed),
                lesson_completed     = COALESCE($7, lesson_completed),
                test_completed       = COALESCE($8, test_completed),
                updated_at           = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(req.avatar_url.as_deref())
        .bind(req.bio.as_deref())
        .bind(req.social_links.as_ref().map(Json))
        .bind(req.country_code.as_deref())
        .bind(req.onboarding_completed)
        .bind(req.lesson_completed)
        .bind(req.test_completed)
        .fetch_optional(&self.pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)?;

        Ok(row.map(UserProfile::from))
    }
}
