use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared_types::{
    AppError, CreateHelpRequest, HelpRequest, HelpRequestStatus, PaymentDetails, UpdateHelpRequest,
};
use sqlx::types::Json;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use super::HelpRequestStore;
use crate::error_convert::SqlxErrorExt;

const HELP_REQUEST_COLUMNS: &str = r#"
    id, user_id, title, description, help_types, payment_details,
    attachment_urls, status, created_at, updated_at
"#;

#[derive(Debug, sqlx::FromRow)]
struct HelpRequestRow {
    id: Uuid,
    user_id: Uuid,
    title: String,
    description: String,
    help_types: Vec<String>,
    payment_details: Option<Json<PaymentDetails>>,
    attachment_urls: Vec<String>,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<HelpRequestRow> for HelpRequest {
    type Error = AppError;

    fn try_from(r: HelpRequestRow) -> Result<Self, Self::Error> {
        let status = HelpRequestStatus::parse(&r.status).ok_or_else(|| {
            AppError::database(format!("Unknown help request status: {}", r.status))
        })?;

        Ok(HelpRequest {
            id: r.id,
            user_id: r.user_id,
            title: r.title,
            description: r.description,
            help_types: r.help_types,
            payment_details: r.payment_details.map(|j| j.0),
            attachment_urls: r.attachment_urls,
            status,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

/// Postgres-backed help request store.
#[derive(Clone)]
pub struct PgHelpRequestStore {
    pool: Pool<Postgres>,
}

impl PgHelpRequestStore {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl HelpRequestStore for PgHelpRequestStore {
    async fn insert(
        &self,
        user_id: Uuid,
        req: CreateHelpRequest,
    ) -> Result<HelpRequest, AppError> {
        let row = sqlx::query_as::<_, HelpRequestRow>(&format!(
            r#"
            INSERT INTO help_requests
                (user_id, title, description, help_types, payment_details, attachment_urls, status)
            VALUES ($1, $2, $3, $4, $5, $6, 'active')
            RETURNING {HELP_REQUEST_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(&req.title)
        .bind(&req.description)
        .bind(&req.help_types)
        .bind(req.payment_details.map(Json))
        .bind(&req.attachment_urls)
        .fetch_one(&self.pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)?;

        HelpRequest::try_from(row)
    }

    async fn find(&self, id: Uuid) -> Result<Option<HelpRequest>, AppError> {
        let row = sqlx::query_as::<_, HelpRequestRow>(&format!(
            "SELECT {HELP_REQUEST_COLUMNS} FROM help_requests WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)?;

        row.map(HelpRequest::try_from).transpose()
    }

    async fn list_active(&self) -> Result<Vec<HelpRequest>, AppError> {
        let rows = sqlx::query_as::<_, HelpRequestRow>(&format!(
            r#"
            SELECT {HELP_REQUEST_COLUMNS}
            FROM help_requests
            WHERE status = 'active'
            ORDER BY created_at DESC
            "#
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)?;

        rows.into_iter().map(HelpRequest::try_from).collect()
    }

    async fn update(
        &self,
        id: Uuid,
        req: &UpdateHelpRequest,
    ) -> Result<Option<HelpRequest>, AppError> {
        let row = sqlx::query_as::<_, HelpRequestRow>(&format!(
            r#"
            UPDATE help_requests SET
                title           = COALESCE($2, title),
                description     = COALESCE($3, description),
                help_types      = COALESCE($4, help_types),
                payment_details = COALESCE($5, payment_details),
                attachment_urls = COALESCE($6, attachment_urls),
                updated_at      = NOW()
            WHERE id = $1
            RETURNING {HELP_REQUEST_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(req.title.as_deref())
        .bind(req.description.as_deref())
        .bind(req.help_types.as_deref())
        .bind(req.payment_details.as_ref().map(Json))
        .bind(req.attachment_urls.as_deref())
        .fetch_optional(&self.pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)?;

        row.map(HelpRequest::try_from).transpose()
    }

    async fn set_status(
        &self,
        id: Uuid,
        status: HelpRequestStatus,
    ) -> Result<Option<HelpRequest>, AppError> {
        let row = sqlx::query_as::<_, HelpRequestRow>(&format!(
            r#"
            UPDATE help_requests SET status = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {HELP_REQUEST_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(status.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)?;

        row.map(HelpRequest::try_from).transpose()
    }
}
