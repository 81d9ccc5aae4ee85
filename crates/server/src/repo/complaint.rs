use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared_types::{
    AppError, Attachment, Complaint, ComplaintFilters, ComplaintPriority, ComplaintStats,
    ComplaintStatus, NewComplaint, PriorityBreakdown, UpdateComplaintRequest,
};
use sqlx::types::Json;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use super::{like_pattern, ComplaintStore, Review};
use crate::error_convert::SqlxErrorExt;

const COMPLAINT_COLUMNS: &str = r#"
    id, user_id, is_anonymous, title, violation_description, general_description,
    offender_name, affected_persons, violation_date, country_code, address,
    latitude, longitude, city, region, postal_code, attachments, status, priority,
    reviewed_at, assigned_moderator_id, moderator_note, views, upvotes,
    created_at, updated_at
"#;

/// Raw `complaints` row. Status and priority are TEXT columns guarded by
/// CHECK constraints.
#[derive(Debug, sqlx::FromRow)]
struct ComplaintRow {
    id: Uuid,
    user_id: Uuid,
    is_anonymous: bool,
    title: String,
    violation_description: String,
    general_description: Option<String>,
    offender_name: Option<String>,
    affected_persons: Option<String>,
    violation_date: Option<DateTime<Utc>>,
    country_code: String,
    address: String,
    latitude: Option<f64>,
    longitude: Option<f64>,
    city: Option<String>,
    region: Option<String>,
    postal_code: Option<String>,
    attachments: Json<Vec<Attachment>>,
    status: String,
    priority: Option<String>,
    reviewed_at: Option<DateTime<Utc>>,
    assigned_moderator_id: Option<Uuid>,
    moderator_note: Option<String>,
    views: i64,
    upvotes: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ComplaintRow> for Complaint {
    type Error = AppError;

    fn try_from(r: ComplaintRow) -> Result<Self, Self::Error> {
        let status = ComplaintStatus::parse(&r.status)
            .ok_or_else(|| AppError::database(format!("Unknown complaint status: {}", r.status)))?;
        let priority = match r.priority.as_deref() {
            Some(p) => Some(
                ComplaintPriority::parse(p)
                    .ok_or_else(|| AppError::database(format!("Unknown priority: {p}")))?,
            ),
            None => None,
        };

        Ok(Complaint {
            id: r.id,
            user_id: r.user_id,
            is_anonymous: r.is_anonymous,
            title: r.title,
            violation_description: r.violation_description,
            general_description: r.general_description,
            offender_name: r.offender_name,
            affected_persons: r.affected_persons,
            violation_date: r.violation_date,
            country_code: r.country_code,
            address: r.address,
            latitude: r.latitude,
            longitude: r.longitude,
            city: r.city,
            region: r.region,
            postal_code: r.postal_code,
            attachments: r.attachments.0,
            status,
            priority,
            reviewed_at: r.reviewed_at,
            assigned_moderator_id: r.assigned_moderator_id,
            moderator_note: r.moderator_note,
            views: r.views,
            upvotes: r.upvotes,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

fn convert_all(rows: Vec<ComplaintRow>) -> Result<Vec<Complaint>, AppError> {
    rows.into_iter().map(Complaint::try_from).collect()
}

fn convert_opt(row: Option<ComplaintRow>) -> Result<Option<Complaint>, AppError> {
    row.map(Complaint::try_from).transpose()
}

/// Postgres-backed complaint store.
#[derive(Clone)]
pub struct PgComplaintStore {
    pool: Pool<Postgres>,
}

impl PgComplaintStore {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ComplaintStore for PgComplaintStore {
    async fn insert(&self, new: NewComplaint) -> Result<Complaint, AppError> {
        let loc = new.location.as_ref();
        let row = sqlx::query_as::<_, ComplaintRow>(&format!(
            r#"
            INSERT INTO complaints
                (user_id, is_anonymous, title, violation_description, general_description,
                 offender_name, affected_persons, violation_date, country_code, address,
                 latitude, longitude, city, region, postal_code, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, 'pending')
            RETURNING {COMPLAINT_COLUMNS}
            "#
        ))
        .bind(new.user_id)
        .bind(new.is_anonymous)
        .bind(&new.title)
        .bind(&new.violation_description)
        .bind(new.general_description.as_deref())
        .bind(new.offender_name.as_deref())
        .bind(new.affected_persons.as_deref())
        .bind(new.violation_date)
        .bind(&new.country_code)
        .bind(&new.address)
        .bind(loc.map(|l| l.latitude))
        .bind(loc.map(|l| l.longitude))
        .bind(loc.and_then(|l| l.city.as_deref()))
        .bind(loc.and_then(|l| l.region.as_deref()))
        .bind(loc.and_then(|l| l.postal_code.as_deref()))
        .fetch_one(&self.pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)?;

        Complaint::try_from(row)
    }

    async fn find(&self, id: Uuid) -> Result<Option<Complaint>, AppError> {
        let row = sqlx::query_as::<_, ComplaintRow>(&format!(
            "SELECT {COMPLAINT_COLUMNS} FROM complaints WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)?;

        convert_opt(row)
    }

    async fn list(&self, filters: &ComplaintFilters) -> Result<Vec<Complaint>, AppError> {
        let search = filters.search_text().map(like_pattern);

        let rows = sqlx::query_as::<_, ComplaintRow>(&format!(
            r#"
            SELECT {COMPLAINT_COLUMNS}
            FROM complaints
            WHERE ($1::TEXT IS NULL OR status = $1)
              AND ($2::TEXT IS NULL OR country_code = $2)
              AND ($3::TEXT IS NULL OR priority = $3)
              AND ($4::TEXT IS NULL
                   OR title ILIKE $4
                   OR violation_description ILIKE $4
                   OR general_description ILIKE $4
                   OR address ILIKE $4
                   OR offender_name ILIKE $4)
            ORDER BY created_at DESC
            "#
        ))
        .bind(filters.status.map(|s| s.as_str()))
        .bind(filters.country_code())
        .bind(filters.priority.map(|p| p.as_str()))
        .bind(search)
        .fetch_all(&self.pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)?;

        convert_all(rows)
    }

    async fn list_by_owner(&self, user_id: Uuid) -> Result<Vec<Complaint>, AppError> {
        let rows = sqlx::query_as::<_, ComplaintRow>(&format!(
            r#"
            SELECT {COMPLAINT_COLUMNS}
            FROM complaints
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)?;

        convert_all(rows)
    }

    async fn stats(&self) -> Result<ComplaintStats, AppError> {
        let rows: Vec<(String, Option<String>, i64)> = sqlx::query_as(
            r#"
            SELECT status, priority, COUNT(*) AS "count"
            FROM complaints
            GROUP BY status, priority
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)?;

        let mut stats = ComplaintStats::default();
        let mut by_priority = PriorityBreakdown::default();
        for (status, priority, count) in rows {
            stats.total += count;
            match ComplaintStatus::parse(&status) {
                Some(ComplaintStatus::Pending) => stats.pending += count,
                Some(ComplaintStatus::Published) => stats.published += count,
                Some(ComplaintStatus::Hidden) => stats.hidden += count,
                Some(ComplaintStatus::Cancelled) | None => {}
            }
            match priority.as_deref().and_then(ComplaintPriority::parse) {
                Some(ComplaintPriority::Normal) => by_priority.normal_priority += count,
                Some(ComplaintPriority::High) => by_priority.high_priority += count,
                Some(ComplaintPriority::Critical) => by_priority.critical_priority += count,
                None => {}
            }
        }
        stats.by_priority = by_priority;
        Ok(stats)
    }

    async fn set_attachments(
        &self,
        id: Uuid,
        attachments: &[Attachment],
    ) -> Result<Option<Complaint>, AppError> {
        let row = sqlx::query_as::<_, ComplaintRow>(&format!(
            r#"
            UPDATE complaints SET attachments = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {COMPLAINT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(Json(attachments))
        .fetch_optional(&self.pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)?;

        convert_opt(row)
    }

    async fn update_content(
        &self,
        id: Uuid,
        req: &UpdateComplaintRequest,
    ) -> Result<Option<Complaint>, AppError> {
        let row = sqlx::query_as::<_, ComplaintRow>(&format!(
            r#"
            UPDATE complaints SET
                title                 = COALESCE($2, title),
                violation_description = COALESCE($3, violation_description),
                general_description   = COALESCE($4, general_description),
                offender_name         = COALESCE($5, offender_name),
                affected_persons      = COALESCE($6, affected_persons),
                attachments           = COALESCE($7, attachments),
                status                = 'pending',
                priority              = NULL,
                reviewed_at           = NULL,
                assigned_moderator_id = NULL,
                updated_at            = NOW()
            WHERE id = $1 AND status <> 'cancelled'
            RETURNING {COMPLAINT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(req.title.as_deref())
        .bind(req.violation_description.as_deref())
        .bind(req.general_description.as_deref())
        .bind(req.offender_name.as_deref())
        .bind(req.affected_persons.as_deref())
        .bind(req.attachments.as_ref().map(Json))
        .fetch_optional(&self.pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)?;

        convert_opt(row)
    }

    async fn apply_review(&self, id: Uuid, review: &Review) -> Result<Option<Complaint>, AppError> {
        let row = sqlx::query_as::<_, ComplaintRow>(&format!(
            r#"
            UPDATE complaints SET
                status                = $2,
                priority              = COALESCE($3, priority),
                assigned_moderator_id = $4,
                moderator_note        = COALESCE($5, moderator_note),
                reviewed_at           = $6,
                updated_at            = NOW()
            WHERE id = $1 AND status <> 'cancelled'
            RETURNING {COMPLAINT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(review.status.as_str())
        .bind(review.priority.map(|p| p.as_str()))
        .bind(review.moderator_id)
        .bind(review.note.as_deref())
        .bind(review.reviewed_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)?;

        convert_opt(row)
    }

    async fn cancel(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE complaints SET status = 'cancelled', updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn increment_views(&self, id: Uuid) -> Result<Option<i64>, AppError> {
        let views = sqlx::query_scalar::<_, i64>(
            "UPDATE complaints SET views = views + 1 WHERE id = $1 RETURNING views",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)?;

        Ok(views)
    }
}
