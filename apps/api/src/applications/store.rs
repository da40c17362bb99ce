use async_trait::async_trait;
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use crate::applications::filters::{ApplicationFilters, Pagination};
use crate::db::PgStore;
use crate::errors::AppError;
use crate::models::JobApplication;

/// Persistence for job applications. Every method is scoped by owner so a
/// bare application id can never reach another user's row.
#[async_trait]
pub trait ApplicationStore: Send + Sync {
    async fn insert(&self, application: &JobApplication) -> Result<JobApplication, AppError>;

    async fn find(&self, owner: Uuid, id: Uuid) -> Result<Option<JobApplication>, AppError>;

    /// Overwrites the row matching `application.id` and `application.user_id`.
    /// Returns `None` when no such row exists.
    async fn update(&self, application: &JobApplication) -> Result<Option<JobApplication>, AppError>;

    async fn delete(&self, owner: Uuid, id: Uuid) -> Result<bool, AppError>;

    /// Returns one page of matching rows and the count of all matching rows.
    async fn query(
        &self,
        owner: Uuid,
        filters: &ApplicationFilters,
        pagination: Pagination,
    ) -> Result<(Vec<JobApplication>, i64), AppError>;

    /// Every row for the owner, newest application first, capped at `cap`.
    async fn all_for_owner(&self, owner: Uuid, cap: i64) -> Result<Vec<JobApplication>, AppError>;
}

/// Sort with an `id` tiebreak so pages are stable, then LIMIT/OFFSET.
fn push_order_and_page(
    builder: &mut QueryBuilder<'_, Postgres>,
    filters: &ApplicationFilters,
    pagination: Pagination,
) {
    builder
        .push(" ORDER BY ")
        .push(filters.sort_by.order_expr())
        .push(" ")
        .push(filters.sort_order.keyword())
        .push(", id ASC LIMIT ")
        .push_bind(i64::from(pagination.limit()))
        .push(" OFFSET ")
        .push_bind(pagination.offset());
}

/// Escapes LIKE wildcards in user input and wraps it for substring matching.
pub fn like_pattern(search: &str) -> String {
    let mut escaped = String::with_capacity(search.len() + 2);
    escaped.push('%');
    for c in search.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

/// Appends the WHERE clause shared by the count and the page fetch.
/// Ownership is always the first conjunct.
fn push_predicate(builder: &mut QueryBuilder<'_, Postgres>, owner: Uuid, filters: &ApplicationFilters) {
    builder.push(" WHERE user_id = ").push_bind(owner);

    if !filters.status.is_empty() {
        builder.push(" AND status IN (");
        let mut statuses = builder.separated(", ");
        for status in &filters.status {
            statuses.push_bind(*status);
        }
        statuses.push_unseparated(")");
    }

    if let Some(search) = &filters.search {
        let pattern = like_pattern(search);
        builder
            .push(" AND (company_name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR position ILIKE ")
            .push_bind(pattern)
            .push(")");
    }

    if let Some(start) = filters.date_range.start {
        builder.push(" AND application_date >= ").push_bind(start);
    }
    if let Some(end) = filters.date_range.end {
        builder.push(" AND application_date <= ").push_bind(end);
    }
}

#[async_trait]
impl ApplicationStore for PgStore {
    async fn insert(&self, application: &JobApplication) -> Result<JobApplication, AppError> {
        let row = sqlx::query_as::<_, JobApplication>(
            r#"
            INSERT INTO job_applications
                (id, user_id, company_name, position, description, requirements, location,
                 salary, application_date, status, job_url, notes, follow_up_date,
                 resume_id, cover_letter_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            RETURNING *
            "#,
        )
        .bind(application.id)
        .bind(application.user_id)
        .bind(&application.company_name)
        .bind(&application.position)
        .bind(&application.description)
        .bind(&application.requirements)
        .bind(&application.location)
        .bind(application.salary)
        .bind(application.application_date)
        .bind(application.status)
        .bind(&application.job_url)
        .bind(&application.notes)
        .bind(application.follow_up_date)
        .bind(application.resume_id)
        .bind(application.cover_letter_id)
        .bind(application.created_at)
        .bind(application.updated_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn find(&self, owner: Uuid, id: Uuid) -> Result<Option<JobApplication>, AppError> {
        Ok(sqlx::query_as::<_, JobApplication>(
            "SELECT * FROM job_applications WHERE id = $1 AND user_id = $2",
        )
        .bind(id)
        .bind(owner)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn update(&self, application: &JobApplication) -> Result<Option<JobApplication>, AppError> {
        Ok(sqlx::query_as::<_, JobApplication>(
            r#"
            UPDATE job_applications SET
                company_name = $3, position = $4, description = $5, requirements = $6,
                location = $7, salary = $8, application_date = $9, status = $10,
                job_url = $11, notes = $12, follow_up_date = $13, resume_id = $14,
                cover_letter_id = $15, updated_at = $16
            WHERE id = $1 AND user_id = $2
            RETURNING *
            "#,
        )
        .bind(application.id)
        .bind(application.user_id)
        .bind(&application.company_name)
        .bind(&application.position)
        .bind(&application.description)
        .bind(&application.requirements)
        .bind(&application.location)
        .bind(application.salary)
        .bind(application.application_date)
        .bind(application.status)
        .bind(&application.job_url)
        .bind(&application.notes)
        .bind(application.follow_up_date)
        .bind(application.resume_id)
        .bind(application.cover_letter_id)
        .bind(application.updated_at)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn delete(&self, owner: Uuid, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM job_applications WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(owner)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn query(
        &self,
        owner: Uuid,
        filters: &ApplicationFilters,
        pagination: Pagination,
    ) -> Result<(Vec<JobApplication>, i64), AppError> {
        let mut page = QueryBuilder::<Postgres>::new("SELECT * FROM job_applications");
        push_predicate(&mut page, owner, filters);
        push_order_and_page(&mut page, filters, pagination);

        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM job_applications");
        push_predicate(&mut count, owner, filters);

        let (items, total) = tokio::try_join!(
            page.build_query_as::<JobApplication>().fetch_all(&self.pool),
            count.build_query_scalar::<i64>().fetch_one(&self.pool),
        )?;
        Ok((items, total))
    }

    async fn all_for_owner(&self, owner: Uuid, cap: i64) -> Result<Vec<JobApplication>, AppError> {
        Ok(sqlx::query_as::<_, JobApplication>(
            r#"
            SELECT * FROM job_applications
            WHERE user_id = $1
            ORDER BY application_date DESC, created_at DESC
            LIMIT $2
            "#,
        )
        .bind(owner)
        .bind(cap)
        .fetch_all(&self.pool)
        .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::applications::filters::{DateRange, SortBy, SortOrder};
    use crate::models::ApplicationStatus;
    use chrono::NaiveDate;

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("acme"), "%acme%");
        assert_eq!(like_pattern("100%_"), "%100\\%\\_%");
        assert_eq!(like_pattern("a\\b"), "%a\\\\b%");
    }

    #[test]
    fn test_predicate_starts_with_owner_scope() {
        let filters = ApplicationFilters {
            status: vec![ApplicationStatus::Interview, ApplicationStatus::Offered],
            search: Some("rust".into()),
            date_range: DateRange {
                start: NaiveDate::from_ymd_opt(2024, 1, 1),
                end: NaiveDate::from_ymd_opt(2024, 12, 31),
            },
            ..Default::default()
        };
        let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM job_applications");
        push_predicate(&mut builder, Uuid::new_v4(), &filters);
        let sql = builder.sql();

        assert!(sql.starts_with("SELECT COUNT(*) FROM job_applications WHERE user_id = $1"));
        assert!(sql.contains("status IN ($2, $3)"));
        assert!(sql.contains("company_name ILIKE $4 OR position ILIKE $5"));
        assert!(sql.contains("application_date >= $6"));
        assert!(sql.ends_with("application_date <= $7"));
    }

    #[test]
    fn test_company_sort_ignores_case() {
        let filters = ApplicationFilters {
            sort_by: SortBy::CompanyName,
            sort_order: SortOrder::Asc,
            ..Default::default()
        };
        let mut builder = QueryBuilder::<Postgres>::new("SELECT * FROM job_applications");
        push_predicate(&mut builder, Uuid::new_v4(), &filters);
        push_order_and_page(&mut builder, &filters, Pagination::default());
        assert!(builder
            .sql()
            .ends_with("ORDER BY LOWER(company_name) ASC, id ASC LIMIT $2 OFFSET $3"));
    }

    #[test]
    fn test_empty_filters_only_scope_by_owner() {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT * FROM job_applications");
        push_predicate(&mut builder, Uuid::new_v4(), &ApplicationFilters::default());
        assert_eq!(builder.sql(), "SELECT * FROM job_applications WHERE user_id = $1");
    }
}
