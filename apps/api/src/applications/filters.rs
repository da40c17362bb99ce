//! Filter, sort and pagination types for the application list.
//!
//! `ListQuery` is the raw query string; `status` may be repeated or
//! comma-separated. `parse` turns it into a typed
//! `ApplicationFilters` plus `Pagination`, reporting every bad parameter
//! at once. The same `ApplicationFilters` value drives both the count and
//! the page fetch so `total` and `items` can never disagree.

use chrono::NaiveDate;
use serde::Serialize;

use crate::errors::{AppError, FieldErrors};
use crate::models::ApplicationStatus;

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SortBy {
    #[default]
    ApplicationDate,
    CompanyName,
    Position,
    CreatedAt,
}

impl SortBy {
    /// ORDER BY expression; only ever one of these fixed strings reaches SQL.
    /// Text columns sort case-insensitively whatever the database collation.
    pub fn order_expr(&self) -> &'static str {
        match self {
            SortBy::ApplicationDate => "application_date",
            SortBy::CompanyName => "LOWER(company_name)",
            SortBy::Position => "LOWER(position)",
            SortBy::CreatedAt => "created_at",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value {
            "applicationDate" => Some(SortBy::ApplicationDate),
            "companyName" => Some(SortBy::CompanyName),
            "position" => Some(SortBy::Position),
            "createdAt" => Some(SortBy::CreatedAt),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn keyword(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value {
            "asc" => Some(SortOrder::Asc),
            "desc" => Some(SortOrder::Desc),
            _ => None,
        }
    }
}

/// Inclusive bounds on `application_date`; either side may be open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ApplicationFilters {
    /// Empty means every status.
    pub status: Vec<ApplicationStatus>,
    pub search: Option<String>,
    pub date_range: DateRange,
    pub sort_by: SortBy,
    pub sort_order: SortOrder,
}

/// A validated page request, produced by `ListQuery::parse`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    page: u32,
    limit: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

impl Pagination {
    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn offset(&self) -> i64 {
        (i64::from(self.page) - 1) * i64::from(self.limit)
    }
}

/// One page of results plus the metadata needed to render a pager.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub limit: u32,
    pub total: i64,
    pub total_pages: i64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, pagination: Pagination, total: i64) -> Self {
        let limit = i64::from(pagination.limit());
        Self {
            items,
            page: pagination.page(),
            limit: pagination.limit(),
            total,
            total_pages: (total + limit - 1) / limit,
        }
    }
}

/// Raw `GET /applications` query string.
#[derive(Debug, Default)]
pub struct ListQuery {
    pub status: Option<String>,
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

impl ListQuery {
    /// Collects decoded query pairs. Repeated `status` keys are merged;
    /// any other key given twice is rejected. Unknown keys are ignored.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Result<Self, AppError>
    where
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut query = Self::default();
        let mut errors = FieldErrors::new();
        for (key, value) in pairs {
            let key = key.as_ref();
            let value = value.into();
            let slot = match key {
                "status" => {
                    match query.status.as_mut() {
                        Some(existing) => {
                            existing.push(',');
                            existing.push_str(&value);
                        }
                        None => query.status = Some(value),
                    }
                    continue;
                }
                "search" => &mut query.search,
                "sortBy" => &mut query.sort_by,
                "sortOrder" => &mut query.sort_order,
                "startDate" => &mut query.start_date,
                "endDate" => &mut query.end_date,
                "page" => &mut query.page,
                "limit" => &mut query.limit,
                _ => continue,
            };
            if slot.is_some() {
                errors.add(key, "must be given at most once");
            } else {
                *slot = Some(value);
            }
        }
        errors.into_result()?;
        Ok(query)
    }

    pub fn parse(self) -> Result<(ApplicationFilters, Pagination), AppError> {
        let mut errors = FieldErrors::new();
        let mut filters = ApplicationFilters::default();

        if let Some(raw) = non_blank(self.status.as_deref()) {
            for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
                match part.parse::<ApplicationStatus>() {
                    Ok(status) if !filters.status.contains(&status) => filters.status.push(status),
                    Ok(_) => {}
                    Err(reason) => errors.add("status", reason),
                }
            }
        }

        filters.search = non_blank(self.search.as_deref()).map(str::to_string);

        if let Some(raw) = non_blank(self.sort_by.as_deref()) {
            match SortBy::parse(raw) {
                Some(sort_by) => filters.sort_by = sort_by,
                None => errors.add(
                    "sortBy",
                    "must be one of applicationDate, companyName, position, createdAt",
                ),
            }
        }

        if let Some(raw) = non_blank(self.sort_order.as_deref()) {
            match SortOrder::parse(raw) {
                Some(order) => filters.sort_order = order,
                None => errors.add("sortOrder", "must be asc or desc"),
            }
        }

        filters.date_range.start = parse_date_param("startDate", self.start_date, &mut errors);
        filters.date_range.end = parse_date_param("endDate", self.end_date, &mut errors);
        if let (Some(start), Some(end)) = (filters.date_range.start, filters.date_range.end) {
            if start > end {
                errors.add("startDate", "must not be after endDate");
            }
        }

        let page = parse_bounded("page", self.page, 1, u32::MAX, &mut errors);
        let limit = parse_bounded("limit", self.limit, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, &mut errors);

        errors.into_result()?;
        Ok((filters, Pagination { page, limit }))
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn parse_date_param(
    field: &str,
    value: Option<String>,
    errors: &mut FieldErrors,
) -> Option<NaiveDate> {
    let raw = non_blank(value.as_deref())?;
    match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        Ok(date) => Some(date),
        Err(_) => {
            errors.add(field, "must be a date in YYYY-MM-DD format");
            None
        }
    }
}

fn parse_bounded(
    field: &str,
    value: Option<String>,
    default: u32,
    max: u32,
    errors: &mut FieldErrors,
) -> u32 {
    let Some(raw) = non_blank(value.as_deref()) else {
        return default;
    };
    match raw.parse::<u32>() {
        Ok(n) if n > 0 && n <= max => n,
        Ok(n) if n > max => {
            errors.add(field, format!("must be between 1 and {max}"));
            default
        }
        _ => {
            errors.add(field, "must be a positive integer");
            default
        }
    }
}
