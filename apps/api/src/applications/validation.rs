//! Request bodies for creating and updating applications, and the rules
//! both must satisfy. Dates and statuses arrive as strings so that a bad
//! value is reported per field instead of rejecting the whole body.
//!
//! `followUpDate` is not ordered against `applicationDate`.

use axum::http::Uri;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer};
use uuid::Uuid;

use crate::errors::{AppError, FieldErrors};
use crate::models::{ApplicationStatus, JobApplication};

const MAX_TITLE_CHARS: usize = 255;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateApplicationRequest {
    pub company_name: Option<String>,
    pub position: Option<String>,
    pub description: Option<String>,
    pub requirements: Option<String>,
    pub location: Option<String>,
    pub salary: Option<f64>,
    pub application_date: Option<String>,
    pub status: Option<String>,
    pub job_url: Option<String>,
    pub notes: Option<String>,
    pub follow_up_date: Option<String>,
    pub resume_id: Option<Uuid>,
    pub cover_letter_id: Option<Uuid>,
}

/// Partial update. A missing key leaves the field alone; an explicit
/// `null` clears a nullable field.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateApplicationRequest {
    pub company_name: Option<String>,
    pub position: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub requirements: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub location: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub salary: Option<Option<f64>>,
    pub application_date: Option<String>,
    pub status: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub job_url: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub notes: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub follow_up_date: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub resume_id: Option<Option<Uuid>>,
    #[serde(default, deserialize_with = "nullable")]
    pub cover_letter_id: Option<Option<Uuid>>,
}

fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl CreateApplicationRequest {
    pub fn into_application(
        self,
        owner: Uuid,
        now: DateTime<Utc>,
    ) -> Result<JobApplication, AppError> {
        let mut errors = FieldErrors::new();

        let company_name = required_title("companyName", "Company name", self.company_name, &mut errors);
        let position = required_title("position", "Position", self.position, &mut errors);
        let application_date = match non_blank(self.application_date) {
            Some(raw) => parse_date("applicationDate", &raw, &mut errors),
            None => {
                errors.add("applicationDate", "Application date is required");
                None
            }
        };
        let status = match non_blank(self.status) {
            Some(raw) => parse_status(&raw, &mut errors),
            None => {
                errors.add("status", "Status is required");
                None
            }
        };
        let follow_up_date =
            non_blank(self.follow_up_date).and_then(|raw| parse_date("followUpDate", &raw, &mut errors));
        let job_url = non_blank(self.job_url);
        check_salary(self.salary, &mut errors);
        check_job_url(job_url.as_deref(), &mut errors);

        let (Some(company_name), Some(position), Some(application_date), Some(status)) =
            (company_name, position, application_date, status)
        else {
            return Err(AppError::Validation(errors));
        };
        errors.into_result()?;

        Ok(JobApplication {
            id: Uuid::new_v4(),
            user_id: owner,
            company_name,
            position,
            description: non_blank(self.description),
            requirements: non_blank(self.requirements),
            location: non_blank(self.location),
            salary: self.salary,
            application_date,
            status,
            job_url,
            notes: non_blank(self.notes),
            follow_up_date,
            resume_id: self.resume_id,
            cover_letter_id: self.cover_letter_id,
            created_at: now,
            updated_at: now,
            resume: None,
            cover_letter: None,
        })
    }
}

impl UpdateApplicationRequest {
    /// Merges the patch over `existing` and re-validates the result.
    pub fn apply_to(
        self,
        existing: &JobApplication,
        now: DateTime<Utc>,
    ) -> Result<JobApplication, AppError> {
        let mut errors = FieldErrors::new();
        let mut updated = existing.clone();

        if let Some(raw) = self.company_name {
            if let Some(value) = required_title("companyName", "Company name", Some(raw), &mut errors) {
                updated.company_name = value;
            }
        }
        if let Some(raw) = self.position {
            if let Some(value) = required_title("position", "Position", Some(raw), &mut errors) {
                updated.position = value;
            }
        }
        if let Some(raw) = self.application_date {
            match non_blank(Some(raw)) {
                Some(raw) => {
                    if let Some(date) = parse_date("applicationDate", &raw, &mut errors) {
                        updated.application_date = date;
                    }
                }
                None => errors.add("applicationDate", "Application date is required"),
            }
        }
        if let Some(raw) = self.status {
            if let Some(status) = parse_status(&raw, &mut errors) {
                updated.status = status;
            }
        }
        if let Some(value) = self.follow_up_date {
            updated.follow_up_date =
                non_blank(value).and_then(|raw| parse_date("followUpDate", &raw, &mut errors));
        }
        if let Some(value) = self.description {
            updated.description = non_blank(value);
        }
        if let Some(value) = self.requirements {
            updated.requirements = non_blank(value);
        }
        if let Some(value) = self.location {
            updated.location = non_blank(value);
        }
        if let Some(value) = self.notes {
            updated.notes = non_blank(value);
        }
        if let Some(value) = self.job_url {
            updated.job_url = non_blank(value);
        }
        if let Some(value) = self.salary {
            updated.salary = value;
        }
        if let Some(value) = self.resume_id {
            updated.resume_id = value;
        }
        if let Some(value) = self.cover_letter_id {
            updated.cover_letter_id = value;
        }

        check_salary(updated.salary, &mut errors);
        check_job_url(updated.job_url.as_deref(), &mut errors);
        errors.into_result()?;

        updated.updated_at = now;
        Ok(updated)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn required_title(
    field: &str,
    label: &str,
    value: Option<String>,
    errors: &mut FieldErrors,
) -> Option<String> {
    match non_blank(value) {
        None => {
            errors.add(field, format!("{label} is required"));
            None
        }
        Some(v) if v.chars().count() > MAX_TITLE_CHARS => {
            errors.add(field, format!("{label} must be at most {MAX_TITLE_CHARS} characters"));
            None
        }
        Some(v) => Some(v),
    }
}

fn parse_date(field: &str, raw: &str, errors: &mut FieldErrors) -> Option<NaiveDate> {
    // Accept a bare date or a full timestamp and keep only the calendar date.
    let parsed = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()));
    if parsed.is_none() {
        errors.add(field, "must be a date in YYYY-MM-DD format");
    }
    parsed
}

fn parse_status(raw: &str, errors: &mut FieldErrors) -> Option<ApplicationStatus> {
    match raw.trim().parse::<ApplicationStatus>() {
        Ok(status) => Some(status),
        Err(_) => {
            errors.add(
                "status",
                "must be one of APPLIED, INTERVIEW, OFFERED, REJECTED, WITHDRAWN",
            );
            None
        }
    }
}

fn check_salary(salary: Option<f64>, errors: &mut FieldErrors) {
    if let Some(salary) = salary {
        if !salary.is_finite() || salary <= 0.0 {
            errors.add("salary", "must be a positive number");
        }
    }
}

fn check_job_url(url: Option<&str>, errors: &mut FieldErrors) {
    let Some(url) = url else { return };
    let valid = url
        .parse::<Uri>()
        .map(|uri| {
            matches!(uri.scheme_str(), Some("http") | Some("https")) && uri.authority().is_some()
        })
        .unwrap_or(false);
    if !valid {
        errors.add("jobUrl", "Invalid URL");
    }
}
