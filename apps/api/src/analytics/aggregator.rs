//! Dashboard statistics derived from a user's full application set.
//!
//! Everything here is a pure function of `(applications, now)`: no I/O, no
//! caching, no mutation of the input. Empty input yields zeros and empty
//! collections.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::models::{ApplicationStatus, JobApplication};

pub const TOP_N: usize = 5;
pub const WEEKLY_WINDOWS: i64 = 8;
pub const RECENT_DAYS: i64 = 7;
pub const UNSPECIFIED_LOCATION: &str = "Not specified";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyCount {
    /// `YYYY-MM`
    pub month: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeeklyCount {
    pub week: String,
    /// First day of the window.
    pub start: NaiveDate,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NamedCount {
    pub name: String,
    pub count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct SalaryStats {
    pub count: usize,
    pub average: f64,
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentApplication {
    pub id: Uuid,
    pub company_name: String,
    pub position: String,
    pub status: ApplicationStatus,
    pub application_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationAnalytics {
    pub total_applications: usize,
    pub status_counts: BTreeMap<ApplicationStatus, usize>,
    pub monthly: Vec<MonthlyCount>,
    pub weekly: Vec<WeeklyCount>,
    pub interview_rate: u32,
    pub offer_rate: u32,
    pub rejection_rate: u32,
    /// Whole days from applying to the last update, over interviewing and
    /// offered applications.
    pub avg_response_time: i64,
    pub top_companies: Vec<NamedCount>,
    pub top_locations: Vec<NamedCount>,
    pub salary: SalaryStats,
    pub pending_follow_ups: usize,
    pub applications_this_week: usize,
    pub applications_this_month: usize,
    pub avg_per_week: f64,
    pub recent_applications: Vec<RecentApplication>,
}

pub fn compute_analytics(applications: &[JobApplication], now: DateTime<Utc>) -> ApplicationAnalytics {
    let total = applications.len();
    let status_counts = status_histogram(applications);
    let rate = |status: ApplicationStatus| percentage(status_counts.get(&status).copied().unwrap_or(0), total);

    let week_ago = now - Duration::days(RECENT_DAYS);
    let month_start = NaiveDate::from_ymd_opt(now.year(), now.month(), 1).unwrap_or(now.date_naive());

    ApplicationAnalytics {
        total_applications: total,
        interview_rate: rate(ApplicationStatus::Interview),
        offer_rate: rate(ApplicationStatus::Offered),
        rejection_rate: rate(ApplicationStatus::Rejected),
        status_counts,
        monthly: monthly_counts(applications),
        weekly: weekly_counts(applications, now),
        avg_response_time: avg_response_days(applications),
        top_companies: top_n(applications.iter().map(|a| a.company_name.as_str())),
        top_locations: top_n(applications.iter().map(|a| {
            a.location
                .as_deref()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .unwrap_or(UNSPECIFIED_LOCATION)
        })),
        salary: salary_stats(applications),
        pending_follow_ups: applications
            .iter()
            .filter(|a| is_follow_up_due(a, now))
            .count(),
        applications_this_week: applications
            .iter()
            .filter(|a| a.applied_at() >= week_ago)
            .count(),
        applications_this_month: applications
            .iter()
            .filter(|a| a.application_date >= month_start)
            .count(),
        avg_per_week: avg_per_week(applications, now),
        recent_applications: recent(applications, week_ago),
    }
}

/// Only statuses that occur appear as keys.
fn status_histogram(applications: &[JobApplication]) -> BTreeMap<ApplicationStatus, usize> {
    let mut counts = BTreeMap::new();
    for application in applications {
        *counts.entry(application.status).or_insert(0) += 1;
    }
    counts
}

/// `round(100 * count / total)`, 0 when there is nothing to divide by.
fn percentage(count: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    (100.0 * count as f64 / total as f64).round() as u32
}

fn monthly_counts(applications: &[JobApplication]) -> Vec<MonthlyCount> {
    let mut months: BTreeMap<(i32, u32), usize> = BTreeMap::new();
    for application in applications {
        let date = application.application_date;
        *months.entry((date.year(), date.month())).or_insert(0) += 1;
    }
    months
        .into_iter()
        .map(|((year, month), count)| MonthlyCount {
            month: format!("{year:04}-{month:02}"),
            count,
        })
        .collect()
}

/// Trailing seven-day windows ending at `now`, oldest first. Window `i`
/// (0 = most recent) covers `[now - (i+1)*7d, now - i*7d)`.
fn weekly_counts(applications: &[JobApplication], now: DateTime<Utc>) -> Vec<WeeklyCount> {
    if applications.is_empty() {
        return Vec::new();
    }

    (0..WEEKLY_WINDOWS)
        .rev()
        .map(|i| {
            let end = now - Duration::days(7 * i);
            let start = end - Duration::days(7);
            let count = applications
                .iter()
                .filter(|a| {
                    let at = a.applied_at();
                    at >= start && at < end
                })
                .count();
            WeeklyCount {
                week: format!("Week {}", WEEKLY_WINDOWS - i),
                start: start.date_naive(),
                count,
            }
        })
        .collect()
}

fn avg_response_days(applications: &[JobApplication]) -> i64 {
    let days: Vec<i64> = applications
        .iter()
        .filter(|a| {
            matches!(
                a.status,
                ApplicationStatus::Interview | ApplicationStatus::Offered
            )
        })
        .map(|a| (a.updated_at - a.applied_at()).num_days())
        .collect();

    if days.is_empty() {
        return 0;
    }
    (days.iter().sum::<i64>() as f64 / days.len() as f64).round() as i64
}

/// Descending by count; ties broken by name so output is stable.
fn top_n<'a>(names: impl Iterator<Item = &'a str>) -> Vec<NamedCount> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for name in names {
        *counts.entry(name).or_insert(0) += 1;
    }

    let mut ranked: Vec<NamedCount> = counts
        .into_iter()
        .map(|(name, count)| NamedCount {
            name: name.to_string(),
            count,
        })
        .collect();
    ranked.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
    ranked.truncate(TOP_N);
    ranked
}

fn salary_stats(applications: &[JobApplication]) -> SalaryStats {
    let salaries: Vec<f64> = applications
        .iter()
        .filter_map(|a| a.salary)
        .filter(|s| s.is_finite() && *s > 0.0)
        .collect();

    if salaries.is_empty() {
        return SalaryStats::default();
    }

    let sum: f64 = salaries.iter().sum();
    SalaryStats {
        count: salaries.len(),
        average: (sum / salaries.len() as f64).round(),
        min: salaries.iter().copied().fold(f64::INFINITY, f64::min),
        max: salaries.iter().copied().fold(f64::NEG_INFINITY, f64::max),
    }
}

fn is_follow_up_due(application: &JobApplication, now: DateTime<Utc>) -> bool {
    application
        .follow_up_date
        .is_some_and(|date| date <= now.date_naive() && !application.status.is_settled())
}

/// Applications per week since the earliest one, to one decimal place.
fn avg_per_week(applications: &[JobApplication], now: DateTime<Utc>) -> f64 {
    let Some(earliest) = applications.iter().map(JobApplication::applied_at).min() else {
        return 0.0;
    };
    let elapsed_days = (now - earliest).num_days().max(0);
    let weeks = ((elapsed_days + 6) / 7).max(1);
    (applications.len() as f64 / weeks as f64 * 10.0).round() / 10.0
}

fn recent(applications: &[JobApplication], since: DateTime<Utc>) -> Vec<RecentApplication> {
    let mut recent: Vec<&JobApplication> = applications
        .iter()
        .filter(|a| a.applied_at() >= since)
        .collect();
    recent.sort_by(|a, b| {
        b.application_date
            .cmp(&a.application_date)
            .then_with(|| b.created_at.cmp(&a.created_at))
    });
    recent
        .into_iter()
        .take(TOP_N)
        .map(|a| RecentApplication {
            id: a.id,
            company_name: a.company_name.clone(),
            position: a.position.clone(),
            status: a.status,
            application_date: a.application_date,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::application;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
    }

    fn app(company: &str, status: ApplicationStatus, date: &str) -> JobApplication {
        application(Uuid::new_v4(), company, status, date)
    }

    #[test]
    fn test_empty_input_is_all_zero() {
        let a = compute_analytics(&[], now());
        assert_eq!(a.total_applications, 0);
        assert_eq!(a.interview_rate, 0);
        assert_eq!(a.offer_rate, 0);
        assert_eq!(a.rejection_rate, 0);
        assert_eq!(a.avg_response_time, 0);
        assert_eq!(a.avg_per_week, 0.0);
        assert_eq!(a.salary, SalaryStats::default());
        assert_eq!(a.pending_follow_ups, 0);
        assert!(a.status_counts.is_empty());
        assert!(a.monthly.is_empty());
        assert!(a.weekly.is_empty());
        assert!(a.top_companies.is_empty());
        assert!(a.top_locations.is_empty());
        assert!(a.recent_applications.is_empty());
    }

    #[test]
    fn test_rates_round_each_status_share() {
        // 1/3 interview, 2/3 rejected
        let apps = vec![
            app("A", ApplicationStatus::Interview, "2024-06-01"),
            app("B", ApplicationStatus::Rejected, "2024-06-02"),
            app("C", ApplicationStatus::Rejected, "2024-06-03"),
        ];
        let a = compute_analytics(&apps, now());
        assert_eq!(a.interview_rate, 33);
        assert_eq!(a.rejection_rate, 67);
        assert_eq!(a.offer_rate, 0);
        assert_eq!(a.status_counts[&ApplicationStatus::Rejected], 2);
        assert!(!a.status_counts.contains_key(&ApplicationStatus::Offered));
    }

    #[test]
    fn test_monthly_buckets_are_chronological() {
        let apps = vec![
            app("A", ApplicationStatus::Applied, "2024-03-30"),
            app("B", ApplicationStatus::Applied, "2023-12-01"),
            app("C", ApplicationStatus::Applied, "2024-03-01"),
        ];
        let monthly = compute_analytics(&apps, now()).monthly;
        assert_eq!(
            monthly,
            vec![
                MonthlyCount { month: "2023-12".into(), count: 1 },
                MonthlyCount { month: "2024-03".into(), count: 2 },
            ]
        );
    }

    #[test]
    fn test_weekly_windows_trail_now() {
        let apps = vec![
            app("A", ApplicationStatus::Applied, "2024-06-14"), // 1.5 days ago
            app("B", ApplicationStatus::Applied, "2024-06-10"), // 5.5 days ago
            app("C", ApplicationStatus::Applied, "2024-06-05"), // 10.5 days ago
            app("D", ApplicationStatus::Applied, "2024-01-01"), // outside the window
        ];
        let weekly = compute_analytics(&apps, now()).weekly;
        assert_eq!(weekly.len(), 8);
        assert_eq!(weekly[0].week, "Week 1");
        assert_eq!(weekly[7].week, "Week 8");
        assert_eq!(weekly[7].count, 2);
        assert_eq!(weekly[6].count, 1);
        assert_eq!(weekly.iter().map(|w| w.count).sum::<usize>(), 3);
    }

    #[test]
    fn test_response_time_uses_interviewing_and_offered_only() {
        let mut a = app("A", ApplicationStatus::Interview, "2024-06-01");
        a.updated_at = Utc.with_ymd_and_hms(2024, 6, 11, 8, 0, 0).unwrap(); // 10 days
        let mut b = app("B", ApplicationStatus::Offered, "2024-06-01");
        b.updated_at = Utc.with_ymd_and_hms(2024, 6, 21, 8, 0, 0).unwrap(); // 20 days
        let mut c = app("C", ApplicationStatus::Rejected, "2024-01-01");
        c.updated_at = now();

        assert_eq!(compute_analytics(&[a, b, c], now()).avg_response_time, 15);
    }

    #[test]
    fn test_top_companies_and_locations() {
        let mut apps = Vec::new();
        for (company, n) in [("Acme", 3), ("Globex", 2), ("Initech", 2), ("Umbrella", 1), ("Hooli", 1), ("Zorg", 1)] {
            for _ in 0..n {
                apps.push(app(company, ApplicationStatus::Applied, "2024-05-01"));
            }
        }
        apps[0].location = Some("Berlin".into());
        apps[1].location = Some("  ".into());

        let a = compute_analytics(&apps, now());
        let names: Vec<_> = a.top_companies.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Acme", "Globex", "Initech", "Hooli", "Umbrella"]);

        assert_eq!(a.top_locations[0].name, UNSPECIFIED_LOCATION);
        assert_eq!(a.top_locations[0].count, apps.len() - 1);
        assert_eq!(a.top_locations[1].name, "Berlin");
    }

    #[test]
    fn test_salary_stats_ignore_missing() {
        let mut apps = vec![
            app("A", ApplicationStatus::Applied, "2024-05-01"),
            app("B", ApplicationStatus::Applied, "2024-05-01"),
            app("C", ApplicationStatus::Applied, "2024-05-01"),
        ];
        apps[0].salary = Some(50_000.0);
        apps[1].salary = Some(70_000.0);

        let salary = compute_analytics(&apps, now()).salary;
        assert_eq!(salary.count, 2);
        assert_eq!(salary.average, 60_000.0);
        assert_eq!(salary.min, 50_000.0);
        assert_eq!(salary.max, 70_000.0);
    }

    #[test]
    fn test_pending_follow_ups_skip_settled() {
        let mut due = app("A", ApplicationStatus::Interview, "2024-05-01");
        due.follow_up_date = NaiveDate::from_ymd_opt(2024, 6, 15);
        let mut future = app("B", ApplicationStatus::Applied, "2024-05-01");
        future.follow_up_date = NaiveDate::from_ymd_opt(2024, 6, 16);
        let mut settled = app("C", ApplicationStatus::Withdrawn, "2024-05-01");
        settled.follow_up_date = NaiveDate::from_ymd_opt(2024, 6, 1);

        assert_eq!(compute_analytics(&[due, future, settled], now()).pending_follow_ups, 1);
    }

    #[test]
    fn test_recent_activity_counters() {
        let apps = vec![
            app("A", ApplicationStatus::Applied, "2024-06-14"),
            app("B", ApplicationStatus::Applied, "2024-06-09"),
            app("C", ApplicationStatus::Applied, "2024-06-02"),
            app("D", ApplicationStatus::Applied, "2024-05-20"),
        ];
        let a = compute_analytics(&apps, now());
        assert_eq!(a.applications_this_week, 2);
        assert_eq!(a.applications_this_month, 3);
        let recent: Vec<_> = a.recent_applications.iter().map(|r| r.company_name.as_str()).collect();
        assert_eq!(recent, vec!["A", "B"]);
    }

    #[test]
    fn test_avg_per_week_from_earliest() {
        // 26 days since 2024-05-20 -> 4 weeks
        let apps = vec![
            app("A", ApplicationStatus::Applied, "2024-05-20"),
            app("B", ApplicationStatus::Applied, "2024-06-01"),
            app("C", ApplicationStatus::Applied, "2024-06-10"),
        ];
        assert_eq!(compute_analytics(&apps, now()).avg_per_week, 0.8);
    }

    #[test]
    fn test_input_is_not_mutated() {
        let apps = vec![
            app("B", ApplicationStatus::Applied, "2024-06-14"),
            app("A", ApplicationStatus::Applied, "2024-06-10"),
        ];
        let before = apps.clone();
        compute_analytics(&apps, now());
        assert_eq!(apps, before);
    }
}
