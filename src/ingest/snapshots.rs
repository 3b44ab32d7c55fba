use chrono::{DateTime, Datelike, NaiveDate, Utc};

use crate::error::Result;
use crate::store::IngestTxn;
use crate::types::{RepositoryPayload, SnapshotMetrics};

/// Week number used for weekly snapshot bucketing:
/// `ceil((dayOfYear + jan1Weekday + 1) / 7)` with Sunday-based weekdays.
///
/// This is not ISO-8601 week numbering. It is kept bit-compatible with the
/// historical bucketing so existing weekly rows keep their keys.
#[must_use]
pub fn week_of_year(date: NaiveDate) -> u32 {
    // January 1st of any year exists; fall back to the date itself to keep
    // this function total.
    let jan1 = NaiveDate::from_ymd_opt(date.year(), 1, 1).unwrap_or(date);
    let jan1_weekday = jan1.weekday().num_days_from_sunday();
    (date.ordinal() + jan1_weekday + 1).div_ceil(7)
}

/// Snapshot rows default absent metrics to zero, unlike the repository
/// record which preserves null.
#[must_use]
pub fn metrics_from_payload(payload: &RepositoryPayload) -> SnapshotMetrics {
    SnapshotMetrics {
        stars: payload.stars.unwrap_or(0),
        forks: payload.forks.unwrap_or(0),
        watchers: payload.watchers.unwrap_or(0),
        contributors: payload.contributors.unwrap_or(0),
        pull_requests: payload.pull_requests.unwrap_or(0),
        releases: payload.releases.unwrap_or(0),
        commits: payload.commits.unwrap_or(0),
    }
}

/// Writes the three snapshot rows for one delivery: daily append, then
/// monthly and weekly replace-upserts. Returns (daily, monthly, weekly) ids.
pub fn record(
    ctx: &IngestTxn<'_>,
    repo_id: &str,
    payload: &RepositoryPayload,
    now: DateTime<Utc>,
) -> Result<(i64, i64, i64)> {
    let date = now.date_naive();
    let metrics = metrics_from_payload(payload);
    let snapshots = ctx.snapshots();

    let daily_id = snapshots.insert_daily(
        repo_id,
        date.year(),
        date.month(),
        date.day(),
        &metrics,
        now,
    )?;
    let monthly_id = snapshots.upsert_monthly(repo_id, date.year(), date.month(), &metrics, now)?;
    let weekly_id =
        snapshots.upsert_weekly(repo_id, date.year(), week_of_year(date), &metrics, now)?;

    Ok((daily_id, monthly_id, weekly_id))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_first_of_january() {
        // 2024-01-01 was a Monday: ceil((1 + 1 + 1) / 7) = 1
        assert_eq!(week_of_year(date(2024, 1, 1)), 1);
        // 2023-01-01 was a Sunday: ceil((1 + 0 + 1) / 7) = 1
        assert_eq!(week_of_year(date(2023, 1, 1)), 1);
    }

    #[test]
    fn test_mid_year() {
        // 2024-02-21: day-of-year 52, Jan 1 Monday: ceil((52 + 1 + 1) / 7) = 8
        assert_eq!(week_of_year(date(2024, 2, 21)), 8);
    }

    #[test]
    fn test_end_of_year_can_exceed_52() {
        // 2024-12-31: day-of-year 366, Jan 1 Monday: ceil(368 / 7) = 53
        assert_eq!(week_of_year(date(2024, 12, 31)), 53);
        // 2023-12-31: day-of-year 365, Jan 1 Sunday: ceil(366 / 7) = 53
        assert_eq!(week_of_year(date(2023, 12, 31)), 53);
    }

    #[test]
    fn test_differs_from_iso_week() {
        // 2024-12-30 falls in ISO week 1 of 2025; this formula keeps it in
        // week 53 of 2024.
        assert_eq!(week_of_year(date(2024, 12, 30)), 53);
    }
}
