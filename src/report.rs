//! Reporting periods and KPI aggregation.
//!
//! Everything here is a pure reduction over the lists a snapshot already
//! holds. Functions take `now` explicitly (generic over the time zone) so the
//! service can pass `Local::now()` while tests pin a fixed instant; "today",
//! "month", "quarter" and "year" use calendar boundaries in that zone, "week"
//! is a rolling 7-day window.

use chrono::{DateTime, Datelike, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::enrich::volume_percent;
use crate::models::{DistributorView, IotReading, Payment};

// ---

/// Payment statuses counted as settled. The payment provider reports French
/// labels for mobile-money transactions.
const COMPLETED_STATUSES: [&str; 3] = ["completed", "success", "réussi"];

/// Reporting window selected on the dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportPeriod {
    Today,
    Week,
    #[default]
    Month,
    Quarter,
    Year,
    All,
}

impl ReportPeriod {
    /// Inclusive `[start, end]` bounds of this period, in UTC.
    ///
    /// Calendar boundaries are taken in the zone of `now`; a boundary that
    /// does not exist in that zone (DST gap) falls back to the epoch rather
    /// than failing.
    pub fn bounds<Tz: TimeZone>(self, now: DateTime<Tz>) -> (DateTime<Utc>, DateTime<Utc>) {
        // ---
        let tz = now.timezone();
        let end = now.clone().with_timezone(&Utc);

        let start_of = |year: i32, month: u32, day: u32| {
            tz.with_ymd_and_hms(year, month, day, 0, 0, 0)
                .earliest()
                .map(|d| d.with_timezone(&Utc))
                .unwrap_or(DateTime::UNIX_EPOCH)
        };

        let start = match self {
            ReportPeriod::Today => start_of(now.year(), now.month(), now.day()),
            ReportPeriod::Week => end - Duration::days(7),
            ReportPeriod::Month => start_of(now.year(), now.month(), 1),
            ReportPeriod::Quarter => start_of(now.year(), (now.month0() / 3) * 3 + 1, 1),
            ReportPeriod::Year => start_of(now.year(), 1, 1),
            ReportPeriod::All => DateTime::UNIX_EPOCH,
        };
        (start, end)
    }

    /// Whether `ts` falls inside this period as seen from `now`.
    pub fn contains<Tz: TimeZone>(self, ts: DateTime<Utc>, now: DateTime<Tz>) -> bool {
        // ---
        let (start, end) = self.bounds(now);
        ts >= start && ts <= end
    }
}

// ---

/// KPI aggregate for the summary cards.
///
/// Fleet counts (`active_count`, `inactive_count`, `filters_to_replace`)
/// describe the fleet as of the snapshot; volume and payment figures are
/// restricted to the period.
#[derive(Debug, Clone, Serialize)]
pub struct ReportSummary {
    // ---
    pub period: ReportPeriod,
    pub distributor_count: usize,
    pub active_count: usize,
    pub inactive_count: usize,
    pub filters_to_replace: usize,
    pub total_volume_l: f64,
    pub reading_count: usize,
    pub total_revenue: f64,
    pub payment_count: usize,
}

/// Reduce a snapshot into the KPI summary. Total over empty inputs.
pub fn summarize<Tz: TimeZone>(
    distributors: &[DistributorView],
    readings: &[IotReading],
    payments: &[Payment],
    period: ReportPeriod,
    now: DateTime<Tz>,
) -> ReportSummary {
    // ---
    let (start, end) = period.bounds(now);
    let in_period = |ts: DateTime<Utc>| ts >= start && ts <= end;

    let active_count = distributors.iter().filter(|d| d.active).count();
    let filters_to_replace = distributors
        .iter()
        .filter(|d| d.filter_state.severity == "critical")
        .count();

    let period_readings = readings.iter().filter(|r| in_period(r.created_at));
    let (reading_count, total_volume_l) = period_readings.fold((0usize, 0.0f64), |(n, sum), r| {
        (n + 1, sum + r.volume_l.max(0.0))
    });

    let period_payments: Vec<&Payment> =
        payments.iter().filter(|p| in_period(p.created_at)).collect();
    let total_revenue = period_payments.iter().map(|p| p.amount).sum();

    ReportSummary {
        period,
        distributor_count: distributors.len(),
        active_count,
        inactive_count: distributors.len() - active_count,
        filters_to_replace,
        total_volume_l,
        reading_count,
        total_revenue,
        payment_count: period_payments.len(),
    }
}

// ---

/// One row of the per-distributor performance table.
#[derive(Debug, Clone, Serialize)]
pub struct PerformanceRow {
    // ---
    pub id: Uuid,
    pub name: String,
    pub location: Option<String>,
    pub transactions: usize,
    pub volume_l: f64,
    pub revenue: f64,
    pub performance: f64,
}

/// Per-distributor activity within the period, in the distributor order of
/// the snapshot. Performance is delivered volume against capacity.
pub fn performance_rows<Tz: TimeZone>(
    distributors: &[DistributorView],
    readings: &[IotReading],
    payments: &[Payment],
    period: ReportPeriod,
    now: DateTime<Tz>,
) -> Vec<PerformanceRow> {
    // ---
    let (start, end) = period.bounds(now);
    let in_period = |ts: DateTime<Utc>| ts >= start && ts <= end;

    distributors
        .iter()
        .map(|d| {
            let volume_l: f64 = readings
                .iter()
                .filter(|r| r.point_id == d.id && in_period(r.created_at))
                .map(|r| r.volume_l.max(0.0))
                .sum();

            let mut transactions = 0usize;
            let mut revenue = 0.0f64;
            for p in payments {
                if p.water_point_id == Some(d.id) && in_period(p.created_at) {
                    transactions += 1;
                    revenue += p.amount;
                }
            }

            PerformanceRow {
                id: d.id,
                name: d.name.clone(),
                location: d.location.clone(),
                transactions,
                volume_l,
                revenue,
                performance: volume_percent(volume_l, d.capacity),
            }
        })
        .collect()
}

// ---

/// Header figures for the transactions page.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentTotals {
    // ---
    pub total_amount: f64,
    pub payment_count: usize,
    pub completed_count: usize,
    pub today_amount: f64,
    pub today_count: usize,
}

pub fn is_completed(status: &str) -> bool {
    let status = status.trim().to_lowercase();
    COMPLETED_STATUSES.contains(&status.as_str())
}

/// Overall and same-day payment totals. Total over empty input.
pub fn payment_totals<Tz: TimeZone>(payments: &[Payment], now: DateTime<Tz>) -> PaymentTotals {
    // ---
    let total_amount = payments.iter().map(|p| p.amount).sum();
    let completed_count = payments.iter().filter(|p| is_completed(&p.status)).count();

    let today = ReportPeriod::Today;
    let (mut today_amount, mut today_count) = (0.0f64, 0usize);
    for p in payments {
        if today.contains(p.created_at, now.clone()) {
            today_amount += p.amount;
            today_count += 1;
        }
    }

    PaymentTotals {
        total_amount,
        payment_count: payments.len(),
        completed_count,
        today_amount,
        today_count,
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::enrich::enrich_all;
    use crate::models::WaterPoint;
    use chrono::{FixedOffset, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 15, 12, 0, 0).unwrap()
    }

    fn point(id: u128, capacity: f64) -> WaterPoint {
        // ---
        WaterPoint {
            id: Uuid::from_u128(id),
            latitude: None,
            longitude: None,
            community: Some(format!("Site {id}")),
            capacity,
            filter_status: None,
            last_maintenance: None,
        }
    }

    fn reading(id: i64, point_id: u128, ts: DateTime<Utc>, volume: f64) -> IotReading {
        // ---
        IotReading {
            id,
            point_id: Uuid::from_u128(point_id),
            created_at: ts,
            volume_l: volume,
            turbidity: None,
            battery: Some(60.0),
            filter_health: Some(90.0),
            filter_status: None,
        }
    }

    fn payment(id: u128, point_id: Option<u128>, ts: DateTime<Utc>, amount: f64) -> Payment {
        // ---
        Payment {
            id: Uuid::from_u128(id),
            water_point_id: point_id.map(Uuid::from_u128),
            amount,
            status: "completed".to_string(),
            created_at: ts,
        }
    }

    #[test]
    fn test_period_bounds_use_calendar_starts() {
        // ---
        let (month_start, end) = ReportPeriod::Month.bounds(now());
        assert_eq!(month_start, Utc.with_ymd_and_hms(2025, 5, 1, 0, 0, 0).unwrap());
        assert_eq!(end, now());

        let (quarter_start, _) = ReportPeriod::Quarter.bounds(now());
        assert_eq!(quarter_start, Utc.with_ymd_and_hms(2025, 4, 1, 0, 0, 0).unwrap());

        let (year_start, _) = ReportPeriod::Year.bounds(now());
        assert_eq!(year_start, Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap());

        let (today_start, _) = ReportPeriod::Today.bounds(now());
        assert_eq!(today_start, Utc.with_ymd_and_hms(2025, 5, 15, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_week_is_rolling_not_calendar() {
        // ---
        let (start, end) = ReportPeriod::Week.bounds(now());
        assert_eq!(end - start, Duration::days(7));
    }

    #[test]
    fn test_today_respects_local_offset() {
        // ---
        // 01:30 UTC on the 15th is still the evening of the 14th at UTC-5;
        // "today" must start at local midnight, not UTC midnight.
        let offset = FixedOffset::west_opt(5 * 3600).unwrap();
        let local_now = offset
            .with_ymd_and_hms(2025, 5, 14, 20, 30, 0)
            .unwrap();

        let late_utc = Utc.with_ymd_and_hms(2025, 5, 14, 23, 0, 0).unwrap();
        assert!(ReportPeriod::Today.contains(late_utc, local_now));

        let before_local_midnight = Utc.with_ymd_and_hms(2025, 5, 14, 4, 0, 0).unwrap();
        assert!(!ReportPeriod::Today.contains(before_local_midnight, local_now));
    }

    #[test]
    fn test_all_period_reaches_back_to_epoch() {
        // ---
        let old = Utc.with_ymd_and_hms(1999, 1, 1, 0, 0, 0).unwrap();
        assert!(ReportPeriod::All.contains(old, now()));
    }

    #[test]
    fn test_period_deserializes_lowercase() {
        // ---
        let p: ReportPeriod = serde_json::from_str("\"quarter\"").unwrap();
        assert_eq!(p, ReportPeriod::Quarter);
        assert!(serde_json::from_str::<ReportPeriod>("\"fortnight\"").is_err());
    }

    #[test]
    fn test_summarize_counts_fleet_and_boxes_volume() {
        // ---
        let points = vec![point(1, 100.0), point(2, 100.0)];
        let mut readings = vec![
            reading(1, 1, now() - Duration::hours(2), 40.0),
            reading(2, 2, now() - Duration::days(40), 500.0),
        ];
        // dead battery takes point 2 out of service
        readings.push({
            let mut r = reading(3, 2, now() - Duration::hours(1), 10.0);
            r.battery = Some(2.0);
            r
        });
        let payments = vec![
            payment(1, Some(1), now() - Duration::hours(3), 1500.0),
            payment(2, Some(2), now() - Duration::days(40), 9000.0),
        ];

        let views = enrich_all(&points, &readings);
        let summary = summarize(&views, &readings, &payments, ReportPeriod::Month, now());

        assert_eq!(summary.distributor_count, 2);
        assert_eq!(summary.active_count, 1);
        assert_eq!(summary.inactive_count, 1);
        // volume and revenue from last month only
        assert_eq!(summary.total_volume_l, 50.0);
        assert_eq!(summary.reading_count, 2);
        assert_eq!(summary.total_revenue, 1500.0);
        assert_eq!(summary.payment_count, 1);
    }

    #[test]
    fn test_summarize_counts_critical_filters() {
        // ---
        let mut failed = point(1, 100.0);
        failed.filter_status = Some("FAILED".to_string());
        let mut worn = point(2, 100.0);
        worn.filter_status = Some("replace".to_string());
        let points = vec![failed, worn, point(3, 100.0)];

        let views = enrich_all(&points, &[]);
        let summary = summarize(&views, &[], &[], ReportPeriod::All, now());
        assert_eq!(summary.filters_to_replace, 2);
    }

    #[test]
    fn test_summarize_is_total_on_empty_input() {
        // ---
        let summary = summarize(&[], &[], &[], ReportPeriod::Today, now());
        assert_eq!(summary.distributor_count, 0);
        assert_eq!(summary.total_volume_l, 0.0);
        assert_eq!(summary.total_revenue, 0.0);
    }

    #[test]
    fn test_performance_rows_join_by_point() {
        // ---
        let points = vec![point(1, 200.0), point(2, 100.0)];
        let readings = vec![
            reading(1, 1, now() - Duration::hours(1), 60.0),
            reading(2, 1, now() - Duration::hours(2), 40.0),
        ];
        let payments = vec![
            payment(1, Some(1), now() - Duration::hours(1), 500.0),
            payment(2, None, now() - Duration::hours(1), 999.0),
        ];

        let views = enrich_all(&points, &readings);
        let rows = performance_rows(&views, &readings, &payments, ReportPeriod::Month, now());

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].volume_l, 100.0);
        assert_eq!(rows[0].transactions, 1);
        assert_eq!(rows[0].revenue, 500.0);
        assert_eq!(rows[0].performance, 50.0);
        // unattributed payment lands on no row
        assert_eq!(rows[1].transactions, 0);
        assert_eq!(rows[1].revenue, 0.0);
    }

    #[test]
    fn test_payment_totals() {
        // ---
        let mut pending = payment(1, None, now() - Duration::hours(1), 200.0);
        pending.status = "pending".to_string();
        let payments = vec![
            payment(2, None, now() - Duration::hours(2), 1000.0),
            payment(3, None, now() - Duration::days(3), 300.0),
            pending,
        ];

        let totals = payment_totals(&payments, now());
        assert_eq!(totals.total_amount, 1500.0);
        assert_eq!(totals.payment_count, 3);
        assert_eq!(totals.completed_count, 2);
        assert_eq!(totals.today_count, 2);
        assert_eq!(totals.today_amount, 1200.0);
    }

    #[test]
    fn test_completed_statuses_accept_french_labels() {
        // ---
        assert!(is_completed("Réussi"));
        assert!(is_completed(" SUCCESS "));
        assert!(!is_completed("pending"));
    }
}
