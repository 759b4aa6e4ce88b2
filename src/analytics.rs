//! Deeper pipeline analytics: sales cycle, velocity, per-rep ranking,
//! short-horizon forecast and data-quality checks.

use chrono::{Duration, NaiveDate};
use serde::Serialize;

use crate::aggregate::{average, group_first_seen, summarize, win_rate};
use crate::logging::{log_forecast, log_quality};
use crate::model::{Opportunity, SalesRep};

/// Mean days from creation to close over closed records; 0 when none closed.
pub fn avg_sales_cycle(records: &[Opportunity]) -> f64 {
    let (total, n) = records
        .iter()
        .filter(|o| o.stage.is_closed())
        .fold((0i64, 0usize), |(t, n), o| (t + o.cycle_days(), n + 1));
    average(total as f64, n)
}

/// open count × avg deal size × win rate ÷ sales cycle (floored at one day).
/// Dollars per day.
pub fn sales_velocity(records: &[Opportunity]) -> f64 {
    let m = summarize(records);
    let open = records.iter().filter(|o| o.is_open()).count();
    let cycle = avg_sales_cycle(records).max(1.0);
    open as f64 * m.avg_deal_size * (m.win_rate / 100.0) / cycle
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepPerformance {
    pub rep: SalesRep,
    pub pipeline_value: f64,
    pub revenue: f64,
    pub win_rate: f64,
    pub avg_deal_size: f64,
    pub total_opps: usize,
}

#[derive(Default)]
struct RepTally {
    pipeline: f64,
    revenue: f64,
    amount: f64,
    won: usize,
    lost: usize,
    count: usize,
}

/// Per-rep scorecard, highest revenue first. Ties keep first-seen order.
pub fn rep_performance(records: &[Opportunity]) -> Vec<RepPerformance> {
    let mut out: Vec<RepPerformance> = group_first_seen(records, |o| o.owner, |t: &mut RepTally, o| {
        t.count += 1;
        t.amount += o.amount;
        if o.is_won() {
            t.won += 1;
            t.revenue += o.amount;
        } else if o.is_lost() {
            t.lost += 1;
        } else {
            t.pipeline += o.amount;
        }
    })
    .into_iter()
    .map(|(rep, t)| RepPerformance {
        rep,
        pipeline_value: t.pipeline,
        revenue: t.revenue,
        win_rate: win_rate(t.won, t.lost),
        avg_deal_size: average(t.amount, t.count),
        total_opps: t.count,
    })
    .collect();
    out.sort_by(|a, b| b.revenue.partial_cmp(&a.revenue).unwrap_or(std::cmp::Ordering::Equal));
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Forecast {
    pub horizon_days: i64,
    pub best_case: f64,
    pub weighted: f64,
    /// Only deals at 75% or better.
    pub conservative: f64,
    pub opportunities: usize,
}

/// Open deals expected to close in `[today, today + horizon_days]`.
pub fn forecast(records: &[Opportunity], today: NaiveDate, horizon_days: i64) -> Forecast {
    let end = today + Duration::days(horizon_days);
    let mut f = Forecast { horizon_days, ..Forecast::default() };
    for opp in records
        .iter()
        .filter(|o| o.is_open() && o.close_date >= today && o.close_date <= end)
    {
        f.best_case += opp.amount;
        f.weighted += opp.expected_revenue();
        if opp.probability >= 75 {
            f.conservative += opp.amount;
        }
        f.opportunities += 1;
    }
    log_forecast(&f);
    f
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "count")]
pub enum QualityIssue {
    PastDueOpen(usize),
    ZeroAmount(usize),
    Stale(usize),
}

impl QualityIssue {
    pub fn describe(&self, stale_days: u32) -> String {
        match self {
            QualityIssue::PastDueOpen(n) => {
                format!("Past close date in open stage: {} opportunities", n)
            }
            QualityIssue::ZeroAmount(n) => format!("Zero amount: {} opportunities", n),
            QualityIssue::Stale(n) => {
                format!("Stale deals (>{} days): {} opportunities", stale_days, n)
            }
        }
    }
}

pub const NO_ISSUES: &str = "No data quality issues found";

pub fn data_quality_issues(records: &[Opportunity], today: NaiveDate, stale_days: u32) -> Vec<QualityIssue> {
    let past_due = records
        .iter()
        .filter(|o| o.is_open() && o.close_date < today)
        .count();
    let zero = records.iter().filter(|o| o.amount == 0.0).count();
    let stale = records.iter().filter(|o| o.days_in_stage > stale_days).count();

    let mut issues = Vec::new();
    if past_due > 0 {
        issues.push(QualityIssue::PastDueOpen(past_due));
    }
    if zero > 0 {
        issues.push(QualityIssue::ZeroAmount(zero));
    }
    if stale > 0 {
        issues.push(QualityIssue::Stale(stale));
    }
    log_quality(&issues, stale_days);
    issues
}

/// Human-readable report lines; a single "no issues" line when clean.
pub fn data_quality_report(records: &[Opportunity], today: NaiveDate, stale_days: u32) -> Vec<String> {
    let issues = data_quality_issues(records, today, stale_days);
    if issues.is_empty() {
        return vec![NO_ISSUES.to_string()];
    }
    issues.iter().map(|i| i.describe(stale_days)).collect()
}

// =============================================================================
// Tests
// =============================================================================
