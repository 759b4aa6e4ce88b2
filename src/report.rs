//! Plain-text rendering of a dashboard session for the CLI.

use std::fmt::Write;

use chrono::NaiveDate;

use crate::aggregate::DashboardView;
use crate::analytics::{avg_sales_cycle, data_quality_report, forecast, rep_performance, sales_velocity};
use crate::filter::FilterParams;
use crate::model::Opportunity;

/// `$1,234,568` style: whole dollars, thousands separators.
pub fn format_currency(value: f64) -> String {
    let rounded = value.round();
    let negative = rounded < 0.0;
    let digits = format!("{}", rounded.abs() as u64);
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if negative {
        format!("-${}", grouped)
    } else {
        format!("${}", grouped)
    }
}

pub struct ReportOptions {
    pub forecast_days: i64,
    pub stale_days: u32,
    pub top_reps: usize,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self { forecast_days: 90, stale_days: 60, top_reps: 3 }
    }
}

pub fn render(
    params: &FilterParams,
    view: &DashboardView,
    filtered: &[Opportunity],
    today: NaiveDate,
    opts: &ReportOptions,
) -> String {
    let mut out = String::new();
    let m = &view.metrics;

    let _ = writeln!(out, "Sales Pipeline Analytics ({})", today);
    let _ = writeln!(
        out,
        "Filters: region={} owner={} window={}",
        params.region, params.owner, params.window
    );

    let _ = writeln!(out, "\nKey Metrics:");
    let _ = writeln!(out, "  Total Pipeline: {}", format_currency(m.total_pipeline));
    let _ = writeln!(out, "  Weighted Pipeline: {}", format_currency(m.weighted_pipeline));
    let _ = writeln!(out, "  Total Revenue: {}", format_currency(m.total_revenue));
    let _ = writeln!(out, "  Win Rate: {:.1}%", m.win_rate);
    let _ = writeln!(out, "  Avg Deal Size: {}", format_currency(m.avg_deal_size));
    let _ = writeln!(out, "  Opportunities: {}", m.total_opps);
    let _ = writeln!(out, "  Avg Sales Cycle: {:.0} days", avg_sales_cycle(filtered));
    let _ = writeln!(out, "  Sales Velocity: {}/day", format_currency(sales_velocity(filtered)));

    let _ = writeln!(out, "\nPipeline by Stage:");
    for b in &view.pipeline_by_stage {
        let _ = writeln!(out, "  {:<14} {:>14} ({})", b.stage.as_str(), format_currency(b.value), b.count);
    }

    let _ = writeln!(out, "\nRevenue by Product:");
    for p in &view.revenue_by_product {
        let _ = writeln!(out, "  {:<17} {:>14}", p.name.as_str(), format_currency(p.value));
    }

    let _ = writeln!(out, "\nSales by Rep:");
    for r in &view.sales_by_rep {
        let _ = writeln!(
            out,
            "  {:<16} pipeline {:>12}  closed won {:>12}  ({} opps)",
            r.name.as_str(),
            format_currency(r.pipeline),
            format_currency(r.closed),
            r.count
        );
    }

    let _ = writeln!(out, "\nPipeline by Region:");
    for r in &view.pipeline_by_region {
        let _ = writeln!(out, "  {:<14} {:>14}", r.name.as_str(), format_currency(r.value));
    }

    let f = forecast(filtered, today, opts.forecast_days);
    let _ = writeln!(out, "\nForecast (Next {} Days):", f.horizon_days);
    let _ = writeln!(out, "  Best Case: {}", format_currency(f.best_case));
    let _ = writeln!(out, "  Weighted: {}", format_currency(f.weighted));
    let _ = writeln!(out, "  Conservative: {}", format_currency(f.conservative));
    let _ = writeln!(out, "  Opportunities In Forecast: {}", f.opportunities);

    let _ = writeln!(out, "\nTop {} Performers:", opts.top_reps);
    for r in rep_performance(filtered).iter().take(opts.top_reps) {
        let _ = writeln!(
            out,
            "  {:<16} revenue {:>12}  win rate {:>5.1}%  pipeline {:>12}",
            r.rep.as_str(),
            format_currency(r.revenue),
            r.win_rate,
            format_currency(r.pipeline_value)
        );
    }

    let _ = writeln!(out, "\nData Quality Check:");
    for line in data_quality_report(filtered, today, opts.stale_days) {
        let _ = writeln!(out, "  - {}", line);
    }
    out
}
