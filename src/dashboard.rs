//! Dashboard session: one immutable dataset, mutable filter selection,
//! memoised derived view.

use chrono::NaiveDate;

use crate::aggregate::DashboardView;
use crate::config::Config;
use crate::filter::{apply_filters, FilterParams, RecencyWindow, Selector};
use crate::generator::generate_dataset;
use crate::logging::{self, ts_now, ProfileScope};
use crate::model::{Opportunity, Region, SalesRep};

pub struct Dashboard {
    base: Vec<Opportunity>,
    generated_at: String,
    today: NaiveDate,
    params: FilterParams,
    cached: Option<(FilterParams, NaiveDate, DashboardView)>,
}

impl Dashboard {
    /// Generate the session dataset once; filter changes never regenerate it.
    pub fn new(cfg: &Config, today: NaiveDate) -> Self {
        let base = generate_dataset(cfg, today);
        Self::from_records(base, today, cfg.default_filters())
    }

    pub fn from_records(base: Vec<Opportunity>, today: NaiveDate, params: FilterParams) -> Self {
        Self { base, generated_at: ts_now(), today, params, cached: None }
    }

    /// RFC3339 time the base dataset was produced.
    pub fn generated_at(&self) -> &str {
        &self.generated_at
    }

    pub fn base(&self) -> &[Opportunity] {
        &self.base
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    /// Move the recency reference date (e.g. across midnight). The base
    /// dataset is untouched; only the derived view is recomputed.
    pub fn set_today(&mut self, today: NaiveDate) {
        self.today = today;
    }

    pub fn params(&self) -> FilterParams {
        self.params
    }

    pub fn set_region(&mut self, region: Selector<Region>) {
        self.params.region = region;
    }

    pub fn set_owner(&mut self, owner: Selector<SalesRep>) {
        self.params.owner = owner;
    }

    pub fn set_window(&mut self, window: RecencyWindow) {
        self.params.window = window;
    }

    pub fn set_params(&mut self, params: FilterParams) {
        self.params = params;
    }

    /// Reps offered by the owner selector: "All" then owners in first-seen order.
    pub fn owner_options(&self) -> Vec<Selector<SalesRep>> {
        let mut out = vec![Selector::All];
        for opp in &self.base {
            let sel = Selector::Only(opp.owner);
            if !out.contains(&sel) {
                out.push(sel);
            }
        }
        out
    }

    pub fn filtered(&self) -> Vec<Opportunity> {
        apply_filters(&self.base, &self.params, self.today)
    }

    /// Derived view for the current selection; recomputed only when it changes.
    pub fn view(&mut self) -> &DashboardView {
        if !matches!(&self.cached, Some((p, d, _)) if *p == self.params && *d == self.today) {
            self.cached = None;
        }
        let (base, params, today) = (&self.base, self.params, self.today);
        let (_, _, view) = self.cached.get_or_insert_with(|| {
            let _scope = ProfileScope::new("dashboard_view");
            let filtered = apply_filters(base, &params, today);
            logging::log_filter(&params, base.len(), filtered.len());
            let view = DashboardView::compute(&filtered);
            logging::log_metrics(&view.metrics);
            (params, today, view)
        });
        view
    }

    /// Stateless: view for arbitrary params, leaving the selection untouched.
    pub fn view_for(&self, params: &FilterParams) -> DashboardView {
        DashboardView::compute(&apply_filters(&self.base, params, self.today))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Dashboard {
        let cfg = Config { seed: Some(99), ..Config::default() };
        Dashboard::new(&cfg, NaiveDate::from_ymd_opt(2026, 10, 17).unwrap())
    }

    #[test]
    fn test_filter_changes_do_not_regenerate() {
        let mut dash = session();
        let before: Vec<String> = dash.base().iter().map(|o| o.id.clone()).collect();
        let amounts_before: Vec<f64> = dash.base().iter().map(|o| o.amount).collect();
        dash.set_region(Selector::Only(Region::Pacific));
        let _ = dash.view();
        dash.set_window(RecencyWindow::Days30);
        let _ = dash.view();
        let after: Vec<String> = dash.base().iter().map(|o| o.id.clone()).collect();
        let amounts_after: Vec<f64> = dash.base().iter().map(|o| o.amount).collect();
        assert_eq!(before, after);
        assert_eq!(amounts_before, amounts_after);
    }

    #[test]
    fn test_view_is_idempotent() {
        let mut dash = session();
        dash.set_owner(Selector::Only(SalesRep::EmilyRodriguez));
        let first = dash.view().clone();
        let second = dash.view().clone();
        assert_eq!(first, second);
        assert_eq!(first, dash.view_for(&dash.params()));
    }

    #[test]
    fn test_view_tracks_selection() {
        let mut dash = session();
        dash.set_params(FilterParams::everything());
        let all = dash.view().metrics.total_opps;
        assert_eq!(all, dash.base().len());
        dash.set_region(Selector::Only(Region::Southwest));
        let narrowed = dash.view().metrics.total_opps;
        assert!(narrowed <= all);
        assert!(dash.filtered().iter().all(|o| o.region == Region::Southwest));
    }

    #[test]
    fn test_moving_today_refilters_without_regenerating() {
        let mut dash = session();
        dash.set_params(FilterParams::everything());
        let ids: Vec<String> = dash.base().iter().map(|o| o.id.clone()).collect();
        let generated_at = dash.generated_at().to_string();
        assert_eq!(dash.view().metrics.total_opps, 150);

        // a year later nothing was created inside the window
        dash.set_today(dash.today() + chrono::Duration::days(365));
        assert_eq!(dash.view().metrics.total_opps, 0);
        let after: Vec<String> = dash.base().iter().map(|o| o.id.clone()).collect();
        assert_eq!(ids, after);
        assert_eq!(generated_at, dash.generated_at());
    }

    #[test]
    fn test_owner_options_start_with_all() {
        let dash = session();
        let opts = dash.owner_options();
        assert_eq!(opts[0], Selector::All);
        assert!(opts.len() <= SalesRep::ALL.len() + 1);
    }
}
