//! End-to-end checks of generate → filter → aggregate over seeded sessions.

use chrono::{Duration, NaiveDate};
use rand::{rngs::StdRng, SeedableRng};

use salesdash::aggregate::{summarize, DashboardView};
use salesdash::filter::{apply_filters, matches, FilterParams, RecencyWindow, Selector};
use salesdash::generator::{generate, DEFAULT_OPPORTUNITY_COUNT};
use salesdash::model::{Opportunity, Product, Region, SalesRep, Stage};

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 17).unwrap()
}

fn dataset(seed: u64) -> Vec<Opportunity> {
    let mut rng = StdRng::seed_from_u64(seed);
    generate(&mut rng, today(), DEFAULT_OPPORTUNITY_COUNT)
}

fn all_params() -> Vec<FilterParams> {
    let regions = std::iter::once(Selector::All).chain(Region::ALL.into_iter().map(Selector::Only));
    let mut out = Vec::new();
    for region in regions {
        let owners = std::iter::once(Selector::All).chain(SalesRep::ALL.into_iter().map(Selector::Only));
        for owner in owners {
            for window in RecencyWindow::ALL {
                out.push(FilterParams { region, owner, window });
            }
        }
    }
    out
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-6 * a.abs().max(1.0)
}

// ---------------------------------------------------------------------------
// Filtering
// ---------------------------------------------------------------------------

#[test]
fn filtered_set_is_ordered_subset_satisfying_every_predicate() {
    let base = dataset(1);
    for params in all_params() {
        let kept = apply_filters(&base, &params, today());
        let mut cursor = base.iter();
        for opp in &kept {
            assert!(matches(opp, &params, today()));
            assert!(params.region.accepts(&opp.region));
            assert!(params.owner.accepts(&opp.owner));
            assert!(opp.created_date >= today() - Duration::days(params.window.days()));
            // order-preserving: each kept record appears later in the base than the previous one
            assert!(cursor.any(|b| b.id == opp.id), "{} out of order", opp.id);
        }
        let expected = base.iter().filter(|o| matches(o, &params, today())).count();
        assert_eq!(kept.len(), expected);
    }
}

#[test]
fn widest_selection_keeps_the_whole_base() {
    for seed in 0..20 {
        let base = dataset(seed);
        let kept = apply_filters(&base, &FilterParams::everything(), today());
        assert_eq!(kept.len(), base.len());
    }
}

#[test]
fn region_selections_partition_the_base() {
    let base = dataset(2);
    let total: usize = Region::ALL
        .iter()
        .map(|r| {
            let params = FilterParams { region: Selector::Only(*r), ..FilterParams::everything() };
            apply_filters(&base, &params, today()).len()
        })
        .sum();
    assert_eq!(total, base.len());
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

#[test]
fn stage_buckets_partition_the_filtered_set() {
    let base = dataset(3);
    for params in all_params() {
        let kept = apply_filters(&base, &params, today());
        let view = DashboardView::compute(&kept);
        assert_eq!(view.pipeline_by_stage.len(), 6);
        let bucket_total: f64 = view.pipeline_by_stage.iter().map(|b| b.value).sum();
        let bucket_count: usize = view.pipeline_by_stage.iter().map(|b| b.count).sum();
        let amount_total: f64 = kept.iter().map(|o| o.amount).sum();
        assert!(close(bucket_total, amount_total));
        assert_eq!(bucket_count, kept.len());
    }
}

#[test]
fn region_and_rep_views_exclude_closed_correctly() {
    let base = dataset(4);
    let view = DashboardView::compute(&base);

    for r in &view.pipeline_by_region {
        let open: f64 = base
            .iter()
            .filter(|o| o.region == r.name && o.stage.is_open())
            .map(|o| o.amount)
            .sum();
        assert!(close(r.value, open));
    }
    for rep in &view.sales_by_rep {
        let won: f64 = base
            .iter()
            .filter(|o| o.owner == rep.name && o.stage == Stage::ClosedWon)
            .map(|o| o.amount)
            .sum();
        let count = base.iter().filter(|o| o.owner == rep.name).count();
        assert!(close(rep.closed, won));
        assert_eq!(rep.count, count);
    }

    let region_total: f64 = view.pipeline_by_region.iter().map(|r| r.value).sum();
    assert!(close(region_total, view.metrics.total_pipeline));
    let product_total: f64 = view.revenue_by_product.iter().map(|p| p.value).sum();
    let amount_total: f64 = base.iter().map(|o| o.amount).sum();
    assert!(close(product_total, amount_total));
}

#[test]
fn grouped_keys_follow_first_seen_order() {
    let base = dataset(5);
    let view = DashboardView::compute(&base);
    let mut seen: Vec<Product> = Vec::new();
    for o in &base {
        if !seen.contains(&o.product) {
            seen.push(o.product);
        }
    }
    let keys: Vec<Product> = view.revenue_by_product.iter().map(|p| p.name).collect();
    assert_eq!(keys, seen);
}

#[test]
fn empty_selection_yields_zeroes() {
    let view = DashboardView::compute(&[]);
    assert_eq!(view.metrics.total_opps, 0);
    assert_eq!(view.metrics.win_rate, 0.0);
    assert_eq!(view.metrics.avg_deal_size, 0.0);
    assert_eq!(view.metrics.total_pipeline, 0.0);
    assert!(view.pipeline_by_stage.iter().all(|b| b.count == 0 && b.value == 0.0));
    assert!(view.revenue_by_product.is_empty());
    assert!(view.sales_by_rep.is_empty());
    assert!(view.pipeline_by_region.is_empty());
}

#[test]
fn recompute_is_deterministic() {
    let base = dataset(6);
    for params in all_params().into_iter().step_by(7) {
        let a = DashboardView::compute(&apply_filters(&base, &params, today()));
        let b = DashboardView::compute(&apply_filters(&base, &params, today()));
        assert_eq!(a, b);
    }
}

#[test]
fn win_rate_and_averages_stay_finite() {
    for seed in 0..10 {
        let base = dataset(seed);
        for params in all_params() {
            let m = summarize(&apply_filters(&base, &params, today()));
            assert!(m.win_rate.is_finite() && (0.0..=100.0).contains(&m.win_rate));
            assert!(m.avg_deal_size.is_finite());
            assert!(m.weighted_pipeline <= m.total_pipeline + 1e-9);
        }
    }
}
