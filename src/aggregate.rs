//! Aggregation stage: summary metrics and the four chart datasets.
//!
//! Every function is a single pass (or a handful) over the filtered slice and
//! returns zeros / empty vectors for empty input. Ratios fall back to 0
//! rather than dividing by zero.

use serde::Serialize;

use crate::model::{Opportunity, Product, Region, SalesRep, Stage};

// =============================================================================
// Ordered grouping
// =============================================================================

/// One accumulator per key, kept in first-seen order.
#[derive(Debug, Clone)]
pub struct OrderedGroups<K, A> {
    entries: Vec<(K, A)>,
}

impl<K: PartialEq, A: Default> OrderedGroups<K, A> {
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Accumulator for `key`, inserted with `A::default()` on first sight.
    pub fn entry(&mut self, key: K) -> &mut A {
        let idx = match self.entries.iter().position(|(k, _)| *k == key) {
            Some(idx) => idx,
            None => {
                self.entries.push((key, A::default()));
                self.entries.len() - 1
            }
        };
        &mut self.entries[idx].1
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_vec(self) -> Vec<(K, A)> {
        self.entries
    }
}

impl<K: PartialEq, A: Default> Default for OrderedGroups<K, A> {
    fn default() -> Self {
        Self::new()
    }
}

/// Fold `items` into first-seen-ordered groups.
pub fn group_first_seen<'a, K, A, KF, F>(items: &'a [Opportunity], key: KF, mut fold: F) -> Vec<(K, A)>
where
    K: PartialEq,
    A: Default,
    KF: Fn(&'a Opportunity) -> K,
    F: FnMut(&mut A, &'a Opportunity),
{
    let mut groups = OrderedGroups::new();
    for item in items {
        fold(groups.entry(key(item)), item);
    }
    groups.into_vec()
}

// =============================================================================
// Summary metrics
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryMetrics {
    /// Σ amount over open records.
    pub total_pipeline: f64,
    /// Σ amount × probability / 100 over open records.
    pub weighted_pipeline: f64,
    /// Won / (won + lost) × 100.
    pub win_rate: f64,
    /// Σ amount over Closed Won.
    pub total_revenue: f64,
    /// Σ amount over every record / count.
    pub avg_deal_size: f64,
    pub total_opps: usize,
}

pub fn win_rate(won: usize, lost: usize) -> f64 {
    let closed = won + lost;
    if closed > 0 {
        won as f64 / closed as f64 * 100.0
    } else {
        0.0
    }
}

pub fn average(total: f64, count: usize) -> f64 {
    if count > 0 {
        total / count as f64
    } else {
        0.0
    }
}

pub fn summarize(filtered: &[Opportunity]) -> SummaryMetrics {
    let mut m = SummaryMetrics::default();
    let mut won = 0usize;
    let mut lost = 0usize;
    let mut total_amount = 0.0;

    for opp in filtered {
        total_amount += opp.amount;
        match opp.stage {
            Stage::ClosedWon => {
                won += 1;
                m.total_revenue += opp.amount;
            }
            Stage::ClosedLost => lost += 1,
            _ => {
                m.total_pipeline += opp.amount;
                m.weighted_pipeline += opp.expected_revenue();
            }
        }
    }

    m.win_rate = win_rate(won, lost);
    m.avg_deal_size = average(total_amount, filtered.len());
    m.total_opps = filtered.len();
    m
}

// =============================================================================
// Grouped datasets
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StageBucket {
    pub stage: Stage,
    pub value: f64,
    pub count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProductRevenue {
    pub name: Product,
    pub value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RepSales {
    pub name: SalesRep,
    pub count: usize,
    /// Σ Closed Won amount.
    pub closed: f64,
    /// Σ open amount.
    pub pipeline: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RegionPipeline {
    pub name: Region,
    pub value: f64,
}

/// Always six buckets, funnel order, zeros for absent stages.
pub fn pipeline_by_stage(filtered: &[Opportunity]) -> Vec<StageBucket> {
    let mut buckets: Vec<StageBucket> = Stage::ALL
        .iter()
        .map(|&stage| StageBucket { stage, value: 0.0, count: 0 })
        .collect();
    for opp in filtered {
        let bucket = &mut buckets[opp.stage.index()];
        bucket.value += opp.amount;
        bucket.count += 1;
    }
    buckets
}

pub fn revenue_by_product(filtered: &[Opportunity]) -> Vec<ProductRevenue> {
    group_first_seen(filtered, |o| o.product, |sum: &mut f64, o| *sum += o.amount)
        .into_iter()
        .map(|(name, value)| ProductRevenue { name, value })
        .collect()
}

#[derive(Default)]
struct RepAcc {
    count: usize,
    closed: f64,
    pipeline: f64,
}

/// Closed Lost records only bump `count`.
pub fn sales_by_rep(filtered: &[Opportunity]) -> Vec<RepSales> {
    group_first_seen(filtered, |o| o.owner, |acc: &mut RepAcc, o| {
        acc.count += 1;
        if o.is_won() {
            acc.closed += o.amount;
        } else if o.is_open() {
            acc.pipeline += o.amount;
        }
    })
    .into_iter()
    .map(|(name, acc)| RepSales {
        name,
        count: acc.count,
        closed: acc.closed,
        pipeline: acc.pipeline,
    })
    .collect()
}

/// Open amount per region. A region seen only through closed deals reports 0.
pub fn pipeline_by_region(filtered: &[Opportunity]) -> Vec<RegionPipeline> {
    group_first_seen(filtered, |o| o.region, |sum: &mut f64, o| {
        if o.is_open() {
            *sum += o.amount;
        }
    })
    .into_iter()
    .map(|(name, value)| RegionPipeline { name, value })
    .collect()
}

/// Everything the dashboard renders for one filter selection.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    pub metrics: SummaryMetrics,
    pub pipeline_by_stage: Vec<StageBucket>,
    pub revenue_by_product: Vec<ProductRevenue>,
    pub sales_by_rep: Vec<RepSales>,
    pub pipeline_by_region: Vec<RegionPipeline>,
}

impl DashboardView {
    pub fn compute(filtered: &[Opportunity]) -> Self {
        Self {
            metrics: summarize(filtered),
            pipeline_by_stage: pipeline_by_stage(filtered),
            revenue_by_product: revenue_by_product(filtered),
            sales_by_rep: sales_by_rep(filtered),
            pipeline_by_region: pipeline_by_region(filtered),
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}

// =============================================================================
// Tests
// =============================================================================
