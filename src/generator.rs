//! Synthetic opportunity generation.
//!
//! A session draws its dataset exactly once. Every field is an independent
//! uniform draw except `probability` (fixed by stage) and `close_date`
//! (created date plus 30..120 days).

use chrono::{Duration, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use crate::config::Config;
use crate::logging::{self, ProfileScope};
use crate::model::{Opportunity, Product, Region, SalesRep, Stage};

pub const DEFAULT_OPPORTUNITY_COUNT: usize = 150;

/// Created dates fall in `[today - LOOKBACK_DAYS + 1, today]`.
pub const LOOKBACK_DAYS: i64 = 180;

const FIRST_ID: usize = 1000;
const CLOSE_OFFSET_MIN: i64 = 30;
const CLOSE_OFFSET_MAX: i64 = 120;
const AMOUNT_MIN: u64 = 10_000;
const AMOUNT_SPAN: u64 = 150_000;
const DAYS_IN_STAGE_MAX: u32 = 60;

const ACCOUNT_PREFIXES: [&str; 6] = [
    "Acme Corp",
    "TechStart Inc",
    "Global Systems",
    "Enterprise Co",
    "Summit LLC",
    "Valley Industries",
];

fn pick<T: Copy, R: Rng + ?Sized>(rng: &mut R, items: &[T]) -> T {
    items[rng.gen_range(0..items.len())]
}

/// Draw `count` opportunities relative to `today`.
pub fn generate<R: Rng + ?Sized>(rng: &mut R, today: NaiveDate, count: usize) -> Vec<Opportunity> {
    let mut out = Vec::with_capacity(count);
    for i in 0..count {
        let created_date = today - Duration::days(rng.gen_range(0..LOOKBACK_DAYS));
        let close_date =
            created_date + Duration::days(rng.gen_range(CLOSE_OFFSET_MIN..CLOSE_OFFSET_MAX));
        let stage = pick(rng, &Stage::ALL);
        let account = pick(rng, &ACCOUNT_PREFIXES);

        out.push(Opportunity {
            id: format!("OPP-{}", FIRST_ID + i),
            account_name: format!("{} {}", account, i),
            stage,
            product: pick(rng, &Product::ALL),
            amount: (AMOUNT_MIN + rng.gen_range(0..AMOUNT_SPAN)) as f64,
            probability: stage.probability(),
            region: pick(rng, &Region::ALL),
            owner: pick(rng, &SalesRep::ALL),
            created_date,
            close_date,
            days_in_stage: rng.gen_range(1..=DAYS_IN_STAGE_MAX),
        });
    }
    out
}

/// Session entry point: seeds from config (or entropy) and logs the draw.
pub fn generate_dataset(cfg: &Config, today: NaiveDate) -> Vec<Opportunity> {
    let _scope = ProfileScope::with_context(
        "generate_dataset",
        &[("count", serde_json::json!(cfg.opportunity_count))],
    );
    let mut rng = match cfg.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let data = generate(&mut rng, today, cfg.opportunity_count);
    logging::log_generated(data.len(), cfg.seed, &today.to_string());
    data
}

/// Payload of the raw data endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct SalesData<'a> {
    pub opportunities: &'a [Opportunity],
    pub generated_at: String,
    pub count: usize,
}

impl<'a> SalesData<'a> {
    pub fn new(opportunities: &'a [Opportunity], generated_at: String) -> Self {
        Self { opportunities, generated_at, count: opportunities.len() }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 17).unwrap()
    }

    fn sample(seed: u64) -> Vec<Opportunity> {
        let mut rng = StdRng::seed_from_u64(seed);
        generate(&mut rng, today(), DEFAULT_OPPORTUNITY_COUNT)
    }

    #[test]
    fn test_generates_exact_count_with_sequential_ids() {
        let data = sample(7);
        assert_eq!(data.len(), 150);
        assert_eq!(data[0].id, "OPP-1000");
        assert_eq!(data[149].id, "OPP-1149");
        let ids: HashSet<&str> = data.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids.len(), 150);
    }

    #[test]
    fn test_field_domains() {
        let earliest = today() - Duration::days(LOOKBACK_DAYS - 1);
        for opp in sample(11) {
            assert_eq!(opp.probability, opp.stage.probability());
            assert!(opp.created_date <= today());
            assert!(opp.created_date >= earliest);
            let cycle = opp.cycle_days();
            assert!((30..120).contains(&cycle), "cycle {} out of range", cycle);
            assert!(opp.amount >= 10_000.0 && opp.amount < 160_000.0);
            assert_eq!(opp.amount.fract(), 0.0);
            assert!((1..=60).contains(&opp.days_in_stage));
        }
    }

    #[test]
    fn test_account_name_carries_index() {
        let data = sample(3);
        for (i, opp) in data.iter().enumerate() {
            assert!(opp.account_name.ends_with(&format!(" {}", i)));
            let prefix = opp.account_name.rsplit_once(' ').map(|(p, _)| p).unwrap();
            assert!(ACCOUNT_PREFIXES.contains(&prefix));
        }
    }

    #[test]
    fn test_same_seed_same_dataset() {
        assert_eq!(sample(42), sample(42));
        assert_ne!(sample(42), sample(43));
    }

    #[test]
    fn test_zero_count() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(generate(&mut rng, today(), 0).is_empty());
    }

    #[test]
    fn test_sales_data_payload() {
        let data = sample(5);
        let payload = SalesData::new(&data, "2026-10-17T00:00:00.000Z".to_string());
        let v = serde_json::to_value(&payload).unwrap();
        assert_eq!(v["count"], 150);
        assert_eq!(v["opportunities"][0]["id"], "OPP-1000");
        assert!(v["opportunities"][0].get("createdDate").is_some());
    }
}
