//! Runtime configuration read from the environment.
//!
//! Every variable is optional; a missing or unparsable value falls back to
//! the default rather than failing startup.

use crate::filter::{FilterParams, RecencyWindow, Selector};
use crate::generator::DEFAULT_OPPORTUNITY_COUNT;
use crate::model::{Region, SalesRep};

#[derive(Debug, Clone)]
pub struct Config {
    /// Fixed RNG seed; `None` draws from entropy.
    pub seed: Option<u64>,
    pub opportunity_count: usize,
    pub default_region: Selector<Region>,
    pub default_owner: Selector<SalesRep>,
    pub default_window: RecencyWindow,
    pub export_dir: String,
    pub server_port: u16,
    pub forecast_days: i64,
    pub stale_days: u32,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            seed: std::env::var("SEED").ok().and_then(|v| v.parse().ok()),
            opportunity_count: std::env::var("OPP_COUNT").ok().and_then(|v| v.parse().ok()).unwrap_or(DEFAULT_OPPORTUNITY_COUNT),
            default_region: std::env::var("DEFAULT_REGION").ok().and_then(|v| v.parse().ok()).unwrap_or(Selector::All),
            default_owner: std::env::var("DEFAULT_OWNER").ok().and_then(|v| v.parse().ok()).unwrap_or(Selector::All),
            default_window: std::env::var("DEFAULT_WINDOW_DAYS").ok().and_then(|v| v.parse().ok()).unwrap_or_default(),
            export_dir: std::env::var("EXPORT_DIR").unwrap_or_else(|_| "out/export".to_string()),
            server_port: std::env::var("SERVER_PORT").ok().and_then(|v| v.parse().ok()).unwrap_or(8765),
            forecast_days: std::env::var("FORECAST_DAYS").ok().and_then(|v| v.parse().ok()).unwrap_or(90),
            stale_days: std::env::var("STALE_DAYS").ok().and_then(|v| v.parse().ok()).unwrap_or(60),
        }
    }

    pub fn default_filters(&self) -> FilterParams {
        FilterParams {
            region: self.default_region,
            owner: self.default_owner,
            window: self.default_window,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            seed: None,
            opportunity_count: DEFAULT_OPPORTUNITY_COUNT,
            default_region: Selector::All,
            default_owner: Selector::All,
            default_window: RecencyWindow::default(),
            export_dir: "out/export".to_string(),
            server_port: 8765,
            forecast_days: 90,
            stale_days: 60,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filters_are_all_and_ninety_days() {
        let cfg = Config::default();
        let params = cfg.default_filters();
        assert_eq!(params.region, Selector::All);
        assert_eq!(params.owner, Selector::All);
        assert_eq!(params.window.days(), 90);
    }

    #[test]
    fn test_default_filters_follow_overrides() {
        let cfg = Config {
            default_region: Selector::Only(Region::Pacific),
            default_window: RecencyWindow::Days30,
            ..Config::default()
        };
        let params = cfg.default_filters();
        assert_eq!(params.region, Selector::Only(Region::Pacific));
        assert_eq!(params.window, RecencyWindow::Days30);
    }

    #[test]
    fn test_from_env_parses_and_falls_back() {
        // only test in the crate that touches these variables
        let vars = [
            ("SEED", "7"),
            ("OPP_COUNT", "many"),
            ("DEFAULT_REGION", "Pacific"),
            ("DEFAULT_OWNER", "mike chen"),
            ("DEFAULT_WINDOW_DAYS", "45"),
            ("SERVER_PORT", "70000"),
            ("STALE_DAYS", "30"),
        ];
        for (k, v) in vars {
            std::env::set_var(k, v);
        }
        let cfg = Config::from_env();
        for (k, _) in vars {
            std::env::remove_var(k);
        }

        assert_eq!(cfg.seed, Some(7));
        assert_eq!(cfg.opportunity_count, DEFAULT_OPPORTUNITY_COUNT);
        assert_eq!(cfg.default_region, Selector::Only(Region::Pacific));
        assert_eq!(cfg.default_owner, Selector::Only(SalesRep::MikeChen));
        assert_eq!(cfg.default_window, RecencyWindow::Days90);
        assert_eq!(cfg.server_port, 8765);
        assert_eq!(cfg.stale_days, 30);
    }
}
