//! Filter stage: region, owner and recency predicates, AND-combined.

use anyhow::{anyhow, Result};
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::model::{Opportunity, Region, SalesRep};

/// Single-choice selector: the "All" sentinel or one concrete value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Selector<T> {
    All,
    Only(T),
}

impl<T> Default for Selector<T> {
    fn default() -> Self {
        Selector::All
    }
}

impl<T: PartialEq> Selector<T> {
    pub fn accepts(&self, value: &T) -> bool {
        match self {
            Selector::All => true,
            Selector::Only(wanted) => wanted == value,
        }
    }
}

impl<T: fmt::Display> fmt::Display for Selector<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::All => f.write_str("All"),
            Selector::Only(v) => write!(f, "{}", v),
        }
    }
}

impl<T: FromStr<Err = anyhow::Error>> FromStr for Selector<T> {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        if s.trim().eq_ignore_ascii_case("all") || s.trim().is_empty() {
            Ok(Selector::All)
        } else {
            Ok(Selector::Only(s.parse()?))
        }
    }
}

/// Recency window offered by the date-range selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RecencyWindow {
    Days30,
    Days60,
    #[default]
    Days90,
    Days180,
}

impl RecencyWindow {
    pub const ALL: [RecencyWindow; 4] = [
        RecencyWindow::Days30,
        RecencyWindow::Days60,
        RecencyWindow::Days90,
        RecencyWindow::Days180,
    ];

    pub fn days(&self) -> i64 {
        match self {
            RecencyWindow::Days30 => 30,
            RecencyWindow::Days60 => 60,
            RecencyWindow::Days90 => 90,
            RecencyWindow::Days180 => 180,
        }
    }

    /// Earliest created date still inside the window.
    pub fn cutoff(&self, today: NaiveDate) -> NaiveDate {
        today - Duration::days(self.days())
    }
}

impl fmt::Display for RecencyWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Last {} Days", self.days())
    }
}

impl FromStr for RecencyWindow {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let days: i64 = s
            .trim()
            .parse()
            .map_err(|e| anyhow!("bad window {:?}: {}", s, e))?;
        RecencyWindow::ALL
            .iter()
            .copied()
            .find(|w| w.days() == days)
            .ok_or_else(|| anyhow!("unsupported window: {} days (expected 30, 60, 90 or 180)", days))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct FilterParams {
    pub region: Selector<Region>,
    pub owner: Selector<SalesRep>,
    pub window: RecencyWindow,
}

impl FilterParams {
    /// All regions, all owners, widest window.
    pub fn everything() -> Self {
        Self {
            region: Selector::All,
            owner: Selector::All,
            window: RecencyWindow::Days180,
        }
    }
}

pub fn matches(opp: &Opportunity, params: &FilterParams, today: NaiveDate) -> bool {
    let region_match = params.region.accepts(&opp.region);
    let owner_match = params.owner.accepts(&opp.owner);
    let date_match = opp.created_date >= params.window.cutoff(today);
    region_match && owner_match && date_match
}

/// Order-preserving subset of `records` passing every predicate.
pub fn apply_filters(records: &[Opportunity], params: &FilterParams, today: NaiveDate) -> Vec<Opportunity> {
    records
        .iter()
        .filter(|o| matches(o, params, today))
        .cloned()
        .collect()
}

// =============================================================================
// Tests
// =============================================================================
