//! Opportunity records and the closed vocabularies they draw from.
//!
//! Every categorical field is a closed enum with a display name, an `ALL`
//! table in canonical order and a lenient `FromStr` so selectors can arrive
//! as text (CLI flags, query strings).

use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Normalise a user-supplied label: lowercase, `_`/`-` folded to spaces.
fn normalize(s: &str) -> String {
    s.trim()
        .chars()
        .map(|c| if c == '_' || c == '-' { ' ' } else { c.to_ascii_lowercase() })
        .collect()
}

// =============================================================================
// Stage
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    Prospecting,
    Qualification,
    Proposal,
    Negotiation,
    #[serde(rename = "Closed Won")]
    ClosedWon,
    #[serde(rename = "Closed Lost")]
    ClosedLost,
}

impl Stage {
    /// Funnel order, used by the by-stage chart.
    pub const ALL: [Stage; 6] = [
        Stage::Prospecting,
        Stage::Qualification,
        Stage::Proposal,
        Stage::Negotiation,
        Stage::ClosedWon,
        Stage::ClosedLost,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Prospecting => "Prospecting",
            Stage::Qualification => "Qualification",
            Stage::Proposal => "Proposal",
            Stage::Negotiation => "Negotiation",
            Stage::ClosedWon => "Closed Won",
            Stage::ClosedLost => "Closed Lost",
        }
    }

    /// Win probability in percent. Fixed per stage.
    pub fn probability(&self) -> u8 {
        match self {
            Stage::ClosedWon => 100,
            Stage::ClosedLost => 0,
            Stage::Negotiation => 75,
            Stage::Proposal => 50,
            Stage::Qualification => 25,
            Stage::Prospecting => 10,
        }
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, Stage::ClosedWon | Stage::ClosedLost)
    }

    pub fn is_open(&self) -> bool {
        !self.is_closed()
    }

    pub fn index(&self) -> usize {
        Stage::ALL.iter().position(|s| s == self).unwrap_or(0)
    }
}

// =============================================================================
// Product
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Product {
    #[serde(rename = "Fiber Internet")]
    FiberInternet,
    #[serde(rename = "Dark Fiber")]
    DarkFiber,
    Ethernet,
    #[serde(rename = "Cloud Connect")]
    CloudConnect,
    #[serde(rename = "Managed Services")]
    ManagedServices,
}

impl Product {
    pub const ALL: [Product; 5] = [
        Product::FiberInternet,
        Product::DarkFiber,
        Product::Ethernet,
        Product::CloudConnect,
        Product::ManagedServices,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Product::FiberInternet => "Fiber Internet",
            Product::DarkFiber => "Dark Fiber",
            Product::Ethernet => "Ethernet",
            Product::CloudConnect => "Cloud Connect",
            Product::ManagedServices => "Managed Services",
        }
    }
}

// =============================================================================
// Region
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Region {
    Northwest,
    #[serde(rename = "Mountain West")]
    MountainWest,
    Pacific,
    Southwest,
}

impl Region {
    pub const ALL: [Region; 4] = [
        Region::Northwest,
        Region::MountainWest,
        Region::Pacific,
        Region::Southwest,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Region::Northwest => "Northwest",
            Region::MountainWest => "Mountain West",
            Region::Pacific => "Pacific",
            Region::Southwest => "Southwest",
        }
    }
}

// =============================================================================
// Sales reps
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SalesRep {
    #[serde(rename = "Sarah Johnson")]
    SarahJohnson,
    #[serde(rename = "Mike Chen")]
    MikeChen,
    #[serde(rename = "Emily Rodriguez")]
    EmilyRodriguez,
    #[serde(rename = "David Kim")]
    DavidKim,
    #[serde(rename = "Jessica Taylor")]
    JessicaTaylor,
}

impl SalesRep {
    pub const ALL: [SalesRep; 5] = [
        SalesRep::SarahJohnson,
        SalesRep::MikeChen,
        SalesRep::EmilyRodriguez,
        SalesRep::DavidKim,
        SalesRep::JessicaTaylor,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SalesRep::SarahJohnson => "Sarah Johnson",
            SalesRep::MikeChen => "Mike Chen",
            SalesRep::EmilyRodriguez => "Emily Rodriguez",
            SalesRep::DavidKim => "David Kim",
            SalesRep::JessicaTaylor => "Jessica Taylor",
        }
    }
}

// Display + FromStr are identical for every vocabulary: display name out,
// normalised display name (or variant-ish spelling) in.
macro_rules! vocabulary {
    ($ty:ident, $what:literal) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = anyhow::Error;

            fn from_str(s: &str) -> Result<Self> {
                let wanted = normalize(s);
                let compact: String = wanted.chars().filter(|c| *c != ' ').collect();
                $ty::ALL
                    .iter()
                    .copied()
                    .find(|v| {
                        let name = normalize(v.as_str());
                        name == wanted || name.replace(' ', "") == compact
                    })
                    .ok_or_else(|| anyhow!("unknown {}: {:?}", $what, s))
            }
        }
    };
}

vocabulary!(Stage, "stage");
vocabulary!(Product, "product");
vocabulary!(Region, "region");
vocabulary!(SalesRep, "sales rep");

// =============================================================================
// Opportunity
// =============================================================================

/// One synthetic sales-pipeline record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Opportunity {
    pub id: String,
    pub account_name: String,
    pub stage: Stage,
    pub product: Product,
    pub amount: f64,
    pub probability: u8,
    pub region: Region,
    pub owner: SalesRep,
    pub created_date: NaiveDate,
    pub close_date: NaiveDate,
    pub days_in_stage: u32,
}

impl Opportunity {
    pub fn is_open(&self) -> bool {
        self.stage.is_open()
    }

    pub fn is_won(&self) -> bool {
        self.stage == Stage::ClosedWon
    }

    pub fn is_lost(&self) -> bool {
        self.stage == Stage::ClosedLost
    }

    /// Probability-weighted amount.
    pub fn expected_revenue(&self) -> f64 {
        self.amount * self.probability as f64 / 100.0
    }

    /// Days from creation to (expected) close.
    pub fn cycle_days(&self) -> i64 {
        (self.close_date - self.created_date).num_days()
    }
}

// =============================================================================
// Tests
// =============================================================================
