//! Metric category registry.
//!
//! Every formula that turns raw counters into a category total or a headline
//! figure is defined here. Staff and event rollups both call through this
//! module so the two paths cannot drift apart.

use std::fmt;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::domain::record::SalesCounters;
use crate::errors::DomainError;

/// Headline-bearing sales categories.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    AuMnp,
    UqMnp,
    AuNew,
    UqNew,
    CellUp,
}

impl Category {
    pub const ALL: [Category; 5] =
        [Self::AuMnp, Self::UqMnp, Self::AuNew, Self::UqNew, Self::CellUp];

    pub const MNP: [Category; 2] = [Self::AuMnp, Self::UqMnp];
    pub const NEW_LINE: [Category; 2] = [Self::AuNew, Self::UqNew];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AuMnp => "au_mnp",
            Self::UqMnp => "uq_mnp",
            Self::AuNew => "au_new",
            Self::UqNew => "uq_new",
            Self::CellUp => "cell_up",
        }
    }

    /// Resolves a category key. An unknown key is a registry misuse, not
    /// missing data, so it is reported instead of being read as zero.
    pub fn from_key(key: &str) -> Result<Self, DomainError> {
        match key.trim().to_ascii_lowercase().as_str() {
            "au_mnp" => Ok(Self::AuMnp),
            "uq_mnp" => Ok(Self::UqMnp),
            "au_new" => Ok(Self::AuNew),
            "uq_new" => Ok(Self::UqNew),
            "cell_up" => Ok(Self::CellUp),
            _ => Err(DomainError::UnknownCategory { key: key.to_string() }),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sales-plan tiers each category is split into.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubChannel {
    Sp1,
    Sp2,
    Sim,
}

impl SubChannel {
    pub const ALL: [SubChannel; 3] = [Self::Sp1, Self::Sp2, Self::Sim];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sp1 => "sp1",
            Self::Sp2 => "sp2",
            Self::Sim => "sim",
        }
    }
}

/// Cross-sell products tracked outside the headline total.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LtvProduct {
    CreditCard,
    DeviceWarranty,
    OnlineService,
    Electricity,
    Gas,
}

impl LtvProduct {
    pub const ALL: [LtvProduct; 5] = [
        Self::CreditCard,
        Self::DeviceWarranty,
        Self::OnlineService,
        Self::Electricity,
        Self::Gas,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CreditCard => "credit_card",
            Self::DeviceWarranty => "device_warranty",
            Self::OnlineService => "online_service",
            Self::Electricity => "electricity",
            Self::Gas => "gas",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "credit_card" => Some(Self::CreditCard),
            "device_warranty" => Some(Self::DeviceWarranty),
            "online_service" => Some(Self::OnlineService),
            "electricity" => Some(Self::Electricity),
            "gas" => Some(Self::Gas),
            _ => None,
        }
    }
}

/// Address of a single raw counter on a [`SalesCounters`] row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Counter {
    Sales(Category, SubChannel),
    Ltv(LtvProduct),
}

/// Sum of the three sub-channel counters of `category`.
pub fn category_total(counters: &SalesCounters, category: Category) -> u64 {
    SubChannel::ALL
        .iter()
        .map(|channel| counters.get(Counter::Sales(category, *channel)))
        .fold(0, u64::saturating_add)
}

/// Same as [`category_total`] but addressed by string key.
pub fn category_total_by_key(counters: &SalesCounters, key: &str) -> Result<u64, DomainError> {
    Category::from_key(key).map(|category| category_total(counters, category))
}

pub fn mnp_total(counters: &SalesCounters) -> u64 {
    Category::MNP
        .iter()
        .map(|category| category_total(counters, *category))
        .fold(0, u64::saturating_add)
}

pub fn new_line_total(counters: &SalesCounters) -> u64 {
    Category::NEW_LINE
        .iter()
        .map(|category| category_total(counters, *category))
        .fold(0, u64::saturating_add)
}

/// Headline sign-ups: MNP plus new-line, plus cell-up only when the event opts in.
pub fn headline_total(counters: &SalesCounters, include_cell_up: bool) -> u64 {
    let cell_up =
        if include_cell_up { category_total(counters, Category::CellUp) } else { 0 };
    mnp_total(counters).saturating_add(new_line_total(counters)).saturating_add(cell_up)
}

pub fn ltv_total(counters: &SalesCounters) -> u64 {
    LtvProduct::ALL
        .iter()
        .map(|product| counters.get(Counter::Ltv(*product)))
        .fold(0, u64::saturating_add)
}

/// Per-category figures, used both for derived actuals and entered targets.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryTotals {
    pub au_mnp: u64,
    pub uq_mnp: u64,
    pub au_new: u64,
    pub uq_new: u64,
    pub cell_up: u64,
}

impl CategoryTotals {
    pub fn from_counters(counters: &SalesCounters) -> Self {
        Self {
            au_mnp: category_total(counters, Category::AuMnp),
            uq_mnp: category_total(counters, Category::UqMnp),
            au_new: category_total(counters, Category::AuNew),
            uq_new: category_total(counters, Category::UqNew),
            cell_up: category_total(counters, Category::CellUp),
        }
    }

    pub fn get(&self, category: Category) -> u64 {
        match category {
            Category::AuMnp => self.au_mnp,
            Category::UqMnp => self.uq_mnp,
            Category::AuNew => self.au_new,
            Category::UqNew => self.uq_new,
            Category::CellUp => self.cell_up,
        }
    }

    pub fn mnp_total(&self) -> u64 {
        self.au_mnp.saturating_add(self.uq_mnp)
    }

    pub fn new_line_total(&self) -> u64 {
        self.au_new.saturating_add(self.uq_new)
    }

    pub fn headline(&self, include_cell_up: bool) -> u64 {
        let cell_up = if include_cell_up { self.cell_up } else { 0 };
        self.mnp_total().saturating_add(self.new_line_total()).saturating_add(cell_up)
    }
}

/// Scalar that cross-event reports can total and average.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Category(Category),
    MnpTotal,
    NewLineTotal,
    Headline,
    LtvTotal,
    Ltv(LtvProduct),
}

impl Metric {
    pub fn key(&self) -> String {
        match self {
            Self::Category(category) => category.as_str().to_string(),
            Self::MnpTotal => "mnp_total".to_string(),
            Self::NewLineTotal => "new_total".to_string(),
            Self::Headline => "headline".to_string(),
            Self::LtvTotal => "ltv_total".to_string(),
            Self::Ltv(product) => product.as_str().to_string(),
        }
    }

    pub fn from_key(key: &str) -> Result<Self, DomainError> {
        let normalized = key.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "mnp_total" => return Ok(Self::MnpTotal),
            "new_total" => return Ok(Self::NewLineTotal),
            "cell_up_total" => return Ok(Self::Category(Category::CellUp)),
            "headline" | "total" => return Ok(Self::Headline),
            "ltv_total" => return Ok(Self::LtvTotal),
            _ => {}
        }
        if let Some(product) = LtvProduct::parse(&normalized) {
            return Ok(Self::Ltv(product));
        }
        Category::from_key(key).map(Self::Category)
    }
}

/// `numerator / denominator * 100`, rounded half away from zero; 0 when the
/// denominator is 0.
pub fn rounded_percent(numerator: u64, denominator: u64) -> u32 {
    if denominator == 0 {
        return 0;
    }
    (Decimal::from(numerator) * Decimal::ONE_HUNDRED)
        .checked_div(Decimal::from(denominator))
        .map(|ratio| ratio.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|rounded| rounded.to_u32())
        .unwrap_or(0)
}

/// Mean of `total` over `count`, two decimal places; 0 for an empty group.
pub fn average(total: u64, count: usize) -> Decimal {
    if count == 0 {
        return Decimal::ZERO;
    }
    Decimal::from(total)
        .checked_div(Decimal::from(count as u64))
        .map(|mean| mean.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
        .unwrap_or(Decimal::ZERO)
}
