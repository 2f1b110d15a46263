//! Category breakdown for a subcontractor's participation on a bid.
//!
//! A [`BreakdownSet`] is built up one row at a time while the user fills in
//! the participation form. Before transmission it is validated with
//! [`BreakdownSet::validate_for_submit`] and then normalized, which turns the
//! implicit remainder into an explicit `"Non-MBE"` row so that the payload
//! sums to exactly 100.

use crate::utils::validation::{parse_percentage, validate_naics_field};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Category name of the synthetic remainder row.
pub const NON_MBE_CATEGORY: &str = "Non-MBE";

/// Decimal places kept on totals and remainders.
const PERCENT_SCALE: u32 = 2;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BreakdownError {
    #[error("{0} already added to breakdown")]
    DuplicateCategory(String),

    #[error("Invalid NAICS code. NAICS codes must be 2-6 digits (e.g., 236220).")]
    InvalidNaicsFormat,

    #[error("Breakdown percentages cannot exceed 100%. Current total: {0:.2}%")]
    BreakdownExceeds100(Decimal),
}

/// Participation categories offered by the form.
///
/// Entries are keyed by plain strings so free-text categories still work;
/// this enum only names the well-known ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Mbe,
    Wbe,
    Sbe,
    Vsbe,
}

impl Category {
    pub const ALL: [Category; 4] = [Category::Mbe, Category::Wbe, Category::Sbe, Category::Vsbe];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Mbe => "MBE",
            Category::Wbe => "WBE",
            Category::Sbe => "SBE",
            Category::Vsbe => "VSBE",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("Unknown category '{}'", s))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryEntry {
    pub category: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub percentage: Decimal,
}

impl CategoryEntry {
    pub fn new(category: impl Into<String>, percentage: Decimal) -> Self {
        Self {
            category: category.into(),
            percentage,
        }
    }
}

/// Ordered, category-unique set of breakdown rows.
///
/// Every operation returns a new set; the receiver is never mutated, so a
/// failed operation cannot leave a half-applied change behind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BreakdownSet {
    entries: Vec<CategoryEntry>,
}

/// Breakdown ready for transmission: the user's rows plus the remainder row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NormalizedBreakdown(Vec<CategoryEntry>);

impl NormalizedBreakdown {
    pub fn entries(&self) -> &[CategoryEntry] {
        &self.0
    }

    pub fn total_percentage(&self) -> Decimal {
        sum_percentages(&self.0)
    }

    pub fn into_entries(self) -> Vec<CategoryEntry> {
        self.0
    }
}

/// Figures shown next to the breakdown rows while editing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreakdownSummary {
    pub total: Decimal,
    /// Implicit Non-MBE share, present only while the set is non-empty and under 100.
    pub non_mbe_remainder: Option<Decimal>,
    pub exceeds_limit: bool,
}

impl BreakdownSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[CategoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, category: &str) -> bool {
        self.entries.iter().any(|e| e.category == category)
    }

    /// Appends a row built from the raw form inputs.
    ///
    /// Percentage text that is blank, non-numeric or not strictly positive
    /// leaves the set unchanged and still returns `Ok`. Category matching is
    /// exact and case-sensitive.
    pub fn add_entry(
        &self,
        category: &str,
        percentage_text: &str,
    ) -> Result<BreakdownSet, BreakdownError> {
        let percentage = match parse_percentage(percentage_text) {
            Some(p) if p > Decimal::ZERO => p,
            _ => {
                tracing::debug!(
                    "Ignoring breakdown row {} with percentage {:?}",
                    category,
                    percentage_text
                );
                return Ok(self.clone());
            }
        };

        if self.contains(category) {
            return Err(BreakdownError::DuplicateCategory(category.to_string()));
        }

        let mut entries = self.entries.clone();
        entries.push(CategoryEntry::new(category, percentage));
        Ok(BreakdownSet { entries })
    }

    /// Drops the row at `index`. Out-of-range indexes are ignored.
    pub fn remove_entry(&self, index: usize) -> BreakdownSet {
        let entries = self
            .entries
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != index)
            .map(|(_, e)| e.clone())
            .collect();
        BreakdownSet { entries }
    }

    /// Sum of all rows, saturating at `Decimal::MAX` instead of overflowing.
    pub fn total_percentage(&self) -> Decimal {
        sum_percentages(&self.entries)
    }

    /// Pre-submit gate. NAICS is checked before the percentage total.
    pub fn validate_for_submit(&self, naics_code_raw: &str) -> Result<(), BreakdownError> {
        if !validate_naics_field(naics_code_raw) {
            return Err(BreakdownError::InvalidNaicsFormat);
        }

        let total = self.total_percentage();
        if !self.is_empty() && total > Decimal::ONE_HUNDRED {
            return Err(BreakdownError::BreakdownExceeds100(round_percent(total)));
        }

        Ok(())
    }

    /// Materializes the Non-MBE remainder.
    ///
    /// Expects a set that already passed [`validate_for_submit`](Self::validate_for_submit);
    /// a total above 100 is not re-checked here.
    pub fn normalize(&self) -> Option<NormalizedBreakdown> {
        if self.is_empty() {
            return None;
        }

        let mut entries = self.entries.clone();
        let total = self.total_percentage();
        if total < Decimal::ONE_HUNDRED {
            entries.push(CategoryEntry::new(
                NON_MBE_CATEGORY,
                round_percent(Decimal::ONE_HUNDRED - total),
            ));
        }
        Some(NormalizedBreakdown(entries))
    }

    pub fn counts_toward_mbe(&self) -> bool {
        self.contains(Category::Mbe.as_str())
    }

    pub fn summary(&self) -> BreakdownSummary {
        let total = self.total_percentage();
        let non_mbe_remainder = (!self.is_empty() && total < Decimal::ONE_HUNDRED)
            .then(|| round_percent(Decimal::ONE_HUNDRED - total));
        BreakdownSummary {
            total: round_percent(total),
            non_mbe_remainder,
            exceeds_limit: total > Decimal::ONE_HUNDRED,
        }
    }
}

fn sum_percentages(entries: &[CategoryEntry]) -> Decimal {
    entries
        .iter()
        .fold(Decimal::ZERO, |total, e| total.saturating_add(e.percentage))
}

fn round_percent(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(PERCENT_SCALE, RoundingStrategy::MidpointAwayFromZero)
}
