//! Rate histories: the ordered list of hourly-rate changes for one project.
//!
//! A [`RateHistory`] can only be built through [`RateHistory::normalize`] (or
//! deserialization, which calls it), so every value of the type satisfies:
//!
//! - at least one entry,
//! - exactly one [`EffectiveDate::Baseline`] entry,
//! - distinct dates among the dated entries,
//! - non-negative rates.
//!
//! Entries are kept sorted with the baseline first, then by ascending date.
//! Edits go through [`RateHistory::add_entry`], [`RateHistory::remove_entry`] and
//! [`RateHistory::update_entry`], which validate the edited list before committing it.

pub mod resolver;

use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub use resolver::{resolve, resolve_entry};

/// When a rate change starts to apply.
///
/// `Baseline` orders before every calendar date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EffectiveDate {
    Baseline,
    On(NaiveDate),
}

impl EffectiveDate {
    /// Whether a rate with this effective date is in force on `date`.
    pub fn applies_on(&self, date: NaiveDate) -> bool {
        match self {
            EffectiveDate::Baseline => true,
            EffectiveDate::On(d) => *d <= date,
        }
    }

    pub fn is_baseline(&self) -> bool {
        matches!(self, EffectiveDate::Baseline)
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            EffectiveDate::Baseline => None,
            EffectiveDate::On(d) => Some(*d),
        }
    }
}

impl From<Option<NaiveDate>> for EffectiveDate {
    fn from(date: Option<NaiveDate>) -> Self {
        date.map_or(EffectiveDate::Baseline, EffectiveDate::On)
    }
}

impl fmt::Display for EffectiveDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EffectiveDate::Baseline => write!(f, "original"),
            EffectiveDate::On(d) => write!(f, "{}", d.format("%Y-%m-%d")),
        }
    }
}

/// One hourly rate and the date it takes effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateChangeEntry {
    pub effective_date: EffectiveDate,
    pub hourly_rate: Decimal,
}

impl RateChangeEntry {
    pub fn baseline(hourly_rate: Decimal) -> Self {
        Self {
            effective_date: EffectiveDate::Baseline,
            hourly_rate,
        }
    }

    pub fn on(date: NaiveDate, hourly_rate: Decimal) -> Self {
        Self {
            effective_date: EffectiveDate::On(date),
            hourly_rate,
        }
    }
}

/// Wire shape of a rate change: `{"hourly_rate": 60, "effective_date": "2024-06-01"}`.
/// A null or missing `effective_date` marks the baseline entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRateChange {
    pub hourly_rate: Decimal,
    #[serde(default)]
    pub effective_date: Option<NaiveDate>,
}

impl From<RawRateChange> for RateChangeEntry {
    fn from(raw: RawRateChange) -> Self {
        Self {
            effective_date: raw.effective_date.into(),
            hourly_rate: raw.hourly_rate,
        }
    }
}

impl From<&RateChangeEntry> for RawRateChange {
    fn from(entry: &RateChangeEntry) -> Self {
        Self {
            hourly_rate: entry.hourly_rate,
            effective_date: entry.effective_date.as_date(),
        }
    }
}

/// The two input shapes a project's rate can arrive in.
#[derive(Debug, Clone, PartialEq)]
pub enum RawRateHistory {
    /// A single flat `hourly_rate` with no history.
    Legacy(Decimal),
    /// An explicit `rate_changes` list.
    Entries(Vec<RawRateChange>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<RawRateChange>", into = "Vec<RawRateChange>")]
pub struct RateHistory {
    entries: Vec<RateChangeEntry>,
}

impl RateHistory {
    /// Validate either input shape into a canonical history.
    pub fn normalize(raw: RawRateHistory) -> Result<Self> {
        let entries = match raw {
            RawRateHistory::Legacy(rate) => vec![RateChangeEntry::baseline(rate)],
            RawRateHistory::Entries(list) => list.into_iter().map(RateChangeEntry::from).collect(),
        };
        Ok(Self {
            entries: validate(entries)?,
        })
    }

    /// A history holding only a baseline at `hourly_rate`.
    pub fn flat(hourly_rate: Decimal) -> Result<Self> {
        Self::normalize(RawRateHistory::Legacy(hourly_rate))
    }

    /// Build from already-typed entries, in any order.
    pub fn from_entries(entries: Vec<RateChangeEntry>) -> Result<Self> {
        Ok(Self {
            entries: validate(entries)?,
        })
    }

    /// Entries in display order: baseline first, then ascending dates.
    pub fn entries(&self) -> &[RateChangeEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn baseline(&self) -> &RateChangeEntry {
        &self.entries[0]
    }

    pub fn get(&self, effective_date: &EffectiveDate) -> Option<&RateChangeEntry> {
        self.entries
            .iter()
            .find(|e| e.effective_date == *effective_date)
    }

    /// The rate in force on `date`.
    pub fn resolve(&self, date: NaiveDate) -> Decimal {
        resolve(self, date)
    }

    /// The rate in force on the caller's notion of today.
    pub fn current_rate(&self, now: NaiveDate) -> Decimal {
        resolve(self, now)
    }

    /// Whether removing `target` is allowed: the entry exists, is not the
    /// only one left, and is not the baseline.
    pub fn can_delete(&self, target: &EffectiveDate) -> bool {
        self.entries.len() > 1 && !target.is_baseline() && self.get(target).is_some()
    }

    pub fn add_entry(&mut self, entry: RateChangeEntry) -> Result<()> {
        let mut candidate = self.entries.clone();
        candidate.push(entry);
        self.entries = validate(candidate)?;
        Ok(())
    }

    /// Remove the entry effective on `target`.
    ///
    /// The baseline stays put: removing it fails while dated entries remain,
    /// and so does removing the only entry.
    pub fn remove_entry(&mut self, target: &EffectiveDate) -> Result<RateChangeEntry> {
        let idx = self.position(target)?;
        if self.entries.len() == 1 {
            return Err(Error::InvariantViolation(
                "cannot delete the only rate in a history".into(),
            ));
        }
        if target.is_baseline() {
            return Err(Error::InvariantViolation(
                "cannot delete the original rate while later rates remain".into(),
            ));
        }

        let mut candidate = self.entries.clone();
        let removed = candidate.remove(idx);
        self.entries = validate(candidate)?;
        Ok(removed)
    }

    /// Replace the entry effective on `target` with `replacement`.
    pub fn update_entry(&mut self, target: &EffectiveDate, replacement: RateChangeEntry) -> Result<()> {
        let idx = self.position(target)?;
        let mut candidate = self.entries.clone();
        candidate[idx] = replacement;
        self.entries = validate(candidate)?;
        Ok(())
    }

    fn position(&self, target: &EffectiveDate) -> Result<usize> {
        self.entries
            .iter()
            .position(|e| e.effective_date == *target)
            .ok_or_else(|| Error::NotFound(format!("rate entry effective {target}")))
    }
}

impl TryFrom<Vec<RawRateChange>> for RateHistory {
    type Error = Error;

    fn try_from(list: Vec<RawRateChange>) -> Result<Self> {
        Self::normalize(RawRateHistory::Entries(list))
    }
}

impl From<RateHistory> for Vec<RawRateChange> {
    fn from(history: RateHistory) -> Self {
        history.entries.iter().map(RawRateChange::from).collect()
    }
}

/// Check every invariant and return the entries in canonical order.
fn validate(mut entries: Vec<RateChangeEntry>) -> Result<Vec<RateChangeEntry>> {
    if entries.is_empty() {
        return Err(Error::Validation("rate history is empty".into()));
    }

    if let Some(bad) = entries.iter().find(|e| e.hourly_rate < Decimal::ZERO) {
        return Err(Error::Validation(format!(
            "negative hourly rate {} effective {}",
            bad.hourly_rate, bad.effective_date
        )));
    }

    let baselines = entries
        .iter()
        .filter(|e| e.effective_date.is_baseline())
        .count();
    match baselines {
        0 => {
            return Err(Error::Validation(
                "rate history has no original (undated) rate".into(),
            ))
        }
        1 => {}
        n => {
            return Err(Error::Validation(format!(
                "rate history has {n} original (undated) rates"
            )))
        }
    }

    entries.sort_by_key(|e| e.effective_date);
    if let Some(pair) = entries
        .windows(2)
        .find(|w| w[0].effective_date == w[1].effective_date)
    {
        return Err(Error::Validation(format!(
            "two rate changes take effect on {}",
            pair[0].effective_date
        )));
    }

    Ok(entries)
}
