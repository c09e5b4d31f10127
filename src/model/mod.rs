//! Records handed to the engine by the management and task collaborators.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Error, Result};
use crate::rates::{RateHistory, RawRateChange, RawRateHistory};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    pub id: String,
    pub name: String,
    /// Reference to an uploaded logo, e.g. `/api/logos/<file>`.
    #[serde(default, rename = "logo_path", skip_serializing_if = "Option::is_none")]
    pub logo_ref: Option<String>,
}

impl Client {
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            logo_ref: None,
        }
    }
}

/// A billable project. Its rate history is always normalized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawProject", into = "RawProject")]
pub struct Project {
    pub id: String,
    pub client_id: String,
    pub name: String,
    /// Display colour; opaque to the engine.
    pub color: String,
    /// Hidden projects are left out of aggregated totals.
    pub hidden: bool,
    /// Optimistic-concurrency token, bumped on every rate history replacement.
    pub version: u64,
    pub rate_history: RateHistory,
}

impl Project {
    pub fn new(id: &str, client_id: &str, name: &str, rate_history: RateHistory) -> Self {
        Self {
            id: id.to_string(),
            client_id: client_id.to_string(),
            name: name.to_string(),
            color: String::new(),
            hidden: false,
            version: 0,
            rate_history,
        }
    }

    /// Replace the whole rate history, provided the caller saw the current
    /// version. The history is left untouched on conflict.
    pub fn replace_rate_history(&mut self, expected_version: u64, history: RateHistory) -> Result<()> {
        if expected_version != self.version {
            return Err(Error::VersionConflict {
                project_id: self.id.clone(),
                expected: expected_version,
                actual: self.version,
            });
        }
        self.rate_history = history;
        self.version += 1;
        log::info!(
            "Replaced rate history of project {} ({} entries, version {})",
            self.id,
            self.rate_history.len(),
            self.version
        );
        Ok(())
    }
}

/// JSON shape of a project as stored in `projects.json`.
///
/// Older records carry a flat `hourly_rate`; newer ones a `rate_changes` list.
/// When both are present the list wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawProject {
    pub id: String,
    pub client_id: String,
    pub name: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub version: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate_changes: Option<Vec<RawRateChange>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hourly_rate: Option<Decimal>,
}

impl TryFrom<RawProject> for Project {
    type Error = Error;

    fn try_from(raw: RawProject) -> Result<Self> {
        let shape = match (raw.rate_changes, raw.hourly_rate) {
            (Some(list), _) => RawRateHistory::Entries(list),
            (None, Some(rate)) => RawRateHistory::Legacy(rate),
            (None, None) => {
                return Err(Error::Validation(format!(
                    "project {} has no hourly rate",
                    raw.id
                )))
            }
        };
        let rate_history = RateHistory::normalize(shape).map_err(|e| match e {
            Error::Validation(msg) => Error::Validation(format!("project {}: {msg}", raw.id)),
            other => other,
        })?;

        Ok(Self {
            id: raw.id,
            client_id: raw.client_id,
            name: raw.name,
            color: raw.color,
            hidden: raw.hidden,
            version: raw.version,
            rate_history,
        })
    }
}

impl From<Project> for RawProject {
    fn from(project: Project) -> Self {
        Self {
            id: project.id,
            client_id: project.client_id,
            name: project.name,
            color: project.color,
            hidden: project.hidden,
            version: project.version,
            rate_changes: Some(project.rate_history.into()),
            hourly_rate: None,
        }
    }
}

/// How a task repeats. Expansion into per-date tasks happens upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RecurringRule {
    Daily,
    Weekly,
    Monthly,
}

impl FromStr for RecurringRule {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "daily" => Ok(RecurringRule::Daily),
            "weekly" => Ok(RecurringRule::Weekly),
            "monthly" => Ok(RecurringRule::Monthly),
            other => Err(Error::Validation(format!("unknown recurrence: {other}"))),
        }
    }
}

impl fmt::Display for RecurringRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RecurringRule::Daily => "daily",
            RecurringRule::Weekly => "weekly",
            RecurringRule::Monthly => "monthly",
        };
        f.write_str(s)
    }
}

/// A block of logged time on one date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub project_id: String,
    /// Denormalized copy kept by the task collaborator; aggregation ignores it
    /// and groups by the project's client.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    pub date: NaiveDate,
    pub hours: Decimal,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub notes: String,
    #[serde(
        default,
        rename = "recurring",
        deserialize_with = "deserialize_recurring",
        skip_serializing_if = "Option::is_none"
    )]
    pub recurring_rule: Option<RecurringRule>,
}

impl Task {
    pub fn new(id: &str, project_id: &str, date: NaiveDate, hours: Decimal) -> Self {
        Self {
            id: id.to_string(),
            project_id: project_id.to_string(),
            client_id: None,
            date,
            hours,
            title: String::new(),
            notes: String::new(),
            recurring_rule: None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.hours < Decimal::ZERO {
            return Err(Error::Validation(format!(
                "task {} has negative hours {}",
                self.id, self.hours
            )));
        }
        Ok(())
    }
}

/// The task form submits `""` for "not recurring".
fn deserialize_recurring<'de, D>(deserializer: D) -> std::result::Result<Option<RecurringRule>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    match value.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => s.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rates::{EffectiveDate, RateChangeEntry};

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_project_from_legacy_record() {
        let p: Project = serde_json::from_str(
            r##"{"id": "p1", "client_id": "c1", "name": "Site", "color": "#ff0000", "hourly_rate": 85}"##,
        )
        .unwrap();
        assert_eq!(p.rate_history.len(), 1);
        assert_eq!(p.rate_history.baseline().hourly_rate, dec("85"));
        assert!(!p.hidden);
        assert_eq!(p.version, 0);
    }

    #[test]
    fn test_project_rate_changes_win_over_flat_rate() {
        let p: Project = serde_json::from_str(
            r#"{"id": "p1", "client_id": "c1", "name": "Site", "hourly_rate": 85,
                "rate_changes": [{"hourly_rate": 50, "effective_date": null},
                                 {"hourly_rate": 60, "effective_date": "2024-06-01"}]}"#,
        )
        .unwrap();
        assert_eq!(p.rate_history.len(), 2);
        assert_eq!(p.rate_history.resolve(date(2024, 1, 1)), dec("50"));
    }

    #[test]
    fn test_project_without_rate_is_rejected() {
        let result: std::result::Result<Project, _> =
            serde_json::from_str(r#"{"id": "p1", "client_id": "c1", "name": "Site"}"#);
        let err = result.unwrap_err();
        assert!(err.to_string().contains("no hourly rate"));
    }

    #[test]
    fn test_project_serializes_rate_changes() {
        let p = Project::new("p1", "c1", "Site", RateHistory::flat(dec("40")).unwrap());
        let value = serde_json::to_value(&p).unwrap();
        assert_eq!(value["rate_changes"][0]["effective_date"], serde_json::Value::Null);
        assert!(value.get("hourly_rate").is_none());
        assert_eq!(value["hidden"], false);
    }

    #[test]
    fn test_replace_rate_history_checks_version() {
        let mut p = Project::new("p1", "c1", "Site", RateHistory::flat(dec("40")).unwrap());

        let mut edited = p.rate_history.clone();
        edited
            .add_entry(RateChangeEntry::on(date(2024, 6, 1), dec("45")))
            .unwrap();
        p.replace_rate_history(0, edited.clone()).unwrap();
        assert_eq!(p.version, 1);
        assert!(p
            .rate_history
            .get(&EffectiveDate::On(date(2024, 6, 1)))
            .is_some());

        // a second writer still holding version 0 must not clobber the change
        let stale = RateHistory::flat(dec("99")).unwrap();
        let err = p.replace_rate_history(0, stale).unwrap_err();
        assert!(matches!(
            err,
            Error::VersionConflict { expected: 0, actual: 1, .. }
        ));
        assert_eq!(p.rate_history, edited);
        assert_eq!(p.version, 1);
    }

    #[test]
    fn test_task_from_json() {
        let t: Task = serde_json::from_str(
            r#"{"id": "t1", "project_id": "p1", "client_id": "c1", "date": "2024-06-01",
                "hours": 1.5, "title": "Review", "notes": "", "recurring": "weekly"}"#,
        )
        .unwrap();
        assert_eq!(t.date, date(2024, 6, 1));
        assert_eq!(t.hours, dec("1.5"));
        assert_eq!(t.recurring_rule, Some(RecurringRule::Weekly));
    }

    #[test]
    fn test_task_empty_recurrence_is_none() {
        for recurring in [r#""""#, "null"] {
            let json = format!(
                r#"{{"id": "t1", "project_id": "p1", "date": "2024-06-01", "hours": 2, "recurring": {recurring}}}"#
            );
            let t: Task = serde_json::from_str(&json).unwrap();
            assert_eq!(t.recurring_rule, None);
        }
    }

    #[test]
    fn test_task_rejects_unknown_recurrence() {
        let result: std::result::Result<Task, _> = serde_json::from_str(
            r#"{"id": "t1", "project_id": "p1", "date": "2024-06-01", "hours": 2, "recurring": "yearly"}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_task_validate() {
        assert!(Task::new("t1", "p1", date(2024, 1, 1), Decimal::ZERO)
            .validate()
            .is_ok());
        let err = Task::new("t2", "p1", date(2024, 1, 1), dec("-0.5"))
            .validate()
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_client_logo_field_name() {
        let c: Client =
            serde_json::from_str(r#"{"id": "c1", "name": "Acme", "logo_path": "/api/logos/c1_a.png"}"#)
                .unwrap();
        assert_eq!(c.logo_ref.as_deref(), Some("/api/logos/c1_a.png"));
        assert_eq!(Client::new("c2", "Beta").logo_ref, None);
    }
}
