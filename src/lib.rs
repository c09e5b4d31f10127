//! Rate history resolution and billing aggregation.
//!
//! Clients own projects, projects accumulate logged tasks, and each project
//! bills at an hourly rate that can change over time. This crate answers three
//! questions, all as pure functions over already-loaded records:
//!
//! - which rate applied on a given date ([`RateHistory::resolve`]),
//! - what one project's tasks add up to ([`compute_metrics`]),
//! - what the visible projects add up to per client and overall ([`aggregate`]).

pub mod aggregate;
pub mod config;
pub mod date_util;
pub mod error;
pub mod metrics;
pub mod model;
pub mod query;
pub mod rates;
pub mod store;

pub use aggregate::{aggregate, ClientSummary, Summary};
pub use config::Config;
pub use error::{Error, Result};
pub use metrics::{compute_metrics, ProjectMetrics, Totals};
pub use model::{Client, Project, RecurringRule, Task};
pub use query::filter::{eligible_projects, Filter};
pub use query::period::Period;
pub use rates::{resolve, EffectiveDate, RateChangeEntry, RateHistory, RawRateChange, RawRateHistory};
pub use store::{DataDir, Dataset};
