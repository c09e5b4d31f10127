pub mod types;

pub use types::*;

use rust_decimal::Decimal;

use crate::model::{Project, Task};
use crate::rates;

/// Compute hours and billing for `project`.
///
/// Tasks for other projects are skipped. Each task bills at the rate in force
/// on its own date. Visibility is not checked here: a hidden project's metrics
/// are computed like any other.
pub fn compute_metrics<'a>(
    tasks: impl IntoIterator<Item = &'a Task>,
    project: &Project,
) -> ProjectMetrics {
    let mut task_count = 0u64;
    let mut hours = Decimal::ZERO;
    let mut billing = Decimal::ZERO;

    for task in tasks.into_iter().filter(|t| t.project_id == project.id) {
        task_count += 1;
        hours += task.hours;
        billing += task_billing(task, project);
    }

    ProjectMetrics {
        project_id: project.id.clone(),
        project_name: project.name.clone(),
        task_count,
        hours,
        billing,
    }
}

/// The hourly rate `task` bills at.
pub fn resolve_task_rate(task: &Task, project: &Project) -> Decimal {
    rates::resolve(&project.rate_history, task.date)
}

/// `hours * rate` for a single task.
pub fn task_billing(task: &Task, project: &Project) -> Decimal {
    task.hours * resolve_task_rate(task, project)
}
