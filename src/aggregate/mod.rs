//! Roll project metrics up to clients and a grand total.

use std::collections::{BTreeMap, HashMap, HashSet};

use rust_decimal::Decimal;
use serde::Serialize;

use crate::metrics::{compute_metrics, ProjectMetrics, Totals};
use crate::model::{Client, Project, Task};
use crate::query::filter::{eligible_projects, Filter};

pub const UNKNOWN_CLIENT: &str = "Unknown Client";
pub const UNKNOWN_PROJECT: &str = "Unknown Project";

/// Eligible projects of one client, with their combined totals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClientSummary {
    pub client_id: String,
    /// `None` when no client record exists for `client_id`.
    pub client_name: Option<String>,
    pub projects: Vec<ProjectMetrics>,
    pub totals: Totals,
}

impl ClientSummary {
    pub fn is_unknown(&self) -> bool {
        self.client_name.is_none()
    }

    pub fn display_name(&self) -> &str {
        self.client_name.as_deref().unwrap_or(UNKNOWN_CLIENT)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Summary {
    /// One entry per client, in order of first appearance among the eligible projects.
    pub clients: Vec<ClientSummary>,
    pub totals: Totals,
}

impl Summary {
    pub fn client(&self, client_id: &str) -> Option<&ClientSummary> {
        self.clients.iter().find(|c| c.client_id == client_id)
    }

    pub fn project(&self, project_id: &str) -> Option<&ProjectMetrics> {
        self.clients
            .iter()
            .flat_map(|c| c.projects.iter())
            .find(|p| p.project_id == project_id)
    }
}

/// Summarize `tasks` over the projects `filter` admits, grouped by client.
///
/// Projects whose client is missing from `clients` land in a bucket with no
/// client name rather than being dropped. Tasks whose project is missing from
/// `all_projects` are grouped by project id under a final unknown client with
/// an empty id; their hours count, but they bill nothing.
pub fn aggregate<'a>(
    tasks: impl IntoIterator<Item = &'a Task>,
    all_projects: &[Project],
    clients: &[Client],
    filter: &Filter,
) -> Summary {
    let mut tasks_by_project: HashMap<&str, Vec<&Task>> = HashMap::new();
    for task in tasks {
        tasks_by_project
            .entry(task.project_id.as_str())
            .or_default()
            .push(task);
    }

    let known_projects: HashSet<&str> = all_projects.iter().map(|p| p.id.as_str()).collect();
    let orphaned: BTreeMap<&str, &Vec<&Task>> = tasks_by_project
        .iter()
        .filter(|(id, _)| !known_projects.contains(**id))
        .map(|(id, ts)| (*id, ts))
        .collect();
    if !orphaned.is_empty() {
        let count: usize = orphaned.values().map(|ts| ts.len()).sum();
        log::warn!("{count} tasks reference unknown projects; counting hours without billing");
    }

    let client_names: HashMap<&str, &str> = clients
        .iter()
        .map(|c| (c.id.as_str(), c.name.as_str()))
        .collect();

    let mut summary = Summary::default();
    let mut client_index: HashMap<&str, usize> = HashMap::new();

    for project in eligible_projects(all_projects, filter) {
        let metrics = compute_metrics(
            tasks_by_project
                .get(project.id.as_str())
                .into_iter()
                .flatten()
                .copied(),
            project,
        );

        let idx = *client_index
            .entry(project.client_id.as_str())
            .or_insert_with(|| {
                let client_name = client_names
                    .get(project.client_id.as_str())
                    .map(|name| name.to_string());
                if client_name.is_none() {
                    log::warn!(
                        "Project {} references unknown client {}",
                        project.id,
                        project.client_id
                    );
                }
                summary.clients.push(ClientSummary {
                    client_id: project.client_id.clone(),
                    client_name,
                    projects: Vec::new(),
                    totals: Totals::default(),
                });
                summary.clients.len() - 1
            });

        let bucket = &mut summary.clients[idx];
        bucket.totals += metrics.totals();
        summary.totals += metrics.totals();
        bucket.projects.push(metrics);
    }

    let mut unknown = ClientSummary {
        client_id: String::new(),
        client_name: None,
        projects: Vec::new(),
        totals: Totals::default(),
    };
    for (project_id, tasks) in orphaned {
        if !filter.admits_unknown_project(project_id) {
            continue;
        }
        let metrics = ProjectMetrics {
            project_id: project_id.to_string(),
            project_name: UNKNOWN_PROJECT.to_string(),
            task_count: tasks.len() as u64,
            hours: tasks.iter().map(|t| t.hours).sum(),
            billing: Decimal::ZERO,
        };
        unknown.totals += metrics.totals();
        unknown.projects.push(metrics);
    }
    if !unknown.projects.is_empty() {
        summary.totals += unknown.totals;
        summary.clients.push(unknown);
    }

    log::debug!(
        "Aggregated {} clients: {} hours, {} billed",
        summary.clients.len(),
        summary.totals.hours,
        summary.totals.billing
    );
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rates::{RateChangeEntry, RateHistory};
    use chrono::NaiveDate;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn project(id: &str, client_id: &str, rate: &str) -> Project {
        Project::new(id, client_id, id, RateHistory::flat(dec(rate)).unwrap())
    }

    fn fixture() -> (Vec<Client>, Vec<Project>, Vec<Task>) {
        let clients = vec![Client::new("c1", "Acme"), Client::new("c2", "Globex")];

        let mut raised = project("p1", "c1", "50");
        raised
            .rate_history
            .add_entry(RateChangeEntry::on(date(2024, 6, 1), dec("60")))
            .unwrap();
        let mut hidden = project("p4", "c2", "100");
        hidden.hidden = true;

        let projects = vec![
            raised,
            project("p2", "c2", "80"),
            project("p3", "c1", "40"),
            hidden,
            project("p5", "gone", "10"),
        ];

        let tasks = vec![
            Task::new("a", "p1", date(2024, 5, 15), dec("4")),
            Task::new("b", "p1", date(2024, 6, 1), dec("2")),
            Task::new("c", "p2", date(2024, 6, 3), dec("1.5")),
            Task::new("d", "p3", date(2024, 6, 4), dec("0.5")),
            Task::new("e", "p4", date(2024, 6, 5), dec("8")),
            Task::new("f", "p5", date(2024, 6, 6), dec("3")),
            Task::new("g", "nope", date(2024, 6, 7), dec("5")),
        ];

        (clients, projects, tasks)
    }

    #[test]
    fn test_groups_by_client_in_first_seen_order() {
        let (clients, projects, tasks) = fixture();
        let s = aggregate(&tasks, &projects, &clients, &Filter::new());

        let ids: Vec<&str> = s.clients.iter().map(|c| c.client_id.as_str()).collect();
        assert_eq!(ids, vec!["c1", "c2", "gone", ""]);

        let acme = s.client("c1").unwrap();
        assert_eq!(acme.display_name(), "Acme");
        let project_ids: Vec<&str> = acme.projects.iter().map(|p| p.project_id.as_str()).collect();
        assert_eq!(project_ids, vec!["p1", "p3"]);
        assert_eq!(acme.totals.hours, dec("6.5"));
        assert_eq!(acme.totals.billing, dec("340"));
    }

    #[test]
    fn test_totals_and_hidden_exclusion() {
        let (clients, projects, tasks) = fixture();
        let s = aggregate(&tasks, &projects, &clients, &Filter::new());

        // p1 320 + p2 120 + p3 20 + p5 30; hidden p4 excluded, orphan task g unbilled
        assert_eq!(s.totals.hours, dec("16"));
        assert_eq!(s.totals.billing, dec("490"));
        assert!(s.project("p4").is_none());

        // the hidden project's own metrics are still computable directly
        let hidden = projects.iter().find(|p| p.id == "p4").unwrap();
        assert_eq!(compute_metrics(&tasks, hidden).billing, dec("800"));
    }

    #[test]
    fn test_unknown_client_bucket() {
        let (clients, projects, tasks) = fixture();
        let s = aggregate(&tasks, &projects, &clients, &Filter::new());

        let orphan = s.client("gone").unwrap();
        assert!(orphan.is_unknown());
        assert_eq!(orphan.display_name(), UNKNOWN_CLIENT);
        assert_eq!(orphan.totals.billing, dec("30"));
    }

    #[test]
    fn test_tasks_for_missing_projects_keep_their_hours() {
        let (clients, projects, tasks) = fixture();
        let s = aggregate(&tasks, &projects, &clients, &Filter::new());

        let unknown = s.clients.last().unwrap();
        assert!(unknown.is_unknown());
        assert_eq!(unknown.client_id, "");
        assert_eq!(unknown.projects.len(), 1);

        let orphan = s.project("nope").unwrap();
        assert_eq!(orphan.project_name, UNKNOWN_PROJECT);
        assert_eq!(orphan.task_count, 1);
        assert_eq!(orphan.hours, dec("5"));
        assert!(orphan.billing.is_zero());
        assert_eq!(unknown.totals.hours, dec("5"));
    }

    #[test]
    fn test_missing_project_alone_still_counts() {
        let projects = vec![project("p1", "c1", "50")];
        let tasks = vec![
            Task::new("a", "p1", date(2024, 6, 1), dec("1")),
            Task::new("b", "deleted", date(2024, 6, 2), dec("5")),
        ];
        let clients = vec![Client::new("c1", "Acme")];

        let s = aggregate(&tasks, &projects, &clients, &Filter::new());
        assert_eq!(s.clients.len(), 2);
        assert_eq!(s.totals.hours, dec("6"));
        assert_eq!(s.totals.billing, dec("50"));

        // scoped to a client, the unattributable task drops out
        let scoped = aggregate(&tasks, &projects, &clients, &Filter::new().client("c1"));
        assert_eq!(scoped.totals.hours, dec("1"));
        assert!(scoped.project("deleted").is_none());
    }

    #[test]
    fn test_client_totals_sum_to_grand_total() {
        let (clients, projects, tasks) = fixture();
        let s = aggregate(&tasks, &projects, &clients, &Filter::new());
        let summed: Totals = s.clients.iter().map(|c| c.totals).sum();
        assert_eq!(summed, s.totals);
    }

    #[test]
    fn test_filter_by_client_and_project() {
        let (clients, projects, tasks) = fixture();

        let s = aggregate(&tasks, &projects, &clients, &Filter::new().client("c1"));
        assert_eq!(s.clients.len(), 1);
        assert_eq!(s.totals.billing, dec("340"));

        let s = aggregate(&tasks, &projects, &clients, &Filter::new().client("c1").project("p3"));
        assert_eq!(s.totals.billing, dec("20"));

        let s = aggregate(&tasks, &projects, &clients, &Filter::new().client("c2").project("p3"));
        assert!(s.clients.is_empty());
        assert_eq!(s.totals, Totals::default());
    }

    #[test]
    fn test_projects_without_tasks_report_zero() {
        let (clients, projects, _) = fixture();
        let s = aggregate(std::iter::empty(), &projects, &clients, &Filter::new());
        assert_eq!(s.clients.len(), 3);
        assert!(s
            .clients
            .iter()
            .flat_map(|c| c.projects.iter())
            .all(|p| p.task_count == 0 && p.billing.is_zero()));
    }

    #[test]
    fn test_additive_over_task_partitions() {
        let (clients, projects, tasks) = fixture();
        let filter = Filter::new();
        let whole = aggregate(&tasks, &projects, &clients, &filter);

        for split in 0..=tasks.len() {
            let (left, right) = tasks.split_at(split);
            let l = aggregate(left, &projects, &clients, &filter);
            let r = aggregate(right, &projects, &clients, &filter);
            assert_eq!(l.totals + r.totals, whole.totals, "split at {split}");
        }

        // interleaved partition
        let evens: Vec<&Task> = tasks.iter().step_by(2).collect();
        let odds: Vec<&Task> = tasks.iter().skip(1).step_by(2).collect();
        let l = aggregate(evens, &projects, &clients, &filter);
        let r = aggregate(odds, &projects, &clients, &filter);
        assert_eq!(l.totals + r.totals, whole.totals);
    }
}
