use serde::{Deserialize, Serialize};

use crate::model::Project;

/// Optional client and project scoping for a summary.
///
/// Both may be set; a project must then match both.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    #[serde(default, rename = "client", skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(default, rename = "project", skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn client(mut self, id: &str) -> Self {
        self.client_id = Some(id.to_string());
        self
    }

    pub fn project(mut self, id: &str) -> Self {
        self.project_id = Some(id.to_string());
        self
    }

    /// Whether `project` is included in aggregated totals under this filter.
    pub fn admits(&self, project: &Project) -> bool {
        if project.hidden {
            return false;
        }
        if let Some(ref id) = self.project_id {
            if project.id != *id {
                return false;
            }
        }
        if let Some(ref id) = self.client_id {
            if project.client_id != *id {
                return false;
            }
        }
        true
    }

    /// Whether tasks for a project id with no project record are included.
    /// They have no known client, so any client scope excludes them.
    pub fn admits_unknown_project(&self, project_id: &str) -> bool {
        self.client_id.is_none() && self.project_id.as_deref().map_or(true, |id| id == project_id)
    }
}

/// Projects that survive `filter`: hidden projects are always dropped, then
/// the project and client scopes are applied.
pub fn eligible_projects<'a>(all_projects: &'a [Project], filter: &Filter) -> Vec<&'a Project> {
    all_projects.iter().filter(|p| filter.admits(p)).collect()
}
