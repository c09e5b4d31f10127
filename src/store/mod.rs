//! Read-only access to the JSON data directory kept by the storage collaborator.
//!
//! Layout:
//!
//! ```text
//! <root>/clients.json
//! <root>/projects.json
//! <root>/months/<year>_<month>.json    e.g. months/2024_6.json
//! ```
//!
//! Missing files read as empty. Nothing here writes to disk.

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::aggregate::{aggregate, Summary};
use crate::date_util::months_between;
use crate::error::{Error, Result};
use crate::model::{Client, Project, Task};
use crate::query::filter::Filter;
use crate::query::period::Period;

/// A month file; its cached `summary` block is ignored and recomputed.
#[derive(Debug, Default, Deserialize)]
struct MonthFile {
    #[serde(default)]
    tasks: Vec<Task>,
}

#[derive(Debug, Clone)]
pub struct DataDir {
    root: PathBuf,
}

impl DataDir {
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.is_dir() {
            return Err(Error::Config(format!(
                "data directory {} does not exist",
                root.display()
            )));
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn load_clients(&self) -> Result<Vec<Client>> {
        read_json(&self.root.join("clients.json"))
    }

    pub fn load_projects(&self) -> Result<Vec<Project>> {
        read_json(&self.root.join("projects.json"))
    }

    /// Tasks stored for one calendar month.
    pub fn load_month(&self, year: i32, month: u32) -> Result<Vec<Task>> {
        let path = self.root.join("months").join(format!("{year}_{month}.json"));
        let file: MonthFile = read_json(&path)?;
        for task in &file.tasks {
            task.validate()?;
        }
        Ok(file.tasks)
    }

    /// Tasks dated within `period`, across however many month files it spans.
    pub fn load_tasks(&self, period: &Period) -> Result<Vec<Task>> {
        let (start, end) = period.date_range()?;
        let mut tasks = Vec::new();
        for (year, month) in months_between(start, end) {
            tasks.extend(
                self.load_month(year, month)?
                    .into_iter()
                    .filter(|t| start <= t.date && t.date <= end),
            );
        }
        Ok(tasks)
    }

    pub fn load(&self, period: &Period) -> Result<Dataset> {
        Ok(Dataset {
            clients: self.load_clients()?,
            projects: self.load_projects()?,
            tasks: self.load_tasks(period)?,
        })
    }
}

/// Everything needed to answer summary queries for a period.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub clients: Vec<Client>,
    pub projects: Vec<Project>,
    pub tasks: Vec<Task>,
}

impl Dataset {
    pub fn summary(&self, filter: &Filter) -> Summary {
        aggregate(&self.tasks, &self.projects, &self.clients, filter)
    }

    pub fn project(&self, id: &str) -> Result<&Project> {
        self.projects
            .iter()
            .find(|p| p.id == id)
            .ok_or_else(|| Error::NotFound(format!("project {id}")))
    }
}

fn read_json<T: DeserializeOwned + Default>(path: &Path) -> Result<T> {
    if !path.exists() {
        log::debug!("{} not found, treating as empty", path.display());
        return Ok(T::default());
    }
    log::debug!("Loading {}", path.display());
    let bytes = std::fs::read(path)?;
    serde_json::from_slice(&bytes).map_err(|e| {
        log::error!("Failed to parse {}: {e}", path.display());
        Error::Json(e)
    })
}
