use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use studyplan_core::{
    CalendarDate, InMemoryStore, StudyAvailability, Task, TaskRepository, UserSubjectsStatus,
};

/// `$STUDYPLAN_HOME`, or `~/.studyplan`.
pub fn studyplan_home() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("STUDYPLAN_HOME") {
        return Ok(PathBuf::from(dir));
    }
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home).join(".studyplan"))
}

pub fn ensure_studyplan_home() -> Result<PathBuf> {
    let dir = studyplan_home()?;
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}

pub fn default_snapshot_path() -> Result<PathBuf> {
    Ok(ensure_studyplan_home()?.join("snapshot.json"))
}

/// One learner's course: everything the engine needs, in one JSON file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub user_id: String,
    pub course_id: String,
    /// Falls back to the config file's `[availability]` when absent.
    #[serde(default)]
    pub availability: Option<StudyAvailability>,
    #[serde(default)]
    pub preferred_start_date: Option<CalendarDate>,
    pub status: UserSubjectsStatus,
    #[serde(default)]
    pub tasks: Vec<Task>,
}

impl Snapshot {
    pub fn empty(user_id: &str, course_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            course_id: course_id.to_string(),
            availability: None,
            preferred_start_date: None,
            status: UserSubjectsStatus::new(user_id, course_id),
            tasks: Vec::new(),
        }
    }

    pub fn store(&self) -> InMemoryStore {
        InMemoryStore::new(self.tasks.clone(), vec![self.status.clone()])
    }

    /// Pull this learner's tasks back out of `store` after a mutation.
    pub async fn sync_from(&mut self, store: &InMemoryStore) -> Result<()> {
        self.tasks = store.tasks_of_user(&self.user_id, &self.course_id).await?;
        Ok(())
    }
}

pub fn read_snapshot(path: &Path) -> Result<Snapshot> {
    let s = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    serde_json::from_str(&s).with_context(|| format!("parse {}", path.display()))
}

pub fn write_snapshot(path: &Path, snapshot: &Snapshot) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(snapshot)?;
    fs::write(path, json).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}
