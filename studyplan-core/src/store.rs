//! In-memory task repository and status source.

use std::sync::{Mutex, MutexGuard};

use anyhow::{anyhow, Result};

use crate::ports::{SubjectStatusSource, TaskRepository};
use crate::status::UserSubjectsStatus;
use crate::task::{Task, TaskTypeSet};

/// Tasks and statuses held in process memory.
///
/// Tasks keep insertion order, which is the "input order" the ranker falls
/// back to on ties.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    tasks: Mutex<Vec<Task>>,
    statuses: Mutex<Vec<UserSubjectsStatus>>,
}

fn locked<T>(m: &Mutex<T>) -> Result<MutexGuard<'_, T>> {
    m.lock().map_err(|_| anyhow!("in-memory store lock poisoned"))
}

impl InMemoryStore {
    pub fn new(tasks: Vec<Task>, statuses: Vec<UserSubjectsStatus>) -> Self {
        Self {
            tasks: Mutex::new(tasks),
            statuses: Mutex::new(statuses),
        }
    }

    /// Copy of every stored task, in insertion order.
    pub fn all_tasks(&self) -> Result<Vec<Task>> {
        Ok(locked(&self.tasks)?.clone())
    }
}

impl TaskRepository for InMemoryStore {
    async fn tasks_of_user(&self, user_id: &str, course_id: &str) -> Result<Vec<Task>> {
        Ok(locked(&self.tasks)?
            .iter()
            .filter(|t| t.owner_id == user_id && t.course_id == course_id)
            .cloned()
            .collect())
    }

    async fn task_of_id(&self, task_id: &str) -> Result<Option<Task>> {
        Ok(locked(&self.tasks)?.iter().find(|t| t.id == task_id).cloned())
    }

    async fn create(&self, task: Task) -> Result<()> {
        let mut tasks = locked(&self.tasks)?;
        if tasks.iter().any(|t| t.id == task.id) {
            return Err(anyhow!("task '{}' already exists", task.id));
        }
        tasks.push(task);
        Ok(())
    }

    async fn save(&self, task: &Task) -> Result<()> {
        let mut tasks = locked(&self.tasks)?;
        let slot = tasks
            .iter_mut()
            .find(|t| t.id == task.id)
            .ok_or_else(|| anyhow!("task '{}' does not exist", task.id))?;
        *slot = task.clone();
        Ok(())
    }

    async fn delete(&self, task_id: &str) -> Result<()> {
        let mut tasks = locked(&self.tasks)?;
        let index = tasks
            .iter()
            .position(|t| t.id == task_id)
            .ok_or_else(|| anyhow!("task '{}' does not exist", task_id))?;
        tasks.remove(index);
        Ok(())
    }

    async fn topics_with_tasks(&self, user_id: &str, course_id: &str) -> Result<Vec<String>> {
        let tasks = locked(&self.tasks)?;
        let mut topics: Vec<String> = Vec::new();
        for t in tasks
            .iter()
            .filter(|t| t.owner_id == user_id && t.course_id == course_id)
        {
            if !topics.contains(&t.topic_id) {
                topics.push(t.topic_id.clone());
            }
        }
        Ok(topics)
    }
}

impl SubjectStatusSource for InMemoryStore {
    async fn subjects_status(&self, user_id: &str, course_id: &str) -> Result<UserSubjectsStatus> {
        let statuses = locked(&self.statuses)?;
        Ok(statuses
            .iter()
            .find(|s| s.user_id == user_id && s.course_id == course_id)
            .cloned()
            .unwrap_or_else(|| UserSubjectsStatus::new(user_id, course_id)))
    }

    async fn topic_task_types(&self, user_id: &str, topic_id: &str) -> Result<Option<TaskTypeSet>> {
        let statuses = locked(&self.statuses)?;
        Ok(statuses
            .iter()
            .filter(|s| s.user_id == user_id)
            .find_map(|s| s.enabled_task_types(topic_id)))
    }
}
