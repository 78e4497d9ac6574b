//! Collaborator traits: where tasks and subject status come from.
//!
//! The engine never persists anything itself. Real adapters (document store,
//! course catalogue) live outside this crate; [`crate::store::InMemoryStore`]
//! implements both traits for the CLI and tests.

#![allow(async_fn_in_trait)]

use anyhow::Result;

use crate::status::UserSubjectsStatus;
use crate::task::{Task, TaskTypeSet};

pub trait TaskRepository {
    async fn tasks_of_user(&self, user_id: &str, course_id: &str) -> Result<Vec<Task>>;

    async fn task_of_id(&self, task_id: &str) -> Result<Option<Task>>;

    async fn create(&self, task: Task) -> Result<()>;

    /// Replace the stored task with the same id.
    async fn save(&self, task: &Task) -> Result<()>;

    /// Drop the task with this id; unknown ids are an error.
    async fn delete(&self, task_id: &str) -> Result<()>;

    /// Topics of `course_id` that already hold at least one task for `user_id`.
    async fn topics_with_tasks(&self, user_id: &str, course_id: &str) -> Result<Vec<String>>;
}

pub trait SubjectStatusSource {
    async fn subjects_status(&self, user_id: &str, course_id: &str) -> Result<UserSubjectsStatus>;

    /// Enabled task types for a topic; `None` when nothing is configured for it.
    async fn topic_task_types(&self, user_id: &str, topic_id: &str) -> Result<Option<TaskTypeSet>>;
}
