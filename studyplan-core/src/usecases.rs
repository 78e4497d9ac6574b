//! Task use-cases: the operations a learner performs on their own tasks.
//!
//! Each one loads through [`TaskRepository`], applies an owner-checked
//! transition, and writes back. Completion events are returned to the caller,
//! which hands them to [`crate::progression::ProgressionService::handle`].

use crate::availability::TimespanInMinutes;
use crate::error::{Result, UseCaseError};
use crate::ports::TaskRepository;
use crate::task::{ElapsedSeconds, Task, TaskEvent, TaskType};
use crate::time::CalendarDate;

async fn load<R: TaskRepository>(repo: &R, task_id: &str) -> Result<Task> {
    repo.task_of_id(task_id)
        .await?
        .ok_or_else(|| UseCaseError::TaskNotFound(task_id.to_string()))
}

/// Mark a task finished on `on`, optionally recording the seconds spent.
pub async fn complete_task<R: TaskRepository>(
    repo: &R,
    requester_id: &str,
    task_id: &str,
    on: CalendarDate,
    elapsed: Option<ElapsedSeconds>,
) -> Result<TaskEvent> {
    let mut task = load(repo, task_id).await?;
    if let Some(elapsed) = elapsed {
        task.set_elapsed_time(requester_id, elapsed)?;
    }
    let event = task.complete(requester_id, on)?;
    repo.save(&task).await?;
    tracing::debug!(task = %task_id, %on, "completed task");
    Ok(event)
}

pub async fn uncomplete_task<R: TaskRepository>(
    repo: &R,
    requester_id: &str,
    task_id: &str,
) -> Result<TaskEvent> {
    let mut task = load(repo, task_id).await?;
    let event = task.uncomplete(requester_id)?;
    repo.save(&task).await?;
    tracing::debug!(task = %task_id, "uncompleted task");
    Ok(event)
}

pub async fn record_elapsed_time<R: TaskRepository>(
    repo: &R,
    requester_id: &str,
    task_id: &str,
    seconds: i64,
) -> Result<Task> {
    let elapsed = ElapsedSeconds::new(seconds)?;
    let mut task = load(repo, task_id).await?;
    task.set_elapsed_time(requester_id, elapsed)?;
    repo.save(&task).await?;
    Ok(task)
}

/// Delete one of the requester's own tasks.
pub async fn remove_task<R: TaskRepository>(
    repo: &R,
    requester_id: &str,
    task_id: &str,
) -> Result<()> {
    let task = load(repo, task_id).await?;
    task.authorize_removal(requester_id)?;
    repo.delete(task_id).await?;
    tracing::debug!(task = %task_id, "removed task");
    Ok(())
}

/// Learner-initiated task outside the generated plan, due on `date`.
pub async fn create_extra_task<R: TaskRepository>(
    repo: &R,
    requester_id: &str,
    topic_id: &str,
    course_id: &str,
    task_type: TaskType,
    date: CalendarDate,
) -> Result<Task> {
    let task = Task::generated(requester_id, topic_id, course_id)
        .with_type(task_type)
        .with_planned_date(date)
        .with_estimate(TimespanInMinutes::default())
        .extra();
    repo.create(task.clone()).await?;
    tracing::debug!(task = %task.id, topic = %topic_id, %date, "created extra task");
    Ok(task)
}

/// Seed a course: one cycle-0 study task per topic that has no task yet.
pub async fn enroll<R: TaskRepository>(
    repo: &R,
    user_id: &str,
    course_id: &str,
    topic_ids: &[String],
) -> Result<Vec<Task>> {
    let existing = repo.topics_with_tasks(user_id, course_id).await?;

    let mut created = Vec::new();
    for topic_id in topic_ids {
        if existing.contains(topic_id) || created.iter().any(|t: &Task| &t.topic_id == topic_id) {
            continue;
        }
        let task = Task::generated(user_id, topic_id, course_id);
        repo.create(task.clone()).await?;
        created.push(task);
    }

    tracing::debug!(
        user = %user_id,
        course = %course_id,
        topics = topic_ids.len(),
        created = created.len(),
        "enrolled"
    );
    Ok(created)
}
