//! Study task model.
//!
//! Tasks are plain serializable records. Storage lives behind
//! [`crate::ports::TaskRepository`]; the only state transitions a task knows
//! about are complete/uncomplete, and both are reserved to its owner.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::availability::TimespanInMinutes;
use crate::error::{TaskError, ValueError};
use crate::time::CalendarDate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TaskType {
    Study,
    LawStudy,
    Exercise,
    Review,
}

impl TaskType {
    pub const ALL: [TaskType; 4] = [
        TaskType::Study,
        TaskType::LawStudy,
        TaskType::Exercise,
        TaskType::Review,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskType::Study => "study",
            TaskType::LawStudy => "lawStudy",
            TaskType::Exercise => "exercise",
            TaskType::Review => "review",
        }
    }

    /// This type's bit in a [`TaskTypeSet`] mask.
    pub const fn bit(self) -> u8 {
        match self {
            TaskType::Study => 0b0001,
            TaskType::LawStudy => 0b0010,
            TaskType::Exercise => 0b0100,
            TaskType::Review => 0b1000,
        }
    }
}

impl FromStr for TaskType {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TaskType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ValueError::InvalidTaskType(s.to_string()))
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Set of task types enabled for a topic, stored as a 4-bit mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "Vec<TaskType>", into = "Vec<TaskType>")]
pub struct TaskTypeSet(u8);

impl TaskTypeSet {
    pub const EMPTY: TaskTypeSet = TaskTypeSet(0);
    pub const ALL: TaskTypeSet = TaskTypeSet(0b1111);

    pub fn of(types: &[TaskType]) -> Self {
        types.iter().copied().collect()
    }

    pub fn contains(&self, t: TaskType) -> bool {
        self.0 & t.bit() != 0
    }

    pub fn with(self, t: TaskType) -> Self {
        Self(self.0 | t.bit())
    }

    pub fn without(self, t: TaskType) -> Self {
        Self(self.0 & !t.bit())
    }

    pub fn bits(&self) -> u8 {
        self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = TaskType> {
        let set = *self;
        TaskType::ALL.into_iter().filter(move |t| set.contains(*t))
    }
}

impl FromIterator<TaskType> for TaskTypeSet {
    fn from_iter<I: IntoIterator<Item = TaskType>>(iter: I) -> Self {
        iter.into_iter().fold(Self::EMPTY, TaskTypeSet::with)
    }
}

impl From<Vec<TaskType>> for TaskTypeSet {
    fn from(types: Vec<TaskType>) -> Self {
        types.into_iter().collect()
    }
}

impl From<TaskTypeSet> for Vec<TaskType> {
    fn from(set: TaskTypeSet) -> Self {
        set.iter().collect()
    }
}

/// Seconds actually spent on a task; always positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u32")]
pub struct ElapsedSeconds(u32);

impl ElapsedSeconds {
    pub fn new(seconds: i64) -> Result<Self, ValueError> {
        match u32::try_from(seconds) {
            Ok(s) if s > 0 => Ok(Self(s)),
            _ => Err(ValueError::InvalidElapsedTime(seconds)),
        }
    }

    pub fn seconds(&self) -> u32 {
        self.0
    }
}

impl TryFrom<i64> for ElapsedSeconds {
    type Error = ValueError;

    fn try_from(seconds: i64) -> Result<Self, Self::Error> {
        Self::new(seconds)
    }
}

impl From<ElapsedSeconds> for u32 {
    fn from(e: ElapsedSeconds) -> Self {
        e.0
    }
}

/// A unit of study work on one topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub owner_id: String,
    pub topic_id: String,
    pub course_id: String,

    #[serde(rename = "type")]
    pub task_type: TaskType,

    /// Added by the learner outside the generated plan.
    #[serde(default)]
    pub is_extra: bool,

    /// Spaced-repetition round; only ever grows along a progression chain.
    #[serde(default)]
    pub cycle: u32,

    #[serde(default)]
    pub planned_date: Option<CalendarDate>,

    #[serde(default)]
    pub completed_on: Option<CalendarDate>,

    #[serde(default)]
    pub finished: bool,

    #[serde(default)]
    pub elapsed_time: Option<ElapsedSeconds>,

    #[serde(default)]
    pub estimated_time_to_complete: TimespanInMinutes,
}

/// Emitted by the owner-only state transitions.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskEvent {
    Completed(Task),
    Uncompleted(Task),
}

impl TaskEvent {
    pub fn task(&self) -> &Task {
        match self {
            TaskEvent::Completed(t) | TaskEvent::Uncompleted(t) => t,
        }
    }
}

impl Task {
    pub fn new(
        id: impl Into<String>,
        owner_id: impl Into<String>,
        topic_id: impl Into<String>,
        course_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            owner_id: owner_id.into(),
            topic_id: topic_id.into(),
            course_id: course_id.into(),
            task_type: TaskType::Study,
            is_extra: false,
            cycle: 0,
            planned_date: None,
            completed_on: None,
            finished: false,
            elapsed_time: None,
            estimated_time_to_complete: TimespanInMinutes::default(),
        }
    }

    /// New task with a freshly generated id.
    pub fn generated(
        owner_id: impl Into<String>,
        topic_id: impl Into<String>,
        course_id: impl Into<String>,
    ) -> Self {
        Self::new(uuid::Uuid::new_v4().to_string(), owner_id, topic_id, course_id)
    }

    pub fn with_type(mut self, task_type: TaskType) -> Self {
        self.task_type = task_type;
        self
    }

    pub fn with_cycle(mut self, cycle: u32) -> Self {
        self.cycle = cycle;
        self
    }

    pub fn with_planned_date(mut self, date: CalendarDate) -> Self {
        self.planned_date = Some(date);
        self
    }

    pub fn with_estimate(mut self, estimate: TimespanInMinutes) -> Self {
        self.estimated_time_to_complete = estimate;
        self
    }

    pub fn extra(mut self) -> Self {
        self.is_extra = true;
        self
    }

    /// Mark as finished on `date` without an ownership check (fixtures, imports).
    pub fn completed(mut self, date: CalendarDate) -> Self {
        self.finished = true;
        self.completed_on = Some(date);
        self
    }

    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.owner_id == user_id
    }

    pub fn is_completed(&self) -> bool {
        self.finished && self.completed_on.is_some()
    }

    pub fn is_extra(&self) -> bool {
        self.is_extra
    }

    pub fn complete(&mut self, requester_id: &str, on: CalendarDate) -> Result<TaskEvent, TaskError> {
        self.ensure_owner(requester_id)?;
        self.finished = true;
        self.completed_on = Some(on);
        Ok(TaskEvent::Completed(self.clone()))
    }

    pub fn uncomplete(&mut self, requester_id: &str) -> Result<TaskEvent, TaskError> {
        self.ensure_owner(requester_id)?;
        if !self.is_completed() {
            return Err(TaskError::AlreadyIncomplete(self.id.clone()));
        }
        self.finished = false;
        self.completed_on = None;
        Ok(TaskEvent::Uncompleted(self.clone()))
    }

    pub fn set_elapsed_time(&mut self, requester_id: &str, elapsed: ElapsedSeconds) -> Result<(), TaskError> {
        self.ensure_owner(requester_id)?;
        self.elapsed_time = Some(elapsed);
        Ok(())
    }

    /// Only the owner may delete a task; nothing else is checked.
    pub fn authorize_removal(&self, requester_id: &str) -> Result<(), TaskError> {
        self.ensure_owner(requester_id)
    }

    fn ensure_owner(&self, requester_id: &str) -> Result<(), TaskError> {
        if self.is_owned_by(requester_id) {
            Ok(())
        } else {
            Err(TaskError::Unauthorized {
                requester: requester_id.to_string(),
                task_id: self.id.clone(),
            })
        }
    }
}
