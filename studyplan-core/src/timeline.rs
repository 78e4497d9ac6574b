//! Daily timeline builder.
//!
//! Walks a date range day by day and assigns pending tasks to days:
//!
//! - past days replay what was actually completed on them
//! - today replays today's completions, packs the remaining capacity, then
//!   drops every pending extra task onto today
//! - future days only pack the weekday's full availability; completions
//!   dated after today are never shown
//!
//! Packing pops tasks off one shared ranked queue. A subject gets at most one
//! regular task per day; tasks whose subject is taken wait for a later day,
//! keeping their place at the head of the queue.

use std::collections::{HashMap, HashSet, VecDeque};

use serde::Serialize;

use crate::availability::{StudyAvailability, TimespanInMinutes};
use crate::ranking::rank_tasks;
use crate::status::UserSubjectsStatus;
use crate::task::Task;
use crate::time::{CalendarDate, DateRange};

/// A task placed on a day of the timeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlannedTask {
    pub date: CalendarDate,
    /// Task data with `planned_date` set to `date`.
    pub task: Task,
}

impl PlannedTask {
    fn new(task: &Task, date: CalendarDate) -> Self {
        let mut task = task.clone();
        task.planned_date = Some(date);
        Self { date, task }
    }
}

/// Subject a task counts against for the one-per-day rule.
///
/// Tasks on topics missing from the status all share the `None` subject.
pub type SubjectKey<'s> = Option<&'s str>;

/// topic id -> subject id, built once per timeline request.
#[derive(Debug, Clone, Default)]
pub struct SubjectLookup<'s>(HashMap<&'s str, &'s str>);

impl<'s> SubjectLookup<'s> {
    pub fn from_status(status: &'s UserSubjectsStatus) -> Self {
        Self(status.subject_by_topic())
    }

    pub fn subject_of(&self, task: &Task) -> SubjectKey<'s> {
        self.0.get(task.topic_id.as_str()).copied()
    }
}

/// Fill one day from the front of `queue`.
///
/// A task is assigned as soon as it is popped, so the last task of a day may
/// overdraw `capacity`; the next pop sees a non-positive balance and stops.
/// Returns the day's tasks and the queue for the following day: tasks skipped
/// for a taken subject (in order), then every task never reached.
pub fn pack_day<'a, 's>(
    capacity: TimespanInMinutes,
    mut queue: VecDeque<&'a Task>,
    mut touched: HashSet<SubjectKey<'s>>,
    subjects: &SubjectLookup<'s>,
) -> (Vec<&'a Task>, VecDeque<&'a Task>) {
    let mut remaining = i64::from(capacity.minutes());
    let mut scheduled = Vec::new();
    let mut carried = VecDeque::new();

    while remaining > 0 {
        let Some(task) = queue.pop_front() else { break };
        let subject = subjects.subject_of(task);

        if touched.contains(&subject) {
            carried.push_back(task);
            continue;
        }

        touched.insert(subject);
        remaining -= i64::from(task.estimated_time_to_complete.minutes());
        scheduled.push(task);
    }

    carried.extend(queue);
    (scheduled, carried)
}

/// One learner's schedule for one course.
#[derive(Debug, Clone)]
pub struct UserSchedule<'a> {
    availability: &'a StudyAvailability,
    preferred_start_date: Option<CalendarDate>,
    tasks: &'a [Task],
    status: &'a UserSubjectsStatus,
    subjects: SubjectLookup<'a>,
    completed_by_date: HashMap<CalendarDate, Vec<&'a Task>>,
    completed_by_topic: HashMap<&'a str, CalendarDate>,
}

impl<'a> UserSchedule<'a> {
    pub fn new(
        availability: &'a StudyAvailability,
        preferred_start_date: Option<CalendarDate>,
        tasks: &'a [Task],
        status: &'a UserSubjectsStatus,
    ) -> Self {
        let mut completed_by_date: HashMap<CalendarDate, Vec<&'a Task>> = HashMap::new();
        let mut completed_by_topic = HashMap::new();

        for task in tasks {
            let Some(done) = task.completed_on.filter(|_| task.is_completed()) else {
                continue;
            };
            completed_by_topic.insert(task.topic_id.as_str(), done);
            completed_by_date.entry(done).or_default().push(task);
        }

        Self {
            availability,
            preferred_start_date,
            tasks,
            status,
            subjects: SubjectLookup::from_status(status),
            completed_by_date,
            completed_by_topic,
        }
    }

    /// Completion date of the last completed task (in input order) on `topic_id`.
    pub fn last_completed_on(&self, topic_id: &str) -> Option<CalendarDate> {
        self.completed_by_topic.get(topic_id).copied()
    }

    /// Carried with the schedule; packing does not consult it.
    pub fn preferred_start_date(&self) -> Option<CalendarDate> {
        self.preferred_start_date
    }

    /// Study minutes offered on `day` before anything is subtracted.
    pub fn capacity_for(&self, day: CalendarDate) -> TimespanInMinutes {
        self.availability.for_day(day.weekday())
    }

    /// Ranked pending tasks: the shared queue every day draws from.
    pub fn pending_queue(&self, today: CalendarDate) -> VecDeque<&'a Task> {
        rank_tasks(self.tasks, self.status, today)
            .into_iter()
            .map(|r| r.task)
            .filter(|t| !t.is_completed())
            .collect()
    }

    /// Day-by-day plan restricted to `range`.
    ///
    /// The walk begins at the earlier of `range.start()` and `today`; days
    /// walked outside `range` still consume the queue but are filtered out.
    pub fn timeline_for(&self, range: DateRange, today: CalendarDate) -> Vec<PlannedTask> {
        let mut planned = Vec::new();
        let mut queue = self.pending_queue(today);

        let walk = match DateRange::new(range.start().min(today), range.end()) {
            Ok(walk) => walk,
            Err(_) => return planned,
        };

        for day in walk.days() {
            if day < today {
                let done = self.completed_on(day);
                planned.extend(done.iter().map(|t| PlannedTask::new(t, day)));
                continue;
            }

            if day == today {
                let done_today = self.completed_on(day);
                planned.extend(done_today.iter().map(|t| PlannedTask::new(t, day)));

                let touched: HashSet<SubjectKey<'a>> =
                    done_today.iter().map(|t| self.subjects.subject_of(t)).collect();
                let spent: TimespanInMinutes = done_today
                    .iter()
                    .filter(|t| !t.is_extra())
                    .map(|t| t.estimated_time_to_complete)
                    .sum();
                let capacity = self.capacity_for(day) - spent;

                let (extras, regular): (VecDeque<&Task>, VecDeque<&Task>) =
                    queue.into_iter().partition(|t| t.is_extra());

                let (scheduled, rest) = pack_day(capacity, regular, touched, &self.subjects);
                tracing::debug!(
                    %day,
                    capacity = capacity.minutes(),
                    spent = spent.minutes(),
                    scheduled = scheduled.len(),
                    extras = extras.len(),
                    "packed today"
                );

                planned.extend(scheduled.into_iter().map(|t| PlannedTask::new(t, day)));
                planned.extend(extras.into_iter().map(|t| PlannedTask::new(t, day)));
                queue = rest;
                continue;
            }

            let capacity = self.capacity_for(day);
            let (scheduled, rest) = pack_day(capacity, queue, HashSet::new(), &self.subjects);
            tracing::debug!(
                %day,
                capacity = capacity.minutes(),
                scheduled = scheduled.len(),
                queued = rest.len(),
                "packed day"
            );

            planned.extend(scheduled.into_iter().map(|t| PlannedTask::new(t, day)));
            queue = rest;
        }

        planned.retain(|p| range.contains(p.date));
        planned
    }

    fn completed_on(&self, day: CalendarDate) -> &[&'a Task] {
        self.completed_by_date
            .get(&day)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}
