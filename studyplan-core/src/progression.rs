//! Spaced-repetition progression.
//!
//! Completing a task spawns follow-up tasks on the same topic. Which types
//! follow, and whether the chain advances a cycle, depends on the set of task
//! types the learner enabled for the topic. The follow-up's due date is the
//! completion date plus a cooldown that stretches as the cycle grows.

use anyhow::Result;

use crate::ports::{SubjectStatusSource, TaskRepository};
use crate::task::{Task, TaskEvent, TaskType, TaskTypeSet};

const EXERCISE_COOLDOWN: [i64; 3] = [1, 3, 5];
const LAW_STUDY_COOLDOWN: [i64; 4] = [1, 3, 7, 14];
const REVIEW_COOLDOWN: [i64; 4] = [7, 14, 30, 60];
const STUDY_COOLDOWN: i64 = 1;

/// Days between completing a task and the due date of a `task_type` follow-up
/// at `cycle`. Cycles past the end of a table reuse its last entry.
pub fn cooldown_days(cycle: u32, task_type: TaskType) -> i64 {
    let table: &[i64] = match task_type {
        TaskType::Study => return STUDY_COOLDOWN,
        TaskType::Exercise => &EXERCISE_COOLDOWN,
        TaskType::LawStudy => &LAW_STUDY_COOLDOWN,
        TaskType::Review => &REVIEW_COOLDOWN,
    };
    let index = (cycle.saturating_sub(1) as usize).min(table.len() - 1);
    table[index]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FollowUp {
    pub next_type: TaskType,
    pub increment_cycle: bool,
}

const fn next(next_type: TaskType) -> FollowUp {
    FollowUp { next_type, increment_cycle: true }
}

const fn same_cycle(next_type: TaskType) -> FollowUp {
    FollowUp { next_type, increment_cycle: false }
}

const NONE: &[FollowUp] = &[];
const LAW_STUDY_AND_REVIEW: &[FollowUp] = &[next(TaskType::LawStudy), next(TaskType::Review)];
const EXERCISE_AND_REVIEW: &[FollowUp] = &[next(TaskType::Exercise), next(TaskType::Review)];
const EXERCISE_SAME_CYCLE: &[FollowUp] = &[same_cycle(TaskType::Exercise)];
const LAW_STUDY: &[FollowUp] = &[next(TaskType::LawStudy)];
const EXERCISE: &[FollowUp] = &[next(TaskType::Exercise)];
const REVIEW: &[FollowUp] = &[next(TaskType::Review)];

/// Progression sequence selected by the exact set of enabled task types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sequence {
    StudyLawExerciseReview,
    StudyExerciseReview,
    StudyLawReview,
    StudyLawExercise,
    StudyReview,
    StudyLaw,
    StudyExercise,
    /// Any other combination, including no configuration at all.
    Default,
}

impl Sequence {
    pub fn for_enabled(enabled: Option<TaskTypeSet>) -> Self {
        const S: u8 = TaskType::Study.bit();
        const L: u8 = TaskType::LawStudy.bit();
        const E: u8 = TaskType::Exercise.bit();
        const R: u8 = TaskType::Review.bit();
        const SLER: u8 = S | L | E | R;
        const SER: u8 = S | E | R;
        const SLR: u8 = S | L | R;
        const SLE: u8 = S | L | E;
        const SR: u8 = S | R;
        const SL: u8 = S | L;
        const SE: u8 = S | E;

        let Some(enabled) = enabled else {
            return Sequence::Default;
        };

        match enabled.bits() {
            SLER => Sequence::StudyLawExerciseReview,
            SER => Sequence::StudyExerciseReview,
            SLR => Sequence::StudyLawReview,
            SLE => Sequence::StudyLawExercise,
            SR => Sequence::StudyReview,
            SL => Sequence::StudyLaw,
            SE => Sequence::StudyExercise,
            _ => Sequence::Default,
        }
    }

    /// Follow-ups of a completed `source` task, in creation order.
    pub fn follow_ups(self, source: TaskType) -> &'static [FollowUp] {
        use Sequence::*;
        use TaskType::*;

        match (self, source) {
            (StudyLawExerciseReview, Study) => LAW_STUDY_AND_REVIEW,
            (StudyLawExerciseReview, LawStudy) => EXERCISE_SAME_CYCLE,
            (StudyLawExerciseReview, Review) => EXERCISE_AND_REVIEW,

            (StudyExerciseReview, Study) => EXERCISE_AND_REVIEW,
            (StudyExerciseReview, Review) => EXERCISE_AND_REVIEW,

            (StudyLawReview, Study) => LAW_STUDY_AND_REVIEW,
            (StudyLawReview, Review) => EXERCISE_AND_REVIEW,

            (StudyLawExercise, Study) => LAW_STUDY,
            (StudyLawExercise, LawStudy) => EXERCISE_SAME_CYCLE,
            (StudyLawExercise, Exercise) => LAW_STUDY,

            (StudyReview, Study) => REVIEW,
            (StudyReview, Review) => REVIEW,

            (StudyLaw, Study) => LAW_STUDY,
            (StudyLaw, LawStudy) => EXERCISE,

            (StudyExercise, Study) => EXERCISE,
            (StudyExercise, Exercise) => REVIEW,

            (Default, Study) => EXERCISE_AND_REVIEW,
            (Default, Review) => EXERCISE_AND_REVIEW,

            _ => NONE,
        }
    }
}

/// Follow-up tasks for a completed task, given the topic's enabled types.
///
/// Extra tasks and tasks that are not completed produce nothing.
pub fn next_tasks(task: &Task, enabled: Option<TaskTypeSet>) -> Vec<Task> {
    if task.is_extra() {
        return Vec::new();
    }
    let Some(completed_on) = task.completed_on.filter(|_| task.is_completed()) else {
        return Vec::new();
    };

    Sequence::for_enabled(enabled)
        .follow_ups(task.task_type)
        .iter()
        .map(|step| {
            let cycle = task.cycle + u32::from(step.increment_cycle);
            let due = completed_on.add_days(cooldown_days(cycle, step.next_type));
            Task::generated(&task.owner_id, &task.topic_id, &task.course_id)
                .with_type(step.next_type)
                .with_cycle(cycle)
                .with_planned_date(due)
                .with_estimate(task.estimated_time_to_complete)
        })
        .collect()
}

/// Runs the progression machine against the task repository.
#[derive(Debug, Clone, Copy)]
pub struct ProgressionService<'a, R, S> {
    tasks: &'a R,
    status: &'a S,
}

impl<'a, R: TaskRepository, S: SubjectStatusSource> ProgressionService<'a, R, S> {
    pub fn new(tasks: &'a R, status: &'a S) -> Self {
        Self { tasks, status }
    }

    /// Create and persist the follow-ups of `task`. Returns what was created.
    ///
    /// A failing topic configuration lookup is logged and treated as "no
    /// configuration"; a failing write is returned, leaving earlier follow-ups
    /// of the same batch persisted.
    pub async fn on_task_completed(&self, task: &Task) -> Result<Vec<Task>> {
        if task.is_extra() {
            tracing::debug!(task = %task.id, "extra task completed; no progression");
            return Ok(Vec::new());
        }

        let enabled = match self.status.topic_task_types(&task.owner_id, &task.topic_id).await {
            Ok(enabled) => enabled,
            Err(err) => {
                tracing::warn!(
                    task = %task.id,
                    topic = %task.topic_id,
                    error = %err,
                    "topic configuration lookup failed; using default sequence"
                );
                None
            }
        };

        let follow_ups = next_tasks(task, enabled);
        for next in &follow_ups {
            self.tasks.create(next.clone()).await?;
        }

        tracing::debug!(
            task = %task.id,
            task_type = %task.task_type,
            cycle = task.cycle,
            sequence = ?Sequence::for_enabled(enabled),
            created = follow_ups.len(),
            "progressed task"
        );
        Ok(follow_ups)
    }

    /// Dispatch a task event: completions progress, anything else is ignored.
    pub async fn handle(&self, event: &TaskEvent) -> Result<Vec<Task>> {
        match event {
            TaskEvent::Completed(task) => self.on_task_completed(task).await,
            TaskEvent::Uncompleted(_) => Ok(Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::UserSubjectsStatus;
    use crate::store::InMemoryStore;
    use crate::time::CalendarDate;

    use TaskType::*;

    fn day(s: &str) -> CalendarDate {
        s.parse().unwrap()
    }

    fn done(task_type: TaskType, cycle: u32) -> Task {
        Task::new("t1", "u1", "topic", "c1")
            .with_type(task_type)
            .with_cycle(cycle)
            .completed(day("2026-03-10"))
    }

    fn kinds(tasks: &[Task]) -> Vec<(TaskType, u32, CalendarDate)> {
        tasks
            .iter()
            .map(|t| (t.task_type, t.cycle, t.planned_date.unwrap()))
            .collect()
    }

    #[test]
    fn cooldown_tables() {
        assert_eq!(cooldown_days(0, Exercise), 1);
        assert_eq!(cooldown_days(1, Exercise), 1);
        assert_eq!(cooldown_days(3, Exercise), 5);
        assert_eq!(cooldown_days(5, Exercise), 5);
        assert_eq!(cooldown_days(4, LawStudy), 14);
        assert_eq!(cooldown_days(2, Review), 14);
        assert_eq!(cooldown_days(40, Review), 60);
        assert_eq!(cooldown_days(7, Study), 1);
    }

    #[test]
    fn sequence_for_each_enabled_set() {
        let cases = [
            (Some(TaskTypeSet::ALL), Sequence::StudyLawExerciseReview),
            (Some(TaskTypeSet::of(&[Study, Exercise, Review])), Sequence::StudyExerciseReview),
            (Some(TaskTypeSet::of(&[Study, LawStudy, Review])), Sequence::StudyLawReview),
            (Some(TaskTypeSet::of(&[Study, LawStudy, Exercise])), Sequence::StudyLawExercise),
            (Some(TaskTypeSet::of(&[Study, Review])), Sequence::StudyReview),
            (Some(TaskTypeSet::of(&[Study, LawStudy])), Sequence::StudyLaw),
            (Some(TaskTypeSet::of(&[Study, Exercise])), Sequence::StudyExercise),
            (Some(TaskTypeSet::of(&[LawStudy, Exercise, Review])), Sequence::Default),
            (Some(TaskTypeSet::of(&[Study])), Sequence::Default),
            (Some(TaskTypeSet::EMPTY), Sequence::Default),
            (None, Sequence::Default),
        ];
        for (enabled, expected) in cases {
            assert_eq!(Sequence::for_enabled(enabled), expected, "{enabled:?}");
        }
    }

    #[test]
    fn follow_up_table() {
        use Sequence::*;

        let n = |t| FollowUp { next_type: t, increment_cycle: true };
        let same = |t| FollowUp { next_type: t, increment_cycle: false };

        // Per sequence: follow-ups of study, lawStudy, exercise, review.
        let table: [(Sequence, [Vec<FollowUp>; 4]); 8] = [
            (
                StudyLawExerciseReview,
                [vec![n(LawStudy), n(Review)], vec![same(Exercise)], vec![], vec![n(Exercise), n(Review)]],
            ),
            (
                StudyExerciseReview,
                [vec![n(Exercise), n(Review)], vec![], vec![], vec![n(Exercise), n(Review)]],
            ),
            (
                StudyLawReview,
                [vec![n(LawStudy), n(Review)], vec![], vec![], vec![n(Exercise), n(Review)]],
            ),
            (
                StudyLawExercise,
                [vec![n(LawStudy)], vec![same(Exercise)], vec![n(LawStudy)], vec![]],
            ),
            (StudyReview, [vec![n(Review)], vec![], vec![], vec![n(Review)]]),
            (StudyLaw, [vec![n(LawStudy)], vec![n(Exercise)], vec![], vec![]]),
            (StudyExercise, [vec![n(Exercise)], vec![], vec![n(Review)], vec![]]),
            (
                Default,
                [vec![n(Exercise), n(Review)], vec![], vec![], vec![n(Exercise), n(Review)]],
            ),
        ];

        for (sequence, expected) in &table {
            for (source, want) in TaskType::ALL.into_iter().zip(expected) {
                assert_eq!(
                    sequence.follow_ups(source),
                    want.as_slice(),
                    "{sequence:?} after {source}"
                );
            }
        }
    }

    #[test]
    fn study_with_everything_enabled_spawns_law_study_and_review() {
        let next = next_tasks(&done(Study, 0), Some(TaskTypeSet::ALL));
        assert_eq!(
            kinds(&next),
            [(LawStudy, 1, day("2026-03-11")), (Review, 1, day("2026-03-17"))]
        );
        assert!(next.iter().all(|t| !t.is_completed() && !t.is_extra() && t.topic_id == "topic"));
        assert_ne!(next[0].id, next[1].id);
    }

    #[test]
    fn law_study_moves_to_exercise_without_advancing() {
        let next = next_tasks(&done(LawStudy, 2), Some(TaskTypeSet::ALL));
        assert_eq!(kinds(&next), [(Exercise, 2, day("2026-03-13"))]);
    }

    #[test]
    fn exercise_is_terminal_with_everything_enabled() {
        assert!(next_tasks(&done(Exercise, 3), Some(TaskTypeSet::ALL)).is_empty());
    }

    #[test]
    fn missing_configuration_uses_default_sequence() {
        let next = next_tasks(&done(Study, 0), None);
        assert_eq!(
            kinds(&next),
            [(Exercise, 1, day("2026-03-11")), (Review, 1, day("2026-03-17"))]
        );

        // Unlisted combinations fall back too.
        let only_review = TaskTypeSet::of(&[Review]);
        assert_eq!(Sequence::for_enabled(Some(only_review)), Sequence::Default);
    }

    #[test]
    fn partial_configurations() {
        let sle = Some(TaskTypeSet::of(&[Study, LawStudy, Exercise]));
        assert_eq!(kinds(&next_tasks(&done(Exercise, 1), sle)), [(LawStudy, 2, day("2026-03-13"))]);
        assert!(next_tasks(&done(Review, 1), sle).is_empty());

        let se = Some(TaskTypeSet::of(&[Study, Exercise]));
        assert_eq!(kinds(&next_tasks(&done(Exercise, 4), se)), [(Review, 5, day("2026-05-09"))]);

        let sr = Some(TaskTypeSet::of(&[Study, Review]));
        assert_eq!(kinds(&next_tasks(&done(Review, 1), sr)), [(Review, 2, day("2026-03-24"))]);
    }

    #[test]
    fn exercise_cooldown_at_cycle_five() {
        let se = Some(TaskTypeSet::of(&[Study, Exercise]));
        let next = next_tasks(&done(Study, 4), se);
        assert_eq!(kinds(&next), [(Exercise, 5, day("2026-03-15"))]);
    }

    #[test]
    fn follow_ups_keep_effort() {
        let task = done(Study, 0).with_estimate(crate::TimespanInMinutes::new(45).unwrap());
        let next = next_tasks(&task, None);
        assert!(next.iter().all(|t| t.estimated_time_to_complete.minutes() == 45));
    }

    #[test]
    fn extra_and_unfinished_tasks_do_not_progress() {
        assert!(next_tasks(&done(Study, 0).extra(), None).is_empty());
        assert!(next_tasks(&Task::new("t", "u1", "topic", "c1"), None).is_empty());
    }

    struct BrokenStatus;

    impl SubjectStatusSource for BrokenStatus {
        async fn subjects_status(&self, _: &str, _: &str) -> Result<UserSubjectsStatus> {
            anyhow::bail!("status backend unavailable")
        }

        async fn topic_task_types(&self, _: &str, _: &str) -> Result<Option<TaskTypeSet>> {
            anyhow::bail!("status backend unavailable")
        }
    }

    #[tokio::test]
    async fn service_persists_follow_ups() {
        let store = InMemoryStore::default();
        let service = ProgressionService::new(&store, &store);

        let created = service.handle(&TaskEvent::Completed(done(Study, 0))).await.unwrap();
        assert_eq!(created.len(), 2);
        assert_eq!(store.all_tasks().unwrap(), created);

        let ignored = service
            .handle(&TaskEvent::Uncompleted(Task::new("x", "u1", "topic", "c1")))
            .await
            .unwrap();
        assert!(ignored.is_empty());
    }

    #[tokio::test]
    async fn status_failure_falls_back_to_default() {
        let store = InMemoryStore::default();
        let service = ProgressionService::new(&store, &BrokenStatus);

        let created = service.on_task_completed(&done(Review, 1)).await.unwrap();
        let types: Vec<_> = created.iter().map(|t| t.task_type).collect();
        assert_eq!(types, [Exercise, Review]);
    }
}
