//! Task priority ranking.
//!
//! Score per task:
//!
//! ```text
//! final_relevance = topic_weight * (1 - performance) + recency_weight
//! ```
//!
//! - `topic_weight` = subject relevance x topic relevance
//! - `performance` = hit rate; topic-level once the topic has more than
//!   [`MIN_TOPIC_SAMPLE`] answers, subject-level before that
//! - `recency_weight` grows with how many days the task is overdue, so stale
//!   work eventually outranks any topic weight

use std::collections::HashMap;

use crate::status::UserSubjectsStatus;
use crate::task::Task;
use crate::time::CalendarDate;

/// Topics with this many answers or fewer borrow their subject's hit rate.
pub const MIN_TOPIC_SAMPLE: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankedTask<'a> {
    pub task: &'a Task,
    pub final_relevance: f64,
    pub topic_weight: f64,
    pub performance: f64,
    pub recency_weight: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TopicStats {
    pub weight: f64,
    pub performance: f64,
}

fn hit_rate(hits: u32, misses: u32) -> f64 {
    let total = hits + misses;
    if total == 0 {
        0.0
    } else {
        f64::from(hits) / f64::from(total)
    }
}

/// Weight and performance for every topic the status knows about.
pub fn topic_stats(status: &UserSubjectsStatus) -> HashMap<&str, TopicStats> {
    status
        .topics()
        .map(|(subject, topic)| {
            let performance = if topic.hits + topic.misses <= MIN_TOPIC_SAMPLE {
                hit_rate(subject.hits, subject.misses)
            } else {
                hit_rate(topic.hits, topic.misses)
            };
            let stats = TopicStats {
                weight: subject.relevance * topic.relevance,
                performance,
            };
            (topic.topic_id.as_str(), stats)
        })
        .collect()
}

/// Staleness bonus for a task planned on `planned`, seen from `today`.
pub fn recency_weight(planned: CalendarDate, today: CalendarDate) -> f64 {
    let days_late = planned.days_until(today);
    match days_late {
        d if d < 0 => 0.0,
        0 => 1.0,
        d if d < 7 => 1.0 + d as f64 / 8.0,
        d if d < 14 => 1.0 + d as f64 / 4.0,
        d => 1.0 + d as f64 / 2.0,
    }
}

/// Score every task and order them by descending `final_relevance`.
///
/// Finished and pending tasks are both scored; callers filter afterwards.
/// Equal scores keep their input order.
pub fn rank_tasks<'a>(
    tasks: &'a [Task],
    status: &UserSubjectsStatus,
    today: CalendarDate,
) -> Vec<RankedTask<'a>> {
    let stats = topic_stats(status);

    let mut ranked: Vec<RankedTask<'a>> = tasks
        .iter()
        .map(|task| {
            let topic = stats.get(task.topic_id.as_str()).copied().unwrap_or_default();
            let recency = task
                .planned_date
                .map(|planned| recency_weight(planned, today))
                .unwrap_or(0.0);
            RankedTask {
                task,
                final_relevance: topic.weight * (1.0 - topic.performance) + recency,
                topic_weight: topic.weight,
                performance: topic.performance,
                recency_weight: recency,
            }
        })
        .collect();

    ranked.sort_by(|a, b| b.final_relevance.total_cmp(&a.final_relevance));

    tracing::debug!(tasks = ranked.len(), topics = stats.len(), %today, "ranked tasks");
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::{SubjectStatus, TopicStatus};

    fn day(s: &str) -> CalendarDate {
        s.parse().unwrap()
    }

    fn task(id: &str, topic: &str) -> Task {
        Task::new(id, "u1", topic, "c1")
    }

    #[test]
    fn recency_tiers() {
        let today = day("2026-03-20");
        assert_eq!(recency_weight(day("2026-03-25"), today), 0.0);
        assert_eq!(recency_weight(today, today), 1.0);
        assert_eq!(recency_weight(day("2026-03-16"), today), 1.5); // 4 late
        assert_eq!(recency_weight(day("2026-03-12"), today), 3.0); // 8 late
        assert_eq!(recency_weight(day("2026-03-06"), today), 8.0); // 14 late
    }

    #[test]
    fn small_topic_sample_uses_subject_hit_rate() {
        let status = UserSubjectsStatus::new("u1", "c1").with_subject(
            SubjectStatus::new("law", 2.0)
                .with_results(3, 1)
                .with_topic(TopicStatus::new("few", 1.5).with_results(1, 9))
                .with_topic(TopicStatus::new("many", 1.0).with_results(2, 18)),
        );
        let stats = topic_stats(&status);

        let few = stats["few"];
        assert_eq!(few.weight, 3.0);
        assert_eq!(few.performance, 0.75);

        let many = stats["many"];
        assert_eq!(many.weight, 2.0);
        assert!((many.performance - 0.1).abs() < 1e-9);
    }

    #[test]
    fn untracked_topic_has_no_performance_penalty() {
        let status = UserSubjectsStatus::new("u1", "c1")
            .with_subject(SubjectStatus::new("law", 2.0).with_topic(TopicStatus::new("t", 1.0)));
        let today = day("2026-03-20");
        let tasks = vec![task("a", "t").with_planned_date(today)];

        let ranked = rank_tasks(&tasks, &status, today);
        assert_eq!(ranked[0].performance, 0.0);
        assert_eq!(ranked[0].final_relevance, 2.0 + 1.0);
    }

    #[test]
    fn unknown_topic_scores_only_recency() {
        let status = UserSubjectsStatus::new("u1", "c1");
        let today = day("2026-03-20");
        let tasks = vec![task("a", "ghost").with_planned_date(day("2026-03-18"))];
        let ranked = rank_tasks(&tasks, &status, today);
        assert_eq!(ranked[0].topic_weight, 0.0);
        assert_eq!(ranked[0].final_relevance, 1.25);
    }

    #[test]
    fn overdue_work_outranks_heavier_topics() {
        let status = UserSubjectsStatus::new("u1", "c1")
            .with_subject(SubjectStatus::new("heavy", 3.0).with_topic(TopicStatus::new("h", 1.0)))
            .with_subject(SubjectStatus::new("light", 0.5).with_topic(TopicStatus::new("l", 1.0)));
        let today = day("2026-03-20");
        let tasks = vec![
            task("fresh-heavy", "h"),
            task("stale-light", "l").with_planned_date(day("2026-03-01")),
        ];

        let ranked = rank_tasks(&tasks, &status, today);
        assert_eq!(ranked[0].task.id, "stale-light");
        assert_eq!(ranked[1].task.id, "fresh-heavy");
    }

    #[test]
    fn ties_keep_input_order() {
        let status = UserSubjectsStatus::new("u1", "c1")
            .with_subject(SubjectStatus::new("s", 1.0).with_topic(TopicStatus::new("t", 1.0)));
        let tasks = vec![task("first", "t"), task("second", "t"), task("third", "t")];
        let ranked = rank_tasks(&tasks, &status, day("2026-03-20"));
        let ids: Vec<_> = ranked.iter().map(|r| r.task.id.as_str()).collect();
        assert_eq!(ids, ["first", "second", "third"]);
    }
}
