//! Per-user, per-course subject/topic status: relevance weights, enabled task
//! types, and hit/miss counters. Read-only input to the scheduling engine.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::task::TaskTypeSet;

fn default_true() -> bool {
    true
}

fn default_relevance() -> f64 {
    1.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicStatus {
    pub topic_id: String,
    #[serde(default = "default_relevance")]
    pub relevance: f64,
    #[serde(default = "default_true")]
    pub active: bool,
    /// `None` means the learner never customized the topic: every type is enabled.
    #[serde(default)]
    pub task_types: Option<TaskTypeSet>,
    #[serde(default)]
    pub hits: u32,
    #[serde(default)]
    pub misses: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectStatus {
    pub subject_id: String,
    #[serde(default = "default_relevance")]
    pub relevance: f64,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default)]
    pub hits: u32,
    #[serde(default)]
    pub misses: u32,
    #[serde(default)]
    pub topics: Vec<TopicStatus>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UserSubjectsStatus {
    pub user_id: String,
    pub course_id: String,
    #[serde(default)]
    pub subjects: Vec<SubjectStatus>,
}

impl TopicStatus {
    pub fn new(topic_id: impl Into<String>, relevance: f64) -> Self {
        Self {
            topic_id: topic_id.into(),
            relevance,
            active: true,
            task_types: None,
            hits: 0,
            misses: 0,
        }
    }

    pub fn with_results(mut self, hits: u32, misses: u32) -> Self {
        self.hits = hits;
        self.misses = misses;
        self
    }

    pub fn with_task_types(mut self, types: TaskTypeSet) -> Self {
        self.task_types = Some(types);
        self
    }

    pub fn enabled_task_types(&self) -> TaskTypeSet {
        self.task_types.unwrap_or(TaskTypeSet::ALL)
    }
}

impl SubjectStatus {
    pub fn new(subject_id: impl Into<String>, relevance: f64) -> Self {
        Self {
            subject_id: subject_id.into(),
            relevance,
            active: true,
            hits: 0,
            misses: 0,
            topics: Vec::new(),
        }
    }

    pub fn with_results(mut self, hits: u32, misses: u32) -> Self {
        self.hits = hits;
        self.misses = misses;
        self
    }

    pub fn with_topic(mut self, topic: TopicStatus) -> Self {
        self.topics.push(topic);
        self
    }
}

impl UserSubjectsStatus {
    pub fn new(user_id: impl Into<String>, course_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            course_id: course_id.into(),
            subjects: Vec::new(),
        }
    }

    pub fn with_subject(mut self, subject: SubjectStatus) -> Self {
        self.subjects.push(subject);
        self
    }

    /// Every topic paired with the subject that owns it.
    pub fn topics(&self) -> impl Iterator<Item = (&SubjectStatus, &TopicStatus)> {
        self.subjects
            .iter()
            .flat_map(|s| s.topics.iter().map(move |t| (s, t)))
    }

    pub fn topic(&self, topic_id: &str) -> Option<(&SubjectStatus, &TopicStatus)> {
        self.topics().find(|(_, t)| t.topic_id == topic_id)
    }

    /// topic id -> subject id.
    pub fn subject_by_topic(&self) -> HashMap<&str, &str> {
        self.topics()
            .map(|(s, t)| (t.topic_id.as_str(), s.subject_id.as_str()))
            .collect()
    }

    /// Enabled task types for a topic, or `None` when the topic is not part of this course.
    pub fn enabled_task_types(&self, topic_id: &str) -> Option<TaskTypeSet> {
        self.topic(topic_id).map(|(_, t)| t.enabled_task_types())
    }

    pub fn topic_ids(&self) -> Vec<String> {
        self.topics().map(|(_, t)| t.topic_id.clone()).collect()
    }
}
