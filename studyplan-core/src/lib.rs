//! studyplan-core: ranking, daily timeline packing and spaced-repetition
//! progression for study tasks.

pub mod availability;
pub mod error;
pub mod ports;
pub mod progression;
pub mod ranking;
pub mod status;
pub mod store;
pub mod task;
pub mod time;
pub mod timeline;
pub mod usecases;

pub use availability::{StudyAvailability, TimespanInMinutes};
pub use error::{TaskError, UseCaseError, ValueError};
pub use ports::{SubjectStatusSource, TaskRepository};
pub use progression::{cooldown_days, next_tasks, FollowUp, ProgressionService, Sequence};
pub use ranking::{rank_tasks, recency_weight, topic_stats, RankedTask, TopicStats};
pub use status::{SubjectStatus, TopicStatus, UserSubjectsStatus};
pub use store::InMemoryStore;
pub use task::{ElapsedSeconds, Task, TaskEvent, TaskType, TaskTypeSet};
pub use time::{today_in, CalendarDate, DateRange, Weekday};
pub use timeline::{pack_day, PlannedTask, SubjectLookup, UserSchedule};
pub use usecases::{
    complete_task, create_extra_task, enroll, record_elapsed_time, remove_task, uncomplete_task,
};
