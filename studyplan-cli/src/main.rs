use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use studyplan_core::{
    complete_task, create_extra_task, enroll, rank_tasks, record_elapsed_time, remove_task, today_in,
    uncomplete_task,
    CalendarDate, DateRange, ElapsedSeconds, ProgressionService, TaskType, UserSchedule,
};

mod config;
mod state;

use config::{load_config, Config};
use state::{default_snapshot_path, read_snapshot, write_snapshot, Snapshot};

#[derive(Parser, Debug)]
#[command(
    name = "studyplan",
    version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("STUDYPLAN_BUILD_SHA"), ")"),
    about = "Rank study tasks, build a daily timeline, and progress completed work"
)]
struct Cli {
    /// Learner snapshot (default: config `snapshot`, else ~/.studyplan/snapshot.json)
    #[arg(long, global = true)]
    snapshot: Option<PathBuf>,

    /// Override "today" (YYYY-MM-DD); defaults to the current date in the configured timezone
    #[arg(long, global = true)]
    today: Option<CalendarDate>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write ~/.studyplan/config.toml and an empty snapshot for a learner
    Init {
        #[arg(long)]
        user: String,

        #[arg(long)]
        course: String,
    },

    /// Print pending tasks by priority
    Rank {
        /// Limit number of tasks printed (default: 10)
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },

    /// Print the day-by-day plan
    Timeline {
        /// First day (default: today)
        #[arg(long)]
        from: Option<CalendarDate>,

        /// Number of days (default: config `horizon_days`)
        #[arg(long)]
        days: Option<u32>,

        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Complete a task and create its follow-ups
    Complete {
        task_id: String,

        /// Completion date, today or earlier (default: today)
        #[arg(long)]
        on: Option<CalendarDate>,

        /// Seconds spent on the task
        #[arg(long)]
        elapsed: Option<i64>,
    },

    /// Reopen a completed task
    Uncomplete { task_id: String },

    /// Record seconds spent on a task without completing it
    Elapsed { task_id: String, seconds: i64 },

    /// Add an extra task outside the generated plan
    Extra {
        topic: String,

        #[arg(long = "type", default_value = "study")]
        task_type: TaskType,

        /// Due date (default: today)
        #[arg(long)]
        date: Option<CalendarDate>,
    },

    /// Delete one of your tasks
    Remove { task_id: String },

    /// Create a study task for every topic in the course that has none
    Enroll,
}

struct Session {
    config: Config,
    snapshot_path: PathBuf,
    snapshot: Snapshot,
    today: CalendarDate,
}

impl Session {
    fn open(cli: &Cli, config: Config) -> Result<Self> {
        let snapshot_path = resolve_snapshot_path(cli, &config)?;
        if !snapshot_path.exists() {
            bail!(
                "snapshot not found: {} (run `studyplan init` or pass --snapshot <path>)",
                snapshot_path.display()
            );
        }
        let snapshot = read_snapshot(&snapshot_path)?;
        let today = match cli.today {
            Some(day) => day,
            None => today_in(&config.timezone, Utc::now())?,
        };
        tracing::debug!(snapshot = %snapshot_path.display(), %today, tasks = snapshot.tasks.len(), "opened session");
        Ok(Self {
            config,
            snapshot_path,
            snapshot,
            today,
        })
    }

    fn save(&self) -> Result<()> {
        write_snapshot(&self.snapshot_path, &self.snapshot)
    }
}

fn resolve_snapshot_path(cli: &Cli, config: &Config) -> Result<PathBuf> {
    match cli.snapshot.clone().or_else(|| config.snapshot.clone()) {
        Some(p) => Ok(p),
        None => default_snapshot_path(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();

    let config = load_config().context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    if let Command::Init { user, course } = &cli.command {
        config::init_config()?;
        let path = resolve_snapshot_path(&cli, &config)?;
        if path.exists() {
            println!("Snapshot already exists: {}", path.display());
        } else {
            write_snapshot(&path, &Snapshot::empty(user, course))?;
            println!("Wrote {}", path.display());
        }
        return Ok(());
    }

    let mut session = Session::open(&cli, config)?;

    match cli.command {
        Command::Init { .. } => {}

        Command::Rank { limit } => rank(&session, limit),

        Command::Timeline { from, days, json } => timeline(&session, from, days, json)?,

        Command::Complete { task_id, on, elapsed } => {
            let on = completion_date(on, session.today)?;
            let elapsed = elapsed.map(ElapsedSeconds::new).transpose()?;
            let store = session.snapshot.store();

            let event = complete_task(&store, &session.snapshot.user_id, &task_id, on, elapsed).await?;
            let created = ProgressionService::new(&store, &store).handle(&event).await?;

            println!("Completed {} on {}", task_id, on);
            for t in &created {
                println!(
                    "  + {} {} (cycle {}) due {}",
                    t.task_type,
                    t.topic_id,
                    t.cycle,
                    t.planned_date.map(|d| d.to_string()).unwrap_or_default()
                );
            }

            session.snapshot.sync_from(&store).await?;
            session.save()?;
        }

        Command::Uncomplete { task_id } => {
            let store = session.snapshot.store();
            uncomplete_task(&store, &session.snapshot.user_id, &task_id).await?;
            println!("Reopened {}", task_id);
            session.snapshot.sync_from(&store).await?;
            session.save()?;
        }

        Command::Elapsed { task_id, seconds } => {
            let store = session.snapshot.store();
            record_elapsed_time(&store, &session.snapshot.user_id, &task_id, seconds).await?;
            println!("Recorded {}s on {}", seconds, task_id);
            session.snapshot.sync_from(&store).await?;
            session.save()?;
        }

        Command::Extra { topic, task_type, date } => {
            let date = date.unwrap_or(session.today);
            let store = session.snapshot.store();
            let snap = &session.snapshot;
            let task = create_extra_task(&store, &snap.user_id, &topic, &snap.course_id, task_type, date).await?;
            println!("Added extra {} task {} on {}", task.task_type, task.id, date);
            session.snapshot.sync_from(&store).await?;
            session.save()?;
        }

        Command::Remove { task_id } => {
            let store = session.snapshot.store();
            remove_task(&store, &session.snapshot.user_id, &task_id).await?;
            println!("Removed {}", task_id);
            session.snapshot.sync_from(&store).await?;
            session.save()?;
        }

        Command::Enroll => {
            let store = session.snapshot.store();
            let snap = &session.snapshot;
            let topics = snap.status.topic_ids();
            let created = enroll(&store, &snap.user_id, &snap.course_id, &topics).await?;
            println!("Created {} study tasks for {} topics", created.len(), topics.len());
            session.snapshot.sync_from(&store).await?;
            session.save()?;
        }
    }

    Ok(())
}

/// Completions are recorded for today or an earlier day, never ahead of time.
fn completion_date(on: Option<CalendarDate>, today: CalendarDate) -> Result<CalendarDate> {
    match on {
        Some(day) if day > today => bail!("cannot complete a task on {} (today is {})", day, today),
        Some(day) => Ok(day),
        None => Ok(today),
    }
}

fn rank(session: &Session, limit: usize) {
    let snap = &session.snapshot;
    let ranked = rank_tasks(&snap.tasks, &snap.status, session.today);

    for r in ranked.iter().filter(|r| !r.task.is_completed()).take(limit) {
        println!(
            "{:>6.2} | {:<9} | {} | weight={:.2} perf={:.2} recency={:.2}{}",
            r.final_relevance,
            r.task.task_type.as_str(),
            r.task.topic_id,
            r.topic_weight,
            r.performance,
            r.recency_weight,
            if r.task.is_extra() { " [extra]" } else { "" }
        );
    }
}

fn timeline(session: &Session, from: Option<CalendarDate>, days: Option<u32>, json: bool) -> Result<()> {
    let snap = &session.snapshot;
    let start = from.unwrap_or(session.today);
    let days = days.unwrap_or(session.config.horizon_days).max(1);
    let range = DateRange::new(start, start.add_days(i64::from(days) - 1))?;

    let availability = snap.availability.as_ref().unwrap_or(&session.config.availability);
    let schedule = UserSchedule::new(availability, snap.preferred_start_date, &snap.tasks, &snap.status);
    let planned = schedule.timeline_for(range, session.today);

    if json {
        println!("{}", serde_json::to_string_pretty(&planned)?);
        return Ok(());
    }

    for day in range.days() {
        let on_day: Vec<_> = planned.iter().filter(|p| p.date == day).collect();
        let minutes: u32 = on_day
            .iter()
            .map(|p| p.task.estimated_time_to_complete.minutes())
            .sum();
        println!(
            "{} {:<9} {:>4}/{:<4} min",
            day,
            day.weekday().as_str(),
            minutes,
            schedule.capacity_for(day).minutes()
        );
        for p in on_day {
            let mark = if p.task.is_completed() { "x" } else { " " };
            println!(
                "  [{}] {:<9} {}{}",
                mark,
                p.task.task_type.as_str(),
                p.task.topic_id,
                if p.task.is_extra() { " [extra]" } else { "" }
            );
        }
    }
    Ok(())
}
