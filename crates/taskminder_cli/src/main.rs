//! Taskminder command-line front end.
//!
//! # Responsibility
//! - Resolve data directory, storage backend and log level.
//! - Load the snapshot, run the delayed-task sweep, apply one command and
//!   save the snapshot back when the command changed anything.

use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use taskminder_core::{
    default_log_level, init_logging, open_db, CategoryId, JsonSnapshotRepository, NewTask,
    PlannerService, PriorityId, ReminderType, SnapshotRepository, SqliteSnapshotRepository, Task,
    TaskId, TaskQuery, TaskStatus, TaskUpdate,
};

const DB_FILE_NAME: &str = "taskminder.db";
const LOG_DIR_NAME: &str = "logs";

#[derive(Parser)]
#[command(name = "taskminder")]
#[command(version)]
#[command(about = "Personal tasks, reminders, categories and priorities", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Directory holding the snapshot and logs
    #[arg(long, global = true, env = "TASKMINDER_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Snapshot storage backend
    #[arg(long, global = true, value_enum, default_value = "json", env = "TASKMINDER_BACKEND")]
    backend: Backend,

    /// trace|debug|info|warn|error (defaults per build mode)
    #[arg(long, global = true, env = "TASKMINDER_LOG_LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Backend {
    Json,
    Sqlite,
}

#[derive(Subcommand)]
enum Commands {
    /// Check core linkage
    Ping,
    /// Show dashboard counts
    Summary,
    /// List tasks, optionally filtered
    List(SearchArgs),
    /// Manage categories
    #[command(subcommand)]
    Category(NameCommand),
    /// Manage priorities
    #[command(subcommand)]
    Priority(NameCommand),
    /// Manage tasks
    #[command(subcommand)]
    Task(TaskCommand),
    /// Manage reminders
    #[command(subcommand)]
    Reminder(ReminderCommand),
}

#[derive(Args)]
struct SearchArgs {
    /// Title substring
    #[arg(long)]
    title: Option<String>,
    /// Category name substring
    #[arg(long)]
    category: Option<String>,
    /// Priority name substring
    #[arg(long)]
    priority: Option<String>,
}

#[derive(Subcommand)]
enum NameCommand {
    /// Print all names
    List,
    Add { name: String },
    Rename { name: String, new_name: String },
    Remove { name: String },
}

#[derive(Subcommand)]
enum TaskCommand {
    Add {
        title: String,
        description: String,
        #[arg(long)]
        category: String,
        #[arg(long)]
        priority: Option<String>,
        /// YYYY-MM-DD
        #[arg(long)]
        deadline: NaiveDate,
    },
    /// Change the given fields, keeping the others
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        /// Category name
        #[arg(long)]
        category: Option<String>,
        /// Priority name
        #[arg(long)]
        priority: Option<String>,
        #[arg(long, value_parser = parse_status)]
        status: Option<TaskStatus>,
        #[arg(long)]
        deadline: Option<NaiveDate>,
    },
    Remove { id: String },
}

#[derive(Subcommand)]
enum ReminderCommand {
    /// ONE_DAY_BEFORE | ONE_WEEK_BEFORE | ONE_MONTH_BEFORE | CUSTOM_DATE
    Add {
        task_id: String,
        #[arg(value_parser = parse_reminder_type)]
        kind: ReminderType,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Change a reminder's type; CUSTOM_DATE needs --date
    Edit {
        id: String,
        #[arg(value_parser = parse_reminder_type)]
        kind: ReminderType,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Rebuild a task's reminders against its deadline
    Reevaluate { task_id: String },
    Remove { id: String },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if matches!(cli.command, Commands::Ping) {
        println!("taskminder_core ping={}", taskminder_core::ping());
        println!("taskminder_core version={}", taskminder_core::core_version());
        return Ok(());
    }

    let data_dir = resolve_data_dir(cli.data_dir)?;
    let level = cli
        .log_level
        .unwrap_or_else(|| default_log_level().to_string());
    init_logging(&level, data_dir.join(LOG_DIR_NAME)).context("failed to start logging")?;

    match cli.backend {
        Backend::Json => {
            let repo = JsonSnapshotRepository::new(&data_dir);
            run(cli.command, &repo)
        }
        Backend::Sqlite => {
            std::fs::create_dir_all(&data_dir)
                .with_context(|| format!("failed to create {}", data_dir.display()))?;
            let conn = open_db(data_dir.join(DB_FILE_NAME))?;
            let repo = SqliteSnapshotRepository::try_new(&conn)?;
            run(cli.command, &repo)
        }
    }
}

fn resolve_data_dir(flag: Option<PathBuf>) -> Result<PathBuf> {
    let dir = match flag {
        Some(dir) => dir,
        None => dirs::data_dir()
            .ok_or_else(|| anyhow!("no platform data directory; pass --data-dir"))?
            .join("taskminder"),
    };
    if dir.is_absolute() {
        return Ok(dir);
    }
    Ok(std::env::current_dir()?.join(dir))
}

fn run(command: Commands, repo: &dyn SnapshotRepository) -> Result<()> {
    let mut planner = PlannerService::new();
    let report = planner.load_snapshot(repo)?;
    let mut dirty = report.delayed > 0;

    match command {
        Commands::Ping => {}
        Commands::Summary => {
            let summary = planner.summary();
            println!("Total Tasks: {}", summary.total);
            println!("Completed: {}", summary.completed);
            println!("Delayed: {}", summary.delayed);
            println!(
                "Due in {} Days: {}",
                planner.settings().due_soon_days,
                summary.due_soon
            );
        }
        Commands::List(args) => {
            let query = TaskQuery {
                title: args.title,
                category: args.category,
                priority: args.priority,
            };
            for task in planner.search_tasks(&query) {
                print_task(&planner, task);
            }
        }
        Commands::Category(command) => dirty |= run_category(&mut planner, command)?,
        Commands::Priority(command) => dirty |= run_priority(&mut planner, command)?,
        Commands::Task(command) => dirty |= run_task(&mut planner, command)?,
        Commands::Reminder(command) => dirty |= run_reminder(&mut planner, command)?,
    }

    if dirty {
        planner.save_snapshot(repo)?;
    }
    Ok(())
}

fn run_category(planner: &mut PlannerService, command: NameCommand) -> Result<bool> {
    match command {
        NameCommand::List => {
            for category in planner.categories().all() {
                println!("{}", category.name());
            }
            Ok(false)
        }
        NameCommand::Add { name } => {
            planner.add_category(&name)?;
            Ok(true)
        }
        NameCommand::Rename { name, new_name } => {
            let id = category_id(planner, &name)?;
            planner.rename_category(id, &new_name)?;
            Ok(true)
        }
        NameCommand::Remove { name } => {
            let id = category_id(planner, &name)?;
            planner.remove_category(id)?;
            Ok(true)
        }
    }
}

fn run_priority(planner: &mut PlannerService, command: NameCommand) -> Result<bool> {
    match command {
        NameCommand::List => {
            for priority in planner.priorities().all() {
                println!("{}", priority.name());
            }
            Ok(false)
        }
        NameCommand::Add { name } => {
            planner.add_priority(&name)?;
            Ok(true)
        }
        NameCommand::Rename { name, new_name } => {
            let id = priority_id(planner, &name)?;
            planner.rename_priority(id, &new_name)?;
            Ok(true)
        }
        NameCommand::Remove { name } => {
            let id = priority_id(planner, &name)?;
            planner.remove_priority(id)?;
            Ok(true)
        }
    }
}

fn run_task(planner: &mut PlannerService, command: TaskCommand) -> Result<bool> {
    match command {
        TaskCommand::Add {
            title,
            description,
            category,
            priority,
            deadline,
        } => {
            let category = category_id(planner, &category)?;
            let priority = priority
                .map(|name| priority_id(planner, &name))
                .transpose()?;
            let id = planner.create_task(NewTask {
                title,
                description,
                category,
                priority,
                deadline,
            })?;
            println!("{id}");
        }
        TaskCommand::Edit {
            id,
            title,
            description,
            category,
            priority,
            status,
            deadline,
        } => {
            let id = parse_id(&id)?;
            let category = category
                .map(|name| category_id(planner, &name))
                .transpose()?;
            let priority = priority
                .map(|name| priority_id(planner, &name))
                .transpose()?;
            let task = planner
                .task(id)
                .ok_or_else(|| anyhow!("unknown task `{id}`"))?;
            let update = TaskUpdate {
                title: title.unwrap_or_else(|| task.title().to_string()),
                description: description.unwrap_or_else(|| task.description().to_string()),
                category: category.unwrap_or(task.category()),
                priority: priority
                    .or(task.priority())
                    .unwrap_or_else(|| planner.priorities().default_id()),
                deadline: deadline.unwrap_or(task.deadline()),
                status: status.unwrap_or(task.status()),
            };
            let stored = planner.update_task(id, update)?;
            println!("{id} {stored}");
        }
        TaskCommand::Remove { id } => {
            planner.remove_task(parse_id(&id)?)?;
        }
    }
    Ok(true)
}

fn run_reminder(planner: &mut PlannerService, command: ReminderCommand) -> Result<bool> {
    match command {
        ReminderCommand::Add {
            task_id,
            kind,
            date,
        } => {
            let id = planner.add_reminder(parse_id(&task_id)?, kind, date)?;
            println!("{id}");
        }
        ReminderCommand::Edit { id, kind, date } => {
            let id = planner.update_reminder(parse_id(&id)?, kind, date)?;
            println!("{id}");
        }
        ReminderCommand::Reevaluate { task_id } => {
            let kept = planner.reevaluate_reminders(parse_id(&task_id)?)?;
            println!("{kept}");
        }
        ReminderCommand::Remove { id } => {
            planner.remove_reminder(parse_id(&id)?)?;
        }
    }
    Ok(true)
}

fn category_id(planner: &PlannerService, name: &str) -> Result<CategoryId> {
    planner
        .categories()
        .find_by_name(name)
        .map(|category| category.id())
        .ok_or_else(|| anyhow!("unknown category `{name}`"))
}

fn priority_id(planner: &PlannerService, name: &str) -> Result<PriorityId> {
    planner
        .priorities()
        .find_by_name(name)
        .map(|priority| priority.id())
        .ok_or_else(|| anyhow!("unknown priority `{name}`"))
}

fn print_task(planner: &PlannerService, task: &Task) {
    let category = planner
        .categories()
        .get(task.category())
        .map_or("-", |category| category.name());
    let priority = task
        .priority()
        .and_then(|id| planner.priorities().get(id))
        .map_or("-", |priority| priority.name());
    println!(
        "{} [{}] {} | {} | {} | due {} | reminders {}",
        task.id(),
        task.status(),
        task.title(),
        category,
        priority,
        task.deadline(),
        task.reminders().len()
    );
}

fn parse_status(value: &str) -> Result<TaskStatus, String> {
    TaskStatus::parse(&value.to_ascii_uppercase())
        .ok_or_else(|| format!("unknown status `{value}`"))
}

fn parse_reminder_type(value: &str) -> Result<ReminderType, String> {
    ReminderType::parse(&value.to_ascii_uppercase())
        .ok_or_else(|| format!("unknown reminder type `{value}`"))
}

/// Task and reminder ids share the UUID text form.
fn parse_id(value: &str) -> Result<TaskId> {
    TaskId::parse_str(value.trim()).map_err(|_| anyhow!("`{value}` is not a valid id"))
}
