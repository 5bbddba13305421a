//! Terminal front end
//!
//! Every dashboard screen is a subcommand. A move only changes the local
//! order until it is saved: pass `--save` to send it at once, or use
//! `shell`, which keeps a single [`Workspace`] alive so cached lists and
//! unsaved reorders survive until `save`.

mod prompt;
mod render;
mod shell;
mod workspace;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use crate::app::AppState;
use crate::config::Config;
use crate::models::{LessonKind, Visibility};
use crate::services::FileTokenStore;

pub use workspace::Workspace;

/// coursedesk: manage your courses, modules and lessons
#[derive(Parser, Debug)]
#[command(name = "coursedesk", version, about)]
pub struct Cli {
    /// Configuration file
    #[arg(long, short, default_value = "config.yml")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Sign in with email and password.
    Login {
        #[arg(long)]
        email: String,

        /// Asked for when omitted.
        #[arg(long)]
        password: Option<String>,
    },

    /// Sign out and forget the stored session.
    Logout,

    /// Show the signed-in creator.
    Whoami,

    /// Create a creator account: verify your email, then fill in two steps.
    Register,

    /// Reset a forgotten password with an emailed one-time password.
    ForgotPassword,

    /// Create, edit, delete and reorder courses.
    #[command(subcommand)]
    Course(CourseCommand),

    /// Create, rename, delete and reorder the modules of a course.
    #[command(subcommand)]
    Module(ModuleCommand),

    /// Create, edit, delete and reorder the lessons of a module.
    #[command(subcommand)]
    Lesson(LessonCommand),

    /// List students.
    Students,

    /// Open a dashboard path such as /dashboard/courses/3/modules.
    Open { path: String },

    /// Send every pending reorder batch.
    Save,

    /// Drop pending reorders and restore the last saved order.
    Revert,

    /// Show reorders that have not been saved yet.
    Pending,

    /// Interactive session.
    Shell,
}

#[derive(Subcommand, Debug)]
pub enum CourseCommand {
    /// List your courses in display order.
    List,

    Show { id: i64 },

    Create(CourseArgs),

    /// Edit a course; omitted fields keep their current value.
    Edit {
        id: i64,

        #[command(flatten)]
        fields: CourseArgs,
    },

    Delete {
        id: i64,

        /// Skip the confirmation question.
        #[arg(long, short)]
        yes: bool,
    },

    /// Move the course at position ACTIVE onto position OVER.
    Move {
        active: i32,
        over: i32,
        /// Send the new order right away
        #[arg(long)]
        save: bool,
    },
}

#[derive(Args, Debug, Default, Clone)]
pub struct CourseArgs {
    #[arg(long)]
    pub title: Option<String>,

    #[arg(long)]
    pub description: Option<String>,

    /// Empty or 0 for a free course.
    #[arg(long)]
    pub price: Option<String>,

    /// Duration in hours.
    #[arg(long)]
    pub duration: Option<String>,

    #[arg(long)]
    pub highlights: Option<String>,

    #[arg(long)]
    pub outcomes: Option<String>,

    #[arg(long)]
    pub prerequisites: Option<String>,

    #[arg(long)]
    pub published: Option<bool>,

    /// Cover image file.
    #[arg(long)]
    pub image: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum ModuleCommand {
    List { course_id: i64 },

    Add { course_id: i64, title: String },

    Rename { course_id: i64, module_id: i64, title: String },

    Delete {
        course_id: i64,
        module_id: i64,

        #[arg(long, short)]
        yes: bool,
    },

    /// Move the module at position ACTIVE onto position OVER.
    Move {
        course_id: i64,
        active: i32,
        over: i32,
        /// Send the new order right away
        #[arg(long)]
        save: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum LessonCommand {
    List { module_id: i64 },

    Show { module_id: i64, lesson_id: i64 },

    Add {
        module_id: i64,

        #[command(flatten)]
        fields: LessonArgs,
    },

    /// Edit a lesson; omitted fields keep their current value.
    Edit {
        module_id: i64,
        lesson_id: i64,

        #[command(flatten)]
        fields: LessonArgs,
    },

    Delete {
        module_id: i64,
        lesson_id: i64,

        #[arg(long, short)]
        yes: bool,
    },

    /// Move the lesson at position ACTIVE onto position OVER.
    Move {
        module_id: i64,
        active: i32,
        over: i32,
        /// Send the new order right away
        #[arg(long)]
        save: bool,
    },
}

#[derive(Args, Debug, Default, Clone)]
pub struct LessonArgs {
    #[arg(long)]
    pub title: Option<String>,

    /// video or task.
    #[arg(long = "type")]
    pub kind: Option<LessonKind>,

    /// unlock (public) or lock.
    #[arg(long)]
    pub visibility: Option<Visibility>,

    /// Public URL; required for unlocked lessons.
    #[arg(long)]
    pub url: Option<String>,
}

/// Build the client, restore the session, and run one command (or the shell)
pub async fn run(cli: Cli, config: Config) -> Result<ExitCode> {
    let store = Arc::new(FileTokenStore::new(config.session.token_path()));
    let state = AppState::build(config, store).context("Failed to build API client")?;
    state.session.init().await.context("Failed to restore session")?;

    let mut workspace = Workspace::new(state);

    if let Command::Shell = cli.command {
        shell::run(&mut workspace).await?;
        return Ok(ExitCode::SUCCESS);
    }

    let result = workspace.execute(cli.command).await;
    if result.is_ok() && workspace.has_pending() {
        workspace.show_pending();
        workspace
            .state()
            .notifier
            .info("Order not saved. Repeat the move with --save to send it.");
    }

    Ok(workspace.report(result))
}
