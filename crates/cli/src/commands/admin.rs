//! Administrator Commands

use clap::{Args, ValueEnum};
use webinstall_core::{InstallConfig, InstallResult};

use crate::session::Session;

#[derive(Args, Debug)]
pub struct AdminArgs {
    /// Task to run after logging in with the configured super user
    #[arg(value_enum)]
    pub task: AdminTask,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AdminTask {
    /// Dismiss the guided tour overlay
    Tour,
    /// Disable the statistics plugin
    Statistics,
    /// Switch error reporting to maximum
    ErrorReporting,
}

impl AdminTask {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdminTask::Tour => "tour",
            AdminTask::Statistics => "statistics",
            AdminTask::ErrorReporting => "error-reporting",
        }
    }
}

pub async fn execute(args: &AdminArgs, session: &Session, config: &InstallConfig) -> InstallResult<()> {
    let tasks = session.admin_tasks();
    tasks.login(&config.admin).await?;

    match args.task {
        AdminTask::Tour => tasks.cancel_tour().await,
        AdminTask::Statistics => tasks.disable_statistics().await,
        AdminTask::ErrorReporting => tasks.set_error_reporting_to_development().await,
    }
}
