//! CLI Commands

pub mod admin;
pub mod install;

use clap::Subcommand;
use webinstall_core::{InstallConfig, InstallResult};

use crate::session::Session;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Install a single-language site and finish the wizard
    Install,

    /// Install a site with additional content languages
    Multilingual(install::MultilingualArgs),

    /// Run a post-install task in the administrator backend
    Admin(admin::AdminArgs),
}

impl Commands {
    /// Name shown in the run summary
    pub fn flow(&self) -> String {
        match self {
            Commands::Install => "install".to_string(),
            Commands::Multilingual(_) => "multilingual".to_string(),
            Commands::Admin(args) => format!("admin {}", args.task.as_str()),
        }
    }

    pub async fn execute(&self, session: &Session, config: &InstallConfig) -> InstallResult<()> {
        match self {
            Commands::Install => install::single(session, config).await,
            Commands::Multilingual(args) => install::multilingual(args, session, config).await,
            Commands::Admin(args) => admin::execute(args, session, config).await,
        }
    }
}
