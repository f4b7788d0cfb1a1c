//! Install Commands

use clap::Args;
use webinstall_core::{InstallConfig, InstallResult, LanguageSelection};

use crate::session::Session;

#[derive(Args, Debug)]
pub struct MultilingualArgs {
    /// Content language to install, by its label in the list (repeatable; default: French)
    #[arg(short, long = "language", value_name = "LANGUAGE")]
    pub languages: Vec<String>,
}

impl MultilingualArgs {
    pub fn selection(&self) -> LanguageSelection {
        LanguageSelection::new(self.languages.iter().cloned())
    }
}

pub async fn single(session: &Session, config: &InstallConfig) -> InstallResult<()> {
    session.installer().install_single_language(config).await
}

pub async fn multilingual(args: &MultilingualArgs, session: &Session, config: &InstallConfig) -> InstallResult<()> {
    session.installer().install_multilingual(config, &args.selection()).await
}
