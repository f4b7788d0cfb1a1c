//! Browser session shared by every subcommand

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use webinstall_browser::{Browser, PlaywrightBridge, PlaywrightConfig, ReqwestProbe};
use webinstall_core::{AdminTasks, HttpProbe, InstallerSettings, Installer, NetworkInterceptor, UiDriver};

/// Everything needed to bring up the collaborators.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub base_url: String,
    pub browser: Browser,
    pub headed: bool,
    pub playwright_dir: PathBuf,
    pub action_timeout: Duration,
    pub sync_timeout: Duration,
    pub language_timeout: Duration,
}

impl SessionOptions {
    pub fn installer_settings(&self) -> InstallerSettings {
        InstallerSettings {
            sync_timeout: self.sync_timeout,
            language_install_timeout: self.language_timeout,
            assertion_timeout: self.action_timeout,
            ..InstallerSettings::for_base_url(&self.base_url)
        }
    }

    pub fn playwright_config(&self) -> PlaywrightConfig {
        PlaywrightConfig {
            base_url: self.base_url.clone(),
            browser: self.browser,
            headless: !self.headed,
            action_timeout: self.action_timeout,
            working_dir: self.playwright_dir.clone(),
            ..PlaywrightConfig::default()
        }
    }
}

pub struct Session {
    bridge: Arc<PlaywrightBridge>,
    probe: Arc<ReqwestProbe>,
    settings: InstallerSettings,
}

impl Session {
    pub async fn start(options: &SessionOptions) -> Result<Self> {
        let settings = options.installer_settings();
        let probe = ReqwestProbe::new(settings.request_timeout).context("Failed to build HTTP client")?;
        let bridge = PlaywrightBridge::launch(options.playwright_config())
            .await
            .context("Failed to launch browser")?;

        info!("Browser session ready");
        Ok(Self {
            bridge: Arc::new(bridge),
            probe: Arc::new(probe),
            settings,
        })
    }

    pub fn installer(&self) -> Installer {
        Installer::new(self.driver(), self.network(), self.probe.clone() as Arc<dyn HttpProbe>, self.settings.clone())
    }

    pub fn admin_tasks(&self) -> AdminTasks {
        AdminTasks::new(self.driver(), self.network(), self.settings.clone())
    }

    fn driver(&self) -> Arc<dyn UiDriver> {
        self.bridge.clone()
    }

    fn network(&self) -> Arc<dyn NetworkInterceptor> {
        self.bridge.clone()
    }

    pub async fn close(self) {
        if let Err(e) = self.bridge.close().await {
            warn!("Browser did not shut down cleanly: {}", e);
        }
    }
}
