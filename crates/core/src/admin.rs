//! Administrator backend chores commonly run right after installation

use std::sync::Arc;
use tracing::info;

use crate::config::{AdminIdentity, InstallerSettings};
use crate::driver::{NetworkInterceptor, UiDriver};
use crate::error::{InstallError, InstallResult};
use crate::expect::expect_exists;
use crate::locator::{selectors, Locator};
use crate::sync::{Route, SyncOutcome, SyncPoint};
use crate::variant::{self, TourDismissal, UiVariant};

pub const STATISTICS_PLUGIN: &str = "System - Joomla! Statistics";

/// Chores that need an administrator session on the same browser.
pub struct AdminTasks {
    driver: Arc<dyn UiDriver>,
    network: Arc<dyn NetworkInterceptor>,
    settings: InstallerSettings,
}

impl AdminTasks {
    pub fn new(driver: Arc<dyn UiDriver>, network: Arc<dyn NetworkInterceptor>, settings: InstallerSettings) -> Self {
        Self {
            driver,
            network,
            settings,
        }
    }

    pub async fn login(&self, admin: &AdminIdentity) -> InstallResult<()> {
        info!("**Administrator login** ({})", admin.username);
        let driver = self.driver.as_ref();

        driver.visit("administrator/index.php").await?;
        driver.get(selectors::LOGIN_USERNAME).replace_text(&admin.username).await?;
        driver.get(selectors::LOGIN_PASSWORD).replace_text(&admin.password).await?;
        driver.get(selectors::LOGIN_SUBMIT).click().await?;
        expect_exists(driver, "login", &Locator::css(selectors::PAGE_TITLE), self.settings.assertion_timeout).await
    }

    /// Close the welcome tour shown on first administrator login.
    ///
    /// Prefers hiding tours for good; older versions only offer cancelling.
    pub async fn cancel_tour(&self) -> InstallResult<()> {
        info!("**Cancel Tour**");
        let driver = self.driver.as_ref();

        // The overlay is built by script after the page loads.
        expect_exists(
            driver,
            TourDismissal::STEP,
            &Locator::css(selectors::TOUR_START),
            self.settings.assertion_timeout,
        )
        .await?;

        match variant::resolve::<TourDismissal, _>(driver).await? {
            TourDismissal::HideForever => driver.get(selectors::TOUR_HIDE_FOREVER).click().await?,
            TourDismissal::Cancel => driver.get(selectors::TOUR_CANCEL).click().await?,
        }

        info!("--Cancel Tour--");
        Ok(())
    }

    /// Switch the statistics plugin off. Safe to repeat.
    pub async fn disable_statistics(&self) -> InstallResult<()> {
        info!("**Disable Statistics**");
        let driver = self.driver.as_ref();

        driver.visit("administrator/index.php?option=com_plugins&view=plugins").await?;
        self.search_for_item(STATISTICS_PLUGIN).await?;
        driver.get(Locator::containing("a", STATISTICS_PLUGIN)).click().await?;
        driver.get(selectors::PLUGIN_ENABLED).select("Disabled").await?;
        driver.get(selectors::SAVE_AND_CLOSE).click().await?;

        info!("--Disable Statistics--");
        Ok(())
    }

    /// Set global error reporting to "Maximum" and save.
    pub async fn set_error_reporting_to_development(&self) -> InstallResult<()> {
        info!("**Set error reporting to dev mode**");
        let driver = self.driver.as_ref();
        let step = "error-reporting";
        let title = Locator::containing(selectors::PAGE_TITLE, "Global Configuration");

        driver.visit("administrator/index.php?option=com_config").await?;
        driver.get(title.clone()).scroll_into_view().await?;
        driver.get(selectors::SERVER_TAB).click().await?;
        driver.get(selectors::ERROR_REPORTING).select("Maximum").await?;

        let sync = SyncPoint::open(
            self.network.as_ref(),
            vec![Route::new("config_save", "index.php?option=com_config*")?],
        )
        .await?;
        driver.get(selectors::TOOLBAR_APPLY).click().await?;
        if let SyncOutcome::TimedOut { pending } = sync.await_all(self.settings.request_timeout).await {
            return Err(InstallError::SyncTimeout {
                step: step.to_string(),
                pending,
                timeout_ms: self.settings.request_timeout.as_millis() as u64,
            });
        }

        expect_exists(driver, step, &title, self.settings.assertion_timeout).await?;
        expect_exists(
            driver,
            step,
            &Locator::containing(selectors::SYSTEM_MESSAGE_CONTAINER, "Configuration saved."),
            self.settings.assertion_timeout,
        )
        .await?;

        info!("--Set error reporting to dev mode--");
        Ok(())
    }

    async fn search_for_item(&self, name: &str) -> InstallResult<()> {
        let driver = self.driver.as_ref();
        driver.get(selectors::SEARCH_FIELD).replace_text(name).await?;
        driver.get(selectors::SEARCH_BUTTON).click().await
    }
}
