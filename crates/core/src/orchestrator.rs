//! Installation orchestrator
//!
//! Drives the setup wizard step by step:
//!
//! ```text
//! LanguageSelect → SiteInfo → AdminCredentials → DatabaseConfig → SubmitSync → Congratulation
//!   ├── single language: CompleteInstallation
//!   └── multilingual:    AddFeatures → SelectLanguages → InstallLanguages
//!                        → DefaultLanguages → RemoveInstallation → PollUntilGone
//! ```
//!
//! One action at a time against one page. Every step waits until its effect
//! is observable before the next one starts, and the first failure ends the
//! run. The teardown poll is the only retry.

use std::fmt;
use std::sync::Arc;
use tracing::{info, info_span, Instrument};

use crate::config::{InstallConfig, InstallerSettings, LanguageSelection};
use crate::driver::{ClickOptions, HttpProbe, NetworkInterceptor, UiDriver};
use crate::error::{InstallError, InstallResult};
use crate::expect::{expect_count, expect_exists, expect_visible};
use crate::locator::{selectors, Locator};
use crate::poll::{confirm_gone, PollOutcome};
use crate::sync::{installer_routes, SyncOutcome, SyncPoint};
use crate::variant::{self, CompletionControl, LanguageSelector, Teardown};

/// Language the wizard itself is driven in, whatever extra languages are
/// installed later.
pub const INSTALLER_LANGUAGE: &str = "en-GB";

/// Notifications shown once extra languages are installed and set as
/// defaults.
const EXPECTED_LANGUAGE_NOTICES: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallStep {
    LanguageSelect,
    SiteInfo,
    AdminCredentials,
    DatabaseConfig,
    SubmitSync,
    Congratulation,
    CompleteInstallation,
    AddFeatures,
    SelectLanguages,
    InstallLanguages,
    DefaultLanguages,
    RemoveInstallation,
    PollUntilGone,
}

impl InstallStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            InstallStep::LanguageSelect => "language-select",
            InstallStep::SiteInfo => "site-info",
            InstallStep::AdminCredentials => "admin-credentials",
            InstallStep::DatabaseConfig => "database-config",
            InstallStep::SubmitSync => "submit-sync",
            InstallStep::Congratulation => "congratulation",
            InstallStep::CompleteInstallation => "complete-installation",
            InstallStep::AddFeatures => "add-features",
            InstallStep::SelectLanguages => "select-languages",
            InstallStep::InstallLanguages => "install-languages",
            InstallStep::DefaultLanguages => "default-languages",
            InstallStep::RemoveInstallation => "remove-installation",
            InstallStep::PollUntilGone => "poll-until-gone",
        }
    }
}

impl fmt::Display for InstallStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Runs installations against one browser session.
pub struct Installer {
    driver: Arc<dyn UiDriver>,
    network: Arc<dyn NetworkInterceptor>,
    probe: Arc<dyn HttpProbe>,
    settings: InstallerSettings,
}

impl Installer {
    pub fn new(
        driver: Arc<dyn UiDriver>,
        network: Arc<dyn NetworkInterceptor>,
        probe: Arc<dyn HttpProbe>,
        settings: InstallerSettings,
    ) -> Self {
        Self {
            driver,
            network,
            probe,
            settings,
        }
    }

    /// Install with the wizard's language only, then finish the wizard.
    pub async fn install_single_language(&self, config: &InstallConfig) -> InstallResult<()> {
        info!("**Install site**");
        config.validate()?;

        self.run_wizard(config).await?;
        self.complete_installation()
            .instrument(info_span!("step", name = %InstallStep::CompleteInstallation))
            .await?;

        info!("--Install site--");
        Ok(())
    }

    /// Install, add `languages` through the wizard's extra-features page, make
    /// them site defaults, remove the installer and confirm it is gone.
    pub async fn install_multilingual(&self, config: &InstallConfig, languages: &LanguageSelection) -> InstallResult<()> {
        info!("**Install multilingual site** ({})", languages.labels().join(", "));
        config.validate()?;

        self.run_wizard(config).await?;

        self.add_features()
            .instrument(info_span!("step", name = %InstallStep::AddFeatures))
            .await?;
        self.select_languages(languages)
            .instrument(info_span!("step", name = %InstallStep::SelectLanguages))
            .await?;
        self.install_languages()
            .instrument(info_span!("step", name = %InstallStep::InstallLanguages))
            .await?;
        self.default_languages()
            .instrument(info_span!("step", name = %InstallStep::DefaultLanguages))
            .await?;
        self.remove_installation()
            .instrument(info_span!("step", name = %InstallStep::RemoveInstallation))
            .await?;
        self.poll_until_gone()
            .instrument(info_span!("step", name = %InstallStep::PollUntilGone))
            .await?;

        info!("Site is now installed");
        info!("--Install multilingual site--");
        Ok(())
    }

    /// Steps shared by both flows, ending on the congratulation page.
    async fn run_wizard(&self, config: &InstallConfig) -> InstallResult<()> {
        self.driver.visit(&self.settings.installer_path).await?;

        self.select_installer_language()
            .instrument(info_span!("step", name = %InstallStep::LanguageSelect))
            .await?;
        self.fill_site_info(config)
            .instrument(info_span!("step", name = %InstallStep::SiteInfo))
            .await?;
        self.fill_admin_credentials(config)
            .instrument(info_span!("step", name = %InstallStep::AdminCredentials))
            .await?;
        self.fill_database(config)
            .instrument(info_span!("step", name = %InstallStep::DatabaseConfig))
            .await?;
        self.submit_and_sync()
            .instrument(info_span!("step", name = %InstallStep::SubmitSync))
            .await?;
        expect_visible(
            self.driver.as_ref(),
            InstallStep::Congratulation.as_str(),
            &Locator::css(selectors::CONGRATULATION),
            self.settings.assertion_timeout,
        )
        .instrument(info_span!("step", name = %InstallStep::Congratulation))
        .await
    }

    async fn select_installer_language(&self) -> InstallResult<()> {
        let driver = self.driver.as_ref();
        let language = Locator::css(selectors::LANGUAGE_SELECT);
        let step = InstallStep::LanguageSelect.as_str();

        match variant::resolve::<LanguageSelector, _>(driver).await? {
            LanguageSelector::DialogGated => {
                driver
                    .get(selectors::LANGUAGE_DIALOG_BUTTON)
                    .click_with(ClickOptions::forced())
                    .await?;
                expect_visible(driver, step, &language, self.settings.assertion_timeout).await?;
                driver.get(language).select(INSTALLER_LANGUAGE).await?;
                driver
                    .get(selectors::DIALOG_CLOSE_BUTTON)
                    .click_with(ClickOptions::forced())
                    .await?;
            }
            LanguageSelector::Direct => {
                expect_visible(driver, step, &language, self.settings.assertion_timeout).await?;
                driver.get(language).select(INSTALLER_LANGUAGE).await?;
            }
        }
        Ok(())
    }

    async fn fill_site_info(&self, config: &InstallConfig) -> InstallResult<()> {
        let driver = self.driver.as_ref();
        driver.get(selectors::SITE_NAME).type_text(&config.site_name).await?;
        driver.get(selectors::STEP_ONE_BUTTON).click().await
    }

    async fn fill_admin_credentials(&self, config: &InstallConfig) -> InstallResult<()> {
        let driver = self.driver.as_ref();
        let admin = &config.admin;
        driver.get(selectors::ADMIN_NAME).type_text(&admin.name).await?;
        driver.get(selectors::ADMIN_USERNAME).type_text(&admin.username).await?;
        driver.get(selectors::ADMIN_PASSWORD).type_text(&admin.password).await?;
        driver.get(selectors::ADMIN_EMAIL).type_text(&admin.email).await?;
        driver.get(selectors::STEP_TWO_BUTTON).click().await
    }

    async fn fill_database(&self, config: &InstallConfig) -> InstallResult<()> {
        let driver = self.driver.as_ref();
        let db = &config.database;
        let connection = config.connection_string();
        info!("Database {} at {}", db.dialect, connection);

        driver.get(selectors::DB_TYPE).select(db.dialect.option_value()).await?;
        driver.get(selectors::DB_HOST).replace_text(&connection).await?;
        driver.get(selectors::DB_USER).type_text(&db.user).await?;
        if let Some(password) = db.password.as_deref().filter(|p| !p.is_empty()) {
            driver.get(selectors::DB_PASSWORD).type_text(password).await?;
        }
        driver.get(selectors::DB_NAME).replace_text(&db.name).await?;
        driver.get(selectors::DB_PREFIX).replace_text(&db.prefix).await
    }

    async fn submit_and_sync(&self) -> InstallResult<()> {
        let sync = SyncPoint::open(self.network.as_ref(), installer_routes()?).await?;
        self.driver.get(selectors::SETUP_BUTTON).click().await?;

        let timeout = self.settings.sync_timeout;
        match sync.await_all(timeout).await {
            SyncOutcome::Satisfied => {
                info!("Installer backend calls completed");
                Ok(())
            }
            SyncOutcome::TimedOut { pending } => Err(InstallError::SyncTimeout {
                step: InstallStep::SubmitSync.to_string(),
                pending,
                timeout_ms: timeout.as_millis() as u64,
            }),
        }
    }

    async fn complete_installation(&self) -> InstallResult<()> {
        let driver = self.driver.as_ref();
        match variant::resolve_optional::<CompletionControl, _>(driver).await? {
            // Two identical buttons are rendered; either one completes.
            Some(CompletionControl::CompleteButton) => {
                driver
                    .get(selectors::COMPLETE_INSTALLATION_BUTTON)
                    .first()
                    .click()
                    .await
            }
            None => {
                info!("No completion control rendered, installation finished on its own");
                Ok(())
            }
        }
    }

    /// Open the extra-features section. The section has no stable selector;
    /// its legend repeats the text of the button that opened it.
    async fn add_features(&self) -> InstallResult<()> {
        let driver = self.driver.as_ref();
        let button = driver.get(selectors::ADD_FEATURES_BUTTON);
        let label = button.text().await?.trim().to_string();
        button.click().await?;

        let section = Locator::containing("legend", label);
        expect_exists(
            driver,
            InstallStep::AddFeatures.as_str(),
            &section,
            self.settings.assertion_timeout,
        )
        .await
    }

    async fn select_languages(&self, languages: &LanguageSelection) -> InstallResult<()> {
        for language in languages.labels() {
            self.driver
                .get(Locator::containing("label", language.as_str()))
                .click()
                .await?;
        }
        Ok(())
    }

    async fn install_languages(&self) -> InstallResult<()> {
        let driver = self.driver.as_ref();
        driver.get(selectors::INSTALL_LANGUAGES_BUTTON).click().await?;
        expect_visible(
            driver,
            InstallStep::InstallLanguages.as_str(),
            &Locator::css(selectors::CONGRATULATION),
            self.settings.language_install_timeout,
        )
        .await
    }

    async fn default_languages(&self) -> InstallResult<()> {
        let driver = self.driver.as_ref();
        driver.get(selectors::DEFAULT_LANGUAGES_BUTTON).click().await?;
        expect_count(
            driver,
            InstallStep::DefaultLanguages.as_str(),
            &Locator::css(selectors::SYSTEM_MESSAGES),
            EXPECTED_LANGUAGE_NOTICES,
            self.settings.assertion_timeout,
        )
        .await
    }

    async fn remove_installation(&self) -> InstallResult<()> {
        let driver = self.driver.as_ref();
        match variant::resolve::<Teardown, _>(driver).await? {
            Teardown::RemoveFolderButton => driver.get(selectors::REMOVE_INSTALLATION_FOLDER).click().await,
            Teardown::CompleteButton => driver.get(selectors::COMPLETE_INSTALLATION).nth(0).click().await,
        }
    }

    async fn poll_until_gone(&self) -> InstallResult<()> {
        let url = &self.settings.probe_url;
        match confirm_gone(self.probe.as_ref(), url, self.settings.poll).await? {
            PollOutcome::Confirmed { attempts } => {
                info!("{} answers 404 after {} attempt(s)", url, attempts);
                Ok(())
            }
            PollOutcome::Exhausted { attempts, last_status } => Err(InstallError::PollExhausted {
                url: url.clone(),
                attempts,
                last_status,
            }),
        }
    }
}
