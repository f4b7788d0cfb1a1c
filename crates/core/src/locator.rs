//! Element locators

use serde::{Deserialize, Serialize};
use std::fmt;

/// Describes how to find an element on the live page: a CSS selector,
/// optionally narrowed to elements containing some text and/or to one match
/// by index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Locator {
    pub css: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_text: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nth: Option<usize>,
}

impl Locator {
    pub fn css(selector: impl Into<String>) -> Self {
        Self {
            css: selector.into(),
            has_text: None,
            nth: None,
        }
    }

    /// Elements matching `selector` whose text contains `text`; the first
    /// such element is used.
    pub fn containing(selector: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            css: selector.into(),
            has_text: Some(text.into()),
            nth: Some(0),
        }
    }

    pub fn first(self) -> Self {
        self.nth(0)
    }

    pub fn nth(mut self, index: usize) -> Self {
        self.nth = Some(index);
        self
    }
}

impl From<&str> for Locator {
    fn from(selector: &str) -> Self {
        Locator::css(selector)
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.css)?;
        if let Some(text) = &self.has_text {
            write!(f, ":has-text({:?})", text)?;
        }
        if let Some(nth) = self.nth {
            write!(f, " >> nth={}", nth)?;
        }
        Ok(())
    }
}

/// Selectors used by the setup wizard and the administrator backend.
pub mod selectors {
    // Installer: language step
    pub const LANGUAGE_DIALOG_BUTTON: &str = "button[data-joomla-dialog]";
    pub const LANGUAGE_SELECT: &str = "#jform_language";
    pub const DIALOG_CLOSE_BUTTON: &str = "button[data-button-close]";

    // Installer: site and admin steps
    pub const SITE_NAME: &str = "#jform_site_name";
    pub const STEP_ONE_BUTTON: &str = "#step1";
    pub const ADMIN_NAME: &str = "#jform_admin_user";
    pub const ADMIN_USERNAME: &str = "#jform_admin_username";
    pub const ADMIN_PASSWORD: &str = "#jform_admin_password";
    pub const ADMIN_EMAIL: &str = "#jform_admin_email";
    pub const STEP_TWO_BUTTON: &str = "#step2";

    // Installer: database step
    pub const DB_TYPE: &str = "#jform_db_type";
    pub const DB_HOST: &str = "#jform_db_host";
    pub const DB_USER: &str = "#jform_db_user";
    pub const DB_PASSWORD: &str = "#jform_db_pass";
    pub const DB_NAME: &str = "#jform_db_name";
    pub const DB_PREFIX: &str = "#jform_db_prefix";
    pub const SETUP_BUTTON: &str = "#setupButton";

    // Installer: completion
    pub const CONGRATULATION: &str = "#installCongrat";
    pub const COMPLETE_INSTALLATION_BUTTON: &str = "button.complete-installation";
    pub const COMPLETE_INSTALLATION: &str = ".complete-installation";
    pub const REMOVE_INSTALLATION_FOLDER: &str = "#removeInstallationFolder";

    // Installer: extra languages
    pub const ADD_FEATURES_BUTTON: &str = "#installAddFeatures";
    pub const INSTALL_LANGUAGES_BUTTON: &str = "#installLanguagesButton";
    pub const DEFAULT_LANGUAGES_BUTTON: &str = "#defaultLanguagesButton";
    pub const SYSTEM_MESSAGES: &str = "#system-message-container .alert-message";
    pub const SYSTEM_MESSAGE_CONTAINER: &str = "#system-message-container";

    // Administrator
    pub const LOGIN_USERNAME: &str = "#mod-login-username";
    pub const LOGIN_PASSWORD: &str = "#mod-login-password";
    pub const LOGIN_SUBMIT: &str = "#btn-login-submit";
    pub const TOUR_START: &str = ".shepherd-button-primary";
    pub const TOUR_CANCEL: &str = ".shepherd-cancel-icon";
    pub const TOUR_HIDE_FOREVER: &str = ".shepherd-button-secondary";
    pub const SEARCH_FIELD: &str = "#filter_search";
    pub const SEARCH_BUTTON: &str = ".filter-search-bar__button";
    pub const PLUGIN_ENABLED: &str = "select#jform_enabled";
    pub const SAVE_AND_CLOSE: &str = "button.button-save.btn.btn-success";
    pub const PAGE_TITLE: &str = ".page-title";
    pub const SERVER_TAB: &str = "div[role='tablist'] button[aria-controls='page-server']";
    pub const ERROR_REPORTING: &str = "#jform_error_reporting";
    pub const TOOLBAR_APPLY: &str = "#toolbar-apply button";
}
