//! Collaborator interfaces: browser, network interception, HTTP probe
//!
//! Implementations are expected to be reliable; the orchestrator only
//! tolerates their latency.

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::mpsc;

use crate::error::InstallResult;
use crate::locator::Locator;
use crate::sync::Route;

/// Instant, non-waiting view of the live page.
#[async_trait]
pub trait Snapshot: Send + Sync {
    /// Whether at least one element matches right now.
    async fn exists(&self, locator: &Locator) -> InstallResult<bool>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ClickOptions {
    /// Skip actionability checks (element covered, animating, ...)
    pub force: bool,
}

impl ClickOptions {
    pub fn forced() -> Self {
        Self { force: true }
    }
}

/// Browser session driving one page.
///
/// Actions wait implicitly for their element up to the driver's ambient
/// timeout before failing. `count` and `is_visible` answer immediately.
#[async_trait]
pub trait UiDriver: Snapshot {
    /// Navigate to `path`, relative to the site base URL
    async fn visit(&self, path: &str) -> InstallResult<()>;

    async fn count(&self, locator: &Locator) -> InstallResult<usize>;

    async fn is_visible(&self, locator: &Locator) -> InstallResult<bool>;

    async fn click(&self, locator: &Locator, options: ClickOptions) -> InstallResult<()>;

    async fn type_text(&self, locator: &Locator, text: &str) -> InstallResult<()>;

    /// Choose an `<option>` by value or label
    async fn select(&self, locator: &Locator, value: &str) -> InstallResult<()>;

    async fn clear(&self, locator: &Locator) -> InstallResult<()>;

    async fn scroll_into_view(&self, locator: &Locator) -> InstallResult<()>;

    async fn text(&self, locator: &Locator) -> InstallResult<String>;
}

impl dyn UiDriver + '_ {
    /// Handle to the element(s) matched by `locator`.
    pub fn get(&self, locator: impl Into<Locator>) -> Element<'_> {
        Element {
            driver: self,
            locator: locator.into(),
        }
    }
}

/// A located element bound to its driver.
pub struct Element<'a> {
    driver: &'a dyn UiDriver,
    locator: Locator,
}

impl<'a> Element<'a> {
    pub fn first(self) -> Self {
        Self {
            driver: self.driver,
            locator: self.locator.first(),
        }
    }

    pub fn nth(self, index: usize) -> Self {
        Self {
            driver: self.driver,
            locator: self.locator.nth(index),
        }
    }

    pub async fn click(&self) -> InstallResult<()> {
        self.driver.click(&self.locator, ClickOptions::default()).await
    }

    pub async fn click_with(&self, options: ClickOptions) -> InstallResult<()> {
        self.driver.click(&self.locator, options).await
    }

    pub async fn type_text(&self, text: &str) -> InstallResult<()> {
        self.driver.type_text(&self.locator, text).await
    }

    /// Clear the field, then type `text`
    pub async fn replace_text(&self, text: &str) -> InstallResult<()> {
        self.driver.clear(&self.locator).await?;
        self.driver.type_text(&self.locator, text).await
    }

    pub async fn select(&self, value: &str) -> InstallResult<()> {
        self.driver.select(&self.locator, value).await
    }

    pub async fn clear(&self) -> InstallResult<()> {
        self.driver.clear(&self.locator).await
    }

    pub async fn scroll_into_view(&self) -> InstallResult<()> {
        self.driver.scroll_into_view(&self.locator).await
    }

    pub async fn text(&self) -> InstallResult<String> {
        self.driver.text(&self.locator).await
    }
}

/// Observes outgoing requests made by the page.
#[async_trait]
pub trait NetworkInterceptor: Send + Sync {
    /// From now on, send `route.alias` on `notify` each time a request
    /// matching `route.pattern` completes. Reporting stops once the receiver
    /// is dropped.
    async fn intercept(&self, route: Route, notify: mpsc::UnboundedSender<String>) -> InstallResult<()>;
}

/// Issues a plain GET and reports the status code, whatever it is.
#[async_trait]
pub trait HttpProbe: Send + Sync {
    async fn status(&self, url: &str) -> InstallResult<u16>;
}
