//! Assertions with implicit waiting
//!
//! The page settles asynchronously, so each assertion re-checks until it
//! holds or its timeout runs out.

use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, Instant};

use crate::driver::UiDriver;
use crate::error::{InstallError, InstallResult};
use crate::locator::Locator;

const RECHECK_INTERVAL: Duration = Duration::from_millis(100);

/// Run `check` until it reports `None` (satisfied). On timeout, the last
/// observation it reported is returned as the error detail.
async fn retry_until<F, Fut>(step: &str, timeout: Duration, mut check: F) -> InstallResult<()>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = InstallResult<Option<String>>>,
{
    let deadline = Instant::now() + timeout;
    loop {
        let observed = match check().await? {
            None => return Ok(()),
            Some(observed) => observed,
        };
        if Instant::now() >= deadline {
            return Err(InstallError::assertion(
                step,
                format!("{} (after {} ms)", observed, timeout.as_millis()),
            ));
        }
        sleep(RECHECK_INTERVAL).await;
    }
}

pub async fn expect_exists(driver: &dyn UiDriver, step: &str, locator: &Locator, timeout: Duration) -> InstallResult<()> {
    retry_until(step, timeout, || async move {
        Ok((!driver.exists(locator).await?).then(|| format!("expected {} to exist", locator)))
    })
    .await
}

pub async fn expect_visible(driver: &dyn UiDriver, step: &str, locator: &Locator, timeout: Duration) -> InstallResult<()> {
    retry_until(step, timeout, || async move {
        Ok((!driver.is_visible(locator).await?).then(|| format!("expected {} to be visible", locator)))
    })
    .await
}

pub async fn expect_count(
    driver: &dyn UiDriver,
    step: &str,
    locator: &Locator,
    expected: usize,
    timeout: Duration,
) -> InstallResult<()> {
    retry_until(step, timeout, || async move {
        let found = driver.count(locator).await?;
        Ok((found != expected).then(|| format!("expected {} element(s) matching {}, found {}", expected, locator, found)))
    })
    .await
}
