//! Named barrier over asynchronous backend requests

use regex::Regex;
use std::collections::BTreeSet;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{timeout_at, Instant};
use tracing::debug;

use crate::driver::NetworkInterceptor;
use crate::error::{InstallError, InstallResult};

/// Glob over request URLs. `*` matches any run of characters; everything
/// else is literal. The pattern is matched against the tail of the URL
/// starting at a `/` boundary, so relative patterns match absolute URLs.
#[derive(Debug, Clone)]
pub struct RoutePattern {
    raw: String,
    regex: Regex,
}

impl RoutePattern {
    pub fn new(pattern: &str) -> InstallResult<Self> {
        let body = pattern
            .split('*')
            .map(regex::escape)
            .collect::<Vec<_>>()
            .join(".*");
        let regex = Regex::new(&format!("(?:^|/){}$", body.trim_start_matches('/')))
            .map_err(|e| InstallError::InvalidConfig(format!("bad route pattern '{}': {}", pattern, e)))?;
        Ok(Self {
            raw: pattern.to_string(),
            regex,
        })
    }

    pub fn matches(&self, url: &str) -> bool {
        self.regex.is_match(url)
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

/// A request the page is expected to make, under a short name.
#[derive(Debug, Clone)]
pub struct Route {
    pub alias: String,
    pub pattern: RoutePattern,
}

impl Route {
    pub fn new(alias: &str, pattern: &str) -> InstallResult<Self> {
        Ok(Self {
            alias: alias.to_string(),
            pattern: RoutePattern::new(pattern)?,
        })
    }
}

/// Backend calls made by the wizard after the setup button is pressed.
/// They may finish in any order.
pub fn installer_routes() -> InstallResult<Vec<Route>> {
    [
        ("ajax_create", "index.php?task=installation.create*"),
        ("ajax_populate1", "index.php?task=installation.populate1*"),
        ("ajax_populate2", "index.php?task=installation.populate2*"),
        ("ajax_populate3", "index.php?task=installation.populate3*"),
        ("finished", "index.php?view=remove&layout=default"),
    ]
    .into_iter()
    .map(|(alias, pattern)| Route::new(alias, pattern))
    .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    Satisfied,
    /// Deadline passed; lists the aliases never observed
    TimedOut { pending: Vec<String> },
}

/// Open barrier over a set of routes. Must be opened before the action that
/// triggers the requests, otherwise a fast request can be missed.
pub struct SyncPoint {
    pending: BTreeSet<String>,
    events: mpsc::UnboundedReceiver<String>,
}

impl SyncPoint {
    /// Register interest in every route.
    pub async fn open(network: &dyn NetworkInterceptor, routes: Vec<Route>) -> InstallResult<Self> {
        let (tx, events) = mpsc::unbounded_channel();
        let mut pending = BTreeSet::new();

        for route in routes {
            debug!("Intercepting {} as @{}", route.pattern.as_str(), route.alias);
            pending.insert(route.alias.clone());
            network.intercept(route, tx.clone()).await?;
        }

        Ok(Self { pending, events })
    }

    /// Aliases not yet observed
    pub fn pending(&self) -> Vec<String> {
        self.pending.iter().cloned().collect()
    }

    /// Wait until every route has been observed at least once, or until
    /// `timeout` elapses.
    pub async fn await_all(mut self, timeout: Duration) -> SyncOutcome {
        let deadline = Instant::now() + timeout;

        while !self.pending.is_empty() {
            match timeout_at(deadline, self.events.recv()).await {
                Ok(Some(alias)) => {
                    if self.pending.remove(&alias) {
                        debug!("Observed @{} ({} pending)", alias, self.pending.len());
                    }
                }
                // Every interceptor is gone; nothing more can arrive.
                Ok(None) => {
                    debug!("Interceptors closed with {} pending", self.pending.len());
                    break;
                }
                Err(_) => break,
            }
        }

        if self.pending.is_empty() {
            SyncOutcome::Satisfied
        } else {
            SyncOutcome::TimedOut {
                pending: self.pending(),
            }
        }
    }
}
