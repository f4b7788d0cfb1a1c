//! Bounded polling until a URL stops being served

use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::driver::HttpProbe;
use crate::error::InstallResult;

const NOT_FOUND: u16 = 404;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            interval: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    Confirmed { attempts: u32 },
    Exhausted { attempts: u32, last_status: u16 },
}

/// Probe `url` until it answers 404 or the attempt budget runs out.
///
/// Any status other than 404 (including 2xx and 5xx) means "still there";
/// transport errors from the probe are propagated. At least one probe is
/// always sent.
pub async fn confirm_gone(probe: &dyn HttpProbe, url: &str, policy: PollPolicy) -> InstallResult<PollOutcome> {
    let max_attempts = policy.max_attempts.max(1);
    let mut attempts = 0;
    let mut last_status = 0;

    while attempts < max_attempts {
        attempts += 1;
        last_status = probe.status(url).await?;
        debug!("Probe {} attempt {}/{}: {}", url, attempts, max_attempts, last_status);

        if last_status == NOT_FOUND {
            return Ok(PollOutcome::Confirmed { attempts });
        }
        if attempts < max_attempts {
            warn!("{} still answers {}, retrying in {:?}", url, last_status, policy.interval);
            sleep(policy.interval).await;
        }
    }

    Ok(PollOutcome::Exhausted { attempts, last_status })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tokio::time::Instant;

    /// Replays a fixed list of statuses, repeating the last one.
    struct Scripted {
        statuses: Vec<u16>,
        calls: Mutex<usize>,
    }

    impl Scripted {
        fn new(statuses: &[u16]) -> Self {
            Self {
                statuses: statuses.to_vec(),
                calls: Mutex::new(0),
            }
        }

        fn calls(&self) -> usize {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl HttpProbe for Scripted {
        async fn status(&self, _url: &str) -> InstallResult<u16> {
            let mut calls = self.calls.lock().unwrap();
            let status = self.statuses[(*calls).min(self.statuses.len() - 1)];
            *calls += 1;
            Ok(status)
        }
    }

    const URL: &str = "http://localhost/installation";

    #[tokio::test(start_paused = true)]
    async fn test_confirmed_first_try() {
        let probe = Scripted::new(&[404]);
        let started = Instant::now();
        let outcome = confirm_gone(&probe, URL, PollPolicy::default()).await.unwrap();
        assert_eq!(outcome, PollOutcome::Confirmed { attempts: 1 });
        assert_eq!(probe.calls(), 1);
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stops_at_first_404() {
        let probe = Scripted::new(&[200, 301, 500, 404, 200]);
        let started = Instant::now();
        let outcome = confirm_gone(&probe, URL, PollPolicy::default()).await.unwrap();
        assert_eq!(outcome, PollOutcome::Confirmed { attempts: 4 });
        assert_eq!(probe.calls(), 4);
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(3) && elapsed < Duration::from_secs(4));
    }

    #[tokio::test(start_paused = true)]
    async fn test_404_on_last_attempt() {
        let mut statuses = vec![200; 9];
        statuses.push(404);
        let probe = Scripted::new(&statuses);
        let outcome = confirm_gone(&probe, URL, PollPolicy::default()).await.unwrap();
        assert_eq!(outcome, PollOutcome::Confirmed { attempts: 10 });
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_after_ten() {
        let probe = Scripted::new(&[200]);
        let outcome = confirm_gone(&probe, URL, PollPolicy::default()).await.unwrap();
        assert_eq!(outcome, PollOutcome::Exhausted { attempts: 10, last_status: 200 });
        assert_eq!(probe.calls(), 10);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_budget_still_probes_once() {
        let policy = PollPolicy { max_attempts: 0, interval: Duration::from_secs(1) };

        let gone = Scripted::new(&[404]);
        assert_eq!(confirm_gone(&gone, URL, policy).await.unwrap(), PollOutcome::Confirmed { attempts: 1 });

        let present = Scripted::new(&[503]);
        assert_eq!(
            confirm_gone(&present, URL, policy).await.unwrap(),
            PollOutcome::Exhausted { attempts: 1, last_status: 503 }
        );
        assert_eq!(present.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_repeated_runs_are_independent() {
        let policy = PollPolicy { max_attempts: 3, interval: Duration::from_millis(10) };
        let first = Scripted::new(&[200]);
        assert!(matches!(confirm_gone(&first, URL, policy).await.unwrap(), PollOutcome::Exhausted { attempts: 3, .. }));

        let second = Scripted::new(&[200, 404]);
        assert_eq!(confirm_gone(&second, URL, policy).await.unwrap(), PollOutcome::Confirmed { attempts: 2 });
    }
}
