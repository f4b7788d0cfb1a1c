//! Playwright browser automation
//!
//! A small Node.js bridge script owns the browser. Rust talks to it over the
//! child's stdin/stdout, one JSON message per line (see [`crate::protocol`]),
//! so page state lives across calls and requests made by the page can be
//! observed as they finish.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command as TokioCommand};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use webinstall_core::{
    ClickOptions, InstallResult, Locator, NetworkInterceptor, Route, Snapshot, UiDriver,
};

use crate::error::{BrowserError, BrowserResult};
use crate::protocol::{Command as BridgeCommand, Message, Op, Reply};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Browser {
    #[default]
    Chromium,
    Firefox,
    Webkit,
}

impl Browser {
    pub fn as_str(&self) -> &'static str {
        match self {
            Browser::Chromium => "chromium",
            Browser::Firefox => "firefox",
            Browser::Webkit => "webkit",
        }
    }
}

impl std::str::FromStr for Browser {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "chromium" | "chrome" => Ok(Browser::Chromium),
            "firefox" => Ok(Browser::Firefox),
            "webkit" | "safari" => Ok(Browser::Webkit),
            other => Err(format!("unknown browser '{}'", other)),
        }
    }
}

/// Configuration for Playwright
#[derive(Debug, Clone)]
pub struct PlaywrightConfig {
    /// Site root; wizard and administrator paths are resolved against it
    pub base_url: String,
    pub browser: Browser,
    pub headless: bool,
    pub viewport_width: u32,
    pub viewport_height: u32,
    /// Ambient wait applied to every element action
    pub action_timeout: Duration,
    /// How long to wait for the browser to come up
    pub launch_timeout: Duration,
    /// Node executable
    pub node_binary: PathBuf,
    /// Directory `playwright` is resolved from (its `node_modules`)
    pub working_dir: PathBuf,
}

impl Default for PlaywrightConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost".to_string(),
            browser: Browser::Chromium,
            headless: true,
            viewport_width: 1280,
            viewport_height: 720,
            action_timeout: Duration::from_secs(4),
            launch_timeout: Duration::from_secs(30),
            node_binary: PathBuf::from("node"),
            working_dir: PathBuf::from("."),
        }
    }
}

impl PlaywrightConfig {
    /// Base URL with exactly one trailing slash, so relative paths resolve
    /// beneath it.
    pub fn normalized_base_url(&self) -> String {
        format!("{}/", self.base_url.trim_end_matches('/'))
    }
}

const BRIDGE_TEMPLATE: &str = r#"
const readline = require('readline');
const playwright = require(require.resolve('playwright', { paths: [process.cwd()] }));

const config = __CONFIG__;

function emit(message) {
  process.stdout.write(JSON.stringify(message) + '\n');
}

(async () => {
  const browser = await playwright[config.browser].launch({ headless: config.headless });
  const context = await browser.newContext({
    viewport: { width: config.viewport.width, height: config.viewport.height }
  });
  const page = await context.newPage();
  const timeout = config.timeout;

  page.on('requestfinished', (request) => {
    emit({ type: 'request', url: request.url(), method: request.method() });
  });

  function locate(l) {
    let loc = page.locator(l.css);
    if (l.has_text !== undefined && l.has_text !== null) {
      loc = loc.filter({ hasText: l.has_text });
    }
    if (l.nth !== undefined && l.nth !== null) {
      loc = loc.nth(l.nth);
    }
    return loc;
  }

  async function handle(msg) {
    switch (msg.op) {
      case 'visit':
        await page.goto(new URL(msg.path, config.baseUrl).toString());
        return null;
      case 'exists':
        return (await locate(msg.locator).count()) > 0;
      case 'count':
        return await locate(msg.locator).count();
      case 'visible':
        return await locate(msg.locator).first().isVisible();
      case 'click':
        await locate(msg.locator).click({ force: !!msg.force, timeout });
        return null;
      case 'type':
        await locate(msg.locator).pressSequentially(msg.text, { timeout });
        return null;
      case 'select':
        await locate(msg.locator).selectOption(msg.value, { timeout });
        return null;
      case 'clear':
        await locate(msg.locator).clear({ timeout });
        return null;
      case 'scroll':
        await locate(msg.locator).scrollIntoViewIfNeeded({ timeout });
        return null;
      case 'text':
        return (await locate(msg.locator).textContent({ timeout })) || '';
      case 'close':
        await browser.close();
        return null;
      default:
        throw new Error('unknown op ' + msg.op);
    }
  }

  // Commands run strictly one after another.
  let queue = Promise.resolve();
  const rl = readline.createInterface({ input: process.stdin });
  rl.on('line', (line) => {
    queue = queue.then(async () => {
      let msg;
      try {
        msg = JSON.parse(line);
        const value = await handle(msg);
        emit({ type: 'reply', id: msg.id, ok: true, value });
        if (msg.op === 'close') {
          process.exit(0);
        }
      } catch (error) {
        emit({ type: 'reply', id: msg ? msg.id : 0, ok: false, error: error.message });
      }
    });
  });
  rl.on('close', async () => {
    await queue;
    await browser.close().catch(() => {});
    process.exit(0);
  });

  emit({ type: 'ready' });
})().catch((error) => {
  console.error(error.stack || error.message);
  process.exit(1);
});
"#;

/// Render the bridge script for `config`.
pub fn build_script(config: &PlaywrightConfig) -> String {
    let settings = serde_json::json!({
        "baseUrl": config.normalized_base_url(),
        "browser": config.browser.as_str(),
        "headless": config.headless,
        "viewport": { "width": config.viewport_width, "height": config.viewport_height },
        "timeout": config.action_timeout.as_millis() as u64,
    });
    BRIDGE_TEMPLATE.replace("__CONFIG__", &settings.to_string())
}

type PendingReplies = Arc<Mutex<HashMap<u64, oneshot::Sender<Reply>>>>;
type Interceptions = Arc<Mutex<Vec<(Route, mpsc::UnboundedSender<String>)>>>;

/// Live browser session driven through the bridge.
pub struct PlaywrightBridge {
    stdin: tokio::sync::Mutex<ChildStdin>,
    child: Mutex<Option<Child>>,
    pending: PendingReplies,
    interceptions: Interceptions,
    next_id: AtomicU64,
    reader: JoinHandle<()>,
    reply_timeout: Duration,
    _script_dir: tempfile::TempDir,
}

impl PlaywrightBridge {
    /// Start the browser and wait until its page is ready.
    pub async fn launch(config: PlaywrightConfig) -> BrowserResult<Self> {
        Self::check_playwright_installed(&config)?;

        let script_dir = tempfile::tempdir()?;
        let script_path = script_dir.path().join("bridge.js");
        std::fs::write(&script_path, build_script(&config))?;

        info!(
            "Launching {} ({}) against {}",
            config.browser.as_str(),
            if config.headless { "headless" } else { "headed" },
            config.base_url
        );

        let mut child = TokioCommand::new(&config.node_binary)
            .arg(&script_path)
            .current_dir(&config.working_dir)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                BrowserError::Startup(format!("failed to spawn {}: {}", config.node_binary.display(), e))
            })?;

        let stdin = child.stdin.take().ok_or_else(|| BrowserError::Startup("no stdin".into()))?;
        let stdout = child.stdout.take().ok_or_else(|| BrowserError::Startup("no stdout".into()))?;
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    warn!("[bridge] {}", line);
                }
            });
        }

        let pending: PendingReplies = Arc::default();
        let interceptions: Interceptions = Arc::default();
        let (ready_tx, ready_rx) = oneshot::channel();
        let reader = tokio::spawn(read_messages(stdout, pending.clone(), interceptions.clone(), ready_tx));

        match tokio::time::timeout(config.launch_timeout, ready_rx).await {
            Ok(Ok(())) => {}
            Ok(Err(_)) => return Err(BrowserError::Startup("bridge exited before it was ready".into())),
            Err(_) => return Err(BrowserError::Timeout("browser launch".into())),
        }
        debug!("Bridge ready");

        Ok(Self {
            stdin: tokio::sync::Mutex::new(stdin),
            child: Mutex::new(Some(child)),
            pending,
            interceptions,
            next_id: AtomicU64::new(1),
            reader,
            // Navigation runs on Playwright's own 30 s default.
            reply_timeout: config.action_timeout + Duration::from_secs(30),
            _script_dir: script_dir,
        })
    }

    /// Check that node and the playwright package are reachable
    fn check_playwright_installed(config: &PlaywrightConfig) -> BrowserResult<()> {
        let status = Command::new(&config.node_binary)
            .args(["-e", "require.resolve('playwright', { paths: [process.cwd()] })"])
            .current_dir(&config.working_dir)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();

        match status {
            Ok(status) if status.success() => Ok(()),
            _ => Err(BrowserError::PlaywrightNotFound),
        }
    }

    /// Send one command and wait for its reply.
    async fn call(&self, op: Op<'_>) -> BrowserResult<serde_json::Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let name = op.name();
        let line = BridgeCommand { id, op }.to_line()?;
        debug!("-> {}", line.trim_end());

        let (tx, rx) = oneshot::channel();
        self.pending.lock().insert(id, tx);

        {
            let mut stdin = self.stdin.lock().await;
            if let Err(e) = stdin.write_all(line.as_bytes()).await {
                self.pending.lock().remove(&id);
                return Err(e.into());
            }
            stdin.flush().await?;
        }

        let reply = match tokio::time::timeout(self.reply_timeout, rx).await {
            Ok(Ok(reply)) => reply,
            Ok(Err(_)) => return Err(BrowserError::Closed),
            Err(_) => {
                self.pending.lock().remove(&id);
                return Err(BrowserError::Timeout(format!("reply to {} #{}", name, id)));
            }
        };

        if reply.ok {
            Ok(reply.value)
        } else {
            Err(BrowserError::Command {
                op: name,
                message: reply.error.unwrap_or_else(|| "unknown error".to_string()),
            })
        }
    }

    async fn call_bool(&self, op: Op<'_>) -> BrowserResult<bool> {
        let name = op.name();
        let value = self.call(op).await?;
        value
            .as_bool()
            .ok_or(BrowserError::UnexpectedReply { op: name, value })
    }

    /// Close the browser and reap the bridge process.
    pub async fn close(&self) -> BrowserResult<()> {
        if let Err(e) = self.call(Op::Close).await {
            debug!("Close command failed: {}", e);
        }

        let child = self.child.lock().take();
        if let Some(mut child) = child {
            match tokio::time::timeout(Duration::from_secs(5), child.wait()).await {
                Ok(status) => debug!("Bridge exited: {:?}", status?),
                Err(_) => {
                    // Try graceful shutdown first
                    #[cfg(unix)]
                    {
                        use nix::sys::signal::{kill, Signal};
                        use nix::unistd::Pid;

                        if let Some(pid) = child.id() {
                            if kill(Pid::from_raw(pid as i32), Signal::SIGTERM).is_ok() {
                                tokio::time::sleep(Duration::from_millis(500)).await;
                            }
                        }
                    }
                    warn!("Bridge did not exit on close, killing it");
                    let _ = child.kill().await;
                }
            }
        }

        self.reader.abort();
        Ok(())
    }
}

impl Drop for PlaywrightBridge {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

/// Route every line from the bridge: replies to their waiting caller,
/// request events to matching interceptions.
async fn read_messages(
    stdout: ChildStdout,
    pending: PendingReplies,
    interceptions: Interceptions,
    ready: oneshot::Sender<()>,
) {
    let mut ready = Some(ready);
    let mut lines = BufReader::new(stdout).lines();

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                warn!("Bridge read error: {}", e);
                break;
            }
        };

        match serde_json::from_str::<Message>(&line) {
            Ok(Message::Ready) => {
                if let Some(tx) = ready.take() {
                    let _ = tx.send(());
                }
            }
            Ok(Message::Reply(reply)) => {
                if let Some(tx) = pending.lock().remove(&reply.id) {
                    let _ = tx.send(reply);
                } else {
                    warn!("Reply for unknown command #{}", reply.id);
                }
            }
            Ok(Message::Request { url, method }) => {
                debug!("<- {} {}", method, url);
                dispatch_request(&interceptions, &url);
            }
            Err(_) => debug!("[bridge stdout] {}", line),
        }
    }

    // Dropping the senders wakes every waiting caller with `Closed`.
    pending.lock().clear();
    interceptions.lock().clear();
}

fn dispatch_request(interceptions: &Interceptions, url: &str) {
    interceptions.lock().retain(|(route, tx)| {
        if tx.is_closed() {
            return false;
        }
        if route.pattern.matches(url) {
            debug!("Matched @{} ({})", route.alias, url);
            return tx.send(route.alias.clone()).is_ok();
        }
        true
    });
}

#[async_trait]
impl Snapshot for PlaywrightBridge {
    async fn exists(&self, locator: &Locator) -> InstallResult<bool> {
        Ok(self.call_bool(Op::Exists { locator }).await?)
    }
}

#[async_trait]
impl UiDriver for PlaywrightBridge {
    async fn visit(&self, path: &str) -> InstallResult<()> {
        self.call(Op::Visit { path }).await?;
        Ok(())
    }

    async fn count(&self, locator: &Locator) -> InstallResult<usize> {
        let value = self.call(Op::Count { locator }).await?;
        let count = value
            .as_u64()
            .ok_or(BrowserError::UnexpectedReply { op: "count", value })?;
        Ok(count as usize)
    }

    async fn is_visible(&self, locator: &Locator) -> InstallResult<bool> {
        Ok(self.call_bool(Op::Visible { locator }).await?)
    }

    async fn click(&self, locator: &Locator, options: ClickOptions) -> InstallResult<()> {
        self.call(Op::Click { locator, force: options.force }).await?;
        Ok(())
    }

    async fn type_text(&self, locator: &Locator, text: &str) -> InstallResult<()> {
        self.call(Op::Type { locator, text }).await?;
        Ok(())
    }

    async fn select(&self, locator: &Locator, value: &str) -> InstallResult<()> {
        self.call(Op::Select { locator, value }).await?;
        Ok(())
    }

    async fn clear(&self, locator: &Locator) -> InstallResult<()> {
        self.call(Op::Clear { locator }).await?;
        Ok(())
    }

    async fn scroll_into_view(&self, locator: &Locator) -> InstallResult<()> {
        self.call(Op::Scroll { locator }).await?;
        Ok(())
    }

    async fn text(&self, locator: &Locator) -> InstallResult<String> {
        let value = self.call(Op::Text { locator }).await?;
        match value {
            serde_json::Value::String(text) => Ok(text),
            other => Err(BrowserError::UnexpectedReply { op: "text", value: other }.into()),
        }
    }
}

#[async_trait]
impl NetworkInterceptor for PlaywrightBridge {
    async fn intercept(&self, route: Route, notify: mpsc::UnboundedSender<String>) -> InstallResult<()> {
        self.interceptions.lock().push((route, notify));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_embeds_config() {
        let config = PlaywrightConfig {
            base_url: "http://localhost:8080/".to_string(),
            browser: Browser::Firefox,
            action_timeout: Duration::from_millis(2500),
            ..Default::default()
        };
        let script = build_script(&config);
        assert!(!script.contains("__CONFIG__"));
        assert!(script.contains(r#""baseUrl":"http://localhost:8080/""#));
        assert!(script.contains(r#""browser":"firefox""#));
        assert!(script.contains(r#""timeout":2500"#));
        assert!(script.contains("page.on('requestfinished'"));
    }

    #[test]
    fn test_normalized_base_url() {
        let config = PlaywrightConfig {
            base_url: "http://localhost/joomla".to_string(),
            ..Default::default()
        };
        assert_eq!(config.normalized_base_url(), "http://localhost/joomla/");
    }

    #[test]
    fn test_browser_from_str() {
        assert_eq!("webkit".parse::<Browser>().unwrap(), Browser::Webkit);
        assert!("lynx".parse::<Browser>().is_err());
    }

    #[tokio::test]
    async fn test_dispatch_matches_and_prunes() {
        let interceptions: Interceptions = Arc::default();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let (dead_tx, dead_rx) = mpsc::unbounded_channel::<String>();
        drop(dead_rx);

        interceptions
            .lock()
            .push((Route::new("ajax_create", "index.php?task=installation.create*").unwrap(), tx));
        interceptions
            .lock()
            .push((Route::new("stale", "*").unwrap(), dead_tx));

        dispatch_request(
            &interceptions,
            "http://localhost/installation/index.php?task=installation.create&format=json",
        );
        assert_eq!(rx.recv().await.as_deref(), Some("ajax_create"));
        assert_eq!(interceptions.lock().len(), 1);

        dispatch_request(&interceptions, "http://localhost/media/system/js/core.js");
        assert!(rx.try_recv().is_err());
    }
}
