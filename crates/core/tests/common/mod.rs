//! Scripted in-memory browser for orchestration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::mpsc;

use webinstall_core::locator::selectors;
use webinstall_core::{
    AdminIdentity, ClickOptions, DatabaseSettings, DbDialect, HttpProbe, InstallConfig, InstallError, InstallResult,
    Locator, NetworkInterceptor, Route, Snapshot, UiDriver,
};

pub const BASE: &str = "http://localhost/installation/";

#[derive(Debug, Clone)]
pub struct FakeElement {
    pub css: String,
    /// Further selectors this element also matches
    pub also: Vec<String>,
    pub text: String,
    pub visible: bool,
}

impl FakeElement {
    pub fn new(css: &str) -> Self {
        Self {
            css: css.to_string(),
            also: Vec::new(),
            text: String::new(),
            visible: true,
        }
    }

    pub fn text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    pub fn also(mut self, css: &str) -> Self {
        self.also.push(css.to_string());
        self
    }

    pub fn matches(&self, css: &str) -> bool {
        self.css == css || self.also.iter().any(|c| c == css)
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }
}

type Reaction = Box<dyn Fn(&mut Page) + Send + Sync>;

#[derive(Default)]
pub struct Page {
    pub elements: Vec<FakeElement>,
    pub values: HashMap<String, String>,
    pub routes: Vec<(Route, mpsc::UnboundedSender<String>)>,
    pub statuses: VecDeque<u16>,
    pub probes: usize,
    pub log: Vec<String>,
}

impl Page {
    pub fn show(&mut self, element: FakeElement) {
        self.elements.retain(|e| !(e.css == element.css && e.text == element.text));
        self.elements.push(element);
    }

    pub fn add(&mut self, element: FakeElement) {
        self.elements.push(element);
    }

    pub fn set_visible(&mut self, css: &str, visible: bool) {
        for element in self.elements.iter_mut().filter(|e| e.matches(css)) {
            element.visible = visible;
        }
    }

    /// A request finished; notify every interceptor whose pattern matches.
    pub fn complete(&mut self, path: &str) {
        let url = format!("{}{}", BASE, path);
        self.log.push(format!("request {}", path));
        for (route, tx) in &self.routes {
            if route.pattern.matches(&url) {
                let _ = tx.send(route.alias.clone());
            }
        }
    }

    fn matching(&self, locator: &Locator) -> Vec<&FakeElement> {
        let all: Vec<&FakeElement> = self
            .elements
            .iter()
            .filter(|e| e.matches(&locator.css))
            .filter(|e| locator.has_text.as_ref().map_or(true, |t| e.text.contains(t.as_str())))
            .collect();
        match locator.nth {
            Some(n) => all.into_iter().nth(n).into_iter().collect(),
            None => all,
        }
    }
}

/// Browser, network and HTTP probe in one, driven by click reactions.
#[derive(Default)]
pub struct FakeBrowser {
    page: Mutex<Page>,
    reactions: Mutex<HashMap<String, Reaction>>,
}

impl FakeBrowser {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_page(&self, f: impl FnOnce(&mut Page)) {
        f(&mut self.page.lock());
    }

    /// Run `reaction` whenever an element matching `css` is clicked.
    pub fn on_click(&self, css: &str, reaction: impl Fn(&mut Page) + Send + Sync + 'static) {
        self.reactions.lock().insert(css.to_string(), Box::new(reaction));
    }

    pub fn log(&self) -> Vec<String> {
        self.page.lock().log.clone()
    }

    pub fn logged(&self, entry: &str) -> bool {
        self.page.lock().log.iter().any(|l| l == entry)
    }

    pub fn value(&self, css: &str) -> Option<String> {
        self.page.lock().values.get(css).cloned()
    }

    pub fn probe_count(&self) -> usize {
        self.page.lock().probes
    }

    fn element_error(locator: &Locator, found: usize) -> InstallError {
        if found == 0 {
            InstallError::Driver(format!("no element matches {}", locator))
        } else {
            InstallError::Driver(format!("strict mode: {} elements match {}", found, locator))
        }
    }

    /// Resolve exactly one element, as a strict driver would.
    fn one(&self, page: &Page, locator: &Locator) -> InstallResult<FakeElement> {
        let found = page.matching(locator);
        if found.len() == 1 {
            Ok(found[0].clone())
        } else {
            Err(Self::element_error(locator, found.len()))
        }
    }
}

#[async_trait]
impl Snapshot for FakeBrowser {
    async fn exists(&self, locator: &Locator) -> InstallResult<bool> {
        Ok(!self.page.lock().matching(locator).is_empty())
    }
}

#[async_trait]
impl UiDriver for FakeBrowser {
    async fn visit(&self, path: &str) -> InstallResult<()> {
        self.page.lock().log.push(format!("visit {}", path));
        Ok(())
    }

    async fn count(&self, locator: &Locator) -> InstallResult<usize> {
        Ok(self.page.lock().matching(locator).len())
    }

    async fn is_visible(&self, locator: &Locator) -> InstallResult<bool> {
        Ok(self.page.lock().matching(locator).first().map_or(false, |e| e.visible))
    }

    async fn click(&self, locator: &Locator, options: ClickOptions) -> InstallResult<()> {
        let css = {
            let mut page = self.page.lock();
            let element = self.one(&page, locator)?;
            if !element.visible && !options.force {
                return Err(InstallError::Driver(format!("{} is not visible", locator)));
            }
            let forced = if options.force { " (force)" } else { "" };
            page.log.push(format!("click {}{}", locator, forced));
            element.css
        };

        let reactions = self.reactions.lock();
        if let Some(reaction) = reactions.get(&css) {
            reaction(&mut self.page.lock());
        }
        Ok(())
    }

    async fn type_text(&self, locator: &Locator, text: &str) -> InstallResult<()> {
        let mut page = self.page.lock();
        self.one(&page, locator)?;
        page.values.entry(locator.css.clone()).or_default().push_str(text);
        page.log.push(format!("type {}={}", locator, text));
        Ok(())
    }

    async fn select(&self, locator: &Locator, value: &str) -> InstallResult<()> {
        let mut page = self.page.lock();
        let element = self.one(&page, locator)?;
        if !element.visible {
            return Err(InstallError::Driver(format!("{} is not visible", locator)));
        }
        page.values.insert(locator.css.clone(), value.to_string());
        page.log.push(format!("select {}={}", locator, value));
        Ok(())
    }

    async fn clear(&self, locator: &Locator) -> InstallResult<()> {
        let mut page = self.page.lock();
        self.one(&page, locator)?;
        page.values.insert(locator.css.clone(), String::new());
        Ok(())
    }

    async fn scroll_into_view(&self, locator: &Locator) -> InstallResult<()> {
        let mut page = self.page.lock();
        self.one(&page, locator)?;
        page.log.push(format!("scroll {}", locator));
        Ok(())
    }

    async fn text(&self, locator: &Locator) -> InstallResult<String> {
        let page = self.page.lock();
        Ok(self.one(&page, locator)?.text)
    }
}

#[async_trait]
impl NetworkInterceptor for FakeBrowser {
    async fn intercept(&self, route: Route, notify: mpsc::UnboundedSender<String>) -> InstallResult<()> {
        let mut page = self.page.lock();
        page.log.push(format!("intercept @{}", route.alias));
        page.routes.push((route, notify));
        Ok(())
    }
}

#[async_trait]
impl HttpProbe for FakeBrowser {
    async fn status(&self, _url: &str) -> InstallResult<u16> {
        let mut page = self.page.lock();
        page.probes += 1;
        let status = if page.statuses.len() > 1 {
            page.statuses.pop_front()
        } else {
            page.statuses.front().copied()
        };
        Ok(status.unwrap_or(200))
    }
}

/// Installer UI generations, differing only in the shapes the orchestrator
/// has to detect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Generation {
    /// Direct language select; teardown via the first completion button
    Four,
    /// Direct language select; dedicated remove-folder button
    Five,
    /// Language select behind a dialog; completes without an extra click
    Six,
}

pub const ADD_FEATURES_TEXT: &str = "Install Additional Languages";

/// Wire a fake that behaves like the wizard of `generation`.
pub fn wizard(generation: Generation) -> Arc<FakeBrowser> {
    let browser = FakeBrowser::new();

    browser.with_page(|page| {
        if generation == Generation::Six {
            page.add(FakeElement::new(selectors::LANGUAGE_DIALOG_BUTTON));
            page.add(FakeElement::new(selectors::LANGUAGE_SELECT).hidden());
            page.add(FakeElement::new(selectors::DIALOG_CLOSE_BUTTON));
        } else {
            page.add(FakeElement::new(selectors::LANGUAGE_SELECT));
        }
        for css in [
            selectors::SITE_NAME,
            selectors::STEP_ONE_BUTTON,
            selectors::ADMIN_NAME,
            selectors::ADMIN_USERNAME,
            selectors::ADMIN_PASSWORD,
            selectors::ADMIN_EMAIL,
            selectors::STEP_TWO_BUTTON,
            selectors::DB_TYPE,
            selectors::DB_HOST,
            selectors::DB_USER,
            selectors::DB_PASSWORD,
            selectors::DB_NAME,
            selectors::DB_PREFIX,
            selectors::SETUP_BUTTON,
        ] {
            page.add(FakeElement::new(css));
        }
        page.statuses = VecDeque::from(vec![200, 200, 404]);
    });

    browser.on_click(selectors::LANGUAGE_DIALOG_BUTTON, |page| {
        page.set_visible(selectors::LANGUAGE_SELECT, true);
    });
    browser.on_click(selectors::DIALOG_CLOSE_BUTTON, |page| {
        page.set_visible(selectors::LANGUAGE_SELECT, false);
    });

    browser.on_click(selectors::SETUP_BUTTON, move |page| {
        // Backend calls land out of order.
        page.complete("index.php?task=installation.populate2&format=json");
        page.complete("index.php?task=installation.create&format=json");
        page.complete("index.php?task=installation.populate3&format=json");
        page.complete("index.php?task=installation.populate1&format=json");
        page.complete("index.php?view=remove&layout=default");

        page.add(FakeElement::new(selectors::CONGRATULATION));
        page.add(FakeElement::new(selectors::ADD_FEATURES_BUTTON).text(&format!("  {}  ", ADD_FEATURES_TEXT)));
        match generation {
            Generation::Four => {
                for _ in 0..2 {
                    page.add(FakeElement::new(selectors::COMPLETE_INSTALLATION_BUTTON).also(selectors::COMPLETE_INSTALLATION));
                }
            }
            Generation::Five => {
                for _ in 0..2 {
                    page.add(FakeElement::new(selectors::COMPLETE_INSTALLATION_BUTTON).also(selectors::COMPLETE_INSTALLATION));
                }
                page.add(FakeElement::new(selectors::REMOVE_INSTALLATION_FOLDER));
            }
            Generation::Six => {
                page.add(FakeElement::new(selectors::REMOVE_INSTALLATION_FOLDER));
            }
        }
    });

    browser.on_click(selectors::ADD_FEATURES_BUTTON, |page| {
        page.add(FakeElement::new("legend").text(ADD_FEATURES_TEXT));
        for language in ["French", "German", "Spanish"] {
            page.add(FakeElement::new("label").text(language));
        }
    });

    browser.on_click(selectors::DEFAULT_LANGUAGES_BUTTON, |page| {
        page.add(FakeElement::new(selectors::SYSTEM_MESSAGES).text("Languages installed."));
        page.add(FakeElement::new(selectors::SYSTEM_MESSAGES).text("Default language set."));
    });

    browser.on_click(selectors::INSTALL_LANGUAGES_BUTTON, |page| {
        page.add(FakeElement::new(selectors::DEFAULT_LANGUAGES_BUTTON));
    });

    browser.with_page(|page| {
        page.add(FakeElement::new(selectors::INSTALL_LANGUAGES_BUTTON));
    });

    browser
}

pub fn sample_config() -> InstallConfig {
    InstallConfig {
        site_name: "Joomla CMS Test".to_string(),
        admin: AdminIdentity {
            name: "jane doe".to_string(),
            username: "ci-admin".to_string(),
            password: "joomla-17082005".to_string(),
            email: "admin@example.org".to_string(),
        },
        database: DatabaseSettings {
            dialect: DbDialect::MySqli,
            host: "mysql".to_string(),
            port: Some("3306".to_string()),
            user: "root".to_string(),
            password: Some("root".to_string()),
            name: "test_joomla".to_string(),
            prefix: "jos_".to_string(),
        },
    }
}
