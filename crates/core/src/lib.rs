//! WebInstall core
//!
//! Drives a web application's setup wizard to a finished installation
//! without being told which product version it is talking to.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  Installer (orchestrator)                                    │
//! │    ├── variant::resolve()     which UI shape is on the page  │
//! │    ├── connection::build()    database host field value      │
//! │    ├── SyncPoint              barrier over backend requests  │
//! │    └── poll::confirm_gone()   installer path answers 404     │
//! ├──────────────────────────────────────────────────────────────┤
//! │  Collaborators (driver.rs)                                   │
//! │    ├── UiDriver / Snapshot    browser session                │
//! │    ├── NetworkInterceptor     completed-request observer     │
//! │    └── HttpProbe              plain status-code probe        │
//! └──────────────────────────────────────────────────────────────┘
//! ```

pub mod admin;
pub mod config;
pub mod connection;
pub mod driver;
pub mod error;
pub mod expect;
pub mod locator;
pub mod orchestrator;
pub mod poll;
pub mod sync;
pub mod variant;

pub use admin::AdminTasks;
pub use config::{AdminIdentity, DatabaseSettings, DbDialect, InstallConfig, InstallerSettings, LanguageSelection};
pub use driver::{ClickOptions, Element, HttpProbe, NetworkInterceptor, Snapshot, UiDriver};
pub use error::{InstallError, InstallResult};
pub use locator::Locator;
pub use orchestrator::{InstallStep, Installer};
pub use poll::{PollOutcome, PollPolicy};
pub use sync::{Route, RoutePattern, SyncOutcome, SyncPoint};
