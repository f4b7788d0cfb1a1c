//! Browser-side collaborators for the installer
//!
//! - [`PlaywrightBridge`]: a live Playwright page implementing
//!   [`webinstall_core::UiDriver`] and [`webinstall_core::NetworkInterceptor`]
//! - [`ReqwestProbe`]: the [`webinstall_core::HttpProbe`] used to confirm the
//!   installer directory is gone

pub mod error;
pub mod playwright;
pub mod probe;
pub mod protocol;

pub use error::{BrowserError, BrowserResult};
pub use playwright::{Browser, PlaywrightBridge, PlaywrightConfig};
pub use probe::ReqwestProbe;
