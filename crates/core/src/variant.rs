//! UI variant resolution
//!
//! Product versions render some wizard steps differently. Instead of taking
//! a version flag, each branch point probes the live page for a fixed,
//! ordered list of candidate elements and picks the first one present.

use std::fmt;
use tracing::debug;

use crate::driver::Snapshot;
use crate::error::{InstallError, InstallResult};
use crate::locator::{selectors, Locator};

/// One candidate shape at a branch point.
#[derive(Debug, Clone)]
pub struct Probe<V> {
    pub variant: V,
    pub locator: Locator,
}

impl<V> Probe<V> {
    pub fn new(variant: V, locator: impl Into<Locator>) -> Self {
        Self {
            variant,
            locator: locator.into(),
        }
    }
}

/// A set of mutually exclusive UI shapes for one logical step.
pub trait UiVariant: Copy + fmt::Debug + Send + Sync + 'static {
    /// Branch point name used in logs and errors
    const STEP: &'static str;

    /// Candidates in priority order
    fn probes() -> Vec<Probe<Self>>;
}

/// Return the variant of the first probe whose element exists.
pub async fn resolve<V: UiVariant, S: Snapshot + ?Sized>(snapshot: &S) -> InstallResult<V> {
    resolve_among(snapshot, V::STEP, &V::probes()).await
}

/// Like [`resolve`], but absence of every candidate is an answer, not an
/// error.
pub async fn resolve_optional<V: UiVariant, S: Snapshot + ?Sized>(snapshot: &S) -> InstallResult<Option<V>> {
    match resolve::<V, S>(snapshot).await {
        Ok(variant) => Ok(Some(variant)),
        Err(InstallError::VariantUnresolved { .. }) => Ok(None),
        Err(e) => Err(e),
    }
}

pub async fn resolve_among<V: Copy + fmt::Debug, S: Snapshot + ?Sized>(
    snapshot: &S,
    step: &str,
    probes: &[Probe<V>],
) -> InstallResult<V> {
    for probe in probes {
        if snapshot.exists(&probe.locator).await? {
            debug!("{}: resolved {:?} via {}", step, probe.variant, probe.locator);
            return Ok(probe.variant);
        }
    }

    Err(InstallError::VariantUnresolved {
        step: step.to_string(),
        candidates: probes.iter().map(|p| p.locator.to_string()).collect(),
    })
}

/// How the installer's language dropdown is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LanguageSelector {
    /// Newer versions tuck the dropdown behind a dialog button
    DialogGated,
    Direct,
}

impl UiVariant for LanguageSelector {
    const STEP: &'static str = "language-select";

    fn probes() -> Vec<Probe<Self>> {
        vec![
            Probe::new(LanguageSelector::DialogGated, selectors::LANGUAGE_DIALOG_BUTTON),
            Probe::new(LanguageSelector::Direct, selectors::LANGUAGE_SELECT),
        ]
    }
}

/// Control that dismisses the administrator welcome tour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TourDismissal {
    HideForever,
    Cancel,
}

impl UiVariant for TourDismissal {
    const STEP: &'static str = "cancel-tour";

    fn probes() -> Vec<Probe<Self>> {
        vec![
            Probe::new(TourDismissal::HideForever, selectors::TOUR_HIDE_FOREVER),
            Probe::new(TourDismissal::Cancel, selectors::TOUR_CANCEL),
        ]
    }
}

/// Extra click some versions need after the congratulation page. Versions
/// that complete on their own render no control at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionControl {
    CompleteButton,
}

impl UiVariant for CompletionControl {
    const STEP: &'static str = "complete-installation";

    fn probes() -> Vec<Probe<Self>> {
        vec![Probe::new(
            CompletionControl::CompleteButton,
            selectors::COMPLETE_INSTALLATION_BUTTON,
        )]
    }
}

/// How the installation folder is removed after a multilingual install.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Teardown {
    RemoveFolderButton,
    /// Older versions: first completion button also removes the folder
    CompleteButton,
}

impl UiVariant for Teardown {
    const STEP: &'static str = "remove-installation";

    fn probes() -> Vec<Probe<Self>> {
        vec![
            Probe::new(Teardown::RemoveFolderButton, selectors::REMOVE_INSTALLATION_FOLDER),
            Probe::new(Teardown::CompleteButton, selectors::COMPLETE_INSTALLATION),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashSet;

    struct Page(HashSet<&'static str>);

    impl Page {
        fn with(present: &[&'static str]) -> Self {
            Self(present.iter().copied().collect())
        }
    }

    #[async_trait]
    impl Snapshot for Page {
        async fn exists(&self, locator: &Locator) -> InstallResult<bool> {
            Ok(self.0.contains(locator.css.as_str()))
        }
    }

    #[tokio::test]
    async fn test_language_selector_variants() {
        let dialog = Page::with(&[selectors::LANGUAGE_DIALOG_BUTTON, selectors::LANGUAGE_SELECT]);
        assert_eq!(resolve::<LanguageSelector, _>(&dialog).await.unwrap(), LanguageSelector::DialogGated);

        let direct = Page::with(&[selectors::LANGUAGE_SELECT]);
        assert_eq!(resolve::<LanguageSelector, _>(&direct).await.unwrap(), LanguageSelector::Direct);
    }

    #[tokio::test]
    async fn test_tour_prefers_hide_forever() {
        let both = Page::with(&[selectors::TOUR_CANCEL, selectors::TOUR_HIDE_FOREVER]);
        assert_eq!(resolve::<TourDismissal, _>(&both).await.unwrap(), TourDismissal::HideForever);

        let old = Page::with(&[selectors::TOUR_CANCEL]);
        assert_eq!(resolve::<TourDismissal, _>(&old).await.unwrap(), TourDismissal::Cancel);
    }

    #[tokio::test]
    async fn test_teardown_fallback() {
        let page = Page::with(&[selectors::COMPLETE_INSTALLATION]);
        assert_eq!(resolve::<Teardown, _>(&page).await.unwrap(), Teardown::CompleteButton);
    }

    #[tokio::test]
    async fn test_no_match_is_an_error() {
        let empty = Page::with(&[]);
        match resolve::<Teardown, _>(&empty).await {
            Err(InstallError::VariantUnresolved { step, candidates }) => {
                assert_eq!(step, "remove-installation");
                assert_eq!(candidates, vec!["#removeInstallationFolder", ".complete-installation"]);
            }
            other => panic!("expected VariantUnresolved, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_optional_completion_control() {
        let empty = Page::with(&[]);
        assert_eq!(resolve_optional::<CompletionControl, _>(&empty).await.unwrap(), None);

        let page = Page::with(&[selectors::COMPLETE_INSTALLATION_BUTTON]);
        assert_eq!(
            resolve_optional::<CompletionControl, _>(&page).await.unwrap(),
            Some(CompletionControl::CompleteButton)
        );
    }
}
