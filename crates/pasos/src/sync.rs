//! Synchronized interaction layer.
//!
//! Every operation that reads or mutates the page first establishes a
//! deterministic precondition (visibility, clickability) inside a bounded
//! polling budget, then acts. Two families exist and the distinction is
//! load-bearing:
//!
//! - implicit-wait primitives ([`Interactor::click`],
//!   [`Interactor::type_text`], [`Interactor::read_text`]) wait for
//!   visibility before acting;
//! - no-wait primitives ([`Interactor::hover`], [`Interactor::double_click`],
//!   [`Interactor::scroll_into_view`]) act immediately, so callers compose
//!   waits deliberately for multi-step gestures.
//!
//! Throwing and non-throwing visibility checks are both offered: step
//! bindings choose between "this absence fails the test" and "this absence
//! is just a branch condition".

use crate::driver::Driver;
use crate::handle::ElementHandle;
use crate::locator::Locator;
use crate::result::{PasosError, PasosResult};
use std::time::{Duration, Instant};
use tracing::debug;

/// Default timeout for wait operations (30 seconds)
pub const DEFAULT_WAIT_TIMEOUT_MS: u64 = 30_000;

/// Default polling interval (50ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 50;

/// Options for wait operations
#[derive(Debug, Clone, Copy)]
pub struct WaitOptions {
    /// Timeout in milliseconds
    pub timeout_ms: u64,
    /// Polling interval in milliseconds
    pub poll_interval_ms: u64,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_WAIT_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl WaitOptions {
    /// Create new wait options with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set timeout in milliseconds
    #[must_use]
    pub const fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set polling interval in milliseconds
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval_ms: u64) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self
    }

    /// Get timeout as Duration
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Get poll interval as Duration
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Synchronized interaction primitives over element handles.
///
/// Carries the configured default [`WaitOptions`]; every wait-bearing
/// operation has a `_with` variant taking a per-call override.
#[derive(Debug, Clone, Default)]
pub struct Interactor {
    options: WaitOptions,
}

impl Interactor {
    /// Create an interactor with default wait options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an interactor with custom default wait options.
    #[must_use]
    pub const fn with_options(options: WaitOptions) -> Self {
        Self { options }
    }

    /// The configured default wait options.
    #[must_use]
    pub const fn options(&self) -> &WaitOptions {
        &self.options
    }

    /// Bounded poll of a fallible predicate. Checks at least once; fails
    /// with [`PasosError::Timeout`] once the deadline has elapsed. An error
    /// from the predicate aborts the wait immediately.
    fn poll_until<F>(opts: &WaitOptions, mut predicate: F) -> PasosResult<()>
    where
        F: FnMut() -> PasosResult<bool>,
    {
        let start = Instant::now();
        loop {
            if predicate()? {
                return Ok(());
            }
            if start.elapsed() >= opts.timeout() {
                return Err(PasosError::Timeout {
                    ms: opts.timeout_ms,
                });
            }
            std::thread::sleep(opts.poll_interval());
        }
    }

    /// Wait until the handle's element is displayed, with default options.
    pub fn wait_visible(&self, handle: &ElementHandle<'_>) -> PasosResult<()> {
        self.wait_visible_with(handle, &self.options)
    }

    /// Wait until the handle's element is displayed.
    ///
    /// Not-found during polling counts as not-yet-visible; any other
    /// failure aborts the wait.
    ///
    /// # Errors
    ///
    /// [`PasosError::Timeout`] if the element never became displayed
    /// within the budget.
    pub fn wait_visible_with(
        &self,
        handle: &ElementHandle<'_>,
        opts: &WaitOptions,
    ) -> PasosResult<()> {
        Self::poll_until(opts, || match handle.resolve() {
            Ok(el) => match el.is_displayed() {
                Ok(displayed) => Ok(displayed),
                Err(PasosError::ElementNotFound { .. }) => Ok(false),
                Err(e) => Err(e),
            },
            Err(PasosError::ElementNotFound { .. }) => Ok(false),
            Err(e) => Err(e),
        })
    }

    /// Non-throwing visibility wait with default options.
    pub fn wait_visible_best_effort(&self, handle: &ElementHandle<'_>) -> PasosResult<bool> {
        self.wait_visible_best_effort_with(handle, &self.options)
    }

    /// Non-throwing visibility wait: identical polling schedule, but the
    /// element-never-became-visible outcome is returned as `false` instead
    /// of raised. Only that condition is suppressed; anything else
    /// surfaces as [`PasosError::InteractionFailure`].
    pub fn wait_visible_best_effort_with(
        &self,
        handle: &ElementHandle<'_>,
        opts: &WaitOptions,
    ) -> PasosResult<bool> {
        match self.wait_visible_with(handle, opts) {
            Ok(()) => Ok(true),
            Err(PasosError::Timeout { ms }) => {
                debug!(locator = %handle.locator(), ms, "element never became visible");
                Ok(false)
            }
            Err(e @ PasosError::InteractionFailure { .. }) => Err(e),
            Err(e) => Err(PasosError::InteractionFailure {
                message: e.to_string(),
            }),
        }
    }

    /// Click with default options.
    pub fn click(&self, handle: &ElementHandle<'_>) -> PasosResult<()> {
        self.click_with(handle, &self.options)
    }

    /// Wait visible, wait clickable, then dispatch a click.
    ///
    /// The element can detach between a successful wait and the act (page
    /// re-render race); the whole wait-and-act sequence is retried exactly
    /// once on [`PasosError::InteractionFailure`] before surfacing.
    pub fn click_with(&self, handle: &ElementHandle<'_>, opts: &WaitOptions) -> PasosResult<()> {
        match self.click_once(handle, opts) {
            Err(PasosError::InteractionFailure { message }) => {
                debug!(locator = %handle.locator(), %message, "click failed after wait, retrying once");
                self.click_once(handle, opts)
            }
            other => other,
        }
    }

    fn click_once(&self, handle: &ElementHandle<'_>, opts: &WaitOptions) -> PasosResult<()> {
        self.wait_visible_with(handle, opts)?;
        // Covers overlays still animating: visible but not yet clickable.
        Self::poll_until(opts, || match handle.resolve() {
            Ok(el) => el.is_enabled(),
            Err(PasosError::ElementNotFound { .. }) => Ok(false),
            Err(e) => Err(e),
        })?;
        let el = handle.resolve().map_err(Self::detached)?;
        el.click().map_err(Self::detached)
    }

    /// A not-found after a successful wait is the detach race, reported as
    /// an interaction failure rather than a resolution failure.
    fn detached(err: PasosError) -> PasosError {
        match err {
            PasosError::ElementNotFound { locator } => PasosError::InteractionFailure {
                message: format!("element {locator} detached after wait"),
            },
            other => other,
        }
    }

    /// Type text with default options.
    pub fn type_text(&self, handle: &ElementHandle<'_>, text: &str) -> PasosResult<()> {
        self.type_text_with(handle, text, &self.options)
    }

    /// Wait visible, clear existing content, send the literal text.
    ///
    /// Empty text still clears; no keystrokes are sent.
    pub fn type_text_with(
        &self,
        handle: &ElementHandle<'_>,
        text: &str,
        opts: &WaitOptions,
    ) -> PasosResult<()> {
        self.wait_visible_with(handle, opts)?;
        let el = handle.resolve().map_err(Self::detached)?;
        el.clear().map_err(Self::detached)?;
        if !text.is_empty() {
            el.send_keys(text).map_err(Self::detached)?;
        }
        Ok(())
    }

    /// Read text with default options.
    pub fn read_text(&self, handle: &ElementHandle<'_>) -> PasosResult<String> {
        self.read_text_with(handle, &self.options)
    }

    /// Wait visible, then return the element's rendered text content as
    /// the engine reports it (no re-normalization by this layer).
    pub fn read_text_with(
        &self,
        handle: &ElementHandle<'_>,
        opts: &WaitOptions,
    ) -> PasosResult<String> {
        self.wait_visible_with(handle, opts)?;
        let el = handle.resolve().map_err(Self::detached)?;
        el.get_text().map_err(Self::detached)
    }

    /// Non-throwing instant visibility probe: any error, including
    /// not-found, collapses to `false`.
    #[must_use]
    pub fn is_visible(&self, handle: &ElementHandle<'_>) -> bool {
        handle
            .resolve()
            .and_then(|el| el.is_displayed())
            .unwrap_or(false)
    }

    /// Locator variant of [`Interactor::is_visible`].
    #[must_use]
    pub fn is_visible_locator(&self, driver: &dyn Driver, locator: &Locator) -> bool {
        self.is_visible(&ElementHandle::new(driver, locator))
    }

    /// Non-throwing invisibility probe.
    ///
    /// Returns `true` when the element is rendered-but-hidden and when it
    /// no longer exists (removal is treated as invisible, matching
    /// teardown assertions). Returns `false` on unexpected errors other
    /// than not-found/stale.
    #[must_use]
    pub fn is_invisible(&self, handle: &ElementHandle<'_>) -> bool {
        match handle.resolve() {
            Ok(el) => match el.is_displayed() {
                Ok(displayed) => !displayed,
                Err(PasosError::ElementNotFound { .. }) => true,
                Err(_) => false,
            },
            Err(PasosError::ElementNotFound { .. }) => true,
            Err(_) => false,
        }
    }

    /// Hover over the element. No implicit wait.
    pub fn hover(&self, handle: &ElementHandle<'_>) -> PasosResult<()> {
        handle.resolve()?.hover()
    }

    /// Double-click the element. No implicit wait.
    pub fn double_click(&self, handle: &ElementHandle<'_>) -> PasosResult<()> {
        handle.resolve()?.double_click()
    }

    /// Scroll the element into view. No implicit wait.
    pub fn scroll_into_view(&self, handle: &ElementHandle<'_>) -> PasosResult<()> {
        handle.resolve()?.scroll_into_view()
    }
}
