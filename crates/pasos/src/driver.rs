//! Driver boundary: the minimal capability set the harness needs from a
//! browser automation backend.
//!
//! The core depends only on the [`Driver`] and [`ElementRef`] traits, not on
//! any specific driver implementation. The traits are synchronous: every
//! wait in the interaction layer is a blocking, bounded poll, matching the
//! single-threaded scenario execution model.
//!
//! [`FakeDriver`] is a scripted in-memory implementation used for unit
//! testing the harness itself. It supports timed visibility, timed
//! clickability, element removal, input echo and a stale-click race, which
//! is enough to exercise every synchronization path.

use crate::locator::Locator;
use crate::result::{PasosError, PasosResult};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// A resolved reference to a single live element.
///
/// References are ephemeral: they are obtained immediately before an
/// interaction and never reused across interactions.
pub trait ElementRef: std::fmt::Debug {
    /// Dispatch a click to the element.
    fn click(&self) -> PasosResult<()>;

    /// Clear the element's current content.
    fn clear(&self) -> PasosResult<()>;

    /// Send literal keystrokes to the element.
    fn send_keys(&self, text: &str) -> PasosResult<()>;

    /// Whether the rendering engine reports the element as displayed.
    fn is_displayed(&self) -> PasosResult<bool>;

    /// Whether the element currently accepts interaction (clickable).
    fn is_enabled(&self) -> PasosResult<bool>;

    /// The element's rendered text content, as the engine reports it.
    fn get_text(&self) -> PasosResult<String>;

    /// Move the pointer over the element.
    fn hover(&self) -> PasosResult<()>;

    /// Dispatch a double-click to the element.
    fn double_click(&self) -> PasosResult<()>;

    /// Scroll the element into the viewport.
    fn scroll_into_view(&self) -> PasosResult<()>;
}

/// One live browser automation connection.
pub trait Driver: Send {
    /// Navigate to a URL.
    fn navigate(&self, url: &str) -> PasosResult<()>;

    /// Find the first element matching the locator, in document order.
    ///
    /// # Errors
    ///
    /// Returns [`PasosError::ElementNotFound`] if zero elements match at
    /// resolution time.
    fn find_element(&self, locator: &Locator) -> PasosResult<Box<dyn ElementRef>>;

    /// Find all elements matching the locator, in document order.
    fn find_elements(&self, locator: &Locator) -> PasosResult<Vec<Box<dyn ElementRef>>>;

    /// Execute a script in the page context.
    fn execute_script(
        &self,
        src: &str,
        args: &[serde_json::Value],
    ) -> PasosResult<serde_json::Value>;

    /// Current page URL.
    fn current_url(&self) -> PasosResult<String>;

    /// Quit the browser connection. Only the session lifecycle manager
    /// calls this.
    fn quit(&mut self) -> PasosResult<()>;
}

// =============================================================================
// FAKE DRIVER
// =============================================================================

/// Scripted behavior of one fake DOM node.
#[derive(Debug, Clone)]
pub struct FakeNode {
    /// Delay before the node reports displayed
    visible_from: Duration,
    /// Permanently hidden, regardless of timing
    hidden: bool,
    /// Delay before the node is removed from the document
    removed_from: Option<Duration>,
    /// Delay before the node reports enabled/clickable
    enabled_from: Duration,
    /// Text content; inputs echo typed keystrokes here
    text: String,
    /// Number of clicks that fail with a stale-element race before
    /// the node recovers
    stale_clicks: u32,
    /// Number of post-resolve acts (clear, send keys, read text) that
    /// fail as not-found before the node recovers
    stale_acts: u32,
    /// Visibility probes fail with an unexpected driver error
    failing_visibility: bool,
    /// Clicks received so far
    clicks: u32,
}

impl Default for FakeNode {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeNode {
    /// A visible, enabled, empty node.
    #[must_use]
    pub fn new() -> Self {
        Self {
            visible_from: Duration::ZERO,
            hidden: false,
            removed_from: None,
            enabled_from: Duration::ZERO,
            text: String::new(),
            stale_clicks: 0,
            stale_acts: 0,
            failing_visibility: false,
            clicks: 0,
        }
    }

    /// Set initial text content.
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Node becomes displayed only after `delay` has elapsed.
    #[must_use]
    pub const fn visible_after(mut self, delay: Duration) -> Self {
        self.visible_from = delay;
        self
    }

    /// Node is rendered but never displayed.
    #[must_use]
    pub const fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    /// Node is removed from the document after `delay` has elapsed.
    #[must_use]
    pub const fn removed_after(mut self, delay: Duration) -> Self {
        self.removed_from = Some(delay);
        self
    }

    /// Node becomes clickable only after `delay` (e.g. an animating
    /// overlay releasing it).
    #[must_use]
    pub const fn enabled_after(mut self, delay: Duration) -> Self {
        self.enabled_from = delay;
        self
    }

    /// The first `n` clicks fail with a stale-element race, after which
    /// the node recovers.
    #[must_use]
    pub const fn stale_clicks(mut self, n: u32) -> Self {
        self.stale_clicks = n;
        self
    }

    /// The first `n` post-resolve acts (clear, send keys, read text)
    /// fail as not-found, as if the node was replaced between
    /// resolution and the act.
    #[must_use]
    pub const fn stale_acts(mut self, n: u32) -> Self {
        self.stale_acts = n;
        self
    }

    /// Visibility probes fail with an unexpected error (not a
    /// not-found/stale condition).
    #[must_use]
    pub const fn failing_visibility(mut self) -> Self {
        self.failing_visibility = true;
        self
    }
}

#[derive(Debug, Default)]
struct FakeDomState {
    nodes: HashMap<String, FakeNode>,
    url: String,
    history: Vec<String>,
}

/// In-memory scripted [`Driver`] for unit testing the harness.
#[derive(Debug, Clone)]
pub struct FakeDriver {
    state: Arc<Mutex<FakeDomState>>,
    epoch: Instant,
}

impl Default for FakeDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeDriver {
    /// Create an empty fake driver. Timed node behavior is measured from
    /// this instant.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(FakeDomState::default())),
            epoch: Instant::now(),
        }
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut FakeDomState) -> T) -> T {
        let mut state = self.state.lock().expect("fake dom lock poisoned");
        f(&mut state)
    }

    /// Insert a node reachable through the locator's normalized query.
    pub fn add_element(&self, locator: &Locator, node: FakeNode) {
        let query = locator.to_query();
        self.with_state(|s| {
            let _ = s.nodes.insert(query, node);
        });
    }

    /// Remove a node mid-test, simulating a page re-render that drops it.
    pub fn remove_element(&self, locator: &Locator) {
        let query = locator.to_query();
        self.with_state(|s| {
            let _ = s.nodes.remove(&query);
        });
    }

    /// Current text content of a node, for assertions.
    #[must_use]
    pub fn text_of(&self, locator: &Locator) -> Option<String> {
        let query = locator.to_query();
        self.with_state(|s| s.nodes.get(&query).map(|n| n.text.clone()))
    }

    /// Number of clicks a node has received.
    #[must_use]
    pub fn clicks_of(&self, locator: &Locator) -> u32 {
        let query = locator.to_query();
        self.with_state(|s| s.nodes.get(&query).map_or(0, |n| n.clicks))
    }

    /// Recorded driver calls, for verification.
    #[must_use]
    pub fn history(&self) -> Vec<String> {
        self.with_state(|s| s.history.clone())
    }

    /// Check whether a recorded call starts with `method`.
    #[must_use]
    pub fn was_called(&self, method: &str) -> bool {
        self.with_state(|s| s.history.iter().any(|c| c.starts_with(method)))
    }

    fn node_present(node: &FakeNode, elapsed: Duration) -> bool {
        node.removed_from.map_or(true, |at| elapsed < at)
    }
}

impl Driver for FakeDriver {
    fn navigate(&self, url: &str) -> PasosResult<()> {
        self.with_state(|s| {
            s.history.push(format!("navigate:{url}"));
            s.url = url.to_string();
        });
        Ok(())
    }

    fn find_element(&self, locator: &Locator) -> PasosResult<Box<dyn ElementRef>> {
        let query = locator.to_query();
        let elapsed = self.epoch.elapsed();
        let present = self.with_state(|s| {
            s.nodes
                .get(&query)
                .is_some_and(|n| Self::node_present(n, elapsed))
        });
        if present {
            Ok(Box::new(FakeElement {
                state: Arc::clone(&self.state),
                epoch: self.epoch,
                query,
            }))
        } else {
            Err(PasosError::ElementNotFound {
                locator: locator.to_string(),
            })
        }
    }

    fn find_elements(&self, locator: &Locator) -> PasosResult<Vec<Box<dyn ElementRef>>> {
        match self.find_element(locator) {
            Ok(el) => Ok(vec![el]),
            Err(PasosError::ElementNotFound { .. }) => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }

    fn execute_script(
        &self,
        src: &str,
        args: &[serde_json::Value],
    ) -> PasosResult<serde_json::Value> {
        self.with_state(|s| {
            s.history
                .push(format!("execute_script:{src}:{}", args.len()));
        });
        Ok(serde_json::Value::Null)
    }

    fn current_url(&self) -> PasosResult<String> {
        Ok(self.with_state(|s| s.url.clone()))
    }

    fn quit(&mut self) -> PasosResult<()> {
        self.with_state(|s| s.history.push("quit".to_string()));
        Ok(())
    }
}

/// Element reference into the fake DOM.
///
/// Holds only the query it resolved from; every method re-checks presence,
/// so a node removed after resolution surfaces as a stale reference.
#[derive(Debug)]
struct FakeElement {
    state: Arc<Mutex<FakeDomState>>,
    epoch: Instant,
    query: String,
}

impl FakeElement {
    fn with_node<T>(&self, f: impl FnOnce(&mut FakeNode) -> PasosResult<T>) -> PasosResult<T> {
        let elapsed = self.epoch.elapsed();
        let mut state = self.state.lock().expect("fake dom lock poisoned");
        match state.nodes.get_mut(&self.query) {
            Some(node) if FakeDriver::node_present(node, elapsed) => f(node),
            _ => Err(PasosError::ElementNotFound {
                locator: self.query.clone(),
            }),
        }
    }

    fn consume_stale_act(node: &mut FakeNode, query: &str) -> PasosResult<()> {
        if node.stale_acts > 0 {
            node.stale_acts -= 1;
            return Err(PasosError::ElementNotFound {
                locator: query.to_string(),
            });
        }
        Ok(())
    }

    fn record_gesture(&self, gesture: &str) -> PasosResult<()> {
        let elapsed = self.epoch.elapsed();
        let mut state = self.state.lock().expect("fake dom lock poisoned");
        let present = state
            .nodes
            .get(&self.query)
            .is_some_and(|n| FakeDriver::node_present(n, elapsed));
        if !present {
            return Err(PasosError::ElementNotFound {
                locator: self.query.clone(),
            });
        }
        state.history.push(format!("{gesture}:{}", self.query));
        Ok(())
    }
}

impl ElementRef for FakeElement {
    fn click(&self) -> PasosResult<()> {
        self.with_node(|node| {
            if node.stale_clicks > 0 {
                node.stale_clicks -= 1;
                return Err(PasosError::InteractionFailure {
                    message: "stale element reference".to_string(),
                });
            }
            node.clicks += 1;
            Ok(())
        })
    }

    fn clear(&self) -> PasosResult<()> {
        let query = self.query.clone();
        self.with_node(|node| {
            Self::consume_stale_act(node, &query)?;
            node.text.clear();
            Ok(())
        })
    }

    fn send_keys(&self, text: &str) -> PasosResult<()> {
        let query = self.query.clone();
        self.with_node(|node| {
            Self::consume_stale_act(node, &query)?;
            node.text.push_str(text);
            Ok(())
        })
    }

    fn is_displayed(&self) -> PasosResult<bool> {
        let elapsed = self.epoch.elapsed();
        self.with_node(|node| {
            if node.failing_visibility {
                return Err(PasosError::InteractionFailure {
                    message: "visibility probe failed".to_string(),
                });
            }
            Ok(!node.hidden && elapsed >= node.visible_from)
        })
    }

    fn is_enabled(&self) -> PasosResult<bool> {
        let elapsed = self.epoch.elapsed();
        self.with_node(|node| Ok(elapsed >= node.enabled_from))
    }

    fn get_text(&self) -> PasosResult<String> {
        let query = self.query.clone();
        self.with_node(|node| {
            Self::consume_stale_act(node, &query)?;
            Ok(node.text.clone())
        })
    }

    fn hover(&self) -> PasosResult<()> {
        self.record_gesture("hover")
    }

    fn double_click(&self) -> PasosResult<()> {
        self.record_gesture("double_click")
    }

    fn scroll_into_view(&self) -> PasosResult<()> {
        self.record_gesture("scroll_into_view")
    }
}
