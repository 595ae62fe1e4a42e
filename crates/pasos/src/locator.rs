//! Locator abstraction for element selection.
//!
//! A [`Locator`] is an immutable descriptor of how to find an element: a
//! strategy plus a selector value. Locators are resolved lazily against the
//! live document at the moment of use and are never cached across
//! navigations.

use serde::{Deserialize, Serialize};

/// Strategy used to resolve a locator against the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// CSS selector (e.g. `button.primary`)
    Css,
    /// Element id attribute
    Id,
    /// XPath expression
    XPath,
    /// Test ID selector (`data-testid` attribute)
    TestId,
    /// Visible text content
    Text,
}

impl Strategy {
    /// Strategy name as it appears in definition files.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Css => "css",
            Self::Id => "id",
            Self::XPath => "xpath",
            Self::TestId => "testid",
            Self::Text => "text",
        }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An immutable descriptor identifying zero-or-more elements.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Locator {
    /// Resolution strategy
    pub strategy: Strategy,
    /// Selector value, interpreted per strategy
    pub value: String,
}

impl Locator {
    /// Create a locator with an explicit strategy.
    #[must_use]
    pub fn new(strategy: Strategy, value: impl Into<String>) -> Self {
        Self {
            strategy,
            value: value.into(),
        }
    }

    /// Create a CSS locator.
    #[must_use]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::new(Strategy::Css, selector)
    }

    /// Create an id locator.
    #[must_use]
    pub fn id(id: impl Into<String>) -> Self {
        Self::new(Strategy::Id, id)
    }

    /// Create an XPath locator.
    #[must_use]
    pub fn xpath(expr: impl Into<String>) -> Self {
        Self::new(Strategy::XPath, expr)
    }

    /// Create a test-id locator.
    #[must_use]
    pub fn test_id(id: impl Into<String>) -> Self {
        Self::new(Strategy::TestId, id)
    }

    /// Create a text-content locator.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::new(Strategy::Text, text)
    }

    /// Normalized selector query consumed by the driver boundary.
    ///
    /// Id and test-id locators lower to their CSS equivalents so a driver
    /// only has to understand css, xpath and text queries.
    #[must_use]
    pub fn to_query(&self) -> String {
        match self.strategy {
            Strategy::Css => self.value.clone(),
            Strategy::Id => format!("#{}", self.value),
            Strategy::XPath => format!("xpath={}", self.value),
            Strategy::TestId => format!("[data-testid='{}']", self.value),
            Strategy::Text => format!("text={}", self.value),
        }
    }
}

impl std::fmt::Display for Locator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.strategy, self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod strategy_tests {
        use super::*;

        #[test]
        fn test_strategy_as_str() {
            assert_eq!(Strategy::Css.as_str(), "css");
            assert_eq!(Strategy::Id.as_str(), "id");
            assert_eq!(Strategy::XPath.as_str(), "xpath");
            assert_eq!(Strategy::TestId.as_str(), "testid");
            assert_eq!(Strategy::Text.as_str(), "text");
        }

        #[test]
        fn test_strategy_serde_lowercase() {
            let s: Strategy = serde_json::from_str("\"css\"").unwrap();
            assert_eq!(s, Strategy::Css);
            let s: Strategy = serde_json::from_str("\"xpath\"").unwrap();
            assert_eq!(s, Strategy::XPath);
        }
    }

    mod locator_tests {
        use super::*;

        #[test]
        fn test_constructors() {
            assert_eq!(Locator::css("div.row").strategy, Strategy::Css);
            assert_eq!(Locator::id("username").strategy, Strategy::Id);
            assert_eq!(Locator::xpath("//a").strategy, Strategy::XPath);
            assert_eq!(Locator::test_id("step-3").strategy, Strategy::TestId);
            assert_eq!(Locator::text("Ingresar").strategy, Strategy::Text);
        }

        #[test]
        fn test_to_query() {
            assert_eq!(Locator::css("div.row").to_query(), "div.row");
            assert_eq!(Locator::id("username").to_query(), "#username");
            assert_eq!(Locator::xpath("//a").to_query(), "xpath=//a");
            assert_eq!(
                Locator::test_id("step-3").to_query(),
                "[data-testid='step-3']"
            );
            assert_eq!(Locator::text("Ingresar").to_query(), "text=Ingresar");
        }

        #[test]
        fn test_display() {
            assert_eq!(Locator::id("username").to_string(), "id:username");
        }

        #[test]
        fn test_serde_roundtrip() {
            let loc = Locator::css("[data-test='resultado-4']");
            let json = serde_json::to_string(&loc).unwrap();
            let back: Locator = serde_json::from_str(&json).unwrap();
            assert_eq!(back, loc);
        }

        #[test]
        fn test_deserialize_definition_shape() {
            // The shape the page generator emits: {strategy, value}
            let loc: Locator =
                serde_json::from_str(r#"{"strategy": "id", "value": "password"}"#).unwrap();
            assert_eq!(loc, Locator::id("password"));
        }
    }
}
