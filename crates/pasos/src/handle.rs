//! Element handle: the ephemeral binding of a [`Locator`] to a session's
//! driver at the moment of use.
//!
//! A handle never caches the resolved element. Every interaction resolves
//! again, which tolerates page re-renders; the resolved [`ElementRef`] is
//! owned transiently by the calling interaction and does not outlive it.

use crate::driver::{Driver, ElementRef};
use crate::locator::Locator;
use crate::result::{PasosError, PasosResult};

/// A capability wrapper around a single located element.
#[derive(Clone, Copy)]
pub struct ElementHandle<'a> {
    driver: &'a dyn Driver,
    locator: &'a Locator,
}

impl std::fmt::Debug for ElementHandle<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElementHandle")
            .field("locator", &self.locator)
            .finish_non_exhaustive()
    }
}

impl<'a> ElementHandle<'a> {
    /// Bind a locator to a driver. No resolution happens here.
    #[must_use]
    pub fn new(driver: &'a dyn Driver, locator: &'a Locator) -> Self {
        Self { driver, locator }
    }

    /// The locator this handle binds.
    #[must_use]
    pub const fn locator(&self) -> &Locator {
        self.locator
    }

    /// The driver this handle binds against.
    #[must_use]
    pub const fn driver(&self) -> &'a dyn Driver {
        self.driver
    }

    /// Resolve to a live element reference.
    ///
    /// # Errors
    ///
    /// Returns [`PasosError::ElementNotFound`] if zero elements match at
    /// resolution time.
    pub fn resolve(&self) -> PasosResult<Box<dyn ElementRef>> {
        self.driver.find_element(self.locator)
    }

    /// Resolve to the first of possibly many matches, in document order.
    pub fn resolve_first(&self) -> PasosResult<Box<dyn ElementRef>> {
        let mut all = self.driver.find_elements(self.locator)?;
        if all.is_empty() {
            Err(PasosError::ElementNotFound {
                locator: self.locator.to_string(),
            })
        } else {
            Ok(all.remove(0))
        }
    }
}
