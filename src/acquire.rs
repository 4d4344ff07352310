//! Ordered-fallback resource acquisition.
//!
//! A resource (a signing key, a swapfile allocation) can usually be obtained
//! several ways, and which way works depends on what the host has installed
//! and what the network allows. An `AcquisitionRequest` holds the ordered
//! strategies for one resource and tries them in declared order, stopping at
//! the first success. Individual strategy failures are logged and absorbed;
//! only exhaustion of the whole chain fails the acquisition.
//!
//! A failed strategy's partial side effects (a half-written key file) are not
//! rolled back; the next strategy overwrites them on its own attempt.

use crate::error::{Result, StewardError};
use log::{info, warn};

/// One concrete way to obtain a resource, part of an ordered fallback chain.
pub trait Strategy {
    /// Short name used in logs (e.g. "curl-fetch", "keyserver-recv")
    fn name(&self) -> &str;

    /// Attempt to obtain the resource. Side effects are strategy-specific.
    fn attempt(&self) -> Result<()>;
}

/// A resource identifier with its ordered fallback strategies.
///
/// Immutable once constructed: the chain runs exactly as declared.
pub struct AcquisitionRequest<'a> {
    identifier: String,
    strategies: Vec<Box<dyn Strategy + 'a>>,
}

impl<'a> AcquisitionRequest<'a> {
    pub fn new(identifier: impl Into<String>, strategies: Vec<Box<dyn Strategy + 'a>>) -> Self {
        Self {
            identifier: identifier.into(),
            strategies,
        }
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Try each strategy in order until one succeeds.
    ///
    /// Returns `AcquisitionExhausted` naming the identifier only after every
    /// strategy has been attempted exactly once and failed. No strategy is
    /// retried here; any internal retry (a network timeout loop) belongs to
    /// the strategy itself.
    pub fn run(&self) -> Result<()> {
        let total = self.strategies.len();
        for (index, strategy) in self.strategies.iter().enumerate() {
            info!(
                "Acquiring {}: strategy {}/{} ({})",
                self.identifier,
                index + 1,
                total,
                strategy.name()
            );
            match strategy.attempt() {
                Ok(()) => {
                    info!(
                        "Acquired {} via {} (strategy {}/{})",
                        self.identifier,
                        strategy.name(),
                        index + 1,
                        total
                    );
                    return Ok(());
                }
                Err(e) => {
                    warn!(
                        "Strategy {} failed for {}: {}",
                        strategy.name(),
                        self.identifier,
                        e
                    );
                }
            }
        }

        Err(StewardError::exhausted(self.identifier.clone()))
    }
}

/// Convenience: run an ordered strategy chain for `identifier`.
pub fn acquire<'a>(identifier: &str, strategies: Vec<Box<dyn Strategy + 'a>>) -> Result<()> {
    AcquisitionRequest::new(identifier, strategies).run()
}

/// A strategy built from a closure, for chains assembled inline.
pub struct FnStrategy<F: Fn() -> Result<()>> {
    name: String,
    action: F,
}

impl<F: Fn() -> Result<()>> FnStrategy<F> {
    pub fn new(name: impl Into<String>, action: F) -> Self {
        Self {
            name: name.into(),
            action,
        }
    }
}

impl<F: Fn() -> Result<()>> Strategy for FnStrategy<F> {
    fn name(&self) -> &str {
        &self.name
    }

    fn attempt(&self) -> Result<()> {
        (self.action)()
    }
}
