//! Limits and constraints for island dispatching
//!
//! The dispatcher keeps its state on explicit stacks, so nesting is bounded
//! only by memory. These limits put a ceiling on that memory for untrusted
//! input.

use crate::error::{Error, Result};

/// Resource limits for one validated document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Limits {
    /// Maximum element nesting depth
    pub max_element_depth: usize,

    /// Maximum number of simultaneously suspended islands
    pub max_island_depth: usize,

    /// Maximum number of attributes per element
    pub max_attributes: usize,

    /// Maximum number of prefix declarations per element
    pub max_prefix_declarations: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_element_depth: 1000,
            max_island_depth: 256,
            max_attributes: 1000,
            max_prefix_declarations: 1000,
        }
    }
}

impl Limits {
    /// Create a new Limits with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Create strict limits (more restrictive)
    pub fn strict() -> Self {
        Self {
            max_element_depth: 100,
            max_island_depth: 16,
            max_attributes: 100,
            max_prefix_declarations: 100,
        }
    }

    /// Create permissive limits (less restrictive, use with caution)
    pub fn permissive() -> Self {
        Self {
            max_element_depth: 100_000,
            max_island_depth: 10_000,
            max_attributes: 10_000,
            max_prefix_declarations: 10_000,
        }
    }

    /// Check if element depth is within limits
    pub fn check_element_depth(&self, depth: usize) -> Result<()> {
        Self::check("element depth", depth, self.max_element_depth)
    }

    /// Check if island nesting is within limits
    pub fn check_island_depth(&self, depth: usize) -> Result<()> {
        Self::check("island depth", depth, self.max_island_depth)
    }

    /// Check if attribute count is within limits
    pub fn check_attributes(&self, count: usize) -> Result<()> {
        Self::check("attribute count", count, self.max_attributes)
    }

    /// Check if the prefix declarations of one element are within limits
    pub fn check_prefix_declarations(&self, count: usize) -> Result<()> {
        Self::check(
            "prefix declaration count",
            count,
            self.max_prefix_declarations,
        )
    }

    fn check(what: &str, value: usize, max: usize) -> Result<()> {
        if value > max {
            Err(Error::LimitExceeded(format!(
                "{} {} exceeds maximum {}",
                what, value, max
            )))
        } else {
            Ok(())
        }
    }
}
