//! Shared test infrastructure.
//!
//! Factories build the statement trees the unit tests across the crate keep coming back to,
//! so each test module only has to state what it checks.

pub mod factories;

use crate::body::MethodBody;

/// A method body paired with the verdict the region builder should reach on it.
#[derive(Debug)]
pub struct TestBody {
    /// Short description used in assertion messages.
    pub name: &'static str,
    /// The body under test.
    pub body: MethodBody,
    /// Whether building regions for the body should succeed.
    pub should_pass: bool,
}

impl TestBody {
    /// Pairs a body with its expected outcome.
    pub fn new(name: &'static str, body: MethodBody, should_pass: bool) -> Self {
        TestBody {
            name,
            body,
            should_pass,
        }
    }
}

pub use factories::*;
