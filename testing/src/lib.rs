//! Shared test fixtures for the org chart workspace.
//!
//! - [`FakeGithub`]: an in-memory GitHub organisation that records every
//!   call it receives, in order
//! - chart builders for the team forests the sync tests run against

mod fake_github;
mod fixtures;

pub use fake_github::*;
pub use fixtures::*;
