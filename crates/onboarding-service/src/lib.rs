//! Scan Onboarding Service
//!
//! Onboards external hub repositories into the scanning inventory by driving
//! the code-scanning control plane's REST and GraphQL APIs.
//!
//! ## Architecture
//!
//! The service registers each repository with the control plane, launches a
//! discovery scan job, and polls the control plane's read API until the set
//! of discovered resources stabilizes. The control plane never reports an
//! explicit "scan finished" signal, so completion is inferred from quiescence
//! of the observed resource set.
//!
//! **Components:**
//! - `client`: REST/GraphQL transport (`ControlPlane` trait + reqwest client)
//! - `registration`: create-or-find repository registrations
//! - `jobs`: scan job creation and start
//! - `poller`: convergence detection with a bounded deadline
//! - `onboarder`: sequential batch driver
//! - `config`: configuration management
//!
//! **Data Flow:**
//! 1. Config string → parsed repository specs
//! 2. Spec → registration (idempotent, conflict-tolerant)
//! 3. Registration → scan job created and started
//! 4. Poll loop → stable resource set
//! 5. Batch driver → aggregated resource-id list

pub mod client;
pub mod config;
pub mod jobs;
pub mod models;
pub mod onboarder;
pub mod poller;
pub mod registration;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used types
pub use client::{ApiClient, ControlPlane};
pub use config::Config;
pub use models::CustomerContext;
pub use onboarder::onboard_repositories;
pub use poller::{PollOutcome, StabilityTracker};
