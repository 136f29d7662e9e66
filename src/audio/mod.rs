//! Turn-taking between speech input and speech output.
//!
//! One [`AudioCoordinator`] is built by the composition root and shared by
//! `Arc` with every component that captures or produces audio.

mod coordinator;

pub use coordinator::{AudioCoordinator, AudioState, CoordinatorStatus, StateChange};
