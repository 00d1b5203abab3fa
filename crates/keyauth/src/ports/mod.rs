//! # Ports Layer
//!
//! Trait definitions for the hexagonal architecture.
//! - **Inbound (Driving)**: API that the agent transport calls
//! - **Outbound (Driven)**: key library, peer connection, host security subsystem

pub mod inbound;
pub mod outbound;
