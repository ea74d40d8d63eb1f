//! # Shared Bus - Wallet Event Bus
//!
//! Decouples the mediator core from whoever renders or forwards its state.
//!
//! ## Producers and Consumers
//!
//! ```text
//! ┌──────────────┐  EntitiesChanged   ┌──────────────┐
//! │ EntityStore  │ ─────────┐         │  UI layer    │
//! └──────────────┘          │         └──────────────┘
//! ┌──────────────┐          ▼                ↑
//! │ RPC handlers │ ──▶ ┌──────────────┐      │ subscribe(topics)
//! └──────────────┘     │  Event Bus   │ ─────┤
//! ┌──────────────┐     └──────────────┘      │ subscribe(origin)
//! │  Consent     │ ─────────┘                ↓
//! └──────────────┘                    ┌──────────────┐
//!                                     │ site channel │
//!                                     └──────────────┘
//! ```
//!
//! Publishing never blocks and never fails. With no subscribers the event
//! is dropped and counted.

#![allow(clippy::missing_const_for_fn)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod events;
pub mod publisher;
pub mod subscriber;

pub use events::{EventFilter, EventTopic, WalletEvent};
pub use publisher::InMemoryEventBus;
pub use subscriber::{EventStream, Subscription, SubscriptionError};

/// Maximum events to buffer per subscriber before lagging.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;
