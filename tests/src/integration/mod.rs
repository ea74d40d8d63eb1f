//! # Integration Flows
//!
//! Each module drives a started mediator through the caller-facing method
//! surface only. Store contents are inspected through `Mediator::db` where
//! the methods expose no read-back.

#[cfg(test)]
mod consent;
#[cfg(test)]
mod pipeline;
#[cfg(test)]
mod wallet;
#[cfg(test)]
mod wire;
