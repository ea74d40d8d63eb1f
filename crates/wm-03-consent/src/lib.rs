//! # wm-03-consent
//!
//! Asynchronous user consent for gated RPC calls.
//!
//! A gated call from a page is parked: an AuthReq entity is recorded for the
//! calling site and the call suspends on a oneshot continuation held in
//! [`PendingConsents`]. The popup later resolves the AuthReq by id, which
//! resumes exactly that caller. Other requests keep running meanwhile.
//!
//! | Operation | Effect |
//! |-----------|--------|
//! | [`ConsentProtocol::park`] | record AuthReq, suspend until settled |
//! | [`ConsentProtocol::pending_requests`] | list pending AuthReqs |
//! | [`ConsentProtocol::settle`] | resume caller with a result or error, delete AuthReq |
//! | [`ConsentProtocol::reject`] | resume caller with UserRejected |

pub mod domain;
pub mod service;

pub use domain::{
    ConsentError, ConsentResult, PendingAuthReq, PendingCall, PendingConsents, PendingStats,
    Settlement,
};
pub use service::ConsentProtocol;
