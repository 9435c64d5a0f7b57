//! Speculative mempool admission.
//!
//! This crate implements transaction admission against the *check* view. It
//! handles:
//!
//! - Decoding and size bounds
//! - Sender recovery
//! - Strict-nonce and balance validation
//! - Speculative application, so a sender can queue dependent transactions
//!
//! # Key Property
//!
//! Admission owns its view exclusively. A rejected transaction leaves the
//! view untouched; an accepted one mutates only *check*, never the
//! committed or block-working views. All speculative effects are discarded
//! and rebuilt from the new committed view at every commit.

mod validator;

pub use validator::{Accepted, AdmitError, MempoolConfig, MempoolValidator};
