//! Data model shared by the runwatch crates.
//!
//! Everything a caller hands to the tracker ([`RunId`], [`TrackOptions`]) and
//! everything the tracker hands back ([`RunSnapshot`], [`TrackEvent`]) lives here.

mod domain;
pub use domain::*;

mod error;
pub use error::ModelError;
