//! Run-completion tracking.
//!
//! A [`Tracker`] keeps one [`PollLoop`](poll::PollLoop) per tracking key, asks a
//! [`StatusFetcher`] for the run status at a fixed cadence and streams what it
//! sees to every [`Subscription`] of that key. The key -> run mapping is stored
//! in a [`RunRegistry`] so a restarted process can [`Tracker::resume`] polling.

pub mod error;
pub use error::{CoreError, RegistryError, TrackError};

mod fetcher;
pub use fetcher::StatusFetcher;

pub mod registry;
pub use registry::{FileRegistry, MemoryRegistry, RunRegistry};

mod observer;
pub use observer::{FetchOutcome, TrackObserver};

mod fanout;

pub mod poll;
pub use poll::LoopOutcome;

pub mod tracker;
pub use tracker::{Subscription, Tracker, TrackerBuilder, TrackerConfig};

pub use runwatch_model as model;
