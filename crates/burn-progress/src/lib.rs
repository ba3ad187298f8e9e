#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Progress bars and metric sinks for training loops.
//!
//! A training loop reports its statistics once through a [ProgressBar](bar::ProgressBar),
//! while the bar and the wrappers around it forward the same statistics to their own
//! backend (JSON log lines, TensorBoard summaries, an experiment tracker).

#[macro_use]
extern crate derive_new;

/// Progress bars and the wrappers chaining them.
pub mod bar;

/// Meters accumulating values over a sequence of updates.
pub mod meter;

/// Statistic values and their formatting.
pub mod stat;

/// Experiment tracker backends.
pub mod tracker;

mod builder;
mod config;
mod error;
mod iter;
mod logging;

pub use builder::*;
pub use config::*;
pub use error::*;
pub use iter::*;
pub use logging::*;
