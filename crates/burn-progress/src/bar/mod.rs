mod base;
mod json;
mod tensorboard;
mod tracker;

#[cfg(test)]
pub(crate) mod test_utils;

pub use base::*;
pub use json::*;
pub use tensorboard::*;
pub use tracker::*;
