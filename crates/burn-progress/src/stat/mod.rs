mod base;
mod format;

pub use base::*;
pub use format::*;
