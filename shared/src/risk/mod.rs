//! Stock-risk policy
//!
//! A deterministic threshold classifier, a strict decoder for externally
//! generated predictions, and the reconciler that merges the two so that
//! every low-stock item always ends up with a usable alert.

mod classifier;
mod prediction;
mod reconcile;

pub use classifier::*;
pub use prediction::*;
pub use reconcile::*;
