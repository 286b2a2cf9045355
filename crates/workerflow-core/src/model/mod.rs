//! Data model
//!
//! Flavors, workers, commit references and the tag scheme.

mod channel;
mod commit;
mod flavor;
mod worker;

pub use channel::*;
pub use commit::*;
pub use flavor::*;
pub use worker::*;
