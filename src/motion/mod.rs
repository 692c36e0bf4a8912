//! Motion module for stage-motion.
//!
//! Provides move timing used to pace controllers that do not acknowledge.

mod profile;

pub use profile::{Direction, MoveProfile};
