//! G-code modal interpreter.
//!
//! One interpreter implementation serves every axis set:
//!
//! - [`Parser`] tokenizes lines into [`MotionCommand`]s and reports
//!   [`ParseDiagnostic`]s for anything it skips
//! - [`Interpreter`] resolves commands against a [`ModalState`] into
//!   absolute millimetre moves and dispatches them to a
//!   [`Driver`](crate::driver::Driver)

mod axes;
mod command;
mod diagnostic;
mod interpreter;
mod parser;
mod state;

pub use axes::{axis_index, AxisSet, Coords, Xy, Xyz, AXIS_LABELS};
pub use command::{CommandKind, MotionCommand};
pub use diagnostic::{DiagnosticKind, ParseDiagnostic};
pub use interpreter::Interpreter;
pub use parser::{strip_comments, MotionMode, ParsedLine, Parser};
pub use state::{ModalState, Plane, Positioning, Units};
