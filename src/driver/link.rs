//! Line-oriented transport to a stage controller.

use core::time::Duration;

use heapless::String;

use crate::error::ConnectionError;

/// Line terminator appended to every frame.
pub const TERMINATOR: &str = "\r\n";

/// A blocking, line-oriented connection with per-call timeouts.
///
/// Implementations must return within the given timeout. A read that times
/// out returns `Ok(None)` so the caller decides between retry and failure.
pub trait Link {
    /// Write one frame followed by [`TERMINATOR`].
    fn write_line(&mut self, line: &str, timeout: Duration) -> Result<(), ConnectionError>;

    /// Read one reply line, without its terminator.
    fn read_line(&mut self, timeout: Duration) -> Result<Option<String<64>>, ConnectionError>;

    /// Release the connection. Calling it again is a no-op.
    fn close(&mut self) -> Result<(), ConnectionError>;
}
