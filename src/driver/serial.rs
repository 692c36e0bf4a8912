//! Serial-port [`Link`].

use std::io::{ErrorKind, Read, Write};
use std::time::Duration;

use heapless::String;
use serialport::{FlowControl, SerialPort};

use crate::error::{truncated, ConnectionError};

use super::link::{Link, TERMINATOR};

/// A host serial port speaking CR LF terminated lines.
pub struct SerialLink {
    port: Option<Box<dyn SerialPort>>,
}

impl SerialLink {
    /// Open `path` at `baud`.
    ///
    /// `hardware_flow` enables RTS/CTS.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionError::OpenFailed`] if the port cannot be opened.
    pub fn open(path: &str, baud: u32, timeout: Duration, hardware_flow: bool) -> Result<Self, ConnectionError> {
        let flow = if hardware_flow {
            FlowControl::Hardware
        } else {
            FlowControl::None
        };
        let port = serialport::new(path, baud)
            .timeout(timeout)
            .flow_control(flow)
            .open()
            .map_err(|e| ConnectionError::OpenFailed(truncated(&e.to_string())))?;

        info!("serial: opened {} at {} baud", path, baud);
        Ok(Self { port: Some(port) })
    }

    fn port(&mut self) -> Result<&mut Box<dyn SerialPort>, ConnectionError> {
        self.port.as_mut().ok_or(ConnectionError::Closed)
    }
}

fn write_frame(port: &mut dyn SerialPort, line: &str) -> std::io::Result<()> {
    port.write_all(line.as_bytes())?;
    port.write_all(TERMINATOR.as_bytes())?;
    port.flush()
}

fn io_error(e: std::io::Error) -> ConnectionError {
    ConnectionError::Io(truncated(&e.to_string()))
}

impl Link for SerialLink {
    fn write_line(&mut self, line: &str, timeout: Duration) -> Result<(), ConnectionError> {
        let port = self.port()?;
        port.set_timeout(timeout)
            .map_err(|e| ConnectionError::Io(truncated(&e.to_string())))?;

        match write_frame(port.as_mut(), line) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::TimedOut => Err(ConnectionError::WriteTimeout),
            Err(e) => Err(io_error(e)),
        }
    }

    fn read_line(&mut self, timeout: Duration) -> Result<Option<String<64>>, ConnectionError> {
        let port = self.port()?;
        port.set_timeout(timeout)
            .map_err(|e| ConnectionError::Io(truncated(&e.to_string())))?;

        let mut line: String<64> = String::new();
        let mut byte = [0u8; 1];
        loop {
            match port.read(&mut byte) {
                Ok(0) => return Ok(None),
                Ok(_) => match byte[0] {
                    b'\n' => return Ok(Some(line)),
                    b'\r' => {}
                    // Overlong replies are truncated.
                    b => {
                        let _ = line.push(char::from(b));
                    }
                },
                Err(e) if e.kind() == ErrorKind::TimedOut => return Ok(None),
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => return Err(io_error(e)),
            }
        }
    }

    fn close(&mut self) -> Result<(), ConnectionError> {
        if self.port.take().is_some() {
            info!("serial: closed");
        }
        Ok(())
    }
}
