// Byte channel under the codec
//
// The codec only needs "write N bytes" and "read up to M bytes". A serial
// implementation is provided; tests substitute their own.

use serialport::{self, DataBits, Parity, SerialPort, StopBits};
use std::io::{Read, Write};
use std::time::Duration;
use tracing::debug;

use super::error::TransportError;

/// Default serial configuration for the actuator bus
pub const DEFAULT_BAUDRATE: u32 = 115_200;
pub const DEFAULT_TIMEOUT_MS: u64 = 100;

/// Blocking, synchronous byte channel
pub trait Transport {
    /// Write the whole frame, returning the number of bytes accepted
    fn write(&mut self, bytes: &[u8]) -> Result<usize, TransportError>;

    /// Read whatever is available, up to `buf.len()` bytes
    fn read_some(&mut self, buf: &mut [u8]) -> Result<usize, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn write(&mut self, bytes: &[u8]) -> Result<usize, TransportError> {
        (**self).write(bytes)
    }

    fn read_some(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        (**self).read_some(buf)
    }
}

/// Serial port transport (8N1)
pub struct SerialTransport {
    port: Box<dyn SerialPort>,
}

impl SerialTransport {
    /// Open a serial port with the default baud rate
    pub fn open(port_name: &str) -> Result<Self, TransportError> {
        Self::open_with_baudrate(port_name, DEFAULT_BAUDRATE)
    }

    /// Open with custom baudrate
    pub fn open_with_baudrate(port_name: &str, baudrate: u32) -> Result<Self, TransportError> {
        let port = serialport::new(port_name, baudrate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .timeout(Duration::from_millis(DEFAULT_TIMEOUT_MS))
            .open()?;

        debug!("Opened {} at {} baud", port_name, baudrate);
        Ok(Self { port })
    }
}

impl Transport for SerialTransport {
    fn write(&mut self, bytes: &[u8]) -> Result<usize, TransportError> {
        self.port.write_all(bytes)?;
        self.port.flush()?;
        Ok(bytes.len())
    }

    fn read_some(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        match self.port.read(buf) {
            Ok(n) => Ok(n),
            // Nothing arrived in time; the decoder reports the missing bytes
            Err(e) if e.kind() == std::io::ErrorKind::TimedOut => Ok(0),
            Err(e) => Err(TransportError::Io(e)),
        }
    }
}
