//! UART serial communication abstractions
//!
//! Reads never block: the telemetry pump is called whenever the caller
//! feels like it and must return promptly with whatever bytes the
//! transport already holds.

use embedded_io::{ErrorType, Read, ReadReady, Write};

/// UART receiver
pub trait UartRx {
    /// Error type for receive operations
    type Error;

    /// Copy already-received bytes into `buf`
    ///
    /// Returns 0 when nothing is pending. Never waits for data.
    fn read_available(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error>;
}

/// UART transmitter
pub trait UartTx {
    /// Error type for transmit operations
    type Error;

    /// Write `data`, returning how many bytes the transport accepted
    ///
    /// A short count means the transport stopped accepting data; the
    /// remainder is not retried.
    fn write_bytes(&mut self, data: &[u8]) -> Result<usize, Self::Error>;

    /// Flush any buffered data
    fn flush(&mut self) -> Result<(), Self::Error>;
}

/// Combined UART interface
///
/// For UARTs that provide both TX and RX on a single peripheral.
pub trait Uart: UartTx + UartRx {}

// Blanket implementation
impl<T: UartTx + UartRx> Uart for T {}

impl<T: Read + ReadReady> UartRx for T {
    type Error = <T as ErrorType>::Error;

    fn read_available(&mut self, buf: &mut [u8]) -> Result<usize, <T as ErrorType>::Error> {
        if buf.is_empty() || !self.read_ready()? {
            return Ok(0);
        }
        self.read(buf)
    }
}

impl<T: Write> UartTx for T {
    type Error = <T as ErrorType>::Error;

    fn write_bytes(&mut self, mut data: &[u8]) -> Result<usize, <T as ErrorType>::Error> {
        let mut written = 0;
        while !data.is_empty() {
            let n = self.write(data)?;
            if n == 0 {
                break;
            }
            written += n;
            data = &data[n..];
        }
        Ok(written)
    }

    fn flush(&mut self) -> Result<(), <T as ErrorType>::Error> {
        Write::flush(self)
    }
}
