//! Blocking writes to the serial console and the error type for the
//! control task's I/O path.

use core::{convert::Infallible, fmt};

use embedded_hal::serial::Write;
use stm32f0xx_hal::serial;

/// Errors surfaced by the status-reporting path.
#[derive(Debug)]
pub enum Error {
    /// USART transmit failed.
    Serial(serial::Error),
    /// A status line did not fit its stack buffer.
    Format,
}

impl Error {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Serial(_) => "usart write failed",
            Self::Format => "status line overflow",
        }
    }
}

impl From<serial::Error> for Error {
    fn from(err: serial::Error) -> Self {
        Self::Serial(err)
    }
}

impl From<fmt::Error> for Error {
    fn from(_: fmt::Error) -> Self {
        Self::Format
    }
}

impl From<Infallible> for Error {
    fn from(err: Infallible) -> Self {
        match err {}
    }
}

/// Write a string to the console, blocking until it drains.
pub fn write_str<W>(serial: &mut W, text: &str) -> Result<(), Error>
where
    W: Write<u8>,
    Error: From<W::Error>,
{
    for &byte in text.as_bytes() {
        nb::block!(serial.write(byte))?;
    }
    Ok(())
}

/// Log label for a receive-side USART error.
pub fn rx_error_str(err: &serial::Error) -> &'static str {
    match err {
        serial::Error::Framing => "framing",
        serial::Error::Noise => "noise",
        serial::Error::Overrun => "overrun",
        serial::Error::Parity => "parity",
        _ => "unknown",
    }
}
