// src/gps/transport.rs
//! Serial transport: owns the device connection and yields text lines

use crate::error::{GpsError, Result};
use serde::Serialize;
use std::{fmt, future::Future, time::Duration};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio_serial::{DataBits, Parity, SerialPortBuilderExt, SerialStream, StopBits};

/// Longest line kept while waiting for a terminator. NMEA caps sentences at
/// 82 characters; anything far past that is noise from a baud mismatch.
pub const MAX_LINE_BYTES: usize = 512;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Error,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Error => "error",
        };
        f.write_str(label)
    }
}

/// Byte-level source of NMEA lines.
///
/// Implementations never retry on their own; reconnect policy belongs to
/// the handler.
pub trait Transport {
    /// Open the device. Moves to `Connected` on success and `Error` on failure.
    fn open(&mut self) -> Result<()>;

    /// Read one line, or `Ok(None)` if nothing complete arrived within
    /// `timeout`. Must return within `timeout` whatever the device does.
    fn read_line(&mut self, timeout: Duration) -> impl Future<Output = Result<Option<String>>> + Send;

    /// Release the device. Safe to call more than once.
    fn close(&mut self);

    fn state(&self) -> ConnectionState;

    /// Device path or another human-readable source name
    fn port(&self) -> &str;

    fn baud_rate(&self) -> u32;
}

/// Splits an async byte stream into lines.
///
/// Bytes of a line that did not finish before a timeout are kept and
/// completed by the next call.
pub struct LineReader<R> {
    reader: BufReader<R>,
    pending: Vec<u8>,
}

impl<R: AsyncRead + Unpin> LineReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            reader: BufReader::new(inner),
            pending: Vec::with_capacity(128),
        }
    }

    /// `Ok(None)` on timeout. End of stream is reported as an I/O error
    /// because a serial device only ends when it goes away.
    pub async fn next_line(&mut self, timeout: Duration) -> Result<Option<String>> {
        let deadline = tokio::time::Instant::now() + timeout;

        loop {
            let read = tokio::time::timeout_at(deadline, self.reader.read_until(b'\n', &mut self.pending)).await;
            match read {
                Err(_) => {
                    if self.pending.len() > MAX_LINE_BYTES {
                        self.pending.clear();
                    }
                    return Ok(None);
                }
                Ok(Err(e)) => {
                    self.pending.clear();
                    return Err(GpsError::Io(e));
                }
                Ok(Ok(0)) => {
                    self.pending.clear();
                    return Err(GpsError::Io(std::io::Error::new(
                        std::io::ErrorKind::UnexpectedEof,
                        "device stopped sending data",
                    )));
                }
                Ok(Ok(_)) => {
                    if self.pending.last() != Some(&b'\n') {
                        // Stream ended mid-line; the next read reports EOF
                        continue;
                    }
                    let too_long = self.pending.len() > MAX_LINE_BYTES;
                    let line = String::from_utf8_lossy(&self.pending).trim().to_string();
                    self.pending.clear();
                    if too_long {
                        log::debug!("Dropping oversized serial line ({} bytes)", line.len());
                        continue;
                    }
                    return Ok(Some(line));
                }
            }
        }
    }
}

/// GPS receiver on a serial port, 8N1.
pub struct SerialTransport {
    port: String,
    baud_rate: u32,
    state: ConnectionState,
    reader: Option<LineReader<SerialStream>>,
}

impl SerialTransport {
    pub fn new(port: impl Into<String>, baud_rate: u32) -> Self {
        Self {
            port: port.into(),
            baud_rate,
            state: ConnectionState::Disconnected,
            reader: None,
        }
    }
}

impl Transport for SerialTransport {
    fn open(&mut self) -> Result<()> {
        self.reader = None;
        self.state = ConnectionState::Connecting;

        let opened = tokio_serial::new(&self.port, self.baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .open_native_async();

        match opened {
            Ok(serial) => {
                self.reader = Some(LineReader::new(serial));
                self.state = ConnectionState::Connected;
                log::info!("GPS connected on {} @ {} baud", self.port, self.baud_rate);
                Ok(())
            }
            Err(e) => {
                self.state = ConnectionState::Error;
                Err(GpsError::Connection(format!(
                    "Failed to open serial port {}: {}",
                    self.port, e
                )))
            }
        }
    }

    async fn read_line(&mut self, timeout: Duration) -> Result<Option<String>> {
        let Some(reader) = self.reader.as_mut() else {
            return Err(GpsError::Connection(format!("{} is not open", self.port)));
        };

        let result = reader.next_line(timeout).await;
        if result.is_err() {
            self.reader = None;
            self.state = ConnectionState::Error;
        }
        result
    }

    fn close(&mut self) {
        if self.reader.take().is_some() {
            log::info!("GPS connection on {} closed", self.port);
        }
        self.state = ConnectionState::Disconnected;
    }

    fn state(&self) -> ConnectionState {
        self.state
    }

    fn port(&self) -> &str {
        &self.port
    }

    fn baud_rate(&self) -> u32 {
        self.baud_rate
    }
}

/// Serial port name and a short description of its type
pub fn list_ports() -> Result<Vec<(String, String)>> {
    let ports = tokio_serial::available_ports()?;
    Ok(ports
        .into_iter()
        .map(|port| {
            let kind = match port.port_type {
                tokio_serial::SerialPortType::UsbPort(info) => match info.product {
                    Some(product) => format!("USB ({})", product),
                    None => format!("USB {:04x}:{:04x}", info.vid, info.pid),
                },
                tokio_serial::SerialPortType::BluetoothPort => "Bluetooth".to_string(),
                tokio_serial::SerialPortType::PciPort => "PCI".to_string(),
                tokio_serial::SerialPortType::Unknown => "Unknown".to_string(),
            };
            (port.port_name, kind)
        })
        .collect())
}
