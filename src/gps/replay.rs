// src/gps/replay.rs
//! Scripted transport for NMEA logs and simulated hardware faults

use super::transport::{ConnectionState, Transport};
use crate::error::{GpsError, Result};
use std::{collections::VecDeque, path::Path, time::Duration};

#[derive(Debug, Clone, PartialEq)]
pub enum ReplayStep {
    Line(String),
    /// Nothing arrives within the read timeout
    Timeout,
    /// The device disappears mid-read
    Fail(String),
}

/// Plays back a fixed sequence of reads.
///
/// Reads return immediately; a [`ReplayStep::Timeout`] stands in for a
/// read that waited the full timeout. Once the script is exhausted every
/// read times out, like a receiver that went quiet.
#[derive(Debug, Clone)]
pub struct ReplayTransport {
    name: String,
    steps: VecDeque<ReplayStep>,
    failing_opens: u32,
    open_calls: u32,
    reads: u32,
    state: ConnectionState,
}

impl ReplayTransport {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            steps: VecDeque::new(),
            failing_opens: 0,
            open_calls: 0,
            reads: 0,
            state: ConnectionState::Disconnected,
        }
    }

    /// Load an NMEA log, one sentence per line. Blank lines are skipped.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        Ok(Self::new(path.display().to_string()).with_lines(
            contents.lines().map(str::trim).filter(|line| !line.is_empty()),
        ))
    }

    pub fn with_lines<I, S>(mut self, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.steps.extend(lines.into_iter().map(|line| ReplayStep::Line(line.into())));
        self
    }

    /// Make the next `count` calls to `open()` fail.
    pub fn failing_opens(mut self, count: u32) -> Self {
        self.failing_opens = count;
        self
    }

    pub fn push_line(&mut self, line: impl Into<String>) {
        self.steps.push_back(ReplayStep::Line(line.into()));
    }

    pub fn push_timeout(&mut self) {
        self.steps.push_back(ReplayStep::Timeout);
    }

    pub fn push_failure(&mut self, reason: impl Into<String>) {
        self.steps.push_back(ReplayStep::Fail(reason.into()));
    }

    pub fn fail_next_opens(&mut self, count: u32) {
        self.failing_opens = count;
    }

    pub fn remaining(&self) -> usize {
        self.steps.len()
    }

    pub fn open_calls(&self) -> u32 {
        self.open_calls
    }

    /// Reads attempted while open, including timeouts
    pub fn reads(&self) -> u32 {
        self.reads
    }
}

impl Transport for ReplayTransport {
    fn open(&mut self) -> Result<()> {
        self.open_calls += 1;
        if self.failing_opens > 0 {
            self.failing_opens -= 1;
            self.state = ConnectionState::Error;
            return Err(GpsError::Connection(format!("{} unavailable", self.name)));
        }
        self.state = ConnectionState::Connected;
        Ok(())
    }

    async fn read_line(&mut self, _timeout: Duration) -> Result<Option<String>> {
        if self.state != ConnectionState::Connected {
            return Err(GpsError::Connection(format!("{} is not open", self.name)));
        }
        self.reads += 1;

        match self.steps.pop_front() {
            Some(ReplayStep::Line(line)) => Ok(Some(line)),
            Some(ReplayStep::Timeout) | None => Ok(None),
            Some(ReplayStep::Fail(reason)) => {
                self.state = ConnectionState::Error;
                Err(GpsError::Io(std::io::Error::new(std::io::ErrorKind::BrokenPipe, reason)))
            }
        }
    }

    fn close(&mut self) {
        self.state = ConnectionState::Disconnected;
    }

    fn state(&self) -> ConnectionState {
        self.state
    }

    fn port(&self) -> &str {
        &self.name
    }

    fn baud_rate(&self) -> u32 {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const TICK: Duration = Duration::from_millis(1);

    #[tokio::test]
    async fn test_plays_steps_in_order() {
        let mut transport = ReplayTransport::new("script").with_lines(["$A", "$B"]);
        transport.push_timeout();
        transport.push_failure("unplugged");
        transport.open().unwrap();

        assert_eq!(transport.read_line(TICK).await.unwrap().as_deref(), Some("$A"));
        assert_eq!(transport.read_line(TICK).await.unwrap().as_deref(), Some("$B"));
        assert_eq!(transport.read_line(TICK).await.unwrap(), None);
        assert!(transport.read_line(TICK).await.is_err());
        assert_eq!(transport.state(), ConnectionState::Error);
        assert_eq!(transport.reads(), 4);
    }

    #[tokio::test]
    async fn test_failing_opens_then_recovers() {
        let mut transport = ReplayTransport::new("script").failing_opens(2);
        assert!(transport.open().is_err());
        assert!(transport.open().is_err());
        assert!(transport.open().is_ok());
        assert_eq!(transport.open_calls(), 3);
        assert_eq!(transport.state(), ConnectionState::Connected);
    }

    #[tokio::test]
    async fn test_from_file_skips_blank_lines() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "$GPGSV,1").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "  $GPGGA,2  ").unwrap();

        let mut transport = ReplayTransport::from_file(file.path()).unwrap();
        assert_eq!(transport.remaining(), 2);

        transport.open().unwrap();
        transport.read_line(TICK).await.unwrap();
        assert_eq!(transport.read_line(TICK).await.unwrap().as_deref(), Some("$GPGGA,2"));
    }

    #[tokio::test]
    async fn test_read_before_open_is_an_error() {
        let mut transport = ReplayTransport::new("script").with_lines(["$A"]);
        assert!(transport.read_line(TICK).await.is_err());
        assert_eq!(transport.remaining(), 1);
    }
}
