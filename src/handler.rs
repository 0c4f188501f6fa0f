// src/handler.rs
//! Position cache and acceptance policy: the object the detection pipeline
//! talks to.
//!
//! A handler owns one transport and polls it cooperatively on the caller's
//! task. `get_coordinates()` spends at most `max_retries` reads of
//! `read_timeout` each looking for a sentence that passes the policy;
//! `get_cached_coordinates()` never touches the device.
//!
//! Nothing here returns an error for ordinary GPS trouble. A missing,
//! unplugged or silent receiver degrades to "no position" (or to the last
//! accepted fix) and the next call makes one reconnect attempt.

use crate::{
    config::{AcceptancePolicy, GpsConfig},
    error::Result,
    gps::{nmea, ConnectionState, Fix, Position, Sentence, SerialTransport, Transport},
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::{Arc, PoisonError, RwLock};

/// Consecutive empty calls tolerated before warning about lost fix
const NO_FIX_WARN_AFTER: u32 = 5;
/// Once warning, repeat only every this many calls
const NO_FIX_WARN_EVERY: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HandlerState {
    Uninitialized,
    Connecting,
    /// Device open, no call has evaluated sentences since
    Connected,
    /// A fix has been accepted and cached
    Active,
    /// Device open but nothing has met the policy yet
    Degraded,
    Error,
    Closed,
}

/// An accepted fix plus the wall-clock time it was accepted.
///
/// `received_at` comes from the host clock, never from the NMEA time field,
/// and is only reported in diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedFix {
    pub fix: Fix,
    pub received_at: DateTime<Utc>,
}

impl CachedFix {
    pub fn age_seconds(&self) -> i64 {
        Utc::now().signed_duration_since(self.received_at).num_seconds()
    }
}

/// Most recent accepted fix. Written only by the owning handler; readers
/// always get a copy.
#[derive(Debug, Clone, Default)]
pub struct PositionCache {
    inner: Arc<RwLock<Option<CachedFix>>>,
}

impl PositionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<CachedFix> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn position(&self) -> Position {
        self.get()
            .map(|cached| Position::from(&cached.fix))
            .unwrap_or_else(Position::none)
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).is_none()
    }

    fn store(&self, fix: Fix) {
        let entry = CachedFix {
            fix,
            received_at: Utc::now(),
        };
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = Some(entry);
    }
}

/// Outcome of one acquisition, before it is flattened into a [`Position`].
#[derive(Debug, Clone, PartialEq)]
pub enum Acquired {
    /// A sentence read during this call passed the policy
    Live(Fix),
    /// Nothing qualified; this is the last accepted fix, unchanged
    Cached(CachedFix),
    Unavailable,
}

impl Acquired {
    pub fn position(&self) -> Position {
        match self {
            Acquired::Live(fix) => Position::from(fix),
            Acquired::Cached(cached) => Position::from(&cached.fix),
            Acquired::Unavailable => Position::none(),
        }
    }
}

enum Verdict {
    Accepted(Fix),
    Rejected,
    Ignored,
}

/// Health snapshot for logs and status endpoints. Field names may change.
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostics {
    pub state: HandlerState,
    pub connection: ConnectionState,
    pub connected: bool,
    pub port: String,
    pub baud: u32,
    pub has_valid_fix: bool,
    pub last_latitude: Option<f64>,
    pub last_longitude: Option<f64>,
    pub last_timestamp: Option<String>,
    pub last_quality: u8,
    pub cache_age_seconds: Option<i64>,
    pub no_fix_cycles: u32,
    pub connection_attempts: u32,
    pub sentences_read: u64,
    pub parse_failures: u64,
    pub policy_rejections: u64,
}

/// Serial GPS client with a cached, policy-filtered position.
pub struct GpsHandler<T = SerialTransport> {
    transport: T,
    policy: AcceptancePolicy,
    cache: PositionCache,
    state: HandlerState,
    no_fix_cycles: u32,
    connection_attempts: u32,
    sentences_read: u64,
    parse_failures: u64,
    policy_rejections: u64,
}

impl GpsHandler<SerialTransport> {
    /// Build a handler for the configured serial port.
    ///
    /// Fails only for an invalid configuration. A device that cannot be
    /// opened leaves the handler in [`HandlerState::Error`]. Must be called
    /// from within a tokio runtime.
    pub fn from_config(config: &GpsConfig) -> Result<Self> {
        config.validate()?;
        let policy = config.policy()?;
        Self::new(SerialTransport::new(config.port.clone(), config.baud), policy)
    }
}

impl<T: Transport> GpsHandler<T> {
    pub fn new(transport: T, policy: AcceptancePolicy) -> Result<Self> {
        policy.validate()?;

        let mut handler = Self {
            transport,
            policy,
            cache: PositionCache::new(),
            state: HandlerState::Uninitialized,
            no_fix_cycles: 0,
            connection_attempts: 0,
            sentences_read: 0,
            parse_failures: 0,
            policy_rejections: 0,
        };
        handler.connect();
        Ok(handler)
    }

    fn connect(&mut self) -> bool {
        self.state = HandlerState::Connecting;
        self.connection_attempts += 1;

        match self.transport.open() {
            Ok(()) => {
                self.state = if self.cache.is_empty() {
                    HandlerState::Connected
                } else {
                    HandlerState::Active
                };
                true
            }
            Err(e) => {
                log::warn!(
                    "GPS connection failed on {} (attempt {}): {}",
                    self.transport.port(),
                    self.connection_attempts,
                    e
                );
                self.state = HandlerState::Error;
                false
            }
        }
    }

    /// One reconnect attempt if the last one failed
    fn ensure_connected(&mut self) -> bool {
        match self.state {
            HandlerState::Closed => false,
            HandlerState::Error => self.connect(),
            _ => self.transport.state() == ConnectionState::Connected,
        }
    }

    /// Best available position now.
    ///
    /// Never fails: returns a fresh fix, the cached one (if allowed), or
    /// [`Position::none`].
    pub async fn get_coordinates(&mut self) -> Position {
        self.acquire().await.position()
    }

    /// Like [`get_coordinates`](Self::get_coordinates) but says where the
    /// answer came from.
    pub async fn acquire(&mut self) -> Acquired {
        if self.state == HandlerState::Closed {
            return Acquired::Unavailable;
        }

        let live = if self.ensure_connected() {
            self.read_qualifying().await
        } else {
            None
        };

        if let Some(fix) = live {
            self.no_fix_cycles = 0;
            self.cache.store(fix.clone());
            self.state = HandlerState::Active;
            return Acquired::Live(fix);
        }

        self.no_fix_cycles += 1;
        if self.no_fix_cycles > NO_FIX_WARN_AFTER
            && (self.no_fix_cycles - NO_FIX_WARN_AFTER - 1) % NO_FIX_WARN_EVERY == 0
        {
            log::warn!("No GPS fix for {} cycles", self.no_fix_cycles);
        }
        if self.state == HandlerState::Connected {
            self.state = HandlerState::Degraded;
        }

        if self.policy.use_cached_if_no_fix {
            if let Some(cached) = self.cache.get() {
                log::debug!("No new fix, using cached coordinates");
                return Acquired::Cached(cached);
            }
        }
        Acquired::Unavailable
    }

    async fn read_qualifying(&mut self) -> Option<Fix> {
        for _ in 0..self.policy.max_retries {
            let line = match self.transport.read_line(self.policy.read_timeout).await {
                Ok(Some(line)) => line,
                Ok(None) => continue,
                Err(e) => {
                    log::warn!("GPS read failed on {}: {}", self.transport.port(), e);
                    self.state = HandlerState::Error;
                    return None;
                }
            };
            self.sentences_read += 1;

            let sentence = match nmea::parse_sentence(&line) {
                Ok(sentence) => sentence,
                Err(failure) => {
                    log::debug!("NMEA parse failure ({}): {:?}", failure, line);
                    self.parse_failures += 1;
                    continue;
                }
            };

            match self.evaluate(sentence) {
                Verdict::Accepted(fix) => {
                    log::debug!(
                        "GPS fix: ({:.6}, {:.6}) quality={} sats={:?}",
                        fix.latitude.unwrap_or_default(),
                        fix.longitude.unwrap_or_default(),
                        fix.quality.as_u8(),
                        fix.satellites
                    );
                    return Some(fix);
                }
                Verdict::Rejected => self.policy_rejections += 1,
                Verdict::Ignored => {}
            }
        }
        None
    }

    fn evaluate(&self, sentence: Sentence) -> Verdict {
        let (fix, satellites_ok) = match sentence {
            Sentence::Gga(fix) => {
                let ok = fix.satellites.unwrap_or(0) >= self.policy.min_satellites;
                (fix, ok)
            }
            // RMC has no satellite count; a valid status stands in for it
            Sentence::Rmc(fix) => (fix, true),
            Sentence::Unrecognized(_) => return Verdict::Ignored,
        };

        if fix.has_position()
            && fix.quality.is_fix()
            && fix.quality >= self.policy.min_quality
            && satellites_ok
        {
            Verdict::Accepted(fix)
        } else {
            Verdict::Rejected
        }
    }

    /// Last accepted position without any device I/O.
    pub fn get_cached_coordinates(&self) -> Position {
        if self.state == HandlerState::Closed {
            return Position::none();
        }
        self.cache.position()
    }

    /// Whether the device is open right now. A handler in the error state
    /// makes one reconnect attempt first.
    pub fn is_connected(&mut self) -> bool {
        self.ensure_connected() && self.transport.state() == ConnectionState::Connected
    }

    pub fn has_valid_fix(&self) -> bool {
        self.state != HandlerState::Closed && !self.cache.is_empty()
    }

    pub fn get_diagnostics(&self) -> Diagnostics {
        let cached = self.cache.get();
        let connection = self.transport.state();
        Diagnostics {
            state: self.state,
            connection,
            connected: self.state != HandlerState::Closed && connection == ConnectionState::Connected,
            port: self.transport.port().to_string(),
            baud: self.transport.baud_rate(),
            has_valid_fix: cached.is_some(),
            last_latitude: cached.as_ref().and_then(|c| c.fix.latitude),
            last_longitude: cached.as_ref().and_then(|c| c.fix.longitude),
            last_timestamp: cached.as_ref().and_then(|c| c.fix.time_string()),
            last_quality: cached.as_ref().map_or(0, |c| c.fix.quality.as_u8()),
            cache_age_seconds: cached.as_ref().map(CachedFix::age_seconds),
            no_fix_cycles: self.no_fix_cycles,
            connection_attempts: self.connection_attempts,
            sentences_read: self.sentences_read,
            parse_failures: self.parse_failures,
            policy_rejections: self.policy_rejections,
        }
    }

    /// Release the device. Later calls report no position.
    pub fn close(&mut self) {
        if self.state == HandlerState::Closed {
            return;
        }
        self.transport.close();
        self.state = HandlerState::Closed;
        log::info!("GPS handler on {} closed", self.transport.port());
    }

    pub fn state(&self) -> HandlerState {
        self.state
    }

    pub fn policy(&self) -> &AcceptancePolicy {
        &self.policy
    }

    /// Read-only cache handle for other threads (health checks, UI)
    pub fn cache(&self) -> PositionCache {
        self.cache.clone()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }
}
