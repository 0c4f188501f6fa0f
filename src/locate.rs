// src/locate.rs
//! Caller-side fallback chain used when a detection fires:
//! live fix, then cached fix, then IP geolocation, then nothing.
//!
//! The handler never makes network calls; the IP lookup is injected here.

use crate::{
    config::GpsConfig,
    error::Result,
    gps::{Position, SerialTransport, Transport},
    handler::{Acquired, GpsHandler, HandlerState},
};
use serde::Serialize;
use std::time::{Duration, Instant};

/// Minimum spacing between "recording without location" warnings
pub const NO_LOCATION_WARN_INTERVAL: Duration = Duration::from_secs(60);

/// Coarse position lookup by public IP address.
pub trait IpGeolocator {
    fn locate(&self) -> Option<(f64, f64)>;
}

impl<F> IpGeolocator for F
where
    F: Fn() -> Option<(f64, f64)>,
{
    fn locate(&self) -> Option<(f64, f64)> {
        self()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionSource {
    Gps,
    CachedGps,
    IpGeolocation,
    Unavailable,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedPosition {
    #[serde(flatten)]
    pub position: Position,
    pub source: PositionSource,
}

/// Resolves the best position for a detection record.
pub struct Locator<T = SerialTransport, G = fn() -> Option<(f64, f64)>> {
    gps: Option<GpsHandler<T>>,
    geolocator: Option<G>,
    fallback_to_ip: bool,
    last_warning: Option<Instant>,
    suppressed_warnings: u64,
}

impl<G: IpGeolocator> Locator<SerialTransport, G> {
    /// Build from configuration. A disabled GPS yields a locator with no
    /// handler; an unreachable one still yields a handler in the error state.
    pub fn from_config(config: &GpsConfig, geolocator: Option<G>) -> Result<Self> {
        let gps = if config.enabled {
            let handler = GpsHandler::from_config(config)?;
            if handler.state() == HandlerState::Error {
                log::warn!("GPS module not responding on {}", config.port);
            }
            Some(handler)
        } else {
            config.validate()?;
            None
        };
        Ok(Self::new(gps, geolocator, config.fallback_to_ip))
    }
}

impl<T: Transport, G: IpGeolocator> Locator<T, G> {
    pub fn new(gps: Option<GpsHandler<T>>, geolocator: Option<G>, fallback_to_ip: bool) -> Self {
        Self {
            gps,
            geolocator,
            fallback_to_ip,
            last_warning: None,
            suppressed_warnings: 0,
        }
    }

    pub fn gps(&self) -> Option<&GpsHandler<T>> {
        self.gps.as_ref()
    }

    pub fn gps_mut(&mut self) -> Option<&mut GpsHandler<T>> {
        self.gps.as_mut()
    }

    /// Zero-I/O position for per-frame overlays.
    pub fn current(&self) -> Position {
        self.gps
            .as_ref()
            .map(GpsHandler::get_cached_coordinates)
            .unwrap_or_else(Position::none)
    }

    pub async fn resolve(&mut self) -> ResolvedPosition {
        if let Some(gps) = self.gps.as_mut() {
            match gps.acquire().await {
                Acquired::Live(fix) => {
                    return ResolvedPosition {
                        position: Position::from(&fix),
                        source: PositionSource::Gps,
                    }
                }
                Acquired::Cached(cached) => {
                    return ResolvedPosition {
                        position: Position::from(&cached.fix),
                        source: PositionSource::CachedGps,
                    }
                }
                Acquired::Unavailable => {}
            }
        }

        if self.fallback_to_ip {
            if let Some((latitude, longitude)) = self.geolocator.as_ref().and_then(|g| g.locate()) {
                log::debug!("Using IP geolocation ({:.4}, {:.4})", latitude, longitude);
                return ResolvedPosition {
                    position: Position {
                        latitude: Some(latitude),
                        longitude: Some(longitude),
                        gps_timestamp: None,
                        gps_quality: 0,
                    },
                    source: PositionSource::IpGeolocation,
                };
            }
        }

        self.warn_no_location(Instant::now());
        ResolvedPosition {
            position: Position::none(),
            source: PositionSource::Unavailable,
        }
    }

    /// Returns whether a warning was emitted
    fn warn_no_location(&mut self, now: Instant) -> bool {
        let due = self
            .last_warning
            .map_or(true, |last| now.duration_since(last) >= NO_LOCATION_WARN_INTERVAL);
        if !due {
            self.suppressed_warnings += 1;
            return false;
        }

        if self.suppressed_warnings > 0 {
            log::warn!(
                "No location available; detections are being recorded without coordinates ({} more since last warning)",
                self.suppressed_warnings
            );
        } else {
            log::warn!("No location available; detections are being recorded without coordinates");
        }
        self.last_warning = Some(now);
        self.suppressed_warnings = 0;
        true
    }

    pub fn close(&mut self) {
        if let Some(gps) = self.gps.as_mut() {
            gps.close();
        }
    }
}
