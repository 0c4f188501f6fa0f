// src/lib.rs
//! Road Scan GPS Library
//!
//! Serial NMEA positioning for the road damage detection pipeline. A
//! [`GpsHandler`] keeps a quality-filtered, cached position that the
//! detection loop can read without blocking, and the [`locate`] module
//! chains it with an IP geolocation fallback.

pub mod config;
pub mod error;
pub mod gps;
pub mod handler;
pub mod locate;

// Re-export main types for convenience
pub use config::{AcceptancePolicy, GpsConfig};
pub use error::{GpsError, Result};
pub use gps::{Fix, FixQuality, Position};
pub use handler::{Diagnostics, GpsHandler, HandlerState};
pub use locate::{IpGeolocator, Locator, PositionSource};
