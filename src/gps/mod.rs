// src/gps/mod.rs
//! GPS data handling: fixes, NMEA parsing and the byte transports

pub mod fix;
pub mod nmea;
pub mod replay;
pub mod transport;

pub use fix::{Fix, FixQuality, Position};
pub use nmea::{ParseFailure, Sentence};
pub use replay::ReplayTransport;
pub use transport::{ConnectionState, SerialTransport, Transport};
