// src/gps/nmea.rs
//! NMEA 0183 sentence parsing
//!
//! Only the position-bearing sentences are decoded: `GGA` and `RMC` from the
//! `GP` (GPS) and `GN` (multi-constellation) talkers. Every other well-formed
//! sentence comes back as [`Sentence::Unrecognized`], which is the common case
//! on a live receiver and not an error.

use super::fix::{Fix, FixQuality};
use chrono::{NaiveDate, NaiveTime, Timelike};
use std::fmt;

/// GGA has 14 data fields after the address field.
const GGA_FIELDS: usize = 15;
/// RMC through the date field. Magnetic variation and mode are optional.
const RMC_MIN_FIELDS: usize = 10;

/// A decoded sentence. The handler matches on this exhaustively.
#[derive(Debug, Clone, PartialEq)]
pub enum Sentence {
    /// Fix data: position, quality and satellite count.
    Gga(Fix),
    /// Recommended minimum: position, time and date, no satellite count.
    Rmc(Fix),
    /// Valid framing, but a talker or sentence type we do not decode.
    Unrecognized(String),
}

impl Sentence {
    pub fn fix(&self) -> Option<&Fix> {
        match self {
            Sentence::Gga(fix) | Sentence::Rmc(fix) => Some(fix),
            Sentence::Unrecognized(_) => None,
        }
    }

    pub fn into_fix(self) -> Option<Fix> {
        match self {
            Sentence::Gga(fix) | Sentence::Rmc(fix) => Some(fix),
            Sentence::Unrecognized(_) => None,
        }
    }

    pub fn kind(&self) -> &str {
        match self {
            Sentence::Gga(_) => "GGA",
            Sentence::Rmc(_) => "RMC",
            Sentence::Unrecognized(address) => address,
        }
    }
}

/// Why a line could not be used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseFailure {
    Empty,
    MissingStart,
    MalformedChecksum,
    BadChecksum { expected: u8, actual: u8 },
    TooFewFields { kind: &'static str, found: usize },
    InvalidField(&'static str),
}

impl fmt::Display for ParseFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseFailure::Empty => write!(f, "empty line"),
            ParseFailure::MissingStart => write!(f, "line does not start with '$'"),
            ParseFailure::MalformedChecksum => write!(f, "checksum is not two hex digits"),
            ParseFailure::BadChecksum { expected, actual } => {
                write!(f, "checksum mismatch: sentence says {:02X}, computed {:02X}", expected, actual)
            }
            ParseFailure::TooFewFields { kind, found } => {
                write!(f, "{} sentence has only {} fields", kind, found)
            }
            ParseFailure::InvalidField(field) => write!(f, "invalid {} field", field),
        }
    }
}

impl std::error::Error for ParseFailure {}

/// Which coordinate a `ddmm.mmmm` value encodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Latitude,
    Longitude,
}

impl Axis {
    fn degree_digits(self) -> usize {
        match self {
            Axis::Latitude => 2,
            Axis::Longitude => 3,
        }
    }

    fn max_degrees(self) -> f64 {
        match self {
            Axis::Latitude => 90.0,
            Axis::Longitude => 180.0,
        }
    }

    fn hemispheres(self) -> (char, char) {
        match self {
            Axis::Latitude => ('N', 'S'),
            Axis::Longitude => ('E', 'W'),
        }
    }
}

/// Decode a line into a `Fix`, or `None` when it carries no usable sentence.
pub fn parse(line: &str) -> Option<Fix> {
    match parse_sentence(line) {
        Ok(sentence) => sentence.into_fix(),
        Err(failure) => {
            log::debug!("Discarding NMEA line ({}): {:?}", failure, line);
            None
        }
    }
}

/// Decode a line into a [`Sentence`].
pub fn parse_sentence(line: &str) -> Result<Sentence, ParseFailure> {
    let line = line.trim();
    if line.is_empty() {
        return Err(ParseFailure::Empty);
    }

    let body = line.strip_prefix('$').ok_or(ParseFailure::MissingStart)?;
    let body = match body.split_once('*') {
        Some((body, given)) => {
            let expected = parse_checksum(given)?;
            let actual = checksum(body);
            if expected != actual {
                return Err(ParseFailure::BadChecksum { expected, actual });
            }
            body
        }
        None => body,
    };

    let parts: Vec<&str> = body.split(',').collect();
    let address = parts[0];
    if address.len() != 5 || !address.bytes().all(|b| b.is_ascii_alphanumeric()) {
        return Ok(Sentence::Unrecognized(address.to_string()));
    }

    let (talker, kind) = address.split_at(2);
    match (talker, kind) {
        ("GP" | "GN", "GGA") => parse_gga(&parts).map(Sentence::Gga),
        ("GP" | "GN", "RMC") => parse_rmc(&parts).map(Sentence::Rmc),
        _ => Ok(Sentence::Unrecognized(address.to_string())),
    }
}

/// Parse GGA (Global Positioning System Fix Data)
fn parse_gga(parts: &[&str]) -> Result<Fix, ParseFailure> {
    if parts.len() < GGA_FIELDS {
        return Err(ParseFailure::TooFewFields { kind: "GGA", found: parts.len() });
    }

    let utc_time = parse_time(parts[1])?;

    // An empty quality field is reported by some receivers before first fix
    let quality = match parts[6] {
        "" => FixQuality::NoFix,
        raw => raw
            .parse::<u8>()
            .ok()
            .and_then(FixQuality::from_u8)
            .ok_or(ParseFailure::InvalidField("quality"))?,
    };

    let satellites = match parts[7] {
        "" => None,
        raw => Some(raw.parse::<u8>().map_err(|_| ParseFailure::InvalidField("satellites"))?),
    };

    if !quality.is_fix() {
        return Ok(Fix {
            satellites,
            ..Fix::no_fix(utc_time)
        });
    }

    let (latitude, longitude) = parse_position(parts[2], parts[3], parts[4], parts[5])?;
    Ok(Fix {
        latitude: Some(latitude),
        longitude: Some(longitude),
        utc_time,
        date: None,
        quality,
        satellites,
    })
}

/// Parse RMC (Recommended Minimum Specific GNSS Data)
fn parse_rmc(parts: &[&str]) -> Result<Fix, ParseFailure> {
    if parts.len() < RMC_MIN_FIELDS {
        return Err(ParseFailure::TooFewFields { kind: "RMC", found: parts.len() });
    }

    let utc_time = parse_time(parts[1])?;
    let date = parse_date(parts[9])?;

    let valid = match parts[2] {
        "A" => true,
        "V" | "" => false,
        _ => return Err(ParseFailure::InvalidField("status")),
    };

    // NMEA 2.3 and later append a mode indicator that refines the status
    let quality = if valid {
        match parts.get(12).copied().unwrap_or("") {
            "" | "A" => FixQuality::Gps,
            "D" => FixQuality::Dgps,
            "P" => FixQuality::Pps,
            "R" => FixQuality::RtkFixed,
            "F" => FixQuality::RtkFloat,
            "E" => FixQuality::Estimated,
            "M" => FixQuality::Manual,
            "S" => FixQuality::Simulation,
            "N" => FixQuality::NoFix,
            _ => return Err(ParseFailure::InvalidField("mode")),
        }
    } else {
        FixQuality::NoFix
    };

    if !quality.is_fix() {
        return Ok(Fix {
            date,
            ..Fix::no_fix(utc_time)
        });
    }

    let (latitude, longitude) = parse_position(parts[3], parts[4], parts[5], parts[6])?;
    Ok(Fix {
        latitude: Some(latitude),
        longitude: Some(longitude),
        utc_time,
        date,
        quality,
        satellites: None,
    })
}

fn parse_position(lat: &str, lat_hemi: &str, lon: &str, lon_hemi: &str) -> Result<(f64, f64), ParseFailure> {
    let latitude = coordinate(lat, lat_hemi, Axis::Latitude).ok_or(ParseFailure::InvalidField("latitude"))?;
    let longitude = coordinate(lon, lon_hemi, Axis::Longitude).ok_or(ParseFailure::InvalidField("longitude"))?;
    Ok((latitude, longitude))
}

/// Convert an NMEA `ddmm.mmmm` / `dddmm.mmmm` value and hemisphere letter to
/// signed decimal degrees. `S` and `W` are negative.
pub fn nmea_to_decimal(value: &str, hemisphere: &str) -> Option<f64> {
    let axis = match hemisphere {
        "N" | "S" => Axis::Latitude,
        "E" | "W" => Axis::Longitude,
        _ => return None,
    };
    coordinate(value, hemisphere, axis)
}

fn coordinate(value: &str, hemisphere: &str, axis: Axis) -> Option<f64> {
    let (positive, negative) = axis.hemispheres();
    let sign = match hemisphere.chars().next() {
        Some(c) if c == positive && hemisphere.len() == 1 => 1.0,
        Some(c) if c == negative && hemisphere.len() == 1 => -1.0,
        _ => return None,
    };

    let whole_len = value.find('.').unwrap_or(value.len());
    // Degrees take whatever precedes the two-digit whole minutes
    if whole_len < 3 || whole_len > axis.degree_digits() + 2 {
        return None;
    }
    if !value.bytes().all(|b| b.is_ascii_digit() || b == b'.') {
        return None;
    }

    let (degrees, minutes) = value.split_at(whole_len - 2);
    let degrees: f64 = degrees.parse().ok()?;
    let minutes: f64 = minutes.parse().ok()?;
    if minutes >= 60.0 {
        return None;
    }

    let decimal = degrees + minutes / 60.0;
    if decimal > axis.max_degrees() {
        return None;
    }
    Some(sign * decimal)
}

/// Convert signed decimal degrees back to an NMEA value and hemisphere letter.
///
/// Minutes are written with six decimals, finer than any receiver reports.
pub fn decimal_to_nmea(decimal: f64, axis: Axis) -> (String, char) {
    let (positive, negative) = axis.hemispheres();
    let hemisphere = if decimal < 0.0 { negative } else { positive };

    let magnitude = decimal.abs();
    let mut degrees = magnitude.trunc() as u32;
    let mut minutes = ((magnitude - degrees as f64) * 60.0 * 1e6).round() / 1e6;
    if minutes >= 60.0 {
        degrees += 1;
        minutes -= 60.0;
    }

    let value = match axis {
        Axis::Latitude => format!("{:02}{:09.6}", degrees, minutes),
        Axis::Longitude => format!("{:03}{:09.6}", degrees, minutes),
    };
    (value, hemisphere)
}

/// XOR of every byte between `$` and `*`.
pub fn checksum(body: &str) -> u8 {
    body.bytes().fold(0u8, |acc, b| acc ^ b)
}

/// Frame a sentence body as `$body*HH`.
pub fn with_checksum(body: &str) -> String {
    format!("${}*{:02X}", body, checksum(body))
}

fn parse_checksum(given: &str) -> Result<u8, ParseFailure> {
    let given = given.trim();
    if given.len() != 2 {
        return Err(ParseFailure::MalformedChecksum);
    }
    u8::from_str_radix(given, 16).map_err(|_| ParseFailure::MalformedChecksum)
}

/// `hhmmss` with optional fractional seconds
fn parse_time(raw: &str) -> Result<Option<NaiveTime>, ParseFailure> {
    if raw.is_empty() {
        return Ok(None);
    }
    let invalid = ParseFailure::InvalidField("time");
    if raw.len() < 6 || !raw.is_char_boundary(6) || !raw[..6].bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid);
    }

    let hour: u32 = raw[0..2].parse().map_err(|_| invalid.clone())?;
    let minute: u32 = raw[2..4].parse().map_err(|_| invalid.clone())?;
    let second: u32 = raw[4..6].parse().map_err(|_| invalid.clone())?;

    let millis = match &raw[6..] {
        "" => 0,
        fraction => {
            let digits = fraction.strip_prefix('.').ok_or_else(|| invalid.clone())?;
            if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid);
            }
            let padded = format!("{:0<3}", &digits[..digits.len().min(3)]);
            padded.parse::<u32>().map_err(|_| invalid.clone())?
        }
    };

    NaiveTime::from_hms_milli_opt(hour, minute, second, millis)
        .map(Some)
        .ok_or(invalid)
}

/// `ddmmyy`, assumed to be in the 2000s
fn parse_date(raw: &str) -> Result<Option<NaiveDate>, ParseFailure> {
    if raw.is_empty() {
        return Ok(None);
    }
    let invalid = ParseFailure::InvalidField("date");
    if raw.len() != 6 || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid);
    }

    let day: u32 = raw[0..2].parse().map_err(|_| invalid.clone())?;
    let month: u32 = raw[2..4].parse().map_err(|_| invalid.clone())?;
    let year: i32 = raw[4..6].parse().map_err(|_| invalid.clone())?;

    NaiveDate::from_ymd_opt(2000 + year, month, day)
        .map(Some)
        .ok_or(invalid)
}

fn format_time(time: Option<NaiveTime>) -> String {
    match time {
        Some(t) => format!("{}.{:02}", t.format("%H%M%S"), t.nanosecond() / 10_000_000),
        None => String::new(),
    }
}

fn format_position(fix: &Fix) -> String {
    match (fix.latitude, fix.longitude) {
        (Some(lat), Some(lon)) => {
            let (lat, ns) = decimal_to_nmea(lat, Axis::Latitude);
            let (lon, ew) = decimal_to_nmea(lon, Axis::Longitude);
            format!("{},{},{},{}", lat, ns, lon, ew)
        }
        _ => ",,,".to_string(),
    }
}

/// Encode a fix as a `$GPGGA` sentence with a valid checksum.
pub fn encode_gga(fix: &Fix) -> String {
    let satellites = fix.satellites.map(|s| format!("{:02}", s)).unwrap_or_default();
    let body = format!(
        "GPGGA,{},{},{},{},,,,,,,",
        format_time(fix.utc_time),
        format_position(fix),
        fix.quality.as_u8(),
        satellites
    );
    with_checksum(&body)
}

/// Encode a fix as a `$GPRMC` sentence with a valid checksum.
pub fn encode_rmc(fix: &Fix) -> String {
    let status = if fix.quality.is_fix() && fix.has_position() { "A" } else { "V" };
    let date = fix.date.map(|d| d.format("%d%m%y").to_string()).unwrap_or_default();
    let body = format!(
        "GPRMC,{},{},{},,,{},,,{}",
        format_time(fix.utc_time),
        status,
        format_position(fix),
        date,
        if status == "A" { "A" } else { "N" }
    );
    with_checksum(&body)
}

#[cfg(test)]
mod tests {
    use super::*;

    const GGA: &str = "$GPGGA,143045.00,2836.8075,N,07712.5926,E,1,08,0.9,545.4,M,46.9,M,,*6F";
    const RMC: &str = "$GPRMC,143045.00,A,2836.8075,N,07712.5926,E,0.5,54.7,310126,,,A*63";

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {}, got {}",
            expected,
            actual
        );
    }

    #[test]
    fn test_gga_parsing() {
        let fix = parse(GGA).expect("GGA should parse");

        assert_close(fix.latitude.unwrap(), 28.0 + 36.8075 / 60.0);
        assert_close(fix.longitude.unwrap(), 77.0 + 12.5926 / 60.0);
        assert_eq!(fix.quality, FixQuality::Gps);
        assert_eq!(fix.satellites, Some(8));
        assert_eq!(fix.utc_time, NaiveTime::from_hms_opt(14, 30, 45));
        assert_eq!(fix.date, None);
    }

    #[test]
    fn test_rmc_parsing() {
        let sentence = parse_sentence(RMC).unwrap();
        let Sentence::Rmc(fix) = sentence else {
            panic!("expected RMC, got {:?}", sentence);
        };

        assert_close(fix.latitude.unwrap(), 28.613458333333333);
        assert_eq!(fix.quality, FixQuality::Gps);
        assert_eq!(fix.satellites, None);
        assert_eq!(fix.date, NaiveDate::from_ymd_opt(2026, 1, 31));
        assert_eq!(
            fix.timestamp().map(|t| t.to_string()).as_deref(),
            Some("2026-01-31 14:30:45")
        );
    }

    #[test]
    fn test_gn_talker_accepted() {
        let line = with_checksum("GNGGA,010203,4807.038,N,01131.000,E,2,12,0.9,545.4,M,46.9,M,,");
        let fix = parse(&line).unwrap();
        assert_eq!(fix.quality, FixQuality::Dgps);
        assert_eq!(fix.satellites, Some(12));
    }

    #[test]
    fn test_hemisphere_sign() {
        assert_close(nmea_to_decimal("2836.8075", "N").unwrap(), 28.613458333333333);
        assert_close(nmea_to_decimal("2836.8075", "S").unwrap(), -28.613458333333333);
        assert_close(nmea_to_decimal("07712.5926", "E").unwrap(), 77.20987666666667);
        assert_close(nmea_to_decimal("07712.5926", "W").unwrap(), -77.20987666666667);
    }

    #[test]
    fn test_coordinate_roundtrip_preserves_minutes() {
        let cases = [
            ("2836.8075", "N", Axis::Latitude),
            ("0000.0001", "S", Axis::Latitude),
            ("8959.9999", "N", Axis::Latitude),
            ("07712.5926", "E", Axis::Longitude),
            ("17959.9999", "W", Axis::Longitude),
            ("00030.5000", "W", Axis::Longitude),
        ];

        for (value, hemisphere, axis) in cases {
            let decimal = nmea_to_decimal(value, hemisphere).unwrap();
            let (encoded, letter) = decimal_to_nmea(decimal, axis);
            assert_eq!(letter.to_string(), hemisphere);

            let original: f64 = value.parse().unwrap();
            let back: f64 = encoded.parse().unwrap();
            assert!(
                (original % 100.0 - back % 100.0).abs() < 1e-6,
                "{} -> {} -> {}",
                value,
                decimal,
                encoded
            );
            assert_eq!((original / 100.0).trunc(), (back / 100.0).trunc());
        }
    }

    #[test]
    fn test_coordinate_rejects_bad_values() {
        assert_eq!(nmea_to_decimal("2860.0000", "N"), None);
        assert_eq!(nmea_to_decimal("9100.0000", "N"), None);
        assert_close(nmea_to_decimal("2836.8075", "E").unwrap(), 28.613458333333333);
        assert_eq!(nmea_to_decimal("2836.8075", "X"), None);
        assert_eq!(nmea_to_decimal("28-6.8075", "N"), None);
        assert_eq!(nmea_to_decimal("", "N"), None);
    }

    #[test]
    fn test_corrupted_checksum_rejected() {
        let corrupted = GGA.replace("*6F", "*6E");
        assert_eq!(
            parse_sentence(&corrupted),
            Err(ParseFailure::BadChecksum { expected: 0x6E, actual: 0x6F })
        );
        assert!(parse(&corrupted).is_none());

        let flipped = GGA.replace("2836", "2837");
        assert!(matches!(parse_sentence(&flipped), Err(ParseFailure::BadChecksum { .. })));
    }

    #[test]
    fn test_garbage_rejected() {
        for line in ["", "   ", "hello world", "\u{fffd}\u{fffd}$GP", "$GPGGA,1430*ZZ", "$GPGGA,14304"] {
            assert!(parse(line).is_none(), "{:?} should not parse", line);
        }
        assert_eq!(parse_sentence("hello"), Err(ParseFailure::MissingStart));
        assert_eq!(
            parse_sentence("$GPGGA,14304"),
            Err(ParseFailure::TooFewFields { kind: "GGA", found: 2 })
        );
    }

    #[test]
    fn test_unrecognized_sentence_is_not_a_failure() {
        let gsv = "$GPGSV,3,1,12,01,40,083,46,02,17,308,41,12,07,344,39,14,22,228,45*7F";
        assert_eq!(parse_sentence(gsv), Ok(Sentence::Unrecognized("GPGSV".to_string())));
        assert!(parse(gsv).is_none());

        let glonass = with_checksum("GLGGA,143045.00,2836.8075,N,07712.5926,E,1,08,0.9,545.4,M,46.9,M,,");
        assert_eq!(parse_sentence(&glonass), Ok(Sentence::Unrecognized("GLGGA".to_string())));
    }

    #[test]
    fn test_quality_zero_fix() {
        let line = "$GPGGA,143045.00,,,,,0,00,,,,,,,*4F";
        let sentence = parse_sentence(line).unwrap();
        assert_eq!(sentence.kind(), "GGA");

        let fix = sentence.into_fix().unwrap();
        assert_eq!(fix.latitude, None);
        assert_eq!(fix.longitude, None);
        assert_eq!(fix.quality, FixQuality::NoFix);
        assert_eq!(fix.satellites, Some(0));
        assert_eq!(fix.time_string().as_deref(), Some("14:30:45"));
    }

    #[test]
    fn test_quality_zero_discards_stale_coordinates() {
        let line = with_checksum("GPGGA,143045.00,2836.8075,N,07712.5926,E,0,03,,,,,,,");
        let fix = parse(&line).unwrap();
        assert_eq!(fix.quality, FixQuality::NoFix);
        assert!(!fix.has_position());
    }

    #[test]
    fn test_missing_quality_field_is_no_fix() {
        let line = with_checksum("GPGGA,143045.00,,,,,,,,,,,,,");
        let fix = parse(&line).unwrap();
        assert_eq!(fix.quality, FixQuality::NoFix);
        assert_eq!(fix.satellites, None);
    }

    #[test]
    fn test_fix_quality_without_coordinates_is_rejected() {
        let line = with_checksum("GPGGA,143045.00,,,,,1,08,0.9,545.4,M,46.9,M,,");
        assert_eq!(parse_sentence(&line), Err(ParseFailure::InvalidField("latitude")));
        assert!(parse(&line).is_none());
    }

    #[test]
    fn test_out_of_range_quality_rejected() {
        let line = with_checksum("GPGGA,143045.00,2836.8075,N,07712.5926,E,9,08,0.9,545.4,M,46.9,M,,");
        assert_eq!(parse_sentence(&line), Err(ParseFailure::InvalidField("quality")));
    }

    #[test]
    fn test_rmc_void_status() {
        let line = with_checksum("GPRMC,235959,V,,,,,,,010226,,,N");
        let fix = parse(&line).unwrap();
        assert_eq!(fix.quality, FixQuality::NoFix);
        assert!(!fix.has_position());
        assert_eq!(fix.utc_time, NaiveTime::from_hms_opt(23, 59, 59));
    }

    #[test]
    fn test_rmc_mode_indicator_refines_quality() {
        let line = with_checksum("GPRMC,143045.00,A,2836.8075,N,07712.5926,E,0.5,54.7,310126,,,D");
        assert_eq!(parse(&line).unwrap().quality, FixQuality::Dgps);

        let line = with_checksum("GPRMC,143045.00,A,2836.8075,N,07712.5926,E,0.5,54.7,310126,,,N");
        assert_eq!(parse(&line).unwrap().quality, FixQuality::NoFix);
    }

    #[test]
    fn test_sentence_without_checksum_accepted() {
        let line = "$GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,";
        let fix = parse(line).unwrap();
        assert_close(fix.latitude.unwrap(), 48.1173);
        assert_close(fix.longitude.unwrap(), 11.516666666666667);
    }

    #[test]
    fn test_fractional_seconds() {
        assert_eq!(parse_time("010203.5"), Ok(NaiveTime::from_hms_milli_opt(1, 2, 3, 500)));
        assert_eq!(parse_time("010203.123456"), Ok(NaiveTime::from_hms_milli_opt(1, 2, 3, 123)));
        assert_eq!(parse_time("250000"), Err(ParseFailure::InvalidField("time")));
        assert_eq!(parse_time("0102"), Err(ParseFailure::InvalidField("time")));
    }

    #[test]
    fn test_encoded_sentences_parse_back() {
        let fix = Fix {
            latitude: Some(-33.856784),
            longitude: Some(151.215297),
            utc_time: NaiveTime::from_hms_opt(8, 15, 0),
            date: NaiveDate::from_ymd_opt(2026, 10, 16),
            quality: FixQuality::Gps,
            satellites: Some(9),
        };

        let gga = parse(&encode_gga(&fix)).unwrap();
        assert!((gga.latitude.unwrap() - fix.latitude.unwrap()).abs() < 1e-6);
        assert!((gga.longitude.unwrap() - fix.longitude.unwrap()).abs() < 1e-6);
        assert_eq!(gga.satellites, Some(9));
        assert_eq!(gga.utc_time, fix.utc_time);

        let rmc = parse(&encode_rmc(&fix)).unwrap();
        assert_eq!(rmc.date, fix.date);
        assert_eq!(rmc.quality, FixQuality::Gps);
    }
}
