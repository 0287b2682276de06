//! Common utility functions

use chrono::{DateTime, Utc, NaiveDateTime};

/// Date format for database storage (GMT)
pub const DB_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Convert DateTime to database string format
pub fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.format(DB_DATE_FORMAT).to_string()
}

/// Parse database datetime string
pub fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(s, DB_DATE_FORMAT)
        .ok()
        .map(|ndt| DateTime::from_naive_utc_and_offset(ndt, Utc))
}

/// Get current UTC datetime
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

const KB: f64 = 1024.0;
const MB: f64 = KB * 1024.0;
const GB: f64 = MB * 1024.0;

/// Human readable size: "512 bytes", "1.50 KB", "2.00 MB"
pub fn format_file_size(bytes: u64) -> String {
    let size = bytes as f64;
    if size >= GB {
        format!("{:.2} GB", size / GB)
    } else if size >= MB {
        format!("{:.2} MB", size / MB)
    } else if size >= KB {
        format!("{:.2} KB", size / KB)
    } else {
        format!("{} bytes", bytes)
    }
}

/// Percent-encode everything except RFC 3986 unreserved characters
pub fn rawurlencode(s: &str) -> String {
    let mut encoded = String::with_capacity(s.len());
    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                encoded.push(byte as char)
            }
            _ => encoded.push_str(&format!("%{:02X}", byte)),
        }
    }
    encoded
}

/// Form-style encoding: like [`rawurlencode`] but spaces become `+` and `~` is escaped
pub fn urlencode(s: &str) -> String {
    rawurlencode(s).replace("%20", "+").replace('~', "%7E")
}
