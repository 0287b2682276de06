//! Mail header helpers
//!
//! Message-ID extraction and generation, reply subject cleanup, and
//! address list parsing.

pub mod address;

use std::sync::LazyLock;
use mailparse::{parse_headers, MailHeaderMap};
use md5::{Digest, Md5};
use rand::Rng;
use regex::Regex;
use tracing::debug;

pub use address::{format_email_addresses, get_address_info, get_address_info_multiple, AddressInfo};

/// Local part prefix of generated Message-IDs
pub const MESSAGE_ID_PREFIX: &str = "eventum.md5";

/// Shortest base-36 component of a generated Message-ID
const MIN_ID_PART: usize = 8;

static BRACKETED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^<>]*>").expect("bracketed pattern"));

static ISSUE_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[#\d+\] ?").expect("issue tag pattern"));

static REPLY_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:re|res|aw|rif\.?)(?:\[\d+\])?[ \t]*:[ \t]*").expect("reply prefix pattern")
});

/// The Message-ID of a message, generating one when the headers lack it
///
/// The value may start on a folded continuation line. The bracketed value
/// is returned as written.
pub fn get_message_id(headers: &str, body: &str, hostname: &str) -> String {
    let found = match parse_headers(headers.as_bytes()) {
        Ok((parsed, _)) => parsed
            .get_first_value("Message-ID")
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .map(|value| match BRACKETED.find(&value) {
                Some(m) => m.as_str().to_string(),
                None => value,
            }),
        Err(e) => {
            debug!("Unparsable headers, generating a Message-ID: {}", e);
            None
        }
    };

    match found {
        Some(id) => id,
        None => {
            let mut seed = Vec::with_capacity(headers.len() + body.len());
            seed.extend_from_slice(headers.as_bytes());
            seed.extend_from_slice(body.as_bytes());
            message_id_from(&seed, hostname)
        }
    }
}

/// A new unique Message-ID for `hostname`
pub fn generate_message_id(hostname: &str) -> String {
    message_id_from(&[], hostname)
}

fn message_id_from(seed: &[u8], hostname: &str) -> String {
    let mut rng = rand::rng();
    let first: u64 = rng.random();

    let mut hasher = Md5::new();
    hasher.update(seed);
    hasher.update(rng.random::<u64>().to_le_bytes());
    let digest = hasher.finalize();
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&digest);
    let second = u128::from_be_bytes(bytes);

    format!(
        "<{}.{}.{}@{}>",
        MESSAGE_ID_PREFIX,
        to_base36(u128::from(first)),
        to_base36(second),
        hostname
    )
}

/// Lowercase base-36, zero padded to at least eight digits
fn to_base36(mut n: u128) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let mut out = Vec::new();
    while n > 0 {
        out.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    while out.len() < MIN_ID_PART {
        out.push(b'0');
    }
    out.reverse();
    String::from_utf8_lossy(&out).into_owned()
}

/// Collapse stacked reply prefixes in a subject
///
/// With `remove_issue_id`, `[#123]` tags are dropped first. A single reply
/// prefix is kept as written; two or more become one `Re: `.
pub fn remove_excess_re(subject: &str, remove_issue_id: bool) -> String {
    let subject = if remove_issue_id {
        ISSUE_TAG.replace_all(subject, "").into_owned()
    } else {
        subject.to_string()
    };

    let mut rest = subject.as_str();
    let mut first_prefix = None;
    let mut count = 0;
    while let Some(m) = REPLY_PREFIX.find(rest) {
        if m.as_str().is_empty() {
            break;
        }
        if first_prefix.is_none() {
            first_prefix = Some(m.as_str());
        }
        count += 1;
        rest = &rest[m.end()..];
    }

    match (count, first_prefix) {
        (1, Some(prefix)) => format!("{}{}", prefix, rest),
        (0, _) => rest.to_string(),
        _ => format!("Re: {}", rest),
    }
}
