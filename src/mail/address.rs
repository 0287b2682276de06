//! Address list parsing and formatting

use mailparse::{addrparse, addrparse_header, parse_header, MailAddr, MailAddrList, MailParseError};
use serde::Serialize;
use tracing::debug;

/// Host assumed for addresses without a domain
pub const DEFAULT_HOST: &str = "localhost";

/// One parsed mailbox
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddressInfo {
    /// Display name in double quotes, or empty
    pub sender_name: String,
    pub email: String,
    pub username: String,
    pub host: String,
}

fn quote_display_name(name: Option<&str>) -> String {
    match name.map(str::trim) {
        Some(name) if !name.is_empty() => format!("\"{}\"", name.replace('"', "\\\"")),
        _ => String::new(),
    }
}

fn address_info(display_name: Option<&str>, address: &str) -> Option<AddressInfo> {
    let address = address.trim();
    if address.is_empty() {
        return None;
    }
    let (username, host) = match address.rsplit_once('@') {
        Some((user, host)) if !host.is_empty() => (user.to_string(), host.to_string()),
        Some((user, _)) => (user.to_string(), DEFAULT_HOST.to_string()),
        None => (address.to_string(), DEFAULT_HOST.to_string()),
    };

    Some(AddressInfo {
        sender_name: quote_display_name(display_name),
        email: format!("{}@{}", username, host),
        username,
        host,
    })
}

/// Parse an address list, decoding encoded-word display names
///
/// ASCII lists go through a synthetic `To:` header so RFC 2047 names are
/// decoded.
fn parse_list(list: &str) -> Result<MailAddrList, MailParseError> {
    if list.is_ascii() {
        let line = format!("To: {}\r\n", list.replace(['\r', '\n'], " "));
        let (header, _) = parse_header(line.as_bytes())?;
        addrparse_header(&header)
    } else {
        addrparse(list)
    }
}

/// Bare local parts such as `Barney` that the RFC parser rejects
fn bare_local_parts(list: &str) -> Vec<AddressInfo> {
    list.split(',')
        .map(str::trim)
        .filter(|token| {
            !token.is_empty()
                && !token.chars().any(|c| c.is_whitespace() || "@<>:;\"()".contains(c))
        })
        .filter_map(|token| address_info(None, token))
        .collect()
}

/// Parse every mailbox of an address list
///
/// Group members are flattened in order and the group name is dropped.
pub fn get_address_info_multiple(list: &str) -> Vec<AddressInfo> {
    let addresses = match parse_list(list) {
        Ok(addresses) => addresses,
        Err(e) => {
            debug!("Falling back to bare local parts for {:?}: {}", list, e);
            return bare_local_parts(list);
        }
    };

    let mut infos = Vec::new();
    for address in addresses.iter() {
        match address {
            MailAddr::Single(single) => infos.extend(address_info(single.display_name.as_deref(), &single.addr)),
            MailAddr::Group(group) => infos.extend(
                group
                    .addrs
                    .iter()
                    .filter_map(|single| address_info(single.display_name.as_deref(), &single.addr)),
            ),
        }
    }
    infos
}

/// Parse the first mailbox of an address list
pub fn get_address_info(address: &str) -> Option<AddressInfo> {
    get_address_info_multiple(address).into_iter().next()
}

/// Normalize an address list to `"Name" <email>, email` form
pub fn format_email_addresses(list: &str) -> String {
    get_address_info_multiple(list)
        .into_iter()
        .map(|info| {
            if info.sender_name.is_empty() {
                info.email
            } else {
                format!("{} <{}>", info.sender_name, info.email)
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_address_info() {
        let cases = [
            ("Test User <test@example.com>", "\"Test User\"", "test@example.com"),
            ("\"Test User\" <test@example.com>", "\"Test User\"", "test@example.com"),
            ("<test@example.com>", "", "test@example.com"),
            ("test@example.com", "", "test@example.com"),
            (
                "\"Test User <test@example.com>\" <test@example.com>",
                "\"Test User <test@example.com>\"",
                "test@example.com",
            ),
        ];
        for (input, sender_name, email) in cases {
            let info = get_address_info(input).unwrap();
            assert_eq!(info.sender_name, sender_name, "input {:?}", input);
            assert_eq!(info.email, email, "input {:?}", input);
        }
    }

    #[test]
    fn test_empty_group_has_no_addresses() {
        assert!(get_address_info_multiple("destinatarios-no-revelados: ").is_empty());
        assert!(get_address_info("").is_none());
    }

    #[test]
    fn test_group_members() {
        let list = get_address_info_multiple(
            "Other <o@example.org>, My Group: \"Richard\" <richard@localhost>, ted@example.com;",
        );
        assert_eq!(list, vec![
            AddressInfo {
                sender_name: "\"Other\"".into(),
                email: "o@example.org".into(),
                username: "o".into(),
                host: "example.org".into(),
            },
            AddressInfo {
                sender_name: "\"Richard\"".into(),
                email: "richard@localhost".into(),
                username: "richard".into(),
                host: "localhost".into(),
            },
            AddressInfo {
                sender_name: "".into(),
                email: "ted@example.com".into(),
                username: "ted".into(),
                host: "example.com".into(),
            },
        ]);
    }

    #[test]
    fn test_encoded_display_name_is_decoded() {
        let info = get_address_info("=?UTF-8?B?SsO8cmdlbg==?= <j@example.com>").unwrap();
        assert_eq!(info.sender_name, "\"J\u{fc}rgen\"");
        assert_eq!(info.email, "j@example.com");

        let info = get_address_info("J\u{fc}rgen <j@example.com>").unwrap();
        assert_eq!(info.sender_name, "\"J\u{fc}rgen\"");
    }

    #[test]
    fn test_bare_name_gets_default_host() {
        let info = get_address_info("Barney").unwrap();
        assert_eq!(info.email, "Barney@localhost");
        assert_eq!(info.username, "Barney");
        assert_eq!(info.host, DEFAULT_HOST);
    }

    #[test]
    fn test_format_email_addresses() {
        let cases = [
            ("test@example.com,blah@example.com", "test@example.com, blah@example.com"),
            ("Test Name <test@example.com>,blah@example.com", "\"Test Name\" <test@example.com>, blah@example.com"),
            ("\"Bob O'Reilly\" <bob@example.com>,blah@example.com", "\"Bob O'Reilly\" <bob@example.com>, blah@example.com"),
            ("", ""),
        ];
        for (input, expected) in cases {
            assert_eq!(format_email_addresses(input), expected);
        }
    }
}
