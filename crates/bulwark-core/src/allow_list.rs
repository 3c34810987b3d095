//! IP allow-list.
//!
//! Addresses are compared as normalized strings:
//!
//! - `::1` becomes `127.0.0.1`
//! - IPv4-mapped IPv6 addresses (`::ffff:a.b.c.d`) become `a.b.c.d`
//! - a missing address becomes [`UNKNOWN_ADDRESS_FALLBACK`]
//!
//! There is no CIDR matching.

use indexmap::IndexSet;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// Address used when the remote address is unknown.
pub const UNKNOWN_ADDRESS_FALLBACK: &str = "127.0.0.0";

/// Returns the canonical string form of an address.
///
/// ```
/// use bulwark_core::allow_list::normalize;
/// use std::net::{IpAddr, Ipv6Addr};
///
/// assert_eq!(normalize(Some(IpAddr::V6(Ipv6Addr::LOCALHOST))), "127.0.0.1");
/// assert_eq!(normalize(None), "127.0.0.0");
/// ```
#[must_use]
pub fn normalize(address: Option<IpAddr>) -> String {
    match address {
        Some(address) => canonical(address).to_string(),
        None => UNKNOWN_ADDRESS_FALLBACK.to_string(),
    }
}

fn canonical(address: IpAddr) -> IpAddr {
    match address {
        IpAddr::V6(v6) if v6 == Ipv6Addr::LOCALHOST => IpAddr::V4(Ipv4Addr::LOCALHOST),
        IpAddr::V6(v6) => v6.to_ipv4_mapped().map_or(IpAddr::V6(v6), IpAddr::V4),
        v4 @ IpAddr::V4(_) => v4,
    }
}

/// Static set of permitted client addresses.
#[derive(Debug, Clone, Default)]
pub struct AllowList {
    entries: IndexSet<String>,
}

impl AllowList {
    /// Builds an allow-list from configured address strings.
    ///
    /// Entries that parse as IP addresses are normalized. Entries that do not
    /// are kept verbatim with a warning; they can never match.
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let entries = entries
            .into_iter()
            .filter_map(|entry| {
                let entry = entry.as_ref().trim();
                if entry.is_empty() {
                    return None;
                }
                match entry.parse::<IpAddr>() {
                    Ok(address) => Some(canonical(address).to_string()),
                    Err(_) => {
                        tracing::warn!(entry = %entry, "Allow-list entry is not an IP address");
                        Some(entry.to_string())
                    }
                }
            })
            .collect();
        Self { entries }
    }

    /// Returns `true` if the normalized address is in the list.
    #[must_use]
    pub fn is_allowed(&self, address: Option<IpAddr>) -> bool {
        self.entries.contains(&normalize(address))
    }

    /// Normalized entries in configured order.
    pub fn entries(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the list is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
