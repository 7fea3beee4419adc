use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::Arc;

use reqwest::dns::{Addrs, Name, Resolve, Resolving};
use url::{Host, Url};

use super::FetchError;

/// Decides which destination addresses outbound fetches may reach.
///
/// Private, loopback, link-local and otherwise non-public ranges are denied
/// unless explicitly allow-listed. The deny list always wins.
#[derive(Debug, Clone, Default)]
pub struct EgressPolicy {
    allow_list: Vec<IpAddr>,
    deny_list: Vec<IpAddr>,
}

impl EgressPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-permit specific addresses that would otherwise be restricted
    pub fn allow(mut self, addresses: impl IntoIterator<Item = IpAddr>) -> Self {
        self.allow_list.extend(addresses);
        self
    }

    /// Block specific addresses even if they are public
    pub fn deny(mut self, addresses: impl IntoIterator<Item = IpAddr>) -> Self {
        self.deny_list.extend(addresses);
        self
    }

    pub fn is_permitted(&self, ip: IpAddr) -> bool {
        let ip = canonical_ip(ip);
        if self.deny_list.iter().any(|denied| canonical_ip(*denied) == ip) {
            return false;
        }
        if self.allow_list.iter().any(|allowed| canonical_ip(*allowed) == ip) {
            return true;
        }
        !is_restricted(ip)
    }

    /// Check scheme and IP-literal hosts of a URL before any connection.
    /// Domain names are checked later, at resolution time.
    pub fn check_url(&self, url: &Url) -> Result<(), FetchError> {
        match url.scheme() {
            "http" | "https" => {}
            other => {
                return Err(FetchError::UnsupportedScheme {
                    scheme: other.to_string(),
                })
            }
        }

        let ip = match url.host() {
            Some(Host::Ipv4(ip)) => IpAddr::V4(ip),
            Some(Host::Ipv6(ip)) => IpAddr::V6(ip),
            Some(Host::Domain(_)) => return Ok(()),
            None => {
                return Err(FetchError::BlockedDestination {
                    host: url.to_string(),
                })
            }
        };

        if self.is_permitted(ip) {
            Ok(())
        } else {
            Err(FetchError::BlockedDestination {
                host: ip.to_string(),
            })
        }
    }
}

/// NAT64 well-known prefix `64:ff9b::/96`
const NAT64_PREFIX: [u16; 6] = [0x64, 0xff9b, 0, 0, 0, 0];

/// IPv6 addresses carrying an IPv4 address are judged as that IPv4 address:
/// IPv4-mapped `::ffff:a.b.c.d`, IPv4-compatible `::a.b.c.d` and NAT64
/// `64:ff9b::a.b.c.d`. `::` and `::1` stay IPv6.
fn canonical_ip(ip: IpAddr) -> IpAddr {
    let IpAddr::V6(v6) = ip else {
        return ip;
    };
    if let Some(v4) = v6.to_ipv4_mapped() {
        return IpAddr::V4(v4);
    }

    let segments = v6.segments();
    let [.., a, b, c, d] = v6.octets();
    let compatible =
        segments[..6].iter().all(|s| *s == 0) && !v6.is_unspecified() && !v6.is_loopback();
    if compatible || segments[..6] == NAT64_PREFIX {
        return IpAddr::V4(Ipv4Addr::new(a, b, c, d));
    }
    ip
}

/// Whether an address belongs to a range that must never be fetched from
pub fn is_restricted(ip: IpAddr) -> bool {
    match canonical_ip(ip) {
        IpAddr::V4(v4) => is_restricted_v4(v4),
        IpAddr::V6(v6) => is_restricted_v6(v6),
    }
}

fn is_restricted_v4(ip: Ipv4Addr) -> bool {
    let [a, b, c, _] = ip.octets();

    ip.is_unspecified()
        || ip.is_loopback()
        || ip.is_private()
        || ip.is_link_local()
        || ip.is_broadcast()
        || ip.is_documentation()
        || ip.is_multicast()
        // "this network"
        || a == 0
        // shared address space (carrier-grade NAT)
        || (a == 100 && (b & 0xc0) == 64)
        // IETF protocol assignments
        || (a == 192 && b == 0 && c == 0)
        // benchmarking
        || (a == 198 && (b & 0xfe) == 18)
        // reserved
        || a >= 240
}

fn is_restricted_v6(ip: Ipv6Addr) -> bool {
    let first = ip.segments()[0];

    ip.is_unspecified()
        || ip.is_loopback()
        || ip.is_multicast()
        // unique local fc00::/7
        || (first & 0xfe00) == 0xfc00
        // link local fe80::/10
        || (first & 0xffc0) == 0xfe80
        // documentation 2001:db8::/32
        || (first == 0x2001 && ip.segments()[1] == 0x0db8)
}

/// DNS resolver that drops restricted addresses, so the address actually
/// connected to is the one that was checked.
pub(crate) struct GuardedResolver {
    policy: Arc<EgressPolicy>,
}

impl GuardedResolver {
    pub(crate) fn new(policy: Arc<EgressPolicy>) -> Self {
        Self { policy }
    }
}

type BoxError = Box<dyn std::error::Error + Send + Sync>;

impl Resolve for GuardedResolver {
    fn resolve(&self, name: Name) -> Resolving {
        let policy = self.policy.clone();
        let host = name.as_str().to_string();

        Box::pin(async move {
            let resolved = tokio::net::lookup_host((host.as_str(), 0))
                .await
                .map_err(|e| Box::new(e) as BoxError)?;

            let permitted: Vec<SocketAddr> = resolved
                .filter(|addr| policy.is_permitted(addr.ip()))
                .collect();

            if permitted.is_empty() {
                return Err(Box::new(FetchError::BlockedDestination { host }) as BoxError);
            }

            Ok(Box::new(permitted.into_iter()) as Addrs)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ip(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    #[test]
    fn test_restricted_ranges() {
        for addr in [
            "127.0.0.1",
            "10.1.2.3",
            "172.16.0.1",
            "192.168.1.1",
            "169.254.169.254",
            "0.0.0.0",
            "100.64.0.1",
            "198.18.0.1",
            "255.255.255.255",
            "::1",
            "::",
            "fd00::1",
            "fe80::1",
            "::ffff:127.0.0.1",
            "::ffff:10.0.0.1",
            "::127.0.0.1",
            "::a00:1",
            "64:ff9b::7f00:1",
            "64:ff9b::192.168.0.1",
        ] {
            assert!(is_restricted(ip(addr)), "{} should be restricted", addr);
        }
    }

    #[test]
    fn test_public_addresses_permitted() {
        let policy = EgressPolicy::new();
        for addr in [
            "93.184.216.34",
            "8.8.8.8",
            "2606:4700:4700::1111",
            "64:ff9b::808:808",
        ] {
            assert!(policy.is_permitted(ip(addr)), "{} should be permitted", addr);
        }
    }

    #[test]
    fn test_allow_and_deny_lists() {
        let policy = EgressPolicy::new()
            .allow([ip("10.0.0.5")])
            .deny([ip("8.8.8.8"), ip("10.0.0.5")]);

        assert!(!policy.is_permitted(ip("10.0.0.5")));
        assert!(!policy.is_permitted(ip("8.8.8.8")));

        let policy = EgressPolicy::new().allow([ip("127.0.0.1")]);
        assert!(policy.is_permitted(ip("127.0.0.1")));
        assert!(policy.is_permitted(ip("::ffff:127.0.0.1")));
        assert!(policy.is_permitted(ip("64:ff9b::7f00:1")));
        assert!(!policy.is_permitted(ip("127.0.0.2")));
    }

    #[test]
    fn test_check_url() {
        let policy = EgressPolicy::new();

        assert!(policy
            .check_url(&Url::parse("https://example.com/a.png").unwrap())
            .is_ok());
        assert!(matches!(
            policy.check_url(&Url::parse("http://127.0.0.1:8080/").unwrap()),
            Err(FetchError::BlockedDestination { .. })
        ));
        assert!(matches!(
            policy.check_url(&Url::parse("http://[::1]/").unwrap()),
            Err(FetchError::BlockedDestination { .. })
        ));
        assert!(matches!(
            policy.check_url(&Url::parse("file:///etc/passwd").unwrap()),
            Err(FetchError::UnsupportedScheme { .. })
        ));
    }
}
