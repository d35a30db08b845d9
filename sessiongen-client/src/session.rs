//! String sessions: the auth key, home DC and its address in one line of text.
//!
//! The layout is Telethon's string session format (packed IP address), so the
//! output can be loaded by Telethon:
//!
//! ```text
//! '1' || base64( dc_id:u8 || ip:4|16 bytes || port:u16be || auth_key:256 bytes )
//! ```

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

use base64::Engine as _;
use base64::engine::general_purpose::{STANDARD, URL_SAFE};

const VERSION: char = '1';
const KEY_LEN: usize = 256;
const V4_LEN:  usize = 1 + 4 + 2 + KEY_LEN;
const V6_LEN:  usize = 1 + 16 + 2 + KEY_LEN;

/// Everything needed to resume an authorized connection.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionData {
    pub dc_id:    i32,
    pub addr:     SocketAddr,
    pub auth_key: [u8; 256],
}

impl fmt::Debug for SessionData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionData")
            .field("dc_id", &self.dc_id)
            .field("addr", &self.addr)
            .finish_non_exhaustive()
    }
}

/// In-memory string session: empty until a login completes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StringSession {
    data: Option<SessionData>,
}

/// Errors while decoding a session string.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionError {
    /// The leading version character is not `'1'`.
    UnsupportedVersion(char),
    /// The payload is not valid base64.
    InvalidEncoding,
    /// The decoded payload has the wrong size.
    InvalidLength(usize),
    /// DC IDs are stored in one byte.
    DcOutOfRange(i32),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedVersion(c) => write!(f, "unsupported session version {c:?}"),
            Self::InvalidEncoding       => write!(f, "session string is not valid base64"),
            Self::InvalidLength(n)      => write!(f, "session payload has {n} bytes, expected {V4_LEN} or {V6_LEN}"),
            Self::DcOutOfRange(dc)      => write!(f, "DC id {dc} does not fit in a session string"),
        }
    }
}

impl std::error::Error for SessionError {}

impl StringSession {
    /// A session with no key yet.
    pub fn empty() -> Self { Self::default() }

    pub fn new(data: SessionData) -> Self { Self { data: Some(data) } }

    pub fn data(&self) -> Option<&SessionData> { self.data.as_ref() }

    pub fn is_empty(&self) -> bool { self.data.is_none() }

    /// Encode to the string form. An empty session encodes to `""`.
    pub fn encode(&self) -> Result<String, SessionError> {
        let Some(d) = &self.data else { return Ok(String::new()) };
        let dc = u8::try_from(d.dc_id).map_err(|_| SessionError::DcOutOfRange(d.dc_id))?;

        let mut raw = Vec::with_capacity(V6_LEN);
        raw.push(dc);
        match d.addr.ip() {
            IpAddr::V4(ip) => raw.extend_from_slice(&ip.octets()),
            IpAddr::V6(ip) => raw.extend_from_slice(&ip.octets()),
        }
        raw.extend_from_slice(&d.addr.port().to_be_bytes());
        raw.extend_from_slice(&d.auth_key);

        let mut out = String::with_capacity(1 + raw.len() * 4 / 3 + 4);
        out.push(VERSION);
        STANDARD.encode_string(&raw, &mut out);
        Ok(out)
    }

    /// Parse a session string. `""` yields an empty session.
    pub fn decode(s: &str) -> Result<Self, SessionError> {
        let s = s.trim();
        let mut chars = s.chars();
        let Some(version) = chars.next() else { return Ok(Self::empty()) };
        if version != VERSION {
            return Err(SessionError::UnsupportedVersion(version));
        }
        let body = chars.as_str();
        let raw = STANDARD.decode(body)
            .or_else(|_| URL_SAFE.decode(body))
            .map_err(|_| SessionError::InvalidEncoding)?;

        let ip_len = match raw.len() {
            V4_LEN => 4,
            V6_LEN => 16,
            n      => return Err(SessionError::InvalidLength(n)),
        };
        let dc_id = raw[0] as i32;
        let ip_bytes = &raw[1..1 + ip_len];
        let ip = if ip_len == 4 {
            let mut b = [0u8; 4];
            b.copy_from_slice(ip_bytes);
            IpAddr::V4(Ipv4Addr::from(b))
        } else {
            let mut b = [0u8; 16];
            b.copy_from_slice(ip_bytes);
            IpAddr::V6(Ipv6Addr::from(b))
        };
        let port = u16::from_be_bytes([raw[1 + ip_len], raw[2 + ip_len]]);
        let mut auth_key = [0u8; KEY_LEN];
        auth_key.copy_from_slice(&raw[3 + ip_len..]);

        Ok(Self::new(SessionData { dc_id, addr: SocketAddr::new(ip, port), auth_key }))
    }
}

/// Where to reach a DC, plus the auth key already held for it, if any.
///
/// Entries given in [`crate::Config::dc_options`] take precedence over the
/// built-in production table.
#[derive(Clone, PartialEq, Eq)]
pub struct DcOption {
    pub id:       i32,
    pub addr:     SocketAddr,
    pub auth_key: Option<[u8; 256]>,
}

impl fmt::Debug for DcOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DcOption")
            .field("id", &self.id)
            .field("addr", &self.addr)
            .field("has_key", &self.auth_key.is_some())
            .finish()
    }
}

/// Bootstrap address of each production DC.
pub fn default_dc_addr(dc_id: i32) -> Option<SocketAddr> {
    let ip = match dc_id {
        1 => Ipv4Addr::new(149, 154, 175, 53),
        2 => Ipv4Addr::new(149, 154, 167, 51),
        3 => Ipv4Addr::new(149, 154, 175, 100),
        4 => Ipv4Addr::new(149, 154, 167, 91),
        5 => Ipv4Addr::new(91, 108, 56, 130),
        _ => return None,
    };
    Some(SocketAddr::new(IpAddr::V4(ip), 443))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(addr: &str) -> StringSession {
        let mut auth_key = [0u8; 256];
        for (i, b) in auth_key.iter_mut().enumerate() { *b = i as u8; }
        StringSession::new(SessionData { dc_id: 2, addr: addr.parse().unwrap(), auth_key })
    }

    #[test]
    fn empty_is_empty_string() {
        assert_eq!(StringSession::empty().encode().unwrap(), "");
        assert!(StringSession::decode("").unwrap().is_empty());
    }

    #[test]
    fn ipv4_layout() {
        let s = sample("149.154.167.51:443").encode().unwrap();
        assert!(s.starts_with('1'));
        let raw = STANDARD.decode(&s[1..]).unwrap();
        assert_eq!(raw.len(), V4_LEN);
        assert_eq!(&raw[..7], &[2, 149, 154, 167, 51, 0x01, 0xbb]);
        assert_eq!(raw[7], 0);
        assert_eq!(raw[V4_LEN - 1], 255);
        assert_eq!(StringSession::decode(&s).unwrap(), sample("149.154.167.51:443"));
    }

    #[test]
    fn ipv6_decodes() {
        let original = sample("[2001:67c:4e8:f002::a]:443");
        let s = original.encode().unwrap();
        assert_eq!(STANDARD.decode(&s[1..]).unwrap().len(), V6_LEN);
        assert_eq!(StringSession::decode(&s).unwrap(), original);
    }

    #[test]
    fn url_safe_accepted() {
        let s = sample("149.154.167.51:443").encode().unwrap();
        let url = format!("1{}", URL_SAFE.encode(STANDARD.decode(&s[1..]).unwrap()));
        assert_eq!(StringSession::decode(&url).unwrap(), sample("149.154.167.51:443"));
    }

    #[test]
    fn malformed_rejected() {
        assert_eq!(StringSession::decode("2AAAA"), Err(SessionError::UnsupportedVersion('2')));
        assert_eq!(StringSession::decode("1!!!"), Err(SessionError::InvalidEncoding));
        assert_eq!(StringSession::decode("1AAAA"), Err(SessionError::InvalidLength(3)));
    }

    #[test]
    fn distinct_keys_distinct_strings() {
        let a = sample("149.154.167.51:443");
        let mut other = a.data().unwrap().clone();
        other.auth_key[100] ^= 1;
        assert_ne!(a.encode().unwrap(), StringSession::new(other).encode().unwrap());
    }

    #[test]
    fn debug_hides_key() {
        let dbg = format!("{:?}", sample("149.154.167.51:443"));
        assert!(dbg.contains("dc_id: 2"));
        assert!(!dbg.contains("auth_key"));
    }

    #[test]
    fn dc_option_debug_hides_key() {
        let opt = DcOption { id: 4, addr: "127.0.0.1:1".parse().unwrap(), auth_key: Some([7; 256]) };
        assert_eq!(format!("{opt:?}"), "DcOption { id: 4, addr: 127.0.0.1:1, has_key: true }");
    }

    #[test]
    fn dc_table() {
        assert_eq!(default_dc_addr(2), Some("149.154.167.51:443".parse().unwrap()));
        assert_eq!(default_dc_addr(9), None);
    }
}
