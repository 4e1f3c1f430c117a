//! Client configuration.

use bytes::Bytes;
use resp_proto::Protocol;

/// Configuration for a [`Client`](crate::Client).
#[derive(Debug, Clone, Default)]
pub struct ClientConfig {
    /// Keyspace prefix prepended to every key of every command built by the
    /// client. `None` or an empty prefix leaves keys untouched.
    pub prefix: Option<Bytes>,
    /// Reply protocol used to select parsers. Defaults to the protocol the
    /// transport reports.
    pub protocol: Option<Protocol>,
}

impl ClientConfig {
    /// The prefix to apply, if any.
    pub(crate) fn key_prefix(&self) -> Option<&[u8]> {
        self.prefix.as_deref().filter(|p| !p.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_has_no_prefix() {
        let config = ClientConfig::default();
        assert_eq!(config.key_prefix(), None);
        assert!(config.protocol.is_none());
    }

    #[test]
    fn test_empty_prefix_is_ignored() {
        let config = ClientConfig {
            prefix: Some(Bytes::new()),
            ..Default::default()
        };
        assert_eq!(config.key_prefix(), None);
        let config = ClientConfig {
            prefix: Some(Bytes::from_static(b"app:")),
            ..Default::default()
        };
        assert_eq!(config.key_prefix(), Some(&b"app:"[..]));
    }
}
