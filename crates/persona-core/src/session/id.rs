use chrono::{DateTime, SecondsFormat, Utc};
use sha2::{Digest, Sha256};

/// Produces `session_{unix_seconds}_{8 hex}` identifiers.
///
/// The hashed material includes a sequence number, so two ids minted within
/// the same clock tick still differ.
#[derive(Debug, Default)]
pub(crate) struct IdGenerator {
    seq: u64,
}

impl IdGenerator {
    pub(crate) fn next(&mut self, now: DateTime<Utc>) -> String {
        self.seq += 1;
        let material = format!(
            "{}#{}",
            now.to_rfc3339_opts(SecondsFormat::Nanos, true),
            self.seq
        );
        let digest = Sha256::digest(material.as_bytes());
        format!("session_{}_{}", now.timestamp(), hex::encode(&digest[..4]))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn same_instant_gives_distinct_ids() {
        let mut ids = IdGenerator::default();
        let now = Utc::now();
        let a = ids.next(now);
        let b = ids.next(now);
        assert_ne!(a, b);
    }

    #[test]
    fn id_shape() {
        let mut ids = IdGenerator::default();
        let now = Utc::now();
        let id = ids.next(now);
        let parts: Vec<&str> = id.split('_').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "session");
        assert_eq!(parts[1], now.timestamp().to_string());
        assert_eq!(parts[2].len(), 8);
        assert!(parts[2].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn suffix_is_lowercase_hex_of_digest_prefix() {
        let mut ids = IdGenerator::default();
        let now = Utc::now();
        let id = ids.next(now);

        let material = format!("{}#1", now.to_rfc3339_opts(SecondsFormat::Nanos, true));
        let digest = Sha256::digest(material.as_bytes());
        let expected = hex::encode(&digest[..4]);
        assert!(id.ends_with(&format!("_{expected}")));
        assert_eq!(expected, expected.to_lowercase());
    }
}
