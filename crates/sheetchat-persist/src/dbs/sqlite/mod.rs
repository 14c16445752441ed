mod client;
mod repositories;
mod schema;

pub use client::SqlitePersistenceClient;

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};

use crate::error::{PersistError, Result};

/// Current time at the precision stored in the database
pub(crate) fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

/// RFC 3339 with millisecond precision and a `Z` suffix, so text order is time order
pub(crate) fn encode_timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub(crate) fn decode_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| PersistError::InvalidRecord(format!("bad timestamp '{}': {}", raw, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_round_trip() {
        let at = now();
        let encoded = encode_timestamp(&at);
        assert!(encoded.ends_with('Z'));
        assert_eq!(decode_timestamp(&encoded).unwrap(), at);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(
            decode_timestamp("yesterday"),
            Err(PersistError::InvalidRecord(_))
        ));
    }
}
