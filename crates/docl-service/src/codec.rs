use chrono::{DateTime, SecondsFormat, Utc};
use docl_gate::Principal;
use docl_types::Cid;
use serde::{Deserialize, Serialize};

use crate::error::DocumentError;

/// Metadata recorded in the ledger for every stored document.
///
/// Serialized as a JSON object with exactly the fields `cid`, `author`,
/// `timestamp`, and `organization`. Unknown fields are ignored on decode.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataRecord {
    pub cid: Cid,
    /// Caller id of the writer.
    pub author: String,
    /// Creation time, `YYYY-MM-DDTHH:MM:SS.mmmZ`.
    pub timestamp: String,
    /// Organization id of the writer.
    pub organization: String,
}

/// A value that is not a well-formed metadata record.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct CodecError(String);

impl CodecError {
    /// Attach the ledger key the bad value was read from.
    pub fn for_cid(self, cid: &Cid) -> DocumentError {
        DocumentError::CorruptMetadata {
            cid: cid.clone(),
            reason: self.0,
        }
    }
}

impl MetadataRecord {
    /// Record for `cid` written by `principal` at `at`.
    pub fn new(cid: Cid, principal: &Principal, at: DateTime<Utc>) -> Self {
        Self {
            cid,
            author: principal.caller_id.clone(),
            timestamp: at.to_rfc3339_opts(SecondsFormat::Millis, true),
            organization: principal.org_id.clone(),
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>, CodecError> {
        serde_json::to_vec(self).map_err(|e| CodecError(format!("encode failed: {e}")))
    }

    /// Decode a ledger value. Never returns a partially populated record.
    pub fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        if bytes.is_empty() {
            return Err(CodecError("empty value".into()));
        }
        let text = std::str::from_utf8(bytes)
            .map_err(|e| CodecError(format!("value is not UTF-8: {e}")))?;
        let value: serde_json::Value =
            serde_json::from_str(text).map_err(|e| CodecError(format!("invalid JSON: {e}")))?;
        if !value.is_object() {
            return Err(CodecError("value is not a JSON object".into()));
        }
        serde_json::from_value(value).map_err(|e| CodecError(format!("bad record: {e}")))
    }

    /// Parsed `timestamp`, if it is valid RFC 3339.
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.timestamp)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn record() -> MetadataRecord {
        MetadataRecord {
            cid: Cid::parse("QmYwAPJzv5CZsnAzt8auVZRn").unwrap(),
            author: "admin-id".into(),
            timestamp: "2024-05-01T12:00:00.000Z".into(),
            organization: "OrgMSP".into(),
        }
    }

    #[test]
    fn encodes_fixed_field_names() {
        let bytes = record().encode().unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        let object = value.as_object().unwrap();
        let mut keys: Vec<&str> = object.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(keys, ["author", "cid", "organization", "timestamp"]);
        assert_eq!(object["cid"], "QmYwAPJzv5CZsnAzt8auVZRn");
    }

    #[test]
    fn round_trip() {
        let r = record();
        assert_eq!(MetadataRecord::decode(&r.encode().unwrap()).unwrap(), r);
    }

    #[test]
    fn new_formats_millisecond_utc() {
        let principal = Principal {
            org_id: "OrgMSP".into(),
            caller_id: "admin-id".into(),
        };
        let at = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
        let r = MetadataRecord::new(record().cid, &principal, at);
        assert_eq!(r.timestamp, "2023-11-14T22:13:20.123Z");
        assert_eq!(r.author, "admin-id");
        assert_eq!(r.organization, "OrgMSP");
        assert_eq!(r.created_at(), Some(at));
    }

    #[test]
    fn unknown_fields_ignored() {
        let json = br#"{"cid":"QmX","author":"a","timestamp":"t","organization":"o","tags":["x"]}"#;
        let r = MetadataRecord::decode(json).unwrap();
        assert_eq!(r.author, "a");
    }

    #[test]
    fn malformed_inputs_rejected() {
        let cases: [&[u8]; 7] = [
            b"",
            b"not json",
            br#"{"cid":"QmX","author":"a","timestamp":"t"}"#,
            br#"{"cid":"QmX","author":7,"timestamp":"t","organization":"o"}"#,
            br#"["QmX","a","t","o"]"#,
            br#"{"cid":"","author":"a","timestamp":"t","organization":"o"}"#,
            b"{\"cid\":\"QmX\",\"author\":\"\xff\",\"timestamp\":\"t\",\"organization\":\"o\"}",
        ];
        for case in cases {
            assert!(MetadataRecord::decode(case).is_err(), "accepted {case:?}");
        }
    }

    #[test]
    fn codec_error_maps_to_corrupt_metadata() {
        let cid = record().cid;
        let err = MetadataRecord::decode(b"{").unwrap_err().for_cid(&cid);
        assert!(matches!(err, DocumentError::CorruptMetadata { cid: c, .. } if c == cid));
    }

    proptest! {
        #[test]
        fn round_trip_any_record(
            digest in "[0-9a-f]{64}",
            author in "\\PC{0,40}",
            timestamp in "20[0-9]{2}-[01][0-9]-[0-3][0-9]T[0-2][0-9]:[0-5][0-9]:[0-5][0-9]\\.[0-9]{3}Z",
            organization in "\\PC{0,20}",
        ) {
            let r = MetadataRecord {
                cid: Cid::parse(format!("b3{digest}")).unwrap(),
                author,
                timestamp,
                organization,
            };
            prop_assert_eq!(MetadataRecord::decode(&r.encode().unwrap()).unwrap(), r);
        }
    }
}
