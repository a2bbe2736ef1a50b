use serde::{Deserialize, Serialize};

use crate::codec::codec_error::{malformed, CodecError};
use crate::shared::constants::BUSY_SENTINEL;

/// Broker keys a coordinator dedicates to one admitted client.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub input_key: String,
    pub output_key: String,
    pub channel: String,
}

/// What the coordinator wrote under a registering client's id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AdmissionReply {
    Busy,
    Assigned(Assignment),
}

pub fn encode_admission(reply: &AdmissionReply) -> Result<Vec<u8>, CodecError> {
    match reply {
        AdmissionReply::Busy => Ok(BUSY_SENTINEL.to_vec()),
        AdmissionReply::Assigned(assignment) => serde_json::to_vec(assignment)
            .map_err(|e| malformed(format!("assignment not encodable: {e}"))),
    }
}

/// Accepts the JSON object form and the older `"in out channel"` form.
pub fn decode_admission(bytes: &[u8]) -> Result<AdmissionReply, CodecError> {
    if bytes == BUSY_SENTINEL {
        return Ok(AdmissionReply::Busy);
    }
    let text = std::str::from_utf8(bytes)
        .map_err(|e| malformed(format!("admission reply is not UTF-8: {e}")))?
        .trim();

    if text.starts_with('{') {
        let assignment: Assignment = serde_json::from_str(text)
            .map_err(|e| malformed(format!("admission reply: {e}")))?;
        return Ok(AdmissionReply::Assigned(assignment));
    }

    let tokens: Vec<&str> = text.split_whitespace().collect();
    match tokens.as_slice() {
        [input_key, output_key, channel] => Ok(AdmissionReply::Assigned(Assignment {
            input_key: input_key.to_string(),
            output_key: output_key.to_string(),
            channel: channel.to_string(),
        })),
        _ => Err(malformed(format!(
            "admission reply needs 3 tokens, got {}",
            tokens.len()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn assignment() -> Assignment {
        Assignment {
            input_key: "in1".into(),
            output_key: "out1".into(),
            channel: "chanA".into(),
        }
    }

    #[test]
    fn test_busy_sentinel() {
        assert_eq!(decode_admission(b"NONE").unwrap(), AdmissionReply::Busy);
        assert_eq!(encode_admission(&AdmissionReply::Busy).unwrap(), b"NONE".to_vec());
    }

    #[test]
    fn test_json_round_trip() {
        let reply = AdmissionReply::Assigned(assignment());
        let bytes = encode_admission(&reply).unwrap();
        assert_eq!(decode_admission(&bytes).unwrap(), reply);
    }

    #[test]
    fn test_whitespace_tokens() {
        assert_eq!(
            decode_admission(b"in1 out1  chanA\n").unwrap(),
            AdmissionReply::Assigned(assignment())
        );
    }

    #[test]
    fn test_json_allows_whitespace_in_names() {
        let bytes = br#"{"input_key":"in 1","output_key":"out1","channel":"chanA"}"#;
        match decode_admission(bytes).unwrap() {
            AdmissionReply::Assigned(a) => assert_eq!(a.input_key, "in 1"),
            other => panic!("expected assignment, got {other:?}"),
        }
    }

    #[rstest]
    #[case::two_tokens(b"in1 out1".to_vec())]
    #[case::four_tokens(b"a b c d".to_vec())]
    #[case::empty(b"".to_vec())]
    #[case::bad_json(b"{\"input_key\":1}".to_vec())]
    #[case::not_utf8(vec![0xff, 0xfe, 0x20, 0x20])]
    fn test_malformed_admission(#[case] bytes: Vec<u8>) {
        assert!(decode_admission(&bytes).is_err());
    }
}
