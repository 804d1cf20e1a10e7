//! Document payload decoding
//!
//! The service stores uploaded PDFs as binary blobs and hands them back in
//! one of three encodings depending on how the record was serialized:
//!
//! * a bare base64 string (`"JVBERi0xLjQK..."`)
//! * a driver-specific wrapper object (`{"$binary": {"base64": "..."}}`)
//! * the wrapper's string rendering (`"Binary.createFromBase64('...', 0)"`)
//!
//! [`DocumentPayload`] decodes those once, at the edge. Anything else is
//! treated as "no document available".

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::Result;

const SENTINEL_PREFIX: &str = "Binary.createFromBase64('";

/// A document field in one of its recognized wire shapes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentPayload {
    /// Already a base64 string
    RawBase64(String),
    /// `{"$binary": {"base64": ...}}`
    WrappedBinary(String),
    /// `Binary.createFromBase64('...', n)` rendered as a string
    SentinelString(String),
}

impl DocumentPayload {
    /// Classify a raw JSON value. Returns `None` for unrecognized shapes.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Self::from_str_payload(s),
            Value::Object(map) => map
                .get("$binary")
                .and_then(|b| b.get("base64"))
                .and_then(Value::as_str)
                .filter(|b64| is_base64(b64))
                .map(|b64| DocumentPayload::WrappedBinary(b64.to_string())),
            _ => None,
        }
    }

    fn from_str_payload(s: &str) -> Option<Self> {
        if s.contains("Binary.createFromBase64") {
            let start = s.find(SENTINEL_PREFIX)? + SENTINEL_PREFIX.len();
            let rest = &s[start..];
            let end = rest.find('\'')?;
            let b64 = &rest[..end];
            return is_base64(b64).then(|| DocumentPayload::SentinelString(b64.to_string()));
        }
        is_base64(s).then(|| DocumentPayload::RawBase64(s.to_string()))
    }

    /// The base64 payload, whichever shape it arrived in
    pub fn base64(&self) -> &str {
        match self {
            DocumentPayload::RawBase64(b64)
            | DocumentPayload::WrappedBinary(b64)
            | DocumentPayload::SentinelString(b64) => b64,
        }
    }

    /// Collapse into the single displayable source
    pub fn into_source(self) -> DocumentSource {
        DocumentSource {
            base64: self.base64().to_string(),
        }
    }
}

fn is_base64(s: &str) -> bool {
    !s.is_empty()
        && s
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'+' || b == b'/' || b == b'=')
}

/// A normalized, displayable PDF document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSource {
    /// Standard base64 payload
    pub base64: String,
}

impl DocumentSource {
    /// `data:` URI suitable for an embedded viewer
    pub fn data_url(&self) -> String {
        format!("data:application/pdf;base64,{}", self.base64)
    }

    /// Decode the payload into raw bytes
    pub fn decode(&self) -> Result<Vec<u8>> {
        BASE64
            .decode(self.base64.as_bytes())
            .map_err(|e| crate::error::Error::general(format!("invalid document payload: {e}")))
    }

    /// Download file name for an application's document
    pub fn file_name(application_id: &str) -> String {
        if application_id.is_empty() {
            "document.pdf".to_string()
        } else {
            format!("{application_id}.pdf")
        }
    }
}

/// `deserialize_with` helper that never fails on an unknown shape.
pub(crate) fn deserialize_payload<'de, D>(deserializer: D) -> std::result::Result<Option<DocumentPayload>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(DocumentPayload::from_value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn sentinel_string_is_unwrapped() {
        let payload = DocumentPayload::from_value(&json!("Binary.createFromBase64('AAAA', 0)"));
        assert_eq!(payload, Some(DocumentPayload::SentinelString("AAAA".into())));
        assert_eq!(payload.unwrap().base64(), "AAAA");
    }

    #[test]
    fn wrapped_binary_object_is_unwrapped() {
        let payload = DocumentPayload::from_value(&json!({ "$binary": { "base64": "AAAA" } }));
        assert_eq!(payload, Some(DocumentPayload::WrappedBinary("AAAA".into())));
    }

    #[test]
    fn raw_base64_passes_through() {
        let payload = DocumentPayload::from_value(&json!("JVBERi0xLjQK")).unwrap();
        assert_eq!(payload, DocumentPayload::RawBase64("JVBERi0xLjQK".into()));
        let source = payload.into_source();
        assert_eq!(source.data_url(), "data:application/pdf;base64,JVBERi0xLjQK");
    }

    #[test]
    fn other_shapes_mean_no_document() {
        assert_eq!(DocumentPayload::from_value(&json!(42)), None);
        assert_eq!(DocumentPayload::from_value(&json!(null)), None);
        assert_eq!(DocumentPayload::from_value(&json!("")), None);
        assert_eq!(DocumentPayload::from_value(&json!("not base64!")), None);
        assert_eq!(DocumentPayload::from_value(&json!({ "data": "AAAA" })), None);
        assert_eq!(DocumentPayload::from_value(&json!(["AAAA"])), None);
        assert_eq!(
            DocumentPayload::from_value(&json!("Binary.createFromBase64(oops)")),
            None
        );
    }

    #[test]
    fn decode_yields_bytes() {
        let source = DocumentSource { base64: "JVBERg==".into() };
        assert_eq!(source.decode().unwrap(), b"%PDF");
        assert!(DocumentSource { base64: "@@".into() }.decode().is_err());
    }

    #[test]
    fn file_name_falls_back_for_empty_ids() {
        assert_eq!(DocumentSource::file_name("A1"), "A1.pdf");
        assert_eq!(DocumentSource::file_name(""), "document.pdf");
    }
}
