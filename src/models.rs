//! Data models and structures
//!
//! Wire shapes exchanged with the image service: the JSON envelope returned
//! by upload and delete, and the payload sealed inside an auth token.

use crate::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Exception name the service uses when an image violates its size rules.
pub const IMAGE_SIZE_ILLEGAL_EXCEPTION: &str = "ImageSizeIllegalException";

const RESULT_SUCCESS: &str = "success";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct UploadResponse {
    #[serde(default, deserialize_with = "lenient_string")]
    pub result: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub exception: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub message: Option<String>,
}

/// Accept any JSON value for an envelope field: strings as-is, `null` as
/// absent, anything else in its JSON text form.
fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

impl UploadResponse {
    pub fn is_success(&self) -> bool {
        self.result.as_deref() == Some(RESULT_SUCCESS)
    }

    /// Map a raw upload response body to the assigned image id.
    ///
    /// Only the size-violation exception gets its own error kind; every other
    /// failure, including a body that is not an envelope at all, carries the
    /// body text unchanged.
    pub fn interpret(body: &str) -> Result<String> {
        let Ok(envelope) = serde_json::from_str::<UploadResponse>(body) else {
            tracing::error!("Unparsable upload response: {}", body);
            return Err(Error::RemoteFailure(body.to_string()));
        };

        if envelope.is_success() {
            return envelope.id.ok_or_else(|| {
                tracing::error!("Upload succeeded without an id: {}", body);
                Error::RemoteFailure(body.to_string())
            });
        }

        if envelope
            .exception
            .as_deref()
            .is_some_and(|e| e.eq_ignore_ascii_case(IMAGE_SIZE_ILLEGAL_EXCEPTION))
        {
            return Err(Error::ImageSizeIllegal(envelope.message.unwrap_or_default()));
        }

        tracing::error!("Upload failed, result: {}", body);
        Err(Error::RemoteFailure(body.to_string()))
    }
}

/// Identity sealed into an auth token. Field order is part of the wire
/// format.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TokenPayload {
    pub pid: String,
    #[serde(rename = "srvId")]
    pub srv_id: String,
    #[serde(rename = "srvPwd")]
    pub srv_pwd: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_yields_id() {
        let id = UploadResponse::interpret(r#"{"result":"success","id":"abc123"}"#).unwrap();
        assert_eq!(id, "abc123");
    }

    #[test]
    fn test_success_without_id_is_remote_failure() {
        let body = r#"{"result":"success"}"#;
        match UploadResponse::interpret(body) {
            Err(Error::RemoteFailure(raw)) => assert_eq!(raw, body),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_size_exception_carries_message() {
        let err = UploadResponse::interpret(
            r#"{"exception":"ImageSizeIllegalException","message":"too small"}"#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::ImageSizeIllegal(ref m) if m == "too small"));
    }

    #[test]
    fn test_size_exception_name_is_case_insensitive() {
        let err = UploadResponse::interpret(
            r#"{"result":"fail","exception":"imagesizeillegalexception","message":"min 100"}"#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::ImageSizeIllegal(ref m) if m == "min 100"));
    }

    #[test]
    fn test_other_exception_carries_raw_body() {
        let body = r#"{"result":"fail","exception":"IOException","message":"disk full"}"#;
        match UploadResponse::interpret(body) {
            Err(Error::RemoteFailure(raw)) => assert_eq!(raw, body),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_non_json_body_carries_raw_body() {
        let body = "<html>502 Bad Gateway</html>";
        match UploadResponse::interpret(body) {
            Err(Error::RemoteFailure(raw)) => assert_eq!(raw, body),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_numeric_id_is_accepted() {
        let id = UploadResponse::interpret(r#"{"result":"success","id":42}"#).unwrap();
        assert_eq!(id, "42");
    }

    #[test]
    fn test_size_exception_with_structured_message() {
        let err = UploadResponse::interpret(
            r#"{"exception":"ImageSizeIllegalException","message":{"minWidth":100}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::ImageSizeIllegal(ref m) if m == r#"{"minWidth":100}"#));

        let err = UploadResponse::interpret(
            r#"{"exception":"ImageSizeIllegalException","message":null}"#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::ImageSizeIllegal(ref m) if m.is_empty()));
    }

    #[test]
    fn test_token_payload_field_order() {
        let payload = TokenPayload {
            pid: "p1".to_string(),
            srv_id: "IDPS001".to_string(),
            srv_pwd: "secret".to_string(),
        };

        let json = serde_json::to_string(&payload).unwrap();
        assert_eq!(json, r#"{"pid":"p1","srvId":"IDPS001","srvPwd":"secret"}"#);
    }
}
