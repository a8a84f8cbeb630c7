//! Response envelope handling.
//!
//! The server answers either with a JSON object carrying `status`
//! (`"success"` / `"fail"`) and `msg` alongside payload fields, or with
//! a bare list (settings). This module unwraps that envelope into a
//! value or a [`ClientError`], independent of the transport so it can
//! be tested without a server.

use serde_json::Value;

use crate::error::ClientError;

/// Turn an HTTP response (status code, reason phrase, body text) into
/// the parsed payload, or the appropriate error.
pub fn parse_body(status: u16, reason: &str, text: &str) -> Result<Value, ClientError> {
    if status != 200 {
        return Err(ClientError::HttpStatus {
            status,
            reason: reason.to_string(),
            body: text.to_string(),
        });
    }
    unwrap_envelope(serde_json::from_str(text)?)
}

/// Unwrap the server's success/fail envelope.
///
/// Objects must carry `status: "success"`; anything else fails with
/// the server's `msg`. Non-object bodies (the settings list) pass
/// through unmodified.
pub fn unwrap_envelope(body: Value) -> Result<Value, ClientError> {
    let Value::Object(map) = &body else {
        return Ok(body);
    };
    match map.get("status").and_then(Value::as_str) {
        Some("success") => Ok(body),
        _ => {
            let message = map
                .get("msg")
                .and_then(Value::as_str)
                .unwrap_or("server response carried no message")
                .to_string();
            Err(ClientError::RequestFailed { message })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    #[test]
    fn success_envelope_passes_through() {
        let body = json!({"status": "success", "models": []});
        assert_eq!(unwrap_envelope(body.clone()).unwrap(), body);
    }

    #[test]
    fn fail_envelope_carries_server_message() {
        let body = json!({"status": "fail", "msg": "model not tracked"});
        assert_matches!(
            unwrap_envelope(body),
            Err(ClientError::RequestFailed { message }) => {
                assert_eq!(message, "model not tracked");
            }
        );
    }

    #[test]
    fn bare_list_passes_through() {
        let body = json!([{"key": "httpPort", "value": 8080}]);
        assert_eq!(unwrap_envelope(body.clone()).unwrap(), body);
    }

    #[test]
    fn non_200_status_carries_status_reason_body() {
        assert_matches!(
            parse_body(503, "Service Unavailable", "backend down"),
            Err(ClientError::HttpStatus { status, reason, body }) => {
                assert_eq!(status, 503);
                assert_eq!(reason, "Service Unavailable");
                assert_eq!(body, "backend down");
            }
        );
    }

    #[test]
    fn ok_status_parses_and_unwraps() {
        let value = parse_body(200, "OK", r#"{"status":"success","groups":[]}"#).unwrap();
        assert_eq!(value["groups"], json!([]));
    }

    #[test]
    fn malformed_body_is_a_json_error() {
        assert_matches!(parse_body(200, "OK", "not json"), Err(ClientError::Json(_)));
    }
}
