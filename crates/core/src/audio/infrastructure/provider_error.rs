use serde_json::Value;

/// Extracts a human-readable detail from an ElevenLabs error body.
///
/// The provider answers with JSON shaped as `{"detail": ...}`,
/// `{"message": ...}` or `{"error": ...}`, where `detail` may itself be a
/// string or an object with `message`/`status`. Bodies that are not JSON are
/// returned as plain text.
pub fn error_detail(body: &str) -> String {
    match serde_json::from_str::<Value>(body) {
        Ok(json) => json_detail(&json),
        Err(_) => {
            let text = body.trim();
            if text.is_empty() {
                "Unknown error".to_string()
            } else {
                text.to_string()
            }
        }
    }
}

fn json_detail(json: &Value) -> String {
    if let Some(detail) = json.get("detail").filter(|d| !d.is_null()) {
        if let Some(s) = detail.as_str() {
            return s.to_string();
        }
        if let Some(message) = detail.get("message").and_then(Value::as_str) {
            return message.to_string();
        }
        if let Some(status) = detail.get("status") {
            return format!("{}: {}", plain(status), detail);
        }
        return detail.to_string();
    }
    if let Some(message) = json.get("message").and_then(Value::as_str) {
        return message.to_string();
    }
    if let Some(error) = json.get("error").filter(|e| !e.is_null()) {
        return plain(error);
    }
    json.to_string()
}

/// Strings without their JSON quotes; everything else serialized.
fn plain(value: &Value) -> String {
    match value.as_str() {
        Some(s) => s.to_string(),
        None => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::detail_string(r#"{"detail":"Unauthorized"}"#, "Unauthorized")]
    #[case::detail_message(
        r#"{"detail":{"status":"invalid_api_key","message":"Invalid API key"}}"#,
        "Invalid API key"
    )]
    #[case::top_level_message(r#"{"message":"Rate limited"}"#, "Rate limited")]
    #[case::error_string(r#"{"error":"bad audio"}"#, "bad audio")]
    #[case::error_object(r#"{"error":{"code":7}}"#, r#"{"code":7}"#)]
    #[case::plain_text("Service Unavailable", "Service Unavailable")]
    #[case::empty("", "Unknown error")]
    fn test_error_detail(#[case] body: &str, #[case] expected: &str) {
        assert_eq!(error_detail(body), expected);
    }

    #[test]
    fn test_detail_with_status_only() {
        let detail = error_detail(r#"{"detail":{"status":"quota_exceeded"}}"#);
        assert!(detail.starts_with("quota_exceeded: "));
        assert!(detail.contains("\"status\""));
    }

    #[test]
    fn test_unrecognized_json_is_serialized() {
        assert_eq!(error_detail(r#"{"foo":1}"#), r#"{"foo":1}"#);
    }
}
