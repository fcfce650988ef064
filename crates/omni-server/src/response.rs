//! Writing standard responses into server response objects.

use http::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use omni_core::{OmniError, Result, ServerResponse, StandardResponse};

/// Write a standard response and finish the server response.
///
/// Status and headers are validated before anything is written, so a
/// malformed response leaves the server response untouched.
pub fn write_response(target: &ServerResponse, response: &StandardResponse) -> Result<()> {
    let status = response.validate()?;
    let body = serde_json::to_vec(&response.body)?;
    let headers = validated_headers(response)?;

    target.set_status(status);

    let mut has_content_type = false;
    let mut written: Vec<&str> = Vec::new();
    for (name, value) in &headers {
        if name.eq_ignore_ascii_case(CONTENT_TYPE.as_str()) {
            has_content_type = true;
        }
        // Names are case-insensitive. The first value of a name replaces
        // anything the host set, later ones append.
        if written.iter().any(|seen| seen.eq_ignore_ascii_case(name)) {
            target.append_header(name, value)?;
        } else {
            target.set_header(name, value)?;
            written.push(name);
        }
    }

    if !has_content_type {
        target.set_header(CONTENT_TYPE.as_str(), "application/json")?;
    }

    target.send(body);
    Ok(())
}

fn validated_headers(response: &StandardResponse) -> Result<Vec<(String, String)>> {
    let mut pairs = Vec::new();
    let Some(headers) = &response.headers else {
        return Ok(pairs);
    };

    for (name, value) in headers.iter() {
        // Absent values have no native representation; skip them.
        let Some(value) = value else { continue };
        HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| OmniError::InvalidHeader(format!("invalid header name '{}'", name)))?;
        for item in value.iter() {
            HeaderValue::from_str(item).map_err(|_| {
                OmniError::InvalidHeader(format!("invalid value for header '{}'", name))
            })?;
            pairs.push((name.to_string(), item.to_string()));
        }
    }
    Ok(pairs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;
    use omni_core::Headers;
    use serde_json::json;

    #[test]
    fn test_write_response_status_body_and_default_content_type() {
        let target = ServerResponse::new();
        write_response(&target, &StandardResponse::json(201, json!({"id": 7}))).unwrap();

        assert!(target.is_finished());
        assert_eq!(target.status(), StatusCode::CREATED);
        assert_eq!(target.header("content-type").as_deref(), Some("application/json"));
        let body: serde_json::Value = serde_json::from_slice(&target.body()).unwrap();
        assert_eq!(body, json!({"id": 7}));
    }

    #[test]
    fn test_write_response_headers() {
        let mut headers = Headers::new();
        headers.insert("Content-Type", "application/problem+json");
        headers.insert("set-cookie", vec!["a=1", "b=2"]);
        headers.insert_absent("x-absent");

        let target = ServerResponse::new();
        target.set_header("set-cookie", "stale=1").unwrap();
        write_response(&target, &StandardResponse::new(200).with_headers(headers)).unwrap();

        assert_eq!(
            target.header("content-type").as_deref(),
            Some("application/problem+json")
        );
        assert_eq!(target.header_values("set-cookie"), vec!["a=1", "b=2"]);
        assert_eq!(target.header("x-absent"), None);
    }

    #[test]
    fn test_write_response_merges_names_differing_in_case() {
        let mut headers = Headers::new();
        headers.insert("Set-Cookie", "a=1");
        headers.insert("set-cookie", vec!["b=2", "c=3"]);

        let target = ServerResponse::new();
        write_response(&target, &StandardResponse::new(200).with_headers(headers)).unwrap();

        assert_eq!(target.header_values("set-cookie"), vec!["a=1", "b=2", "c=3"]);
    }

    #[test]
    fn test_write_response_invalid_header_leaves_target_untouched() {
        let target = ServerResponse::new();
        let response = StandardResponse::new(200).with_header("x-ok", "bad\r\nvalue");

        let err = write_response(&target, &response).unwrap_err();
        assert!(matches!(err, OmniError::InvalidHeader(_)));
        assert!(!target.is_finished());
        assert_eq!(target.header("x-ok"), None);
    }

    #[test]
    fn test_write_response_invalid_status() {
        let target = ServerResponse::new();
        let err = write_response(&target, &StandardResponse::new(17)).unwrap_err();
        assert!(matches!(err, OmniError::MalformedResponse(_)));
        assert!(!target.is_finished());
    }
}
