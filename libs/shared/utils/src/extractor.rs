use axum::http::HeaderMap;

use shared_models::error::AppError;

/// Session token from the `authorization` header. Both the bare token and the
/// `Bearer <token>` form are accepted.
pub fn extract_session_token(headers: &HeaderMap) -> Result<String, AppError> {
    let auth_value = headers
        .get("authorization")
        .ok_or(AppError::Unauthorized)?
        .to_str()
        .map_err(|_| AppError::Unauthorized)?
        .trim();

    let token = auth_value.strip_prefix("Bearer ").unwrap_or(auth_value).trim();
    if token.is_empty() {
        return Err(AppError::Unauthorized);
    }

    Ok(token.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use axum::http::HeaderValue;

    fn headers_with(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn test_raw_token() {
        assert_eq!(extract_session_token(&headers_with("12345")).unwrap(), "12345");
    }

    #[test]
    fn test_bearer_token() {
        assert_eq!(
            extract_session_token(&headers_with("Bearer 12345")).unwrap(),
            "12345"
        );
    }

    #[test]
    fn test_missing_or_blank_header() {
        assert_matches!(
            extract_session_token(&HeaderMap::new()),
            Err(AppError::Unauthorized)
        );
        assert_matches!(
            extract_session_token(&headers_with("Bearer  ")),
            Err(AppError::Unauthorized)
        );
    }
}
