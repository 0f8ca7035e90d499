//! Write-time checks for the special request fields.

use crate::config::MAX_HISTORY_COUNT;
use crate::error::{Error, Result};
use crate::variables::detect_variable;

pub const HTTP_METHODS: [&str; 9] = [
    "GET", "POST", "PUT", "DELETE", "PATCH", "HEAD", "OPTIONS", "TRACE", "CONNECT",
];

/// Validate a value about to be written to the request document. Unknown
/// fields and whole-value placeholders pass; they are checked again when the
/// request is assembled.
pub fn validate_request_field(key: &str, value: &str) -> Result<()> {
    if detect_variable(value).is_some() {
        return Ok(());
    }

    match key.to_ascii_lowercase().as_str() {
        "method" => validate_method(value),
        "url" => validate_url(value),
        "timeout" => validate_timeout(value),
        "history" | "history_count" => validate_history_count(value),
        _ => Ok(()),
    }
}

pub fn validate_method(method: &str) -> Result<()> {
    let upper = method.to_ascii_uppercase();
    if HTTP_METHODS.contains(&upper.as_str()) {
        Ok(())
    } else {
        Err(Error::InvalidMethod(method.to_string()))
    }
}

pub fn validate_url(url: &str) -> Result<()> {
    if url.is_empty() {
        return Err(Error::MissingUrl);
    }
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(Error::InvalidUrl(url.to_string()))
    }
}

pub fn validate_timeout(timeout: &str) -> Result<()> {
    match timeout.trim().parse::<i64>() {
        Ok(secs) if secs >= 0 => Ok(()),
        _ => Err(Error::InvalidTimeout(timeout.to_string())),
    }
}

pub fn validate_history_count(count: &str) -> Result<()> {
    let invalid = |reason: String| Error::InvalidHistoryCount {
        value: count.to_string(),
        reason,
    };

    let parsed: i64 = count
        .trim()
        .parse()
        .map_err(|_| invalid("must be a number".to_string()))?;
    if parsed < 0 {
        return Err(invalid("cannot be negative".to_string()));
    }
    if parsed > MAX_HISTORY_COUNT {
        return Err(invalid(format!("cannot exceed {MAX_HISTORY_COUNT}")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_validation_is_case_insensitive() {
        assert!(validate_request_field("method", "post").is_ok());
        assert!(validate_request_field("METHOD", "Connect").is_ok());
        assert!(matches!(
            validate_request_field("method", "FETCH"),
            Err(Error::InvalidMethod(m)) if m == "FETCH"
        ));
    }

    #[test]
    fn test_url_validation() {
        assert!(validate_url("https://api.example.com").is_ok());
        assert!(validate_url("http://localhost:8080/x").is_ok());
        assert!(matches!(validate_url(""), Err(Error::MissingUrl)));
        assert!(matches!(
            validate_url("ftp://example.com"),
            Err(Error::InvalidUrl(_))
        ));
        assert!(validate_url("example.com").is_err());
    }

    #[test]
    fn test_timeout_validation() {
        assert!(validate_timeout("0").is_ok());
        assert!(validate_timeout("45").is_ok());
        assert!(validate_timeout("-1").is_err());
        assert!(validate_timeout("soon").is_err());
        assert!(validate_timeout("1.5").is_err());
    }

    #[test]
    fn test_history_count_bounds() {
        assert!(validate_request_field("history", "0").is_ok());
        assert!(validate_request_field("history", "100").is_ok());
        let err = validate_request_field("history_count", "101").unwrap_err();
        assert!(err.to_string().contains("cannot exceed 100"));
        assert!(validate_request_field("history", "-3").is_err());
        assert!(validate_request_field("history", "lots").is_err());
    }

    #[test]
    fn test_placeholders_and_other_fields_pass() {
        assert!(validate_request_field("url", "{@base_url}").is_ok());
        assert!(validate_request_field("method", "{?}").is_ok());
        assert!(validate_request_field("retries", "whatever").is_ok());
    }
}
