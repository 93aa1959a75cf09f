//! Outbound target checks.

use url::Url;

/// Error type for URLs the network refuses to fetch.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UrlError {
    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("missing host: {0}")]
    MissingHost(String),
}

/// Only absolute http(s) URLs with a host leave the process.
pub fn check_target(url: &Url) -> Result<(), UrlError> {
    match url.scheme() {
        "http" | "https" => {}
        scheme => return Err(UrlError::UnsupportedScheme(scheme.to_string())),
    }

    if url.host_str().is_none_or(str::is_empty) {
        return Err(UrlError::MissingHost(url.to_string()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_https_allowed() {
        let url = Url::parse("https://cdn.jsdelivr.net/npm/chart.js").unwrap();
        assert!(check_target(&url).is_ok());
    }

    #[test]
    fn test_http_allowed() {
        let url = Url::parse("http://localhost:8080/").unwrap();
        assert!(check_target(&url).is_ok());
    }

    #[test]
    fn test_file_rejected() {
        let url = Url::parse("file:///etc/passwd").unwrap();
        assert!(matches!(check_target(&url), Err(UrlError::UnsupportedScheme(_))));
    }

    #[test]
    fn test_data_rejected() {
        let url = Url::parse("data:text/plain,hello").unwrap();
        assert!(matches!(check_target(&url), Err(UrlError::UnsupportedScheme(_))));
    }
}
