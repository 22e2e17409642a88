//! Cross-origin policy for the administrative API.
//!
//! Translates the configured allow-lists into a `tower_http` CORS layer.
//! `CorsLayer` panics when credentials are combined with a wildcard origin,
//! so that combination is rejected here instead.

use axum::http::{header, HeaderValue, Method};
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::http::server::ServerConfig;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CorsError {
    #[error("invalid allowed origin {0:?}")]
    Origin(String),
    #[error("invalid allowed method {0:?}")]
    Method(String),
    #[error("credentials cannot be allowed for a wildcard origin")]
    CredentialsWithWildcard,
}

/// Build the CORS layer described by `config`.
pub fn cors_layer(config: &ServerConfig) -> Result<CorsLayer, CorsError> {
    let wildcard = config.allowed_origins.iter().any(|o| o == "*");
    if wildcard && config.allow_credentials {
        return Err(CorsError::CredentialsWithWildcard);
    }

    let origins = if wildcard {
        AllowOrigin::any()
    } else {
        let values = config
            .allowed_origins
            .iter()
            .map(|o| HeaderValue::from_str(o).map_err(|_| CorsError::Origin(o.clone())))
            .collect::<Result<Vec<_>, _>>()?;
        AllowOrigin::list(values)
    };

    let methods = config
        .allowed_methods
        .iter()
        .map(|m| Method::from_bytes(m.as_bytes()).map_err(|_| CorsError::Method(m.clone())))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(methods)
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(config.allow_credentials))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(origins: &[&str], methods: &[&str], credentials: bool) -> ServerConfig {
        ServerConfig {
            allowed_origins: origins.iter().map(|s| s.to_string()).collect(),
            allowed_methods: methods.iter().map(|s| s.to_string()).collect(),
            allow_credentials: credentials,
            ..ServerConfig::default()
        }
    }

    #[test]
    fn builds_from_allow_lists() {
        assert!(cors_layer(&config(&["http://localhost:8080"], &["GET", "POST"], true)).is_ok());
        assert!(cors_layer(&config(&["*"], &["GET"], false)).is_ok());
    }

    #[test]
    fn rejects_wildcard_with_credentials() {
        assert_eq!(
            cors_layer(&config(&["*"], &["GET"], true)).unwrap_err(),
            CorsError::CredentialsWithWildcard
        );
    }

    #[test]
    fn rejects_bad_entries() {
        assert_eq!(
            cors_layer(&config(&["http://ok", "no\nway"], &["GET"], false)).unwrap_err(),
            CorsError::Origin("no\nway".into())
        );
        assert_eq!(
            cors_layer(&config(&["http://ok"], &["GE T"], false)).unwrap_err(),
            CorsError::Method("GE T".into())
        );
    }
}
