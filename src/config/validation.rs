//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate the API address, path prefix and cross-origin policy
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: DaemonConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use axum::http::{HeaderValue, Method};

use crate::config::schema::{ApiConfig, DaemonConfig};
use crate::http::is_valid_path_prefix;

/// A single semantic problem found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("api.address must not be empty")]
    EmptyAddress,
    #[error("api.path_prefix {0:?} must start with '/' and contain no '{{' or '}}'")]
    PathPrefix(String),
    #[error("api.access_control_allow_methods contains invalid method {0:?}")]
    Method(String),
    #[error("api.access_control_allow_origin contains invalid origin {0:?}")]
    Origin(String),
    #[error("api.access_control_allow_credentials cannot be combined with a '*' origin")]
    CredentialsWithWildcard,
}

/// Validate the full daemon configuration.
pub fn validate_config(config: &DaemonConfig) -> Result<(), Vec<ValidationError>> {
    let errors = validate_api(&config.api);
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_api(api: &ApiConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if api.address.trim().is_empty() {
        errors.push(ValidationError::EmptyAddress);
    }

    if !is_valid_path_prefix(&api.path_prefix) {
        errors.push(ValidationError::PathPrefix(api.path_prefix.clone()));
    }

    for method in &api.access_control_allow_methods {
        if Method::from_bytes(method.as_bytes()).is_err() {
            errors.push(ValidationError::Method(method.clone()));
        }
    }

    let mut wildcard = false;
    for origin in &api.access_control_allow_origin {
        if origin == "*" {
            wildcard = true;
        } else if HeaderValue::from_str(origin).is_err() {
            errors.push(ValidationError::Origin(origin.clone()));
        }
    }

    if wildcard && api.access_control_allow_credentials {
        errors.push(ValidationError::CredentialsWithWildcard);
    }

    errors
}
