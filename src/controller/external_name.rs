//! # External Name
//!
//! Identity binding between a managed resource and its GitLab record.
//!
//! The binding is persisted as the `crossplane.io/external-name` annotation
//! holding the decimal token ID. Inside the controller it is a typed
//! [`TokenId`]; strings only exist at the annotation boundary.

use kube::api::ObjectMeta;
use std::fmt;
use std::str::FromStr;

use crate::constants::ANNOTATION_EXTERNAL_NAME;
use crate::error::{Error, Result, ERR_EXTERNAL_NAME_NOT_INT};

/// ID GitLab assigned to an access token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TokenId(pub i64);

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for TokenId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        s.trim()
            .parse::<i64>()
            .map(TokenId)
            .map_err(|e| Error::validation(format!("{ERR_EXTERNAL_NAME_NOT_INT}: '{s}': {e}")))
    }
}

/// Raw annotation value. An empty annotation counts as unset.
#[must_use]
pub fn get_external_name(meta: &ObjectMeta) -> Option<&str> {
    meta.annotations
        .as_ref()
        .and_then(|a| a.get(ANNOTATION_EXTERNAL_NAME))
        .map(String::as_str)
        .filter(|s| !s.is_empty())
}

/// Bind the resource to a GitLab token
pub fn set_external_name(meta: &mut ObjectMeta, id: TokenId) {
    meta.annotations
        .get_or_insert_with(Default::default)
        .insert(ANNOTATION_EXTERNAL_NAME.to_string(), id.to_string());
}

/// Typed identity binding: `None` when the resource has not been created yet.
///
/// # Errors
/// Returns a validation error if the annotation is set but not an integer
pub fn parse_external_name(meta: &ObjectMeta) -> Result<Option<TokenId>> {
    get_external_name(meta).map(str::parse).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta_with(value: &str) -> ObjectMeta {
        let mut meta = ObjectMeta::default();
        meta.annotations = Some(
            [(ANNOTATION_EXTERNAL_NAME.to_string(), value.to_string())]
                .into_iter()
                .collect(),
        );
        meta
    }

    #[test]
    fn test_parse_external_name_absent() {
        assert_eq!(parse_external_name(&ObjectMeta::default()).unwrap(), None);
        assert_eq!(parse_external_name(&meta_with("")).unwrap(), None);
    }

    #[test]
    fn test_parse_external_name_integer() {
        assert_eq!(
            parse_external_name(&meta_with("1234")).unwrap(),
            Some(TokenId(1234))
        );
    }

    #[test]
    fn test_parse_external_name_not_integer() {
        let err = parse_external_name(&meta_with("my-token")).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(err.to_string().contains(ERR_EXTERNAL_NAME_NOT_INT));
    }

    #[test]
    fn test_set_external_name_overwrites() {
        let mut meta = meta_with("1");
        set_external_name(&mut meta, TokenId(2));
        assert_eq!(get_external_name(&meta), Some("2"));
    }
}
