//! Clone-and-parse for configuration templates

use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::registry::{RegistryError, RegistryResult};

/// A type that can back a file or mixed registration
///
/// `Default` is the zero value used for empty detection and `PartialEq` is the
/// structural comparison. Implemented for every type with the right bounds.
pub trait ConfigShape:
    Serialize + DeserializeOwned + Default + PartialEq + Clone + Send + Sync + 'static
{
}

impl<T> ConfigShape for T where
    T: Serialize + DeserializeOwned + Default + PartialEq + Clone + Send + Sync + 'static
{
}

/// Textual format of a configuration payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PayloadFormat {
    #[default]
    Yaml,
    Json,
}

impl PayloadFormat {
    /// JSON for `.json` files, YAML for everything else
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        match path.as_ref().extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => PayloadFormat::Json,
            _ => PayloadFormat::Yaml,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PayloadFormat::Yaml => "yaml",
            PayloadFormat::Json => "json",
        }
    }
}

/// Check that `template` is a record the payload can populate
///
/// Structs and maps serialize to a mapping; scalars, sequences, `None` and unit
/// shapes do not and fail with `MustBeReference`.
pub fn check_template<T: Serialize>(template: &T) -> RegistryResult<()> {
    match serde_yaml::to_value(template) {
        Ok(serde_yaml::Value::Mapping(_)) => Ok(()),
        Ok(serde_yaml::Value::Tagged(tagged)) if tagged.value.is_mapping() => Ok(()),
        _ => Err(RegistryError::MustBeReference),
    }
}

/// Parse `payload` into a fresh instance of the template's type
///
/// The template is only inspected for its shape. Fails with `EmptyConfig` when
/// the parsed value equals a zero instance of the same type.
pub fn clone_and_parse<T: ConfigShape>(
    payload: &[u8],
    format: PayloadFormat,
    template: &T,
) -> RegistryResult<T> {
    check_template(template)?;

    if payload.iter().all(u8::is_ascii_whitespace) {
        return Err(RegistryError::EmptyConfig);
    }

    let parsed: T = match format {
        PayloadFormat::Yaml => serde_yaml::from_slice(payload).map_err(|e| {
            parse_failure(format, e, || {
                matches!(
                    serde_yaml::from_slice::<serde_yaml::Value>(payload),
                    Ok(serde_yaml::Value::Null)
                )
            })
        })?,
        PayloadFormat::Json => serde_json::from_slice(payload).map_err(|e| {
            parse_failure(format, e, || {
                matches!(
                    serde_json::from_slice::<serde_json::Value>(payload),
                    Ok(serde_json::Value::Null)
                )
            })
        })?,
    };

    if parsed == T::default() {
        return Err(RegistryError::EmptyConfig);
    }

    Ok(parsed)
}

/// A document that is just `null`/`~` holds no config; anything else that
/// failed to parse is a real parse error
fn parse_failure(
    format: PayloadFormat,
    err: impl std::fmt::Display,
    is_null_document: impl FnOnce() -> bool,
) -> RegistryError {
    if is_null_document() {
        RegistryError::EmptyConfig
    } else {
        RegistryError::Parse(format!("{}: {}", format.as_str(), err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::collections::HashMap;

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    struct Settings {
        port: u16,
        log_level: String,
    }

    #[test]
    fn test_parse_yaml_into_fresh_instance() {
        let template = Settings::default();
        let parsed = clone_and_parse(
            b"port: 8080\nlog_level: debug\n",
            PayloadFormat::Yaml,
            &template,
        )
        .unwrap();

        assert_eq!(parsed.port, 8080);
        assert_eq!(parsed.log_level, "debug");
        assert_eq!(template, Settings::default());
    }

    #[test]
    fn test_parse_json() {
        let parsed = clone_and_parse(
            br#"{"port": 9090, "log_level": "info"}"#,
            PayloadFormat::Json,
            &Settings::default(),
        )
        .unwrap();
        assert_eq!(parsed.port, 9090);
    }

    #[test]
    fn test_unrelated_keys_are_empty() {
        // Parses fine but touches none of the template's fields
        let err = clone_and_parse(b"other: 1\n", PayloadFormat::Yaml, &Settings::default());
        assert!(matches!(err, Err(RegistryError::EmptyConfig)));
    }

    #[test]
    fn test_blank_payload_is_empty() {
        let err = clone_and_parse(b"  \n\n", PayloadFormat::Yaml, &Settings::default());
        assert!(matches!(err, Err(RegistryError::EmptyConfig)));
    }

    #[test]
    fn test_null_document_is_empty() {
        for body in [&b"~\n"[..], b"null\n", b"# nothing here\n", b"---\n"] {
            let err = clone_and_parse(body, PayloadFormat::Yaml, &Settings::default());
            assert!(matches!(err, Err(RegistryError::EmptyConfig)), "{:?}", err);
        }
        let err = clone_and_parse(b"null", PayloadFormat::Json, &Settings::default());
        assert!(matches!(err, Err(RegistryError::EmptyConfig)));
    }

    #[test]
    fn test_zero_values_are_empty() {
        let err = clone_and_parse(b"port: 0\nlog_level: ''\n", PayloadFormat::Yaml, &Settings::default());
        assert!(matches!(err, Err(RegistryError::EmptyConfig)));
    }

    #[test]
    fn test_wrong_top_level_shape_is_parse_error() {
        let err = clone_and_parse(b"just a sentence\n", PayloadFormat::Yaml, &Settings::default());
        assert!(matches!(err, Err(RegistryError::Parse(_))));
    }

    #[test]
    fn test_scalar_template_rejected() {
        assert!(matches!(check_template(&0u32), Err(RegistryError::MustBeReference)));
        assert!(matches!(check_template(&String::new()), Err(RegistryError::MustBeReference)));
        assert!(matches!(check_template(&Vec::<u8>::new()), Err(RegistryError::MustBeReference)));
        assert!(matches!(
            check_template(&Option::<Settings>::None),
            Err(RegistryError::MustBeReference)
        ));
    }

    #[test]
    fn test_scalar_template_rejected_before_parse() {
        let err = clone_and_parse(b"{{{ not yaml", PayloadFormat::Yaml, &0u32);
        assert!(matches!(err, Err(RegistryError::MustBeReference)));
    }

    #[test]
    fn test_map_template_accepted() {
        assert!(check_template(&Settings::default()).is_ok());
        assert!(check_template(&HashMap::<String, String>::new()).is_ok());

        let parsed = clone_and_parse(
            b"a: one\nb: two\n",
            PayloadFormat::Yaml,
            &HashMap::<String, String>::new(),
        )
        .unwrap();
        assert_eq!(parsed.len(), 2);
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(PayloadFormat::from_path("conf/app.json"), PayloadFormat::Json);
        assert_eq!(PayloadFormat::from_path("conf/app.JSON"), PayloadFormat::Json);
        assert_eq!(PayloadFormat::from_path("conf/app.yaml"), PayloadFormat::Yaml);
        assert_eq!(PayloadFormat::from_path("conf/app"), PayloadFormat::Yaml);
    }
}
