//! TOML configuration file parsing.
use serde::de::DeserializeOwned;
use std::path::Path;

use crate::error::ConfigError;

/// Load a TOML file into `T`.
///
/// A missing file is not an error: it deserializes as an empty document, so
/// `T` should default every field.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] if the file exists but cannot be read, and
/// [`ConfigError::Parse`] if it is not valid TOML for `T` (this includes
/// field-level validation such as rejected sync paths).
pub fn load_config<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let content = if path.exists() {
        std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?
    } else {
        String::new()
    };

    toml::from_str(&content).map_err(|e| ConfigError::Parse {
        path: path.display().to_string(),
        message: e.message().to_string(),
    })
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Default, Deserialize)]
    struct Sample {
        #[serde(default)]
        names: Vec<String>,
    }

    #[test]
    fn missing_file_is_empty_document() {
        let dir = tempfile::tempdir().unwrap();
        let sample: Sample = load_config(&dir.path().join("absent.toml")).unwrap();
        assert!(sample.names.is_empty());
    }

    #[test]
    fn parses_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("c.toml");
        std::fs::write(&path, "names = [\"a\", \"b\"]\n").unwrap();
        let sample: Sample = load_config(&path).unwrap();
        assert_eq!(sample.names, vec!["a", "b"]);
    }

    #[test]
    fn parse_error_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "names = [").unwrap();
        let err = load_config::<Sample>(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("broken.toml"));
    }
}
