//! INI file configuration adapter.

use crate::domain::error::TrendrankError;
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, TrendrankError> {
        let mut config = Ini::new();
        config
            .load(path.as_ref())
            .map_err(|reason| TrendrankError::ConfigParse {
                file: path.as_ref().display().to_string(),
                reason,
            })?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, String> {
        let mut config = Ini::new();
        config.read(content.to_string())?;
        Ok(Self { config })
    }

    fn invalid(section: &str, key: &str, reason: String) -> TrendrankError {
        TrendrankError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason,
        }
    }

    fn parse_bool(value: &str) -> Option<bool> {
        match value.trim().to_lowercase().as_str() {
            "true" | "yes" | "1" => Some(true),
            "false" | "no" | "0" => Some(false),
            _ => None,
        }
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config.get(section, key)
    }

    fn get_int(&self, section: &str, key: &str) -> Result<Option<i64>, TrendrankError> {
        self.config
            .getint(section, key)
            .map_err(|reason| Self::invalid(section, key, format!("expected an integer: {reason}")))
    }

    fn get_double(&self, section: &str, key: &str) -> Result<Option<f64>, TrendrankError> {
        let value = self
            .config
            .getfloat(section, key)
            .map_err(|reason| Self::invalid(section, key, format!("expected a number: {reason}")))?;
        match value {
            Some(v) if !v.is_finite() => {
                Err(Self::invalid(section, key, format!("expected a finite number, got {v}")))
            }
            other => Ok(other),
        }
    }

    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool {
        self.config
            .get(section, key)
            .as_ref()
            .and_then(|v| Self::parse_bool(v))
            .unwrap_or(default)
    }
}
