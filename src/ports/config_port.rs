//! Configuration access port trait.

use crate::domain::error::TrendrankError;

/// Numeric getters return `Ok(None)` for an absent key and `ConfigInvalid`
/// for a value that is present but does not parse.
pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
    fn get_int(&self, section: &str, key: &str) -> Result<Option<i64>, TrendrankError>;
    fn get_double(&self, section: &str, key: &str) -> Result<Option<f64>, TrendrankError>;
    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool;
}
