//! Configuration access port.

/// Typed lookups into a sectioned key/value configuration.
///
/// Numeric getters return `Ok(None)` for an absent key and `Err` with the
/// parser's message when the value is present but malformed.
pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
    fn get_int(&self, section: &str, key: &str) -> Result<Option<i64>, String>;
    fn get_double(&self, section: &str, key: &str) -> Result<Option<f64>, String>;
}
