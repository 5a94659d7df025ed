//! Client configuration.

/// Database name used when the caller supplies an empty name.
pub const DEFAULT_DATABASE_NAME: &str = "vaultkv";

/// Configuration for a [`crate::Database`].
#[derive(Debug, Clone)]
pub struct Config {
    /// Page size used by paginated queries when the caller leaves it unset.
    pub default_page_size: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_page_size: 10,
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the default page size for paginated queries.
    #[must_use]
    pub const fn default_page_size(mut self, size: u64) -> Self {
        self.default_page_size = size;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.default_page_size, 10);
    }

    #[test]
    fn builder_pattern() {
        let config = Config::new().default_page_size(25);
        assert_eq!(config.default_page_size, 25);
    }
}
