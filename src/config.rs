//! Explorer configuration.

/// Data type that marks a column as a foreign-key candidate.
pub const DEFAULT_IDENTIFIER_TYPE: &str = "uniqueidentifier";

/// Environment variable overriding [`DEFAULT_IDENTIFIER_TYPE`].
pub const IDENTIFIER_TYPE_ENV: &str = "ERDSCOPE_IDENTIFIER_TYPE";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExplorerConfig {
    pub identifier_type: String,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            identifier_type: DEFAULT_IDENTIFIER_TYPE.to_string(),
        }
    }
}

impl ExplorerConfig {
    pub fn with_identifier_type(mut self, identifier_type: impl Into<String>) -> Self {
        self.identifier_type = identifier_type.into();
        self
    }

    /// Apply an optional override from the command line, environment or JS
    /// caller. Blank values keep the current type.
    pub fn with_override(self, identifier_type: Option<&str>) -> Self {
        match identifier_type.map(str::trim).filter(|t| !t.is_empty()) {
            Some(t) => self.with_identifier_type(t),
            None => self,
        }
    }
}
