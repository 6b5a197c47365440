//! Error types for recipe-cli

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

/// Errors that can occur in CLI operations
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Error from recipe-core
    #[error(transparent)]
    Core(#[from] recipe_core::Error),

    /// JSON output could not be rendered
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_error_is_transparent() {
        let err: CliError = recipe_core::Error::UnknownRecipe("hpx".to_string()).into();
        assert_eq!(err.to_string(), "unknown recipe: hpx");
    }
}
