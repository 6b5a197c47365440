use std::path::PathBuf;

/// Errors that can occur while loading recipes or resolving a build
/// configuration.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The request or a schema predicate names an option the schema does
    /// not declare.
    #[error("unknown option '{option}'")]
    UnknownOption { option: String },

    /// A value is not legal for its option kind or enumeration.
    #[error("invalid value '{value}' for option '{option}': {reason}")]
    InvalidValue {
        option: String,
        value: String,
        reason: String,
    },

    /// A declared constraint is not satisfied by the merged selection.
    #[error("constraint '{constraint}' violated: {message} ({})", render_values(.values))]
    ConstraintViolation {
        constraint: String,
        message: String,
        /// Current values of every option the constraint references.
        values: Vec<(String, String)>,
    },

    /// Two satisfied dependency rules impose incompatible requirements on
    /// the same external dependency.
    #[error(
        "conflicting requirements on dependency '{dependency}' from rules '{first_rule}' and '{second_rule}': {reason}"
    )]
    DependencyConflict {
        dependency: String,
        first_rule: String,
        second_rule: String,
        reason: String,
    },

    /// The schema itself is malformed (duplicate names, illegal defaults).
    #[error("invalid schema: {reason}")]
    InvalidSchema { reason: String },

    /// Predicate text could not be parsed.
    #[error("invalid predicate '{text}': {reason}")]
    InvalidPredicate { text: String, reason: String },

    /// Version constraint could not be parsed.
    #[error("invalid version constraint '{constraint}': {reason}")]
    VersionConstraintParse { constraint: String, reason: String },

    /// Dependency specification could not be parsed.
    #[error("invalid dependency spec '{spec}': {reason}")]
    InvalidDependencySpec { spec: String, reason: String },

    /// A request string could not be parsed.
    #[error("invalid request '{text}': {reason}")]
    InvalidRequest { text: String, reason: String },

    /// An environment assignment needs a dependency attribute that no
    /// source provides.
    #[error("missing attribute '{attribute}' of dependency '{dependency}'")]
    MissingAttribute {
        dependency: String,
        attribute: String,
    },

    /// The recipe declares no such version.
    #[error("recipe '{recipe}' has no version '{version}'")]
    UnknownVersion { recipe: String, version: String },

    /// No built-in or on-disk recipe matches the name.
    #[error("unknown recipe: {0}")]
    UnknownRecipe(String),

    /// Failed to parse a TOML recipe manifest or config file.
    #[error("failed to parse {}: {source}", .path.display())]
    ManifestParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// I/O error reading recipe or config files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn render_values(values: &[(String, String)]) -> String {
    values
        .iter()
        .map(|(name, value)| format!("{name}={value}"))
        .collect::<Vec<_>>()
        .join(", ")
}

impl Error {
    pub(crate) fn invalid_value(
        option: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            option: option.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_schema(reason: impl Into<String>) -> Self {
        Self::InvalidSchema {
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
