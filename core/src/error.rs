//! # Error Taxonomy
//!
//! One arm per failure class named in the design's error taxonomy. Every
//! fallible operation in this crate returns `Result<T, ParaduxError>`; the
//! CLI layer wraps these in `anyhow` and is responsible for turning a fatal
//! error into the single-line, no-stack-trace summary an operator sees.

use thiserror::Error;

/// Errors raised by the Paradux core engine.
#[derive(Debug, Error)]
pub enum ParaduxError {
    // -- Parameter / arithmetic ------------------------------------------
    #[error("requested bit length {requested} exceeds the largest supported Mersenne exponent ({max})")]
    ParameterOutOfRange { requested: u32, max: u32 },

    #[error("secret {secret} is not in the field range [0, {modulus})")]
    SecretTooLarge { secret: String, modulus: String },

    #[error("threshold must be >= 2, got {0}")]
    ThresholdTooSmall(u32),

    #[error("duplicate x-coordinate {0} among shares")]
    DuplicateX(String),

    #[error("need at least 2 shares to reconstruct, got {0}")]
    NotEnoughShares(usize),

    #[error("recovery input is inconsistent: {0}")]
    InconsistentRecoveryInput(String),

    // -- State / storage --------------------------------------------------
    #[error("container image already exists at {0}")]
    ImageExists(String),

    #[error("container image is missing at {0}")]
    ImageMissing(String),

    #[error("container is already open")]
    ContainerAlreadyOpen,

    #[error("file already exists: {0}")]
    FileExists(String),

    #[error("file is missing: {0}")]
    FileMissing(String),

    #[error("malformed JSON in {path}: {source}")]
    JsonMalformed {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("schema violation: {0}")]
    SchemaViolation(String),

    // -- External -----------------------------------------------------------
    #[error("subprocess `{command}` failed with exit code {exit_code:?}: {stderr}")]
    SubprocessFailed {
        command: String,
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("$EDITOR is not set")]
    EditorUnavailable,

    #[error("editor exited with non-zero status {0:?}")]
    EditorFailed(Option<i32>),

    // -- Recovery-specific --------------------------------------------------
    #[error("export integrity check failed: {0}")]
    ExportIntegrityFailure(String),

    // -- Catch-all I/O --------------------------------------------------------
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type ParaduxResult<T> = Result<T, ParaduxError>;
