use thiserror::Error;

#[derive(Debug, Error)]
pub enum NeonError {
    /// `scene.json` is not valid JSON or does not match the config shape.
    #[error("config parse error: {0}")]
    ConfigParse(#[from] serde_json::Error),

    /// Config is syntactically valid but semantically invalid.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("invalid color {0:?}: expected #rrggbb")]
    InvalidColor(String),

    #[error("mesh parse error at line {line}: {msg}")]
    Mesh { line: usize, msg: String },

    /// A browser API call failed; the JS exception is flattened to text.
    #[error("js error: {0}")]
    Js(String),
}

pub type Result<T> = std::result::Result<T, NeonError>;
