use crate::render::RenderFailure;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors at the fallible edges of the crate.
///
/// Normalization itself never fails; these cover loading configuration and reporting renderer
/// rejections back to the caller.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Render(#[from] RenderFailure),

    #[error("Invalid config JSON: {message}")]
    InvalidConfigJson { message: String },

    #[error("Invalid config YAML: {message}")]
    InvalidConfigYaml { message: String },

    #[error("Config must be an object, found {found}")]
    ConfigNotObject { found: &'static str },
}
