use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("secrets file parse error: {0}")]
    Parse(String),

    #[error("missing secret: {0}")]
    MissingSecret(&'static str),
}
