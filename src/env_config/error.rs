use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("ENV -> {0} is not set")]
    MissingVar(&'static str),

    #[error("ENV -> {name} has invalid value '{value}'")]
    InvalidVar { name: &'static str, value: String },

    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    ParseFile {
        path: String,
        source: toml::de::Error,
    },
}
