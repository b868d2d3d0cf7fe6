pub type ConfigResult<T> = core::result::Result<T, ConfigError>;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to build the 'Environment' from the provided string: {0}")]
    StringToEnvironmentFail(String),
    #[error("invalid provider url: {0}")]
    InvalidProviderUrl(String),
    #[error("invalid honeypot delay range: {min}..={max}")]
    InvalidHoneypotRange { min: u64, max: u64 },
    #[error("rate limit needs a non-zero max and window, got {max} per {window_secs}s")]
    InvalidRateLimit { max: usize, window_secs: u64 },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("figment extraction error: {0}")]
    Figment(#[from] Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(value: figment::Error) -> Self {
        Self::Figment(Box::new(value))
    }
}
