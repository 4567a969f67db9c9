use tailor_core::AppError;

pub const DEFAULT_PORT: u16 = 3000;

/// Resume PDFs above this size are rejected before any stage runs.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Live sessions kept before the least recently updated one is evicted.
pub const DEFAULT_MAX_SESSIONS: usize = 1000;

/// Server settings read from `TAILOR_SERVER_*` environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub port: u16,
    pub max_upload_bytes: usize,
    pub max_sessions: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            max_sessions: DEFAULT_MAX_SESSIONS,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Unset or blank variables keep their defaults; unparsable ones are errors.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(port) = parsed(&lookup, "TAILOR_SERVER_PORT")? {
            config.port = port;
        }
        if let Some(max) = positive(&lookup, "TAILOR_MAX_UPLOAD_BYTES")? {
            config.max_upload_bytes = max;
        }
        if let Some(max) = positive(&lookup, "TAILOR_MAX_SESSIONS")? {
            config.max_sessions = max;
        }
        Ok(config)
    }

    pub fn bind_addr(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }
}

fn parsed<T, F>(lookup: &F, name: &str) -> Result<Option<T>, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| AppError::ConfigError(format!("Invalid {name} '{raw}': {e}"))),
        _ => Ok(None),
    }
}

fn positive<F>(lookup: &F, name: &str) -> Result<Option<usize>, AppError>
where
    F: Fn(&str) -> Option<String>,
{
    match parsed::<usize, F>(lookup, name)? {
        Some(0) => Err(AppError::ConfigError(format!(
            "{name} must be greater than zero"
        ))),
        other => Ok(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup(pairs: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        move |name| {
            pairs
                .iter()
                .find(|(k, _)| *k == name)
                .map(|(_, v)| v.to_string())
        }
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = ServerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.bind_addr(), "0.0.0.0:3000");
    }

    #[test]
    fn test_reads_overrides() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("TAILOR_SERVER_PORT", "8080"),
            ("TAILOR_MAX_UPLOAD_BYTES", " 1024 "),
            ("TAILOR_MAX_SESSIONS", "50"),
        ]))
        .unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.max_upload_bytes, 1024);
        assert_eq!(config.max_sessions, 50);
    }

    #[test]
    fn test_blank_keeps_default() {
        let config = ServerConfig::from_lookup(lookup(&[("TAILOR_SERVER_PORT", "  ")])).unwrap();
        assert_eq!(config.port, DEFAULT_PORT);
    }

    #[test]
    fn test_rejects_garbage() {
        let err = ServerConfig::from_lookup(lookup(&[("TAILOR_SERVER_PORT", "http")])).unwrap_err();
        assert!(err.to_string().contains("TAILOR_SERVER_PORT"));

        let err =
            ServerConfig::from_lookup(lookup(&[("TAILOR_MAX_UPLOAD_BYTES", "0")])).unwrap_err();
        assert!(matches!(err, AppError::ConfigError(_)));

        let err = ServerConfig::from_lookup(lookup(&[("TAILOR_MAX_SESSIONS", "0")])).unwrap_err();
        assert!(err.to_string().contains("TAILOR_MAX_SESSIONS"));
    }
}
