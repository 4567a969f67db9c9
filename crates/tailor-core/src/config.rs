//! Fixed configuration constants and API key resolution.

use crate::error::AppError;
use crate::provider::Provider;

/// Sampling temperature used for every provider.
pub const LLM_TEMPERATURE: f32 = 0.2;

/// Requests served per process without a caller-supplied key.
pub const FREE_TIER_MAX_REQUESTS: u32 = 3;

/// Resolve the API key for a request.
///
/// The caller's key wins when it is non-blank. Otherwise the provider's
/// environment variable is read through `env`, which lets tests avoid
/// touching the process environment.
pub fn resolve_api_key<E>(
    user_key: Option<&str>,
    provider: Provider,
    env: E,
) -> Result<String, AppError>
where
    E: Fn(&str) -> Option<String>,
{
    if let Some(key) = user_key.map(str::trim).filter(|k| !k.is_empty()) {
        return Ok(key.to_string());
    }

    env(provider.api_key_env())
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
        .ok_or_else(|| {
            AppError::ConfigError(format!(
                "No API key provided. Please enter your {} API Key.",
                provider.display_name()
            ))
        })
}

/// Reads a variable from the process environment.
pub fn process_env(name: &str) -> Option<String> {
    std::env::var(name).ok()
}
