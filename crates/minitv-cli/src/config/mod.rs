//! Configuration loading and resolution.

use minitv::ClientConfig;

/// Environment variable overriding the request timeout (milliseconds).
pub const TIMEOUT_ENV: &str = "MINITV_TIMEOUT_MS";

/// Environment variable overriding the user agent.
pub const USER_AGENT_ENV: &str = "MINITV_USER_AGENT";

/// Resolve the HTTP client settings.
///
/// Explicit values win, then the environment, then built-in defaults.
pub fn resolve_client_config(timeout_ms: Option<u64>, user_agent: Option<&str>) -> ClientConfig {
    resolve_with(timeout_ms, user_agent, |key| std::env::var(key).ok())
}

fn resolve_with(
    timeout_ms: Option<u64>,
    user_agent: Option<&str>,
    env: impl Fn(&str) -> Option<String>,
) -> ClientConfig {
    let defaults = ClientConfig::default();

    let timeout_ms = timeout_ms
        .or_else(|| {
            let raw = env(TIMEOUT_ENV)?;
            match raw.trim().parse() {
                Ok(ms) => Some(ms),
                Err(_) => {
                    tracing::warn!("ignoring invalid {TIMEOUT_ENV}={raw}");
                    None
                }
            }
        })
        .unwrap_or(defaults.timeout_ms);

    let user_agent = user_agent
        .map(str::to_string)
        .or_else(|| env(USER_AGENT_ENV).filter(|ua| !ua.trim().is_empty()))
        .unwrap_or(defaults.user_agent);

    ClientConfig {
        timeout_ms,
        user_agent,
        max_redirects: defaults.max_redirects,
    }
}
