use anyhow::{bail, Context, Result};

const DEFAULT_MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Azure OpenAI deployment the evaluation calls go to.
#[derive(Debug, Clone)]
pub struct AzureOpenAiConfig {
    pub api_key: String,
    pub endpoint: String,
    pub api_version: String,
    pub chat_deployment: String,
}

/// Application configuration loaded from environment variables.
/// Startup fails if the LLM or analyst credentials are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub azure: AzureOpenAiConfig,
    /// `user:password` pairs allowed to run analyses.
    pub analysts: Vec<(String, String)>,
    /// Postgres is optional; without it results stay in memory only.
    pub database_url: Option<String>,
    pub port: u16,
    pub rust_log: String,
    pub max_upload_bytes: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            azure: AzureOpenAiConfig {
                api_key: require_env("AZURE_OPENAI_API_KEY")?,
                endpoint: require_env("AZURE_OPENAI_ENDPOINT")?,
                api_version: require_env("AZURE_OPENAI_API_VERSION")?,
                chat_deployment: require_env("AZURE_OPENAI_CHAT_DEPLOYMENT")?,
            },
            analysts: parse_analyst_credentials(&require_env("ANALYST_CREDENTIALS")?)?,
            database_url: std::env::var("DATABASE_URL")
                .ok()
                .filter(|url| !url.trim().is_empty()),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            max_upload_bytes: match std::env::var("MAX_UPLOAD_BYTES") {
                Ok(raw) => raw
                    .parse::<usize>()
                    .context("MAX_UPLOAD_BYTES must be a byte count")?,
                Err(_) => DEFAULT_MAX_UPLOAD_BYTES,
            },
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

/// Parses `alice:secret,bob:hunter2` into credential pairs.
pub fn parse_analyst_credentials(raw: &str) -> Result<Vec<(String, String)>> {
    let mut analysts = Vec::new();
    for pair in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let Some((user, password)) = pair.split_once(':') else {
            bail!("ANALYST_CREDENTIALS entry '{pair}' must look like user:password");
        };
        if user.trim().is_empty() || password.is_empty() {
            bail!("ANALYST_CREDENTIALS entry '{pair}' has an empty user or password");
        }
        analysts.push((user.trim().to_string(), password.to_string()));
    }
    if analysts.is_empty() {
        bail!("ANALYST_CREDENTIALS must name at least one analyst");
    }
    Ok(analysts)
}
