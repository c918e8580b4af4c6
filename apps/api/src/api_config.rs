use std::env;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;

use prcard_application::RateLimitRule;
use prcard_core::AppError;
use tracing_subscriber::EnvFilter;
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitStoreConfig {
    Memory,
    Redis,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpLlmConfig {
    pub base_url: Url,
    pub api_key: Option<String>,
    pub model: String,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LlmProviderConfig {
    Disabled,
    Http(HttpLlmConfig),
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub api_host: String,
    pub api_port: u16,
    pub frontend_url: Option<String>,
    pub static_dir: PathBuf,
    pub pr_card_pdf_file: PathBuf,
    pub rate_limit_store: RateLimitStoreConfig,
    pub redis_url: Option<String>,
    pub chat_rate_limit_max_requests: u32,
    pub chat_rate_limit_window_seconds: i64,
    pub llm_provider: LlmProviderConfig,
}

impl ApiConfig {
    pub fn load() -> Result<Self, AppError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let optional = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let api_host = optional("API_HOST").unwrap_or_else(|| "127.0.0.1".to_owned());
        let api_port = parse_or("API_PORT", optional("API_PORT"), 3001_u16)?;
        let frontend_url = optional("FRONTEND_URL");
        let static_dir = PathBuf::from(optional("STATIC_DIR").unwrap_or_else(|| "static".to_owned()));
        let pr_card_pdf_file = PathBuf::from(
            optional("PR_CARD_PDF_FILE").unwrap_or_else(|| "forms/IMM5444E.pdf".to_owned()),
        );

        let rate_limit_store = match optional("RATE_LIMIT_STORE")
            .unwrap_or_else(|| "memory".to_owned())
            .as_str()
        {
            "memory" => RateLimitStoreConfig::Memory,
            "redis" => RateLimitStoreConfig::Redis,
            other => {
                return Err(AppError::Validation(format!(
                    "RATE_LIMIT_STORE must be either 'memory' or 'redis', got '{other}'"
                )));
            }
        };
        let redis_url = optional("REDIS_URL");
        if rate_limit_store == RateLimitStoreConfig::Redis && redis_url.is_none() {
            return Err(AppError::Validation(
                "REDIS_URL is required when RATE_LIMIT_STORE=redis".to_owned(),
            ));
        }

        let default_rule = RateLimitRule::chat();
        let chat_rate_limit_max_requests = parse_or(
            "CHAT_RATE_LIMIT_MAX_REQUESTS",
            optional("CHAT_RATE_LIMIT_MAX_REQUESTS"),
            default_rule.max_attempts,
        )?;
        if chat_rate_limit_max_requests == 0 {
            return Err(AppError::Validation(
                "CHAT_RATE_LIMIT_MAX_REQUESTS must be greater than zero".to_owned(),
            ));
        }
        let chat_rate_limit_window_seconds = parse_or(
            "CHAT_RATE_LIMIT_WINDOW_SECONDS",
            optional("CHAT_RATE_LIMIT_WINDOW_SECONDS"),
            default_rule.window_seconds,
        )?;
        if chat_rate_limit_window_seconds <= 0 {
            return Err(AppError::Validation(
                "CHAT_RATE_LIMIT_WINDOW_SECONDS must be greater than zero".to_owned(),
            ));
        }

        let llm_provider = match optional("LLM_PROVIDER")
            .unwrap_or_else(|| "disabled".to_owned())
            .as_str()
        {
            "disabled" => LlmProviderConfig::Disabled,
            "http" => {
                let raw_base_url = optional("LLM_API_BASE_URL").ok_or_else(|| {
                    AppError::Validation(
                        "LLM_API_BASE_URL is required when LLM_PROVIDER=http".to_owned(),
                    )
                })?;
                let base_url = Url::parse(&raw_base_url).map_err(|error| {
                    AppError::Validation(format!("invalid LLM_API_BASE_URL: {error}"))
                })?;
                let model = optional("LLM_MODEL").ok_or_else(|| {
                    AppError::Validation("LLM_MODEL is required when LLM_PROVIDER=http".to_owned())
                })?;
                let timeout_seconds =
                    parse_or("LLM_TIMEOUT_SECONDS", optional("LLM_TIMEOUT_SECONDS"), 30_u64)?;

                LlmProviderConfig::Http(HttpLlmConfig {
                    base_url,
                    api_key: optional("LLM_API_KEY"),
                    model,
                    timeout_seconds,
                })
            }
            other => {
                return Err(AppError::Validation(format!(
                    "LLM_PROVIDER must be either 'disabled' or 'http', got '{other}'"
                )));
            }
        };

        Ok(Self {
            api_host,
            api_port,
            frontend_url,
            static_dir,
            pr_card_pdf_file,
            rate_limit_store,
            redis_url,
            chat_rate_limit_max_requests,
            chat_rate_limit_window_seconds,
            llm_provider,
        })
    }

    pub fn socket_address(&self) -> Result<SocketAddr, AppError> {
        let host = IpAddr::from_str(&self.api_host).map_err(|error| {
            AppError::Internal(format!("invalid API_HOST '{}': {error}", self.api_host))
        })?;
        Ok(SocketAddr::from((host, self.api_port)))
    }

    /// The official form, resolved against the static directory.
    pub fn source_document_path(&self) -> PathBuf {
        self.static_dir.join(&self.pr_card_pdf_file)
    }

    pub fn chat_rate_limit_rule(&self) -> RateLimitRule {
        RateLimitRule::new(
            "chat",
            self.chat_rate_limit_max_requests,
            self.chat_rate_limit_window_seconds,
        )
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn parse_or<T>(name: &str, raw: Option<String>, default: T) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        Some(value) => value
            .trim()
            .parse::<T>()
            .map_err(|error| AppError::Validation(format!("invalid {name}: {error}"))),
        None => Ok(default),
    }
}
