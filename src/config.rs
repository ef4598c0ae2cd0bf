use anyhow::Result;
use dotenvy::dotenv;
use std::net::SocketAddr;
use std::time::Duration;

const DEFAULT_GATEWAY_URL: &str = "https://ai.gateway.lovable.dev/v1";
const DEFAULT_MODEL: &str = "google/gemini-2.5-flash";
const DEFAULT_LANGUAGE: &str = "Indonesian";

fn default_max_file_size() -> usize {
    // 10 MB in bytes
    10 * 1024 * 1024
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub max_file_size: usize,
    pub gateway: GatewayConfig,
    pub insight_endpoint: Option<EndpointConfig>,
    pub session_ttl: Duration,
    pub session_capacity: u64,
}

/// Upstream chat-completion gateway used by the insight generator.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub language: String,
}

/// Remote insight endpoint that upload sessions call instead of the
/// in-process generator.
#[derive(Debug, Clone)]
pub struct EndpointConfig {
    pub url: String,
    pub api_key: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            max_file_size: default_max_file_size(),
            gateway: GatewayConfig {
                base_url: DEFAULT_GATEWAY_URL.to_string(),
                api_key: None,
                model: DEFAULT_MODEL.to_string(),
                language: DEFAULT_LANGUAGE.to_string(),
            },
            insight_endpoint: None,
            session_ttl: Duration::from_secs(3600),
            session_capacity: 1000,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        // Load .env file first
        dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bind_addr = match non_empty("BIND_ADDR") {
            Some(v) => v
                .parse()
                .map_err(|e| anyhow::anyhow!("Invalid BIND_ADDR {:?}: {}", v, e))?,
            None => defaults.bind_addr,
        };

        let max_file_size = parse_number(non_empty("MAX_FILE_SIZE"), "MAX_FILE_SIZE")?
            .unwrap_or(defaults.max_file_size);
        let session_ttl = parse_number::<u64>(non_empty("SESSION_TTL_SECS"), "SESSION_TTL_SECS")?
            .map(Duration::from_secs)
            .unwrap_or(defaults.session_ttl);
        let session_capacity = parse_number(non_empty("SESSION_CAPACITY"), "SESSION_CAPACITY")?
            .unwrap_or(defaults.session_capacity);

        let gateway = GatewayConfig {
            base_url: non_empty("AI_GATEWAY_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or(defaults.gateway.base_url),
            api_key: non_empty("AI_GATEWAY_KEY"),
            model: non_empty("AI_MODEL").unwrap_or(defaults.gateway.model),
            language: non_empty("INSIGHT_LANGUAGE").unwrap_or(defaults.gateway.language),
        };

        let insight_endpoint = non_empty("INSIGHT_ENDPOINT_URL").map(|url| EndpointConfig {
            url,
            api_key: non_empty("INSIGHT_ENDPOINT_KEY"),
        });

        Ok(Config {
            bind_addr,
            max_file_size,
            gateway,
            insight_endpoint,
            session_ttl,
            session_capacity,
        })
    }
}

fn parse_number<T>(raw: Option<String>, key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.map(|v| {
        v.trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("Invalid {} {:?}: {}", key, v, e))
    })
    .transpose()
}
