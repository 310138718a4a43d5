use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
    pub refresh_ttl_minutes: i64,
}

/// Remote text-generation settings. `api_key == None` selects the placeholder writer.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
}

/// Runtime environment tag, controls how much error detail leaves the process.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeEnv {
    Development,
    Production,
    Other(String),
}

impl RuntimeEnv {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "" | "development" | "dev" => RuntimeEnv::Development,
            "production" | "prod" => RuntimeEnv::Production,
            other => RuntimeEnv::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            RuntimeEnv::Development => "development",
            RuntimeEnv::Production => "production",
            RuntimeEnv::Other(s) => s,
        }
    }

    pub fn is_development(&self) -> bool {
        *self == RuntimeEnv::Development
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: Option<String>,
    pub frontend_url: String,
    pub host: String,
    pub port: u16,
    pub env: RuntimeEnv,
    pub jwt: JwtConfig,
    pub provider: ProviderConfig,
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parsed_var<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")
                .map_err(|_| anyhow::anyhow!("JWT_SECRET must be set"))?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "blogsmith".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "blogsmith-users".into()),
            ttl_minutes: parsed_var("JWT_TTL_MINUTES", 60),
            refresh_ttl_minutes: parsed_var("JWT_REFRESH_TTL_MINUTES", 60 * 24 * 14),
        };

        let provider = ProviderConfig {
            api_key: non_empty_var("OPENAI_API_KEY"),
            base_url: std::env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1".into()),
            model: std::env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-3.5-turbo".into()),
            timeout_secs: parsed_var("OPENAI_TIMEOUT_SECS", 120),
        };

        let frontend_url =
            std::env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:3000".into());
        if axum::http::HeaderValue::from_str(&frontend_url).is_err() {
            anyhow::bail!("FRONTEND_URL is not a valid origin: {frontend_url}");
        }

        Ok(Self {
            database_url: non_empty_var("DATABASE_URL"),
            frontend_url,
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: parsed_var("PORT", 5000),
            env: RuntimeEnv::parse(&std::env::var("APP_ENV").unwrap_or_default()),
            jwt,
            provider,
        })
    }

    /// Configuration for unit tests: no database, no provider credential.
    pub fn for_tests() -> Self {
        Self {
            database_url: None,
            frontend_url: "http://localhost:3000".into(),
            host: "127.0.0.1".into(),
            port: 0,
            env: RuntimeEnv::Development,
            jwt: JwtConfig {
                secret: "test-secret".into(),
                issuer: "test-issuer".into(),
                audience: "test-aud".into(),
                ttl_minutes: 5,
                refresh_ttl_minutes: 60,
            },
            provider: ProviderConfig {
                api_key: None,
                base_url: "http://localhost:0".into(),
                model: "test-model".into(),
                timeout_secs: 5,
            },
        }
    }
}
