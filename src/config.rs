use serde::{Deserialize, Serialize};
use std::env;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub auth_provider: AuthProviderConfig,
    #[serde(default)]
    pub demo_business: DemoBusinessConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub access_token_expires_in: i64, // seconds
}

/// 外部认证服务（Supabase Auth 兼容接口）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthProviderConfig {
    pub url: String,
    pub service_key: String,
}

/// 演示商家：携带 X-Business-ID 等于该 id 的请求被视为该商家本身
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DemoBusinessConfig {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub address: String,
    pub logo_url: String,
    pub currency: String,
}

impl Default for DemoBusinessConfig {
    fn default() -> Self {
        Self {
            id: Uuid::nil(),
            name: "Le Gourmet Demo".to_string(),
            description:
                "A fantastic culinary experience awaiting you. Join our exclusive draws!"
                    .to_string(),
            address: "123 Demo Street, Tech City".to_string(),
            logo_url: "https://placehold.co/200x200?text=Le+Gourmet".to_string(),
            currency: "EUR".to_string(),
        }
    }
}

fn get_env(name: &str) -> Option<String> {
    env::var(name).ok()
}

fn get_env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

impl Config {
    pub fn from_toml() -> AppResult<Self> {
        let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
        use std::io::ErrorKind;

        // 尝试读取配置文件，如果不存在则完全依赖环境变量
        let mut config = match std::fs::read_to_string(&config_path) {
            Ok(config_str) => Self::parse(&config_str)?,
            Err(e) if e.kind() == ErrorKind::NotFound => Self::from_env_defaults()?,
            Err(e) => {
                return Err(AppError::ConfigError(format!(
                    "Cannot read config file {config_path}: {e}"
                )));
            }
        };

        // 环境变量覆盖（即便文件存在时也覆盖）
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub fn parse(config_str: &str) -> AppResult<Self> {
        toml::from_str(config_str)
            .map_err(|e| AppError::ConfigError(format!("Failed to parse config file: {e}")))
    }

    fn from_env_defaults() -> AppResult<Self> {
        // 数据库 URL 在无配置文件时必须提供
        let database_url = get_env("DATABASE_URL").ok_or_else(|| {
            AppError::ConfigError(
                "DATABASE_URL is not set and no config.toml was found".to_string(),
            )
        })?;

        Ok(Config {
            server: ServerConfig {
                host: get_env("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port: get_env_parse("SERVER_PORT", 8080u16),
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections: get_env_parse("DB_MAX_CONNECTIONS", 10u32),
            },
            jwt: JwtConfig {
                secret: get_env("JWT_SECRET")
                    .unwrap_or_else(|| "change-me-in-production".to_string()),
                access_token_expires_in: get_env_parse("JWT_ACCESS_EXPIRES_IN", 604_800i64),
            },
            auth_provider: AuthProviderConfig {
                url: get_env("AUTH_PROVIDER_URL").unwrap_or_default(),
                service_key: get_env("AUTH_PROVIDER_SERVICE_KEY").unwrap_or_default(),
            },
            demo_business: DemoBusinessConfig::default(),
        })
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = env::var("SERVER_HOST") {
            self.server.host = v;
        }
        if let Ok(v) = env::var("SERVER_PORT")
            && let Ok(p) = v.parse()
        {
            self.server.port = p;
        }
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = v;
        }
        if let Ok(v) = env::var("DB_MAX_CONNECTIONS")
            && let Ok(mc) = v.parse()
        {
            self.database.max_connections = mc;
        }
        if let Ok(v) = env::var("JWT_SECRET") {
            self.jwt.secret = v;
        }
        if let Ok(v) = env::var("JWT_ACCESS_EXPIRES_IN")
            && let Ok(n) = v.parse()
        {
            self.jwt.access_token_expires_in = n;
        }
        if let Ok(v) = env::var("AUTH_PROVIDER_URL") {
            self.auth_provider.url = v;
        }
        if let Ok(v) = env::var("AUTH_PROVIDER_SERVICE_KEY") {
            self.auth_provider.service_key = v;
        }
        if let Ok(v) = env::var("DEMO_BUSINESS_ID")
            && let Ok(id) = v.parse()
        {
            self.demo_business.id = id;
        }
        if let Ok(v) = env::var("DEMO_BUSINESS_NAME") {
            self.demo_business.name = v;
        }
    }

    fn validate(&self) -> AppResult<()> {
        if self.jwt.access_token_expires_in <= 0 {
            return Err(AppError::ConfigError(
                "jwt.access_token_expires_in must be positive".to_string(),
            ));
        }
        if self.demo_business.id.is_nil() {
            log::warn!("demo_business.id is not configured; X-Business-ID auth is disabled");
        }
        Ok(())
    }
}
