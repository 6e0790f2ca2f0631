use std::{env, io::Write};

use cardgate::GatewayConfig;
use chrono::Duration;
use log::*;
use rand::{distributions::Alphanumeric, Rng};
use serde_json::json;
use tempfile::NamedTempFile;
use wash_common::{parse_boolean_flag, Secret};

const DEFAULT_WASH_HOST: &str = "127.0.0.1";
const DEFAULT_WASH_PORT: u16 = 8360;
const DEFAULT_TOKEN_LIFETIME: Duration = Duration::hours(24);

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub auth: AuthConfig,
    /// Card gateway credentials. When incomplete, the server runs the deterministic mock
    /// processor and flags every intent it issues as a mock.
    pub gateway: GatewayConfig,
    /// If false, webhook signature checks are skipped. Only ever disable this in development.
    pub webhook_checks: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_WASH_HOST.to_string(),
            port: DEFAULT_WASH_PORT,
            database_url: String::default(),
            auth: AuthConfig::default(),
            gateway: GatewayConfig::default(),
            webhook_checks: true,
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("WASH_HOST").ok().unwrap_or_else(|| DEFAULT_WASH_HOST.into());
        let port = env::var("WASH_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!("🪛️ {s} is not a valid port for WASH_PORT. {e} Using the default, {DEFAULT_WASH_PORT}.");
                    DEFAULT_WASH_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_WASH_PORT);
        let database_url = env::var("WASH_DATABASE_URL").ok().unwrap_or_else(|| {
            error!("🪛️ WASH_DATABASE_URL is not set. Please set it to the URL for the wash database.");
            String::default()
        });
        let auth = AuthConfig::try_from_env().unwrap_or_else(|e| {
            warn!("🪛️ Could not load the authentication configuration from the environment. {e}. Reverting to the default.");
            AuthConfig::default()
        });
        let gateway = GatewayConfig::from_env_or_default();
        let webhook_checks = parse_boolean_flag(env::var("WASH_WEBHOOK_CHECKS").ok(), true);
        if !webhook_checks {
            warn!("🚨️ Webhook signature checks are DISABLED. Never run a production instance like this.");
        }
        Self { host, port, database_url, auth, gateway, webhook_checks }
    }
}

//-------------------------------------------------  AuthConfig  ------------------------------------------------------
#[derive(Clone, Debug)]
pub struct AuthConfig {
    /// The HS256 secret used to sign and verify bearer tokens.
    pub jwt_secret: Secret,
    /// How long issued access tokens stay valid.
    pub token_lifetime: Duration,
}

impl Default for AuthConfig {
    fn default() -> Self {
        let mut tmpfile = NamedTempFile::new().ok().and_then(|f| f.keep().ok());
        warn!(
            "🚨️🚨️🚨️ The JWT signing secret has not been set. I'm using a random value for this session. DO NOT \
             operate on production like this, since every token dies with the process. 🚨️🚨️🚨️"
        );
        let secret: String = rand::thread_rng().sample_iter(&Alphanumeric).take(64).map(char::from).collect();
        match &mut tmpfile {
            Some((f, p)) => {
                let key_data = json!({ "jwt_secret": secret }).to_string();
                match writeln!(f, "{key_data}") {
                    Ok(()) => warn!(
                        "🚨️🚨️🚨️ The JWT secret for this session was written to {}. If this is a production \
                         instance, you are doing it wrong! Set the WASH_JWT_SECRET environment variable instead. \
                         🚨️🚨️🚨️",
                        p.to_str().unwrap_or("???")
                    ),
                    Err(e) => warn!("🪛️ Could not write the JWT secret to the temporary file. {e}"),
                }
            },
            None => {
                warn!("🪛️ Could not create a temporary file to store the JWT secret.");
            },
        }
        Self { jwt_secret: Secret::new(secret), token_lifetime: DEFAULT_TOKEN_LIFETIME }
    }
}

impl AuthConfig {
    pub fn try_from_env() -> Result<Self, String> {
        let secret = env::var("WASH_JWT_SECRET").map_err(|e| format!("{e} [WASH_JWT_SECRET]"))?;
        if secret.len() < 32 {
            return Err("WASH_JWT_SECRET must be at least 32 characters long".to_string());
        }
        let token_lifetime = env::var("WASH_TOKEN_LIFETIME_HOURS")
            .ok()
            .and_then(|s| {
                s.parse::<i64>()
                    .map_err(|e| warn!("🪛️ Invalid configuration value for WASH_TOKEN_LIFETIME_HOURS. {e}"))
                    .ok()
            })
            .map(Duration::hours)
            .unwrap_or(DEFAULT_TOKEN_LIFETIME);
        Ok(Self { jwt_secret: Secret::new(secret), token_lifetime })
    }
}
