use anyhow::{Result, anyhow};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::fmt;

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub auth: Auth,
    pub store: Store,
    pub http: Http,
    pub log: Log,
}

// Unknown keys are rejected so a leftover `backend` switch cannot load.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Auth {
    pub issuer: String,
    pub audience: String,
    pub signing_key: String,
    pub access_ttl_secs: i64,
    pub refresh_ttl_secs: i64,
}

// Hand-written so the signing key never reaches the logs.
impl fmt::Debug for Auth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Auth")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("signing_key", &"<redacted>")
            .field("access_ttl_secs", &self.access_ttl_secs)
            .field("refresh_ttl_secs", &self.refresh_ttl_secs)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
pub struct Store {
    pub backend: String, // "memory", "redis" or "mysql"
    pub redis_dsn: Option<String>,
    pub mysql_dsn: Option<String>,
    pub key_prefix: String,
    pub timeout_ms: u64,
}

#[derive(Debug, Deserialize)]
pub struct Http {
    pub address: String,
    pub cert_path: Option<String>,
    pub key_path: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Log {
    pub filter: String,
}

const MIN_SIGNING_KEY_LEN: usize = 32;

impl Settings {
    pub fn validate(&self) -> Result<()> {
        let auth = &self.auth;
        if auth.signing_key.len() < MIN_SIGNING_KEY_LEN {
            return Err(anyhow!(
                "auth.signing_key must be at least {} bytes",
                MIN_SIGNING_KEY_LEN
            ));
        }
        if auth.access_ttl_secs <= 0 || auth.refresh_ttl_secs <= 0 {
            return Err(anyhow!("token lifetimes must be positive"));
        }
        if auth.refresh_ttl_secs <= auth.access_ttl_secs {
            return Err(anyhow!(
                "auth.refresh_ttl_secs must exceed auth.access_ttl_secs"
            ));
        }
        if self.store.timeout_ms == 0 {
            return Err(anyhow!("store.timeout_ms must be positive"));
        }
        if self.http.cert_path.is_some() != self.http.key_path.is_some() {
            return Err(anyhow!(
                "http.cert_path and http.key_path must be set together"
            ));
        }
        Ok(())
    }
}

#[cfg(debug_assertions)]
const SETTINGS_PATH: &str = "settings/dev.toml";
#[cfg(not(debug_assertions))]
const SETTINGS_PATH: &str = "settings/release.toml";

/// Loads the TOML file at `path` (or the build-profile default), then applies
/// `ROTOR_<SECTION>__<KEY>` environment overrides.
pub fn parse_settings(path: Option<&str>) -> Result<Settings> {
    let path = path.unwrap_or(SETTINGS_PATH);

    let settings: Settings = Config::builder()
        .add_source(File::with_name(path))
        .add_source(
            Environment::with_prefix("ROTOR")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()
        .map_err(|e| anyhow!(e))?
        .try_deserialize()
        .map_err(|e| anyhow!(e))?;

    settings.validate()?;
    Ok(settings)
}
