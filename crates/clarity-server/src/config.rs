//! Configuration file management for clarity.
//!
//! Provides a TOML-based config file at `~/.config/clarity/config.toml` and a
//! resolution chain: CLI flag > env var > config file > default.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use clarity_core::auth::{SessionConfig, SessionTokenError};
use clarity_db::config::DbConfig;

// -----------------------------------------------------------------------
// Config file types
// -----------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
pub struct ConfigFile {
    pub database: DatabaseSection,
    pub auth: AuthSection,
    pub inference: InferenceSection,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DatabaseSection {
    pub url: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthSection {
    /// Hex-encoded session secret (64 hex chars = 32 bytes).
    pub session_secret: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct InferenceSection {
    /// API key for the inference endpoint.
    pub api_key: String,
    /// Model name; omit to use the built-in default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

// -----------------------------------------------------------------------
// Paths
// -----------------------------------------------------------------------

/// Return the clarity config directory.
///
/// Always uses XDG layout: `$XDG_CONFIG_HOME/clarity` or `~/.config/clarity`.
/// We intentionally ignore the platform-specific `dirs::config_dir()`
/// (which returns `~/Library/Application Support` on macOS).
pub fn config_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("clarity");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("clarity")
}

/// Return the path to the clarity config file.
pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

// -----------------------------------------------------------------------
// Read / write
// -----------------------------------------------------------------------

/// Load and parse the config file. Returns an error if it does not exist.
pub fn load_config() -> Result<ConfigFile> {
    let path = config_path();
    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read config file at {}", path.display()))?;
    let config: ConfigFile = toml::from_str(&contents).context("failed to parse config file")?;
    Ok(config)
}

/// Serialize and write the config file, creating parent dirs as needed.
/// Sets file permissions to 0600 on Unix.
pub fn save_config(config: &ConfigFile) -> Result<()> {
    let path = config_path();
    let dir = config_dir();
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create config directory {}", dir.display()))?;

    let contents = toml::to_string_pretty(config).context("failed to serialize config")?;
    std::fs::write(&path, &contents)
        .with_context(|| format!("failed to write config file at {}", path.display()))?;

    // Set permissions to 0600 (owner read/write only) on Unix.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(&path, perms)
            .with_context(|| format!("failed to set permissions on {}", path.display()))?;
    }

    Ok(())
}

// -----------------------------------------------------------------------
// Session secret generation
// -----------------------------------------------------------------------

/// Generate a random session secret: 32 random bytes, hex-encoded (64 chars).
pub fn generate_session_secret() -> String {
    use rand::Rng;
    let mut bytes = [0u8; 32];
    rand::rng().fill(&mut bytes);
    hex::encode(bytes)
}

// -----------------------------------------------------------------------
// Resolved config
// -----------------------------------------------------------------------

/// Fully resolved configuration, ready for use.
#[derive(Debug)]
pub struct ClarityConfig {
    pub db_config: DbConfig,
    pub session_config: SessionConfig,
    pub inference_api_key: String,
    pub inference_model: Option<String>,
}

impl ClarityConfig {
    /// Resolve configuration using the chain: CLI flag > env var > config file > default.
    ///
    /// - DB URL: `cli_db_url` > `CLARITY_DATABASE_URL` env > `config_file.database.url` > `DbConfig::DEFAULT_URL`
    /// - Session secret: `CLARITY_SESSION_SECRET` env > `config_file.auth.session_secret` (hex-decoded) > error
    /// - Inference key: `CLARITY_INFERENCE_API_KEY` env > `config_file.inference.api_key` > error
    /// - Inference model: `CLARITY_INFERENCE_MODEL` env > `config_file.inference.model` > built-in default
    pub fn resolve(cli_db_url: Option<&str>) -> Result<Self> {
        let file_config = load_config().ok();

        // DB URL resolution.
        let db_url = if let Some(url) = cli_db_url {
            url.to_string()
        } else if let Ok(url) = std::env::var("CLARITY_DATABASE_URL") {
            url
        } else if let Some(ref cfg) = file_config {
            cfg.database.url.clone()
        } else {
            DbConfig::DEFAULT_URL.to_string()
        };
        let db_config = DbConfig::new(db_url);

        // Session secret resolution. The env-var path (including hex
        // decoding) lives with the token code; only the config-file
        // fallback is handled here.
        let session_config = match SessionConfig::from_env() {
            Ok(from_env) => from_env,
            Err(SessionTokenError::MissingSecret) => match file_config {
                Some(ref cfg) => {
                    let bytes = hex::decode(&cfg.auth.session_secret)
                        .context("invalid hex in config file session_secret")?;
                    SessionConfig::new(bytes)
                }
                None => bail!(
                    "session secret not found; set CLARITY_SESSION_SECRET or run `clarity init` to create a config file"
                ),
            },
            Err(err) => return Err(err.into()),
        };

        // Inference endpoint credentials.
        let inference_api_key = if let Ok(key) = std::env::var("CLARITY_INFERENCE_API_KEY") {
            key
        } else if let Some(ref cfg) = file_config {
            cfg.inference.api_key.clone()
        } else {
            bail!(
                "inference API key not found; set CLARITY_INFERENCE_API_KEY or run `clarity init`"
            );
        };

        let inference_model = std::env::var("CLARITY_INFERENCE_MODEL")
            .ok()
            .or_else(|| file_config.as_ref().and_then(|cfg| cfg.inference.model.clone()));

        Ok(Self {
            db_config,
            session_config,
            inference_api_key,
            inference_model,
        })
    }
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------
