//! Layered configuration: defaults -> optional TOML file -> environment.
//!
//! Grounded in the original `backend/src/config.py`'s `Settings`
//! (`pydantic_settings.BaseSettings`, env-driven with defaults, no
//! required key to start) and in the pack's web-service repos that load
//! settings through the `config` crate rather than hand-rolled
//! `std::env::var` calls. Environment overrides use the `config` crate's
//! double-underscore nesting separator (`APP__CLOCK__PRESET=demo`).

use serde::{Deserialize, Serialize};

use crate::clock::ClockPreset;
use crate::error::{CoreError, CoreResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClockSettings {
    pub default_preset: ClockPreset,
}

impl Default for ClockSettings {
    fn default() -> Self {
        Self {
            default_preset: ClockPreset::Demo,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NarrativeSettings {
    /// Optional external-API key for C9 (the `HttpBridge`). Missing
    /// credentials disable narrative generation but not ticks (§6).
    pub api_key: Option<String>,
    pub endpoint: Option<String>,
    pub timeout_ms: u64,
}

impl Default for NarrativeSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: None,
            timeout_ms: 2_000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMode {
    /// No authentication; every caller is treated as a single demo user.
    /// Opaque to the core (§6) — included only so the `cli` crate has a
    /// concrete default to branch on.
    None,
    Jwt,
}

impl Default for AuthMode {
    fn default() -> Self {
        AuthMode::None
    }
}

/// Top-level settings object. Every field has a default, so the engine
/// starts with zero configuration present (§6: "No configuration key is
/// required for the core to start").
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Database URL, with a file-based fallback when unset (§6). The core
    /// itself only ships the in-memory `StateStore`; this field exists so
    /// downstream deployments have a place to record where a durable
    /// store would live.
    #[serde(default)]
    pub database_url: Option<String>,
    #[serde(default)]
    pub state_file: Option<String>,
    #[serde(default)]
    pub clock: ClockSettings,
    #[serde(default)]
    pub narrative: NarrativeSettings,
    #[serde(default)]
    pub auth_mode: AuthMode,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

impl Settings {
    /// Load defaults, then layer an optional TOML file, then environment
    /// overrides prefixed `APP` (`APP__CLOCK__DEFAULT_PRESET=casual`).
    /// Mirrors the `config` crate idiom used across the pack's
    /// service repos rather than reading `std::env::var` inline.
    pub fn load(config_path: Option<&str>) -> CoreResult<Self> {
        let mut builder = config::Config::builder()
            .add_source(config::Config::try_from(&Settings::default()).map_err(config_err)?);

        if let Some(path) = config_path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("APP")
                .separator("__")
                .try_parsing(true),
        );

        builder
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(config_err)
    }
}

fn config_err(err: config::ConfigError) -> CoreError {
    CoreError::Fatal(format!("configuration error: {err}"))
}
