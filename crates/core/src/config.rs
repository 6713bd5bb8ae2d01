use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_or(profile: &str, key: &str, default: &str) -> String {
    profiled_env_opt(profile, key).unwrap_or_else(|| default.to_string())
}

fn profiled_env_usize(profile: &str, key: &str, default: usize) -> usize {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn profiled_env_bool(profile: &str, key: &str, default: bool) -> bool {
    match profiled_env_opt(profile, key).as_deref() {
        Some("1") | Some("true") | Some("yes") => true,
        Some("0") | Some("false") | Some("no") => false,
        _ => default,
    }
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    pub apply: ApplyConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `VIGIL_PROFILE` env var. When set (e.g. `PROD`),
    /// every key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Self {
        let profile = env_or("VIGIL_PROFILE", "").to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Self {
            profile: p.to_string(),
            apply: ApplyConfig::from_env_profiled(p),
        }
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Print a summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!("  config_dir:     {}", self.apply.config_dir.display());
        tracing::info!("  worker_threads: {}", self.apply.worker_threads);
        tracing::info!("  warn_unmatched: {}", self.apply.warn_unmatched);
    }

    pub fn summary(&self) -> serde_json::Value {
        serde_json::json!({
            "profile": self.profile_label(),
            "apply": {
                "config_dir": self.apply.config_dir,
                "worker_threads": self.apply.worker_threads,
                "warn_unmatched": self.apply.warn_unmatched,
            },
        })
    }
}

// ── Apply engine ──────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplyConfig {
    /// Directory scanned for object and apply-rule YAML files.
    pub config_dir: PathBuf,
    /// Threads used to evaluate candidates in parallel.
    pub worker_threads: usize,
    /// Emit a warning for every apply rule that matched nothing.
    pub warn_unmatched: bool,
}

impl ApplyConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            config_dir: PathBuf::from(profiled_env_or(p, "VIGIL_CONFIG_DIR", "conf.d")),
            worker_threads: profiled_env_usize(p, "APPLY_WORKER_THREADS", 4).max(1),
            warn_unmatched: profiled_env_bool(p, "APPLY_WARN_UNMATCHED", true),
        }
    }
}

impl Default for ApplyConfig {
    fn default() -> Self {
        Self {
            config_dir: PathBuf::from("conf.d"),
            worker_threads: 4,
            warn_unmatched: true,
        }
    }
}
