use std::env;
use std::path::PathBuf;
use std::time::Duration;

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

fn profiled_env_usize(profile: &str, key: &str, default: usize) -> usize {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn profiled_env_u64(profile: &str, key: &str, default: u64) -> u64 {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenetConfig {
    /// Active profile name (empty = default).
    pub profile: String,
    pub evaluation: EvaluationConfig,
    pub paths: PathsConfig,
}

impl TenetConfig {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `TENET_PROFILE`. When set (e.g. `PROD`), every key
    /// is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Self {
        let profile = env_or("TENET_PROFILE", "").to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Self {
            profile: p.to_string(),
            evaluation: EvaluationConfig::from_env_profiled(p),
            paths: PathsConfig::from_env_profiled(p),
        }
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Print a summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!(
            "  evaluation:  max_rules={}, max_resources={}, load_timeout={:?}, run_timeout={:?}",
            self.evaluation.max_concurrent_rules,
            self.evaluation.max_concurrent_resources,
            self.evaluation.load_timeout(),
            self.evaluation.run_timeout(),
        );
        tracing::info!(
            "  paths:       spec={}, schema_dir={}, fixtures_dir={}",
            display_opt(&self.paths.spec),
            display_opt(&self.paths.schema_dir),
            display_opt(&self.paths.fixtures_dir),
        );
    }
}

fn display_opt(path: &Option<PathBuf>) -> String {
    path.as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "(none)".to_string())
}

// ── Evaluation ────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationConfig {
    /// Rules evaluated concurrently.
    pub max_concurrent_rules: usize,
    /// Resources evaluated concurrently inside one rule.
    pub max_concurrent_resources: usize,
    /// Per provider call; 0 disables.
    pub load_timeout_secs: u64,
    /// Whole run; 0 disables.
    pub run_timeout_secs: u64,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            max_concurrent_rules: 8,
            max_concurrent_resources: 32,
            load_timeout_secs: 120,
            run_timeout_secs: 0,
        }
    }
}

impl EvaluationConfig {
    fn from_env_profiled(p: &str) -> Self {
        let d = Self::default();
        Self {
            max_concurrent_rules: profiled_env_usize(p, "TENET_MAX_CONCURRENT_RULES", d.max_concurrent_rules).max(1),
            max_concurrent_resources: profiled_env_usize(p, "TENET_MAX_CONCURRENT_RESOURCES", d.max_concurrent_resources).max(1),
            load_timeout_secs: profiled_env_u64(p, "TENET_LOAD_TIMEOUT_SECS", d.load_timeout_secs),
            run_timeout_secs: profiled_env_u64(p, "TENET_RUN_TIMEOUT_SECS", d.run_timeout_secs),
        }
    }

    pub fn load_timeout(&self) -> Option<Duration> {
        (self.load_timeout_secs > 0).then(|| Duration::from_secs(self.load_timeout_secs))
    }

    pub fn run_timeout(&self) -> Option<Duration> {
        (self.run_timeout_secs > 0).then(|| Duration::from_secs(self.run_timeout_secs))
    }
}

// ── Paths ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PathsConfig {
    pub spec: Option<PathBuf>,
    pub schema_dir: Option<PathBuf>,
    pub fixtures_dir: Option<PathBuf>,
}

impl PathsConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            spec: profiled_env_opt(p, "TENET_SPEC_PATH").map(PathBuf::from),
            schema_dir: profiled_env_opt(p, "TENET_SCHEMA_DIR").map(PathBuf::from),
            fixtures_dir: profiled_env_opt(p, "TENET_FIXTURES_DIR").map(PathBuf::from),
        }
    }
}
