// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use credito_app::{DEFAULT_ROWS_PER_PAGE, ROWS_PER_PAGE_OPTIONS, TabKind};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const APP_NAME: &str = "credito";
const CONFIG_VERSION: i64 = 1;
const DEFAULT_TIMEOUT: &str = "10s";
const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub version: i64,
    #[serde(default)]
    pub api: Api,
    #[serde(default)]
    pub auth: Auth,
    #[serde(default)]
    pub ui: Ui,
    #[serde(default)]
    pub log: Log,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            api: Api::default(),
            auth: Auth::default(),
            ui: Ui::default(),
            log: Log::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Api {
    pub base_url: Option<String>,
    pub timeout: Option<String>,
}

impl Default for Api {
    fn default() -> Self {
        Self {
            base_url: Some(credito_api::DEFAULT_BASE_URL.to_owned()),
            timeout: Some(DEFAULT_TIMEOUT.to_owned()),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Auth {
    pub username: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Ui {
    pub rows_per_page: Option<usize>,
    pub start_tab: Option<String>,
}

impl Default for Ui {
    fn default() -> Self {
        Self {
            rows_per_page: Some(DEFAULT_ROWS_PER_PAGE),
            start_tab: Some(TabKind::Applications.label().to_owned()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Log {
    pub level: Option<String>,
    pub file: Option<String>,
}

impl Default for Log {
    fn default() -> Self {
        Self {
            level: Some(DEFAULT_LOG_LEVEL.to_owned()),
            file: None,
        }
    }
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = env::var_os("CREDITO_CONFIG_PATH") {
            return Ok(PathBuf::from(path));
        }

        let config_root = dirs::config_dir().ok_or_else(|| {
            anyhow!("cannot resolve config directory; set CREDITO_CONFIG_PATH to the config file")
        })?;

        let app_dir = config_root.join(APP_NAME);
        fs::create_dir_all(&app_dir)
            .with_context(|| format!("create config directory {}", app_dir.display()))?;
        Ok(app_dir.join("config.toml"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        let value: toml::Value = toml::from_str(&raw)
            .with_context(|| format!("parse TOML config {}", path.display()))?;

        let version = value
            .get("version")
            .and_then(toml::Value::as_integer)
            .ok_or_else(|| {
                anyhow!(
                    "config file {} has no version. Add `version = 1` and keep values under [api], [auth], [ui], and [log]",
                    path.display()
                )
            })?;

        if version != CONFIG_VERSION {
            bail!(
                "unsupported config version {} in {}; expected version = 1. Run `credito --print-example-config` for a template",
                version,
                path.display()
            );
        }

        let config: Config = value
            .try_into()
            .with_context(|| format!("decode config {}", path.display()))?;
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        if let Some(base_url) = &self.api.base_url
            && base_url.trim().is_empty()
        {
            bail!(
                "api.base_url in {} is empty; set it to the API server URL",
                path.display()
            );
        }

        if let Some(timeout) = &self.api.timeout {
            let parsed = parse_duration(timeout)?;
            if parsed <= Duration::ZERO {
                bail!(
                    "api.timeout in {} must be positive, got {}",
                    path.display(),
                    timeout
                );
            }
        }

        if let Some(rows) = self.ui.rows_per_page
            && !ROWS_PER_PAGE_OPTIONS.contains(&rows)
        {
            bail!(
                "ui.rows_per_page in {} must be one of {:?}, got {}",
                path.display(),
                ROWS_PER_PAGE_OPTIONS,
                rows
            );
        }

        if let Some(tab) = &self.ui.start_tab
            && TabKind::parse(tab).is_none()
        {
            bail!(
                "ui.start_tab in {} is {:?}; use agents, campaigns, clients, applications, or policies",
                path.display(),
                tab
            );
        }

        Ok(())
    }

    /// `CREDITO_API_URL` wins over the file so one config can target
    /// several servers.
    pub fn api_base_url(&self) -> String {
        if let Ok(url) = env::var("CREDITO_API_URL")
            && !url.trim().is_empty()
        {
            return url.trim().to_owned();
        }
        self.api
            .base_url
            .as_deref()
            .unwrap_or(credito_api::DEFAULT_BASE_URL)
            .trim()
            .to_owned()
    }

    pub fn api_timeout(&self) -> Result<Duration> {
        parse_duration(self.api.timeout.as_deref().unwrap_or(DEFAULT_TIMEOUT))
    }

    pub fn username(&self) -> Option<&str> {
        self.auth
            .username
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }

    pub fn rows_per_page(&self) -> usize {
        self.ui.rows_per_page.unwrap_or(DEFAULT_ROWS_PER_PAGE)
    }

    pub fn start_tab(&self) -> TabKind {
        self.ui
            .start_tab
            .as_deref()
            .and_then(TabKind::parse)
            .unwrap_or(TabKind::Applications)
    }

    pub fn log_filter(&self) -> String {
        if let Ok(level) = env::var("CREDITO_LOG")
            && !level.trim().is_empty()
        {
            return level;
        }
        self.log
            .level
            .clone()
            .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_owned())
    }

    pub fn log_path(&self) -> Result<PathBuf> {
        match &self.log.file {
            Some(path) => Ok(PathBuf::from(path)),
            None => {
                let data_root = dirs::data_local_dir().ok_or_else(|| {
                    anyhow!("cannot resolve data directory; set [log].file in the config")
                })?;
                Ok(data_root.join(APP_NAME).join("credito.log"))
            }
        }
    }

    pub fn example_config(path: &Path) -> String {
        format!(
            "# credito config\n# Place this file at: {}\n\nversion = 1\n\n[api]\nbase_url = \"{}\"\ntimeout = \"{}\"\n\n[auth]\n# Password comes from CREDITO_PASSWORD or the login prompt.\n# username = \"admin\"\n\n[ui]\nrows_per_page = {}\nstart_tab = \"applications\"\n\n[log]\nlevel = \"{}\"\n# Optional. Default is the platform data dir (for example ~/.local/share/credito/credito.log)\n# file = \"/absolute/path/to/credito.log\"\n",
            path.display(),
            credito_api::DEFAULT_BASE_URL,
            DEFAULT_TIMEOUT,
            DEFAULT_ROWS_PER_PAGE,
            DEFAULT_LOG_LEVEL,
        )
    }
}

fn parse_duration(raw: &str) -> Result<Duration> {
    if let Some(value) = raw.strip_suffix("ms") {
        let millis: u64 = value
            .parse()
            .with_context(|| format!("invalid timeout duration {raw:?}"))?;
        return Ok(Duration::from_millis(millis));
    }
    if let Some(value) = raw.strip_suffix('s') {
        let secs: u64 = value
            .parse()
            .with_context(|| format!("invalid timeout duration {raw:?}"))?;
        return Ok(Duration::from_secs(secs));
    }
    if let Some(value) = raw.strip_suffix('m') {
        let mins: u64 = value
            .parse()
            .with_context(|| format!("invalid timeout duration {raw:?}"))?;
        return Ok(Duration::from_secs(mins * 60));
    }

    bail!("invalid duration {raw:?}; use one of: <N>ms, <N>s, <N>m (for example 500ms or 10s)")
}

#[cfg(test)]
mod tests {
    use super::{Config, parse_duration};
    use anyhow::Result;
    use credito_app::TabKind;
    use credito_testkit::temp_config_path;
    use std::path::PathBuf;
    use std::sync::{Mutex, OnceLock};
    use std::time::Duration;

    fn write_config(content: &str) -> Result<(tempfile::TempDir, PathBuf)> {
        let (temp, path) = temp_config_path()?;
        std::fs::write(&path, content)?;
        Ok((temp, path))
    }

    fn env_lock() -> std::sync::MutexGuard<'static, ()> {
        static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        match ENV_LOCK.get_or_init(|| Mutex::new(())).lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    #[test]
    fn missing_config_uses_defaults() -> Result<()> {
        let _guard = env_lock();
        let temp = tempfile::tempdir()?;
        let config = Config::load(&temp.path().join("missing.toml"))?;
        assert_eq!(config.version, 1);
        assert_eq!(config.rows_per_page(), 10);
        assert_eq!(config.start_tab(), TabKind::Applications);
        assert_eq!(config.api_timeout()?, Duration::from_secs(10));
        assert!(config.username().is_none());
        Ok(())
    }

    #[test]
    fn unversioned_config_is_rejected_with_actionable_message() -> Result<()> {
        let (_temp, path) = write_config("[api]\nbase_url = \"http://crm.local\"\n")?;
        let error = Config::load(&path).expect_err("unversioned config should fail");
        let message = error.to_string();
        assert!(message.contains("version = 1"));
        assert!(message.contains("[api], [auth], [ui], and [log]"));
        Ok(())
    }

    #[test]
    fn v1_config_parses() -> Result<()> {
        let _guard = env_lock();
        // SAFETY: test-only process-local env mutation.
        unsafe {
            std::env::remove_var("CREDITO_API_URL");
        }
        let (_temp, path) = write_config(
            "version = 1\n[api]\nbase_url = \"http://crm.local:9000\"\ntimeout = \"1500ms\"\n[auth]\nusername = \" ana \"\n[ui]\nrows_per_page = 25\nstart_tab = \"Clients\"\n[log]\nlevel = \"debug\"\nfile = \"/tmp/credito-test.log\"\n",
        )?;

        let config = Config::load(&path)?;
        assert_eq!(config.api_base_url(), "http://crm.local:9000");
        assert_eq!(config.api_timeout()?, Duration::from_millis(1500));
        assert_eq!(config.username(), Some("ana"));
        assert_eq!(config.rows_per_page(), 25);
        assert_eq!(config.start_tab(), TabKind::Clients);
        assert_eq!(config.log_path()?, PathBuf::from("/tmp/credito-test.log"));
        Ok(())
    }

    #[test]
    fn malformed_config_returns_parse_error() -> Result<()> {
        let (_temp, path) = write_config("{{not toml")?;
        let error = Config::load(&path).expect_err("malformed config should fail");
        assert!(error.to_string().contains("parse TOML config"));
        Ok(())
    }

    #[test]
    fn unsupported_config_version_is_rejected() -> Result<()> {
        let (_temp, path) = write_config("version = 3\n")?;
        let error = Config::load(&path).expect_err("v3 config should fail");
        assert!(error.to_string().contains("unsupported config version 3"));
        Ok(())
    }

    #[test]
    fn rows_per_page_must_be_a_supported_size() -> Result<()> {
        let (_temp, path) = write_config("version = 1\n[ui]\nrows_per_page = 7\n")?;
        let error = Config::load(&path).expect_err("7 rows should fail");
        assert!(error.to_string().contains("must be one of [5, 10, 25, 50]"));
        Ok(())
    }

    #[test]
    fn unknown_start_tab_is_rejected() -> Result<()> {
        let (_temp, path) = write_config("version = 1\n[ui]\nstart_tab = \"dashboard\"\n")?;
        let error = Config::load(&path).expect_err("unknown tab should fail");
        assert!(error.to_string().contains("ui.start_tab"));
        Ok(())
    }

    #[test]
    fn zero_timeout_is_rejected() -> Result<()> {
        let (_temp, path) = write_config("version = 1\n[api]\ntimeout = \"0s\"\n")?;
        let error = Config::load(&path).expect_err("zero timeout should fail");
        assert!(error.to_string().contains("must be positive"));
        Ok(())
    }

    #[test]
    fn default_path_honors_env_override() -> Result<()> {
        let _guard = env_lock();
        let temp = tempfile::tempdir()?;
        let override_path = temp.path().join("custom-config.toml");
        // SAFETY: test-only process-local env mutation.
        unsafe {
            std::env::set_var("CREDITO_CONFIG_PATH", &override_path);
        }
        let resolved = Config::default_path()?;
        // SAFETY: test cleanup for process-local env mutation.
        unsafe {
            std::env::remove_var("CREDITO_CONFIG_PATH");
        }
        assert_eq!(resolved, override_path);
        Ok(())
    }

    #[test]
    fn api_url_env_override_wins_over_file() -> Result<()> {
        let _guard = env_lock();
        let (_temp, path) = write_config("version = 1\n[api]\nbase_url = \"http://from-file\"\n")?;
        // SAFETY: test-only process-local env mutation.
        unsafe {
            std::env::set_var("CREDITO_API_URL", "http://from-env:8000");
        }
        let config = Config::load(&path)?;
        let resolved = config.api_base_url();
        // SAFETY: test cleanup for process-local env mutation.
        unsafe {
            std::env::remove_var("CREDITO_API_URL");
        }
        assert_eq!(resolved, "http://from-env:8000");
        Ok(())
    }

    #[test]
    fn log_filter_prefers_env() -> Result<()> {
        let _guard = env_lock();
        let (_temp, path) = write_config("version = 1\n[log]\nlevel = \"warn\"\n")?;
        let config = Config::load(&path)?;
        // SAFETY: test-only process-local env mutation.
        unsafe {
            std::env::remove_var("CREDITO_LOG");
        }
        assert_eq!(config.log_filter(), "warn");
        // SAFETY: test-only process-local env mutation.
        unsafe {
            std::env::set_var("CREDITO_LOG", "credito_api=debug");
        }
        let resolved = config.log_filter();
        // SAFETY: test cleanup for process-local env mutation.
        unsafe {
            std::env::remove_var("CREDITO_LOG");
        }
        assert_eq!(resolved, "credito_api=debug");
        Ok(())
    }

    #[test]
    fn durations_parse_ms_seconds_and_minutes() -> Result<()> {
        assert_eq!(parse_duration("500ms")?, Duration::from_millis(500));
        assert_eq!(parse_duration("5s")?, Duration::from_secs(5));
        assert_eq!(parse_duration("2m")?, Duration::from_secs(120));
        let error = parse_duration("soon").expect_err("invalid duration should fail");
        assert!(error.to_string().contains("invalid"));
        Ok(())
    }

    #[test]
    fn example_config_round_trips_through_load() -> Result<()> {
        let _guard = env_lock();
        let (_temp, path) = temp_config_path()?;
        let example = Config::example_config(&path);
        assert!(example.contains("version = 1"));
        assert!(example.contains("[api]"));
        assert!(example.contains("[log]"));
        std::fs::write(&path, example)?;
        let config = Config::load(&path)?;
        assert_eq!(config.rows_per_page(), 10);
        Ok(())
    }
}
