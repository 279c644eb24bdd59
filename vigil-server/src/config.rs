//! Server configuration
//!
//! Every setting comes from an environment variable with a default, so a
//! bare `vigil-server` watches a local Jenkins and logs test results instead
//! of storing them.

use std::collections::{HashMap, HashSet};
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use vigil_core::domain::status::VersionControl;

/// Configuration errors, all fatal at start-up
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} has an invalid value '{value}': {reason}")]
    InvalidValue {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("{0}")]
    Invalid(String),
}

impl ConfigError {
    fn invalid_value(name: &'static str, value: &str, reason: impl ToString) -> Self {
        Self::InvalidValue {
            name,
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Which CI system the server watches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CiBackend {
    Jenkins,
    Gitlab,
}

impl FromStr for CiBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "jenkins" => Ok(CiBackend::Jenkins),
            "gitlab" => Ok(CiBackend::Gitlab),
            other => Err(format!("unknown CI backend '{}'", other)),
        }
    }
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP listen address (e.g., "0.0.0.0:8080")
    pub bind_addr: String,

    pub ci_backend: CiBackend,

    /// CI base URL (e.g., "http://localhost:8080/jenkins")
    pub ci_url: String,

    /// Jenkins basic auth
    pub ci_username: Option<String>,
    pub ci_password: Option<String>,

    /// GitLab private token
    pub ci_token: Option<String>,

    /// VCS of the Jenkins jobs; GitLab is always git
    pub version_control: VersionControl,

    /// How often to ask the backend for new jobs
    pub discovery_interval: Duration,

    /// How often to poll every tracked job
    pub update_interval: Duration,

    /// Bound of the outbound message bus
    pub bus_capacity: usize,

    /// Dashboard priority per job name, 0 when absent
    pub job_priorities: HashMap<String, i32>,

    /// Jobs whose test results are recorded on completion
    pub persist_test_results_jobs: HashSet<String>,

    /// Jobs whose commit comments are published
    pub display_comments_jobs: HashSet<String>,

    /// Enables Postgres persistence when set
    pub database_url: Option<String>,
}

impl Config {
    /// Creates configuration from environment variables
    ///
    /// Expected environment variables (all optional):
    /// - VIGIL_BIND_ADDR (default: 0.0.0.0:8080)
    /// - CI_BACKEND (jenkins | gitlab, default: jenkins)
    /// - CI_URL (default: http://localhost:8080/jenkins)
    /// - CI_USERNAME, CI_PASSWORD, CI_TOKEN
    /// - VERSION_CONTROL (git | svn, default: git)
    /// - DISCOVERY_INTERVAL (seconds, default: 300)
    /// - UPDATE_INTERVAL (seconds, default: 5)
    /// - BUS_CAPACITY (default: 1024)
    /// - JOB_PRIORITIES (name=prio,name=prio)
    /// - PERSIST_TEST_RESULTS_JOBS, DISPLAY_COMMENTS_JOBS (comma-separated names)
    /// - DATABASE_URL
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Creates configuration from an arbitrary key lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let ci_backend = match var("CI_BACKEND") {
            Some(value) => value
                .parse()
                .map_err(|e| ConfigError::invalid_value("CI_BACKEND", &value, e))?,
            None => defaults.ci_backend,
        };

        let version_control = match var("VERSION_CONTROL") {
            Some(value) => value
                .parse()
                .map_err(|e| ConfigError::invalid_value("VERSION_CONTROL", &value, e))?,
            None => defaults.version_control,
        };

        let discovery_interval = match var("DISCOVERY_INTERVAL") {
            Some(value) => Duration::from_secs(parse_number("DISCOVERY_INTERVAL", &value)?),
            None => defaults.discovery_interval,
        };

        let update_interval = match var("UPDATE_INTERVAL") {
            Some(value) => Duration::from_secs(parse_number("UPDATE_INTERVAL", &value)?),
            None => defaults.update_interval,
        };

        let bus_capacity = match var("BUS_CAPACITY") {
            Some(value) => parse_number("BUS_CAPACITY", &value)?,
            None => defaults.bus_capacity,
        };

        let job_priorities = match var("JOB_PRIORITIES") {
            Some(value) => parse_priorities(&value)?,
            None => HashMap::new(),
        };

        Ok(Self {
            bind_addr: var("VIGIL_BIND_ADDR").unwrap_or(defaults.bind_addr),
            ci_backend,
            ci_url: var("CI_URL").unwrap_or(defaults.ci_url),
            ci_username: var("CI_USERNAME"),
            ci_password: var("CI_PASSWORD"),
            ci_token: var("CI_TOKEN"),
            version_control,
            discovery_interval,
            update_interval,
            bus_capacity,
            job_priorities,
            persist_test_results_jobs: var("PERSIST_TEST_RESULTS_JOBS")
                .map(|value| parse_names(&value))
                .unwrap_or_default(),
            display_comments_jobs: var("DISPLAY_COMMENTS_JOBS")
                .map(|value| parse_names(&value))
                .unwrap_or_default(),
            database_url: var("DATABASE_URL"),
        })
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bind_addr.is_empty() {
            return Err(ConfigError::Invalid("bind_addr cannot be empty".into()));
        }

        if !self.ci_url.starts_with("http://") && !self.ci_url.starts_with("https://") {
            return Err(ConfigError::Invalid(
                "ci_url must start with http:// or https://".into(),
            ));
        }

        if self.discovery_interval.is_zero() {
            return Err(ConfigError::Invalid(
                "discovery_interval must be greater than 0".into(),
            ));
        }

        if self.update_interval.is_zero() {
            return Err(ConfigError::Invalid(
                "update_interval must be greater than 0".into(),
            ));
        }

        if self.bus_capacity == 0 {
            return Err(ConfigError::Invalid(
                "bus_capacity must be greater than 0".into(),
            ));
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
            ci_backend: CiBackend::Jenkins,
            ci_url: "http://localhost:8080/jenkins".to_string(),
            ci_username: None,
            ci_password: None,
            ci_token: None,
            version_control: VersionControl::Git,
            discovery_interval: Duration::from_secs(300),
            update_interval: Duration::from_secs(5),
            bus_capacity: 1024,
            job_priorities: HashMap::new(),
            persist_test_results_jobs: HashSet::new(),
            display_comments_jobs: HashSet::new(),
            database_url: None,
        }
    }
}

fn parse_number<T>(name: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: ToString,
{
    value
        .trim()
        .parse()
        .map_err(|e: T::Err| ConfigError::invalid_value(name, value, e))
}

/// Parses `name=prio,name=prio`
fn parse_priorities(value: &str) -> Result<HashMap<String, i32>, ConfigError> {
    let mut priorities = HashMap::new();

    for entry in value.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let (name, priority) = entry.rsplit_once('=').ok_or_else(|| {
            ConfigError::invalid_value("JOB_PRIORITIES", entry, "expected name=priority")
        })?;
        let name = name.trim();
        if name.is_empty() {
            return Err(ConfigError::invalid_value(
                "JOB_PRIORITIES",
                entry,
                "job name is empty",
            ));
        }
        priorities.insert(name.to_string(), parse_number("JOB_PRIORITIES", priority)?);
    }

    Ok(priorities)
}

fn parse_names(value: &str) -> HashSet<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_pairs(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.discovery_interval, Duration::from_secs(300));
        assert_eq!(config.update_interval, Duration::from_secs(5));
        assert_eq!(config.bus_capacity, 1024);
        assert_eq!(config.ci_backend, CiBackend::Jenkins);
        assert!(config.database_url.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_environment_uses_defaults() {
        let config = from_pairs(&[]).unwrap();
        assert_eq!(config.bind_addr, "0.0.0.0:8080");
        assert_eq!(config.ci_url, "http://localhost:8080/jenkins");
        assert!(config.job_priorities.is_empty());
    }

    #[test]
    fn test_from_lookup_reads_every_setting() {
        let config = from_pairs(&[
            ("CI_BACKEND", "GitLab"),
            ("CI_URL", "https://gitlab.local"),
            ("CI_TOKEN", "secret"),
            ("VERSION_CONTROL", "svn"),
            ("DISCOVERY_INTERVAL", "60"),
            ("UPDATE_INTERVAL", "2"),
            ("BUS_CAPACITY", "16"),
            ("JOB_PRIORITIES", "team/app=2, nightly=-1"),
            ("PERSIST_TEST_RESULTS_JOBS", "team/app,"),
            ("DISPLAY_COMMENTS_JOBS", " team/app , nightly "),
            ("DATABASE_URL", "postgres://vigil@localhost/vigil"),
        ])
        .unwrap();

        assert_eq!(config.ci_backend, CiBackend::Gitlab);
        assert_eq!(config.ci_token.as_deref(), Some("secret"));
        assert_eq!(config.version_control, VersionControl::Svn);
        assert_eq!(config.discovery_interval, Duration::from_secs(60));
        assert_eq!(config.update_interval, Duration::from_secs(2));
        assert_eq!(config.bus_capacity, 16);
        assert_eq!(config.job_priorities.get("team/app"), Some(&2));
        assert_eq!(config.job_priorities.get("nightly"), Some(&-1));
        assert_eq!(config.persist_test_results_jobs.len(), 1);
        assert!(config.display_comments_jobs.contains("nightly"));
        assert!(config.database_url.is_some());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(from_pairs(&[("CI_BACKEND", "travis")]).is_err());
        assert!(from_pairs(&[("VERSION_CONTROL", "hg")]).is_err());
        assert!(from_pairs(&[("UPDATE_INTERVAL", "soon")]).is_err());
        assert!(from_pairs(&[("JOB_PRIORITIES", "app")]).is_err());
        assert!(from_pairs(&[("JOB_PRIORITIES", "app=high")]).is_err());
        assert!(from_pairs(&[("JOB_PRIORITIES", "=3")]).is_err());
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();

        config.ci_url = "ci.local".to_string();
        assert!(config.validate().is_err());
        config.ci_url = "https://ci.local".to_string();
        assert!(config.validate().is_ok());

        config.update_interval = Duration::ZERO;
        assert!(config.validate().is_err());
        config.update_interval = Duration::from_secs(1);

        config.bus_capacity = 0;
        assert!(config.validate().is_err());
    }
}
