use crate::error::{LedgerError, Result};
use crate::storage::SpendPolicy;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;

pub static GLOBAL_CONFIG: Lazy<Config> = Lazy::new(Config::new);

static DEFAULT_NODE_ADDR: &str = "127.0.0.1:3001";
const DEFAULT_QUEUE_CAPACITY: usize = 10;
static DEFAULT_LOG_LEVEL: &str = "info";

const CONFIG_PATH_KEY: &str = "LEDGER_CONFIG";
const NODE_ADDRESS_KEY: &str = "NODE_ADDRESS";
const QUEUE_CAPACITY_KEY: &str = "LEDGER_QUEUE_CAPACITY";
const SPEND_POLICY_KEY: &str = "LEDGER_SPEND_POLICY";
const LOG_LEVEL_KEY: &str = "LEDGER_LOG";

/// Node settings, layered as defaults, then a TOML file, then environment.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub node_addr: String,
    pub queue_capacity: usize,
    pub spend_policy: SpendPolicy,
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            node_addr: String::from(DEFAULT_NODE_ADDR),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            spend_policy: SpendPolicy::default(),
            log_level: String::from(DEFAULT_LOG_LEVEL),
        }
    }
}

impl Settings {
    pub fn from_toml_str(contents: &str) -> Result<Settings> {
        let settings: Settings = toml::from_str(contents)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Settings> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| {
            LedgerError::Config(format!("Failed to read {}: {e}", path.display()))
        })?;
        Settings::from_toml_str(&contents)
    }

    /// Resolve the full layering. An explicit `path` wins over `LEDGER_CONFIG`.
    pub fn resolve(path: Option<&Path>) -> Result<Settings> {
        let mut settings = match path {
            Some(path) => Settings::load(path)?,
            None => match env::var(CONFIG_PATH_KEY) {
                Ok(path) => Settings::load(path)?,
                Err(_) => Settings::default(),
            },
        };
        settings.apply_overrides(|key| env::var(key).ok())?;
        Ok(settings)
    }

    /// Apply `NODE_ADDRESS`-style overrides looked up through `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(addr) = lookup(NODE_ADDRESS_KEY) {
            self.node_addr = addr;
        }
        if let Some(capacity) = lookup(QUEUE_CAPACITY_KEY) {
            self.queue_capacity = capacity.trim().parse().map_err(|_| {
                LedgerError::Config(format!(
                    "Invalid {QUEUE_CAPACITY_KEY}: {capacity}. Expected a positive integer"
                ))
            })?;
        }
        if let Some(policy) = lookup(SPEND_POLICY_KEY) {
            self.spend_policy = policy.parse()?;
        }
        if let Some(level) = lookup(LOG_LEVEL_KEY) {
            self.log_level = level;
        }
        self.validate()
    }

    fn validate(&self) -> Result<()> {
        if self.queue_capacity == 0 {
            return Err(LedgerError::Config(
                "queue_capacity must be at least 1".to_string(),
            ));
        }
        if self.node_addr.trim().is_empty() {
            return Err(LedgerError::Config("node_addr must not be empty".to_string()));
        }
        Ok(())
    }
}

pub struct Config {
    inner: RwLock<Settings>,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    /// Settings from the environment. The binary resolves settings itself and
    /// reports errors; here a bad environment falls back to defaults.
    pub fn new() -> Config {
        Config {
            inner: RwLock::new(Settings::resolve(None).unwrap_or_default()),
        }
    }

    pub fn replace(&self, settings: Settings) {
        *self.inner.write() = settings;
    }

    pub fn get_settings(&self) -> Settings {
        self.inner.read().clone()
    }

    pub fn get_node_addr(&self) -> String {
        self.inner.read().node_addr.clone()
    }

    pub fn set_node_addr(&self, addr: String) {
        self.inner.write().node_addr = addr;
    }

    pub fn get_queue_capacity(&self) -> usize {
        self.inner.read().queue_capacity
    }

    pub fn set_queue_capacity(&self, capacity: usize) -> Result<()> {
        if capacity == 0 {
            return Err(LedgerError::Config(
                "queue_capacity must be at least 1".to_string(),
            ));
        }
        self.inner.write().queue_capacity = capacity;
        Ok(())
    }

    pub fn get_spend_policy(&self) -> SpendPolicy {
        self.inner.read().spend_policy
    }

    pub fn set_spend_policy(&self, policy: SpendPolicy) {
        self.inner.write().spend_policy = policy;
    }

    pub fn get_log_level(&self) -> String {
        self.inner.read().log_level.clone()
    }
}
