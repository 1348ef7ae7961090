use serde::{Deserialize, Serialize};
use tasks::{BoardOptions, Filter, TaskType, notify::DEFAULT_CAPACITY};
use ts_rs::TS;

pub const CURRENT_CONFIG_VERSION: &str = "v1";

pub const DATABASE_URL_ENV: &str = "TASKBOARD_DATABASE_URL";
pub const PORT_ENV: &str = "PORT";
pub const BACKEND_PORT_ENV: &str = "BACKEND_PORT";
pub const HOST_ENV: &str = "HOST";

const DEFAULT_HOST: &str = "127.0.0.1";
const MAX_NOTIFICATION_CAPACITY: usize = 4096;

fn default_bind_host() -> String {
    DEFAULT_HOST.to_string()
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, TS)]
#[serde(default)]
pub struct Config {
    #[serde(alias = "configVersion")]
    pub config_version: String,
    /// `None` selects `db.sqlite` in the asset directory.
    #[serde(alias = "databaseUrl")]
    pub database_url: Option<String>,
    #[serde(alias = "bindHost")]
    pub bind_host: String,
    /// `0` lets the OS pick a free port.
    pub port: u16,
    #[serde(alias = "defaultFilter")]
    pub default_filter: String,
    #[serde(alias = "defaultTaskType")]
    pub default_task_type: String,
    #[serde(alias = "notificationCapacity")]
    pub notification_capacity: usize,
}

impl Config {
    /// Parses a raw config file; anything unreadable yields the defaults.
    pub fn from_raw(raw_config: &str) -> Self {
        match serde_json::from_str::<Config>(raw_config) {
            Ok(config) => config.normalized(),
            Err(e) => {
                tracing::warn!(
                    "Failed to parse config (line {}, column {}): {}, using default",
                    e.line(),
                    e.column(),
                    e
                );
                Self::default()
            }
        }
    }

    pub fn normalized(mut self) -> Self {
        self.config_version = CURRENT_CONFIG_VERSION.to_string();

        if matches!(self.database_url.as_deref(), Some(url) if url.trim().is_empty()) {
            self.database_url = None;
        }

        if self.bind_host.trim().is_empty() {
            self.bind_host = default_bind_host();
        }

        let filter = Filter::from_key(&self.default_filter);
        if filter.to_string() != self.default_filter {
            tracing::warn!(
                "Unknown default filter '{}', using '{}'",
                self.default_filter,
                filter
            );
            self.default_filter = filter.to_string();
        }

        let task_type = TaskType::from_key(&self.default_task_type);
        if task_type.to_string() != self.default_task_type {
            tracing::warn!(
                "Unknown default task type '{}', using '{}'",
                self.default_task_type,
                task_type
            );
            self.default_task_type = task_type.to_string();
        }

        self.notification_capacity = self
            .notification_capacity
            .clamp(1, MAX_NOTIFICATION_CAPACITY);

        self
    }

    /// Applies `TASKBOARD_DATABASE_URL`, `BACKEND_PORT`/`PORT` and `HOST`
    /// as resolved by `lookup`.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let set = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        if let Some(url) = set(DATABASE_URL_ENV) {
            self.database_url = Some(url);
        }

        if let Some(raw) = set(BACKEND_PORT_ENV).or_else(|| set(PORT_ENV)) {
            match raw.parse::<u16>() {
                Ok(port) => self.port = port,
                Err(err) => tracing::warn!(value = %raw, error = %err, "Ignoring invalid port"),
            }
        }

        if let Some(host) = set(HOST_ENV) {
            self.bind_host = host;
        }

        self
    }

    pub fn board_options(&self) -> BoardOptions {
        BoardOptions {
            default_filter: Filter::from_key(&self.default_filter),
            default_task_type: TaskType::from_key(&self.default_task_type),
            notification_capacity: self.notification_capacity,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            config_version: CURRENT_CONFIG_VERSION.to_string(),
            database_url: None,
            bind_host: default_bind_host(),
            port: 0,
            default_filter: Filter::default().to_string(),
            default_task_type: TaskType::default().to_string(),
            notification_capacity: DEFAULT_CAPACITY,
        }
    }
}
