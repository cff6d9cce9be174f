//! Layered suite configuration
//!
//! Two layers feed every lookup: an override layer built from
//! invocation-time `key=value` pairs, and a file-default layer read from a
//! TOML file. The override layer always wins. [`Settings::resolve`] turns
//! the layers into the immutable value the rest of the suite reads.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::debug;

use crate::error::{ConfigError, ConfigResult};

/// Setting names understood by [`Settings::resolve`]
pub mod keys {
    pub const BASE_URL: &str = "base.url";
    pub const HEADLESS: &str = "headless";
    pub const IMPLICIT_WAIT: &str = "implicit.wait";
    pub const EXPLICIT_WAIT: &str = "explicit.wait";
    pub const PAGE_LOAD_TIMEOUT: &str = "page.load.timeout";
    pub const MAXIMIZE_WINDOW: &str = "maximize.window";
    pub const SCREENSHOT_ON_FAILURE: &str = "screenshot.on.failure";
    pub const RESULTS_DIR: &str = "results.dir";
}

/// Key/value settings merged from an override layer and a file-default layer
#[derive(Debug, Clone, Default)]
pub struct ConfigSource {
    /// Invocation-time values
    overrides: BTreeMap<String, String>,

    /// Values read from the config file
    defaults: BTreeMap<String, String>,

    /// File the defaults came from
    origin: Option<PathBuf>,
}

impl ConfigSource {
    /// Build a source directly from both layers
    pub fn from_layers(
        defaults: impl IntoIterator<Item = (String, String)>,
        overrides: impl IntoIterator<Item = (String, String)>,
    ) -> Self {
        Self {
            overrides: overrides.into_iter().collect(),
            defaults: defaults.into_iter().collect(),
            origin: None,
        }
    }

    /// Load the file-default layer from `path` and apply `overrides` on top.
    ///
    /// Fails immediately if the file cannot be read or parsed.
    pub fn load(
        path: &Path,
        overrides: impl IntoIterator<Item = (String, String)>,
    ) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;
        let defaults = parse_toml(&content).map_err(|e| match e {
            ParseFailure::Syntax(source) => ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            },
            ParseFailure::Config(e) => e,
        })?;

        debug!("Loaded {} default setting(s) from {}", defaults.len(), path.display());

        Ok(Self {
            overrides: overrides.into_iter().collect(),
            defaults,
            origin: Some(path.to_path_buf()),
        })
    }

    /// Parse `key=value` pairs into an override layer
    pub fn parse_overrides<I, S>(pairs: I) -> ConfigResult<BTreeMap<String, String>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut out = BTreeMap::new();
        for pair in pairs {
            let pair = pair.as_ref();
            let (key, value) = pair
                .split_once('=')
                .ok_or_else(|| ConfigError::BadOverride(pair.to_string()))?;
            let key = key.trim();
            if key.is_empty() {
                return Err(ConfigError::BadOverride(pair.to_string()));
            }
            out.insert(key.to_string(), value.trim().to_string());
        }
        Ok(out)
    }

    /// File the default layer was read from, if any
    pub fn origin(&self) -> Option<&Path> {
        self.origin.as_deref()
    }

    /// Resolve `key`: override layer, then file defaults, then `default`.
    ///
    /// Blank values count as unset. A `required` key that resolves to
    /// nothing is an error; otherwise a missing key yields `default`.
    pub fn get(
        &self,
        key: &str,
        required: bool,
        default: Option<&str>,
    ) -> ConfigResult<Option<String>> {
        let found = [&self.overrides, &self.defaults]
            .into_iter()
            .filter_map(|layer| layer.get(key))
            .find(|value| !value.trim().is_empty());

        match found {
            Some(value) => Ok(Some(value.clone())),
            None if required => Err(ConfigError::Missing {
                key: key.to_string(),
            }),
            None => Ok(default.map(str::to_string)),
        }
    }

    /// Resolve a key that must be present
    pub fn require(&self, key: &str) -> ConfigResult<String> {
        self.get(key, true, None)?.ok_or_else(|| ConfigError::Missing {
            key: key.to_string(),
        })
    }

    /// Resolve an optional string key
    pub fn get_or(&self, key: &str, default: &str) -> ConfigResult<String> {
        Ok(self
            .get(key, false, Some(default))?
            .unwrap_or_else(|| default.to_string()))
    }

    /// Resolve an optional boolean key (`true`/`false`, case-insensitive)
    pub fn get_bool(&self, key: &str, default: bool) -> ConfigResult<bool> {
        match self.get(key, false, None)? {
            Some(raw) => raw
                .trim()
                .to_ascii_lowercase()
                .parse::<bool>()
                .map_err(|_| invalid(key, raw, "true or false")),
            None => Ok(default),
        }
    }

    /// Resolve an optional integer key
    pub fn get_int(&self, key: &str, default: i64) -> ConfigResult<i64> {
        match self.get(key, false, None)? {
            Some(raw) => raw
                .trim()
                .parse::<i64>()
                .map_err(|_| invalid(key, raw, "an integer")),
            None => Ok(default),
        }
    }

    /// Resolve an optional duration key given in whole seconds
    pub fn get_duration(&self, key: &str, default: Duration) -> ConfigResult<Duration> {
        match self.get(key, false, None)? {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| invalid(key, raw, "a whole number of seconds")),
            None => Ok(default),
        }
    }
}

fn invalid(key: &str, value: String, expected: &'static str) -> ConfigError {
    ConfigError::Invalid {
        key: key.to_string(),
        value,
        expected,
    }
}

enum ParseFailure {
    Syntax(toml::de::Error),
    Config(ConfigError),
}

fn parse_toml(content: &str) -> Result<BTreeMap<String, String>, ParseFailure> {
    let table = content.parse::<toml::Table>().map_err(ParseFailure::Syntax)?;
    let mut out = BTreeMap::new();
    flatten("", &table, &mut out).map_err(ParseFailure::Config)?;
    Ok(out)
}

/// Flatten nested tables into dotted keys
fn flatten(
    prefix: &str,
    table: &toml::Table,
    out: &mut BTreeMap<String, String>,
) -> ConfigResult<()> {
    for (name, value) in table {
        let key = if prefix.is_empty() {
            name.clone()
        } else {
            format!("{}.{}", prefix, name)
        };

        let scalar = match value {
            toml::Value::Table(inner) => {
                flatten(&key, inner, out)?;
                continue;
            }
            toml::Value::String(s) => s.clone(),
            toml::Value::Integer(i) => i.to_string(),
            toml::Value::Float(f) => f.to_string(),
            toml::Value::Boolean(b) => b.to_string(),
            toml::Value::Array(_) => {
                return Err(ConfigError::Unsupported { key, kind: "array" })
            }
            toml::Value::Datetime(_) => {
                return Err(ConfigError::Unsupported {
                    key,
                    kind: "datetime",
                })
            }
        };
        out.insert(key, scalar);
    }
    Ok(())
}

/// Resolved, read-only suite settings
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Application entry point every test navigates to
    pub base_url: String,

    /// Run the browser without a window
    pub headless: bool,

    /// Bound on each element lookup
    pub implicit_wait: Duration,

    /// Bound on each explicit page-object wait
    pub explicit_wait: Duration,

    /// Bound on each navigation
    pub page_load_timeout: Duration,

    /// Maximize windowed browsers (ignored when headless)
    pub maximize_window: bool,

    /// Attach a screenshot when a test fails
    pub screenshot_on_failure: bool,

    /// Directory the report generator reads
    pub results_dir: PathBuf,
}

impl Settings {
    pub const DEFAULT_IMPLICIT_WAIT: Duration = Duration::from_secs(5);
    pub const DEFAULT_EXPLICIT_WAIT: Duration = Duration::from_secs(15);
    pub const DEFAULT_PAGE_LOAD_TIMEOUT: Duration = Duration::from_secs(30);
    pub const DEFAULT_RESULTS_DIR: &'static str = "target/allure-results";

    /// Resolve every known key once.
    ///
    /// Fails on the first missing required key or unparsable value.
    pub fn resolve(source: &ConfigSource) -> ConfigResult<Self> {
        let settings = Self {
            base_url: source.require(keys::BASE_URL)?,
            headless: source.get_bool(keys::HEADLESS, true)?,
            implicit_wait: source.get_duration(keys::IMPLICIT_WAIT, Self::DEFAULT_IMPLICIT_WAIT)?,
            explicit_wait: source.get_duration(keys::EXPLICIT_WAIT, Self::DEFAULT_EXPLICIT_WAIT)?,
            page_load_timeout: source
                .get_duration(keys::PAGE_LOAD_TIMEOUT, Self::DEFAULT_PAGE_LOAD_TIMEOUT)?,
            maximize_window: source.get_bool(keys::MAXIMIZE_WINDOW, true)?,
            screenshot_on_failure: source.get_bool(keys::SCREENSHOT_ON_FAILURE, true)?,
            results_dir: PathBuf::from(
                source.get_or(keys::RESULTS_DIR, Self::DEFAULT_RESULTS_DIR)?,
            ),
        };

        debug!(?settings, "Resolved settings");
        Ok(settings)
    }
}
