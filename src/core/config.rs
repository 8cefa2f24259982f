use crate::core::error::BuildError;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::de::{Deserializer, MapAccess, Visitor};
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use std::{fmt, fs, path::PathBuf};
use tracing::debug;

pub const DEFAULT_CACHE_KEY_PREFIX: &str = "rateswap-";

/// Parameters of an enabled service, as written in the configuration.
pub type Params = Mapping;

/// A configured service value, decoded once from whatever YAML was written.
#[derive(Debug, Clone, PartialEq)]
pub enum ServiceEntry {
    Disabled,
    Enabled,
    EnabledWithParams(Params),
}

impl ServiceEntry {
    /// Decodes a raw configuration value.
    ///
    /// Anything that is neither a boolean nor a mapping counts as enabled with
    /// no parameters, except for `array` whose sequence form
    /// `[latest, historical]` is folded into a single rate table.
    pub fn from_value(name: &str, value: Value) -> Self {
        match value {
            Value::Bool(false) => ServiceEntry::Disabled,
            Value::Bool(true) => ServiceEntry::Enabled,
            Value::Mapping(params) => ServiceEntry::EnabledWithParams(params),
            Value::Sequence(tables) if name == "array" => {
                let mut merged = Mapping::new();
                for table in tables {
                    if let Value::Mapping(table) = table {
                        merged.extend(table);
                    }
                }
                ServiceEntry::EnabledWithParams(merged)
            }
            Value::Tagged(tagged) => ServiceEntry::from_value(name, tagged.value),
            _ => ServiceEntry::Enabled,
        }
    }

    pub fn is_enabled(&self) -> bool {
        !matches!(self, ServiceEntry::Disabled)
    }

    pub fn params(&self) -> Option<&Params> {
        match self {
            ServiceEntry::EnabledWithParams(params) => Some(params),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServiceSpec {
    pub name: String,
    pub entry: ServiceEntry,
}

impl ServiceSpec {
    pub fn new(name: &str, entry: ServiceEntry) -> Self {
        ServiceSpec {
            name: name.to_string(),
            entry,
        }
    }
}

/// Services in the order they were written; that order is the fallback order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServiceList(pub Vec<ServiceSpec>);

impl ServiceList {
    pub fn iter(&self) -> impl Iterator<Item = &ServiceSpec> {
        self.0.iter()
    }

    pub fn enabled(&self) -> impl Iterator<Item = &ServiceSpec> {
        self.0.iter().filter(|spec| spec.entry.is_enabled())
    }

    pub fn get(&self, name: &str) -> Option<&ServiceSpec> {
        self.0.iter().find(|spec| spec.name == name)
    }
}

impl<'de> Deserialize<'de> for ServiceList {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct ServiceListVisitor;

        impl<'de> Visitor<'de> for ServiceListVisitor {
            type Value = ServiceList;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a mapping of service names to their configuration")
            }

            fn visit_unit<E>(self) -> Result<ServiceList, E> {
                Ok(ServiceList::default())
            }

            fn visit_map<A>(self, mut map: A) -> Result<ServiceList, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut specs: Vec<ServiceSpec> = Vec::new();
                while let Some((name, value)) = map.next_entry::<String, Value>()? {
                    if specs.iter().any(|spec| spec.name == name) {
                        return Err(serde::de::Error::custom(format!(
                            "duplicate service \"{name}\""
                        )));
                    }
                    let entry = ServiceEntry::from_value(&name, value);
                    specs.push(ServiceSpec { name, entry });
                }
                Ok(ServiceList(specs))
            }
        }

        deserializer.deserialize_any(ServiceListVisitor)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct SwapOptions {
    /// Seconds; `0` or absent leaves expiry to the cache store.
    pub cache_ttl: Option<i64>,
    pub cache_key_prefix: Option<String>,
    /// Default expiry in seconds of the on-disk store used by the CLI.
    pub disk_cache_ttl: Option<u64>,
}

impl SwapOptions {
    pub fn cache_key_prefix(&self) -> &str {
        self.cache_key_prefix
            .as_deref()
            .unwrap_or(DEFAULT_CACHE_KEY_PREFIX)
    }
}

/// The cache store a configuration points at.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheRef {
    pub store: String,
    /// Overrides `options.cache_ttl` when set.
    pub ttl: Option<i64>,
}

impl CacheRef {
    /// Accepts a store name or a `{type: illuminate, store, ttl}` mapping.
    /// `null` and `false` turn caching off.
    pub fn from_value(value: &Value) -> Result<Option<Self>, BuildError> {
        match value {
            Value::Null | Value::Bool(false) => Ok(None),
            Value::String(store) => Ok(Some(CacheRef {
                store: store.clone(),
                ttl: None,
            })),
            Value::Mapping(map) => {
                match map.get("type") {
                    None => {}
                    Some(Value::String(kind)) if kind == "illuminate" => {}
                    Some(kind) => {
                        return Err(invalid_cache(
                            kind,
                            format!("unknown cache type {}", render(kind)),
                        ));
                    }
                }
                let store = match map.get("store") {
                    Some(Value::String(store)) => store.clone(),
                    Some(other) => return Err(invalid_cache(other, "store must be a name")),
                    None => return Err(invalid_cache(value, "missing store")),
                };
                let ttl = match map.get("ttl") {
                    None | Some(Value::Null) => None,
                    Some(ttl) => Some(
                        ttl.as_i64()
                            .ok_or_else(|| invalid_cache(ttl, "ttl must be an integer"))?,
                    ),
                };
                Ok(Some(CacheRef { store, ttl }))
            }
            Value::Tagged(tagged) => CacheRef::from_value(&tagged.value),
            other => Err(invalid_cache(
                other,
                "expected a store name or a mapping with a store",
            )),
        }
    }
}

fn invalid_cache(value: &Value, reason: impl Into<String>) -> BuildError {
    BuildError::InvalidCacheConfiguration {
        name: render(value),
        reason: reason.into(),
    }
}

fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim().replace('\n', ", "))
            .unwrap_or_else(|_| format!("{other:?}")),
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct SwapConfig {
    #[serde(default)]
    pub options: SwapOptions,
    #[serde(default)]
    pub services: ServiceList,
    pub http_client: Option<String>,
    pub request_factory: Option<String>,
    /// Store name or cache mapping, see [`CacheRef`].
    pub cache: Option<Value>,
    /// Older spelling of `cache`; ignored when `cache` is present.
    pub cache_item_pool: Option<Value>,
    pub data_path: Option<String>,
}

impl SwapConfig {
    pub fn cache_ref(&self) -> Result<Option<CacheRef>, BuildError> {
        match self.cache.as_ref().or(self.cache_item_pool.as_ref()) {
            Some(value) => CacheRef::from_value(value),
            None => Ok(None),
        }
    }

    /// TTL in seconds for cached rates: the cache's own `ttl`, else
    /// `options.cache_ttl`.
    pub fn cache_ttl(&self, cache: &CacheRef) -> Option<i64> {
        cache.ttl.or(self.options.cache_ttl)
    }

    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("in", "rateswap", "rateswap")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn default_data_path(&self) -> Result<PathBuf> {
        if let Some(custom_path) = &self.data_path {
            return Ok(PathBuf::from(custom_path));
        }
        let proj_dirs = ProjectDirs::from("in", "rateswap", "rateswap")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.data_dir().to_path_buf())
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config = Self::from_yaml(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }
}
