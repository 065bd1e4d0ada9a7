//! Loader for workspace configuration with YAML + environment overlays.
//!
//! Sources are merged in order: YAML files or inline snippets first, then
//! `BYTESIZE__`-prefixed environment variables (`BYTESIZE__RESOLVER__MAX_ITEMS=7`).
//! String values are expanded for `${VAR}` placeholders after merging.
//!
//! The `resolver.strategies` list is ordered: the resolver tries strategies in the
//! order they appear here, then falls back to the synthetic backstop.
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;

pub use bytesize_common::{DEFAULT_MAX_ITEMS, MAX_ITEMS_LIMIT};

/// Configuration used by the `bytesize` binary when no file is supplied.
pub const DEFAULT_CONFIG_YAML: &str = r#"
version: "1"
resolver:
  max_items: 5
  strategies:
    - id: twitter
      kind: twitter_api
      config:
        auth_token: "${TWITTER_BEARER_TOKEN}"
        timeout_secs: 10
    - id: twint
      kind: mirror
      config:
        base_url: "https://twintapp.vercel.app"
    - id: nitter
      kind: nitter
      config:
        instances:
          - "https://nitter.net"
          - "https://nitter.privacydev.net"
"#;

#[derive(Debug, Deserialize)]
pub struct BytesizeConfig {
    pub version: Option<String>,
    #[serde(default)]
    pub resolver: ResolverConfig,
}

#[derive(Debug, Deserialize)]
pub struct ResolverConfig {
    #[serde(default = "default_max_items")]
    pub max_items: usize,
    /// Topics rotated through by synthetic placeholder items.
    #[serde(default)]
    pub synthetic_topics: Vec<String>,
    #[serde(default)]
    pub strategies: Vec<StrategySpec>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            max_items: DEFAULT_MAX_ITEMS,
            synthetic_topics: Vec::new(),
            strategies: Vec::new(),
        }
    }
}

/// Shared fields + the per-kind details.
#[derive(Debug, Deserialize)]
pub struct StrategySpec {
    pub id: String,
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(flatten)]
    pub details: StrategyDetails,
}

impl StrategySpec {
    pub fn is_enabled(&self) -> bool {
        self.enabled.unwrap_or(true)
    }
}

/// The tag is `kind`; the payload lives in `config`.
#[derive(Debug, Deserialize)]
#[serde(tag = "kind")]
pub enum StrategyDetails {
    #[serde(rename = "twitter_api")]
    TwitterApi { config: TwitterApiConfig },

    #[serde(rename = "mirror")]
    Mirror { config: MirrorConfig },

    #[serde(rename = "nitter")]
    Nitter { config: NitterConfig },
}

impl StrategyDetails {
    pub fn timeout_secs(&self) -> Option<u64> {
        match self {
            StrategyDetails::TwitterApi { config } => config.timeout_secs,
            StrategyDetails::Mirror { config } => config.timeout_secs,
            StrategyDetails::Nitter { config } => config.timeout_secs,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct TwitterApiConfig {
    pub auth_token: String,
    #[serde(default = "default_twitter_endpoint")]
    pub endpoint: String,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub retries: Option<usize>,
}

impl TwitterApiConfig {
    /// False when the token is blank or still holds an unexpanded `${VAR}`.
    pub fn has_token(&self) -> bool {
        let token = self.auth_token.trim();
        !token.is_empty() && !token.contains("${")
    }
}

#[derive(Debug, Deserialize)]
pub struct MirrorConfig {
    pub base_url: String,
    #[serde(default = "default_mirror_path")]
    pub path: String,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub retries: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct NitterConfig {
    pub instances: Vec<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub retries: Option<usize>,
}

fn default_max_items() -> usize {
    DEFAULT_MAX_ITEMS
}
fn default_twitter_endpoint() -> String {
    "https://api.twitter.com".into()
}
fn default_mirror_path() -> String {
    "api/twint".into()
}

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) => {
            if s.contains('$') {
                let mut cur = std::mem::take(s);
                for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
                    let expanded = match shellexpand::env(&cur) {
                        Ok(cow) => cow.into_owned(),
                        Err(_) => cur.clone(),
                    };
                    if expanded == cur {
                        break;
                    }
                    cur = expanded;
                }
                *s = cur;
            }
        }
        Value::Array(arr) => arr.iter_mut().for_each(expand_env_in_value),
        Value::Object(obj) => obj.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

fn validate(cfg: &BytesizeConfig) -> Result<(), ConfigError> {
    let max = cfg.resolver.max_items;
    if max == 0 || max > MAX_ITEMS_LIMIT {
        return Err(ConfigError::Message(format!(
            "resolver.max_items must be between 1 and {MAX_ITEMS_LIMIT}, got {max}"
        )));
    }
    for spec in &cfg.resolver.strategies {
        if spec.details.timeout_secs() == Some(0) {
            return Err(ConfigError::Message(format!(
                "strategy '{}' has timeout_secs 0; omit it for the default or use at least 1",
                spec.id
            )));
        }
        if let StrategyDetails::Nitter { config } = &spec.details {
            if config.instances.is_empty() {
                return Err(ConfigError::Message(format!(
                    "strategy '{}' lists no nitter instances",
                    spec.id
                )));
            }
        }
    }
    Ok(())
}

/// Builder hides the `config` crate wiring (YAML + env overrides).
pub struct BytesizeConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
}

impl Default for BytesizeConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl BytesizeConfigLoader {
    /// Start with `BYTESIZE__` env overrides; add files or snippets before loading.
    ///
    /// ```
    /// use bytesize_config::BytesizeConfigLoader;
    ///
    /// let config = BytesizeConfigLoader::new()
    ///     .with_yaml_str("version: '1'")
    ///     .load()
    ///     .expect("valid config");
    ///
    /// assert_eq!(config.version.as_deref(), Some("1"));
    /// assert_eq!(config.resolver.max_items, 5);
    /// assert!(config.resolver.strategies.is_empty());
    /// ```
    pub fn new() -> Self {
        Self {
            builder: Config::builder(),
        }
    }

    /// Attach a required YAML/TOML/JSON file; the `config` crate infers format by suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Attach a file that may be absent, so deployments can rely on env vars alone.
    pub fn with_optional_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(false));
        self
    }

    /// Merge an inline YAML snippet.
    ///
    /// ```
    /// use bytesize_config::{BytesizeConfigLoader, StrategyDetails};
    ///
    /// let cfg = BytesizeConfigLoader::new()
    ///     .with_yaml_str(
    ///         r#"
    /// resolver:
    ///   max_items: 3
    ///   strategies:
    ///     - id: "mirror"
    ///       kind: "mirror"
    ///       config:
    ///         base_url: "https://mirror.example.com"
    /// "#,
    ///     )
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(cfg.resolver.max_items, 3);
    /// match &cfg.resolver.strategies[0].details {
    ///     StrategyDetails::Mirror { config } => assert_eq!(config.path, "api/twint"),
    ///     other => panic!("unexpected strategy {other:?}"),
    /// }
    /// ```
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(yaml, config::FileFormat::Yaml));
        self
    }

    /// Merge env overrides, expand `${VAR}` placeholders, deserialize and validate.
    pub fn load(self) -> Result<BytesizeConfig, ConfigError> {
        let cfg = self
            .builder
            .add_source(
                Environment::with_prefix("BYTESIZE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut v: Value = cfg.try_deserialize()?;
        expand_env_in_value(&mut v);

        let typed: BytesizeConfig =
            serde_json::from_value(v).map_err(|e| ConfigError::Message(e.to_string()))?;
        validate(&typed)?;
        Ok(typed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn expands_in_array_and_object() {
        temp_env::with_vars([("BS_CITY", Some("Winston")), ("BS_STATE", Some("NC"))], || {
            let mut v = json!([
                "hello-$BS_CITY",
                { "loc": "${BS_CITY}-${BS_STATE}" },
                42,
                null
            ]);
            expand_env_in_value(&mut v);
            assert_eq!(v, json!(["hello-Winston", { "loc": "Winston-NC" }, 42, null]));
        });
    }

    #[test]
    fn expands_recursively_across_env_values() {
        temp_env::with_vars(
            [
                ("BS_BAZ", Some("qux")),
                ("BS_BAR", Some("mid-${BS_BAZ}")),
                ("BS_FOO", Some("start-${BS_BAR}-end")),
            ],
            || {
                let mut v = json!("X=${BS_FOO}");
                expand_env_in_value(&mut v);
                assert_eq!(v, json!("X=start-mid-qux-end"));
            },
        );
    }

    #[test]
    fn stops_on_cycles() {
        temp_env::with_vars([("BS_A", Some("${BS_B}")), ("BS_B", Some("${BS_A}"))], || {
            let mut v = json!("x=${BS_A}-y");
            expand_env_in_value(&mut v);
            let s = v.as_str().unwrap();
            assert!(s.starts_with("x=") && s.ends_with("-y"));
            assert!(s.contains("${"));
        });
    }

    #[test]
    fn unknown_vars_are_left_as_is() {
        let mut v = json!("hi-${BS_DOES_NOT_EXIST}");
        expand_env_in_value(&mut v);
        assert_eq!(v, json!("hi-${BS_DOES_NOT_EXIST}"));
    }

    #[test]
    fn unexpanded_token_counts_as_missing() {
        let cfg = TwitterApiConfig {
            auth_token: "${BS_NOT_SET}".into(),
            endpoint: default_twitter_endpoint(),
            timeout_secs: None,
            retries: None,
        };
        assert!(!cfg.has_token());
    }

    #[test]
    fn rejects_zero_max_items() {
        let err = BytesizeConfigLoader::new()
            .with_yaml_str("resolver:\n  max_items: 0\n")
            .load()
            .unwrap_err();
        assert!(err.to_string().contains("max_items"));
    }

    #[test]
    fn max_items_bounds_match_the_resolver_limit() {
        let over = format!("resolver:\n  max_items: {}\n", MAX_ITEMS_LIMIT + 1);
        assert!(BytesizeConfigLoader::new().with_yaml_str(&over).load().is_err());

        let at = format!("resolver:\n  max_items: {MAX_ITEMS_LIMIT}\n");
        let cfg = BytesizeConfigLoader::new().with_yaml_str(&at).load().unwrap();
        assert_eq!(cfg.resolver.max_items, bytesize_common::MAX_ITEMS_LIMIT);
    }

    #[test]
    fn rejects_zero_strategy_timeout() {
        let err = BytesizeConfigLoader::new()
            .with_yaml_str(
                "resolver:\n  strategies:\n    - id: twint\n      kind: mirror\n      config:\n        base_url: \"https://mirror.example.com\"\n        timeout_secs: 0\n",
            )
            .load()
            .unwrap_err();
        assert!(err.to_string().contains("timeout_secs 0"));
    }

    #[test]
    fn rejects_nitter_without_instances() {
        let err = BytesizeConfigLoader::new()
            .with_yaml_str(
                "resolver:\n  strategies:\n    - id: n\n      kind: nitter\n      config:\n        instances: []\n",
            )
            .load()
            .unwrap_err();
        assert!(err.to_string().contains("no nitter instances"));
    }

    #[test]
    fn default_yaml_parses() {
        temp_env::with_var("TWITTER_BEARER_TOKEN", None::<&str>, || {
            let cfg = BytesizeConfigLoader::new()
                .with_yaml_str(DEFAULT_CONFIG_YAML)
                .load()
                .unwrap();
            assert_eq!(cfg.resolver.strategies.len(), 3);
            assert_eq!(cfg.resolver.strategies[0].id, "twitter");
        });
    }
}
