use std::collections::{BTreeMap, HashMap, HashSet};

use serde::Deserialize;
use tracing::debug;

// -----------------------------------------------------------------------------
// Raw (host-facing) configuration
// -----------------------------------------------------------------------------

/// Plugin options exactly as the host passes them (`jsc.experimental.plugins`).
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub functions: Option<Vec<String>>,
    #[serde(default)]
    pub methods: Option<BTreeMap<String, Vec<String>>>,
    #[serde(default)]
    pub dynamic_imports: Option<Vec<String>>,
    /// Legacy shape: receivers sharing the `functions` set.
    #[serde(default)]
    pub objects: Option<Vec<String>>,
    #[serde(default)]
    pub global_aliases: Option<Vec<String>>,
    #[serde(default)]
    pub mode: Option<OutputMode>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("no plugin configuration was provided")]
    Missing,
    #[error("invalid plugin configuration: {0}")]
    Json(#[from] serde_json::Error),
}

// -----------------------------------------------------------------------------
// Resolved ruleset
// -----------------------------------------------------------------------------

pub const DEFAULT_GLOBAL_ALIASES: &[&str] = &["window", "globalThis", "self", "global"];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// Collect every match and embed one ledger comment at the top of the file.
    Ledger,
    /// Annotate each matched call's string first argument in place.
    Inline,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ReceiverKey {
    This,
    GlobalAlias(String),
    Named(String),
}

impl ReceiverKey {
    /// Text written into ledger records for this receiver.
    pub fn tag(&self) -> &str {
        match self {
            ReceiverKey::This => "this",
            ReceiverKey::GlobalAlias(name) | ReceiverKey::Named(name) => name,
        }
    }
}

/// Immutable matching rules for one transform invocation.
#[derive(Clone, Debug)]
pub struct PatternConfig {
    pub title: String,
    pub function_names: HashSet<String>,
    pub receiver_methods: HashMap<ReceiverKey, HashSet<String>>,
    /// Receivers that came from the legacy `objects` list.
    pub legacy_receivers: HashSet<ReceiverKey>,
    pub dynamic_import_keys: HashSet<String>,
    pub mode: OutputMode,
}

impl PatternConfig {
    pub fn from_json(input: &str) -> Result<Self, ConfigError> {
        let config = serde_json::from_str::<Option<Config>>(input)?.ok_or(ConfigError::Missing)?;
        Self::from_config(config)
    }

    pub fn from_config(config: Config) -> Result<Self, ConfigError> {
        let title = config.title.unwrap_or_default();
        let functions = named("functions", config.functions.unwrap_or_default());
        let methods: BTreeMap<String, Vec<String>> = config
            .methods
            .unwrap_or_default()
            .into_iter()
            .filter(|(receiver, _)| {
                let keep = !receiver.is_empty();
                if !keep {
                    debug!("ignoring empty receiver in `methods`");
                }
                keep
            })
            .map(|(receiver, names)| (receiver, named("methods", names)))
            .collect();
        let dynamic_imports = named("dynamicImports", config.dynamic_imports.unwrap_or_default());
        let objects = named("objects", config.objects.unwrap_or_default());

        let aliases: HashSet<String> = match config.global_aliases {
            Some(aliases) => aliases.into_iter().collect(),
            None => DEFAULT_GLOBAL_ALIASES.iter().map(|s| s.to_string()).collect(),
        };
        let receiver_key = |name: &str| {
            if name == "this" {
                ReceiverKey::This
            } else if aliases.contains(name) {
                ReceiverKey::GlobalAlias(name.to_string())
            } else {
                ReceiverKey::Named(name.to_string())
            }
        };

        // Only the primary shape decides the mode; `objects` alone keeps a
        // legacy config inline.
        let mode = config.mode.unwrap_or(if !methods.is_empty() || !dynamic_imports.is_empty() {
            OutputMode::Ledger
        } else {
            OutputMode::Inline
        });

        let function_names: HashSet<String> = functions.into_iter().collect();
        let mut receiver_methods: HashMap<ReceiverKey, HashSet<String>> = HashMap::new();
        for (receiver, names) in methods {
            receiver_methods
                .entry(receiver_key(&receiver))
                .or_default()
                .extend(names);
        }
        let mut legacy_receivers = HashSet::new();
        for object in objects {
            let key = receiver_key(&object);
            receiver_methods
                .entry(key.clone())
                .or_default()
                .extend(function_names.iter().cloned());
            legacy_receivers.insert(key);
        }
        receiver_methods.retain(|_, names| !names.is_empty());
        legacy_receivers.retain(|key| receiver_methods.contains_key(key));

        let config = Self {
            title,
            function_names,
            receiver_methods,
            legacy_receivers,
            dynamic_import_keys: dynamic_imports.into_iter().collect(),
            mode,
        };
        debug!(
            title = %config.title,
            mode = ?config.mode,
            functions = config.function_names.len(),
            receivers = config.receiver_methods.len(),
            dynamic_imports = config.dynamic_import_keys.len(),
            "mark-expressions configuration loaded"
        );
        Ok(config)
    }

    pub fn is_function(&self, name: &str) -> bool {
        self.function_names.contains(name)
    }

    pub fn has_method(&self, receiver: &ReceiverKey, method: &str) -> bool {
        self.receiver_methods
            .get(receiver)
            .map_or(false, |methods| methods.contains(method))
    }

    /// The configured alias or named-object key whose text is `name`.
    pub fn receiver_named(&self, name: &str) -> Option<ReceiverKey> {
        let alias = ReceiverKey::GlobalAlias(name.to_string());
        if self.receiver_methods.contains_key(&alias) {
            return Some(alias);
        }
        let named = ReceiverKey::Named(name.to_string());
        self.receiver_methods.contains_key(&named).then_some(named)
    }

    pub fn gates_imports(&self) -> bool {
        !self.dynamic_import_keys.is_empty()
    }

    pub fn is_legacy_receiver(&self, receiver: &ReceiverKey) -> bool {
        self.legacy_receivers.contains(receiver)
    }
}

/// An empty name can never match a call site, so it is dropped.
fn named(field: &'static str, names: Vec<String>) -> Vec<String> {
    let before = names.len();
    let names: Vec<String> = names.into_iter().filter(|name| !name.is_empty()).collect();
    if names.len() != before {
        debug!(field, dropped = before - names.len(), "ignoring empty names");
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infers_ledger_mode_from_methods_and_imports() {
        let config = PatternConfig::from_json(
            r#"{
                "title": "MARK_EXPRESSIONS",
                "functions": ["markFnA"],
                "methods": {
                    "window": ["markWindowFnA"],
                    "this": ["markThisFnA"],
                    "obj": ["markObjFnA"]
                },
                "dynamicImports": ["shouldMark"]
            }"#,
        )
        .unwrap();

        assert_eq!(config.mode, OutputMode::Ledger);
        assert!(config.is_function("markFnA"));
        assert!(config.has_method(&ReceiverKey::This, "markThisFnA"));
        assert_eq!(
            config.receiver_named("window"),
            Some(ReceiverKey::GlobalAlias("window".into()))
        );
        assert_eq!(
            config.receiver_named("obj"),
            Some(ReceiverKey::Named("obj".into()))
        );
        assert_eq!(config.receiver_named("other"), None);
        assert!(config.gates_imports());
    }

    #[test]
    fn functions_only_is_inline() {
        let config = PatternConfig::from_json(r#"{"title": "marked", "functions": ["markedFunction"]}"#)
            .unwrap();
        assert_eq!(config.mode, OutputMode::Inline);
        assert!(config.receiver_methods.is_empty());
    }

    #[test]
    fn explicit_mode_wins_over_inference() {
        let config =
            PatternConfig::from_json(r#"{"functions": ["f"], "mode": "ledger"}"#).unwrap();
        assert_eq!(config.mode, OutputMode::Ledger);
        assert_eq!(config.title, "");

        let config = PatternConfig::from_json(
            r#"{"methods": {"window": ["f"]}, "mode": "inline"}"#,
        )
        .unwrap();
        assert_eq!(config.mode, OutputMode::Inline);
    }

    #[test]
    fn legacy_objects_share_the_function_set() {
        let config = PatternConfig::from_json(
            r#"{"title": "marked", "functions": ["markedFunction", "anotherMarkedFunction"], "objects": ["window", "api"]}"#,
        )
        .unwrap();

        assert_eq!(config.mode, OutputMode::Inline);
        let window = ReceiverKey::GlobalAlias("window".into());
        assert!(config.has_method(&window, "markedFunction"));
        assert!(config.has_method(&window, "anotherMarkedFunction"));
        assert!(config.has_method(&ReceiverKey::Named("api".into()), "markedFunction"));
        assert!(config.is_legacy_receiver(&window));
        assert!(!config.is_legacy_receiver(&ReceiverKey::This));
    }

    #[test]
    fn methods_receivers_are_not_legacy() {
        let config = PatternConfig::from_json(
            r#"{"functions": ["f"], "methods": {"window": ["g"]}, "objects": ["api"]}"#,
        )
        .unwrap();
        assert!(!config.is_legacy_receiver(&ReceiverKey::GlobalAlias("window".into())));
        assert!(config.is_legacy_receiver(&ReceiverKey::Named("api".into())));
    }

    #[test]
    fn empty_names_are_ignored() {
        let config = PatternConfig::from_json(
            r#"{"functions": ["", "f"], "methods": {"": ["g"], "obj": [""]}, "dynamicImports": [""], "objects": [""]}"#,
        )
        .unwrap();
        assert_eq!(config.function_names, HashSet::from(["f".to_string()]));
        assert!(!config.is_function(""));
        assert!(config.receiver_methods.is_empty());
        assert!(config.legacy_receivers.is_empty());
        assert!(!config.gates_imports());
    }

    #[test]
    fn custom_global_aliases() {
        let config = PatternConfig::from_json(
            r#"{"methods": {"window": ["a"], "$w": ["b"]}, "globalAliases": ["$w"]}"#,
        )
        .unwrap();
        assert_eq!(config.receiver_named("$w"), Some(ReceiverKey::GlobalAlias("$w".into())));
        assert_eq!(config.receiver_named("window"), Some(ReceiverKey::Named("window".into())));
    }

    #[test]
    fn rejects_bad_configs() {
        assert!(matches!(PatternConfig::from_json("null"), Err(ConfigError::Missing)));
        assert!(matches!(
            PatternConfig::from_json(r#"{"functions": "markFn"}"#),
            Err(ConfigError::Json(_))
        ));
        assert!(matches!(
            PatternConfig::from_json(r#"{"mode": "both"}"#),
            Err(ConfigError::Json(_))
        ));
    }
}
