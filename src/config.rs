//! Layered configuration store.
//!
//! Configuration is read from up to three TOML files, lowest precedence first:
//!
//! - Global: `~/.config/rtcounters/config.toml`
//! - Local: `./.rtcounters.toml` in the current directory
//! - File: an explicit path given with `--config`
//!
//! Each file is flattened into `section.subsection.variable` entries, which is
//! the addressing model every query uses. Top-level tables are sections, tables
//! nested one level inside a section are subsections, and any other value is a
//! variable. Arrays expand into one entry per element, so a repeatable key such
//! as `include` can be written either once per layer or as a list.
//!
//! ```toml
//! [counters]
//! include = ["System.Runtime", "Microsoft.AspNetCore.Hosting"]
//! refresh-interval = 2
//!
//! [counters."System.Runtime"]
//! cpu-usage = true
//! working-set = true
//! ```
//!
//! Section and variable names match case-insensitively; subsection names are
//! case-sensitive. Broken files are skipped with a warning rather than failing
//! the command.

use crate::error::{CountersError, Result};
use regex::Regex;
use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use toml::{Table, Value};
use tracing::{debug, warn};

/// The base config directory name under ~/.config/
const CONFIG_DIR_NAME: &str = "rtcounters";

/// The filename for the global configuration file.
const GLOBAL_CONFIG_FILENAME: &str = "config.toml";

/// The filename for the directory-local configuration file.
const LOCAL_CONFIG_FILENAME: &str = ".rtcounters.toml";

/// Where a configuration layer came from, in increasing precedence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConfigScope {
    Global,
    Local,
    File,
}

impl fmt::Display for ConfigScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigScope::Global => write!(f, "global"),
            ConfigScope::Local => write!(f, "local"),
            ConfigScope::File => write!(f, "file"),
        }
    }
}

/// A single `section[.subsection].variable = value` entry.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigEntry {
    pub section: String,
    pub subsection: Option<String>,
    pub variable: String,
    pub value: Value,
}

impl ConfigEntry {
    /// The dotted key, e.g. `counters.System.Runtime.cpu-usage`.
    pub fn key(&self) -> String {
        match &self.subsection {
            Some(sub) => format!("{}.{}.{}", self.section, sub, self.variable),
            None => format!("{}.{}", self.section, self.variable),
        }
    }

    /// The value rendered as a string. Tables and arrays have no string form.
    pub fn value_string(&self) -> Option<String> {
        match &self.value {
            Value::String(s) => Some(s.clone()),
            Value::Integer(i) => Some(i.to_string()),
            Value::Float(f) => Some(f.to_string()),
            Value::Boolean(b) => Some(b.to_string()),
            Value::Datetime(d) => Some(d.to_string()),
            Value::Array(_) | Value::Table(_) => None,
        }
    }

    fn matches(&self, section: &str, subsection: Option<&str>, variable: &str) -> bool {
        self.section.eq_ignore_ascii_case(section)
            && self.subsection.as_deref() == subsection
            && self.variable.eq_ignore_ascii_case(variable)
    }
}

/// The flattened entries of one configuration file.
#[derive(Debug, Clone)]
pub struct ConfigLayer {
    pub scope: ConfigScope,
    pub path: Option<PathBuf>,
    entries: Vec<ConfigEntry>,
    /// `(section, subsection)` pairs declared with no variables.
    empty_subsections: Vec<(String, String)>,
}

impl ConfigLayer {
    /// Parse TOML content into a layer.
    pub fn parse(scope: ConfigScope, path: Option<PathBuf>, content: &str) -> Result<Self> {
        let table: Table = content.parse().map_err(|e: toml::de::Error| match &path {
            Some(p) => CountersError::ConfigParse(p.clone(), e.to_string()),
            None => CountersError::Toml(e),
        })?;

        let (entries, empty_subsections) = flatten(&table);
        Ok(Self {
            scope,
            path,
            entries,
            empty_subsections,
        })
    }

    /// Read and parse a layer from disk. Returns `Ok(None)` if the file does not exist.
    pub fn from_file(scope: ConfigScope, path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(path)?;
        Self::parse(scope, Some(path.to_path_buf()), &content).map(Some)
    }

    pub fn entries(&self) -> &[ConfigEntry] {
        &self.entries
    }
}

fn flatten(table: &Table) -> (Vec<ConfigEntry>, Vec<(String, String)>) {
    let mut entries = Vec::new();
    let mut empty = Vec::new();

    for (section, body) in table {
        let Value::Table(body) = body else {
            warn!("Ignoring top-level key '{}': values must live in a section", section);
            continue;
        };

        for (name, value) in body {
            match value {
                Value::Table(sub) => {
                    if sub.is_empty() {
                        empty.push((section.clone(), name.clone()));
                    }
                    for (variable, value) in sub {
                        if matches!(value, Value::Table(_)) {
                            warn!(
                                "Ignoring '{}.{}.{}': sections nest at most one level",
                                section, name, variable
                            );
                            continue;
                        }
                        push_values(&mut entries, section, Some(name), variable, value);
                    }
                }
                _ => push_values(&mut entries, section, None, name, value),
            }
        }
    }

    (entries, empty)
}

fn push_values(
    entries: &mut Vec<ConfigEntry>,
    section: &str,
    subsection: Option<&str>,
    variable: &str,
    value: &Value,
) {
    let mut push = |value: &Value| {
        entries.push(ConfigEntry {
            section: section.to_string(),
            subsection: subsection.map(str::to_string),
            variable: variable.to_string(),
            value: value.clone(),
        })
    };

    // Only section-level arrays repeat a variable. In a subsection the
    // variable name is the payload, so it appears once whatever its value.
    match value {
        Value::Array(items) if subsection.is_none() => items.iter().for_each(&mut push),
        other => push(other),
    }
}

/// A read-only snapshot of every configuration layer.
///
/// Loaded once at startup and passed by reference to whatever needs it.
/// Queries that return a single value take the highest-precedence entry;
/// `get_all` returns every matching entry, lowest precedence first.
#[derive(Debug, Clone, Default)]
pub struct ConfigStore {
    layers: Vec<ConfigLayer>,
}

impl ConfigStore {
    /// A store with no layers. Every query returns nothing.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a store from already-parsed layers, sorted by scope.
    pub fn from_layers(mut layers: Vec<ConfigLayer>) -> Self {
        layers.sort_by_key(|l| l.scope);
        Self { layers }
    }

    /// Load the global and local layers plus an optional explicit file.
    ///
    /// Missing files are skipped silently; unreadable or invalid ones are
    /// skipped with a warning.
    pub fn load(explicit: Option<&Path>) -> Self {
        let mut candidates = Vec::new();

        match global_config_path() {
            Ok(path) => candidates.push((ConfigScope::Global, path)),
            Err(e) => debug!("Skipping global config: {}", e),
        }
        match local_config_path() {
            Ok(path) => candidates.push((ConfigScope::Local, path)),
            Err(e) => debug!("Skipping local config: {}", e),
        }
        if let Some(path) = explicit {
            if !path.exists() {
                warn!("Config file {:?} does not exist", path);
            }
            candidates.push((ConfigScope::File, path.to_path_buf()));
        }

        let mut layers = Vec::new();
        for (scope, path) in candidates {
            match ConfigLayer::from_file(scope, &path) {
                Ok(Some(layer)) => {
                    debug!(
                        "Loaded {} config from {:?} ({} entries)",
                        scope,
                        path,
                        layer.entries.len()
                    );
                    layers.push(layer);
                }
                Ok(None) => {}
                Err(e) => warn!("Ignoring {} config: {}", scope, e),
            }
        }

        Self::from_layers(layers)
    }

    pub fn layers(&self) -> &[ConfigLayer] {
        &self.layers
    }

    fn entries(&self) -> impl Iterator<Item = &ConfigEntry> {
        self.layers.iter().flat_map(|l| l.entries.iter())
    }

    /// Every entry for the key, lowest precedence first.
    pub fn get_all(
        &self,
        section: &str,
        subsection: Option<&str>,
        variable: &str,
    ) -> Vec<&ConfigEntry> {
        self.entries()
            .filter(|e| e.matches(section, subsection, variable))
            .collect()
    }

    /// The effective string value of a key.
    pub fn get_string(
        &self,
        section: &str,
        subsection: Option<&str>,
        variable: &str,
    ) -> Option<String> {
        self.get_all(section, subsection, variable)
            .last()
            .and_then(|e| e.value_string())
    }

    /// The effective numeric value of a key.
    ///
    /// Accepts TOML integers and strings holding an integer. Anything else is
    /// treated as unset.
    pub fn get_number(&self, section: &str, subsection: Option<&str>, variable: &str) -> Option<i64> {
        let entry = *self.get_all(section, subsection, variable).last()?;
        match &entry.value {
            Value::Integer(i) => Some(*i),
            Value::String(s) => match s.trim().parse() {
                Ok(n) => Some(n),
                Err(_) => {
                    warn!("Ignoring '{}': '{}' is not a number", entry.key(), s);
                    None
                }
            },
            other => {
                warn!("Ignoring '{}': expected a number, found {}", entry.key(), other.type_str());
                None
            }
        }
    }

    /// Every entry whose dotted key matches `pattern`, lowest precedence first.
    pub fn get_regexp(&self, pattern: &str) -> Result<Vec<&ConfigEntry>> {
        let re = Regex::new(pattern)
            .map_err(|e| CountersError::Config(format!("invalid key pattern '{}': {}", pattern, e)))?;
        Ok(self.entries().filter(|e| re.is_match(&e.key())).collect())
    }

    /// Every entry of `section` that lives in a subsection, in file order.
    pub fn subsection_entries(&self, section: &str) -> Vec<&ConfigEntry> {
        self.entries()
            .filter(|e| e.section.eq_ignore_ascii_case(section) && e.subsection.is_some())
            .collect()
    }

    /// Subsection names of `section` that have no variables, in file order.
    ///
    /// These are invisible to entry queries because they flatten to nothing.
    pub fn empty_subsections(&self, section: &str) -> Vec<String> {
        let mut names = Vec::new();
        for layer in &self.layers {
            for (sec, sub) in &layer.empty_subsections {
                if sec.eq_ignore_ascii_case(section) && !names.contains(sub) {
                    names.push(sub.clone());
                }
            }
        }
        names
    }
}

/// Get the rtcounters config directory path (~/.config/rtcounters/).
///
/// Returns the path to the config directory. Does not create the directory.
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| CountersError::Config("Could not determine home directory".to_string()))?;
    Ok(home.join(".config").join(CONFIG_DIR_NAME))
}

/// Get the path to the global config file.
pub fn global_config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(GLOBAL_CONFIG_FILENAME))
}

/// Get the path to the local config file in the current directory.
pub fn local_config_path() -> Result<PathBuf> {
    let cwd = env::current_dir().map_err(|e| {
        CountersError::Config(format!("Could not determine current directory: {}", e))
    })?;
    Ok(cwd.join(LOCAL_CONFIG_FILENAME))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn layer(scope: ConfigScope, content: &str) -> ConfigLayer {
        ConfigLayer::parse(scope, None, content).unwrap()
    }

    #[test]
    fn test_config_dir_returns_path_ending_with_rtcounters() {
        let result = config_dir().unwrap();
        assert!(result.ends_with("rtcounters"));
        assert!(result.parent().unwrap().ends_with(".config"));
    }

    #[test]
    fn test_flatten_sections_subsections_and_arrays() {
        let l = layer(
            ConfigScope::Global,
            r#"
[counters]
include = ["A", "B"]
name = "app"

[counters."System.Runtime"]
cpu-usage = true
working-set = 1
"#,
        );

        let keys: Vec<String> = l.entries().iter().map(|e| e.key()).collect();
        assert_eq!(
            keys,
            vec![
                "counters.include",
                "counters.include",
                "counters.name",
                "counters.System.Runtime.cpu-usage",
                "counters.System.Runtime.working-set",
            ]
        );
    }

    #[test]
    fn test_subsection_array_is_a_single_entry() {
        let l = layer(
            ConfigScope::Global,
            "[counters.P]\ncpu-usage = [1, 2]\nworking-set = true",
        );

        let keys: Vec<String> = l.entries().iter().map(|e| e.key()).collect();
        assert_eq!(keys, vec!["counters.P.cpu-usage", "counters.P.working-set"]);
        assert!(matches!(l.entries()[0].value, Value::Array(_)));
    }

    #[test]
    fn test_top_level_scalars_and_deep_tables_are_ignored() {
        let l = layer(
            ConfigScope::Global,
            r#"
stray = 1

[counters.P.deeper]
x = 1
"#,
        );
        assert!(l.entries().is_empty());
    }

    #[test]
    fn test_get_string_prefers_highest_precedence_layer() {
        let store = ConfigStore::from_layers(vec![
            layer(ConfigScope::File, "[counters]\nname = \"from-file\""),
            layer(ConfigScope::Global, "[counters]\nname = \"from-global\""),
            layer(ConfigScope::Local, "[counters]\nname = \"from-local\""),
        ]);

        assert_eq!(
            store.get_string("counters", None, "name"),
            Some("from-file".to_string())
        );
    }

    #[test]
    fn test_get_all_merges_layers_in_precedence_order() {
        let store = ConfigStore::from_layers(vec![
            layer(ConfigScope::Local, "[counters]\ninclude = \"B\""),
            layer(ConfigScope::Global, "[counters]\ninclude = [\"A\"]"),
        ]);

        let values: Vec<String> = store
            .get_all("counters", None, "include")
            .iter()
            .filter_map(|e| e.value_string())
            .collect();
        assert_eq!(values, vec!["A", "B"]);
    }

    #[test]
    fn test_section_and_variable_names_are_case_insensitive() {
        let store = ConfigStore::from_layers(vec![layer(
            ConfigScope::Global,
            "[Counters]\nRuntimeVersion = \"5.0\"",
        )]);
        assert_eq!(
            store.get_string("counters", None, "runtimeVersion"),
            Some("5.0".to_string())
        );
    }

    #[test]
    fn test_get_number_accepts_integers_and_numeric_strings() {
        let store = ConfigStore::from_layers(vec![layer(
            ConfigScope::Global,
            "[counters]\nrefresh-interval = 3\nother = \" 7 \"\nbad = \"soon\"\nflag = true",
        )]);
        assert_eq!(store.get_number("counters", None, "refresh-interval"), Some(3));
        assert_eq!(store.get_number("counters", None, "other"), Some(7));
        assert_eq!(store.get_number("counters", None, "bad"), None);
        assert_eq!(store.get_number("counters", None, "flag"), None);
        assert_eq!(store.get_number("counters", None, "missing"), None);
    }

    #[test]
    fn test_get_regexp_matches_dotted_keys() {
        let store = ConfigStore::from_layers(vec![layer(
            ConfigScope::Global,
            "[counters]\nname = \"x\"\n[counters.P]\na = true\nb = true",
        )]);

        let matched = store.get_regexp(r"^counters\.P\.").unwrap();
        assert_eq!(matched.len(), 2);
        assert!(store.get_regexp("(").is_err());
    }

    #[test]
    fn test_subsection_entries_and_empty_subsections() {
        let store = ConfigStore::from_layers(vec![layer(
            ConfigScope::Global,
            "[counters]\ninclude = \"A\"\n[counters.P]\na = true\n[counters.Empty]\n",
        )]);

        let subs = store.subsection_entries("counters");
        assert_eq!(subs.len(), 1);
        assert_eq!(subs[0].subsection.as_deref(), Some("P"));
        assert_eq!(store.empty_subsections("counters"), vec!["Empty".to_string()]);
    }

    #[test]
    fn test_from_file_missing_returns_none() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("missing.toml");
        assert!(ConfigLayer::from_file(ConfigScope::File, &path).unwrap().is_none());
    }

    #[test]
    fn test_from_file_invalid_toml_reports_path() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("broken.toml");
        fs::write(&path, "[counters\nname = ").unwrap();

        let err = ConfigLayer::from_file(ConfigScope::File, &path).unwrap_err();
        assert!(err.to_string().contains("broken.toml"));
    }

    #[test]
    fn test_load_skips_broken_explicit_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("broken.toml");
        fs::write(&path, "not = [valid").unwrap();

        let store = ConfigStore::load(Some(&path));
        assert!(store.layers().iter().all(|l| l.scope != ConfigScope::File));
    }

    #[test]
    fn test_load_reads_explicit_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("counters.toml");
        fs::write(&path, "[counters]\noutput = \"trace\"").unwrap();

        let store = ConfigStore::load(Some(&path));
        assert_eq!(
            store.get_string("counters", None, "output"),
            Some("trace".to_string())
        );
    }
}
