//! Default counter selection from configuration.
//!
//! Two configuration shapes select counters:
//!
//! ```toml
//! [counters]
//! include = ["System.Runtime", "Microsoft.AspNetCore.Hosting[requests-per-second]"]
//!
//! [counters."System.Runtime"]
//! cpu-usage = true
//! working-set = true
//! ```
//!
//! `include` entries are taken in their canonical form (see
//! [`CounterSpec`]), one per provider. Each provider subsection becomes a
//! qualified token whose counters are the subsection's variable names, and it
//! supersedes any `include` entry for the same provider. The example above
//! resolves to:
//!
//! ```text
//! System.Runtime[cpu-usage,working-set]
//! Microsoft.AspNetCore.Hosting[requests-per-second]
//! ```
//!
//! A subsection with no variables selects all of its provider's counters,
//! unless the provider is already selected by an `include` entry or by a
//! non-empty subsection in another layer.

use crate::config::ConfigStore;
use crate::counter_spec::CounterSpec;
use tracing::{debug, warn};

/// The configuration section holding counter settings.
pub const COUNTERS_SECTION: &str = "counters";

/// The repeatable variable listing provider tokens.
pub const INCLUDE_VARIABLE: &str = "include";

/// Resolve the configured counter list.
///
/// The result is ordered by first appearance and holds at most one entry per
/// provider. Malformed entries are skipped; an empty store yields an empty list.
pub fn resolve_default_counters(config: &ConfigStore) -> Vec<String> {
    let mut resolved = ResolvedCounters::default();

    for entry in config.get_all(COUNTERS_SECTION, None, INCLUDE_VARIABLE) {
        let Some(raw) = entry.value_string() else {
            warn!("Ignoring '{}': expected a provider name", entry.key());
            continue;
        };
        if raw.trim().is_empty() {
            continue;
        }
        match raw.parse::<CounterSpec>() {
            Ok(spec) => resolved.include(spec),
            Err(e) => warn!("Ignoring '{}': {}", entry.key(), e),
        }
    }

    for (provider, counters) in group_by_provider(config) {
        resolved.qualify(CounterSpec::qualified(provider, counters));
    }

    // An empty section only matters when nothing else names its provider;
    // it never widens a qualified selection made elsewhere.
    for provider in config.empty_subsections(COUNTERS_SECTION) {
        if resolved.contains(&provider) {
            debug!("Provider section '{}' is empty; keeping its other entries", provider);
            continue;
        }
        warn!(
            "Provider section '{}' lists no counters; all of its counters will be monitored",
            provider
        );
        resolved.include(CounterSpec::provider(provider));
    }

    let tokens = resolved.into_tokens();
    debug!("Resolved default counters: {:?}", tokens);
    tokens
}

/// Group subsection entries by provider, keeping first-seen order.
fn group_by_provider(config: &ConfigStore) -> Vec<(String, Vec<String>)> {
    let mut groups: Vec<(String, Vec<String>)> = Vec::new();

    for entry in config.subsection_entries(COUNTERS_SECTION) {
        let Some(provider) = entry.subsection.as_deref() else {
            continue;
        };
        if provider.trim().is_empty() || provider.contains(['[', ']']) {
            warn!("Ignoring '{}': invalid provider name", entry.key());
            continue;
        }
        if entry.variable.contains([',', '[', ']']) {
            warn!("Ignoring '{}': invalid counter name", entry.key());
            continue;
        }

        match groups.iter_mut().find(|(p, _)| p == provider) {
            Some((_, counters)) => counters.push(entry.variable.clone()),
            None => groups.push((provider.to_string(), vec![entry.variable.clone()])),
        }
    }

    groups
}

/// Working list that keeps one spec per provider.
#[derive(Debug, Default)]
pub(crate) struct ResolvedCounters {
    specs: Vec<CounterSpec>,
}

impl ResolvedCounters {
    fn position(&self, provider: &str) -> Option<usize> {
        self.specs.iter().position(|s| s.provider == provider)
    }

    pub(crate) fn contains(&self, provider: &str) -> bool {
        self.position(provider).is_some()
    }

    /// Add an `include` token. Qualified tokens win over bare ones; two
    /// qualified tokens for one provider merge their counters.
    pub(crate) fn include(&mut self, spec: CounterSpec) {
        let Some(idx) = self.position(&spec.provider) else {
            self.specs.push(spec);
            return;
        };

        let Some(counters) = spec.counters else {
            return;
        };
        let existing = &mut self.specs[idx];
        match existing.counters.as_mut() {
            None => existing.counters = Some(counters),
            Some(current) => {
                for counter in counters {
                    if !current.contains(&counter) {
                        current.push(counter);
                    }
                }
            }
        }
    }

    /// Add a provider-section token, replacing any entry for the same provider
    /// in place.
    fn qualify(&mut self, spec: CounterSpec) {
        match self.position(&spec.provider) {
            Some(idx) => self.specs[idx] = spec,
            None => self.specs.push(spec),
        }
    }

    pub(crate) fn into_tokens(self) -> Vec<String> {
        self.specs.iter().map(ToString::to_string).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfigLayer, ConfigScope};

    fn store(layers: &[(ConfigScope, &str)]) -> ConfigStore {
        ConfigStore::from_layers(
            layers
                .iter()
                .map(|(scope, content)| ConfigLayer::parse(*scope, None, content).unwrap())
                .collect(),
        )
    }

    fn global(content: &str) -> ConfigStore {
        store(&[(ConfigScope::Global, content)])
    }

    #[test]
    fn test_no_configuration_resolves_to_empty_list() {
        assert!(resolve_default_counters(&ConfigStore::empty()).is_empty());
        assert!(resolve_default_counters(&global("[counters]\nname = \"app\"")).is_empty());
    }

    #[test]
    fn test_include_only_returns_tokens_with_duplicates_collapsed() {
        let config = store(&[
            (ConfigScope::Global, "[counters]\ninclude = [\"A\", \"B[x]\", \"A\"]"),
            (ConfigScope::Local, "[counters]\ninclude = [\"C\", \"B[x]\"]"),
        ]);

        assert_eq!(resolve_default_counters(&config), vec!["A", "B[x]", "C"]);
    }

    #[test]
    fn test_subsection_supersedes_bare_include() {
        let config = global(
            r#"
[counters]
include = ["P", "Other"]

[counters.P]
c1 = true
c2 = true
"#,
        );

        assert_eq!(resolve_default_counters(&config), vec!["P[c1,c2]", "Other"]);
    }

    #[test]
    fn test_subsection_without_include_is_added() {
        let config = global(
            r#"
[counters."System.Runtime"]
cpu-usage = true
working-set = true
"#,
        );

        assert_eq!(
            resolve_default_counters(&config),
            vec!["System.Runtime[cpu-usage,working-set]"]
        );
    }

    #[test]
    fn test_subsections_across_layers_group_by_provider() {
        let config = store(&[
            (ConfigScope::Global, "[counters.P]\na = true\n[counters.Q]\nq = true"),
            (ConfigScope::Local, "[counters.P]\nb = true\na = true"),
        ]);

        // Counter names are not deduplicated within a provider.
        assert_eq!(resolve_default_counters(&config), vec!["P[a,b,a]", "Q[q]"]);
    }

    #[test]
    fn test_bare_and_qualified_includes_merge_to_qualified() {
        let config = global("[counters]\ninclude = [\"P\", \"P[a]\", \"P[b,a]\", \"P\"]");
        assert_eq!(resolve_default_counters(&config), vec!["P[a,b]"]);
    }

    #[test]
    fn test_subsection_replaces_qualified_include() {
        let config = global("[counters]\ninclude = \"P[x]\"\n[counters.P]\ny = true");
        assert_eq!(resolve_default_counters(&config), vec!["P[y]"]);
    }

    #[test]
    fn test_empty_subsection_resolves_to_all_counters() {
        let config = global("[counters]\ninclude = \"P\"\n[counters.Empty]\n");
        assert_eq!(resolve_default_counters(&config), vec!["P", "Empty"]);
    }

    #[test]
    fn test_empty_subsection_keeps_qualified_include() {
        let config = global("[counters]\ninclude = \"P[x]\"\n[counters.P]\n");
        assert_eq!(resolve_default_counters(&config), vec!["P[x]"]);
    }

    #[test]
    fn test_empty_subsection_keeps_bare_include_position() {
        let config = global("[counters]\ninclude = [\"P\", \"Q\"]\n[counters.P]\n");
        assert_eq!(resolve_default_counters(&config), vec!["P", "Q"]);
    }

    #[test]
    fn test_empty_local_subsection_keeps_global_counters() {
        let config = store(&[
            (ConfigScope::Global, "[counters.P]\na = true"),
            (ConfigScope::Local, "[counters.P]\n"),
        ]);

        assert_eq!(resolve_default_counters(&config), vec!["P[a]"]);
    }

    #[test]
    fn test_empty_global_subsection_with_local_counters() {
        let config = store(&[
            (ConfigScope::Global, "[counters.P]\n"),
            (ConfigScope::Local, "[counters.P]\nb = true"),
        ]);

        assert_eq!(resolve_default_counters(&config), vec!["P[b]"]);
    }

    #[test]
    fn test_subsection_array_value_names_counter_once() {
        let config = global("[counters.P]\ncpu-usage = [1, 2]");
        assert_eq!(resolve_default_counters(&config), vec!["P[cpu-usage]"]);
    }

    #[test]
    fn test_malformed_entries_are_skipped() {
        let config = global(
            r#"
[counters]
include = ["Good", "Bad[", "", 42, "  "]

[counters."Weird[name]"]
x = true
"#,
        );

        // Non-string scalars render as their text form and are accepted.
        assert_eq!(resolve_default_counters(&config), vec!["Good", "42"]);
    }
}
