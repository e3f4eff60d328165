//! Counter specification tokens.
//!
//! A counter specification names a provider, optionally restricted to a
//! subset of its counters:
//!
//! ```text
//! System.Runtime
//! System.Runtime[cpu-usage,working-set]
//! ```
//!
//! Parsing is lenient: whitespace around names and empty list items are
//! dropped, so `P[ a ,,b]` reads as `P[a,b]`. Formatting always produces that
//! canonical form, and a rewritten token is logged at debug level.

use crate::error::{CountersError, Result};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// A provider, optionally qualified with an explicit list of counter names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CounterSpec {
    /// Provider name (e.g. `System.Runtime`).
    pub provider: String,
    /// `None` selects every counter the provider exposes.
    pub counters: Option<Vec<String>>,
}

impl CounterSpec {
    /// A spec selecting all counters of `provider`.
    pub fn provider(provider: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            counters: None,
        }
    }

    /// A spec restricted to the given counters.
    pub fn qualified<I, S>(provider: impl Into<String>, counters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            provider: provider.into(),
            counters: Some(counters.into_iter().map(Into::into).collect()),
        }
    }

    pub fn is_qualified(&self) -> bool {
        self.counters.is_some()
    }

    /// Whether this spec selects the named counter.
    pub fn includes(&self, counter: &str) -> bool {
        match &self.counters {
            None => true,
            Some(names) => names.iter().any(|n| n == counter),
        }
    }
}

impl fmt::Display for CounterSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.counters {
            None => write!(f, "{}", self.provider),
            Some(names) => write!(f, "{}[{}]", self.provider, names.join(",")),
        }
    }
}

impl FromStr for CounterSpec {
    type Err = CountersError;

    fn from_str(s: &str) -> Result<Self> {
        let token = s.trim();
        let invalid = |reason: &str| CountersError::InvalidCounterSpec(s.to_string(), reason.into());

        let Some(open) = token.find('[') else {
            if token.contains(']') {
                return Err(invalid("unexpected ']'"));
            }
            if token.is_empty() {
                return Err(invalid("empty provider name"));
            }
            return Ok(CounterSpec::provider(token));
        };

        if !token.ends_with(']') {
            return Err(invalid("missing closing ']'"));
        }

        let provider = token[..open].trim();
        if provider.is_empty() {
            return Err(invalid("empty provider name"));
        }

        let inner = &token[open + 1..token.len() - 1];
        if inner.contains('[') || inner.contains(']') {
            return Err(invalid("nested brackets"));
        }

        let counters = inner
            .split(',')
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .collect::<Vec<_>>();

        let spec = CounterSpec {
            provider: provider.to_string(),
            counters: Some(counters),
        };
        let canonical = spec.to_string();
        if canonical != token {
            debug!("Counter '{}' normalized to '{}'", token, canonical);
        }
        Ok(spec)
    }
}

/// Parse every token, failing on the first malformed one.
pub fn parse_all<S: AsRef<str>>(tokens: &[S]) -> Result<Vec<CounterSpec>> {
    tokens.iter().map(|t| t.as_ref().parse()).collect()
}
