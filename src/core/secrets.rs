//! Run-scoped secrets
//!
//! Values are read from the environment when a run starts and dropped with
//! the run. They are never written to disk by the pipeline except for the
//! deploy key, which lives in a temporary directory for the deploy step only.

use std::collections::HashMap;
use std::fmt;

const REDACTED: &str = "***";

/// Secret values keyed by the environment variable they came from
///
/// Credentials are masked in step output; deploy settings such as the host
/// and user name are carried here too but left readable.
#[derive(Clone, Default)]
pub struct Secrets {
    values: HashMap<String, String>,
    masked: Vec<String>,
}

impl Secrets {
    /// Read the named credentials from the environment, ignoring unset or empty ones
    pub fn from_env<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut secrets = Self::default();
        for (name, value) in read_env(names) {
            secrets = secrets.with(name, value);
        }
        secrets
    }

    /// Add readable settings from the environment
    pub fn with_plain_env<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for (name, value) in read_env(names) {
            self = self.with_plain(name, value);
        }
        self
    }

    /// Add a credential; its value is masked in output
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let value = value.into();
        self.mask(value.clone());
        self.values.insert(name.into(), value);
        self
    }

    /// Add a setting that is not masked
    pub fn with_plain(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    /// Mask a value derived from a credential, e.g. an encoded auth header
    pub fn mask(&mut self, value: impl Into<String>) {
        let value = value.into();
        // very short values would mangle ordinary output
        if value.len() >= 4 && !self.masked.contains(&value) {
            self.masked.push(value);
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Replace every masked value occurring in `text`
    pub fn redact(&self, text: &str) -> String {
        let mut masked: Vec<&String> = self.masked.iter().collect();
        // longest first, so a value containing another is masked whole
        masked.sort_by_key(|v| std::cmp::Reverse(v.len()));

        let mut redacted = text.to_string();
        for value in masked {
            redacted = redacted.replace(value.as_str(), REDACTED);
        }
        redacted
    }
}

fn read_env<I, S>(names: I) -> Vec<(String, String)>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    names
        .into_iter()
        .filter_map(|name| {
            let name = name.as_ref();
            std::env::var(name)
                .ok()
                .filter(|v| !v.is_empty())
                .map(|v| (name.to_string(), v))
        })
        .collect()
}

impl fmt::Debug for Secrets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.values.keys().collect();
        names.sort();
        f.debug_struct("Secrets").field("names", &names).finish()
    }
}
