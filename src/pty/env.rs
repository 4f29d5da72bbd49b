//! Environment blocks in the host process-creation format.
//!
//! A block is a sequence of `KEY=VALUE` entries, each terminated by a NUL,
//! with one extra NUL closing the block: `A=1\0B=2\0\0`. An empty block is
//! `\0\0`.

use tracing::debug;

use crate::error::PtyError;
use crate::Result;

/// Ordered set of environment entries handed to a launched process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvironmentBlock {
    entries: Vec<(String, String)>,
}

impl EnvironmentBlock {
    /// Create an empty block.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot the current process environment.
    ///
    /// Variables whose names or values are not valid Unicode are skipped
    /// and logged at debug level.
    pub fn inherited() -> Self {
        let entries = std::env::vars_os()
            .filter_map(|(k, v)| match (k.to_str(), v.to_str()) {
                (Some(k), Some(v)) => Some((k.to_string(), v.to_string())),
                _ => {
                    debug!("skipping non-Unicode environment variable {:?}", k);
                    None
                }
            })
            .collect();
        Self { entries }
    }

    /// Build a block from key/value pairs, validating each entry.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut block = Self::new();
        for (k, v) in pairs {
            block.set(k, v)?;
        }
        Ok(block)
    }

    /// Set a variable, replacing any existing entry with the same key.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> Result<()> {
        let key = key.into();
        let value = value.into();
        validate_key(&key)?;
        if value.contains('\0') {
            return Err(PtyError::InvalidEnvironment(format!(
                "value of {key} contains NUL"
            )));
        }

        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
        Ok(())
    }

    /// Remove a variable if present.
    pub fn remove(&mut self, key: &str) {
        self.entries.retain(|(k, _)| k != key);
    }

    /// Look up a variable.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Iterate entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Encode as a double-NUL terminated block.
    ///
    /// Launching does not go through this encoding: the entries are handed
    /// to the PTY layer as key/value pairs and it builds the OS block itself.
    /// Use this to hand the block to other process-creation APIs or to
    /// inspect it.
    pub fn encode(&self) -> String {
        let mut out = String::new();
        for (k, v) in &self.entries {
            out.push_str(k);
            out.push('=');
            out.push_str(v);
            out.push('\0');
        }
        if self.entries.is_empty() {
            out.push('\0');
        }
        out.push('\0');
        out
    }

    /// Parse a double-NUL terminated block.
    pub fn parse(block: &str) -> Result<Self> {
        let body = block
            .strip_suffix("\0\0")
            .ok_or_else(|| PtyError::InvalidEnvironment("missing double-NUL terminator".into()))?;

        let mut parsed = Self::new();
        if body.is_empty() {
            return Ok(parsed);
        }

        for entry in body.split('\0') {
            let (key, value) = split_entry(entry)?;
            parsed.set(key, value)?;
        }
        Ok(parsed)
    }

    /// Parse a single `KEY=VALUE` entry (as given on a command line).
    pub fn parse_entry(entry: &str) -> Result<(String, String)> {
        let (key, value) = split_entry(entry)?;
        validate_key(key)?;
        Ok((key.to_string(), value.to_string()))
    }
}

// Windows keeps per-drive cwd entries like `=C:=C:\work`, so the separator
// is the first `=` after the first character.
fn split_entry(entry: &str) -> Result<(&str, &str)> {
    let sep = entry
        .char_indices()
        .skip(1)
        .find(|&(_, c)| c == '=')
        .map(|(i, _)| i)
        .ok_or_else(|| PtyError::InvalidEnvironment(format!("entry without '=': {entry:?}")))?;
    Ok((&entry[..sep], &entry[sep + 1..]))
}

fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(PtyError::InvalidEnvironment("empty variable name".into()));
    }
    if key.contains('\0') || key.chars().skip(1).any(|c| c == '=') {
        return Err(PtyError::InvalidEnvironment(format!(
            "invalid variable name {key:?}"
        )));
    }
    Ok(())
}
