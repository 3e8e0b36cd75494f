//! Resource files (`tsumugirc`, `dicrc`).
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use clap::ValueEnum;
use hashbrown::HashMap;
use regex::Regex;

use crate::errors::{Result, TsumugiError};
use crate::tagger::config::{OutputFormat, TaggerConfig};

static LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*([A-Za-z0-9_\-]+)\s*=\s*(.*?)\s*$").unwrap());

const RCPATH_VAR: &str = "$(rcpath)";

/// Parsed `key = value` lines of a resource file.
#[derive(Debug, Clone, Default)]
pub(crate) struct RcFile {
    path: PathBuf,
    entries: HashMap<String, String>,
    // Keys in file order, for reproducible logging.
    keys: Vec<String>,
}

impl RcFile {
    pub(crate) fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        Self::parse(&text, path)
    }

    /// Parses `text`. `$(rcpath)` in values expands to the directory of `path`.
    pub(crate) fn parse(text: &str, path: &Path) -> Result<Self> {
        let rcpath = path
            .parent()
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mut rc = Self {
            path: path.to_path_buf(),
            ..Self::default()
        };
        for (i, line) in text.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with(';') || trimmed.starts_with('#') {
                continue;
            }
            let caps = LINE_RE.captures(line).ok_or_else(|| {
                TsumugiError::invalid_format(
                    "rcfile",
                    format!("{}:{}: expected `key = value`: {line:?}", path.display(), i + 1),
                )
            })?;
            let key = caps[1].to_string();
            let value = caps[2].replace(RCPATH_VAR, &rcpath);
            if rc.entries.insert(key.clone(), value).is_none() {
                rc.keys.push(key);
            }
        }
        Ok(rc)
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    /// Fills the unset values of `config`, returning the keys that are not
    /// tagger options.
    pub(crate) fn apply_to(&self, config: &mut TaggerConfig) -> Result<Vec<&str>> {
        let mut unknown = vec![];
        for key in &self.keys {
            let value = self.entries[key].as_str();
            match key.as_str() {
                "dicdir" => {
                    config.dicdir.get_or_insert_with(|| PathBuf::from(value));
                }
                "sysdic" => {
                    config.sysdic.get_or_insert_with(|| PathBuf::from(value));
                }
                "userdic" => {
                    if config.userdics.is_empty() {
                        config.userdics = value
                            .split(',')
                            .map(str::trim)
                            .filter(|s| !s.is_empty())
                            .map(PathBuf::from)
                            .collect();
                    }
                }
                "output-format-type" => {
                    if config.output_format.is_none() {
                        config.output_format = Some(self.parse_value(key, value, |v| {
                            OutputFormat::from_str(v, true).ok()
                        })?);
                    }
                }
                "max-grouping-size" => {
                    if config.max_grouping_len.is_none() {
                        config.max_grouping_len =
                            Some(self.parse_value(key, value, |v| v.parse().ok())?);
                    }
                }
                "ignore-space" => {
                    if config.ignore_space.is_none() {
                        config.ignore_space = Some(self.parse_value(key, value, parse_bool)?);
                    }
                }
                "schema" => {
                    if config.schema.is_none() {
                        config.schema = Some(self.parse_value(key, value, |v| v.parse().ok())?);
                    }
                }
                _ => unknown.push(key.as_str()),
            }
        }
        Ok(unknown)
    }

    fn parse_value<T, F>(&self, key: &str, value: &str, f: F) -> Result<T>
    where
        F: FnOnce(&str) -> Option<T>,
    {
        f(value).ok_or_else(|| {
            TsumugiError::invalid_format(
                "rcfile",
                format!("{}: invalid value for {key}: {value:?}", self.path.display()),
            )
        })
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
