//! Host metadata and tag integration.
//!
//! On macOS, Spotlight metadata is read through the `mdls` binary and Finder
//! tags are written through the `tag` binary. Both facilities are optional:
//! a missing binary degrades to an empty snapshot / a logged no-op rather
//! than failing the caller. Other platforms get the same degraded behavior
//! automatically because the binaries are absent.

use std::collections::HashMap;
use std::path::Path;
use std::process::Command;

use serde::{Deserialize, Serialize};

/// Metadata attribute names requested from Spotlight.
const MDLS_ATTRIBUTES: &[&str] = &[
    "kMDItemContentCreationDate",
    "kMDItemKind",
    "kMDItemAuthors",
    "kMDItemUserTags",
];

/// Tagging configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaggingConfig {
    /// Whether pass two applies tags to classified local documents.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Category → Finder color tag name, appended to the written tags.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub colors: HashMap<String, String>,
}

fn default_true() -> bool {
    true
}

impl Default for TaggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            colors: HashMap::new(),
        }
    }
}

impl TaggingConfig {
    pub fn is_default(&self) -> bool {
        self.enabled && self.colors.is_empty()
    }
}

/// Reads a key/value metadata snapshot for a document.
pub trait MetadataReader: Send + Sync {
    /// Returns an empty map when the facility is unavailable; never fails.
    fn read(&self, path: &Path) -> HashMap<String, String>;
}

/// Reads and writes OS-level tags. Failures are logged, never fatal.
pub trait TagStore: Send + Sync {
    fn read_tags(&self, path: &Path) -> Vec<String>;
    fn write_tags(&self, path: &Path, tags: &[String]);
}

/// Spotlight-backed metadata reader (`mdls`).
#[derive(Debug, Default)]
pub struct SpotlightReader;

impl MetadataReader for SpotlightReader {
    fn read(&self, path: &Path) -> HashMap<String, String> {
        let mut cmd = Command::new("mdls");
        for attr in MDLS_ATTRIBUTES {
            cmd.args(["-name", attr]);
        }
        let output = match cmd.arg(path).output() {
            Ok(output) => output,
            Err(e) => {
                tracing::debug!("mdls unavailable for {}: {}", path.display(), e);
                return HashMap::new();
            }
        };
        parse_mdls_output(&String::from_utf8_lossy(&output.stdout))
    }
}

/// A reader for hosts (and tests) without any metadata facility.
#[derive(Debug, Default)]
pub struct NullMetadataReader;

impl MetadataReader for NullMetadataReader {
    fn read(&self, _path: &Path) -> HashMap<String, String> {
        HashMap::new()
    }
}

/// Finder tag store backed by the `tag` binary for writes and `mdls` for
/// read-back verification.
#[derive(Debug, Default)]
pub struct FinderTagStore;

impl TagStore for FinderTagStore {
    fn read_tags(&self, path: &Path) -> Vec<String> {
        let reader = SpotlightReader;
        let metadata = reader.read(path);
        metadata
            .get("kMDItemUserTags")
            .map(|raw| parse_tag_list(raw))
            .unwrap_or_default()
    }

    fn write_tags(&self, path: &Path, tags: &[String]) {
        let result = Command::new("tag")
            .arg("--set")
            .arg(tags.join(","))
            .arg(path)
            .status();
        match result {
            Ok(status) if status.success() => {}
            Ok(status) => {
                tracing::warn!(
                    "unable to update tags for {}: tag exited with {}",
                    path.display(),
                    status
                );
            }
            Err(e) => {
                tracing::debug!("tag binary unavailable for {}: {}", path.display(), e);
            }
        }
    }
}

/// A tag store that records nothing (tagging disabled or unsupported host).
#[derive(Debug, Default)]
pub struct NullTagStore;

impl TagStore for NullTagStore {
    fn read_tags(&self, _path: &Path) -> Vec<String> {
        Vec::new()
    }

    fn write_tags(&self, _path: &Path, _tags: &[String]) {}
}

/// Parse `mdls` output lines of the form `key = value`.
fn parse_mdls_output(stdout: &str) -> HashMap<String, String> {
    let mut metadata = HashMap::new();
    for line in stdout.lines() {
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let key = key.trim();
        let value = value.trim().trim_matches('"');
        if value == "(null)" || value.is_empty() {
            continue;
        }
        metadata.insert(key.to_string(), value.to_string());
    }
    metadata
}

/// Parse a Spotlight tag list such as `("Teaching", "Primary PDF")`.
fn parse_tag_list(raw: &str) -> Vec<String> {
    let inner = raw
        .trim()
        .strip_prefix('(')
        .and_then(|s| s.strip_suffix(')'))
        .unwrap_or(raw);
    inner
        .split(',')
        .map(|tag| tag.trim().trim_matches('"').to_string())
        .filter(|tag| !tag.is_empty())
        .collect()
}

/// Check which external metadata tools are available.
pub fn check_tools() -> Vec<(String, bool)> {
    ["mdls", "tag"]
        .iter()
        .map(|tool| (tool.to_string(), which::which(tool).is_ok()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_mdls_key_value_lines() {
        let stdout = concat!(
            "kMDItemContentCreationDate = 2022-03-14 09:26:53 +0000\n",
            "kMDItemKind                = \"PDF document\"\n",
            "kMDItemAuthors             = (null)\n",
        );
        let metadata = parse_mdls_output(stdout);
        assert_eq!(
            metadata.get("kMDItemContentCreationDate").map(String::as_str),
            Some("2022-03-14 09:26:53 +0000")
        );
        assert_eq!(
            metadata.get("kMDItemKind").map(String::as_str),
            Some("PDF document")
        );
        assert!(!metadata.contains_key("kMDItemAuthors"));
    }

    #[test]
    fn parses_parenthesized_tag_lists() {
        assert_eq!(
            parse_tag_list("(\"Teaching\", \"Primary PDF → Teaching Evidence\")"),
            vec!["Teaching", "Primary PDF → Teaching Evidence"]
        );
        assert_eq!(parse_tag_list("()"), Vec::<String>::new());
        assert_eq!(parse_tag_list("Teaching"), vec!["Teaching"]);
    }

    #[test]
    fn null_reader_returns_empty_snapshot() {
        let reader = NullMetadataReader;
        assert!(reader.read(Path::new("/nope")).is_empty());
    }
}
