//! Text extraction from documents.
//!
//! A registry maps file extensions to extractor functions chosen at startup.
//! PDF extraction shells out to `pdftotext` as the default fallback for the
//! one ubiquitous binary format; plain-text formats are read directly. Any
//! extractor failure yields empty text and a log line, never an error to the
//! caller: classification degrades to filename/metadata matching instead.

use std::collections::HashMap;
use std::path::Path;
use std::process::Command;

use thiserror::Error;

/// Errors internal to individual extractors. Callers of
/// [`ExtractorRegistry::extract`] never see these; they surface only in logs.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("external tool not found: {0}")]
    ToolNotFound(String),

    #[error("extraction failed: {0}")]
    ExtractionFailed(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

type ExtractorFn = Box<dyn Fn(&Path) -> Result<String, ExtractionError> + Send + Sync>;

/// Registry of per-extension text extractors.
pub struct ExtractorRegistry {
    by_extension: HashMap<String, ExtractorFn>,
}

impl Default for ExtractorRegistry {
    fn default() -> Self {
        let mut registry = Self {
            by_extension: HashMap::new(),
        };
        for ext in ["txt", "md", "csv", "log"] {
            registry.register(ext, |path| Ok(std::fs::read_to_string(path)?));
        }
        registry.register("pdf", |path| run_pdftotext(path));
        registry
    }
}

impl ExtractorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an extractor for a file extension (without the dot),
    /// replacing any existing one.
    pub fn register<F>(&mut self, extension: &str, extractor: F)
    where
        F: Fn(&Path) -> Result<String, ExtractionError> + Send + Sync + 'static,
    {
        self.by_extension
            .insert(extension.to_lowercase(), Box::new(extractor));
    }

    /// Extract plain text from a file. Unknown extensions and failed
    /// extractors both yield empty text.
    pub fn extract(&self, path: &Path) -> String {
        let ext = match path.extension().and_then(|e| e.to_str()) {
            Some(ext) => ext.to_lowercase(),
            None => return String::new(),
        };
        match self.by_extension.get(&ext) {
            Some(extractor) => match extractor(path) {
                Ok(text) => text,
                Err(e) => {
                    tracing::warn!("extractor for {} failed: {}", path.display(), e);
                    String::new()
                }
            },
            None => String::new(),
        }
    }

    /// Extensions with a registered extractor.
    pub fn known_extensions(&self) -> Vec<String> {
        let mut extensions: Vec<String> = self.by_extension.keys().cloned().collect();
        extensions.sort();
        extensions
    }
}

/// Run `pdftotext` on a PDF, capturing stdout.
fn run_pdftotext(path: &Path) -> Result<String, ExtractionError> {
    let output = Command::new("pdftotext")
        .args(["-layout", "-enc", "UTF-8"])
        .arg(path)
        .arg("-")
        .output();

    match output {
        Ok(output) if output.status.success() => {
            Ok(String::from_utf8_lossy(&output.stdout).to_string())
        }
        Ok(output) => {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(ExtractionError::ExtractionFailed(format!(
                "pdftotext failed: {}",
                stderr
            )))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(ExtractionError::ToolNotFound(
            "pdftotext (install poppler-utils)".to_string(),
        )),
        Err(e) => Err(ExtractionError::Io(e)),
    }
}

/// Check which external extraction tools are available.
pub fn check_tools() -> Vec<(String, bool)> {
    ["pdftotext"]
        .iter()
        .map(|tool| (tool.to_string(), which::which(tool).is_ok()))
        .collect()
}
