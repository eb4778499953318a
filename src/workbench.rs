//! Editing state for one submission: language, code and what came back.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};

use crate::{
    client::{Visualization, VisualizeError},
    language::Language,
    templates::Template,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workbench {
    pub language: Language,
    pub code: String,
    chart_url: Option<String>,
    error: Option<String>,
}

impl Workbench {
    pub fn new(language: Language) -> Self {
        Self { language, code: String::new(), chart_url: None, error: None }
    }

    pub fn with_code(language: Language, code: impl Into<String>) -> Self {
        Self { code: code.into(), ..Self::new(language) }
    }

    /// Resolved chart URL, only present after a successful response.
    pub fn chart_url(&self) -> Option<&str> {
        self.chart_url.as_deref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn apply_template(&mut self, template: &Template) {
        self.language = template.language;
        self.code = template.code.to_string();
        self.chart_url = None;
        self.error = None;
    }

    pub fn record(&mut self, outcome: &Result<Visualization, VisualizeError>) {
        match outcome {
            Ok(viz) => {
                self.chart_url = Some(viz.url.clone());
                self.error = None;
            }
            Err(e) => {
                self.chart_url = None;
                self.error = Some(e.to_string());
            }
        }
    }

    /// `python_code.py` or `r_code.R`.
    pub fn download_file_name(&self) -> String {
        format!("{}_code.{}", self.language.as_str(), self.language.extension())
    }

    /// Write the code, byte for byte, into `dir` under [`Self::download_file_name`].
    pub fn save_code(&self, dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(dir)
            .with_context(|| format!("creating download directory {}", dir.display()))?;
        let path = dir.join(self.download_file_name());
        fs::write(&path, self.code.as_bytes())
            .with_context(|| format!("writing {}", path.display()))?;
        Ok(path)
    }
}
