use std::{fs, path::PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use clap::{ArgGroup, Parser};

use crate::{config::Config, language::Language, templates, workbench::Workbench};

#[derive(Parser, Debug, Clone)]
#[command(name = "chartcraft", about = "Render Python and R plotting code into charts", version)]
#[command(group(ArgGroup::new("source").args(["code", "file", "template"]).multiple(false)))]
#[command(group(ArgGroup::new("mode").args(["serve", "list_templates", "show_template"]).multiple(false)))]
pub struct Cli {
    /// Plotting code to render. Read from stdin when piped.
    #[arg(value_name = "CODE")]
    pub code: Option<String>,

    /// Language of the code (python or r).
    #[arg(short = 'l', long, value_parser = clap::value_parser!(Language))]
    pub language: Option<Language>,

    /// Read code from a file; `.py` and `.R` also set the language.
    #[arg(short = 'f', long)]
    pub file: Option<PathBuf>,

    /// Start from a built-in template (slug, number or title).
    #[arg(short = 't', long)]
    pub template: Option<String>,

    /// List the built-in templates.
    #[arg(long = "list-templates")]
    pub list_templates: bool,

    /// Print a template's code.
    #[arg(long = "show-template", value_name = "TEMPLATE")]
    pub show_template: Option<String>,

    /// Save the code as `<language>_code.<ext>` into this directory.
    #[arg(long, value_name = "DIR")]
    pub download: Option<PathBuf>,

    /// Do not submit the code for rendering.
    #[arg(long = "no-submit")]
    pub no_submit: bool,

    /// Visualization service origin (overrides SERVER_ORIGIN).
    #[arg(long, value_name = "ORIGIN")]
    pub server: Option<String>,

    /// Run the visualization service instead of the client.
    #[arg(long)]
    pub serve: bool,

    /// Address for --serve (overrides BIND_ADDRESS).
    #[arg(long, value_name = "ADDR", requires = "serve")]
    pub bind: Option<String>,

    /// Verbose logging.
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    /// Whether code may come from stdin, i.e. neither a template nor a file was given.
    pub fn reads_stdin(&self) -> bool {
        self.template.is_none() && self.file.is_none()
    }

    /// Resolve code and language: template, file, piped stdin, then the positional argument.
    ///
    /// `piped` is the stdin content when stdin is not a terminal. Non-blank piped
    /// code together with a positional argument is rejected.
    pub fn build_workbench(&self, cfg: &Config, piped: Option<String>) -> Result<Workbench> {
        let default_language = cfg
            .get("DEFAULT_LANGUAGE")
            .map(|s| s.parse::<Language>())
            .transpose()
            .context("invalid DEFAULT_LANGUAGE")?
            .unwrap_or(Language::Python);

        if let Some(name) = &self.template {
            let t = templates::find(name).ok_or_else(|| anyhow!("template not found: {}", name))?;
            if let Some(lang) = self.language {
                if lang != t.language {
                    bail!("template {} is {} code, not {}", t.slug, t.language, lang);
                }
            }
            let mut wb = Workbench::new(default_language);
            wb.apply_template(t);
            return Ok(wb);
        }

        if let Some(path) = &self.file {
            let code = fs::read_to_string(path)
                .with_context(|| format!("reading code file {}", path.display()))?;
            let language = self
                .language
                .or_else(|| Language::from_path(path))
                .unwrap_or(default_language);
            return Ok(Workbench::with_code(language, code));
        }

        let language = self.language.unwrap_or(default_language);
        let piped = piped.filter(|code| !code.trim().is_empty());
        let code = match (piped, &self.code) {
            (Some(_), Some(_)) => bail!("code given both on stdin and as an argument"),
            (Some(code), None) => code,
            (None, Some(code)) => code.clone(),
            (None, None) => String::new(),
        };
        Ok(Workbench::with_code(language, code))
    }
}
