//! Execution engine: runs user plotting code in an interpreter subprocess.

use std::{
    path::{Path, PathBuf},
    process::Stdio,
    time::Duration,
};

use anyhow::{anyhow, Context, Result};
use tokio::{fs, process::Command, time::timeout};
use tracing::{debug, info, warn};

use crate::{config::Config, language::Language};

const PYTHON_WRAPPER: &str = include_str!("wrappers/python_wrapper.py");
const R_WRAPPER: &str = include_str!("wrappers/r_wrapper.R");

#[derive(Debug, Clone, Default)]
pub struct ExecutionResult {
    /// Whether the expected artifact exists after the run.
    pub success: bool,
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ExecutionResult {
    /// Message reported to the caller when no artifact was produced.
    pub fn failure_message(&self) -> String {
        format!("Execution output: {}\nError: {}", self.stdout, self.stderr)
    }
}

#[derive(Debug, Clone)]
pub struct RunnerSettings {
    pub python_bin: PathBuf,
    pub rscript_bin: PathBuf,
    pub timeout: Duration,
    /// Where the embedded wrapper scripts are written.
    pub wrappers_dir: PathBuf,
}

impl RunnerSettings {
    pub fn from_config(cfg: &Config) -> Self {
        let timeout = cfg.get_u64("EXECUTION_TIMEOUT").filter(|s| *s > 0).unwrap_or(60);
        Self {
            python_bin: cfg.get_path("PYTHON_BIN").unwrap_or_else(|| "python".into()),
            rscript_bin: cfg.get_path("RSCRIPT_BIN").unwrap_or_else(|| "Rscript".into()),
            timeout: Duration::from_secs(timeout),
            wrappers_dir: cfg.visualizations_path().join(".wrappers"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Runner {
    settings: RunnerSettings,
}

impl Runner {
    pub fn new(settings: RunnerSettings) -> Self {
        Self { settings }
    }

    /// Write the embedded wrapper scripts to disk. Call once before [`Runner::run`].
    pub async fn install_wrappers(&self) -> Result<()> {
        let dir = &self.settings.wrappers_dir;
        fs::create_dir_all(dir)
            .await
            .with_context(|| format!("creating wrappers directory {}", dir.display()))?;
        for lang in Language::ALL {
            let path = self.wrapper_path(lang);
            fs::write(&path, wrapper_source(lang))
                .await
                .with_context(|| format!("writing wrapper {}", path.display()))?;
        }
        debug!(dir = %dir.display(), "interpreter wrappers installed");
        Ok(())
    }

    pub fn wrapper_path(&self, language: Language) -> PathBuf {
        let name = match language {
            Language::Python => "python_wrapper.py",
            Language::R => "r_wrapper.R",
        };
        self.settings.wrappers_dir.join(name)
    }

    fn interpreter(&self, language: Language) -> &Path {
        match language {
            Language::Python => &self.settings.python_bin,
            Language::R => &self.settings.rscript_bin,
        }
    }

    /// Save `code` as `script.<ext>` in `output_dir` and run it through the
    /// language wrapper, which should leave `output_dir/file_name` behind.
    pub async fn run(
        &self,
        code: &str,
        language: Language,
        output_dir: &Path,
        file_name: &str,
    ) -> Result<ExecutionResult> {
        let script_path = output_dir.join(format!("script.{}", language.extension()));
        fs::write(&script_path, code)
            .await
            .with_context(|| format!("writing script {}", script_path.display()))?;

        let program = self.interpreter(language);
        let mut cmd = Command::new(program);
        cmd.arg(self.wrapper_path(language))
            .arg(&script_path)
            .arg(output_dir)
            .arg(file_name)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        info!(program = %program.display(), %language, dir = %output_dir.display(), "running visualization script");
        let child = cmd
            .spawn()
            .with_context(|| format!("failed to start interpreter {}", program.display()))?;

        // Dropping the pending wait on timeout kills the child.
        let out = timeout(self.settings.timeout, child.wait_with_output())
            .await
            .map_err(|_| {
                warn!(timeout_secs = self.settings.timeout.as_secs(), "visualization script timed out");
                anyhow!(
                    "Execution timed out after {} seconds",
                    self.settings.timeout.as_secs()
                )
            })??;

        let artifact = output_dir.join(file_name);
        let success = fs::try_exists(&artifact).await.unwrap_or(false);
        let result = ExecutionResult {
            success,
            exit_code: out.status.code(),
            stdout: String::from_utf8_lossy(&out.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&out.stderr).into_owned(),
        };
        debug!(success, exit_code = ?result.exit_code, "visualization script finished");
        Ok(result)
    }
}

fn wrapper_source(language: Language) -> &'static str {
    match language {
        Language::Python => PYTHON_WRAPPER,
        Language::R => R_WRAPPER,
    }
}
