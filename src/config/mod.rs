use std::{
    collections::HashMap,
    env, fs,
    path::PathBuf,
};

use directories::BaseDirs;

#[derive(Debug, Clone)]
pub struct Config {
    inner: HashMap<String, String>,
    pub config_path: PathBuf,
}

impl Config {
    pub fn load() -> Self {
        let mut map = default_map();
        let config_path = default_config_path();

        // Read .chartcraftrc if exists
        if let Ok(text) = fs::read_to_string(&config_path) {
            map.extend(parse_rc(&text));
        }

        // Overlay environment variables (take precedence)
        for (k, v) in env::vars() {
            if is_config_key(&k) {
                map.insert(k, v);
            }
        }

        Self { inner: map, config_path }
    }

    /// Config built from defaults plus the given pairs, ignoring the rc file and environment.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut map = default_map();
        map.extend(pairs.into_iter().map(|(k, v)| (k.into(), v.into())));
        Self { inner: map, config_path: default_config_path() }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.inner.get(key).cloned()
    }

    pub fn get_bool(&self, key: &str) -> bool {
        self.get(key)
            .map(|v| v.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    }

    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.get(key).and_then(|v| v.trim().parse::<u64>().ok())
    }

    pub fn get_path(&self, key: &str) -> Option<PathBuf> {
        self.get(key).map(PathBuf::from)
    }

    pub fn bind_address(&self) -> String {
        self.get("BIND_ADDRESS")
            .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string())
    }

    pub fn server_origin(&self) -> String {
        self.get("SERVER_ORIGIN")
            .unwrap_or_else(|| DEFAULT_SERVER_ORIGIN.to_string())
    }

    pub fn visualizations_path(&self) -> PathBuf {
        self.get_path("VISUALIZATIONS_PATH")
            .unwrap_or_else(|| env::temp_dir().join("chartcraft").join("visualizations"))
    }
}

pub const DEFAULT_SERVER_ORIGIN: &str = "http://localhost:5000";
pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:5000";

/// Parse `KEY=VALUE` lines, skipping blanks and `#` comments.
fn parse_rc(text: &str) -> HashMap<String, String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .collect()
}

fn is_config_key(k: &str) -> bool {
    const KEYS: &[&str] = &[
        "SERVER_ORIGIN",
        "REQUEST_TIMEOUT",
        "DEFAULT_LANGUAGE",
        "VISUALIZATIONS_PATH",
        "BIND_ADDRESS",
        "PYTHON_BIN",
        "RSCRIPT_BIN",
        "EXECUTION_TIMEOUT",
        "PRETTIFY_MARKDOWN",
    ];

    KEYS.contains(&k) || k.starts_with("CHARTCRAFT_")
}

fn default_config_path() -> PathBuf {
    let base = BaseDirs::new()
        .map(|b| b.config_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("~/.config"));
    base.join("chartcraft").join(".chartcraftrc")
}

fn default_map() -> HashMap<String, String> {
    // Typed settings carry their own defaults in their accessors; only
    // plain flags read through `get_bool` need an entry here.
    let mut m = HashMap::new();
    m.insert("PRETTIFY_MARKDOWN".into(), "true".into());
    m
}
