use std::env;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::{BaseDirs, ProjectDirs};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

pub mod themes;

const APP_DOMAIN: &str = "io";
const APP_ORG: &str = "TerminalNotes";
const APP_NAME: &str = "terminal-notes";
const DATA_FILE_NAME: &str = ".terminal_notes.json";

pub const CONFIG_ENV: &str = "TERMINAL_NOTES_CONFIG";
pub const DATA_ENV: &str = "TERMINAL_NOTES_DATA";

pub struct ConfigLoader {
    paths: ConfigPaths,
}

impl ConfigLoader {
    pub fn discover() -> Result<Self> {
        let paths = ConfigPaths::discover()?;
        Ok(Self { paths })
    }

    pub fn with_paths(paths: ConfigPaths) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &ConfigPaths {
        &self.paths
    }

    pub fn load_or_init(&self) -> Result<AppConfig> {
        self.paths.ensure_directories()?;
        if !self.paths.config_file.exists() {
            let mut default_cfg = AppConfig::default();
            self.write_default_config(&default_cfg)?;
            default_cfg.post_load(&self.paths);
            return Ok(default_cfg);
        }

        self.load()
    }

    pub fn load(&self) -> Result<AppConfig> {
        let raw = fs::read_to_string(&self.paths.config_file)
            .with_context(|| format!("reading config {}", self.paths.config_file.display()))?;
        let mut cfg: AppConfig = toml::from_str(&raw).context("parsing config toml")?;
        cfg.post_load(&self.paths);
        Ok(cfg)
    }

    fn write_default_config(&self, cfg: &AppConfig) -> Result<()> {
        let toml = toml::to_string_pretty(cfg).context("serializing default config")?;
        if let Some(parent) = self.paths.config_file.parent() {
            fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
        }
        let mut file = fs::File::create(&self.paths.config_file)
            .with_context(|| format!("creating config {}", self.paths.config_file.display()))?;
        file.write_all(toml.as_bytes())
            .context("writing default config")?;
        tracing::info!(path = %self.paths.config_file.display(), "wrote default config");
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct ConfigPaths {
    pub config_dir: PathBuf,
    pub config_file: PathBuf,
    pub data_file: PathBuf,
    pub state_dir: PathBuf,
    pub log_dir: PathBuf,
}

impl ConfigPaths {
    /// Platform directories, with `TERMINAL_NOTES_CONFIG` and
    /// `TERMINAL_NOTES_DATA` taking precedence.
    pub fn discover() -> Result<Self> {
        let override_config = env::var_os(CONFIG_ENV).map(PathBuf::from);
        let override_data = env::var_os(DATA_ENV).map(PathBuf::from);

        let project_dirs = ProjectDirs::from(APP_DOMAIN, APP_ORG, APP_NAME)
            .context("resolving XDG project directories")?;

        let config_dir = override_config
            .as_deref()
            .and_then(Path::parent)
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| project_dirs.config_dir().to_path_buf());
        let config_file = override_config.unwrap_or_else(|| config_dir.join("config.toml"));

        let data_file = match override_data {
            Some(path) => path,
            None => BaseDirs::new()
                .context("resolving home directory")?
                .home_dir()
                .join(DATA_FILE_NAME),
        };

        let state_dir = project_dirs
            .state_dir()
            .unwrap_or_else(|| project_dirs.data_local_dir())
            .to_path_buf();
        let log_dir = state_dir.join("logs");

        Ok(Self {
            config_dir,
            config_file,
            data_file,
            state_dir,
            log_dir,
        })
    }

    pub fn ensure_directories(&self) -> Result<()> {
        for dir in [&self.config_dir, &self.state_dir, &self.log_dir] {
            fs::create_dir_all(dir)
                .with_context(|| format!("creating application directory {}", dir.display()))?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub editor: EditorOptions,
    pub list: ListOptions,
    pub storage: StorageOptions,
}

impl AppConfig {
    fn post_load(&mut self, paths: &ConfigPaths) {
        self.storage.resolve(paths);
        if self.list.min_content_width == 0 {
            tracing::warn!("list.min_content_width must be positive, using 10");
            self.list.min_content_width = ListOptions::default().min_content_width;
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorOptions {
    pub layout: EditorLayout,
}

/// Which fields the note editor offers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EditorLayout {
    /// Title and content only.
    Minimal,
    /// Title, priority, content, links and the obscured flag.
    #[default]
    Extended,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ListOptions {
    pub default_sort: SortMode,
    /// Rows taken by headers, borders and the footer around the list.
    pub chrome_rows: u16,
    pub min_content_width: u16,
    /// Columns reserved for the title, badge and date in each row.
    pub reserved_columns: u16,
}

impl Default for ListOptions {
    fn default() -> Self {
        Self {
            default_sort: SortMode::default(),
            chrome_rows: 6,
            min_content_width: 10,
            reserved_columns: 60,
        }
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    EnumIter,
    EnumString,
    Display,
    AsRefStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum SortMode {
    #[default]
    PriorityAsc,
    PriorityDesc,
    DateAsc,
    DateDesc,
}

impl SortMode {
    pub fn next(self) -> Self {
        match self {
            SortMode::PriorityAsc => SortMode::PriorityDesc,
            SortMode::PriorityDesc => SortMode::DateAsc,
            SortMode::DateAsc => SortMode::DateDesc,
            SortMode::DateDesc => SortMode::PriorityAsc,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SortMode::PriorityAsc => "Priority ↑",
            SortMode::PriorityDesc => "Priority ↓",
            SortMode::DateAsc => "Date ↑",
            SortMode::DateDesc => "Date ↓",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageOptions {
    #[serde(skip)]
    pub data_file: PathBuf,
    /// Indent the notes file for hand editing.
    pub pretty: bool,
}

impl Default for StorageOptions {
    fn default() -> Self {
        Self {
            data_file: PathBuf::new(),
            pretty: true,
        }
    }
}

impl StorageOptions {
    fn resolve(&mut self, paths: &ConfigPaths) {
        if self.data_file.as_os_str().is_empty() {
            self.data_file = paths.data_file.clone();
        }
    }
}
