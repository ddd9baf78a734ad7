use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{LazyLock, RwLock};

use crate::slide::{
    DEFAULT_DOWNSAMPLE_BASE, DEFAULT_MAX_DOWNSAMPLE_EXPONENT, DEFAULT_WORKERS,
    KEYBOARD_SCROLL_AMOUNT, TilePalette, ViewConfig,
};

pub const CURRENT_VERSION: u32 = 1;
const SETTINGS_FILENAME: &str = "config.yaml";
const APP_NAME: &str = "slideview";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default = "default_downsample_base")]
    pub downsample_base: f64,

    #[serde(default = "default_max_downsample_exponent")]
    pub max_downsample_exponent: i32,

    #[serde(default = "default_keyboard_scroll_amount")]
    pub keyboard_scroll_amount: i64,

    #[serde(default = "default_render_workers")]
    pub render_workers: usize,

    /// Placeholder and frame background, RGB
    #[serde(default = "default_background")]
    pub background: [u8; 3],

    /// Placeholder cross and border, RGB
    #[serde(default = "default_placeholder_marker")]
    pub placeholder_marker: [u8; 3],
}

fn default_version() -> u32 {
    CURRENT_VERSION
}

fn default_downsample_base() -> f64 {
    DEFAULT_DOWNSAMPLE_BASE
}

fn default_max_downsample_exponent() -> i32 {
    DEFAULT_MAX_DOWNSAMPLE_EXPONENT
}

fn default_keyboard_scroll_amount() -> i64 {
    KEYBOARD_SCROLL_AMOUNT
}

fn default_render_workers() -> usize {
    DEFAULT_WORKERS
}

fn default_background() -> [u8; 3] {
    [255, 255, 255]
}

fn default_placeholder_marker() -> [u8; 3] {
    [255, 0, 0]
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: CURRENT_VERSION,
            downsample_base: default_downsample_base(),
            max_downsample_exponent: default_max_downsample_exponent(),
            keyboard_scroll_amount: default_keyboard_scroll_amount(),
            render_workers: default_render_workers(),
            background: default_background(),
            placeholder_marker: default_placeholder_marker(),
        }
    }
}

impl Settings {
    /// Parse YAML, falling back to defaults for missing keys and replacing
    /// out-of-range values.
    pub fn from_yaml(content: &str) -> Result<Self, serde_yaml::Error> {
        let mut settings: Settings = serde_yaml::from_str(content)?;
        settings.sanitize();
        Ok(settings)
    }

    fn sanitize(&mut self) {
        if !self.downsample_base.is_finite() || self.downsample_base <= 1.0 {
            warn!(
                "downsample_base {} must be > 1, using {}",
                self.downsample_base, DEFAULT_DOWNSAMPLE_BASE
            );
            self.downsample_base = DEFAULT_DOWNSAMPLE_BASE;
        }
        if self.max_downsample_exponent < 0 {
            self.max_downsample_exponent = 0;
        }
        if self.render_workers == 0 {
            self.render_workers = 1;
        }
    }

    #[must_use]
    pub fn view_config(&self) -> ViewConfig {
        ViewConfig {
            downsample_base: self.downsample_base,
            max_downsample_exponent: self.max_downsample_exponent,
            workers: self.render_workers,
            palette: TilePalette {
                background: image::Rgb(self.background),
                marker: image::Rgb(self.placeholder_marker),
            },
        }
    }
}

static SETTINGS: LazyLock<RwLock<Settings>> = LazyLock::new(|| RwLock::new(Settings::default()));

fn preferred_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|config| config.join(APP_NAME).join(SETTINGS_FILENAME))
}

/// Load settings from the config directory, writing defaults if the file
/// does not exist yet
pub fn load_settings() {
    let Some(path) = preferred_config_path() else {
        warn!("Could not determine config directory, using default settings");
        return;
    };

    if path.exists() {
        load_settings_from_path(&path);
    } else {
        info!("Settings file not found, creating with defaults at {path:?}");
        if let Ok(settings) = SETTINGS.read() {
            save_settings_to_file(&settings, &path);
        }
    }
}

pub fn load_settings_from_path(path: &Path) {
    match fs::read_to_string(path) {
        Ok(content) => match Settings::from_yaml(&content) {
            Ok(mut settings) => {
                debug!("Loaded settings from {path:?}");

                if settings.version < CURRENT_VERSION {
                    migrate_settings(&mut settings);
                    save_settings_to_file(&settings, path);
                }

                if let Ok(mut global) = SETTINGS.write() {
                    *global = settings;
                }
            }
            Err(e) => {
                error!("Failed to parse settings file {path:?}: {e}");
            }
        },
        Err(e) => {
            error!("Failed to read settings file {path:?}: {e}");
        }
    }
}

fn migrate_settings(settings: &mut Settings) {
    info!(
        "Migrating settings from v{} to v{}",
        settings.version, CURRENT_VERSION
    );

    settings.version = CURRENT_VERSION;
}

pub fn save_settings_to_file(settings: &Settings, path: &Path) {
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            if let Err(e) = fs::create_dir_all(parent) {
                error!("Failed to create config directory {parent:?}: {e}");
                return;
            }
        }
    }

    let content = generate_settings_yaml(settings);

    match fs::write(path, content) {
        Ok(()) => debug!("Saved settings to {path:?}"),
        Err(e) => error!("Failed to save settings to {path:?}: {e}"),
    }
}

fn generate_settings_yaml(settings: &Settings) -> String {
    let mut content = String::new();

    content.push_str(&format!("version: {}\n", settings.version));
    content.push_str("# Each zoom step scales by this factor (must be > 1)\n");
    content.push_str(&format!("downsample_base: {}\n", settings.downsample_base));
    content.push_str(&format!(
        "max_downsample_exponent: {}\n",
        settings.max_downsample_exponent
    ));
    content.push_str(&format!(
        "keyboard_scroll_amount: {}\n",
        settings.keyboard_scroll_amount
    ));
    content.push_str(&format!("render_workers: {}\n", settings.render_workers));
    content.push_str(&format!("background: {:?}\n", settings.background));
    content.push_str(&format!(
        "placeholder_marker: {:?}\n",
        settings.placeholder_marker
    ));

    content
}

// Public API for accessing settings

#[must_use]
pub fn current() -> Settings {
    SETTINGS
        .read()
        .map(|s| s.clone())
        .unwrap_or_default()
}

pub fn set_render_workers(workers: usize) {
    if let Ok(mut settings) = SETTINGS.write() {
        settings.render_workers = workers.max(1);
    }
}

pub fn set_downsample_base(base: f64) {
    if let Ok(mut settings) = SETTINGS.write() {
        settings.downsample_base = base;
        settings.sanitize();
    }
}

pub fn set_max_downsample_exponent(exponent: i32) {
    if let Ok(mut settings) = SETTINGS.write() {
        settings.max_downsample_exponent = exponent.max(0);
    }
}
