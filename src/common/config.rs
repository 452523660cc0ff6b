use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::layout_engine::Orientation;
use crate::model::BorderStyle;

const MAX_FONT_HEIGHT: u32 = 200;

pub fn data_dir() -> PathBuf {
    dirs::data_dir().unwrap_or_else(|| PathBuf::from(".")).join("contree")
}
pub fn restore_file() -> PathBuf { data_dir().join("layout.ron") }
pub fn config_file() -> PathBuf {
    dirs::config_dir().unwrap_or_else(|| PathBuf::from(".")).join("contree").join("config.toml")
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub settings: Settings,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// Restore the tree from [`restore_file`] on startup.
    #[serde(default = "yes")]
    pub restore_layout: bool,
    #[serde(default)]
    pub layout: LayoutSettings,
}

/// Everything the container tree needs to know to make layout decisions.
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct LayoutSettings {
    /// Font height in pixels; decorations are 5 pixels taller.
    #[serde(default = "default_font_height")]
    pub font_height: u32,
    #[serde(default)]
    pub default_border: BorderStyle,
    #[serde(default = "default_orientation")]
    pub default_orientation: Orientation,
    #[serde(default = "yes")]
    pub auto_float_transients: bool,
    /// Separator drags closer than this to the parent's edge are ignored.
    #[serde(default = "default_resize_edge_margin")]
    pub resize_edge_margin: u32,
    #[serde(default)]
    pub floating: FloatingSettings,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct FloatingSettings {
    #[serde(default = "default_floating_minimum_width")]
    pub minimum_width: u32,
    #[serde(default = "default_floating_minimum_height")]
    pub minimum_height: u32,
    #[serde(default = "default_floating_move_step")]
    pub move_step: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            restore_layout: true,
            layout: LayoutSettings::default(),
        }
    }
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            font_height: default_font_height(),
            default_border: BorderStyle::default(),
            default_orientation: default_orientation(),
            auto_float_transients: true,
            resize_edge_margin: default_resize_edge_margin(),
            floating: FloatingSettings::default(),
        }
    }
}

impl Default for FloatingSettings {
    fn default() -> Self {
        Self {
            minimum_width: default_floating_minimum_width(),
            minimum_height: default_floating_minimum_height(),
            move_step: default_floating_move_step(),
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Vec<String> { self.layout.validate() }

    pub fn auto_fix_values(&mut self) -> usize { self.layout.auto_fix_values() }
}

impl LayoutSettings {
    /// Height of a title bar.
    pub fn deco_height(&self) -> u32 { self.font_height + 5 }

    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if self.font_height == 0 {
            issues.push("font_height must be positive".to_string());
        }
        if self.font_height > MAX_FONT_HEIGHT {
            issues.push(format!(
                "font_height should not exceed {MAX_FONT_HEIGHT}, got {}",
                self.font_height
            ));
        }

        issues.extend(self.floating.validate());

        issues
    }

    pub fn auto_fix_values(&mut self) -> usize {
        let mut fixes = 0;

        if self.font_height == 0 || self.font_height > MAX_FONT_HEIGHT {
            self.font_height = default_font_height();
            fixes += 1;
        }

        fixes + self.floating.auto_fix_values()
    }
}

impl FloatingSettings {
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if self.minimum_width == 0 || self.minimum_height == 0 {
            issues.push(format!(
                "floating minimum size must be positive, got {}x{}",
                self.minimum_width, self.minimum_height
            ));
        }
        if self.move_step == 0 {
            issues.push("floating move_step must be positive".to_string());
        }

        issues
    }

    pub fn auto_fix_values(&mut self) -> usize {
        let mut fixes = 0;

        if self.minimum_width == 0 {
            self.minimum_width = default_floating_minimum_width();
            fixes += 1;
        }
        if self.minimum_height == 0 {
            self.minimum_height = default_floating_minimum_height();
            fixes += 1;
        }
        if self.move_step == 0 {
            self.move_step = default_floating_move_step();
            fixes += 1;
        }

        fixes
    }
}

fn yes() -> bool { true }

fn default_font_height() -> u32 { 13 }

fn default_orientation() -> Orientation { Orientation::Horizontal }

fn default_resize_edge_margin() -> u32 { 25 }

fn default_floating_minimum_width() -> u32 { 75 }

fn default_floating_minimum_height() -> u32 { 50 }

fn default_floating_move_step() -> u32 { 10 }

impl Config {
    pub fn read(path: &Path) -> anyhow::Result<Config> {
        let buf = std::fs::read_to_string(path)?;
        Self::parse(&buf)
    }

    pub fn default() -> Config { Self::parse(include_str!("../../contree.default.toml")).unwrap() }

    /// Reads the config at `path`, falling back to the defaults when the file
    /// does not exist.
    pub fn read_or_default(path: &Path) -> anyhow::Result<Config> {
        if path.exists() {
            Self::read(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let toml_string = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, toml_string.as_bytes())?;

        Ok(())
    }

    /// Validates the entire configuration and returns a list of issues found.
    pub fn validate(&self) -> Vec<String> { self.settings.validate() }

    /// Attempts to fix configuration values automatically.
    /// Returns the number of fixes applied.
    pub fn auto_fix_values(&mut self) -> usize { self.settings.auto_fix_values() }

    fn parse(buf: &str) -> anyhow::Result<Config> {
        let c: Config = toml::from_str(buf)?;
        Ok(c)
    }
}
