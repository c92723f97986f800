//! Persisted user configuration
//!
//! Pen preview styles, serial line parameters and pacing speed live in a
//! plain JSON file. The core treats these as configuration values handed in
//! by the presentation layer; nothing here is read behind a caller's back.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::SettingsError;

/// Preview pen style: stroke width and RGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PenSettings {
    pub width: u32,
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

/// Data bits per character on the serial line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataBits {
    Five,
    Six,
    Seven,
    Eight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Parity {
    None,
    Odd,
    Even,
    Mark,
    Space,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopBits {
    One,
    OneAndHalf,
    Two,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlowControl {
    None,
    /// XON/XOFF
    Software,
    /// RTS/CTS
    Hardware,
}

/// Serial line parameters. The core never opens a port itself; these are
/// applied by whichever layer produces the channel handle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerialSettings {
    pub port: Option<String>,
    pub baud: u32,
    pub data_bits: DataBits,
    pub parity: Parity,
    pub stop_bits: StopBits,
    pub flow: FlowControl,
}

impl Default for SerialSettings {
    fn default() -> Self {
        Self {
            port: None,
            baud: 9600,
            data_bits: DataBits::Eight,
            parity: Parity::None,
            stop_bits: StopBits::One,
            flow: FlowControl::None,
        }
    }
}

/// Plot job configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlotSettings {
    /// Pace transmission to the physical speed below
    pub pace_to_speed: bool,
    /// Cutting/drawing speed in mm/s
    pub speed_mm_s: u32,
}

impl Default for PlotSettings {
    fn default() -> Self {
        Self {
            pace_to_speed: false,
            speed_mm_s: 50,
        }
    }
}

impl Default for PenSettings {
    fn default() -> Self {
        Self {
            width: 2,
            red: 100,
            green: 150,
            blue: 200,
        }
    }
}

/// The whole persisted settings tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub pen_down: PenSettings,
    pub pen_up: PenSettings,
    pub serial: SerialSettings,
    pub plot: PlotSettings,
    /// Last file the user loaded, restored into the open dialog
    pub last_file: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            pen_down: PenSettings::default(),
            // The pen-up preview pen is thinner and drawn dotted by the UI.
            pen_up: PenSettings {
                width: 1,
                red: 250,
                green: 150,
                blue: 150,
            },
            serial: SerialSettings::default(),
            plot: PlotSettings::default(),
            last_file: None,
        }
    }
}

impl Settings {
    pub fn load(path: &Path) -> Result<Settings, SettingsError> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Load, falling back to defaults when the file does not exist yet
    pub fn load_or_default(path: &Path) -> Result<Settings, SettingsError> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Settings::default())
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        let text = serde_json::to_string_pretty(self)?;
        fs::write(path, text)?;
        Ok(())
    }
}
