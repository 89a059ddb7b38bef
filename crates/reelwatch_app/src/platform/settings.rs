use std::path::{Path, PathBuf};

use engine_logging::{engine_error, engine_info, engine_warn};
use reelwatch_core::JobOptions;
use reelwatch_engine::AtomicFileWriter;
use serde::{Deserialize, Serialize};

pub const SETTINGS_FILENAME: &str = "settings.ron";

/// Last-used generation configuration, kept in the state directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    pub voice: String,
    pub resolution: String,
    pub bgm: String,
    pub subtitle_style: Option<String>,
    pub font_name: Option<String>,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self::from_options(&JobOptions::default())
    }
}

/// Values given on the command line; `None` keeps the saved value.
#[derive(Debug, Clone, Default)]
pub struct SettingsOverrides {
    pub voice: Option<String>,
    pub resolution: Option<String>,
    pub bgm: Option<String>,
    pub subtitle_style: Option<String>,
    pub font_name: Option<String>,
}

impl GenerationSettings {
    pub fn from_options(options: &JobOptions) -> Self {
        Self {
            voice: options.voice.clone(),
            resolution: options.resolution.clone(),
            bgm: options.bgm.clone(),
            subtitle_style: options.subtitle_style.clone(),
            font_name: options.font_name.clone(),
        }
    }

    pub fn merge(self, overrides: SettingsOverrides) -> Self {
        Self {
            voice: overrides.voice.unwrap_or(self.voice),
            resolution: overrides.resolution.unwrap_or(self.resolution),
            bgm: overrides.bgm.unwrap_or(self.bgm),
            subtitle_style: overrides.subtitle_style.or(self.subtitle_style),
            font_name: overrides.font_name.or(self.font_name),
        }
    }

    /// Blank subtitle style or font means "let the backend choose".
    pub fn to_options(&self) -> JobOptions {
        JobOptions {
            voice: self.voice.clone(),
            resolution: self.resolution.clone(),
            bgm: self.bgm.clone(),
            subtitle_style: non_blank(&self.subtitle_style),
            font_name: non_blank(&self.font_name),
            image_config: None,
        }
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

pub(crate) fn load_settings(state_dir: &Path) -> GenerationSettings {
    let writer = AtomicFileWriter::new(PathBuf::from(state_dir));
    let content = match writer.read_to_string(SETTINGS_FILENAME) {
        Ok(Some(text)) => text,
        Ok(None) => return GenerationSettings::default(),
        Err(err) => {
            engine_warn!("Failed to read settings from {:?}: {}", state_dir, err);
            return GenerationSettings::default();
        }
    };

    match ron::from_str(&content) {
        Ok(settings) => {
            engine_info!("Loaded settings from {:?}", writer.path(SETTINGS_FILENAME));
            settings
        }
        Err(err) => {
            engine_warn!("Failed to parse settings in {:?}: {}", state_dir, err);
            GenerationSettings::default()
        }
    }
}

pub(crate) fn save_settings(state_dir: &Path, settings: &GenerationSettings) {
    let pretty = ron::ser::PrettyConfig::new();
    let content = match ron::ser::to_string_pretty(settings, pretty) {
        Ok(text) => text,
        Err(err) => {
            engine_error!("Failed to serialize settings: {}", err);
            return;
        }
    };

    let writer = AtomicFileWriter::new(PathBuf::from(state_dir));
    if let Err(err) = writer.write(SETTINGS_FILENAME, content.as_bytes()) {
        engine_error!("Failed to write settings to {:?}: {}", state_dir, err);
    }
}
