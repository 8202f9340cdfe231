//! Simple settings persistence for pshift
//!
//! Stores the engine defaults the probe starts from.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use pshift_dsp::{Normalization, ShiftParams};
use thiserror::Error;

/// Errors that can occur while loading or saving settings
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("invalid value {value:?} for {key} on line {line}")]
    InvalidValue {
        key: String,
        value: String,
        line: usize,
    },
}

/// Persisted engine settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Settings {
    pub frame_size: usize,
    pub oversample: usize,
    pub sample_rate: f32,
    pub normalization: Normalization,
}

impl Default for Settings {
    fn default() -> Self {
        let params = ShiftParams::default();
        Self {
            frame_size: params.frame_size,
            oversample: params.oversample,
            sample_rate: params.sample_rate,
            normalization: params.normalization,
        }
    }
}

impl Settings {
    /// Load settings from the default location
    ///
    /// A missing file yields the defaults; a malformed one is an error.
    pub fn load() -> Result<Self, SettingsError> {
        let path = Self::config_path();
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    /// Load settings from a specific path
    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Save settings to the default location
    pub fn save(&self) -> Result<PathBuf, SettingsError> {
        let path = Self::config_path();
        self.save_to(&path)?;
        Ok(path)
    }

    /// Save settings to a specific path
    pub fn save_to(&self, path: &Path) -> Result<(), SettingsError> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(path, self.serialize())?;
        Ok(())
    }

    /// Get the default settings file path
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("pshift")
            .join("config.txt")
    }

    /// Engine parameters for a one-shot, per-call engine
    pub fn to_params(&self) -> ShiftParams {
        ShiftParams {
            frame_size: self.frame_size,
            oversample: self.oversample,
            sample_rate: self.sample_rate,
            normalization: self.normalization,
            ..Default::default()
        }
    }

    /// Parse settings from simple key=value format
    fn parse(content: &str) -> Result<Self, SettingsError> {
        let mut settings = Self::default();

        for (index, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let key = key.trim();
            let value = value.trim();
            let invalid = || SettingsError::InvalidValue {
                key: key.to_string(),
                value: value.to_string(),
                line: index + 1,
            };

            match key {
                "frame_size" => settings.frame_size = value.parse().map_err(|_| invalid())?,
                "oversample" => settings.oversample = value.parse().map_err(|_| invalid())?,
                "sample_rate" => settings.sample_rate = value.parse().map_err(|_| invalid())?,
                "normalization" => {
                    settings.normalization = parse_normalization(value).ok_or_else(invalid)?
                }
                _ => {} // Ignore unknown keys
            }
        }

        Ok(settings)
    }

    /// Serialize settings to simple key=value format
    fn serialize(&self) -> String {
        let lines = [
            "# pshift settings".to_string(),
            format!("frame_size={}", self.frame_size),
            format!("oversample={}", self.oversample),
            format!("sample_rate={}", self.sample_rate),
            format!("normalization={}", normalization_name(self.normalization)),
        ];
        lines.join("\n")
    }
}

pub fn normalization_name(normalization: Normalization) -> &'static str {
    match normalization {
        Normalization::Reference => "reference",
        Normalization::UnityGain => "unity",
    }
}

fn parse_normalization(value: &str) -> Option<Normalization> {
    match value {
        "reference" => Some(Normalization::Reference),
        "unity" => Some(Normalization::UnityGain),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty() {
        let settings = Settings::parse("").unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_parse_values() {
        let content = "frame_size=2048\noversample=32\nsample_rate=48000\nnormalization=unity";
        let settings = Settings::parse(content).unwrap();

        assert_eq!(settings.frame_size, 2048);
        assert_eq!(settings.oversample, 32);
        assert_eq!(settings.sample_rate, 48000.0);
        assert_eq!(settings.normalization, Normalization::UnityGain);
    }

    #[test]
    fn test_parse_with_comments_and_unknown_keys() {
        let content = "# Comment\noversample = 4\ncolor=green\n# Another comment";
        let settings = Settings::parse(content).unwrap();
        assert_eq!(settings.oversample, 4);
        assert_eq!(settings.frame_size, 1024);
    }

    #[test]
    fn test_parse_reports_bad_value() {
        let err = Settings::parse("frame_size=1024\noversample=lots").unwrap_err();
        match err {
            SettingsError::InvalidValue { key, value, line } => {
                assert_eq!(key, "oversample");
                assert_eq!(value, "lots");
                assert_eq!(line, 2);
            }
            other => panic!("unexpected error: {}", other),
        }

        assert!(Settings::parse("normalization=loud").is_err());
    }

    #[test]
    fn test_serialize_roundtrip() {
        let settings = Settings {
            frame_size: 4096,
            oversample: 16,
            sample_rate: 22050.0,
            normalization: Normalization::UnityGain,
        };

        let parsed = Settings::parse(&settings.serialize()).unwrap();
        assert_eq!(parsed, settings);
    }

    #[test]
    fn test_save_and_load_file() {
        let path = std::env::temp_dir()
            .join(format!("pshift-settings-{}", std::process::id()))
            .join("config.txt");
        let settings = Settings {
            oversample: 8,
            ..Default::default()
        };

        settings.save_to(&path).unwrap();
        let loaded = Settings::load_from(&path).unwrap();
        assert_eq!(loaded, settings);

        if let Some(dir) = path.parent() {
            let _ = fs::remove_dir_all(dir);
        }
    }

    #[test]
    fn test_to_params_is_valid_by_default() {
        assert!(Settings::default().to_params().validate().is_ok());
    }
}
