//! The engine input record: the active harmonics plus one settings record.
//!
//! Loaded from JSON (`--input`) or assembled from command-line options. Every
//! value passes through the same clamping as editor input before it reaches
//! the engine.

use super::harmonic::HarmonicId;
use super::set::HarmonicSet;
use super::settings::AudioSettings;
use crate::error::{Result, SynthError};
use serde::{Deserialize, Serialize};

/// Harmonic list and settings handed to the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineInput {
    /// Active harmonics, ordered by id.
    pub harmonics: HarmonicSet,

    #[serde(default)]
    pub settings: AudioSettings,
}

impl EngineInput {
    /// Parses a JSON record.
    ///
    /// Amplitudes and settings are clamped into their ranges.
    ///
    /// # Errors
    ///
    /// `InvalidParameter` for malformed JSON, ids outside 1-32, NaN amplitudes
    /// or settings that stay unusable after clamping.
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: EngineInput = serde_json::from_str(json)
            .map_err(|e| SynthError::invalid(format!("engine input: {}", e)))?;
        raw.sanitized()
    }

    /// Serializes the record as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| SynthError::invalid(format!("engine input: {}", e)))
    }

    fn sanitized(self) -> Result<Self> {
        let mut settings = AudioSettings::default();
        settings.set_fundamental_frequency(self.settings.fundamental_frequency);
        settings.set_duration(self.settings.duration);
        settings.set_master_volume(self.settings.master_volume);
        settings.validate()?;

        Ok(Self {
            harmonics: self.harmonics,
            settings,
        })
    }
}

/// Parses a compact `id:amplitude` list such as `1:1.0,3:0.5,5:0.25`.
///
/// An entry without `:amplitude` gets full amplitude.
///
/// # Errors
///
/// `InvalidParameter` for unparsable entries or ids outside 1-32,
/// `DuplicateHarmonic` when an id appears twice.
pub fn parse_harmonic_list(list: &str) -> Result<HarmonicSet> {
    let mut set = HarmonicSet::new();
    for entry in list.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let (id, amplitude) = match entry.split_once(':') {
            Some((id, amplitude)) => (id.trim(), amplitude.trim()),
            None => (entry, "1.0"),
        };
        let id = id
            .parse::<u8>()
            .map_err(|_| SynthError::invalid(format!("bad harmonic number '{}'", id)))
            .and_then(HarmonicId::new)?;
        let amplitude = amplitude
            .parse::<f32>()
            .map_err(|_| SynthError::invalid(format!("bad amplitude '{}'", amplitude)))?;
        set.add(id, amplitude)?;
    }
    Ok(set)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: u8) -> HarmonicId {
        HarmonicId::new(n).unwrap()
    }

    #[test]
    fn test_from_json_clamps() {
        let json = r#"{
            "harmonics": [
                {"id": 3, "amplitude": 1.5, "is_muted": true},
                {"id": 1, "amplitude": 0.5}
            ],
            "settings": {"fundamental_frequency": 5000.0, "duration": 1.0, "master_volume": 0.5}
        }"#;
        let input = EngineInput::from_json(json).unwrap();
        let ids: Vec<u8> = input.harmonics.ids().map(HarmonicId::get).collect();
        assert_eq!(ids, vec![1, 3]);
        assert_eq!(input.harmonics.get(id(3)).amplitude, 1.0);
        assert!(input.harmonics.get(id(3)).is_muted);
        assert_eq!(input.settings.fundamental_frequency, 2000.0);
        assert_eq!(input.settings.duration, 1.0);
    }

    #[test]
    fn test_from_json_defaults_settings() {
        let input = EngineInput::from_json(r#"{"harmonics": [{"id": 2, "amplitude": 0.3}]}"#)
            .unwrap();
        assert_eq!(input.settings, AudioSettings::default());
    }

    #[test]
    fn test_from_json_rejects_bad_id() {
        let result = EngineInput::from_json(r#"{"harmonics": [{"id": 40, "amplitude": 0.3}]}"#);
        assert!(matches!(result, Err(SynthError::InvalidParameter(_))));
    }

    #[test]
    fn test_json_round_trip() {
        let mut harmonics = HarmonicSet::default();
        harmonics.add(id(7), 0.25).unwrap();
        harmonics.toggle_lock(id(7));
        let input = EngineInput {
            harmonics,
            settings: AudioSettings::default(),
        };
        let json = input.to_json().unwrap();
        assert_eq!(EngineInput::from_json(&json).unwrap(), input);
    }

    #[test]
    fn test_parse_harmonic_list() {
        let set = parse_harmonic_list("1:1.0, 3:0.5,5").unwrap();
        assert_eq!(set.len(), 3);
        assert_eq!(set.get(id(3)).amplitude, 0.5);
        assert_eq!(set.get(id(5)).amplitude, 1.0);

        assert!(matches!(
            parse_harmonic_list("2:0.1,2:0.4"),
            Err(SynthError::DuplicateHarmonic(2))
        ));
        assert!(parse_harmonic_list("0:0.5").is_err());
        assert!(parse_harmonic_list("3:loud").is_err());
        assert!(parse_harmonic_list("").unwrap().is_empty());
    }
}
