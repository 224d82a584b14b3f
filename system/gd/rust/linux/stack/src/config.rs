//! Audio gateway configuration, read from a JSON file.
//!
//! Every key is optional:
//!
//! ```json
//! {
//!     "max_hf_clients": 2,
//!     "inband_ringing_enabled": true,
//!     "wbs_enabled": true,
//!     "features": 3943
//! }
//! ```

use crate::headset::control_block::BTA_AG_MAX_NUM_CLIENTS;
use crate::headset::hfp::{AgFeatures, HfpCodecCapability};
use anyhow::{bail, Context, Result};
use serde_json::{Map, Value};
use std::path::Path;

pub const DEFAULT_MAX_HF_CLIENTS: usize = 1;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AgConfig {
    pub max_hf_clients: usize,
    pub inband_ringing_enabled: bool,
    pub wbs_enabled: bool,
    pub features: AgFeatures,
}

impl Default for AgConfig {
    fn default() -> Self {
        Self {
            max_hf_clients: DEFAULT_MAX_HF_CLIENTS,
            inband_ringing_enabled: false,
            wbs_enabled: true,
            features: AgFeatures::THREE_WAY
                | AgFeatures::ECNR
                | AgFeatures::REJECT
                | AgFeatures::ECS
                | AgFeatures::EXTERR
                | AgFeatures::VREC
                | AgFeatures::CODEC
                | AgFeatures::HF_IND
                | AgFeatures::ESCO_S4
                | AgFeatures::UNAT,
        }
    }
}

fn get_bool(obj: &Map<String, Value>, key: &str) -> Result<Option<bool>> {
    match obj.get(key) {
        None => Ok(None),
        Some(v) => Ok(Some(v.as_bool().with_context(|| format!("{} must be a boolean", key))?)),
    }
}

fn get_u64(obj: &Map<String, Value>, key: &str) -> Result<Option<u64>> {
    match obj.get(key) {
        None => Ok(None),
        Some(v) => {
            let n = v.as_u64().with_context(|| format!("{} must be an unsigned integer", key))?;
            Ok(Some(n))
        }
    }
}

impl AgConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json).context("Malformed audio gateway config")?;
        let obj = value.as_object().context("Audio gateway config must be a JSON object")?;
        let mut config = AgConfig::default();

        if let Some(n) = get_u64(obj, "max_hf_clients")? {
            if n == 0 || n > BTA_AG_MAX_NUM_CLIENTS as u64 {
                bail!("max_hf_clients must be within 1..={}, got {}", BTA_AG_MAX_NUM_CLIENTS, n);
            }
            config.max_hf_clients = n as usize;
        }
        if let Some(b) = get_bool(obj, "inband_ringing_enabled")? {
            config.inband_ringing_enabled = b;
        }
        if let Some(b) = get_bool(obj, "wbs_enabled")? {
            config.wbs_enabled = b;
        }
        if let Some(bits) = get_u64(obj, "features")? {
            config.features = u32::try_from(bits)
                .ok()
                .and_then(AgFeatures::from_bits)
                .with_context(|| format!("Unknown audio gateway feature bits 0x{:x}", bits))?;
        }

        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_json(&json).with_context(|| format!("Invalid config in {}", path.display()))
    }

    /// Features to advertise, adjusted for the in-band ringing and wideband speech switches.
    pub fn effective_features(&self) -> AgFeatures {
        let mut features = self.features;
        features.set(AgFeatures::INBAND, self.inband_ringing_enabled);
        if !self.wbs_enabled {
            features.remove(AgFeatures::CODEC);
        }
        features
    }

    pub fn local_codecs(&self) -> HfpCodecCapability {
        if self.wbs_enabled {
            HfpCodecCapability::CVSD | HfpCodecCapability::MSBC
        } else {
            HfpCodecCapability::CVSD
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_object_is_default() {
        assert_eq!(AgConfig::from_json("{}").unwrap(), AgConfig::default());
    }

    #[test]
    fn overrides() {
        let config = AgConfig::from_json(
            r#"{"max_hf_clients": 3, "inband_ringing_enabled": true, "wbs_enabled": false}"#,
        )
        .unwrap();
        assert_eq!(config.max_hf_clients, 3);
        assert!(config.effective_features().contains(AgFeatures::INBAND));
        assert!(!config.effective_features().contains(AgFeatures::CODEC));
        assert_eq!(config.local_codecs(), HfpCodecCapability::CVSD);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(AgConfig::from_json(r#"{"max_hf_clients": 0}"#).is_err());
        assert!(AgConfig::from_json(r#"{"max_hf_clients": 7}"#).is_err());
        assert!(AgConfig::from_json(r#"{"wbs_enabled": "yes"}"#).is_err());
        assert!(AgConfig::from_json(r#"{"features": 1048576}"#).is_err());
        assert!(AgConfig::from_json("[]").is_err());
        assert!(AgConfig::from_json("{").is_err());
    }

    #[test]
    fn features_from_bits() {
        let config = AgConfig::from_json(r#"{"features": 5}"#).unwrap();
        assert_eq!(config.features, AgFeatures::THREE_WAY | AgFeatures::VREC);
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"max_hf_clients": 2}}"#).unwrap();
        assert_eq!(AgConfig::load(file.path()).unwrap().max_hf_clients, 2);

        let missing = file.path().with_extension("missing");
        assert!(AgConfig::load(&missing).is_err());
    }
}
