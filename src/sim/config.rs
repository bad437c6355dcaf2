use log::warn;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use toml::Value;

/// Top-level simulation options, i.e. everything that is not machine
/// geometry. Lives in the `[sim]` section of the config TOML.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SimConfig {
    pub elf: String,
    pub timeout: u64,
    pub trace: String,
}

pub trait Config: DeserializeOwned + Default {
    fn from_section(section: Option<&Value>) -> Self {
        match section {
            Some(value) => value.clone().try_into().expect("cannot deserialize config"),
            None => {
                warn!("config section not found");
                Self::default()
            }
        }
    }
}

impl Config for SimConfig {}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            elf: "".to_string(),
            timeout: 10_000_000,
            trace: "".to_string(),
        }
    }
}
