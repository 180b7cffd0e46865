//! Engine configuration, loaded from YAML (or JSON).

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::argument::parse_timezone;
use crate::context::{JsonDataProvider, RuntimeFormulaContext};
use crate::rich_text::EditorMode;
use crate::value::Value;

/// How formula text is treated by [`crate::resolve_formula`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FormulaMode {
    #[default]
    Simple,
    Advanced,
    /// The text is returned verbatim without being parsed.
    Raw,
}

impl FormulaMode {
    /// The editor flavour used for rich-text conversion. Raw text has none.
    pub fn editor_mode(&self) -> Option<EditorMode> {
        match self {
            FormulaMode::Simple => Some(EditorMode::Simple),
            FormulaMode::Advanced => Some(EditorMode::Advanced),
            FormulaMode::Raw => None,
        }
    }
}

impl std::str::FromStr for FormulaMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "simple" => Ok(FormulaMode::Simple),
            "advanced" => Ok(FormulaMode::Advanced),
            "raw" => Ok(FormulaMode::Raw),
            _ => Err(anyhow::anyhow!("Unknown formula mode: {}", s)),
        }
    }
}

/// Value returned in place of a formula that failed to evaluate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Fallback {
    #[default]
    EmptyString,
    Null,
}

impl Fallback {
    pub fn value(&self) -> Value {
        match self {
            Fallback::EmptyString => Value::String(String::new()),
            Fallback::Null => Value::Null,
        }
    }
}

/// Top-level engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct EngineConfig {
    /// IANA zone for calendar fields and `datetime_format` defaults.
    #[serde(default)]
    pub timezone: Option<String>,

    #[serde(default)]
    pub mode: FormulaMode,

    #[serde(default)]
    pub fallback: Fallback,

    /// Static data trees, one provider per key.
    #[serde(default)]
    pub providers: BTreeMap<String, Value>,
}

impl EngineConfig {
    /// The configured timezone, if any. Unknown names are an error.
    pub fn timezone(&self) -> Result<Option<Tz>> {
        self.timezone
            .as_deref()
            .map(|name| {
                parse_timezone(name).with_context(|| format!("Unknown timezone: {name}"))
            })
            .transpose()
    }

    /// Builds a runtime context serving the configured providers.
    pub fn into_context(self) -> Result<RuntimeFormulaContext> {
        let timezone = self.timezone()?;
        let mut context = RuntimeFormulaContext::default();
        if let Some(timezone) = timezone {
            context = context.with_timezone(timezone);
        }
        for (name, data) in self.providers {
            context.register_provider(Box::new(JsonDataProvider::new(name, data)));
        }
        Ok(context)
    }
}

/// Loads a configuration file from the provided path.
pub fn load_config(path: impl AsRef<Path>) -> Result<EngineConfig> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    from_yaml_str(&contents)
}

/// Deserializes a configuration from a YAML string slice.
pub fn from_yaml_str(yaml: &str) -> Result<EngineConfig> {
    Ok(serde_norway::from_str(yaml)?)
}

/// Deserializes a configuration from a YAML reader.
pub fn from_yaml_reader<R>(reader: R) -> Result<EngineConfig>
where
    R: std::io::Read,
{
    Ok(serde_norway::from_reader(reader)?)
}
