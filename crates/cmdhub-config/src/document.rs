//! Open-ended JSON configuration document

use cmdhub_foundation::{is_valid_language_code, CmdhubError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const PREFERRED_LANGUAGE_KEY: &str = "preferredLanguage";
pub const REPOSITORY_URL_KEY: &str = "repositoryURL";

/// A JSON object with two recognized keys
///
/// Unknown keys are preserved verbatim so that newer tool versions can add
/// settings without older versions dropping them on write.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigDocument(Map<String, Value>);

impl ConfigDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept only JSON objects
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(CmdhubError::invalid_config(format!(
                "configuration must be a JSON object, got {}",
                json_type_name(&other)
            ))),
        }
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.0.insert(key.into(), value);
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    pub fn preferred_language(&self) -> Option<&str> {
        self.0.get(PREFERRED_LANGUAGE_KEY).and_then(Value::as_str)
    }

    pub fn repository_url(&self) -> Option<&str> {
        self.0.get(REPOSITORY_URL_KEY).and_then(Value::as_str)
    }

    pub fn set_preferred_language(&mut self, code: impl Into<String>) {
        self.set(PREFERRED_LANGUAGE_KEY, Value::String(code.into()));
    }

    pub fn set_repository_url(&mut self, url: impl Into<String>) {
        self.set(REPOSITORY_URL_KEY, Value::String(url.into()));
    }

    /// Check the two recognized keys; everything else passes through
    pub fn validate(&self) -> Result<()> {
        if let Some(value) = self.0.get(PREFERRED_LANGUAGE_KEY) {
            let valid = value.as_str().map(is_valid_language_code).unwrap_or(false);
            if !valid {
                return Err(CmdhubError::invalid_config(format!(
                    "{PREFERRED_LANGUAGE_KEY} must be a 2-3 letter lowercase language code, got {value}"
                )));
            }
        }

        if let Some(value) = self.0.get(REPOSITORY_URL_KEY) {
            let valid = value
                .as_str()
                .map(|s| url::Url::parse(s).is_ok())
                .unwrap_or(false);
            if !valid {
                return Err(CmdhubError::invalid_config(format!(
                    "{REPOSITORY_URL_KEY} must be a valid URL, got {value}"
                )));
            }
        }

        Ok(())
    }
}

/// Merge project over user, key by key
///
/// Nested objects are merged recursively; any non-object project value
/// replaces the user value at that position.
pub fn merge_documents(
    project: Option<&ConfigDocument>,
    user: Option<&ConfigDocument>,
) -> ConfigDocument {
    let mut merged = user.map(|u| u.0.clone()).unwrap_or_default();
    if let Some(project) = project {
        merge_maps(&mut merged, &project.0);
    }
    ConfigDocument(merged)
}

fn merge_maps(base: &mut Map<String, Value>, overlay: &Map<String, Value>) {
    for (key, value) in overlay {
        match (base.get_mut(key), value) {
            (Some(Value::Object(existing)), Value::Object(incoming)) => {
                merge_maps(existing, incoming);
            }
            _ => {
                base.insert(key.clone(), value.clone());
            }
        }
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
