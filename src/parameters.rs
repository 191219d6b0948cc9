use crate::{
    annotated_record::RecordClass,
    error::{EngineError, EngineResult, ErrorCode},
    feature_table::TABLE_FEATURE_KINDS,
    nucleotide_content::{DEFAULT_SMOOTH, DEFAULT_WINDOW},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisParameters {
    pub window: usize,
    pub smooth: usize,
    pub record_class: RecordClass,
}

impl Default for AnalysisParameters {
    fn default() -> Self {
        Self {
            window: DEFAULT_WINDOW,
            smooth: DEFAULT_SMOOTH,
            record_class: RecordClass::Genome,
        }
    }
}

impl AnalysisParameters {
    /// Feature kinds that produce table rows. Not configurable.
    pub fn feature_kinds(&self) -> &'static [&'static str] {
        &TABLE_FEATURE_KINDS
    }

    pub fn load_from_path(path: &str) -> EngineResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| EngineError::io(format!("Could not read parameter file '{path}': {e}")))?;
        serde_json::from_str(&text).map_err(|e| {
            EngineError::invalid_input(format!("Could not parse parameter JSON '{path}': {e}"))
        })
    }

    pub fn save_to_path(&self, path: &str) -> EngineResult<()> {
        let text = serde_json::to_string_pretty(self).map_err(|e| {
            EngineError::new(
                ErrorCode::Internal,
                format!("Could not serialize parameters: {e}"),
            )
        })?;
        std::fs::write(path, text)
            .map_err(|e| EngineError::io(format!("Could not write parameter file '{path}': {e}")))
    }

    /// Sets one named parameter from a JSON value.
    pub fn set(&mut self, name: &str, value: &serde_json::Value) -> EngineResult<()> {
        match name {
            "window" => self.window = Self::positive(name, value)?,
            "smooth" => self.smooth = Self::positive(name, value)?,
            "record_class" => {
                self.record_class = serde_json::from_value(value.clone()).map_err(|e| {
                    EngineError::invalid_input(format!("Invalid value for '{name}': {e}"))
                })?
            }
            _ => {
                return Err(EngineError::new(
                    ErrorCode::NotFound,
                    format!("Unknown parameter '{name}'"),
                ));
            }
        }
        Ok(())
    }

    fn positive(name: &str, value: &serde_json::Value) -> EngineResult<usize> {
        value
            .as_u64()
            .filter(|v| *v > 0)
            .map(|v| v as usize)
            .ok_or_else(|| {
                EngineError::invalid_input(format!(
                    "Parameter '{name}' must be a positive integer, got {value}"
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn partial_json_keeps_defaults() {
        let td = tempdir().unwrap();
        let path = td.path().join("params.json");
        std::fs::write(&path, r#"{ "smooth": 51, "record_class": "plasmid" }"#).unwrap();
        let params = AnalysisParameters::load_from_path(&path.to_string_lossy()).unwrap();
        assert_eq!(params.window, 100);
        assert_eq!(params.smooth, 51);
        assert_eq!(params.record_class, RecordClass::Plasmid);
    }

    #[test]
    fn save_and_load() {
        let td = tempdir().unwrap();
        let path = td.path().join("params.json").to_string_lossy().to_string();
        let params = AnalysisParameters {
            window: 50,
            ..AnalysisParameters::default()
        };
        params.save_to_path(&path).unwrap();
        assert_eq!(AnalysisParameters::load_from_path(&path).unwrap(), params);
    }

    #[test]
    fn missing_or_bad_file_is_an_error() {
        let td = tempdir().unwrap();
        let missing = td.path().join("nope.json");
        let err = AnalysisParameters::load_from_path(&missing.to_string_lossy()).unwrap_err();
        assert_eq!(err.code, ErrorCode::Io);

        let bad = td.path().join("bad.json");
        std::fs::write(&bad, "{ window: ").unwrap();
        let err = AnalysisParameters::load_from_path(&bad.to_string_lossy()).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidInput);
    }

    #[test]
    fn set_validates_values() {
        let mut params = AnalysisParameters::default();
        params.set("window", &serde_json::json!(20)).unwrap();
        assert_eq!(params.window, 20);
        assert!(params.set("window", &serde_json::json!(0)).is_err());
        assert!(params.set("smooth", &serde_json::json!("big")).is_err());
        params
            .set("record_class", &serde_json::json!("plasmid"))
            .unwrap();
        assert_eq!(params.record_class, RecordClass::Plasmid);
        assert!(params.set("colour", &serde_json::json!(1)).is_err());
    }
}
