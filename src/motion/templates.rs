//! Named motion presets.

use crate::error::{ClipError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// File consulted when no template path is configured.
pub const DEFAULT_MOTION_CONFIG: &str = "motion_config.json";

/// Noise strength used when a template leaves it out.
pub const DEFAULT_NOISE_AUG_STRENGTH: f64 = 0.05;

/// A reusable bundle of motion parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotionTemplate {
    /// Motion intensity knob, 1-255.
    pub motion_bucket_id: u32,
    /// Conditioning noise strength; [`DEFAULT_NOISE_AUG_STRENGTH`] when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub noise_aug_strength: Option<f64>,
    /// Human-readable summary.
    #[serde(default)]
    pub description: String,
}

impl MotionTemplate {
    /// Creates a template.
    pub fn new(motion_bucket_id: u32, noise_aug_strength: f64) -> Self {
        Self {
            motion_bucket_id,
            noise_aug_strength: Some(noise_aug_strength),
            description: String::new(),
        }
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Noise strength with the default applied.
    pub fn noise_aug_strength(&self) -> f64 {
        self.noise_aug_strength.unwrap_or(DEFAULT_NOISE_AUG_STRENGTH)
    }
}

/// Templates keyed by name.
#[derive(Debug, Clone, PartialEq)]
pub struct MotionTemplateStore {
    templates: BTreeMap<String, MotionTemplate>,
}

impl Default for MotionTemplateStore {
    fn default() -> Self {
        Self::builtin()
    }
}

impl MotionTemplateStore {
    /// The two presets available without a template file.
    pub fn builtin() -> Self {
        let templates = BTreeMap::from([
            (
                "High Action".to_string(),
                MotionTemplate::new(127, 0.1).with_description("Fast, energetic camera and subject motion"),
            ),
            (
                "Cinematic Slow".to_string(),
                MotionTemplate::new(20, 0.02).with_description("Slow, steady cinematic drift"),
            ),
        ]);
        Self { templates }
    }

    /// Wraps an existing set of templates.
    pub fn from_templates(templates: BTreeMap<String, MotionTemplate>) -> Self {
        Self { templates }
    }

    /// Loads templates from `path`, or from [`DEFAULT_MOTION_CONFIG`] when `None`.
    ///
    /// A missing file yields the built-in presets.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path.map_or_else(|| PathBuf::from(DEFAULT_MOTION_CONFIG), Path::to_path_buf);

        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no motion template file, using built-in presets");
                return Ok(Self::builtin());
            }
            Err(source) => return Err(ClipError::ConfigIo { path, source }),
        };

        let templates: BTreeMap<String, MotionTemplate> =
            serde_json::from_str(&text).map_err(|e| ClipError::ConfigFormat {
                path: path.clone(),
                message: e.to_string(),
            })?;

        tracing::debug!(path = %path.display(), count = templates.len(), "loaded motion templates");
        Ok(Self { templates })
    }

    /// Returns a copy of the named template.
    pub fn get(&self, name: &str) -> Result<MotionTemplate> {
        self.templates
            .get(name)
            .cloned()
            .ok_or_else(|| ClipError::UnknownTemplate {
                name: name.to_string(),
                available: self.names(),
            })
    }

    /// Returns a copy of every template.
    pub fn list(&self) -> BTreeMap<String, MotionTemplate> {
        self.templates.clone()
    }

    /// Template names in sorted order.
    pub fn names(&self) -> Vec<String> {
        self.templates.keys().cloned().collect()
    }

    /// Number of templates.
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// Returns true if no templates are loaded.
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(dir: &tempfile::TempDir, contents: &str) -> PathBuf {
        let path = dir.path().join("motion.json");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_missing_file_falls_back_to_builtin() {
        let dir = tempfile::tempdir().unwrap();
        let store = MotionTemplateStore::load(Some(&dir.path().join("absent.json"))).unwrap();

        assert_eq!(store.names(), vec!["Cinematic Slow", "High Action"]);
        let high = store.get("High Action").unwrap();
        assert_eq!(high.motion_bucket_id, 127);
        assert_eq!(high.noise_aug_strength(), 0.1);
        let slow = store.get("Cinematic Slow").unwrap();
        assert_eq!(slow.motion_bucket_id, 20);
        assert_eq!(slow.noise_aug_strength(), 0.02);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            r#"{
                "Gentle Pan": {"motion_bucket_id": 40, "noise_aug_strength": 0.03, "description": "slow pan"},
                "Chaos": {"motion_bucket_id": 255}
            }"#,
        );

        let store = MotionTemplateStore::load(Some(&path)).unwrap();
        assert_eq!(store.len(), 2);
        let pan = store.get("Gentle Pan").unwrap();
        assert_eq!(pan.motion_bucket_id, 40);
        assert_eq!(pan.description, "slow pan");
        let chaos = store.get("Chaos").unwrap();
        assert_eq!(chaos.noise_aug_strength, None);
        assert_eq!(chaos.noise_aug_strength(), DEFAULT_NOISE_AUG_STRENGTH);
        assert!(store.get("High Action").is_err());
    }

    #[test]
    fn test_malformed_file_is_format_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "{ not json");
        let err = MotionTemplateStore::load(Some(&path)).unwrap_err();
        assert!(matches!(err, ClipError::ConfigFormat { .. }));
    }

    #[test]
    fn test_template_without_bucket_is_format_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, r#"{"Broken": {"noise_aug_strength": 0.1}}"#);
        let err = MotionTemplateStore::load(Some(&path)).unwrap_err();
        assert!(matches!(err, ClipError::ConfigFormat { ref message, .. } if message.contains("motion_bucket_id")));
    }

    #[test]
    fn test_non_object_top_level_is_format_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "[1, 2, 3]");
        assert!(matches!(
            MotionTemplateStore::load(Some(&path)),
            Err(ClipError::ConfigFormat { .. })
        ));
    }

    #[test]
    fn test_unreadable_path_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        // Reading a directory fails with something other than NotFound.
        let err = MotionTemplateStore::load(Some(dir.path())).unwrap_err();
        assert!(matches!(err, ClipError::ConfigIo { .. }));
    }

    #[test]
    fn test_unknown_template_lists_names() {
        let store = MotionTemplateStore::builtin();
        let err = store.get("nonexistent").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("nonexistent"));
        assert!(message.contains("High Action"));
        assert!(message.contains("Cinematic Slow"));
    }

    #[test]
    fn test_list_returns_copy() {
        let store = MotionTemplateStore::builtin();
        let mut listed = store.list();
        listed.remove("High Action");
        listed.get_mut("Cinematic Slow").unwrap().motion_bucket_id = 99;

        assert_eq!(store.get("High Action").unwrap().motion_bucket_id, 127);
        assert_eq!(store.get("Cinematic Slow").unwrap().motion_bucket_id, 20);
    }
}
