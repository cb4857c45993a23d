use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::classes::ColorMapping;
use crate::error::{GraftError, GraftResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TailwindVersion {
    #[default]
    V3,
    V4,
}

/// The `tailwind` section of a `components.json` project file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TailwindConfig {
    #[serde(default = "default_css_variables")]
    pub css_variables: bool,
    #[serde(default)]
    pub rtl: bool,
    #[serde(default)]
    pub prefix: Option<String>,
    #[serde(default)]
    pub base_color: Option<String>,
    /// Target stylesheet. Relative paths are resolved against the directory
    /// of the project file by [`load`].
    #[serde(default)]
    pub css: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectConfig {
    #[serde(default)]
    pub tailwind: TailwindConfig,
    #[serde(default)]
    pub tailwind_version: TailwindVersion,
}

impl Default for TailwindConfig {
    fn default() -> Self {
        Self {
            css_variables: default_css_variables(),
            rtl: false,
            prefix: None,
            base_color: None,
            css: None,
        }
    }
}

fn default_css_variables() -> bool {
    true
}

impl ProjectConfig {
    /// The configured class prefix, if any and non-empty.
    pub fn prefix(&self) -> Option<&str> {
        self.tailwind.prefix.as_deref().filter(|prefix| !prefix.is_empty())
    }

    /// The built-in palette named by `tailwind.baseColor`.
    pub fn base_color_mapping(&self) -> GraftResult<Option<ColorMapping>> {
        self.tailwind
            .base_color
            .as_deref()
            .map(base_color)
            .transpose()
    }
}

/// Loads a built-in base color palette by name.
pub fn base_color(name: &str) -> GraftResult<ColorMapping> {
    ColorMapping::builtin(name)
}

pub fn parse(text: &str) -> GraftResult<ProjectConfig> {
    Ok(serde_json::from_str(text)?)
}

/// Reads a `components.json`-style project file. Unknown keys are ignored.
pub fn load(path: &Path) -> GraftResult<ProjectConfig> {
    let text = fs::read_to_string(path).map_err(|source| GraftError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let mut config = parse(&text)?;
    if let (Some(css), Some(dir)) = (config.tailwind.css.as_mut(), path.parent()) {
        if css.is_relative() {
            *css = dir.join(&*css);
        }
    }
    log::debug!("loaded project config from {}", path.display());
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    #[test]
    fn parses_components_json() {
        let config = parse(
            r#"{
                "$schema": "https://ui.shadcn.com/schema.json",
                "style": "new-york",
                "tailwind": {
                    "config": "",
                    "css": "app/globals.css",
                    "baseColor": "zinc",
                    "cssVariables": false,
                    "prefix": "tw-"
                },
                "tailwindVersion": "v4"
            }"#,
        )
        .expect("config should parse");

        assert_eq!(config.tailwind_version, TailwindVersion::V4);
        assert!(!config.tailwind.css_variables);
        assert!(!config.tailwind.rtl);
        assert_eq!(config.prefix(), Some("tw-"));
        assert_eq!(config.tailwind.base_color.as_deref(), Some("zinc"));
        assert!(config.base_color_mapping().unwrap().is_some());
    }

    #[test]
    fn defaults_when_sections_are_missing() {
        let config = parse("{}").expect("config should parse");
        assert_eq!(config, ProjectConfig::default());
        assert_eq!(config.tailwind_version, TailwindVersion::V3);
        assert!(config.tailwind.css_variables);
        assert_eq!(config.prefix(), None);
        assert!(config.base_color_mapping().unwrap().is_none());
    }

    #[test]
    fn empty_prefix_counts_as_none() {
        let config = parse(r#"{"tailwind": {"prefix": ""}}"#).unwrap();
        assert_eq!(config.prefix(), None);
    }

    #[test]
    fn unknown_base_color_is_an_error() {
        let config = parse(r#"{"tailwind": {"baseColor": "teal"}}"#).unwrap();
        assert!(matches!(
            config.base_color_mapping(),
            Err(GraftError::UnknownBaseColor(_))
        ));
    }

    #[test]
    fn load_resolves_css_path_next_to_config() {
        let path = temp_path("stylegraft_config");
        let _ = fs::write(&path, r#"{"tailwind": {"css": "styles/globals.css"}}"#);
        let config = load(&path).expect("config should load");
        let expected = path.parent().unwrap().join("styles/globals.css");
        assert_eq!(config.tailwind.css.as_deref(), Some(expected.as_path()));
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn load_reports_missing_file() {
        let path = temp_path("stylegraft_missing");
        assert!(matches!(load(&path), Err(GraftError::Read { .. })));
    }

    fn temp_path(prefix: &str) -> std::path::PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        std::env::temp_dir().join(format!("{}_{}.json", prefix, nanos))
    }
}
