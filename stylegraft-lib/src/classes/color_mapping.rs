use std::collections::HashMap;
use std::fs;
use std::path::Path;

use indexmap::IndexSet;
use serde::Deserialize;

use crate::classes::token::ClassToken;
use crate::error::{GraftError, GraftResult};

const BASE_COLORS_JSON: &str = include_str!("base_colors.json");

/// Utility prefixes that carry a color. Two prefixes never both match the
/// same class (`ring-offset-x` has no `ring-` color key), so order does not
/// matter here.
const COLOR_UTILITY_PREFIXES: [&str; 5] = ["bg-", "text-", "border-", "ring-offset-", "ring-"];

/// Semantic color name -> palette shade, e.g. `"background" -> "white"`,
/// for light and dark mode.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ColorMapping {
    #[serde(default)]
    pub light: HashMap<String, String>,
    #[serde(default)]
    pub dark: HashMap<String, String>,
}

/// Registry base color document; only the inline palette matters here.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BaseColor {
    name: String,
    inline_colors: ColorMapping,
}

impl ColorMapping {
    /// One of the built-in palettes: slate, gray, zinc, neutral or stone.
    pub fn builtin(name: &str) -> GraftResult<Self> {
        let palettes: Vec<BaseColor> = serde_json::from_str(BASE_COLORS_JSON)?;
        palettes
            .into_iter()
            .find(|palette| palette.name == name)
            .map(|palette| palette.inline_colors)
            .ok_or_else(|| GraftError::UnknownBaseColor(name.to_string()))
    }

    pub fn builtin_names() -> GraftResult<Vec<String>> {
        let palettes: Vec<BaseColor> = serde_json::from_str(BASE_COLORS_JSON)?;
        Ok(palettes.into_iter().map(|palette| palette.name).collect())
    }

    /// Accepts either a bare `{ "light": .., "dark": .. }` mapping or a
    /// registry base color document with an `inlineColors` member.
    pub fn from_json(text: &str) -> GraftResult<Self> {
        let value: serde_json::Value = serde_json::from_str(text)?;
        match value.get("inlineColors") {
            Some(inline) => Ok(serde_json::from_value(inline.clone())?),
            None => Ok(serde_json::from_value(value)?),
        }
    }

    pub fn load(path: &Path) -> GraftResult<Self> {
        let text = fs::read_to_string(path).map_err(|source| GraftError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    pub fn is_empty(&self) -> bool {
        self.light.is_empty() && self.dark.is_empty()
    }
}

/// Rewrites semantic color utilities into palette classes: one class for
/// light mode and a `dark:` class for dark mode, light classes first.
///
/// A bare `border` also gains `border-border` so the border color follows
/// the palette.
pub fn apply_color_mapping(input: &str, mapping: &ColorMapping) -> String {
    let input = if input.contains(" border ") {
        input.replacen(" border ", " border border-border ", 1)
    } else {
        input.to_string()
    };

    let mut light_classes = IndexSet::new();
    let mut dark_classes = IndexSet::new();

    for class in input.split_whitespace() {
        let token = ClassToken::parse(class);
        let mapped = token
            .utility
            .as_deref()
            .and_then(|utility| semantic_color(utility, mapping));

        let Some((prefix, color)) = mapped else {
            light_classes.insert(class.to_string());
            continue;
        };

        if let Some(shade) = mapping.light.get(color) {
            light_classes.insert(token.with_utility(format!("{}{}", prefix, shade)).to_string());
        }
        if let Some(shade) = mapping.dark.get(color) {
            dark_classes.insert(
                token
                    .with_utility(format!("{}{}", prefix, shade))
                    .with_outer_variant("dark")
                    .to_string(),
            );
        }
    }

    light_classes
        .into_iter()
        .chain(dark_classes)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Splits `bg-primary` into `("bg-", "primary")` when `primary` is a light
/// mode key of the mapping.
fn semantic_color<'u>(utility: &'u str, mapping: &ColorMapping) -> Option<(&'static str, &'u str)> {
    COLOR_UTILITY_PREFIXES.iter().find_map(|prefix| {
        utility
            .strip_prefix(prefix)
            .filter(|color| mapping.light.contains_key(*color))
            .map(|color| (*prefix, color))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn mapping() -> ColorMapping {
        let pairs = |entries: &[(&str, &str)]| {
            entries
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<HashMap<_, _>>()
        };
        ColorMapping {
            light: pairs(&[
                ("background", "white"),
                ("foreground", "slate-950"),
                ("primary", "slate-900"),
                ("border", "slate-200"),
                ("ring", "slate-950"),
                ("muted-foreground", "slate-500"),
            ]),
            dark: pairs(&[
                ("background", "slate-950"),
                ("foreground", "slate-50"),
                ("primary", "slate-50"),
                ("border", "slate-800"),
                ("ring", "slate-300"),
                ("muted-foreground", "slate-400"),
            ]),
        }
    }

    #[test]
    fn maps_background_and_text_colors() {
        assert_eq!(
            apply_color_mapping("bg-background text-foreground", &mapping()),
            "bg-white text-slate-950 dark:bg-slate-950 dark:text-slate-50"
        );
    }

    #[test]
    fn keeps_variants_and_opacity() {
        assert_eq!(
            apply_color_mapping("hover:bg-primary/90 text-muted-foreground", &mapping()),
            "hover:bg-slate-900/90 text-slate-500 dark:hover:bg-slate-50/90 dark:text-slate-400"
        );
    }

    #[test]
    fn bare_border_gains_border_color() {
        assert_eq!(
            apply_color_mapping("rounded border p-4", &mapping()),
            "rounded border border-slate-200 p-4 dark:border-slate-800"
        );
    }

    #[test]
    fn unknown_colors_and_plain_utilities_pass_through() {
        assert_eq!(
            apply_color_mapping("flex bg-red-500 ring-offset-2", &mapping()),
            "flex bg-red-500 ring-offset-2"
        );
    }

    #[test]
    fn duplicates_collapse() {
        assert_eq!(
            apply_color_mapping("bg-background bg-background", &mapping()),
            "bg-white dark:bg-slate-950"
        );
    }

    #[test]
    fn loads_builtin_palettes() {
        let names = ColorMapping::builtin_names().unwrap();
        assert_eq!(names, vec!["slate", "gray", "zinc", "neutral", "stone"]);

        let zinc = ColorMapping::builtin("zinc").unwrap();
        assert_eq!(zinc.light.get("primary").map(String::as_str), Some("zinc-900"));
        assert_eq!(zinc.dark.get("ring").map(String::as_str), Some("zinc-300"));

        assert!(matches!(
            ColorMapping::builtin("teal"),
            Err(GraftError::UnknownBaseColor(name)) if name == "teal"
        ));
    }

    #[test]
    fn parses_registry_documents_and_bare_mappings() {
        let registry = r#"{"name":"custom","inlineColors":{"light":{"background":"white"},"dark":{"background":"black"}}}"#;
        let bare = r#"{"light":{"background":"white"},"dark":{"background":"black"}}"#;
        assert_eq!(
            ColorMapping::from_json(registry).unwrap(),
            ColorMapping::from_json(bare).unwrap()
        );
    }
}
