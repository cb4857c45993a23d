use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::{Map, Value};

/// Nested selector -> property/selector -> value object, merged by
/// [`crate::style::merge::merge_css`]. Key order is significant.
pub type CssRuleSpec = Map<String, Value>;

/// Custom properties to install, keyed by name with or without the leading
/// `--`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CssVarsSpec {
    /// Written verbatim into `@theme inline` (Tailwind v4 only).
    #[serde(default)]
    pub theme: IndexMap<String, String>,
    #[serde(default)]
    pub light: IndexMap<String, String>,
    #[serde(default)]
    pub dark: IndexMap<String, String>,
}

impl CssVarsSpec {
    pub fn is_empty(&self) -> bool {
        self.theme.is_empty() && self.light.is_empty() && self.dark.is_empty()
    }
}

/// The parts of a Tailwind v3 JS config that carry over to v4 CSS.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TailwindConfigSpec {
    /// `require("x")` expressions or bare package names.
    #[serde(default)]
    pub plugins: Vec<String>,
    #[serde(default)]
    pub theme: TailwindThemeSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TailwindThemeSpec {
    #[serde(default)]
    pub extend: TailwindThemeExtend,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TailwindThemeExtend {
    /// Animation name -> step (`from`, `50%`, ...) -> property -> value.
    #[serde(default)]
    pub keyframes: IndexMap<String, IndexMap<String, IndexMap<String, String>>>,
    /// Animation name -> shorthand value.
    #[serde(default)]
    pub animation: IndexMap<String, String>,
}

impl TailwindConfigSpec {
    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
            && self.theme.extend.keyframes.is_empty()
            && self.theme.extend.animation.is_empty()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegistryItemTailwind {
    #[serde(default)]
    pub config: Option<TailwindConfigSpec>,
}

/// The style-related members of a registry item document.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryItem {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub css_vars: Option<CssVarsSpec>,
    #[serde(default)]
    pub css: Option<CssRuleSpec>,
    #[serde(default)]
    pub tailwind: Option<RegistryItemTailwind>,
}

impl RegistryItem {
    pub fn tailwind_config(&self) -> Option<&TailwindConfigSpec> {
        self.tailwind.as_ref().and_then(|tailwind| tailwind.config.as_ref())
    }
}
