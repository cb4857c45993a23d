use indexmap::IndexSet;

use crate::classes::{apply_color_mapping, apply_prefix, apply_rtl_mapping, is_tailwind_class_string, ColorMapping};
use crate::config::ProjectConfig;

/// Palette mapping, only when the project themes with literal colors
/// instead of CSS variables.
pub fn transform_color_mapping(text: &str, config: &ProjectConfig, base_color: Option<&ColorMapping>) -> String {
    match base_color {
        Some(mapping) if !config.tailwind.css_variables => {
            keep_if_unchanged(text, apply_color_mapping(text, mapping))
        }
        _ => text.to_string(),
    }
}

pub fn transform_rtl(text: &str, config: &ProjectConfig) -> String {
    if config.tailwind.rtl {
        keep_if_unchanged(text, apply_rtl_mapping(text))
    } else {
        text.to_string()
    }
}

pub fn transform_prefix(text: &str, config: &ProjectConfig) -> String {
    match config.prefix() {
        Some(prefix) if is_tailwind_class_string(text) => {
            keep_if_unchanged(text, apply_prefix(text, prefix))
        }
        _ => text.to_string(),
    }
}

/// Runs color mapping, then RTL mapping, then prefixing.
pub fn transform_class_string(text: &str, config: &ProjectConfig, base_color: Option<&ColorMapping>) -> String {
    let text = transform_color_mapping(text, config, base_color);
    let text = transform_rtl(&text, config);
    transform_prefix(&text, config)
}

/// The transformers rejoin classes with single spaces and drop repeats.
/// When no class was actually rewritten the original text is kept, so
/// strings that are not class lists keep their line breaks and spacing.
fn keep_if_unchanged(text: &str, transformed: String) -> String {
    let before: IndexSet<&str> = text.split_whitespace().collect();
    let after: IndexSet<&str> = transformed.split_whitespace().collect();
    if before.iter().eq(after.iter()) {
        text.to_string()
    } else {
        transformed
    }
}

/// Whether any of the transforms would run for this project.
pub fn has_class_transforms(config: &ProjectConfig, base_color: Option<&ColorMapping>) -> bool {
    (base_color.is_some() && !config.tailwind.css_variables)
        || config.tailwind.rtl
        || config.prefix().is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TailwindConfig;

    fn config(css_variables: bool, rtl: bool, prefix: Option<&str>) -> ProjectConfig {
        ProjectConfig {
            tailwind: TailwindConfig {
                css_variables,
                rtl,
                prefix: prefix.map(str::to_string),
                ..TailwindConfig::default()
            },
            ..ProjectConfig::default()
        }
    }

    #[test]
    fn disabled_transforms_return_input() {
        let slate = ColorMapping::builtin("slate").unwrap();
        let config = config(true, false, None);
        assert!(!has_class_transforms(&config, Some(&slate)));
        assert_eq!(
            transform_class_string("bg-background pl-2", &config, Some(&slate)),
            "bg-background pl-2"
        );
    }

    #[test]
    fn runs_color_then_rtl_then_prefix() {
        let slate = ColorMapping::builtin("slate").unwrap();
        let config = config(false, true, Some("tw-"));
        assert!(has_class_transforms(&config, Some(&slate)));
        assert_eq!(
            transform_class_string("bg-background pl-2", &config, Some(&slate)),
            "tw-bg-white tw-ps-2 dark:tw-bg-slate-950"
        );
    }

    #[test]
    fn untouched_strings_keep_their_whitespace() {
        let config = config(true, true, None);
        assert_eq!(transform_class_string("Line one\nLine two", &config, None), "Line one\nLine two");
        assert_eq!(transform_class_string("a  b", &config, None), "a  b");
        assert_eq!(transform_class_string("flex  ml-2", &config, None), "flex ms-2");
    }

    #[test]
    fn prefix_skips_strings_that_are_not_class_lists() {
        let config = config(true, false, Some("tw-"));
        assert_eq!(transform_prefix("submit", &config), "submit");
        assert_eq!(transform_prefix("flex", &config), "tw-flex");
    }
}
