use indexmap::{IndexMap, IndexSet};
use lightningcss::traits::Parse;
use lightningcss::values::color::CssColor;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::{ProjectConfig, TailwindVersion};
use crate::error::GraftResult;
use crate::parser::css::parse_stylesheet;
use crate::style::merge::ensure_plugin;
use crate::style::printer;
use crate::style::spec::{CssVarsSpec, TailwindConfigSpec};
use crate::style::stylesheet::{AtRule, Comment, Container, Node, Stylesheet};

const COLOR_FUNCTION_PREFIXES: [&str; 4] = ["hsl", "rgb", "#", "oklch"];

const DARK_VARIANT_PARAMS: &str = "dark (&:is(.dark *))";

const RADIUS_TOKENS: [(&str, &str); 4] = [
    ("--radius-sm", "calc(var(--radius) - 4px)"),
    ("--radius-md", "calc(var(--radius) - 2px)"),
    ("--radius-lg", "var(--radius)"),
    ("--radius-xl", "calc(var(--radius) + 4px)"),
];

const V3_BASE_RULES: [(&str, &str); 2] = [
    ("*", "border-border"),
    ("body", "bg-background text-foreground"),
];

const V4_BASE_RULES: [(&str, &str); 2] = [
    ("*", "border-border outline-ring/50"),
    ("body", "bg-background text-foreground"),
];

static REQUIRE_CALL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^require\(["']|["']\)$"#).expect("require pattern is valid")
});

#[derive(Debug, Clone)]
pub struct CssVarsOptions {
    /// Scopes the variables to `[data-registry="name"]` instead of `:root`.
    pub registry_name: Option<String>,
    /// When false, declarations that already exist keep their value.
    pub overwrite: bool,
    /// Strips the colors and fonts of a freshly scaffolded Next.js app.
    pub cleanup_default_next_styles: bool,
    /// Tailwind v3 JS config to carry over (v4 only).
    pub tailwind_config: Option<TailwindConfigSpec>,
}

impl Default for CssVarsOptions {
    fn default() -> Self {
        Self {
            registry_name: None,
            overwrite: true,
            cleanup_default_next_styles: false,
            tailwind_config: None,
        }
    }
}

/// Selectors receiving light and dark mode variables.
struct ModeSelectors {
    light: String,
    dark: String,
}

impl ModeSelectors {
    fn new(registry_name: Option<&str>) -> Self {
        match registry_name {
            Some(name) => ModeSelectors {
                light: format!("[data-registry=\"{}\"]", name),
                dark: format!("[data-registry=\"{}\"].dark", name),
            },
            None => ModeSelectors {
                light: ":root".to_string(),
                dark: ".dark".to_string(),
            },
        }
    }
}

/// Merges `vars` into `css` following the conventions of the configured
/// Tailwind version and returns the new stylesheet text.
pub fn merge_css_vars(
    css: &str,
    vars: &CssVarsSpec,
    config: &ProjectConfig,
    options: &CssVarsOptions,
) -> GraftResult<String> {
    let mut sheet = parse_stylesheet(css)?;
    let selectors = ModeSelectors::new(options.registry_name.as_deref());
    let version = config.tailwind_version;

    match version {
        TailwindVersion::V3 => {
            upsert_layer_vars(&mut sheet, vars, &selectors, options.overwrite);
            if options.cleanup_default_next_styles {
                cleanup_default_next_styles(&mut sheet);
            }
        }
        TailwindVersion::V4 => {
            ensure_custom_variant(&mut sheet);
            if options.cleanup_default_next_styles {
                cleanup_default_next_styles(&mut sheet);
            }
            upsert_root_vars(&mut sheet, vars, &selectors, options.overwrite);
            update_theme(&mut sheet, vars, options.overwrite);
            if let Some(tailwind_config) = &options.tailwind_config {
                migrate_tailwind_config(&mut sheet, tailwind_config);
            }
        }
    }

    if config.tailwind.css_variables {
        ensure_base_layer(&mut sheet, version);
    }

    let output = printer::strip_break_markers(&sheet.to_string());
    Ok(match version {
        TailwindVersion::V3 => output,
        TailwindVersion::V4 => printer::collapse_blank_lines(&output),
    })
}

/// A space separated `h s% l%` triple meant to be wrapped in `hsl()`.
pub fn is_local_hsl_value(value: &str) -> bool {
    if COLOR_FUNCTION_PREFIXES.iter().any(|prefix| value.starts_with(prefix)) {
        return false;
    }
    let chunks: Vec<&str> = value.split(' ').collect();
    chunks.len() == 3
        && chunks[1..].iter().all(|chunk| chunk.contains('%'))
        && chunks.iter().all(|chunk| {
            chunk
                .trim_end_matches('%')
                .trim_end_matches("deg")
                .parse::<f64>()
                .is_ok()
        })
}

/// Whether `value` is a color: a color function or hex literal, or any
/// keyword or syntax the CSS color parser accepts.
pub fn is_color_value(value: &str) -> bool {
    let value = value.trim();
    COLOR_FUNCTION_PREFIXES.iter().any(|prefix| value.starts_with(prefix))
        || CssColor::parse_string(value).is_ok()
}

fn wrap_hsl(value: &str) -> String {
    if is_local_hsl_value(value) {
        format!("hsl({})", value)
    } else {
        value.to_string()
    }
}

fn custom_property(name: &str) -> String {
    format!("--{}", name.strip_prefix("--").unwrap_or(name))
}

/// v4 renames `sidebar-background` to the shorter `--sidebar`.
fn v4_custom_property(name: &str) -> String {
    match custom_property(name).as_str() {
        "--sidebar-background" => "--sidebar".to_string(),
        other => other.to_string(),
    }
}

fn set_decl<C: Container>(block: &mut C, prop: &str, value: &str, overwrite: bool) {
    if overwrite || !block.has_decl(prop) {
        block.upsert_decl(prop, value);
    } else {
        log::debug!("keeping existing `{}`", prop);
    }
}

/// Writes `entries` into `selector` under `parent`, creating the rule only
/// when there is something to write.
fn write_vars<C: Container>(
    parent: &mut C,
    selector: &str,
    entries: Vec<(String, String)>,
    overwrite: bool,
    with_break: bool,
) {
    if entries.is_empty() {
        return;
    }
    let rule = parent.find_or_create_rule(selector, with_break);
    for (prop, value) in entries {
        set_decl(rule, &prop, &value, overwrite);
    }
}

/// v3: variables live in `:root` / `.dark` inside `@layer base`.
fn upsert_layer_vars(sheet: &mut Stylesheet, vars: &CssVarsSpec, selectors: &ModeSelectors, overwrite: bool) {
    if vars.light.is_empty() && vars.dark.is_empty() {
        return;
    }
    let entries = |mode: &IndexMap<String, String>| {
        mode.iter()
            .map(|(name, value)| (custom_property(name), value.clone()))
            .collect::<Vec<_>>()
    };

    let layer = sheet.find_or_create_at_rule("layer", "base", true);
    write_vars(layer, &selectors.light, entries(&vars.light), overwrite, false);
    write_vars(layer, &selectors.dark, entries(&vars.dark), overwrite, false);
}

/// v4: variables live in top-level `:root` / `.dark` rules.
fn upsert_root_vars(sheet: &mut Stylesheet, vars: &CssVarsSpec, selectors: &ModeSelectors, overwrite: bool) {
    let entries = |mode: &IndexMap<String, String>| {
        mode.iter()
            .map(|(name, value)| (v4_custom_property(name), wrap_hsl(value)))
            .collect::<Vec<_>>()
    };

    write_vars(sheet, &selectors.light, entries(&vars.light), overwrite, true);
    write_vars(sheet, &selectors.dark, entries(&vars.dark), overwrite, true);
}

fn ensure_custom_variant(sheet: &mut Stylesheet) {
    let exists = sheet
        .nodes
        .iter()
        .filter_map(Node::as_at_rule)
        .any(|at_rule| at_rule.name == "custom-variant");
    if exists {
        return;
    }

    let variant = Node::AtRule(AtRule::statement("custom-variant", DARK_VARIANT_PARAMS));
    if sheet.nodes.is_empty() {
        sheet.nodes.push(variant);
    } else {
        sheet.insert_nodes(1, vec![Node::Comment(Comment::break_marker()), variant]);
    }
}

/// Mirrors every variable into `@theme inline` so Tailwind generates
/// utilities for it, and writes the `theme` entries of `vars` verbatim.
fn update_theme(sheet: &mut Stylesheet, vars: &CssVarsSpec, overwrite: bool) {
    let names: IndexSet<&str> = vars
        .light
        .keys()
        .chain(vars.dark.keys())
        .map(String::as_str)
        .collect();
    if names.is_empty() && vars.theme.is_empty() {
        return;
    }

    let theme = sheet.find_or_create_at_rule("theme", "inline", true);

    for (name, value) in &vars.theme {
        let prop = custom_property(name);
        if theme.has_decl(&prop) {
            set_decl(theme, &prop, value, overwrite);
        } else {
            theme.insert_custom_property(&prop, value);
        }
    }

    for name in names {
        let value = [vars.light.get(name), vars.dark.get(name)]
            .into_iter()
            .flatten()
            .find(|value| !value.is_empty());
        let Some(value) = value else {
            continue;
        };

        let bare = name.strip_prefix("--").unwrap_or(name);
        if bare == "radius" {
            for (prop, calc) in RADIUS_TOKENS {
                theme.insert_custom_property(prop, calc);
            }
            continue;
        }

        let (prop, reference) = if bare == "sidebar-background" {
            ("--color-sidebar".to_string(), "var(--sidebar)".to_string())
        } else if is_local_hsl_value(value) || is_color_value(value) {
            (format!("--color-{}", bare), format!("var(--{})", bare))
        } else {
            (format!("--{}", bare), format!("var(--{})", bare))
        };
        theme.insert_custom_property(&prop, &reference);
    }
}

/// Carries plugins, animations and keyframes of a v3 JS config over to v4
/// CSS. Existing entries are never touched.
fn migrate_tailwind_config(sheet: &mut Stylesheet, tailwind_config: &TailwindConfigSpec) {
    if !tailwind_config.plugins.is_empty() {
        let quote = quote_style(sheet);
        for plugin in &tailwind_config.plugins {
            let name = REQUIRE_CALL.replace_all(plugin, "");
            ensure_plugin(sheet, &format!("{}{}{}", quote, name, quote));
        }
    }

    let extend = &tailwind_config.theme.extend;
    if !extend.animation.is_empty() {
        let theme = sheet.find_or_create_at_rule("theme", "inline", true);
        for (name, value) in &extend.animation {
            theme.insert_custom_property(&format!("--animate-{}", name), value);
        }
    }

    if !extend.keyframes.is_empty() {
        let theme = sheet.find_or_create_at_rule("theme", "inline", true);
        for (name, steps) in &extend.keyframes {
            if theme.at_rule("keyframes", name).is_some() {
                continue;
            }
            let mut keyframes = AtRule::block("keyframes", name.as_str());
            for (step, declarations) in steps {
                let rule = keyframes.find_or_create_rule(step, false);
                for (prop, value) in declarations {
                    rule.upsert_decl(prop, value);
                }
            }
            theme.push_node(Node::AtRule(keyframes), true);
        }
    }
}

/// Single quotes when the first top-level node uses them, else double.
fn quote_style(sheet: &Stylesheet) -> char {
    let text = match sheet.nodes.first() {
        Some(Node::AtRule(at_rule)) => at_rule.params.as_str(),
        Some(Node::Rule(rule)) => rule.selector.as_str(),
        Some(Node::Decl(decl)) => decl.value.as_str(),
        Some(Node::Comment(comment)) => comment.text.as_str(),
        None => "",
    };
    if text.contains('\'') {
        '\''
    } else {
        '"'
    }
}

/// Guarantees `@layer base { * { @apply ..; } body { @apply ..; } }`. A
/// layer that already holds both rules is reused; otherwise a new layer is
/// appended and receives whichever rules it lacks.
fn ensure_base_layer(sheet: &mut Stylesheet, version: TailwindVersion) {
    let required = match version {
        TailwindVersion::V3 => V3_BASE_RULES,
        TailwindVersion::V4 => V4_BASE_RULES,
    };

    let position = sheet.nodes.iter().position(|node| {
        node.as_at_rule().is_some_and(|layer| {
            layer.is("layer", "base")
                && required.iter().all(|(selector, apply)| {
                    layer
                        .rule(selector)
                        .is_some_and(|rule| rule.at_rule("apply", apply).is_some())
                })
        })
    });
    let index = match position {
        Some(index) => index,
        None => sheet.push_node(Node::AtRule(AtRule::block("layer", "base")), true),
    };
    let Some(layer) = sheet.nodes[index].as_at_rule_mut() else {
        return;
    };

    for (selector, apply) in required {
        if layer.rule(selector).is_none() {
            layer
                .find_or_create_rule(selector, false)
                .push_node(Node::AtRule(AtRule::statement("apply", apply)), false);
        }
    }
}

/// Removes what `create-next-app` puts in a fresh `globals.css`: the body
/// colors, gradient background and Arial font, plus the `--background` and
/// `--foreground` variables of `:root` and of the dark color scheme query.
/// Containers left empty are dropped.
pub fn cleanup_default_next_styles(sheet: &mut Stylesheet) {
    let body = sheet
        .nodes
        .iter()
        .position(|node| matches!(node, Node::Rule(rule) if rule.selector == "body"));
    if let Some(index) = body {
        let emptied = match &mut sheet.nodes[index] {
            Node::Rule(rule) => {
                remove_first_decl(&mut rule.nodes, |prop, value| {
                    prop == "color" && ["rgb(var(--foreground-rgb))", "var(--foreground)"].contains(&value)
                });
                remove_first_decl(&mut rule.nodes, |prop, value| {
                    prop == "background"
                        && (value.starts_with("linear-gradient") || value == "var(--background)")
                });
                remove_first_decl(&mut rule.nodes, |prop, value| {
                    prop == "font-family" && value == "Arial, Helvetica, sans-serif"
                });
                rule.nodes.is_empty()
            }
            _ => false,
        };
        if emptied {
            log::debug!("removing empty body rule");
            sheet.nodes.remove(index);
        }
    }

    remove_conflicting_vars(&mut sheet.nodes);

    let dark_scheme = sheet.nodes.iter().position(|node| {
        matches!(node, Node::AtRule(at_rule) if at_rule.params == "(prefers-color-scheme: dark)")
    });
    if let Some(index) = dark_scheme {
        let emptied = match sheet.nodes[index].as_at_rule_mut() {
            Some(media) => {
                remove_conflicting_vars(media.nodes_mut());
                media.nodes().is_empty()
            }
            None => false,
        };
        if emptied {
            sheet.nodes.remove(index);
        }
    }
}

fn remove_first_decl(nodes: &mut Vec<Node>, matches: impl Fn(&str, &str) -> bool) {
    let position = nodes.iter().position(|node| {
        node.as_decl()
            .is_some_and(|decl| matches(decl.prop.as_str(), decl.value.as_str()))
    });
    if let Some(index) = position {
        nodes.remove(index);
    }
}

fn remove_conflicting_vars(nodes: &mut Vec<Node>) {
    let position = nodes
        .iter()
        .position(|node| matches!(node, Node::Rule(rule) if rule.selector == ":root"));
    let Some(index) = position else {
        return;
    };
    let emptied = match &mut nodes[index] {
        Node::Rule(rule) => {
            rule.nodes.retain(|node| {
                !matches!(node, Node::Decl(decl) if decl.prop == "--background" || decl.prop == "--foreground")
            });
            rule.nodes.is_empty()
        }
        _ => false,
    };
    if emptied {
        nodes.remove(index);
    }
}
