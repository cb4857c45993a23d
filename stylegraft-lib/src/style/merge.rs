// src/style/merge.rs (deep-merges a nested rule spec into an existing stylesheet)
use serde_json::Value;

use crate::error::{GraftError, GraftResult};
use crate::parser::css::{parse_declarations, parse_stylesheet};
use crate::style::printer;
use crate::style::spec::CssRuleSpec;
use crate::style::stylesheet::{AtRule, Comment, Container, Node, Stylesheet};

/// How a top-level key of a [`CssRuleSpec`] is merged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectorKind<'k> {
    /// A plain selector such as `.btn` or `:root`.
    Rule(&'k str),
    Import(&'k str),
    Plugin(&'k str),
    /// Any at-rule whose body is `{}`, e.g. `@tailwind utilities`.
    Bodyless { name: &'k str, params: &'k str },
    Keyframes(&'k str),
    Utility(&'k str),
    Property(&'k str),
    AtRule { name: &'k str, params: &'k str },
}

impl<'k> SelectorKind<'k> {
    /// `None` when an `@` key carries no at-rule name.
    pub fn classify(key: &'k str, body: &Value) -> Option<Self> {
        let Some(at) = key.strip_prefix('@') else {
            return Some(SelectorKind::Rule(key));
        };
        let (name, params) = split_at_rule_key(at)?;
        Some(match name {
            "import" => SelectorKind::Import(params),
            "plugin" => SelectorKind::Plugin(params),
            "keyframes" => SelectorKind::Keyframes(params),
            "utility" => SelectorKind::Utility(params),
            "property" => SelectorKind::Property(params),
            _ if is_empty_object(body) => SelectorKind::Bodyless { name, params },
            _ => SelectorKind::AtRule { name, params },
        })
    }
}

/// Merges `spec` into `css` and returns the serialized result with break
/// markers removed, blank-line runs collapsed and trailing whitespace
/// trimmed. Applying the same spec to the output again changes nothing.
pub fn merge_css(css: &str, spec: &CssRuleSpec) -> GraftResult<String> {
    let mut sheet = parse_stylesheet(css)?;
    apply_rule_spec(&mut sheet, spec)?;
    let output = printer::collapse_blank_lines(&printer::strip_break_markers(&sheet.to_string()));
    Ok(output.trim_end().to_string())
}

/// Merges `spec` into an already parsed stylesheet.
pub fn apply_rule_spec(sheet: &mut Stylesheet, spec: &CssRuleSpec) -> GraftResult<()> {
    for (key, body) in spec {
        let Some(kind) = SelectorKind::classify(key, body) else {
            log::warn!("skipping `{}`: no at-rule name", key);
            continue;
        };

        match kind {
            SelectorKind::Rule(selector) => merge_rule(sheet, selector, body, true)?,
            SelectorKind::Import(params) => ensure_import(sheet, params),
            SelectorKind::Plugin(params) => ensure_plugin(sheet, params),
            SelectorKind::Bodyless { name, params } => ensure_statement(sheet, name, params, true),
            SelectorKind::Keyframes(name) => merge_keyframes(sheet, name, body)?,
            SelectorKind::Utility(params) => {
                let utility = sheet.find_or_create_at_rule("utility", params, true);
                merge_block(utility, key, body)?;
            }
            SelectorKind::Property(params) => {
                let property = sheet.find_or_create_at_rule("property", params, true);
                merge_block(property, key, body)?;
            }
            SelectorKind::AtRule { name, params } => merge_at_rule(sheet, name, params, body)?,
        }
    }
    Ok(())
}

/// Adds `@import params;` after the last import, or at the very top.
pub fn ensure_import(sheet: &mut Stylesheet, params: &str) {
    let exists = sheet
        .nodes
        .iter()
        .filter_map(Node::as_at_rule)
        .any(|at_rule| at_rule.is("import", params));
    if exists {
        return;
    }

    log::debug!("adding `@import {}`", params);
    let import = Node::AtRule(AtRule::statement("import", params));
    let index = sheet.last_at_rule_named("import").map_or(0, |last| last + 1);
    sheet.insert_nodes(index, vec![import]);
}

/// Adds `@plugin params;` next to the other plugins. `foo`, `"foo"` and
/// `'foo'` all name the same plugin; a bare name is written double-quoted.
pub fn ensure_plugin(sheet: &mut Stylesheet, params: &str) {
    let wanted = normalize_plugin(params);
    let exists = sheet
        .nodes
        .iter()
        .filter_map(Node::as_at_rule)
        .any(|at_rule| at_rule.name == "plugin" && normalize_plugin(&at_rule.params) == wanted);
    if exists {
        return;
    }

    let params = params.trim();
    let params = if params.starts_with(['"', '\'']) { params } else { wanted.as_str() };
    log::debug!("adding `@plugin {}`", params);
    let plugin = Node::AtRule(AtRule::statement("plugin", params));
    if let Some(last) = sheet.last_at_rule_named("plugin") {
        sheet.insert_nodes(last + 1, vec![plugin]);
    } else if let Some(last) = sheet.last_at_rule_named("import") {
        sheet.insert_nodes(last + 1, vec![break_marker(), plugin]);
    } else {
        sheet.insert_nodes(0, vec![plugin, break_marker()]);
    }
}

fn normalize_plugin(params: &str) -> String {
    let bare = params.trim().trim_matches(|c: char| c == '"' || c == '\'');
    format!("\"{}\"", bare)
}

fn break_marker() -> Node {
    Node::Comment(Comment::break_marker())
}

/// Appends a bodyless `@name params;` unless an at-rule with the same name
/// and params is already present.
fn ensure_statement<C: Container>(parent: &mut C, name: &str, params: &str, with_break: bool) {
    if parent.at_rule(name, params).is_some() {
        return;
    }
    log::debug!("adding `@{} {};`", name, params);
    parent.push_node(Node::AtRule(AtRule::statement(name, params)), with_break);
}

/// Keyframes live inside `@theme inline` so Tailwind v4 can tree-shake them.
fn merge_keyframes(sheet: &mut Stylesheet, name: &str, body: &Value) -> GraftResult<()> {
    let label = format!("@keyframes {}", name);
    let Value::Object(steps) = body else {
        return Err(invalid_leaf(&label, ""));
    };

    let theme = sheet.find_or_create_at_rule("theme", "inline", true);
    let keyframes = theme.find_or_create_at_rule("keyframes", name, false);
    for (step, declarations) in steps {
        if is_empty_object(declarations) {
            log::warn!("keyframe step `{}` of `{}` has no declarations", step, name);
            continue;
        }
        merge_rule(keyframes, step, declarations, false)?;
    }
    Ok(())
}

/// Finds or creates `selector` under `parent` and merges `body` into it.
///
/// Nested objects become sibling rules: `&`-prefixed keys are joined onto
/// the part of `selector` before its first `:`, other keys are used as-is.
/// Nested `@` keys become at-rules inside the rule.
fn merge_rule<C: Container>(parent: &mut C, selector: &str, body: &Value, with_break: bool) -> GraftResult<()> {
    let rule = parent.find_or_create_rule(selector, with_break);
    let mut nested = Vec::new();

    match body {
        Value::String(raw) => upsert_raw_declarations(rule, raw)?,
        Value::Object(properties) => {
            for (property, value) in properties {
                match value {
                    Value::String(value) => rule.upsert_decl(property, value),
                    Value::Object(_) => nested.push((property, value)),
                    _ => return Err(invalid_leaf(selector, property)),
                }
            }
        }
        _ => return Err(invalid_leaf(selector, "")),
    }

    for (property, value) in nested {
        match property.strip_prefix('@') {
            Some(at) => {
                let (name, params) =
                    split_at_rule_key(at).ok_or_else(|| invalid_leaf(selector, property))?;
                let rule = parent.find_or_create_rule(selector, with_break);
                merge_at_rule(rule, name, params, value)?;
            }
            None => merge_rule(parent, &nested_selector(selector, property), value, with_break)?,
        }
    }
    Ok(())
}

/// Finds or creates `@name params` under `parent`. Object members become
/// nested at-rules (`@` keys), declarations (string values) or rules
/// (object values); a string body is read as a declaration list.
fn merge_at_rule<C: Container>(parent: &mut C, name: &str, params: &str, body: &Value) -> GraftResult<()> {
    if is_empty_object(body) {
        ensure_statement(parent, name, params, false);
        return Ok(());
    }

    let at_rule = parent.find_or_create_at_rule(name, params, true);
    let label = || format!("@{} {}", name, params);

    match body {
        Value::String(raw) => upsert_raw_declarations(at_rule, raw),
        Value::Object(children) => {
            for (key, child) in children {
                if let Some(at) = key.strip_prefix('@') {
                    let (child_name, child_params) =
                        split_at_rule_key(at).ok_or_else(|| invalid_leaf(&label(), key))?;
                    merge_at_rule(at_rule, child_name, child_params, child)?;
                    continue;
                }
                match child {
                    Value::String(value) => at_rule.upsert_decl(key, value),
                    Value::Object(_) => merge_rule(at_rule, key, child, false)?,
                    _ => return Err(invalid_leaf(&label(), key)),
                }
            }
            Ok(())
        }
        _ => Err(invalid_leaf(&label(), "")),
    }
}

/// Merges the body of `@utility` / `@property`: strings are declarations,
/// objects are nested rules kept literally inside the block.
fn merge_block<C: Container>(block: &mut C, label: &str, body: &Value) -> GraftResult<()> {
    match body {
        Value::String(raw) => upsert_raw_declarations(block, raw),
        Value::Object(properties) => {
            for (property, value) in properties {
                match value {
                    Value::String(value) => block.upsert_decl(property, value),
                    Value::Object(_) if property.starts_with('@') => {
                        let (name, params) = split_at_rule_key(&property[1..])
                            .ok_or_else(|| invalid_leaf(label, property))?;
                        merge_at_rule(block, name, params, value)?;
                    }
                    Value::Object(_) => merge_rule(block, property, value, false)?,
                    _ => return Err(invalid_leaf(label, property)),
                }
            }
            Ok(())
        }
        _ => Err(invalid_leaf(label, "")),
    }
}

fn upsert_raw_declarations<C: Container>(block: &mut C, raw: &str) -> GraftResult<()> {
    for decl in parse_declarations(raw)? {
        block.upsert_decl(&decl.prop, &decl.value);
    }
    Ok(())
}

/// Resolves a nested `&` key against its parent selector by inserting the
/// rest of the key before the parent's first `:` (a leading `:` does not
/// count). Only the first compound selector is considered.
pub fn nested_selector(parent: &str, nested: &str) -> String {
    let Some(suffix) = nested.strip_prefix('&') else {
        return nested.to_string();
    };
    let split = parent
        .char_indices()
        .skip(1)
        .find(|(_, ch)| *ch == ':')
        .map_or(parent.len(), |(index, _)| index);
    format!("{}{}{}", &parent[..split], suffix, &parent[split..])
}

/// Splits `name params` (without the `@`).
fn split_at_rule_key(at: &str) -> Option<(&str, &str)> {
    let name_end = at
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == '_'))
        .unwrap_or(at.len());
    if name_end == 0 {
        return None;
    }
    Some((&at[..name_end], at[name_end..].trim()))
}

fn is_empty_object(value: &Value) -> bool {
    matches!(value, Value::Object(map) if map.is_empty())
}

fn invalid_leaf(selector: &str, property: &str) -> GraftError {
    GraftError::InvalidLeaf {
        selector: selector.to_string(),
        property: property.to_string(),
    }
}
