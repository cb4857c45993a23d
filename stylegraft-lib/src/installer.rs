//! File-level entry points: read a whole file, run it through the engine and
//! write it back. Operations without a target file are skipped, not failed.

use std::fs;
use std::path::Path;

use crate::classes::ColorMapping;
use crate::config::ProjectConfig;
use crate::error::{GraftError, GraftResult};
use crate::source::{rewrite_source_with_scope, RewriteScope, SourceType};
use crate::style::merge::merge_css;
use crate::style::spec::{CssRuleSpec, CssVarsSpec, RegistryItem};
use crate::style::vars::{merge_css_vars, CssVarsOptions};

/// Merges custom properties into the stylesheet at `path`. Returns whether
/// the file was rewritten. An empty spec still gets the base layer.
pub fn update_css_vars(
    path: Option<&Path>,
    vars: &CssVarsSpec,
    config: &ProjectConfig,
    options: &CssVarsOptions,
) -> GraftResult<bool> {
    let Some(path) = existing_target(path) else {
        return Ok(false);
    };
    if vars.is_empty() {
        log::debug!("no css variables to install; checking the base layer only");
    }

    let css = read(path)?;
    let output = merge_css_vars(&css, vars, config, options)?;
    write_if_changed(path, &css, &output)
}

/// Deep-merges a rule spec into the stylesheet at `path`.
pub fn update_css(path: Option<&Path>, spec: &CssRuleSpec) -> GraftResult<bool> {
    if spec.is_empty() {
        log::debug!("no css rules to install");
        return Ok(false);
    }
    let Some(path) = existing_target(path) else {
        return Ok(false);
    };

    let css = read(path)?;
    let output = merge_css(&css, spec)?;
    write_if_changed(path, &css, &output)
}

/// Rewrites the class strings of a component source file in place. The
/// dialect follows the file extension, falling back to TSX.
pub fn rewrite_source_file(
    path: &Path,
    config: &ProjectConfig,
    base_color: Option<&ColorMapping>,
    scope: RewriteScope,
) -> GraftResult<bool> {
    let source_type = SourceType::from_path(path).unwrap_or_else(|_| SourceType::tsx());
    let text = read(path)?;
    let output = rewrite_source_with_scope(&text, source_type, config, base_color, scope)?;
    write_if_changed(path, &text, &output)
}

/// Installs everything style-related a registry item carries into the
/// project stylesheet: variables (plus a migrated Tailwind config on v4),
/// then rules.
pub fn install_registry_item_styles(
    item: &RegistryItem,
    config: &ProjectConfig,
    options: &CssVarsOptions,
) -> GraftResult<bool> {
    let path = config.tailwind.css.as_deref();
    let mut options = options.clone();
    if options.tailwind_config.is_none() {
        options.tailwind_config = item.tailwind_config().cloned();
    }

    let empty_vars = CssVarsSpec::default();
    let vars = item.css_vars.as_ref().unwrap_or(&empty_vars);
    let vars_changed = update_css_vars(path, vars, config, &options)?;

    let rules_changed = match &item.css {
        Some(spec) => update_css(path, spec)?,
        None => false,
    };
    Ok(vars_changed || rules_changed)
}

fn existing_target(path: Option<&Path>) -> Option<&Path> {
    match path {
        None => {
            log::info!("no stylesheet configured; skipping");
            None
        }
        Some(path) if !path.exists() => {
            log::info!("stylesheet {} does not exist; skipping", path.display());
            None
        }
        Some(path) => Some(path),
    }
}

fn read(path: &Path) -> GraftResult<String> {
    fs::read_to_string(path).map_err(|source| GraftError::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn write_if_changed(path: &Path, before: &str, after: &str) -> GraftResult<bool> {
    if before == after {
        log::debug!("{} is already up to date", path.display());
        return Ok(false);
    }
    fs::write(path, after).map_err(|source| GraftError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    log::info!("updated {}", path.display());
    Ok(true)
}
