use once_cell::sync::Lazy;
use regex::Regex;

use crate::style::stylesheet::{Node, Raws, Stylesheet};

const INDENT: &str = "  ";

static BREAK_COMMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/\* ---break--- \*/").expect("break marker pattern is valid"));

static BLANK_LINE_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\n\s*\n)+").expect("blank line pattern is valid"));

/// Serializes the tree. Parsed nodes reuse their captured raws; nodes built
/// by the merges get two-space indentation, `prop: value` and `;` after
/// every declaration.
pub fn to_css(sheet: &Stylesheet) -> String {
    let mut out = String::new();
    write_nodes(&mut out, &sheet.nodes, 0, sheet.semicolon);
    out.push_str(&sheet.after);
    out
}

/// Removes every `/* ---break--- */` comment, leaving the surrounding
/// whitespace in place.
pub fn strip_break_markers(css: &str) -> String {
    BREAK_COMMENT.replace_all(css, "").into_owned()
}

/// Collapses each run of blank lines to a single blank line.
pub fn collapse_blank_lines(css: &str) -> String {
    BLANK_LINE_RUN.replace_all(css, "\n\n").into_owned()
}

fn write_nodes(out: &mut String, nodes: &[Node], depth: usize, semicolon: bool) {
    for (index, node) in nodes.iter().enumerate() {
        let terminate = index + 1 < nodes.len() || semicolon;
        match node.raws().before.as_deref() {
            Some(before) => out.push_str(before),
            None => push_default_before(out, depth, index),
        }

        match node {
            Node::Comment(comment) => {
                out.push_str("/*");
                out.push_str(&comment.text);
                out.push_str("*/");
            }
            Node::Decl(decl) => {
                out.push_str(&decl.prop);
                out.push_str(decl.raws.between.as_deref().unwrap_or(": "));
                out.push_str(&decl.value);
                if terminate {
                    out.push_str(decl.raws.after.as_deref().unwrap_or(""));
                    out.push(';');
                }
            }
            Node::AtRule(at_rule) => {
                out.push('@');
                out.push_str(&at_rule.name);
                if !at_rule.params.is_empty() {
                    out.push_str(at_rule.raws.after_name.as_deref().unwrap_or(" "));
                    out.push_str(&at_rule.params);
                }
                match &at_rule.nodes {
                    Some(children) => write_block(out, children, &at_rule.raws, depth),
                    None => {
                        if terminate {
                            out.push_str(at_rule.raws.between.as_deref().unwrap_or(""));
                            out.push(';');
                        }
                    }
                }
            }
            Node::Rule(rule) => {
                out.push_str(&rule.selector);
                write_block(out, &rule.nodes, &rule.raws, depth);
            }
        }
    }
}

fn write_block(out: &mut String, children: &[Node], raws: &Raws, depth: usize) {
    out.push_str(raws.between.as_deref().unwrap_or(" "));
    out.push('{');
    write_nodes(out, children, depth + 1, raws.semicolon.unwrap_or(true));
    match raws.after.as_deref() {
        Some(after) => out.push_str(after),
        None => {
            out.push('\n');
            out.push_str(&INDENT.repeat(depth));
        }
    }
    out.push('}');
}

fn push_default_before(out: &mut String, depth: usize, index: usize) {
    if depth == 0 && index == 0 {
        return;
    }
    out.push('\n');
    out.push_str(&INDENT.repeat(depth));
}
