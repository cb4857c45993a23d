use oxc_allocator::Allocator;
use oxc_ast::ast::{CallExpression, Expression, JSXAttribute, JSXAttributeName, JSXAttributeValue, StringLiteral};
use oxc_ast_visit::{walk, Visit};
use oxc_parser::Parser;
use oxc_span::{SourceType, Span};

use crate::classes::ColorMapping;
use crate::config::ProjectConfig;
use crate::error::{GraftError, GraftResult};
use crate::source::transform::{has_class_transforms, transform_class_string};

const CLASS_ATTRIBUTES: [&str; 2] = ["className", "class"];

const CLASS_HELPERS: [&str; 6] = ["cn", "clsx", "cva", "cx", "twMerge", "twJoin"];

/// Which string literals of a source file are treated as class lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RewriteScope {
    /// Every string literal in the file.
    #[default]
    AllStringLiterals,
    /// Only `className`/`class` attribute values and arguments of the
    /// class merging helpers (`cn`, `clsx`, `cva`, ...).
    ClassAttributes,
}

/// Rewrites the class strings of a JS/TS/JSX source file for the project's
/// base color, RTL and prefix settings. Untouched literals and everything
/// around them stay byte-identical.
pub fn rewrite_source(
    text: &str,
    source_type: SourceType,
    config: &ProjectConfig,
    base_color: Option<&ColorMapping>,
) -> GraftResult<String> {
    rewrite_source_with_scope(text, source_type, config, base_color, RewriteScope::default())
}

pub fn rewrite_source_with_scope(
    text: &str,
    source_type: SourceType,
    config: &ProjectConfig,
    base_color: Option<&ColorMapping>,
    scope: RewriteScope,
) -> GraftResult<String> {
    if !has_class_transforms(config, base_color) {
        log::debug!("no class transforms configured; leaving source untouched");
        return Ok(text.to_string());
    }

    let literals = collect_literals(text, source_type, scope)?;
    let mut output = text.to_string();
    let mut rewritten = 0usize;

    // Back to front so earlier spans stay valid.
    for literal in literals.iter().rev() {
        let transformed = transform_class_string(&literal.value, config, base_color);
        let transformed = transformed.trim();
        if transformed == literal.value {
            continue;
        }

        let start = literal.span.start as usize;
        let end = literal.span.end as usize;
        let Some(quote) = text[start..end].chars().next() else {
            continue;
        };
        let body = if literal.jsx_attribute {
            transformed.to_string()
        } else {
            escape_string_literal(transformed, quote)
        };
        output.replace_range(start + 1..end - 1, &body);
        rewritten += 1;
    }

    log::debug!("rewrote {} of {} string literals", rewritten, literals.len());
    Ok(output)
}

#[derive(Debug)]
struct CollectedLiteral {
    span: Span,
    value: String,
    /// JSX attribute strings take no backslash escapes.
    jsx_attribute: bool,
}

fn collect_literals(
    text: &str,
    source_type: SourceType,
    scope: RewriteScope,
) -> GraftResult<Vec<CollectedLiteral>> {
    let allocator = Allocator::default();
    let parsed = Parser::new(&allocator, text, source_type).parse();
    if parsed.panicked || !parsed.errors.is_empty() {
        return Err(GraftError::SourceParse {
            diagnostics: parsed.errors.iter().map(|error| error.to_string()).collect(),
        });
    }

    let mut collector = LiteralCollector {
        scope,
        class_depth: 0,
        literals: Vec::new(),
    };
    collector.visit_program(&parsed.program);
    collector.literals.sort_by_key(|literal| literal.span.start);
    Ok(collector.literals)
}

struct LiteralCollector {
    scope: RewriteScope,
    /// How many class attributes / helper calls enclose the current node.
    class_depth: usize,
    literals: Vec<CollectedLiteral>,
}

impl LiteralCollector {
    fn collect(&mut self, literal: &StringLiteral<'_>, jsx_attribute: bool) {
        if self.scope == RewriteScope::AllStringLiterals || self.class_depth > 0 {
            self.literals.push(CollectedLiteral {
                span: literal.span,
                value: literal.value.to_string(),
                jsx_attribute,
            });
        }
    }
}

impl<'a> Visit<'a> for LiteralCollector {
    fn visit_string_literal(&mut self, it: &StringLiteral<'a>) {
        self.collect(it, false);
    }

    fn visit_jsx_attribute(&mut self, it: &JSXAttribute<'a>) {
        let is_class = matches!(
            &it.name,
            JSXAttributeName::Identifier(ident) if CLASS_ATTRIBUTES.contains(&ident.name.as_str())
        );
        if is_class {
            self.class_depth += 1;
        }
        match &it.value {
            Some(JSXAttributeValue::StringLiteral(literal)) => self.collect(literal, true),
            Some(value) => self.visit_jsx_attribute_value(value),
            None => {}
        }
        if is_class {
            self.class_depth -= 1;
        }
    }

    fn visit_call_expression(&mut self, it: &CallExpression<'a>) {
        let is_helper = matches!(
            &it.callee,
            Expression::Identifier(ident) if CLASS_HELPERS.contains(&ident.name.as_str())
        );
        if is_helper {
            self.class_depth += 1;
        }
        walk::walk_call_expression(self, it);
        if is_helper {
            self.class_depth -= 1;
        }
    }
}

fn escape_string_literal(value: &str, quote: char) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '\\' => escaped.push_str("\\\\"),
            '\n' => escaped.push_str("\\n"),
            _ if ch == quote => {
                escaped.push('\\');
                escaped.push(ch);
            }
            _ => escaped.push(ch),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TailwindConfig;
    use pretty_assertions::assert_eq;

    fn rtl_config() -> ProjectConfig {
        ProjectConfig {
            tailwind: TailwindConfig {
                rtl: true,
                ..TailwindConfig::default()
            },
            ..ProjectConfig::default()
        }
    }

    #[test]
    fn rewrites_only_changed_literals() {
        let source = "const a = \"pl-2 text-left\";\nconst b = 'Hello world';\n";
        let output = rewrite_source(source, SourceType::tsx(), &rtl_config(), None).unwrap();
        assert_eq!(output, "const a = \"ps-2 text-start\";\nconst b = 'Hello world';\n");
    }

    #[test]
    fn escapes_quotes_in_js_literals() {
        let source = "const a = 'pl-2 after:content-[\\'x\\']';\n";
        let output = rewrite_source(source, SourceType::tsx(), &rtl_config(), None).unwrap();
        assert_eq!(output, "const a = 'ps-2 after:content-[\\'x\\']';\n");
    }

    #[test]
    fn jsx_attribute_strings_are_written_raw() {
        let source = "export const A = () => <div className=\"pr-4 float-left\" />;\n";
        let output = rewrite_source(source, SourceType::tsx(), &rtl_config(), None).unwrap();
        assert_eq!(output, "export const A = () => <div className=\"pe-4 float-start\" />;\n");
    }

    #[test]
    fn class_attribute_scope_ignores_other_literals() {
        let source = "const side = \"left-0 ml-2\";\nexport const A = () => <div className={cn(\"ml-2\", side)} data-x=\"mr-2\" />;\n";
        let output = rewrite_source_with_scope(
            source,
            SourceType::tsx(),
            &rtl_config(),
            None,
            RewriteScope::ClassAttributes,
        )
        .unwrap();
        assert_eq!(
            output,
            "const side = \"left-0 ml-2\";\nexport const A = () => <div className={cn(\"ms-2\", side)} data-x=\"mr-2\" />;\n"
        );
    }

    #[test]
    fn plain_text_literals_keep_their_layout() {
        let source = "const a = `x`;\nconst b = \"Line one\\nLine two\";\nconst c = 'a  b';\n";
        let output = rewrite_source(source, SourceType::tsx(), &rtl_config(), None).unwrap();
        assert_eq!(output, source);
    }

    #[test]
    fn untouched_when_nothing_is_configured() {
        let source = "const a = \"pl-2\"";
        let output = rewrite_source(source, SourceType::tsx(), &ProjectConfig::default(), None).unwrap();
        assert_eq!(output, source);
    }

    #[test]
    fn reports_parse_errors() {
        let error = rewrite_source("const = ;", SourceType::tsx(), &rtl_config(), None).unwrap_err();
        assert!(matches!(error, GraftError::SourceParse { ref diagnostics } if !diagnostics.is_empty()));
    }
}
