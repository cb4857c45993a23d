use cssparser::{
    ParseError, ParseErrorKind, Parser, ParserInput, ParserState, SourceLocation, SourcePosition,
    Token,
};
use thiserror::Error;

use crate::style::stylesheet::{AtRule, Comment, Declaration, Node, Raws, Rule, Stylesheet};

/// A syntax error with a 1-based position in the parsed text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} at line {line}, column {column}")]
pub struct CssParseError {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

/// Parses `input` into a tree that prints back byte-for-byte when left
/// unmodified. Tokenizing is left to `cssparser`; every raw is a slice of
/// the input between token positions.
pub fn parse_stylesheet(input: &str) -> Result<Stylesheet, CssParseError> {
    let mut parser_input = ParserInput::new(input);
    let mut parser = Parser::new(&mut parser_input);
    let block = parse_nodes(&mut parser, input, None)?;
    Ok(Stylesheet {
        nodes: block.nodes,
        after: block.after,
        semicolon: block.semicolon,
    })
}

/// Parses a raw declaration list such as `"color: red; padding: 0"`.
/// Comments are dropped and the declarations carry no raws, so they print
/// with default formatting wherever they are inserted.
pub fn parse_declarations(input: &str) -> Result<Vec<Declaration>, CssParseError> {
    let sheet = parse_stylesheet(input)?;
    let mut declarations = Vec::new();
    for node in sheet.nodes {
        match node {
            Node::Decl(decl) => declarations.push(Declaration::new(decl.prop, decl.value)),
            Node::Comment(_) => {}
            _ => {
                return Err(CssParseError {
                    message: "Expected only declarations".to_string(),
                    line: 1,
                    column: 1,
                })
            }
        }
    }
    Ok(declarations)
}

struct Block {
    nodes: Vec<Node>,
    after: String,
    semicolon: bool,
}

/// How a statement ended.
enum Terminator {
    /// At a `;`, already consumed.
    Semicolon(SourcePosition),
    /// At a `{`, consumed with its block still to be parsed.
    Block(ParserState),
    /// At a `}` or the end of input; the parser is rewound to the end of
    /// the statement text.
    End,
}

struct Statement {
    start: ParserState,
    /// End of the statement text, before any trailing whitespace.
    text_end: SourcePosition,
    /// First top-level `:`.
    colon: Option<SourcePosition>,
    /// End of the leading `@name`, for at-rules.
    at_keyword_end: Option<SourcePosition>,
    terminator: Terminator,
}

/// Parses children until the end of the current block or, at the top
/// level, the end of input. `open` is where the enclosing `{` was.
fn parse_nodes<'i, 't>(
    p: &mut Parser<'i, 't>,
    source: &'i str,
    open: Option<SourceLocation>,
) -> Result<Block, CssParseError> {
    let mut nodes = Vec::new();
    let mut semicolon = true;

    loop {
        let start = p.position();
        skip_whitespace_and_semicolons(p);
        let before = p.slice_from(start).to_string();

        let state = p.state();
        match p.next_including_whitespace_and_comments().cloned() {
            Err(_) => {
                // A nested parser stops in front of `}`; reaching the end of
                // the source instead means the block was never closed.
                if let Some(open) = open {
                    if p.position().byte_index() == source.len() {
                        return Err(error_at("Unclosed block", open));
                    }
                }
                return Ok(Block {
                    nodes,
                    after: before,
                    semicolon,
                });
            }
            Ok(Token::CloseCurlyBracket) => {
                return Err(error_at("Unexpected }", state.source_location()));
            }
            Ok(token @ Token::Comment(_)) => {
                check_closed(p, &token, &state)?;
                let raw = p.slice_from(state.position());
                nodes.push(Node::Comment(Comment {
                    text: raw[2..raw.len() - 2].to_string(),
                    raws: Raws {
                        before: Some(before),
                        ..Raws::default()
                    },
                }));
                continue;
            }
            Ok(_) => p.reset(&state),
        }

        let statement = scan_statement(p)?;
        let text = p.slice(statement.start.position()..statement.text_end);
        let at_rule_name = statement
            .at_keyword_end
            .map(|end| p.slice(statement.start.position()..end));

        if let Terminator::Block(brace) = &statement.terminator {
            let between = p.slice(statement.text_end..brace.position()).to_string();
            let location = brace.source_location();
            let block = p
                .parse_nested_block(|nested| {
                    parse_nodes(nested, source, Some(location)).map_err(|error| custom(nested, error))
                })
                .map_err(into_css_error)?;
            let raws = Raws {
                before: Some(before),
                between: Some(between),
                after: Some(block.after),
                semicolon: Some(block.semicolon),
                ..Raws::default()
            };
            nodes.push(match at_rule_name {
                Some(name) => {
                    let (after_name, params) = split_params(&text[name.len()..]);
                    Node::AtRule(AtRule {
                        name: name[1..].to_string(),
                        params: params.to_string(),
                        nodes: Some(block.nodes),
                        raws: Raws {
                            after_name: Some(after_name.to_string()),
                            ..raws
                        },
                    })
                }
                None => Node::Rule(Rule {
                    selector: text.to_string(),
                    nodes: block.nodes,
                    raws,
                }),
            });
            continue;
        }

        // whitespace between the statement and its `;`
        let trailing = match statement.terminator {
            Terminator::Semicolon(at) => {
                semicolon = true;
                p.slice(statement.text_end..at).to_string()
            }
            _ => {
                semicolon = false;
                String::new()
            }
        };

        if let Some(name) = at_rule_name {
            let (after_name, params) = split_params(&text[name.len()..]);
            nodes.push(Node::AtRule(AtRule {
                name: name[1..].to_string(),
                params: params.to_string(),
                nodes: None,
                raws: Raws {
                    before: Some(before),
                    after_name: Some(after_name.to_string()),
                    between: Some(trailing),
                    ..Raws::default()
                },
            }));
            continue;
        }

        let Some(colon) = statement.colon else {
            return Err(error_at("Unknown word", statement.start.source_location()));
        };
        let colon = colon.byte_index() - statement.start.position().byte_index();
        let prop = text[..colon].trim_end();
        let value = text[colon + 1..].trim_start();
        let value_start = text.len() - value.len();
        nodes.push(Node::Decl(Declaration {
            prop: prop.to_string(),
            value: value.to_string(),
            raws: Raws {
                before: Some(before),
                between: Some(text[prop.len()..value_start].to_string()),
                after: Some(trailing),
                ..Raws::default()
            },
        }));
    }
}

fn skip_whitespace_and_semicolons(p: &mut Parser<'_, '_>) {
    loop {
        let state = p.state();
        let skipped = matches!(
            p.next_including_whitespace_and_comments(),
            Ok(Token::WhiteSpace(_)) | Ok(Token::Semicolon)
        );
        if !skipped {
            p.reset(&state);
            return;
        }
    }
}

/// Consumes one statement: tokens up to the first top-level `;`, `{` or
/// `}`. Function and bracket blocks are stepped over whole, so separators
/// inside `url(...)` or `(...)` do not end it.
fn scan_statement<'i, 't>(p: &mut Parser<'i, 't>) -> Result<Statement, CssParseError> {
    let start = p.state();
    let mut text_end = p.state();
    let mut colon = None;
    let mut at_keyword_end = None;
    let mut first = true;

    loop {
        let state = p.state();
        let terminator = match p.next_including_whitespace_and_comments().cloned() {
            Err(_) | Ok(Token::CloseCurlyBracket) => {
                p.reset(&text_end);
                Terminator::End
            }
            Ok(Token::Semicolon) => Terminator::Semicolon(state.position()),
            Ok(Token::CurlyBracketBlock) => Terminator::Block(state),
            Ok(Token::WhiteSpace(_)) => continue,
            Ok(token) => {
                check_closed(p, &token, &state)?;
                if opens_block(&token) {
                    skip_block(p)?;
                }
                match token {
                    Token::AtKeyword(_) if first => at_keyword_end = Some(p.position()),
                    Token::Colon if colon.is_none() => colon = Some(state.position()),
                    _ => {}
                }
                first = false;
                text_end = p.state();
                continue;
            }
        };

        return Ok(Statement {
            start,
            text_end: text_end.position(),
            colon,
            at_keyword_end,
            terminator,
        });
    }
}

/// Steps over the block opened by the token just consumed, still checking
/// its strings and comments.
fn skip_block<'i, 't>(p: &mut Parser<'i, 't>) -> Result<(), CssParseError> {
    p.parse_nested_block(|nested| loop {
        let state = nested.state();
        let Ok(token) = nested.next_including_whitespace_and_comments().cloned() else {
            return Ok(());
        };
        let checked = check_closed(nested, &token, &state).and_then(|()| {
            if opens_block(&token) {
                skip_block(nested)
            } else {
                Ok(())
            }
        });
        if let Err(error) = checked {
            return Err(custom(nested, error));
        }
    })
    .map_err(into_css_error)
}

fn opens_block(token: &Token<'_>) -> bool {
    matches!(
        token,
        Token::Function(_) | Token::ParenthesisBlock | Token::SquareBracketBlock | Token::CurlyBracketBlock
    )
}

/// The tokenizer runs strings and comments to the end of input when they
/// are not terminated; the raw text tells whether the terminator is there.
fn check_closed(p: &Parser<'_, '_>, token: &Token<'_>, start: &ParserState) -> Result<(), CssParseError> {
    let raw = p.slice_from(start.position());
    let message = match token {
        Token::BadString(_) => "Unclosed string",
        Token::QuotedString(_) if raw.len() < 2 || !raw.ends_with(&raw[..1]) => "Unclosed string",
        Token::Comment(_) if raw.len() < 4 || !raw.ends_with("*/") => "Unclosed comment",
        _ => return Ok(()),
    };
    Err(error_at(message, start.source_location()))
}

/// Splits the text after an at-rule name into the whitespace after the
/// name and the params.
fn split_params(rest: &str) -> (&str, &str) {
    let params = rest.trim_start();
    (&rest[..rest.len() - params.len()], params)
}

fn custom<'i>(p: &Parser<'i, '_>, error: CssParseError) -> ParseError<'i, CssParseError> {
    p.new_custom_error(error)
}

fn into_css_error(error: ParseError<'_, CssParseError>) -> CssParseError {
    match error.kind {
        ParseErrorKind::Custom(error) => error,
        ParseErrorKind::Basic(_) => error_at("Unexpected token", error.location),
    }
}

fn error_at(message: &str, location: SourceLocation) -> CssParseError {
    CssParseError {
        message: message.to_string(),
        line: location.line as usize + 1,
        column: location.column as usize,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn round_trip(css: &str) {
        let sheet = parse_stylesheet(css).expect("css should parse");
        assert_eq!(sheet.to_string(), css);
    }

    #[test]
    fn prints_unmodified_input_verbatim() {
        round_trip("");
        round_trip("\n\n");
        round_trip("@import \"tailwindcss\";\n");
        round_trip("a{color:red}");
        round_trip("a { color : red ; }\n");
        round_trip(
            "@tailwind base;\n@tailwind components;\n\n@layer base {\n  :root {\n    --background: 0 0% 100%;\n    --radius: 0.5rem\n  }\n}\n",
        );
        round_trip("/* header */\nbody {\n  /* inner */\n  margin: 0;\n}\n");
        round_trip(".a{;;color:red;;}");
        round_trip("@media (min-width: 640px) {\n  .a { padding: 0 }\n}");
        round_trip("@custom-variant dark (&:is(.dark *));");
    }

    #[test]
    fn parses_nested_structure() {
        let sheet = parse_stylesheet(
            "@layer base {\n  * {\n    @apply border-border;\n  }\n}\n.btn { content: \"a;b\"; background: url(x;y) }",
        )
        .unwrap();

        assert_eq!(sheet.nodes.len(), 2);
        let Node::AtRule(layer) = &sheet.nodes[0] else {
            panic!("expected at-rule");
        };
        assert_eq!((layer.name.as_str(), layer.params.as_str()), ("layer", "base"));
        let star = layer.nodes.as_ref().unwrap()[0].as_rule().unwrap();
        assert_eq!(star.selector, "*");
        let apply = star.nodes[0].as_at_rule().unwrap();
        assert_eq!((apply.name.as_str(), apply.params.as_str()), ("apply", "border-border"));
        assert!(apply.nodes.is_none());

        let btn = sheet.nodes[1].as_rule().unwrap();
        let values: Vec<_> = btn
            .nodes
            .iter()
            .filter_map(Node::as_decl)
            .map(|decl| (decl.prop.as_str(), decl.value.as_str()))
            .collect();
        assert_eq!(values, vec![("content", "\"a;b\""), ("background", "url(x;y)")]);
    }

    #[test]
    fn separators_inside_strings_and_brackets_do_not_split() {
        let css = ".a[data-x=\"{\"] { content: \"}\"; grid-area: var(--x, calc(1 + 2)) }\n@supports (not (display: grid)) {\n  .b { color: red }\n}\n";
        round_trip(css);

        let sheet = parse_stylesheet(css).unwrap();
        let rule = sheet.nodes[0].as_rule().unwrap();
        assert_eq!(rule.selector, ".a[data-x=\"{\"]");
        let values: Vec<_> = rule
            .nodes
            .iter()
            .filter_map(Node::as_decl)
            .map(|decl| decl.value.as_str())
            .collect();
        assert_eq!(values, vec!["\"}\"", "var(--x, calc(1 + 2))"]);
        let supports = sheet.nodes[1].as_at_rule().unwrap();
        assert_eq!(supports.params, "(not (display: grid))");
    }

    #[test]
    fn unclosed_string_inside_function_is_reported() {
        let error = parse_stylesheet("a { b: fn(\"x) }").unwrap_err();
        assert_eq!(error.message, "Unclosed string");
        assert_eq!((error.line, error.column), (1, 11));
    }

    #[test]
    fn selector_with_pseudo_class_is_a_rule() {
        let sheet = parse_stylesheet("a:hover { color: red }").unwrap();
        assert_eq!(sheet.nodes[0].as_rule().map(|r| r.selector.as_str()), Some("a:hover"));
    }

    #[test]
    fn reports_unclosed_block_with_position() {
        let error = parse_stylesheet("body {\n  color: red;\n").unwrap_err();
        assert_eq!(error.message, "Unclosed block");
        assert_eq!((error.line, error.column), (1, 6));
    }

    #[test]
    fn rejects_stray_closing_brace() {
        let error = parse_stylesheet("a { color: red } }").unwrap_err();
        assert_eq!(error.message, "Unexpected }");
        assert_eq!(error.column, 18);
    }

    #[test]
    fn rejects_unknown_word_and_unclosed_comment() {
        assert_eq!(parse_stylesheet("a { color }").unwrap_err().message, "Unknown word");
        assert_eq!(parse_stylesheet("/* open").unwrap_err().message, "Unclosed comment");
        assert_eq!(
            parse_stylesheet("a { content: \"x }").unwrap_err().message,
            "Unclosed string"
        );
    }

    #[test]
    fn raw_declarations_drop_formatting() {
        let declarations = parse_declarations("color:  red;\n  padding: 0 1rem").unwrap();
        assert_eq!(
            declarations,
            vec![Declaration::new("color", "red"), Declaration::new("padding", "0 1rem")]
        );
        assert!(parse_declarations("a { color: red }").is_err());
    }
}
