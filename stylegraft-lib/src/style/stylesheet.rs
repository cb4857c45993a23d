use std::fmt;

use crate::style::printer;

/// Text of the sentinel comment that marks where a blank line should appear
/// once the break comments are stripped from the printed output.
pub const BREAK_MARKER: &str = "---break---";

/// Original formatting captured by the parser. `None` means "not parsed", and
/// the printer falls back to its defaults for that slot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Raws {
    /// Whitespace (and stray semicolons) before the node.
    pub before: Option<String>,
    /// Text between a selector/params and `{` or `;`, or between a property
    /// and its value (colon included).
    pub between: Option<String>,
    /// Whitespace before the closing `}` of a block, or before the `;` that
    /// ends a declaration.
    pub after: Option<String>,
    /// Whitespace between an at-rule name and its params.
    pub after_name: Option<String>,
    /// Whether the last child of the block is terminated by `;`.
    pub semicolon: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stylesheet {
    pub nodes: Vec<Node>,
    /// Trailing whitespace after the last node.
    pub after: String,
    /// Whether the last top-level statement is terminated by `;`.
    pub semicolon: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Rule(Rule),
    AtRule(AtRule),
    Decl(Declaration),
    Comment(Comment),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    /// e.g. ":root", ".dark", "body"
    pub selector: String,
    pub nodes: Vec<Node>,
    pub raws: Raws,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtRule {
    /// Name without the `@`, e.g. "layer".
    pub name: String,
    pub params: String,
    /// `None` for statements such as `@import "x";`.
    pub nodes: Option<Vec<Node>>,
    pub raws: Raws,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub prop: String,
    pub value: String,
    pub raws: Raws,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    /// Everything between `/*` and `*/`.
    pub text: String,
    pub raws: Raws,
}

impl Stylesheet {
    pub fn new() -> Self {
        Stylesheet {
            nodes: Vec::new(),
            after: String::new(),
            semicolon: true,
        }
    }

    /// Inserts `nodes` at `index`. A node pushed off the top of the document
    /// loses its empty leading whitespace so it does not glue onto the new
    /// first line.
    pub fn insert_nodes(&mut self, index: usize, nodes: Vec<Node>) {
        let count = nodes.len();
        if count == 0 {
            return;
        }
        let index = index.min(self.nodes.len());
        self.nodes.splice(index..index, nodes);
        if let Some(next) = self.nodes.get_mut(index + count) {
            let raws = next.raws_mut();
            if raws.before.as_deref().is_some_and(str::is_empty) {
                raws.before = None;
            }
        }
    }

    /// Index of the last top-level at-rule called `name`.
    pub fn last_at_rule_named(&self, name: &str) -> Option<usize> {
        self.nodes
            .iter()
            .rposition(|node| matches!(node, Node::AtRule(at_rule) if at_rule.name == name))
    }
}

impl Rule {
    pub fn new(selector: impl Into<String>) -> Self {
        Rule {
            selector: selector.into(),
            nodes: Vec::new(),
            raws: Raws::default(),
        }
    }
}

impl AtRule {
    /// An at-rule with a `{ }` body.
    pub fn block(name: impl Into<String>, params: impl Into<String>) -> Self {
        AtRule {
            name: name.into(),
            params: params.into(),
            nodes: Some(Vec::new()),
            raws: Raws::default(),
        }
    }

    /// A bodyless at-rule, printed with a trailing `;`.
    pub fn statement(name: impl Into<String>, params: impl Into<String>) -> Self {
        AtRule {
            name: name.into(),
            params: params.into(),
            nodes: None,
            raws: Raws::default(),
        }
    }

    pub fn is(&self, name: &str, params: &str) -> bool {
        self.name == name && self.params == params
    }
}

impl Declaration {
    pub fn new(prop: impl Into<String>, value: impl Into<String>) -> Self {
        Declaration {
            prop: prop.into(),
            value: value.into(),
            raws: Raws::default(),
        }
    }
}

impl Comment {
    pub fn break_marker() -> Self {
        Comment {
            text: format!(" {} ", BREAK_MARKER),
            raws: Raws::default(),
        }
    }

    pub fn is_break_marker(&self) -> bool {
        self.text.trim() == BREAK_MARKER
    }
}

impl Node {
    pub fn raws(&self) -> &Raws {
        match self {
            Node::Rule(rule) => &rule.raws,
            Node::AtRule(at_rule) => &at_rule.raws,
            Node::Decl(decl) => &decl.raws,
            Node::Comment(comment) => &comment.raws,
        }
    }

    pub fn raws_mut(&mut self) -> &mut Raws {
        match self {
            Node::Rule(rule) => &mut rule.raws,
            Node::AtRule(at_rule) => &mut at_rule.raws,
            Node::Decl(decl) => &mut decl.raws,
            Node::Comment(comment) => &mut comment.raws,
        }
    }

    pub fn as_rule(&self) -> Option<&Rule> {
        match self {
            Node::Rule(rule) => Some(rule),
            _ => None,
        }
    }

    pub fn as_at_rule(&self) -> Option<&AtRule> {
        match self {
            Node::AtRule(at_rule) => Some(at_rule),
            _ => None,
        }
    }

    pub fn as_at_rule_mut(&mut self) -> Option<&mut AtRule> {
        match self {
            Node::AtRule(at_rule) => Some(at_rule),
            _ => None,
        }
    }

    pub fn as_decl(&self) -> Option<&Declaration> {
        match self {
            Node::Decl(decl) => Some(decl),
            _ => None,
        }
    }
}

/// Anything that owns child nodes: the stylesheet itself, rules and block
/// at-rules. The merge passes are written against this trait so the same
/// find-or-create logic works at every nesting level.
pub trait Container {
    fn nodes(&self) -> &[Node];

    fn nodes_mut(&mut self) -> &mut Vec<Node>;

    fn decl(&self, prop: &str) -> Option<&Declaration> {
        self.nodes()
            .iter()
            .filter_map(Node::as_decl)
            .find(|decl| decl.prop == prop)
    }

    fn has_decl(&self, prop: &str) -> bool {
        self.decl(prop).is_some()
    }

    fn rule(&self, selector: &str) -> Option<&Rule> {
        self.nodes()
            .iter()
            .filter_map(Node::as_rule)
            .find(|rule| rule.selector == selector)
    }

    fn at_rule(&self, name: &str, params: &str) -> Option<&AtRule> {
        self.nodes()
            .iter()
            .filter_map(Node::as_at_rule)
            .find(|at_rule| at_rule.is(name, params))
    }

    /// Replaces the value of the first declaration of `prop`, or appends a
    /// new declaration. Existing declarations keep their position and raws.
    fn upsert_decl(&mut self, prop: &str, value: &str) {
        let existing = self.nodes_mut().iter_mut().find_map(|node| match node {
            Node::Decl(decl) if decl.prop == prop => Some(decl),
            _ => None,
        });
        match existing {
            Some(decl) => {
                if decl.value != value {
                    log::debug!("replacing `{}: {}` with `{}`", prop, decl.value, value);
                    decl.value = value.to_string();
                }
            }
            None => {
                log::debug!("appending `{}: {}`", prop, value);
                self.nodes_mut().push(Node::Decl(Declaration::new(prop, value)));
            }
        }
    }

    /// Inserts a custom property after the last existing custom property of
    /// this block (or at the end) unless `prop` is already declared.
    fn insert_custom_property(&mut self, prop: &str, value: &str) -> bool {
        if self.has_decl(prop) {
            return false;
        }
        let position = self.nodes().iter().rposition(
            |node| matches!(node, Node::Decl(decl) if decl.prop.starts_with("--")),
        );
        let decl = Node::Decl(Declaration::new(prop, value));
        match position {
            Some(index) => self.nodes_mut().insert(index + 1, decl),
            None => self.nodes_mut().push(decl),
        }
        true
    }

    /// Appends `node` and returns its index. With `with_break`, a break
    /// marker goes in front unless the container is still empty.
    fn push_node(&mut self, node: Node, with_break: bool) -> usize {
        let nodes = self.nodes_mut();
        if with_break && !nodes.is_empty() {
            nodes.push(Node::Comment(Comment::break_marker()));
        }
        nodes.push(node);
        nodes.len() - 1
    }

    fn find_or_create_rule(&mut self, selector: &str, with_break: bool) -> &mut Rule {
        let position = self
            .nodes()
            .iter()
            .position(|node| matches!(node, Node::Rule(rule) if rule.selector == selector));
        let index = match position {
            Some(index) => index,
            None => {
                log::debug!("creating rule `{}`", selector);
                self.push_node(Node::Rule(Rule::new(selector)), with_break)
            }
        };
        match &mut self.nodes_mut()[index] {
            Node::Rule(rule) => rule,
            _ => unreachable!("index {} was selected as a rule", index),
        }
    }

    fn find_or_create_at_rule(&mut self, name: &str, params: &str, with_break: bool) -> &mut AtRule {
        let position = self
            .nodes()
            .iter()
            .position(|node| matches!(node, Node::AtRule(at_rule) if at_rule.is(name, params)));
        let index = match position {
            Some(index) => index,
            None => {
                log::debug!("creating `@{} {}`", name, params);
                self.push_node(Node::AtRule(AtRule::block(name, params)), with_break)
            }
        };
        match &mut self.nodes_mut()[index] {
            Node::AtRule(at_rule) => at_rule,
            _ => unreachable!("index {} was selected as an at-rule", index),
        }
    }
}

impl Container for Stylesheet {
    fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    fn nodes_mut(&mut self) -> &mut Vec<Node> {
        &mut self.nodes
    }
}

impl Container for Rule {
    fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    fn nodes_mut(&mut self) -> &mut Vec<Node> {
        &mut self.nodes
    }
}

impl Container for AtRule {
    fn nodes(&self) -> &[Node] {
        self.nodes.as_deref().unwrap_or(&[])
    }

    /// Adding children to a statement turns it into a block.
    fn nodes_mut(&mut self) -> &mut Vec<Node> {
        self.nodes.get_or_insert_with(Vec::new)
    }
}

impl fmt::Display for Stylesheet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&printer::to_css(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upsert_keeps_position_of_existing_declaration() {
        let mut rule = Rule::new(".card");
        rule.upsert_decl("background-color", "white");
        rule.upsert_decl("padding", "1rem");
        rule.upsert_decl("background-color", "var(--color-white)");

        let props: Vec<_> = rule
            .nodes
            .iter()
            .filter_map(Node::as_decl)
            .map(|decl| (decl.prop.as_str(), decl.value.as_str()))
            .collect();
        assert_eq!(
            props,
            vec![("background-color", "var(--color-white)"), ("padding", "1rem")]
        );
    }

    #[test]
    fn custom_property_goes_after_last_custom_property() {
        let mut theme = AtRule::block("theme", "inline");
        theme.insert_custom_property("--color-background", "var(--background)");
        theme.push_node(Node::AtRule(AtRule::block("keyframes", "spin")), false);
        assert!(theme.insert_custom_property("--color-foreground", "var(--foreground)"));
        assert!(!theme.insert_custom_property("--color-background", "red"));

        let nodes = theme.nodes();
        assert_eq!(nodes.len(), 3);
        assert_eq!(nodes[1].as_decl().map(|d| d.prop.as_str()), Some("--color-foreground"));
        assert!(nodes[2].as_at_rule().is_some());
    }

    #[test]
    fn find_or_create_reuses_existing_at_rule() {
        let mut sheet = Stylesheet::new();
        sheet.find_or_create_at_rule("layer", "base", true);
        sheet.find_or_create_at_rule("layer", "base", true);
        // nothing to separate from in an empty sheet
        assert_eq!(sheet.nodes.len(), 1);
    }

    #[test]
    fn break_marker_separates_new_at_rule_from_existing_nodes() {
        let mut sheet = Stylesheet::new();
        sheet.find_or_create_rule("body", false);
        sheet.find_or_create_at_rule("layer", "base", true);
        sheet.find_or_create_at_rule("layer", "base", true);
        assert_eq!(sheet.nodes.len(), 3);
        assert!(matches!(&sheet.nodes[1], Node::Comment(comment) if comment.is_break_marker()));
        assert!(matches!(&sheet.nodes[2], Node::AtRule(at_rule) if at_rule.is("layer", "base")));
    }

    #[test]
    fn statement_becomes_block_when_children_are_added() {
        let mut at_rule = AtRule::statement("layer", "base");
        assert!(at_rule.nodes().is_empty());
        at_rule.find_or_create_rule("body", false);
        assert_eq!(at_rule.nodes.as_ref().map(Vec::len), Some(1));
    }
}
