//! A small CSS selector subset.
//!
//! Supported: type selectors, `*`, `#id`, `.class`, `[attr]`, `[attr="value"]`,
//! `:not(<compound>)`, descendant (whitespace) and child (`>`) combinators, and
//! comma-separated lists. That is enough to describe the host page markup the
//! pipeline looks for.

use std::fmt;

use crate::document::{HostDocument, NodeId};
use crate::error::DomError;

/// Relation between a compound selector and the one to its left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    Descendant,
    Child,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum AttrMatch {
    Exists(String),
    Equals(String, String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<AttrMatch>,
    negations: Vec<Compound>,
}

/// A chain of compounds; each compound carries the combinator to its left.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Complex {
    parts: Vec<(Combinator, Compound)>,
}

/// A parsed, comma-separated selector list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorList {
    source: String,
    selectors: Vec<Complex>,
}

impl SelectorList {
    /// Parse selector text.
    pub fn parse(source: &str) -> Result<Self, DomError> {
        let mut parser = Parser::new(source);
        let selectors = parser.parse_list()?;
        Ok(Self {
            source: source.trim().to_string(),
            selectors,
        })
    }

    /// The selector text this list was parsed from.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Whether `node` matches any selector in the list.
    pub fn matches<D: HostDocument + ?Sized>(&self, doc: &D, node: NodeId) -> bool {
        if doc.tag_name(node).is_none() {
            return false;
        }
        self.selectors
            .iter()
            .any(|complex| matches_parts(doc, node, &complex.parts))
    }
}

impl fmt::Display for SelectorList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Alternative selector strategies, tried in priority order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorSet {
    alternatives: Vec<SelectorList>,
}

impl SelectorSet {
    /// Parse every alternative; the first invalid one fails the whole set.
    pub fn parse<S: AsRef<str>>(sources: &[S]) -> Result<Self, DomError> {
        let alternatives = sources
            .iter()
            .map(|s| SelectorList::parse(s.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { alternatives })
    }

    pub fn alternatives(&self) -> &[SelectorList] {
        &self.alternatives
    }

    /// Whether `node` matches any alternative.
    pub fn matches<D: HostDocument + ?Sized>(&self, doc: &D, node: NodeId) -> bool {
        self.alternatives.iter().any(|s| s.matches(doc, node))
    }

    /// First document-order match of the highest-priority alternative that matches anything.
    pub fn query_first<D: HostDocument + ?Sized>(&self, doc: &D, root: NodeId) -> Option<NodeId> {
        self.alternatives
            .iter()
            .find_map(|selector| doc.query_first(root, selector))
    }

    /// Union of all alternatives over the descendants of `root`, in document order.
    pub fn query_all<D: HostDocument + ?Sized>(&self, doc: &D, root: NodeId) -> Vec<NodeId> {
        doc.descendants(root)
            .into_iter()
            .filter(|node| self.matches(doc, *node))
            .collect()
    }

    /// Like [`SelectorSet::query_first`], but `root` itself is a candidate for each alternative.
    pub fn find_first_inclusive<D: HostDocument + ?Sized>(
        &self,
        doc: &D,
        root: NodeId,
    ) -> Option<NodeId> {
        self.alternatives.iter().find_map(|selector| {
            if selector.matches(doc, root) {
                Some(root)
            } else {
                doc.query_first(root, selector)
            }
        })
    }

    /// Like [`SelectorSet::query_all`], with `root` first when it matches.
    pub fn query_all_inclusive<D: HostDocument + ?Sized>(&self, doc: &D, root: NodeId) -> Vec<NodeId> {
        let mut found = Vec::new();
        if self.matches(doc, root) {
            found.push(root);
        }
        found.extend(self.query_all(doc, root));
        found
    }
}

impl fmt::Display for SelectorSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined: Vec<&str> = self.alternatives.iter().map(|s| s.as_str()).collect();
        f.write_str(&joined.join(" | "))
    }
}

fn matches_parts<D: HostDocument + ?Sized>(
    doc: &D,
    node: NodeId,
    parts: &[(Combinator, Compound)],
) -> bool {
    let Some(((combinator, compound), rest)) = parts.split_last() else {
        return true;
    };
    if !matches_compound(doc, node, compound) {
        return false;
    }
    if rest.is_empty() {
        return true;
    }

    match combinator {
        Combinator::Child => doc
            .parent(node)
            .is_some_and(|parent| matches_parts(doc, parent, rest)),
        Combinator::Descendant => {
            let mut current = doc.parent(node);
            while let Some(ancestor) = current {
                if matches_parts(doc, ancestor, rest) {
                    return true;
                }
                current = doc.parent(ancestor);
            }
            false
        }
    }
}

fn matches_compound<D: HostDocument + ?Sized>(doc: &D, node: NodeId, compound: &Compound) -> bool {
    let Some(tag) = doc.tag_name(node) else {
        return false;
    };

    if let Some(expected) = &compound.tag {
        if !tag.eq_ignore_ascii_case(expected) {
            return false;
        }
    }

    if let Some(expected) = &compound.id {
        if doc.attribute(node, "id").as_deref() != Some(expected.as_str()) {
            return false;
        }
    }

    if !compound.classes.is_empty() {
        let class_attr = doc.attribute(node, "class").unwrap_or_default();
        let has_all = compound
            .classes
            .iter()
            .all(|class| class_attr.split_whitespace().any(|c| c == class));
        if !has_all {
            return false;
        }
    }

    let attrs_ok = compound.attrs.iter().all(|attr| match attr {
        AttrMatch::Exists(name) => doc.attribute(node, name).is_some(),
        AttrMatch::Equals(name, value) => doc.attribute(node, name).as_deref() == Some(value.as_str()),
    });
    if !attrs_ok {
        return false;
    }

    compound
        .negations
        .iter()
        .all(|negated| !matches_compound(doc, node, negated))
}

struct Parser<'a> {
    source: &'a str,
    chars: Vec<char>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.chars().collect(),
            pos: 0,
        }
    }

    fn error(&self, message: impl Into<String>) -> DomError {
        DomError::InvalidSelector {
            selector: self.source.to_string(),
            message: message.into(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    fn expect(&mut self, expected: char) -> Result<(), DomError> {
        match self.bump() {
            Some(c) if c == expected => Ok(()),
            Some(c) => Err(self.error(format!("expected '{}', found '{}'", expected, c))),
            None => Err(self.error(format!("expected '{}', found end of input", expected))),
        }
    }

    /// Skip whitespace; returns whether any was skipped.
    fn skip_ws(&mut self) -> bool {
        let start = self.pos;
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
        self.pos > start
    }

    fn parse_list(&mut self) -> Result<Vec<Complex>, DomError> {
        let mut list = Vec::new();
        loop {
            self.skip_ws();
            list.push(self.parse_complex()?);
            self.skip_ws();
            match self.peek() {
                Some(',') => {
                    self.pos += 1;
                }
                None => break,
                Some(c) => return Err(self.error(format!("unexpected '{}'", c))),
            }
        }
        Ok(list)
    }

    fn parse_complex(&mut self) -> Result<Complex, DomError> {
        let mut parts = vec![(Combinator::Descendant, self.parse_compound()?)];
        loop {
            let had_ws = self.skip_ws();
            match self.peek() {
                None | Some(',') => break,
                Some('>') => {
                    self.pos += 1;
                    self.skip_ws();
                    parts.push((Combinator::Child, self.parse_compound()?));
                }
                Some(_) if had_ws => {
                    parts.push((Combinator::Descendant, self.parse_compound()?));
                }
                Some(c) => return Err(self.error(format!("unexpected '{}'", c))),
            }
        }
        Ok(Complex { parts })
    }

    fn parse_compound(&mut self) -> Result<Compound, DomError> {
        let mut compound = Compound::default();
        let mut any = false;

        match self.peek() {
            Some('*') => {
                self.pos += 1;
                any = true;
            }
            Some(c) if is_ident_start(c) => {
                compound.tag = Some(self.ident()?.to_ascii_lowercase());
                any = true;
            }
            _ => {}
        }

        loop {
            match self.peek() {
                Some('#') => {
                    self.pos += 1;
                    compound.id = Some(self.ident()?);
                }
                Some('.') => {
                    self.pos += 1;
                    compound.classes.push(self.ident()?);
                }
                Some('[') => {
                    self.pos += 1;
                    compound.attrs.push(self.parse_attr()?);
                }
                Some(':') => {
                    self.pos += 1;
                    let pseudo = self.ident()?;
                    if pseudo != "not" {
                        return Err(self.error(format!("unsupported pseudo-class ':{}'", pseudo)));
                    }
                    self.expect('(')?;
                    self.skip_ws();
                    let inner = self.parse_compound()?;
                    self.skip_ws();
                    self.expect(')')?;
                    compound.negations.push(inner);
                }
                _ => break,
            }
            any = true;
        }

        if !any {
            return match self.peek() {
                Some(c) => Err(self.error(format!("expected selector, found '{}'", c))),
                None => Err(self.error("expected selector, found end of input")),
            };
        }
        Ok(compound)
    }

    fn parse_attr(&mut self) -> Result<AttrMatch, DomError> {
        self.skip_ws();
        let name = self.ident()?;
        self.skip_ws();
        let result = if self.peek() == Some('=') {
            self.pos += 1;
            self.skip_ws();
            let value = match self.peek() {
                Some(quote @ ('"' | '\'')) => {
                    self.pos += 1;
                    let mut value = String::new();
                    loop {
                        match self.bump() {
                            Some(c) if c == quote => break,
                            Some(c) => value.push(c),
                            None => return Err(self.error("unterminated attribute value")),
                        }
                    }
                    value
                }
                _ => self.ident()?,
            };
            self.skip_ws();
            AttrMatch::Equals(name, value)
        } else {
            AttrMatch::Exists(name)
        };
        self.expect(']')?;
        Ok(result)
    }

    fn ident(&mut self) -> Result<String, DomError> {
        let start = self.pos;
        while self.peek().is_some_and(is_ident_char) {
            self.pos += 1;
        }
        if self.pos == start {
            return Err(match self.peek() {
                Some(c) => self.error(format!("expected identifier, found '{}'", c)),
                None => self.error("expected identifier, found end of input"),
            });
        }
        Ok(self.chars[start..self.pos].iter().collect())
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '-' || !c.is_ascii()
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-' || !c.is_ascii()
}

#[cfg(test)]
#[path = "selector_tests.rs"]
mod tests;
