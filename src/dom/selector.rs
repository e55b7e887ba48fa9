//! Minimal CSS-subset selector matching.
//!
//! Supports compound selectors (`tag#id.class[attr]` / `[attr=value]`,
//! `*`) and comma-separated lists — the shapes the ignore/scope
//! configuration actually uses. Combinators are intentionally out of
//! scope; ancestor semantics come from `Document::closest`.

use std::str::FromStr;

use thiserror::Error;

use super::node::ElementData;

#[derive(Debug, Error, PartialEq)]
pub enum SelectorError {
    #[error("empty selector")]
    Empty,
    #[error("unsupported character '{0}' in selector")]
    Unsupported(char),
    #[error("unterminated attribute matcher")]
    UnterminatedAttr,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AttrMatch {
    Present(String),
    Equals(String, String),
}

/// One compound selector: every listed constraint must hold.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Compound {
    pub tag: Option<String>,
    pub id: Option<String>,
    pub classes: Vec<String>,
    pub attrs: Vec<AttrMatch>,
    universal: bool,
}

impl Compound {
    pub fn matches(&self, el: &ElementData) -> bool {
        if let Some(tag) = &self.tag {
            if !el.tag.eq_ignore_ascii_case(tag) {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if el.attr("id") != Some(id.as_str()) {
                return false;
            }
        }
        for class in &self.classes {
            if !el.classes().any(|c| c == class) {
                return false;
            }
        }
        for attr in &self.attrs {
            match attr {
                AttrMatch::Present(name) => {
                    if el.attr(name).is_none() {
                        return false;
                    }
                }
                AttrMatch::Equals(name, value) => {
                    if el.attr(name) != Some(value.as_str()) {
                        return false;
                    }
                }
            }
        }
        true
    }
}

/// A comma-separated selector list; matches if any compound matches.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectorList {
    compounds: Vec<Compound>,
}

impl SelectorList {
    pub fn compounds(&self) -> &[Compound] {
        &self.compounds
    }
}

impl FromStr for SelectorList {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut compounds = Vec::new();
        for part in s.split(',') {
            compounds.push(parse_compound(part.trim())?);
        }
        Ok(SelectorList { compounds })
    }
}

fn parse_compound(s: &str) -> Result<Compound, SelectorError> {
    if s.is_empty() {
        return Err(SelectorError::Empty);
    }
    let mut compound = Compound::default();
    let mut chars = s.chars().peekable();

    // Leading tag name or universal selector.
    if let Some(&c) = chars.peek() {
        if c == '*' {
            chars.next();
            compound.universal = true;
        } else if c.is_ascii_alphabetic() {
            compound.tag = Some(take_ident(&mut chars).to_ascii_lowercase());
        }
    }

    while let Some(c) = chars.next() {
        match c {
            '#' => {
                let ident = take_ident(&mut chars);
                if ident.is_empty() {
                    return Err(SelectorError::Empty);
                }
                compound.id = Some(ident);
            }
            '.' => {
                let ident = take_ident(&mut chars);
                if ident.is_empty() {
                    return Err(SelectorError::Empty);
                }
                compound.classes.push(ident);
            }
            '[' => {
                let mut body = String::new();
                let mut closed = false;
                for c in chars.by_ref() {
                    if c == ']' {
                        closed = true;
                        break;
                    }
                    body.push(c);
                }
                if !closed {
                    return Err(SelectorError::UnterminatedAttr);
                }
                compound.attrs.push(parse_attr(&body)?);
            }
            other => return Err(SelectorError::Unsupported(other)),
        }
    }

    if !compound.universal
        && compound.tag.is_none()
        && compound.id.is_none()
        && compound.classes.is_empty()
        && compound.attrs.is_empty()
    {
        return Err(SelectorError::Empty);
    }
    Ok(compound)
}

fn parse_attr(body: &str) -> Result<AttrMatch, SelectorError> {
    let body = body.trim();
    if body.is_empty() {
        return Err(SelectorError::Empty);
    }
    match body.split_once('=') {
        Some((name, value)) => {
            let value = value.trim().trim_matches('"').trim_matches('\'');
            Ok(AttrMatch::Equals(
                name.trim().to_string(),
                value.to_string(),
            ))
        }
        None => Ok(AttrMatch::Present(body.to_string())),
    }
}

fn take_ident(chars: &mut std::iter::Peekable<std::str::Chars>) -> String {
    let mut ident = String::new();
    while let Some(&c) = chars.peek() {
        if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
            ident.push(c);
            chars.next();
        } else {
            break;
        }
    }
    ident
}
