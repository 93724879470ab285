//! Minimal CSS selector engine for the mock DOM.
//!
//! Supports selector groups (`a, b`), descendant (` `) and child (`>`)
//! combinators, and compound selectors built from a tag name, `#id`,
//! `.class`, `[attr]`, `[attr='v']`, `[attr*='v']`, `[attr^='v']`,
//! `[attr$='v']` and `:nth-child(n)`.

use super::dom::{Dom, NodeId};

#[derive(Debug, Clone, PartialEq, Eq)]
enum AttrOp {
    Exists,
    Equals(String),
    Contains(String),
    Prefix(String),
    Suffix(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<(String, AttrOp)>,
    nth_child: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    Descendant,
    Child,
}

/// One complex selector: compounds joined by combinators, left to right
#[derive(Debug, Clone, PartialEq, Eq)]
struct Complex {
    parts: Vec<Compound>,
    combinators: Vec<Combinator>,
}

/// A parsed selector group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorGroup {
    selectors: Vec<Complex>,
}

impl SelectorGroup {
    pub fn parse(input: &str) -> Result<Self, String> {
        let selectors = split_top_level(input, ',')
            .into_iter()
            .map(|s| parse_complex(s.trim()))
            .collect::<Result<Vec<_>, _>>()?;
        if selectors.is_empty() {
            return Err(format!("empty selector: '{}'", input));
        }
        Ok(Self { selectors })
    }

    pub fn matches(&self, dom: &Dom, node: NodeId) -> bool {
        self.selectors.iter().any(|s| matches_complex(dom, node, s, s.parts.len() - 1))
    }
}

/// Split on `sep` outside of brackets and quotes
fn split_top_level(input: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0;

    for (i, c) in input.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(c),
            (None, '[' | '(') => depth += 1,
            (None, ']' | ')') => depth = depth.saturating_sub(1),
            (None, c) if c == sep && depth == 0 => {
                parts.push(&input[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&input[start..]);
    parts.into_iter().filter(|p| !p.trim().is_empty()).collect()
}

fn parse_complex(input: &str) -> Result<Complex, String> {
    let mut parts = Vec::new();
    let mut combinators = Vec::new();
    let mut pending = None;

    let spaced = input.replace('>', " > ");
    for token in split_top_level(&spaced, ' ') {
        let token = token.trim();
        if token == ">" {
            pending = Some(Combinator::Child);
            continue;
        }
        if !parts.is_empty() {
            combinators.push(pending.take().unwrap_or(Combinator::Descendant));
        }
        parts.push(parse_compound(token)?);
    }

    if parts.is_empty() || pending.is_some() {
        return Err(format!("invalid selector: '{}'", input));
    }
    Ok(Complex { parts, combinators })
}

fn parse_compound(input: &str) -> Result<Compound, String> {
    let mut compound = Compound::default();
    let chars: Vec<char> = input.chars().collect();
    let mut i = 0;

    let read_ident = |i: &mut usize| -> String {
        let start = *i;
        while *i < chars.len() && (chars[*i].is_alphanumeric() || chars[*i] == '-' || chars[*i] == '_') {
            *i += 1;
        }
        chars[start..*i].iter().collect()
    };

    if i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '*') {
        if chars[i] == '*' {
            i += 1;
        } else {
            compound.tag = Some(read_ident(&mut i).to_lowercase());
        }
    }

    while i < chars.len() {
        match chars[i] {
            '#' => {
                i += 1;
                compound.id = Some(read_ident(&mut i));
            }
            '.' => {
                i += 1;
                compound.classes.push(read_ident(&mut i));
            }
            '[' => {
                let end = chars[i..]
                    .iter()
                    .position(|&c| c == ']')
                    .map(|p| i + p)
                    .ok_or_else(|| format!("unterminated attribute in '{}'", input))?;
                let body: String = chars[i + 1..end].iter().collect();
                compound.attrs.push(parse_attr(&body));
                i = end + 1;
            }
            ':' => {
                let rest: String = chars[i..].iter().collect();
                let arg = rest
                    .strip_prefix(":nth-child(")
                    .and_then(|r| r.split(')').next())
                    .ok_or_else(|| format!("unsupported pseudo-class in '{}'", input))?;
                let n = arg
                    .trim()
                    .parse()
                    .map_err(|_| format!("bad nth-child argument in '{}'", input))?;
                compound.nth_child = Some(n);
                i += ":nth-child(".len() + arg.len() + 1;
            }
            c => return Err(format!("unexpected '{}' in selector '{}'", c, input)),
        }
    }

    Ok(compound)
}

fn parse_attr(body: &str) -> (String, AttrOp) {
    let unquote = |v: &str| v.trim().trim_matches(|c| c == '\'' || c == '"').to_string();
    for (op, ctor) in [
        ("*=", AttrOp::Contains as fn(String) -> AttrOp),
        ("^=", AttrOp::Prefix),
        ("$=", AttrOp::Suffix),
        ("=", AttrOp::Equals),
    ] {
        if let Some((name, value)) = body.split_once(op) {
            return (name.trim().to_string(), ctor(unquote(value)));
        }
    }
    (body.trim().to_string(), AttrOp::Exists)
}

fn matches_complex(dom: &Dom, node: NodeId, complex: &Complex, index: usize) -> bool {
    if !matches_compound(dom, node, &complex.parts[index]) {
        return false;
    }
    if index == 0 {
        return true;
    }

    match complex.combinators[index - 1] {
        Combinator::Child => dom
            .parent(node)
            .is_some_and(|parent| matches_complex(dom, parent, complex, index - 1)),
        Combinator::Descendant => {
            let mut current = dom.parent(node);
            while let Some(ancestor) = current {
                if matches_complex(dom, ancestor, complex, index - 1) {
                    return true;
                }
                current = dom.parent(ancestor);
            }
            false
        }
    }
}

fn matches_compound(dom: &Dom, node: NodeId, compound: &Compound) -> bool {
    let n = dom.node(node);

    if let Some(tag) = &compound.tag {
        if &n.tag != tag {
            return false;
        }
    }
    if let Some(id) = &compound.id {
        if n.id.as_deref() != Some(id.as_str()) {
            return false;
        }
    }
    if !compound.classes.iter().all(|c| n.classes.iter().any(|nc| nc == c)) {
        return false;
    }
    for (name, op) in &compound.attrs {
        let value = dom.attribute(node, name);
        let ok = match (op, value) {
            (AttrOp::Exists, v) => v.is_some(),
            (_, None) => false,
            (AttrOp::Equals(x), Some(v)) => &v == x,
            (AttrOp::Contains(x), Some(v)) => v.contains(x.as_str()),
            (AttrOp::Prefix(x), Some(v)) => v.starts_with(x.as_str()),
            (AttrOp::Suffix(x), Some(v)) => v.ends_with(x.as_str()),
        };
        if !ok {
            return false;
        }
    }
    if let Some(nth) = compound.nth_child {
        if dom.child_position(node) != Some(nth) {
            return false;
        }
    }
    true
}
