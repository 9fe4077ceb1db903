//! Positional element paths (`./w:tbl[1]/w:tr[2]/w:tc`).
//!
//! Only the subset needed to address body-level locations is supported:
//! child steps by qualified name with an optional 1-based position. A step
//! without a predicate selects the first child of that name.

use super::XmlElement;
use crate::{DocfillError, Result};

/// One `name[position]` step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathStep {
    pub name: String,
    /// 1-based position among siblings of the same name.
    pub position: usize,
}

/// Build the step that reaches `parent.children[node_index]`.
///
/// The positional predicate is only written when the parent has more than
/// one child element with that name.
#[must_use]
pub fn step_to(parent: &XmlElement, node_index: usize) -> Option<String> {
    let super::XmlNode::Element(target) = parent.children.get(node_index)? else {
        return None;
    };
    let mut position = 0;
    let mut same_name = 0;
    for (idx, sibling) in parent.children.iter().enumerate() {
        if let super::XmlNode::Element(el) = sibling {
            if el.name == target.name {
                same_name += 1;
                if idx == node_index {
                    position = same_name;
                }
            }
        }
    }
    if same_name > 1 {
        Some(format!("{}[{position}]", target.name))
    } else {
        Some(target.name.clone())
    }
}

/// Build a locator from `root` following child node indices.
#[must_use]
pub fn build_locator(root: &XmlElement, node_path: &[usize]) -> Option<String> {
    let mut parts = Vec::with_capacity(node_path.len());
    let mut current = root;
    for &idx in node_path {
        parts.push(step_to(current, idx)?);
        let super::XmlNode::Element(next) = current.children.get(idx)? else {
            return None;
        };
        current = next;
    }
    Some(format!("./{}", parts.join("/")))
}

/// Parse a locator into steps, rejecting anything outside the supported subset.
pub fn parse_locator(locator: &str) -> Result<Vec<PathStep>> {
    let invalid = |reason: &str| DocfillError::InvalidLocator {
        locator: locator.to_string(),
        reason: reason.to_string(),
    };
    let trimmed = locator.trim();
    let rest = trimmed.strip_prefix("./").unwrap_or(trimmed);
    if rest.is_empty() {
        return Err(invalid("empty path"));
    }
    if rest.starts_with('/') {
        return Err(invalid("absolute and descendant paths are not supported"));
    }

    rest.split('/')
        .map(|raw| {
            let (name, position) = match raw.split_once('[') {
                Some((name, predicate)) => {
                    let digits = predicate
                        .strip_suffix(']')
                        .ok_or_else(|| invalid("unterminated predicate"))?;
                    let position: usize = digits
                        .parse()
                        .map_err(|_| invalid("predicates must be positive integers"))?;
                    if position == 0 {
                        return Err(invalid("positions are 1-based"));
                    }
                    (name, position)
                }
                None => (raw, 1),
            };
            let valid_name = !name.is_empty()
                && name
                    .chars()
                    .all(|c| c.is_alphanumeric() || matches!(c, ':' | '_' | '-' | '.'));
            if !valid_name || name == "." || name == ".." {
                return Err(invalid("steps must be element names"));
            }
            Ok(PathStep {
                name: name.to_string(),
                position,
            })
        })
        .collect()
}

/// Child node indices reached by `steps`, or `None` when a step matches nothing.
#[must_use]
pub fn resolve_steps(root: &XmlElement, steps: &[PathStep]) -> Option<Vec<usize>> {
    let mut indices = Vec::with_capacity(steps.len());
    let mut current = root;
    for step in steps {
        let (idx, next) = current
            .children
            .iter()
            .enumerate()
            .filter_map(|(idx, node)| match node {
                super::XmlNode::Element(el) if el.name == step.name => Some((idx, el)),
                _ => None,
            })
            .nth(step.position - 1)?;
        indices.push(idx);
        current = next;
    }
    Some(indices)
}

#[must_use]
pub fn element_at<'a>(root: &'a XmlElement, node_path: &[usize]) -> Option<&'a XmlElement> {
    let mut current = root;
    for &idx in node_path {
        match current.children.get(idx)? {
            super::XmlNode::Element(el) => current = el,
            _ => return None,
        }
    }
    Some(current)
}

pub fn element_at_mut<'a>(
    root: &'a mut XmlElement,
    node_path: &[usize],
) -> Option<&'a mut XmlElement> {
    let mut current = root;
    for &idx in node_path {
        match current.children.get_mut(idx)? {
            super::XmlNode::Element(el) => current = el,
            _ => return None,
        }
    }
    Some(current)
}
