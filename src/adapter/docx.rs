//! WordprocessingML adapter.
//!
//! Addressable locations are the cells of top-level tables (`T{t}-R{r}-C{c}`)
//! and top-level paragraphs (`P{n}`). Locators are positional paths relative
//! to `w:body`.

use std::collections::BTreeMap;

use tracing::debug;

use super::{ApplyOutcome, IndexContext, IndexParts, truncate_snippet};
use crate::constants::{ANSWER_TARGET_MARKER, DOCX_DOCUMENT_PART};
use crate::formatting::{extract_formatting, set_text_preserving};
use crate::package::{PackageReader, repackage};
use crate::placeholder::{PlaceholderMatcher, PlaceholderPatterns};
use crate::types::{ComplexElement, FormattingProperties, InsertionMode};
use crate::xml::path::{build_locator, element_at, element_at_mut, parse_locator, resolve_steps};
use crate::xml::{XmlDocument, XmlElement, XmlNode};
use crate::{DocfillError, Result};

/// Descendants that make a location too complex to render as text.
const COMPLEX_TAGS: &[&str] = &["w:sdt", "w:fldChar", "w:txbxContent", "w:object"];

/// Fill values that do not count as shading.
const UNSHADED_FILLS: &[&str] = &["", "auto", "ffffff"];

/// Characters of cell text quoted in structural issues.
const ISSUE_CONTEXT_CHARS: usize = 50;

pub(crate) struct FlowDocument {
    /// `word/document.xml` with the body detached.
    shell: XmlDocument,
    body_index: usize,
    body: XmlElement,
}

/// Text of an element: its own text for `w:t`, else all descendant `w:t`.
pub(crate) fn element_text(element: &XmlElement) -> String {
    if element.is("w:t") {
        element.text()
    } else {
        element.collect_text("w:t")
    }
}

fn is_block(element: &XmlElement) -> bool {
    element.is("w:p") || element.is("w:tbl")
}

impl FlowDocument {
    pub(crate) fn parse(bytes: &[u8]) -> Result<Self> {
        let mut package = PackageReader::open(bytes)?;
        let part = package.read(DOCX_DOCUMENT_PART)?;
        let mut shell = XmlDocument::parse(&part)
            .map_err(|err| DocfillError::malformed(format!("{DOCX_DOCUMENT_PART}: {err}")))?;

        let body_index = shell
            .root
            .children
            .iter()
            .position(|node| matches!(node, XmlNode::Element(el) if el.is("w:body")))
            .ok_or_else(|| DocfillError::malformed("no <w:body> element found in document.xml"))?;
        let body = match shell.root.children.get_mut(body_index) {
            Some(XmlNode::Element(el)) => std::mem::take(el),
            _ => return Err(DocfillError::malformed("no <w:body> element found in document.xml")),
        };

        Ok(Self {
            shell,
            body_index,
            body,
        })
    }

    pub(crate) fn index(&self, ctx: &IndexContext<'_>) -> IndexParts {
        let mut parts = IndexParts::default();
        let mut tables = 0usize;
        let mut paragraphs = 0usize;

        for (idx, node) in self.body.children.iter().enumerate() {
            let XmlNode::Element(child) = node else {
                continue;
            };
            match child.name.as_str() {
                "w:tbl" => {
                    tables += 1;
                    self.index_table(child, idx, tables, ctx, &mut parts);
                }
                "w:p" => {
                    paragraphs += 1;
                    let id = format!("P{paragraphs}");
                    self.index_location(&id, child, &[idx], ctx, &mut parts);
                }
                _ => {}
            }
        }

        debug!(
            target: "docfill::docx",
            tables,
            paragraphs,
            locations = parts.id_to_locator.len(),
            "indexed flow document"
        );
        parts
    }

    fn index_table(
        &self,
        table: &XmlElement,
        table_idx: usize,
        table_no: usize,
        ctx: &IndexContext<'_>,
        parts: &mut IndexParts,
    ) {
        let mut row_no = 0usize;
        for (row_idx, row_node) in table.children.iter().enumerate() {
            let XmlNode::Element(row) = row_node else {
                continue;
            };
            if !row.is("w:tr") {
                continue;
            }
            row_no += 1;
            let mut col_no = 0usize;
            for (cell_idx, cell_node) in row.children.iter().enumerate() {
                let XmlNode::Element(cell) = cell_node else {
                    continue;
                };
                if !cell.is("w:tc") {
                    continue;
                }
                col_no += 1;
                let id = format!("T{table_no}-R{row_no}-C{col_no}");
                self.index_location(&id, cell, &[table_idx, row_idx, cell_idx], ctx, parts);
            }
        }
    }

    fn index_location(
        &self,
        id: &str,
        element: &XmlElement,
        node_path: &[usize],
        ctx: &IndexContext<'_>,
        parts: &mut IndexParts,
    ) {
        let Some(locator) = build_locator(&self.body, node_path) else {
            return;
        };
        parts.id_to_locator.insert(id.to_string(), locator.clone());

        if let Some(kind) = detect_complex(element) {
            let snippet = truncate_snippet(&element.to_xml_string(), ctx.snippet_chars);
            parts.lines.push(format!("{id}: COMPLEX({kind}): {snippet}"));
            parts.complex_elements.push(ComplexElement {
                identifier: id.to_string(),
                locator,
                kind,
            });
            return;
        }

        let text = element_text(element);
        let hints = formatting_hints(element, &text, ctx.patterns);
        let hint_str = if hints.is_empty() {
            String::new()
        } else {
            format!(" [{}]", hints.join(", "))
        };
        let stripped = text.trim();
        let marker = if stripped.is_empty() || ctx.patterns.is_match(stripped) {
            ANSWER_TARGET_MARKER
        } else {
            ""
        };
        parts.lines.push(format!("{id}: \"{text}\"{hint_str}{marker}"));
    }

    fn node_path(&self, locator: &str) -> Result<Option<Vec<usize>>> {
        let steps = parse_locator(locator)?;
        Ok(resolve_steps(&self.body, &steps))
    }

    pub(crate) fn element(&self, locator: &str) -> Result<Option<&XmlElement>> {
        Ok(self
            .node_path(locator)?
            .and_then(|path| element_at(&self.body, &path)))
    }

    pub(crate) fn contains(&self, locator: &str) -> Result<bool> {
        Ok(self.element(locator)?.is_some())
    }

    pub(crate) fn text_at(&self, locator: &str) -> Result<Option<String>> {
        Ok(self.element(locator)?.map(element_text))
    }

    pub(crate) fn formatting_at(&self, locator: &str) -> Result<Option<FormattingProperties>> {
        Ok(self.element(locator)?.map(extract_formatting))
    }

    pub(crate) fn apply(
        &mut self,
        locator: &str,
        markup: &str,
        mode: InsertionMode,
        matcher: PlaceholderMatcher<'_>,
    ) -> Result<ApplyOutcome> {
        let Some(path) = self.node_path(locator)? else {
            return Ok(ApplyOutcome::TargetMissing);
        };
        let fragment = XmlElement::parse_fragment(markup)?;
        let Some(target) = element_at_mut(&mut self.body, &path) else {
            return Ok(ApplyOutcome::TargetMissing);
        };

        match mode {
            InsertionMode::ReplaceContent => replace_content(target, fragment),
            InsertionMode::Append => append_content(target, fragment),
            InsertionMode::ReplacePlaceholder => {
                let replacement: String = fragment.iter().map(element_text).collect();
                if !replace_placeholder(target, matcher, &replacement) {
                    return Ok(ApplyOutcome::PlaceholderMissing);
                }
            }
        }
        Ok(ApplyOutcome::Applied)
    }

    /// Bare runs directly under a cell, and cells without a paragraph.
    pub(crate) fn structural_issues(&self) -> Vec<String> {
        let mut issues = Vec::new();
        for cell in self.body.descendants("w:tc") {
            let context: String = element_text(cell).chars().take(ISSUE_CONTEXT_CHARS).collect();
            if cell.child_elements().any(|el| el.is("w:r")) {
                issues.push(format!(
                    "Bare <w:r> found directly under <w:tc> (context: {context:?})"
                ));
            }
            if cell.child("w:p").is_none() {
                issues.push(format!("<w:tc> has no <w:p> child (context: {context:?})"));
            }
        }
        issues
    }

    pub(crate) fn to_bytes(&self, source: &[u8]) -> Result<Vec<u8>> {
        let mut document = self.shell.clone();
        match document.root.children.get_mut(self.body_index) {
            Some(XmlNode::Element(slot)) => *slot = self.body.clone(),
            _ => return Err(DocfillError::malformed("document body slot disappeared")),
        }
        let mut replacements = BTreeMap::new();
        replacements.insert(DOCX_DOCUMENT_PART.to_string(), document.to_bytes());
        repackage(source, &replacements)
    }
}

/// Classify what makes `element` complex, if anything.
fn detect_complex(element: &XmlElement) -> Option<String> {
    for tag in COMPLEX_TAGS {
        if element.find_descendant(tag).is_some() {
            return Some(tag.trim_start_matches("w:").to_string());
        }
    }
    if element.is("w:tc") && element.find_descendant("w:tbl").is_some() {
        return Some("nested_table".to_string());
    }
    if let Some(span) = element.find_descendant("w:gridSpan") {
        let val = span.attr("w:val").unwrap_or("");
        if !val.is_empty() && val != "1" {
            return Some(format!("gridSpan={val}"));
        }
    }
    if element.find_descendant("w:vMerge").is_some() {
        return Some("vMerge".to_string());
    }
    None
}

fn formatting_hints(element: &XmlElement, text: &str, patterns: &PlaceholderPatterns) -> Vec<&'static str> {
    let mut hints = Vec::new();
    if text.trim().is_empty() {
        hints.push("empty");
    } else if patterns.is_match(text) {
        hints.push("placeholder");
    }
    if element.find_descendant("w:b").is_some() {
        hints.push("bold");
    }
    if element.find_descendant("w:i").is_some() {
        hints.push("italic");
    }
    if let Some(shd) = element.find_descendant("w:shd") {
        let fill = shd.attr("w:fill").unwrap_or("").to_ascii_lowercase();
        if !UNSHADED_FILLS.contains(&fill.as_str()) {
            hints.push("shaded");
        }
    }
    hints
}

/// Flatten a fragment to run-level content (paragraph wrappers dropped).
fn runs_of(fragment: Vec<XmlElement>) -> Vec<XmlElement> {
    let mut runs = Vec::new();
    for element in fragment {
        if element.is("w:p") {
            runs.extend(element.children.into_iter().filter_map(|node| match node {
                XmlNode::Element(el) if !el.is("w:pPr") => Some(el),
                _ => None,
            }));
        } else if element.is("w:tbl") {
            for paragraph in element.descendants("w:p") {
                runs.extend(paragraph.child_elements().filter(|el| !el.is("w:pPr")).cloned());
            }
        } else {
            runs.push(element);
        }
    }
    runs
}

/// Group a fragment into block-level elements, wrapping loose runs in
/// paragraphs that carry `paragraph_props`. The result always ends with a
/// paragraph.
fn blocks_of(fragment: Vec<XmlElement>, paragraph_props: Option<&XmlElement>) -> Vec<XmlElement> {
    let new_paragraph = || {
        let mut p = XmlElement::new("w:p");
        if let Some(ppr) = paragraph_props {
            p.push(ppr.clone());
        }
        p
    };
    let mut blocks = Vec::new();
    let mut pending: Option<XmlElement> = None;
    for element in fragment {
        if is_block(&element) {
            if let Some(p) = pending.take() {
                blocks.push(p);
            }
            blocks.push(element);
        } else {
            pending.get_or_insert_with(new_paragraph).push(element);
        }
    }
    if let Some(p) = pending.take() {
        blocks.push(p);
    }
    if !blocks.last().is_some_and(|el| el.is("w:p")) {
        blocks.push(new_paragraph());
    }
    blocks
}

/// Non-property children of every run in `fragment`, and the first run's `w:rPr`.
fn run_content_of(fragment: Vec<XmlElement>) -> (Option<XmlElement>, Vec<XmlElement>) {
    let mut rpr = None;
    let mut content = Vec::new();
    for run in runs_of(fragment) {
        if !run.is("w:r") {
            continue;
        }
        for child in run.children {
            if let XmlNode::Element(el) = child {
                if el.is("w:rPr") {
                    rpr.get_or_insert(el);
                } else {
                    content.push(el);
                }
            }
        }
    }
    (rpr, content)
}

fn keep_only(target: &mut XmlElement, keep: impl Fn(&XmlElement) -> bool) {
    target
        .children
        .retain(|node| matches!(node, XmlNode::Element(el) if keep(el)));
}

fn is_property_element(element: &XmlElement) -> bool {
    element.local_name().ends_with("Pr")
}

fn replace_content(target: &mut XmlElement, fragment: Vec<XmlElement>) {
    match target.name.as_str() {
        "w:tc" => {
            let first_props = target
                .child("w:p")
                .and_then(|p| p.child("w:pPr"))
                .cloned();
            keep_only(target, |el| el.is("w:tcPr"));
            for block in blocks_of(fragment, first_props.as_ref()) {
                target.push(block);
            }
        }
        "w:p" => {
            keep_only(target, |el| el.is("w:pPr"));
            for run in runs_of(fragment) {
                target.push(run);
            }
        }
        "w:r" => {
            let (fragment_rpr, content) = run_content_of(fragment);
            let own_rpr = target.child("w:rPr").cloned();
            target.children.clear();
            if let Some(rpr) = fragment_rpr.or(own_rpr) {
                target.push(rpr);
            }
            for el in content {
                target.push(el);
            }
        }
        _ => {
            keep_only(target, is_property_element);
            for el in fragment {
                target.push(el);
            }
        }
    }
}

fn append_content(target: &mut XmlElement, fragment: Vec<XmlElement>) {
    match target.name.as_str() {
        "w:tc" => {
            if fragment.iter().any(is_block) {
                let last_props = target
                    .children_named("w:p")
                    .last()
                    .and_then(|p| p.child("w:pPr"))
                    .cloned();
                for block in blocks_of(fragment, last_props.as_ref()) {
                    target.push(block);
                }
                return;
            }
            if target.child("w:p").is_none() {
                target.push(XmlElement::new("w:p"));
            }
            if let Some(paragraph) = target.child_elements_mut().filter(|el| el.is("w:p")).last() {
                for run in runs_of(fragment) {
                    paragraph.push(run);
                }
            }
        }
        "w:p" => {
            for run in runs_of(fragment) {
                target.push(run);
            }
        }
        "w:r" => {
            let (_, content) = run_content_of(fragment);
            for el in content {
                target.push(el);
            }
        }
        _ => {
            for el in fragment {
                target.push(el);
            }
        }
    }
}

/// Substitute the first placeholder found within a single `w:t` of `target`.
fn replace_placeholder(
    target: &mut XmlElement,
    matcher: PlaceholderMatcher<'_>,
    replacement: &str,
) -> bool {
    let mut substitute = |t: &mut XmlElement| {
        let text = t.text();
        match matcher.replace_first(&text, replacement) {
            Some(updated) => {
                set_text_preserving(t, &updated);
                true
            }
            None => false,
        }
    };
    if target.is("w:t") {
        return substitute(target);
    }
    target.for_each_descendant_mut("w:t", &mut substitute)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(xml: &str) -> Vec<XmlElement> {
        XmlElement::parse_fragment(xml).unwrap()
    }

    #[test]
    fn complex_kinds_are_named() {
        let cell = &parse(r#"<w:tc><w:tcPr><w:gridSpan w:val="2"/></w:tcPr><w:p/></w:tc>"#)[0];
        assert_eq!(detect_complex(cell).as_deref(), Some("gridSpan=2"));
        let cell = &parse("<w:tc><w:tbl/><w:p/></w:tc>")[0];
        assert_eq!(detect_complex(cell).as_deref(), Some("nested_table"));
        let para = &parse("<w:p><w:r><w:fldChar/></w:r></w:p>")[0];
        assert_eq!(detect_complex(para).as_deref(), Some("fldChar"));
        let plain = &parse(r#"<w:tc><w:tcPr><w:gridSpan w:val="1"/></w:tcPr><w:p/></w:tc>"#)[0];
        assert_eq!(detect_complex(plain), None);
    }

    #[test]
    fn hints_flag_placeholder_and_shading() {
        let el = &parse(r#"<w:p><w:pPr><w:shd w:fill="D9D9D9"/></w:pPr><w:r><w:rPr><w:b/></w:rPr><w:t>[Enter name]</w:t></w:r></w:p>"#)[0];
        let hints = formatting_hints(el, &element_text(el), &PlaceholderPatterns::default());
        assert_eq!(hints, vec!["placeholder", "bold", "shaded"]);
    }

    #[test]
    fn replacing_cell_content_wraps_runs_in_a_paragraph() {
        let mut cell = parse(
            r#"<w:tc><w:tcPr><w:tcW w:w="100"/></w:tcPr><w:p><w:pPr><w:jc w:val="center"/></w:pPr><w:r><w:t>old</w:t></w:r></w:p><w:p/></w:tc>"#,
        )
        .remove(0);
        replace_content(&mut cell, parse("<w:r><w:t>new</w:t></w:r>"));
        assert_eq!(
            cell.to_xml_string(),
            r#"<w:tc><w:tcPr><w:tcW w:w="100"/></w:tcPr><w:p><w:pPr><w:jc w:val="center"/></w:pPr><w:r><w:t>new</w:t></w:r></w:p></w:tc>"#
        );
    }

    #[test]
    fn appending_to_a_cell_uses_its_last_paragraph() {
        let mut cell = parse("<w:tc><w:p><w:r><w:t>a</w:t></w:r></w:p><w:p><w:r><w:t>b</w:t></w:r></w:p></w:tc>").remove(0);
        append_content(&mut cell, parse("<w:r><w:t>c</w:t></w:r>"));
        assert_eq!(
            cell.to_xml_string(),
            "<w:tc><w:p><w:r><w:t>a</w:t></w:r></w:p><w:p><w:r><w:t>b</w:t></w:r><w:r><w:t>c</w:t></w:r></w:p></w:tc>"
        );
    }

    #[test]
    fn replacing_paragraph_content_keeps_paragraph_properties() {
        let mut para = parse(r#"<w:p><w:pPr><w:pStyle w:val="Body"/></w:pPr><w:r><w:t>x</w:t></w:r></w:p>"#).remove(0);
        replace_content(&mut para, parse("<w:p><w:r><w:t>y</w:t></w:r></w:p>"));
        assert_eq!(
            para.to_xml_string(),
            r#"<w:p><w:pPr><w:pStyle w:val="Body"/></w:pPr><w:r><w:t>y</w:t></w:r></w:p>"#
        );
    }

    #[test]
    fn placeholder_is_replaced_inside_one_text_node() {
        let mut para = parse("<w:p><w:r><w:t>Name: </w:t></w:r><w:r><w:t>[Enter name] here</w:t></w:r></w:p>").remove(0);
        let patterns = PlaceholderPatterns::default();
        assert!(replace_placeholder(&mut para, PlaceholderMatcher::Patterns(&patterns), "Ada"));
        assert_eq!(element_text(&para), "Name: Ada here");
        let mut other = parse("<w:p><w:r><w:t>nothing</w:t></w:r></w:p>").remove(0);
        assert!(!replace_placeholder(&mut other, PlaceholderMatcher::Patterns(&patterns), "Ada"));
    }
}
