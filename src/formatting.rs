//! Formatting inheritance and fragment construction.
//!
//! [`extract_formatting`] recovers run properties from a WordprocessingML
//! node; [`build_fragment`] turns text plus properties into run markup. The
//! writer calls both on its fast path, so an explicit
//! `build_fragment(text, &extract_formatting(node))` is byte-identical to
//! what a plain-text write produces at the same node.

use crate::types::{DocumentKind, FormattingProperties, NativeFragment};
use crate::xml::XmlElement;
use crate::Result;

/// `w:val` values that switch a toggle property off.
const TOGGLE_OFF: &[&str] = &["0", "false", "off"];

/// Find the `w:rPr` that governs `node`.
///
/// Precedence: the node's own `w:rPr` (runs), the first descendant run's
/// `w:rPr`, then paragraph-level run properties (`w:pPr/w:rPr`) of the node
/// or, for containers, of its first paragraph.
fn governing_run_properties(node: &XmlElement) -> Option<&XmlElement> {
    if let Some(rpr) = node.child("w:rPr") {
        return Some(rpr);
    }
    if let Some(first_run) = node.find_descendant("w:r") {
        if let Some(rpr) = first_run.child("w:rPr") {
            return Some(rpr);
        }
    }
    if let Some(ppr) = node.child("w:pPr") {
        return ppr.child("w:rPr");
    }
    if node.is("w:p") {
        return None;
    }
    node.find_descendant("w:p")
        .and_then(|p| p.child("w:pPr"))
        .and_then(|ppr| ppr.child("w:rPr"))
}

fn toggle(rpr: &XmlElement, name: &str) -> bool {
    rpr.child(name).is_some_and(|el| {
        el.attr("w:val")
            .is_none_or(|val| !TOGGLE_OFF.contains(&val.trim().to_ascii_lowercase().as_str()))
    })
}

fn val_of(rpr: &XmlElement, name: &str) -> Option<String> {
    rpr.child(name)
        .and_then(|el| el.attr("w:val"))
        .map(ToString::to_string)
}

/// Read the properties held by a `w:rPr` element.
#[must_use]
pub fn read_run_properties(rpr: &XmlElement) -> FormattingProperties {
    let fonts = rpr.child("w:rFonts");
    let font = |attr: &str| fonts.and_then(|f| f.attr(attr)).map(ToString::to_string);
    let underline = rpr.child("w:u").and_then(|u| {
        let val = u.attr("w:val").unwrap_or("single");
        (val != "none").then(|| val.to_string())
    });

    FormattingProperties {
        font_ascii: font("w:ascii"),
        font_h_ansi: font("w:hAnsi"),
        font_cs: font("w:cs"),
        font_east_asia: font("w:eastAsia"),
        size: val_of(rpr, "w:sz"),
        size_cs: val_of(rpr, "w:szCs"),
        bold: toggle(rpr, "w:b"),
        italic: toggle(rpr, "w:i"),
        underline,
        color: val_of(rpr, "w:color"),
    }
}

/// Extract inheritable formatting from a resolved node. Never fails: a node
/// without formatting yields an empty property set.
#[must_use]
pub fn extract_formatting(node: &XmlElement) -> FormattingProperties {
    governing_run_properties(node)
        .map(read_run_properties)
        .unwrap_or_default()
}

/// Same as [`extract_formatting`], from a serialized element.
///
/// Namespace prefixes do not need to be declared in `element_xml`.
pub fn extract_formatting_from_xml(element_xml: &str) -> Result<FormattingProperties> {
    let elements = XmlElement::parse_fragment(element_xml)?;
    Ok(elements
        .first()
        .map(extract_formatting)
        .unwrap_or_default())
}

fn needs_preserve(text: &str) -> bool {
    text.starts_with(char::is_whitespace) || text.ends_with(char::is_whitespace)
}

fn val_element(name: &str, value: &str) -> XmlElement {
    XmlElement::new(name).with_attr("w:val", value)
}

/// The `w:rPr` element for `formatting`, or `None` when it is empty.
#[must_use]
pub fn run_properties_element(formatting: &FormattingProperties) -> Option<XmlElement> {
    if formatting.is_empty() {
        return None;
    }
    let mut rpr = XmlElement::new("w:rPr");
    if formatting.has_fonts() {
        let mut fonts = XmlElement::new("w:rFonts");
        let pairs = [
            ("w:ascii", &formatting.font_ascii),
            ("w:hAnsi", &formatting.font_h_ansi),
            ("w:cs", &formatting.font_cs),
            ("w:eastAsia", &formatting.font_east_asia),
        ];
        for (attr, value) in pairs {
            if let Some(value) = value {
                fonts.set_attr(attr, value.as_str());
            }
        }
        rpr.push(fonts);
    }
    if formatting.bold {
        rpr.push(XmlElement::new("w:b"));
    }
    if formatting.italic {
        rpr.push(XmlElement::new("w:i"));
    }
    if let Some(color) = &formatting.color {
        rpr.push(val_element("w:color", color));
    }
    if let Some(size) = &formatting.size {
        rpr.push(val_element("w:sz", size));
    }
    if let Some(size_cs) = &formatting.size_cs {
        rpr.push(val_element("w:szCs", size_cs));
    }
    if let Some(underline) = &formatting.underline {
        rpr.push(val_element("w:u", underline));
    }
    Some(rpr)
}

/// Text element (`w:t` or `t`) with whitespace preservation when needed.
pub(crate) fn text_element(name: &str, text: &str) -> XmlElement {
    let mut t = XmlElement::new(name);
    set_text_preserving(&mut t, text);
    t
}

/// Replace the text of a text element, marking edge whitespace as significant.
pub(crate) fn set_text_preserving(t: &mut XmlElement, text: &str) {
    if needs_preserve(text) {
        t.set_attr("xml:space", "preserve");
    }
    t.set_text(text);
}

/// Build a `w:r` element carrying `text` and every present property.
#[must_use]
pub fn build_run(text: &str, formatting: &FormattingProperties) -> XmlElement {
    let mut run = XmlElement::new("w:r");
    if let Some(rpr) = run_properties_element(formatting) {
        run.push(rpr);
    }
    run.push(text_element("w:t", text));
    run
}

/// Build run markup for `text`. Pure: same inputs, same bytes.
///
/// Run properties are emitted in CT_RPr schema order: `w:rFonts`, `w:b`,
/// `w:i`, `w:color`, `w:sz`, `w:szCs`, `w:u`. Underline therefore follows the
/// size elements, so a fragment whose `w:u` precedes `w:sz` will not be
/// byte-identical to ours even when it carries the same properties.
#[must_use]
pub fn build_fragment(text: &str, formatting: &FormattingProperties) -> String {
    build_run(text, formatting).to_xml_string()
}

/// SpreadsheetML rich-run properties, in `CT_RPrElt` order.
fn inline_run_properties(formatting: &FormattingProperties) -> Option<XmlElement> {
    if formatting.is_empty() {
        return None;
    }
    let mut rpr = XmlElement::new("rPr");
    if let Some(font) = formatting.primary_font() {
        rpr.push(XmlElement::new("rFont").with_attr("val", font));
    }
    if formatting.bold {
        rpr.push(XmlElement::new("b"));
    }
    if formatting.italic {
        rpr.push(XmlElement::new("i"));
    }
    if let Some(color) = &formatting.color {
        rpr.push(XmlElement::new("color").with_attr("rgb", color.as_str()));
    }
    if let Some(size) = &formatting.size {
        rpr.push(XmlElement::new("sz").with_attr("val", size.as_str()));
    }
    if let Some(underline) = &formatting.underline {
        rpr.push(XmlElement::new("u").with_attr("val", underline.as_str()));
    }
    Some(rpr)
}

/// Build an `<is>` inline string; a bare `<is><t>` when there is no formatting.
#[must_use]
pub fn build_inline_string(text: &str, formatting: &FormattingProperties) -> XmlElement {
    let mut is = XmlElement::new("is");
    match inline_run_properties(formatting) {
        Some(rpr) => {
            let run = XmlElement::new("r")
                .with_child(rpr)
                .with_child(text_element("t", text));
            is.push(run);
        }
        None => is.push(text_element("t", text)),
    }
    is
}

/// Build the native fragment for `kind`.
#[must_use]
pub fn build_native_fragment(
    kind: DocumentKind,
    text: &str,
    formatting: &FormattingProperties,
) -> NativeFragment {
    match kind {
        DocumentKind::Flow => NativeFragment::Ooxml(build_fragment(text, formatting)),
        DocumentKind::Spreadsheet => {
            NativeFragment::InlineString(build_inline_string(text, formatting).to_xml_string())
        }
        DocumentKind::Form => NativeFragment::FieldValue(text.to_string()),
    }
}
