//! Checks applied to caller-built WordprocessingML fragments before writing.

use crate::xml::XmlElement;

/// WordprocessingML elements accepted inside a prebuilt fragment.
const ALLOWED_ELEMENTS: &[&str] = &[
    // paragraph level
    "p", "pPr", "pStyle", "jc", "spacing", "ind", "numPr", "ilvl", "numId", "pBdr", "tabs",
    // run level
    "r", "rPr", "rStyle", "rFonts", "sz", "szCs", "b", "bCs", "i", "iCs", "u", "strike",
    "dstrike", "color", "highlight", "vertAlign", "lang", "t", "br", "cr", "tab", "sym",
    "caps", "smallCaps", "vanish", "kern", "position", "shd", "effect", "em",
    // tables
    "tbl", "tblPr", "tblGrid", "gridCol", "tr", "trPr", "tc", "tcPr", "tblW", "tblBorders",
    "tblStyle", "tblLook", "tcW", "tcBorders", "vAlign", "gridSpan", "vMerge",
    "top", "left", "bottom", "right", "insideH", "insideV",
    // bookmarks and content controls
    "bookmarkStart", "bookmarkEnd", "sdt", "sdtPr", "sdtContent",
    "drawing",
];

/// Elements that may appear at the top level of a fragment.
const TOP_LEVEL_ELEMENTS: &[&str] = &["w:r", "w:p", "w:tbl", "w:sdt", "w:bookmarkStart", "w:bookmarkEnd"];

/// Check that `markup` is well-formed and only uses allowlisted elements.
///
/// Returns the parsed top-level elements on success, or a description of
/// the first problem found.
pub fn check_ooxml_fragment(markup: &str) -> std::result::Result<Vec<XmlElement>, String> {
    if markup.trim().is_empty() {
        return Err("fragment is empty".to_string());
    }
    let elements = XmlElement::parse_fragment(markup)
        .map_err(|err| format!("fragment is not well-formed XML: {err}"))?;
    if elements.is_empty() {
        return Err("fragment contains no elements".to_string());
    }
    for element in &elements {
        if !TOP_LEVEL_ELEMENTS.contains(&element.name.as_str()) {
            return Err(format!(
                "<{}> cannot be inserted; expected a run, paragraph or table",
                element.name
            ));
        }
        check_element(element)?;
    }
    Ok(elements)
}

fn check_element(element: &XmlElement) -> std::result::Result<(), String> {
    let Some((prefix, local)) = element.name.split_once(':') else {
        return Err(format!(
            "element <{}> has no namespace prefix; use the w: prefix",
            element.name
        ));
    };
    if prefix != "w" {
        return Err(format!("unknown namespace prefix '{prefix}' on <{}>", element.name));
    }
    if !ALLOWED_ELEMENTS.contains(&local) {
        return Err(format!("disallowed element <{}>", element.name));
    }
    if local == "drawing" {
        // drawing content is opaque and not checked further
        return Ok(());
    }
    element.child_elements().try_for_each(check_element)
}

/// Check that `markup` is a single SpreadsheetML `<is>` inline string.
pub fn check_inline_string(markup: &str) -> std::result::Result<(), String> {
    let elements = XmlElement::parse_fragment(markup)
        .map_err(|err| format!("fragment is not well-formed XML: {err}"))?;
    match elements.as_slice() {
        [inline] if inline.local_name() == "is" => Ok(()),
        [] => Err("fragment contains no elements".to_string()),
        _ => Err("expected exactly one <is> inline string element".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_runs_and_paragraphs_pass() {
        let parsed = check_ooxml_fragment(
            r#"<w:r><w:rPr><w:b/></w:rPr><w:t>a</w:t></w:r><w:p><w:r><w:br/></w:r></w:p>"#,
        )
        .unwrap();
        assert_eq!(parsed.len(), 2);
    }

    #[test]
    fn unknown_elements_are_rejected() {
        let err = check_ooxml_fragment("<w:r><w:script/></w:r>").unwrap_err();
        assert!(err.contains("w:script"));
        assert!(check_ooxml_fragment("<r><t>x</t></r>").is_err());
        assert!(check_ooxml_fragment("<x:r/>").is_err());
        assert!(check_ooxml_fragment("<w:tc/>").is_err());
    }

    #[test]
    fn malformed_markup_is_rejected() {
        assert!(check_ooxml_fragment("<w:r><w:t>x</w:r>").is_err());
        assert!(check_ooxml_fragment("   ").is_err());
        assert!(check_ooxml_fragment("just text").is_err());
    }

    #[test]
    fn inline_strings_need_one_is_element() {
        assert!(check_inline_string("<is><t>x</t></is>").is_ok());
        assert!(check_inline_string("<t>x</t>").is_err());
        assert!(check_inline_string("<is/><is/>").is_err());
    }
}
