use std::collections::{BTreeMap, HashMap};
use std::io::Cursor;

use calamine::{DataType, Range, Reader as CalamineReader, Xlsx};
use tracing::debug;

use super::xlsx_styles::{
    MAX_COLS, MAX_ROWS, MergedRegion, StyleSheet, cell_ref, parse_cell_ref, parse_merge_cells_xml,
    parse_range_ref, parse_relationships, parse_styles_xml, parse_workbook_sheets,
};
use super::{ApplyOutcome, IndexParts};
use crate::constants::{
    ANSWER_TARGET_MARKER, XLSX_STYLES_PART, XLSX_WORKBOOK_PART, XLSX_WORKBOOK_RELS_PART,
};
use crate::formatting::{set_text_preserving, text_element};
use crate::package::{PackageReader, repackage};
use crate::placeholder::PlaceholderMatcher;
use crate::types::{FormattingProperties, InsertionMode};
use crate::xml::{XmlDocument, XmlElement, XmlNode};
use crate::{DocfillError, Result};

/// Worksheet children that precede `sheetData` (CT_Worksheet order).
const BEFORE_SHEET_DATA: &[&str] = &["sheetPr", "dimension", "sheetViews", "sheetFormatPr", "cols"];

pub(crate) struct SpreadsheetDocument {
    sheets: Vec<Sheet>,
    styles: StyleSheet,
}

struct Sheet {
    name: String,
    part: String,
    values: Option<Range<DataType>>,
    xml: XmlDocument,
    merged: Vec<MergedRegion>,
    dirty: bool,
    /// Text of cells written since parsing, keyed by 0-based (row, col).
    written: HashMap<(u32, u32), String>,
}

/// A parsed `S{sheet}-R{row}-C{col}` locator: 1-based sheet, 0-based cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CellLocator {
    sheet: usize,
    row: u32,
    col: u32,
}

fn parse_cell_locator(locator: &str) -> Result<CellLocator> {
    let invalid = |reason: &str| DocfillError::InvalidLocator {
        locator: locator.to_string(),
        reason: reason.to_string(),
    };
    let number = |part: &str, prefix: char| {
        part.strip_prefix(prefix)
            .filter(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
            .and_then(|digits| digits.parse::<u32>().ok())
            .filter(|n| *n > 0)
    };

    let mut parts = locator.trim().split('-');
    let (Some(s), Some(r), Some(c), None) = (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(invalid("expected S{sheet}-R{row}-C{col}"));
    };
    let (Some(sheet), Some(row), Some(col)) = (number(s, 'S'), number(r, 'R'), number(c, 'C')) else {
        return Err(invalid("expected S{sheet}-R{row}-C{col} with positive numbers"));
    };
    if row > MAX_ROWS || col > MAX_COLS {
        return Err(invalid("cell lies outside the worksheet grid"));
    }
    Ok(CellLocator {
        sheet: sheet as usize,
        row: row - 1,
        col: col - 1,
    })
}

/// Whether `identifier` has the `S{sheet}-R{row}-C{col}` shape of a cell.
pub(crate) fn is_cell_locator(identifier: &str) -> bool {
    parse_cell_locator(identifier).is_ok()
}

fn render_value(value: &DataType) -> String {
    match value {
        DataType::String(s) | DataType::DateTimeIso(s) | DataType::DurationIso(s) => s.clone(),
        DataType::Float(v) | DataType::DateTime(v) | DataType::Duration(v) => format!("{v}"),
        DataType::Int(v) => v.to_string(),
        DataType::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
        DataType::Error(e) => e.to_string(),
        DataType::Empty => String::new(),
    }
}

fn is_local(element: &XmlElement, local: &str) -> bool {
    element.local_name() == local
}

/// Name for a new element, reusing the prefix of `sibling`.
fn same_prefix(sibling: &XmlElement, local: &str) -> String {
    match sibling.name.split_once(':') {
        Some((prefix, _)) => format!("{prefix}:{local}"),
        None => local.to_string(),
    }
}

fn read_text(package: &mut PackageReader<'_>, part: &str) -> Result<Option<String>> {
    Ok(package
        .read_optional(part)?
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned()))
}

impl Sheet {
    fn sheet_data(&self) -> Option<&XmlElement> {
        self.xml.root.child_elements().find(|el| is_local(el, "sheetData"))
    }

    /// Cells present in the worksheet XML with their style index.
    fn xml_cells(&self) -> HashMap<(u32, u32), u32> {
        let mut cells = HashMap::new();
        let Some(data) = self.sheet_data() else {
            return cells;
        };
        for row in data.child_elements().filter(|el| is_local(el, "row")) {
            for cell in row.child_elements().filter(|el| is_local(el, "c")) {
                let Some(pos) = cell.attr("r").and_then(parse_cell_ref) else {
                    continue;
                };
                let style = cell.attr("s").and_then(|s| s.parse().ok()).unwrap_or(0);
                cells.insert(pos, style);
            }
        }
        cells
    }

    fn cell_style(&self, row: u32, col: u32) -> u32 {
        self.xml_cells().get(&(row, col)).copied().unwrap_or(0)
    }

    /// Number of rows and columns in use, counting from A1.
    fn extent(&self, xml_cells: &HashMap<(u32, u32), u32>) -> (u32, u32) {
        let mut rows = 0;
        let mut cols = 0;
        if let Some((end_row, end_col)) = self.values.as_ref().and_then(Range::end) {
            rows = end_row + 1;
            cols = end_col + 1;
        }
        for &(row, col) in xml_cells.keys().chain(self.written.keys()) {
            rows = rows.max(row + 1);
            cols = cols.max(col + 1);
        }
        (rows, cols)
    }

    fn cell_text(&self, row: u32, col: u32) -> String {
        if let Some(text) = self.written.get(&(row, col)) {
            return text.clone();
        }
        self.values
            .as_ref()
            .and_then(|range| range.get_value((row, col)))
            .map(render_value)
            .unwrap_or_default()
    }

    /// Replace the cell at (row, col) by an inline string, creating the row
    /// and cell in sorted order when absent. The style index is kept.
    fn set_inline(&mut self, row: u32, col: u32, inline: XmlElement) {
        let root = &mut self.xml.root;
        let data_idx = match root
            .children
            .iter()
            .position(|node| matches!(node, XmlNode::Element(el) if is_local(el, "sheetData")))
        {
            Some(idx) => idx,
            None => {
                let insert_at = root
                    .children
                    .iter()
                    .rposition(|node| {
                        matches!(node, XmlNode::Element(el) if BEFORE_SHEET_DATA.contains(&el.local_name()))
                    })
                    .map_or(0, |idx| idx + 1);
                let name = same_prefix(root, "sheetData");
                root.children
                    .insert(insert_at, XmlNode::Element(XmlElement::new(name)));
                insert_at
            }
        };
        let reference = cell_ref(row, col);
        expand_dimension(root, row, col);

        let Some(XmlNode::Element(data)) = root.children.get_mut(data_idx) else {
            return;
        };
        let row_name = same_prefix(data, "row");
        let row_number = row + 1;
        let Some(row_el) = find_or_insert(
            data,
            &row_name,
            |el| el.attr("r").and_then(|r| r.parse::<u32>().ok()).map(|r| r.cmp(&row_number)),
            || XmlElement::new(row_name.clone()).with_attr("r", row_number.to_string()),
        ) else {
            return;
        };
        row_el.remove_attr("spans");

        let cell_name = same_prefix(row_el, "c");
        let Some(cell) = find_or_insert(
            row_el,
            &cell_name,
            |el| el.attr("r").and_then(parse_cell_ref).map(|(_, c)| c.cmp(&col)),
            || XmlElement::new(cell_name.clone()).with_attr("r", reference),
        ) else {
            return;
        };

        cell.set_attr("t", "inlineStr");
        cell.children.clear();
        cell.push(inline);
    }
}

/// Find the child named `name` whose ordering key is `Equal`, or insert a new
/// one before the first child that sorts after it.
fn find_or_insert<'a>(
    parent: &'a mut XmlElement,
    name: &str,
    order: impl Fn(&XmlElement) -> Option<std::cmp::Ordering>,
    create: impl FnOnce() -> XmlElement,
) -> Option<&'a mut XmlElement> {
    let mut insert_at = parent.children.len();
    let mut found = None;
    for (idx, node) in parent.children.iter().enumerate() {
        let XmlNode::Element(el) = node else {
            continue;
        };
        if el.name != name {
            continue;
        }
        match order(el) {
            Some(std::cmp::Ordering::Equal) => {
                found = Some(idx);
                break;
            }
            Some(std::cmp::Ordering::Greater) => {
                insert_at = idx;
                break;
            }
            _ => {}
        }
    }
    let idx = found.unwrap_or_else(|| {
        parent.children.insert(insert_at, XmlNode::Element(create()));
        insert_at
    });
    match parent.children.get_mut(idx) {
        Some(XmlNode::Element(el)) => Some(el),
        _ => None,
    }
}

/// Grow `<dimension ref>` so it covers (row, col).
fn expand_dimension(root: &mut XmlElement, row: u32, col: u32) {
    let Some(dimension) = root.child_elements_mut().find(|el| is_local(el, "dimension")) else {
        return;
    };
    let ((top, left), (bottom, right)) = dimension
        .attr("ref")
        .and_then(parse_range_ref)
        .unwrap_or(((row, col), (row, col)));
    let region = MergedRegion {
        top_row: top.min(row),
        left_col: left.min(col),
        bottom_row: bottom.max(row),
        right_col: right.max(col),
    };
    let reference = if region.spans_multiple_cells() {
        region.range_ref()
    } else {
        cell_ref(region.top_row, region.left_col)
    };
    dimension.set_attr("ref", reference);
}

/// Concatenated text of an `<is>` element.
fn inline_text(inline: &XmlElement) -> String {
    let mut out = String::new();
    for child in inline.child_elements() {
        if is_local(child, "t") {
            out.push_str(&child.text());
        } else if is_local(child, "r") {
            for t in child.child_elements().filter(|el| is_local(el, "t")) {
                out.push_str(&t.text());
            }
        }
    }
    out
}

fn plain_run(text: &str) -> XmlElement {
    XmlElement::new("r").with_child(text_element("t", text))
}

/// Surround the content of `inline` by unformatted `prefix` and `suffix` text.
fn compose_inline(prefix: &str, mut inline: XmlElement, suffix: &str) -> XmlElement {
    if prefix.is_empty() && suffix.is_empty() {
        return inline;
    }
    let has_runs = inline.child_elements().any(|el| is_local(el, "r"));
    if !has_runs {
        let current = inline_text(&inline);
        let combined = format!("{prefix}{current}{suffix}");
        let text_node = inline.child_elements_mut().find(|el| is_local(el, "t"));
        if let Some(t) = text_node {
            set_text_preserving(t, &combined);
        } else {
            inline.push(text_element("t", &combined));
        }
        return inline;
    }
    let mut composed = XmlElement::new(inline.name.clone());
    composed.attributes = std::mem::take(&mut inline.attributes);
    if !prefix.is_empty() {
        composed.push(plain_run(prefix));
    }
    for child in inline.children {
        if let XmlNode::Element(el) = child {
            if is_local(&el, "r") || is_local(&el, "t") {
                composed.push(el);
            }
        }
    }
    if !suffix.is_empty() {
        composed.push(plain_run(suffix));
    }
    composed
}

impl SpreadsheetDocument {
    pub(crate) fn parse(bytes: &[u8]) -> Result<Self> {
        let mut package = PackageReader::open(bytes)?;
        let workbook_xml = read_text(&mut package, XLSX_WORKBOOK_PART)?
            .ok_or_else(|| DocfillError::malformed(format!("package has no part '{XLSX_WORKBOOK_PART}'")))?;
        let entries = parse_workbook_sheets(&workbook_xml);
        let rels = read_text(&mut package, XLSX_WORKBOOK_RELS_PART)?
            .map(|xml| parse_relationships(&xml))
            .unwrap_or_default();
        let styles = read_text(&mut package, XLSX_STYLES_PART)?
            .map(|xml| parse_styles_xml(&xml))
            .unwrap_or_default();

        let mut workbook = Xlsx::new(Cursor::new(bytes))
            .map_err(|err| DocfillError::malformed(format!("failed to read xlsx workbook: {err}")))?;

        let mut sheets = Vec::with_capacity(entries.len());
        for (idx, entry) in entries.into_iter().enumerate() {
            let part = rels
                .get(&entry.rel_id)
                .cloned()
                .unwrap_or_else(|| format!("xl/worksheets/sheet{}.xml", idx + 1));
            let raw = package.read(&part)?;
            let xml = XmlDocument::parse(&raw)
                .map_err(|err| DocfillError::malformed(format!("{part}: {err}")))?;
            let merged = parse_merge_cells_xml(&String::from_utf8_lossy(&raw));
            let values = match workbook.worksheet_range(&entry.name) {
                Some(Ok(range)) => Some(range),
                Some(Err(err)) => {
                    return Err(DocfillError::malformed(format!(
                        "sheet '{}': {err}",
                        entry.name
                    )));
                }
                None => None,
            };
            sheets.push(Sheet {
                name: entry.name,
                part,
                values,
                xml,
                merged,
                dirty: false,
                written: HashMap::new(),
            });
        }

        Ok(Self { sheets, styles })
    }

    pub(crate) fn index(&self) -> IndexParts {
        let mut parts = IndexParts::default();
        for (sheet_idx, sheet) in self.sheets.iter().enumerate() {
            let sheet_no = sheet_idx + 1;
            parts
                .lines
                .push(format!("=== Sheet {sheet_no}: \"{}\" ===", sheet.name));

            let xml_cells = sheet.xml_cells();
            let merged_tops: HashMap<(u32, u32), String> = sheet
                .merged
                .iter()
                .filter(|region| region.spans_multiple_cells())
                .map(|region| ((region.top_row, region.left_col), region.range_ref()))
                .collect();
            let (rows, cols) = sheet.extent(&xml_cells);

            for row in 0..rows {
                for col in 0..cols {
                    let id = format!("S{sheet_no}-R{}-C{}", row + 1, col + 1);
                    let text = sheet.cell_text(row, col);
                    let style = xml_cells.get(&(row, col)).copied().unwrap_or(0);

                    let mut hints: Vec<String> = Vec::new();
                    if text.trim().is_empty() {
                        hints.push("empty".into());
                    }
                    if let Some(font) = self.styles.font_for_xf(style) {
                        if font.bold {
                            hints.push("bold".into());
                        }
                        if font.italic {
                            hints.push("italic".into());
                        }
                    }
                    if self.styles.is_shaded(style) {
                        hints.push("shaded".into());
                    }
                    if let Some(range) = merged_tops.get(&(row, col)) {
                        hints.push(format!("merged: {range}"));
                    }

                    let hint_str = if hints.is_empty() {
                        String::new()
                    } else {
                        format!(" [{}]", hints.join(", "))
                    };
                    let marker = if text.trim().is_empty() {
                        ANSWER_TARGET_MARKER
                    } else {
                        ""
                    };
                    parts.lines.push(format!("{id}: \"{text}\"{hint_str}{marker}"));
                    parts.id_to_locator.insert(id.clone(), id);
                }
            }
            debug!(
                target: "docfill::xlsx",
                sheet = %sheet.name,
                rows,
                cols,
                "indexed worksheet"
            );
        }
        parts
    }

    fn sheet(&self, cell: CellLocator) -> Option<&Sheet> {
        self.sheets.get(cell.sheet - 1)
    }

    pub(crate) fn contains(&self, locator: &str) -> Result<bool> {
        let cell = parse_cell_locator(locator)?;
        Ok(self.sheet(cell).is_some())
    }

    pub(crate) fn text_at(&self, locator: &str) -> Result<Option<String>> {
        let cell = parse_cell_locator(locator)?;
        Ok(self
            .sheet(cell)
            .map(|sheet| sheet.cell_text(cell.row, cell.col)))
    }

    pub(crate) fn formatting_at(&self, locator: &str) -> Result<Option<FormattingProperties>> {
        let cell = parse_cell_locator(locator)?;
        Ok(self.sheet(cell).map(|sheet| {
            self.styles
                .formatting_for_xf(sheet.cell_style(cell.row, cell.col))
        }))
    }

    pub(crate) fn apply(
        &mut self,
        locator: &str,
        markup: &str,
        mode: InsertionMode,
        matcher: PlaceholderMatcher<'_>,
    ) -> Result<ApplyOutcome> {
        let cell = parse_cell_locator(locator)?;
        let Some(sheet) = self.sheets.get_mut(cell.sheet - 1) else {
            return Ok(ApplyOutcome::TargetMissing);
        };
        let inline = XmlElement::parse_fragment(markup)?
            .into_iter()
            .find(|el| is_local(el, "is"))
            .ok_or_else(|| DocfillError::Xml {
                reason: "inline string fragment has no <is> element".into(),
            })?;

        let current = sheet.cell_text(cell.row, cell.col);
        let inline = match mode {
            InsertionMode::ReplaceContent => inline,
            InsertionMode::Append => compose_inline(&current, inline, ""),
            InsertionMode::ReplacePlaceholder => {
                let Some(found) = matcher.find(&current) else {
                    return Ok(ApplyOutcome::PlaceholderMissing);
                };
                compose_inline(&current[..found.start], inline, &current[found.end..])
            }
        };

        let text = inline_text(&inline);
        sheet.set_inline(cell.row, cell.col, inline);
        sheet.written.insert((cell.row, cell.col), text);
        sheet.dirty = true;
        Ok(ApplyOutcome::Applied)
    }

    pub(crate) fn to_bytes(&self, source: &[u8]) -> Result<Vec<u8>> {
        let replacements: BTreeMap<String, Vec<u8>> = self
            .sheets
            .iter()
            .filter(|sheet| sheet.dirty)
            .map(|sheet| (sheet.part.clone(), sheet.xml.to_bytes()))
            .collect();
        repackage(source, &replacements)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use zip::ZipWriter;
    use zip::write::SimpleFileOptions;

    use super::*;
    use crate::placeholder::PlaceholderPatterns;

    const WORKBOOK: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="Intake" sheetId="1" r:id="rId1"/></sheets></workbook>"#;
    const RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/></Relationships>"#;
    const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><fonts count="2"><font><sz val="11"/><name val="Calibri"/></font><font><b/><sz val="12"/><name val="Arial"/></font></fonts><fills count="2"><fill><patternFill patternType="none"/></fill><fill><patternFill patternType="gray125"/></fill></fills><cellXfs count="2"><xf numFmtId="0" fontId="0" fillId="0"/><xf numFmtId="0" fontId="1" fillId="0"/></cellXfs></styleSheet>"#;
    const SHARED: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="2" uniqueCount="2"><si><t>Name</t></si><si><t>Fill ____ here</t></si></sst>"#;
    const SHEET: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><dimension ref="A1:B2"/><sheetData><row r="1" spans="1:2"><c r="A1" s="1" t="s"><v>0</v></c><c r="B1" s="1"/></row><row r="2"><c r="A2" t="s"><v>1</v></c></row></sheetData><mergeCells count="1"><mergeCell ref="A2:B2"/></mergeCells></worksheet>"#;

    fn workbook_bytes() -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();
        for (name, body) in [
            ("xl/workbook.xml", WORKBOOK),
            ("xl/_rels/workbook.xml.rels", RELS),
            ("xl/styles.xml", STYLES),
            ("xl/sharedStrings.xml", SHARED),
            ("xl/worksheets/sheet1.xml", SHEET),
        ] {
            writer.start_file(name, options).unwrap();
            writer.write_all(body.as_bytes()).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn locators_are_parsed_strictly() {
        assert_eq!(
            parse_cell_locator("S1-R2-C3").unwrap(),
            CellLocator { sheet: 1, row: 1, col: 2 }
        );
        for bad in ["S1-R2", "S0-R1-C1", "S1-R1-C1-X", "./w:p", "S1-Rx-C1", "S1-R1-C99999"] {
            assert!(
                matches!(parse_cell_locator(bad), Err(DocfillError::InvalidLocator { .. })),
                "{bad}"
            );
        }
        assert!(is_cell_locator(" S2-R10-C4 "));
        assert!(!is_cell_locator("T1-R1-C1"));
        assert!(!is_cell_locator("P3"));
    }

    #[test]
    fn index_renders_hints_and_merges() {
        let doc = SpreadsheetDocument::parse(&workbook_bytes()).unwrap();
        let parts = doc.index();
        assert_eq!(parts.lines[0], "=== Sheet 1: \"Intake\" ===");
        assert_eq!(parts.lines[1], "S1-R1-C1: \"Name\" [bold]");
        assert_eq!(
            parts.lines[2],
            format!("S1-R1-C2: \"\" [empty, bold]{ANSWER_TARGET_MARKER}")
        );
        assert_eq!(parts.lines[3], "S1-R2-C1: \"Fill ____ here\" [merged: A2:B2]");
        assert_eq!(parts.id_to_locator.get("S1-R2-C2").map(String::as_str), Some("S1-R2-C2"));
    }

    #[test]
    fn writes_keep_style_and_extend_dimension() {
        let source = workbook_bytes();
        let mut doc = SpreadsheetDocument::parse(&source).unwrap();
        let patterns = PlaceholderPatterns::default();
        let matcher = PlaceholderMatcher::Patterns(&patterns);

        let applied = doc
            .apply("S1-R1-C2", "<is><t>Ada</t></is>", InsertionMode::ReplaceContent, matcher)
            .unwrap();
        assert_eq!(applied, ApplyOutcome::Applied);
        doc.apply("S1-R2-C1", "<is><t>Lovelace</t></is>", InsertionMode::ReplacePlaceholder, matcher)
            .unwrap();
        doc.apply("S1-R4-C3", "<is><t>late</t></is>", InsertionMode::Append, matcher)
            .unwrap();
        assert_eq!(doc.text_at("S1-R2-C1").unwrap().as_deref(), Some("Fill Lovelace here"));

        let out = doc.to_bytes(&source).unwrap();
        let reread = SpreadsheetDocument::parse(&out).unwrap();
        assert_eq!(reread.text_at("S1-R1-C2").unwrap().as_deref(), Some("Ada"));
        assert_eq!(reread.text_at("S1-R4-C3").unwrap().as_deref(), Some("late"));
        assert!(reread.formatting_at("S1-R1-C2").unwrap().unwrap().bold);

        let sheet_xml = reread.sheets[0].xml.root.to_xml_string();
        assert!(sheet_xml.contains(r#"<dimension ref="A1:C4"/>"#));
        assert!(sheet_xml.contains(r#"<c r="B1" s="1" t="inlineStr"><is><t>Ada</t></is></c>"#));
        assert!(!sheet_xml.contains("spans="));
    }

    #[test]
    fn missing_sheet_is_reported_as_missing_target() {
        let mut doc = SpreadsheetDocument::parse(&workbook_bytes()).unwrap();
        assert!(!doc.contains("S2-R1-C1").unwrap());
        let patterns = PlaceholderPatterns::default();
        let outcome = doc
            .apply(
                "S2-R1-C1",
                "<is><t>x</t></is>",
                InsertionMode::ReplaceContent,
                PlaceholderMatcher::Patterns(&patterns),
            )
            .unwrap();
        assert_eq!(outcome, ApplyOutcome::TargetMissing);
    }

    #[test]
    fn placeholder_in_cell_without_marker_is_reported() {
        let mut doc = SpreadsheetDocument::parse(&workbook_bytes()).unwrap();
        let outcome = doc
            .apply(
                "S1-R1-C1",
                "<is><t>x</t></is>",
                InsertionMode::ReplacePlaceholder,
                PlaceholderMatcher::Literal("{{name}}"),
            )
            .unwrap();
        assert_eq!(outcome, ApplyOutcome::PlaceholderMissing);
    }

    #[test]
    fn rich_inline_strings_get_plain_surrounding_runs() {
        let inline = XmlElement::parse_fragment("<is><r><rPr><b/></rPr><t>X</t></r></is>")
            .unwrap()
            .remove(0);
        let composed = compose_inline("a ", inline, "");
        assert_eq!(
            composed.to_xml_string(),
            r#"<is><r><t xml:space="preserve">a </t></r><r><rPr><b/></rPr><t>X</t></r></is>"#
        );
        assert_eq!(inline_text(&composed), "a X");
    }
}
