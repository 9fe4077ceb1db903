//! SpreadsheetML metadata that calamine does not expose.
//!
//! - Cell formats (`cellXfs`) with their fonts and fills, for formatting
//!   inheritance and the `bold`/`italic`/`shaded` hints
//! - Merged cell regions
//! - Sheet order and worksheet part paths from the workbook and its rels
//!
//! Parsed with streaming `quick-xml` events; nothing here mutates parts.
#![allow(clippy::cast_possible_truncation)]

use std::collections::HashMap;

use quick_xml::Reader as XmlReader;
use quick_xml::events::{BytesStart, Event};
use serde::{Deserialize, Serialize};

use crate::types::FormattingProperties;

/// Fill colours that do not count as shading.
const UNSHADED_RGB: &[&str] = &["00000000", "0", "FFFFFFFF", "00FFFFFF"];

/// Largest row and column numbers a worksheet can hold (1-based).
pub(crate) const MAX_ROWS: u32 = 1_048_576;
pub(crate) const MAX_COLS: u32 = 16_384;

/// A merged cell region, 0-based and inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergedRegion {
    pub top_row: u32,
    pub left_col: u32,
    pub bottom_row: u32,
    pub right_col: u32,
}

impl MergedRegion {
    #[must_use]
    pub fn spans_multiple_cells(&self) -> bool {
        self.top_row != self.bottom_row || self.left_col != self.right_col
    }

    /// `A1:B2` form.
    #[must_use]
    pub fn range_ref(&self) -> String {
        format!(
            "{}:{}",
            cell_ref(self.top_row, self.left_col),
            cell_ref(self.bottom_row, self.right_col)
        )
    }
}

/// Font attributes of one `<font>` entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FontStyle {
    pub name: Option<String>,
    pub size: Option<String>,
    pub bold: bool,
    pub italic: bool,
    pub underline: Option<String>,
    pub color: Option<String>,
}

impl FontStyle {
    #[must_use]
    pub fn to_formatting(&self) -> FormattingProperties {
        FormattingProperties {
            font_ascii: self.name.clone(),
            size: self.size.clone(),
            bold: self.bold,
            italic: self.italic,
            underline: self.underline.clone(),
            color: self.color.clone(),
            ..FormattingProperties::default()
        }
    }
}

/// One `cellXfs/xf` entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CellFormat {
    pub font_id: u32,
    pub fill_id: u32,
}

/// The parts of `xl/styles.xml` used for formatting and hints.
#[derive(Debug, Clone, Default)]
pub struct StyleSheet {
    pub fonts: Vec<FontStyle>,
    /// Whether each fill entry shades the cell.
    pub shaded_fills: Vec<bool>,
    pub cell_formats: Vec<CellFormat>,
}

impl StyleSheet {
    /// Font of the cell format at `xf_index` (the `s` attribute on `<c>`).
    #[must_use]
    pub fn font_for_xf(&self, xf_index: u32) -> Option<&FontStyle> {
        let xf = self.cell_formats.get(xf_index as usize)?;
        self.fonts.get(xf.font_id as usize)
    }

    #[must_use]
    pub fn is_shaded(&self, xf_index: u32) -> bool {
        self.cell_formats
            .get(xf_index as usize)
            .and_then(|xf| self.shaded_fills.get(xf.fill_id as usize))
            .copied()
            .unwrap_or(false)
    }

    #[must_use]
    pub fn formatting_for_xf(&self, xf_index: u32) -> FormattingProperties {
        self.font_for_xf(xf_index)
            .map(FontStyle::to_formatting)
            .unwrap_or_default()
    }
}

/// A `<sheet>` entry of the workbook, in tab order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetEntry {
    pub name: String,
    pub rel_id: String,
}

/// Parse a cell reference like "A1" or "AZ100" into (row, col) 0-based.
#[must_use]
pub fn parse_cell_ref(cell_ref: &str) -> Option<(u32, u32)> {
    let mut col_str = String::new();
    let mut row_str = String::new();

    for ch in cell_ref.chars() {
        if ch == '$' {
            continue;
        }
        if ch.is_ascii_alphabetic() && row_str.is_empty() {
            col_str.push(ch.to_ascii_uppercase());
        } else if ch.is_ascii_digit() {
            row_str.push(ch);
        } else {
            return None;
        }
    }

    if col_str.is_empty() || row_str.is_empty() {
        return None;
    }

    let col = col_str
        .chars()
        .fold(0u32, |acc, c| {
            acc.saturating_mul(26)
                .saturating_add(c as u32 - u32::from(b'A') + 1)
        })
        .checked_sub(1)?;
    let row = row_str.parse::<u32>().ok()?.checked_sub(1)?;

    Some((row, col))
}

/// Parse a range reference like "A1:D10" into ((top_row, left_col), (bottom_row, right_col)).
#[must_use]
pub fn parse_range_ref(range_ref: &str) -> Option<((u32, u32), (u32, u32))> {
    match range_ref.split_once(':') {
        Some((start, end)) => Some((parse_cell_ref(start)?, parse_cell_ref(end)?)),
        None => {
            let single = parse_cell_ref(range_ref)?;
            Some((single, single))
        }
    }
}

/// Column letters for a 0-based column index (0 → "A", 27 → "AB").
#[must_use]
pub fn column_letters(col: u32) -> String {
    let mut n = col + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(char::from(b'A' + rem as u8));
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}

/// `A1`-style reference for 0-based coordinates.
#[must_use]
pub fn cell_ref(row: u32, col: u32) -> String {
    format!("{}{}", column_letters(col), row + 1)
}

fn attr_value(start: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    start
        .attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == key)
        .and_then(|attr| attr.unescape_value().ok().map(|v| v.into_owned()))
}

fn toggle_on(start: &BytesStart<'_>) -> bool {
    !matches!(
        attr_value(start, b"val").as_deref(),
        Some("0" | "false" | "off")
    )
}

/// Parse `xl/styles.xml` into fonts, fills and cell formats.
pub fn parse_styles_xml(xml: &str) -> StyleSheet {
    let mut reader = XmlReader::from_str(xml);
    reader.trim_text(true);
    let mut buf = Vec::new();
    let mut styles = StyleSheet::default();

    let mut in_fonts = false;
    let mut in_fills = false;
    let mut in_cell_xfs = false;
    let mut current_font: Option<FontStyle> = None;
    let mut current_fill: Option<bool> = None;
    let mut pattern_none = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.name().as_ref() {
                b"fonts" => in_fonts = true,
                b"fills" => in_fills = true,
                b"cellXfs" => in_cell_xfs = true,
                b"font" if in_fonts => current_font = Some(FontStyle::default()),
                b"fill" if in_fills => {
                    current_fill = Some(false);
                    pattern_none = false;
                }
                b"patternFill" if current_fill.is_some() => {
                    pattern_none = matches!(
                        attr_value(e, b"patternType").as_deref(),
                        None | Some("none")
                    );
                }
                b"xf" if in_cell_xfs => styles.cell_formats.push(cell_format(e)),
                _ => {}
            },
            Ok(Event::Empty(ref e)) => match e.name().as_ref() {
                b"font" if in_fonts => styles.fonts.push(FontStyle::default()),
                b"fill" if in_fills => styles.shaded_fills.push(false),
                b"patternFill" if current_fill.is_some() => {
                    pattern_none = matches!(
                        attr_value(e, b"patternType").as_deref(),
                        None | Some("none")
                    );
                }
                b"fgColor" if current_fill.is_some() && !pattern_none => {
                    current_fill = Some(fill_color_shades(e));
                }
                b"xf" if in_cell_xfs => styles.cell_formats.push(cell_format(e)),
                name => {
                    if let Some(font) = current_font.as_mut() {
                        apply_font_property(font, name, e);
                    }
                }
            },
            Ok(Event::End(ref e)) => match e.name().as_ref() {
                b"fonts" => in_fonts = false,
                b"fills" => in_fills = false,
                b"cellXfs" => in_cell_xfs = false,
                b"font" => {
                    if let Some(font) = current_font.take() {
                        styles.fonts.push(font);
                    }
                }
                b"fill" => {
                    if let Some(shaded) = current_fill.take() {
                        styles.shaded_fills.push(shaded);
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) | Err(_) => break,
            _ => {}
        }
        buf.clear();
    }

    styles
}

fn cell_format(start: &BytesStart<'_>) -> CellFormat {
    let parse = |key: &[u8]| {
        attr_value(start, key)
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(0)
    };
    CellFormat {
        font_id: parse(b"fontId"),
        fill_id: parse(b"fillId"),
    }
}

fn fill_color_shades(start: &BytesStart<'_>) -> bool {
    if let Some(rgb) = attr_value(start, b"rgb") {
        return !UNSHADED_RGB.iter().any(|c| c.eq_ignore_ascii_case(&rgb));
    }
    // Indexed 64 is the system foreground, used by default fills.
    match attr_value(start, b"indexed").as_deref() {
        Some("64") => false,
        Some(_) => true,
        None => attr_value(start, b"theme").is_some(),
    }
}

fn apply_font_property(font: &mut FontStyle, name: &[u8], start: &BytesStart<'_>) {
    match name {
        b"b" => font.bold = toggle_on(start),
        b"i" => font.italic = toggle_on(start),
        b"u" => {
            let val = attr_value(start, b"val").unwrap_or_else(|| "single".to_string());
            font.underline = (val != "none").then_some(val);
        }
        b"sz" => font.size = attr_value(start, b"val"),
        b"name" => font.name = attr_value(start, b"val"),
        b"color" => font.color = attr_value(start, b"rgb"),
        _ => {}
    }
}

/// Parse a worksheet XML for `<mergeCells>` regions.
pub fn parse_merge_cells_xml(xml: &str) -> Vec<MergedRegion> {
    let mut reader = XmlReader::from_str(xml);
    reader.trim_text(true);
    let mut buf = Vec::new();
    let mut regions = Vec::new();
    let mut in_merge_cells = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) if e.name().as_ref() == b"mergeCells" => {
                in_merge_cells = true;
            }
            Ok(Event::Start(ref e) | Event::Empty(ref e))
                if in_merge_cells && e.name().as_ref() == b"mergeCell" =>
            {
                if let Some(((tr, lc), (br, rc))) =
                    attr_value(e, b"ref").as_deref().and_then(parse_range_ref)
                {
                    regions.push(MergedRegion {
                        top_row: tr,
                        left_col: lc,
                        bottom_row: br,
                        right_col: rc,
                    });
                }
            }
            Ok(Event::End(ref e)) if e.name().as_ref() == b"mergeCells" => {
                in_merge_cells = false;
            }
            Ok(Event::Eof) | Err(_) => break,
            _ => {}
        }
        buf.clear();
    }

    regions
}

/// Parse workbook.xml to extract sheet entries in tab order.
pub fn parse_workbook_sheets(xml: &str) -> Vec<SheetEntry> {
    let mut reader = XmlReader::from_str(xml);
    reader.trim_text(true);
    let mut sheets = Vec::new();
    let mut buf = Vec::new();
    let mut in_sheets = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) if e.name().as_ref() == b"sheets" => {
                in_sheets = true;
            }
            Ok(Event::Start(ref e) | Event::Empty(ref e))
                if in_sheets && e.name().as_ref() == b"sheet" =>
            {
                let name = attr_value(e, b"name");
                let rel_id = attr_value(e, b"r:id");
                if let (Some(name), Some(rel_id)) = (name, rel_id) {
                    sheets.push(SheetEntry { name, rel_id });
                }
            }
            Ok(Event::End(ref e)) if e.name().as_ref() == b"sheets" => {
                in_sheets = false;
            }
            Ok(Event::Eof) | Err(_) => break,
            _ => {}
        }
        buf.clear();
    }

    sheets
}

/// Parse a relationships part into `Id → part path` (resolved against `xl/`).
pub fn parse_relationships(xml: &str) -> HashMap<String, String> {
    let mut reader = XmlReader::from_str(xml);
    reader.trim_text(true);
    let mut rels = HashMap::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e) | Event::Empty(ref e))
                if e.name().as_ref() == b"Relationship" =>
            {
                if let (Some(id), Some(target)) = (attr_value(e, b"Id"), attr_value(e, b"Target"))
                {
                    rels.insert(id, resolve_target(&target));
                }
            }
            Ok(Event::Eof) | Err(_) => break,
            _ => {}
        }
        buf.clear();
    }

    rels
}

fn resolve_target(target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }
    let mut parts: Vec<&str> = vec!["xl"];
    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            other => parts.push(other),
        }
    }
    parts.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    const STYLES: &str = r#"<styleSheet>
        <fonts count="2">
          <font><sz val="11"/><name val="Calibri"/></font>
          <font><b/><i val="0"/><u/><sz val="14"/><color rgb="FFFF0000"/><name val="Arial"/></font>
        </fonts>
        <fills count="3">
          <fill><patternFill patternType="none"/></fill>
          <fill><patternFill patternType="gray125"/></fill>
          <fill><patternFill patternType="solid"><fgColor rgb="FFFFFF00"/><bgColor indexed="64"/></patternFill></fill>
        </fills>
        <cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0"/></cellStyleXfs>
        <cellXfs count="2">
          <xf numFmtId="0" fontId="0" fillId="0" xfId="0"/>
          <xf numFmtId="0" fontId="1" fillId="2" xfId="0" applyFont="1"/>
        </cellXfs>
      </styleSheet>"#;

    #[test]
    fn cell_formats_resolve_to_fonts_and_fills() {
        let styles = parse_styles_xml(STYLES);
        assert_eq!(styles.fonts.len(), 2);
        assert_eq!(styles.cell_formats.len(), 2);
        let font = styles.font_for_xf(1).unwrap();
        assert!(font.bold);
        assert!(!font.italic);
        assert_eq!(font.underline.as_deref(), Some("single"));
        assert_eq!(font.name.as_deref(), Some("Arial"));
        assert!(styles.is_shaded(1));
        assert!(!styles.is_shaded(0));
        assert_eq!(styles.formatting_for_xf(0).size.as_deref(), Some("11"));
    }

    #[test]
    fn cell_refs_round_trip() {
        assert_eq!(parse_cell_ref("A1"), Some((0, 0)));
        assert_eq!(parse_cell_ref("$AB$12"), Some((11, 27)));
        assert_eq!(cell_ref(11, 27), "AB12");
        assert_eq!(column_letters(25), "Z");
        assert_eq!(column_letters(26), "AA");
        assert_eq!(parse_cell_ref("12"), None);
        assert_eq!(parse_cell_ref("A0"), None);
    }

    #[test]
    fn merged_regions_render_as_ranges() {
        let regions = parse_merge_cells_xml(
            r#"<worksheet><mergeCells count="2"><mergeCell ref="A1:B2"/><mergeCell ref="C3"/></mergeCells></worksheet>"#,
        );
        assert_eq!(regions.len(), 2);
        assert_eq!(regions[0].range_ref(), "A1:B2");
        assert!(regions[0].spans_multiple_cells());
        assert!(!regions[1].spans_multiple_cells());
    }

    #[test]
    fn workbook_sheets_and_rels_resolve_part_paths() {
        let sheets = parse_workbook_sheets(
            r#"<workbook><sheets><sheet name="Data" sheetId="1" r:id="rId1"/><sheet name="Other" sheetId="2" r:id="rId2"/></sheets></workbook>"#,
        );
        assert_eq!(sheets.len(), 2);
        assert_eq!(sheets[1].name, "Other");
        let rels = parse_relationships(
            r#"<Relationships><Relationship Id="rId1" Target="worksheets/sheet1.xml"/><Relationship Id="rId2" Target="/xl/worksheets/sheet2.xml"/></Relationships>"#,
        );
        assert_eq!(rels["rId1"], "xl/worksheets/sheet1.xml");
        assert_eq!(rels["rId2"], "xl/worksheets/sheet2.xml");
    }
}
