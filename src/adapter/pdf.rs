//! AcroForm adapter.
//!
//! Every widget annotation gets an `F{n}` identifier in page, then
//! annotation, order. Identifiers map to the fully qualified field name;
//! locators may be either a field name or an `F{n}` identifier.
#![allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]

use lopdf::{Dictionary, Document, Object, ObjectId, StringFormat};
use tracing::{debug, warn};

use super::{ApplyOutcome, IndexParts};
use crate::constants::CHECKBOX_TRUTHY_VALUES;
use crate::placeholder::PlaceholderMatcher;
use crate::types::{FormattingProperties, InsertionMode};
use crate::{DocfillError, Result};

/// Guard against cyclic `/Parent` chains.
const MAX_FIELD_DEPTH: usize = 32;

const FLAG_READ_ONLY: i64 = 1;
const FLAG_RADIO: i64 = 1 << 15;
const FLAG_PUSHBUTTON: i64 = 1 << 16;
const FLAG_COMBO: i64 = 1 << 17;

const OFF_STATE: &[u8] = b"Off";
const DEFAULT_ON_STATE: &[u8] = b"Yes";

const NO_FIELDS_MESSAGE: &str =
    "No fillable form fields found. This PDF may be a flat/scanned document.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldKind {
    Text,
    Checkbox,
    Radio,
    Pushbutton,
    Dropdown,
    Listbox,
    Signature,
    Unknown,
}

impl FieldKind {
    fn classify(field_type: Option<&[u8]>, flags: i64) -> Self {
        match field_type {
            Some(b"Tx") => Self::Text,
            Some(b"Btn") if flags & FLAG_PUSHBUTTON != 0 => Self::Pushbutton,
            Some(b"Btn") if flags & FLAG_RADIO != 0 => Self::Radio,
            Some(b"Btn") => Self::Checkbox,
            Some(b"Ch") if flags & FLAG_COMBO != 0 => Self::Dropdown,
            Some(b"Ch") => Self::Listbox,
            Some(b"Sig") => Self::Signature,
            _ => Self::Unknown,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Checkbox => "checkbox",
            Self::Radio => "radio",
            Self::Pushbutton => "button",
            Self::Dropdown => "dropdown",
            Self::Listbox => "listbox",
            Self::Signature => "signature",
            Self::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone)]
struct Widget {
    page: u32,
    annot: ObjectId,
    /// The terminal field the widget belongs to.
    field: ObjectId,
    name: String,
    kind: FieldKind,
    read_only: bool,
    options: Vec<String>,
}

pub(crate) struct FormDocument {
    doc: Document,
    widgets: Vec<Widget>,
}

/// Decode a PDF text string: UTF-16BE with a BOM, else UTF-8, else Latin-1.
fn decode_text(bytes: &[u8]) -> String {
    if let Some(rest) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = rest
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => bytes.iter().map(|&b| char::from(b)).collect(),
    }
}

fn encode_text(text: &str) -> Vec<u8> {
    if text.is_ascii() {
        return text.as_bytes().to_vec();
    }
    let mut out = vec![0xFE, 0xFF];
    for unit in text.encode_utf16() {
        out.extend_from_slice(&unit.to_be_bytes());
    }
    out
}

fn object_text(object: &Object) -> Option<String> {
    match object {
        Object::String(bytes, _) | Object::Name(bytes) => Some(decode_text(bytes)),
        _ => None,
    }
}

fn resolve<'a>(doc: &'a Document, object: &'a Object) -> Option<&'a Object> {
    match object {
        Object::Reference(id) => doc.get_object(*id).ok(),
        other => Some(other),
    }
}

fn resolve_dict<'a>(doc: &'a Document, object: &'a Object) -> Option<&'a Dictionary> {
    resolve(doc, object).and_then(|obj| obj.as_dict().ok())
}

/// Look `key` up on `id` and then along its `/Parent` chain.
fn inherited<'a>(doc: &'a Document, id: ObjectId, key: &[u8]) -> Option<&'a Object> {
    let mut current = Some(id);
    for _ in 0..MAX_FIELD_DEPTH {
        let dict = doc.get_dictionary(current?).ok()?;
        if let Ok(value) = dict.get(key) {
            return resolve(doc, value);
        }
        current = dict.get(b"Parent").and_then(Object::as_reference).ok();
    }
    None
}

/// Fully qualified name: partial `/T` names joined by `.` from the root down.
fn full_name(doc: &Document, field: ObjectId) -> Option<String> {
    let mut parts = Vec::new();
    let mut current = Some(field);
    for _ in 0..MAX_FIELD_DEPTH {
        let Some(id) = current else {
            break;
        };
        let Ok(dict) = doc.get_dictionary(id) else {
            break;
        };
        if let Some(part) = dict.get(b"T").ok().and_then(object_text) {
            parts.push(part);
        }
        current = dict.get(b"Parent").and_then(Object::as_reference).ok();
    }
    if parts.is_empty() {
        return None;
    }
    parts.reverse();
    Some(parts.join("."))
}

fn choice_options(doc: &Document, object: &Object) -> Vec<String> {
    let Ok(entries) = object.as_array() else {
        return Vec::new();
    };
    entries
        .iter()
        .filter_map(|entry| match resolve(doc, entry)? {
            // [export display] pairs show their display text.
            Object::Array(pair) => pair.get(1).or_else(|| pair.first()).and_then(object_text),
            other => object_text(other),
        })
        .collect()
}

/// Appearance state names of a widget other than `Off`.
fn on_state(doc: &Document, annot: ObjectId) -> Option<Vec<u8>> {
    let dict = doc.get_dictionary(annot).ok()?;
    let appearance = resolve_dict(doc, dict.get(b"AP").ok()?)?;
    let normal = resolve_dict(doc, appearance.get(b"N").ok()?)?;
    normal
        .iter()
        .map(|(key, _)| key)
        .find(|key| key.as_slice() != OFF_STATE)
        .cloned()
}

fn collect_widgets(doc: &Document) -> Vec<Widget> {
    let mut widgets: Vec<Widget> = Vec::new();
    for (page_no, page_id) in doc.get_pages() {
        let Ok(page) = doc.get_dictionary(page_id) else {
            continue;
        };
        let Some(annots) = page
            .get(b"Annots")
            .ok()
            .and_then(|obj| resolve(doc, obj))
            .and_then(|obj| obj.as_array().ok())
        else {
            continue;
        };
        for entry in annots {
            let Ok(annot_id) = entry.as_reference() else {
                continue;
            };
            let Ok(annot) = doc.get_dictionary(annot_id) else {
                continue;
            };
            let is_widget = annot
                .get(b"Subtype")
                .and_then(Object::as_name)
                .is_ok_and(|name| name == b"Widget");
            if !is_widget {
                continue;
            }
            let field = if annot.has(b"T") {
                annot_id
            } else {
                annot
                    .get(b"Parent")
                    .and_then(Object::as_reference)
                    .unwrap_or(annot_id)
            };
            let number = widgets.len() + 1;
            let flags = inherited(doc, annot_id, b"Ff")
                .and_then(|obj| obj.as_i64().ok())
                .unwrap_or(0);
            let kind = FieldKind::classify(
                inherited(doc, annot_id, b"FT").and_then(|obj| obj.as_name().ok()),
                flags,
            );
            let options = match kind {
                FieldKind::Dropdown | FieldKind::Listbox => inherited(doc, annot_id, b"Opt")
                    .map(|opt| choice_options(doc, opt))
                    .unwrap_or_default(),
                _ => Vec::new(),
            };
            widgets.push(Widget {
                page: page_no,
                annot: annot_id,
                field,
                name: full_name(doc, field).unwrap_or_else(|| format!("unnamed_{number}")),
                kind,
                read_only: flags & FLAG_READ_ONLY != 0,
                options,
            });
        }
    }
    widgets
}

fn describe_value(kind: FieldKind, value: &str) -> String {
    if kind == FieldKind::Checkbox {
        let checked = !matches!(value, "" | "Off" | "No");
        return if checked { "checked" } else { "unchecked" }.to_string();
    }
    if value.is_empty() || value == "Off" {
        return "empty".to_string();
    }
    format!("\"{value}\"")
}

fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("{count} {noun}")
    } else {
        format!("{count} {noun}s")
    }
}

/// Font, size and colour from a `/DA` string such as `/Helv 12 Tf 0 g`.
fn parse_default_appearance(da: &str) -> FormattingProperties {
    let tokens: Vec<&str> = da.split_whitespace().collect();
    let mut props = FormattingProperties::default();
    for (idx, token) in tokens.iter().enumerate() {
        let operands = |count: usize| -> Option<Vec<f64>> {
            let start = idx.checked_sub(count)?;
            tokens[start..idx].iter().map(|t| t.parse().ok()).collect()
        };
        match *token {
            "Tf" if idx >= 2 => {
                let font = tokens[idx - 2].trim_start_matches('/');
                if !font.is_empty() {
                    props.font_ascii = Some(font.to_string());
                }
                if tokens[idx - 1].parse::<f64>().is_ok_and(|size| size > 0.0) {
                    props.size = Some(tokens[idx - 1].to_string());
                }
            }
            "g" => {
                if let Some(gray) = operands(1) {
                    props.color = Some(hex_color(&[gray[0], gray[0], gray[0]]));
                }
            }
            "rg" => {
                if let Some(rgb) = operands(3) {
                    props.color = Some(hex_color(&rgb));
                }
            }
            _ => {}
        }
    }
    props
}

fn hex_color(components: &[f64]) -> String {
    components
        .iter()
        .map(|c| format!("{:02X}", (c.clamp(0.0, 1.0) * 255.0).round() as u8))
        .collect()
}

enum AcroFormLocation {
    Indirect(ObjectId),
    Inline(ObjectId),
}

impl FormDocument {
    pub(crate) fn parse(bytes: &[u8]) -> Result<Self> {
        let doc = Document::load_mem(bytes)
            .map_err(|err| DocfillError::malformed(format!("failed to read pdf: {err}")))?;
        let widgets = collect_widgets(&doc);
        debug!(target: "docfill::pdf", widgets = widgets.len(), "collected form widgets");
        Ok(Self { doc, widgets })
    }

    fn value_of(&self, widget: &Widget) -> String {
        inherited(&self.doc, widget.annot, b"V")
            .and_then(object_text)
            .unwrap_or_default()
    }

    pub(crate) fn index(&self) -> IndexParts {
        let mut parts = IndexParts::default();
        if self.widgets.is_empty() {
            parts.lines.push(NO_FIELDS_MESSAGE.to_string());
            return parts;
        }

        let mut pages: Vec<u32> = self.widgets.iter().map(|w| w.page).collect();
        pages.dedup();
        parts.lines.push(format!(
            "=== PDF Form: {} across {} ===",
            plural(self.widgets.len(), "field"),
            plural(pages.len(), "page")
        ));

        let mut current_page = None;
        for (idx, widget) in self.widgets.iter().enumerate() {
            if current_page != Some(widget.page) {
                current_page = Some(widget.page);
                parts.lines.push(String::new());
                parts.lines.push(format!("Page {}:", widget.page));
            }
            let id = format!("F{}", idx + 1);
            let mut type_str = widget.kind.label().to_string();
            if !widget.options.is_empty() {
                type_str.push_str(", options: ");
                type_str.push_str(&widget.options.join(" | "));
            }
            let read_only = if widget.read_only { " [read-only]" } else { "" };
            parts.lines.push(format!(
                "[{id}] \"{}\" ({type_str}) \u{2014} {}{read_only}",
                widget.name,
                describe_value(widget.kind, &self.value_of(widget)),
            ));
            parts.id_to_locator.insert(id, widget.name.clone());
        }
        parts
    }

    /// The widget a locator addresses: a field name, else an `F{n}` identifier.
    fn target(&self, locator: &str) -> Option<&Widget> {
        if let Some(widget) = self.widgets.iter().find(|w| w.name == locator) {
            return Some(widget);
        }
        let number: usize = locator.strip_prefix('F')?.parse().ok()?;
        self.widgets.get(number.checked_sub(1)?)
    }

    pub(crate) fn contains(&self, locator: &str) -> bool {
        self.target(locator).is_some()
    }

    pub(crate) fn text_at(&self, locator: &str) -> Option<String> {
        self.target(locator).map(|widget| self.value_of(widget))
    }

    pub(crate) fn formatting_at(&self, locator: &str) -> Option<FormattingProperties> {
        let widget = self.target(locator)?;
        let da = inherited(&self.doc, widget.annot, b"DA")
            .and_then(object_text)
            .or_else(|| {
                self.acroform()
                    .and_then(|form| form.get(b"DA").ok())
                    .and_then(object_text)
            });
        Some(da.map(|da| parse_default_appearance(&da)).unwrap_or_default())
    }

    pub(crate) fn apply(
        &mut self,
        locator: &str,
        value: &str,
        mode: InsertionMode,
        matcher: PlaceholderMatcher<'_>,
    ) -> Result<ApplyOutcome> {
        let Some(widget) = self.target(locator).cloned() else {
            return Ok(ApplyOutcome::TargetMissing);
        };
        let current = self.value_of(&widget);
        let new_value = match mode {
            InsertionMode::ReplaceContent => value.to_string(),
            InsertionMode::Append => format!("{current}{value}"),
            InsertionMode::ReplacePlaceholder => match matcher.replace_first(&current, value) {
                Some(updated) => updated,
                None => return Ok(ApplyOutcome::PlaceholderMissing),
            },
        };
        if widget.read_only {
            warn!(target: "docfill::pdf", field = %widget.name, "writing to a read-only field");
        }

        match widget.kind {
            FieldKind::Checkbox => self.set_checkbox(&widget, &new_value)?,
            FieldKind::Radio => self.set_radio(&widget, &new_value)?,
            _ => {
                let format = if new_value.is_ascii() {
                    StringFormat::Literal
                } else {
                    StringFormat::Hexadecimal
                };
                self.doc
                    .get_dictionary_mut(widget.field)?
                    .set("V", Object::String(encode_text(&new_value), format));
            }
        }
        self.request_appearances()?;
        Ok(ApplyOutcome::Applied)
    }

    /// Widgets sharing the field of `widget`.
    fn siblings(&self, widget: &Widget) -> Vec<ObjectId> {
        self.widgets
            .iter()
            .filter(|w| w.field == widget.field)
            .map(|w| w.annot)
            .collect()
    }

    fn set_checkbox(&mut self, widget: &Widget, value: &str) -> Result<()> {
        let checked = CHECKBOX_TRUTHY_VALUES.contains(&value.trim().to_lowercase().as_str());
        let state = if checked {
            on_state(&self.doc, widget.annot).unwrap_or_else(|| DEFAULT_ON_STATE.to_vec())
        } else {
            OFF_STATE.to_vec()
        };
        for annot in self.siblings(widget) {
            let annot_state = if checked {
                on_state(&self.doc, annot).unwrap_or_else(|| state.clone())
            } else {
                OFF_STATE.to_vec()
            };
            self.doc
                .get_dictionary_mut(annot)?
                .set("AS", Object::Name(annot_state));
        }
        self.doc
            .get_dictionary_mut(widget.field)?
            .set("V", Object::Name(state));
        Ok(())
    }

    fn set_radio(&mut self, widget: &Widget, value: &str) -> Result<()> {
        let wanted = value.trim();
        let kids: Vec<(ObjectId, Option<Vec<u8>>)> = self
            .siblings(widget)
            .into_iter()
            .map(|annot| (annot, on_state(&self.doc, annot)))
            .collect();
        let selected = kids.iter().find_map(|(_, state)| {
            state
                .as_ref()
                .filter(|state| decode_text(state).eq_ignore_ascii_case(wanted))
                .cloned()
        });
        if selected.is_none() {
            warn!(
                target: "docfill::pdf",
                field = %widget.name,
                value = wanted,
                "value matches no radio option"
            );
        }
        for (annot, state) in &kids {
            let annot_state = match (&selected, state) {
                (Some(selected), Some(state)) if selected == state => state.clone(),
                _ => OFF_STATE.to_vec(),
            };
            self.doc
                .get_dictionary_mut(*annot)?
                .set("AS", Object::Name(annot_state));
        }
        let field_value = selected.unwrap_or_else(|| wanted.as_bytes().to_vec());
        self.doc
            .get_dictionary_mut(widget.field)?
            .set("V", Object::Name(field_value));
        Ok(())
    }

    fn catalog_id(&self) -> Option<ObjectId> {
        self.doc
            .trailer
            .get(b"Root")
            .and_then(Object::as_reference)
            .ok()
    }

    fn acroform(&self) -> Option<&Dictionary> {
        let catalog = self.doc.get_dictionary(self.catalog_id()?).ok()?;
        resolve_dict(&self.doc, catalog.get(b"AcroForm").ok()?)
    }

    /// Ask viewers to regenerate field appearances from the new values.
    fn request_appearances(&mut self) -> Result<()> {
        let Some(catalog_id) = self.catalog_id() else {
            return Ok(());
        };
        let location = match self.doc.get_dictionary(catalog_id)?.get(b"AcroForm") {
            Ok(Object::Reference(id)) => AcroFormLocation::Indirect(*id),
            Ok(Object::Dictionary(_)) => AcroFormLocation::Inline(catalog_id),
            _ => return Ok(()),
        };
        let form = match location {
            AcroFormLocation::Indirect(id) => self.doc.get_dictionary_mut(id)?,
            AcroFormLocation::Inline(catalog) => self
                .doc
                .get_dictionary_mut(catalog)?
                .get_mut(b"AcroForm")?
                .as_dict_mut()?,
        };
        form.set("NeedAppearances", Object::Boolean(true));
        Ok(())
    }

    pub(crate) fn to_bytes(&mut self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.doc.save_to(&mut out)?;
        Ok(out)
    }
}
