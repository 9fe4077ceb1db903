//! Inheritable style properties and the fragments built from them.

use serde::{Deserialize, Serialize};

fn is_false(value: &bool) -> bool {
    !*value
}

/// Sparse run-level formatting. An absent property means "inherit the default".
///
/// Sizes keep the native unit of the source format: half-points for docx,
/// points for xlsx and pdf.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FormattingProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_ascii: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_h_ansi: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_cs: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_east_asia: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_cs: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub bold: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub italic: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub underline: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl FormattingProperties {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    #[must_use]
    pub fn has_fonts(&self) -> bool {
        self.font_ascii.is_some()
            || self.font_h_ansi.is_some()
            || self.font_cs.is_some()
            || self.font_east_asia.is_some()
    }

    /// The font a single-font format (xlsx, pdf) should use.
    #[must_use]
    pub fn primary_font(&self) -> Option<&str> {
        self.font_ascii
            .as_deref()
            .or(self.font_h_ansi.as_deref())
            .or(self.font_east_asia.as_deref())
            .or(self.font_cs.as_deref())
    }

    #[must_use]
    pub fn with_font(mut self, font: impl Into<String>) -> Self {
        let font = font.into();
        self.font_ascii = Some(font.clone());
        self.font_h_ansi = Some(font);
        self
    }

    #[must_use]
    pub fn with_size(mut self, size: impl Into<String>) -> Self {
        self.size = Some(size.into());
        self
    }

    #[must_use]
    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    #[must_use]
    pub fn italic(mut self) -> Self {
        self.italic = true;
        self
    }

    #[must_use]
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }
}

/// A native content unit ready for insertion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum NativeFragment {
    /// WordprocessingML run markup (`<w:r>…</w:r>`).
    Ooxml(String),
    /// SpreadsheetML inline string (`<is>…</is>`).
    InlineString(String),
    /// A plain form field value.
    FieldValue(String),
}

impl NativeFragment {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Ooxml(s) | Self::InlineString(s) | Self::FieldValue(s) => s,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_properties_serialize_to_empty_object() {
        let json = serde_json::to_string(&FormattingProperties::default()).unwrap();
        assert_eq!(json, "{}");
    }

    #[test]
    fn primary_font_prefers_ascii() {
        let props = FormattingProperties {
            font_cs: Some("Arial".into()),
            font_ascii: Some("Serif".into()),
            ..FormattingProperties::default()
        };
        assert_eq!(props.primary_font(), Some("Serif"));
        assert!(!props.is_empty());
    }
}
