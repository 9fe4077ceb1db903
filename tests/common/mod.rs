//! In-memory fixture builders shared by the integration tests.
#![allow(dead_code)]

use std::io::{Cursor, Read, Write};

use lopdf::{Document, Object, dictionary};
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

pub fn zip_package(entries: &[(&str, String)]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, body) in entries {
        writer
            .start_file(*name, SimpleFileOptions::default())
            .unwrap();
        writer.write_all(body.as_bytes()).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

pub fn read_part(bytes: &[u8], name: &str) -> String {
    let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
    let mut file = archive.by_name(name).unwrap();
    let mut out = String::new();
    file.read_to_string(&mut out).unwrap();
    out
}

/// A `.docx` whose body holds `body_xml`.
pub fn docx(body_xml: &str) -> Vec<u8> {
    let document = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="{W_NS}"><w:body>{body_xml}<w:sectPr/></w:body></w:document>"#
    );
    let content_types = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#;
    zip_package(&[
        ("[Content_Types].xml", content_types.to_string()),
        ("word/document.xml", document),
    ])
}

/// Bold 11pt Serif run with the given text.
pub fn serif_run(text: &str) -> String {
    format!(
        r#"<w:r><w:rPr><w:rFonts w:ascii="Serif" w:hAnsi="Serif"/><w:b/><w:sz w:val="22"/></w:rPr><w:t>{text}</w:t></w:r>"#
    )
}

/// Intake form: a heading paragraph, a 2x2 table whose second row holds a
/// label and an empty bold 11pt Serif answer cell, and a placeholder paragraph.
pub fn intake_docx() -> Vec<u8> {
    let body = format!(
        concat!(
            "<w:p><w:r><w:t>Vendor intake</w:t></w:r></w:p>",
            "<w:tbl><w:tblPr/>",
            "<w:tr><w:tc><w:p><w:r><w:t>Field</w:t></w:r></w:p></w:tc>",
            "<w:tc><w:p><w:r><w:t>Answer</w:t></w:r></w:p></w:tc></w:tr>",
            "<w:tr><w:tc><w:p><w:r><w:t>Company name</w:t></w:r></w:p></w:tc>",
            "<w:tc><w:p>{answer}</w:p></w:tc></w:tr>",
            "</w:tbl>",
            "<w:p><w:r><w:t>Signed by [Enter name] on ____</w:t></w:r></w:p>"
        ),
        answer = serif_run("")
    );
    docx(&body)
}

pub struct Sheet<'a> {
    pub name: &'a str,
    pub xml_body: &'a str,
}

/// An `.xlsx` with the given sheets, a bold Arial font at style 1 and the
/// shared strings `strings`.
pub fn xlsx(sheets: &[Sheet<'_>], strings: &[&str]) -> Vec<u8> {
    let sheet_list: String = sheets
        .iter()
        .enumerate()
        .map(|(i, sheet)| {
            format!(
                r#"<sheet name="{}" sheetId="{}" r:id="rId{}"/>"#,
                sheet.name,
                i + 1,
                i + 1
            )
        })
        .collect();
    let rels: String = (1..=sheets.len())
        .map(|i| {
            format!(
                r#"<Relationship Id="rId{i}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet{i}.xml"/>"#
            )
        })
        .collect();
    let shared: String = strings.iter().map(|s| format!("<si><t>{s}</t></si>")).collect();

    let mut entries = vec![
        (
            "xl/workbook.xml",
            format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets>{sheet_list}</sheets></workbook>"#
            ),
        ),
        (
            "xl/_rels/workbook.xml.rels",
            format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">{rels}</Relationships>"#
            ),
        ),
        (
            "xl/styles.xml",
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><fonts count="2"><font><sz val="11"/><name val="Calibri"/></font><font><b/><sz val="12"/><name val="Arial"/></font></fonts><fills count="2"><fill><patternFill patternType="none"/></fill><fill><patternFill patternType="gray125"/></fill></fills><cellXfs count="2"><xf numFmtId="0" fontId="0" fillId="0"/><xf numFmtId="0" fontId="1" fillId="0"/></cellXfs></styleSheet>"#
                .to_string(),
        ),
        (
            "xl/sharedStrings.xml",
            format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="{n}" uniqueCount="{n}">{shared}</sst>"#,
                n = strings.len()
            ),
        ),
    ];
    let names: Vec<String> = (1..=sheets.len())
        .map(|i| format!("xl/worksheets/sheet{i}.xml"))
        .collect();
    for (sheet, name) in sheets.iter().zip(&names) {
        entries.push((
            name.as_str(),
            format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">{}</worksheet>"#,
                sheet.xml_body
            ),
        ));
    }
    zip_package(&entries)
}

/// One sheet "Intake": a bold label A1, an empty bold B1 and a placeholder in A2.
pub fn intake_xlsx() -> Vec<u8> {
    xlsx(
        &[Sheet {
            name: "Intake",
            xml_body: r#"<dimension ref="A1:B2"/><sheetData><row r="1"><c r="A1" s="1" t="s"><v>0</v></c><c r="B1" s="1"/></row><row r="2"><c r="A2" t="s"><v>1</v></c><c r="B2"><v>42</v></c></row></sheetData>"#,
        }],
        &["Name", "Fill ____ here"],
    )
}

/// A one-page AcroForm with a text field `name`, a checkbox `agree` and a
/// read-only text field `ref`.
pub fn intake_pdf() -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let name = doc.add_object(dictionary! {
        "Type" => "Annot",
        "Subtype" => "Widget",
        "FT" => "Tx",
        "T" => Object::string_literal("name"),
        "V" => Object::string_literal("[Enter name]"),
        "DA" => Object::string_literal("/Helv 10 Tf 0 g"),
    });
    let agree = doc.add_object(dictionary! {
        "Type" => "Annot",
        "Subtype" => "Widget",
        "FT" => "Btn",
        "T" => Object::string_literal("agree"),
        "V" => "Off",
        "AS" => "Off",
        "AP" => dictionary! { "N" => dictionary! { "Off" => Object::Null, "Yes" => Object::Null } },
    });
    let reference = doc.add_object(dictionary! {
        "Type" => "Annot",
        "Subtype" => "Widget",
        "FT" => "Tx",
        "Ff" => 1_i64,
        "T" => Object::string_literal("ref"),
        "V" => Object::string_literal("R-001"),
    });
    let annots = vec![
        Object::Reference(name),
        Object::Reference(agree),
        Object::Reference(reference),
    ];
    let page = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        "Annots" => annots.clone(),
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![Object::Reference(page)],
            "Count" => 1_i64,
        }),
    );
    let form = doc.add_object(dictionary! {
        "Fields" => annots,
        "DA" => Object::string_literal("/Helv 12 Tf 0 g"),
    });
    let catalog = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
        "AcroForm" => form,
    });
    doc.trailer.set("Root", catalog);
    let mut out = Vec::new();
    doc.save_to(&mut out).unwrap();
    out
}
