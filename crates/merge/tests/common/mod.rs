//! Shared fixtures for merge integration tests

#![allow(dead_code)]

use lopdf::{dictionary, Document, Object, Stream};
use merge::{ConverterStrategy, MergeError, Result};
use std::io::{Cursor, Write};
use std::path::Path;
use zip::write::SimpleFileOptions;

const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

/// Letter template used by the batch tests
pub const LETTER_BODY: &str = r#"<w:p><w:r><w:t xml:space="preserve">Date: {{current_date}}</w:t></w:r></w:p><w:p><w:r><w:t xml:space="preserve">Dear {{first</w:t></w:r><w:r><w:rPr><w:i/></w:rPr><w:t>_name}},</w:t></w:r></w:p><w:p><w:r><w:t xml:space="preserve">Amount: {{dinar}} JOD</w:t></w:r></w:p><w:p><w:r><w:rPr><w:i/></w:rPr><w:t>Static closing</w:t></w:r></w:p>"#;

/// Build a DOCX package with a header and the given body
pub fn create_template(body: &str, header: &str) -> Vec<u8> {
    let content_types = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
<Default Extension="xml" ContentType="application/xml"/>
<Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>
<Override PartName="/word/header1.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.header+xml"/>
</Types>"#;
    let package_rels = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>
</Relationships>"#;
    let document_rels = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/header" Target="header1.xml"/>
</Relationships>"#;
    let document = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="{W_NS}" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><w:body>{body}<w:sectPr><w:headerReference w:type="default" r:id="rId2"/><w:pgSz w:w="11906" w:h="16838"/></w:sectPr></w:body></w:document>"#
    );
    let header = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:hdr xmlns:w="{W_NS}">{header}</w:hdr>"#
    );

    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let parts: [(&str, &str); 5] = [
        ("[Content_Types].xml", content_types),
        ("_rels/.rels", package_rels),
        ("word/_rels/document.xml.rels", document_rels),
        ("word/document.xml", &document),
        ("word/header1.xml", &header),
    ];
    for (name, content) in parts {
        writer.start_file(name, SimpleFileOptions::default()).unwrap();
        writer.write_all(content.as_bytes()).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

/// Employee data: three named rows and one row without a name
pub const EMPLOYEES_CSV: &str = "full_name,first_name,branch,dinar,value_18ct
Jane Doe,Jane,Amman,1500,42.7
Sam Lee,Sam,Irbid,900,
,Ghost,Zarqa,10,
Omar Ali,Omar,Aqaba,1200.9,3
";

/// Create a PDF with the given number of empty A4 pages
pub fn create_test_pdf(page_count: usize) -> Vec<u8> {
    let mut doc = Document::new();

    let pages_id = doc.add_object(Object::Dictionary(dictionary! {
        "Type" => "Pages",
        "Count" => page_count as i32,
        "Kids" => vec![],
    }));

    let mut kids = Vec::new();
    for _ in 0..page_count {
        let contents_id = doc.add_object(Object::Stream(Stream::new(dictionary! {}, vec![])));
        let page_id = doc.add_object(Object::Dictionary(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.28.into(), 841.89.into()],
            "Resources" => dictionary! {},
            "Contents" => contents_id,
        }));
        kids.push(Object::from(page_id));
    }

    let mut pages = doc.get_object(pages_id).unwrap().as_dict().unwrap().clone();
    pages.set("Kids", Object::Array(kids));
    doc.objects.insert(pages_id, pages.into());

    let catalog_id = doc.add_object(Object::Dictionary(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    }));
    doc.trailer.set("Root", catalog_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    buffer
}

/// Converter that writes a blank PDF, failing for sources whose name
/// contains `fail_on`
pub struct FakeConverter {
    pub pages: usize,
    pub fail_on: Option<&'static str>,
}

impl FakeConverter {
    pub fn new() -> Self {
        Self {
            pages: 1,
            fail_on: None,
        }
    }
}

impl ConverterStrategy for FakeConverter {
    fn name(&self) -> &str {
        "fake"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn convert(&self, source: &Path, target: &Path) -> Result<()> {
        let source_name = source.to_string_lossy();
        if let Some(pattern) = self.fail_on {
            if source_name.contains(pattern) {
                return Err(MergeError::Conversion(format!("cannot open {source_name}")));
            }
        }
        assert!(source.exists(), "intermediate document must exist");
        std::fs::write(target, create_test_pdf(self.pages))
            .map_err(|e| MergeError::Conversion(e.to_string()))
    }
}
