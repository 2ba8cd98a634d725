//! Shared helpers for unit tests: builds small but structurally valid
//! PDFs so tests exercise the real engine instead of stubs.

use std::path::Path;

use lopdf::content::{Content, Operation as ContentOp};
use lopdf::{dictionary, Document, Object, Stream};
use tempfile::TempDir;

use crate::document::PdfDocument;

/// Writes a valid single-font PDF with `page_count` pages, each
/// carrying a short line of text.
pub fn write_minimal_pdf(path: &Path, page_count: usize) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids = Vec::with_capacity(page_count);
    for page_number in 1..=page_count {
        let content = Content {
            operations: vec![
                ContentOp::new("BT", vec![]),
                ContentOp::new("Tf", vec!["F1".into(), 24.into()]),
                ContentOp::new("Td", vec![72.into(), 720.into()]),
                ContentOp::new(
                    "Tj",
                    vec![Object::string_literal(format!("Hello page {}", page_number))],
                ),
                ContentOp::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            content.encode().unwrap(),
        ));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            "Resources" => resources_id,
        });
        kids.push(page_id.into());
    }

    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => page_count as i64,
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    doc.save(path).unwrap();
}

/// Creates a fresh PDF in a tempdir and opens it. The tempdir is
/// returned so it outlives the document.
pub fn open_test_pdf(page_count: usize) -> (TempDir, PdfDocument) {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("fixture.pdf");
    write_minimal_pdf(&path, page_count);
    let doc = PdfDocument::open(&path).unwrap();
    (tmp, doc)
}
