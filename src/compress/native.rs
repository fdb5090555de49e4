//! Fallback backend: in-process rewrite with lopdf

use std::collections::HashSet;
use std::io::Cursor;

use lopdf::{Dictionary, Document, Object, ObjectId};

use super::images::optimize_page_images;
use super::CompressionBackend;
use crate::error::BackendError;
use crate::model::{CompressionMethod, QualityPreset};

/// Compresses page content streams and, optionally, embedded images
#[derive(Debug, Clone)]
pub struct NativeBackend {
    optimize_images: bool,
}

impl Default for NativeBackend {
    fn default() -> Self {
        Self::new(true)
    }
}

impl NativeBackend {
    pub fn new(optimize_images: bool) -> Self {
        Self { optimize_images }
    }

    pub fn optimize_images(&self) -> bool {
        self.optimize_images
    }
}

impl CompressionBackend for NativeBackend {
    fn method(&self) -> CompressionMethod {
        CompressionMethod::Native
    }

    fn compress(
        &self,
        data: &[u8],
        preset: &QualityPreset,
        remove_metadata: bool,
    ) -> Result<Vec<u8>, BackendError> {
        let mut doc = Document::load_mem(data).map_err(BackendError::DocumentParse)?;

        let pages = doc.get_pages();
        let mut seen_images = HashSet::new();
        let mut images_replaced = 0;

        // get_pages is keyed by page number, so pages are visited in document order
        for (_, page_id) in pages {
            compress_page_contents(&mut doc, page_id);
            if self.optimize_images {
                images_replaced += optimize_page_images(&mut doc, page_id, preset, &mut seen_images);
            }
        }
        log::debug!("Re-encoded {} embedded images", images_replaced);

        if remove_metadata {
            strip_metadata(&mut doc);
        }
        doc.prune_objects();

        let mut output = Cursor::new(Vec::new());
        doc.save_to(&mut output)
            .map_err(|e| BackendError::Serialize(e.to_string()))?;

        Ok(output.into_inner())
    }
}

/// Flate-compress a page's content streams that are not already filtered
fn compress_page_contents(doc: &mut Document, page_id: ObjectId) {
    for content_id in doc.get_page_contents(page_id) {
        if let Ok(Object::Stream(stream)) = doc.get_object_mut(content_id) {
            if let Err(e) = stream.compress() {
                log::debug!("Could not compress content stream {:?}: {}", content_id, e);
            }
        }
    }
}

/// Replace the document information dictionary with an empty one and drop XMP metadata
pub fn strip_metadata(doc: &mut Document) {
    let info_id = doc.add_object(Dictionary::new());
    doc.trailer.set("Info", Object::Reference(info_id));

    let root_id = match doc.trailer.get(b"Root") {
        Ok(Object::Reference(id)) => *id,
        _ => return,
    };
    if let Ok(Object::Dictionary(catalog)) = doc.get_object_mut(root_id) {
        catalog.remove(b"Metadata");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::get_preset;
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Stream};

    fn sample_pdf(with_info: bool) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let operations: Vec<Operation> = (0..50)
            .map(|i| Operation::new("Td", vec![10.into(), (i * 10).into()]))
            .collect();
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            }),
        );
        let mut catalog = dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        };
        if with_info {
            let xmp_id = doc.add_object(Stream::new(
                dictionary! { "Type" => "Metadata", "Subtype" => "XML" },
                b"<x:xmpmeta xmlns:x=\"adobe:ns:meta/\"></x:xmpmeta>".to_vec(),
            ));
            catalog.set("Metadata", xmp_id);
        }
        let catalog_id = doc.add_object(catalog);
        doc.trailer.set("Root", catalog_id);

        if with_info {
            let info_id = doc.add_object(dictionary! {
                "Title" => Object::string_literal("Quarterly report"),
                "Author" => Object::string_literal("Someone"),
            });
            doc.trailer.set("Info", info_id);
        }

        let mut buf = Vec::new();
        doc.save_to(&mut buf).unwrap();
        buf
    }

    #[test]
    fn test_rejects_non_pdf() {
        let err = NativeBackend::default()
            .compress(b"this is not a pdf", get_preset("medium"), false)
            .unwrap_err();
        assert!(matches!(err, BackendError::DocumentParse(_)));
    }

    #[test]
    fn test_compresses_content_streams() {
        let input = sample_pdf(false);
        let output = NativeBackend::default()
            .compress(&input, get_preset("medium"), false)
            .unwrap();

        let doc = Document::load_mem(&output).unwrap();
        assert_eq!(doc.get_pages().len(), 1);
        let page_id = *doc.get_pages().values().next().unwrap();
        for content_id in doc.get_page_contents(page_id) {
            let stream = doc.get_object(content_id).unwrap().as_stream().unwrap();
            assert!(stream.dict.get(b"Filter").is_ok());
        }
    }

    #[test]
    fn test_strip_metadata_empties_info() {
        let input = sample_pdf(true);
        let output = NativeBackend::default()
            .compress(&input, get_preset("medium"), true)
            .unwrap();

        let doc = Document::load_mem(&output).unwrap();
        let info_id = match doc.trailer.get(b"Info") {
            Ok(Object::Reference(id)) => *id,
            other => panic!("unexpected /Info: {:?}", other),
        };
        let info = doc.get_dictionary(info_id).unwrap();
        assert!(info.is_empty());
        assert!(!catalog(&doc).has(b"Metadata"));
    }

    #[test]
    fn test_metadata_kept_by_default() {
        let input = sample_pdf(true);
        let output = NativeBackend::default()
            .compress(&input, get_preset("medium"), false)
            .unwrap();

        let doc = Document::load_mem(&output).unwrap();
        let info_id = match doc.trailer.get(b"Info") {
            Ok(Object::Reference(id)) => *id,
            other => panic!("unexpected /Info: {:?}", other),
        };
        assert!(doc.get_dictionary(info_id).unwrap().has(b"Title"));
        assert!(catalog(&doc).has(b"Metadata"));
    }

    fn catalog(doc: &Document) -> &Dictionary {
        let root_id = doc.trailer.get(b"Root").unwrap().as_reference().unwrap();
        doc.get_dictionary(root_id).unwrap()
    }
}
