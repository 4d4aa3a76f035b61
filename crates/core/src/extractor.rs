use crate::error::IngestError;
use lopdf::Document;
use std::path::Path;

/// Text-extraction collaborator. The pipeline treats the PDF binary as
/// opaque and only consumes the extracted text.
pub trait PdfExtractor {
    fn extract_text(&self, path: &Path) -> Result<String, IngestError>;
}

#[derive(Default)]
pub struct LopdfExtractor;

impl PdfExtractor for LopdfExtractor {
    fn extract_text(&self, path: &Path) -> Result<String, IngestError> {
        let is_pdf = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));

        if !is_pdf {
            return Err(IngestError::ExtractionFailed(format!(
                "not a pdf path: {}",
                path.display()
            )));
        }

        let document =
            Document::load(path).map_err(|error| IngestError::ExtractionFailed(error.to_string()))?;

        let mut pages = Vec::new();
        for (page_no, _page_id) in document.get_pages() {
            let text = document
                .extract_text(&[page_no])
                .map_err(|error| IngestError::ExtractionFailed(error.to_string()))?;

            if !text.trim().is_empty() {
                pages.push(text);
            }
        }

        if pages.is_empty() {
            return Err(IngestError::ExtractionFailed(format!(
                "pdf had no readable page text: {}",
                path.display()
            )));
        }

        Ok(pages.join(" "))
    }
}
