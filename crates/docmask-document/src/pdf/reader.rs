// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF reader — open PDF documents from memory and pull their text out page by
// page using the `lopdf` crate.

use docmask_core::error::DocmaskError;
use lopdf::Document;
use tracing::{debug, instrument, warn};

/// Reads text out of existing PDF files.
pub struct PdfReader {
    /// The underlying lopdf document.
    document: Document,
}

impl PdfReader {
    /// Create a reader from raw PDF bytes already in memory.
    #[instrument(skip_all, fields(bytes_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self, DocmaskError> {
        let document = Document::load_mem(data)
            .map_err(|err| DocmaskError::decode("PDF", format!("failed to load PDF: {err}")))?;

        debug!(pages = document.get_pages().len(), "PDF loaded from bytes");

        Ok(Self { document })
    }

    /// Number of pages in the document.
    pub fn page_count(&self) -> usize {
        self.document.get_pages().len()
    }

    /// Text of every page in page order.
    ///
    /// A page that yields no extractable text (scanned page, unsupported font
    /// encoding, broken content stream) contributes an empty string instead of
    /// failing the document.
    pub fn page_texts(&self) -> Vec<String> {
        // get_pages() is keyed by 1-indexed page number, so iteration is in
        // page order.
        self.document
            .get_pages()
            .keys()
            .map(|&page_number| match self.document.extract_text(&[page_number]) {
                Ok(text) => text.trim_end().to_string(),
                Err(err) => {
                    warn!(page_number, %err, "Page has no extractable text");
                    String::new()
                }
            })
            .collect()
    }

    /// All page texts joined with newlines.
    #[instrument(skip(self), fields(pages = self.page_count()))]
    pub fn extract_text(&self) -> String {
        let pages = self.page_texts();
        let empty_pages = pages.iter().filter(|p| p.is_empty()).count();
        debug!(empty_pages, "PDF text extracted");
        pages.join("\n")
    }
}
