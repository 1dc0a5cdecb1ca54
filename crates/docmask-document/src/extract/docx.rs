// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// DOCX text extraction using `docx-rs`. Only body paragraphs are read; tables,
// images, and other embedded content are skipped.

use docmask_core::error::DocmaskError;
use docx_rs::{DocumentChild, Paragraph, ParagraphChild, Run, RunChild};
use tracing::{debug, instrument};

/// Concatenate every body paragraph in document order, one per line.
///
/// Empty paragraphs are kept as empty lines so vertical structure survives.
#[instrument(skip_all, fields(bytes_len = data.len()))]
pub fn extract_text(data: &[u8]) -> Result<String, DocmaskError> {
    let docx = docx_rs::read_docx(data)
        .map_err(|err| DocmaskError::decode("DOCX", format!("failed to parse DOCX: {err}")))?;

    let paragraphs: Vec<String> = docx
        .document
        .children
        .iter()
        .filter_map(|child| match child {
            DocumentChild::Paragraph(p) => Some(paragraph_text(p)),
            _ => None,
        })
        .collect();

    debug!(paragraphs = paragraphs.len(), "DOCX paragraphs extracted");
    Ok(paragraphs.join("\n"))
}

fn paragraph_text(paragraph: &Paragraph) -> String {
    let mut text = String::new();
    for child in &paragraph.children {
        match child {
            ParagraphChild::Run(run) => push_run(&mut text, run),
            ParagraphChild::Hyperlink(link) => {
                for inner in &link.children {
                    if let ParagraphChild::Run(run) = inner {
                        push_run(&mut text, run);
                    }
                }
            }
            _ => {}
        }
    }
    text
}

fn push_run(text: &mut String, run: &Run) {
    for child in &run.children {
        match child {
            RunChild::Text(t) => text.push_str(&t.text),
            RunChild::Tab(_) => text.push('\t'),
            RunChild::Break(_) => text.push('\n'),
            _ => {}
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use docx_rs::{Docx, Table, TableCell, TableRow};

    pub(crate) fn build_docx(paragraphs: &[&str]) -> Vec<u8> {
        let mut docx = Docx::new();
        for text in paragraphs {
            docx = docx.add_paragraph(Paragraph::new().add_run(Run::new().add_text(*text)));
        }
        let mut buffer = std::io::Cursor::new(Vec::new());
        docx.build().pack(&mut buffer).unwrap();
        buffer.into_inner()
    }

    #[test]
    fn paragraphs_join_with_newlines() {
        let bytes = build_docx(&["Dear Ms. Rao,", "", "Your account 1234 is overdue."]);
        let text = extract_text(&bytes).unwrap();
        assert_eq!(text, "Dear Ms. Rao,\n\nYour account 1234 is overdue.");
    }

    #[test]
    fn tables_are_ignored() {
        let table = Table::new(vec![TableRow::new(vec![
            TableCell::new().add_paragraph(Paragraph::new().add_run(Run::new().add_text("cell"))),
        ])]);
        let docx = Docx::new()
            .add_paragraph(Paragraph::new().add_run(Run::new().add_text("before")))
            .add_table(table)
            .add_paragraph(Paragraph::new().add_run(Run::new().add_text("after")));
        let mut buffer = std::io::Cursor::new(Vec::new());
        docx.build().pack(&mut buffer).unwrap();

        let text = extract_text(buffer.get_ref()).unwrap();
        assert_eq!(text, "before\nafter");
    }

    #[test]
    fn invalid_archive_is_decode_error() {
        assert!(matches!(
            extract_text(b"PK\x03\x04 broken"),
            Err(DocmaskError::Decode { .. })
        ));
    }
}
