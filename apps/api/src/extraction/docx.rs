//! DOCX raw text: every paragraph in body order, including table cells,
//! hyperlinks, tracked insertions and content controls. Formatting is discarded.

use docx_rs::{
    DocumentChild, InsertChild, Paragraph, ParagraphChild, Run, RunChild,
    StructuredDataTagChild, Table, TableCellContent, TableChild, TableRowChild,
};

use super::ExtractError;

/// Raw text of a .docx file, one line per paragraph.
pub fn extract_text(bytes: &[u8]) -> Result<String, ExtractError> {
    let docx = docx_rs::read_docx(bytes)
        .map_err(|e| ExtractError::ExtractionFailed(format!("Failed to read DOCX: {e}")))?;

    let mut lines = Vec::new();
    for child in &docx.document.children {
        match child {
            DocumentChild::Paragraph(paragraph) => lines.push(paragraph_text(paragraph)),
            DocumentChild::Table(table) => table_lines(table, &mut lines),
            DocumentChild::StructuredDataTag(tag) => sdt_lines(&tag.children, &mut lines),
            _ => {}
        }
    }

    Ok(lines.join("\n"))
}

fn table_lines(table: &Table, lines: &mut Vec<String>) {
    for TableChild::TableRow(row) in &table.rows {
        for TableRowChild::TableCell(cell) in &row.cells {
            for content in &cell.children {
                match content {
                    TableCellContent::Paragraph(paragraph) => lines.push(paragraph_text(paragraph)),
                    TableCellContent::Table(nested) => table_lines(nested, lines),
                    TableCellContent::StructuredDataTag(tag) => sdt_lines(&tag.children, lines),
                    _ => {}
                }
            }
        }
    }
}

/// Block-level content control: paragraphs and tables become lines, bare runs
/// are collected into one line.
fn sdt_lines(children: &[StructuredDataTagChild], lines: &mut Vec<String>) {
    let mut inline = String::new();
    for child in children {
        match child {
            StructuredDataTagChild::Paragraph(paragraph) => lines.push(paragraph_text(paragraph)),
            StructuredDataTagChild::Table(table) => table_lines(table, lines),
            StructuredDataTagChild::StructuredDataTag(tag) => sdt_lines(&tag.children, lines),
            StructuredDataTagChild::Run(run) => push_run(run, &mut inline),
            _ => {}
        }
    }
    if !inline.is_empty() {
        lines.push(inline);
    }
}

fn paragraph_text(paragraph: &Paragraph) -> String {
    let mut line = String::new();
    push_inline(&paragraph.children, &mut line);
    line
}

fn push_inline(children: &[ParagraphChild], line: &mut String) {
    for child in children {
        match child {
            ParagraphChild::Run(run) => push_run(run, line),
            ParagraphChild::Hyperlink(link) => push_inline(&link.children, line),
            ParagraphChild::Insert(insert) => {
                for insert_child in &insert.children {
                    if let InsertChild::Run(run) = insert_child {
                        push_run(run, line);
                    }
                }
            }
            ParagraphChild::StructuredDataTag(tag) => {
                for tag_child in &tag.children {
                    if let StructuredDataTagChild::Run(run) = tag_child {
                        push_run(run, line);
                    }
                }
            }
            _ => {}
        }
    }
}

fn push_run(run: &Run, line: &mut String) {
    for child in &run.children {
        match child {
            RunChild::Text(t) => line.push_str(&t.text),
            RunChild::Tab(_) => line.push('\t'),
            RunChild::Break(_) => line.push('\n'),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use docx_rs::{
        Docx, Hyperlink, HyperlinkType, Paragraph, Run, Table, TableCell, TableRow,
    };

    use super::*;
    use crate::extraction::fixtures::docx_with_paragraphs;

    fn pack(docx: Docx) -> Vec<u8> {
        let mut cursor = Cursor::new(Vec::new());
        docx.build().pack(&mut cursor).unwrap();
        cursor.into_inner()
    }

    #[test]
    fn test_paragraphs_become_lines() {
        let bytes = docx_with_paragraphs(&["Experience", "Built payment APIs in Rust"]);
        let text = extract_text(&bytes).unwrap();
        assert_eq!(text, "Experience\nBuilt payment APIs in Rust");
    }

    #[test]
    fn test_table_cells_and_hyperlinks_are_kept() {
        let docx = Docx::new()
            .add_paragraph(Paragraph::new().add_run(Run::new().add_text("Jane Doe")))
            .add_paragraph(
                Paragraph::new().add_hyperlink(
                    Hyperlink::new("https://github.com/jane", HyperlinkType::External)
                        .add_run(Run::new().add_text("github.com/jane")),
                ),
            )
            .add_table(Table::new(vec![TableRow::new(vec![
                TableCell::new().add_paragraph(
                    Paragraph::new().add_run(Run::new().add_text("Skills: React TypeScript")),
                ),
                TableCell::new()
                    .add_paragraph(Paragraph::new().add_run(Run::new().add_text("Languages: Rust"))),
            ])]));

        let text = extract_text(&pack(docx)).unwrap();
        assert!(text.contains("Jane Doe"));
        assert!(text.contains("github.com/jane"));
        assert!(text.contains("Skills: React TypeScript"));
        assert!(text.contains("Languages: Rust"));
    }

    #[test]
    fn test_nested_table_is_walked() {
        let inner = Table::new(vec![TableRow::new(vec![TableCell::new()
            .add_paragraph(Paragraph::new().add_run(Run::new().add_text("Kubernetes")))])]);
        let outer = Table::new(vec![TableRow::new(vec![TableCell::new().add_table(inner)])]);

        let text = extract_text(&pack(Docx::new().add_table(outer))).unwrap();
        assert!(text.contains("Kubernetes"));
    }

    #[test]
    fn test_non_zip_input_fails() {
        let err = extract_text(b"definitely not a zip archive").unwrap_err();
        assert!(matches!(err, ExtractError::ExtractionFailed(_)));
    }
}
