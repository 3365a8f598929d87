//! Table to CSV conversion.
//!
//! Rows are every `<tr>` below the element, however deeply nested; cells are
//! every `<th>`/`<td>` below a row. Values are opaque text: nothing is parsed
//! as a number or reformatted.

use crate::dom::{Document, NodeId};

/// Convert a table-like element to CSV.
///
/// Returns `None` when there is no element to read, and an empty string when
/// no row has any cells. Rows are joined with `\n` and there is no trailing
/// newline.
pub fn table_to_csv(doc: &Document, element: Option<NodeId>) -> Option<String> {
    let element = element.filter(|&id| doc.contains(id))?;

    let lines: Vec<String> = rows(doc, element)
        .map(|cells| {
            cells
                .into_iter()
                .map(|cell| sanitize_cell(doc.rendered_text(cell).trim()))
                .collect::<Vec<_>>()
                .join(",")
        })
        .collect();
    Some(lines.join("\n"))
}

/// Cells of every row below `element` that has any, in document order.
///
/// Each item is one line of the export. Rows without cells are left out.
pub fn rows<'a>(doc: &'a Document, element: NodeId) -> impl Iterator<Item = Vec<NodeId>> + 'a {
    descendants_named(doc, element, &["tr"])
        .map(move |row| descendants_named(doc, row, &["th", "td"]).collect::<Vec<_>>())
        .filter(|cells| !cells.is_empty())
}

/// Escape one cell value.
///
/// Line breaks (`\r\n`, `\n`, `\r`) become a single space, double quotes are
/// doubled, and the value is quoted when it contains a quote, a comma or a
/// newline. The newline test runs after the replacement, so a value that only
/// had line breaks is not quoted.
pub fn sanitize_cell(text: &str) -> String {
    let flattened = text
        .replace("\r\n", " ")
        .replace(|c: char| c == '\n' || c == '\r', " ");
    let escaped = flattened.replace('"', "\"\"");
    if escaped.contains(|c: char| matches!(c, '"' | ',' | '\n')) {
        format!("\"{escaped}\"")
    } else {
        escaped
    }
}

/// Proper descendants of `root` with one of the given tag names.
fn descendants_named<'a>(
    doc: &'a Document,
    root: NodeId,
    names: &'a [&'a str],
) -> impl Iterator<Item = NodeId> + 'a {
    doc.descendants(root)
        .into_iter()
        .skip(1)
        .filter(move |&id| doc.tag_name(id).is_some_and(|n| names.contains(&n)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first_table(doc: &Document) -> Option<NodeId> {
        doc.descendants(doc.root())
            .into_iter()
            .find(|&id| doc.tag_name(id) == Some("table"))
    }

    fn csv_of(html: &str) -> String {
        let doc = Document::parse_html(html);
        table_to_csv(&doc, first_table(&doc)).unwrap()
    }

    #[test]
    fn test_quote_escaping() {
        assert_eq!(sanitize_cell(r#"He said "hi""#), r#""He said ""hi""""#);
    }

    #[test]
    fn test_comma_quoting() {
        assert_eq!(sanitize_cell("a,b"), r#""a,b""#);
    }

    #[test]
    fn test_newlines_collapse_without_quoting() {
        assert_eq!(sanitize_cell("line one\nline two"), "line one line two");
        assert_eq!(sanitize_cell("a\r\nb"), "a b");
        assert_eq!(sanitize_cell("a\rb"), "a b");
        assert_eq!(sanitize_cell("a\n\nb"), "a  b");
    }

    #[test]
    fn test_plain_value_untouched() {
        assert_eq!(sanitize_cell("O'Brien"), "O'Brien");
        assert_eq!(sanitize_cell("3.50"), "3.50");
        assert_eq!(sanitize_cell(""), "");
    }

    #[test]
    fn test_end_to_end_example() {
        let csv = csv_of(
            "<table><tr><th>Name</th><th>City</th></tr>\
             <tr><td>O'Brien, J.</td><td>NYC</td></tr></table>",
        );
        assert_eq!(csv, "Name,City\n\"O'Brien, J.\",NYC");
    }

    #[test]
    fn test_cells_trimmed() {
        let csv = csv_of("<table><tr><td>  padded  </td><td>\n x \n</td></tr></table>");
        assert_eq!(csv, "padded,x");
    }

    #[test]
    fn test_multiline_cell_from_markup() {
        let csv = csv_of("<table><tr><td>first<br>second</td><td>z</td></tr></table>");
        assert_eq!(csv, "first second,z");
    }

    #[test]
    fn test_rows_without_cells_skipped() {
        let csv = csv_of("<table><tr><td>a</td></tr><tr></tr><tr><td>b</td></tr></table>");
        assert_eq!(csv, "a\nb");
    }

    #[test]
    fn test_empty_table() {
        assert_eq!(csv_of("<table></table>"), "");
        assert_eq!(csv_of("<table><tr></tr><tr></tr></table>"), "");
    }

    #[test]
    fn test_empty_cells_kept() {
        let csv = csv_of("<table><tr><td></td><td>x</td><td></td></tr></table>");
        assert_eq!(csv, ",x,");
    }

    #[test]
    fn test_rows_across_sections() {
        let csv = csv_of(
            "<table><thead><tr><th>h</th></tr></thead>\
             <tbody><tr><td>1</td></tr></tbody>\
             <tfoot><tr><td>f</td></tr></tfoot></table>",
        );
        assert_eq!(csv, "h\n1\nf");
    }

    #[test]
    fn test_role_container_spanning_tables() {
        let doc = Document::parse_html(
            r#"<div role="table">
                 <table><tr><th>A</th><th>B</th></tr></table>
                 <div><table><tr><td>1</td><td>2</td></tr></table></div>
               </div>"#,
        );
        let container = doc
            .descendants(doc.root())
            .into_iter()
            .find(|&id| doc.attr(id, "role") == Some("table"));
        assert_eq!(table_to_csv(&doc, container).unwrap(), "A,B\n1,2");
    }

    #[test]
    fn test_rows_lists_cells() {
        let doc = Document::parse_html(
            "<table><tr><th>a</th><th>b</th></tr><tr></tr><tr><td>c</td></tr></table>",
        );
        let table = first_table(&doc).unwrap();
        let widths: Vec<usize> = rows(&doc, table).map(|cells| cells.len()).collect();
        assert_eq!(widths, vec![2, 1]);
    }

    #[test]
    fn test_hidden_cell_exported() {
        let csv = csv_of(r#"<table><tr><td style="display:none">42</td><td>Name</td></tr></table>"#);
        assert_eq!(csv, "42,Name");
    }

    #[test]
    fn test_absent_element() {
        let doc = Document::new();
        assert_eq!(table_to_csv(&doc, None), None);
    }
}
