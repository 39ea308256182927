use std::fmt::Write;

use crate::document::{Block, Cell, Document, Field, FieldValue, Mark, Table};

const RULE_WIDTH: usize = 60;

/// Render a document for a terminal.
pub fn render_text(doc: &Document) -> String {
    let mut out = String::new();
    write_text_blocks(&mut out, &doc.blocks);
    out
}

fn write_text_blocks(out: &mut String, blocks: &[Block]) {
    for block in blocks {
        match block {
            Block::Heading { level, text } => {
                let underline = if *level <= 2 { '=' } else { '-' };
                out.push_str(text);
                out.push('\n');
                out.extend(std::iter::repeat(underline).take(text.chars().count()));
                out.push('\n');
            }
            Block::Paragraph(text) | Block::Error(text) => {
                out.push_str(text);
                out.push('\n');
            }
            Block::Preformatted(text) => {
                out.push_str(text);
                if !text.ends_with('\n') {
                    out.push('\n');
                }
            }
            Block::Rule => {
                out.extend(std::iter::repeat('-').take(RULE_WIDTH));
                out.push('\n');
            }
            Block::Fields(fields) => {
                for field in fields {
                    let _ = writeln!(out, "{}: {}", field.title, field.display_value());
                }
            }
            Block::Table(table) => write_text_table(out, table),
            Block::Section { blocks, .. } => write_text_blocks(out, blocks),
        }
    }
}

/// Place cells on a grid, honouring column and row spans. Spanned slots stay
/// empty.
fn layout_rows(rows: &[Vec<Cell>]) -> Vec<Vec<String>> {
    let mut covered: Vec<usize> = Vec::new();
    let mut grid = Vec::with_capacity(rows.len());

    for row in rows {
        let mut line: Vec<String> = Vec::new();
        let mut col = 0;
        for cell in row {
            while covered.get(col).copied().unwrap_or(0) > 0 {
                col += 1;
            }
            let end = col + cell.colspan;
            if covered.len() < end {
                covered.resize(end, 0);
            }
            if line.len() < end {
                line.resize(end, String::new());
            }
            line[col] = cell.text.clone();
            for slot in &mut covered[col..end] {
                *slot = cell.rowspan;
            }
            col = end;
        }
        for slot in covered.iter_mut() {
            *slot = slot.saturating_sub(1);
        }
        grid.push(line);
    }
    grid
}

fn write_text_table(out: &mut String, table: &Table) {
    if let Some(caption) = &table.caption {
        out.push_str(caption);
        out.push('\n');
    }

    let head = layout_rows(&table.head);
    let body = layout_rows(&table.body);
    let columns = head.iter().chain(body.iter()).map(Vec::len).max().unwrap_or(0);
    let mut widths = vec![0usize; columns];
    for row in head.iter().chain(body.iter()) {
        for (i, text) in row.iter().enumerate() {
            widths[i] = widths[i].max(text.chars().count());
        }
    }

    let write_row = |out: &mut String, row: &[String]| {
        let mut line = String::new();
        for (i, width) in widths.iter().enumerate() {
            let text = row.get(i).map(String::as_str).unwrap_or("");
            if i > 0 {
                line.push_str("  ");
            }
            let _ = write!(line, "{:<width$}", text, width = width);
        }
        out.push_str(line.trim_end());
        out.push('\n');
    };

    for row in &head {
        write_row(out, row);
    }
    if !head.is_empty() {
        let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        write_row(out, &rule);
    }
    for row in &body {
        write_row(out, row);
    }
}

/// Render a document as an HTML fragment.
pub fn render_html(doc: &Document) -> String {
    let mut out = String::new();
    write_html_blocks(&mut out, &doc.blocks);
    out
}

/// Render a document as a standalone HTML page.
pub fn render_html_page(doc: &Document, title: &str) -> String {
    format!(
        "<!doctype html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n<style>{}</style>\n</head>\n<body>\n{}</body>\n</html>\n",
        html_escape(title),
        PAGE_STYLE,
        render_html(doc)
    )
}

const PAGE_STYLE: &str = "\
.report-result-pass{color:#080}\
.report-result-fail{color:#c00}\
.report-table{border-collapse:collapse;margin:0.5em 0}\
.report-table td,.report-table th{border:1px solid #ccc;padding:2px 6px}\
.error-message{color:#c00}";

fn mark_class(mark: Option<Mark>) -> &'static str {
    match mark {
        Some(Mark::Pass) => " class=\"report-result-pass\"",
        Some(Mark::Fail) => " class=\"report-result-fail\"",
        None => "",
    }
}

fn write_html_blocks(out: &mut String, blocks: &[Block]) {
    for block in blocks {
        match block {
            Block::Heading { level, text } => {
                let level = (*level).clamp(1, 6);
                let _ = writeln!(out, "<h{0}>{1}</h{0}>", level, html_escape(text));
            }
            Block::Paragraph(text) => {
                let _ = writeln!(out, "<p>{}</p>", html_escape(text));
            }
            Block::Preformatted(text) => {
                let _ = writeln!(out, "<pre>{}</pre>", html_escape(text));
            }
            Block::Rule => out.push_str("<hr>\n"),
            Block::Error(text) => {
                let _ = writeln!(out, "<div class=\"error-message\">{}</div>", html_escape(text));
            }
            Block::Fields(fields) => {
                out.push_str("<ul class=\"left-titled\">\n");
                for field in fields {
                    write_html_field(out, field);
                }
                out.push_str("</ul>\n");
            }
            Block::Table(table) => write_html_table(out, table),
            Block::Section { name, blocks } => {
                let _ = writeln!(out, "<div class=\"{}\">", html_escape(name));
                write_html_blocks(out, blocks);
                out.push_str("</div>\n");
            }
        }
    }
}

fn write_html_field(out: &mut String, field: &Field) {
    let _ = write!(out, "<li><span>{}: </span>", html_escape(&field.title));
    match &field.value {
        FieldValue::Plain(value) => {
            let _ = write!(out, "<span{}>{}</span>", mark_class(field.mark), html_escape(value));
        }
        FieldValue::Truncated { shown, more, full } => {
            let _ = write!(
                out,
                "<span{}>{} <details><summary>{}</summary>{}</details></span>",
                mark_class(field.mark),
                html_escape(shown),
                html_escape(more),
                html_escape(full)
            );
        }
    }
    out.push_str("</li>\n");
}

fn write_html_table(out: &mut String, table: &Table) {
    out.push_str("<table class=\"report-table\">\n");
    if let Some(caption) = &table.caption {
        let _ = writeln!(out, "<caption>{}</caption>", html_escape(caption));
    }
    let write_cells = |out: &mut String, rows: &[Vec<Cell>], tag: &str| {
        for row in rows {
            out.push_str("<tr>");
            for cell in row {
                let _ = write!(out, "<{}{}", tag, mark_class(cell.mark));
                if cell.colspan > 1 {
                    let _ = write!(out, " colspan=\"{}\"", cell.colspan);
                }
                if cell.rowspan > 1 {
                    let _ = write!(out, " rowspan=\"{}\"", cell.rowspan);
                }
                let _ = write!(out, ">{}</{}>", html_escape(&cell.text), tag);
            }
            out.push_str("</tr>\n");
        }
    };
    out.push_str("<thead>\n");
    write_cells(out, &table.head, "th");
    out.push_str("</thead>\n<tbody>\n");
    write_cells(out, &table.body, "td");
    out.push_str("</tbody>\n</table>\n");
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
