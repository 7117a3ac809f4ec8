//! Output renderers. The format is picked once at startup and used for every
//! record of the run.

use std::io::{self, Write};

use crate::record::ValidRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// One labelled line per field and a blank separator line.
    #[default]
    Text,
    /// A single `<tr>` row for an HTML table.
    Html,
}

impl OutputFormat {
    /// Writes `record` to `out`. Values are emitted verbatim; nothing is
    /// HTML-escaped.
    pub fn render<W: Write + ?Sized>(self, record: &ValidRecord, out: &mut W) -> io::Result<()> {
        match self {
            OutputFormat::Text => render_text(record, out),
            OutputFormat::Html => render_html(record, out),
        }
    }
}

fn render_text<W: Write + ?Sized>(record: &ValidRecord, out: &mut W) -> io::Result<()> {
    writeln!(out, "Link: {}", record.link())?;
    if let Some(title) = record.title() {
        writeln!(out, "Title: {title}")?;
    }
    writeln!(out, "Views: {}", record.views())?;
    writeln!(out, "Likes: {}", record.likes())?;
    writeln!(out, "Comments: {}", record.comments())?;
    writeln!(out)
}

fn render_html<W: Write + ?Sized>(record: &ValidRecord, out: &mut W) -> io::Result<()> {
    let text = record.title().unwrap_or(record.link());
    writeln!(
        out,
        "<tr><td><a href=\"{link}\">{text}</a></td><td>{views}</td><td>{likes}</td><td>{comments}</td></tr>",
        link = record.link(),
        views = record.views(),
        likes = record.likes(),
        comments = record.comments(),
    )
}
