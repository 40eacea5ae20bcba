//! Terminal rendering of source excerpts with a highlighted span.
//!
//! Produces a gutter-prefixed block of source lines around a location
//! range, with the offending columns highlighted, a caret line under the
//! span, and optional filename/title headers. Long lines are shortened
//! with an ellipsis, but never so far that the highlighted region itself
//! disappears.

use console::Style;

use crate::parsers::LocationRange;

/// Rendering options for [`codespan`].
#[derive(Debug, Clone)]
pub struct Options<'a> {
    /// Emit ANSI styles.
    pub colors: bool,
    /// Render a `--> file:line:col` header line.
    pub filename: Option<&'a str>,
    /// Context lines shown above the span.
    pub lines_above: usize,
    /// Context lines shown below the span.
    pub lines_below: usize,
    /// Maximum rendered line width including the gutter.
    pub max_line_width: usize,
    /// Message appended after the caret run.
    pub message: Option<&'a str>,
    /// Title line rendered under the header.
    pub title: Option<&'a str>,
}

impl Default for Options<'_> {
    fn default() -> Self {
        Self {
            colors: false,
            filename: None,
            lines_above: 3,
            lines_below: 3,
            max_line_width: 80,
            message: None,
            title: None,
        }
    }
}

struct Palette {
    gutter: Style,
    header: Style,
    title: Style,
    dim: Style,
    highlight: Style,
}

impl Palette {
    fn new(colors: bool) -> Self {
        if colors {
            Self {
                gutter: Style::new().blue().force_styling(true),
                header: Style::new().red().bold().force_styling(true),
                title: Style::new().cyan().force_styling(true),
                dim: Style::new().dim().force_styling(true),
                highlight: Style::new().red().bold().force_styling(true),
            }
        } else {
            Self {
                gutter: Style::new(),
                header: Style::new(),
                title: Style::new(),
                dim: Style::new(),
                highlight: Style::new(),
            }
        }
    }
}

/// Renders a multi-line excerpt of `lines` highlighting `location`.
///
/// The caller must already have handled the no-location case; this
/// renderer requires a concrete range. Columns are 1-based and counted in
/// characters, matching the locator's ranges.
#[must_use]
pub fn codespan(lines: &[String], location: LocationRange, opts: &Options<'_>) -> String {
    let start = location.start;
    let end = location.end;
    let palette = Palette::new(opts.colors);

    let left_padding = end.line.to_string().len().max(3);
    let max_line_width = opts.max_line_width.saturating_sub(left_padding + 3);

    let mut out: Vec<String> = Vec::new();

    if let Some(filename) = opts.filename {
        let header = format!("--> {filename}:{}:{}", start.line, start.col);
        out.push(palette.header.apply_to(header).to_string());
    }
    if let Some(title) = opts.title {
        out.push(format!("    {}", palette.title.apply_to(title)));
        out.push(String::new());
    }

    let first_line = start.line.saturating_sub(opts.lines_above).max(1);
    let last_line = end.line.saturating_add(opts.lines_below).min(lines.len());

    for lno in first_line..=last_line {
        let Some(raw) = lines.get(lno.saturating_sub(1)) else {
            break;
        };

        if lno >= start.line && lno <= end.line {
            let col_start = if lno == start.line {
                start.col.saturating_sub(1)
            } else {
                0
            };
            let col_end = (lno == end.line).then(|| end.col.saturating_sub(1));

            let mut line = raw.clone();
            if max_line_width > 0 {
                if let Some(keep_until) = col_end.filter(|&col| col > 0) {
                    line = ellipsis(&line, max_line_width.max(keep_until + 4));
                }
            }
            let highlighted = highlight_range(&line, col_start, col_end, &palette.highlight);
            out.push(format!("{}{highlighted}", gutter(&palette, left_padding, Some(lno))));
        } else {
            let dimmed = palette.dim.apply_to(ellipsis(raw, max_line_width));
            out.push(format!("{}{dimmed}", gutter(&palette, left_padding, None)));
        }

        if lno == end.line {
            let carets = "^".repeat(end.col.saturating_sub(start.col).max(1));
            let marker = match opts.message {
                Some(message) if !message.is_empty() => format!("{carets} {message}"),
                _ => carets,
            };
            let indent = " ".repeat(start.col.saturating_sub(1));
            out.push(format!(
                "{}{indent}{}",
                gutter(&palette, left_padding, None),
                palette.highlight.apply_to(marker)
            ));
        }
    }

    out.join("\n")
}

fn gutter(palette: &Palette, width: usize, lno: Option<usize>) -> String {
    let label = lno.map(|n| n.to_string()).unwrap_or_default();
    palette
        .gutter
        .apply_to(format!("{label:>width$} | "))
        .to_string()
}

/// Shortens `text` to at most `max_chars` characters, ellipsizing.
fn ellipsis(text: &str, max_chars: usize) -> String {
    if max_chars > 0 && text.chars().count() > max_chars {
        let mut shortened: String = text.chars().take(max_chars.saturating_sub(3)).collect();
        shortened.push_str("...");
        shortened
    } else {
        text.to_owned()
    }
}

/// Applies `style` to the character range `[start, end)` of `text`; `None`
/// for `end` means to the end of the line.
fn highlight_range(text: &str, start: usize, end: Option<usize>, style: &Style) -> String {
    let chars: Vec<char> = text.chars().collect();
    let from = start.min(chars.len());
    let to = end.map_or(chars.len(), |col| col.min(chars.len())).max(from);

    let before: String = chars.iter().take(from).collect();
    let middle: String = chars.iter().skip(from).take(to - from).collect();
    let after: String = chars.iter().skip(to).collect();
    if middle.is_empty() {
        return text.to_owned();
    }
    format!("{before}{}{after}", style.apply_to(middle))
}
