//! Measurement pass: document tree → positioned paint primitives plus total
//! content height. Metrics are fixed estimates, so page geometry is a pure
//! function of the tree and the measurement never touches a real surface.

use crate::PageGeometry;
use greffe_render::{Color, DocumentTree, FieldRow, Node};

/// One paint primitive, positioned in capture-scale pixels, y growing down.
#[derive(Debug, Clone, PartialEq)]
pub enum Prim {
    Rect { x: f32, y: f32, w: f32, h: f32, color: Color },
    HLine { x: f32, y: f32, w: f32, color: Color },
    Text { x: f32, y: f32, size: f32, color: Color, text: String, bold: bool },
}

/// Measured document: primitives in paint order and the content height.
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    pub prims: Vec<Prim>,
    pub width_px: u32,
    pub content_height_px: u32,
}

const LABEL_COL_MM: f32 = 55.0;
const LINE_HEIGHT: f32 = 1.45;

/// Estimated advance width of one line, per-class character widths. Crude
/// but deterministic; the wrap point must not depend on the glyph backend.
pub(crate) fn text_width(text: &str, size: f32) -> f32 {
    text.chars()
        .map(|c| {
            let em = match c {
                ' ' | '\u{a0}' => 0.28,
                'i' | 'l' | 'j' | 't' | 'f' | 'I' | '.' | ',' | ':' | ';' | '!' | '\'' => 0.30,
                'm' | 'w' | 'M' | 'W' | '@' => 0.85,
                c if c.is_uppercase() => 0.66,
                c if c.is_ascii_digit() => 0.55,
                _ => 0.52,
            };
            em * size
        })
        .sum()
}

/// Greedy word wrap against the estimated advance. Overlong single words are
/// kept on their own line rather than split.
pub(crate) fn wrap(text: &str, size: f32, max_w: f32) -> Vec<String> {
    let mut lines = Vec::new();
    for para in text.split('\n') {
        let mut current = String::new();
        for word in para.split_whitespace() {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{current} {word}")
            };
            if text_width(&candidate, size) <= max_w || current.is_empty() {
                current = candidate;
            } else {
                lines.push(current);
                current = word.to_string();
            }
        }
        lines.push(current);
    }
    lines
}

struct Cursor<'a> {
    geo: &'a PageGeometry,
    y: f32,
    prims: Vec<Prim>,
}

impl<'a> Cursor<'a> {
    fn mm(&self, v: f32) -> f32 {
        v * self.geo.px_per_mm()
    }

    /// Font size in capture pixels for a size given in logical (1×) pixels.
    fn fs(&self, logical: f32) -> f32 {
        logical * self.geo.scale
    }

    fn left(&self) -> f32 {
        self.geo.margin_px()
    }

    fn content_w(&self) -> f32 {
        self.geo.content_width_px()
    }

    fn text_lines(&mut self, text: &str, size: f32, color: Color, x: f32, max_w: f32, bold: bool) {
        for line in wrap(text, size, max_w) {
            if !line.is_empty() {
                self.prims.push(Prim::Text {
                    x,
                    y: self.y,
                    size,
                    color,
                    text: line,
                    bold,
                });
            }
            self.y += size * LINE_HEIGHT;
        }
    }
}

/// Lays the whole tree out at the page's fixed content width. Height is
/// unconstrained; the content decides the total.
pub fn measure(tree: &DocumentTree, geo: &PageGeometry) -> Layout {
    let mut cur = Cursor {
        geo,
        y: geo.margin_px(),
        prims: Vec::new(),
    };

    for node in &tree.nodes {
        match node {
            Node::Banner { text, color } => banner(&mut cur, text, *color),
            Node::Header {
                title,
                subtitle,
                show_seal,
                reference,
                date,
            } => header(&mut cur, title, subtitle.as_deref(), *show_seal, reference, date),
            Node::Notice { text } => notice(&mut cur, text),
            Node::Identity { rows } => identity(&mut cur, rows),
            Node::FieldTable { title, rows } => field_table(&mut cur, title.as_deref(), rows),
            Node::Narrative { title, text } => narrative(&mut cur, title.as_deref(), text),
            Node::Signature {
                name,
                badge,
                specialty,
            } => signature(&mut cur, name, badge, specialty.as_deref()),
            Node::Footer { text } => footer(&mut cur, text),
            Node::Spacer { height_mm } => cur.y += cur.mm(*height_mm),
            Node::Placeholder => cur.y += cur.mm(2.0),
        }
    }

    let content_height_px = (cur.y + geo.margin_px()).ceil() as u32;
    Layout {
        prims: cur.prims,
        width_px: geo.width_px(),
        content_height_px,
    }
}

fn banner(cur: &mut Cursor, text: &str, color: Color) {
    let h = cur.mm(11.0);
    let size = cur.fs(12.0);
    cur.prims.push(Prim::Rect {
        x: cur.left(),
        y: cur.y,
        w: cur.content_w(),
        h,
        color,
    });
    let tw = text_width(text, size);
    cur.prims.push(Prim::Text {
        x: cur.left() + (cur.content_w() - tw) / 2.0,
        y: cur.y + (h - size) / 2.0,
        size,
        color: Color::PAPER,
        text: text.to_string(),
        bold: true,
    });
    cur.y += h + cur.mm(3.0);
}

fn header(
    cur: &mut Cursor,
    title: &str,
    subtitle: Option<&str>,
    show_seal: bool,
    reference: &str,
    date: &str,
) {
    let seal_w = if show_seal { cur.mm(18.0) } else { 0.0 };
    if show_seal {
        // Seal placeholder; the institutional asset is stamped downstream.
        cur.prims.push(Prim::Rect {
            x: cur.left(),
            y: cur.y,
            w: cur.mm(16.0),
            h: cur.mm(16.0),
            color: Color::RULE,
        });
    }
    let x = cur.left() + seal_w;
    let max_w = cur.content_w() - seal_w;
    let top = cur.y;
    cur.text_lines(title, cur.fs(17.0), Color::INK, x, max_w, true);
    if let Some(sub) = subtitle {
        cur.text_lines(sub, cur.fs(11.0), Color::MUTED, x, max_w, false);
    }
    let meta = format!("Réf. {reference} — {date}");
    cur.text_lines(&meta, cur.fs(9.0), Color::MUTED, x, max_w, false);
    // The seal may be taller than three text lines.
    cur.y = cur.y.max(top + if show_seal { cur.mm(17.0) } else { 0.0 });
    cur.prims.push(Prim::HLine {
        x: cur.left(),
        y: cur.y,
        w: cur.content_w(),
        color: Color::INK,
    });
    cur.y += cur.mm(5.0);
}

fn notice(cur: &mut Cursor, text: &str) {
    let size = cur.fs(10.0);
    let pad = cur.mm(4.0);
    let inner_w = cur.content_w() - 2.0 * pad;
    let lines = wrap(text, size, inner_w).len() as f32;
    let h = lines * size * LINE_HEIGHT + 2.0 * pad;
    cur.prims.push(Prim::Rect {
        x: cur.left(),
        y: cur.y,
        w: cur.content_w(),
        h,
        color: Color([243, 244, 246]),
    });
    let top = cur.y;
    cur.y += pad;
    cur.text_lines(text, size, Color::INK, cur.left() + pad, inner_w, false);
    cur.y = top + h + cur.mm(3.0);
}

fn identity(cur: &mut Cursor, rows: &[(String, String)]) {
    let size = cur.fs(10.0);
    let row_h = cur.mm(7.5);
    let h = row_h * rows.len() as f32;
    cur.prims.push(Prim::Rect {
        x: cur.left(),
        y: cur.y,
        w: cur.content_w(),
        h,
        color: Color([243, 244, 246]),
    });
    for (label, value) in rows {
        let baseline = cur.y + (row_h - size) / 2.0;
        cur.prims.push(Prim::Text {
            x: cur.left() + cur.mm(3.0),
            y: baseline,
            size,
            color: Color::MUTED,
            text: label.clone(),
            bold: true,
        });
        cur.prims.push(Prim::Text {
            x: cur.left() + cur.mm(LABEL_COL_MM),
            y: baseline,
            size,
            color: Color::INK,
            text: value.clone(),
            bold: false,
        });
        cur.y += row_h;
    }
    cur.y += cur.mm(3.0);
}

fn field_table(cur: &mut Cursor, title: Option<&str>, rows: &[FieldRow]) {
    if let Some(t) = title {
        cur.text_lines(t, cur.fs(11.5), Color::INK, cur.left(), cur.content_w(), true);
        cur.y += cur.mm(1.0);
    }
    let size = cur.fs(10.0);
    let label_w = cur.mm(LABEL_COL_MM);
    let value_x = cur.left() + label_w;
    let value_w = cur.content_w() - label_w;
    for row in rows {
        let value_lines = wrap(&row.value, size, value_w);
        let row_h = (value_lines.len() as f32 * size * LINE_HEIGHT + cur.mm(2.5))
            .max(cur.mm(7.0));
        let baseline = cur.y + cur.mm(1.25);
        cur.prims.push(Prim::Text {
            x: cur.left(),
            y: baseline,
            size,
            color: Color::MUTED,
            text: row.label.clone(),
            bold: false,
        });
        if row.redacted {
            // Masked values paint as an opaque bar; the marker text sits on
            // top so the mask survives a grayscale print.
            let bar_w = text_width(&row.value, size) + cur.mm(4.0);
            cur.prims.push(Prim::Rect {
                x: value_x - cur.mm(1.0),
                y: baseline - cur.mm(0.5),
                w: bar_w.min(value_w),
                h: size * LINE_HEIGHT,
                color: Color::INK,
            });
            cur.prims.push(Prim::Text {
                x: value_x + cur.mm(1.0),
                y: baseline,
                size,
                color: Color::PAPER,
                text: row.value.clone(),
                bold: true,
            });
            cur.y = baseline + size * LINE_HEIGHT;
            cur.y = cur.y.max(baseline - cur.mm(1.25) + row_h);
        } else {
            let mut y = baseline;
            for line in &value_lines {
                cur.prims.push(Prim::Text {
                    x: value_x,
                    y,
                    size,
                    color: Color::INK,
                    text: line.clone(),
                    bold: false,
                });
                y += size * LINE_HEIGHT;
            }
            cur.y += row_h;
        }
        cur.prims.push(Prim::HLine {
            x: cur.left(),
            y: cur.y - cur.mm(0.5),
            w: cur.content_w(),
            color: Color::RULE,
        });
    }
    cur.y += cur.mm(3.0);
}

fn narrative(cur: &mut Cursor, title: Option<&str>, text: &str) {
    if let Some(t) = title {
        cur.text_lines(t, cur.fs(11.5), Color::INK, cur.left(), cur.content_w(), true);
        cur.y += cur.mm(1.0);
    }
    cur.text_lines(text, cur.fs(10.5), Color::INK, cur.left(), cur.content_w(), false);
    cur.y += cur.mm(3.0);
}

fn signature(cur: &mut Cursor, name: &str, badge: &str, specialty: Option<&str>) {
    let line_w = cur.mm(60.0);
    let x = cur.left() + cur.content_w() - line_w;
    cur.y += cur.mm(10.0);
    cur.prims.push(Prim::HLine {
        x,
        y: cur.y,
        w: line_w,
        color: Color::INK,
    });
    cur.y += cur.mm(2.0);
    let stamp = match specialty {
        Some(s) => format!("{name} — {s}"),
        None => name.to_string(),
    };
    cur.text_lines(&stamp, cur.fs(10.0), Color::INK, x, line_w, true);
    cur.text_lines(&format!("Matricule {badge}"), cur.fs(9.0), Color::MUTED, x, line_w, false);
    cur.y += cur.mm(2.0);
}

fn footer(cur: &mut Cursor, text: &str) {
    cur.y += cur.mm(2.0);
    cur.prims.push(Prim::HLine {
        x: cur.left(),
        y: cur.y,
        w: cur.content_w(),
        color: Color::RULE,
    });
    cur.y += cur.mm(2.0);
    let size = cur.fs(8.5);
    let tw = text_width(text, size);
    cur.prims.push(Prim::Text {
        x: cur.left() + (cur.content_w() - tw) / 2.0,
        y: cur.y,
        size,
        color: Color::MUTED,
        text: text.to_string(),
        bold: false,
    });
    cur.y += size * LINE_HEIGHT;
}
