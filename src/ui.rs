//! Terminal UI utilities.
//!
//! Box-drawn output sized to the terminal:
//!
//! - [`Table`] - column table with a header row (linking list, doctor report)
//! - [`Panel`] - titled block of lines (phase timings)
//!
//! ```text
//!   ┌─ build time ─────────────────────┐
//!   │ built all files in 0.412s        │
//!   │ linked all files in 0.087s       │
//!   └──────────────────────────────────┘
//! ```

use colored::*;
use std::cmp;

const MIN_COLUMN: usize = 8;

fn terminal_width() -> usize {
    let (_rows, cols) = console::Term::stdout().size();
    cols as usize
}

fn visible_len(s: &str) -> usize {
    console::measure_text_width(s)
}

fn fit(s: &str, width: usize) -> String {
    let clean: String = s
        .chars()
        .map(|c| match c {
            '\n' | '\r' | '\t' => ' ',
            _ => c,
        })
        .collect();
    let truncated = console::truncate_str(&clean, width, "...").to_string();
    let padding = width.saturating_sub(visible_len(&truncated));
    format!("{}{}", truncated, " ".repeat(padding))
}

pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: &[&str]) -> Self {
        Self {
            headers: headers.iter().map(|s| s.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    /// Rows with the wrong number of cells are ignored.
    pub fn add_row(&mut self, row: Vec<String>) {
        if row.len() == self.headers.len() {
            self.rows.push(row);
        }
    }

    /// Column widths, shrinking the widest column until the table fits.
    fn column_widths(&self, max_width: usize) -> Vec<usize> {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| visible_len(h)).collect();
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate() {
                widths[i] = cmp::max(widths[i], visible_len(cell));
            }
        }

        let overhead = 3 + 3 * self.headers.len();
        let available = max_width.saturating_sub(overhead);
        while widths.iter().sum::<usize>() > available {
            let Some((idx, &widest)) = widths.iter().enumerate().max_by_key(|(_, w)| **w) else {
                break;
            };
            if widest <= MIN_COLUMN {
                break;
            }
            widths[idx] -= 1;
        }
        widths
    }

    pub fn render(&self, max_width: usize) -> Vec<String> {
        if self.headers.is_empty() {
            return Vec::new();
        }
        let widths = self.column_widths(max_width);

        let sep = |left: &str, mid: &str, right: &str| -> String {
            let inner: Vec<String> = widths.iter().map(|w| "─".repeat(w + 2)).collect();
            format!("  {}{}{}", left, inner.join(mid), right)
        };
        let line = |cells: &[String], bold: bool| -> String {
            let inner: Vec<String> = cells
                .iter()
                .zip(&widths)
                .map(|(cell, w)| {
                    let text = fit(cell, *w);
                    if bold {
                        format!(" {} ", text.bold())
                    } else {
                        format!(" {} ", text)
                    }
                })
                .collect();
            format!("  │{}│", inner.join("│"))
        };

        let mut out = vec![sep("┌", "┬", "┐"), line(&self.headers, true)];
        out.push(sep("├", "┼", "┤"));
        out.extend(self.rows.iter().map(|row| line(row, false)));
        out.push(sep("└", "┴", "┘"));
        out
    }

    pub fn print(&self) {
        for line in self.render(terminal_width()) {
            println!("{}", line);
        }
    }
}

pub struct Panel {
    title: Option<String>,
    lines: Vec<String>,
    border: Color,
}

impl Panel {
    pub fn new(lines: Vec<String>) -> Self {
        Self {
            title: None,
            lines,
            border: Color::BrightBlack,
        }
    }

    pub fn title(mut self, title: &str) -> Self {
        self.title = Some(title.to_string());
        self
    }

    pub fn border(mut self, color: Color) -> Self {
        self.border = color;
        self
    }

    pub fn render(&self, max_width: usize) -> Vec<String> {
        let title_len = self.title.as_ref().map_or(0, |t| visible_len(t) + 3);
        let content = self
            .lines
            .iter()
            .map(|l| visible_len(l))
            .max()
            .unwrap_or(0)
            .max(title_len);
        let width = content.min(max_width.saturating_sub(6)).max(1);

        let top = match &self.title {
            Some(title) => {
                let label = console::truncate_str(title, width.saturating_sub(3), "...");
                let rest = (width + 2).saturating_sub(visible_len(&label) + 3);
                format!(
                    "  {}{} {}{}",
                    "┌─ ".color(self.border),
                    label.bold(),
                    "─".repeat(rest).color(self.border),
                    "┐".color(self.border)
                )
            }
            None => format!("  {}", format!("┌{}┐", "─".repeat(width + 2)).color(self.border)),
        };

        let mut out = vec![top];
        for line in &self.lines {
            out.push(format!(
                "  {} {} {}",
                "│".color(self.border),
                fit(line, width),
                "│".color(self.border)
            ));
        }
        out.push(format!(
            "  {}",
            format!("└{}┘", "─".repeat(width + 2)).color(self.border)
        ));
        out
    }

    pub fn print(&self) {
        for line in self.render(terminal_width()) {
            println!("{}", line);
        }
    }
}
