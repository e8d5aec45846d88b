//! Table and CSV output

use anyhow::{Context, Result};
use std::io::Write;
use unicode_width::UnicodeWidthStr;

/// A record that can be rendered as one row under a fixed header
pub trait Printable {
    fn header() -> Vec<&'static str>;
    fn row(&self) -> Vec<String>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Table,
    Csv,
}

pub fn print<P: Printable, W: Write>(out: &mut W, items: &[P], format: OutputFormat) -> Result<()> {
    if items.is_empty() {
        writeln!(out, "No data to display")?;
        return Ok(());
    }

    let header: Vec<String> = P::header().into_iter().map(String::from).collect();
    let rows: Vec<Vec<String>> = items.iter().map(Printable::row).collect();

    match format {
        OutputFormat::Table => render_table(out, &header, &rows),
        OutputFormat::Csv => render_csv(out, &header, &rows),
    }
}

fn render_table<W: Write>(out: &mut W, header: &[String], rows: &[Vec<String>]) -> Result<()> {
    let mut widths: Vec<usize> = header.iter().map(|h| h.width()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(width) = widths.get_mut(i) {
                *width = (*width).max(cell.width());
            }
        }
    }

    let separator = widths
        .iter()
        .map(|w| "-".repeat(w + 2))
        .collect::<Vec<_>>()
        .join("+");
    let separator = format!("+{}+", separator);

    writeln!(out, "{}", separator)?;
    write_table_row(out, header, &widths)?;
    writeln!(out, "{}", separator)?;
    for row in rows {
        write_table_row(out, row, &widths)?;
    }
    writeln!(out, "{}", separator)?;

    Ok(())
}

fn write_table_row<W: Write>(out: &mut W, cells: &[String], widths: &[usize]) -> Result<()> {
    let mut line = String::from("|");
    for (i, width) in widths.iter().enumerate() {
        let cell = cells.get(i).map(String::as_str).unwrap_or("");
        // Pad by display width, not byte length
        let padding = width.saturating_sub(cell.width());
        line.push(' ');
        line.push_str(cell);
        line.push_str(&" ".repeat(padding));
        line.push_str(" |");
    }
    writeln!(out, "{}", line)?;
    Ok(())
}

fn render_csv<W: Write>(out: &mut W, header: &[String], rows: &[Vec<String>]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(header).context("Failed to write CSV header")?;
    for row in rows {
        writer.write_record(row).context("Failed to write CSV row")?;
    }
    writer.flush().context("Failed to flush CSV output")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Room {
        name: &'static str,
        members: u32,
    }

    impl Printable for Room {
        fn header() -> Vec<&'static str> {
            vec!["Name", "Members"]
        }

        fn row(&self) -> Vec<String> {
            vec![self.name.to_string(), self.members.to_string()]
        }
    }

    fn render(items: &[Room], format: OutputFormat) -> String {
        let mut out = Vec::new();
        print(&mut out, items, format).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_empty_prints_placeholder() {
        assert_eq!(render(&[], OutputFormat::Table), "No data to display\n");
        assert_eq!(render(&[], OutputFormat::Csv), "No data to display\n");
    }

    #[test]
    fn test_table_layout() {
        let rooms = [
            Room { name: "Lobby", members: 12 },
            Room { name: "Ubuntu Community", members: 1500 },
        ];

        let expected = "\
+------------------+---------+
| Name             | Members |
+------------------+---------+
| Lobby            | 12      |
| Ubuntu Community | 1500    |
+------------------+---------+
";
        assert_eq!(render(&rooms, OutputFormat::Table), expected);
    }

    #[test]
    fn test_table_pads_by_display_width() {
        let rooms = [Room { name: "日本", members: 1 }, Room { name: "abcd", members: 2 }];
        let table = render(&rooms, OutputFormat::Table);
        assert!(table.contains("| 日本 | 1       |"));
        assert!(table.contains("| abcd | 2       |"));
    }

    #[test]
    fn test_csv_quotes_commas() {
        let rooms = [Room { name: "a,b", members: 3 }];
        assert_eq!(render(&rooms, OutputFormat::Csv), "Name,Members\n\"a,b\",3\n");
    }
}
