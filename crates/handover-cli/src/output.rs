use serde::Serialize;

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Left-aligned plain-text table; each column is as wide as its widest cell.
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: &[&str]) -> Self {
        Self {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    /// Cells beyond the header count are dropped; missing cells render empty.
    pub fn row(&mut self, cells: Vec<String>) -> &mut Self {
        self.rows.push(cells);
        self
    }

    fn widths(&self) -> Vec<usize> {
        self.headers
            .iter()
            .enumerate()
            .map(|(i, h)| {
                self.rows
                    .iter()
                    .filter_map(|r| r.get(i))
                    .map(String::len)
                    .fold(h.len(), usize::max)
            })
            .collect()
    }

    pub fn render(&self) -> String {
        let widths = self.widths();
        let line = |cells: &[String]| {
            let padded: Vec<String> = widths
                .iter()
                .enumerate()
                .map(|(i, &w)| {
                    let cell = cells.get(i).map(String::as_str).unwrap_or("");
                    format!("{cell:w$}")
                })
                .collect();
            padded.join("  ").trim_end().to_string()
        };

        let rule: Vec<String> = widths.iter().map(|&w| "-".repeat(w)).collect();
        let mut out = vec![line(&self.headers), rule.join("  ")];
        out.extend(self.rows.iter().map(|r| line(r)));
        out.join("\n")
    }

    pub fn print(&self) {
        println!("{}", self.render());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn columns_fit_widest_cell() {
        let mut table = Table::new(&["FLAG", "VALUE"]);
        table
            .row(vec!["block_handover_to_secondary_bot".into(), "true".into()])
            .row(vec!["lock".into(), "unset".into()]);
        let rendered = table.render();
        let lines: Vec<_> = rendered.lines().collect();
        assert_eq!(lines[0], format!("{:31}  VALUE", "FLAG"));
        assert_eq!(lines[1], format!("{}  {}", "-".repeat(31), "-".repeat(5)));
        assert_eq!(lines[2], "block_handover_to_secondary_bot  true");
        assert_eq!(lines[3], format!("{:31}  unset", "lock"));
    }

    #[test]
    fn short_rows_render_without_trailing_space() {
        let mut table = Table::new(&["A", "B"]);
        table.row(vec!["x".into()]);
        assert_eq!(table.render().lines().last(), Some("x"));
    }
}
