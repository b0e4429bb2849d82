use std::io::IsTerminal;

use comfy_table::{presets::NOTHING, Attribute, Cell, Table};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct CliTableTheme {
    pub use_color: bool,
}

impl CliTableTheme {
    pub(crate) fn detect() -> Self {
        let is_tty = std::io::stdout().is_terminal();
        let no_color = std::env::var_os("NO_COLOR").is_some();
        resolve_table_theme(is_tty, no_color)
    }

    pub(crate) fn new_data_table(self, headers: &[&str]) -> Table {
        let mut table = Table::new();
        table.load_preset(NOTHING);
        table.set_header(headers.iter().map(|h| self.bold_cell(h)).collect::<Vec<_>>());
        table
    }

    pub(crate) fn new_kv_table(self) -> Table {
        let mut table = Table::new();
        table.load_preset(NOTHING);
        table
    }

    fn bold_cell(self, text: &str) -> Cell {
        let cell = Cell::new(text);
        if self.use_color {
            cell.add_attribute(Attribute::Bold)
        } else {
            cell
        }
    }
}

fn resolve_table_theme(is_tty: bool, no_color: bool) -> CliTableTheme {
    CliTableTheme {
        use_color: is_tty && !no_color,
    }
}

pub(crate) fn add_kv_row(
    table: &mut Table,
    theme: CliTableTheme,
    field: &str,
    value: impl ToString,
) {
    table.add_row(vec![theme.bold_cell(field), Cell::new(value.to_string())]);
}

#[cfg(test)]
mod tests {
    use comfy_table::presets::NOTHING;

    use super::resolve_table_theme;

    #[test]
    fn color_only_on_a_terminal_without_no_color() {
        assert!(resolve_table_theme(true, false).use_color);
        assert!(!resolve_table_theme(true, true).use_color);
        assert!(!resolve_table_theme(false, false).use_color);
    }

    #[test]
    fn tables_use_nothing_preset() {
        let theme = resolve_table_theme(false, false);
        let mut data = theme.new_data_table(&["A", "B"]);
        assert_eq!(data.current_style_as_preset(), NOTHING);
        let mut kv = theme.new_kv_table();
        kv.add_row(vec!["key", "value"]);
        assert_eq!(kv.current_style_as_preset(), NOTHING);
    }
}
