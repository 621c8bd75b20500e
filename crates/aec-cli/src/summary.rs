use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use aec_model::{CellValue, FlatTable};
use aec_cli::pipeline::UnitSummary;

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(160);
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn dim_cell(label: &str) -> Cell {
    Cell::new(label).fg(Color::DarkGrey)
}

fn value_cell(value: &CellValue) -> Cell {
    match value {
        CellValue::Null => dim_cell("-"),
        CellValue::Int(i) => Cell::new(i).set_alignment(CellAlignment::Right),
        CellValue::Float(f) => Cell::new(format!("{f:.4}")).set_alignment(CellAlignment::Right),
        other => Cell::new(other),
    }
}

/// Print any flat table, one row per line.
pub fn print_flat_table(table: &FlatTable) {
    if table.is_empty() {
        println!("No rows.");
        return;
    }
    let mut out = Table::new();
    out.set_header(
        table
            .columns()
            .iter()
            .map(|column| header_cell(column))
            .collect::<Vec<_>>(),
    );
    apply_table_style(&mut out);
    for row in table.rows() {
        out.add_row(row.iter().map(value_cell).collect::<Vec<_>>());
    }
    println!("{out}");
}

pub fn print_units(units: &[UnitSummary]) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Unit"),
        header_cell("Category"),
        header_cell("Products"),
        header_cell("Estimated"),
    ]);
    apply_table_style(&mut table);
    for summary in units {
        table.add_row(vec![
            Cell::new(&summary.unit).add_attribute(Attribute::Bold),
            summary
                .category
                .map_or_else(|| dim_cell("-"), Cell::new),
            Cell::new(summary.products).set_alignment(CellAlignment::Right),
            Cell::new(summary.estimated)
                .fg(Color::Yellow)
                .set_alignment(CellAlignment::Right),
        ]);
    }
    println!("{table}");
}
