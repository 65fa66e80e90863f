use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use polars::prelude::{AnyValue, DataFrame};
use survey_cli::pipeline::{EncodeResult, RuleRow, ScoreResult, neutral_table};
use survey_common::any_to_string;

pub fn print_score_summary(result: &ScoreResult) {
    println!("Respondents: {}", result.table.height());
    if result.dropped > 0 {
        println!("Dropped: {}", result.dropped);
    }
    println!("{}", frame_table(&result.table, &result.key_column));
}

pub fn print_encode_summary(result: &EncodeResult) {
    println!("{}", rule_table(&result.rules));
    match &result.neutral_counts {
        Some(counts) => match neutral_table(counts) {
            Ok(frame) => {
                println!();
                println!("Neutral answers:");
                println!("{}", frame_table(&frame, "row"));
            }
            Err(error) => eprintln!("error: {error}"),
        },
        None => println!("No matched encoder defines a neutral code."),
    }
}

fn rule_table(rules: &[RuleRow]) -> Table {
    let mut table = Table::new();
    table.set_header(vec![header_cell("Column"), header_cell("Encoder")]);
    apply_table_style(&mut table);
    for row in rules {
        let encoder = match &row.encoder {
            Some(name) => Cell::new(name).fg(Color::Green),
            None => dim_cell("-"),
        };
        table.add_row(vec![Cell::new(&row.column), encoder]);
    }
    table
}

/// Renders a frame with the key column highlighted and numbers right-aligned.
fn frame_table(frame: &DataFrame, key_column: &str) -> Table {
    let mut table = Table::new();
    table.set_header(
        frame
            .get_column_names()
            .into_iter()
            .map(|name| header_cell(name.as_str())),
    );
    apply_table_style(&mut table);
    for (index, column) in frame.get_columns().iter().enumerate() {
        if column.dtype().is_primitive_numeric()
            && let Some(table_column) = table.column_mut(index)
        {
            table_column.set_cell_alignment(CellAlignment::Right);
        }
    }
    for row in 0..frame.height() {
        let cells: Vec<Cell> = frame
            .get_columns()
            .iter()
            .map(|column| {
                let value = column.get(row).unwrap_or(AnyValue::Null);
                if matches!(value, AnyValue::Null) {
                    return dim_cell("-");
                }
                let cell = Cell::new(any_to_string(value));
                if column.name().as_str() == key_column {
                    cell.fg(Color::Blue).add_attribute(Attribute::Bold)
                } else {
                    cell
                }
            })
            .collect();
        table.add_row(cells);
    }
    table
}

fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(160);
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
