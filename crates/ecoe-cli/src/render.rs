//! Table rendering for command output.

use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use ecoe_editor::{EditSession, RowState, StationNode};
use ecoe_model::{Qblock, Question};

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

/// One row per question node, grouped by qblock.
pub fn tree_table(session: &EditSession, root: &StationNode) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Qblock"),
        header_cell("Id"),
        header_cell("Order"),
        header_cell("Description"),
        header_cell("Reference"),
        header_cell("Type"),
        header_cell("Area"),
        header_cell("State"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    align_column(&mut table, 2, CellAlignment::Right);

    for qblock in &root.qblocks {
        if qblock.questions.is_empty() {
            table.add_row(vec![qblock_cell(qblock), Cell::new("(empty)").fg(Color::DarkGrey)]);
            continue;
        }
        for question in &qblock.questions {
            let state = session
                .question_cache()
                .get(question.id)
                .map(|record| record.state());
            table.add_row(vec![
                qblock_cell(qblock),
                Cell::new(question.id),
                Cell::new(optional(question.order)),
                Cell::new(&question.description),
                Cell::new(&question.reference),
                Cell::new(question.type_label().unwrap_or("-")),
                Cell::new(question.area.as_ref().map_or("-", |area| area.name.as_str())),
                state_cell(state),
            ]);
        }
    }
    table
}

/// Options of a question in display order.
pub fn options_table(session: &EditSession, question: &Question) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Id"),
        header_cell("Order"),
        header_cell("Label"),
        header_cell("Points"),
        header_cell("State"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 0, CellAlignment::Right);
    align_column(&mut table, 1, CellAlignment::Right);
    align_column(&mut table, 3, CellAlignment::Right);

    for option in &question.options {
        let state = session
            .option_cache()
            .get(option.id)
            .map(|record| record.state());
        table.add_row(vec![
            Cell::new(option.id),
            Cell::new(optional(option.order)),
            Cell::new(&option.label),
            Cell::new(optional(option.points)),
            state_cell(state),
        ]);
    }
    table
}

pub fn qblocks_table(qblocks: &[Qblock]) -> Table {
    let mut table = Table::new();
    table.set_header(vec![header_cell("Id"), header_cell("Order"), header_cell("Name")]);
    apply_table_style(&mut table);
    align_column(&mut table, 0, CellAlignment::Right);
    for qblock in qblocks {
        table.add_row(vec![
            Cell::new(qblock.id),
            Cell::new(optional(qblock.order)),
            Cell::new(&qblock.name),
        ]);
    }
    table
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn qblock_cell(qblock: &Qblock) -> Cell {
    Cell::new(format!("{} ({})", qblock.name, qblock.id))
        .fg(Color::Blue)
        .add_attribute(Attribute::Bold)
}

fn state_cell(state: Option<RowState>) -> Cell {
    match state {
        Some(RowState::Clean) | None => Cell::new(""),
        Some(RowState::Editing) => Cell::new("editing").fg(Color::Yellow),
        Some(RowState::Unsaved) => Cell::new("unsaved").fg(Color::Red),
    }
}

fn optional<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(|| "-".to_string(), |value| value.to_string())
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}
