use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use myd_cli::artifacts::MappingDocument;
use myd_cli::pipeline::{IndexSourceReport, IndexTargetReport, MapReport};
use myd_model::{ColumnKind, MatchType};

pub fn print_source_report(report: &IndexSourceReport) {
    println!("Source: {}", report.source_file.display());
    println!("Sheet: {} (header row {})", report.sheet, report.header_row);
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Field"),
        header_cell("Kind"),
        header_cell("Nullable"),
        header_cell("Example"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 2, CellAlignment::Center);
    for field in &report.fields {
        table.add_row(vec![
            Cell::new(&field.field_name)
                .fg(Color::Blue)
                .add_attribute(Attribute::Bold),
            kind_cell(field.kind),
            if field.nullable {
                Cell::new("yes")
            } else {
                dim_cell("no")
            },
            if field.example.is_empty() {
                dim_cell("-")
            } else {
                Cell::new(&field.example)
            },
        ]);
    }
    println!("{table}");
    if report.written {
        println!("Wrote {}", report.output.display());
    } else {
        println!(
            "Kept existing {} (use --force to overwrite)",
            report.output.display()
        );
    }
}

pub fn print_target_report(report: &IndexTargetReport) {
    println!("Target: {}", report.target_file.display());
    println!(
        "Variant {}: {} of {} fields",
        report.variant_pattern,
        report.fields.len(),
        report.total_records
    );
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Transformer ID"),
        header_cell("Description"),
        header_cell("Type"),
        header_cell("Length"),
        header_cell("Mandatory"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 3, CellAlignment::Right);
    align_column(&mut table, 4, CellAlignment::Center);
    for field in &report.fields {
        table.add_row(vec![
            Cell::new(&field.transformer_id).fg(Color::Blue),
            Cell::new(&field.description),
            dim_cell(&field.data_type),
            Cell::new(&field.length),
            if field.is_mandatory() {
                Cell::new("yes").fg(Color::Yellow).add_attribute(Attribute::Bold)
            } else {
                dim_cell("-")
            },
        ]);
    }
    println!("{table}");
    println!("Wrote {}", report.output.display());
}

pub fn print_map_report(report: &MapReport) {
    let document = &report.document;
    let stats = &document.metadata.stats;
    println!(
        "Object: {} / {}",
        document.metadata.object, document.metadata.variant
    );
    if !document.metadata.fuzzy_enabled {
        println!("Fuzzy matching disabled");
    }

    let mut table = Table::new();
    table.set_header(vec![header_cell("Match type"), header_cell("Fields")]);
    apply_summary_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    for (match_type, count) in &stats.by_type {
        table.add_row(vec![match_type_cell(*match_type), Cell::new(count)]);
    }
    table.add_row(vec![dim_cell("skipped by rule"), dim_cell(stats.skipped)]);
    table.add_row(vec![
        Cell::new("TOTAL")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        Cell::new(stats.source_fields).add_attribute(Attribute::Bold),
    ]);
    println!("{table}");
    println!(
        "Coverage: {:.1}% ({} of {} source fields mapped)",
        stats.coverage_percent, stats.mapped, stats.source_fields
    );
    println!(
        "Targets: {} of {} unclaimed",
        stats.unmatched_targets, stats.target_fields
    );

    print_unmapped_table(document);
    if !document.audit_matches.is_empty() {
        println!("Audit: {} near-misses recorded", document.audit_matches.len());
    }
    println!("Wrote {}", report.output.display());
}

fn print_unmapped_table(document: &MappingDocument) {
    if document.unmapped_sources.is_empty() {
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![header_cell("Unmapped source"), header_cell("Suggestions")]);
    apply_table_style(&mut table);
    for entry in &document.unmapped_sources {
        let suggestions = if entry.suggestions.is_empty() {
            dim_cell("-")
        } else {
            Cell::new(
                entry
                    .suggestions
                    .iter()
                    .map(|suggestion| format!("{} ({})", suggestion.target, suggestion.explanation))
                    .collect::<Vec<_>>()
                    .join("\n"),
            )
        };
        table.add_row(vec![Cell::new(&entry.source).fg(Color::Yellow), suggestions]);
    }
    println!("{table}");
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(80);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn match_type_cell(match_type: MatchType) -> Cell {
    let color = match match_type {
        MatchType::Exact | MatchType::CentralManual => Color::Green,
        MatchType::Synonym | MatchType::Fuzzy => Color::Blue,
        MatchType::Audit => Color::Magenta,
        MatchType::CentralSkip => Color::DarkGrey,
        MatchType::None => Color::Yellow,
    };
    Cell::new(match_type.as_str()).fg(color)
}

fn kind_cell(kind: ColumnKind) -> Cell {
    let label = match kind {
        ColumnKind::Integer => "integer",
        ColumnKind::Floating => "floating",
        ColumnKind::Boolean => "boolean",
        ColumnKind::String => "string",
        ColumnKind::Mixed => "mixed",
        ColumnKind::Empty => return dim_cell("empty"),
    };
    Cell::new(label)
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
