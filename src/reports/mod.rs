use basisga::error::BgResult;
use basisga::optimizer::{ResultRecord, SearchOutcome};
use basisga::scorer::ScoreDetails;
use comfy_table::presets::ASCII_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

/// `<name>_hessian_<nrep>` inside `dir`.
pub fn result_stem(dir: &Path, name: &str, nrep: usize) -> PathBuf {
    dir.join(format!("{}_hessian_{}", name, nrep))
}

/// Opens the iteration log in append mode.
pub fn open_log(dir: &Path, name: &str, nrep: usize) -> BgResult<(File, PathBuf)> {
    fs::create_dir_all(dir)?;
    let path = result_stem(dir, name, nrep).with_extension("log");
    let file = OpenOptions::new().create(true).append(true).open(&path)?;
    Ok((file, path))
}

pub fn write_result(dir: &Path, record: &ResultRecord) -> BgResult<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = result_stem(dir, &record.pdf_name, record.nrep).with_extension("json");
    let json = serde_json::to_string_pretty(record)?;
    fs::write(&path, json)?;
    Ok(path)
}

pub fn print_basis_grid(title: &str, basis: &[usize]) {
    println!("\nBasis: {}", title);
    let mut table = Table::new();
    table.load_preset(ASCII_FULL);

    for chunk in basis.chunks(10) {
        let cells: Vec<Cell> = chunk
            .iter()
            .map(|id| Cell::new(id).set_alignment(CellAlignment::Right))
            .collect();
        table.add_row(cells);
    }
    println!("{}", table);
}

pub fn print_search_report(record: &ResultRecord, outcome: &SearchOutcome) {
    let mut table = Table::new();
    table
        .load_preset(ASCII_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("Run").add_attribute(Attribute::Bold),
        Cell::new("Value").add_attribute(Attribute::Bold),
    ]);

    let improved = match outcome.baseline_erf {
        Some(base) if outcome.best_erf < base => Color::Green,
        _ => Color::Yellow,
    };

    table.add_row(vec![Cell::new("Ensemble"), Cell::new(&record.pdf_name)]);
    table.add_row(vec![Cell::new("Basis size"), Cell::new(record.nrep)]);
    table.add_row(vec![
        Cell::new("Iterations"),
        Cell::new(format!("{} / {}", outcome.iterations, record.iterations)),
    ]);
    table.add_row(vec![Cell::new("Stopped by"), Cell::new(outcome.stop)]);
    table.add_row(vec![
        Cell::new("Baseline ERF"),
        Cell::new(
            outcome
                .baseline_erf
                .map(|e| format!("{:.6}", e))
                .unwrap_or_else(|| "-".into()),
        ),
    ]);
    table.add_row(vec![
        Cell::new("Final ERF").add_attribute(Attribute::Bold),
        Cell::new(format!("{:.6}", record.final_erf)).fg(improved),
    ]);
    table.add_row(vec![
        Cell::new("Accepted / Rejected / Degenerate"),
        Cell::new(format!(
            "{} / {} / {}",
            outcome.stats.accepted, outcome.stats.rejected, outcome.stats.degenerate
        )),
    ]);
    table.add_row(vec![Cell::new("Q"), Cell::new(record.q)]);
    table.add_row(vec![Cell::new("epsilon"), Cell::new(record.epsilon)]);

    println!("\n{}", table);
}

pub fn print_evaluation_report(name: &str, basis: &[usize], details: &ScoreDetails) {
    let mut table = Table::new();
    table
        .load_preset(ASCII_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("Flavor").add_attribute(Attribute::Bold),
        Cell::new("ERF").add_attribute(Attribute::Bold),
        Cell::new("Share").add_attribute(Attribute::Bold),
    ]);
    if let Some(col) = table.column_mut(1) {
        col.set_cell_alignment(CellAlignment::Right);
    }
    if let Some(col) = table.column_mut(2) {
        col.set_cell_alignment(CellAlignment::Right);
    }

    for (flavor, erf) in &details.per_flavor {
        let share = if details.erf > 0.0 {
            erf / details.erf * 100.0
        } else {
            0.0
        };
        table.add_row(vec![
            Cell::new(flavor),
            Cell::new(format!("{:.6}", erf)),
            Cell::new(format!("{:.1}%", share)),
        ]);
    }
    table.add_row(vec![
        Cell::new("TOTAL").add_attribute(Attribute::Bold),
        Cell::new(format!("{:.6}", details.erf)).add_attribute(Attribute::Bold),
        Cell::new(""),
    ]);

    println!("\n=== {} ===", name);
    println!("Basis: {:?}", basis);
    println!(
        "Valid points: {} ({} with zero prior std)",
        details.valid_points, details.zero_std_points
    );
    println!("{}", table);

    let spectrum: Vec<String> = details
        .eigenvalues
        .iter()
        .map(|l| format!("{:.4e}", l))
        .collect();
    println!("Eigenvalues: [{}]", spectrum.join(", "));
}
