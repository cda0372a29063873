//! Tessera CLI - Build, inspect and repair tables in saved documents

use anyhow::{bail, Context, Result};
use tessera_core::{Document, NodeId, NodeType};
use tessera_delta::{load_document, save_document};
use tessera_editor::{TableCommand, TableModule};
use tessera_table::{cell, colgroup, row, table, Grid, TableConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("tessera=info".parse()?))
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_help();
        return Ok(());
    }

    let command = &args[1];

    match command.as_str() {
        "help" | "--help" | "-h" => print_help(),
        "new" => {
            if args.len() < 4 {
                eprintln!("Usage: tessera-cli new <rows> <cols> [--full] [<out>]");
                return Ok(());
            }
            new_table(&args[2], &args[3], &args[4..]).await?;
        }
        "show" => {
            if args.len() < 3 {
                eprintln!("Usage: tessera-cli show <file>");
                return Ok(());
            }
            let doc = load_document(&args[2]).await?;
            show(&doc)?;
        }
        "repair" => {
            if args.len() < 3 {
                eprintln!("Usage: tessera-cli repair <file>");
                return Ok(());
            }
            repair(&args[2]).await?;
        }
        "edit" => {
            if args.len() < 6 {
                eprintln!("Usage: tessera-cli edit <file> <command> <row> <col> [<row> <col>] [<color>]");
                return Ok(());
            }
            edit(&args[2], &args[3], &args[4..]).await?;
        }
        "demo" => demo()?,
        _ => {
            eprintln!("Unknown command: {}", command);
            print_help();
        }
    }

    Ok(())
}

fn print_help() {
    println!(
        r##"Tessera CLI - Merged-cell tables for rich-text documents

USAGE:
    tessera-cli <COMMAND> [OPTIONS]

COMMANDS:
    help            Show this help message
    new             Create a document holding one empty table
    show            Print the tables of a document and any grid violations
    repair          Rebalance every table of a document in place
    edit            Run a table menu command on a block of cells
    demo            Walk through merging, inserting and repairing in memory

COMMAND KEYS FOR edit:
    insertColumnLeft insertColumnRight insertRowTop insertRowBottom
    removeCol removeRow removeTable mergeCell splitCell
    setBackgroundColor clearBackgroundColor setBorderColor clearBorderColor

ENVIRONMENT:
    TESSERA_CONFIG  JSON file with table settings (fullWidth, surfaceWidth, ...)

EXAMPLES:
    tessera-cli new 3 4 --full table.json
    tessera-cli edit table.json mergeCell 0 0 1 1
    tessera-cli edit table.json setBackgroundColor 2 2 "#ffe"
    tessera-cli show table.json
    tessera-cli repair table.json
"##
    );
}

fn load_config() -> Result<TableConfig> {
    match std::env::var("TESSERA_CONFIG") {
        Ok(path) => TableConfig::load(&path).with_context(|| format!("Failed to load config {}", path)),
        Err(_) => Ok(TableConfig::default()),
    }
}

async fn new_table(rows: &str, columns: &str, rest: &[String]) -> Result<()> {
    let rows: usize = rows.parse().context("Rows must be a number")?;
    let columns: usize = columns.parse().context("Columns must be a number")?;
    let mut config = load_config()?;
    let mut out = "table.json".to_string();
    for arg in rest {
        match arg.as_str() {
            "--full" => config.full_width = true,
            path => out = path.to_string(),
        }
    }

    let mut module = TableModule::new(config);
    let mut doc = Document::default();
    module.insert_table(&mut doc, 0, rows, columns)?;
    save_document(&doc, &out).await?;
    println!("Created {}x{} table in {}", rows, columns, out);
    Ok(())
}

async fn repair(path: &str) -> Result<()> {
    let mut doc = load_document(path).await?;
    let report = tessera_table::rebalance_all(&mut doc)?;
    if report.is_noop() {
        println!("Every table is consistent");
        return Ok(());
    }
    save_document(&doc, path).await?;
    println!("Repaired {}: {:?}", path, report);
    Ok(())
}

/// The distinct cells covering a grid block of the first table, in document order
fn block(doc: &Document, first: (usize, usize), last: (usize, usize)) -> Result<Vec<NodeId>> {
    let Some(owner) = table::all_tables(doc)?.first().copied() else {
        bail!("The document holds no table");
    };
    let grid = Grid::build(doc, owner)?;
    let (top, bottom) = (first.0.min(last.0), first.0.max(last.0));
    let (left, right) = (first.1.min(last.1), first.1.max(last.1));
    let mut covered = Vec::new();
    for r in top..=bottom {
        for c in left..=right {
            match grid.cell_at(r, c) {
                Some(found) => covered.push(found),
                None => bail!("No cell at row {} column {}", r, c),
            }
        }
    }
    Ok(table::cells(doc, owner)?
        .into_iter()
        .filter(|current| covered.contains(current))
        .collect())
}

async fn edit(path: &str, key: &str, rest: &[String]) -> Result<()> {
    let mut numbers = Vec::new();
    let mut color = None;
    for arg in rest {
        match arg.parse::<usize>() {
            Ok(n) => numbers.push(n),
            Err(_) => color = Some(arg.as_str()),
        }
    }
    let (first, last) = match numbers.as_slice() {
        [r, c] => ((*r, *c), (*r, *c)),
        [r1, c1, r2, c2] => ((*r1, *c1), (*r2, *c2)),
        _ => bail!("Expected <row> <col> or <row> <col> <row> <col>"),
    };
    let Some(command) = TableCommand::from_menu_key(key, color) else {
        bail!("Unknown or incomplete command: {}", key);
    };

    let mut doc = load_document(path).await?;
    let mut module = TableModule::new(load_config()?);
    module.select_cells(block(&doc, first, last)?);
    module.execute(&mut doc, &command)?;
    save_document(&doc, path).await?;
    info!("Applied {} to {}", key, path);
    show(&doc)
}

fn cell_text(doc: &Document, current: NodeId) -> Result<String> {
    let Some(inner) = cell::inner(doc, current)? else {
        return Ok(String::new());
    };
    let mut lines = Vec::new();
    for line in doc.children_of_type(inner, NodeType::Paragraph)? {
        lines.push(doc.kind(line)?.text().unwrap_or_default().to_string());
    }
    Ok(lines.join("/"))
}

fn show(doc: &Document) -> Result<()> {
    let tables = table::all_tables(doc)?;
    if tables.is_empty() {
        println!("No tables");
        return Ok(());
    }
    for (index, owner) in tables.into_iter().enumerate() {
        let id = table::table_id(doc, owner)?;
        let unit = if table::is_full(doc, owner)? { "%" } else { "px" };
        let widths: Vec<String> = table::cols(doc, owner)?
            .into_iter()
            .map(|col| colgroup::width(doc, col).map(|w| format!("{:.2}{}", w, unit)))
            .collect::<tessera_table::Result<_>>()?;
        println!("Table {} ({}): columns [{}]", index, id, widths.join(", "));

        for (r, current_row) in table::rows(doc, owner)?.into_iter().enumerate() {
            let mut cells = Vec::new();
            for current in row::cells(doc, current_row)? {
                let attrs = cell::attrs(doc, current)?;
                let mut label = format!("{}x{}", attrs.rowspan, attrs.colspan);
                let text = cell_text(doc, current)?;
                if !text.is_empty() {
                    label.push(' ');
                    label.push_str(&text);
                }
                if !attrs.style.is_empty() {
                    label.push_str(&format!(" {{{}}}", attrs.style));
                }
                cells.push(format!("[{}]", label));
            }
            println!("  row {}: {}", r, cells.join(" "));
        }

        let grid = Grid::build(doc, owner)?;
        if grid.is_rectangular() {
            println!("  grid {}x{} ok", grid.rows(), grid.cols());
        } else {
            for violation in grid.violations() {
                println!("  violation: {:?}", violation);
            }
        }
    }
    Ok(())
}

fn demo() -> Result<()> {
    let mut module = TableModule::new(TableConfig {
        full_width: true,
        ..load_config()?
    });
    let mut doc = Document::default();
    let owner = module.insert_table(&mut doc, 0, 3, 3)?.table;
    println!("== Inserted 3x3 full-width table");
    show(&doc)?;

    module.select_cells(block(&doc, (0, 0), (1, 1))?);
    module.execute(&mut doc, &TableCommand::MergeCells)?;
    println!("== Merged the top-left 2x2 block");
    show(&doc)?;

    module.select_cells(block(&doc, (0, 0), (0, 0))?);
    module.execute(&mut doc, &TableCommand::InsertColumnRight)?;
    println!("== Inserted a column right of the merged cell");
    show(&doc)?;

    let victim = Grid::build(&doc, owner)?
        .cell_at(2, 1)
        .context("Expected a cell at row 2 column 1")?;
    doc.remove(victim)?;
    println!("== Deleted a cell behind the engine's back");
    show(&doc)?;

    let report = tessera_table::rebalance(&mut doc, owner)?;
    println!("== Rebalanced: {:?}", report);
    show(&doc)
}
