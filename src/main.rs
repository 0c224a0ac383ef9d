use clap::Parser;
use erdscope::cache::CatalogCache;
use erdscope::config::{ExplorerConfig, IDENTIFIER_TYPE_ENV};
use erdscope::dot::Dot;
use erdscope::ir::{GraphIR, RankDir};
use erdscope::panel::{relationship_panels, side_by_side};
use erdscope::resolver::{FilterMode, Outcome, Prompt, Selections};
use erdscope::Explorer;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Infer table relationships from a schema CSV and explore the join graph
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Schema CSV with Table, Column and Data Type columns
    input: PathBuf,

    /// Filter mode: none, table or column
    #[arg(short, long, default_value = "none")]
    mode: FilterMode,

    /// Selected table (table mode) or first table containing the column (column mode)
    #[arg(short, long)]
    table: Option<String>,

    /// Identifier column to filter by (column mode)
    #[arg(short, long)]
    column: Option<String>,

    /// Second table to join
    #[arg(short, long)]
    second_table: Option<String>,

    /// Relationship key, e.g. "Orders (CustomerID) -> Customers (CustomerID)"
    #[arg(short, long)]
    relationship: Option<String>,

    /// Data type marking foreign-key candidate columns [default: uniqueidentifier]
    #[arg(long, env = IDENTIFIER_TYPE_ENV)]
    id_type: Option<String>,

    /// Lay graphs out top to bottom instead of left to right
    #[arg(long)]
    vertical: bool,

    /// Write the relationship graph DOT here (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Write the joinable-tables graph DOT here
    #[arg(long)]
    joinable_output: Option<PathBuf>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = ExplorerConfig::default().with_override(cli.id_type.as_deref());
    let direction = if cli.vertical {
        RankDir::TopBottom
    } else {
        RankDir::LeftRight
    };
    debug!(identifier_type = %config.identifier_type, "configuration");

    let mut cache = CatalogCache::new();
    let catalog = match cache.get_or_load_file(&cli.input) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load {}: {}", cli.input.display(), e);
            process::exit(1);
        }
    };

    let explorer = Explorer::new(catalog, &config);
    info!(
        tables = catalog.distinct_tables().len(),
        relationships = explorer.index().set().len(),
        "schema ready"
    );

    let selections = Selections {
        mode: cli.mode,
        table: cli.table,
        column: cli.column,
        second_table: cli.second_table,
        relationship: cli.relationship,
    };

    let resolution = match explorer.resolve(&selections) {
        Ok(Outcome::Resolved(r)) => r,
        Ok(Outcome::Pending(prompt)) => {
            print_prompt(&prompt);
            return;
        }
        Err(e) => match e.as_empty_prompt() {
            Some(prompt) => {
                info!("{}", e);
                print_prompt(&prompt);
                return;
            }
            None => {
                eprintln!("Error: {}", e);
                process::exit(1);
            }
        },
    };

    let rel = &resolution.relationship;
    let (from, to) = relationship_panels(catalog, rel);
    let summary = format!(
        "Relationship: {} ({}) → {} ({})\n\n{}",
        rel.from_table,
        rel.from_column,
        rel.to_table,
        rel.to_column,
        side_by_side(&from, &to, 4)
    );

    let graph = explorer.relationship_graph(&resolution).with_direction(direction);
    let relationship_dot = render(graph, "relationship");

    match &cli.output {
        Some(path) => {
            print!("{}", summary);
            write_or_exit(path, &relationship_dot);
        }
        // Keep stdout pipeable into graphviz when no file is given.
        None => {
            eprint!("{}", summary);
            print!("{}", relationship_dot);
        }
    }

    if let Some(path) = &cli.joinable_output {
        match explorer.joinable_graph(&resolution) {
            Some(ir) => write_or_exit(path, &render(ir.with_direction(direction), "joinable")),
            None => info!("no joinable-tables graph for this selection"),
        }
    }
}

fn print_prompt(prompt: &Prompt) {
    println!("{}:", prompt.step);
    for choice in &prompt.choices {
        println!("  {}", choice);
    }
}

fn render(ir: GraphIR, name: &str) -> String {
    Dot::named(&ir, name).to_string()
}

fn write_or_exit(path: &Path, contents: &str) {
    if let Err(e) = fs::write(path, contents) {
        eprintln!("Failed to write {}: {}", path.display(), e);
        process::exit(1);
    }
}
