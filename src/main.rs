//! xmlmaster CLI - flatten nested XML catalog feeds into tables.
//!
//! # Main Commands
//!
//! ```bash
//! xmlmaster analyze feed.xml                  # Discover repeating collections
//! xmlmaster analyze https://shop.example/feed.zip
//! xmlmaster convert feed.xml -o out.csv       # Flatten the largest collection
//! xmlmaster serve                             # Start HTTP server (port 3000)
//! ```
//!
//! `convert` can chain the structural operators:
//!
//! ```bash
//! xmlmaster convert feed.xml \
//!     --collection "shop > products > product (items: 120)" \
//!     --explode variants.variant \
//!     --extract photos \
//!     --columns code,variants.variant.size,photos_1 \
//!     -o out.csv
//! ```

use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};

use xmlmaster::{acquire, export, Session};

/// Default HTTP port, overridable via `XMLMASTER_PORT`.
const DEFAULT_PORT: u16 = 3000;

#[derive(Parser)]
#[command(name = "xmlmaster")]
#[command(about = "Flatten nested XML catalog feeds into spreadsheet-ready tables", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a document and list its repeating collections
    Analyze {
        /// Input file path or http(s) URL
        input: String,
    },

    /// Full pipeline: analyze, flatten, apply operators, export CSV
    Convert {
        /// Input file path or http(s) URL
        input: String,

        /// Collection label to load (default: the largest one)
        #[arg(short, long)]
        collection: Option<String>,

        /// Explode a nested column into rows (repeatable, in order)
        #[arg(long = "explode", value_name = "COLUMN")]
        explode: Vec<String>,

        /// Extract URLs from a column into numbered columns (repeatable)
        #[arg(long = "extract", value_name = "COLUMN")]
        extract: Vec<String>,

        /// Columns to export, comma separated (default: all)
        #[arg(long, value_delimiter = ',')]
        columns: Option<Vec<String>>,

        /// Only export suggested catalog columns (EAN, price, stock, ...)
        #[arg(long)]
        suggested: bool,

        /// Case-insensitive search filter applied before export
        #[arg(long)]
        query: Option<String>,

        /// Restrict the search filter to one column
        #[arg(long)]
        search_column: Option<String>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Start HTTP server
    Serve {
        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Analyze { input } => cmd_analyze(&input).await,

        Commands::Convert {
            input,
            collection,
            explode,
            extract,
            columns,
            suggested,
            query,
            search_column,
            output,
        } => {
            cmd_convert(
                &input,
                collection.as_deref(),
                &explode,
                &extract,
                columns,
                suggested,
                query.as_deref(),
                search_column.as_deref(),
                output.as_deref(),
            )
            .await
        }

        Commands::Serve { port } => cmd_serve(port).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Read the input from a URL or the filesystem.
async fn read_input(input: &str) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    if input.starts_with("http://") || input.starts_with("https://") {
        eprintln!("Downloading: {}", input);
        Ok(acquire::fetch_url(input).await?)
    } else {
        Ok(fs::read(input)?)
    }
}

async fn cmd_analyze(input: &str) -> Result<(), Box<dyn std::error::Error>> {
    let bytes = read_input(input).await?;

    let mut session = Session::new();
    let count = session.analyze(&bytes, input)?;

    eprintln!("\nFound {} repeating collections:\n", count);
    for info in session.collections() {
        println!("  {}", info.label);
    }
    eprintln!("\nPick one with: xmlmaster convert {} --collection \"<label>\"", input);

    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn cmd_convert(
    input: &str,
    collection: Option<&str>,
    explode: &[String],
    extract: &[String],
    columns: Option<Vec<String>>,
    suggested: bool,
    query: Option<&str>,
    search_column: Option<&str>,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let bytes = read_input(input).await?;

    let mut session = Session::new();
    session.analyze(&bytes, input)?;

    let label = match collection {
        Some(label) => label.to_string(),
        None => {
            // Largest collection first; usually the product list.
            let top = session
                .collections()
                .into_iter()
                .next()
                .ok_or("No collections found")?;
            eprintln!("Using largest collection: {}", top.label);
            top.label
        }
    };
    session.select(&label)?;

    for column in explode {
        eprintln!("Exploding: {}", column);
        session.explode(column)?;
    }
    for column in extract {
        eprintln!("Extracting URLs: {}", column);
        session.extract_urls(column)?;
    }

    let table = session.table().ok_or("No table loaded")?;
    eprintln!(
        "Table: {} rows x {} columns",
        table.row_count(),
        table.columns.len()
    );

    let export_columns = match columns {
        Some(cols) => cols,
        None if suggested => export::suggest_columns(&table.columns),
        None => table.columns.clone(),
    };

    let view = match query {
        Some(q) => {
            let filtered = session.search(search_column, q)?;
            eprintln!(
                "Filter \"{}\": {} of {} rows",
                q,
                filtered.row_count(),
                session.table().map(|t| t.row_count()).unwrap_or(0)
            );
            Some(filtered)
        }
        None => None,
    };

    let artifact = session.export(&export_columns, view.as_ref())?;

    match output {
        Some(path) => {
            fs::write(path, &artifact)?;
            eprintln!("Output written to: {}", path.display());
        }
        None => {
            print!("{}", String::from_utf8_lossy(&artifact));
        }
    }

    Ok(())
}

async fn cmd_serve(port: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let port = port
        .or_else(|| {
            std::env::var("XMLMASTER_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
        })
        .unwrap_or(DEFAULT_PORT);

    xmlmaster::server::start_server(port).await
}
