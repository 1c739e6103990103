//! CLI tool for dtview - runs a table through search/sort/paging and prints
//! the resulting frame as JSON
//!
//! Usage:
//!   dtview_cli <table.json|table.csv|table.tsv> [options]
//!
//! Options:
//!   --search Q        Search query
//!   --full-match      AND-combined substring search
//!   --sort COL:DIR    Sort column (0-based) and direction (asc, desc or empty)
//!   --page N          Page to show
//!   --per-page N      Rows per page
//!   --config FILE     JSON table configuration
//!   --serve QUERY     Answer a reference-service query string instead
//!   -o FILE           Write JSON to FILE instead of stdout

#![allow(clippy::exit)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::indexing_slicing)]

use simplelog::{Config, LevelFilter, SimpleLogger};
use std::env;
use std::fs;
use std::io::{self, Write};

use dtview::csv::Delimiter;
use dtview::server::ReferenceService;
use dtview::{SortDirection, TableConfig, TableController, TableInput, TableSnapshot};

const USAGE: &str = "Usage: dtview_cli <table.json|table.csv> [--search Q] [--full-match] \
[--sort COL:DIR] [--page N] [--per-page N] [--config FILE] [--serve QUERY] [-o output.json]";

#[derive(Default)]
struct Options {
    input: String,
    search: Option<String>,
    full_match: bool,
    sort: Option<(usize, SortDirection)>,
    page: Option<usize>,
    per_page: Option<usize>,
    config: Option<String>,
    serve: Option<String>,
    output: Option<String>,
}

fn fail(message: &str) -> ! {
    eprintln!("{message}");
    std::process::exit(1);
}

fn parse_args(args: &[String]) -> Options {
    let mut options = Options::default();
    let mut iter = args.iter().skip(1);
    let value = |iter: &mut dyn Iterator<Item = &String>, flag: &str| -> String {
        iter.next()
            .cloned()
            .unwrap_or_else(|| fail(&format!("{flag} needs a value\n{USAGE}")))
    };
    let number = |text: String, flag: &str| -> usize {
        text.parse()
            .unwrap_or_else(|_| fail(&format!("{flag} expects a number, got {text:?}")))
    };

    while let Some(arg) = iter.next() {
        let flag = arg.as_str();
        match flag {
            "--search" => options.search = Some(value(&mut iter, flag)),
            "--full-match" => options.full_match = true,
            "--sort" => {
                let sort_arg = value(&mut iter, flag);
                let (column, direction) = sort_arg
                    .split_once(':')
                    .unwrap_or((sort_arg.as_str(), "asc"));
                let direction = SortDirection::parse(direction)
                    .unwrap_or_else(|| fail(&format!("unknown sort direction {direction:?}")));
                options.sort = Some((number(column.to_string(), flag), direction));
            }
            "--page" => options.page = Some(number(value(&mut iter, flag), flag)),
            "--per-page" => options.per_page = Some(number(value(&mut iter, flag), flag)),
            "--config" => options.config = Some(value(&mut iter, flag)),
            "--serve" => options.serve = Some(value(&mut iter, flag)),
            "-o" => options.output = Some(value(&mut iter, flag)),
            other if options.input.is_empty() && !other.starts_with('-') => {
                options.input = other.to_string();
            }
            other => fail(&format!("unexpected argument {other:?}\n{USAGE}")),
        }
    }

    if options.input.is_empty() {
        fail(USAGE);
    }
    options
}

fn is_delimited(path: &str) -> bool {
    let lower = path.to_ascii_lowercase();
    lower.ends_with(".csv") || lower.ends_with(".tsv")
}

fn load_input(path: &str, data: &[u8]) -> dtview::Result<TableInput> {
    if is_delimited(path) {
        dtview::csv::parse_delimited(data, Delimiter::from_path(path))
    } else {
        Ok(serde_json::from_slice(data)?)
    }
}

fn run(options: &Options, data: &[u8]) -> dtview::Result<String> {
    if let Some(query) = &options.serve {
        let service = ReferenceService::from_input(load_input(&options.input, data)?);
        return service.answer_query_string(query);
    }

    let mut config = match &options.config {
        Some(path) => TableConfig::from_json(&fs::read_to_string(path)?)?,
        None => TableConfig::default(),
    };
    config.full_match |= options.full_match;
    // Everything is local here.
    config.server_side = false;

    let input = load_input(&options.input, data)?;
    let mut table = TableController::new(TableSnapshot::from_input(&input), config)?;
    let mut refresh = table.start();
    if let Some(per_page) = options.per_page {
        refresh = table.set_per_page(per_page)?;
    }
    if let Some((column, direction)) = options.sort {
        refresh = table.sort(column, direction)?;
    }
    if let Some(query) = &options.search {
        refresh = table.search(query);
    }
    if let Some(page) = options.page {
        refresh = table.paginate(page);
    }

    let frame = refresh
        .into_frame()
        .ok_or_else(|| dtview::DtviewError::Other("no frame produced".to_string()))?;
    Ok(serde_json::to_string_pretty(&frame)?)
}

fn main() {
    let _ = SimpleLogger::init(LevelFilter::Warn, Config::default());

    let args: Vec<String> = env::args().collect();
    let options = parse_args(&args);

    // Read input file
    let data = match fs::read(&options.input) {
        Ok(d) => d,
        Err(e) => fail(&format!("Error reading {}: {}", options.input, e)),
    };

    let json = match run(&options, &data) {
        Ok(j) => j,
        Err(e) => fail(&format!("Error: {e}")),
    };

    // Output
    match &options.output {
        Some(path) => {
            if let Err(e) = fs::write(path, &json) {
                fail(&format!("Error writing {}: {}", path, e));
            }
            eprintln!("Written: {}", path);
        }
        None => {
            io::stdout().write_all(json.as_bytes()).unwrap();
            println!();
        }
    }
}
