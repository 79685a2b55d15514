use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use clap::{Parser, Subcommand};
use log::{debug, info, warn};
use regex::Regex;
use serde_json::Value;
use roast_telemetry_migrate::{
    reporter::ReportError,
    schemas::{roast, search},
    BatchReport, BatchReporter, RegistryError, ReportFormat, SchemaTransformer, TransformerOptions,
    UnknownKeyPolicy,
};

#[derive(Parser, Debug)]
#[command(name = "roast-migrate")]
#[command(about = "Validate and migrate roast telemetry records fetched from the search index")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Fail records that carry keys their schema does not declare
    #[arg(long, global = true)]
    reject_unknown_keys: bool,

    /// Output format for the batch report
    #[arg(long, value_enum, default_value_t = ReportFormat::Console, global = true)]
    format: ReportFormat,

    /// Directory that receives the timestamped output folders
    #[arg(long, value_name = "DIR", default_value = "temp", global = true)]
    output_dir: PathBuf,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Collect roast urls and ids from saved search responses
    ExtractIds {
        /// Comma-separated list of search result files
        #[arg(long, env = "INPUT_RESULT_PATHS", value_delimiter = ',', required = true)]
        input: Vec<PathBuf>,

        /// Download every roast into <output-dir>/roasts-<timestamp>/
        #[arg(long)]
        fetch: bool,
    },
    /// Validate downloaded roast records and keep the valid ones
    Validate {
        /// Directory of roast record files
        #[arg(long, value_name = "DIR", env = "INPUT_DATA_DIR")]
        input_dir: PathBuf,
    },
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("Schema registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Report(#[from] ReportError),
}

/// Where a roast record lives, as listed by the search index
#[derive(Debug, Clone, PartialEq)]
struct RoastLocation {
    url: String,
    id: String,
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let options = TransformerOptions {
        unknown_keys: if cli.reject_unknown_keys {
            UnknownKeyPolicy::Reject
        } else {
            UnknownKeyPolicy::Preserve
        },
    };
    let started = chrono::Utc::now().timestamp();

    let reports = match cli.command {
        Command::ExtractIds { input, fetch } => {
            extract_ids(&input, fetch, &cli.output_dir, started, options).await
        }
        Command::Validate { input_dir } => {
            validate_roasts(&input_dir, &cli.output_dir, started, options).map(|report| vec![report])
        }
    };

    let reports = match reports {
        Ok(reports) => reports,
        Err(e) => {
            eprintln!("\n❌ Error: {}", e);
            process::exit(1);
        }
    };

    let reporter = BatchReporter::new().with_format(cli.format);
    for report in &reports {
        match reporter.format_report(report) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                eprintln!("\n❌ Error: {}", e);
                process::exit(1);
            }
        }
    }
}

/// Decode saved search responses and optionally download the roasts they list
async fn extract_ids(
    inputs: &[PathBuf],
    fetch: bool,
    output_dir: &Path,
    started: i64,
    options: TransformerOptions,
) -> Result<Vec<BatchReport>, CliError> {
    let transformer = SchemaTransformer::new(search::registry()?).with_options(options);
    let mut report = BatchReport::new("extract-ids", search::ROOT);
    let mut roasts = Vec::new();

    for path in inputs {
        let source = path.display().to_string();
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) => {
                warn!("Could not read {}: {}", source, e);
                report.record_io_failure(source, e.to_string());
                continue;
            }
        };
        match transformer.decode(&text, search::ROOT) {
            Ok(results) => {
                roasts.extend(roast_locations(&results));
                report.record_success();
            }
            Err(e) => {
                warn!("Skipping {}: {}", source, e);
                report.record_failure(source, &e);
            }
        }
    }

    println!("total roasts: {}", roasts.len());

    if !fetch {
        for roast in &roasts {
            println!("{}\t{}", roast.id, roast.url);
        }
        return Ok(vec![report]);
    }

    let target_dir = output_dir.join(format!("roasts-{}", started));
    let fetched = fetch_roasts(&roasts, &target_dir).await?;
    Ok(vec![report, fetched])
}

/// Pull `(url, id)` pairs out of a decoded search response
fn roast_locations(results: &Value) -> Vec<RoastLocation> {
    let Some(hits) = results
        .get("hits")
        .and_then(|hits| hits.get("hits"))
        .and_then(Value::as_array)
    else {
        return Vec::new();
    };

    hits.iter()
        .filter_map(|hit| {
            let id = hit.get("_id").and_then(Value::as_str);
            let url = hit
                .get("_source")
                .and_then(|source| source.get("url"))
                .and_then(Value::as_str);
            match (url, id) {
                (Some(url), Some(id)) => Some(RoastLocation {
                    url: url.to_string(),
                    id: id.to_string(),
                }),
                _ => {
                    debug!("Hit without url or id: {}", hit);
                    None
                }
            }
        })
        .collect()
}

/// Download each roast and store the body as `<id>.json`
async fn fetch_roasts(roasts: &[RoastLocation], target_dir: &Path) -> Result<BatchReport, CliError> {
    create_dir(target_dir)?;
    let client = reqwest::Client::new();
    let mut report = BatchReport::new("fetch", roast::ROOT);

    for location in roasts {
        let body = match fetch_roast(&client, &location.url).await {
            Ok(body) => body,
            Err(e) => {
                warn!("Failed to fetch {}: {}", location.url, e);
                report.record_io_failure(location.url.clone(), e.to_string());
                continue;
            }
        };

        let path = target_dir.join(format!("{}.json", sanitize_file_stem(&location.id)));
        match fs::write(&path, body.as_bytes()) {
            Ok(()) => {
                report.record_success();
                report.record_written(path.display().to_string());
            }
            Err(e) => report.record_io_failure(path.display().to_string(), e.to_string()),
        }
    }

    Ok(report)
}

async fn fetch_roast(client: &reqwest::Client, url: &str) -> Result<String, reqwest::Error> {
    let json: Value = client.get(url).send().await?.error_for_status()?.json().await?;
    Ok(json.to_string())
}

/// Decode every record in `input_dir`, re-encoding the valid ones into the output folder
fn validate_roasts(
    input_dir: &Path,
    output_dir: &Path,
    started: i64,
    options: TransformerOptions,
) -> Result<BatchReport, CliError> {
    let transformer = SchemaTransformer::new(roast::registry()?).with_options(options);
    let target_dir = output_dir.join(format!("valid-roasts-{}", started));

    let mut paths: Vec<PathBuf> = fs::read_dir(input_dir)
        .map_err(|source| CliError::Io {
            path: input_dir.display().to_string(),
            source,
        })?
        .filter_map(|entry| entry.ok().map(|entry| entry.path()))
        .filter(|path| path.is_file())
        .collect();
    paths.sort();

    create_dir(&target_dir)?;
    let mut report = BatchReport::new("validate", roast::ROOT);

    for path in paths {
        let file_name = match path.file_name() {
            Some(name) => name.to_string_lossy().into_owned(),
            None => continue,
        };
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) => {
                report.record_io_failure(file_name, e.to_string());
                continue;
            }
        };

        let encoded = transformer
            .decode(&text, roast::ROOT)
            .and_then(|decoded| transformer.encode(&decoded, roast::ROOT));
        let encoded = match encoded {
            Ok(encoded) => encoded,
            Err(e) => {
                warn!("{}: {}", path.display(), e);
                report.record_failure(file_name, &e);
                continue;
            }
        };

        let out = target_dir.join(&file_name);
        match fs::write(&out, encoded.as_bytes()) {
            Ok(()) => {
                report.record_success();
                report.record_written(out.display().to_string());
            }
            Err(e) => report.record_io_failure(file_name, e.to_string()),
        }
    }

    info!("total roasts: {}", report.total);
    info!("total valid roasts: {}", report.succeeded);
    Ok(report)
}

fn create_dir(dir: &Path) -> Result<(), CliError> {
    fs::create_dir_all(dir).map_err(|source| CliError::Io {
        path: dir.display().to_string(),
        source,
    })
}

/// Turn a record id into a file name that stays inside the target directory
fn sanitize_file_stem(id: &str) -> String {
    let re = Regex::new(r"[^A-Za-z0-9._-]").unwrap();
    let stem = re.replace_all(id, "_").into_owned();
    if stem.is_empty() || stem.chars().all(|c| c == '.') {
        format!("_{}", stem)
    } else {
        stem
    }
}
