//! Endpoint Schema CLI
//!
//! Command-line interface for cataloging API definitions and checking
//! payloads against extracted endpoint fields.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use endpoint_schema::{
    check_payload, load_definition_auto, load_payload, load_settings, request_fields,
    sample_payload_with, Catalog, ConformanceError, Direction, Endpoint, SampleMode, Settings,
};
use serde::Serialize;

#[derive(Parser)]
#[command(name = "endpoint-schema")]
#[command(about = "Extract endpoint schemas from API definitions")]
#[command(version)]
struct Cli {
    /// Log debug output to stderr (overrides RUST_LOG)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the endpoint catalog of a definition
    Catalog {
        /// Definition source: file path or URL (http:// or https://)
        definition: String,

        /// Settings file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Only include endpoints whose path contains this text
        #[arg(long, short, default_value = "")]
        query: String,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,

        /// Output file (stdout if not specified)
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Print a sample request payload for an endpoint verb
    Sample {
        /// Definition source: file path or URL (http:// or https://)
        definition: String,

        /// Endpoint path, e.g. /users/<pk>/
        #[arg(long)]
        path: String,

        /// HTTP verb
        #[arg(long)]
        verb: String,

        /// Settings file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Include required fields only
        #[arg(long, conflicts_with = "without_required")]
        only_required: bool,

        /// Include required fields minus one (a payload the endpoint should reject)
        #[arg(long, conflicts_with = "only_required")]
        without_required: bool,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Check a payload against an endpoint's fields
    Check {
        /// Definition source: file path or URL (http:// or https://)
        definition: String,

        /// Payload file to check
        payload: PathBuf,

        /// Endpoint path, e.g. /users/<pk>/
        #[arg(long)]
        path: String,

        /// HTTP verb
        #[arg(long)]
        verb: String,

        /// Check as request payload
        #[arg(
            long,
            conflicts_with = "response",
            required_unless_present = "response"
        )]
        request: bool,

        /// Check as response payload
        #[arg(long, conflicts_with = "request", required_unless_present = "request")]
        response: bool,

        /// Settings file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output results as JSON (for automation)
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Catalog {
            definition,
            config,
            query,
            pretty,
            output,
        } => run_catalog(&definition, config.as_deref(), &query, pretty, output),

        Commands::Sample {
            definition,
            path,
            verb,
            config,
            only_required,
            without_required,
            pretty,
        } => {
            let mode = if only_required {
                SampleMode::OnlyRequired
            } else if without_required {
                SampleMode::WithoutRequired
            } else {
                SampleMode::All
            };
            run_sample(&definition, config.as_deref(), &path, &verb, mode, pretty)
        }

        Commands::Check {
            definition,
            payload,
            path,
            verb,
            request,
            response: _,
            config,
            json,
        } => run_check(CheckArgs {
            definition,
            config,
            payload,
            path,
            verb,
            direction: Direction::from_request_flag(request),
            json_output: json,
        }),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => ExitCode::from(code),
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        tracing_subscriber::EnvFilter::new("debug")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_catalog(definition: &str, config: Option<&Path>) -> Result<(Catalog, Settings), u8> {
    let settings = match config {
        Some(path) => load_settings(path).map_err(|e| {
            eprintln!("Error loading settings: {}", e);
            e.exit_code() as u8
        })?,
        None => Settings::default(),
    };

    let definition = load_definition_auto(definition).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    let catalog = Catalog::build(&definition, &settings).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    Ok((catalog, settings))
}

fn to_json<T: Serialize>(value: &T, pretty: bool) -> Result<String, u8> {
    if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
    .map_err(|e| {
        eprintln!("Error serializing output: {}", e);
        2u8
    })
}

#[derive(Serialize)]
struct CatalogOutput<'a> {
    endpoints: Vec<&'a Endpoint>,
    all_verbs: &'a [String],
}

fn run_catalog(
    definition: &str,
    config: Option<&Path>,
    query: &str,
    pretty: bool,
    output: Option<PathBuf>,
) -> Result<(), u8> {
    let (catalog, settings) = load_catalog(definition, config)?;

    if settings.hide_docs {
        eprintln!("Error: documentation is hidden (hide_docs is set)");
        return Err(2);
    }

    let json_output = to_json(
        &CatalogOutput {
            endpoints: catalog.filter(query),
            all_verbs: &catalog.all_verbs,
        },
        pretty,
    )?;

    match output {
        Some(path) => {
            std::fs::write(&path, &json_output).map_err(|e| {
                eprintln!("Error writing to {}: {}", path.display(), e);
                3u8
            })?;
        }
        None => {
            println!("{}", json_output);
        }
    }

    Ok(())
}

/// Find the endpoint at `path` and make sure it permits `verb`.
fn find_endpoint<'a>(
    catalog: &'a Catalog,
    path: &str,
    verb: &str,
) -> Result<&'a Endpoint, String> {
    let endpoint = catalog
        .find(path)
        .ok_or_else(|| format!("no endpoint at path {}", path))?;
    if !endpoint.permits(verb) {
        return Err(format!(
            "{} does not permit {} (permitted: {})",
            path,
            verb.to_uppercase(),
            endpoint.permitted_verbs.join(", ")
        ));
    }
    Ok(endpoint)
}

fn run_sample(
    definition: &str,
    config: Option<&Path>,
    path: &str,
    verb: &str,
    mode: SampleMode,
    pretty: bool,
) -> Result<(), u8> {
    let (catalog, _) = load_catalog(definition, config)?;

    let endpoint = find_endpoint(&catalog, path, verb).map_err(|msg| {
        eprintln!("Error: {}", msg);
        2u8
    })?;

    let payload = sample_payload_with(request_fields(endpoint, verb), mode);
    println!("{}", to_json(&payload, pretty)?);
    Ok(())
}

struct CheckArgs {
    definition: String,
    config: Option<PathBuf>,
    payload: PathBuf,
    path: String,
    verb: String,
    direction: Direction,
    json_output: bool,
}

fn run_check(args: CheckArgs) -> Result<(), u8> {
    let CheckArgs {
        definition,
        config,
        payload: payload_path,
        path,
        verb,
        direction,
        json_output,
    } = args;

    let payload = load_payload(&payload_path).map_err(|e| {
        report_error(json_output, &format!("loading payload: {}", e));
        e.exit_code() as u8
    })?;

    let (catalog, _) = load_catalog(&definition, config.as_deref())?;

    let endpoint = find_endpoint(&catalog, &path, &verb).map_err(|msg| {
        report_error(json_output, &msg);
        2u8
    })?;

    let fields = match direction {
        Direction::In => request_fields(endpoint, &verb),
        Direction::Out => endpoint.fields_for(Direction::Out, &verb).unwrap_or_default(),
    };

    match check_payload(fields, &payload) {
        Ok(()) => {
            if json_output {
                println!(r#"{{"valid":true}}"#);
            } else {
                println!("Valid");
            }
            Ok(())
        }
        Err(ConformanceError::Invalid { errors }) => {
            if json_output {
                let output = serde_json::json!({
                    "valid": false,
                    "errors": errors
                });
                println!("{}", output);
            } else {
                eprintln!("Check failed:");
                for error in errors {
                    eprintln!("  {}", error);
                }
            }
            Err(1)
        }
        Err(e) => {
            report_error(json_output, &e.to_string());
            Err(e.exit_code() as u8)
        }
    }
}

/// Output an error message in plain text or JSON format.
fn report_error(json_output: bool, msg: &str) {
    if json_output {
        println!("{}", serde_json::json!({ "valid": false, "error": msg }));
    } else {
        eprintln!("Error: {}", msg);
    }
}
