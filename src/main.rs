use anyhow::{Context, Result};
use clap::Parser;
use std::io::Read;
use tracing_subscriber::EnvFilter;
use zonetrace::cli::{Cli, OutputFormat};
use zonetrace::zone::{Zone, ZoneRegistry};
use zonetrace::{analyzer, report, trace_parser};

/// Initialize tracing subscriber for debug output
fn init_tracing(debug: bool) {
    if debug {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive(tracing::Level::TRACE.into()),
            )
            .with_writer(std::io::stderr)
            .init();
    }
}

/// Read the stack trace from a file, or from stdin
fn read_trace(args: &Cli) -> Result<String> {
    match &args.trace {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read trace file: {}", path.display())),
        None => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("Failed to read trace from stdin")?;
            Ok(text)
        }
    }
}

/// Load the zone registry and pick the zones to analyze
fn load_zones(args: &Cli) -> Result<(ZoneRegistry, Vec<Zone>)> {
    let registry = match &args.zones {
        Some(path) => ZoneRegistry::from_toml(path)?,
        None => ZoneRegistry::default_rust_zones()?,
    };

    let zones = if args.zone.is_empty() {
        registry.zones().to_vec()
    } else {
        registry.select(&args.zone[..])?
    };

    Ok((registry, zones))
}

fn main() -> Result<()> {
    let args = Cli::parse();

    // Initialize tracing if --debug flag is set
    init_tracing(args.debug);

    let (registry, zones) = load_zones(&args)?;
    let trace = read_trace(&args)?;

    let frames = trace_parser::parse_stack_trace(&trace);
    if frames.is_empty() {
        tracing::warn!("No stack frames recognised in input");
    }

    if args.summary {
        for line in report::failure_summary(&frames, &zones) {
            println!("{}", line);
        }
        return Ok(());
    }

    let Some(analysis) =
        analyzer::process(Some(&frames[..]), &zones).context("Zone analysis failed")?
    else {
        eprintln!("No zones to analyze.");
        return Ok(());
    };

    match args.format {
        OutputFormat::Text => {
            for line in analysis.render_all() {
                println!("{}", line);
            }
            for name in &args.entry {
                let zone = registry
                    .get(name)
                    .with_context(|| format!("Unknown zone '{}'", name))?;
                match analysis.entry_point(zone) {
                    Some(entry) => println!("ENTRY {}: {}", name, entry),
                    None => println!("ENTRY {}: never entered", name),
                }
            }
        }
        OutputFormat::Json => {
            let json = report::JsonReport::new(&analysis, &zones).to_json()?;
            println!("{}", json);
        }
    }

    Ok(())
}
