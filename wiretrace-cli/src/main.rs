//! Wiretrace CLI - schematic image connectivity analysis from the command line.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process;
use wiretrace::{
    AnalysisOptions, AnalysisResult, DetectionConfig, Severity, WiretraceCore,
};

#[derive(Parser)]
#[command(name = "wiretrace")]
#[command(about = "Schematic image wiring extraction and SPICE netlist synthesis", long_about = None)]
#[command(version)]
struct Cli {
    /// Log pipeline details to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Trace wires in a schematic image and synthesize a netlist
    Analyze {
        /// Schematic image (PNG, JPEG or BMP)
        #[arg(value_name = "IMAGE")]
        image: PathBuf,

        /// JSON list of detected components
        #[arg(short, long, value_name = "JSON")]
        components: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormat,

        /// Detection config JSON (missing fields take defaults)
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Skip netlist synthesis
        #[arg(long)]
        no_netlist: bool,

        /// Title for the netlist header
        #[arg(long, default_value = "wiretrace")]
        title: String,

        /// Write output to a file instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Exit with error code if issues found at this severity or higher
        #[arg(long, value_enum)]
        fail_on: Option<FailOnSeverity>,
    },

    /// Print the default detection configuration as JSON
    Config,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Human-readable summary
    Human,
    /// Full result as JSON
    Json,
    /// SPICE netlist text only
    Netlist,
}

#[derive(Clone, ValueEnum)]
enum FailOnSeverity {
    Warning,
    Info,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let outcome = match cli.command {
        Commands::Analyze {
            image,
            components,
            format,
            config,
            no_netlist,
            title,
            output,
            fail_on,
        } => {
            let options = AnalysisOptions {
                config: DetectionConfig::default(),
                generate_netlist: !no_netlist,
                title,
            };
            handle_analyze(
                &image,
                &components,
                config.as_deref(),
                options,
                &format,
                output.as_deref(),
                fail_on,
            )
        }
        Commands::Config => handle_config().map(|_| 0),
    };

    match outcome {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            process::exit(1);
        }
    }
}

fn init_tracing(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn handle_analyze(
    image: &Path,
    components: &Path,
    config: Option<&Path>,
    mut options: AnalysisOptions,
    format: &OutputFormat,
    output: Option<&Path>,
    fail_on: Option<FailOnSeverity>,
) -> Result<i32> {
    if let Some(path) = config {
        options.config = WiretraceCore::load_config(path)
            .with_context(|| format!("failed to load config {}", path.display()))?;
    }
    let components = WiretraceCore::load_components(components)
        .with_context(|| format!("failed to load components {}", components.display()))?;

    let result = WiretraceCore::analyze_file(image, &components, options)
        .with_context(|| format!("failed to analyze {}", image.display()))?;

    let rendered = match format {
        OutputFormat::Human => render_human(image, &result),
        OutputFormat::Json => serde_json::to_string_pretty(&result)?,
        OutputFormat::Netlist => match &result.netlist {
            Some(netlist) => netlist.netlist_text.clone(),
            None => bail!("--format netlist cannot be combined with --no-netlist"),
        },
    };
    emit(&rendered, output)?;

    let failed = match fail_on {
        Some(FailOnSeverity::Warning) => result.stats.warnings > 0,
        Some(FailOnSeverity::Info) => !result.topology.potential_issues.is_empty(),
        None => false,
    };
    Ok(if failed { 1 } else { 0 })
}

fn handle_config() -> Result<()> {
    let rendered = serde_json::to_string_pretty(&DetectionConfig::default())?;
    println!("{}", rendered);
    Ok(())
}

fn emit(text: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => std::fs::write(path, format!("{}\n", text))
            .with_context(|| format!("failed to write {}", path.display())),
        None => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{}", text)?;
            Ok(())
        }
    }
}

fn render_human(image: &Path, result: &AnalysisResult) -> String {
    let mut out = Vec::new();
    out.push(format!("Image: {}", image.display()));
    out.push("─".repeat(60));
    out.push(format!(
        "  Segments: {}   Pins: {}   Connections: {}   Nodes: {}",
        result.stats.segments, result.stats.pins, result.stats.connections, result.stats.nodes
    ));

    let topology = &result.topology;
    if !topology.nodes.is_empty() {
        out.push(String::new());
        out.push("  Nodes:".to_string());
        for node in &topology.nodes {
            out.push(format!(
                "    {} ({} pins): {}",
                node.node_id,
                node.connection_count,
                node.connected_components.join(", ")
            ));
        }
    }

    let warnings: Vec<_> = topology
        .potential_issues
        .iter()
        .filter(|i| i.severity == Severity::Warning)
        .collect();
    let infos: Vec<_> = topology
        .potential_issues
        .iter()
        .filter(|i| i.severity == Severity::Info)
        .collect();

    if warnings.is_empty() && infos.is_empty() {
        out.push(String::new());
        out.push("  No issues found".to_string());
    }
    if !warnings.is_empty() {
        out.push(String::new());
        out.push("  WARNING:".to_string());
        for issue in warnings {
            out.push(format!("    - {}", issue.message));
        }
    }
    if !infos.is_empty() {
        out.push(String::new());
        out.push("  INFO:".to_string());
        for issue in infos {
            out.push(format!("    - {}", issue.message));
        }
    }

    if let Some(netlist) = &result.netlist {
        out.push(String::new());
        if netlist.generation_success {
            out.push(format!("  Netlist ({} devices):", netlist.devices.len()));
        } else {
            out.push(format!(
                "  Netlist generation failed: {}",
                netlist.error.as_deref().unwrap_or("unknown error")
            ));
        }
        for line in &netlist.lines {
            out.push(format!("    {}", line));
        }
    }

    out.join("\n")
}
