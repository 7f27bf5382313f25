//! Simple analysis example: trace a schematic image and print the netlist.

use wiretrace::prelude::*;
use std::path::Path;

fn main() -> Result<(), WiretraceError> {
    let mut args = std::env::args().skip(1);
    let (Some(image), Some(components)) = (args.next(), args.next()) else {
        eprintln!("Usage: cargo run --example simple_analysis <image.png> <components.json>");
        std::process::exit(1);
    };

    let components = WiretraceCore::load_components(Path::new(&components))?;
    let options = AnalysisOptions::default();
    let result = WiretraceCore::analyze_file(Path::new(&image), &components, options)?;

    println!("Analysis results for: {}", image);
    println!(
        "{} segments, {} connections, {} nodes",
        result.stats.segments, result.stats.connections, result.stats.nodes
    );
    println!();

    for issue in &result.topology.potential_issues {
        println!("[{:?}] {}", issue.severity, issue.message);
    }

    if let Some(netlist) = &result.netlist {
        println!();
        println!("{}", netlist.netlist_text);
    }

    Ok(())
}
