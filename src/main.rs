//! Pareto Tracker CLI - Export search results and track hypervolume.

#[cfg(feature = "dhat-heap")]
#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use pareto_tracker::{export::ExportPipeline, schema::AnalysisConfig};

fn print_usage(program: &str) {
    eprintln!("Usage: {} <command> <input> <output-dir> [config.json]", program);
    eprintln!();
    eprintln!("Process the evaluation records of a multi-objective search.");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  export        Write metrics, variables and combined tables");
    eprintln!("  nondominated  Write the non-dominated individuals");
    eprintln!("  hypervolume   Write hypervolume progress per seed and combined");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  input        Record directory, or for hypervolume a table path");
    eprintln!("               (probed as .ptbl, .csv, .csv.gz when given without extension)");
    eprintln!("  output-dir   Directory for the written tables");
    eprintln!("  config.json  Analysis configuration (default settings if omitted)");
    eprintln!();
    eprintln!("Example configuration is generated with --example flag.");
}

fn main() {
    #[cfg(feature = "dhat-heap")]
    let _profiler = dhat::Profiler::new_heap();

    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.get(1).is_some_and(|a| a == "--example") {
        print_example_config();
        return;
    }

    if args.len() < 4 {
        print_usage(&args[0]);
        std::process::exit(1);
    }

    let command = args[1].as_str();
    let input = PathBuf::from(&args[2]);
    let output = PathBuf::from(&args[3]);
    let config = match args.get(4) {
        Some(path) => load_config(Path::new(path)),
        None => AnalysisConfig::default(),
    };

    let pipeline = ExportPipeline::new(config).unwrap_or_else(|e| {
        eprintln!("Invalid configuration: {}", e);
        std::process::exit(1);
    });

    let start = Instant::now();
    let result = match command {
        "export" => pipeline.export_all(&input, &output).map(|summary| {
            println!(
                "Exported {} individuals ({} skipped):",
                summary.individuals, summary.skipped
            );
            for path in &summary.outputs {
                println!("  {}", path.display());
            }
        }),
        "nondominated" => pipeline.export_nondominated(&input, &output).map(|summary| {
            println!(
                "Non-dominated set of {} individuals ({} skipped) written to {}",
                summary.individuals,
                summary.skipped,
                summary.outputs[0].display()
            );
        }),
        "hypervolume" => pipeline.run_hypervolume(&input, &output).map(|outcome| {
            let report = &outcome.report;
            if let Some(norm) = &outcome.normalization
                && !norm.degenerate.is_empty()
            {
                println!("Constant objective columns: {:?}", norm.degenerate);
            }
            match report.combined.last() {
                Some(last) => println!(
                    "Combined hypervolume {:.6} after {} evaluations per seed",
                    last.hypervolume, last.nfe
                ),
                None => println!("Not enough evaluations for a single step"),
            }
            for (seed, series) in &report.per_seed {
                if let Some(last) = series.last() {
                    println!("  Seed {}: {:.6} after {}", seed, last.hypervolume, last.nfe);
                }
            }
            for (seed, reason) in &report.failures {
                println!("  Seed {} excluded: {}", seed, reason);
            }
            println!("Written to {}", outcome.output.display());
        }),
        other => {
            eprintln!("Unknown command: {}", other);
            print_usage(&args[0]);
            std::process::exit(1);
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
    println!("Time: {:.2}s", start.elapsed().as_secs_f32());
}

fn load_config(path: &Path) -> AnalysisConfig {
    let config_str = fs::read_to_string(path).unwrap_or_else(|e| {
        eprintln!("Error reading config file: {}", e);
        std::process::exit(1);
    });

    serde_json::from_str(&config_str).unwrap_or_else(|e| {
        eprintln!("Error parsing config: {}", e);
        std::process::exit(1);
    })
}

fn print_example_config() {
    let mut config = AnalysisConfig::default();
    config.tracker.step = 100;
    config.tracker.reference_point = Some(vec![1.0, 1.0, 1.0]);
    config.export.maximize = vec!["turbine_energy".to_string()];
    config.workers = Some(4);

    match serde_json::to_string_pretty(&config) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error serializing example config: {}", e),
    }
}
