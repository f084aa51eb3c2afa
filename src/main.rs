//! Route Optimizer - Command Line Interface
//!
//! Plans the shortest round trip through a handful of locations with a genetic algorithm.

use clap::{Args, Parser, Subcommand};
use route_optimizer::benchmark::{Benchmark, BenchmarkConfig};
use route_optimizer::error::{Result, SolverError};
use route_optimizer::heuristics::genetic::{GAConfig, GeneticAlgorithm, GenerationStats};
use route_optimizer::instance::RouteInstance;
use route_optimizer::visualization::Visualizer;

use std::fs::{self, File};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "route-optimizer")]
#[command(version = "1.0")]
#[command(about = "Genetic-algorithm route planner for small location sets")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Optimize the visiting order of a set of locations
    Solve {
        /// Location file (TSPLIB-style or CSV); the built-in town map is used if omitted
        #[arg(short, long)]
        locations: Option<PathBuf>,

        /// Indices of the locations to visit, e.g. `1,3,4` (home is always included)
        #[arg(long, value_delimiter = ',')]
        select: Vec<usize>,

        /// Index of the location the printed route starts from
        #[arg(long, default_value = "0")]
        anchor: usize,

        #[command(flatten)]
        ga: GaArgs,

        /// Write the solution as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write per-generation statistics as CSV
        #[arg(long)]
        history: Option<PathBuf>,

        /// Write `<PREFIX>_tour.svg` and `<PREFIX>_convergence.svg`
        #[arg(long, value_name = "PREFIX")]
        visualize: Option<PathBuf>,

        /// Also render the visualizations as PNG (needs rsvg-convert, magick or inkscape)
        #[arg(long, requires = "visualize")]
        png: bool,

        /// Print the full solution summary
        #[arg(short, long)]
        verbose: bool,
    },

    /// Run the optimizer over many seeds and summarize the spread
    Benchmark {
        #[arg(short, long)]
        locations: Option<PathBuf>,

        /// Number of seeded runs
        #[arg(short, long, default_value = "10")]
        runs: usize,

        /// Output directory for results
        #[arg(short, long, default_value = "results")]
        output: PathBuf,

        /// Run seeds one after another
        #[arg(long)]
        sequential: bool,

        #[command(flatten)]
        ga: GaArgs,
    },

    /// Print statistics about a location set
    Analyze {
        #[arg(short, long)]
        locations: Option<PathBuf>,
    },
}

#[derive(Args, Debug, Clone)]
struct GaArgs {
    /// Population size
    #[arg(short, long, default_value = "160")]
    population: usize,

    /// Number of generations
    #[arg(short, long, default_value = "250")]
    generations: usize,

    /// Crossover rate in [0, 1]
    #[arg(long, default_value = "0.85")]
    crossover_rate: f64,

    /// Mutation rate in [0, 1]
    #[arg(long, default_value = "0.10")]
    mutation_rate: f64,

    /// Random seed
    #[arg(short, long, default_value = "42")]
    seed: u64,
}

impl GaArgs {
    fn to_config(&self) -> GAConfig {
        GAConfig {
            population_size: self.population,
            max_generations: self.generations,
            crossover_prob: self.crossover_rate,
            mutation_prob: self.mutation_rate,
            seed: self.seed,
            ..Default::default()
        }
    }
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let outcome = match cli.command {
        Commands::Solve {
            locations,
            select,
            anchor,
            ga,
            output,
            history,
            visualize,
            png,
            verbose,
        } => solve(
            locations.as_deref(),
            &select,
            anchor,
            &ga,
            output.as_deref(),
            history.as_deref(),
            visualize.as_deref(),
            png,
            verbose,
        ),
        Commands::Benchmark {
            locations,
            runs,
            output,
            sequential,
            ga,
        } => run_benchmark(locations.as_deref(), runs, &output, !sequential, &ga),
        Commands::Analyze { locations } => analyze(locations.as_deref()),
    };

    if let Err(e) = outcome {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn load_locations(path: Option<&Path>) -> Result<RouteInstance> {
    match path {
        Some(path) => RouteInstance::from_file(path),
        None => Ok(RouteInstance::demo()),
    }
}

#[allow(clippy::too_many_arguments)]
fn solve(
    locations: Option<&Path>,
    select: &[usize],
    anchor: usize,
    ga: &GaArgs,
    output: Option<&Path>,
    history: Option<&Path>,
    visualize: Option<&Path>,
    png: bool,
    verbose: bool,
) -> Result<()> {
    let mut instance = load_locations(locations)?;
    if !select.is_empty() {
        instance = instance.subset(select)?;
    }
    if anchor >= instance.dimension() {
        return Err(SolverError::invalid(format!(
            "anchor {} is out of range for {} locations",
            anchor,
            instance.dimension()
        )));
    }

    println!("Planning a route over {} locations:", instance.dimension());
    for (i, loc) in instance.locations().iter().enumerate() {
        println!("  [{}] {} ({:.1}, {:.1})", i, loc.name, loc.x, loc.y);
    }

    let mut algorithm = GeneticAlgorithm::new(instance.clone(), ga.to_config())?;
    let mut solution = algorithm.run();
    solution.rotate_to_start(anchor)?;

    println!();
    println!("Optimized route: {}", solution.describe(&instance));
    println!("Total distance: {:.3}", solution.cost);

    if verbose {
        println!();
        print!("{}", solution);
    }

    if let Some(path) = output {
        let file = File::create(path)?;
        serde_json::to_writer_pretty(file, &solution)?;
        println!("Solution written to {}", path.display());
    }

    if let Some(path) = history {
        write_history(algorithm.history(), path)?;
        println!("History written to {}", path.display());
    }

    if let Some(prefix) = visualize {
        let viz = Visualizer {
            anchor,
            ..Visualizer::new()
        };
        let tour_svg = viz.generate_svg(&instance, &solution);
        let curve_svg = viz.generate_convergence_svg(algorithm.history());
        let tour_path = with_suffix(prefix, "_tour.svg");
        let curve_path = with_suffix(prefix, "_convergence.svg");
        viz.save_svg(&tour_svg, &tour_path)?;
        viz.save_svg(&curve_svg, &curve_path)?;
        println!(
            "Visualizations written to {} and {}",
            tour_path.display(),
            curve_path.display()
        );

        if png {
            let tour_png = with_suffix(prefix, "_tour.png");
            let curve_png = with_suffix(prefix, "_convergence.png");
            viz.save_png(&tour_svg, &tour_png)?;
            viz.save_png(&curve_svg, &curve_png)?;
            println!("PNG renders written to {} and {}", tour_png.display(), curve_png.display());
        }
    }

    Ok(())
}

fn run_benchmark(
    locations: Option<&Path>,
    runs: usize,
    output: &Path,
    parallel: bool,
    ga: &GaArgs,
) -> Result<()> {
    let instance = load_locations(locations)?;
    fs::create_dir_all(output)?;

    let mut benchmark = Benchmark::new(BenchmarkConfig {
        num_runs: runs,
        base_seed: ga.seed,
        parallel,
        show_progress: true,
        ga: ga.to_config(),
    });
    benchmark.run(&instance)?;

    benchmark.export_to_csv(output.join("results.csv"))?;
    benchmark.export_statistics_csv(output.join("statistics.csv"))?;

    let report = benchmark.generate_report();
    fs::write(output.join("report.txt"), &report)?;
    println!("{}", report);
    println!("Results saved to {}", output.display());

    Ok(())
}

fn analyze(locations: Option<&Path>) -> Result<()> {
    let instance = load_locations(locations)?;
    print!("{}", instance.statistics());
    Ok(())
}

fn write_history(history: &[GenerationStats], path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for stats in history {
        writer.serialize(stats)?;
    }
    writer.flush()?;
    Ok(())
}

fn with_suffix(prefix: &Path, suffix: &str) -> PathBuf {
    let mut name = prefix.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_png_requires_visualize() {
        assert!(Cli::try_parse_from(["route-optimizer", "solve", "--png"]).is_err());

        let cli = Cli::try_parse_from(["route-optimizer", "solve", "--visualize", "out/demo", "--png"])
            .unwrap();
        match cli.command {
            Commands::Solve { visualize, png, .. } => {
                assert!(png);
                assert_eq!(visualize, Some(PathBuf::from("out/demo")));
            }
            _ => panic!("expected solve"),
        }
    }

    #[test]
    fn test_with_suffix() {
        assert_eq!(
            with_suffix(Path::new("out/demo"), "_tour.png"),
            PathBuf::from("out/demo_tour.png")
        );
    }
}
