// SPDX-License-Identifier: MIT OR Apache-2.0
//! Headless stress runner for the node graph canvas.
//!
//! Fills a canvas with one of the load scenarios, paints it once into a
//! recording surface and prints a RON summary per run.

mod config;
mod runner;

use clap::Parser;
use config::{Scenario, StressConfig};
use rand_core::{OsRng, TryRngCore};
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// RON file with run settings
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Scenario, overriding the config file
    #[arg(short, long, value_enum)]
    scenario: Option<Scenario>,

    /// Node count (leaves for the mesh), overriding the config file
    #[arg(short = 'n', long)]
    count: Option<usize>,

    /// Hub count for the mesh, overriding the config file
    #[arg(long)]
    hubs: Option<usize>,

    /// Scatter radius, overriding the config file
    #[arg(short, long)]
    radius: Option<u32>,

    /// Repetitions, overriding the config file
    #[arg(long)]
    runs: Option<usize>,

    /// Print the effective settings as RON and exit
    #[arg(long)]
    print_config: bool,
}

impl Args {
    fn apply(&self, config: &mut StressConfig) {
        if let Some(scenario) = self.scenario {
            config.scenario = scenario;
        }
        if let Some(count) = self.count {
            config.count = count;
        }
        if let Some(hubs) = self.hubs {
            config.hubs = hubs;
        }
        if let Some(radius) = self.radius {
            config.radius = radius;
        }
        if let Some(runs) = self.runs {
            config.runs = runs;
        }
    }
}

fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("nodeview_graph=info,nodeview_demo=info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn main() {
    init_tracing();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => match StressConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                tracing::error!("Failed to load {}: {e}", path.display());
                std::process::exit(1);
            }
        },
        None => StressConfig::default(),
    };
    args.apply(&mut config);

    if args.print_config {
        match config.to_ron() {
            Ok(text) => println!("{text}"),
            Err(e) => {
                tracing::error!("Failed to render config: {e}");
                std::process::exit(1);
            }
        }
        return;
    }

    tracing::info!(
        "Running {:?} x{} (count {}, hubs {}, radius {})",
        config.scenario,
        config.runs,
        config.count,
        config.hubs,
        config.radius
    );

    let mut rng = OsRng.unwrap_err();
    let pretty = ron::ser::PrettyConfig::default().struct_names(true);
    for summary in runner::run(&config, &mut rng) {
        match ron::ser::to_string_pretty(&summary, pretty.clone()) {
            Ok(text) => println!("{text}"),
            Err(e) => tracing::warn!("Failed to render summary: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_config() {
        let args = Args::parse_from(["nodeview_demo", "--scenario", "connection", "-n", "12", "--runs", "4"]);
        let mut config = StressConfig::default();
        args.apply(&mut config);
        assert_eq!(config.scenario, Scenario::Connection);
        assert_eq!(config.count, 12);
        assert_eq!(config.runs, 4);
        assert_eq!(config.hubs, 10);
    }

    #[test]
    fn test_no_flags_keep_config() {
        let args = Args::parse_from(["nodeview_demo"]);
        let mut config = StressConfig {
            radius: 77,
            ..Default::default()
        };
        args.apply(&mut config);
        assert_eq!(config.radius, 77);
        assert_eq!(config.scenario, Scenario::Mesh);
    }

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }
}
