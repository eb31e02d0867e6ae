// SPDX-License-Identifier: MIT OR Apache-2.0
//! Runs stress scenarios against a headless canvas.

use crate::config::{Scenario, StressConfig};
use nodeview_graph::{stress, RecordingSurface, Scene, StressReport};
use rand_core::RngCore;
use serde::Serialize;
use std::time::{Duration, Instant};

/// Outcome of one scenario run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    /// Run number, from 1
    pub run: usize,
    /// Counts left on the canvas
    pub report: StressReport,
    /// Drawing calls for one full repaint
    pub paint_commands: usize,
    /// Time spent building the canvas
    pub build: Duration,
    /// Time spent painting it once
    pub paint: Duration,
}

fn run_once(scene: &mut Scene, config: &StressConfig, rng: &mut impl RngCore) -> StressReport {
    match config.scenario {
        Scenario::NodeCount => stress::node_count_test(scene, config.count, config.radius, rng),
        Scenario::Connection => stress::connection_test(scene, config.count, config.radius, rng),
        Scenario::Mesh => stress::mesh_test(scene, config.count, config.hubs, config.radius, rng),
    }
}

/// Run the configured scenario `config.runs` times on one canvas
pub fn run(config: &StressConfig, rng: &mut impl RngCore) -> Vec<RunSummary> {
    let mut scene = Scene::with_config(config.canvas.clone());
    (1..=config.runs)
        .map(|run| {
            let started = Instant::now();
            let report = run_once(&mut scene, config, rng);
            let build = started.elapsed();

            let started = Instant::now();
            let mut surface = RecordingSurface::new();
            scene.paint(&mut surface);
            let paint = started.elapsed();

            let dropped = scene.drain_events().len();
            tracing::debug!("Run {}: {} events drained", run, dropped);

            RunSummary {
                run,
                report,
                paint_commands: surface.commands.len(),
                build,
                paint,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CountingRng(u32);

    impl RngCore for CountingRng {
        fn next_u32(&mut self) -> u32 {
            self.0 = self.0.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            self.0
        }

        fn next_u64(&mut self) -> u64 {
            rand_core::impls::next_u64_via_u32(self)
        }

        fn fill_bytes(&mut self, dst: &mut [u8]) {
            rand_core::impls::fill_bytes_via_next(self, dst);
        }
    }

    #[test]
    fn test_mesh_runs_repeat_on_a_cleared_canvas() {
        let config = StressConfig {
            scenario: Scenario::Mesh,
            count: 6,
            hubs: 2,
            radius: 400,
            runs: 2,
            ..Default::default()
        };
        let summaries = run(&config, &mut CountingRng(9));
        assert_eq!(summaries.len(), 2);
        for summary in &summaries {
            assert_eq!(summary.report, StressReport { nodes: 8, connections: 12 });
            assert!(summary.paint_commands > 0);
        }
        assert_eq!(summaries[1].run, 2);
    }

    #[test]
    fn test_each_scenario_reports_its_shape() {
        let mut rng = CountingRng(1);
        let base = StressConfig {
            count: 5,
            hubs: 3,
            radius: 100,
            ..Default::default()
        };
        let mut counts = |scenario| {
            let config = StressConfig { scenario, ..base.clone() };
            run(&config, &mut rng)[0].report
        };
        assert_eq!(counts(Scenario::NodeCount), StressReport { nodes: 5, connections: 0 });
        assert_eq!(counts(Scenario::Connection), StressReport { nodes: 6, connections: 5 });
        assert_eq!(counts(Scenario::Mesh), StressReport { nodes: 8, connections: 15 });
    }

    #[test]
    fn test_zero_runs_do_nothing() {
        let config = StressConfig {
            runs: 0,
            ..Default::default()
        };
        assert!(run(&config, &mut CountingRng(0)).is_empty());
    }
}
