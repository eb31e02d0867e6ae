// SPDX-License-Identifier: MIT OR Apache-2.0
//! Load scenarios that fill a canvas with random nodes and connections.
//!
//! Every scenario clears the canvas first. Positions are drawn uniformly
//! from `[-radius, radius]` on both axes, in whole scene units.

use crate::node::NodeId;
use crate::scene::Scene;
use crate::socket::Socket;
use egui::Pos2;
use rand_core::RngCore;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Counts left on the canvas by a scenario
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StressReport {
    /// Live nodes
    pub nodes: usize,
    /// Live connections
    pub connections: usize,
}

impl StressReport {
    fn of(scene: &Scene) -> Self {
        Self {
            nodes: scene.node_count(),
            connections: scene.connection_count(),
        }
    }
}

/// Integer in `low..=high`
fn rand_int(rng: &mut impl RngCore, low: i32, high: i32) -> i32 {
    let span = i64::from(high) + 1 - i64::from(low);
    if span <= 0 {
        return low;
    }
    let offset = i64::from(rng.next_u32()) % span;
    (i64::from(low) + offset) as i32
}

fn random_pos(rng: &mut impl RngCore, radius: u32) -> Pos2 {
    let r = i32::try_from(radius).unwrap_or(i32::MAX);
    let x = rand_int(rng, -r, r);
    let y = rand_int(rng, -r, r);
    Pos2::new(x as f32, y as f32)
}

fn place(scene: &mut Scene, id: NodeId, rng: &mut impl RngCore, radius: u32) {
    let pos = random_pos(rng, radius);
    if let Err(e) = scene.set_node_position(id, pos) {
        tracing::warn!("Failed to place node: {}", e);
    }
}

fn connect_output_to_input(scene: &mut Scene, hub: NodeId, leaf: NodeId) {
    let output = scene.node(hub).and_then(|h| h.output_socket(0).ok()).map(Socket::id);
    let input = scene.node(leaf).and_then(|l| l.input_socket(0).ok()).map(Socket::id);
    let (Some(output), Some(input)) = (output, input) else {
        tracing::warn!("Missing socket while wiring stress nodes");
        return;
    };
    if let Err(e) = scene.create_connection(output, input) {
        tracing::warn!("Failed to connect stress nodes: {}", e);
    }
}

/// Scatter `count` socketless nodes
pub fn node_count_test(scene: &mut Scene, count: usize, radius: u32, rng: &mut impl RngCore) -> StressReport {
    let started = Instant::now();
    scene.delete_all_nodes();
    for _ in 0..count {
        let id = scene.create_node(0, 0, "");
        place(scene, id, rng, radius);
    }
    let report = StressReport::of(scene);
    tracing::info!(
        "Node count test: {} nodes in {:?}",
        report.nodes,
        started.elapsed()
    );
    report
}

/// Scatter `count` single-input nodes and wire each to one hub output
pub fn connection_test(scene: &mut Scene, count: usize, radius: u32, rng: &mut impl RngCore) -> StressReport {
    let started = Instant::now();
    scene.delete_all_nodes();
    let leaves: Vec<NodeId> = (0..count)
        .map(|_| {
            let id = scene.create_node(1, 0, "");
            place(scene, id, rng, radius);
            id
        })
        .collect();

    let hub = scene.create_node(0, 1, "test");
    for leaf in &leaves {
        connect_output_to_input(scene, hub, *leaf);
    }

    let report = StressReport::of(scene);
    tracing::info!(
        "Connection test: {} nodes, {} connections in {:?}",
        report.nodes,
        report.connections,
        started.elapsed()
    );
    report
}

/// Wire each of `hubs` hub outputs to every one of `leaves` leaf inputs
pub fn mesh_test(scene: &mut Scene, leaves: usize, hubs: usize, radius: u32, rng: &mut impl RngCore) -> StressReport {
    let started = Instant::now();
    scene.delete_all_nodes();
    let leaf_ids: Vec<NodeId> = (0..leaves)
        .map(|_| {
            let id = scene.create_node(1, 0, "");
            place(scene, id, rng, radius);
            let input = scene.node(id).and_then(|n| n.input_socket(0).ok()).map(Socket::id);
            if let Some(input) = input {
                if let Err(e) = scene.set_multiple_connections(input, true) {
                    tracing::warn!("Failed to allow fan-in: {}", e);
                }
            }
            id
        })
        .collect();

    for _ in 0..hubs {
        let hub = scene.create_node(0, 1, "test");
        place(scene, hub, rng, radius);
        for leaf in &leaf_ids {
            connect_output_to_input(scene, hub, *leaf);
        }
    }

    let report = StressReport::of(scene);
    tracing::info!(
        "Mesh test: {} nodes, {} connections in {:?}",
        report.nodes,
        report.connections,
        started.elapsed()
    );
    report
}
