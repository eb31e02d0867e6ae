// SPDX-License-Identifier: MIT OR Apache-2.0
//! Draw-order stamps for nodes and connections.
//!
//! Every newly created or newly selected item takes the next value of its
//! class counter, so recent items draw on top. Nodes count upwards from zero
//! and connections count upwards from just above `i32::MIN`, which keeps every
//! connection below every node. Groups sit at `i32::MIN`.

use parking_lot::Mutex;
use std::sync::{Arc, OnceLock};

/// Z value of node groups, below everything else
pub const GROUP_Z: i32 = i32::MIN;

/// A wrapping monotonic counter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZCounter {
    value: i32,
    floor: i32,
    ceiling: i32,
    reset: i32,
}

impl ZCounter {
    /// Counter for nodes: `1, 2, ...` wrapping back to zero at `i32::MAX`
    pub const fn nodes() -> Self {
        Self {
            value: 0,
            floor: 0,
            ceiling: i32::MAX,
            reset: 0,
        }
    }

    /// Counter for connections: from `i32::MIN + 2` upwards, wrapping below zero
    pub const fn connections() -> Self {
        Self {
            value: i32::MIN + 1,
            floor: i32::MIN + 1,
            ceiling: 0,
            reset: i32::MIN,
        }
    }

    /// Take the next stamp
    pub fn next(&mut self) -> i32 {
        self.value += 1;
        if self.value >= self.ceiling {
            self.value = self.floor;
        }
        self.value
    }

    /// Last stamp handed out
    pub fn current(&self) -> i32 {
        self.value
    }

    /// Restart the sequence
    pub fn reset(&mut self) {
        self.value = self.reset;
    }
}

#[derive(Debug)]
struct ZOrderState {
    nodes: ZCounter,
    connections: ZCounter,
}

/// Shared handle to the node and connection counters.
///
/// Canvases created with [`crate::Scene::new`] share the process-wide
/// instance from [`ZOrderService::global`]; tests inject a private one.
#[derive(Debug, Clone)]
pub struct ZOrderService {
    state: Arc<Mutex<ZOrderState>>,
}

impl Default for ZOrderService {
    fn default() -> Self {
        Self::new()
    }
}

impl ZOrderService {
    /// Fresh, unshared counters
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(ZOrderState {
                nodes: ZCounter::nodes(),
                connections: ZCounter::connections(),
            })),
        }
    }

    /// Process-wide counters
    pub fn global() -> Self {
        static GLOBAL: OnceLock<ZOrderService> = OnceLock::new();
        GLOBAL.get_or_init(Self::new).clone()
    }

    /// Next node stamp
    pub fn next_node(&self) -> i32 {
        self.state.lock().nodes.next()
    }

    /// Next connection stamp
    pub fn next_connection(&self) -> i32 {
        self.state.lock().connections.next()
    }

    /// Restart both sequences
    pub fn reset(&self) {
        let mut state = self.state.lock();
        state.nodes.reset();
        state.connections.reset();
    }

    /// Whether two handles share the same counters
    pub fn shares_with(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_counter_wraps_to_zero() {
        let mut counter = ZCounter::nodes();
        assert_eq!(counter.next(), 1);
        counter.value = i32::MAX - 1;
        assert_eq!(counter.next(), 0);
        assert_eq!(counter.next(), 1);
    }

    #[test]
    fn test_connection_counter_stays_negative() {
        let mut counter = ZCounter::connections();
        assert_eq!(counter.next(), i32::MIN + 2);
        counter.value = -1;
        assert_eq!(counter.next(), i32::MIN + 1);
        counter.reset();
        assert_eq!(counter.current(), i32::MIN);
        assert_eq!(counter.next(), i32::MIN + 1);
    }

    #[test]
    fn test_connections_draw_below_nodes() {
        let service = ZOrderService::new();
        for _ in 0..10 {
            assert!(service.next_connection() < service.next_node());
        }
    }

    #[test]
    fn test_global_is_shared() {
        assert!(ZOrderService::global().shares_with(&ZOrderService::global()));
        assert!(!ZOrderService::new().shares_with(&ZOrderService::global()));
    }
}
