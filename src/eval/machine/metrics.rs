//! Machine metrics

use std::cmp::max;

/// Record some metrics as we execute code
#[derive(Default, Debug, Clone)]
pub struct Metrics {
    ticks: u64,
    allocs: u64,
    frees: u64,
    program_loads: u64,
    bytes_in: u64,
    bytes_out: u64,
    max_segments: usize,
}

impl Metrics {
    /// Start counting with `live_segments` already live
    pub fn new(live_segments: usize) -> Self {
        Metrics {
            max_segments: live_segments,
            ..Default::default()
        }
    }

    pub fn tick(&mut self) {
        self.ticks += 1;
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Record an allocation and the resulting number of live segments
    pub fn alloc(&mut self, live_segments: usize) {
        self.allocs += 1;
        self.max_segments = max(self.max_segments, live_segments);
    }

    pub fn allocs(&self) -> u64 {
        self.allocs
    }

    pub fn free(&mut self) {
        self.frees += 1;
    }

    pub fn frees(&self) -> u64 {
        self.frees
    }

    /// Record a program replacement (not a jump within the program)
    pub fn program_load(&mut self) {
        self.program_loads += 1;
    }

    pub fn program_loads(&self) -> u64 {
        self.program_loads
    }

    pub fn byte_in(&mut self) {
        self.bytes_in += 1;
    }

    pub fn bytes_in(&self) -> u64 {
        self.bytes_in
    }

    pub fn byte_out(&mut self) {
        self.bytes_out += 1;
    }

    pub fn bytes_out(&self) -> u64 {
        self.bytes_out
    }

    pub fn max_segments(&self) -> usize {
        self.max_segments
    }
}
