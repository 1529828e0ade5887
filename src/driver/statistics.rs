//! Capture and report statistics for a run

use std::{fmt::Display, time::Duration};

use indexmap::IndexMap;

use crate::eval::{machine::metrics::Metrics, memory::heap::HeapStats};

#[derive(Default, Debug)]
pub struct Timings {
    timings: IndexMap<String, Duration>,
}

impl Timings {
    pub fn record<T: AsRef<str>>(&mut self, name: T, elapsed: Duration) {
        self.timings.insert(name.as_ref().to_string(), elapsed);
    }

    pub fn get(&self, name: &str) -> Option<Duration> {
        self.timings.get(name).copied()
    }
}

impl Display for Timings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let width = self.timings.keys().map(|k| k.len()).max().unwrap_or(0) + 1;

        for (k, v) in &self.timings {
            writeln!(f, "{:width$}: {:14.9}s", k, v.as_secs_f64(), width = width)?;
        }
        Ok(())
    }
}

/// The statistics captured during a run
#[derive(Default, Debug)]
pub struct Statistics {
    machine_ticks: u64,
    machine_allocs: u64,
    machine_frees: u64,
    program_loads: u64,
    bytes_in: u64,
    bytes_out: u64,
    max_segments: usize,
    final_heap: HeapStats,
    timings: Timings,
}

impl Statistics {
    /// Take counts from machine metrics
    pub fn record_metrics(&mut self, metrics: &Metrics) {
        self.machine_ticks = metrics.ticks();
        self.machine_allocs = metrics.allocs();
        self.machine_frees = metrics.frees();
        self.program_loads = metrics.program_loads();
        self.bytes_in = metrics.bytes_in();
        self.bytes_out = metrics.bytes_out();
        self.max_segments = metrics.max_segments();
    }

    /// Take the heap occupancy at the end of the run
    pub fn record_heap(&mut self, heap: HeapStats) {
        self.final_heap = heap;
    }

    pub fn final_heap(&self) -> &HeapStats {
        &self.final_heap
    }

    pub fn ticks(&self) -> u64 {
        self.machine_ticks
    }

    pub fn allocs(&self) -> u64 {
        self.machine_allocs
    }

    pub fn bytes_out(&self) -> u64 {
        self.bytes_out
    }

    pub fn timings(&self) -> &Timings {
        &self.timings
    }

    pub fn timings_mut(&mut self) -> &mut Timings {
        &mut self.timings
    }
}

impl Display for Statistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Machine Ticks  : {:10}", self.machine_ticks)?;
        writeln!(f, "Machine Allocs : {:10}", self.machine_allocs)?;
        writeln!(f, "Machine Frees  : {:10}", self.machine_frees)?;
        writeln!(f, "Program Loads  : {:10}", self.program_loads)?;
        writeln!(f, "Max Arrays     : {:10}", self.max_segments)?;
        writeln!(f, "Bytes In       : {:10}", self.bytes_in)?;
        writeln!(f, "Bytes Out      : {:10}", self.bytes_out)?;
        writeln!(f, "Final Heap     : {}", self.final_heap)?;
        writeln!(f)?;
        writeln!(f, "{}", self.timings)
    }
}
