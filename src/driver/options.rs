//! Command line argument handling with clap v4

use clap::Parser;
use std::path::PathBuf;

/// Run a program image on the machine
#[derive(Parser, Debug, Clone)]
#[command(name = "um")]
#[command(about = "Run a program image on the segmented-array machine")]
#[command(version)]
pub struct UmCli {
    /// Print metrics to stderr before exiting
    #[arg(short = 'S', long = "statistics")]
    pub statistics: bool,

    /// Fail if the program has not halted after this many instructions
    #[arg(short = 'l', long = "limit", value_name = "STEPS")]
    pub limit: Option<usize>,

    /// Cap the words held in arrays at this many MiB
    #[arg(short = 'm', long = "heap-limit-mib", value_name = "MIB")]
    pub heap_limit_mib: Option<usize>,

    /// Explain what would be executed without running
    #[arg(long = "explain")]
    pub explain: bool,

    /// Program image to run
    #[arg(value_name = "PROGRAM")]
    pub program: PathBuf,
}

/// Resolved options for a run
#[derive(Debug, Clone, Default)]
pub struct UmOptions {
    program: PathBuf,
    statistics: bool,
    limit: Option<usize>,
    heap_limit_mib: Option<usize>,
    explain: bool,
}

impl From<UmCli> for UmOptions {
    fn from(cli: UmCli) -> Self {
        UmOptions {
            program: cli.program,
            statistics: cli.statistics,
            limit: cli.limit,
            heap_limit_mib: cli.heap_limit_mib,
            explain: cli.explain,
        }
    }
}

impl UmOptions {
    /// Parse command line arguments
    pub fn from_args() -> Self {
        UmOptions::from(UmCli::parse())
    }

    /// Options to run `program` with everything else defaulted
    pub fn for_program<P: Into<PathBuf>>(program: P) -> Self {
        UmOptions {
            program: program.into(),
            ..Default::default()
        }
    }

    pub fn program(&self) -> &PathBuf {
        &self.program
    }

    pub fn statistics(&self) -> bool {
        self.statistics
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    pub fn heap_limit_mib(&self) -> Option<usize> {
        self.heap_limit_mib
    }

    pub fn explain(&self) -> bool {
        self.explain
    }

    pub fn with_statistics(mut self) -> Self {
        self.statistics = true;
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_heap_limit_mib(mut self, mib: usize) -> Self {
        self.heap_limit_mib = Some(mib);
        self
    }

    /// Produce a dry run explanation of the selected options
    pub fn explanation(&self) -> String {
        let mut explanation = String::new();

        explanation.push_str(&format!(
            "um will run the program image {}\n\n",
            self.program.display()
        ));

        explanation.push_str("Input: stdin\nOutput: stdout\n\n");

        match self.limit {
            Some(steps) => explanation.push_str(&format!("Step limit: {steps}\n")),
            None => explanation.push_str("Step limit: none\n"),
        }
        match self.heap_limit_mib {
            Some(mib) => explanation.push_str(&format!("Heap limit: {mib} MiB\n")),
            None => explanation.push_str("Heap limit: none\n"),
        }

        if self.statistics {
            explanation.push_str("\nOther options:\n");
            explanation.push_str(" • print statistics to stderr\n");
        }

        explanation
    }
}
