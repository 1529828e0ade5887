//! Load and run a program image, reporting failures as diagnostics
use crate::{
    driver::{error::UmError, image, options::UmOptions},
    eval::{
        channel::{InputChannel, OutputChannel, ReadChannel, WriteChannel},
        machine::vm::Machine,
        memory::heap::Heap,
    },
};
use codespan_reporting::{
    diagnostic::Diagnostic,
    files::SimpleFiles,
    term::{
        self,
        termcolor::{ColorChoice, NoColor, StandardStream},
    },
};

use std::{
    io::{self, Read, Write},
    time::Instant,
};

use super::statistics::Statistics;

/// Run the program selected by the options against stdin and stdout
pub fn run(opt: &UmOptions) -> Result<Statistics, UmError> {
    let mut stats = Statistics::default();
    let mut executor = Executor::default();
    executor.execute(opt, &mut stats)?;
    Ok(stats)
}

/// Runs programs, optionally against overridden streams
#[derive(Default)]
pub struct Executor<'a> {
    /// Overriden input stream
    input: Option<Box<dyn Read + 'a>>,

    /// Overriden output stream
    out: Option<Box<dyn Write + 'a>>,

    /// Error stream
    err: Option<Box<dyn Write + 'a>>,
}

impl<'a> Executor<'a> {
    /// Provide an override stream to feed the input instruction
    pub fn capture_input(&mut self, input: Box<dyn Read + 'a>) {
        self.input = Some(input);
    }

    /// Provide override streams to capture the output to stdout and stderr
    pub fn capture_output(&mut self, out: Box<dyn Write + 'a>, err: Box<dyn Write + 'a>) {
        self.out = Some(out);
        self.err = Some(err);
    }

    /// Load and run the program, diagnosing any failure
    pub fn execute(&mut self, opt: &UmOptions, stats: &mut Statistics) -> Result<(), UmError> {
        let result = self.try_execute(opt, stats);
        self.diagnose(result)
    }

    fn try_execute(&mut self, opt: &UmOptions, stats: &mut Statistics) -> Result<(), UmError> {
        let program = {
            let t = Instant::now();
            let program = image::load(opt.program())?;
            stats.timings_mut().record("load", t.elapsed());
            program
        };

        let heap = match opt.heap_limit_mib() {
            Some(mib) => Heap::with_limit(program, mib),
            None => Heap::new(program),
        };

        let input: Box<dyn InputChannel + '_> = match self.input.as_mut() {
            Some(input) => Box::new(ReadChannel::new(input)),
            None => Box::new(ReadChannel::new(io::stdin().lock())),
        };

        let output: Box<dyn OutputChannel + '_> = match self.out.as_mut() {
            Some(out) => Box::new(WriteChannel::new(out)),
            None => Box::new(WriteChannel::new(io::stdout().lock())),
        };

        let mut machine = Machine::with_heap(heap, input, output);

        let t = Instant::now();
        let ret = machine.run(opt.limit());
        stats.timings_mut().record("execute", t.elapsed());
        stats.record_metrics(machine.metrics());
        stats.record_heap(machine.heap_stats());

        Ok(ret?)
    }

    /// Print any errors as diagnoses to stderr
    fn diagnose(&mut self, result: Result<(), UmError>) -> Result<(), UmError> {
        if let Err(e) = &result {
            self.diagnose_to_stderr(&e.to_diagnostic());
        }
        result
    }

    /// Print a diagnostic to stderr
    fn diagnose_to_stderr(&mut self, diag: &Diagnostic<usize>) {
        let config = term::Config::default();
        let files: SimpleFiles<String, String> = SimpleFiles::new();
        let emitted = match self.err {
            None => term::emit(
                &mut StandardStream::stderr(ColorChoice::Auto),
                &config,
                &files,
                diag,
            ),
            Some(ref mut err) => term::emit(&mut NoColor::new(err.as_mut()), &config, &files, diag),
        };

        if emitted.is_err() {
            eprintln!("error: {}", diag.message);
        }
    }
}
