extern crate platter;

use std::process;

use platter::driver::eval;
use platter::driver::options::UmOptions;
use platter::driver::statistics::Statistics;

pub fn main() {
    let opt = UmOptions::from_args();

    // For a dry run, just explain the options
    if opt.explain() {
        println!("{}", opt.explanation());
        process::exit(0);
    }

    // run manages error reporting
    match eval::run(&opt) {
        Ok(stats) => exit(&opt, 0, Some(&stats)),
        Err(_) => exit(&opt, 1, None),
    }
}

/// Optionally dump stats to stderr then exit
pub fn exit(opts: &UmOptions, code: i32, stats: Option<&Statistics>) {
    if let (true, Some(stats)) = (opts.statistics(), stats) {
        eprintln!();
        eprintln!("~~~~~~~~~~");
        eprintln!("STATISTICS");
        eprintln!("~~~~~~~~~~");
        eprintln!();
        eprintln!("{stats}");
    }
    process::exit(code)
}
