//! CLI that reads a WARC archive from stdin, drops ad-tainted response
//! records, and writes the survivors to a compacted output container.
//!
//! Usage: `filter_stdin [BLOCKLIST] [OUTPUT]`
//!
//! Summary lines go to stdout, diagnostics and run statistics to stderr.

use rs_warcfilter::{filter_archive, Blocklist};
use std::env;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::process;

const DEFAULT_BLOCKLIST: &str = "pihole.hosts";
const DEFAULT_OUTPUT: &str = "cache.warc";

fn main() {
    let args: Vec<String> = env::args().collect();
    let blocklist_path = args.get(1).map_or(DEFAULT_BLOCKLIST, String::as_str);
    let output_path = args.get(2).map_or(DEFAULT_OUTPUT, String::as_str);

    let blocklist = match Blocklist::from_path(blocklist_path) {
        Ok(list) => list,
        Err(e) => {
            eprintln!("failed to load blocklist {blocklist_path}: {e}");
            process::exit(1);
        }
    };

    let output = match File::create(output_path) {
        Ok(file) => file,
        Err(e) => {
            eprintln!("failed to create {output_path}: {e}");
            process::exit(1);
        }
    };
    let mut archive = BufWriter::new(output);

    let stdin = io::stdin();
    let stdout = io::stdout();
    let result = filter_archive(stdin.lock(), &blocklist, stdout.lock(), &mut archive);

    if let Err(e) = archive.flush() {
        eprintln!("failed to flush {output_path}: {e}");
        process::exit(1);
    }

    match result {
        Ok(stats) => {
            eprintln!(
                "{} records: {} responses, {} emitted, {} ads, {} skipped",
                stats.records, stats.responses, stats.emitted, stats.ads, stats.skipped
            );
        }
        Err(e) => {
            eprintln!("{e}");
            process::exit(1);
        }
    }
}
