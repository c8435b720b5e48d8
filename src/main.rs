use cachesim::{trace, Config, Simulation};
use clap::{Parser, ValueEnum};
use color_eyre::{eyre, Help};
use itertools::Itertools;
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::PathBuf;

const USAGE_HINT: &str = "\
cache_size: integer, must be a power of 2, for example 1024
associativity: one of direct, assoc or assoc:n, where n is a power of 2 and <= the number of blocks
replacement_policy: either fifo or lru
block_size: integer, must be a power of 2 and <= cache_size, for example 16
trace_file: path to a trace with one `<label> <R|W> 0x<address>` record per line";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Prefetch {
    Off,
    On,
    /// Simulate with and without prefetching side by side
    Both,
}

impl Prefetch {
    fn modes(self) -> &'static [bool] {
        match self {
            Self::Off => &[false],
            Self::On => &[true],
            Self::Both => &[false, true],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
    Csv,
}

#[derive(Debug, Parser)]
#[command(author, version, about = "Set-associative cache simulator", long_about = None)]
struct Options {
    /// Total cache size in bytes (power of two)
    #[arg(value_name = "CACHE_SIZE")]
    cache_size: u64,
    /// `direct`, `assoc` (fully associative) or `assoc:n`
    #[arg(value_name = "ASSOCIATIVITY")]
    associativity: String,
    /// `fifo` or `lru`
    #[arg(value_name = "REPLACEMENT_POLICY")]
    replacement_policy: String,
    /// Block size in bytes (power of two)
    #[arg(value_name = "BLOCK_SIZE")]
    block_size: u64,
    /// Trace of memory accesses
    #[arg(value_name = "TRACE_FILE")]
    trace_file: PathBuf,

    /// Prefetch the next block on a miss
    #[arg(long, value_enum, default_value_t = Prefetch::Both)]
    prefetch: Prefetch,
    /// Output format of the statistics
    #[arg(short, long, value_enum, default_value_t = Format::Text)]
    format: Format,
    /// Turn debugging information on
    #[arg(short, long, action = clap::ArgAction::Count)]
    debug: u8,
}

fn init_logging(debug: u8) {
    let level = match debug {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

/// Parses the cache parameters and opens the trace.
///
/// All failures are collected so that every bad argument is reported at once.
fn validate(options: &Options) -> Result<(Config, trace::Reader<BufReader<File>>), Vec<String>> {
    let config = Config::from_args(
        options.cache_size,
        &options.associativity,
        &options.replacement_policy,
        options.block_size,
    );
    let trace = trace::open(&options.trace_file);

    let mut errors = match config {
        Err(ref errors) => errors.iter().map(ToString::to_string).collect_vec(),
        Ok(_) => Vec::new(),
    };
    if let Err(ref err) = trace {
        let source = std::error::Error::source(err).map(ToString::to_string);
        errors.push(match source {
            Some(source) => format!("{err}: {source}"),
            None => err.to_string(),
        });
    }
    match (config, trace) {
        (Ok(config), Ok(trace)) => Ok((config, trace)),
        _ => Err(errors),
    }
}

fn write_stats(mut out: impl Write, format: Format, reports: &[stats::Stats]) -> eyre::Result<()> {
    match format {
        Format::Text => {
            for report in reports {
                write!(out, "{report}")?;
            }
        }
        Format::Json => {
            serde_json::to_writer_pretty(&mut out, reports)?;
            writeln!(out)?;
        }
        Format::Csv => {
            let mut writer = csv::Writer::from_writer(out);
            for row in reports.iter().copied().flat_map(stats::Stats::flatten) {
                writer.serialize(row)?;
            }
            writer.flush()?;
        }
    }
    Ok(())
}

fn main() -> eyre::Result<()> {
    color_eyre::install()?;
    let options = Options::parse();
    init_logging(options.debug);

    // validate everything before constructing any cache
    let (config, trace) = match validate(&options) {
        Ok(valid) => valid,
        Err(errors) => {
            return Err(eyre::eyre!(errors.join("\n"))).with_suggestion(|| USAGE_HINT);
        }
    };

    let geometry = config.geometry()?;
    log::info!(
        "simulating {} cache with {} replacement",
        geometry,
        config.replacement_policy
    );

    let mut simulations = options
        .prefetch
        .modes()
        .iter()
        .map(|&prefetch| Simulation::from_geometry(geometry, config.replacement_policy, prefetch))
        .collect_vec();

    let start = std::time::Instant::now();
    let num_accesses = cachesim::sim::replay(&mut simulations, trace)?;
    log::info!(
        "simulated {} accesses in {:?}",
        num_accesses,
        start.elapsed()
    );

    let reports = simulations.iter().map(Simulation::report).collect_vec();
    write_stats(std::io::stdout().lock(), options.format, &reports)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{validate, write_stats, Format, Options, Prefetch};
    use cachesim::config::{Associativity, Parameter};
    use clap::Parser;
    use similar_asserts as diff;

    fn options(args: &[&str]) -> Options {
        Options::parse_from(std::iter::once("cachesim").chain(args.iter().copied()))
    }

    fn reports() -> Vec<stats::Stats> {
        let cache = |mem_reads, hits, misses| stats::Cache {
            mem_reads,
            mem_writes: 2,
            hits,
            misses,
        };
        vec![
            stats::Stats::new(false, cache(3, 1, 3)),
            stats::Stats::new(true, cache(5, 2, 2)),
        ]
    }

    #[test]
    fn test_validate_reports_every_bad_argument() {
        let options = options(&["1000", "assoc:3", "random", "12", "/nonexistent/trace.txt"]);
        let errors = validate(&options).err().unwrap_or_default();
        diff::assert_eq!(have: errors.len(), want: 5);
        assert!(errors[0].contains("cache_size"));
        assert!(errors[1].contains("block_size"));
        assert!(errors[2].contains("associativity"));
        assert!(errors[3].contains("replacement_policy"));
        assert!(errors[3].contains("random"));
        assert!(errors[4].contains("/nonexistent/trace.txt"));
    }

    #[test]
    fn test_validate_unparsable_associativity() {
        let options = options(&["1024", "set:4", "lru", "16", "/nonexistent/trace.txt"]);
        let errors = validate(&options).err().unwrap_or_default();
        diff::assert_eq!(have: errors.len(), want: 2);
        diff::assert_eq!(
            have: &errors[0],
            want: &cachesim::config::Error::Parse {
                parameter: Parameter::Associativity,
                value: "set:4".to_string(),
            }
            .to_string()
        );
    }

    #[test]
    fn test_options_defaults() {
        let options = options(&["1024", "assoc:2", "LRU", "16", "trace.txt"]);
        diff::assert_eq!(have: options.prefetch, want: Prefetch::Both);
        diff::assert_eq!(have: options.format, want: Format::Text);
        diff::assert_eq!(
            have: options.associativity.parse::<Associativity>().ok(),
            want: Some(Associativity::Ways(2))
        );
    }

    #[test]
    fn test_prefetch_modes() {
        diff::assert_eq!(have: Prefetch::Off.modes(), want: &[false][..]);
        diff::assert_eq!(have: Prefetch::On.modes(), want: &[true][..]);
        diff::assert_eq!(have: Prefetch::Both.modes(), want: &[false, true][..]);
    }

    #[test]
    fn test_write_text() -> color_eyre::eyre::Result<()> {
        let mut out = Vec::new();
        write_stats(&mut out, Format::Text, &reports())?;
        let text = String::from_utf8(out)?;
        assert!(text.starts_with("Prefetch 0\nMemory reads: 3\n"));
        assert!(text.contains("Prefetch 1\nMemory reads: 5\nMemory writes: 2\n"));
        Ok(())
    }

    #[test]
    fn test_write_csv() -> color_eyre::eyre::Result<()> {
        let mut out = Vec::new();
        write_stats(&mut out, Format::Csv, &reports())?;
        let csv = String::from_utf8(out)?;
        let lines: Vec<&str> = csv.lines().collect();
        diff::assert_eq!(have: lines.len(), want: 9);
        diff::assert_eq!(have: lines[0], want: "prefetch,counter,value");
        diff::assert_eq!(have: lines[1], want: "false,mem_reads,3");
        diff::assert_eq!(have: lines[8], want: "true,misses,2");
        Ok(())
    }

    #[test]
    fn test_write_json() -> color_eyre::eyre::Result<()> {
        let mut out = Vec::new();
        write_stats(&mut out, Format::Json, &reports())?;
        let json: serde_json::Value = serde_json::from_slice(&out)?;
        let reports = json.as_array().cloned().unwrap_or_default();
        diff::assert_eq!(have: reports.len(), want: 2);
        diff::assert_eq!(have: &reports[0]["prefetch"], want: &serde_json::json!(false));
        diff::assert_eq!(have: &reports[1]["cache"]["hits"], want: &serde_json::json!(2));
        diff::assert_eq!(have: &reports[1]["cache"]["mem_reads"], want: &serde_json::json!(5));
        Ok(())
    }
}
