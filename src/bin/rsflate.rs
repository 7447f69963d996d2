use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;
use log::{Level, LevelFilter, Log, Metadata, Record};
use rsflate::{
    decompress_stream, CompressionLevel, DeflateConfig, Format, InflateConfig, ParallelCompressor,
    SingleThreadedCompressor, Strategy, StreamCompressor,
};

#[derive(Parser, Debug)]
#[command(name = "rsflate")]
#[command(about = "Compress or decompress DEFLATE, zlib and gzip streams")]
#[command(version)]
struct Args {
    /// Input file (use - for stdin)
    #[arg(short, long, default_value = "-")]
    input: PathBuf,

    /// Output file (use - for stdout)
    #[arg(short, long, default_value = "-")]
    output: PathBuf,

    /// Decompress instead of compress
    #[arg(short, long)]
    decompress: bool,

    /// Compression level (0-9)
    #[arg(short, long, default_value = "6", value_parser = clap::value_parser!(u8).range(0..=9))]
    level: u8,

    /// Container format: raw, zlib, gzip (auto detects zlib or gzip when decompressing)
    #[arg(long, value_parser = parse_format)]
    format: Option<Format>,

    /// Compression strategy: default, filtered, huffman-only, rle, fixed
    #[arg(long, default_value = "default", value_parser = parse_strategy)]
    strategy: Strategy,

    /// Number of threads (0 = auto, 1 = single-threaded)
    #[arg(short = 't', long, default_value = "1")]
    threads: usize,

    /// Show verbose statistics (repeat for debug logging)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only report errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

fn parse_format(name: &str) -> Result<Format, String> {
    Format::from_name(name).ok_or_else(|| format!("unknown format '{}'", name))
}

fn parse_strategy(name: &str) -> Result<Strategy, String> {
    Strategy::from_name(name).ok_or_else(|| format!("unknown strategy '{}'", name))
}

/// Writes log records to stderr
struct StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            eprintln!("[{}] {}", record.level(), record.args());
        }
    }

    fn flush(&self) {}
}

static LOGGER: StderrLogger = StderrLogger;

fn init_logging(args: &Args) {
    let level = if args.quiet {
        LevelFilter::Error
    } else {
        match args.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level);
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(&args);
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn is_stdio(path: &Path) -> bool {
    path.to_str() == Some("-")
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let input: Box<dyn Read> = if is_stdio(&args.input) {
        Box::new(io::stdin().lock())
    } else {
        Box::new(BufReader::new(File::open(&args.input)?))
    };
    let output: Box<dyn Write> = if is_stdio(&args.output) {
        Box::new(io::stdout().lock())
    } else {
        Box::new(BufWriter::new(File::create(&args.output)?))
    };

    let start = Instant::now();
    if args.decompress {
        let config = InflateConfig { format: args.format.unwrap_or(Format::Auto), ..Default::default() };
        let stats = decompress_stream(input, output, &config)?;
        let elapsed = start.elapsed();

        if log::log_enabled!(Level::Info) {
            eprintln!("Decompression complete:");
            eprintln!("  Input bytes:      {}", stats.input_bytes);
            eprintln!("  Output bytes:     {}", stats.output_bytes);
            eprintln!("  Members:          {}", stats.members);
            if stats.trailing_bytes > 0 {
                eprintln!("  Trailing bytes:   {}", stats.trailing_bytes);
            }
            eprintln!("  Time:             {:.2?}", elapsed);
            eprintln!(
                "  Throughput:       {:.1} MB/s",
                stats.output_bytes as f64 / elapsed.as_secs_f64() / 1_000_000.0
            );
        }
        return Ok(());
    }

    let format = args.format.unwrap_or(Format::Gzip);
    if format == Format::Auto {
        return Err("auto format is only valid when decompressing".into());
    }
    let config = DeflateConfig {
        level: CompressionLevel::from_level(args.level),
        strategy: args.strategy,
        format,
        num_threads: args.threads,
        ..Default::default()
    };
    config.validate()?;

    let stats = if config.num_threads == 1 {
        SingleThreadedCompressor::new(config).compress_stream(input, output)?
    } else {
        ParallelCompressor::new(config).compress_stream(input, output)?
    };
    let elapsed = start.elapsed();

    if log::log_enabled!(Level::Info) {
        eprintln!("Compression complete:");
        eprintln!("  Input bytes:      {}", stats.input_bytes);
        eprintln!("  Output bytes:     {}", stats.output_bytes);
        eprintln!(
            "  Ratio:            {:.3}",
            stats.output_bytes as f64 / stats.input_bytes.max(1) as f64
        );
        eprintln!("  Chunks:           {}", stats.chunks);
        eprintln!("  Checksum:         {:08x}", stats.checksum);
        eprintln!("  Time:             {:.2?}", elapsed);
        eprintln!(
            "  Throughput:       {:.1} MB/s",
            stats.input_bytes as f64 / elapsed.as_secs_f64() / 1_000_000.0
        );
    }
    Ok(())
}
