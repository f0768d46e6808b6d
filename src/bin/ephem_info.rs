//! JPL Ephemeris Information Tool
//!
//! Prints the DAF header, segment table, covered bodies and comment area of
//! an SPK (.bsp) file.
//!
//! Usage:
//!   cargo run --bin ephem_info -- [--comments] [--debug] [path/to/ephem.bsp]

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::Instant;

use clap::{ArgAction, Parser};
use env_logger::{Builder, Target};
use skytrack::data::{get_cache_dir, DEFAULT_EPHEMERIS};
use skytrack::jplephem::{calendar, names, spk::seconds_to_jd, SPK};

type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Displays the header, segments and comments of a JPL SPK ephemeris file",
    long_about = None
)]
struct Args {
    /// Display only file comments
    #[arg(short, long, action = ArgAction::SetTrue)]
    comments: bool,

    /// Dump the raw DAF summaries
    #[arg(short, long, action = ArgAction::SetTrue)]
    debug: bool,

    /// Ephemeris file to analyze (defaults to the cached de421.bsp)
    filename: Option<PathBuf>,
}

/// Format bytes as KB, MB, or GB
fn format_size(size_bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size_bytes >= GB {
        format!("{:.2} GB", size_bytes as f64 / GB as f64)
    } else if size_bytes >= MB {
        format!("{:.2} MB", size_bytes as f64 / MB as f64)
    } else if size_bytes >= KB {
        format!("{:.2} KB", size_bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", size_bytes)
    }
}

fn body_label(id: i32) -> String {
    match names::target_name(id) {
        Some(name) => format!("{} ({})", names::titlecase(name), id),
        None => format!("Unknown ({})", id),
    }
}

fn print_section_header(title: &str) {
    println!("\n{}:", title);
    println!("-------------------------------------------------------");
}

fn display_comments(spk: &SPK) {
    match spk.comments() {
        Ok(comments) if !comments.trim().is_empty() => {
            print_section_header("File Comments");
            println!("{}", comments);
        }
        Ok(_) => println!("\nNo comments found in file."),
        Err(e) => println!("\nFailed to read comments: {}", e),
    }
}

fn display_file_format(spk: &SPK) {
    print_section_header("File Format");
    println!("ID Word: {}", spk.daf.locidw);
    println!("Endian: {:?}", spk.daf.endian);
    println!("Internal name: {}", spk.daf.ifname);
    println!("Summary layout: ND={}, NI={}", spk.daf.nd, spk.daf.ni);
    println!(
        "Record pointers: FWARD={}, BWARD={}, FREE={}",
        spk.daf.fward, spk.daf.bward, spk.daf.free
    );
}

fn display_segments(spk: &SPK) {
    if spk.segments.is_empty() {
        println!("\nNo segments found in the file.");
        return;
    }

    print_section_header(&format!("Segments ({} total)", spk.segments.len()));
    let mut sorted: Vec<_> = spk.segments.iter().collect();
    sorted.sort_by_key(|s| (s.center, s.target));
    for segment in &sorted {
        println!("{}", segment);
    }

    let earliest = sorted.iter().map(|s| s.start_jd).fold(f64::INFINITY, f64::min);
    let latest = sorted.iter().map(|s| s.end_jd).fold(f64::NEG_INFINITY, f64::max);
    print_section_header("Overall Time Coverage");
    println!("Start date: {} (JD {:.1})", calendar::format_date(earliest), earliest);
    println!("End date: {} (JD {:.1})", calendar::format_date(latest), latest);
    println!("Duration: {:.1} years", (latest - earliest) / 365.25);

    let targets: BTreeSet<i32> = sorted.iter().map(|s| s.target).collect();
    let centers: BTreeSet<i32> = sorted.iter().map(|s| s.center).collect();
    print_section_header("Available Bodies");
    println!("Targets ({}):", targets.len());
    for id in &targets {
        println!("  - {}", body_label(*id));
    }
    println!("Centers ({}):", centers.len());
    for id in &centers {
        println!("  - {}", body_label(*id));
    }
}

fn display_debug_info(spk: &SPK) -> Result<()> {
    print_section_header("DAF Summaries");
    let summaries = spk.daf.summaries()?;
    println!("Found {} summaries", summaries.len());

    for (i, summary) in summaries.iter().enumerate() {
        println!("\nSummary {}: {:?}", i + 1, summary.name);
        println!("  Doubles: {:?}", summary.doubles);
        println!("  Integers: {:?}", summary.integers);
        if let [start, end, ..] = summary.doubles[..] {
            println!(
                "  Coverage: {} .. {}",
                calendar::format_date(seconds_to_jd(start)),
                calendar::format_date(seconds_to_jd(end))
            );
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    Builder::from_default_env()
        .target(Target::Stderr)
        .format_timestamp_secs()
        .format_module_path(false)
        .init();

    let args = Args::parse();
    let path = args
        .filename
        .unwrap_or_else(|| get_cache_dir().join(DEFAULT_EPHEMERIS));

    println!("Analyzing JPL Ephemeris file: {}", path.display());
    println!("File size: {}", format_size(std::fs::metadata(&path)?.len()));

    let start_time = Instant::now();
    let spk = SPK::open(&path)?;
    println!("File loaded in {:.2?}", start_time.elapsed());

    if args.comments {
        display_comments(&spk);
        return Ok(());
    }

    display_file_format(&spk);
    display_segments(&spk);
    if args.debug {
        display_debug_info(&spk)?;
    }
    display_comments(&spk);

    Ok(())
}
