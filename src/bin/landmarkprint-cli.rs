use std::path::{Path, PathBuf};
use std::process;
use std::thread;

use clap::{App, Arg};

use landmarkprint::audio::Decoder;
use landmarkprint::config::Config;
use landmarkprint::fingerprint::{self, Fingerprint};
use landmarkprint::matcher::{self, MatchOptions, MatchReport};
use landmarkprint::output::{MatchOutput, OutputFormat};
use landmarkprint::{LandmarkError, Result};

fn main() {
    let matches = App::new("landmarkprint")
        .version(landmarkprint::VERSION)
        .about("Locates where a short query clip occurs inside a longer reference clip")
        .arg(
            Arg::with_name("query")
                .required(true)
                .index(1)
                .help("Query audio file (the short clip)"),
        )
        .arg(
            Arg::with_name("reference")
                .required(true)
                .index(2)
                .help("Reference audio file (the longer clip to search)"),
        )
        .arg(
            Arg::with_name("format")
                .short("f")
                .long("format")
                .value_name("FORMAT")
                .help("Output format: simple, json, csv")
                .takes_value(true)
                .default_value("simple"),
        )
        .arg(
            Arg::with_name("no-cache")
                .long("no-cache")
                .help("Disable the fingerprint cache"),
        )
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .long("verbose")
                .help("Enable verbose debug output"),
        )
        .get_matches();

    let query_path = PathBuf::from(matches.value_of("query").unwrap());
    let reference_path = PathBuf::from(matches.value_of("reference").unwrap());

    let format = match matches.value_of("format").unwrap() {
        "json" => OutputFormat::Json,
        "csv" => OutputFormat::Csv,
        _ => OutputFormat::Simple,
    };
    let use_cache = !matches.is_present("no-cache");
    let verbose = matches.is_present("verbose");

    let config = Config::default()
        .with_use_cache(use_cache)
        .with_quiet_mode(!verbose);

    match run(&query_path, &reference_path, config.clone()) {
        Ok(report) => {
            if format == OutputFormat::Csv {
                println!("{}", MatchOutput::csv_header());
            }
            let output = MatchOutput::format_result(&report, format, config.confidence_threshold);
            println!("{}", output);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

/// Fingerprints the query and reference files on two worker threads, then
/// matches the results, mirroring the teacher's `std::thread`/channel use in
/// its continuous-recognition pipeline.
fn run(query_path: &Path, reference_path: &Path, config: Config) -> Result<MatchReport> {
    let query_path = query_path.to_path_buf();
    let reference_path = reference_path.to_path_buf();
    let query_config = config.clone();
    let reference_config = config.clone();

    let query_handle = thread::spawn(move || fingerprint_path(&query_path, query_config));
    let reference_handle =
        thread::spawn(move || fingerprint_path(&reference_path, reference_config));

    let query_fp = query_handle.join().expect("query thread panicked")?;
    let reference_fp = reference_handle.join().expect("reference thread panicked")?;

    let options = MatchOptions::from(&config);
    Ok(matcher::match_fingerprints(&query_fp, &reference_fp, &options))
}

fn fingerprint_path(path: &Path, config: Config) -> Result<Vec<Fingerprint>> {
    if config.use_cache {
        match fingerprint::load_cache(path) {
            Ok(Some(cached)) => return Ok(cached),
            Ok(None) => {}
            Err(LandmarkError::MalformedCache(_)) => {}
            Err(e) => return Err(e),
        }
    }

    let decoder = Decoder::new();
    let fingerprints = decoder.decode_and_fingerprint(path, config.clone())?;

    if config.use_cache {
        fingerprint::save_cache(path, &fingerprints)?;
    }

    Ok(fingerprints)
}
