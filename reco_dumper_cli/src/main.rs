//! # reco_dumper_cli
//!
//! Part of the reco_dumper crate family.
//!
//! Command line application to dump ANNIE reco readouts.
//!
//! ## Use
//!
//! Make a template configuration with
//!
//! ```bash
//! reco_dumper_cli -p config.yml new
//! ```
//!
//! fill it out, and then run
//!
//! ```bash
//! reco_dumper_cli -p config.yml
//! ```
//!
//! Terminal output is kept short; the full log (including every rejected event) is
//! written to `reco_dumper.log` in the working directory. Pass `-v` to also log each
//! pulse written.
use clap::{Arg, ArgAction, Command};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use indicatif_log_bridge::LogWrapper;
use std::collections::HashMap;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{mpsc, Arc};

use libreco_dumper::config::Config;
use libreco_dumper::process::{create_subsets, process_subset};
use libreco_dumper::worker_status::WorkerStatus;

const LOG_FILE: &str = "./reco_dumper.log";

fn make_template_config(path: &Path) {
    let config = Config::default();
    let yaml_str = serde_yaml::to_string(&config).unwrap();
    let mut file = File::create(path).expect("Could create template config file!");
    file.write_all(yaml_str.as_bytes())
        .expect("Failed to write yaml data to file!");
}

/// The library logs through spdlog; send it to a file
fn setup_file_logger(verbose: bool) -> Result<(), spdlog::Error> {
    let file_sink = Arc::new(
        spdlog::sink::FileSink::builder()
            .path(PathBuf::from(LOG_FILE))
            .formatter(Box::new(spdlog::formatter::PatternFormatter::new(
                spdlog::formatter::pattern!(
                    "[{date_short} {time_short}] - [thread: {tid}] - [{^{level}}] - {payload}{eol}"
                ),
            )))
            .truncate(true)
            .build()?,
    );
    let level_filter = if verbose {
        spdlog::LevelFilter::All
    } else {
        spdlog::LevelFilter::MoreSevereEqual(spdlog::Level::Info)
    };
    let logger = Arc::new(
        spdlog::Logger::builder()
            .level_filter(level_filter)
            .flush_level_filter(spdlog::LevelFilter::All)
            .sink(file_sink)
            .build()?,
    );
    spdlog::set_default_logger(logger);
    Ok(())
}

fn main() {
    // Create a cli
    let matches = Command::new("reco_dumper_cli")
        .arg_required_else_help(true)
        .subcommand(Command::new("new").about("Make a template configuration yaml file"))
        .arg(
            Arg::new("path")
                .short('p')
                .long("path")
                .required(true)
                .help("Path to the configuration file"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::SetTrue)
                .help("Log every pulse written to the log file"),
        )
        .get_matches();

    // Initialize feedback
    let logger = simplelog::TermLogger::new(
        simplelog::LevelFilter::Info,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    );

    let pb_manager = MultiProgress::new();

    LogWrapper::new(pb_manager.clone(), logger)
        .try_init()
        .expect("Could not create logging/progress!");

    if let Err(e) = setup_file_logger(matches.get_flag("verbose")) {
        log::warn!("Could not create log file {LOG_FILE}: {e}");
    }

    // Parse the cli
    let config_path = PathBuf::from(matches.get_one::<String>("path").expect("We require args"));

    if let Some(("new", _)) = matches.subcommand() {
        log::info!(
            "Making a template config at {}...",
            config_path.to_string_lossy()
        );

        make_template_config(&config_path);
        log::info!("Done.");
        return;
    }

    // Load our config
    log::info!("Loading config from {}...", config_path.to_string_lossy());
    let config = match Config::read_config_file(&config_path) {
        Ok(c) => c,
        Err(e) => {
            log::error!("{e}");
            return;
        }
    };
    log::info!("Config successfully loaded.");
    log::info!("Input Path: {}", config.input_path.to_string_lossy());
    log::info!("Output Path: {}", config.output_path.to_string_lossy());
    log::info!(
        "Channel Map Path: {}",
        config.channel_map_path.to_string_lossy()
    );
    log::info!(
        "First Run: {} Last Run: {}",
        config.first_run_number,
        config.last_run_number
    );
    if !config.is_n_threads_valid() {
        log::error!("Number of threads must be at least 1, got {}", config.n_threads);
        return;
    }

    // Spawn the workers, one progress bar each
    let style = ProgressStyle::with_template("[{bar:40.cyan/blue}] {pos:>3}% {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    let (tx, rx) = mpsc::channel::<WorkerStatus>();
    let mut bars: HashMap<usize, ProgressBar> = HashMap::new();
    let mut workers = Vec::new();
    for (idx, subset) in create_subsets(&config).into_iter().enumerate() {
        // Dont make empty workers
        if subset.is_empty() {
            continue;
        }
        let pb = pb_manager.add(ProgressBar::new(100));
        pb.set_style(style.clone());
        bars.insert(idx, pb);
        let conf = config.clone();
        let worker_tx = tx.clone();
        workers.push(std::thread::spawn(move || {
            process_subset(conf, worker_tx, idx, subset)
        }));
    }
    // Only the workers hold senders now, so the loop ends once they are all done
    drop(tx);

    for status in rx.iter() {
        if let Some(pb) = bars.get(&status.worker_id) {
            pb.set_position((status.progress * 100.0) as u64);
            pb.set_message(format!(
                "Run {} ({} rejected)",
                status.run_number, status.rejected_events
            ));
        }
    }

    for worker in workers {
        match worker.join() {
            Ok(Ok(())) => log::info!("Worker complete"),
            Ok(Err(e)) => {
                log::error!("Processing failed with error: {e}");
                spdlog::error!("Processor error: {e}");
            }
            Err(_) => log::error!("Failed to join one of the workers!"),
        }
    }

    for pb in bars.values() {
        pb.finish();
    }

    log::info!("Done. Details are in {LOG_FILE}.");
}
