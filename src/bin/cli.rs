//! hitline CLI: chart inspection, recording, autoplay and calibration.
//!
//! Usage:
//!   hl-cli info song.hlc
//!   hl-cli record take.log -o song.hlc
//!   hl-cli autoplay song.hlc --miss-every 5
//!   hl-cli play song.hlc --seconds 30
//!   hl-cli calibrate calibration.hlc take.log --nudge -2

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use hl_master::{
    analyze, load_play_config, CalibrationLoop, CalibrationOutcome, Chart, Controller, JsonSettings,
    PlayConfig, RecorderConfig, SettingsStore, SongMeta,
};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Parser)]
#[command(name = "hl-cli", about = "Rhythm chart tools and headless player")]
struct Args {
    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info", global = true)]
    log_level: log::LevelFilter,

    /// JSON file with play configuration overrides
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// JSON settings file holding the calibrated offset
    #[arg(long, default_value = "hitline-settings.json", global = true)]
    settings: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print chart metadata and statistics
    Info { chart: PathBuf },

    /// Turn a press/release log into a chart
    Record {
        log: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        #[arg(long)]
        title: Option<String>,
        /// Seconds subtracted from every press
        #[arg(long, default_value = "0")]
        offset: f64,
        #[arg(long)]
        calibration: bool,
    },

    /// Simulate a play-through and print the result
    Autoplay {
        chart: PathBuf,
        /// Skip every Nth note (0 plays every note)
        #[arg(long, default_value = "0")]
        miss_every: usize,
        /// Audio offset in timeline frames (defaults to the calibrated offset)
        #[arg(long, allow_hyphen_values = true)]
        offset_frames: Option<i32>,
    },

    /// Autoplay on the audio device against a click track
    Play {
        chart: PathBuf,
        #[arg(long)]
        seconds: Option<f64>,
        #[arg(long, default_value = "0")]
        miss_every: usize,
    },

    /// Judge a calibration take and store the offset on success
    Calibrate {
        chart: PathBuf,
        log: PathBuf,
        /// Offset steps applied before judging
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        nudge: i32,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();
    let _ = env_logger::builder().filter_level(args.log_level).try_init();

    let config = match &args.config {
        Some(path) => load_play_config(path)
            .with_context(|| format!("failed to read config {}", path.display()))?,
        None => PlayConfig::default(),
    };
    let settings = JsonSettings::open(&args.settings)
        .with_context(|| format!("failed to open settings {}", args.settings.display()))?;
    let mut ctrl = Controller::new(config, settings);

    match args.command {
        Command::Info { chart } => {
            load(&mut ctrl, &chart)?;
            if let Some(chart) = ctrl.chart() {
                print_info(chart);
            }
        }
        Command::Record { log, output, title, offset, calibration } => {
            let text = std::fs::read_to_string(&log)
                .with_context(|| format!("failed to read {}", log.display()))?;
            let inputs = hl_formats::parse_input_log(&text)?;
            let title = title.unwrap_or_else(|| file_stem(&output));
            let mut meta = SongMeta::new(&title);
            meta.is_calibration = calibration;
            let recorder = RecorderConfig {
                lane_count: ctrl.config().lane_count,
                offset_seconds: offset,
                ..RecorderConfig::default()
            };
            let chart = hl_formats::record(&inputs, recorder, meta);
            hl_formats::save_chart_file(&output, &chart)
                .with_context(|| format!("failed to write {}", output.display()))?;
            println!("Recorded {} notes to {}", chart.len(), output.display());
            print_info(&chart);
        }
        Command::Autoplay { chart, miss_every, offset_frames } => {
            load(&mut ctrl, &chart)?;
            let offset = offset_frames.unwrap_or_else(|| ctrl.offset_frames());
            let outcome = ctrl.autoplay_with_offset(miss_every, offset)?;
            let t = outcome.tally;
            println!("Offset:    {} frames", offset);
            println!("Perfect:   {}", t.perfect);
            println!("Good:      {}", t.good);
            println!("Miss:      {}", t.miss);
            println!("Holds:     {} completed, {} broken", t.holds_completed, t.holds_broken);
            println!("Pool:      {} notes", outcome.note_pool_capacity);
            print_report(&outcome.report);
        }
        Command::Play { chart, seconds, miss_every } => {
            load(&mut ctrl, &chart)?;
            ctrl.play(miss_every, seconds)?;
            println!("Playing...");
            while ctrl.is_playing() {
                if let Some(pos) = ctrl.position() {
                    print!("\rTime: {:7.2}s", pos);
                    let _ = std::io::stdout().flush();
                }
                std::thread::sleep(Duration::from_millis(10));
            }
            println!("\rDone.          ");
            if let Some(result) = ctrl.wait() {
                print_report(&result?);
            }
        }
        Command::Calibrate { chart, log, nudge } => {
            load(&mut ctrl, &chart)?;
            let text = std::fs::read_to_string(&log)
                .with_context(|| format!("failed to read {}", log.display()))?;
            let inputs = hl_formats::parse_input_log(&text)?;
            let mut cal = CalibrationLoop::new(ctrl.settings());
            for _ in 0..nudge.unsigned_abs() {
                if nudge > 0 {
                    cal.increase();
                } else {
                    cal.decrease();
                }
            }
            let (outcome, run) = ctrl.calibrate(&mut cal, inputs)?;
            print_report(&run.report);
            match outcome {
                CalibrationOutcome::Success { offset_frames } => {
                    println!("Calibrated: offset {} frames saved", offset_frames);
                }
                CalibrationOutcome::Failed { offset_frames } => {
                    bail!("calibration failed at offset {} frames; nudge and retry", offset_frames)
                }
            }
        }
    }
    Ok(())
}

fn load<S: SettingsStore>(ctrl: &mut Controller<S>, path: &Path) -> Result<()> {
    ctrl.load_chart_file(path)
        .with_context(|| format!("failed to load chart {}", path.display()))
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "Untitled".to_string())
}

fn print_info(chart: &Chart) {
    println!("Title:    {}", chart.meta.title);
    if !chart.meta.artist.is_empty() {
        println!("Artist:   {}", chart.meta.artist);
    }
    println!("Lanes:    {}", chart.lane_count());
    println!("Notes:    {} ({} judged)", chart.len(), chart.total_note_count());
    if chart.meta.is_calibration {
        println!("Calibration chart");
    }
    println!();
    print!("{}", analyze(chart));
}

fn print_report(report: &hl_master::SessionReport) {
    println!("Score:     {}", report.score);
    println!("Max combo: {}", report.max_combo);
    println!("Hits:      {}/{}", report.successful_hits, report.total_notes);
    println!("Rate:      {:.1}%", report.achievement_rate);
    if report.full_combo {
        println!("Full combo!");
    }
}
