//! Kelp CLI - Play movies and effects on the cube from JSON configuration.

#[cfg(feature = "dhat-heap")]
#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

use std::fs;
use std::path::PathBuf;

use kelp::{
    animation::{Container, ContainerRecorder, RecorderConfig},
    compute::pattern,
    playback::{ControlState, PlaybackReport, Scheduler, SystemClock, spawn_stdin_watcher},
    schema::PlayerConfig,
    transport::{MessageChannel, UdpChannel, brightness_message},
};

fn main() {
    #[cfg(feature = "dhat-heap")]
    let _profiler = dhat::Profiler::new_heap();

    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <config.json> [movie.raw | effect-name | --test-pattern]", args[0]);
        eprintln!();
        eprintln!("Play raw888 movies and effects on the kelp cube.");
        eprintln!();
        eprintln!("Arguments:");
        eprintln!("  config.json     Path to player configuration file");
        eprintln!("  movie.raw       Play one movie instead of the effect rotation");
        eprintln!("  effect-name     Play one effect from the catalog");
        eprintln!("  --test-pattern  Play the generated XYZ sweep");
        eprintln!();
        eprintln!("Press return to skip to the next effect.");
        eprintln!("Example configuration is generated with --example flag.");
        std::process::exit(1);
    }

    if args[1] == "--example" {
        print_example_config();
        return;
    }

    let config_path = PathBuf::from(&args[1]);

    // Load configuration
    let config_str = fs::read_to_string(&config_path).unwrap_or_else(|e| {
        eprintln!("Error reading config file: {}", e);
        std::process::exit(1);
    });

    let config = PlayerConfig::from_json(&config_str).unwrap_or_else(|e| {
        eprintln!("Error in config: {}", e);
        std::process::exit(1);
    });

    let targets = connect_targets(&config.targets);
    if targets.is_empty() {
        eprintln!("No reachable targets");
        std::process::exit(1);
    }

    let mut control = config.control.as_deref().and_then(|bind| {
        UdpChannel::listen(bind)
            .map_err(|e| log::warn!("Control listener on {} unavailable: {}", bind, e))
            .ok()
    });

    println!("Kelp Player");
    println!("===========");
    println!("Targets: {}", targets.len());
    println!("FPS: {}", config.fps);
    println!("Transform: {:?}", config.transform.map(|m| m.rows()));
    println!();

    let mut keyboard = spawn_stdin_watcher();
    let mut scheduler = Scheduler::new(config.settings(), targets, SystemClock::new());
    scheduler.broadcast(&brightness_message(1.0));

    let playlist = config.playlist();
    let report = match args.get(2).map(String::as_str) {
        Some("--test-pattern") => {
            let container = test_pattern().unwrap_or_else(|e| {
                eprintln!("Error building test pattern: {}", e);
                std::process::exit(1);
            });
            scheduler.play_movie(&container, config.duration(), &mut keyboard)
        }
        Some(name) if playlist.find(name).is_some() => {
            match playlist.play_named(&mut scheduler, name, config.duration(), &mut keyboard) {
                Some(report) => Ok(report),
                None => std::process::exit(1),
            }
        }
        Some(path) => scheduler.open_and_play(path, config.duration(), &mut keyboard),
        None => {
            if !playlist.entries().iter().any(|e| e.auto) {
                eprintln!("No effects in the rotation");
                std::process::exit(1);
            }
            let mut state = ControlState::new();
            loop {
                let channel = control.as_mut().map(|c| c as &mut dyn MessageChannel);
                for played in playlist.run_once(&mut scheduler, channel, &mut keyboard, &mut state) {
                    if let Some(report) = played.report {
                        log::debug!("{}: {:?}", played.name, report);
                    }
                }
            }
        }
    };

    match report {
        Ok(report) => print_report(&report),
        Err(e) => {
            eprintln!("Playback failed: {}", e);
            std::process::exit(1);
        }
    }
}

fn connect_targets(targets: &[String]) -> Vec<Box<dyn MessageChannel>> {
    let mut channels: Vec<Box<dyn MessageChannel>> = Vec::new();
    for target in targets {
        match UdpChannel::connect(target) {
            Ok(channel) => channels.push(Box::new(channel)),
            Err(e) => log::warn!("Skipping target {}: {}", target, e),
        }
    }
    channels
}

/// The XYZ sweep as an in-memory container.
fn test_pattern() -> std::io::Result<Container> {
    let mut recorder = ContainerRecorder::new(Vec::new(), RecorderConfig { with_header: false })?;
    for frame in pattern::xyz_sweep() {
        recorder.record_frame(&frame)?;
    }
    let bytes = recorder.finalize()?;
    Container::from_bytes(bytes).map_err(std::io::Error::other)
}

fn print_report(report: &PlaybackReport) {
    println!();
    println!("Playback ended: {:?}", report.reason);
    println!("  Frames sent: {}", report.ticks);
    println!("  Loops: {}", report.loops);
    println!("  Failed sends: {}", report.transmit_failures);
    println!(
        "  Time: {:.2}s ({:.1} fps)",
        report.elapsed.as_secs_f32(),
        report.ticks as f32 / report.elapsed.as_secs_f32().max(f32::EPSILON)
    );
}

fn print_example_config() {
    let config = PlayerConfig::default();

    match serde_json::to_string_pretty(&config) {
        Ok(json) => {
            println!("Example configuration (config.json):");
            println!("{}", json);
        }
        Err(e) => eprintln!("Error serializing config: {}", e),
    }
}
