//! Command-line entry point.

use clap::{Parser, Subcommand};
use snapmove_app::{Script, ShortcutRegistry};
use snapmove_core::{Scene, SnapConfig};
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

/// SnapMove - budgeted proximity and alignment snapping for 3D moves
#[derive(Parser, Debug)]
#[command(name = "snapmove", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replay an input script against a scene
    Run {
        /// Scene JSON file
        #[arg(value_name = "SCENE")]
        scene: PathBuf,

        /// Input script JSON file
        #[arg(value_name = "SCRIPT")]
        script: PathBuf,

        /// Snap settings JSON file (defaults apply when omitted)
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Write the resulting scene to this file
        #[arg(long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
    /// Print the key bindings of a snap move
    Shortcuts,
}

fn run(
    scene: PathBuf,
    script: PathBuf,
    config: Option<PathBuf>,
    output: Option<PathBuf>,
) -> Result<(), Box<dyn Error>> {
    let mut scene = Scene::load(&scene)?;
    let config = match config {
        Some(path) => SnapConfig::load(&path)?,
        None => SnapConfig::default(),
    };
    let script = Script::load(&script)?;

    let report = snapmove_app::run(&mut scene, &config, &script)?;
    println!("{}", report);

    if let Some(path) = output {
        std::fs::write(&path, serde_json::to_string_pretty(&scene)?)?;
        log::info!("Wrote scene to {:?}", path);
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();
    log::info!("Starting SnapMove");

    let cli = Cli::parse();
    let result = match cli.command {
        Command::Run {
            scene,
            script,
            config,
            output,
        } => run(scene, script, config, output),
        Command::Shortcuts => {
            ShortcutRegistry::print_all();
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
