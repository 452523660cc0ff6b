use std::io::BufRead;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use contree::common::config::{Config, config_file, restore_file};
use contree::common::log;
use contree::layout_engine::{LayoutCommand, LayoutEngine, OutputInfo};
use contree::model::{ConTree, Rect};
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(name = "contree")]
#[command(about = "Inspect and exercise the container tree offline")]
struct Cli {
    /// Configuration file to use instead of the default location.
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a saved layout.
    Tree {
        #[arg(long)]
        file: Option<PathBuf>,
        /// Print JSON instead of an ASCII tree.
        #[arg(long)]
        json: bool,
    },
    /// Check whether the restore file can be loaded.
    Validate {
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Report configuration problems, optionally fixing and saving them.
    Config {
        #[arg(long)]
        fix: bool,
    },
    /// Apply commands, one JSON object per line on stdin, to a fresh tree on
    /// a single output and print the result.
    Replay {
        #[arg(long, default_value_t = 1920)]
        width: u32,
        #[arg(long, default_value_t = 1080)]
        height: u32,
        /// Save the resulting layout here.
        #[arg(long)]
        save: Option<PathBuf>,
    },
}

fn main() {
    let opt: Cli = Parser::parse();
    log::init_logging();
    if let Err(e) = run(opt) {
        error!("{e:#}");
        std::process::exit(1);
    }
}

fn run(opt: Cli) -> anyhow::Result<()> {
    let config_path = opt.config.unwrap_or_else(config_file);
    let mut config = Config::read_or_default(&config_path)?;

    match opt.command {
        Commands::Tree { file, json } => {
            let tree = load(file, &config)?;
            if json {
                println!("{}", tree.to_json()?);
            } else {
                print!("{}", tree.draw_tree());
            }
        }
        Commands::Validate { file } => {
            let tree = load(file, &config)?;
            info!(containers = tree.len(), "restore file is valid");
        }
        Commands::Config { fix } => {
            let issues = config.validate();
            for issue in &issues {
                warn!("{issue}");
            }
            if fix && !issues.is_empty() {
                let fixed = config.auto_fix_values();
                config.save(&config_path)?;
                info!(fixed, path = %config_path.display(), "saved fixed configuration");
            }
        }
        Commands::Replay { width, height, save } => {
            let output = OutputInfo::new("replay", Rect::new(0, 0, width, height));
            let mut engine = LayoutEngine::new(config.settings.layout.clone(), &[output]);
            for (lineno, line) in std::io::stdin().lock().lines().enumerate() {
                let line = line?;
                if line.trim().is_empty() {
                    continue;
                }
                let command: LayoutCommand = serde_json::from_str(&line)
                    .with_context(|| format!("line {}: invalid command", lineno + 1))?;
                let response = engine.handle_command(command);
                info!(line = lineno + 1, changed = response.changed, "applied command");
            }
            print!("{}", engine.tree().draw_tree());
            if let Some(path) = save {
                engine.save(&path)?;
            }
        }
    }
    Ok(())
}

/// Loads a saved layout as if every window were still alive.
fn load(file: Option<PathBuf>, config: &Config) -> anyhow::Result<ConTree> {
    let path = file.unwrap_or_else(restore_file);
    ConTree::load(&path, config.settings.layout.clone(), |_| true)
        .with_context(|| format!("loading {}", path.display()))
}
