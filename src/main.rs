//! Sweetswap — candy match-3 puzzle with chained cascades in the terminal.

mod app;
mod input;
mod logging;
mod theme;
mod ui;

use anyhow::{Result, bail};
use app::App;
use clap::{Parser, ValueEnum};
use sweetswap::{SessionConfig, Timing};

/// Smallest and largest board side accepted from the command line.
const MIN_SIDE: usize = 3;
const MAX_SIDE: usize = 12;

/// Options derived from CLI that affect the session and how it is played back.
#[derive(Debug, Clone)]
pub struct GameConfig {
    pub session: SessionConfig,
    pub frame_rate: f64,
    pub no_animation: bool,
}

impl GameConfig {
    pub fn from_args(args: &Args) -> Result<Self> {
        for (name, side) in [("rows", args.rows), ("cols", args.cols)] {
            if !(MIN_SIDE..=MAX_SIDE).contains(&side) {
                bail!("--{name} must be between {MIN_SIDE} and {MAX_SIDE}, got {side}");
            }
        }
        if args.moves == 0 {
            bail!("--moves must be at least 1");
        }
        if args.speed.is_nan() || args.speed <= 0.0 {
            bail!("--speed must be positive, got {}", args.speed);
        }
        if args.frame_rate.is_nan() || args.frame_rate <= 0.0 {
            bail!("--frame-rate must be positive, got {}", args.frame_rate);
        }
        let timing = if args.no_animation {
            Timing::instant()
        } else {
            Timing::scaled(args.speed)
        };
        Ok(Self {
            session: SessionConfig {
                rows: args.rows,
                cols: args.cols,
                moves: args.moves,
                seed: args.seed,
                timing,
            },
            frame_rate: args.frame_rate,
            no_animation: args.no_animation,
        })
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = GameConfig::from_args(&args)?;
    if let Some(path) = &args.log {
        logging::init(path, log::LevelFilter::Debug)?;
    }
    let theme = theme::Theme::load(args.theme.as_deref(), args.palette).unwrap_or_default();
    let mut app = App::new(config, theme);
    let coins = app.run()?;
    if coins > 0 {
        println!("{coins} coins earned.");
    }
    Ok(())
}

/// Candy match-3 puzzle in the terminal.
#[derive(Debug, Parser)]
#[command(
    name = "sweetswap",
    version,
    about = "Candy match-3 puzzle in the terminal. Swap neighbours, line up three or more, chain cascades.",
    long_about = "Sweetswap is a terminal match-3 mini-game.\n\n\
        Swap two neighbouring candies to line up three or more of the same kind. \
        Matches of four, five, L/T shapes and 2x2 squares leave special candies behind; \
        lining a special up with its colour sets it off. Candies above fall into the gaps \
        and new ones drop in, and every extra wave raises the combo multiplier.\n\n\
        CONTROLS:\n  Arrows / hjkl  Move cursor   Space/Enter  Select / swap\n  \
        P              Pause         R            Restart (game over)\n  Q / Esc        Quit menu\n\n\
        You have a fixed number of moves. Your score is paid out as coins when they run out, \
        or earlier through Finish in the quit menu."
)]
pub struct Args {
    /// Board height in cells.
    #[arg(long, default_value = "7", value_name = "ROWS")]
    pub rows: usize,

    /// Board width in cells.
    #[arg(long, default_value = "7", value_name = "COLS")]
    pub cols: usize,

    /// Moves per session.
    #[arg(short, long, default_value = "20", value_name = "N")]
    pub moves: u32,

    /// Seed for a reproducible board and refills.
    #[arg(long, value_name = "SEED")]
    pub seed: Option<u64>,

    /// Animation speed factor; 2.0 plays cascades twice as fast.
    #[arg(long, default_value = "1.0", value_name = "FACTOR")]
    pub speed: f64,

    /// Disable cascade animation (moves resolve instantly).
    #[arg(long)]
    pub no_animation: bool,

    /// Path to theme file (btop-style theme[key]=\"value\"). Uses One Dark if not set.
    #[arg(short, long, value_name = "FILE")]
    pub theme: Option<std::path::PathBuf>,

    /// Colour palette: normal (theme), high-contrast, or colorblind.
    #[arg(long, default_value = "normal")]
    pub palette: Palette,

    /// Append engine log records (waves, blasts, cascade cap) to this file.
    #[arg(long, value_name = "FILE")]
    pub log: Option<std::path::PathBuf>,

    /// Target render frames per second.
    #[arg(long, default_value = "30.0", value_name = "RATE")]
    pub frame_rate: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Palette {
    #[default]
    Normal,

    #[value(alias = "highcontrast", alias = "contrast")]
    HighContrast,

    #[value(alias = "colourblind")]
    Colorblind,
}
