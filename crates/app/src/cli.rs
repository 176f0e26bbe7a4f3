//! Command-line surface of the dance course app.

use clap::{Parser, Subcommand};
use course_core::model::LevelFilter;

/// Dance course catalog with progress tracking
#[derive(Parser, Debug)]
#[command(name = "dance")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// SQLite database URL or path
    #[arg(long, env = "DANCE_DB_URL", default_value = "sqlite://dance.sqlite3", global = true)]
    pub db: String,

    /// Keep everything in memory (nothing is persisted)
    #[arg(long, global = true)]
    pub memory: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List modules, optionally filtered
    Catalog {
        /// Text matched against title, style and instructor
        #[arg(short, long, default_value = "")]
        query: String,

        /// all, beginner, intermediate or advanced
        #[arg(short, long, default_value = "all")]
        level: LevelFilter,
    },

    /// Show progress per module
    Progress,

    /// Mark a video as watched
    Watch { module: String, video: String },

    /// Play a video with a simulated player
    Play {
        module: String,
        video: String,

        /// Fraction of the video to watch before stopping (1.0 plays to the end)
        #[arg(long, default_value_t = 1.0)]
        stop_at: f64,

        /// Media seconds played per wall-clock second (must be positive)
        #[arg(long, default_value_t = 120.0, value_parser = positive_speed)]
        speed: f64,
    },

    /// Forget all progress
    Reset,

    /// Profile statistics and achievements
    Stats,

    /// Write the bundled catalog into the database
    Seed,
}

fn positive_speed(raw: &str) -> Result<f64, String> {
    let speed: f64 = raw.parse().map_err(|_| format!("not a number: {raw}"))?;
    if speed.is_finite() && speed > 0.0 {
        Ok(speed)
    } else {
        Err(format!("speed must be a positive number, got {raw}"))
    }
}
