use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use course_core::model::{ModuleId, VideoId};
use services::{AppServices, CatalogService, Clock, PlaybackStatus, SyncConfig, format_time};
use storage::builtin::BuiltinCatalog;
use storage::repository::Storage;
use storage::sqlite::SqliteRepository;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod player;

use cli::{Cli, Commands};
use player::SimulatedPlayer;

#[derive(Debug)]
enum AppError {
    InvalidDbUrl { raw: String },
    UnknownVideo { module: String, video: String },
    SeedNeedsDatabase,
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            AppError::UnknownVideo { module, video } => {
                write!(f, "no video {video} in module {module}")
            }
            AppError::SeedNeedsDatabase => write!(f, "seed writes to a database; drop --memory"),
        }
    }
}

impl std::error::Error for AppError {}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| AppError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(AppError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

fn resolve_db_url(raw: &str) -> Result<String, AppError> {
    if raw.trim().is_empty() {
        return Err(AppError::InvalidDbUrl { raw: raw.to_string() });
    }
    Ok(normalize_sqlite_url(raw.to_string()))
}

async fn open_storage(cli: &Cli) -> Result<Storage, Box<dyn std::error::Error>> {
    if cli.memory {
        return Ok(Storage::in_memory());
    }
    let db_url = resolve_db_url(&cli.db)?;
    prepare_sqlite_file(&db_url)?;
    Ok(Storage::sqlite(&db_url).await?)
}

async fn seed(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if cli.memory {
        return Err(AppError::SeedNeedsDatabase.into());
    }
    let db_url = resolve_db_url(&cli.db)?;
    prepare_sqlite_file(&db_url)?;
    let repo = SqliteRepository::connect(&db_url).await?;
    repo.migrate().await?;
    let modules = BuiltinCatalog::modules()?;
    repo.replace_catalog(&modules).await?;
    println!("seeded {} modules into {db_url}", modules.len());
    Ok(())
}

fn print_progress(services: &AppServices) {
    let records = services.store().snapshot();
    for module in services.catalog().modules() {
        let (percent, done) = records
            .get(module.id())
            .map_or((0, 0), |r| (r.progress_percentage(), r.completed_videos().len()));
        println!(
            "{:<4} {:<34} {:>3}%  ({done}/{})",
            module.id().as_str(),
            module.title(),
            percent,
            module.video_count()
        );
    }
    println!("overall: {}%", records.total_progress());
}

async fn play(
    services: &AppServices,
    module: ModuleId,
    video: VideoId,
    stop_at: f64,
    speed: f64,
) -> Result<(), Box<dyn std::error::Error>> {
    let duration = services
        .catalog()
        .video(&module, &video)
        .map(|v| f64::from(v.duration_secs()))
        .ok_or_else(|| AppError::UnknownVideo {
            module: module.to_string(),
            video: video.to_string(),
        })?;
    let stop_position = duration * stop_at.clamp(0.0, 1.0);

    let player = Arc::new(SimulatedPlayer::new(duration, speed));
    let mut tracker = services.open_video(player.clone(), module, video);
    tracker.on_status(PlaybackStatus::loaded(duration));
    if !tracker.play().await {
        tracker.teardown();
        return Ok(());
    }

    loop {
        tokio::time::sleep(Duration::from_millis(250)).await;
        let position = player.position();
        if position >= duration {
            if let Some(done) = tracker.on_status(PlaybackStatus::finished(duration)) {
                println!(
                    "finished {} ({}), module now at {}%",
                    done.video_id,
                    format_time(duration),
                    done.progress
                );
            }
            break;
        }
        if position >= stop_position {
            tracker.pause().await;
            println!(
                "stopped at {} / {}",
                format_time(position),
                format_time(duration)
            );
            break;
        }
    }
    tracker.teardown();
    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    if matches!(cli.command, Commands::Seed) {
        return seed(&cli).await;
    }

    let storage = open_storage(&cli).await?;
    let catalogs = CatalogService::new(Arc::clone(&storage.catalog));
    let services =
        AppServices::start(&storage, &catalogs, SyncConfig::default(), Clock::default()).await;
    if let Some(err) = services.load_error() {
        eprintln!("catalog unavailable: {err}");
    }
    services.wait_until_loaded().await;

    match cli.command {
        Commands::Catalog { query, level } => {
            services.set_query(query);
            services.set_level(level);
            for module in services.visible_modules() {
                println!(
                    "{:<4} {:<34} {:<13} {:<12} {}",
                    module.id().as_str(),
                    module.title(),
                    module.level(),
                    module.style(),
                    module.instructor()
                );
            }
            services.on_background();
        }
        Commands::Progress => print_progress(&services),
        Commands::Watch { module, video } => {
            let module = ModuleId::new(module);
            let video = VideoId::new(video);
            let secs = services
                .catalog()
                .video(&module, &video)
                .map(|v| u64::from(v.duration_secs()))
                .ok_or_else(|| AppError::UnknownVideo {
                    module: module.to_string(),
                    video: video.to_string(),
                })?;
            services.store().mark_video_watched(&module, &video, secs);
            print_progress(&services);
        }
        Commands::Play {
            module,
            video,
            stop_at,
            speed,
        } => {
            play(&services, ModuleId::new(module), VideoId::new(video), stop_at, speed).await?;
            print_progress(&services);
        }
        Commands::Reset => {
            services.reset_progress().await?;
            println!("progress reset");
        }
        Commands::Stats => {
            let stats = services.profile_stats();
            println!("overall progress: {}%", stats.overall_progress);
            println!("videos watched:   {}", stats.videos_watched);
            println!(
                "time watched:     {}h {}m",
                stats.time_watched.hours, stats.time_watched.minutes
            );
            for (achievement, unlocked) in services.achievements() {
                let mark = if unlocked { "x" } else { " " };
                println!(
                    "[{mark}] {:<16} {}",
                    achievement.title(),
                    achievement.description()
                );
            }
        }
        // Handled before storage is opened.
        Commands::Seed => {}
    }

    // Pending debounced saves are dropped on teardown, so write through once.
    services.flush().await?;
    services.teardown();
    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
