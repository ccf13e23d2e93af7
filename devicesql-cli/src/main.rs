//! pdbx: inspect export.pdb files and rewrite playlist order in place

mod config;
mod locate;
mod persist;

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use memmap2::Mmap;
use tracing::{info, warn, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use devicesql_core::{
    apply_playlist_modifications, edit, inspect, parse_with, Database, PlaylistEntry,
    PlaylistTreeItem, ReadOptions,
};

use config::Config;

#[derive(Parser)]
#[command(name = "pdbx")]
#[command(about = "Read DeviceSQL export databases and edit playlist order")]
#[command(version)]
struct Cli {
    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Directory for backups taken before saving (default: beside the database)
    #[arg(long, global = true)]
    backup_dir: Option<PathBuf>,

    /// Maximum pages followed per table
    #[arg(long, global = true)]
    max_pages: Option<usize>,

    /// Pages claiming more rows than this are skipped
    #[arg(long, global = true)]
    max_rows: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Table directory and per-table counts
    Info {
        /// Database file or volume root
        path: PathBuf,
    },

    /// Whole database as JSON
    Dump {
        path: PathBuf,
        #[arg(long)]
        pretty: bool,
    },

    /// Playlist folders and playlists
    Tree { path: PathBuf },

    /// Tracks of one playlist in order
    Playlist { path: PathBuf, id: u32 },

    /// Move one entry within a playlist and save
    Move {
        path: PathBuf,
        #[arg(long)]
        playlist: u32,
        /// Current zero-based position
        #[arg(long)]
        from: usize,
        /// New zero-based position
        #[arg(long)]
        to: usize,
    },

    /// Save an edited playlist entry list (JSON array)
    Apply { path: PathBuf, edits: PathBuf },
}

impl Commands {
    fn target(&self) -> &Path {
        match self {
            Commands::Info { path }
            | Commands::Dump { path, .. }
            | Commands::Tree { path }
            | Commands::Playlist { path, .. }
            | Commands::Move { path, .. }
            | Commands::Apply { path, .. } => path,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    let mut read_options = ReadOptions::default();
    if let Some(max_pages) = cli.max_pages {
        read_options.max_pages_per_table = max_pages;
    }
    if let Some(max_rows) = cli.max_rows {
        read_options.max_rows_per_page = max_rows;
    }

    let config = Config {
        backup_dir: cli.backup_dir,
        read_options,
        verbose: cli.verbose,
        ..Config::new(cli.command.target().to_path_buf())
    };

    run(&config, cli.command)
}

fn init_logging(verbose: bool) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    // RUST_LOG wins when set
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::default().add_directive(level.into()));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .compact()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn run(config: &Config, command: Commands) -> Result<()> {
    let db_path = locate::find_database(&config.target)?;
    if config.verbose {
        info!("Database: {:?}", db_path);
    }

    match command {
        Commands::Info { .. } => {
            let data = map_database(&db_path)?;
            let report = inspect::inspect_with(&data, &config.read_options);
            print!("{}", report);
        }
        Commands::Dump { pretty, .. } => {
            let db = load(&db_path, &config.read_options)?;
            println!("{}", db.to_json(pretty)?);
        }
        Commands::Tree { .. } => {
            let db = load(&db_path, &config.read_options)?;
            let forest = db.playlist_forest();
            if forest.is_empty() {
                println!("No playlists");
            }
            for item in &forest {
                print_tree_item(&db, item, 0);
            }
        }
        Commands::Playlist { id, .. } => {
            let db = load(&db_path, &config.read_options)?;
            print_playlist(&db, id)?;
        }
        Commands::Move {
            playlist, from, to, ..
        } => {
            let data = fs::read(&db_path).with_context(|| format!("Failed to read {:?}", db_path))?;
            let db = parse_with(&data, &config.read_options);
            let edited = edit::move_entry(&db.playlist_entries, playlist, from, to)?;
            save_edits(config, &db_path, &data, &db.playlist_entries, &edited)?;
        }
        Commands::Apply { edits, .. } => {
            let json = fs::read_to_string(&edits)
                .with_context(|| format!("Failed to read edits from {:?}", edits))?;
            let edited: Vec<PlaylistEntry> =
                serde_json::from_str(&json).context("Edits must be a JSON array of playlist entries")?;

            let data = fs::read(&db_path).with_context(|| format!("Failed to read {:?}", db_path))?;
            let db = parse_with(&data, &config.read_options);
            save_edits(config, &db_path, &data, &db.playlist_entries, &edited)?;
        }
    }

    Ok(())
}

fn map_database(path: &Path) -> Result<Mmap> {
    let file = File::open(path).with_context(|| format!("Failed to open {:?}", path))?;
    // SAFETY: the map is only read, and read-only commands never write the file
    let map = unsafe { Mmap::map(&file) }.with_context(|| format!("Failed to map {:?}", path))?;
    Ok(map)
}

fn load(path: &Path, options: &ReadOptions) -> Result<Database> {
    let data = map_database(path)?;
    let db = parse_with(&data, options);
    if db.is_empty() {
        warn!("{:?} holds no readable rows", path);
    }
    Ok(db)
}

fn save_edits(
    config: &Config,
    db_path: &Path,
    data: &[u8],
    original: &[PlaylistEntry],
    edited: &[PlaylistEntry],
) -> Result<()> {
    let write = apply_playlist_modifications(data, original, edited);
    let report = write.report;

    println!(
        "{} modified, {} not found, {} orphaned, {} not persisted",
        report.modified, report.not_found, report.orphaned, report.not_persisted
    );

    if report.modified == 0 {
        println!("Nothing to save");
        return Ok(());
    }
    if write.data.len() != data.len() {
        bail!("Rewritten database changed size; refusing to save");
    }

    let backup = persist::save_with_backup(db_path, &write.data, config.backup_dir.as_deref())?;
    println!("✓ Saved {:?} (backup: {:?})", db_path, backup);
    Ok(())
}

fn print_tree_item(db: &Database, item: &PlaylistTreeItem, depth: usize) {
    let indent = "  ".repeat(depth);
    if item.node.is_folder {
        println!("{}{}/", indent, item.node.name);
    } else {
        let count = db.entries_for(item.node.id).len();
        println!("{}{} [{}] ({} tracks)", indent, item.node.name, item.node.id, count);
    }
    for child in &item.children {
        print_tree_item(db, child, depth + 1);
    }
}

fn print_playlist(db: &Database, id: u32) -> Result<()> {
    let entries = db.entries_for(id);
    match db.playlists.get(&id) {
        Some(node) => println!("{}:", node.name),
        None if entries.is_empty() => bail!("Playlist {} not found", id),
        None => println!("Playlist {}:", id),
    }

    for (position, entry) in entries.iter().enumerate() {
        match db.tracks.get(&entry.track_id) {
            Some(track) => {
                let key = if track.key.is_empty() { "-" } else { track.key.as_str() };
                println!(
                    "  {:3}. {} - {} [{:.0} BPM, {}]",
                    position, track.artist, track.title, track.bpm(), key
                );
            }
            None => println!("  {:3}. <missing track {}>", position, entry.track_id),
        }
    }
    Ok(())
}
