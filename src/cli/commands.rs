use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};

use crate::index::Index;
use crate::models::{HistoryEntry, HistoryRecord};
use crate::storage::TagOutcome;
use crate::utils::{absolutize, collect_files, format_path_with_tilde, resolve_index_dir};

#[derive(Parser)]
#[command(name = "zenodotus")]
#[command(version)]
#[command(about = "Content-addressed file index with tags", long_about = None)]
pub struct Cli {
    /// Index directory (defaults to $ZENODOTUS_DIR, then ~/.zenodotus)
    #[arg(long, global = true, value_name = "DIR")]
    pub index_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create an empty index
    Init,
    /// Hash files (directories recursively) and record them in the index
    Insert {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Tag the content archived under a path
    Tag {
        path: PathBuf,
        tag: String,
        #[arg(default_value = "")]
        value: String,
    },
    /// Remove a tag from the content archived under a path
    Untag { path: PathBuf, tag: String },
    /// Show every archived file with its tags
    Dump {
        #[arg(long)]
        json: bool,
    },
    /// Show every file carrying a tag
    DumpTag {
        tag: String,
        #[arg(long)]
        json: bool,
    },
    /// List archived paths
    List,
    /// Show the audit log
    History,
    /// Show statistics about the index
    Stats,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("Use --help for usage information");
        return Ok(());
    };
    let index_dir = resolve_index_dir(cli.index_dir)?;

    match command {
        Commands::Init => init(&index_dir),
        Commands::Insert { paths } => insert(&index_dir, &paths),
        Commands::Tag { path, tag, value } => add_tag(&index_dir, &path, &tag, &value),
        Commands::Untag { path, tag } => remove_tag(&index_dir, &path, &tag),
        Commands::Dump { json } => dump(&index_dir, json),
        Commands::DumpTag { tag, json } => dump_tag(&index_dir, &tag, json),
        Commands::List => list(&index_dir),
        Commands::History => history(&index_dir),
        Commands::Stats => show_stats(&index_dir),
    }
}

fn open_index(index_dir: &Path) -> Result<Index> {
    Index::open(index_dir).map_err(|e| {
        let hint = if e.is_not_found() { " (run `zenodotus init` first)" } else { "" };
        anyhow::Error::new(e).context(format!("Failed to open index{}", hint))
    })
}

fn init(index_dir: &Path) -> Result<()> {
    Index::create(index_dir)
        .with_context(|| format!("Failed to create index in {}", index_dir.display()))?;
    println!("Initialized index in {}", format_path_with_tilde(index_dir));
    Ok(())
}

fn insert(index_dir: &Path, operands: &[PathBuf]) -> Result<()> {
    let mut index = open_index(index_dir)?;
    let files = collect_files(operands)?;

    for file in &files {
        let digest = index
            .insert_file(file)
            .with_context(|| format!("Failed to insert {}", file.display()))?;
        println!("{} {}", digest, file.display());
    }

    index.persist().context("Failed to save index")?;
    Ok(())
}

fn add_tag(index_dir: &Path, path: &Path, tag: &str, value: &str) -> Result<()> {
    let mut index = open_index(index_dir)?;
    let path = absolutize(path)?;

    match index.add_tag(&path, tag, value)? {
        TagOutcome::NotArchived => bail!("{} is not archived", path.display()),
        _ => index.persist().context("Failed to save index"),
    }
}

fn remove_tag(index_dir: &Path, path: &Path, tag: &str) -> Result<()> {
    let mut index = open_index(index_dir)?;
    let path = absolutize(path)?;

    match index.remove_tag(&path, tag)? {
        TagOutcome::NotArchived => bail!("{} is not archived", path.display()),
        TagOutcome::NotTagged => bail!("{} is not tagged {}", path.display(), tag),
        _ => index.persist().context("Failed to save index"),
    }
}

fn dump(index_dir: &Path, json: bool) -> Result<()> {
    let index = open_index(index_dir)?;
    let entries = index.dump();

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }
    for entry in &entries {
        println!("{} {}", entry.digest, entry.path);
        for membership in &entry.tags {
            println!("    {}", membership);
        }
    }
    Ok(())
}

fn dump_tag(index_dir: &Path, tag: &str, json: bool) -> Result<()> {
    let index = open_index(index_dir)?;
    let members = index.dump_tag(tag)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&members)?);
        return Ok(());
    }
    for member in &members {
        println!("{}", member);
    }
    Ok(())
}

fn list(index_dir: &Path) -> Result<()> {
    let index = open_index(index_dir)?;
    for path in index.list_indexed_paths() {
        println!("{}", path);
    }
    Ok(())
}

fn history(index_dir: &Path) -> Result<()> {
    let index = open_index(index_dir)?;
    for entry in index.history().read()? {
        println!("{}", format_history_entry(&entry));
    }
    Ok(())
}

fn format_history_entry(entry: &HistoryEntry) -> String {
    let when = entry.timestamp.format("%Y-%m-%d %H:%M:%S");
    let verb = entry.record.verb();
    let digest = entry.record.digest();
    match &entry.record {
        HistoryRecord::Insert { path, .. } => format!("{} {:<6} {} {}", when, verb, digest, path),
        HistoryRecord::AddTag { tag, value, .. } if value.is_empty() => {
            format!("{} {:<6} {} {}", when, verb, digest, tag)
        }
        HistoryRecord::AddTag { tag, value, .. } => {
            format!("{} {:<6} {} {}: {}", when, verb, digest, tag, value)
        }
        HistoryRecord::RemoveTag { tag, .. } => format!("{} {:<6} {} {}", when, verb, digest, tag),
    }
}

fn show_stats(index_dir: &Path) -> Result<()> {
    let index = open_index(index_dir)?;
    let stats = index.stats();
    let history_records = index.history().read()?.len();

    println!("Zenodotus Index Statistics");
    println!("==========================");
    println!("Files: {}", stats.files);
    println!("  Distinct contents: {}", stats.distinct_digests);
    println!("Tags: {}", stats.tags);
    println!("  Memberships: {}", stats.tag_memberships);
    println!("History records: {}", history_records);
    println!();
    println!("Index directory: {}", format_path_with_tilde(index.dir()));

    Ok(())
}
