use anyhow::{bail, Context, Result};
use clap::Parser;
use rayon::prelude::*;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use releasedoc::document::{ItemMatches, LinkedEntities, MapOptions, Release, SubitemMatches};
use releasedoc::mapping::{map_options, MappedSources, SourceKind};
use releasedoc::payload::{ArchivePayload, TrackerPayload};
use releasedoc::progress::{
    create_progress_bar, create_spinner, format_duration, log_progress, set_log_only,
};
use releasedoc::safety::validate_output_path;

#[derive(Parser)]
#[command(name = "releasedoc")]
#[command(about = "Map tracker and archive payloads into canonical release documents")]
struct Args {
    /// Tracker API payload (JSON)
    tracker: Option<PathBuf>,

    /// Archive metadata descriptor (JSON tree)
    meta: Option<PathBuf>,

    /// Archive file listing descriptor (JSON tree)
    files: Option<PathBuf>,

    /// Map every release under this directory instead; expects one
    /// subdirectory per release holding tracker.json, meta.json, files.json
    #[arg(long, conflicts_with_all = ["tracker", "meta", "files"])]
    batch: Option<PathBuf>,

    /// Output file (single mode) or directory (batch mode); stdout when
    /// omitted in single mode
    #[arg(long)]
    output: Option<PathBuf>,

    /// Include linked entities and automatic matches in the output document
    #[arg(long)]
    full: bool,

    #[arg(long, default_value = "0")]
    workers: usize,

    /// Tail-friendly output: hide progress bars, log lines instead
    #[arg(long)]
    log_only: bool,
}

/// One mapped release as written out: the canonical document plus, in full
/// mode, the linked entities and automatic match candidates.
#[derive(Serialize)]
struct MappedDocument {
    release: Release,
    mapoptions: MapOptions,
    #[serde(skip_serializing_if = "Option::is_none")]
    links: Option<LinkedEntities>,
    #[serde(skip_serializing_if = "Option::is_none")]
    item_matches: Option<ItemMatches>,
    #[serde(skip_serializing_if = "Option::is_none")]
    subitem_matches: Option<SubitemMatches>,
}

fn map_document(sources: &MappedSources, full: bool) -> MappedDocument {
    let mapper = SourceKind::TrackerArchive.mapper();
    let release = mapper.map(sources);
    let mapoptions = map_options(&release);
    let (links, item_matches, subitem_matches) = if full {
        (
            Some(mapper.extract_linked(sources)),
            Some(mapper.automatic_item_matches(sources)),
            Some(mapper.automatic_subitem_matches(sources)),
        )
    } else {
        (None, None, None)
    };
    MappedDocument {
        release,
        mapoptions,
        links,
        item_matches,
        subitem_matches,
    }
}

/// Read one payload file as a JSON tree. A missing file is an empty payload
/// (either source may be absent for a release); unreadable JSON is an error.
fn load_tree(path: &Path) -> Result<serde_json::Value> {
    if !path.exists() {
        return Ok(serde_json::Value::Null);
    }
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read payload {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("Payload {} is not valid JSON", path.display()))
}

fn load_sources(tracker: &Path, meta: &Path, files: &Path) -> Result<MappedSources> {
    Ok(MappedSources {
        tracker: TrackerPayload::from_value(load_tree(tracker)?),
        archive: ArchivePayload::from_parts(load_tree(meta)?, load_tree(files)?),
    })
}

fn run_single(args: &Args) -> Result<()> {
    let (Some(tracker), Some(meta), Some(files)) = (&args.tracker, &args.meta, &args.files)
    else {
        bail!("Single mode needs <tracker> <meta> <files> payload paths (or use --batch)");
    };

    let sources = load_sources(tracker, meta, files)?;
    let document = map_document(&sources, args.full);
    let json = serde_json::to_string_pretty(&document)?;

    match &args.output {
        Some(output) => {
            validate_output_path(output, &[tracker, meta, files])?;
            fs::write(output, json)
                .with_context(|| format!("Failed to write {}", output.display()))?;
        }
        None => println!("{}", json),
    }
    Ok(())
}

/// A release payload directory: its id plus the three capture paths.
struct BatchEntry {
    id: String,
    tracker: PathBuf,
    meta: PathBuf,
    files: PathBuf,
}

fn scan_batch_dir(dir: &Path) -> Result<Vec<BatchEntry>> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir)
        .with_context(|| format!("Failed to read batch directory {}", dir.display()))?
    {
        let path = entry?.path();
        if !path.is_dir() {
            continue;
        }
        let Some(id) = path.file_name().and_then(|n| n.to_str()).map(String::from) else {
            continue;
        };
        entries.push(BatchEntry {
            id,
            tracker: path.join("tracker.json"),
            meta: path.join("meta.json"),
            files: path.join("files.json"),
        });
    }
    entries.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(entries)
}

fn run_batch(args: &Args, dir: &Path) -> Result<()> {
    let output_dir = args
        .output
        .clone()
        .unwrap_or_else(|| dir.join("mapped"));
    fs::create_dir_all(&output_dir)
        .with_context(|| format!("Failed to create output directory {}", output_dir.display()))?;

    let spinner = create_spinner("Scanning payload directories");
    let entries = scan_batch_dir(dir)?;
    spinner.finish_with_message(format!("Found {} release directories", entries.len()));
    if entries.is_empty() {
        bail!("No release payload directories under {}", dir.display());
    }

    let pb = create_progress_bar(entries.len() as u64, "Mapping releases");
    let done = AtomicU64::new(0);
    let total = entries.len() as u64;

    let failures: Vec<String> = entries
        .par_iter()
        .filter_map(|entry| {
            let result = (|| -> Result<()> {
                let output = output_dir.join(format!("{}.json", entry.id));
                validate_output_path(&output, &[&entry.tracker, &entry.meta, &entry.files])?;
                let sources = load_sources(&entry.tracker, &entry.meta, &entry.files)?;
                let document = map_document(&sources, args.full);
                fs::write(&output, serde_json::to_string_pretty(&document)?)
                    .with_context(|| format!("Failed to write {}", output.display()))?;
                Ok(())
            })();
            pb.inc(1);
            log_progress(
                "map",
                done.fetch_add(1, Ordering::Relaxed) + 1,
                total,
                1000,
            );
            result.err().map(|e| format!("{}: {:#}", entry.id, e))
        })
        .collect();

    pb.finish_with_message(format!(
        "Mapped {} releases ({} failed)",
        entries.len() - failures.len(),
        failures.len()
    ));

    for failure in &failures {
        eprintln!("FAILED {}", failure);
    }
    if !failures.is_empty() {
        bail!("{} of {} releases failed to map", failures.len(), entries.len());
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    set_log_only(args.log_only);

    if args.workers > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(args.workers)
            .build_global()
            .context("Failed to set thread pool size")?;
    }

    let start = Instant::now();
    match args.batch.clone() {
        Some(dir) => {
            run_batch(&args, &dir)?;
            println!("Elapsed: {}", format_duration(start.elapsed()));
        }
        None => run_single(&args)?,
    }
    Ok(())
}
