use anyhow::bail;
use clap::Parser;
use serde::Serialize;
use std::path::{Path, PathBuf};

use clipstore::cli::{self, Args, Command};
use clipstore::clip::{ClipSource, SourceType};
use clipstore::sequence;

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(cli::log_level(args.verbosity)),
    )
    .init();

    match args.command {
        Command::Scan { dir, json } => cmd_scan(&dir, json),
        Command::Info { path, json } => cmd_info(path, json),
        Command::Window {
            path,
            play_in,
            play_out,
        } => cmd_window(path, play_in, play_out),
    }
}

fn cmd_scan(dir: &Path, json: bool) -> anyhow::Result<()> {
    let infos = sequence::query_directory(dir)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&infos)?);
        return Ok(());
    }

    if infos.is_empty() {
        println!("no image sequences in {}", dir.display());
        return Ok(());
    }
    for info in &infos {
        println!(
            "{}  [{}]  ({} frames)",
            info.template_path.display(),
            info.ranges_string(),
            info.frame_count()
        );
    }
    Ok(())
}

#[derive(Serialize)]
struct ClipReport {
    source_type: &'static str,
    stereo: bool,
    playable: Vec<PathBuf>,
    source_in: Option<i64>,
    source_out: Option<i64>,
    fps: f32,
}

fn cmd_info(path: PathBuf, json: bool) -> anyhow::Result<()> {
    let mut clip = ClipSource::new(path.clone());

    let range = clip.source_range();
    let playable: Vec<PathBuf> = clip.source_paths().map(|p| p.to_vec()).unwrap_or_default();
    if playable.is_empty() {
        bail!("could not resolve source: {}", path.display());
    }

    let report = ClipReport {
        source_type: match clip.source_type() {
            SourceType::Movie => "movie",
            SourceType::Frames => "frames",
        },
        stereo: clip.is_stereo(),
        playable,
        source_in: range.map(|r| r.0),
        source_out: range.map(|r| r.1),
        fps: clip.fps(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("type:    {}", report.source_type);
    println!("stereo:  {}", report.stereo);
    for p in &report.playable {
        println!("path:    {}", p.display());
    }
    match range {
        Some((a, b)) => println!("range:   {}-{}", a, b),
        None => println!("range:   unresolved"),
    }
    Ok(())
}

fn cmd_window(path: PathBuf, play_in: Option<i64>, play_out: Option<i64>) -> anyhow::Result<()> {
    let mut clip = ClipSource::new(path.clone());
    if let (Some(a), Some(b)) = (play_in, play_out) {
        clip.set_play_range(a, b);
    }

    let Some(data) = clip.get_play_data() else {
        bail!("could not resolve source: {}", path.display());
    };

    let opt = |v: Option<i64>| v.map_or("-".to_string(), |v| v.to_string());
    println!("head hold:  {}", opt(data.head_hold));
    println!("window in:  {}", opt(data.play_in));
    println!("window out: {}", opt(data.play_out));
    println!("tail hold:  {}", opt(data.tail_hold));
    println!("total:      {}", data.total_frames());
    Ok(())
}
