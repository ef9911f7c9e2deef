use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Read};

use anyhow::Context;
use colored::Colorize;
use tufstore_store::{CommitReport, FileSystemStore, LocalStore, StoreConfig};
use tufstore_types::{Key, TargetHashes};

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(&cli)?;
    let store = FileSystemStore::with_config(config);
    let format = cli.format;
    match cli.command {
        Command::Init => cmd_init(&store),
        Command::Meta => cmd_meta(&store, &format),
        Command::SetMeta(args) => cmd_set_meta(&store, args),
        Command::Target(args) => cmd_target(&store, args),
        Command::Commit(args) => cmd_commit(&store, args, &format),
        Command::Clean => {
            store.clean()?;
            println!("{} Staging reset.", "✓".green());
            Ok(())
        }
        Command::Keys(args) => cmd_keys(&store, args, &format),
        Command::AddKey(args) => cmd_add_key(&store, args),
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<StoreConfig> {
    let mut config = match &cli.config {
        Some(path) => StoreConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => StoreConfig::default(),
    };
    if let Some(root) = &cli.root {
        config.root = root.clone();
    }
    Ok(config)
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn cmd_init(store: &FileSystemStore) -> anyhow::Result<()> {
    store.init()?;
    println!(
        "{} Initialized store in {}",
        "✓".green().bold(),
        store.root().display().to_string().bold()
    );
    Ok(())
}

fn cmd_meta(store: &FileSystemStore, format: &OutputFormat) -> anyhow::Result<()> {
    let meta = store.get_meta()?;
    let sizes: BTreeMap<&str, usize> = meta.iter().map(|(k, v)| (k.as_str(), v.len())).collect();
    if let OutputFormat::Json = format {
        return print_json(&sizes);
    }
    if sizes.is_empty() {
        println!("No metadata.");
    }
    for (name, size) in sizes {
        println!("  {:<16} {} bytes", name.cyan(), size);
    }
    Ok(())
}

fn cmd_set_meta(store: &FileSystemStore, args: SetMetaArgs) -> anyhow::Result<()> {
    let data = fs::read(&args.file).with_context(|| format!("reading {}", args.file.display()))?;
    store.set_meta(&args.name, &data)?;
    println!("  {} {} ({} bytes)", "staged:".green(), args.name, data.len());
    Ok(())
}

fn cmd_target(store: &FileSystemStore, args: TargetArgs) -> anyhow::Result<()> {
    match store.get_staged_target(&args.path) {
        Ok(mut reader) => {
            let size = io::copy(&mut reader, &mut io::sink())?;
            println!("  {} {} ({} bytes)", "staged:".green(), args.path, size);
            Ok(())
        }
        Err(e) if e.is_not_found() => {
            println!("  {} {}", "not staged:".yellow(), args.path);
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

fn read_hashes(path: &std::path::Path) -> anyhow::Result<TargetHashes> {
    let mut text = String::new();
    fs::File::open(path)
        .and_then(|mut f| f.read_to_string(&mut text))
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing hash set {}", path.display()))
}

fn cmd_commit(store: &FileSystemStore, args: CommitArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let hashes = read_hashes(&args.hashes)?;
    let consistent_snapshot = args.snapshot_mode(store.config().consistent_snapshot);
    let finalized = store.get_meta()?;
    let report = store.commit(&finalized, consistent_snapshot, &hashes)?;
    if let OutputFormat::Json = format {
        return print_json(&report);
    }
    print_report(&report);
    Ok(())
}

fn print_report(report: &CommitReport) {
    for path in &report.published {
        println!("  {} {}", "published:".green(), path);
    }
    for path in &report.skipped {
        println!("  {} {}", "skipped:".dimmed(), path);
    }
    for path in &report.removed {
        println!("  {} {}", "removed:".yellow(), path);
    }
    for path in &report.pruned_dirs {
        println!("  {} {}/", "pruned:".yellow(), path);
    }
    for failure in &report.gc_failures {
        println!("  {} {}: {}", "gc failed:".red(), failure.path, failure.error);
    }
    if report.is_clean() {
        println!("{} Commit complete", "✓".green().bold());
    } else {
        println!(
            "{} Commit complete, {} garbage-collection failure(s)",
            "!".yellow().bold(),
            report.gc_failures.len()
        );
    }
}

fn cmd_keys(store: &FileSystemStore, args: KeysArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let keys = store.get_keys(&args.role)?;
    let ids = keys.iter().map(Key::id).collect::<Result<Vec<_>, _>>()?;
    if let OutputFormat::Json = format {
        return print_json(&ids);
    }
    if ids.is_empty() {
        println!("No keys for role {}.", args.role.bold());
    }
    for (key, id) in keys.iter().zip(&ids) {
        let private = if key.has_private() { " (private)".dimmed().to_string() } else { String::new() };
        println!("  {} {}{}", key.key_type.cyan(), id.yellow(), private);
    }
    Ok(())
}

fn cmd_add_key(store: &FileSystemStore, args: AddKeyArgs) -> anyhow::Result<()> {
    let data = fs::read(&args.key).with_context(|| format!("reading {}", args.key.display()))?;
    let key: Key = serde_json::from_slice(&data)
        .with_context(|| format!("parsing key {}", args.key.display()))?;
    store.save_key(&args.role, &key)?;
    println!("{} Saved {} key {}", "✓".green(), args.role.bold(), key.id()?.yellow());
    Ok(())
}
