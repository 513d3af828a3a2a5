mod cli;

use thumbforge::{
    config, FileSystemStorage, ImageModel, Record, SpecRegistry, SqliteRecordStore,
};
use thumbforge_common::{CropAnchor, RecordId};
use thumbforge_db::pool::init_pool;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use std::path::Path;
use std::sync::Arc;

/// Page size used when walking every record.
const BATCH_SIZE: u32 = 100;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "thumbforge=trace,thumbforge_db=debug,thumbforge_common=debug".to_string()
        } else {
            "thumbforge=info,thumbforge_db=warn".to_string()
        }
    });

    // Logs go to stderr so that command output stays pipeable.
    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Add {
            file,
            link,
            crop_horz,
            crop_vert,
        } => add(config_path, &file, link, crop_horz, crop_vert),
        Commands::Replace { id, file } => replace(config_path, id, &file),
        Commands::Url { id, spec } => url(config_path, id, &spec),
        Commands::Show { id, json } => show(config_path, id, json),
        Commands::List { limit, offset } => list(config_path, limit, offset),
        Commands::Regenerate { id } => regenerate(config_path, id),
        Commands::ClearCache { id } => clear_cache(config_path, id),
        Commands::Delete { id } => delete(config_path, id),
        Commands::Specs => list_specs(config_path),
        Commands::Validate { file } => validate_config(file.as_deref().or(config_path)),
        Commands::Init { path, force } => init_config(&path, force),
        Commands::Version => {
            println!("thumbforge {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn load_registry(config: &config::Config) -> Result<SpecRegistry> {
    SpecRegistry::load(config.model.clone()).context("Failed to load image specs")
}

fn build_model(config_path: Option<&Path>) -> Result<ImageModel> {
    let config = config::load_config_or_default(config_path)?;
    let registry = load_registry(&config)?;

    let storage = FileSystemStorage::new(config.storage.root.clone(), &config.storage.base_url);

    let db_path = config.database.path.to_string_lossy();
    tracing::debug!("Opening database at {}", db_path);
    let pool = init_pool(&db_path).with_context(|| format!("Failed to open database {}", db_path))?;

    Ok(ImageModel::new(
        Arc::new(registry),
        Arc::new(storage),
        Arc::new(SqliteRecordStore::new(pool)),
    ))
}

fn read_image(file: &Path) -> Result<(String, Vec<u8>)> {
    let content =
        std::fs::read(file).with_context(|| format!("Failed to read image file: {:?}", file))?;
    let filename = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .with_context(|| format!("Not a file: {:?}", file))?;
    Ok((filename, content))
}

fn add(
    config_path: Option<&Path>,
    file: &Path,
    link: Option<String>,
    crop_horz: CropAnchor,
    crop_vert: CropAnchor,
) -> Result<()> {
    let model = build_model(config_path)?;
    let (filename, content) = read_image(file)?;

    let mut record = Record::new();
    record.link = link;
    record.crop_horz = crop_horz;
    record.crop_vert = crop_vert;
    model.set_image(&mut record, &filename, &content)?;
    model.save(&mut record, true)?;

    if let Some(id) = record.id {
        println!("{}", id);
    }
    Ok(())
}

fn replace(config_path: Option<&Path>, id: RecordId, file: &Path) -> Result<()> {
    let model = build_model(config_path)?;
    let (filename, content) = read_image(file)?;

    let mut record = model.load(id)?;
    let stored = model.set_image(&mut record, &filename, &content)?;
    model.save(&mut record, false)?;

    println!("Replaced source of {} with {}", id, stored);
    Ok(())
}

fn url(config_path: Option<&Path>, id: RecordId, spec: &str) -> Result<()> {
    let model = build_model(config_path)?;
    let mut record = model.load(id)?;
    println!("{}", model.view(&mut record, spec)?);
    Ok(())
}

fn show(config_path: Option<&Path>, id: RecordId, json: bool) -> Result<()> {
    let model = build_model(config_path)?;
    let record = model.load(id)?;

    let mut specs = Vec::new();
    for accessor in model.accessors(&record) {
        specs.push((
            accessor.spec().name().to_string(),
            accessor.name(),
            accessor.exists()?,
        ));
    }
    let admin = model.admin_thumbnail_view(&record)?;

    if json {
        let value = serde_json::json!({
            "record": record,
            "source_url": model.source_url(&record),
            "specs": specs
                .iter()
                .map(|(spec, artifact, cached)| serde_json::json!({
                    "spec": spec,
                    "artifact": artifact,
                    "cached": cached,
                }))
                .collect::<Vec<_>>(),
            "admin_thumbnail": admin,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("Record: {}", id);
    println!("Image: {}", record.image.as_deref().unwrap_or("(none)"));
    if let Some(hash) = &record.image_hash {
        println!("Hash: {}", hash);
    }
    println!("Crop: {} / {}", record.crop_horz, record.crop_vert);
    println!("Views: {}", record.view_count);
    if let Some(link) = &record.link {
        println!("Link: {}", link);
    }
    println!("Updated: {}", record.updated_at.to_rfc3339());

    println!("\nCached images:");
    for (spec, artifact, cached) in &specs {
        let status = if *cached { "✓" } else { "-" };
        println!(
            "  {} {} {}",
            status,
            spec,
            artifact.as_deref().unwrap_or("(no source)")
        );
    }

    println!("\nAdmin thumbnail: {}", admin);
    Ok(())
}

fn list(config_path: Option<&Path>, limit: u32, offset: u32) -> Result<()> {
    let model = build_model(config_path)?;
    let total = model.store().count()?;
    let records = model.store().list(limit, offset)?;

    for record in &records {
        let id = record.id.map(|id| id.to_string()).unwrap_or_default();
        println!(
            "{}  {}  views={}",
            id,
            record.image.as_deref().unwrap_or("(none)"),
            record.view_count
        );
    }
    println!("\n{} of {} record(s)", records.len(), total);
    Ok(())
}

fn regenerate(config_path: Option<&Path>, id: Option<RecordId>) -> Result<()> {
    let model = build_model(config_path)?;

    let mut count = 0;
    match id {
        Some(id) => {
            let mut record = model.load(id)?;
            model.save(&mut record, true)?;
            count += 1;
        }
        None => {
            let mut offset = 0;
            loop {
                let batch = model.store().list(BATCH_SIZE, offset)?;
                if batch.is_empty() {
                    break;
                }
                offset += batch.len() as u32;
                for mut record in batch {
                    model.save(&mut record, true)?;
                    count += 1;
                }
            }
        }
    }

    println!("Regenerated cached images for {} record(s)", count);
    Ok(())
}

fn clear_cache(config_path: Option<&Path>, id: RecordId) -> Result<()> {
    let model = build_model(config_path)?;
    let record = model.load(id)?;
    let removed = model.clear_cache(&record)?;
    println!("Removed {} cached image(s)", removed);
    Ok(())
}

fn delete(config_path: Option<&Path>, id: RecordId) -> Result<()> {
    let model = build_model(config_path)?;
    let record = model.load(id)?;
    model.delete(&record)?;
    println!("Deleted {}", id);
    Ok(())
}

fn list_specs(config_path: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let registry = load_registry(&config)?;

    for spec in registry.specs() {
        let mut flags = Vec::new();
        if spec.pre_cache {
            flags.push("pre_cache");
        }
        if spec.increment_count {
            flags.push("increment_count");
        }
        if registry.preprocessor().is_some_and(|p| p.name() == spec.name()) {
            flags.push("preprocessor");
        }
        if registry.admin_thumbnail().is_some_and(|a| a.name() == spec.name()) {
            flags.push("admin_thumbnail");
        }

        println!(
            "{}  quality={}  processors={}{}",
            spec.name(),
            spec.quality,
            spec.processors().len(),
            if flags.is_empty() {
                String::new()
            } else {
                format!("  [{}]", flags.join(", "))
            }
        );
    }
    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    let config = match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            config::load_config(p)?
        }
        None => {
            println!("No config file specified, using defaults");
            config::Config::default()
        }
    };
    let registry = load_registry(&config)?;

    println!("✓ Configuration is valid");
    println!("  Storage: {} ({})", config.storage.root.display(), config.storage.base_url);
    println!("  Database: {}", config.database.path.display());
    match &config.model.spec_module {
        Some(module) => println!("  Spec module: {}", module.display()),
        None => println!("  Spec module: built-in defaults"),
    }
    println!("  Specs: {}", registry.specs().len());
    if registry.admin_thumbnail().is_none() {
        println!(
            "  Admin thumbnail spec {:?} is not defined",
            config.model.admin_thumbnail_spec
        );
    }
    Ok(())
}

fn init_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!("Config file already exists: {:?} (use --force to overwrite)", path);
    }
    config::persist::save_config(path, &config::Config::default())?;
    println!("Wrote default config to {:?}", path);
    Ok(())
}
