use adres_resolver::cache;
use adres_resolver::config::ResolverConfig;
use adres_resolver::duplicate_clusterer::DuplicateClusterer;
use adres_resolver::errors::ResolverError;
use adres_resolver::geocoder::CoordTables;
use adres_resolver::loaders;
use adres_resolver::matcher::Matcher;
use adres_resolver::pipeline::Pipeline;
use adres_resolver::reference_db::ReferenceIndex;
use anyhow::{Context, Result};
use clap::{Parser as ClapParser, Subcommand};
use log::error;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(ClapParser, Debug)]
#[command(name = "adres-resolver", about = "Turkish postal address resolution")]
struct Cli {
    #[arg(long = "db-hierarchy")]
    db_hierarchy: PathBuf,
    #[arg(long)]
    postal: Option<PathBuf>,
    #[arg(long)]
    abbrev: Option<PathBuf>,
    #[arg(long)]
    spelling: Option<PathBuf>,
    #[arg(long = "coords-dir")]
    coords_dir: Option<PathBuf>,
    #[arg(long)]
    embedding: Option<String>,
    #[arg(long)]
    cache: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Resolve { line: String },
    Similarity { line_a: String, line_b: String },
    Dedupe {
        batch_file: PathBuf,
        #[arg(long, default_value_t = 0.80)]
        threshold: f64,
    },
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::from(0),
        Err(err) => {
            error!("{err:#}");
            match err.chain().find_map(|cause| cause.downcast_ref::<ResolverError>()) {
                Some(resolver_err) => ExitCode::from(resolver_err.exit_code() as u8),
                None => ExitCode::from(1),
            }
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = ResolverConfig {
        hierarchy_path: cli.db_hierarchy.clone(),
        postal_path: cli.postal.clone(),
        abbrev_path: cli.abbrev.clone(),
        spelling_path: cli.spelling.clone(),
        coords_dir: cli.coords_dir.clone(),
        embedding_endpoint: cli.embedding.clone(),
        cache_path: cli.cache.clone(),
    };

    let idx = load_index(&config)?;
    let coord_tables = load_coord_tables(&config)?;
    let abbreviations = config
        .abbrev_path
        .as_deref()
        .map(loaders::load_abbreviations_json)
        .transpose()?;
    let spelling = config
        .spelling_path
        .as_deref()
        .map(loaders::load_spelling_json)
        .transpose()?;

    match cli.command {
        Command::Resolve { line } => {
            let mut pipeline = Pipeline::new(&idx).with_coord_tables(coord_tables);
            if let Some(abbrev) = abbreviations {
                pipeline = pipeline.with_abbreviations(abbrev);
            }
            if let Some(spelling) = spelling {
                pipeline = pipeline.with_spelling(spelling);
            }
            let result = pipeline.resolve(&line);
            println!("{}", serde_json::to_string_pretty(&to_json(&result))?);
        }
        Command::Similarity { line_a, line_b } => {
            let matcher = Matcher::new(&idx).with_coord_tables(coord_tables);
            let result = matcher.compare(&line_a, &line_b);
            println!(
                "{}",
                serde_json::json!({
                    "overall": result.overall,
                    "breakdown": {
                        "semantic": result.breakdown.semantic,
                        "geographic": result.breakdown.geographic,
                        "textual": result.breakdown.textual,
                        "hierarchical": result.breakdown.hierarchical,
                    },
                    "confidence": result.confidence,
                    "match_decision": result.match_decision,
                })
            );
        }
        Command::Dedupe { batch_file, threshold } => {
            let contents = std::fs::read_to_string(&batch_file)
                .map_err(|e| ResolverError::ReferenceUnavailable(format!("{}: {e}", batch_file.display())))?;
            let raws: Vec<String> = contents.lines().map(str::to_string).filter(|l| !l.trim().is_empty()).collect();
            let (clusters, stats) =
                DuplicateClusterer::new(&idx, threshold).with_coord_tables(coord_tables).cluster(&raws);
            println!(
                "{}",
                serde_json::json!({
                    "clusters": clusters,
                    "group_count": stats.group_count,
                    "unique_count": stats.unique_count,
                    "duplication_rate": stats.duplication_rate,
                })
            );
        }
    }

    Ok(())
}

fn load_index(config: &ResolverConfig) -> Result<ReferenceIndex> {
    cache::load_or_build(&config.hierarchy_path, config.postal_path.as_deref(), config.cache_path.as_deref())
        .context("failed to load reference index")
}

fn load_coord_tables(config: &ResolverConfig) -> Result<CoordTables> {
    let mut tables = CoordTables::default();
    let Some(dir) = &config.coords_dir else {
        return Ok(tables);
    };

    for (file_name, target) in [
        ("street.json", &mut tables.street),
        ("neighborhood.json", &mut tables.neighborhood),
        ("district.json", &mut tables.district),
        ("province.json", &mut tables.province),
    ] {
        let path = dir.join(file_name);
        if path.exists() {
            *target = loaders::load_coords(&path)?;
        }
    }
    Ok(tables)
}

fn to_json(result: &adres_resolver::pipeline::PipelineResult) -> serde_json::Value {
    serde_json::json!({
        "input": result.input,
        "corrected": result.corrected,
        "confidence": result.confidence,
        "precision": format!("{:?}", result.precision),
        "coordinate": {
            "latitude": result.coordinate.latitude,
            "longitude": result.coordinate.longitude,
        },
        "status": format!("{:?}", result.status),
        "errors": result.errors,
        "suggestions": result.suggestions,
        "step_timings_ms": result.step_timings_ms,
    })
}
