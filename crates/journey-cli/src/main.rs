use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use journey_core::{
    CatalogDocument, CatalogSource, ConfigManager, JourneyConfig, JourneyError, ProgressStore,
    RecommendationSettings,
};
use journey_graph::{
    load_catalog_file, FileCatalogSource, FileProgressStore, GraphValidator, JourneyEngine,
    LayoutProjector, SpacingThresholds,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tabled::{builder::Builder, settings::Style};
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "journey")]
#[command(about = "Journey CLI - Validate learning catalogs and track progress", long_about = None)]
#[command(version)]
struct Cli {
    /// Output format (json, pretty, table)
    #[arg(short, long, global = true, default_value = "pretty")]
    output: OutputFormat,

    /// Configuration file (defaults to ./.journey.toml, then ~/.journey/config.toml)
    #[arg(short, long, global = true, env = "JOURNEY_CONFIG")]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    Json,
    Pretty,
    Table,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a catalog for structural errors and spacing problems
    Validate {
        /// Catalog file (.json, .yaml or .yml)
        catalog: PathBuf,

        /// Minimum distance between tree-layout nodes
        #[arg(long)]
        min_tree_distance: Option<f64>,

        /// Minimum distance between spiral-layout nodes
        #[arg(long)]
        min_spiral_distance: Option<f64>,
    },

    /// Show the computed status of every node
    Status(EvaluateArgs),

    /// Show only the recommended next node
    Next(EvaluateArgs),

    /// Project node positions to cartesian coordinates
    Layout {
        /// Catalog file (.json, .yaml or .yml)
        catalog: PathBuf,

        /// Display scale applied to tree coordinates
        #[arg(long)]
        scale: Option<f64>,
    },

    /// Print the JSON Schema of the catalog document
    Schema,

    /// Mark a node completed (or not) in a progress file
    Complete {
        /// Progress file (created if missing)
        progress: PathBuf,

        /// Node id
        id: String,

        /// Clear the completion flag instead of setting it
        #[arg(long)]
        undo: bool,

        /// Reject ids that are not in this catalog
        #[arg(long)]
        catalog: Option<PathBuf>,
    },

    /// Update the recommendation focus stored in a progress file
    Focus {
        /// Progress file (created if missing)
        progress: PathBuf,

        /// Node the user is currently looking at
        #[arg(long)]
        node: Option<String>,

        /// Spiral order to resume from
        #[arg(long)]
        order: Option<i64>,

        /// Clear both the current node and the spiral order
        #[arg(long, conflicts_with_all = ["node", "order"])]
        clear: bool,
    },

    /// Write a default configuration file
    InitConfig {
        /// Destination path
        #[arg(default_value = ".journey.toml")]
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Args)]
struct EvaluateArgs {
    /// Catalog file (.json, .yaml or .yml)
    catalog: PathBuf,

    /// Progress file with completion flags and settings
    #[arg(short, long)]
    progress: Option<PathBuf>,

    /// Additional completed node ids (comma-separated)
    #[arg(long, value_delimiter = ',')]
    completed: Vec<String>,

    /// Current node for the tag-overlap fallback
    #[arg(long)]
    current_node: Option<String>,

    /// Spiral order to resume from
    #[arg(long)]
    current_order: Option<i64>,

    /// Skip spiral continuation and go straight to tag overlap
    #[arg(long)]
    no_spiral_continuation: bool,
}

// Output structures
#[derive(Serialize)]
struct NodeStatusRow {
    id: String,
    #[serde(rename = "type")]
    node_type: String,
    title: String,
    status: String,
    unmet_dependencies: String,
}

#[derive(Serialize)]
struct CompletionResult {
    progress: String,
    node: String,
    completed: bool,
    total_completed: usize,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => ConfigManager::load_from(path),
        None => ConfigManager::load(),
    };
    let config = match config {
        Ok(manager) => manager,
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            std::process::exit(1);
        }
    };

    init_tracing(config.config(), cli.verbose);
    if let Some(path) = config.config_path() {
        debug!("Using configuration from {}", path.display());
    }

    match execute_command(&cli, config.config()) {
        Ok(output) => {
            print_output(&cli.output, &output)?;
            Ok(())
        }
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            std::process::exit(1);
        }
    }
}

fn init_tracing(config: &JourneyConfig, verbose: bool) {
    let level = if verbose {
        "debug"
    } else {
        config.logging.level.as_str()
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("journey={level},journey_core={level},journey_graph={level}").into()
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn execute_command(cli: &Cli, config: &JourneyConfig) -> Result<serde_json::Value> {
    match &cli.command {
        Commands::Validate {
            catalog,
            min_tree_distance,
            min_spiral_distance,
        } => {
            let mut thresholds = SpacingThresholds::from(&config.validation);
            if let Some(distance) = min_tree_distance {
                thresholds.min_tree_distance = *distance;
            }
            if let Some(distance) = min_spiral_distance {
                thresholds.min_spiral_distance = *distance;
            }
            execute_validate(catalog, thresholds)
        }
        Commands::Status(args) => execute_status(args, config, false),
        Commands::Next(args) => execute_status(args, config, true),
        Commands::Layout { catalog, scale } => {
            let tree_scale = scale.unwrap_or(config.layout.tree_scale);
            execute_layout(catalog, tree_scale, config)
        }
        Commands::Schema => {
            let schema = schemars::schema_for!(CatalogDocument);
            Ok(serde_json::to_value(schema)?)
        }
        Commands::Complete {
            progress,
            id,
            undo,
            catalog,
        } => execute_complete(progress, id, !undo, catalog.as_deref()),
        Commands::Focus {
            progress,
            node,
            order,
            clear,
        } => execute_focus(progress, node.clone(), *order, *clear),
        Commands::InitConfig { path, force } => {
            if path.exists() && !*force {
                bail!(
                    "{} already exists (use --force to overwrite)",
                    path.display()
                );
            }
            ConfigManager::create_default_config(path)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Wrote default configuration to {}", path.display());

            Ok(serde_json::json!({
                "path": path.display().to_string(),
                "status": "created",
            }))
        }
    }
}

fn execute_validate(catalog: &Path, thresholds: SpacingThresholds) -> Result<serde_json::Value> {
    let nodes = load_catalog_file(catalog)
        .with_context(|| format!("Failed to load catalog {}", catalog.display()))?;
    let validated = GraphValidator::new(thresholds)
        .validate_records(nodes)
        .context("Catalog validation failed")?;
    let report = validated.report();

    for warning in &report.warnings {
        eprintln!("{} {}", "Warning:".yellow().bold(), warning);
    }

    Ok(serde_json::json!({
        "catalog": catalog.display().to_string(),
        "valid": true,
        "nodes": report.node_count,
        "edges": report.edge_count,
        "warnings": report.warnings,
    }))
}

fn execute_status(
    args: &EvaluateArgs,
    config: &JourneyConfig,
    next_only: bool,
) -> Result<serde_json::Value> {
    let mut source = FileCatalogSource::new(&args.catalog);
    if let Some(progress) = &args.progress {
        source = source.with_progress(progress);
    }

    let engine = JourneyEngine::load(&source, SpacingThresholds::from(&config.validation))
        .with_context(|| format!("Failed to load catalog {}", args.catalog.display()))?;

    // One snapshot for the whole computation; flags only add to it.
    let mut completed = source
        .list_completed_ids()
        .context("Failed to read progress")?;
    for id in &args.completed {
        completed.mark(id.as_str(), true);
    }

    let settings = resolve_settings(args, config)?;
    let view = engine.evaluate(&completed, &settings)?;

    if next_only {
        let next = view.next.as_ref().and_then(|id| engine.catalog().get(id));
        return Ok(serde_json::json!({
            "next": view.next,
            "title": next.and_then(|node| node.title.clone()),
            "available": view.summary.available + view.summary.next,
        }));
    }

    let nodes: Vec<NodeStatusRow> = engine
        .catalog()
        .nodes()
        .iter()
        .filter_map(|node| {
            view.statuses.get(&node.id).map(|computed| NodeStatusRow {
                id: node.id.clone(),
                node_type: node.node_type.to_string(),
                title: node.title.clone().unwrap_or_default(),
                status: computed.status.to_string(),
                unmet_dependencies: computed.unmet_dependencies.join(", "),
            })
        })
        .collect();

    Ok(serde_json::json!({
        "catalog": args.catalog.display().to_string(),
        "next": view.next,
        "summary": view.summary,
        "nodes": nodes,
    }))
}

/// Progress-file settings, then config, then command-line flags.
fn resolve_settings(args: &EvaluateArgs, config: &JourneyConfig) -> Result<RecommendationSettings> {
    let mut settings = match &args.progress {
        Some(path) => FileProgressStore::new(path)
            .settings()
            .with_context(|| format!("Failed to read progress {}", path.display()))?,
        None => RecommendationSettings::default(),
    };

    if !config.recommendation.prefer_spiral_continuation || args.no_spiral_continuation {
        settings.prefer_spiral_continuation = false;
    }
    if let Some(node) = &args.current_node {
        settings.current_node_id = Some(node.clone());
    }
    if let Some(order) = args.current_order {
        settings.current_spiral_order = Some(order);
    }
    Ok(settings)
}

fn execute_layout(catalog: &Path, tree_scale: f64, config: &JourneyConfig) -> Result<serde_json::Value> {
    if !tree_scale.is_finite() || tree_scale <= 0.0 {
        bail!("Scale must be a positive number (got {})", tree_scale);
    }

    let nodes = load_catalog_file(catalog)
        .with_context(|| format!("Failed to load catalog {}", catalog.display()))?;
    let validated = GraphValidator::from_config(&config.validation)
        .validate_records(nodes)
        .context("Catalog validation failed")?;

    let projector = LayoutProjector::new(tree_scale);
    let catalog_ref = validated.catalog();

    Ok(serde_json::json!({
        "tree_scale": projector.tree_scale(),
        "nodes": projector.project_all(catalog_ref),
        "spiral_path": projector.spiral_path(catalog_ref),
        "tree_links": projector.tree_links(catalog_ref),
    }))
}

fn execute_complete(
    progress: &Path,
    id: &str,
    completed: bool,
    catalog: Option<&Path>,
) -> Result<serde_json::Value> {
    if let Some(catalog) = catalog {
        let source = FileCatalogSource::new(catalog);
        let known = source
            .list_nodes()
            .with_context(|| format!("Failed to load catalog {}", catalog.display()))?
            .iter()
            .any(|node| node.id == id);
        if !known {
            return Err(JourneyError::NodeNotFound(id.to_string()).into());
        }
    }

    let store = FileProgressStore::new(progress);
    store
        .mark_completed(id, completed)
        .with_context(|| format!("Failed to update {}", progress.display()))?;
    let snapshot = store.snapshot()?;

    let result = CompletionResult {
        progress: progress.display().to_string(),
        node: id.to_string(),
        completed,
        total_completed: snapshot.completed.len(),
    };
    Ok(serde_json::to_value(result)?)
}

fn execute_focus(
    progress: &Path,
    node: Option<String>,
    order: Option<i64>,
    clear: bool,
) -> Result<serde_json::Value> {
    let store = FileProgressStore::new(progress);
    let context = || format!("Failed to update {}", progress.display());

    if clear {
        store.set_current_node(None).with_context(context)?;
        store.set_current_spiral_order(None).with_context(context)?;
    }
    if node.is_some() {
        store.set_current_node(node).with_context(context)?;
    }
    if order.is_some() {
        store.set_current_spiral_order(order).with_context(context)?;
    }

    Ok(serde_json::to_value(store.settings()?)?)
}

fn print_output(format: &OutputFormat, value: &serde_json::Value) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(value)?);
        }
        OutputFormat::Pretty => {
            print_pretty(value, 0)?;
        }
        OutputFormat::Table => {
            print_table(value)?;
        }
    }
    Ok(())
}

fn print_pretty(value: &serde_json::Value, indent: usize) -> Result<()> {
    let pad = "  ".repeat(indent);
    match value {
        serde_json::Value::Object(map) => {
            for (key, val) in map {
                let key_colored = key.cyan().bold();
                match val {
                    serde_json::Value::String(s) if key == "status" => {
                        println!("{}{}: {}", pad, key_colored, colorize_status(s));
                    }
                    serde_json::Value::String(s) => {
                        println!("{}{}: {}", pad, key_colored, s.green());
                    }
                    serde_json::Value::Number(n) => {
                        println!("{}{}: {}", pad, key_colored, n.to_string().yellow());
                    }
                    serde_json::Value::Bool(b) => {
                        let val_colored = if *b {
                            "true".green()
                        } else {
                            "false".red()
                        };
                        println!("{}{}: {}", pad, key_colored, val_colored);
                    }
                    serde_json::Value::Null => {
                        println!("{}{}: {}", pad, key_colored, "none".dimmed());
                    }
                    serde_json::Value::Array(arr) if arr.is_empty() => {
                        println!("{}{}: {}", pad, key_colored, "[]".dimmed());
                    }
                    _ => {
                        println!("{}{}:", pad, key_colored);
                        print_pretty(val, indent + 1)?;
                    }
                }
            }
        }
        serde_json::Value::Array(arr) => {
            for (i, item) in arr.iter().enumerate() {
                match item {
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        println!("{}{}{}:", pad, "Item ".cyan(), (i + 1).to_string().yellow());
                        print_pretty(item, indent + 1)?;
                    }
                    _ => println!("{}- {}", pad, scalar_text(item)),
                }
            }
        }
        _ => {
            println!("{}{}", pad, serde_json::to_string_pretty(value)?);
        }
    }
    Ok(())
}

fn colorize_status(status: &str) -> colored::ColoredString {
    match status {
        "completed" => status.green(),
        "next" => status.magenta().bold(),
        "available" => status.cyan(),
        "locked" => status.dimmed(),
        _ => status.normal(),
    }
}

/// Scalars become key/value rows; arrays of objects get their own table.
fn print_table(value: &serde_json::Value) -> Result<()> {
    match value {
        serde_json::Value::Object(map) => {
            let mut fields = Builder::default();
            fields.push_record(["field".to_string(), "value".to_string()]);
            let mut nested = Vec::new();

            for (key, val) in map {
                match val {
                    serde_json::Value::Array(rows)
                        if !rows.is_empty() && rows.iter().all(|r| r.is_object()) =>
                    {
                        nested.push((key, rows));
                    }
                    _ => {
                        fields.push_record([key.clone(), scalar_text(val)]);
                    }
                }
            }

            let mut table = fields.build();
            table.with(Style::rounded());
            println!("{}", table);

            for (key, rows) in nested {
                println!("\n{}", key.cyan().bold());
                println!("{}", rows_table(rows));
            }
        }
        serde_json::Value::Array(rows) if rows.iter().all(|r| r.is_object()) => {
            println!("{}", rows_table(rows));
        }
        _ => print_pretty(value, 0)?,
    }
    Ok(())
}

fn rows_table(rows: &[serde_json::Value]) -> String {
    let headers: Vec<String> = rows
        .first()
        .and_then(|row| row.as_object())
        .map(|row| row.keys().cloned().collect())
        .unwrap_or_default();

    let mut builder = Builder::default();
    builder.push_record(headers.clone());
    for row in rows {
        let cells: Vec<String> = headers
            .iter()
            .map(|header| row.get(header).map(scalar_text).unwrap_or_default())
            .collect();
        builder.push_record(cells);
    }

    let mut table = builder.build();
    table.with(Style::rounded());
    table.to_string()
}

fn scalar_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}
