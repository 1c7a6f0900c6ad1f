//! cadgraph CLI - CAD scene graphs tagged with part types.
//!
//! Single binary that provides:
//! - `cadgraph classify` - tag parts and print the part-type histogram
//! - `cadgraph export` - tag parts and write every interchange format
//! - `cadgraph search` - label search over a saved GraphML graph
//! - `cadgraph init` - write a default configuration file

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{fmt, EnvFilter};

use cadgraph_core::config::CONFIG_RELATIVE_PATH;
use cadgraph_core::export::{read_graph, to_cytoscape, write_graph};
use cadgraph_core::{
    export, neighborhood, part_histogram, CadgraphConfig, EnrichOptions, EnrichReport, Enricher,
    ExportFormat, ExportedFile, LoadOptions, PartType, SceneGraph, SceneLoader,
};

#[derive(Parser)]
#[command(name = "cadgraph")]
#[command(about = "Tag CAD scene graphs with part types and export them", version)]
struct Cli {
    /// Configuration file (defaults to .cadgraph/config.yaml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Tag parts and print a histogram of part types
    Classify {
        /// Path to a .glb/.gltf file
        #[arg(long)]
        glb: PathBuf,

        /// Also write scene_tagged.graphml into this directory
        #[arg(long)]
        out: Option<PathBuf>,

        #[command(flatten)]
        tagging: TaggingArgs,
    },

    /// Tag parts and write the graph in the selected formats
    Export {
        /// Path to a .glb/.gltf file
        #[arg(long)]
        glb: PathBuf,

        /// Output directory
        #[arg(long)]
        out: PathBuf,

        /// Formats to write (repeatable); all when omitted
        #[arg(long = "format", value_name = "FORMAT")]
        formats: Vec<ExportFormat>,

        #[command(flatten)]
        tagging: TaggingArgs,
    },

    /// Find nodes by label and print their neighbourhood as Cytoscape JSON
    Search {
        /// A GraphML file written by `classify` or `export`
        #[arg(long)]
        graph: PathBuf,

        /// Case-insensitive label substring; blank prints the whole graph
        query: String,
    },

    /// Write a default .cadgraph/config.yaml
    Init,
}

#[derive(clap::Args)]
struct TaggingArgs {
    /// Skip geometry-based tagging (keyword rules only)
    #[arg(long)]
    no_geom: bool,

    /// Ignore and do not write the scene graph cache
    #[arg(long)]
    no_cache: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cwd = std::env::current_dir().context("Failed to get current directory")?;

    match cli.command {
        Commands::Classify { glb, out, tagging } => {
            let config = load_config(cli.config.as_deref(), &cwd)?;
            classify(&config, &glb, out.as_deref(), &tagging)
        }
        Commands::Export {
            glb,
            out,
            formats,
            tagging,
        } => {
            let config = load_config(cli.config.as_deref(), &cwd)?;
            let formats = if formats.is_empty() {
                config.export.formats.clone()
            } else {
                formats
            };
            export_scene(&config, &glb, &out, &formats, &tagging)
        }
        Commands::Search { graph, query } => search(&graph, &query),
        Commands::Init => init_project(&cwd),
    }
}

fn load_config(explicit: Option<&Path>, cwd: &Path) -> Result<CadgraphConfig> {
    let mut config = match explicit {
        Some(path) => CadgraphConfig::load(path)?,
        None => CadgraphConfig::load_from_dir(cwd)?,
    };
    config.resolve_paths(cwd);
    Ok(config)
}

/// Load and tag a scene according to `config` and the command-line flags.
fn tag_scene(
    config: &CadgraphConfig,
    glb: &Path,
    tagging: &TaggingArgs,
) -> Result<(SceneGraph, EnrichReport)> {
    let mut options = LoadOptions::from(&config.cache);
    if tagging.no_cache {
        options.use_cache = false;
    }
    let (assets, mut graph) = SceneLoader::with_options(options).load(glb)?;

    let enricher = Enricher::from_config(&config.classifier).with_options(EnrichOptions {
        use_geometry: !tagging.no_geom,
    });
    let report = enricher.enrich(&assets, &mut graph);
    Ok((graph, report))
}

fn classify(
    config: &CadgraphConfig,
    glb: &Path,
    out: Option<&Path>,
    tagging: &TaggingArgs,
) -> Result<()> {
    let (graph, _) = tag_scene(config, glb, tagging)?;

    let histogram = part_histogram(&graph);
    println!("{}", serde_json::to_string_pretty(&histogram)?);

    if let Some(out) = out {
        std::fs::create_dir_all(out)
            .with_context(|| format!("Failed to create {}", out.display()))?;
        let path = out.join("scene_tagged.graphml");
        write_graph(&graph, &path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!("Tagged GraphML saved to {}", path.display());
    }
    Ok(())
}

/// Written next to the exported files.
#[derive(Serialize)]
struct Manifest<'a> {
    generated_at: String,
    source: &'a Path,
    nodes: usize,
    edges: usize,
    enrichment: &'a EnrichReport,
    histogram: &'a BTreeMap<PartType, usize>,
    files: &'a [ExportedFile],
}

fn export_scene(
    config: &CadgraphConfig,
    glb: &Path,
    out: &Path,
    formats: &[ExportFormat],
    tagging: &TaggingArgs,
) -> Result<()> {
    let (graph, report) = tag_scene(config, glb, tagging)?;
    let files = export(&graph, out, formats)?;
    let histogram = part_histogram(&graph);

    let manifest = Manifest {
        generated_at: chrono::Utc::now().to_rfc3339(),
        source: glb,
        nodes: graph.node_count(),
        edges: graph.edge_count(),
        enrichment: &report,
        histogram: &histogram,
        files: &files,
    };
    let manifest_path = out.join("manifest.json");
    std::fs::write(&manifest_path, serde_json::to_string_pretty(&manifest)?)
        .with_context(|| format!("Failed to write {}", manifest_path.display()))?;

    println!("Summary:");
    for (part, count) in &histogram {
        println!("  {:<10}: {:5}", part.as_str(), count);
    }
    println!("  {:<10}: {:5}", "TOTAL", graph.node_count());
    println!();
    println!("Files:");
    for file in &files {
        println!(
            "  {:<10} {:>9.1} kB  {}",
            file.format.as_str(),
            file.bytes as f64 / 1e3,
            file.path.display()
        );
    }
    println!("  {:<10} {:>12}  {}", "manifest", "", manifest_path.display());
    Ok(())
}

fn search(graph_path: &Path, query: &str) -> Result<()> {
    let graph = read_graph(graph_path)
        .with_context(|| format!("Failed to read {}", graph_path.display()))?;
    let hits = neighborhood(&graph, query);
    tracing::info!(query, nodes = hits.node_count(), "Search complete");
    println!("{}", serde_json::to_string_pretty(&to_cytoscape(&hits))?);
    Ok(())
}

const DEFAULT_CONFIG: &str = r#"# cadgraph configuration

classifier:
  acceptance_threshold: 0.6
  # first accepted detector wins
  order: [screw, plate, pipe, nut, wheel]
  screw:
    keywords:
      keywords: [screw, bolt, thread, vis, schraube]
      confidence: 0.95
    min_aspect: 2.5
    geometry_confidence: 0.65
  plate:
    max_flatness: 0.08
    min_aspect: 3.0
    confidence: 0.8
  pipe:
    min_aspect: 1.5
    max_fill_ratio: 0.3
    confidence: 0.75
  nut:
    keywords:
      keywords: [nut]
      confidence: 0.9
    hex_tolerance: 0.05
    geometry_confidence: 0.7
  wheel:
    keywords:
      keywords: [wheel, rad]
      confidence: 0.9
    roundness: [0.9, 1.1]
    thickness: [0.2, 0.6]
    geometry_confidence: 0.6

cache:
  enabled: true
  # dir: .cadgraph/cache

export:
  formats: [triples, node_link, jsonl, graphml, cytoscape]
"#;

fn init_project(root: &Path) -> Result<()> {
    let config_path = root.join(CONFIG_RELATIVE_PATH);
    if let Some(dir) = config_path.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
    }

    if config_path.exists() {
        println!("Config already exists at {}", config_path.display());
        return Ok(());
    }

    std::fs::write(&config_path, DEFAULT_CONFIG)
        .with_context(|| format!("Failed to write {}", config_path.display()))?;

    println!("Initialized cadgraph config at {}", config_path.display());
    println!();
    println!("Next steps:");
    println!("  1. Adjust detector order and thresholds in {CONFIG_RELATIVE_PATH}");
    println!("  2. Run: cadgraph classify --glb <model.glb>");
    Ok(())
}
