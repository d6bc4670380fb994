use crate::catalog::Catalog;
use crate::config::load_config;
use crate::layout::Direction;
use crate::layout_dump::write_layout_dump;
use crate::render::{render_measured_svg, write_output_png, write_output_svg};
use crate::{RenderOptions, build_canvas};
use anyhow::{Context, Result};
use clap::{ArgAction, Parser, ValueEnum};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const LOG_ENV: &str = "CATDIAG_LOG";

#[derive(Parser, Debug)]
#[command(
    name = "catdiag",
    version,
    about = "Lay out a software catalog as a dependency diagram"
)]
pub struct Args {
    /// Catalog JSON file (array of entities) or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Output file (svg/png). Defaults to stdout for SVG if omitted.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short = 'e', long = "outputFormat", value_enum, default_value = "svg")]
    pub output_format: OutputFormat,

    /// Config JSON file
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Viewport width
    #[arg(short = 'w', long = "width")]
    pub width: Option<f32>,

    /// Viewport height
    #[arg(short = 'H', long = "height")]
    pub height: Option<f32>,

    /// Layout direction (TB or LR). Defaults by viewport width.
    #[arg(short = 'd', long = "direction", value_parser = parse_direction)]
    pub direction: Option<Direction>,

    /// Comma-separated allowed tags. Defaults to every tag in the catalog.
    #[arg(long = "tags", value_delimiter = ',')]
    pub tags: Option<Vec<String>>,

    /// Render one entity and its direct relations instead of the whole catalog
    #[arg(long = "focus")]
    pub focus: Option<String>,

    /// Pre-select a node
    #[arg(long = "select")]
    pub select: Option<String>,

    /// Write the positioned diagram as JSON
    #[arg(long = "dump-layout")]
    pub dump_layout: Option<PathBuf>,

    /// Raise log verbosity (-v debug, -vv trace)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum OutputFormat {
    Svg,
    Png,
}

fn parse_direction(value: &str) -> Result<Direction, String> {
    Direction::from_token(value).ok_or_else(|| format!("expected TB or LR, got '{value}'"))
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let mut config = load_config(args.config.as_deref())?;
    if let Some(width) = args.width {
        config.render.width = width;
    }
    if let Some(height) = args.height {
        config.render.height = height;
    }

    let input = read_input(args.input.as_deref())?;
    let catalog = Catalog::from_json(&input).context("failed to parse catalog")?;
    info!(entities = catalog.entities().len(), "loaded catalog");

    let options = RenderOptions {
        config,
        direction: args.direction,
        tags: args
            .tags
            .map(|tags| tags.into_iter().map(|tag| tag.trim().to_string()).collect()),
        focus: args.focus,
    };
    let config = &options.config;
    let mut canvas = build_canvas(&catalog, &options)?;
    if let Some(id) = args.select.as_deref() {
        canvas.select_node(id);
    }

    let svg = render_measured_svg(&mut canvas, &config.theme, config);
    if let Some(path) = args.dump_layout.as_deref() {
        write_layout_dump(path, &canvas)
            .with_context(|| format!("failed to write layout dump {}", path.display()))?;
    }

    match args.output_format {
        OutputFormat::Svg => write_output_svg(&svg, args.output.as_deref())?,
        OutputFormat::Png => {
            let output = ensure_output(&args.output, "png")?;
            write_output_png(&svg, &output, &config.render)?;
        }
    }
    Ok(())
}

/// Logs go to stderr so SVG on stdout stays clean.
fn init_logging(verbose: u8) {
    let fallback = match verbose {
        0 => "warn",
        1 => "catalog_diagram=debug",
        _ => "catalog_diagram=trace",
    };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(fallback));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .try_init();
}

fn read_input(path: Option<&Path>) -> Result<String> {
    if let Some(path) = path
        && path != Path::new("-")
    {
        return std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()));
    }
    let mut buf = String::new();
    io::stdin()
        .read_to_string(&mut buf)
        .context("failed to read stdin")?;
    Ok(buf)
}

fn ensure_output(output: &Option<PathBuf>, ext: &str) -> Result<PathBuf> {
    if let Some(path) = output {
        return Ok(path.clone());
    }
    Err(anyhow::anyhow!("Output path required for {} output", ext))
}
