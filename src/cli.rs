use crate::config::{Config, load_config};
use crate::forest::{
    ForestHandle, ForestLayout, ForestLayoutKind, LayoutRequest, SortKey, ViewTransform,
    ZoomController,
};
use crate::ir::{dedupe_names, load_names, save_names};
use crate::layout::compute_tree_layout;
use crate::layout_dump::write_layout_dump;
use crate::parser::parse_text;
use crate::render::{render_forest_document, render_tree_element, write_output_png, write_output_svg};
use crate::scene::Document;
use crate::stamp::WordCellStamp;
use anyhow::{Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "s2t", version, about = "Grow a tree from a string")]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Draw one tree
    Tree(TreeArgs),
    /// Lay out many trees
    Forest(ForestArgs),
    /// Remove nameless and repeated entries from a name list
    Dedupe(DedupeArgs),
}

#[derive(ClapArgs, Debug)]
pub struct OutputArgs {
    /// Output file (svg/png). Defaults to stdout for SVG if omitted.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short = 'e', long = "outputFormat", value_enum, default_value = "svg")]
    pub output_format: OutputFormat,

    /// Config JSON/JSON5 file
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,
}

#[derive(ClapArgs, Debug)]
pub struct TreeArgs {
    /// Text to grow
    #[arg(short = 't', long = "text")]
    pub text: String,

    #[command(flatten)]
    pub output: OutputArgs,

    /// Draw the canvas frame
    #[arg(long)]
    pub grid: bool,

    /// Omit the digit footer
    #[arg(long = "no-number")]
    pub no_number: bool,

    /// Omit the signature stamp
    #[arg(long = "no-stamp")]
    pub no_stamp: bool,

    /// Annotate internal nodes with their child count
    #[arg(long)]
    pub count: bool,

    /// Omit the baseline
    #[arg(long = "no-line")]
    pub no_line: bool,

    /// Start the stamp at the canvas centre instead of right-aligning it
    #[arg(long)]
    pub center: bool,

    /// Pen-plotter output
    #[arg(long)]
    pub plot: bool,

    /// Write the computed layout as JSON
    #[arg(long = "dump-layout")]
    pub dump_layout: Option<PathBuf>,
}

#[derive(ClapArgs, Debug)]
pub struct ForestArgs {
    /// JSON array of {name, id?, createdAt?} records
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,

    #[command(flatten)]
    pub output: OutputArgs,

    /// grid, cloud or swarm
    #[arg(short = 'l', long = "layout", default_value = "grid")]
    pub layout: String,

    /// Grid order, e.g. time-asc or name-desc
    #[arg(short = 's', long = "sort-by", default_value = "time-asc")]
    pub sort_by: String,

    /// Fixed grid column count
    #[arg(long)]
    pub columns: Option<usize>,

    /// Vertical swarm timeline
    #[arg(long)]
    pub vertical: bool,

    /// Zoom onto this cell before rendering
    #[arg(long)]
    pub focus: Option<usize>,

    /// Only lay out this page of the list
    #[arg(long)]
    pub page: Option<usize>,
}

#[derive(ClapArgs, Debug)]
pub struct DedupeArgs {
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,

    /// Defaults to overwriting the input
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum OutputFormat {
    Svg,
    Png,
}

pub fn run() -> Result<()> {
    init_tracing();
    let args = Args::parse();
    match args.command {
        Command::Tree(args) => run_tree(args),
        Command::Forest(args) => run_forest(args),
        Command::Dedupe(args) => run_dedupe(args),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn run_tree(args: TreeArgs) -> Result<()> {
    let config = load_config(args.output.config.as_deref())?;
    let mut options = config.options.clone();
    options.grid |= args.grid;
    options.count |= args.count;
    options.plot |= args.plot;
    if args.no_number {
        options.number = false;
    }
    if args.no_stamp {
        options.stamp = false;
    }
    if args.no_line {
        options.line = false;
    }
    if args.center {
        options.end = false;
    }
    options.validate(&config.tree)?;

    let layout = compute_tree_layout(&parse_text(&args.text), &options, &config.tree);
    if let Some(path) = &args.dump_layout {
        write_layout_dump(path, &layout)
            .with_context(|| format!("writing layout dump to {}", path.display()))?;
    }
    let renderer = WordCellStamp::new(&config.theme, config.tree.stamp.stroke_width);
    let element = render_tree_element(&layout, &options, &config.tree, &config.theme, &renderer);
    emit(&Document::new(element).to_svg(), &args.output, &config)
}

fn run_forest(args: ForestArgs) -> Result<()> {
    let mut config = load_config(args.output.config.as_deref())?;
    if args.columns.is_some() {
        config.forest.grid.columns = args.columns;
    }
    let kind: ForestLayoutKind = args.layout.parse()?;
    let request = match kind {
        ForestLayoutKind::Grid => LayoutRequest::grid(args.sort_by.parse::<SortKey>()?),
        ForestLayoutKind::Cloud => LayoutRequest::cloud(),
        ForestLayoutKind::Swarm => LayoutRequest::swarm(!args.vertical),
    };

    let mut records = load_names(&args.input)
        .with_context(|| format!("reading names from {}", args.input.display()))?;
    if let Some(index) = args.page {
        records = crate::ir::page(&records, index, config.forest.per_page).to_vec();
    }

    let mut handle = ForestHandle::from_records(&records, config.forest.clone());
    handle.update(request);
    handle.flush();
    let Some(layout) = handle.layout() else {
        anyhow::bail!("forest layout was not computed");
    };

    let transform = match (layout, args.focus) {
        (ForestLayout::Cells(cells), Some(index)) => {
            let cell = cells
                .cells
                .get(index)
                .with_context(|| format!("no cell {index} among {}", cells.cells.len()))?;
            let mut zoom = ZoomController::new(
                cells.extent,
                config.forest.cell_size,
                config.forest.zoom_duration_multiplier,
            );
            zoom.click(index, cell.x, cell.y, 0.0);
            zoom.finish();
            zoom.transform()
        }
        (ForestLayout::Swarm(_), Some(_)) => {
            tracing::warn!("--focus only applies to grid and cloud layouts");
            ViewTransform::IDENTITY
        }
        (_, None) => ViewTransform::IDENTITY,
    };

    let renderer = WordCellStamp::new(&config.theme, config.tree.stamp.stroke_width);
    let svg = render_forest_document(layout, transform, &config, &renderer).to_svg();
    config.render.width = config.forest.style_width as f32;
    config.render.height = config.forest.style_height as f32;
    emit(&svg, &args.output, &config)
}

fn run_dedupe(args: DedupeArgs) -> Result<()> {
    let records = load_names(&args.input)
        .with_context(|| format!("reading names from {}", args.input.display()))?;
    let (kept, removed) = dedupe_names(&records);
    for record in &removed {
        tracing::info!(name = %record.name, id = ?record.id, "removed duplicate");
    }
    tracing::info!(kept = kept.len(), removed = removed.len(), "deduplicated names");
    let output = args.output.as_deref().unwrap_or(&args.input);
    save_names(output, &kept)
}

fn emit(svg: &str, output: &OutputArgs, config: &Config) -> Result<()> {
    match output.output_format {
        OutputFormat::Svg => write_output_svg(svg, output.output.as_deref()),
        OutputFormat::Png => {
            let path = ensure_output(output.output.as_deref(), "png")?;
            write_output_png(svg, path, &config.render)
        }
    }
}

fn ensure_output<'a>(output: Option<&'a Path>, ext: &str) -> Result<&'a Path> {
    output.ok_or_else(|| anyhow::anyhow!("Output path required for {} output", ext))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tree_flags() {
        let args = Args::try_parse_from(["s2t", "tree", "-t", "Ada", "--plot", "--no-line", "--center"])
            .unwrap();
        let Command::Tree(tree) = args.command else {
            panic!("expected the tree command");
        };
        assert_eq!(tree.text, "Ada");
        assert!(tree.plot && tree.no_line && tree.center);
        assert!(!tree.grid);
        assert!(matches!(tree.output.output_format, OutputFormat::Svg));
    }

    #[test]
    fn parses_forest_flags() {
        let args = Args::try_parse_from([
            "s2t", "forest", "-i", "names.json", "--layout", "swarm", "--vertical", "--focus", "2",
        ])
        .unwrap();
        let Command::Forest(forest) = args.command else {
            panic!("expected the forest command");
        };
        assert_eq!(forest.layout, "swarm");
        assert!(forest.vertical);
        assert_eq!(forest.focus, Some(2));
        assert_eq!(forest.sort_by, "time-asc");
    }

    #[test]
    fn png_needs_an_output_path() {
        assert!(ensure_output(None, "png").is_err());
        assert_eq!(ensure_output(Some(Path::new("a.png")), "png").unwrap(), Path::new("a.png"));
    }
}
