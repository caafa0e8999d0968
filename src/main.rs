use anyhow::{Context as _, Result, anyhow};
use clap::Parser;
use dendroview::cdt::{CdtFile, load_cdt};
use dendroview::config::RenderConfig;
use dendroview::figure::Figure;
use dendroview::labels::LabelInfo;
use dendroview::layout::StructuredDrawingArea;
use dendroview::map::MapKind;
use dendroview::tree::{Tree, color_from_annotations, load_tree};
use regex::Regex;
use std::path::{Path, PathBuf};

#[derive(Clone, Debug, Parser)]
#[command(version)]
pub struct Args {
    #[clap(help = "clustered data table (.cdt or .pcl)")]
    pub matrix: String,

    #[clap(short = 'g', long, help = "row tree (.gtr); defaults to the .gtr next to the matrix")]
    pub gtr: Option<String>,

    #[clap(short = 'a', long, help = "column tree (.atr); defaults to the .atr next to the matrix")]
    pub atr: Option<String>,

    #[clap(short = 'c', long, help = "render configuration in YAML")]
    pub config: Option<String>,

    #[clap(short = 'o', long, help = "output filename", default_value = "out.png")]
    pub output: String,

    #[clap(short = 'f', long, help = "create directory if missing")]
    pub create_missing_dir: bool,

    #[clap(short = 'x', long, help = "pixels per column (fixed scale)")]
    pub col_scale: Option<f64>,

    #[clap(short = 'y', long, help = "pixels per row (fixed scale)")]
    pub row_scale: Option<f64>,

    #[clap(short = 'C', long, help = "contrast; derived from the data if omitted")]
    pub contrast: Option<f64>,

    #[clap(short = 'F', long, help = "font size for labels and the color bar; 0 disables text")]
    pub font_size: Option<u32>,

    #[clap(short = 's', long, help = "highlight the subtree of this tree node (e.g. NODE12X)")]
    pub select: Option<String>,

    #[clap(short = 'S', long, help = "highlight the rows whose name matches this regex")]
    pub search: Option<String>,

    #[clap(short = 'z', long, help = "zoom to the highlighted rows and columns", default_value = "false")]
    pub zoom: bool,

    #[clap(short = 't', long, help = "swap rows and columns (trees included)", default_value = "false")]
    pub transpose: bool,

    #[clap(short = 'n', long, help = "ignore tree files next to the matrix", default_value = "false")]
    pub no_trees: bool,
}

struct Context {
    args: Args,
    config: RenderConfig,
}

impl Context {
    fn new(args: &Args) -> Result<Self> {
        let mut config = match &args.config {
            Some(path) => RenderConfig::load(Path::new(path))?,
            None => RenderConfig::default(),
        };
        if let Some(scale) = args.col_scale {
            config.columns.kind = MapKind::Fixed;
            config.columns.scale = scale;
        }
        if let Some(scale) = args.row_scale {
            config.rows.kind = MapKind::Fixed;
            config.rows.scale = scale;
        }
        if args.contrast.is_some() {
            config.contrast = args.contrast;
        }
        if let Some(font_size) = args.font_size {
            config.font_size = font_size;
        }
        log::debug!("config: {config:?}");
        Ok(Context {
            args: args.clone(),
            config,
        })
    }

    /// Explicit path, else the sibling of the matrix with `extension` if it exists.
    fn tree_path(&self, explicit: Option<&str>, extension: &str) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(PathBuf::from(path));
        }
        if self.args.no_trees {
            return None;
        }
        let path = Path::new(&self.args.matrix).with_extension(extension);
        path.exists().then_some(path)
    }

    fn load_tree(&self, path: Option<PathBuf>, labels: &LabelInfo) -> Result<Option<Tree>> {
        let Some(path) = path else {
            return Ok(None);
        };
        let mut tree = load_tree(&path, labels)?;
        let colored = color_from_annotations(&mut tree);
        if colored > 0 {
            log::info!("{colored} nodes colored from {}", path.display());
        }
        Ok(Some(tree))
    }

    fn build(&self) -> Result<Figure> {
        let cdt = load_cdt(Path::new(&self.args.matrix))?;
        let mut gtr = self.tree_path(self.args.gtr.as_deref(), "gtr");
        let mut atr = self.tree_path(self.args.atr.as_deref(), "atr");
        let cdt: CdtFile = if self.args.transpose {
            std::mem::swap(&mut gtr, &mut atr);
            cdt.transposed()
        } else {
            cdt
        };

        let row_tree = self.load_tree(gtr, &cdt.row_labels)?;
        let col_tree = self.load_tree(atr, &cdt.col_labels)?;
        let mut figure = Figure::new(cdt, self.config.clone());
        if let Some(tree) = row_tree {
            figure = figure.with_row_tree(tree);
        }
        if let Some(tree) = col_tree {
            figure = figure.with_col_tree(tree);
        }

        if let Some(id) = &self.args.select {
            figure.select_node(id)?;
        }
        if let Some(pattern) = &self.args.search {
            let re = Regex::new(pattern).with_context(|| format!("invalid search pattern {pattern:?}"))?;
            let n = figure.select_matching(&re);
            log::info!("{n} rows match {pattern:?}");
        }
        if self.args.zoom {
            figure.zoom_to_selection();
        }
        Ok(figure)
    }

    fn ensure_dir(&self, name: &Path) -> Result<()> {
        if !self.args.create_missing_dir {
            return Ok(());
        }
        let Some(dir) = name.parent() else {
            return Ok(());
        };
        if !dir.as_os_str().is_empty() && !dir.exists() {
            std::fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;
        }
        Ok(())
    }

    fn plot(&self, figure: &mut Figure) -> Result<()> {
        let name = Path::new(&self.args.output);
        self.ensure_dir(name)?;

        let layout = figure.layout();
        let (w, h) = layout.get_dim();
        if w == 0 || h == 0 {
            return Err(anyhow!("nothing to draw: {w}x{h} image"));
        }
        let area = StructuredDrawingArea::from_layout(&layout, name)?;
        figure.draw(&area)?;
        area.present()?;
        log::info!("wrote {w}x{h} image to {}", name.display());
        Ok(())
    }
}

fn print_args(args: &[String]) {
    let args = args
        .iter()
        .map(|x| if x.contains(' ') { format!("\"{x}\"") } else { x.to_string() })
        .collect::<Vec<_>>();
    let args = args.join(" ");
    log::info!("args: {args}");
}

fn main() -> Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let args = Args::parse();
    print_args(&std::env::args().collect::<Vec<_>>());

    let ctx = Context::new(&args)?;
    let mut figure = ctx.build()?;
    ctx.plot(&mut figure)
}
