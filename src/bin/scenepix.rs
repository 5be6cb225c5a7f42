use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "scenepix", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a single asset to an image file.
    Render(RenderArgs),
    /// Render every asset into an output directory.
    Batch(BatchArgs),
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Input asset (.obj, .gltf or .glb).
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output image path. The format follows the extension unless `--format` is given.
    #[arg(long)]
    out: PathBuf,

    /// Seed for random orientation.
    #[arg(long, default_value_t = 0)]
    seed: u64,

    #[command(flatten)]
    settings: SettingsArgs,
}

#[derive(Parser, Debug)]
struct BatchArgs {
    /// Output directory.
    #[arg(long)]
    out_dir: PathBuf,

    /// Input assets. Unsupported files are skipped.
    #[arg(required = true)]
    assets: Vec<PathBuf>,

    /// Seed of the per-job seed stream (entropy when omitted).
    #[arg(long)]
    seed: Option<u64>,

    /// Fail a render that takes longer than this many seconds.
    #[arg(long)]
    timeout_secs: Option<u64>,

    #[command(flatten)]
    settings: SettingsArgs,
}

/// Config file plus per-field overrides, shared by both subcommands.
#[derive(Args, Debug)]
struct SettingsArgs {
    /// JSON file with `render` and `export` sections.
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    width: Option<u32>,

    #[arg(long)]
    height: Option<u32>,

    /// Camera distance as a multiple of the scene radius.
    #[arg(long)]
    distance: Option<f32>,

    /// `none`, `2x` or `4x`.
    #[arg(long)]
    aa: Option<String>,

    /// Background as `#rrggbb`.
    #[arg(long)]
    background: Option<String>,

    /// Fixed rotation in degrees, as `x,y,z`.
    #[arg(long, value_delimiter = ',', num_args = 3)]
    rotation: Option<Vec<f32>>,

    /// Draw a random angle on every axis.
    #[arg(long)]
    random: bool,

    #[arg(long, value_enum)]
    format: Option<FormatChoice>,

    /// JPEG quality in [0, 1].
    #[arg(long)]
    quality: Option<f32>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FormatChoice {
    Png,
    Jpeg,
    Tiff,
}

impl From<FormatChoice> for scenepix::ExportFormat {
    fn from(c: FormatChoice) -> Self {
        match c {
            FormatChoice::Png => Self::Png,
            FormatChoice::Jpeg => Self::Jpeg,
            FormatChoice::Tiff => Self::Tiff,
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Batch(args) => cmd_batch(args),
    }
}

fn load_settings(
    args: &SettingsArgs,
) -> anyhow::Result<(scenepix::RenderConfig, scenepix::ExportConfig)> {
    let file = match &args.config {
        Some(path) => scenepix::ConfigFile::from_path(path)
            .with_context(|| format!("read config '{}'", path.display()))?,
        None => scenepix::ConfigFile::default(),
    };
    let (mut render, mut export) = (file.render, file.export);

    if let Some(w) = args.width {
        render.image_width = w;
    }
    if let Some(h) = args.height {
        render.image_height = h;
    }
    if let Some(d) = args.distance {
        render.camera_distance_multiplier = d;
    }
    if let Some(aa) = &args.aa {
        render.antialiasing = scenepix::Antialiasing::parse(aa)?;
    }
    if let Some(bg) = &args.background {
        render.background_color = scenepix::Rgb8::from_hex(bg)?;
    }
    if let Some(&[x, y, z]) = args.rotation.as_deref() {
        render.rotation_x = x;
        render.rotation_y = y;
        render.rotation_z = z;
    }
    if args.random {
        render.enable_random_x = true;
        render.enable_random_y = true;
        render.enable_random_z = true;
    }
    if let Some(f) = args.format {
        export.format = f.into();
    }
    if let Some(q) = args.quality {
        export.quality = q;
    }

    render.validate().context("invalid render settings")?;
    export.validate().context("invalid export settings")?;
    Ok((render, export))
}

fn format_from_extension(path: &Path) -> Option<scenepix::ExportFormat> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some(scenepix::ExportFormat::Png),
        "jpg" | "jpeg" => Some(scenepix::ExportFormat::Jpeg),
        "tif" | "tiff" => Some(scenepix::ExportFormat::Tiff),
        _ => None,
    }
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let (render, mut export) = load_settings(&args.settings)?;
    if args.settings.format.is_none()
        && let Some(f) = format_from_extension(&args.out)
    {
        export.format = f;
    }

    let image = scenepix::RenderJob::new(scenepix::AssetRef::new(&args.in_path), render, args.seed)
        .run()
        .with_context(|| format!("render '{}'", args.in_path.display()))?;

    use scenepix::ImageExporter as _;
    scenepix::FileExporter
        .export(&image, &args.out, &export)
        .with_context(|| format!("write image '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_batch(args: BatchArgs) -> anyhow::Result<()> {
    let (render, mut export) = load_settings(&args.settings)?;
    export.output_directory = Some(args.out_dir.clone());
    std::fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("create output dir '{}'", args.out_dir.display()))?;

    let opts = scenepix::BatchOpts {
        seed: args.seed,
        job_timeout: args.timeout_secs.map(Duration::from_secs),
        ..scenepix::BatchOpts::default()
    };
    let mut orch = scenepix::BatchOrchestrator::new(render, export, opts)?
        .with_observer(ConsoleObserver::default());

    let ids = orch.add_files(args.assets.iter().cloned());
    if ids.is_empty() {
        anyhow::bail!("no supported assets among {} input(s)", args.assets.len());
    }

    let summary = orch.run_batch(&args.out_dir)?;
    for job in orch.jobs() {
        match job.error() {
            Some(err) => eprintln!("  {}: {} ({err})", job.file_name(), job.status()),
            None => eprintln!("  {}: {}", job.file_name(), job.status()),
        }
    }
    println!(
        "{} completed, {} failed, {}/{} processed{}",
        summary.completed,
        summary.failed,
        summary.processed,
        summary.total,
        if summary.cancelled { " (cancelled)" } else { "" }
    );
    if summary.failed > 0 {
        std::process::exit(2);
    }
    Ok(())
}

/// Prints progress lines to stderr.
#[derive(Default)]
struct ConsoleObserver {
    last_file: Option<String>,
}

impl scenepix::BatchObserver for ConsoleObserver {
    fn on_event(&mut self, event: &scenepix::BatchEvent) {
        match event {
            scenepix::BatchEvent::Progress(p) => {
                if let Some(name) = &p.current_file
                    && self.last_file.as_ref() != Some(name)
                {
                    eprintln!("[{}/{}] {name}", p.processed + 1, p.total);
                    self.last_file = Some(name.clone());
                }
            }
            scenepix::BatchEvent::ExportFailed { path, message, .. } => {
                eprintln!("  export to '{}' failed: {message}", path.display());
            }
            _ => {}
        }
    }
}
