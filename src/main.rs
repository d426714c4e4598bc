use clap::{Parser, Subcommand};
use picture_intake::acquire::{Acquisition, AcquisitionOptions};
use picture_intake::config::{self, PipelineConfig};
use picture_intake::display::{
    Category, DisplayError, DisplayResolver, ImageView, placeholder_data_url, placeholder_svg,
};
use picture_intake::imaging::{AspectRatio, CropRegion, RenderOptions, RustBackend};
use picture_intake::output;
use picture_intake::session::CropSession;
use picture_intake::source::{SelectedFile, SourceImage};
use picture_intake::types::{StoredPath, UploadTarget};
use picture_intake::upload::HttpUploader;
use std::error::Error;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing_subscriber::EnvFilter;

/// Crop rectangle in displayed pixels, given as `X,Y,W,H`.
#[derive(Debug, Clone, Copy)]
struct RegionArg(CropRegion);

impl FromStr for RegionArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let values = s
            .split(',')
            .map(|v| v.trim().parse::<f64>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| format!("bad region '{s}': {e}"))?;
        if values.iter().any(|v| !v.is_finite()) {
            return Err(format!("region values must be finite, got '{s}'"));
        }
        match values[..] {
            [x, y, w, h] => Ok(Self(CropRegion::pixels(x, y, w, h))),
            _ => Err(format!("expected X,Y,W,H, got '{s}'")),
        }
    }
}

/// Shared flags for commands that crop an image.
#[derive(clap::Args, Clone)]
struct CropArgs {
    /// Aspect ratio constraint, e.g. 1:1 or 16:9 (overrides config)
    #[arg(long)]
    aspect: Option<AspectRatio>,

    /// Crop rectangle as X,Y,W,H in pixels (default: auto-centred, or the whole image)
    #[arg(long)]
    region: Option<RegionArg>,

    /// Preview scale (0.5 to 2.0)
    #[arg(long, default_value_t = 1.0)]
    scale: f64,

    /// Preview rotation in degrees (-180 to 180)
    #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
    rotate: i32,

    /// Bake scale and rotation into the exported image
    #[arg(long)]
    bake: bool,
}

#[derive(Parser)]
#[command(name = "picture-intake")]
#[command(about = "Crop, upload, and display images for a content-management front end")]
#[command(long_about = "\
Crop, upload, and display images for a content-management front end

Images are cropped against their displayed size (90% of the width, centred,
when an aspect ratio is set), exported as JPEG, and uploaded to the
collaborator configured in pipeline.toml. Stored paths are resolved to URLs
through a memoized rule, with a category placeholder as the last resort.

Run 'picture-intake gen-config' to generate a documented pipeline.toml.
Set RUST_LOG (e.g. RUST_LOG=picture_intake=debug) for detailed logs.")]
#[command(version)]
struct Cli {
    /// Pipeline config file
    #[arg(long, default_value = config::CONFIG_FILENAME, global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Crop an image locally and write the JPEG
    Crop {
        /// Source image
        input: PathBuf,
        /// Where to write the cropped JPEG
        #[arg(short, long)]
        output: PathBuf,
        #[command(flatten)]
        crop: CropArgs,
    },
    /// Crop an image and upload it to the configured collaborator
    Upload {
        /// Source image
        input: PathBuf,
        /// Upload target: member, event, news, game or partner
        #[arg(long)]
        target: UploadTarget,
        #[command(flatten)]
        crop: CropArgs,
    },
    /// Show how a stored path is displayed
    Resolve {
        /// Stored path as returned by an upload (may be empty)
        path: String,
        /// Placeholder category
        #[arg(long, default_value = "news")]
        category: Category,
        /// Simulate a load failure of the resolved URL
        #[arg(long)]
        failed: bool,
        /// Also print the <img> markup
        #[arg(long)]
        html: bool,
    },
    /// Print the placeholder SVG for a category
    Placeholder {
        /// member, event, news, team, community, partnership or game
        category: Category,
        /// Text drawn under the icon
        #[arg(long)]
        label: Option<String>,
        /// Print a data: URL instead of raw SVG
        #[arg(long)]
        data_url: bool,
    },
    /// Print a stock pipeline.toml with all options documented
    GenConfig,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Crop {
            input,
            output,
            crop,
        } => {
            let config = config::load_config(&cli.config)?;
            run_crop(&config, &input, &output, &crop).await?;
        }
        Command::Upload {
            input,
            target,
            crop,
        } => {
            let config = config::load_config(&cli.config)?;
            run_upload(&config, &input, target, &crop).await?;
        }
        Command::Resolve {
            path,
            category,
            failed,
            html,
        } => {
            let config = config::load_config(&cli.config)?;
            let resolver = DisplayResolver::from_config(&config.display);
            let path = StoredPath::new(path);
            let mut view = ImageView::new(category).with_path(path.clone());

            let mut rendering = view.render(&resolver);
            if failed {
                view.on_error(DisplayError::DisplayResolutionFailed {
                    path: path.clone(),
                    reason: "simulated load failure".into(),
                });
                rendering = view.render(&resolver);
            }
            output::print_resolve_output(&path, category, &rendering, &resolver.stats());
            if html {
                println!("{}", view.to_html(&resolver).into_string());
            }
        }
        Command::Placeholder {
            category,
            label,
            data_url,
        } => {
            if data_url {
                println!("{}", placeholder_data_url(category, label.as_deref()));
            } else {
                println!("{}", placeholder_svg(category, label.as_deref()));
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

fn render_options(config: &PipelineConfig, args: &CropArgs) -> RenderOptions {
    let mut options = config.crop.render_options();
    options.bake_preview_transform |= args.bake;
    options
}

/// Apply command-line crop flags to an open session. Without an explicit
/// region or an auto-centred crop, the whole image is used.
fn apply_crop_args(session: &mut CropSession, args: &CropArgs) {
    if let Some(RegionArg(region)) = args.region {
        session.drag(region);
        session.release();
    }
    if session.completed_crop().is_none() {
        let display = session.source().display();
        session.drag(CropRegion::pixels(
            0.0,
            0.0,
            display.width as f64,
            display.height as f64,
        ));
        session.release();
    }
    session.set_scale(args.scale);
    session.set_rotation(args.rotate);
}

async fn run_crop(
    config: &PipelineConfig,
    input: &Path,
    destination: &Path,
    args: &CropArgs,
) -> Result<(), Box<dyn Error>> {
    let backend = RustBackend::new();
    let file = SelectedFile::from_path(input).await?;
    file.validate(config.upload.max_file_size)?;
    let source = SourceImage::load(file, &backend)?;

    let aspect = args.aspect.or(config.crop.aspect());
    let mut session = CropSession::new(source, aspect, config.crop.coverage);
    apply_crop_args(&mut session, args);

    let bitmap = session
        .finalize(&backend, &render_options(config, args))?
        .ok_or("no crop selected")?;
    tokio::fs::write(destination, &bitmap.bytes).await?;

    if let Some(crop) = session.completed_crop() {
        output::print_crop_output(
            session.source(),
            &crop,
            &session.transform(),
            &bitmap,
            destination,
        );
    }
    Ok(())
}

async fn run_upload(
    config: &PipelineConfig,
    input: &Path,
    target: UploadTarget,
    args: &CropArgs,
) -> Result<(), Box<dyn Error>> {
    let uploader = HttpUploader::new(&config.upload)?;
    let mut options = AcquisitionOptions::from_config(config, target);
    options.render = render_options(config, args);
    if args.aspect.is_some() {
        options.aspect_ratio = args.aspect;
    }

    let mut acquisition = Acquisition::new(RustBackend::new(), options);
    acquisition.select_path(input).await?;
    if let Some(session) = acquisition.session_mut() {
        apply_crop_args(session, args);
    }

    let pending = acquisition.begin_upload()?.ok_or("no crop selected")?;
    let blob = pending.blob().clone();
    let receipt = pending.send(&uploader).await;
    let stored = acquisition
        .complete(receipt)?
        .ok_or("upload result was discarded")?;

    output::print_upload_output(&blob, target, &stored);
    Ok(())
}
