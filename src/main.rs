use clap::{Parser, Subcommand};
use std::path::PathBuf;
use superfile::config::{self, ConfigError, FieldConfig};
use superfile::export;
use superfile::field::Field;
use superfile::files::SourceFile;
use superfile::imaging::{CropPlan, Dimensions, RustBackend, plan_crop};
use superfile::output;
use tracing_subscriber::EnvFilter;

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

/// Field options. Flags override values from `--config`.
#[derive(clap::Args, Clone)]
struct FieldArgs {
    /// field.toml to start from (see `gen-config`)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output width bound in pixels
    #[arg(long)]
    max_width: Option<u32>,

    /// Output height bound in pixels
    #[arg(long)]
    max_height: Option<u32>,

    /// Fixed aspect ratio, "W:H" or "W/H"
    #[arg(long)]
    ratio: Option<String>,

    /// Encoding quality, 0-1 or a percentage
    #[arg(long)]
    quality: Option<f64>,

    /// Copy files through unchanged
    #[arg(long)]
    disable_resize: bool,
}

impl FieldArgs {
    fn resolve(&self) -> Result<FieldConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => FieldConfig::load(path)?,
            None => FieldConfig::default(),
        };
        if let Some(w) = self.max_width {
            config.max_width = w;
        }
        if let Some(h) = self.max_height {
            config.max_height = h;
        }
        if let Some(ratio) = &self.ratio {
            config.ratio = Some(ratio.clone());
        }
        if let Some(q) = self.quality {
            config.quality = q;
        }
        config.disable_resize |= self.disable_resize;
        Ok(config)
    }
}

#[derive(Parser)]
#[command(name = "superfile")]
#[command(about = "Crop, downscale and re-encode image attachments")]
#[command(long_about = "\
Crop, downscale and re-encode image attachments

Every image is center-cropped to the configured aspect ratio (if any), scaled
down to fit inside maxWidth x maxHeight, and re-encoded in its own format.
Images already within bounds are kept byte-for-byte. Non-image files and
images that fail to decode are copied through unchanged.

Logging goes to stderr; set RUST_LOG=superfile=debug for per-file detail.

Run 'superfile gen-config' to generate a documented field.toml.")]
#[command(version = version_string())]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Normalize files into an output directory
    Normalize {
        #[command(flatten)]
        field: FieldArgs,

        /// Output directory
        #[arg(long)]
        out: PathBuf,

        /// Files to attach, in order
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Show the crop and output size planned for a source size
    Plan {
        #[command(flatten)]
        field: FieldArgs,

        /// Source width in pixels
        #[arg(long)]
        width: u32,

        /// Source height in pixels
        #[arg(long)]
        height: u32,

        /// Print the plan as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print a stock field.toml with all options documented
    GenConfig,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Normalize { field, out, files } => {
            let config = field.resolve()?;
            let field = Field::from_config(RustBackend::new(), &config)?;

            let sources = files
                .iter()
                .map(|path| SourceFile::read(path))
                .collect::<Result<Vec<_>, _>>()?;

            let report = field.on_field_changed(sources).await;
            output::print_ingest_report(&report);

            let entries = field.current_collection();
            let written = export::write_collection(&entries, &out)?;
            println!();
            output::print_written(&entries, &written, &out);
        }
        Command::Plan {
            field,
            width,
            height,
            json,
        } => {
            let constraints = field.resolve()?.constraints()?;
            let source = Dimensions::new(width, height);
            let plan = if constraints.disable_resize {
                CropPlan::noop(source)
            } else {
                plan_crop(source, &constraints)
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&plan)?);
            } else {
                output::print_plan(&plan);
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Log to stderr, filtered by `RUST_LOG` (default: warnings only).
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
