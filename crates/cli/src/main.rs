use photo_booth_core::{
    presenter,
    themes,
    PhotoBooth,
    PhotoSource,
};
use anyhow::{bail, Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Theme to apply (see --list-themes)
    #[arg(short, long)]
    theme: Option<String>,

    /// Photo to transform; runs without opening the window
    #[arg(short, long, conflicts_with = "camera")]
    input: Option<PathBuf>,

    /// Take the photo with the camera; runs without opening the window
    #[arg(long, default_value_t = false)]
    camera: bool,

    /// Directory the generated picture is saved to
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Override the model defined in .env
    #[arg(short, long)]
    model: Option<String>,

    /// List available themes and exit
    #[arg(long)]
    list_themes: bool,

    /// Print remaining credits and exit
    #[arg(long)]
    quota: bool,

    /// Refill credits with a code and exit
    #[arg(long, value_name = "CODE")]
    refill: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Setup
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(tracing::level_filters::LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .init();
    let args = Args::parse();

    let mut booth = PhotoBooth::new();
    if let Some(m) = args.model {
        booth.config_mut().model_name = m;
    }

    // Handle --list-themes
    if args.list_themes {
        println!("Available themes:");
        for theme in booth.themes() {
            println!("  {:<14} {}", theme.id, theme.title);
        }
        return Ok(());
    }

    if let Some(code) = args.refill {
        let state = booth.refill(&code).context("Refill failed")?;
        println!("Credits successfully refilled! {} / {}", state.remaining, state.max);
        return Ok(());
    }

    if args.quota {
        let state = booth.quota();
        println!("Credits: {} / {}", state.remaining, state.max);
        return Ok(());
    }

    let photo = match (args.input, args.camera) {
        (Some(path), _) => PhotoSource::File(path),
        (None, true) => PhotoSource::Camera,
        (None, false) => {
            // No photo given: open the booth window
            booth.run_interactive().context("Failed to run the booth window")?;
            return Ok(());
        }
    };

    let theme = match args.theme {
        Some(id) if themes::find(&id).is_some() => id,
        Some(id) => bail!(
            "Unknown theme '{}'. Available: {}",
            id,
            themes::ids().collect::<Vec<_>>().join(", ")
        ),
        None => bail!("--theme is required when generating from the command line"),
    };

    // Send to API
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ")
            .template("{spinner:.red} {msg}")?,
    );
    spinner.set_message(format!("Creating your masterpiece with {}...", booth.config().model_name));
    spinner.enable_steady_tick(Duration::from_millis(100));

    let outcome = booth.generate(&theme, photo).await;
    spinner.finish_and_clear();

    let picture = match outcome {
        Ok(picture) => picture,
        Err(e) => {
            tracing::error!(error = %e, "generation failed");
            bail!("{}", e.user_message());
        }
    };

    let dir = args.output.unwrap_or_else(presenter::default_download_dir);
    let path = presenter::download(&picture, &dir).context("Failed to save the picture")?;
    println!("Saved to {}", path.display());

    let state = booth.quota();
    println!("Credits: {} / {}", state.remaining, state.max);
    println!("Share: {}", presenter::share_link(booth.config()));

    Ok(())
}
