use std::{
    path::{Path, PathBuf},
    process::ExitCode,
};

use anyhow::Context as _;
use clap::{CommandFactory as _, FromArgMatches as _, Parser, error::ErrorKind};
use tracing_subscriber::EnvFilter;

/// Turn a still image into a waterfall GIF (requires `ffmpeg` on PATH).
#[derive(Parser, Debug)]
#[command(name = "waterfall-gif-gen", version)]
struct Cli {
    /// Input image.
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Output GIF path.
    #[arg(short, long, default_value = "output.gif")]
    output: PathBuf,

    /// JSON settings file; individual flags override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory for the intermediate video and palette (default: system temp dir).
    #[arg(long)]
    work_dir: Option<PathBuf>,

    #[command(flatten)]
    overrides: SettingsArgs,
}

#[derive(clap::Args, Debug, Default)]
#[command(next_help_heading = "Render settings")]
struct SettingsArgs {
    /// Static lead-in frames.
    #[arg(long)]
    delay: Option<u32>,
    #[arg(long)]
    waterfall_frames: Option<u32>,
    /// Waterfall ticks during which images spawn.
    #[arg(long)]
    img_gen_frames: Option<u32>,
    #[arg(long)]
    min_img_per_frame: Option<u32>,
    #[arg(long)]
    max_img_per_frame: Option<u32>,
    /// Spawn position as a fraction of the canvas width.
    #[arg(long, allow_negative_numbers = true)]
    min_spawn_x: Option<f32>,
    #[arg(long, allow_negative_numbers = true)]
    max_spawn_x: Option<f32>,
    #[arg(long, allow_negative_numbers = true)]
    min_spawn_y: Option<f32>,
    #[arg(long, allow_negative_numbers = true)]
    max_spawn_y: Option<f32>,
    #[arg(long, allow_negative_numbers = true)]
    min_horiz_speed: Option<f32>,
    #[arg(long, allow_negative_numbers = true)]
    max_horiz_speed: Option<f32>,
    #[arg(long, allow_negative_numbers = true)]
    min_vert_speed: Option<f32>,
    #[arg(long, allow_negative_numbers = true)]
    max_vert_speed: Option<f32>,
    /// Vertical acceleration per tick.
    #[arg(long, allow_negative_numbers = true)]
    gravity: Option<f32>,
    #[arg(long)]
    min_opacity: Option<f32>,
    #[arg(long)]
    max_opacity: Option<f32>,
    /// Fewest ticks to fade in.
    #[arg(long)]
    min_opacity_inc: Option<u32>,
    #[arg(long)]
    max_opacity_inc: Option<u32>,
    /// Fewest ticks to grow to full scale.
    #[arg(long)]
    min_scale_inc: Option<u32>,
    #[arg(long)]
    max_scale_inc: Option<u32>,
    #[arg(long)]
    min_init_scale: Option<f32>,
    #[arg(long)]
    max_init_scale: Option<f32>,
    #[arg(long)]
    scale_multiplier: Option<f32>,
    #[arg(long)]
    max_width: Option<u32>,
    #[arg(long)]
    max_height: Option<u32>,
    #[arg(long)]
    framerate: Option<u32>,
    /// RNG seed; 0 picks one at random.
    #[arg(long)]
    seed: Option<u64>,
}

macro_rules! apply_overrides {
    ($args:expr, $settings:expr; $($field:ident),+ $(,)?) => {
        $(
            if let Some(v) = $args.$field {
                $settings.$field = v;
            }
        )+
    };
}

impl SettingsArgs {
    fn apply(&self, settings: &mut waterfall::RenderSettings) {
        apply_overrides!(self, settings;
            delay, waterfall_frames, img_gen_frames, min_img_per_frame, max_img_per_frame,
            min_spawn_x, max_spawn_x, min_spawn_y, max_spawn_y,
            min_horiz_speed, max_horiz_speed, min_vert_speed, max_vert_speed, gravity,
            min_opacity, max_opacity, min_opacity_inc, max_opacity_inc,
            min_scale_inc, max_scale_inc, min_init_scale, max_init_scale, scale_multiplier,
            max_width, max_height, framerate, seed,
        );
    }
}

/// The CLI with each render setting's default appended to its help line.
///
/// Setting flags stay optional so a `--config` file is only overridden by flags actually given.
fn command() -> clap::Command {
    let mut cmd = Cli::command();
    let defaults: serde_json::Map<String, serde_json::Value> =
        waterfall::RenderSettings::default()
            .to_json_pretty()
            .ok()
            .and_then(|json| serde_json::from_str(&json).ok())
            .unwrap_or_default();
    for (id, value) in defaults {
        if !cmd.get_arguments().any(|a| a.get_id() == id.as_str()) {
            continue;
        }
        cmd = cmd.mut_arg(id.as_str(), |arg| {
            let help = arg.get_help().map(|h| format!("{h} ")).unwrap_or_default();
            arg.help(format!("{help}[default: {value}]"))
        });
    }
    cmd
}

fn main() -> ExitCode {
    if std::env::args_os().len() <= 1 {
        let _ = command().print_help();
        return ExitCode::from(1);
    }

    let cli = match command()
        .try_get_matches()
        .and_then(|m| Cli::from_arg_matches(&m))
    {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            let _ = e.print();
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            eprintln!("Invalid option");
            let _ = e.print();
            return ExitCode::from(1);
        }
    };

    init_tracing();

    let Some(input) = cli.input.as_deref() else {
        println!("Missing input file");
        return ExitCode::from(1);
    };
    if !input.is_file() {
        println!("Input file '{}' does not exist", input.display());
        return ExitCode::from(1);
    }

    match run(&cli, input) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::from(1)
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn run(cli: &Cli, input: &Path) -> anyhow::Result<()> {
    let mut settings = match &cli.config {
        Some(path) => waterfall::RenderSettings::from_json_path(path)
            .with_context(|| format!("load settings '{}'", path.display()))?,
        None => waterfall::RenderSettings::default(),
    };
    cli.overrides.apply(&mut settings);
    settings.validate()?;

    tracing::info!(input = %input.display(), "loading image");
    let base = waterfall::decode_image_file(input)?;

    let opts = waterfall::RenderToGifOpts {
        work_dir: cli.work_dir.clone(),
    };
    let stats = waterfall::render_to_gif(&settings, &base, &cli.output, &opts)?;

    eprintln!(
        "wrote {} ({} frames, {} images, seed {})",
        cli.output.display(),
        stats.frames_total,
        stats.particles_spawned,
        stats.seed
    );
    Ok(())
}
