//! `simvp`: inspect, run and convert SimVP models.

use std::{path::PathBuf, time::Instant};

use anyhow::{Context, Result};
use burn::{
    module::Module,
    prelude::*,
    record::{FullPrecisionSettings, NamedMpkFileRecorder},
};
use chrono::Duration;
use clap::{Parser, Subcommand};
use simvp_burn::SimVpConfig;
use simvp_demos::{
    create_device, get_backend_name, random_frames, synthetic::TIME_FEATURES, time_features,
    time_features_tensor, RunConfig, SelectedBackend,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "simvp")]
#[command(author, version)]
#[command(about = "SimVP: satellite frame prediction with a simple video prediction network")]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the stride schedules, latent size and parameter count of a configuration
    Info {
        /// Run configuration file
        #[arg(short, long)]
        config: PathBuf,
    },

    /// Write a run configuration with default hyperparameters
    InitConfig {
        /// Output JSON file
        #[arg(short, long)]
        output: PathBuf,

        /// Channels per frame
        #[arg(long, default_value = "11")]
        channels: usize,

        /// Number of history frames
        #[arg(long, default_value = "12")]
        history: usize,

        /// Forecast horizon
        #[arg(long, default_value = "12")]
        forecast: usize,

        /// Frame height
        #[arg(long, default_value = "279")]
        height: usize,

        /// Frame width
        #[arg(long, default_value = "386")]
        width: usize,
    },

    /// Run one forward pass on synthetic frames
    Forward {
        /// Run configuration file
        #[arg(short, long)]
        config: PathBuf,

        /// Burn record to load, overriding the configuration
        #[arg(short, long)]
        weights: Option<PathBuf>,

        /// Batch size, overriding the configuration
        #[arg(long)]
        batch: Option<usize>,

        /// Use the time-conditioned network
        #[arg(long)]
        temporal: bool,

        /// Random seed, overriding the configuration
        #[arg(long)]
        seed: Option<u64>,

        /// Save the model weights after the pass
        #[arg(long)]
        save: Option<PathBuf>,
    },

    /// Convert a PyTorch checkpoint of the plain network to a Burn record
    #[cfg(feature = "pretrained")]
    Convert {
        /// PyTorch `.pth` or Lightning `.ckpt` file
        #[arg(short, long)]
        input: PathBuf,

        /// Output record path (without extension)
        #[arg(short, long)]
        output: PathBuf,

        /// Run configuration matching the checkpoint
        #[arg(short, long)]
        config: PathBuf,

        /// The checkpoint was written by PyTorch Lightning
        #[arg(long)]
        lightning: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::filter::LevelFilter::from_level(log_level))
        .init();

    match cli.command {
        Commands::Info { config } => info(&RunConfig::load(config)?),
        Commands::InitConfig {
            output,
            channels,
            history,
            forecast,
            height,
            width,
        } => {
            let model = SimVpConfig::new(channels, history, forecast)
                .with_spatial_size([height, width]);
            model
                .validate()
                .context("refusing to write an invalid configuration")?;
            RunConfig::for_model(model).save(&output)?;
            println!("Wrote {}", output.display());
            Ok(())
        }
        Commands::Forward {
            config,
            weights,
            batch,
            temporal,
            seed,
            save,
        } => {
            let mut run = RunConfig::load(config)?;
            if weights.is_some() {
                run.weights = weights;
            }
            if let Some(batch) = batch {
                run.batch_size = batch;
            }
            if let Some(seed) = seed {
                run.seed = seed;
            }
            run.temporal |= temporal;
            forward(&run, save)
        }
        #[cfg(feature = "pretrained")]
        Commands::Convert {
            input,
            output,
            config,
            lightning,
        } => convert(input, output, &RunConfig::load(config)?, lightning),
    }
}

fn info(run: &RunConfig) -> Result<()> {
    let model = &run.model;
    model.validate()?;

    let [height, width] = model.spatial_size;
    let [latent_h, latent_w] = model.latent_size();
    println!("Backend:             {}", get_backend_name());
    println!(
        "Frames:              {} channels x {} steps, {height}x{width}",
        model.num_channels, model.history_len
    );
    println!("Forecast length:     {}", model.forecast_len);
    println!("Encoder strides:     {:?}", model.encoder_strides());
    println!("Decoder strides:     {:?}", model.decoder_strides());
    println!("Latent size:         {latent_h}x{latent_w}");
    println!(
        "Translator:          {} -> {} channels, {} stages, kernels {:?}, {} groups",
        model.translator_channels(),
        model.hid_t,
        model.n_t,
        model.kernel_sizes,
        model.groups
    );

    let device = create_device();
    let plain = model.init::<SelectedBackend>(&device)?;
    println!("Parameters (plain):  {}", plain.num_params());
    let temporal = model.init_temporal::<SelectedBackend>(&device)?;
    println!("Parameters (time):   {}", temporal.num_params());

    Ok(())
}

fn forward(run: &RunConfig, save: Option<PathBuf>) -> Result<()> {
    let device = create_device();
    tracing::info!(backend = get_backend_name(), seed = run.seed, "starting forward pass");
    SelectedBackend::seed(run.seed);

    let frames = random_frames::<SelectedBackend>(&run.model, run.batch_size, &device);
    let recorder = NamedMpkFileRecorder::<FullPrecisionSettings>::new();

    let (shape, elapsed) = if run.temporal {
        anyhow::ensure!(
            run.model.time_features == TIME_FEATURES,
            "synthetic time features have {TIME_FEATURES} values per step, config expects {}",
            run.model.time_features
        );

        let mut model = run.model.init_temporal::<SelectedBackend>(&device)?;
        if let Some(weights) = &run.weights {
            model = model
                .load_file(weights.clone(), &recorder, &device)
                .with_context(|| format!("failed to load weights {}", weights.display()))?;
        }

        let steps = time_features(
            run.start_time,
            Duration::minutes(run.step_minutes),
            run.model.history_len,
        );
        let features = time_features_tensor::<SelectedBackend>(&steps, run.batch_size, &device);
        model.check_input(&frames)?;
        model.check_time_features(&features)?;

        let start = Instant::now();
        let output = model.forward(frames, features);
        let shape = output.dims();
        let elapsed = start.elapsed();

        if let Some(path) = save {
            save_model(model, path, &recorder)?;
        }
        (shape, elapsed)
    } else {
        let mut model = run.model.init::<SelectedBackend>(&device)?;
        if let Some(weights) = &run.weights {
            model = model
                .load_file(weights.clone(), &recorder, &device)
                .with_context(|| format!("failed to load weights {}", weights.display()))?;
        }
        model.check_input(&frames)?;

        let start = Instant::now();
        let output = model.forward(frames);
        let shape = output.dims();
        let elapsed = start.elapsed();

        if let Some(path) = save {
            save_model(model, path, &recorder)?;
        }
        (shape, elapsed)
    };

    println!("Output shape: {shape:?}");
    println!("Forward pass: {:.3}s", elapsed.as_secs_f64());
    Ok(())
}

fn save_model<M: Module<SelectedBackend>>(
    model: M,
    path: PathBuf,
    recorder: &NamedMpkFileRecorder<FullPrecisionSettings>,
) -> Result<()> {
    model
        .save_file(path.clone(), recorder)
        .with_context(|| format!("failed to save weights to {}", path.display()))?;
    tracing::info!(path = %path.display(), "saved weights");
    Ok(())
}

#[cfg(feature = "pretrained")]
fn convert(input: PathBuf, output: PathBuf, run: &RunConfig, lightning: bool) -> Result<()> {
    use simvp_burn::CheckpointFormat;

    let device = create_device();
    let format = if lightning {
        CheckpointFormat::Lightning
    } else {
        CheckpointFormat::StateDict
    };

    let model = run
        .model
        .init::<SelectedBackend>(&device)?
        .load_pytorch(&input, format, &device)?;

    let recorder = NamedMpkFileRecorder::<FullPrecisionSettings>::new();
    save_model(model, output.clone(), &recorder)?;
    println!("Converted {} -> {}", input.display(), output.display());
    Ok(())
}
