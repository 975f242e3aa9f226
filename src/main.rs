//! Conv Classifier CLI
//!
//! Trains the convolutional classifier on a JSON dataset or synthetic data,
//! generates synthetic datasets, and prints learning-rate schedules.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::info;

use conv_classifier::backend::{backend_name, default_device, TrainingBackend};
use conv_classifier::dataset::synthetic::{generate, SyntheticConfig};
use conv_classifier::inference::Predictor;
use conv_classifier::utils::logging::{init_logging, LogConfig};
use conv_classifier::utils::{format_duration, prediction_accuracy};
use conv_classifier::{ConvClassifier, ExperimentConfig, LearningRateSchedule};

/// Convolutional image classifier training harness
#[derive(Parser, Debug)]
#[command(name = "conv-classifier")]
#[command(version = conv_classifier::VERSION)]
#[command(about = "Train a two-layer CNN image classifier with Burn", long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, default_value = "false")]
    verbose: bool,

    /// Only log errors
    #[arg(short, long, default_value = "false")]
    quiet: bool,

    /// Log level (trace, debug, info, warn, error); overrides -v and -q
    #[arg(long)]
    log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Train the classifier and report per-epoch metrics
    Train {
        /// TOML experiment file; flags below override its values
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// JSON dataset file
        #[arg(short, long, conflicts_with = "synthetic")]
        data: Option<PathBuf>,

        /// Train on this many generated samples instead of a dataset file
        #[arg(long)]
        synthetic: Option<usize>,

        /// Input image height
        #[arg(long)]
        img_h: Option<usize>,

        /// Input image width
        #[arg(long)]
        img_w: Option<usize>,

        /// Number of output classes
        #[arg(long)]
        n_out: Option<usize>,

        /// Number of training epochs
        #[arg(short, long)]
        epochs: Option<usize>,

        /// Batch size for training, validation and prediction
        #[arg(short, long)]
        batch_size: Option<usize>,

        /// Dropout keep probability during updates (0.0-1.0]
        #[arg(long)]
        keep_prob: Option<f64>,

        /// Hold the learning rate at 0.001 instead of decaying it
        #[arg(long, default_value = "false")]
        no_lr_decay: bool,

        /// Fraction of samples held out for validation [0.0-1.0)
        #[arg(long)]
        validation_ratio: Option<f64>,

        /// Random seed for data, initialization and dropout
        #[arg(long)]
        seed: Option<u64>,

        /// Write the per-epoch training log as JSON
        #[arg(long)]
        log_out: Option<PathBuf>,
    },

    /// Write a synthetic dataset file
    Generate {
        /// Output JSON file
        #[arg(short, long)]
        output: PathBuf,

        /// Number of samples
        #[arg(short, long, default_value = "512")]
        samples: usize,

        /// Image height
        #[arg(long, default_value = "28")]
        img_h: usize,

        /// Image width
        #[arg(long, default_value = "28")]
        img_w: usize,

        /// Number of classes
        #[arg(long, default_value = "2")]
        n_out: usize,

        /// Random seed
        #[arg(long, default_value = "42")]
        seed: u64,
    },

    /// Print the learning rate trajectory of a run
    Schedule {
        /// Number of training epochs
        #[arg(short, long, default_value = "10")]
        epochs: usize,

        /// Number of training samples
        #[arg(short, long)]
        dataset_size: usize,

        /// Batch size
        #[arg(short, long, default_value = "32")]
        batch_size: usize,

        /// Constant learning rate instead of exponential decay
        #[arg(long, default_value = "false")]
        no_decay: bool,

        /// Print every this many steps
        #[arg(long, default_value = "100")]
        every: usize,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_config = LogConfig::from_flags(cli.verbose, cli.quiet, cli.log_level.as_deref());
    if let Err(e) = init_logging(&log_config) {
        eprintln!("{} {}", "warning:".yellow().bold(), e);
    }

    match cli.command {
        Commands::Train {
            config,
            data,
            synthetic,
            img_h,
            img_w,
            n_out,
            epochs,
            batch_size,
            keep_prob,
            no_lr_decay,
            validation_ratio,
            seed,
            log_out,
        } => {
            let mut experiment = match config {
                Some(path) => ExperimentConfig::load(&path)?,
                None => ExperimentConfig::default(),
            };

            if let Some(path) = data {
                experiment.data.path = Some(path);
            }
            if let Some(samples) = synthetic {
                experiment.data.path = None;
                experiment.data.synthetic_samples = samples;
            }
            if let Some(v) = img_h {
                experiment.model.img_h = v;
            }
            if let Some(v) = img_w {
                experiment.model.img_w = v;
            }
            if let Some(v) = n_out {
                experiment.model.n_out = v;
            }
            if let Some(v) = epochs {
                experiment.training.epochs = v;
            }
            if let Some(v) = batch_size {
                experiment.training.batch_size = v;
            }
            if let Some(v) = keep_prob {
                experiment.training.dropout_keep_prob = v;
            }
            if no_lr_decay {
                experiment.training.use_lr_decay = false;
            }
            if let Some(v) = validation_ratio {
                experiment.data.validation_ratio = v;
            }
            if let Some(v) = seed {
                experiment.training.seed = v;
                experiment.data.seed = v;
            }

            cmd_train(&experiment, log_out)?;
        }

        Commands::Generate {
            output,
            samples,
            img_h,
            img_w,
            n_out,
            seed,
        } => {
            let dataset = generate(&SyntheticConfig {
                num_samples: samples,
                img_h,
                img_w,
                n_out,
                seed,
                ..Default::default()
            })?;
            dataset
                .save(&output)
                .with_context(|| format!("Failed to write {}", output.display()))?;

            println!(
                "{} {} samples ({}x{}, {} classes) to {}",
                "Wrote".green().bold(),
                dataset.len(),
                img_h,
                img_w,
                n_out,
                output.display()
            );
        }

        Commands::Schedule {
            epochs,
            dataset_size,
            batch_size,
            no_decay,
            every,
        } => {
            cmd_schedule(epochs, dataset_size, batch_size, !no_decay, every)?;
        }
    }

    Ok(())
}

fn cmd_train(experiment: &ExperimentConfig, log_out: Option<PathBuf>) -> Result<()> {
    experiment.validate()?;

    println!("{}", "Training Configuration:".cyan().bold());
    println!("  Backend:         {}", backend_name());
    println!(
        "  Input:           {}x{} -> {} classes",
        experiment.model.img_h, experiment.model.img_w, experiment.model.n_out
    );
    println!("  Epochs:          {}", experiment.training.epochs);
    println!("  Batch size:      {}", experiment.training.batch_size);
    println!("  Keep prob:       {}", experiment.training.dropout_keep_prob);
    println!("  LR decay:        {}", experiment.training.use_lr_decay);
    match &experiment.data.path {
        Some(path) => println!("  Data:            {}", path.display()),
        None => println!(
            "  Data:            {} synthetic samples",
            experiment.data.synthetic_samples
        ),
    }
    println!();

    let splits = experiment.data.load_splits(&experiment.model)?;
    let validation = if splits.validation.is_empty() {
        None
    } else {
        Some((
            splits.validation.images.as_slice(),
            splits.validation.labels.as_slice(),
        ))
    };

    let start = Instant::now();

    let (log, val_report) = ConvClassifier::<TrainingBackend>::scoped(
        experiment.model.clone(),
        default_device(),
        |classifier| {
            let log = classifier.fit(
                &splits.train.images,
                &splits.train.labels,
                validation,
                &experiment.training,
            )?;

            let val_report = match validation {
                Some((images, _)) => {
                    let results = Predictor::new(experiment.training.batch_size)
                        .predict_detailed(classifier, images)?;
                    info!("Predicted {} of {} validation samples", results.len(), images.len());

                    let predicted: Vec<usize> =
                        results.iter().map(|r| r.predicted_class).collect();
                    let accuracy = prediction_accuracy(&predicted, &splits.validation.classes());
                    let confidence = if results.is_empty() {
                        0.0
                    } else {
                        results.iter().map(|r| r.confidence as f64).sum::<f64>()
                            / results.len() as f64
                    };
                    Some((accuracy, confidence))
                }
                None => None,
            };

            Ok((log, val_report))
        },
    )?;

    println!();
    println!(
        "{} in {}",
        "Training complete".green().bold(),
        format_duration(start.elapsed().as_secs_f64())
    );
    if let Some(last) = log.last() {
        println!("  Final train loss:     {:.4}", last.loss);
        println!("  Final train accuracy: {:.4}", last.accuracy);
        if let (Some(loss), Some(acc)) = (last.val_loss, last.val_accuracy) {
            println!("  Final val loss:       {:.4}", loss);
            println!("  Final val accuracy:   {:.4}", acc);
        }
    }
    if let Some((acc, confidence)) = val_report {
        println!("  Prediction accuracy:  {:.2}%", acc * 100.0);
        println!("  Mean confidence:      {:.2}%", confidence * 100.0);
    }

    if let Some(path) = log_out {
        log.save(&path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!("{} {}", "Log written to".green(), path.display());
    }

    Ok(())
}

fn cmd_schedule(
    epochs: usize,
    dataset_size: usize,
    batch_size: usize,
    use_decay: bool,
    every: usize,
) -> Result<()> {
    let schedule = LearningRateSchedule::for_run(epochs, dataset_size, batch_size, use_decay)?;
    let total_steps = epochs * (dataset_size / batch_size);
    let every = every.max(1);

    println!("{}", "Learning Rate Schedule:".cyan().bold());
    println!("  {:?}", schedule);
    println!("  Total steps: {}", total_steps);
    println!();

    for step in (0..total_steps).step_by(every) {
        println!("  step {:>8}  lr {:.6}", step, schedule.rate(step));
    }
    println!(
        "  step {:>8}  lr {:.6}",
        total_steps,
        schedule.rate(total_steps)
    );

    Ok(())
}
