//! Logging Module
//!
//! Structured logging utilities using the `tracing` crate, plus the
//! training progress logger used by the trainer.

use std::time::Instant;

use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Minimum log level to display
    pub level: LogLevel,
    /// Whether to include target (module path)
    pub include_target: bool,
    /// Whether to use ANSI colors
    pub ansi_colors: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            include_target: false,
            ansi_colors: true,
        }
    }
}

impl LogConfig {
    /// Create a verbose logging config for debugging
    pub fn verbose() -> Self {
        Self {
            level: LogLevel::Debug,
            include_target: true,
            ansi_colors: true,
        }
    }

    /// Pick a config from command-line switches
    ///
    /// An explicit level wins over `verbose`, which wins over `quiet`.
    pub fn from_flags(verbose: bool, quiet: bool, level: Option<&str>) -> Self {
        let mut config = if verbose {
            Self::verbose()
        } else if quiet {
            Self::quiet()
        } else {
            Self::default()
        };
        if let Some(level) = level {
            config.level = LogLevel::parse(level);
        }
        config
    }

    /// Create a quiet logging config (errors only)
    pub fn quiet() -> Self {
        Self {
            level: LogLevel::Error,
            include_target: false,
            ansi_colors: true,
        }
    }
}

/// Log level enum
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Convert to tracing Level
    pub fn to_tracing_level(&self) -> Level {
        match self {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }

    /// Parse a level name, falling back to `Info`
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "trace" => LogLevel::Trace,
            "debug" => LogLevel::Debug,
            "info" => LogLevel::Info,
            "warn" | "warning" => LogLevel::Warn,
            "error" => LogLevel::Error,
            _ => LogLevel::Info,
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "TRACE"),
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warn => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

/// Initialize the global tracing subscriber
pub fn init_logging(config: &LogConfig) -> Result<(), String> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.level.to_tracing_level())
        .with_ansi(config.ansi_colors)
        .with_target(config.include_target)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| format!("Failed to initialize logging: {}", e))?;

    Ok(())
}

/// Training progress logger
///
/// Emits the human-readable progress lines of a `fit` run. Nothing logged
/// here ends up in the returned training log.
pub struct TrainingLogger {
    epoch: usize,
    total_epochs: usize,
    steps_per_epoch: usize,
    epoch_start: Instant,
    training_start: Instant,
}

impl TrainingLogger {
    /// Create a new training logger
    pub fn new(total_epochs: usize, steps_per_epoch: usize) -> Self {
        Self {
            epoch: 0,
            total_epochs,
            steps_per_epoch,
            epoch_start: Instant::now(),
            training_start: Instant::now(),
        }
    }

    /// Log the size of the run before the first epoch
    pub fn log_start(&self, train_samples: usize, validation_samples: Option<usize>) {
        match validation_samples {
            Some(val) => tracing::info!("Train {} samples | Test {} samples", train_samples, val),
            None => tracing::info!("Train {} samples", train_samples),
        }
    }

    /// Mark the start of an epoch (0-indexed)
    pub fn start_epoch(&mut self, epoch: usize) {
        self.epoch = epoch;
        self.epoch_start = Instant::now();
        tracing::debug!("Epoch {}/{} started", epoch + 1, self.total_epochs);
    }

    /// Log a periodic in-epoch progress message; `step` is 1-indexed
    pub fn log_step(&self, step: usize, learning_rate: f64, loss: f64, accuracy: f64) {
        tracing::info!(
            "Epoch [{}/{}], Step [{}/{}], LR: {:.4}, Train loss: {:.4}, Train acc: {:.4}",
            self.epoch + 1,
            self.total_epochs,
            step,
            self.steps_per_epoch,
            learning_rate,
            loss,
            accuracy
        );
    }

    /// Log the end-of-epoch summary
    pub fn end_epoch(
        &self,
        loss: f64,
        accuracy: f64,
        validation: Option<(f64, f64)>,
        learning_rate: f64,
    ) {
        let epoch_secs = self.epoch_start.elapsed().as_secs_f64();

        match validation {
            Some((val_loss, val_acc)) => tracing::info!(
                "{} / {}: train_loss: {:.4} train_acc: {:.4} | test_loss: {:.4} test_acc: {:.4} | learning rate: {:.4} | {:.1}s",
                self.epoch + 1,
                self.total_epochs,
                loss,
                accuracy,
                val_loss,
                val_acc,
                learning_rate,
                epoch_secs
            ),
            None => tracing::info!(
                "{} / {}: train_loss: {:.4} train_acc: {:.4} | learning rate: {:.4} | {:.1}s",
                self.epoch + 1,
                self.total_epochs,
                loss,
                accuracy,
                learning_rate,
                epoch_secs
            ),
        }
    }

    /// Log training completion
    pub fn log_complete(&self) {
        tracing::info!(
            "Training complete: {} epochs in {:.1}s",
            self.total_epochs,
            self.training_start.elapsed().as_secs_f64()
        );
    }
}
