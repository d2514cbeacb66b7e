//! Esports match prediction CLI
//!
//! Imports match results, trains the win classifier and predicts upcoming matches.

use clap::{Parser, Subcommand};
use esports_predict::{Config, Result};

#[derive(Parser)]
#[command(name = "esports")]
#[command(about = "Esports match outcome prediction from historical results", long_about = None)]
struct Cli {
    /// Config file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Data management commands
    Data {
        #[command(subcommand)]
        action: DataCommands,
    },
    /// Train the win classifier on all finished matches
    Train {
        /// Override the random seed used for the split
        #[arg(long)]
        seed: Option<u64>,
        /// Override the iteration cap
        #[arg(long)]
        max_iterations: Option<usize>,
        /// Only use matches played before each example when building features
        #[arg(long)]
        strict: bool,
    },
    /// Predict the outcome of a match
    Predict {
        /// Side A team name
        team_a: String,
        /// Side B team name
        team_b: String,
        /// Output format
        #[arg(long, default_value = "table")]
        format: OutputFormat,
    },
    /// Model management commands
    Model {
        #[command(subcommand)]
        action: ModelCommands,
    },
    /// Initialize a new project with default config
    Init,
}

#[derive(Subcommand)]
enum DataCommands {
    /// Import matches from a JSON file
    Import {
        /// File containing an array of match objects
        file: String,
    },
    /// Show database status
    Status,
}

#[derive(Subcommand)]
enum ModelCommands {
    /// Show model information
    Info,
}

#[derive(Clone, Debug)]
enum OutputFormat {
    Table,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown format: {}. Use table or json.", s)),
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    let config = if std::path::Path::new(&cli.config).exists() {
        match Config::load(&cli.config) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error loading config: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        Config::default()
    };

    let result = match cli.command {
        Commands::Data { action } => match action {
            DataCommands::Import { file } => commands::data_import(&config, &file),
            DataCommands::Status => commands::data_status(&config),
        },
        Commands::Train {
            seed,
            max_iterations,
            strict,
        } => commands::train(config, seed, max_iterations, strict),
        Commands::Predict {
            team_a,
            team_b,
            format,
        } => commands::predict(&config, &team_a, &team_b, format),
        Commands::Model { action } => match action {
            ModelCommands::Info => commands::model_info(&config),
        },
        Commands::Init => commands::init(&cli.config),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

mod commands {
    use super::*;
    use esports_predict::data::import::import_file;
    use esports_predict::data::Database;
    use esports_predict::model::{ArtifactPaths, InferenceBackend, WinClassifier};
    use esports_predict::predict::{format_prediction, Predictor};
    use esports_predict::training::run_training;
    use esports_predict::{MatchFeatures, PredictError};

    pub fn init(config_path: &str) -> Result<()> {
        let config = Config::default();
        config.save(config_path)?;
        println!("Created default config at {}", config_path);

        std::fs::create_dir_all("data")?;
        std::fs::create_dir_all("model")?;
        println!("Created data/ and model/ directories");

        println!("\nNext steps:");
        println!("  1. Edit {} to customize settings", config_path);
        println!("  2. Run 'esports data import matches.json' to load match results");
        println!("  3. Run 'esports train' to train the model");
        println!("  4. Run 'esports predict \"Team A\" \"Team B\"' to make predictions");

        Ok(())
    }

    pub fn data_import(config: &Config, file: &str) -> Result<()> {
        let db = Database::open(&config.data.database_path)?;
        let summary = import_file(&db, file)?;
        println!(
            "Imported {} new matches ({} already present or invalid)",
            summary.inserted, summary.skipped
        );
        Ok(())
    }

    pub fn data_status(config: &Config) -> Result<()> {
        let db = Database::open(&config.data.database_path)?;
        let stats = db.get_stats()?;
        let leagues = db.leagues()?;

        println!("Database Status");
        println!("───────────────────────────────");
        println!("  Path:     {}", config.data.database_path);
        println!("  Matches:  {}", stats.match_count);
        println!("  Finished: {}", stats.finished_count);
        println!("  Leagues:  {}", leagues.len());
        if let (Some(earliest), Some(latest)) = (stats.earliest_match, stats.latest_match) {
            println!(
                "  Range:    {} to {}",
                earliest.format("%Y-%m-%d"),
                latest.format("%Y-%m-%d")
            );
        }

        Ok(())
    }

    pub fn train(
        mut config: Config,
        seed: Option<u64>,
        max_iterations: Option<usize>,
        strict: bool,
    ) -> Result<()> {
        if let Some(seed) = seed {
            config.training.seed = seed;
        }
        if let Some(max_iterations) = max_iterations {
            config.training.max_iterations = max_iterations;
        }
        if strict {
            config.features.strict_prior_history = true;
        }

        let db = Database::open(&config.data.database_path)?;
        let report = run_training(&db, &config)?;

        println!("\n{}", report);
        Ok(())
    }

    pub fn predict(config: &Config, team_a: &str, team_b: &str, format: OutputFormat) -> Result<()> {
        let db = Database::open(&config.data.database_path)?;
        let predictor = Predictor::load(&db, &config.data.model_path)?;

        for team in [team_a, team_b] {
            if !predictor.has_history(team) {
                log::warn!("No finished matches found for {:?}", team);
            }
        }

        let prediction = predictor.predict(team_a, team_b)?;

        match format {
            OutputFormat::Table => print!("{}", format_prediction(&prediction)),
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&prediction)?),
        }

        Ok(())
    }

    pub fn model_info(config: &Config) -> Result<()> {
        let paths = ArtifactPaths::new(&config.data.model_path);
        if !paths.exists() {
            return Err(PredictError::NoModel);
        }

        let device = Default::default();
        let (model, metadata) =
            WinClassifier::<InferenceBackend>::load(&device, &config.data.model_path)?;
        let (weights, bias) = model.coefficients()?;

        println!("Model Information");
        println!("───────────────────────────────");
        println!("  Path:           {}", paths.weights.display());
        println!("  Trained at:     {}", metadata.trained_at.format("%Y-%m-%d %H:%M"));
        println!(
            "  Examples:       {} train / {} test",
            metadata.train_examples, metadata.test_examples
        );
        println!("  Iterations:     {}", metadata.iterations);
        match metadata.accuracy {
            Some(acc) => println!("  Accuracy:       {:.4}", acc),
            None => println!("  Accuracy:       n/a"),
        }
        match metadata.auc {
            Some(auc) => println!("  AUC:            {:.4}", auc),
            None => println!("  AUC:            n/a"),
        }
        println!("  Recent window:  {}", metadata.features.recent_window);
        println!("\n  Coefficients (standardized)");
        for (name, weight) in MatchFeatures::NAMES.iter().zip(&weights) {
            println!("    {:<22}{:+.4}", name, weight);
        }
        println!("    {:<22}{:+.4}", "bias", bias);

        Ok(())
    }
}
