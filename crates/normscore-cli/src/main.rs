use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use eyre::Result;
use jiff::civil::Date;
use normscore_cli::catalog::Catalog;
use normscore_cli::commands::{self, DemographicsInput};
use normscore_cli::config::{self, CliConfig};
use normscore_cli::telemetry;
use normscore_core::models::demographics::Sex;

#[derive(Parser, Debug)]
#[command(
    name = "normscore",
    about = "Score psychometric instruments against normative reference tables",
    version
)]
struct Cli {
    /// Config file to use instead of the platform default
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the built-in and configured instruments
    List,
    /// Validate an instrument definition file
    Check {
        /// Definition file (JSON)
        file: PathBuf,
    },
    /// Score one administration and print the outcome as JSON
    Score(ScoreArgs),
    /// Inspect or create the config file
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Args, Debug)]
struct ScoreArgs {
    /// Instrument id, or path to a definition file
    #[arg(long)]
    instrument: String,
    /// Responses file: a JSON object of question id to answer
    #[arg(long)]
    responses: PathBuf,
    /// Age in completed years at evaluation
    #[arg(long, conflicts_with = "birth_date")]
    age: Option<u32>,
    /// Birth date (YYYY-MM-DD)
    #[arg(long)]
    birth_date: Option<Date>,
    /// Evaluation date (YYYY-MM-DD, defaults to today)
    #[arg(long, requires = "birth_date")]
    evaluated_on: Option<Date>,
    /// Sex used for normative matching (M or F)
    #[arg(long)]
    sex: Option<Sex>,
    /// Education level used for normative matching
    #[arg(long)]
    education: Option<String>,
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Print the effective config
    Show,
    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn main() -> Result<ExitCode> {
    color_eyre::install()?;

    let cli = Cli::parse();
    let config_path = match cli.config {
        Some(path) => path,
        None => config::default_path()?,
    };
    let config = config::load(&config_path)?;
    telemetry::init(&config)?;

    run(cli.command, &config, config_path)
}

fn run(command: Command, config: &CliConfig, config_path: PathBuf) -> Result<ExitCode> {
    match command {
        Command::List => {
            let catalog = Catalog::load(config.instruments_dir.as_deref())?;
            println!("{}", commands::render(&commands::list(&catalog), config.output)?);
        }
        Command::Check { file } => {
            let report = commands::check(&file)?;
            println!("{}", commands::render(&report, config.output)?);
            if !report.valid {
                return Ok(ExitCode::FAILURE);
            }
        }
        Command::Score(args) => {
            let demographics = DemographicsInput {
                age: args.age,
                birth_date: args.birth_date,
                evaluated_on: args.evaluated_on,
                sex: args.sex,
                education: args.education,
            }
            .resolve(jiff::Zoned::now().date())?;

            let catalog = Catalog::load(config.instruments_dir.as_deref())?;
            let outcome = commands::score(
                &catalog,
                &args.instrument,
                &args.responses,
                demographics.as_ref(),
            )?;
            println!("{}", commands::render(&outcome, config.output)?);
        }
        Command::Config { command } => match command {
            ConfigCommand::Show => {
                eprintln!("config: {}", config_path.display());
                println!("{}", commands::render(config, config.output)?);
            }
            ConfigCommand::Init { force } => {
                if config_path.exists() && !force {
                    return Err(eyre::eyre!(
                        "{} already exists (use --force to overwrite)",
                        config_path.display()
                    ));
                }
                config::save(&CliConfig::default(), &config_path)?;
                println!("{}", config_path.display());
            }
        },
    }
    Ok(ExitCode::SUCCESS)
}
