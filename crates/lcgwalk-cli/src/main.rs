//! CLI for lcgwalk: generate LCG samples and validate them before a random walk.

mod commands;

use clap::{Parser, Subcommand};

use commands::GeneratorArgs;

#[derive(Parser)]
#[command(name = "lcgwalk")]
#[command(about = "lcgwalk: validated pseudorandom numbers for random-walk simulations")]
#[command(version = lcgwalk_core::VERSION)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a sample from the linear congruential generator
    Generate {
        #[command(flatten)]
        generator: GeneratorArgs,

        /// Output format
        #[arg(long, default_value = "table", value_parser = ["table", "json", "csv"])]
        format: String,

        /// Write the sample to a file instead of stdout
        #[arg(long)]
        output: Option<String>,
    },

    /// Generate a sample and run the statistical test battery on it
    Validate {
        #[command(flatten)]
        generator: GeneratorArgs,

        /// Comma-separated tests, e.g. "means,variance,chi_square=10,ks=10,poker,runs".
        /// "all" enables every test that needs no interval count.
        #[arg(long, conflicts_with = "config")]
        tests: Option<String>,

        /// JSON test selection file: {"means": true, "chi": {"k": 10}, "poker": false}
        #[arg(long)]
        config: Option<String>,

        /// Significance level
        #[arg(long, default_value_t = lcgwalk_tests::DEFAULT_ALPHA)]
        alpha: f64,

        /// Print the full report as JSON
        #[arg(long)]
        json: bool,

        /// Write the JSON report to a file
        #[arg(long)]
        output: Option<String>,

        /// Exit with status 2 unless every executed test is approved
        #[arg(long)]
        strict: bool,
    },

    /// Start the HTTP validation server
    Server {
        /// Port to listen on
        #[arg(long, default_value = "8043")]
        port: u16,

        /// Bind address
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Generate {
            generator,
            format,
            output,
        } => commands::generate::run(&generator, &format, output.as_deref()),
        Commands::Validate {
            generator,
            tests,
            config,
            alpha,
            json,
            output,
            strict,
        } => commands::validate::run(commands::validate::ValidateCommandConfig {
            generator: &generator,
            tests: tests.as_deref(),
            config_path: config.as_deref(),
            alpha,
            json,
            output_path: output.as_deref(),
            strict,
        }),
        Commands::Server { port, host } => commands::server::run(&host, port),
    }
}
