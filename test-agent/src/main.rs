use std::{future, path::PathBuf, process};

use agent_tracing::{init_logging, LogFormat};
use clap::{Parser, ValueEnum};
use daemon_graphql_client::DaemonGraphqlClient;
use reqwest::Url;
use rosetta_http_client::RosettaHttpClient;
use rosetta_test_agent::{AgentConfig, ScenarioRunner};

#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Daemon GraphQL endpoint used to submit transactions.
    #[arg(long, env = "GRAPHQL_URI")]
    graphql_uri: Url,
    /// Rosetta Data API endpoint used to observe the chain.
    #[arg(long, env = "ROSETTA_URI")]
    rosetta_uri: Url,
    /// YAML file with payment, polling and logging settings.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Log line format, overriding the config file.
    #[arg(long, value_enum)]
    log_format: Option<LogFormatArg>,
    /// `EnvFilter` directives, overriding the config file.
    #[arg(long)]
    log_filter: Option<String>,
    /// Keep the process alive after the scenario finishes.
    #[arg(long)]
    dont_exit: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogFormatArg {
    Plain,
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(format: LogFormatArg) -> Self {
        match format {
            LogFormatArg::Plain => Self::Plain,
            LogFormatArg::Json => Self::Json,
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let mut config = match cli.config.as_deref().map(AgentConfig::load).transpose() {
        Ok(config) => config.unwrap_or_default(),
        Err(error) => {
            eprintln!("Error: {error}");
            process::exit(1);
        }
    };
    if let Some(format) = cli.log_format {
        config.logging.format = format.into();
    }
    if cli.log_filter.is_some() {
        config.logging.filter = cli.log_filter;
    }

    let guard = match init_logging(&config.logging) {
        Ok(guard) => guard,
        Err(error) => {
            eprintln!("Error: {error}");
            process::exit(1);
        }
    };

    let span = tracing::info_span!(
        "scenario",
        graphql = %cli.graphql_uri,
        rosetta = %cli.rosetta_uri
    );
    let runner = ScenarioRunner::new(
        DaemonGraphqlClient::new(cli.graphql_uri),
        RosettaHttpClient::new(cli.rosetta_uri),
        config.payment,
        config.scenario,
        span,
    );

    let result = runner.run().await;
    match &result {
        Ok(()) => tracing::info!("Rosetta test agent finished successfully"),
        Err(error) => tracing::error!(step = %error.step(), "Rosetta test agent failed: {error}"),
    }

    if cli.dont_exit {
        tracing::info!("Scenario done, waiting for termination");
        future::pending::<()>().await;
    }

    if result.is_err() {
        // `process::exit` skips destructors, flush buffered logs first.
        drop(guard);
        process::exit(1);
    }
}
