use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use std::time::Duration;
use tracing::info;
use weather_core::{Config, Consumer, Scheduler, config, pipeline_from_config};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(
    name = "weather-publisher",
    version,
    about = "Publish the local weather forecast to RabbitMQ"
)]
pub struct Cli {
    #[command(flatten)]
    pub settings: Settings,

    /// Defaults to `run`.
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Publish once immediately, then every interval until interrupted.
    Run,

    /// Run a single cycle and exit.
    Once,

    /// Drain the queue, logging and acknowledging each message.
    Consume {
        /// Simulated processing time before each ack.
        #[arg(long, env = "WEATHER_ACK_DELAY_SECS", default_value_t = 2)]
        ack_delay_secs: u64,
    },
}

#[derive(Debug, Args)]
pub struct Settings {
    /// IP geolocation endpoint.
    #[arg(long, global = true, env = "WEATHER_GEOLOCATION_URL", default_value = config::DEFAULT_GEOLOCATION_URL)]
    pub geolocation_url: String,

    /// Open-Meteo forecast endpoint.
    #[arg(long, global = true, env = "WEATHER_FORECAST_URL", default_value = config::DEFAULT_FORECAST_URL)]
    pub forecast_url: String,

    /// Timezone used for the hourly series.
    #[arg(long, global = true, env = "WEATHER_TIMEZONE", default_value = config::DEFAULT_TIMEZONE)]
    pub timezone: String,

    /// Broker URI.
    #[arg(long, global = true, env = "AMQP_URL", default_value = config::DEFAULT_AMQP_URL)]
    pub amqp_url: String,

    /// Durable queue to publish to.
    #[arg(long, global = true, env = "WEATHER_QUEUE", default_value = config::DEFAULT_QUEUE)]
    pub queue: String,

    /// Seconds between cycles.
    #[arg(long, global = true, env = "WEATHER_INTERVAL_SECS", default_value_t = 10)]
    pub interval_secs: u64,

    /// Optional timeout for each HTTP call, in seconds. No timeout when unset.
    #[arg(long, global = true, env = "WEATHER_HTTP_TIMEOUT_SECS")]
    pub http_timeout_secs: Option<u64>,
}

impl Settings {
    fn into_config(self) -> Config {
        Config {
            geolocation_url: self.geolocation_url,
            forecast_url: self.forecast_url,
            timezone: self.timezone,
            amqp_url: self.amqp_url,
            queue: self.queue,
            interval: Duration::from_secs(self.interval_secs),
            http_timeout: self.http_timeout_secs.map(Duration::from_secs),
            ..Config::default()
        }
    }
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let config = self.settings.into_config();

        match self.command.unwrap_or(Command::Run) {
            Command::Run => {
                let pipeline =
                    pipeline_from_config(&config).context("Failed to set up the pipeline")?;
                let scheduler = Scheduler::from_config(&config);

                info!(
                    queue = %config.queue,
                    "publishing every {:?}",
                    config.interval
                );
                let summary = scheduler.run_until(&pipeline, shutdown_signal()).await;
                info!(
                    cycles = summary.cycles,
                    published = summary.published,
                    "stopped"
                );
            }
            Command::Once => {
                let pipeline =
                    pipeline_from_config(&config).context("Failed to set up the pipeline")?;

                let outcome = pipeline.run_cycle().await;
                if let Some(e) = outcome.error() {
                    bail!("Cycle did not publish: {e}");
                }
            }
            Command::Consume { ack_delay_secs } => {
                let consumer = Consumer::new(
                    &config.amqp_url,
                    &config.queue,
                    Duration::from_secs(ack_delay_secs),
                );

                let acked = consumer
                    .run_until(shutdown_signal())
                    .await
                    .context("Consumer failed")?;
                info!(acked, "consumer stopped");
            }
        }

        Ok(())
    }
}

/// Resolves on Ctrl-C, or SIGTERM on unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_arguments_means_default_config_and_run() {
        let cli = Cli::try_parse_from(["weather-publisher"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.settings.into_config(), Config::default());
    }

    #[test]
    fn flags_override_defaults() {
        let cli = Cli::try_parse_from([
            "weather-publisher",
            "once",
            "--queue",
            "other_queue",
            "--interval-secs",
            "30",
            "--http-timeout-secs",
            "5",
        ])
        .unwrap();

        assert!(matches!(cli.command, Some(Command::Once)));
        let cfg = cli.settings.into_config();
        assert_eq!(cfg.queue, "other_queue");
        assert_eq!(cfg.interval, Duration::from_secs(30));
        assert_eq!(cfg.http_timeout, Some(Duration::from_secs(5)));
        assert_eq!(cfg.timezone, "America/Recife");
    }

    #[test]
    fn consume_takes_an_ack_delay() {
        let cli = Cli::try_parse_from(["weather-publisher", "consume", "--ack-delay-secs", "0"])
            .unwrap();
        assert!(matches!(
            cli.command,
            Some(Command::Consume { ack_delay_secs: 0 })
        ));
    }
}
