use clap::{Parser, Subcommand};
use dlms_gateway::config::SettingsStore;
use dlms_gateway::gateway::serial::SerialMeterLink;
use dlms_gateway::gateway::{Gateway, LoggingSink};
use dlms_gateway::meter::Lg450;
use dlms_gateway::{init_logger, log_info, GatewayError};
use std::time::Duration;

#[derive(Parser)]
#[command(name = "dlms-gateway")]
#[command(about = "DLMS push gateway for wired M-Bus attached smart meters")]
struct Cli {
    /// Directory holding the persisted settings document
    #[arg(long, default_value = ".")]
    settings_dir: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the gateway: one cycle per measure interval
    Run {
        /// Serial port the M-Bus adapter is attached to
        port: String,
    },
    /// Run one immediate read-send cycle
    ReadCycle {
        port: String,
    },
    /// Print the configured measurement interval
    GetInterval,
    /// Set the measurement interval (wakeup timer) in milliseconds
    SetInterval {
        ms: u64,
    },
    /// Reset the stored configuration to the default values
    ResetConfig,
}

#[tokio::main]
async fn main() -> Result<(), GatewayError> {
    init_logger();

    let cli = Cli::parse();
    let store = SettingsStore::new(&cli.settings_dir);

    match cli.command {
        Commands::Run { port } => {
            let mut gateway = build_gateway(&store, &port);
            loop {
                // Operator commands mutate the settings document between
                // cycles; pick changes up before each wake.
                gateway.reload_config(store.load());
                let interval = gateway.config().measure_interval_ms;
                if let Err(e) = gateway.run_cycle().await {
                    log::error!("Cycle failed: {e}");
                }
                log_info(&format!("Sleeping {interval} ms until next cycle"));
                tokio::time::sleep(Duration::from_millis(interval)).await;
            }
        }
        Commands::ReadCycle { port } => {
            let mut gateway = build_gateway(&store, &port);
            let report = gateway.run_cycle().await?;
            log_info(&format!(
                "Cycle done: apdu={}, values={}, sent={} ({} bytes)",
                report.apdu_received, report.value_count, report.uplink_sent, report.uplink_bytes
            ));
        }
        Commands::GetInterval => {
            let config = store.load();
            log_info(&format!(
                "Measurement interval: {} ms",
                config.measure_interval_ms
            ));
        }
        Commands::SetInterval { ms } => {
            let mut config = store.load();
            config.measure_interval_ms = ms;
            store.save(&config)?;
            log_info(&format!("Measurement interval set to {ms} ms"));
        }
        Commands::ResetConfig => {
            store.reset();
            log_info("Configuration reset to default values");
        }
    }

    Ok(())
}

fn build_gateway(store: &SettingsStore, port: &str) -> Gateway<Lg450> {
    let config = store.load();
    Gateway::new(
        config,
        Lg450::new(),
        Box::new(SerialMeterLink::new(port)),
        Box::new(LoggingSink),
    )
}
