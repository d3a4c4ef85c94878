use clap::Parser;
use gatepass_sequencer::config::{CliConfig, Command};
use gatepass_sequencer::domain::model::{GatePassGenerateRequest, SequenceUpdate};
use gatepass_sequencer::utils::error::{ErrorSeverity, GatePassError};
use gatepass_sequencer::utils::{logger, validation::Validate};
use gatepass_sequencer::{parse_gate_pass_number, GatePassService, SqliteSequenceStore};
use serde::Serialize;

fn print_json<T: Serialize>(value: &T) -> Result<(), GatePassError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run(cli: &CliConfig, service: &GatePassService<SqliteSequenceStore>) -> Result<(), GatePassError> {
    match &cli.command {
        Command::Generate { returnable } => {
            let request = GatePassGenerateRequest {
                is_returnable: *returnable,
            };
            let issued = service.generate(&request).await?;
            print_json(&issued)
        }
        Command::List => print_json(&service.list_sequences(cli.role).await?),
        Command::ListYear { financial_year } => {
            print_json(&service.list_sequences_by_year(financial_year).await?)
        }
        Command::Set { id, value } => {
            let update = SequenceUpdate {
                current_sequence: *value,
            };
            print_json(&service.apply_update(cli.role, *id, &update).await?)
        }
        Command::CurrentYear => print_json(&serde_json::json!({
            "financial_year": service.current_financial_year(),
        })),
        Command::Validate { gate_pass_number } => {
            let parsed = parse_gate_pass_number(gate_pass_number)?;
            print_json(&parsed)
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    let config = match cli.load_service_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", cli.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    // 初始化日誌
    if config.logging.json {
        logger::init_json_logger(cli.verbose, &config.logging.level);
    } else {
        logger::init_cli_logger(cli.verbose, &config.logging.level);
    }
    tracing::debug!("CLI config: {:?}", cli);

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    let result = match SqliteSequenceStore::open(&config.database) {
        Ok(store) => run(&cli, &GatePassService::new(store)).await,
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        tracing::error!(
            "❌ Request failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

        let exit_code = match e.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2, // 可重試
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        };
        if exit_code > 0 {
            std::process::exit(exit_code);
        }
    }

    Ok(())
}
