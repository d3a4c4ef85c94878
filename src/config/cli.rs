use crate::config::toml_config::ServiceConfig;
use crate::domain::model::Role;
use crate::utils::error::Result;
use clap::{Parser, Subcommand};
use std::path::Path;

#[derive(Debug, Clone, Parser)]
#[command(name = "gatepass")]
#[command(about = "Gate pass number allocation and sequence administration")]
pub struct CliConfig {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "gatepass.toml")]
    pub config: String,

    /// Override database.path from the config file
    #[arg(long)]
    pub database: Option<String>,

    /// Role of the calling user (employee, manager, security, logistics, admin)
    #[arg(long, default_value = "employee")]
    pub role: Role,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Allocate the next gate pass number for the current financial year
    Generate {
        /// Issue a returnable (RGP) pass instead of non-returnable (NRGP)
        #[arg(long)]
        returnable: bool,
    },
    /// List every sequence counter (admin only)
    List,
    /// List counters of one financial year, e.g. 2526
    ListYear { financial_year: String },
    /// Override a counter's current value (admin only)
    Set {
        id: i64,
        #[arg(long)]
        value: Option<u32>,
    },
    /// Print the current financial year
    CurrentYear,
    /// Check whether a string is a well-formed gate pass number
    Validate { gate_pass_number: String },
}

impl CliConfig {
    /// 載入設定檔；檔案不存在時使用預設值，再套用命令列覆蓋
    pub fn load_service_config(&self) -> Result<ServiceConfig> {
        let mut config = if Path::new(&self.config).exists() {
            ServiceConfig::from_file(&self.config)?
        } else {
            tracing::debug!("Config file {} not found, using defaults", self.config);
            ServiceConfig::default()
        };

        if let Some(path) = &self.database {
            config.database.path = path.clone();
        }
        Ok(config)
    }
}
