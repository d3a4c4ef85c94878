pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::ServiceConfig;

pub use adapters::SqliteSequenceStore;
pub use core::allocator::GatePassService;
pub use core::financial_year::financial_year_for;
pub use core::formatter::{format_gate_pass_number, is_valid_gate_pass_number, parse_gate_pass_number};
pub use domain::model::{AllocatedGatePass, FinancialYear, PassType, Role, SequenceCounter, YearSequence};
pub use utils::error::{GatePassError, Result};
