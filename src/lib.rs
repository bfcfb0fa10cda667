pub mod config;
pub mod core;
pub mod domain;
pub mod server;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::CliArgs;

pub use config::AppConfig;
pub use crate::core::{backend::BackendClient, wallet::WalletClient, wizard::Wizard};
pub use server::{build_router, serve, AppState};
pub use utils::error::{MarketError, Result};
