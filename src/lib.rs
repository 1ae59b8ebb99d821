//! Muzikant Backend Library
//!
//! This library implements a single-tenant backend that reads Spotify playlists
//! on behalf of one host account and serves them, ordered by release year, to a
//! browser front-end. It includes the Spotify access layer (token lifecycle,
//! rate governance, pagination) and the HTTP surface exposed to the front-end.
//!
//! # Modules
//!
//! - `api` - HTTP handlers for playlist, OAuth and health endpoints
//! - `config` - Configuration management and environment variables
//! - `logging` - Tracing subscriber setup
//! - `management` - Process-lifetime token and login state
//! - `server` - Router construction and the HTTP server loop
//! - `spotify` - Spotify Web API and Accounts client implementation
//! - `startup` - Fail-fast credential validation on process start
//! - `types` - Data structures and type definitions
//! - `utils` - Utility functions and helpers
//!
//! # Example
//!
//! ```
//! use muzikant::{config, server};
//!
//! #[tokio::main]
//! async fn main() -> muzikant::Res<()> {
//!     config::load_env().await?;
//!     let config = config::Config::from_env()?;
//!     let state = server::AppState::from_config(&config)?;
//!     server::start_api_server(&config, state).await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod logging;
pub mod management;
pub mod server;
pub mod spotify;
pub mod startup;
pub mod types;
pub mod utils;

/// A convenient Result type alias for operations that may fail.
///
/// Used at the outer edges of the application (binary, server bootstrap)
/// where errors of different kinds meet. Core operations return typed
/// errors such as [`spotify::SpotifyError`] instead.
pub type Res<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Prints a success message with a green checkmark.
///
/// # Example
///
/// ```
/// success!("Spotify credentials verified");
/// ```
#[macro_export]
macro_rules! success {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "✓".green().bold(), std::format_args!($($arg)*));
  })
}

/// Prints an error message with a red exclamation mark and exits the program.
///
/// Only meant for unrecoverable startup failures; code after this macro
/// will not execute.
///
/// # Example
///
/// ```
/// error!("Invalid configuration: {}", e);
/// ```
#[macro_export]
macro_rules! error {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    eprintln!("[{}] {}", "!".red().bold(), std::format_args!($($arg)*));
    std::process::exit(1);
  })
}

/// Prints a warning message with a yellow exclamation mark.
///
/// # Example
///
/// ```
/// warning!("Failed to open browser, navigate to {} manually", url);
/// ```
#[macro_export]
macro_rules! warning {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "!".yellow().bold(), std::format_args!($($arg)*));
  })
}
