use clap::{
    CommandFactory, Parser, Subcommand,
    builder::{
        Styles,
        styling::{AnsiColor, Effects},
    },
};
use clap_complete::{Shell, generate};

use muzikant::{config, error, server, startup, success, warning};

fn styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::White.on_default() | Effects::BOLD)
        .usage(AnsiColor::White.on_default() | Effects::BOLD)
        .literal(AnsiColor::BrightBlue.on_default())
        .placeholder(AnsiColor::BrightGreen.on_default())
}

#[derive(Parser, Debug, Clone)]
#[clap(
  version = env!("CARGO_PKG_VERSION"),
  name=env!("CARGO_PKG_NAME"),
  bin_name=env!("CARGO_PKG_NAME"),
  about=env!("CARGO_PKG_DESCRIPTION"),
  styles=styles(),
)]
struct Cli {
    /// Enable debug logging (RUST_LOG takes precedence)
    #[clap(short, long, global = true)]
    verbose: bool,

    #[clap(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Serve the playlist API (default)
    Serve(ServeOptions),

    /// Get shell completions
    Completions(CompletionsOption),
}

#[derive(Parser, Debug, Clone, Default)]
pub struct ServeOptions {
    /// Address to bind, overrides SERVER_ADDRESS
    #[clap(long)]
    addr: Option<String>,

    /// Open the OAuth login page in the browser once serving (OAuth only)
    #[clap(long)]
    open_browser: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct CompletionsOption {
    shell: Shell,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(e) = startup::init_environment(cli.verbose).await {
        error!("Cannot load environment. Err: {}", e);
    }

    match cli.command.unwrap_or_else(|| Command::Serve(ServeOptions::default())) {
        Command::Serve(opt) => serve(opt).await,
        Command::Completions(opt) => {
            let mut cmd = Cli::command_for_update();
            let name = cmd.get_name().to_string();
            generate(opt.shell, &mut cmd, name, &mut std::io::stdout())
        }
    }
}

async fn serve(opt: ServeOptions) {
    let mut config = match config::Config::from_env() {
        Ok(config) => config,
        Err(e) => error!("Invalid configuration: {}", e),
    };
    if let Some(addr) = opt.addr {
        config.server_addr = addr;
    }

    let state = match server::AppState::from_config(&config) {
        Ok(state) => state,
        Err(e) => error!("Failed to initialise Spotify client: {}", e),
    };

    if let Err(e) = startup::validate(config.oauth_enabled, &state.tokens).await {
        error!("Startup validation failed: {}", e);
    }
    if !config.oauth_enabled {
        success!("Spotify credentials verified");
    }

    if opt.open_browser {
        if config.oauth_enabled {
            let login_url = format!("http://{}/oauth/login", config.server_addr);
            if webbrowser::open(&login_url).is_err() {
                warning!(
                    "Failed to open browser. Please navigate to the following URL manually:\n{}",
                    login_url
                )
            }
        } else {
            warning!("--open-browser has no effect while SPOTIFY_OAUTH_ENABLED is false");
        }
    }

    if let Err(e) = server::start_api_server(&config, state).await {
        error!("Server error: {}", e);
    }
}
