use clap::Parser;
use anyhow::Result;

mod api;
mod app;
mod config;
mod handler;
mod tui;
mod ui;

use api::{CompletionClient, DEFAULT_ENDPOINT, DEFAULT_MODEL, SYSTEM_PROMPT};
use app::App;
use config::Config;
use tui::{AppEvent, EventHandler};

#[derive(Parser)]
#[command(name = "parley")]
#[command(about = "Terminal chat for OpenAI-compatible completion endpoints")]
#[command(version)]
struct Cli {
    /// Base URL of the completion endpoint
    #[arg(short, long)]
    endpoint: Option<String>,

    /// Model identifier sent with each request
    #[arg(short, long)]
    model: Option<String>,

    /// System instruction sent with each request
    #[arg(short, long)]
    system_prompt: Option<String>,
}

struct Settings {
    endpoint: String,
    model: String,
    system_prompt: String,
}

/// CLI flag wins over config file, config over built-in default
fn resolve_settings(cli: Cli, config: Config) -> Settings {
    Settings {
        endpoint: cli
            .endpoint
            .or(config.endpoint)
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
        model: cli
            .model
            .or(config.model)
            .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        system_prompt: cli
            .system_prompt
            .or(config.system_prompt)
            .unwrap_or_else(|| SYSTEM_PROMPT.to_string()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load().unwrap_or_else(|_| Config::new());
    let settings = resolve_settings(cli, config);

    let client = CompletionClient::new(
        &settings.endpoint,
        &settings.model,
        &settings.system_prompt,
    );
    let mut app = App::new(client);

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let result = run(&mut terminal, &mut app).await;
    tui::restore()?;

    result
}

async fn run(terminal: &mut tui::Tui, app: &mut App) -> Result<()> {
    let mut events = EventHandler::new();

    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        if let Some(event) = events.next().await {
            let is_tick = matches!(event, AppEvent::Tick);
            handler::handle_event(app, event)?;

            // Pick up the assistant reply once the request task resolves
            if is_tick {
                handler::poll_completion(app).await;
            }
        } else {
            break;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_flags() -> Cli {
        Cli {
            endpoint: None,
            model: None,
            system_prompt: None,
        }
    }

    #[test]
    fn test_defaults_when_nothing_is_set() {
        let settings = resolve_settings(no_flags(), Config::new());
        assert_eq!(settings.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(settings.model, DEFAULT_MODEL);
        assert_eq!(settings.system_prompt, SYSTEM_PROMPT);
    }

    #[test]
    fn test_config_beats_default() {
        let config = Config {
            endpoint: Some("http://localhost:9000".to_string()),
            model: Some("local-model".to_string()),
            system_prompt: None,
        };
        let settings = resolve_settings(no_flags(), config);
        assert_eq!(settings.endpoint, "http://localhost:9000");
        assert_eq!(settings.model, "local-model");
        assert_eq!(settings.system_prompt, SYSTEM_PROMPT);
    }

    #[test]
    fn test_cli_flag_beats_config() {
        let cli = Cli {
            endpoint: Some("http://localhost:7777".to_string()),
            model: None,
            system_prompt: Some("Answer tersely.".to_string()),
        };
        let config = Config {
            endpoint: Some("http://localhost:9000".to_string()),
            model: Some("local-model".to_string()),
            system_prompt: Some("Be verbose.".to_string()),
        };
        let settings = resolve_settings(cli, config);
        assert_eq!(settings.endpoint, "http://localhost:7777");
        assert_eq!(settings.model, "local-model");
        assert_eq!(settings.system_prompt, "Answer tersely.");
    }
}
