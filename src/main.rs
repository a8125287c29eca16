mod api;
mod common;
mod config;
mod network;
mod ui;

use clap::Parser;
use dotenvy::dotenv;
use tokio::sync::mpsc;

use api::ApiClient;
use network::NetClient;
use ui::ChatApp;

#[derive(Parser)]
#[command(name = "blueon-chat", version, about = "BlueOn marketplace chat client")]
struct Cli {
    /// Path to JSON config file
    #[arg(long, default_value = config::DEFAULT_CONFIG_PATH, value_name = "FILE")]
    config: String,
    /// Open this room on startup (defaults to the first room on the server)
    #[arg(long)]
    room: Option<i64>,
    /// Open the chat bound to this task key
    #[arg(long)]
    task: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), eframe::Error> {
    dotenv().ok();
    env_logger::init();

    let cli = Cli::parse();
    let app_config = config::load_config(&cli.config);

    let api = match ApiClient::new(&app_config.api_base) {
        Ok(api) => api,
        Err(err) => {
            log::error!("Failed to build API client: {err}");
            return Ok(());
        }
    };

    // UI -> network
    let (cmd_tx, cmd_rx) = mpsc::channel(100);
    // network -> UI
    let (event_tx, event_rx) = mpsc::channel(100);

    let ws_url = app_config.ws_url.clone();
    tokio::spawn(async move {
        NetClient::new(api, ws_url, event_tx, cmd_rx).run().await;
    });

    let options = eframe::NativeOptions::default();
    let mut event_rx = Some(event_rx);
    let room = cli.room;
    let task = cli.task.clone();

    eframe::run_native(
        "BlueOn Chat",
        options,
        Box::new(move |cc| {
            let event_receiver = event_rx
                .take()
                .expect("ChatApp should only be initialized once");

            log::info!("client started against {}", app_config.api_base);

            Ok(Box::new(ChatApp::new(
                cc,
                cmd_tx.clone(),
                event_receiver,
                room,
                task.clone(),
            )))
        }),
    )
}
