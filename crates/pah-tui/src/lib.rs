//! Full-screen terminal UI for the hub chat.

pub mod effects;
pub mod events;
pub mod features;
pub mod markdown;
pub mod render;
pub mod runtime;
pub mod state;
pub mod style;
pub mod terminal;
pub mod update;

use std::io::{IsTerminal, stderr};

use anyhow::Result;

use pah_core::callback::CallbackSink;
use pah_core::config::HubConfig;
use pah_core::draft::DraftStore;
use pah_core::push::{PushConfig, spawn_push_client};
use pah_core::transport::ChatClient;

pub use runtime::TuiRuntime;

/// Runs the interactive chat loop until the user quits.
pub async fn run_interactive_chat(config: &HubConfig, drafts: DraftStore) -> Result<()> {
    if !stderr().is_terminal() {
        anyhow::bail!("Chat mode requires a terminal.");
    }

    let http = reqwest::Client::new();
    let chat = ChatClient::new(http.clone(), config.chat_url()?);
    let callbacks = CallbackSink::new(http.clone(), config.callback_url()?);

    let push_config = PushConfig {
        events_url: config.events_url()?,
        reconnect_delay: config.reconnect_delay(),
    };
    let (push_rx, push_cancel) = spawn_push_client(http, push_config);

    let mut runtime = TuiRuntime::new(chat, callbacks, drafts, push_rx)?;
    let result = runtime.run();

    push_cancel.cancel();
    result
}
