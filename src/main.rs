mod app;
mod chat;
mod event;
mod tui;
mod ui;

use anyhow::Result;
use crossterm::event::EventStream;
use futures_util::StreamExt;
use log::{info, warn};

use crate::app::App;
use crate::chat::ChatConfig;
use crate::event::Event;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let config = ChatConfig::load()?;

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let result = run(&mut terminal, config).await;
    tui::restore()?;
    result
}

async fn run(terminal: &mut tui::Tui, config: ChatConfig) -> Result<()> {
    let mut app = App::new(config)?;
    let mut events = EventStream::new();
    let mut ticker = tokio::time::interval(std::time::Duration::from_millis(100));
    info!("Entering main loop");

    while app.running {
        terminal.draw(|frame| ui::render(frame, &app))?;

        let event = tokio::select! {
            _ = ticker.tick() => Event::Tick,
            maybe = events.next() => match maybe {
                Some(Ok(raw)) => match Event::from_crossterm(raw) {
                    Some(event) => event,
                    None => continue,
                },
                Some(Err(err)) => {
                    warn!("Terminal event error: {err}");
                    continue;
                }
                None => break,
            },
        };

        match event {
            Event::Tick => app.on_tick(),
            Event::Key(key) => app.handle_key(key).await,
            Event::Mouse(mouse) => app.handle_mouse(mouse),
            Event::Paste(text) => app.handle_paste(&text),
            Event::Resize => {}
        }
    }

    info!("Main loop finished");
    Ok(())
}
