//! Event loop wiring: terminal setup, input thread, message dispatch.

use std::io::{self, Stdout};

use anyhow::Result;
use crossterm::event::{self, Event, KeyEventKind};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use log::{debug, error};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tokio::sync::mpsc;

use super::app::{App, AppMsg};
use super::command::Command;

type Term = Terminal<CrosstermBackend<Stdout>>;

fn setup_terminal() -> Result<Term> {
    enable_raw_mode()?;
    io::stdout().execute(EnterAlternateScreen)?;
    let terminal = Terminal::new(CrosstermBackend::new(io::stdout()))?;
    Ok(terminal)
}

fn restore_terminal() -> Result<()> {
    disable_raw_mode()?;
    io::stdout().execute(LeaveAlternateScreen)?;
    Ok(())
}

/// Blocking reads on a dedicated thread so the async runtime never stalls
/// waiting for the keyboard.
fn spawn_input_thread(tx: mpsc::UnboundedSender<AppMsg>) {
    std::thread::spawn(move || loop {
        match event::read() {
            Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                if tx.send(AppMsg::Key(key)).is_err() {
                    break;
                }
            }
            Ok(Event::Resize(_, _)) => {
                if tx.send(AppMsg::Redraw).is_err() {
                    break;
                }
            }
            Ok(_) => {}
            Err(e) => {
                error!("input thread error: {e}");
                break;
            }
        }
    });
}

fn dispatch(cmd: Command<AppMsg>, tx: &mpsc::UnboundedSender<AppMsg>) {
    match cmd {
        Command::None => {}
        Command::Quit => {
            let _ = tx.send(AppMsg::Quit);
        }
        Command::Batch(cmds) => {
            for cmd in cmds {
                dispatch(cmd, tx);
            }
        }
        Command::Perform(future) => {
            let tx = tx.clone();
            tokio::spawn(async move {
                let msg = future.await;
                let _ = tx.send(msg);
            });
        }
    }
}

pub async fn run(mut app: App) -> Result<()> {
    let mut terminal = setup_terminal()?;
    let result = event_loop(&mut app, &mut terminal).await;
    restore_terminal()?;
    result
}

async fn event_loop(app: &mut App, terminal: &mut Term) -> Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    spawn_input_thread(tx.clone());

    dispatch(app.init(), &tx);
    terminal.draw(|frame| app.view(frame))?;

    while let Some(msg) = rx.recv().await {
        if matches!(msg, AppMsg::Quit) {
            debug!("quit requested");
            break;
        }
        let cmd = app.update(msg);
        dispatch(cmd, &tx);
        terminal.draw(|frame| app.view(frame))?;
    }
    Ok(())
}
