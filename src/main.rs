//! Claim Form - damage claim entry with live validation
//!
//! A line-driven terminal front end over the form controller, with
//! remote category options and debounced witness email checks.

mod api;
mod app;
mod categories;
mod command;
mod config;
mod state;
mod validation;

use anyhow::Result;
use app::App;
use command::Command;
use config::FormConfig;
use std::io::{self, Write};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "claim_form=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let config = FormConfig::load().unwrap_or_else(|e| {
        tracing::warn!("Failed to load config, using defaults: {e:#}");
        FormConfig::default()
    });
    let mut app = App::new(&config).await?;

    if let Err(err) = run_app(&mut app).await {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }

    Ok(())
}

async fn run_app(app: &mut App) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    print!("{}", app.render());
    prompt()?;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                match Command::parse(&line) {
                    Ok(Some(command)) => {
                        let listing = match command {
                            Command::Options => Some(app.render_options()),
                            Command::Help => Some(App::help().to_string()),
                            _ => None,
                        };
                        app.handle_command(command).await;
                        if app.should_quit() {
                            break;
                        }
                        match listing {
                            Some(text) => println!("{}", text.trim_end()),
                            None => print!("{}", app.render()),
                        }
                    }
                    Ok(None) => {}
                    Err(e) => println!("> {e}"),
                }
                prompt()?;
            }
            Some(resolution) = app.next_check() => {
                if app.apply_check(resolution) {
                    println!();
                    print!("{}", app.render());
                    prompt()?;
                }
            }
        }
    }

    Ok(())
}

fn prompt() -> Result<()> {
    print!("claim> ");
    io::stdout().flush()?;
    Ok(())
}
