use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;

use rxstudy::{
    demo::DemoKind,
    screen::{DemoScreen, ScreenConfig},
    TokioScheduler,
};

#[derive(Parser, Debug)]
#[command(name = "rxstudy")]
#[command(about = "Runs one reactive operator demo and prints its events", long_about = None)]
struct Args {
    /// Demo to run
    #[arg(default_value = "driver")]
    demo: String,

    /// List the available demos and exit
    #[arg(long)]
    list: bool,

    /// How long the demo stays on screen, in milliseconds
    #[arg(long, default_value = "5000")]
    run_for: u64,

    /// Do not print demo output
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    if args.list {
        for kind in DemoKind::ALL {
            println!("{kind}");
        }
        return Ok(());
    }

    let demo: DemoKind = args
        .demo
        .parse()
        .context("run `rxstudy --list` to see the demos")?;
    let scheduler = TokioScheduler::try_current().context("failed to create scheduler")?;

    let mut screen = DemoScreen::new(
        ScreenConfig {
            demo,
            run_for: Duration::from_millis(args.run_for),
            echo: !args.quiet,
        },
        Arc::new(scheduler),
    );
    screen.present().await;

    Ok(())
}
