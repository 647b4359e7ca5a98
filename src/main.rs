//  ,---.     ,--.          ,---.,--.             ,--.
// /  .-',--,--.|  |,-. ,---.'  .-'|  | ,---.  ,---.|  |,-.
// |  `-,' ,-.  ||     /| .-. :  `-,|  || .-. || .--'|     /
// |  .-'\ '-'  ||  \  \\   --.|  .-'|  |' '-' '\ `--.|  \  \
// `--'   `--`--'`--'`--'`----'`--'  `--' `---'  `---'`--'`--'

// Fake-instance simulator for an Omaha update service: spawns a flock of
// simulated devices that check, download, install and report forever.

// Copyright 2025 Servus Altissimi (Pseudonym)

// Permission is hereby granted, free of charge, to any person obtaining a copy of this software and associated documentation files (the "Software"), to deal in the Software without restriction, including without limitation the rights to use, copy, modify, merge, publish, distribute, sublicense, and/or sell copies of the Software, and to permit persons to whom the Software is furnished to do so, subject to the following conditions:
// The above copyright notice and this permission notice shall be included in all copies or substantial portions of the Software.
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

use fakeflock::prelude::*;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::Level;

use tracing_subscriber;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Update server to talk to.
    #[arg(short, long, default_value = "http://localhost:8000")]
    server: String,

    /// Debug logging, including raw request/response bodies.
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Simulate a flock of fake update instances.
    Fake {
        /// Number of fake instances to run.
        #[arg(short = 'n', long, default_value_t = 20)]
        instances: u32,
        /// Minimum seconds between update checks.
        #[arg(long, default_value_t = 1)]
        min_sleep: u64,
        /// Maximum seconds between update checks.
        #[arg(long, default_value_t = 10)]
        max_sleep: u64,
        /// OEM tag to report.
        #[arg(long, default_value = "fakeclient")]
        oem: String,
        /// After install, hold the completion report and send this many
        /// reboot-lock pings first.
        #[arg(long, default_value_t = 0)]
        ping_only: u32,
        /// Application id to update.
        #[arg(long)]
        app_id: String,
        /// Group id to update.
        #[arg(long)]
        group_id: String,
        /// Version to report at start.
        #[arg(long, default_value = "0.0.0")]
        version: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .init();

    match cli.command {
        Commands::Fake {
            instances,
            min_sleep,
            max_sleep,
            oem,
            ping_only,
            app_id,
            group_id,
            version,
        } => {
            let config = SimConfig {
                server: cli.server,
                app_id,
                group_id,
                oem,
                version,
                instances,
                min_sleep,
                max_sleep,
                ping_count: ping_only,
            };

            Simulation::new(config).run().await?;
        }
    }

    Ok(())
}
