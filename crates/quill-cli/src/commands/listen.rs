//! Notification listener.

use clap::Args;

use quill_client::{NotificationClient, NotificationPresenter};
use quill_core::config::ClientConfig;
use quill_core::error::AppError;
use quill_core::events::NotificationCategory;

/// Arguments for the listen command
#[derive(Debug, Args)]
pub struct ListenArgs {
    /// Categories to receive (defaults to everything but `test`)
    #[arg(short = 'c', long = "category", value_delimiter = ',')]
    pub categories: Vec<String>,

    /// Show events as system alerts instead of in-app
    #[arg(long)]
    pub alerts: bool,
}

/// Execute the listen command
pub async fn execute(args: &ListenArgs, config: &ClientConfig) -> Result<(), AppError> {
    let filters = if args.categories.is_empty() {
        let mut all: Vec<_> = NotificationCategory::default_filters().into_iter().collect();
        all.sort();
        all
    } else {
        args.categories
            .iter()
            .map(|c| c.parse::<NotificationCategory>())
            .collect::<Result<Vec<_>, _>>()?
    };

    let presenter = NotificationPresenter::new(args.alerts);
    let (client, mut frames) = NotificationClient::connect(config, filters, presenter)?;
    client.manager().wait_until_settled().await?;
    println!("Listening for notifications. Ctrl-C to stop.");

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            frame = frames.recv() => {
                match frame {
                    Some(frame) => {
                        if let Some(shown) = client.present(&frame) {
                            println!("{}", shown);
                        }
                    }
                    None => break,
                }
            }
        }
    }

    client.logout().await;
    Ok(())
}
