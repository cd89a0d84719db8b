//! Interactive chat session.
//!
//! Lines typed on stdin are sent as messages. `/nick NAME` renames,
//! `/reconnect` leaves the error state, `/quit` logs out.

use clap::Args;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::output;
use quill_client::{ChatClient, ConnectionState};
use quill_core::config::ClientConfig;
use quill_core::error::AppError;
use quill_core::protocol::ChatServerFrame;

/// Arguments for the chat command
#[derive(Debug, Args)]
pub struct ChatArgs {
    /// Pen name to join as
    #[arg(short, long)]
    pub pen_name: String,
}

/// Execute the chat command
pub async fn execute(args: &ChatArgs, config: &ClientConfig) -> Result<(), AppError> {
    let (client, mut frames) = ChatClient::connect(config, &args.pen_name)?;
    client.manager().wait_until_settled().await?;
    output::print_success(&format!("Joined as '{}'. /nick, /reconnect, /quit", client.pen_name()));

    let mut status = client.manager().status();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if !handle_line(&client, line.trim()).await {
                    break;
                }
            }
            frame = frames.recv() => {
                match frame {
                    Some(frame) => print_frame(&frame),
                    None => break,
                }
            }
            changed = status.changed() => {
                if changed.is_err() {
                    break;
                }
                let current = status.borrow_and_update().clone();
                match current.state {
                    ConnectionState::Error => output::print_warning(&format!(
                        "Connection failed: {}. Type /reconnect to retry.",
                        current.last_error.map(|e| e.message).unwrap_or_default()
                    )),
                    state => println!("-- {}", state),
                }
            }
        }
    }

    client.logout().await;
    Ok(())
}

/// Returns `false` when the session should end.
async fn handle_line(client: &ChatClient, line: &str) -> bool {
    if line.is_empty() {
        return true;
    }
    let result = if line == "/quit" {
        return false;
    } else if line == "/reconnect" {
        client.manager().handle().reconnect().await
    } else if let Some(name) = line.strip_prefix("/nick ") {
        client.rename(name).await.map(|name| {
            output::print_success(&format!("Now chatting as '{}'", name));
        })
    } else {
        client.send_message(line).await
    };

    if let Err(e) = result {
        output::print_warning(&e.message);
    }
    true
}

fn print_frame(frame: &ChatServerFrame) {
    match frame {
        ChatServerFrame::Message(m) => {
            println!("[{}] {}: {}", m.timestamp.format("%H:%M:%S"), m.pen_name, m.content)
        }
        ChatServerFrame::MessageHistory { messages } => {
            for m in messages {
                println!("[{}] {}: {}", m.timestamp.format("%H:%M:%S"), m.pen_name, m.content);
            }
        }
        ChatServerFrame::TypingStart { pen_name } => println!("-- {} is typing...", pen_name),
        ChatServerFrame::TypingStop { .. } => {}
        ChatServerFrame::UserJoined { pen_name } => println!("-- {} joined", pen_name),
        ChatServerFrame::UserLeft { pen_name } => println!("-- {} left", pen_name),
        ChatServerFrame::Error { message, .. } => output::print_warning(message),
        ChatServerFrame::Pong => {}
    }
}
