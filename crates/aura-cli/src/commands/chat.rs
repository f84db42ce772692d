use anyhow::Result;
use colored::Colorize;
use std::future::Future;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};

use aura_ai::responder::{CLEARED_MESSAGE, welcome};
use aura_ai::{ChatSession, ChatStreamClient, ReplyOutcome};

use crate::cli::ChatArgs;
use crate::config::CliConfig;

pub async fn run(config: &CliConfig, args: ChatArgs) -> Result<()> {
    let chat_config = config.chat_config(&args);
    let client = ChatStreamClient::new(chat_config)?;
    tracing::info!(
        model = %client.config().model,
        url = %client.config().completions_url(),
        "Starting chat"
    );
    let mut session = ChatSession::new(client).with_history(args.history || config.chat.history);

    if !args.message.is_empty() {
        let message = args.message.join(" ");
        return ask(&mut session, &message).await;
    }

    interactive(&mut session).await
}

/// One-shot exchange; failures become the command's error.
async fn ask(session: &mut ChatSession, message: &str) -> Result<()> {
    let outcome = stream_reply(session, message).await;
    println!();
    if let ReplyOutcome::Cancelled(_) = outcome? {
        eprintln!("{}", "(reply cancelled)".dimmed());
    }
    Ok(())
}

async fn interactive(session: &mut ChatSession) -> Result<()> {
    let greeting = welcome();
    session.conversation_mut().push_assistant(greeting);
    println!("{} {}", "aura>".cyan().bold(), greeting);
    println!("{}", "Type /clear to start over, /quit to leave.".dimmed());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("{} ", "you>".green().bold());
        std::io::stdout().flush()?;

        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else {
            println!();
            break;
        };

        match line.trim() {
            "" => continue,
            "/quit" | "/exit" => break,
            "/clear" => {
                session.conversation_mut().clear();
                session.conversation_mut().push_assistant(CLEARED_MESSAGE);
                println!("{} {}", "aura>".cyan().bold(), CLEARED_MESSAGE);
                continue;
            }
            _ => {}
        }

        match stream_reply(session, &line).await {
            Ok(ReplyOutcome::Cancelled(_)) => {
                println!();
                println!("{}", "(reply cancelled)".dimmed());
            }
            Ok(_) => println!(),
            Err(e) => {
                tracing::warn!(error = %e, "Reply failed");
                // The conversation already holds the failure notice for this turn.
                let notice = session
                    .conversation()
                    .turns()
                    .last()
                    .map(|turn| turn.text.clone())
                    .unwrap_or_else(|| e.to_string());
                println!();
                println!("{}", notice.red());
            }
        }
    }

    Ok(())
}

async fn stream_reply(session: &mut ChatSession, message: &str) -> aura_ai::Result<ReplyOutcome> {
    print!("{} ", "aura>".cyan().bold());
    let _ = std::io::stdout().flush();

    session
        .send_until(message, interrupted(), |fragment| {
            print!("{fragment}");
            let _ = std::io::stdout().flush();
        })
        .await
}

/// Resolves on Ctrl-C; never resolves if the handler cannot be installed.
fn interrupted() -> impl Future<Output = ()> {
    async {
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
