use aria_client::store::Role;
use aria_client::{AriaConfig, ClientStateStore};
use tokio::io::{AsyncBufReadExt, BufReader};

/// Minimal terminal chat against the ARIA backend
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let config = AriaConfig::from_env()?;
    let store = ClientStateStore::from_config(&config)?;

    match store.system().fetch_health().await {
        Ok(health) => println!("Backend health: {}", health.status),
        Err(e) => println!("Backend unreachable: {}", e),
    }

    println!("Type a message, '/clear' to reset, '/quit' to exit\n");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        match line {
            "" => continue,
            "/quit" => break,
            "/clear" => {
                store.chat().clear_messages();
                println!("(conversation cleared)\n");
                continue;
            }
            _ => {}
        }

        // Failures are already recorded as a system message
        let _ = store.chat().send_user_message(line).await;

        let state = store.chat().snapshot();
        if let Some(last) = state.messages.last() {
            let who = match last.role {
                Role::Assistant => "aria",
                Role::System => "system",
                Role::User => "you",
            };
            println!("{}> {}", who, last.content);

            if let Some(calls) = last.metadata.as_ref().and_then(|m| m.tool_calls.as_ref())
                && !calls.is_empty()
            {
                println!("   ({} tool call(s))", calls.len());
            }
        }
        if let Some(session) = &state.session_id {
            tracing::debug!("session {}", session);
        }
        println!();
    }

    Ok(())
}
