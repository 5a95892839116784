use aria_client::{AriaConfig, ClientStateStore, Notification, RealtimeConnection, Topic, listener};

/// Connect to the ARIA event stream and print everything it delivers
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load ARIA_* variables from .env if present
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("aria_client=debug")),
        )
        .init();

    let config = AriaConfig::from_env()?;
    let connection = RealtimeConnection::from_config(&config)?;
    let store = ClientStateStore::from_config(&config)?;

    println!("📡 Event stream: {}\n", connection.endpoint());

    connection.on(
        Topic::Connected,
        listener(|n| {
            if let Notification::Connected(up) = n {
                println!("🔌 connected = {}", up);
            }
        }),
    );
    connection.on(
        Topic::Event,
        listener(|n| {
            if let Notification::Event(payload) = n {
                println!("🏠 event: {}", payload);
            }
        }),
    );
    connection.on(
        Topic::Error,
        listener(|n| {
            if let Notification::Error(message) = n {
                println!("⚠️  error: {}", message);
            }
        }),
    );

    store.bind_realtime(&connection);

    // Seed the registry so pushed device changes have something to update
    if let Err(e) = store.devices().fetch_devices().await {
        println!("Could not list devices: {}", e);
    }
    let poller = store.spawn_status_poller();

    if let Err(e) = connection.connect().await {
        println!("Initial connection failed ({}), retrying in the background", e);
    }

    println!("Press Ctrl+C to stop\n");
    tokio::signal::ctrl_c().await?;

    poller.abort();
    connection.disconnect().await;

    let feed = store.events().snapshot();
    println!("\nReceived {} events", feed.events.len());
    for (id, device) in store.devices().snapshot().devices {
        println!("  {} = {}", id, device.state);
    }

    Ok(())
}
