use relaybot::{
    arguments,
    cache::SeenCache,
    configs,
    engine::Engine,
    logger::{self, LogTag},
    persistence::{self, PersistenceSettings},
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::sync::Notify;

#[tokio::main]
async fn main() {
    logger::init();

    if arguments::is_help_requested() {
        arguments::print_help();
        std::process::exit(0);
    }

    logger::info(LogTag::System, "RelayBot starting up");

    let config_path = arguments::get_config_path();
    let config = match configs::read_config(&config_path) {
        Ok(config) => Arc::new(config),
        Err(e) => {
            logger::error(
                LogTag::System,
                &format!("Cannot load config {}: {}", config_path, e),
            );
            std::process::exit(1);
        }
    };

    let cache = Arc::new(SeenCache::new());
    match cache.load(&config.seen_file) {
        Ok(count) => {
            logger::info(
                LogTag::System,
                &format!("Loaded {} previously seen address(es)", count),
            );
        }
        Err(e) => {
            logger::error(
                LogTag::System,
                &format!("Cannot read {}: {}", config.seen_file.display(), e),
            );
            std::process::exit(1);
        }
    }

    // Ctrl+C flips the shutdown notify; every task watches it.
    let shutdown = Arc::new(Notify::new());
    {
        let shutdown = shutdown.clone();
        if let Err(e) = ctrlc::set_handler(move || {
            shutdown.notify_waiters();
        }) {
            logger::error(
                LogTag::System,
                &format!("Cannot install signal handler: {}", e),
            );
            std::process::exit(1);
        }
    }

    let persistence_handle = tokio::spawn(persistence::persistence_loop(
        cache.clone(),
        PersistenceSettings {
            path: config.seen_file.clone(),
            interval: Duration::from_secs(config.flush_interval_secs),
            size_warn_bytes: config.size_warn_bytes,
        },
        shutdown.clone(),
    ));

    let (tx, rx) = mpsc::channel::<relaybot::pipeline::InboundMessage>(256);

    #[cfg(feature = "telegram")]
    let listener_handle = {
        let transport = match relaybot::telegram::TelegramTransport::new(&config.bot_token) {
            Ok(transport) => Arc::new(transport),
            Err(e) => {
                logger::error(LogTag::System, &format!("Transport setup failed: {}", e));
                std::process::exit(1);
            }
        };
        if let Err(e) = transport.validate().await {
            logger::error(LogTag::System, &format!("Transport setup failed: {}", e));
            std::process::exit(1);
        }

        let listener = tokio::spawn(relaybot::telegram::listen(
            transport.clone(),
            config.clone(),
            tx,
            shutdown.clone(),
        ));

        let engine = Engine::new(config.clone(), cache.clone(), transport);
        engine.run(rx, shutdown.clone()).await;
        listener
    };

    #[cfg(not(feature = "telegram"))]
    {
        drop(tx);
        drop(rx);
        logger::error(
            LogTag::System,
            "Built without the telegram feature, no transport available",
        );
        std::process::exit(1);
    }

    // Wake the background tasks even if the engine stopped for another
    // reason than the signal handler. The stored permit covers a task that
    // is mid-flush rather than waiting right now.
    shutdown.notify_waiters();
    shutdown.notify_one();

    #[cfg(feature = "telegram")]
    if let Err(e) = listener_handle.await {
        logger::warning(LogTag::System, &format!("Listener task panicked: {}", e));
    }
    if let Err(e) = persistence_handle.await {
        logger::warning(LogTag::System, &format!("Persistence task panicked: {}", e));
    }

    logger::info(LogTag::System, "RelayBot stopped");
}
