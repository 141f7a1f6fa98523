use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use pushkind_feeds::db::{establish_connection_pool, initialize_schema};
use pushkind_feeds::feeds::HttpFeedFetcher;
use pushkind_feeds::models::config::ServerConfig;
use pushkind_feeds::processing::article::{ProcessSettings, process_articles_message};
use pushkind_feeds::processing::embedding::FastEmbedService;
use pushkind_feeds::processing::fetch::process_fetch_message;
use pushkind_feeds::processing::sync::{process_stats_message, process_sync_config_message};
use pushkind_feeds::processing::{ProcessingGuard, ZMQMessage};
use pushkind_feeds::repository::DieselRepository;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = match ServerConfig::load() {
        Ok(config) => config,
        Err(e) => {
            log::error!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    let pool = match establish_connection_pool(&config.database_url) {
        Ok(pool) => pool,
        Err(e) => {
            log::error!("Failed to establish database connection: {e}");
            std::process::exit(1);
        }
    };
    match pool.get() {
        Ok(mut conn) => {
            if let Err(e) = initialize_schema(&mut conn) {
                log::error!("Failed to initialize database schema: {e}");
                std::process::exit(1);
            }
        }
        Err(e) => {
            log::error!("Failed to get database connection: {e}");
            std::process::exit(1);
        }
    }
    let repo = DieselRepository::new(pool);

    let feeds_file = PathBuf::from(&config.feeds_file);
    process_sync_config_message(&feeds_file, &repo);

    let embedder = match FastEmbedService::new(
        &config.embedding_model,
        config.model_cache_dir.as_ref().map(PathBuf::from),
    ) {
        Ok(embedder) => Arc::new(embedder),
        Err(e) => {
            log::error!("Failed to configure embedding model: {e}");
            std::process::exit(1);
        }
    };

    let fetcher = match HttpFeedFetcher::new(
        config.fetch_concurrency,
        Duration::from_secs(config.fetch_timeout_secs),
    ) {
        Ok(fetcher) => Arc::new(fetcher),
        Err(e) => {
            log::error!("Failed to build feed fetcher: {e}");
            std::process::exit(1);
        }
    };

    let guard = Arc::new(ProcessingGuard::new());
    let settings = ProcessSettings::from(&config);

    let context = zmq::Context::new();
    let responder = match context.socket(zmq::PULL) {
        Ok(socket) => socket,
        Err(e) => {
            log::error!("Cannot create zmq socket: {e}");
            std::process::exit(1);
        }
    };
    if let Err(e) = responder.bind(&config.zmq_address) {
        log::error!("Cannot bind to zmq address {}: {e}", config.zmq_address);
        std::process::exit(1);
    }
    log::info!("Listening on {}", config.zmq_address);

    loop {
        let msg = match responder.recv_bytes(0) {
            Ok(msg) => msg,
            Err(e) => {
                log::error!("Failed to receive zmq message: {e}");
                continue;
            }
        };
        match serde_json::from_slice::<ZMQMessage>(&msg) {
            Ok(parsed) => {
                let repo = repo.clone();
                let fetcher = Arc::clone(&fetcher);
                let embedder = Arc::clone(&embedder);
                let guard = Arc::clone(&guard);
                let feeds_file = feeds_file.clone();
                tokio::spawn(async move {
                    match parsed {
                        ZMQMessage::Fetch(selector) => {
                            process_fetch_message(selector, &repo, fetcher.as_ref(), &guard).await
                        }
                        ZMQMessage::Process(options) => {
                            let job = tokio::task::spawn_blocking(move || {
                                process_articles_message(
                                    options,
                                    &repo,
                                    embedder.as_ref(),
                                    &settings,
                                    &guard,
                                )
                            });
                            if let Err(e) = job.await {
                                log::error!("Process task failed: {e}");
                            }
                        }
                        ZMQMessage::SyncConfig => process_sync_config_message(&feeds_file, &repo),
                        ZMQMessage::Stats => process_stats_message(&repo),
                    }
                });
            }
            Err(e) => log::error!("Failed to parse JSON: {e}"),
        }
    }
}
