//! Interactive flight-search REPL.
//!
//! Wires the engine to in-process adapters and loops over stdin. The
//! language-model pass activates only when an API key is configured.

use std::io::{BufRead, Write};
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use flightdesk::adapters::ai::OpenAiModel;
use flightdesk::adapters::flights::CannedFlightProvider;
use flightdesk::adapters::locations::StaticLocationResolver;
use flightdesk::adapters::memory::InMemorySessionStore;
use flightdesk::adapters::outbound::TracingMessageSender;
use flightdesk::application::{ConversationService, ResultCache, SearchExecutor};
use flightdesk::config::AppConfig;
use flightdesk::domain::extract::Extractor;
use flightdesk::domain::foundation::SessionKey;
use flightdesk::ports::{LanguageModel, MessageSender};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::load()?;

    let model: Option<Arc<dyn LanguageModel>> = match OpenAiModel::from_config(&config.ai) {
        Some(model) => {
            tracing::info!(model = %config.ai.model, "language-model extraction enabled");
            Some(Arc::new(model))
        }
        None => {
            tracing::info!("no API key configured, running deterministic extraction only");
            None
        }
    };

    let cache = Arc::new(ResultCache::new(config.search.cache_freshness()));
    let executor = SearchExecutor::new(
        Arc::new(StaticLocationResolver::new()),
        Arc::new(CannedFlightProvider::new()),
        cache,
        config.search.provider_timeout(),
        config.search.retry_delay(),
    );
    let store = Arc::new(InMemorySessionStore::new());
    let service = ConversationService::new(Extractor::new(model), executor, store, &config.dialog);
    let sender = TracingMessageSender::new();

    let session = SessionKey::new("repl");
    println!("flightdesk — type a message, or ctrl-d to exit\n");

    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();
    loop {
        print!("> ");
        stdout.flush()?;
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match service.handle_turn(&session, line).await {
            Ok(reply) => {
                sender.send(session.as_str(), &reply).await;
                println!("{reply}\n");
            }
            Err(err) => {
                tracing::error!(error = %err, "turn failed");
                println!("Sorry, something went wrong. Please try again.\n");
            }
        }
    }

    Ok(())
}
