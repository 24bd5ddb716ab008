use chatwallet::{
    chat::{Assistant, AssistantClient, AssistantCredentials},
    client::{HttpTransactionService, WalletSession},
    config::AppConfig,
    controllers::{Notifier, TransactionController, WalletController},
    market::{BalanceClient, PriceClient},
    wallet::WalletAdapters,
    web,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is fine
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chatwallet=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting ChatWallet v{}", env!("CARGO_PKG_VERSION"));

    let config = AppConfig::init()?;
    let node_url = config.session.resolved_node_url();
    info!(
        "Configuration loaded: network={}, node={}, services={}",
        config.session.network, node_url, config.services.url
    );

    // One session for the whole process, shared by the controllers
    let service = HttpTransactionService::new(&config.services)?;
    let session = Arc::new(WalletSession::new(config.session.clone(), Arc::new(service)));
    let notifier = Arc::new(Notifier::new());
    let wallet = WalletController::new(
        Arc::clone(&session),
        WalletAdapters::default(),
        Arc::clone(&notifier),
    );
    let transactions = TransactionController::new(
        Arc::clone(&session),
        Arc::clone(&notifier),
        Some(session.user_id()),
    );
    info!(
        "Wallet session ready: user={}, confirmation delay={}ms, connected={}",
        session.user_id(),
        config.session.confirmation_delay_ms,
        wallet.is_connected()
    );

    let assistant = AssistantClient::new(&config.assistant, AssistantCredentials::from_env())?;
    if assistant.is_available() {
        info!("Assistant ready using model {}", config.assistant.model);
    } else {
        warn!("Assistant API key not set. Set CHATWALLET_ASSISTANT_API_KEY or ANTHROPIC_API_KEY to enable chat answers");
    }

    let state = web::AppState {
        prices: Arc::new(PriceClient::new(&config.market)?),
        balances: Arc::new(BalanceClient::new(&config.market, node_url)?),
        assistant: Arc::new(assistant),
    };
    let app = web::create_router(state);

    let addr = format!("{}:{}", config.web.host, config.web.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Web server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Shutdown signal received");
            }
        })
        .await?;

    drop(transactions);
    drop(wallet);
    let cancelled = session.cancel_confirmations();
    info!("Wallet session closed, {} pending confirmations cancelled", cancelled);

    Ok(())
}
