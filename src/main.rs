//! Storyloom server binary - configuration, wiring, and the HTTP surface.

use std::sync::Arc;

use axum::{http::HeaderValue, routing::get, Router};
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use storyloom::adapters::ai::{
    AnthropicConfig, AnthropicTextGenerator, FailoverTextGenerator, OpenAiConfig,
    OpenAiTextGenerator,
};
use storyloom::adapters::image::{OpenAiImageConfig, OpenAiImageGenerator};
use storyloom::adapters::storage::RedisSessionStore;
use storyloom::adapters::websocket::{ws_handler, RoomManager, RoomProgressPublisher, WebSocketState};
use storyloom::application::TurnCoordinator;
use storyloom::config::{AiConfig, AiProvider, AppConfig, ImageConfig};
use storyloom::ports::{ImageGenerator, TextGenerator};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("storyloom=info")),
        )
        .init();

    let config = AppConfig::load()?;
    config.validate()?;

    let redis_client = redis::Client::open(config.redis.url.clone())?;
    let redis_conn = tokio::time::timeout(
        config.redis.timeout(),
        redis_client.get_multiplexed_async_connection(),
    )
    .await
    .map_err(|_| "timed out connecting to Redis")??;
    let store = Arc::new(RedisSessionStore::new(redis_conn));

    let text = build_text_generator(&config.ai);
    let image = build_image_generator(&config.image, &config.ai);

    let rooms = Arc::new(RoomManager::with_default_capacity());
    let publisher = Arc::new(RoomProgressPublisher::new(Arc::clone(&rooms)));

    let coordinator = Arc::new(
        TurnCoordinator::new(store, publisher.clone(), text, image)
            .with_session_ttl(config.redis.session_ttl()),
    );

    let ws_state = WebSocketState::new(rooms, publisher, coordinator);

    let app = Router::new()
        .route("/health", get(health))
        .route("/ws/:session_id", get(ws_handler))
        .with_state(ws_state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(&config.server.cors_origins)),
        );

    let addr = config.server.socket_addr();
    tracing::info!(%addr, "storyloom listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health() -> &'static str {
    "ok"
}

/// Builds the text capability from configuration: a failover pair when a
/// distinct fallback provider is configured, a single provider otherwise.
fn build_text_generator(config: &AiConfig) -> Arc<dyn TextGenerator> {
    let openai = || {
        OpenAiTextGenerator::new(
            OpenAiConfig::new(config.openai_api_key.clone().unwrap_or_default())
                .with_model(config.openai_model.clone())
                .with_timeout(config.timeout()),
        )
    };
    let anthropic = || {
        AnthropicTextGenerator::new(
            AnthropicConfig::new(config.anthropic_api_key.clone().unwrap_or_default())
                .with_model(config.anthropic_model.clone())
                .with_timeout(config.timeout()),
        )
    };

    match (config.primary_provider, config.fallback_provider) {
        (AiProvider::OpenAI, Some(AiProvider::Anthropic)) => {
            Arc::new(FailoverTextGenerator::new(openai()).with_fallback(anthropic()))
        }
        (AiProvider::Anthropic, Some(AiProvider::OpenAI)) => {
            Arc::new(FailoverTextGenerator::new(anthropic()).with_fallback(openai()))
        }
        (AiProvider::OpenAI, _) => Arc::new(FailoverTextGenerator::new(openai())),
        (AiProvider::Anthropic, _) => Arc::new(FailoverTextGenerator::new(anthropic())),
    }
}

/// Builds the image capability, borrowing the OpenAI text key when no
/// dedicated image key is configured.
fn build_image_generator(config: &ImageConfig, ai: &AiConfig) -> Arc<dyn ImageGenerator> {
    let api_key = config
        .api_key
        .clone()
        .filter(|k| !k.is_empty())
        .or_else(|| ai.openai_api_key.clone())
        .unwrap_or_default();

    Arc::new(OpenAiImageGenerator::new(
        OpenAiImageConfig::new(api_key)
            .with_model(config.model.clone())
            .with_size(config.size.clone())
            .with_style_suffix(config.style_suffix.clone())
            .with_timeout(config.timeout()),
    ))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(parsed))
        .allow_methods(Any)
        .allow_headers(Any)
}
