use axum::Router;
use tower_http::cors::CorsLayer;

use boardsmith_backend::config::Config;
use boardsmith_backend::retrieval::{EmbeddingClient, Retriever};
use boardsmith_backend::store::DesignStore;
use boardsmith_backend::{api, catalog, metrics};

/// Load the catalog and build the retrieval index. Returns None when the
/// catalog is unavailable; the server still boots and concept generation
/// answers 503.
async fn init_retriever(config: &Config) -> Option<Retriever> {
    let entries = match catalog::load(&config.catalog_path) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!(
                "catalog unavailable ({e}); concept generation will be disabled until a \
                 catalog is provided at {}",
                config.catalog_path.display()
            );
            return None;
        }
    };
    tracing::info!(
        "loaded {} catalog entries from {}",
        entries.len(),
        config.catalog_path.display()
    );

    let documents: Vec<String> = entries.iter().map(catalog::document).collect();
    let client = EmbeddingClient::new(
        &config.embeddings_api_base,
        &config.embeddings_model,
        &config.api_key,
    );
    match Retriever::build(client, documents, &config.index_path, config.retriever_top_k).await {
        Ok(retriever) => Some(retriever),
        Err(e) => {
            tracing::error!("failed to build the retrieval index: {e}");
            None
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let config = Config::load();
    metrics::register_metrics();

    let store = DesignStore::seeded();
    let retriever = init_retriever(&config).await;

    let port = config.port;
    let app = Router::new()
        .merge(api::router(store, retriever, config))
        .layer(CorsLayer::permissive())
        .layer(axum::middleware::from_fn(
            |req: axum::http::Request<axum::body::Body>, next: axum::middleware::Next| async move {
                let method = req.method().to_string();
                let endpoint = metrics::normalize_path(req.uri().path());
                let timer = std::time::Instant::now();
                let response = next.run(req).await;
                let status = response.status();
                metrics::API_REQUESTS_TOTAL
                    .with_label_values(&[method.as_str(), endpoint.as_str(), status.as_str()])
                    .inc();
                metrics::API_REQUEST_DURATION_SECONDS
                    .with_label_values(&[endpoint.as_str()])
                    .observe(timer.elapsed().as_secs_f64());
                response
            },
        ));

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port))
        .await
        .unwrap_or_else(|e| panic!("Failed to bind to port {port}: {e}"));

    tracing::info!("Boardsmith backend listening on port {port}");
    axum::serve(listener, app)
        .await
        .expect("Failed to start server");
}
