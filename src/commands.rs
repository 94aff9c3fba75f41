use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::database::Database;
use crate::embeddings::OllamaClient;
use crate::retrieval::{RetrievalError, RetrievalService, SearchQuery};
use crate::server::{self, AppState, SearchDefaults};

/// Build the retrieval service for `config` and index its seed documents
#[inline]
pub async fn build_retrieval_service(config: &Config) -> Result<RetrievalService> {
    let client = OllamaClient::new(&config.ollama).context("Failed to create Ollama client")?;

    let service = RetrievalService::new(Arc::new(client))
        .with_timeout(Duration::from_secs(config.search.timeout_secs));

    service
        .seed(&config.search.seed_documents)
        .await
        .context("Failed to index seed documents")?;

    Ok(service)
}

async fn check_ollama(config: &Config) {
    let client = match OllamaClient::new(&config.ollama) {
        Ok(client) => client.with_retry_attempts(1),
        Err(e) => {
            error!("❌ Invalid Ollama configuration: {:#}", e);
            return;
        }
    };

    let model = client.model().to_string();
    match tokio::task::spawn_blocking(move || client.health_check()).await {
        Ok(Ok(())) => info!(
            "✅ Ollama connected at {}:{} with model {}",
            config.ollama.host, config.ollama.port, model
        ),
        Ok(Err(e)) => warn!("⚠️  Ollama is reachable but unhealthy: {:#}", e),
        Err(e) => warn!("⚠️  Ollama health check did not complete: {}", e),
    }
}

/// Start the HTTP API
#[inline]
pub async fn serve(config_dir: &Path, host: Option<String>, port: Option<u16>) -> Result<()> {
    let mut config = Config::load(config_dir).context("Failed to load configuration")?;
    if let Some(host) = host {
        config.server.set_host(host)?;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    check_ollama(&config).await;

    let database = Database::initialize_from_config_dir(config.get_base_dir())
        .await
        .context("Failed to initialize SQLite database")?;

    println!(
        "📚 Indexing {} seed documents...",
        config.search.seed_documents.len()
    );
    let retrieval = build_retrieval_service(&config).await?;

    let state = AppState {
        retrieval: Arc::new(retrieval),
        database,
        defaults: SearchDefaults::from(&config.search),
    };

    let address = config.server.bind_address();
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;

    println!("🌐 Serving on http://{}", listener.local_addr()?);
    server::serve(listener, state).await
}

/// Run one query against the seed corpus and print the hits
#[inline]
pub async fn search_once(
    config_dir: &Path,
    text: String,
    top_k: Option<usize>,
    threshold: Option<f32>,
) -> Result<()> {
    let config = Config::load(config_dir).context("Failed to load configuration")?;
    let service = build_retrieval_service(&config).await?;

    let query = SearchQuery {
        text,
        top_k: top_k.unwrap_or(config.search.default_top_k),
        threshold: threshold.unwrap_or(config.search.default_threshold),
    };

    match service.search(&query).await {
        Ok(hits) => {
            println!("🔍 {} results for \"{}\"", hits.len(), query.text);
            for (rank, hit) in hits.iter().enumerate() {
                println!("{:>3}. [{:.4}] {}", rank + 1, hit.distance, hit.document);
            }
            Ok(())
        }
        Err(RetrievalError::NotFound) => {
            println!(
                "No documents within distance {} of \"{}\" among the {} nearest.",
                query.threshold, query.text, query.top_k
            );
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

/// Print request counts for one user or for everyone
#[inline]
pub async fn show_usage(config_dir: &Path, user_id: Option<String>) -> Result<()> {
    let database = Database::initialize_from_config_dir(config_dir)
        .await
        .context("Failed to initialize SQLite database")?;

    let rows = match user_id {
        Some(user_id) => match database.get_usage(&user_id).await? {
            Some(usage) => vec![usage],
            None => {
                println!("No requests recorded for user {}", user_id);
                return Ok(());
            }
        },
        None => database.list_usage().await?,
    };

    if rows.is_empty() {
        println!("No requests recorded yet.");
        return Ok(());
    }

    println!("{:<24} {:>10}  {}", "USER", "REQUESTS", "LAST REQUEST");
    for usage in rows {
        println!(
            "{:<24} {:>10}  {}",
            usage.user_id,
            usage.request_count,
            usage.last_request_at.format("%Y-%m-%d %H:%M:%S")
        );
    }

    Ok(())
}

/// Show connectivity of the embedding model and the usage database
#[inline]
pub async fn show_status(config_dir: &Path) -> Result<()> {
    let config = Config::load(config_dir).unwrap_or_else(|e| {
        warn!("Falling back to default configuration: {:#}", e);
        Config {
            base_dir: config_dir.to_path_buf(),
            ..Config::default()
        }
    });

    println!("📊 semsearch Status Report");
    println!("{}", "=".repeat(50));
    println!();

    println!("🗄️  Database Status:");
    match Database::initialize_from_config_dir(config.get_base_dir()).await {
        Ok(db) => {
            println!("   ✅ SQLite: Connected ({})", config.database_path().display());
            match db.list_usage().await {
                Ok(rows) => println!("   👤 Tracked users: {}", rows.len()),
                Err(e) => println!("   ⚠️  Could not read usage table - {:#}", e),
            }
        }
        Err(e) => println!("   ❌ SQLite: Failed to connect - {:#}", e),
    }
    println!();

    println!("🤖 Ollama Status:");
    match OllamaClient::new(&config.ollama) {
        Ok(client) => {
            let client = client.with_retry_attempts(1);
            let model = client.model().to_string();
            let probe = tokio::task::spawn_blocking(move || {
                client.health_check()?;
                client.list_models()
            });
            match probe.await {
                Ok(Ok(models)) => {
                    println!(
                        "   ✅ Ollama: Connected ({}:{})",
                        config.ollama.host, config.ollama.port
                    );
                    println!("   📋 Model: {}", model);
                    println!("   🔢 Dimension: {}", config.ollama.embedding_dimension);
                    println!("   📦 Models available: {}", models.len());
                }
                Ok(Err(e)) => println!("   ⚠️  Ollama: Unhealthy - {:#}", e),
                Err(e) => println!("   ❌ Ollama: Health check aborted - {}", e),
            }
        }
        Err(e) => println!("   ❌ Ollama: Invalid configuration - {:#}", e),
    }
    println!();

    println!("🔍 Search Settings:");
    println!("   Listen address: {}", config.server.bind_address());
    println!("   Seed documents: {}", config.search.seed_documents.len());
    println!(
        "   Defaults: top_k={} threshold={}",
        config.search.default_top_k, config.search.default_threshold
    );

    Ok(())
}
