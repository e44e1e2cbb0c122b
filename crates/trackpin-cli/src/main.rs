//! Trackpin CLI: pin audio to IPFS with local fallback.
//!
//! Set PINATA_API_KEY and PINATA_SECRET_API_KEY (a `.env` file works).
//! Optional: COLLAB_BACKEND_URL for proxied pinning, LOCAL_STORE_PATH and
//! LOCAL_STORE_QUOTA_MB for the local fallback store.

use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;

use trackpin_cli::{content_type_for, init_tracing};
use trackpin_core::constants::SUPPORTED_AUDIO_TYPES;
use trackpin_core::{Config, ContentId, UploadRequest};
use trackpin_pinata::{DirectPinBackend, PinataClient, ProxyPinBackend, SimplePinBackend};
use trackpin_pinata::proxy::ProxyClient;
use trackpin_store::{ContentStore, LocalBlobStore, RemoteVerifier};
use trackpin_upload::{AudioValidator, UploadContext, UploadOrchestrator, WavProbe};

#[derive(Parser)]
#[command(name = "trackpin", about = "Pin audio tracks to IPFS with local fallback")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload an audio file through the backend chain
    Upload {
        /// Path to the audio file
        file: std::path::PathBuf,
        /// Display name (defaults to the file name without extension)
        #[arg(long)]
        name: Option<String>,
        /// Who the upload is attributed to
        #[arg(long, default_value = "anonymous")]
        attribution: String,
        /// Project to associate the track with
        #[arg(long)]
        project_id: Option<String>,
        /// Skip the remote backends and store locally only
        #[arg(long)]
        local_only: bool,
    },
    /// Fetch stored bytes by content id
    Get {
        /// Content id (IPFS hash or local-<uuid>)
        content_id: String,
        /// Output path
        #[arg(short, long)]
        output: std::path::PathBuf,
    },
    /// Check whether a pinned hash is reachable on the gateway
    Verify {
        /// IPFS hash
        hash: String,
    },
    /// Show the pin record for a hash, if the account holds one
    Status {
        /// IPFS hash
        hash: String,
    },
    /// Unpin a hash from the pinning service
    Unpin {
        /// IPFS hash
        hash: String,
    },
    /// Test the configured Pinata credentials
    AuthTest,
    /// Show pinned-data usage totals
    Stats,
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize response")?;
    println!("{}", out);
    Ok(())
}

/// Assemble the backend chain in priority order: proxy, direct, simple, local.
async fn build_backends(
    config: &Config,
    local_only: bool,
) -> anyhow::Result<(Vec<Arc<dyn ContentStore>>, Option<Arc<dyn RemoteVerifier>>)> {
    let local: Arc<dyn ContentStore> = Arc::new(
        LocalBlobStore::new(&config.local_store_path, config.local_store_quota_bytes)
            .await
            .context("Open local blob store")?,
    );

    if local_only {
        return Ok((vec![local], None));
    }

    config.validate()?;
    let client = Arc::new(PinataClient::new(config).context("Build Pinata client")?);
    let retry = config.retry_policy();

    let mut backends: Vec<Arc<dyn ContentStore>> = Vec::new();
    if let Some(proxy) = ProxyClient::from_config(config).context("Build proxy client")? {
        backends.push(Arc::new(ProxyPinBackend::new(proxy, client.clone(), retry.clone())));
    }
    backends.push(Arc::new(DirectPinBackend::new(client.clone(), retry.clone())));
    backends.push(Arc::new(SimplePinBackend::new(
        client.clone(),
        trackpin_core::RetryPolicy::none(),
    )));
    backends.push(local);

    let verifier: Arc<dyn RemoteVerifier> = client;
    Ok((backends, Some(verifier)))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;
    let cli = Cli::parse();

    match cli.command {
        Commands::Upload {
            file,
            name,
            attribution,
            project_id,
            local_only,
        } => {
            let bytes = std::fs::read(&file)
                .with_context(|| format!("Read {}", file.display()))?;
            let file_name = file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "upload".to_string());
            let content_type = content_type_for(&file);

            let mut request = UploadRequest::new(bytes, file_name, content_type, attribution);
            if let Some(name) = name {
                request = request.with_display_name(name);
            }
            if let Some(project_id) = project_id {
                request = request.with_project_id(project_id);
            }

            let (backends, verifier) = build_backends(&config, local_only).await?;
            let validator = AudioValidator::new(
                config.max_audio_size_bytes,
                SUPPORTED_AUDIO_TYPES.iter().map(|s| s.to_string()).collect(),
            );
            let probe = Arc::new(WavProbe::new(std::env::temp_dir(), config.probe_timeout));
            let orchestrator = UploadOrchestrator::new(validator, probe, backends, verifier);

            let outcome = orchestrator
                .upload(request, UploadContext::default())
                .await?;
            print_json(&outcome)?;
        }
        Commands::Get { content_id, output } => {
            let id: ContentId = content_id.parse()?;
            let (backends, _) = build_backends(&config, false).await?;
            let mut found = None;
            for backend in &backends {
                if let Some(bytes) = backend.get(&id).await? {
                    found = Some(bytes);
                    break;
                }
            }
            let bytes = found.with_context(|| format!("Content {} not found", id))?;
            let len = bytes.len();
            std::fs::write(&output, bytes)
                .with_context(|| format!("Write {}", output.display()))?;
            print_json(&serde_json::json!({
                "content_id": id.to_string(),
                "bytes": len,
                "output": output.display().to_string(),
            }))?;
        }
        Commands::Verify { hash } => {
            config.validate()?;
            let client = PinataClient::new(&config)?;
            let reachable = client.verify(&hash).await;
            print_json(&serde_json::json!({ "hash": hash, "reachable": reachable }))?;
        }
        Commands::Status { hash } => {
            config.validate()?;
            let client = PinataClient::new(&config)?;
            match client.pin_metadata(&hash).await? {
                Some(record) => print_json(&record)?,
                None => print_json(&serde_json::json!({ "hash": hash, "pinned": false }))?,
            }
        }
        Commands::Unpin { hash } => {
            config.validate()?;
            let client = PinataClient::new(&config)?;
            client.unpin(&hash).await?;
            print_json(&serde_json::json!({ "success": true, "hash": hash }))?;
        }
        Commands::AuthTest => {
            config.validate()?;
            let client = PinataClient::new(&config)?;
            client.test_authentication().await?;
            print_json(&serde_json::json!({ "authenticated": true }))?;
        }
        Commands::Stats => {
            config.validate()?;
            let client = PinataClient::new(&config)?;
            let stats = client.usage_stats().await?;
            print_json(&stats)?;
        }
    }

    Ok(())
}
