use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::{Parser, Subcommand};
use client_core::{
    display_address, load_settings, AudioUpload, ClientError, ContentStorage, DraftInput,
    FixedIndex, GalleryFilter, LighthouseClient, MissingContentStorage, MoodZooClient,
    RandomSource, ThreadRandom, WalletCollaborator,
};
use shared::{
    domain::{emotion_emoji, ContentId, EmotionTag, Intensity},
    protocol::{ConnectionState, MintCall, WalletResponse},
};
use storage::SqliteStore;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "moodzoo", about = "Turn a sound and a mood into a creature NFT")]
struct Cli {
    /// Config file; defaults to ./moodzoo.toml when present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Fixed creature index instead of a random pick.
    #[arg(long, global = true)]
    pick: Option<usize>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate and store a new draft.
    Submit {
        audio: PathBuf,
        #[arg(long)]
        emotion: Option<EmotionTag>,
        #[arg(long)]
        custom: Option<String>,
        #[arg(long)]
        description: String,
    },
    Preview,
    /// Upload the draft's audio and metadata with the last previewed creature.
    Finalize,
    /// Without `--response`, prints the call a wallet would be asked to sign.
    Mint {
        /// JSON reply produced by the wallet for the printed call.
        #[arg(long, requires = "account")]
        response: Option<PathBuf>,
        /// Wallet address that signed `--response`.
        #[arg(long, requires = "response")]
        account: Option<String>,
    },
    Gallery {
        #[arg(long)]
        emotion: Option<EmotionTag>,
        #[arg(long)]
        creature: Option<String>,
        #[arg(long)]
        query: Option<String>,
    },
    Like {
        content_id: String,
    },
    Showcase {
        id: Option<String>,
    },
}

/// Replays a reply the user obtained from their wallet extension.
struct RecordedWallet {
    account: String,
    response: WalletResponse,
}

#[async_trait]
impl WalletCollaborator for RecordedWallet {
    fn connection_state(&self) -> ConnectionState {
        ConnectionState::Connected
    }

    fn account_address(&self) -> Option<String> {
        Some(self.account.clone())
    }

    async fn sign_and_submit(&self, _call: MintCall) -> Result<WalletResponse> {
        Ok(self.response.clone())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = load_settings(cli.config.as_deref());
    tracing_subscriber::fmt()
        .with_env_filter(settings.log_filter.as_str())
        .init();

    let store = SqliteStore::new(&settings.database_url)
        .await
        .with_context(|| format!("failed to open local store at {}", settings.database_url))?;
    let storage: Arc<dyn ContentStorage> = if settings.lighthouse_api_key.is_some() {
        Arc::new(LighthouseClient::from_settings(&settings)?)
    } else {
        warn!("no lighthouse api key configured; uploads will fail");
        Arc::new(MissingContentStorage)
    };
    let random: Arc<dyn RandomSource> = match cli.pick {
        Some(index) => Arc::new(FixedIndex(index)),
        None => Arc::new(ThreadRandom),
    };
    let client = MoodZooClient::new_with_dependencies(
        Arc::new(store),
        storage,
        random,
        settings.gateway_url.clone(),
    );

    if let Err(error) = run(&client, cli.command).await {
        match error.downcast_ref::<ClientError>() {
            Some(ClientError::Validation(errors)) => {
                for (field, message) in errors.iter() {
                    eprintln!("{field}: {message}");
                }
                std::process::exit(2);
            }
            Some(client_error) => {
                eprintln!("{}", client_error.to_user_facing());
                std::process::exit(1);
            }
            None => return Err(error),
        }
    }
    Ok(())
}

async fn run(client: &MoodZooClient, command: Command) -> Result<()> {
    match command {
        Command::Submit {
            audio,
            emotion,
            custom,
            description,
        } => {
            let upload = read_audio(&audio).await?;
            let draft = client
                .submit(DraftInput {
                    audio: Some(upload),
                    emotion,
                    custom_emotion: custom,
                    description,
                })
                .await?;
            let intensity = Intensity::calculate(&draft.description, draft.emotion);
            println!(
                "draft saved: {} {} intensity={}% ({})",
                emotion_emoji(draft.emotion),
                draft.emotion_label(),
                intensity.percent,
                intensity.level
            );
        }
        Command::Preview => {
            let preview = client.preview().await?;
            println!("{} {}", preview.creature_emoji, preview.creature_caption);
        }
        Command::Finalize => {
            let submission = client.finalize_previewed().await?;
            println!(
                "finalized {} {} content_id={}",
                submission.creature_emoji, submission.display_name, submission.storage_content_id
            );
        }
        Command::Mint { response, account } => match (response, account) {
            (Some(path), Some(account)) => {
                let raw = tokio::fs::read_to_string(&path)
                    .await
                    .with_context(|| format!("failed to read wallet reply {}", path.display()))?;
                let response: WalletResponse = serde_json::from_str(&raw)
                    .with_context(|| format!("wallet reply {} is not JSON", path.display()))?;
                info!(account = %display_address(&account), "minting with recorded wallet reply");
                let receipt = client
                    .mint(&RecordedWallet { account, response })
                    .await?;
                println!("minted: transaction_id={}", receipt.transaction_id);
            }
            _ => {
                let call = client.prepared_mint_call().await?;
                println!(
                    "Prepared mint call payload: {}",
                    serde_json::to_string(&call)?
                );
            }
        },
        Command::Gallery {
            emotion,
            creature,
            query,
        } => {
            let filter = GalleryFilter {
                emotion,
                creature,
                query,
            };
            for entry in client.gallery(Some(&filter)).await? {
                let submission = &entry.submission;
                println!(
                    "{} {} [{} {}] likes={} {} id={}",
                    submission.creature_emoji,
                    submission.display_name,
                    submission.emotion.emoji(),
                    submission.emotion_label(),
                    entry.likes,
                    submission.created_at.format("%Y-%m-%d %H:%M"),
                    submission.storage_content_id
                );
            }
        }
        Command::Like { content_id } => {
            match client.like(&ContentId::new(content_id.clone())).await? {
                Some(likes) => println!("{content_id}: {likes} likes"),
                None => println!("{content_id}: not in the gallery"),
            }
        }
        Command::Showcase { id: None } => {
            for entry in client.showcase().entries() {
                println!(
                    "#{} {} {} {} likes={} {}",
                    entry.id,
                    entry.animal,
                    entry.name,
                    entry.emotion_emoji(),
                    entry.likes,
                    entry.price.as_deref().unwrap_or("-")
                );
            }
        }
        Command::Showcase { id: Some(id) } => {
            client.showcase().select(&id).await?;
            let detail = client.showcase().detail(&id).await?;
            println!("{}", serde_json::to_string_pretty(&detail)?);
        }
    }
    Ok(())
}

async fn read_audio(path: &Path) -> Result<AudioUpload> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read audio file {}", path.display()))?;
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("audio.bin")
        .to_string();
    let mime_type = mime_guess::from_path(path)
        .first_raw()
        .unwrap_or("application/octet-stream")
        .to_string();
    Ok(AudioUpload {
        file_name,
        mime_type,
        bytes,
    })
}
