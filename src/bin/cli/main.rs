use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use futures::StreamExt;
use object_storage_client::{
    app::{parse_ip_list, ALLOWED_PRIVATE_IP_ADDRESSES_ENV},
    AppBuilder, CannedAcl, EgressPolicy, ObjectKey, ObjectStorageClient, StorageBackend,
    StorageConfig, StorageConfigResolver, StorageSettings, UploadDescriptor,
};
use serde_json::json;
use std::path::PathBuf;
use tokio::io::AsyncWriteExt;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "object-storage-cli")]
#[command(about = "Work with the configured S3-compatible bucket", long_about = None)]
struct Cli {
    #[command(flatten)]
    storage: StorageSettings,

    /// Storage backend: s3 or memory
    #[arg(long, env = "STORAGE_BACKEND", default_value = "s3")]
    backend: StorageBackend,

    /// Comma separated private addresses that remote imports may reach
    #[arg(long = "allow-private-ips", env = "ALLOWED_PRIVATE_IP_ADDRESSES")]
    allowed_private_ips: Option<String>,

    /// Log level
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the resolved storage configuration
    Config,

    /// Issue a fresh object key
    Key {
        /// File label, the last key segment
        label: String,
        /// Owner id, the second key segment
        #[arg(short, long)]
        owner: String,
        #[arg(short, long, default_value = "uploads")]
        namespace: String,
    },

    /// Upload a local file
    Put {
        /// File path to upload
        file: PathBuf,
        /// Object key
        key: String,
        #[arg(long, default_value = "application/octet-stream")]
        content_type: String,
        #[arg(long, default_value = "private")]
        acl: CannedAcl,
    },

    /// Download an object
    Get {
        /// Object key
        key: String,
        /// Output file path, stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Delete an object
    Delete {
        /// Object key
        key: String,
    },

    /// Print a signed download URL
    Sign {
        /// Object key
        key: String,
        /// Validity in seconds
        #[arg(long, default_value_t = 60)]
        expires_in: u64,
    },

    /// Print a presigned browser upload form as JSON
    Presign {
        /// Object key
        key: String,
        /// Largest accepted upload in bytes
        #[arg(long)]
        max_size: u64,
        /// Required content type prefix
        #[arg(long)]
        content_type_prefix: Option<String>,
        #[arg(long, default_value = "private")]
        acl: CannedAcl,
    },

    /// Copy a remote URL into the bucket
    Import {
        /// Source URL
        url: String,
        /// Object key
        key: String,
        #[arg(long, default_value = "private")]
        acl: CannedAcl,
    },
}

impl Cli {
    fn init_logging(&self) -> Result<()> {
        let env_filter = EnvFilter::try_new(self.log_level.to_lowercase())
            .with_context(|| format!("Invalid log level: {}", self.log_level))?;

        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()
            .context("Failed to initialize logging")?;

        Ok(())
    }

    fn egress_policy(&self) -> Result<EgressPolicy> {
        let policy = match &self.allowed_private_ips {
            Some(value) => EgressPolicy::new().allow(
                parse_ip_list(ALLOWED_PRIVATE_IP_ADDRESSES_ENV, value)
                    .context("Invalid private address allow list")?,
            ),
            None => EgressPolicy::new(),
        };
        Ok(policy)
    }

    fn build_client(&self, config: StorageConfig) -> Result<ObjectStorageClient> {
        AppBuilder::new()
            .with_config(config)
            .with_backend(self.backend)
            .with_egress_policy(self.egress_policy()?)
            .build()
            .context("Failed to build storage client")
    }
}

fn parse_key(key: &str) -> Result<ObjectKey> {
    ObjectKey::new(key).with_context(|| format!("Invalid object key: {}", key))
}

fn describe_config(config: &StorageConfig) -> serde_json::Value {
    json!({
        "bucket": config.bucket().as_str(),
        "region": config.region(),
        "service": config.service(),
        "provider": config.provider(),
        "addressing_style": config.addressing_style(),
        "force_path_style": config.force_path_style(),
        "internal_endpoint": config.internal_endpoint().as_str(),
        "public_endpoint": config.public_endpoint().as_str(),
        "internal_bucket_url": config.internal_bucket_url().as_str(),
        "public_bucket_endpoint": config.public_bucket_endpoint(),
        "has_credentials": config.credentials().is_some(),
    })
}

async fn run(cli: Cli) -> Result<()> {
    let config = StorageConfigResolver::resolve(&cli.storage)
        .context("Failed to resolve storage configuration")?;

    let client = cli.build_client(config)?;

    match cli.command {
        Commands::Config => {
            let described = describe_config(client.config());
            println!("{}", serde_json::to_string_pretty(&described)?);
        }
        Commands::Key {
            label,
            owner,
            namespace,
        } => {
            let key = client.issue_key(&namespace, owner, &label)?;
            println!("{}", key);
        }
        Commands::Put {
            file,
            key,
            content_type,
            acl,
        } => {
            let key = parse_key(&key)?;
            let body = tokio::fs::read(&file)
                .await
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let url = client
                .upload(UploadDescriptor::new(key, acl, content_type, body))
                .await
                .context("Upload failed")?;
            println!("{}", url);
        }
        Commands::Get { key, output } => {
            let key = parse_key(&key)?;
            let mut stream = client
                .get_object_stream(&key)
                .await
                .with_context(|| format!("Could not read {}", key))?;

            let mut writer: Box<dyn tokio::io::AsyncWrite + Unpin> = match &output {
                Some(path) => Box::new(
                    tokio::fs::File::create(path)
                        .await
                        .with_context(|| format!("Failed to create {}", path.display()))?,
                ),
                None => Box::new(tokio::io::stdout()),
            };

            let mut written = 0usize;
            while let Some(chunk) = stream.next().await {
                let chunk = chunk.context("Download interrupted")?;
                written += chunk.len();
                writer.write_all(&chunk).await?;
            }
            writer.flush().await?;
            info!(key = %key, bytes = written, "Downloaded object");
        }
        Commands::Delete { key } => {
            let key = parse_key(&key)?;
            client.delete(&key).await.context("Delete failed")?;
        }
        Commands::Sign { key, expires_in } => {
            let key = parse_key(&key)?;
            let url = client
                .get_signed_url_with_expiry(&key, expires_in)
                .context("Signing failed")?;
            println!("{}", url);
        }
        Commands::Presign {
            key,
            max_size,
            content_type_prefix,
            acl,
        } => {
            let key = parse_key(&key)?;
            let post = client
                .create_presigned_upload(&key, acl, max_size, content_type_prefix.as_deref())
                .context("Presigning failed")?;
            println!("{}", serde_json::to_string_pretty(&post)?);
        }
        Commands::Import { url, key, acl } => {
            let key = parse_key(&key)?;
            let public_url = client
                .upload_from_remote_url(&url, &key, acl)
                .await
                .with_context(|| format!("Import of {} failed or was skipped", url))?;
            println!("{}", public_url);
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    cli.init_logging()?;

    run(cli).await
}
