//! passvault server - HTTP API over sealed credential storage
//!
//! The encryption key is read once at startup from the configured source
//! (environment variable or OS keychain). A missing or malformed key stops
//! the process before it serves any request.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

use vault_core::{
    rotate_key, CredentialService, EncryptionKey, FileCredentialStore, KeyProvider, KeySource,
    KeychainKeyProvider, StaticKeyProvider, VaultConfig,
};
use vault_server::VaultServer;

/// passvault - website password manager backend
#[derive(Parser, Debug)]
#[command(name = "vault-server")]
#[command(version)]
#[command(about = "passvault - sealed password storage behind a small HTTP API")]
struct Args {
    /// Path to a JSON config file
    #[arg(long, env = "PASSVAULT_CONFIG")]
    config: Option<PathBuf>,

    /// Directory holding credentials.json
    #[arg(long, env = "PASSVAULT_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Key source: env or keychain
    #[arg(long, env = "PASSVAULT_KEY_SOURCE")]
    key_source: Option<String>,

    /// Environment variable holding the encoded encryption key
    #[arg(long)]
    key_env: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the HTTP API (default)
    Serve {
        /// Address to bind, e.g. 127.0.0.1:3000
        #[arg(long, env = "PASSVAULT_BIND")]
        bind: Option<String>,
    },
    /// Generate a new key and print it, or store it in the OS keychain
    GenerateKey {
        /// Keychain account to store the key under instead of printing it
        #[arg(long)]
        keychain_account: Option<String>,
    },
    /// Re-seal every stored password under a new key
    RotateKey {
        /// Environment variable holding the new encoded key
        #[arg(long)]
        new_key_env: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            return Err(e.into());
        }
    };

    match args.command.unwrap_or(Command::Serve { bind: None }) {
        Command::GenerateKey { keychain_account } => generate(keychain_account.as_deref()),
        Command::Serve { bind } => serve(config, bind).await,
        Command::RotateKey { new_key_env } => rotate(config, &new_key_env).await,
    }
}

fn load_config(args: &Args) -> vault_core::Result<VaultConfig> {
    let mut config = match &args.config {
        Some(path) => VaultConfig::load(path)?,
        None => VaultConfig::default(),
    };

    if let Some(dir) = &args.data_dir {
        config.data_dir = Some(dir.clone());
    }
    if let Some(source) = &args.key_source {
        config.key_source = source.parse::<KeySource>()?;
    }
    if let Some(var) = &args.key_env {
        config.key_env = var.clone();
    }

    Ok(config)
}

fn generate(keychain_account: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let key = EncryptionKey::generate();

    match keychain_account {
        Some(account) => {
            KeychainKeyProvider::store(account, &key).map_err(|e| {
                error!("Cannot store key in keychain: {}", e);
                e
            })?;
            info!(
                "Stored new key under keychain account '{}'. Start with --key-source keychain.",
                account
            );
        }
        None => println!("{}", key.to_base64().as_str()),
    }
    Ok(())
}

async fn serve(
    mut config: VaultConfig,
    bind: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(bind) = bind {
        config.bind_address = bind;
    }

    // Fatal: no key, no service
    let keys = config.key_provider().map_err(|e| {
        error!("Refusing to start: {}", e);
        e
    })?;
    info!("Encryption key source: {}", keys.source());

    let store = FileCredentialStore::open(config.data_dir()?).await?;
    info!("Credential storage at {:?}", store.storage_dir());

    let service = CredentialService::new(Arc::new(store), keys);
    VaultServer::new(service, config.bind_address).run().await
}

async fn rotate(config: VaultConfig, new_key_env: &str) -> Result<(), Box<dyn std::error::Error>> {
    let old = config.key_provider().map_err(|e| {
        error!("Cannot load current key: {}", e);
        e
    })?;
    let new = StaticKeyProvider::from_env(new_key_env).map_err(|e| {
        error!("Cannot load new key: {}", e);
        e
    })?;

    let store = FileCredentialStore::open(config.data_dir()?).await?;
    let report = rotate_key(&store, old.get_key()?, new.get_key()?).await?;

    info!(
        "Rotation finished: {} re-sealed, {} already current. Switch the key source to {} before restarting.",
        report.resealed, report.already_current, new_key_env
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_key_prints_by_default() {
        let args = Args::try_parse_from(["vault-server", "generate-key"]).unwrap();
        assert!(matches!(
            args.command,
            Some(Command::GenerateKey {
                keychain_account: None
            })
        ));
    }

    #[test]
    fn test_generate_key_keychain_account() {
        let args =
            Args::try_parse_from(["vault-server", "generate-key", "--keychain-account", "prod"])
                .unwrap();
        match args.command {
            Some(Command::GenerateKey { keychain_account }) => {
                assert_eq!(keychain_account.as_deref(), Some("prod"));
            }
            other => panic!("unexpected command: {:?}", other),
        }

        assert!(
            Args::try_parse_from(["vault-server", "generate-key", "--keychain-account"]).is_err()
        );
    }

    #[test]
    fn test_global_flags_override_config() {
        let args = Args::try_parse_from([
            "vault-server",
            "--key-source",
            "keychain",
            "--key-env",
            "OTHER_KEY",
            "serve",
        ])
        .unwrap();
        let config = load_config(&args).unwrap();
        assert_eq!(config.key_source, KeySource::Keychain);
        assert_eq!(config.key_env, "OTHER_KEY");

        let bad = Args::try_parse_from(["vault-server", "--key-source", "vault"]).unwrap();
        assert!(load_config(&bad).is_err());
    }
}
