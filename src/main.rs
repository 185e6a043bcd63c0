mod storage;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use stowage_config::StorageConfig;
use tokio::io::AsyncWriteExt;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::storage::open_storage;

/// Stowage - save, read, move and delete artifacts on disk or in object storage
#[derive(Parser)]
#[command(name = "stowage")]
#[command(version, about, long_about = None)]
struct Cli {
  /// Path to a JSON storage config. Takes precedence over the other backend flags
  #[arg(long, global = true)]
  config: Option<PathBuf>,

  /// Object storage connection string: scheme://endpoint:accessKey:secretKey:bucket
  #[arg(long, global = true, env = "STOWAGE_CONNECTION", hide_env_values = true)]
  connection: Option<String>,

  /// Public domain for objects in object storage
  #[arg(long, global = true, env = "STOWAGE_DOMAIN", default_value = "")]
  domain: String,

  /// Directory to store artifacts in (default: ~/.stowage/artifacts)
  #[arg(long, global = true)]
  dir: Option<PathBuf>,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Save an artifact from a file, or from stdin
  Save {
    name: String,

    /// File to read instead of stdin
    #[arg(long)]
    from: Option<PathBuf>,
  },

  /// Write an artifact to stdout
  Cat { name: String },

  /// Move an artifact to a new name
  Mv { src: String, dest: String },

  /// Delete an artifact
  Rm { name: String },
}

fn main() -> Result<()> {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
  tracing_subscriber::registry()
    .with(filter)
    .with(fmt::layer().with_writer(std::io::stderr))
    .init();

  let cli = Cli::parse();
  let config = storage_config(&cli)?;

  let rt = tokio::runtime::Runtime::new()?;
  rt.block_on(async { run(cli.command, config).await })
}

/// Pick the backend: `--config`, then `--connection`, then `--dir`, then the default directory.
fn storage_config(cli: &Cli) -> Result<StorageConfig> {
  if let Some(path) = &cli.config {
    return StorageConfig::load(path)
      .with_context(|| format!("failed to load storage config: {}", path.display()));
  }

  if let Some(connection) = &cli.connection {
    return Ok(StorageConfig::ObjectStorage {
      connection: connection.clone(),
      domain: cli.domain.clone(),
    });
  }

  let base_dir = match &cli.dir {
    Some(dir) => dir.clone(),
    None => dirs::home_dir()
      .context("could not determine home directory")?
      .join(".stowage")
      .join("artifacts"),
  };
  Ok(StorageConfig::Filesystem {
    base_dir: Some(base_dir),
  })
}

async fn run(command: Commands, config: StorageConfig) -> Result<()> {
  let storage = open_storage(&config)
    .await
    .context("failed to configure storage")?;

  match command {
    Commands::Save { name, from } => {
      let result = match &from {
        Some(path) => {
          let mut file = tokio::fs::File::open(path)
            .await
            .with_context(|| format!("failed to open input file: {}", path.display()))?;
          storage.save(&name, &mut file).await
        }
        None => storage.save(&name, &mut tokio::io::stdin()).await,
      };
      result.with_context(|| format!("failed to save {name}"))?;
      info!(name, "saved");
    }
    Commands::Cat { name } => {
      let mut reader = storage
        .get_file(&name)
        .await
        .with_context(|| format!("failed to open {name}"))?;
      let mut stdout = tokio::io::stdout();
      tokio::io::copy_buf(&mut reader, &mut stdout)
        .await
        .with_context(|| format!("failed to read {name}"))?;
      stdout.flush().await?;
    }
    Commands::Mv { src, dest } => {
      storage
        .move_object(&src, &dest)
        .await
        .with_context(|| format!("failed to move {src} to {dest}"))?;
      info!(src, dest, "moved");
    }
    Commands::Rm { name } => {
      storage
        .delete(&name)
        .await
        .with_context(|| format!("failed to delete {name}"))?;
      info!(name, "deleted");
    }
  }

  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  fn parse(args: &[&str]) -> Cli {
    Cli::try_parse_from(args).expect("arguments should parse")
  }

  #[test]
  fn test_dir_selects_filesystem() {
    let cli = parse(&["stowage", "--dir", "/tmp/store", "rm", "a.txt"]);
    assert_eq!(
      storage_config(&cli).unwrap(),
      StorageConfig::Filesystem {
        base_dir: Some(PathBuf::from("/tmp/store"))
      }
    );
  }

  #[test]
  fn test_connection_wins_over_dir() {
    let cli = parse(&[
      "stowage",
      "mv",
      "a",
      "b",
      "--dir",
      "/tmp/store",
      "--connection",
      "s3://host:ak:sk:bucket",
      "--domain",
      "cdn.example.com",
    ]);
    assert_eq!(
      storage_config(&cli).unwrap(),
      StorageConfig::ObjectStorage {
        connection: "s3://host:ak:sk:bucket".to_string(),
        domain: "cdn.example.com".to_string(),
      }
    );
  }

  #[test]
  fn test_missing_config_file_fails() {
    let cli = parse(&["stowage", "--config", "/no/such/storage.json", "cat", "x"]);
    let err = storage_config(&cli).unwrap_err();
    assert!(err.to_string().contains("failed to load storage config"));
  }

  #[test]
  fn test_save_reads_from_file_flag() {
    let cli = parse(&["stowage", "save", "a/b.txt", "--from", "input.bin"]);
    match cli.command {
      Commands::Save { name, from } => {
        assert_eq!(name, "a/b.txt");
        assert_eq!(from, Some(PathBuf::from("input.bin")));
      }
      _ => panic!("expected save"),
    }
  }
}
