//! Command line interface
//!
//! | Command | Description |
//! |---------|-------------|
//! | `list` | All services in evaluation order |
//! | `get <id>` | One service by numeric id |
//! | `find <url>` | Service matching a URL |
//! | `check <url> <principal>` | Access decision for a principal |
//! | `delete <id>` | Remove a service |
//! | `import <file>...` | Save JSON or YAML definitions |
//! | `persistent-id` | Compute a persistent id without touching the registry |
//!
//! Output is JSON on the provided writer.

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use serde_json::json;
use std::io::Write;
use std::path::{Path, PathBuf};
use svcreg_application::ports::ServicesManagerInterface;
use svcreg_domain::entities::{Principal, RegisteredService};
use svcreg_domain::PersistentIdGenerator;
use svcreg_domain::constants::INITIAL_IDENTIFIER_VALUE;
use svcreg_infrastructure::config::{AppConfig, ConfigLoader};
use svcreg_infrastructure::{AppContext, bootstrap};
use svcreg_providers::registry::ResourceFormat;

/// Command line interface for svcreg
#[derive(Parser, Debug)]
#[command(name = "svcreg")]
#[command(about = "Registry of services allowed to use the authentication server")]
#[command(version)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Registry operations
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// List every service in evaluation order
    List,

    /// Show one service
    Get {
        /// Numeric service id
        id: i64,
    },

    /// Show the service matching a URL
    Find {
        /// Service URL
        url: String,
    },

    /// Evaluate access for a principal
    Check {
        /// Service URL
        url: String,
        /// Principal id
        principal: String,
        /// Principal attribute as name=value (repeatable)
        #[arg(short, long = "attribute", value_parser = parse_attribute)]
        attributes: Vec<(String, String)>,
    },

    /// Delete a service
    Delete {
        /// Numeric service id
        id: i64,
    },

    /// Save service definitions from JSON or YAML files
    Import {
        /// Definition files
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Keep the ids found in the files instead of assigning new ones
        #[arg(long)]
        keep_ids: bool,
    },

    /// Compute a persistent id
    PersistentId {
        /// Principal id
        principal: String,
        /// Service identifier
        service: String,
        /// Salt; a random one is generated when blank
        #[arg(long, default_value = "")]
        salt: String,
    },
}

fn parse_attribute(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .filter(|(name, _)| !name.trim().is_empty())
        .map(|(name, value)| (name.trim().to_string(), value.to_string()))
        .ok_or_else(|| format!("expected name=value, got '{raw}'"))
}

fn format_for(path: &Path) -> anyhow::Result<ResourceFormat> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default();
    [ResourceFormat::Json, ResourceFormat::Yaml]
        .into_iter()
        .find(|format| format.accepts(extension))
        .with_context(|| format!("unsupported definition file {}", path.display()))
}

fn write_json(out: &mut impl Write, value: &impl serde::Serialize) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

impl Cli {
    /// Load the configuration named by `--config`, or the default search path
    pub fn load_config(&self) -> anyhow::Result<AppConfig> {
        let loader = match &self.config {
            Some(path) => ConfigLoader::new().with_config_path(path),
            None => ConfigLoader::new(),
        };
        Ok(loader.load()?)
    }

    /// Run the command, writing its output to `out`
    pub async fn execute(&self, mut config: AppConfig, out: &mut impl Write) -> anyhow::Result<()> {
        if let Command::PersistentId {
            principal,
            service,
            salt,
        } = &self.command
        {
            let generator = PersistentIdGenerator::new(salt.clone());
            let id = generator.generate(principal, service);
            return write_json(
                out,
                &json!({
                    "principal": principal,
                    "service": service,
                    "salt": generator.salt(),
                    "id": id,
                }),
            );
        }

        // One-shot commands never need the periodic refresh.
        config.manager.reload_interval_secs = 0;
        let ctx = bootstrap(config).await?;
        let outcome = self.run(&ctx, out).await;
        ctx.shutdown().await;
        outcome
    }

    async fn run(&self, ctx: &AppContext, out: &mut impl Write) -> anyhow::Result<()> {
        let manager = ctx.manager();
        match &self.command {
            Command::List => write_json(out, &manager.get_all_services()),
            Command::Get { id } => write_json(out, &ctx.require_service(*id).await?),
            Command::Find { url } => match manager.find_service_by(url).await? {
                Some(service) => write_json(out, &service),
                None => bail!("no registered service matches {url}"),
            },
            Command::Check {
                url,
                principal,
                attributes,
            } => {
                let principal = attributes
                    .iter()
                    .fold(Principal::new(principal), |p, (name, value)| {
                        p.with_attribute(name, value)
                    });
                let Some(decision) = ctx.evaluate(url, &principal).await? else {
                    bail!("no registered service matches {url}");
                };
                write_json(
                    out,
                    &json!({
                        "service": decision.service.name,
                        "id": decision.service.id,
                        "allowed": decision.allowed,
                        "username": decision.username,
                        "released": decision.released,
                        "multifactor_required": decision.multifactor_required,
                    }),
                )
            }
            Command::Delete { id } => match manager.delete(*id).await? {
                Some(service) => write_json(out, &json!({ "deleted": service.id, "name": service.name })),
                None => write_json(out, &json!({ "deleted": null })),
            },
            Command::Import { files, keep_ids } => {
                let mut saved = Vec::with_capacity(files.len());
                for path in files {
                    let body = std::fs::read_to_string(path)
                        .with_context(|| format!("failed to read {}", path.display()))?;
                    let mut service: RegisteredService = format_for(path)?
                        .deserialize(&body)
                        .with_context(|| format!("invalid definition in {}", path.display()))?;
                    if !keep_ids {
                        service.id = INITIAL_IDENTIFIER_VALUE;
                    }
                    let service = manager.save(service).await?;
                    saved.push(json!({ "id": service.id, "name": service.name }));
                }
                write_json(out, &saved)
            }
            Command::PersistentId { .. } => Ok(()),
        }
    }
}
