use std::io::Read;
use std::path::Path;

use anyhow::Context;
use colored::Colorize;
use docl_service::{DocumentContract, HistoryEntry, ServiceConfig, StaticIdentity};
use serde_json::json;
use tracing::debug;

use crate::cli::*;

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(&cli)?;
    let contract = DocumentContract::open(&config).context("failed to open document store")?;
    debug!(data_dir = %config.data_dir.display(), "contract ready");

    match cli.command {
        Command::Upload(args) => {
            let identity = identity(&cli.identity, &config);
            cmd_upload(&contract, &identity, args, &cli.format).await
        }
        Command::View(args) => cmd_view(&contract, args, &cli.format).await,
        Command::History(args) => cmd_history(&contract, args, &cli.format),
        Command::Verify(args) => cmd_verify(&contract, args, &cli.format),
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<ServiceConfig> {
    let mut config = match &cli.config {
        Some(path) => ServiceConfig::load(path)?,
        None => ServiceConfig::default(),
    };
    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }
    Ok(config)
}

fn identity(args: &IdentityArgs, config: &ServiceConfig) -> StaticIdentity {
    let identity = StaticIdentity::new(&args.org, &args.caller);
    match &args.role {
        Some(role) => identity.with_attribute(&config.gate.role_attribute, role),
        None => identity,
    }
}

fn read_content(args: &UploadArgs) -> anyhow::Result<Vec<u8>> {
    if let Some(text) = &args.text {
        return Ok(text.as_bytes().to_vec());
    }
    match args.path.as_deref() {
        Some(path) if path != Path::new("-") => {
            std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))
        }
        _ => {
            let mut buf = Vec::new();
            std::io::stdin()
                .read_to_end(&mut buf)
                .context("failed to read stdin")?;
            Ok(buf)
        }
    }
}

async fn cmd_upload(
    contract: &DocumentContract,
    identity: &StaticIdentity,
    args: UploadArgs,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    let content = read_content(&args)?;
    let size = content.len();
    let cid = contract.upload_document(identity, content).await?;

    match format {
        OutputFormat::Json => println!("{}", json!({ "cid": cid, "size": size })),
        OutputFormat::Text => {
            println!("{} Document stored", "✓".green().bold());
            println!("  CID: {}", cid.as_str().yellow());
            println!("  Size: {size} bytes");
        }
    }
    Ok(())
}

async fn cmd_view(contract: &DocumentContract, args: ViewArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let view = contract.view_document(&args.cid).await?;

    if let Some(path) = &args.output {
        std::fs::write(path, &view.content)
            .with_context(|| format!("failed to write {}", path.display()))?;
    }

    match format {
        OutputFormat::Json => {
            let mut out = json!({ "metadata": &view.metadata, "size": view.content.len() });
            if args.output.is_none() {
                out["content"] = json!(view.text());
            }
            println!("{out}");
        }
        OutputFormat::Text => {
            let meta = &view.metadata;
            println!("Document {}", meta.cid.as_str().yellow().bold());
            println!("  Author: {} ({})", meta.author.bold(), meta.organization);
            println!("  Created: {}", meta.timestamp);
            println!("  Size: {} bytes", view.content.len());
            match (&args.output, view.text()) {
                (Some(path), _) => println!("  Written to {}", path.display()),
                (None, Some(text)) => println!("\n{text}"),
                (None, None) => println!("  {}", "(binary content, use --output)".dimmed()),
            }
        }
    }
    Ok(())
}

fn history_json(entry: &HistoryEntry) -> serde_json::Value {
    json!({
        "tx_id": entry.tx_id.as_str(),
        "timestamp": entry.timestamp.to_rfc3339(),
        "data": entry.data,
    })
}

fn cmd_history(contract: &DocumentContract, args: HistoryArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let history = contract.get_document_history(&args.cid)?;

    match format {
        OutputFormat::Json => {
            let entries: Vec<_> = history.iter().map(history_json).collect();
            println!("{}", serde_json::Value::Array(entries));
        }
        OutputFormat::Text if history.is_empty() => {
            println!("No history for {}", args.cid.as_str().yellow());
        }
        OutputFormat::Text => {
            println!("History of {} ({} revisions)", args.cid.as_str().yellow().bold(), history.len());
            for entry in &history {
                println!(
                    "  {}  {}  {} @ {}",
                    entry.timestamp.to_rfc3339().dimmed(),
                    entry.tx_id.as_str().cyan(),
                    entry.data.author.bold(),
                    entry.data.organization
                );
            }
        }
    }
    Ok(())
}

fn cmd_verify(contract: &DocumentContract, args: VerifyArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let count = contract.verify_document_history(&args.cid)?;

    match format {
        OutputFormat::Json => println!("{}", json!({ "cid": args.cid, "revisions": count, "valid": true })),
        OutputFormat::Text => {
            println!("{} Revision chain verified", "✓".green().bold());
            println!("  CID: {}", args.cid.as_str().yellow());
            println!("  Revisions: {}", count.to_string().bold());
        }
    }
    Ok(())
}
