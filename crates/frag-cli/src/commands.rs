use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use colored::Colorize;
use frag_store::{FragmentStore, StoreConfig, StoreError};
use frag_types::{Fragment, FragmentId, OwnerId};
use tracing::debug;

use crate::cli::*;

const DEFAULT_DATA_DIR: &str = ".fragments";

struct Session {
    store: FragmentStore,
    user: Option<String>,
    format: OutputFormat,
}

impl Session {
    fn owner(&self) -> anyhow::Result<OwnerId> {
        resolve_owner(self.user.as_deref())
    }

    fn json(&self) -> bool {
        matches!(self.format, OutputFormat::Json)
    }
}

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(cli.config.as_deref(), cli.data_dir)?;
    let store = FragmentStore::from_config(&config)?;
    debug!(store = ?store, "store opened");
    let session = Session {
        store,
        user: cli.user,
        format: cli.format,
    };

    match cli.command {
        Command::Create(args) => cmd_create(&session, args),
        Command::Update(args) => cmd_update(&session, args),
        Command::Get(args) => cmd_get(&session, args),
        Command::Info(args) => cmd_info(&session, args),
        Command::List(args) => cmd_list(&session, args),
        Command::Rm(args) => cmd_rm(&session, args),
        Command::Types(_) => cmd_types(&session),
    }
}

fn load_config(path: Option<&Path>, data_dir: Option<PathBuf>) -> anyhow::Result<StoreConfig> {
    let config = match path {
        Some(path) => StoreConfig::load(path)?,
        None => StoreConfig::default().with_data_dir(DEFAULT_DATA_DIR),
    };
    Ok(match data_dir {
        Some(dir) => config.with_data_dir(dir),
        None => config,
    })
}

fn resolve_owner(user: Option<&str>) -> anyhow::Result<OwnerId> {
    let name = match user {
        Some(name) => name.to_string(),
        None => std::env::var("USER").context("no --user given and $USER is not set")?,
    };
    let name = name.trim();
    if name.is_empty() {
        bail!("user name is empty");
    }
    Ok(OwnerId::from_username(name))
}

/// Split `id.ext` at the last dot. A bare id has no extension.
fn split_target(target: &str) -> (&str, Option<&str>) {
    match target.rsplit_once('.') {
        Some((id, ext)) if !id.is_empty() && !ext.is_empty() => (id, Some(ext)),
        _ => (target, None),
    }
}

fn read_input(input: &str) -> anyhow::Result<Vec<u8>> {
    if input == "-" {
        let mut data = Vec::new();
        io::stdin().read_to_end(&mut data).context("reading stdin")?;
        return Ok(data);
    }
    fs::read(input).with_context(|| format!("reading {input}"))
}

fn write_output(output: Option<&Path>, data: &[u8]) -> anyhow::Result<()> {
    match output {
        Some(path) => fs::write(path, data).with_context(|| format!("writing {}", path.display())),
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(data)?;
            stdout.flush()?;
            Ok(())
        }
    }
}

fn print_fragment(fragment: &Fragment) {
    println!("{}  {}", "id".bold(), fragment.id.to_string().yellow());
    println!("  Type: {}", fragment.fragment_type.cyan());
    println!("  Size: {} bytes", fragment.size);
    println!("  Created: {}", fragment.created.to_rfc3339());
    println!("  Updated: {}", fragment.updated.to_rfc3339());
    println!("  Formats: {}", fragment.formats().join(", "));
}

fn cmd_create(session: &Session, args: CreateArgs) -> anyhow::Result<()> {
    let owner = session.owner()?;
    let data = read_input(&args.input)?;
    let fragment = session.store.create(&owner, &args.fragment_type, &data)?;
    if session.json() {
        println!("{}", serde_json::to_string_pretty(&fragment)?);
    } else {
        println!(
            "{} Created fragment {} ({}, {} bytes)",
            "✓".green().bold(),
            fragment.id.to_string().yellow(),
            fragment.fragment_type.cyan(),
            fragment.size
        );
    }
    Ok(())
}

fn cmd_update(session: &Session, args: UpdateArgs) -> anyhow::Result<()> {
    let owner = session.owner()?;
    let id = FragmentId::new(args.id)?;
    let fragment_type = match args.fragment_type {
        Some(fragment_type) => fragment_type,
        None => {
            session
                .store
                .read(&owner, &id)?
                .ok_or_else(|| StoreError::NotFound {
                    owner: owner.clone(),
                    id: id.clone(),
                })?
                .fragment_type
        }
    };
    let data = read_input(&args.input)?;
    let fragment = session.store.update(&owner, &id, &fragment_type, &data)?;
    if session.json() {
        println!("{}", serde_json::to_string_pretty(&fragment)?);
    } else {
        println!(
            "{} Updated fragment {} ({} bytes)",
            "✓".green().bold(),
            fragment.id.to_string().yellow(),
            fragment.size
        );
    }
    Ok(())
}

fn cmd_get(session: &Session, args: GetArgs) -> anyhow::Result<()> {
    let owner = session.owner()?;
    let (id, extension) = split_target(&args.target);
    let id = FragmentId::new(id)?;
    let data = match extension {
        Some(ext) => {
            let rendered = session.store.convert(&owner, &id, ext)?;
            debug!(
                from = %rendered.source_type,
                to = %rendered.target_type,
                "serving converted fragment"
            );
            rendered.data
        }
        None => session.store.read_content(&owner, &id)?,
    };
    write_output(args.output.as_deref(), &data)
}

fn cmd_info(session: &Session, args: InfoArgs) -> anyhow::Result<()> {
    let owner = session.owner()?;
    let id = FragmentId::new(args.id)?;
    let fragment = session
        .store
        .read(&owner, &id)?
        .ok_or(StoreError::NotFound { owner, id })?;
    if session.json() {
        println!("{}", serde_json::to_string_pretty(&fragment)?);
    } else {
        print_fragment(&fragment);
    }
    Ok(())
}

fn cmd_list(session: &Session, args: ListArgs) -> anyhow::Result<()> {
    let owner = session.owner()?;
    if args.expand {
        let fragments = session.store.list_expanded(&owner)?;
        if session.json() {
            println!("{}", serde_json::to_string_pretty(&fragments)?);
        } else if fragments.is_empty() {
            println!("No fragments.");
        } else {
            for fragment in &fragments {
                println!(
                    "{}  {}  {} bytes  {}",
                    fragment.id.to_string().yellow(),
                    fragment.fragment_type.cyan(),
                    fragment.size,
                    fragment.updated.to_rfc3339().dimmed()
                );
            }
        }
        return Ok(());
    }

    let ids = session.store.list(&owner)?;
    if session.json() {
        println!("{}", serde_json::to_string_pretty(&ids)?);
    } else if ids.is_empty() {
        println!("No fragments.");
    } else {
        for id in &ids {
            println!("{}", id.to_string().yellow());
        }
    }
    Ok(())
}

fn cmd_rm(session: &Session, args: RmArgs) -> anyhow::Result<()> {
    let owner = session.owner()?;
    let id = FragmentId::new(args.id)?;
    session.store.delete(&owner, &id)?;
    if session.json() {
        println!("{}", serde_json::json!({ "deleted": id }));
    } else {
        println!("{} Deleted fragment {}", "✓".green().bold(), id.to_string().yellow());
    }
    Ok(())
}

fn cmd_types(session: &Session) -> anyhow::Result<()> {
    let types: Vec<&str> = session.store.policy().types().collect();
    if session.json() {
        println!("{}", serde_json::to_string_pretty(&types)?);
    } else {
        for fragment_type in types {
            println!("{fragment_type}");
        }
    }
    Ok(())
}
