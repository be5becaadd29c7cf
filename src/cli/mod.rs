// src/cli/mod.rs — CLI definition and command handlers (clap derive)
//
// A file-based front end over the in-process engine: specs are exported as
// JSON, re-imported for mutation, and written back. The concurrency story
// for long-lived multi-writer deployments lives behind the engine API, not
// here.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use uuid::Uuid;

use crate::engine::DesignEngine;
use crate::model::{DesignParams, DesignSpecification, SwitchTarget, SwitchUpdate};

#[derive(Parser)]
#[command(name = "atelier", about = "Prompt-to-design-specification engine", version)]
pub struct Cli {
    /// Path to an atelier.toml config file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Log level when RUST_LOG is unset
    #[arg(long, default_value = "warn")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate a new design specification from a prompt
    Generate {
        /// Free-text design request
        prompt: String,

        #[arg(long)]
        budget: Option<f64>,

        #[arg(long)]
        city: Option<String>,

        #[arg(long)]
        style: Option<String>,

        #[arg(long = "type")]
        building_type: Option<String>,

        #[arg(long, default_value = "local")]
        owner: String,

        #[arg(long, default_value = "default")]
        project: String,

        /// Write the spec JSON here (defaults to <spec-id>.json)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Apply a named improvement strategy to an exported spec
    Iterate {
        spec: PathBuf,

        #[arg(short, long)]
        strategy: String,

        #[arg(long, default_value = "local")]
        owner: String,
    },

    /// Replace material/color/texture on targeted objects
    Switch {
        spec: PathBuf,

        #[arg(long)]
        object_id: Option<String>,

        #[arg(long)]
        query: Option<String>,

        #[arg(long)]
        material: Option<String>,

        #[arg(long)]
        color: Option<String>,

        #[arg(long)]
        texture: Option<String>,

        #[arg(long, default_value = "local")]
        owner: String,
    },

    /// Record a rating against an exported spec
    Evaluate {
        spec: PathBuf,

        #[arg(short, long)]
        rating: f64,

        #[arg(short, long)]
        notes: Option<String>,

        #[arg(long, default_value = "local")]
        owner: String,
    },

    /// List exported specs in a directory, newest first
    History {
        #[arg(long, default_value = ".")]
        dir: PathBuf,

        #[arg(long, default_value = "local")]
        owner: String,
    },
}

pub async fn run(engine: &DesignEngine, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Generate {
            prompt,
            budget,
            city,
            style,
            building_type,
            owner,
            project,
            out,
        } => {
            let params = DesignParams {
                city,
                budget,
                style,
                building_type,
            };
            let outcome = engine.generate(&prompt, &owner, &project, params).await?;

            let path = out.unwrap_or_else(|| PathBuf::from(format!("{}.json", outcome.spec.id)));
            write_spec(&path, &outcome.spec)?;

            println!("{}", serde_json::to_string_pretty(&outcome)?);
            eprintln!("Spec written to {}", path.display());
            Ok(())
        }

        Commands::Iterate {
            spec,
            strategy,
            owner,
        } => {
            let (id, version) = import(engine, &spec)?;
            let outcome = engine.iterate(id, &owner, &strategy, Some(version)).await?;
            write_spec(&spec, &engine.get(id)?)?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
            Ok(())
        }

        Commands::Switch {
            spec,
            object_id,
            query,
            material,
            color,
            texture,
            owner,
        } => {
            let (id, version) = import(engine, &spec)?;
            let outcome = engine.switch(
                id,
                &owner,
                SwitchTarget {
                    object_id,
                    object_query: query,
                },
                SwitchUpdate {
                    material,
                    color_hex: color,
                    texture,
                },
                Some(version),
            )?;
            write_spec(&spec, &engine.get(id)?)?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
            Ok(())
        }

        Commands::Evaluate {
            spec,
            rating,
            notes,
            owner,
        } => {
            let (id, _) = import(engine, &spec)?;
            let ack = engine.evaluate(id, &owner, rating, notes)?;
            println!("{}", serde_json::to_string_pretty(&ack)?);
            Ok(())
        }

        Commands::History { dir, owner } => {
            for path in spec_files(&dir)? {
                // Unparseable or invalid exports are skipped, not fatal.
                if let Ok(spec) = read_spec(&path) {
                    if let Err(e) = engine.import(spec) {
                        tracing::warn!("Skipping {}: {}", path.display(), e);
                    }
                }
            }
            let history = engine.history(&owner);
            println!("{}", serde_json::to_string_pretty(&history)?);
            Ok(())
        }
    }
}

/// Load an exported spec into the engine; returns (id, stored version).
/// The store restamps version 1, so the returned version is what mutation
/// calls must pass as expected.
fn import(engine: &DesignEngine, path: &Path) -> anyhow::Result<(Uuid, u32)> {
    let spec = read_spec(path)?;
    let stored = engine.import(spec)?;
    Ok((stored.id, stored.version))
}

fn read_spec(path: &Path) -> anyhow::Result<DesignSpecification> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

fn write_spec(path: &Path, spec: &DesignSpecification) -> anyhow::Result<()> {
    std::fs::write(path, serde_json::to_string_pretty(spec)?)?;
    Ok(())
}

fn spec_files(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) == Some("json") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
