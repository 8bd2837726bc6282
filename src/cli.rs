//! Minimal CLI: load → (table | chain) descriptors
use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};

use crate::config::{EntryOrder, GeneratorConfig, OutputFormat, Overrides};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// convert an OpenAPI document's schemas into canonical type descriptors for C++ codegen
#[derive(Parser, Debug)]
#[command(version)]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,

    /// more logging (-v info, -vv debug, -vvv trace); RUST_LOG takes precedence
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// convert every schema and emit a table or lookup chain
    Generate(GenerateOut),
    /// print the descriptor of a single schema
    Describe(DescribeOut),
    /// print the schema names in the registry
    List(ListOut),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// fetch the schema document from this URL
    #[arg(long, conflicts_with = "file")]
    url: Option<String>,

    /// read the schema document from this file (JSON or YAML)
    #[arg(long)]
    file: Option<PathBuf>,

    /// configuration file (defaults to ./openapi-descriptor.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(clap::Parser, Debug)]
struct GenerateOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// output syntax
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,

    /// entry order
    #[arg(long, value_enum)]
    order: Option<EntryOrder>,

    /// output file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// debugging
    #[arg(long)]
    no_op: bool,
}

#[derive(clap::Parser, Debug)]
struct DescribeOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// schema name as it appears in the registry
    name: String,
}

#[derive(clap::Parser, Debug)]
struct ListOut {
    #[command(flatten)]
    input_settings: InputSettings,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl InputSettings {
    fn load_config(&self, mut overrides: Overrides) -> anyhow::Result<GeneratorConfig> {
        overrides.url = self.url.clone();
        overrides.file = self.file.clone();
        GeneratorConfig::load_with(self.config.as_deref(), &overrides)
            .context("failed to load configuration")
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }
    pub fn run(&self) -> anyhow::Result<()> {
        match &self.cmd {
            Command::Generate(target) => {
                let config = target.input_settings.load_config(Overrides {
                    format: target.format,
                    order: target.order,
                    out: target.out.clone(),
                    ..Overrides::default()
                })?;

                // debug path
                if target.no_op {
                    eprintln!("{self:#?}");
                    eprintln!("{config:#?}");
                    return Ok(())
                }

                let text = crate::pipeline::generate(&config).context("generation failed")?;
                crate::pipeline::write_output(config.output.path.as_deref(), &text)?;
            }
            Command::Describe(target) => {
                let config = target.input_settings.load_config(Overrides::default())?;
                let descriptor = crate::pipeline::describe(&config, &target.name)?;
                println!("{descriptor}");
            }
            Command::List(target) => {
                let config = target.input_settings.load_config(Overrides::default())?;
                let registry = crate::pipeline::registry_for(&config)?;
                for name in registry.keys() {
                    println!("{name}");
                }
            }
        }
        Ok(())
    }
}
