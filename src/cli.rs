//! CLI argument parsing for ontograph.

use clap::{Parser, Subcommand};
use ontograph::{EntityRef, LogicalNecessity, TemporalStability};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "og",
    about = "A cross-cultural knowledge base of metaphysical concepts",
    version = env!("GIT_DESCRIBE"),
    after_help = "Logs are written to: ~/.local/share/ontograph/logs/ontograph.log"
)]
pub struct Cli {
    /// Path to the directory holding .ontograph (default: current directory)
    #[arg(short = 'd', long, global = true)]
    pub dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Initialize a new knowledge base and register the built-in kinds
    Init,

    /// Load concepts and relations from a YAML seed (default: bundled sample)
    Seed {
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Add a concept from a JSON object of fields
    AddConcept {
        /// Kind of the concept, e.g. dao
        kind: String,

        /// Fields as JSON, e.g. '{"name": "直観", "expressability": true}'
        fields: String,
    },

    /// Relate two concepts
    Relate {
        /// Source entity as kind:id
        #[arg(value_parser = parse_entity_ref)]
        source: EntityRef,

        /// Target entity as kind:id
        #[arg(value_parser = parse_entity_ref)]
        target: EntityRef,

        /// Relation type, e.g. generates
        relation_type: String,

        /// Strength in [0.0, 1.0]
        #[arg(short, long, default_value = "0.5")]
        strength: f64,

        /// Culture the relation is specific to
        #[arg(short, long)]
        culture: Option<String>,

        /// necessary, contingent or unknown
        #[arg(short, long)]
        necessity: Option<LogicalNecessity>,

        /// eternal, historical, contextual or unknown
        #[arg(short = 't', long)]
        stability: Option<TemporalStability>,
    },

    /// Record a contradiction between two concepts
    Contradict {
        #[arg(value_parser = parse_entity_ref)]
        first: EntityRef,

        #[arg(value_parser = parse_entity_ref)]
        second: EntityRef,

        /// Kind of contradiction, e.g. being_vs_nonbeing
        #[arg(short = 'k', long = "type")]
        contradiction_type: Option<String>,

        #[arg(short, long)]
        comments: Option<String>,
    },

    /// Record how a culture interprets a concept
    Interpret {
        #[arg(value_parser = parse_entity_ref)]
        base: EntityRef,

        culture: String,

        /// Interpretation text
        #[arg(short, long)]
        text: Option<String>,
    },

    /// Show a concept with its relations
    Show {
        /// Entity as kind:id
        #[arg(value_parser = parse_entity_ref)]
        reference: EntityRef,
    },

    /// List registered kinds and their concept counts
    Kinds,

    /// Print all four analyses
    Report {
        /// Rows shown per section
        #[arg(short, long)]
        rows: Option<usize>,

        /// Length of the strongest-relations ranking
        #[arg(long)]
        top: Option<usize>,
    },

    /// Relations between two kinds, in either direction
    Cross {
        a: String,
        b: String,

        #[arg(long)]
        json: bool,
    },

    /// Concepts that no relation of the given types from the source kind reaches
    Independent {
        /// Source kind whose relations count as dependence
        #[arg(short, long, default_value = "divine")]
        source: String,

        /// Candidate kinds (comma-separated)
        #[arg(short, long, value_delimiter = ',', default_value = "existence,nothingness,dao,consciousness")]
        kinds: Vec<String>,

        /// Relation types that count as dependence (comma-separated)
        #[arg(short = 't', long, value_delimiter = ',', default_value = "creates,generates,causes")]
        types: Vec<String>,

        #[arg(long)]
        json: bool,
    },

    /// Relations around concepts whose attribute reaches a threshold
    Paradox {
        #[arg(short, long, default_value = "nothingness")]
        pivot: String,

        /// Integer attribute of the pivot kind
        #[arg(short, long, default_value = "paradox_level")]
        attribute: String,

        #[arg(short, long, default_value = "7")]
        min: i64,

        /// Kind of the other endpoint (omit to accept any)
        #[arg(short, long)]
        counterpart: Option<String>,

        #[arg(long)]
        json: bool,
    },

    /// Hub ranking, strongest relations and cultural breakdown
    Network {
        /// Length of the strongest-relations ranking
        #[arg(long)]
        top: Option<usize>,

        #[arg(long)]
        json: bool,
    },

    /// Export everything as JSON
    Export {
        /// Output file; relative paths are taken from the knowledge base directory
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

/// Parse `kind:id`.
pub fn parse_entity_ref(s: &str) -> Result<EntityRef, String> {
    let (kind, id) = s
        .rsplit_once(':')
        .ok_or_else(|| format!("expected kind:id, got '{}'", s))?;
    if kind.is_empty() {
        return Err(format!("missing kind in '{}'", s));
    }
    let id = id.parse::<u64>().map_err(|e| format!("invalid id in '{}': {}", s, e))?;
    Ok(EntityRef::new(kind, id))
}
