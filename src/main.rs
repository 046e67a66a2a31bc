//! ontograph CLI - a cross-cultural knowledge base of metaphysical concepts.

use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::info;
use ontograph::{
    Config, CrossKindRow, ExportDocument, IndependenceQuery, IndependentEntities, KnowledgeBase, NetworkAnalysis,
    NetworkOptions, NewContradiction, NewInterpretation, NewRelation, ParadoxQuery, ParadoxRow, SeedFile, load_seed,
    sample_seed,
};
use serde::Serialize;
use std::fs;
use std::path::PathBuf;

mod cli;

use cli::{Cli, Command};

fn setup_logging() -> Result<()> {
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ontograph")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("ontograph.log");

    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value).context("Failed to serialize result")?);
    Ok(())
}

fn section(title: &str) {
    println!("\n{}", title.bold().underline());
}

fn print_cross(rows: &[CrossKindRow<'_>], limit: usize) {
    if rows.is_empty() {
        println!("  {}", "No relations found".dimmed());
        return;
    }
    for row in rows.iter().take(limit) {
        println!(
            "  {} ({}) {} {} ({}) {}",
            row.source.name.cyan(),
            row.source.cultural_context.dimmed(),
            format!("--{}-->", row.relation_type).yellow(),
            row.target.name.cyan(),
            row.target.cultural_context.dimmed(),
            format!("[{:.1}]", row.strength).green()
        );
    }
}

fn print_independent(groups: &[IndependentEntities<'_>], limit: usize) {
    for group in groups {
        println!("  {}:", group.kind.bold());
        if group.entities.is_empty() {
            println!("    {}", "none".dimmed());
        }
        for entity in group.entities.iter().take(limit) {
            println!("    • {} ({})", entity.name, entity.cultural_context.dimmed());
        }
    }
}

fn print_paradoxes(rows: &[ParadoxRow<'_>], limit: usize) {
    if rows.is_empty() {
        println!("  {}", "No paradoxes above the threshold".dimmed());
        return;
    }
    for row in rows.iter().take(limit) {
        println!(
            "  {} ←→ {} ({} {}, strength {:.1}, {})",
            row.counterpart.name.cyan(),
            row.pivot.name.cyan(),
            row.relation_type.yellow(),
            format!("level {}", row.threshold_value).magenta(),
            row.strength,
            row.logical_necessity
        );
    }
}

fn print_network(analysis: &NetworkAnalysis, limit: usize) {
    println!("  {}", "Most connected kinds:".bold());
    for hub in analysis.hub_ranking.iter().take(limit) {
        println!("    • {}: {} connections", hub.kind.cyan(), hub.connection_count);
    }

    println!("  {}", "Strongest relations:".bold());
    for rel in &analysis.strongest_relations {
        println!(
            "    • {} {} {} {} {}",
            format!("#{}", rel.relation_id).dimmed(),
            rel.source_kind,
            format!("--{}-->", rel.relation_type).yellow(),
            rel.target_kind,
            format!("[{:.1}]", rel.strength).green()
        );
    }

    println!("  {}", "By culture:".bold());
    for group in analysis.cultural_analysis.iter().take(limit) {
        println!(
            "    • {}: {} relation(s), mean strength {:.2}",
            group.culture.cyan(),
            group.count,
            group.mean_strength
        );
    }
}

fn apply_overrides(mut config: Config, rows: Option<usize>, top: Option<usize>, out: Option<PathBuf>) -> Config {
    if let Some(rows) = rows {
        config = config.with_report_rows(rows);
    }
    if let Some(top) = top {
        config = config.with_strongest_limit(top);
    }
    if let Some(out) = out {
        config = config.with_export_file(out);
    }
    config
}

fn open(config: &Config) -> Result<KnowledgeBase> {
    KnowledgeBase::open(&config.root).context("Failed to open knowledge base")
}

fn run(cli: Cli) -> Result<()> {
    let config = Config::resolve(cli.dir.clone());

    match cli.command {
        Command::Init => {
            let mut kb = KnowledgeBase::init(&config.root).context("Failed to initialize knowledge base")?;
            kb.register_builtin_kinds().context("Failed to register built-in kinds")?;
            println!(
                "{} Initialized knowledge base in {}",
                "✓".green(),
                config.db_path().display()
            );
        }

        Command::Seed { file } => {
            let mut kb = open(&config)?;
            let seed = match &file {
                Some(path) => SeedFile::load(path)?,
                None => sample_seed()?,
            };
            let report = load_seed(&mut kb, seed).context("Failed to load seed")?;

            println!(
                "{} Seeded {} concept(s), {} relation(s), {} contradiction(s), {} interpretation(s)",
                "✓".green(),
                report.concepts,
                report.relations,
                report.contradictions,
                report.interpretations
            );
            for error in &report.errors {
                println!("  {} {}", "✗".red(), error);
            }
        }

        Command::AddConcept { kind, fields } => {
            let mut kb = open(&config)?;
            let value: serde_json::Value = serde_json::from_str(&fields).context("Fields must be valid JSON")?;
            let Some(map) = value.as_object() else {
                eyre::bail!("Fields must be a JSON object");
            };

            let reference = kb.insert_fields(&kind, map).context("Failed to add concept")?;
            let entity = kb.get(&reference)?;
            println!("{} Added: {} {}", "✓".green(), reference.to_string().cyan(), entity.name);
        }

        Command::Relate {
            source,
            target,
            relation_type,
            strength,
            culture,
            necessity,
            stability,
        } => {
            let mut kb = open(&config)?;
            let mut new = NewRelation::new(source, target, relation_type)
                .strength(strength)
                .necessity(necessity.unwrap_or_default())
                .stability(stability.unwrap_or_default());
            if let Some(culture) = culture {
                new = new.cultural_specificity(culture);
            }

            let relation = kb.add_relation(new).context("Failed to add relation")?;
            println!(
                "{} Relation #{}: {} --{}--> {}",
                "✓".green(),
                relation.id,
                relation.source.to_string().cyan(),
                relation.relation_type,
                relation.target.to_string().cyan()
            );
        }

        Command::Contradict {
            first,
            second,
            contradiction_type,
            comments,
        } => {
            let mut kb = open(&config)?;
            let mut new = NewContradiction::new(first, second);
            if let Some(ty) = contradiction_type {
                new = new.contradiction_type(ty);
            }
            if let Some(comments) = comments {
                new = new.comments(comments);
            }

            let c = kb.add_contradiction(new).context("Failed to record contradiction")?;
            println!("{} Contradiction #{}: {} ⟂ {}", "✓".green(), c.id, c.first, c.second);
        }

        Command::Interpret { base, culture, text } => {
            let mut kb = open(&config)?;
            let mut new = NewInterpretation::new(base, culture);
            if let Some(text) = text {
                new = new.interpretation(text);
            }

            let i = kb.add_interpretation(new).context("Failed to record interpretation")?;
            println!("{} Interpretation #{} of {} ({})", "✓".green(), i.id, i.base, i.culture.cyan());
        }

        Command::Show { reference } => {
            let kb = open(&config)?;
            let entity = kb.get(&reference)?;

            println!("{} {}", reference.to_string().cyan(), entity.name.bold());
            println!("  Culture: {}", entity.cultural_context);
            if !entity.definition.is_empty() {
                println!("  Definition: {}", entity.definition);
            }
            for (name, value) in &entity.attributes {
                println!("  {}: {}", name.dimmed(), value);
            }

            for rel in kb.relations().relations_from(&reference) {
                println!("  {} {} {}", "→".blue(), rel.relation_type.yellow(), rel.target);
            }
            for rel in kb.relations().relations_to(&reference) {
                println!("  {} {} {}", "←".blue(), rel.relation_type.yellow(), rel.source);
            }
            for c in kb.annotations().contradictions_involving(&reference) {
                let other = if c.first == reference { &c.second } else { &c.first };
                println!("  {} contradicts {}", "⟂".red(), other);
            }
            for i in kb.annotations().interpretations_of(&reference) {
                println!(
                    "  {} {}: {}",
                    "◇".magenta(),
                    i.culture,
                    i.interpretation.as_deref().unwrap_or_default()
                );
            }
        }

        Command::Kinds => {
            let kb = open(&config)?;
            for kind in kb.entities().kinds() {
                let count = kb.entities().list(kind)?.len();
                println!("  {} {}", kind.cyan(), format!("({})", count).dimmed());
            }
        }

        Command::Report { rows, top } => {
            let config = apply_overrides(config, rows, top, None);
            let kb = open(&config)?;
            let query = kb.query();
            let rows = config.report_rows;

            section("Cross-cultural existence / nothingness relations");
            print_cross(&query.cross_kind_relations("existence", "nothingness")?, rows);

            section("Concepts independent of divine creation");
            print_independent(&query.independence(&IndependenceQuery::divine_creation())?, rows);

            section("High-paradox concepts");
            print_paradoxes(&query.paradoxes(&ParadoxQuery::nothingness_existence(7))?, rows);

            section("Concept network");
            let options = NetworkOptions {
                top_n: config.strongest_limit,
            };
            print_network(&query.network_analysis(options), rows);

            let unresolved = kb.annotations().unresolved().count();
            if unresolved > 0 {
                println!("\n{} {} unresolved contradiction(s)", "⟂".red(), unresolved);
            }
        }

        Command::Cross { a, b, json } => {
            let kb = open(&config)?;
            let rows = kb.query().cross_kind_relations(&a, &b)?;
            if json {
                print_json(&rows)?;
            } else {
                print_cross(&rows, usize::MAX);
            }
        }

        Command::Independent {
            source,
            kinds,
            types,
            json,
        } => {
            let kb = open(&config)?;
            let query = IndependenceQuery::new(source).candidates(kinds).excluding(types);
            let groups = kb.query().independence(&query)?;
            if json {
                print_json(&groups)?;
            } else {
                print_independent(&groups, usize::MAX);
            }
        }

        Command::Paradox {
            pivot,
            attribute,
            min,
            counterpart,
            json,
        } => {
            let kb = open(&config)?;
            let mut query = ParadoxQuery::new(pivot, attribute, min);
            if let Some(kind) = counterpart {
                query = query.counterpart(kind);
            }
            let rows = kb.query().paradoxes(&query)?;
            if json {
                print_json(&rows)?;
            } else {
                print_paradoxes(&rows, usize::MAX);
            }
        }

        Command::Network { top, json } => {
            let config = apply_overrides(config, None, top, None);
            let kb = open(&config)?;
            let options = NetworkOptions {
                top_n: config.strongest_limit,
            };
            let analysis = kb.query().network_analysis(options);
            if json {
                print_json(&analysis)?;
            } else {
                print_network(&analysis, usize::MAX);
            }
        }

        Command::Export { out } => {
            let config = apply_overrides(config, None, None, out);
            let kb = open(&config)?;
            let path = config.export_path();
            ExportDocument::from_kb(&kb)?.write_json(&path)?;
            println!("{} Exported to {}", "✓".green(), path.display());
        }
    }

    Ok(())
}

fn main() -> Result<()> {
    setup_logging().context("Failed to setup logging")?;

    let cli = Cli::parse();
    info!("Command: {:?}", std::env::args().collect::<Vec<_>>());

    if let Err(e) = run(cli) {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }

    Ok(())
}
