mod config;
mod error;

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use host::{CategoryId, CategoryStore, ContainerId, TracingLogger};
use policy::{BlockActions, BlockRule, LockingManager, RegionActions, RegionRule, RuleSet};
use serde::Serialize;
use setup::SetupJob;
use storage::{RuleKind, RuleRecord, SiteStore};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::Config;
use error::{Error, Result};

const CONFIG_FILE: &str = "blockgate.toml";

#[derive(Parser)]
#[command(name = "blockgate")]
#[command(about = "Category-scoped block locking and bulk block setup", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file
    #[arg(short = 'c', long, global = true, default_value = CONFIG_FILE)]
    config_file: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the site database and install the locking widget manager
    Init,
    /// Apply a blocks setup file to the site
    Apply {
        /// File with one setup item per line
        #[arg(short, long)]
        file: PathBuf,
    },
    /// Check whether an action is allowed on a block
    Check {
        #[arg(long)]
        category: CategoryId,
        #[arg(long)]
        block: String,
        #[arg(long)]
        region: String,
        /// config, remove, hide, move, movein or moveout
        #[arg(long)]
        action: String,
    },
    /// Manage locking rules
    #[command(subcommand)]
    Rules(RulesCommand),
    /// Manage the site's categories, courses and installed types
    #[command(subcommand)]
    Site(SiteCommand),
}

#[derive(Subcommand)]
enum RulesCommand {
    /// List stored rules in evaluation order
    List {
        #[arg(long)]
        json: bool,
    },
    /// Lock a region for categories
    AddRegion {
        #[arg(long)]
        region: String,
        #[arg(long, value_delimiter = ',', required = true)]
        categories: Vec<CategoryId>,
        #[command(flatten)]
        flags: ActionFlags,
        #[arg(long)]
        movein: Option<bool>,
    },
    /// Lock a block type in a region (or "*" for all regions)
    AddBlock {
        #[arg(long)]
        region: String,
        #[arg(long)]
        block: String,
        #[arg(long, value_delimiter = ',', required = true)]
        categories: Vec<CategoryId>,
        #[command(flatten)]
        flags: ActionFlags,
    },
    /// Delete a rule
    Delete {
        #[arg(long, value_enum)]
        kind: KindArg,
        #[arg(long)]
        id: i64,
    },
    /// Import rules from a TOML file with [[region]] and [[block]] tables
    Import { file: PathBuf },
}

/// Action flags shared by both rule kinds; unset flags keep their defaults.
#[derive(clap::Args)]
struct ActionFlags {
    #[arg(long)]
    config: Option<bool>,
    #[arg(long)]
    remove: Option<bool>,
    #[arg(long)]
    hide: Option<bool>,
    #[arg(long = "move")]
    r#move: Option<bool>,
}

#[derive(Clone, Copy, ValueEnum)]
enum KindArg {
    Region,
    Block,
}

impl From<KindArg> for RuleKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Region => RuleKind::Region,
            KindArg::Block => RuleKind::Block,
        }
    }
}

#[derive(Subcommand)]
enum SiteCommand {
    /// Add a category
    AddCategory {
        #[arg(long)]
        name: String,
        #[arg(long)]
        parent: Option<CategoryId>,
    },
    /// Add a course to a category
    AddCourse {
        #[arg(long)]
        category: CategoryId,
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "topics")]
        format: String,
    },
    /// Install a block type
    InstallBlock {
        #[arg(long)]
        name: String,
        /// Allow more than one instance per page
        #[arg(long)]
        multiple: bool,
    },
    /// Install a module type
    InstallModule {
        #[arg(long)]
        name: String,
    },
    /// Add a module instance to a course
    AddModule {
        #[arg(long)]
        course: ContainerId,
        #[arg(long = "type")]
        module_type: String,
    },
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load_or_default(&cli.config_file)?;
    init_tracing(&config.log_filter);
    tracing::debug!(
        config = %cli.config_file.display(),
        database = %config.database.display(),
        "loaded configuration"
    );

    match cli.command {
        Commands::Init => cmd_init(&config),
        Commands::Apply { file } => cmd_apply(&config, &file),
        Commands::Check {
            category,
            block,
            region,
            action,
        } => cmd_check(&config, category, &block, &region, &action),
        Commands::Rules(command) => cmd_rules(&config, command),
        Commands::Site(command) => cmd_site(&config, command),
    }
}

fn init_tracing(default_filter: &str) {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn cmd_init(config: &Config) -> Result<()> {
    let store = SiteStore::open(&config.database)?;
    store.enable_locking()?;
    println!("Site database ready at {}", config.database.display());
    Ok(())
}

fn cmd_apply(config: &Config, file: &Path) -> Result<()> {
    let text = std::fs::read_to_string(file)?;
    if text.trim().is_empty() {
        return Err(Error::EmptyFile {
            path: file.to_path_buf(),
        });
    }

    let store = open_store(config)?;
    let report = SetupJob::new(&store, TracingLogger).run(&text)?;
    println!(
        "Applied {} setup items ({} invalid lines skipped)",
        report.processed, report.invalid
    );
    Ok(())
}

fn cmd_check(
    config: &Config,
    category: CategoryId,
    block: &str,
    region: &str,
    action: &str,
) -> Result<()> {
    let store = open_store(config)?;
    let category = store
        .category(category)?
        .ok_or(Error::CategoryNotFound(category))?;
    let locking = LockingManager::new(
        Some(&category),
        store.load_rules()?,
        &store,
        config.authorizer(),
    )?;

    let allowed = if action == "moveout" {
        locking.can_move_out(block, region)
    } else {
        locking.can_named(action, block, region)?
    };
    println!("{}", if allowed { "allowed" } else { "denied" });
    Ok(())
}

#[derive(Serialize)]
struct RuleListing {
    region: Vec<RuleRecord<RegionRule>>,
    block: Vec<RuleRecord<BlockRule>>,
}

fn cmd_rules(config: &Config, command: RulesCommand) -> Result<()> {
    let store = open_store(config)?;

    match command {
        RulesCommand::List { json } => {
            let listing = RuleListing {
                region: store.region_rules()?,
                block: store.block_rules()?,
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&listing)?);
            } else {
                print_rules(&listing);
            }
        }
        RulesCommand::AddRegion {
            region,
            categories,
            flags,
            movein,
        } => {
            let mut actions = RegionActions::default();
            flags.apply(
                &mut actions.config,
                &mut actions.remove,
                &mut actions.hide,
                &mut actions.r#move,
            );
            if let Some(movein) = movein {
                actions.move_in = movein;
            }
            let record =
                store.create_region_rule(&RegionRule::new(region, categories).with_actions(actions))?;
            println!("Created region rule {}", record.id);
        }
        RulesCommand::AddBlock {
            region,
            block,
            categories,
            flags,
        } => {
            let mut actions = BlockActions::default();
            flags.apply(
                &mut actions.config,
                &mut actions.remove,
                &mut actions.hide,
                &mut actions.r#move,
            );
            let rule = BlockRule::new(region, block, categories).with_actions(actions);
            let record = store.create_block_rule(&rule)?;
            println!("Created block rule {}", record.id);
        }
        RulesCommand::Delete { kind, id } => {
            store.delete_rule(kind.into(), id)?;
            println!("Deleted rule {id}");
        }
        RulesCommand::Import { file } => {
            let rules = RuleSet::load(&file)?;
            let count = store.import_rules(&rules)?;
            println!("Imported {count} rules from {}", file.display());
        }
    }
    Ok(())
}

impl ActionFlags {
    fn apply(&self, config: &mut bool, remove: &mut bool, hide: &mut bool, r#move: &mut bool) {
        for (flag, target) in [
            (self.config, config),
            (self.remove, remove),
            (self.hide, hide),
            (self.r#move, r#move),
        ] {
            if let Some(value) = flag {
                *target = value;
            }
        }
    }
}

fn print_rules(listing: &RuleListing) {
    if listing.region.is_empty() && listing.block.is_empty() {
        println!("No rules found.");
        return;
    }

    println!(
        "{:<6}  {:<6}  {:<16}  {:<20}  {:<12}  {:<16}  UPDATED",
        "KIND", "ID", "REGION", "BLOCK", "CATEGORIES", "DENIED"
    );
    println!("{}", "-".repeat(100));

    for record in &listing.region {
        let actions = &record.rule.actions;
        let denied = denied_actions(&[
            ("config", actions.config),
            ("remove", actions.remove),
            ("hide", actions.hide),
            ("movein", actions.move_in),
            ("move", actions.r#move),
        ]);
        print_row("region", record, &record.rule.region, "-", &record.rule.categories, &denied);
    }
    for record in &listing.block {
        let actions = &record.rule.actions;
        let denied = denied_actions(&[
            ("config", actions.config),
            ("remove", actions.remove),
            ("hide", actions.hide),
            ("move", actions.r#move),
        ]);
        print_row(
            "block",
            record,
            record.rule.region.as_str(),
            &record.rule.block,
            &record.rule.categories,
            &denied,
        );
    }
}

fn print_row<R>(
    kind: &str,
    record: &RuleRecord<R>,
    region: &str,
    block: &str,
    categories: &[CategoryId],
    denied: &str,
) {
    println!(
        "{kind:<6}  {:<6}  {region:<16}  {block:<20}  {:<12}  {denied:<16}  {}",
        record.id,
        policy::format_category_list(categories),
        local_time(record.updated_at),
    );
}

fn denied_actions(flags: &[(&str, bool)]) -> String {
    let denied: Vec<&str> = flags
        .iter()
        .filter(|(_, allowed)| !allowed)
        .map(|(name, _)| *name)
        .collect();
    if denied.is_empty() {
        "-".to_string()
    } else {
        denied.join(",")
    }
}

fn local_time(time: DateTime<Utc>) -> String {
    time.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}

fn cmd_site(config: &Config, command: SiteCommand) -> Result<()> {
    let store = open_store(config)?;

    match command {
        SiteCommand::AddCategory { name, parent } => {
            let category = store.add_category(&name, parent)?;
            println!("Added category {} ({})", category.id, category.name);
        }
        SiteCommand::AddCourse {
            category,
            name,
            format,
        } => {
            store
                .category(category)?
                .ok_or(Error::CategoryNotFound(category))?;
            let course = store.add_container(category, &name, &format)?;
            println!("Added course {} ({})", course.id, course.name);
        }
        SiteCommand::InstallBlock { name, multiple } => {
            store.install_widget_type(&name, multiple)?;
            println!("Installed block {name}");
        }
        SiteCommand::InstallModule { name } => {
            store.install_module(&name)?;
            println!("Installed module {name}");
        }
        SiteCommand::AddModule {
            course,
            module_type,
        } => {
            let instance = store.add_module_instance(course, &module_type)?;
            println!("Added {} {} to course {course}", instance.module_type, instance.id);
        }
    }
    Ok(())
}

fn open_store(config: &Config) -> Result<SiteStore> {
    if !config.database.exists() {
        return Err(Error::DatabaseNotFound {
            path: config.database.clone(),
        });
    }
    Ok(SiteStore::open(&config.database)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_check_arguments() {
        let cli = Cli::try_parse_from([
            "blockgate", "check", "--category", "3", "--block", "html", "--region", "side-pre",
            "--action", "movein",
        ])
        .unwrap();
        match cli.command {
            Commands::Check {
                category, action, ..
            } => {
                assert_eq!(category, CategoryId(3));
                assert_eq!(action, "movein");
            }
            _ => panic!("expected check"),
        }
    }

    #[test]
    fn parses_category_lists() {
        let cli = Cli::try_parse_from([
            "blockgate", "rules", "add-region", "--region", "side-pre", "--categories", "1,2",
            "--hide", "false",
        ])
        .unwrap();
        match cli.command {
            Commands::Rules(RulesCommand::AddRegion {
                categories, flags, ..
            }) => {
                assert_eq!(categories, vec![CategoryId(1), CategoryId(2)]);
                assert_eq!(flags.hide, Some(false));
                assert_eq!(flags.config, None);
            }
            _ => panic!("expected rules add-region"),
        }
    }

    #[test]
    fn flags_override_only_what_is_given() {
        let flags = ActionFlags {
            config: None,
            remove: Some(true),
            hide: Some(false),
            r#move: None,
        };
        let mut actions = RegionActions::default();
        flags.apply(
            &mut actions.config,
            &mut actions.remove,
            &mut actions.hide,
            &mut actions.r#move,
        );
        assert!(actions.config && actions.remove);
        assert!(!actions.hide && !actions.r#move);
    }

    #[test]
    fn denied_actions_lists_false_flags() {
        assert_eq!(denied_actions(&[("config", true), ("hide", false), ("move", false)]), "hide,move");
        assert_eq!(denied_actions(&[("config", true)]), "-");
    }

    #[test]
    fn missing_database_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            database: dir.path().join("site.db"),
            ..Config::default()
        };
        assert!(matches!(open_store(&config), Err(Error::DatabaseNotFound { .. })));
    }
}
