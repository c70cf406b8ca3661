//! donext CLI: per-user task lists with a next-task recommender.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use miette::Result;

use donext::config::Config;
use donext::generate::{self, ChatClient};
use donext::ops;
use donext::paths::DonextPaths;
use donext::recommend::{self, Style};
use donext::shell;
use donext::store::TaskDb;

#[derive(Parser)]
#[command(name = "donext", version, about = "Per-user task lists with a next-task recommender")]
struct Cli {
    /// Username owning the task list.
    #[arg(long, short, global = true)]
    user: Option<String>,

    /// Path to the task db file (overrides DONEXT_DB, config, and the XDG default).
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a task.
    Add {
        /// Task text.
        #[arg(required = true)]
        text: Vec<String>,

        /// Optional category.
        #[arg(long, short)]
        category: Option<String>,

        /// Flag the task for the recommender.
        #[arg(long, short)]
        priority: bool,
    },

    /// List tasks, optionally filtered by category.
    List {
        /// Exact category to filter on.
        #[arg(long, short)]
        category: Option<String>,
    },

    /// Remove a task by its 1-based index.
    Remove {
        /// 1-based index from `list`.
        index: usize,
    },

    /// Mark a task done by its 1-based index.
    Done {
        /// 1-based index from `list`.
        index: usize,
    },

    /// Remove all tasks for the user.
    Clear,

    /// Make a task the current one.
    Select {
        /// 1-based index from `list`.
        index: usize,
    },

    /// Clear the current-task pointer.
    Unselect,

    /// Show the current task.
    Current,

    /// Flag a task as priority.
    Promote {
        /// 1-based index from `list`.
        index: usize,
    },

    /// Remove the priority flag from a task.
    Demote {
        /// 1-based index from `list`.
        index: usize,
    },

    /// List priority tasks.
    Priorities,

    /// Pick the next task to work on and make it current.
    Recommend {
        /// Category affinity: "type" stays in the current task's category,
        /// "dispersed" switches away from it.
        #[arg(long, default_value = "type")]
        style: String,
    },

    /// Turn a free-text prompt into tasks.
    Generate {
        /// Prompt text.
        #[arg(required = true)]
        prompt: Vec<String>,

        /// Use the configured chat-completion API instead of the plain splitter.
        #[arg(long)]
        ai: bool,
    },

    /// Enter the interactive shell (prompts for a username if not given).
    Interactive,
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))
    .ok(); // Ignore error if hook already set (e.g., in tests)

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let paths = DonextPaths::resolve()?;
    paths.ensure_dirs()?;
    let config = Config::load_or_default(&paths.config_file())?;
    let db_path = resolve_db_path(cli.db.clone(), &config, &paths);

    if let Commands::Interactive = cli.command {
        let user = match cli.user {
            Some(user) => user,
            None => shell::prompt_username()
                .ok_or_else(|| miette::miette!("username required for interactive mode"))?,
        };
        shell::run(&user, &db_path)?;
        return Ok(());
    }

    let user = cli
        .user
        .ok_or_else(|| miette::miette!("provide --user/-u or run `donext interactive`"))?;

    let mut db = TaskDb::load(&db_path);

    match cli.command {
        Commands::Add {
            text,
            category,
            priority,
        } => {
            let text = text.join(" ");
            let record = db.ensure_record(&user);
            let task = ops::add(record, &text, category.as_deref().unwrap_or(""), priority)?;
            println!("Added: {}", task.text);
            db.save(&db_path)?;
        }

        Commands::List { category } => match db.record(&user) {
            Some(record) if !record.tasks.is_empty() => {
                let mut shown = 0;
                for (i, task) in ops::list(record, category.as_deref()) {
                    println!("{}", task.display_line(i));
                    shown += 1;
                }
                if shown == 0 {
                    if let Some(cat) = category {
                        println!("No tasks in category '{cat}'.");
                    }
                }
            }
            _ => println!("No tasks for user '{user}'."),
        },

        Commands::Remove { index } => {
            let removed = ops::remove(db.ensure_record(&user), index)?;
            println!("Removed: {}", removed.text);
            db.save(&db_path)?;
        }

        Commands::Done { index } => {
            let task = ops::mark_done(db.ensure_record(&user), index)?;
            println!("Marked done: {}", task.text);
            db.save(&db_path)?;
        }

        Commands::Clear => {
            ops::clear(db.ensure_record(&user));
            println!("Cleared tasks for '{user}'.");
            db.save(&db_path)?;
        }

        Commands::Select { index } => {
            let task = ops::select(db.ensure_record(&user), index)?;
            println!("Selected: {}", task.text);
            db.save(&db_path)?;
        }

        Commands::Unselect => {
            ops::unselect(db.ensure_record(&user));
            println!("Cleared current task.");
            db.save(&db_path)?;
        }

        Commands::Current => {
            let record = db.ensure_record(&user);
            if record.current.is_empty() {
                println!("No current task set.");
            } else {
                match ops::current_task(record) {
                    Some(task) => {
                        println!("Current task: {} (added {})", task.text, task.created_at)
                    }
                    None => println!("Current task not found (it may have been removed)."),
                }
            }
        }

        Commands::Promote { index } => {
            let task = ops::promote(db.ensure_record(&user), index)?;
            println!("Promoted task: {}", task.text);
            db.save(&db_path)?;
        }

        Commands::Demote { index } => {
            let task = ops::demote(db.ensure_record(&user), index)?;
            println!("Demoted task: {}", task.text);
            db.save(&db_path)?;
        }

        Commands::Priorities => match db.record(&user) {
            Some(record) if ops::list_priorities(record).count() > 0 => {
                for (i, task) in ops::list_priorities(record) {
                    println!("{}", task.display_line(i));
                }
            }
            _ => println!("No priority tasks."),
        },

        Commands::Recommend { style } => {
            let style = Style::from_label(&style).ok_or_else(|| {
                miette::miette!("unknown style '{style}' (expected 'type' or 'dispersed')")
            })?;
            let record = db.ensure_record(&user);
            match recommend::recommend(record, style, &mut rand::thread_rng()) {
                Some(task) => {
                    println!("Recommended: {}", task.text);
                    db.save(&db_path)?;
                }
                None => println!("Nothing to recommend (no unfinished tasks)."),
            }
        }

        Commands::Generate { prompt, ai } => {
            let prompt = prompt.join(" ");
            let record = db.ensure_record(&user);
            let added = if ai {
                let client = ChatClient::from_env(config.generation.clone())?;
                generate::generate_with(record, &prompt, &client)?
            } else {
                generate::generate_fallback(record, &prompt)
            };
            println!("Generated and added {added} tasks.");
            db.save(&db_path)?;
        }

        // Handled above, before the db is loaded.
        Commands::Interactive => unreachable!(),
    }

    Ok(())
}

/// Pick the db file location: CLI flag, then DONEXT_DB, then config, then
/// the XDG default.
fn resolve_db_path(cli_db: Option<PathBuf>, config: &Config, paths: &DonextPaths) -> PathBuf {
    if let Some(path) = cli_db {
        return path;
    }
    if let Ok(path) = std::env::var("DONEXT_DB") {
        if !path.is_empty() {
            return PathBuf::from(path);
        }
    }
    if let Some(path) = &config.db_path {
        return path.clone();
    }
    paths.db_file()
}
