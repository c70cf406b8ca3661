//! Interactive shell.
//!
//! Reads line commands from stdin, applies them to one user's record, and
//! persists the db after every successful mutation. Command parsing is
//! separated from the I/O loop so it can be tested directly.

use std::io::{BufRead, Write};
use std::path::Path;

use crate::error::DonextResult;
use crate::generate;
use crate::ops;
use crate::recommend::{self, Style};
use crate::store::TaskDb;

/// A parsed shell command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Add { text: String },
    List { category: Option<String> },
    Remove { index: usize },
    Done { index: usize },
    Clear,
    Select { index: usize },
    Unselect,
    Current,
    Promote { index: usize },
    Demote { index: usize },
    Priorities,
    Recommend { style: Style },
    Generate { prompt: String },
    Help,
    Quit,
}

/// Parse one input line.
///
/// `Ok(None)` for a blank line; `Err` carries the usage message to print.
pub fn parse_command(line: &str) -> Result<Option<ShellCommand>, String> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let mut parts = trimmed.splitn(2, char::is_whitespace);
    let action = parts.next().unwrap_or("").to_lowercase();
    let arg = parts.next().unwrap_or("").trim();

    let parse_index = |usage: &str| -> Result<usize, String> {
        arg.parse::<usize>().map_err(|_| usage.to_string())
    };

    let command = match action.as_str() {
        "q" | "quit" | "exit" => ShellCommand::Quit,
        "h" | "help" => ShellCommand::Help,
        "add" => {
            if arg.is_empty() {
                return Err("Usage: add <task text>".into());
            }
            ShellCommand::Add { text: arg.into() }
        }
        "list" => ShellCommand::List {
            category: (!arg.is_empty()).then(|| arg.to_string()),
        },
        "remove" => ShellCommand::Remove {
            index: parse_index("Usage: remove <index>")?,
        },
        "done" => ShellCommand::Done {
            index: parse_index("Usage: done <index>")?,
        },
        "clear" => ShellCommand::Clear,
        "select" => ShellCommand::Select {
            index: parse_index("Usage: select <index>")?,
        },
        "unselect" => ShellCommand::Unselect,
        "current" => ShellCommand::Current,
        "promote" => ShellCommand::Promote {
            index: parse_index("Usage: promote <index>")?,
        },
        "demote" => ShellCommand::Demote {
            index: parse_index("Usage: demote <index>")?,
        },
        "priorities" => ShellCommand::Priorities,
        "recommend" => {
            let style = if arg.is_empty() {
                Style::Type
            } else {
                Style::from_label(arg).ok_or("Usage: recommend [type|dispersed]")?
            };
            ShellCommand::Recommend { style }
        }
        "generate" => {
            if arg.is_empty() {
                return Err("Usage: generate <prompt>".into());
            }
            ShellCommand::Generate { prompt: arg.into() }
        }
        _ => return Err("Unknown command. Type 'help'.".into()),
    };

    Ok(Some(command))
}

/// Prompt for a username on stdin; `None` on EOF or empty input.
pub fn prompt_username() -> Option<String> {
    print!("Username: ");
    std::io::stdout().flush().ok();

    let mut name = String::new();
    std::io::stdin().read_line(&mut name).ok()?;
    let name = name.trim();
    (!name.is_empty()).then(|| name.to_string())
}

/// Run the interactive shell for `user` against the db at `db_path`.
pub fn run(user: &str, db_path: &Path) -> DonextResult<()> {
    let stdin = std::io::stdin();
    run_with(user, db_path, &mut stdin.lock())
}

fn run_with(user: &str, db_path: &Path, input: &mut impl BufRead) -> DonextResult<()> {
    let mut db = TaskDb::load(db_path);
    println!("Interactive mode for user '{user}'. Type 'help' for commands.");

    loop {
        print!("{user}> ");
        std::io::stdout().flush().ok();

        let mut line = String::new();
        match input.read_line(&mut line) {
            Ok(0) | Err(_) => {
                // EOF ends the session like `quit`.
                println!();
                break;
            }
            Ok(_) => {}
        }

        match parse_command(&line) {
            Ok(None) => {}
            Ok(Some(ShellCommand::Quit)) => break,
            Ok(Some(command)) => apply(&mut db, user, command, db_path, input)?,
            Err(usage) => println!("{usage}"),
        }
    }

    Ok(())
}

fn apply(
    db: &mut TaskDb,
    user: &str,
    command: ShellCommand,
    db_path: &Path,
    input: &mut impl BufRead,
) -> DonextResult<()> {
    match command {
        ShellCommand::Add { text } => {
            print!("Category (optional): ");
            std::io::stdout().flush().ok();
            let mut category = String::new();
            let _ = input.read_line(&mut category);
            let category = category.trim();

            let record = db.ensure_record(user);
            match ops::add(record, &text, category, false) {
                Ok(_) => {
                    println!("Added.");
                    db.save(db_path)?;
                }
                Err(e) => println!("{e}"),
            }
        }

        ShellCommand::List { category } => match db.record(user) {
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

        ShellCommand::Remove { index } => {
            let record = db.ensure_record(user);
            match ops::remove(record, index) {
                Ok(removed) => {
                    println!("Removed: {}", removed.text);
                    db.save(db_path)?;
                }
                Err(e) => println!("{e}"),
            }
        }

        ShellCommand::Done { index } => {
            let record = db.ensure_record(user);
            match ops::mark_done(record, index) {
                Ok(task) => {
                    println!("Marked done: {}", task.text);
                    db.save(db_path)?;
                }
                Err(e) => println!("{e}"),
            }
        }

        ShellCommand::Clear => {
            ops::clear(db.ensure_record(user));
            println!("Cleared tasks for '{user}'.");
            db.save(db_path)?;
        }

        ShellCommand::Select { index } => {
            let record = db.ensure_record(user);
            match ops::select(record, index) {
                Ok(task) => {
                    println!("Selected: {}", task.text);
                    db.save(db_path)?;
                }
                Err(e) => println!("{e}"),
            }
        }

        ShellCommand::Unselect => {
            ops::unselect(db.ensure_record(user));
            println!("Cleared current task.");
            db.save(db_path)?;
        }

        ShellCommand::Current => {
            let record = db.ensure_record(user);
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

        ShellCommand::Promote { index } => {
            let record = db.ensure_record(user);
            match ops::promote(record, index) {
                Ok(task) => {
                    println!("Promoted task: {}", task.text);
                    db.save(db_path)?;
                }
                Err(e) => println!("{e}"),
            }
        }

        ShellCommand::Demote { index } => {
            let record = db.ensure_record(user);
            match ops::demote(record, index) {
                Ok(task) => {
                    println!("Demoted task: {}", task.text);
                    db.save(db_path)?;
                }
                Err(e) => println!("{e}"),
            }
        }

        ShellCommand::Priorities => match db.record(user) {
            Some(record) if ops::list_priorities(record).count() > 0 => {
                for (i, task) in ops::list_priorities(record) {
                    println!("{}", task.display_line(i));
                }
            }
            _ => println!("No priority tasks."),
        },

        ShellCommand::Recommend { style } => {
            let record = db.ensure_record(user);
            match recommend::recommend(record, style, &mut rand::thread_rng()) {
                Some(task) => {
                    println!("Recommended: {}", task.text);
                    db.save(db_path)?;
                }
                None => println!("Nothing to recommend (no unfinished tasks)."),
            }
        }

        // The shell always uses the splitter; AI generation goes through
        // `donext generate --ai` where credential errors render properly.
        ShellCommand::Generate { prompt } => {
            let record = db.ensure_record(user);
            let added = generate::generate_fallback(record, &prompt);
            println!("Generated and added {added} tasks.");
            db.save(db_path)?;
        }

        ShellCommand::Help => {
            println!("Commands:");
            println!("  add <text>                    add a task (prompts for a category)");
            println!("  list [category]               list tasks, optionally one category");
            println!("  remove <n> | done <n>         delete / complete by index");
            println!("  select <n> | unselect         set / clear the current task");
            println!("  current                       show the current task");
            println!("  promote <n> | demote <n>      set / clear the priority flag");
            println!("  priorities                    list priority tasks");
            println!("  recommend [type|dispersed]    pick the next task to work on");
            println!("  generate <prompt>             split a prompt into tasks");
            println!("  quit                          leave the shell");
        }

        // Handled by the loop.
        ShellCommand::Quit => {}
    }

    Ok(())
}
