//! `clawkit lifeos …` handlers.

use std::io::{self, Read, StdinLock, Stdout};
use std::path::PathBuf;

use chrono::Local;
use clap::{Args, Subcommand};

use crate::context::Toolkit;
use crate::error::Result;
use crate::lifeos::brain_dump::process_brain_dump;
use crate::lifeos::journal::run_journal;
use crate::lifeos::research::run_research;
use crate::lifeos::weekly::{run_weekly_checkin, run_weekly_setup};
use crate::lifeos::{title_case, LifeOsPaths, Prompter};

#[derive(Args, Debug)]
pub struct LifeOsArgs {
    #[command(subcommand)]
    pub command: LifeOsCommands,
}

#[derive(Subcommand, Debug)]
pub enum LifeOsCommands {
    /// Evening reflection with mood and energy check
    Journal,
    /// Categorise a brain dump from FILE or stdin
    BrainDump {
        file: Option<PathBuf>,
    },
    /// Configure weekly metrics and reflection prompts
    WeeklySetup,
    /// Record this week's metrics and reflections
    WeeklyCheckin,
    /// Log one research trend
    Research,
}

pub fn handle(tk: &Toolkit, args: LifeOsArgs) -> Result<()> {
    let paths = LifeOsPaths::from_toolkit(&tk.paths);
    let now = Local::now().naive_local();

    match args.command {
        LifeOsCommands::Journal => {
            run_journal(&mut terminal(), &paths, now)?;
        }
        LifeOsCommands::BrainDump { file } => {
            let text = match file {
                Some(path) => std::fs::read_to_string(path)?,
                None => {
                    eprintln!("🦊 Brain Dump - enter your thoughts (Ctrl+D to finish):");
                    let mut buf = String::new();
                    io::stdin().lock().read_to_string(&mut buf)?;
                    buf
                }
            };
            if text.trim().is_empty() {
                println!("No content provided.");
                return Ok(());
            }
            let result = process_brain_dump(&text, &paths, now)?;
            println!("\n✅ Brain dump processed and saved to: {}", result.path.display());
            println!("\n📊 Summary: {} thoughts categorized", result.categorized.total());
            for (category, items) in result.categorized.non_empty() {
                println!("  - {}: {}", title_case(&category.to_string()), items.len());
            }
            if !result.actions.is_empty() {
                println!("\n⚡ {} potential action items found", result.actions.len());
            }
        }
        LifeOsCommands::WeeklySetup => {
            run_weekly_setup(&mut terminal(), &paths)?;
        }
        LifeOsCommands::WeeklyCheckin => {
            run_weekly_checkin(&mut terminal(), &paths, now)?;
        }
        LifeOsCommands::Research => {
            run_research(&mut terminal(), &paths, now)?;
        }
    }
    Ok(())
}

fn terminal() -> Prompter<StdinLock<'static>, Stdout> {
    Prompter::new(io::stdin().lock(), io::stdout())
}
