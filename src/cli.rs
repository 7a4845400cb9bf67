use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::metrics::SkipPrecedence;

#[derive(Parser, Debug)]
#[command(name = "evolve-audit")]
#[command(about = "Rule knowledge base auditing and Markdown sync for agent workflows")]
#[command(version)]
pub struct Cli {
    /// Project root holding EVOLVE.md and the evolve/ directory
    #[arg(long, global = true, env = "EVOLVE_PROJECT_ROOT", default_value = ".")]
    pub project_root: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Apply a one-line score card, e.g. "R-001:+hit R-002:+vio+err"
    Score {
        card: String,
        /// Comma separated scope keywords; unscored matches get auto_skip+1
        #[arg(long)]
        scope: Option<String>,
        #[arg(long)]
        platform: Option<String>,
    },

    /// Sync counters into EVOLVE.md, rule details and platform files
    Sync {
        /// Limit EVOLVE.md to universal rules plus this platform's lessons
        #[arg(long)]
        evolve_platform: Option<String>,
        /// Sync only this platform's target file
        #[arg(long)]
        platform: Option<String>,
        #[arg(long)]
        no_platform_sync: bool,
        /// Which skip threshold names the reason when both are crossed
        #[arg(long, value_enum, default_value_t = PrecedenceArg::Manual)]
        review_precedence: PrecedenceArg,
    },

    /// Sync rule details and platform files only
    SyncPlatform {
        #[arg(long)]
        platform: Option<String>,
    },

    /// Curation report with numbered suggestions
    Report,

    /// Pick report suggestions by number, e.g. "1,3,5"
    Select {
        #[arg(required_unless_present = "clear")]
        numbers: Option<String>,
        /// Reset every selection
        #[arg(long)]
        clear: bool,
    },

    /// List scopes and keywords of non-archived rules
    Scopes {
        #[arg(long)]
        platform: Option<String>,
    },

    /// Rules matching scope keywords and/or a platform
    Filter {
        keywords: Vec<String>,
        #[arg(long)]
        platform: Option<String>,
    },

    /// Platform lessons worth promoting to user-level config
    Promote {
        #[arg(long)]
        platform: Option<String>,
    },

    /// Read-only health audit
    Health {
        #[arg(long)]
        json: bool,
        /// Also write the JSON report to this file
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PrecedenceArg {
    Manual,
    Auto,
}

impl From<PrecedenceArg> for SkipPrecedence {
    fn from(arg: PrecedenceArg) -> Self {
        match arg {
            PrecedenceArg::Manual => SkipPrecedence::Manual,
            PrecedenceArg::Auto => SkipPrecedence::Auto,
        }
    }
}
