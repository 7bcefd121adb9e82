use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use fitadmin_core::listing::ContentFilter;
use fitadmin_core::ContentKind;

#[derive(Parser)]
#[command(name = "fitadmin")]
#[command(about = "Manage exercise blocks and meals from the command line")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// CLI profile name (backend URL and stored credentials)
    #[arg(long, global = true, value_name = "NAME")]
    pub profile: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show usage, subscription and income totals
    Dashboard {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List exercise blocks and meals
    List {
        /// Which kind to show
        #[arg(long, value_enum, default_value_t = FilterArg::All)]
        filter: FilterArg,
        /// Page to show, 10 items per page
        #[arg(short, long, default_value = "1")]
        page: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print one entity as an editable JSON document
    Show {
        /// Content kind (exercise or meal)
        kind: ContentKind,
        /// Entity ID
        id: String,
    },
    /// Create an entity from a JSON document
    #[command(alias = "add")]
    Create {
        /// Content kind (exercise or meal)
        kind: ContentKind,
        #[command(flatten)]
        input: DocumentArgs,
    },
    /// Edit an entity; opens $EDITOR when no document is given
    Edit {
        /// Content kind (exercise or meal)
        kind: ContentKind,
        /// Entity ID
        id: String,
        #[command(flatten)]
        input: DocumentArgs,
        /// Remove the main image
        #[arg(long, conflicts_with = "image")]
        clear_image: bool,
    },
    /// Delete an entity
    Delete {
        /// Content kind (exercise or meal)
        kind: ContentKind,
        /// Entity ID
        id: String,
    },
    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: CompletionShell,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
    /// Configure CLI profiles
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Sign in to the admin backend
    Auth {
        #[command(subcommand)]
        command: AuthCommands,
    },
}

#[derive(clap::Args, Debug, Default)]
pub struct DocumentArgs {
    /// JSON document path; `-` reads stdin
    #[arg(short, long, value_name = "PATH")]
    pub file: Option<PathBuf>,
    /// Main image to upload
    #[arg(long, value_name = "PATH")]
    pub image: Option<PathBuf>,
    /// Step image as <position>=<path>, positions start at 1
    #[arg(long = "step-image", value_name = "POS=PATH")]
    pub step_images: Vec<String>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum FilterArg {
    All,
    Exercise,
    Meal,
}

impl From<FilterArg> for ContentFilter {
    fn from(value: FilterArg) -> Self {
        match value {
            FilterArg::All => Self::All,
            FilterArg::Exercise => Self::Exercise,
            FilterArg::Meal => Self::Meal,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Initialize or update a profile
    Init {
        /// Profile name to initialize
        #[arg(long, value_name = "NAME")]
        profile: Option<String>,
        /// Backend base URL
        #[arg(long, value_name = "URL")]
        api_base_url: Option<String>,
        /// Request timeout in seconds
        #[arg(long, value_name = "SECS")]
        request_timeout_secs: Option<u64>,
        /// Show sample content and keep drafts locally when offline
        #[arg(long, value_name = "BOOL")]
        offline_demo: Option<bool>,
        /// Keep current active profile instead of activating this one
        #[arg(long)]
        no_activate: bool,
    },
    /// Print the effective client configuration
    Show {
        /// Optional profile override
        #[arg(long, value_name = "NAME")]
        profile: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum AuthCommands {
    /// Sign in with email or phone and store the token
    Login {
        /// Optional profile override
        #[arg(long, value_name = "NAME")]
        profile: Option<String>,
        /// Admin email address or phone number
        #[arg(long, alias = "email", value_name = "LOGIN")]
        login: String,
        /// Admin password
        #[arg(long, env = "FITADMIN_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Show whether the profile holds a valid token
    Status {
        /// Optional profile override
        #[arg(long, value_name = "NAME")]
        profile: Option<String>,
    },
    /// Clear the stored token
    Logout {
        /// Optional profile override
        #[arg(long, value_name = "NAME")]
        profile: Option<String>,
    },
}
