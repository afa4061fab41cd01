//! Clap derive structures for the `branchwatch` CLI.
//!
//! Defines the command tree, global flags, and shared argument groups.

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// branchwatch -- delivery-platform availability for restaurant branches
#[derive(Debug, Parser)]
#[command(
    name = "branchwatch",
    version,
    about = "Watch restaurant branches across delivery platforms",
    long_about = "Tracks whether each restaurant branch is reachable on Yemeksepeti,\n\
        Getir, Migros and Trendyol, using the branch status backend.\n\n\
        Log in once with `branchwatch login`; the session is kept per profile.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Backend profile to use
    #[arg(long, short = 'p', env = "BRANCHWATCH_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Backend URL (overrides profile)
    #[arg(long, short = 's', env = "BRANCHWATCH_SERVER", global = true)]
    pub server: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "BRANCHWATCH_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "BRANCHWATCH_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds
    #[arg(long, env = "BRANCHWATCH_TIMEOUT", default_value = "30", global = true)]
    pub timeout: u64,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Log in and keep the session for this profile
    Login(LoginArgs),

    /// Revoke the session and forget it locally
    Logout,

    /// Show the logged-in user
    Whoami,

    /// Create an operator account
    Register(RegisterArgs),

    /// Branch counts and the restaurant table
    #[command(alias = "dash")]
    Overview,

    /// Manage restaurants
    #[command(alias = "r")]
    Restaurants(RestaurantsArgs),

    /// Manage branches and trigger status checks
    #[command(alias = "b")]
    Branches(BranchesArgs),

    /// Re-check every branch on a fixed interval
    Watch(WatchArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Session ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct LoginArgs {
    /// Login email (defaults to the profile's email, then prompts)
    #[arg(long, short = 'e')]
    pub email: Option<String>,

    /// Read the password from the first line of stdin
    #[arg(long)]
    pub password_stdin: bool,
}

#[derive(Debug, Args)]
pub struct RegisterArgs {
    /// Account email
    #[arg(long)]
    pub email: Option<String>,

    /// First name
    #[arg(long)]
    pub first_name: Option<String>,

    /// Last name
    #[arg(long)]
    pub last_name: Option<String>,

    /// Account role
    #[arg(long, default_value = "branch-manager")]
    pub role: RoleArg,

    /// Read the password from the first line of stdin
    #[arg(long)]
    pub password_stdin: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum RoleArg {
    Admin,
    RestaurantOwner,
    BranchManager,
}

// ── Restaurants ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct RestaurantsArgs {
    #[command(subcommand)]
    pub command: RestaurantsCommand,
}

#[derive(Debug, Subcommand)]
pub enum RestaurantsCommand {
    /// List restaurants with branch counts
    #[command(alias = "ls")]
    List,

    /// Create a restaurant together with its first branch
    Add(AddRestaurantArgs),

    /// Delete a restaurant and all of its branches
    #[command(alias = "rm")]
    Delete {
        /// Restaurant ID
        id: i64,
    },
}

#[derive(Debug, Args)]
pub struct AddRestaurantArgs {
    /// Restaurant name
    #[arg(long)]
    pub name: Option<String>,

    #[command(flatten)]
    pub branch: BranchFieldArgs,
}

// ── Branches ─────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct BranchesArgs {
    #[command(subcommand)]
    pub command: BranchesCommand,
}

#[derive(Debug, Subcommand)]
pub enum BranchesCommand {
    /// List branches with per-platform status
    #[command(alias = "ls")]
    List {
        /// Only branches whose name contains this text (case-insensitive)
        #[arg(long, short = 'S')]
        search: Option<String>,

        /// Only branches of this restaurant
        #[arg(long, short = 'r')]
        restaurant: Option<i64>,
    },

    /// Add a branch to an existing restaurant
    Add(AddBranchArgs),

    /// Delete a branch
    #[command(alias = "rm")]
    Delete {
        /// Branch ID
        id: i64,
    },

    /// Re-check one branch on every platform
    Check {
        /// Branch ID
        id: i64,
    },

    /// Re-check every branch, one after another
    CheckAll,
}

#[derive(Debug, Args)]
pub struct AddBranchArgs {
    /// Restaurant the branch belongs to
    #[arg(long, short = 'r')]
    pub restaurant: i64,

    #[command(flatten)]
    pub branch: BranchFieldArgs,
}

/// Branch fields shared by `restaurants add` and `branches add`.
#[derive(Debug, Args)]
pub struct BranchFieldArgs {
    /// Branch name
    #[arg(long)]
    pub branch_name: Option<String>,

    /// Street address
    #[arg(long)]
    pub address: Option<String>,

    /// Where outage notifications are sent
    #[arg(long)]
    pub notification_email: Option<String>,

    /// Telegram username for notifications
    #[arg(long)]
    pub telegram_username: Option<String>,

    /// Yemeksepeti restaurant page URL
    #[arg(long)]
    pub yemeksepeti_url: Option<String>,

    /// Getir restaurant page URL
    #[arg(long)]
    pub getir_url: Option<String>,

    /// Migros API key
    #[arg(long)]
    pub migros_api_key: Option<String>,

    /// Migros restaurant ID
    #[arg(long)]
    pub migros_restaurant_id: Option<String>,

    /// Trendyol supplier ID
    #[arg(long)]
    pub trendyol_supplier_id: Option<String>,

    /// Trendyol API key
    #[arg(long)]
    pub trendyol_api_key: Option<String>,

    /// Trendyol API secret
    #[arg(long)]
    pub trendyol_api_secret: Option<String>,
}

// ── Watch ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Seconds between batches (defaults to the profile's check_interval)
    #[arg(long, short = 'i')]
    pub interval: Option<u64>,

    /// Run a single batch and exit
    #[arg(long)]
    pub once: bool,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Interactive configuration wizard
    Init,

    /// Show the current configuration (secrets masked)
    Show,

    /// Set a profile value
    Set {
        /// Key: server, email, password_env, insecure, timeout, check_interval, ca_cert
        key: String,
        /// Value
        value: String,
    },

    /// List profiles
    Profiles,

    /// Make a profile the default
    Use {
        /// Profile name
        name: String,
    },

    /// Store the login password in the system keyring
    SetPassword {
        /// Profile name (defaults to the active profile)
        #[arg(long)]
        profile: Option<String>,
    },
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Target shell
    pub shell: clap_complete::Shell,
}
