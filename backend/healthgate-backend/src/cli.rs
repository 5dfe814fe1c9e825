use clap::{Parser, Subcommand};

/// Parsed command-line arguments.
#[derive(Parser, Debug)]
#[command(name = "healthgate", version)]
#[command(about = "Credential-gated health-check endpoints")]
pub struct CliArgs {
    /// Path to configuration file (.toml, .yaml/.yml or .json)
    #[arg(short = 'c', long = "config-path", env = "HEALTHGATE_CONFIG_PATH")]
    pub config_path: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Print an Argon2id hash suitable for `auth.password_hash`
    HashPassword {
        /// Plaintext password to hash
        password: String,
    },
}

impl CliArgs {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
