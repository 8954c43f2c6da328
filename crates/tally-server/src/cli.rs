use clap::{Parser, Subcommand, ValueEnum};
use tally_core::enums::Role;

/// Top-level CLI parser for the `medal-tally` binary.
#[derive(Debug, Parser)]
#[command(name = "medal-tally", version, about = "Medal tally web service")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbose mode (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the HTTP server.
    Serve {
        /// Override `server.bind`
        #[arg(long)]
        bind: Option<String>,
        /// Override `server.port`
        #[arg(long)]
        port: Option<u16>,
    },
    /// Manage accounts and roles.
    User {
        #[command(subcommand)]
        action: UserCommand,
    },
}

#[derive(Debug, Subcommand)]
pub enum UserCommand {
    /// Create a local account.
    Add {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long, value_enum)]
        role: RoleArg,
    },
    /// Assign a role to any user ID, including external (Clerk) subjects.
    Role {
        user_id: String,
        #[arg(value_enum)]
        role: RoleArg,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum RoleArg {
    Admin,
    #[value(name = "tabHead", alias = "tab-head")]
    TabHead,
    Committee,
}

impl From<RoleArg> for Role {
    fn from(arg: RoleArg) -> Self {
        match arg {
            RoleArg::Admin => Self::Admin,
            RoleArg::TabHead => Self::TabHead,
            RoleArg::Committee => Self::Committee,
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::{CommandFactory, Parser};

    use super::*;

    #[test]
    fn clap_command_tree_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_user_add() {
        let cli = Cli::parse_from([
            "medal-tally",
            "user",
            "add",
            "--email",
            "head@school.edu",
            "--password",
            "correct horse",
            "--role",
            "tabHead",
        ]);
        let Commands::User {
            action: UserCommand::Add { email, role, .. },
        } = cli.command
        else {
            panic!("expected user add");
        };
        assert_eq!(email, "head@school.edu");
        assert_eq!(Role::from(role), Role::TabHead);
    }

    #[test]
    fn serve_overrides_are_optional() {
        let cli = Cli::parse_from(["medal-tally", "serve", "--port", "9000"]);
        assert!(matches!(
            cli.command,
            Commands::Serve {
                bind: None,
                port: Some(9000)
            }
        ));
    }
}
