//! Command-line surface. Thin plumbing over the stores; the interesting
//! behavior lives in `session` and `invoices`.

use clap::{Parser, Subcommand};
use color_eyre::{eyre::eyre, Result};
use serde_json::Value;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "invogen")]
#[command(about = "A command-line client for the InvoiceGen invoicing service")]
#[command(version)]
pub struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/invogen/config.yaml)
  #[arg(short, long)]
  pub config: Option<PathBuf>,

  #[command(subcommand)]
  pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
  /// Register a new account and sign in
  Signup {
    #[arg(long)]
    email: String,
    #[arg(long)]
    password: String,
    #[arg(long)]
    full_name: Option<String>,
    #[arg(long)]
    company_name: Option<String>,
    #[arg(long)]
    address: Option<String>,
    #[arg(long)]
    phone: Option<String>,
  },
  /// Sign in with an existing account
  Login {
    #[arg(long)]
    email: String,
    #[arg(long)]
    password: String,
  },
  /// Sign out and forget the persisted session
  Logout,
  /// Show the session state and cached profile
  Status,
  /// Fetch the profile from the service
  Whoami,
  /// Update profile fields
  Profile {
    #[arg(long)]
    email: Option<String>,
    #[arg(long)]
    password: Option<String>,
    #[arg(long)]
    full_name: Option<String>,
    #[arg(long)]
    company_name: Option<String>,
    #[arg(long)]
    address: Option<String>,
    #[arg(long)]
    phone: Option<String>,
    /// Attach a new company logo
    #[arg(long)]
    logo: Option<PathBuf>,
  },
  /// Manage the company logo
  Logo {
    #[command(subcommand)]
    command: LogoCommand,
  },
  /// Work with invoices
  #[command(subcommand)]
  Invoices(InvoiceCommand),
}

#[derive(Subcommand, Debug)]
pub enum LogoCommand {
  /// Upload a logo image (png/jpg/jpeg/gif)
  Upload { file: PathBuf },
  /// Clear the logo locally
  Remove,
}

#[derive(Subcommand, Debug)]
pub enum InvoiceCommand {
  /// List all invoices, newest first
  List,
  /// Show one invoice
  Show { id: i64 },
  /// Create an invoice from a JSON document
  Create {
    /// JSON file with the invoice payload
    #[arg(long, conflicts_with = "data")]
    file: Option<PathBuf>,
    /// Inline JSON payload
    #[arg(long)]
    data: Option<String>,
  },
  /// Update an invoice from a JSON document
  Update {
    id: i64,
    #[arg(long, conflicts_with = "data")]
    file: Option<PathBuf>,
    #[arg(long)]
    data: Option<String>,
  },
  /// Delete an invoice
  Delete { id: i64 },
  /// Download the PDF rendering of an invoice
  Pdf {
    id: i64,
    /// Destination directory (default: configured download dir or cwd)
    #[arg(long)]
    out: Option<PathBuf>,
  },
}

/// Read an invoice payload from `--file` or `--data`.
pub fn read_payload(file: Option<&PathBuf>, data: Option<&str>) -> Result<Value> {
  let raw = match (file, data) {
    (Some(path), _) => std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read {}: {}", path.display(), e))?,
    (None, Some(inline)) => inline.to_string(),
    (None, None) => return Err(eyre!("Provide the invoice payload via --file or --data")),
  };

  serde_json::from_str(&raw).map_err(|e| eyre!("Invalid JSON payload: {}", e))
}

impl Command {
  /// The route this command navigates to, for guard checks.
  pub fn route_name(&self) -> &'static str {
    match self {
      Command::Signup { .. } => "signup",
      Command::Login { .. } => "login",
      Command::Logout | Command::Status => "home",
      Command::Whoami | Command::Profile { .. } | Command::Logo { .. } => "profile-edit",
      Command::Invoices(InvoiceCommand::List) => "dashboard",
      Command::Invoices(InvoiceCommand::Create { .. }) => "invoice-new",
      Command::Invoices(InvoiceCommand::Update { .. }) => "invoice-edit",
      Command::Invoices(_) => "invoice-detail",
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_read_payload_inline() {
    let value = read_payload(None, Some(r#"{"client_name": "Acme"}"#)).unwrap();
    assert_eq!(value["client_name"], "Acme");
  }

  #[test]
  fn test_read_payload_requires_a_source() {
    assert!(read_payload(None, None).is_err());
  }

  #[test]
  fn test_commands_map_to_known_routes() {
    let login = Command::Login {
      email: String::new(),
      password: String::new(),
    };
    assert!(crate::guard::route(login.route_name()).is_some());
    assert!(crate::guard::route(Command::Invoices(InvoiceCommand::List).route_name()).is_some());
  }
}
