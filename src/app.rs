//! Application wiring: config, vault, shared session, stores, and the one
//! place that reacts to session expiry.

use std::path::Path;
use std::sync::Arc;

use color_eyre::{eyre::eyre, Result};
use tracing::warn;

use crate::api::{ApiClient, ProgressFn};
use crate::cli::{read_payload, Command, InvoiceCommand, LogoCommand};
use crate::config::Config;
use crate::event::{SessionEvent, SessionEvents};
use crate::guard::{self, GuardDecision};
use crate::invoices::InvoiceStore;
use crate::session::types::{LoginCredentials, LogoFile, ProfileUpdate, SignupData};
use crate::session::{SessionHandle, SessionStore};
use crate::vault::{SqliteVault, Vault};

/// Main application state.
pub struct App {
  config: Config,
  session: SessionStore,
  invoices: InvoiceStore,
  events: SessionEvents,
  vault: Arc<dyn Vault>,
}

impl App {
  /// Wire up the app against the default on-disk vault.
  pub fn new(config: Config) -> Result<Self> {
    let vault = Arc::new(SqliteVault::open()?);
    Self::with_vault(config, vault)
  }

  /// Wire up the app against an explicit vault (tests use an in-memory one).
  pub fn with_vault(config: Config, vault: Arc<dyn Vault>) -> Result<Self> {
    let shared = SessionHandle::new();
    let (events_tx, events) = SessionEvents::channel();

    let api = ApiClient::new(
      &config.api.base_url,
      shared.clone(),
      vault.clone(),
      events_tx,
    )?;
    let session = SessionStore::new(api.clone(), shared, vault.clone());
    session.restore()?;

    let invoices = InvoiceStore::new(api);

    Ok(Self {
      config,
      session,
      invoices,
      events,
      vault,
    })
  }

  /// Run one command, then let the expiry handler report any forced
  /// "navigation" back to the login entry point.
  pub async fn run(&mut self, command: Command) -> Result<()> {
    let outcome = self.execute(command).await;

    if let Some(SessionEvent::Expired) = self.events.try_next() {
      warn!("session expired during command");
      eprintln!("Your session has expired. Redirecting to login: run `invogen login`.");
    }

    outcome
  }

  async fn execute(&mut self, command: Command) -> Result<()> {
    match self.check_route(&command) {
      GuardDecision::Allow => {}
      GuardDecision::RedirectToLogin => {
        return Err(eyre!("You are not signed in. Run `invogen login` first."));
      }
      GuardDecision::RedirectToDashboard => {
        println!("Already signed in; nothing to do. Try `invogen invoices list`.");
        return Ok(());
      }
    }

    match command {
      Command::Signup {
        email,
        password,
        full_name,
        company_name,
        address,
        phone,
      } => {
        let response = self
          .session
          .signup(&SignupData {
            email,
            password,
            full_name,
            company_name,
            address,
            phone,
          })
          .await?;
        println!("Signed up and logged in as {}", display_name(&response.user));
      }
      Command::Login { email, password } => {
        let response = self
          .session
          .login(&LoginCredentials { email, password })
          .await?;
        println!("Logged in as {}", display_name(&response.user));
      }
      Command::Logout => {
        self.session.logout()?;
        println!("Logged out.");
      }
      Command::Status => {
        if self.session.is_authenticated() {
          println!("Status: authenticated");
          if let Some(at) = self.vault.stored_at(crate::vault::keys::TOKEN)? {
            println!("Signed in since: {}", at.format("%Y-%m-%d %H:%M:%S UTC"));
          }
          if let Some(user) = self.session.user() {
            println!("{}", serde_json::to_string_pretty(&user)?);
          }
        } else {
          println!("Status: anonymous");
        }
      }
      Command::Whoami => {
        let user = self.session.fetch_profile().await?;
        println!("{}", serde_json::to_string_pretty(&user)?);
      }
      Command::Profile {
        email,
        password,
        full_name,
        company_name,
        address,
        phone,
        logo,
      } => {
        let logo = logo.map(|path| LogoFile::read(&path)).transpose()?;
        let user = self
          .session
          .update_profile(
            &ProfileUpdate {
              email,
              password,
              full_name,
              company_name,
              address,
              phone,
            },
            logo,
          )
          .await?;
        println!("{}", serde_json::to_string_pretty(&user)?);
      }
      Command::Logo { command } => match command {
        LogoCommand::Upload { file } => {
          let logo = LogoFile::read(&file)?;
          let progress: ProgressFn = Arc::new(|percent| {
            eprint!("\rUploading... {}%", percent);
            if percent >= 100 {
              eprintln!();
            }
          });
          let payload = self.session.upload_logo(Some(logo), Some(progress)).await?;
          println!("{}", serde_json::to_string_pretty(&payload)?);
        }
        LogoCommand::Remove => {
          self.session.remove_logo()?;
          println!("Logo removed.");
        }
      },
      Command::Invoices(command) => self.execute_invoice(command).await?,
    }

    Ok(())
  }

  async fn execute_invoice(&mut self, command: InvoiceCommand) -> Result<()> {
    match command {
      InvoiceCommand::List => {
        self.invoices.fetch_invoices().await?;
        println!("{}", serde_json::to_string_pretty(self.invoices.invoices())?);
      }
      InvoiceCommand::Show { id } => {
        let invoice = self.invoices.fetch_invoice(id).await?;
        println!("{}", serde_json::to_string_pretty(&invoice)?);
      }
      InvoiceCommand::Create { file, data } => {
        let payload = read_payload(file.as_ref(), data.as_deref())?;
        let invoice = self.invoices.create_invoice(&payload).await?;
        println!("Created {}", invoice.invoice_number);
      }
      InvoiceCommand::Update { id, file, data } => {
        let payload = read_payload(file.as_ref(), data.as_deref())?;
        let invoice = self.invoices.update_invoice(id, &payload).await?;
        println!("Updated {}", invoice.invoice_number);
      }
      InvoiceCommand::Delete { id } => {
        self.invoices.delete_invoice(id).await?;
        println!("Deleted invoice {}", id);
      }
      InvoiceCommand::Pdf { id, out } => {
        // Use the cached invoice number when the list has been fetched.
        let number = self
          .invoices
          .invoices()
          .iter()
          .find(|inv| inv.id == id)
          .map(|inv| inv.invoice_number.clone());

        let dest_dir = out
          .or_else(|| self.config.download_dir.clone())
          .unwrap_or_else(|| Path::new(".").to_path_buf());
        let saved = self
          .invoices
          .download_pdf(id, number.as_deref(), &dest_dir)
          .await?;
        println!("Saved {}", saved.display());
      }
    }
    Ok(())
  }

  fn check_route(&self, command: &Command) -> GuardDecision {
    match guard::route(command.route_name()) {
      Some(route) => guard::check(route, self.session.is_authenticated()),
      None => GuardDecision::Allow,
    }
  }
}

fn display_name(user: &crate::session::types::UserProfile) -> String {
  user
    .full_name
    .clone()
    .or_else(|| user.email.clone())
    .unwrap_or_else(|| "unknown user".to_string())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::vault::MemoryVault;

  #[tokio::test]
  async fn test_protected_command_is_guarded_while_anonymous() {
    let vault = Arc::new(MemoryVault::new());
    let mut app = App::with_vault(Config::default(), vault).unwrap();

    let result = app.run(Command::Invoices(InvoiceCommand::List)).await;
    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("not signed in"));
  }

  #[tokio::test]
  async fn test_entry_command_short_circuits_while_authenticated() {
    use crate::vault::keys;

    let vault = Arc::new(MemoryVault::new());
    vault.put(keys::TOKEN, "T1").unwrap();
    let mut app = App::with_vault(Config::default(), vault).unwrap();

    // Guard redirects to the dashboard before any network call happens.
    let result = app
      .run(Command::Login {
        email: "a@b.com".to_string(),
        password: "x".to_string(),
      })
      .await;
    assert!(result.is_ok());
  }
}
