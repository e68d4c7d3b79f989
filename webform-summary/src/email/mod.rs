//! Outbound email
//!
//! Summaries are delivered through an [`EmailSender`]. Two backends ship with the crate:
//!
//! - [`SmtpBackend`] delivers through an SMTP relay using `lettre`
//! - [`ConsoleBackend`] prints emails, for rehearsing a run without sending anything
//!
//! ```rust,no_run
//! use webform_summary::email::{Attachment, Email, EmailSender, SmtpBackend};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let backend = SmtpBackend::from_env()?;
//!
//! let email = Email::new()
//!     .to("office@example.com")
//!     .from("noreply@example.com")
//!     .subject("Webform summary")
//!     .attach(Attachment::new("contact.csv", "text/csv", b"sid\n1\n".to_vec()));
//!
//! backend.send(email).await?;
//! # Ok(())
//! # }
//! ```

mod backend;
mod builder;
mod error;
mod sender;

pub use backend::{
    console::ConsoleBackend,
    smtp::{SmtpBackend, SmtpConfig},
};
pub use builder::{Attachment, Email};
pub use error::EmailError;
pub use sender::EmailSender;

#[cfg(test)]
pub use sender::MockEmailSender;
