//! Live server for the site, and the contact form's mail relay.

mod notify;
mod server;

pub use notify::{ContactMessage, ContactNotifier, NotifyError, SmtpNotifier, SmtpSettings};
pub use server::{router, run, AppState, SEND_FAILED_MESSAGE};
