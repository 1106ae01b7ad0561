use anyhow::{Context, Result};
use artemisia_context::project::SiteProject;
use artemisia_context::settings::ServerSettings;
use artemisia_server::{AppState, ContactNotifier, SmtpNotifier, SmtpSettings};
use std::sync::Arc;

pub async fn run(port: Option<u16>) -> Result<()> {
    let project = SiteProject::load_cwd().context(
        "Failed to load site. Run this from the directory containing views/.",
    )?;
    let port = port.unwrap_or_else(|| ServerSettings::from_env().port);

    let smtp = SmtpSettings::from_env();
    let missing = smtp.missing();
    if !missing.is_empty() {
        log::warn!(
            "Contact form mail is not configured (missing {}); submissions will fail",
            missing.join(", ")
        );
    }
    let notifier: Arc<dyn ContactNotifier> = Arc::new(SmtpNotifier::new(smtp));

    artemisia_server::run(AppState::new(project, notifier), port).await
}
