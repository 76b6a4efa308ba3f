// Entrypoint for the CLI application.
// - Keeps `main` small: build the clients and hand them to the prompt loop.
// - Quitting on request is a normal exit (status 0).

use osf_upload::api::OsfClient;
use osf_upload::config::{PromptDefaults, Settings};
use osf_upload::logging;
use osf_upload::transfer::Orchestrator;
use osf_upload::ui::{Exit, Session, TerminalPrompter};
use anyhow::Context;
use dialoguer::console::Style;
use reqwest::blocking::Client;

fn main() -> anyhow::Result<()> {
    if logging::init_logging().is_err() {
        logging::init_logging_stderr();
    }

    let settings = Settings::from_env();
    if let Some(notice) = settings.missing_token_notice() {
        println!("{}", Style::new().yellow().apply_to(notice));
    }
    let client = Client::builder()
        .build()
        .context("Failed to build HTTP client")?;
    let osf = OsfClient::new(client.clone(), &settings);
    let orchestrator = Orchestrator::with_html_lister(client, osf);

    let mut session = Session::new(TerminalPrompter, &orchestrator, PromptDefaults::default());
    match session.run().context("Prompt loop failed")? {
        Exit::Completed(report) => {
            tracing::info!(files = report.outcomes.len(), "run finished");
        }
        Exit::Quit => println!("Quitting on request. Thanks for using osf-upload!"),
    }
    Ok(())
}
