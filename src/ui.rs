// UI layer: the interactive prompt loop. Input goes through `Prompter` so
// the loop can be driven by `dialoguer` in the terminal or by a script in
// tests.

use crate::api::UploadOutcome;
use crate::config::PromptDefaults;
use crate::error::{Error, Result};
use crate::listing::FileLister;
use crate::transfer::{FileOutcome, Orchestrator, PreviewReport, TransferRequest, UploadReport};
use dialoguer::console::Style;
use dialoguer::Input;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

/// Reads one line of input for a question.
pub trait Prompter {
    /// Raw answer to `question`. An empty answer means "use `default`".
    fn read(&mut self, question: &str, default: &str) -> Result<String>;
}

/// Prompts on the terminal with `dialoguer`.
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn read(&mut self, question: &str, default: &str) -> Result<String> {
        let mut input = Input::<String>::new();
        input.with_prompt(question).allow_empty(true);
        if !default.is_empty() {
            input.default(default.to_string());
        }
        Ok(input.interact_text()?)
    }
}

/// Ask `question`, substituting `default` for an empty answer.
/// `quit` or `exit` yields [`Error::Quit`].
pub fn ask<P: Prompter + ?Sized>(
    prompter: &mut P,
    question: &str,
    default: &str,
) -> Result<String> {
    let answer = prompter.read(question, default)?;
    let answer = answer.trim();
    if answer == "quit" || answer == "exit" {
        return Err(Error::Quit);
    }
    if answer.is_empty() {
        Ok(default.to_string())
    } else {
        Ok(answer.to_string())
    }
}

/// Where the prompt loop is.
#[derive(Debug)]
pub enum State {
    CollectingInput,
    Previewing(TransferRequest),
    ConfirmingWrite(TransferRequest),
    Uploading(TransferRequest),
    Done(UploadReport),
    Quit,
}

/// How the loop ended.
#[derive(Debug)]
pub enum Exit {
    Completed(UploadReport),
    Quit,
}

pub struct Session<'a, P, L> {
    prompter: P,
    orchestrator: &'a Orchestrator<L>,
    defaults: PromptDefaults,
}

impl<'a, P: Prompter, L: FileLister> Session<'a, P, L> {
    pub fn new(prompter: P, orchestrator: &'a Orchestrator<L>, defaults: PromptDefaults) -> Self {
        Session {
            prompter,
            orchestrator,
            defaults,
        }
    }

    /// Answers that will be offered as defaults at the next prompt.
    pub fn defaults(&self) -> &PromptDefaults {
        &self.defaults
    }

    /// Run until the upload finishes or the user quits. Preview failures
    /// are reported and the user is asked again.
    pub fn run(&mut self) -> Result<Exit> {
        let mut state = State::CollectingInput;
        loop {
            state = match self.step(state) {
                Ok(State::Done(report)) => return Ok(Exit::Completed(report)),
                Ok(State::Quit) => return Ok(Exit::Quit),
                Ok(next) => next,
                Err(e @ Error::Prompt(_)) => return Err(e),
                Err(e) => {
                    warn!(error = %e, "run aborted");
                    let message = format!("Failed with error: {}", e);
                    println!("{}", Style::new().red().apply_to(message));
                    State::CollectingInput
                }
            };
        }
    }

    /// Advance one state. A `quit`/`exit` answer moves to [`State::Quit`].
    pub fn step(&mut self, state: State) -> Result<State> {
        match self.advance(state) {
            Err(Error::Quit) => Ok(State::Quit),
            other => other,
        }
    }

    fn advance(&mut self, state: State) -> Result<State> {
        match state {
            State::CollectingInput => Ok(State::Previewing(self.collect()?)),
            State::Previewing(req) => {
                let preview = self.orchestrator.preview(&req)?;
                self.print_preview(&req, &preview);
                Ok(State::ConfirmingWrite(req))
            }
            State::ConfirmingWrite(req) => {
                let answer = ask(&mut self.prompter, "Write files?", &self.defaults.write)?;
                if answer.to_lowercase().starts_with('y') {
                    Ok(State::Uploading(req))
                } else {
                    Ok(State::CollectingInput)
                }
            }
            State::Uploading(req) => {
                let report = upload_with_progress(self.orchestrator, &req)?;
                Ok(State::Done(report))
            }
            done @ (State::Done(_) | State::Quit) => Ok(done),
        }
    }

    fn collect(&mut self) -> Result<TransferRequest> {
        let d = &mut self.defaults;
        d.dir = ask(&mut self.prompter, "Data file directory", &d.dir)?;
        d.study = ask(&mut self.prompter, "Study name", &d.study)?;
        d.version = ask(&mut self.prompter, "Study version", &d.version)?;
        d.osf = ask(&mut self.prompter, "OSF repository id", &d.osf)?;
        let req = TransferRequest {
            source_dir: d.dir.clone(),
            study: d.study.clone(),
            version: d.version.clone(),
            repo_id: d.osf.clone(),
        };
        info!(?req, "collected transfer request");
        Ok(req)
    }

    fn print_preview(&self, req: &TransferRequest, preview: &PreviewReport) {
        let green = Style::new().green();
        let white = Style::new().white();
        println!(
            "{} {} {}",
            green.apply_to("Found"),
            white.apply_to(preview.files.len()),
            green.apply_to("file(s) to upload to main OSF directory.")
        );
        println!(
            "{} {} {}",
            green.apply_to("Found"),
            white.apply_to(preview.dictionaries.len()),
            green.apply_to("data dictionary files.")
        );
        println!(
            "{} {} {}",
            green.apply_to("Found"),
            white.apply_to(preview.raw_files.len()),
            green.apply_to("file(s) to upload to raw OSF directory.")
        );
        println!(
            "{} {}",
            green.apply_to("Found raw data directory"),
            white.apply_to(self.orchestrator.raw_location(req, &preview.raw_path))
        );
    }
}

fn outcome_line(file: &FileOutcome) -> String {
    let (word, style) = match file.outcome {
        UploadOutcome::Succeeded => ("okay", Style::new().green()),
        UploadOutcome::Skipped => ("skipped", Style::new().yellow()),
        UploadOutcome::Failed(_) => ("failed", Style::new().red()),
    };
    let mut line = format!("Upload of {} {}.", file.name, style.apply_to(word));
    if let UploadOutcome::Failed(reason) = &file.outcome {
        line.push('\n');
        line.push_str(&Style::new().red().apply_to(reason).to_string());
    }
    line
}

/// Run the upload with a progress bar, printing each file's outcome above
/// it, then the summary line.
fn upload_with_progress<L: FileLister>(
    orchestrator: &Orchestrator<L>,
    req: &TransferRequest,
) -> Result<UploadReport> {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {pos} uploaded {msg}") {
        pb.set_style(style);
    }
    pb.set_message("Uploading...");

    let report = orchestrator.execute_with(req, |file| {
        pb.println(outcome_line(file));
        pb.inc(1);
    });
    pb.finish_and_clear();
    let report = report?;

    let (ok, skipped, failed) = report.counts();
    println!(
        "Upload complete. Successfully uploaded {} files, {} skipped, {} errors.",
        Style::new().green().apply_to(ok),
        Style::new().yellow().apply_to(skipped),
        Style::new().red().apply_to(failed)
    );
    Ok(report)
}
