// Transfer orchestration: preview what a study version would upload, then
// copy the files from the web directory into the OSF repository in two
// phases (main folder, then raw folder).

use crate::api::{OsfClient, UploadOutcome};
use crate::error::{Error, Result};
use crate::listing::{self, FileLister, HtmlDirectoryLister};
use reqwest::blocking::Client;
use tracing::{debug, info, warn};

/// The four answers that define one run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransferRequest {
    pub source_dir: String,
    pub study: String,
    pub version: String,
    pub repo_id: String,
}

impl TransferRequest {
    pub fn filter(&self) -> String {
        listing::filter_token(&self.study, &self.version)
    }

    pub fn raw_source_dir(&self) -> String {
        listing::raw_dir(&self.source_dir)
    }
}

/// What a run would upload, as seen at preview time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PreviewReport {
    pub files: Vec<String>,
    pub dictionaries: Vec<String>,
    pub raw_files: Vec<String>,
    pub raw_path: String,
}

/// Which destination folder a file goes to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Destination {
    Main,
    Raw,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileOutcome {
    pub name: String,
    pub destination: Destination,
    pub outcome: UploadOutcome,
}

/// Outcomes of every attempted file, in processing order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UploadReport {
    pub outcomes: Vec<FileOutcome>,
}

impl UploadReport {
    pub fn succeeded(&self) -> Vec<&str> {
        self.names(|o| matches!(o, UploadOutcome::Succeeded))
    }

    pub fn skipped(&self) -> Vec<&str> {
        self.names(|o| matches!(o, UploadOutcome::Skipped))
    }

    pub fn failed(&self) -> Vec<&str> {
        self.names(|o| matches!(o, UploadOutcome::Failed(_)))
    }

    fn names(&self, pred: impl Fn(&UploadOutcome) -> bool) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|f| pred(&f.outcome))
            .map(|f| f.name.as_str())
            .collect()
    }

    /// (succeeded, skipped, failed)
    pub fn counts(&self) -> (usize, usize, usize) {
        (self.succeeded().len(), self.skipped().len(), self.failed().len())
    }
}

/// Everything execute needs, listed fresh for each call.
struct Plan {
    files: Vec<String>,
    dictionaries: Vec<String>,
    raw_files: Vec<String>,
}

pub struct Orchestrator<L = HtmlDirectoryLister> {
    lister: L,
    osf: OsfClient,
    source: Client,
}

impl Orchestrator<HtmlDirectoryLister> {
    /// Orchestrator that scrapes HTML listings with the same HTTP client it
    /// uses for downloads.
    pub fn with_html_lister(client: Client, osf: OsfClient) -> Self {
        Orchestrator::new(HtmlDirectoryLister::new(client.clone()), osf, client)
    }
}

impl<L: FileLister> Orchestrator<L> {
    pub fn new(lister: L, osf: OsfClient, source: Client) -> Self {
        Orchestrator { lister, osf, source }
    }

    fn plan(&self, req: &TransferRequest) -> Result<Plan> {
        let filter = req.filter();
        let files = self.lister.list_matching(&req.source_dir, &filter)?;
        let dictionaries = listing::dictionary_names_for(&files)?;
        let raw_files = self.lister.list_matching(&req.raw_source_dir(), &filter)?;
        Ok(Plan {
            files,
            dictionaries,
            raw_files,
        })
    }

    /// List what would be uploaded and check that the destination has a
    /// `raw` folder. Nothing is written.
    pub fn preview(&self, req: &TransferRequest) -> Result<PreviewReport> {
        let plan = self.plan(req)?;
        let raw_path = self.osf.resolve_raw_path(&req.repo_id)?;
        info!(
            files = plan.files.len(),
            dictionaries = plan.dictionaries.len(),
            raw_files = plan.raw_files.len(),
            raw_path = %raw_path,
            "preview complete"
        );
        Ok(PreviewReport {
            files: plan.files,
            dictionaries: plan.dictionaries,
            raw_files: plan.raw_files,
            raw_path,
        })
    }

    /// Full location of the destination raw folder, for display.
    pub fn raw_location(&self, req: &TransferRequest, raw_path: &str) -> String {
        self.osf.storage_url(&req.repo_id, raw_path)
    }

    pub fn execute(&self, req: &TransferRequest) -> Result<UploadReport> {
        self.execute_with(req, |_| {})
    }

    /// Upload every file of the study version. Listings are fetched again
    /// rather than reused from [`preview`](Self::preview).
    ///
    /// Listing and raw folder errors abort before anything is written. Once
    /// uploading starts, a file that cannot be fetched or stored is recorded
    /// as failed and the next file is processed; `on_outcome` sees each
    /// result as soon as it is known.
    pub fn execute_with<F>(&self, req: &TransferRequest, mut on_outcome: F) -> Result<UploadReport>
    where
        F: FnMut(&FileOutcome),
    {
        let plan = self.plan(req)?;
        let raw_path = self.osf.resolve_raw_path(&req.repo_id)?;

        let main_files: Vec<String> = plan.files.into_iter().chain(plan.dictionaries).collect();
        let raw_root = req.raw_source_dir();
        let phases = [
            (Destination::Main, "/", req.source_dir.as_str(), main_files),
            (Destination::Raw, raw_path.as_str(), raw_root.as_str(), plan.raw_files),
        ];

        let mut report = UploadReport::default();
        for (destination, folder, root, names) in phases {
            info!(?destination, count = names.len(), "starting upload phase");
            for name in names {
                let outcome = self.transfer_one(&req.repo_id, folder, root, &name);
                match &outcome {
                    UploadOutcome::Failed(reason) => warn!(file = %name, %reason, "upload failed"),
                    other => info!(file = %name, outcome = ?other, "upload finished"),
                }
                let file = FileOutcome {
                    name,
                    destination,
                    outcome,
                };
                on_outcome(&file);
                report.outcomes.push(file);
            }
        }

        let (ok, skipped, failed) = report.counts();
        info!(ok, skipped, failed, "upload complete");
        Ok(report)
    }

    fn transfer_one(&self, repo_id: &str, folder: &str, root: &str, name: &str) -> UploadOutcome {
        match self.fetch(root, name) {
            Ok(body) => self.osf.upload(repo_id, folder, name, body),
            Err(e) => UploadOutcome::Failed(e.to_string()),
        }
    }

    fn fetch(&self, root: &str, name: &str) -> Result<Vec<u8>> {
        let url = listing::join_dir(root, name);
        debug!(url = %url, "fetching source file");
        self.source
            .get(&url)
            .send()
            .and_then(|res| res.error_for_status())
            .and_then(|res| res.bytes())
            .map(|b| b.to_vec())
            .map_err(|source| Error::Fetch { url, source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(name: &str, outcome: UploadOutcome) -> FileOutcome {
        FileOutcome {
            name: name.into(),
            destination: Destination::Main,
            outcome,
        }
    }

    #[test]
    fn report_partitions_by_outcome() {
        let report = UploadReport {
            outcomes: vec![
                outcome("a.csv", UploadOutcome::Succeeded),
                outcome("b.csv", UploadOutcome::Skipped),
                outcome("c.csv", UploadOutcome::Failed("500: Internal Server Error".into())),
                outcome("d.csv", UploadOutcome::Succeeded),
            ],
        };
        assert_eq!(report.succeeded(), vec!["a.csv", "d.csv"]);
        assert_eq!(report.skipped(), vec!["b.csv"]);
        assert_eq!(report.failed(), vec!["c.csv"]);
        assert_eq!(report.counts(), (2, 1, 1));
    }

    #[test]
    fn request_derived_paths() {
        let req = TransferRequest {
            source_dir: "https://example.org/data".into(),
            study: "coolStudy".into(),
            version: "1-0-0".into(),
            repo_id: "abcde".into(),
        };
        assert_eq!(req.filter(), "coolStudy_v1-0-0");
        assert_eq!(req.raw_source_dir(), "https://example.org/data/raw/");
    }
}
