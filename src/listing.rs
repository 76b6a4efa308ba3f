// Directory lister: finds study data files on a web server's directory
// listing page. Scraping is hidden behind `FileLister` so a structured
// listing API could replace it without touching the transfer code.

use crate::error::{Error, Result};
use regex::Regex;
use reqwest::blocking::Client;
use std::sync::OnceLock;
use tracing::debug;

/// Source of file names for a study.
pub trait FileLister {
    /// Names of the files under `listing_url` whose name contains
    /// `filter` (see [`filter_token`]), in listing order.
    fn list_matching(&self, listing_url: &str, filter: &str) -> Result<Vec<String>>;
}

/// Lists files by scraping `href="..."` attributes out of an HTML
/// directory index.
#[derive(Clone)]
pub struct HtmlDirectoryLister {
    client: Client,
}

impl HtmlDirectoryLister {
    pub fn new(client: Client) -> Self {
        HtmlDirectoryLister { client }
    }
}

impl FileLister for HtmlDirectoryLister {
    fn list_matching(&self, listing_url: &str, filter: &str) -> Result<Vec<String>> {
        debug!(url = listing_url, filter, "fetching directory listing");
        let body = self
            .client
            .get(listing_url)
            .send()
            .and_then(|res| res.text())
            .map_err(|source| Error::Fetch {
                url: listing_url.to_string(),
                source,
            })?;
        let files = file_links(&body, filter);
        debug!(url = listing_url, count = files.len(), "listing scraped");
        Ok(files)
    }
}

/// `<study>_v<version>`, the token every file of a study version carries.
pub fn filter_token(study: &str, version: &str) -> String {
    format!("{}_v{}", study, version)
}

/// `dir` joined with `name` using exactly one `/`.
pub fn join_dir(dir: &str, name: &str) -> String {
    format!("{}/{}", dir.trim_end_matches('/'), name)
}

/// The `raw/` subdirectory of a source directory, with trailing slash.
pub fn raw_dir(dir: &str) -> String {
    join_dir(dir, "raw/")
}

/// Every `href` value in `body` naming a csv or json file whose name is an
/// optional numeric/date prefix followed by `<filter>_`.
pub fn file_links(body: &str, filter: &str) -> Vec<String> {
    let pattern = format!(
        r#"href="([0-9_-]*{}_[^"]+\.(?:csv|json))""#,
        regex::escape(filter)
    );
    // The pattern is built from an escaped literal, so it always compiles.
    let re = match Regex::new(&pattern) {
        Ok(re) => re,
        Err(_) => return Vec::new(),
    };
    re.captures_iter(body)
        .map(|caps| caps[1].to_string())
        .collect()
}

fn dictionary_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"v[0-9]+-[0-9]+-[0-9]+_([^_]+\.csv)").expect("static regex"))
}

/// Dictionary file names for a batch of data files:
/// `..._v1-0-0_survey.csv` gives `dictionary_survey.csv`.
///
/// The first name without the `v#-#-#_<suffix>.csv` shape fails the whole
/// batch.
pub fn dictionary_names_for<S: AsRef<str>>(files: &[S]) -> Result<Vec<String>> {
    files
        .iter()
        .map(|f| {
            let f = f.as_ref();
            dictionary_pattern()
                .captures(f)
                .map(|caps| format!("dictionary_{}", &caps[1]))
                .ok_or_else(|| Error::Match(f.to_string()))
        })
        .collect()
}
