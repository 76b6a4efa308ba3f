// Error type shared by the lister, the OSF client and the UI loop.
// `Quit` is not a failure: it carries the user's request to stop and is
// only handled at the top of the prompt loop.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Listing or file content could not be retrieved.
    #[error("unable to fetch {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// A data file name does not carry the `v#-#-#_<suffix>.csv` shape
    /// needed to derive its dictionary name.
    #[error("cannot derive a dictionary name from {0}")]
    Match(String),

    /// The OSF storage listing was unreachable or had no `data` field.
    #[error("Unable to connect to {0}")]
    Connection(String),

    /// The destination repository has no `raw` folder.
    #[error("Unable to find raw/ directory in OSF: {0}.")]
    NotFound(String),

    /// The OSF API answered a PUT with something other than 201 or 409.
    #[error("{status}: {reason}")]
    Upload { status: u16, reason: String },

    #[error("prompt failed: {0}")]
    Prompt(#[from] std::io::Error),

    #[error("quit")]
    Quit,
}

impl Error {
    pub fn is_quit(&self) -> bool {
        matches!(self, Error::Quit)
    }
}
