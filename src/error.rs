use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, DevReportError>;

#[derive(Error, Debug)]
pub enum DevReportError {
    #[error("Path does not exist: {}", .0.display())]
    PathNotFound(PathBuf),
    #[error("Not a valid repository")]
    NotARepository,
    #[error("Bare repository")]
    BareRepository,
    #[error("Error reading config file {}: {source}", path.display())]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Error parsing config file {}: {source}", path.display())]
    ConfigParse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Could not determine git user email. Set it with: git config --global user.email")]
    MissingIdentity,
    #[error("gh error: {0}")]
    Hosting(String),
    #[error("Failed to parse gh output: {0}")]
    HostingOutput(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
    #[error("Invalid date: {0}")]
    InvalidDate(String),
    #[error("Object find error: {0}")]
    ObjectFind(#[from] Box<gix::object::find::existing::Error>),
    #[error("Object find with conversion error: {0}")]
    ObjectFindConv(#[from] Box<gix::object::find::existing::with_conversion::Error>),
    #[error("Commit error: {0}")]
    Commit(#[from] Box<gix::object::commit::Error>),
    #[error("Object decode error: {0}")]
    ObjectDecode(#[from] Box<gix::objs::decode::Error>),
    #[error("Reference find error: {0}")]
    RefFind(#[from] Box<gix::reference::find::existing::Error>),
    #[error("Head peel error: {0}")]
    HeadPeel(#[from] Box<gix::head::peel::to_commit::Error>),
    #[error("Diff tree to tree error: {0}")]
    DiffTreeToTree(#[from] Box<gix::repository::diff_tree_to_tree::Error>),
}

// Manual From implementations for unboxed to boxed conversions
impl From<gix::object::find::existing::Error> for DevReportError {
    fn from(err: gix::object::find::existing::Error) -> Self {
        DevReportError::ObjectFind(Box::new(err))
    }
}

impl From<gix::object::find::existing::with_conversion::Error> for DevReportError {
    fn from(err: gix::object::find::existing::with_conversion::Error) -> Self {
        DevReportError::ObjectFindConv(Box::new(err))
    }
}

impl From<gix::object::commit::Error> for DevReportError {
    fn from(err: gix::object::commit::Error) -> Self {
        DevReportError::Commit(Box::new(err))
    }
}

impl From<gix::objs::decode::Error> for DevReportError {
    fn from(err: gix::objs::decode::Error) -> Self {
        DevReportError::ObjectDecode(Box::new(err))
    }
}

impl From<gix::reference::find::existing::Error> for DevReportError {
    fn from(err: gix::reference::find::existing::Error) -> Self {
        DevReportError::RefFind(Box::new(err))
    }
}

impl From<gix::head::peel::to_commit::Error> for DevReportError {
    fn from(err: gix::head::peel::to_commit::Error) -> Self {
        DevReportError::HeadPeel(Box::new(err))
    }
}

impl From<gix::repository::diff_tree_to_tree::Error> for DevReportError {
    fn from(err: gix::repository::diff_tree_to_tree::Error) -> Self {
        DevReportError::DiffTreeToTree(Box::new(err))
    }
}
