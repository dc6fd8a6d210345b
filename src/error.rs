use std::fmt;

#[derive(Debug)]
pub enum Error {
    Io(std::io::Error),
    InvalidDocx(String),
    Xml(roxmltree::Error),
    Write(String),
    Zip(zip::result::ZipError),
    /// A run or node the index pointed at is no longer where the index said it was.
    StructuralInconsistency(String),
    StyleNotFound(String),
    PictureNotFound { index: usize, count: usize },
    /// No paragraph matched an anchor text.
    ParagraphNotFound(String),
    InvalidArgument(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O error: {e}"),
            Error::InvalidDocx(msg) => write!(f, "invalid DOCX: {msg}"),
            Error::Xml(e) => write!(f, "XML parse error: {e}"),
            Error::Write(msg) => write!(f, "failed to write XML: {msg}"),
            Error::Zip(e) => write!(f, "zip error: {e}"),
            Error::StructuralInconsistency(msg) => write!(f, "structural inconsistency: {msg}"),
            Error::StyleNotFound(name) => {
                write!(f, "style '{name}' is not defined in this document")
            }
            Error::PictureNotFound { index, count } => match count {
                0 => write!(f, "picture {index} not found: document contains no pictures"),
                _ => write!(
                    f,
                    "invalid picture index {index}: document contains {count} picture(s) (0-{})",
                    count - 1
                ),
            },
            Error::ParagraphNotFound(anchor) => write!(f, "no paragraph matches '{anchor}'"),
            Error::InvalidArgument(msg) => write!(f, "invalid argument: {msg}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            Error::Xml(e) => Some(e),
            Error::Zip(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<roxmltree::Error> for Error {
    fn from(e: roxmltree::Error) -> Self {
        Error::Xml(e)
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(e: zip::result::ZipError) -> Self {
        Error::Zip(e)
    }
}
