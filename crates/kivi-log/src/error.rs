use crate::CustomFmt;

#[derive(Debug)]
pub enum LogError {
    UnknownFormat(CustomFmt),
    IoError(std::io::Error),
    Poisoned,
}

impl core::fmt::Display for LogError {

    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::UnknownFormat(fmt) => write!(f, "unknown custom log format {}", fmt.index()),
            Self::IoError(_) => write!(f, "IO error"),
            Self::Poisoned => write!(f, "logger mutex was poisoned"),
        }
    }
}

impl core::error::Error for LogError {

    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::IoError(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for LogError {

    fn from(value: std::io::Error) -> Self {
        Self::IoError(value)
    }
}
