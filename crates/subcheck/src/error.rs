use derive_more::From;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, From)]
pub enum Error {
    // -- Fatal setup errors
    Configuration(String),
    Execution(String),

    // -- Externals
    #[from]
    Io(std::io::Error),

    #[from]
    Reqwest(reqwest::Error),

    #[from]
    Json(serde_json::Error),

    #[from]
    Fmt(std::fmt::Error),

    #[from]
    SystemTime(std::time::SystemTimeError),

    #[from]
    TimeFormat(time::error::Format),

    #[from]
    Join(tokio::task::JoinError),
}

impl Error {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn execution(msg: impl Into<String>) -> Self {
        Self::Execution(msg.into())
    }
}

// region:    --- Error Boilerplate

impl core::fmt::Display for Error {
    fn fmt(&self, fmt: &mut core::fmt::Formatter) -> core::result::Result<(), core::fmt::Error> {
        match self {
            Self::Configuration(msg) => write!(fmt, "configuration error: {msg}"),
            Self::Execution(msg) => write!(fmt, "execution error: {msg}"),
            Self::Io(err) => write!(fmt, "io error: {err}"),
            other => write!(fmt, "{other:?}"),
        }
    }
}

impl std::error::Error for Error {}

// endregion: --- Error Boilerplate
