use std::fmt;

#[derive(Debug)]
pub enum ConfigError {
    /// Settings file could not be read.
    Io(String),
    /// TOML parse / deserialization error.
    Parse(String),
    /// A `[columns]` entry names an unknown field or a bad letter span.
    InvalidColumn { key: String, value: String, reason: String },
    /// Column spans are inverted or overlap once overrides are applied.
    InvalidLayout(String),
    /// `start_row` is 1-based and must name a worksheet row.
    InvalidStartRow(usize),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(msg) => write!(f, "IO error: {msg}"),
            Self::Parse(msg) => write!(f, "config parse error: {msg}"),
            Self::InvalidColumn { key, value, reason } => {
                write!(f, "columns.{key} = '{value}': {reason}")
            }
            Self::InvalidLayout(msg) => write!(f, "invalid column layout: {msg}"),
            Self::InvalidStartRow(row) => {
                write!(f, "start_row must be between 1 and 1048576 (1-based), got {row}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}
