/* This file is part of DarkFi (https://dark.fi)
 *
 * Copyright (C) 2020-2026 Dyne.org foundation
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU Affero General Public License as
 * published by the Free Software Foundation, either version 3 of the
 * License, or (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU Affero General Public License for more details.
 *
 * You should have received a copy of the GNU Affero General Public License
 * along with this program.  If not, see <https://www.gnu.org/licenses/>.
 */

// Hello developer. Please add your error to the according subsection
// that is commented, or make a new subsection. Keep it clean.

/// Main result type used throughout the codebase.
pub type Result<T> = std::result::Result<T, Error>;

/// General library errors used throughout the codebase.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    // ==============
    // Parsing errors
    // ==============
    #[error("Parse failed: {0}")]
    ParseFailed(&'static str),

    #[error(transparent)]
    ParseIntError(#[from] std::num::ParseIntError),

    #[error(transparent)]
    UrlParseError(#[from] url::ParseError),

    #[error("Invalid TON address: {0}")]
    InvalidAddress(String),

    #[error("Invalid loyalty link: {0}")]
    InvalidDeepLink(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    // ===============
    // Encoding errors
    // ===============
    #[error("decode failed: {0}")]
    DecodeError(&'static str),

    #[error("Cell error: {0}")]
    TonCellError(String),

    #[error(transparent)]
    Utf8Error(#[from] std::string::FromUtf8Error),

    #[error(transparent)]
    StrUtf8Error(#[from] std::str::Utf8Error),

    #[error("JSON parse error: {0}")]
    JsonParseError(String),

    #[error("JSON generate error: {0}")]
    JsonGenerateError(String),

    #[error(transparent)]
    TomlDeserializeError(#[from] toml::de::Error),

    // ======================
    // Network-related errors
    // ======================
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("HTTP error! status: {0}")]
    HttpStatus(u16),

    #[error("Rate limit exceeded. Please wait a few minutes and try again.")]
    RateLimited,

    // ======================
    // Indexer-related errors
    // ======================
    #[error("Indexer error: {0}")]
    IndexerError(String),

    #[error("Method {0} not found on contract")]
    GetMethodNotFound(String),

    #[error("Unexpected indexer reply: {0}")]
    UnexpectedIndexerReply(String),

    // ===================
    // Wallet/user errors
    // ===================
    #[error("Wallet not connected")]
    WalletNotConnected,

    #[error("Wallet rejected the transaction: {0}")]
    WalletRejected(String),

    #[error("Please register first")]
    CustomerNotRegistered,

    #[error("Already registered with this business")]
    CustomerAlreadyRegistered,

    #[error("Need {0} more points")]
    InsufficientPoints(u64),

    #[error("Business contract address is not available")]
    MissingContractAddress,

    #[error("Customer record for business {0} not found")]
    CustomerNotFound(String),

    #[error("Reward {0} not found")]
    RewardNotFound(String),

    #[error("Action {0} not found")]
    ActionNotFound(String),

    // ===============
    // Database errors
    // ===============
    #[error("Sled error: {0}")]
    SledError(String),

    // ====================
    // Miscellaneous errors
    // ====================
    #[error("IO error: {0}")]
    Io(std::io::ErrorKind),

    #[error("SetLogger (log crate) failed: {0}")]
    SetLoggerError(String),

    #[error("No config file detected")]
    ConfigNotFound,

    #[error("System clock went backwards")]
    BackwardsTime(std::time::SystemTimeError),

    #[error("{0}")]
    Custom(String),
}

impl Error {
    /// Render the error as the one-line status banner shown to a user.
    /// Failures never abort the session, they only degrade to this text.
    pub fn status_message(&self) -> String {
        match self {
            Self::RateLimited => format!("⏳ {self}"),
            Self::WalletNotConnected |
            Self::CustomerNotRegistered |
            Self::CustomerAlreadyRegistered |
            Self::InsufficientPoints(_) => {
                format!("❌ {self}")
            }
            Self::NetworkError(_) | Self::HttpStatus(_) | Self::IndexerError(_) => {
                format!("⚠️ Connection issue: {self}")
            }
            _ => format!("❌ Error: {self}"),
        }
    }

    /// Returns `true` for errors caused by user input or wallet state,
    /// which are surfaced immediately and never retried.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::WalletNotConnected |
                Self::WalletRejected(_) |
                Self::InvalidAddress(_) |
                Self::InvalidAmount(_) |
                Self::InvalidDeepLink(_) |
                Self::CustomerNotRegistered |
                Self::CustomerAlreadyRegistered |
                Self::InsufficientPoints(_) |
                Self::MissingContractAddress
        )
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.kind())
    }
}

impl From<std::time::SystemTimeError> for Error {
    fn from(err: std::time::SystemTimeError) -> Self {
        Self::BackwardsTime(err)
    }
}

impl From<tinyjson::JsonParseError> for Error {
    fn from(err: tinyjson::JsonParseError) -> Self {
        Self::JsonParseError(err.to_string())
    }
}

impl From<tinyjson::JsonGenerateError> for Error {
    fn from(err: tinyjson::JsonGenerateError) -> Self {
        Self::JsonGenerateError(err.to_string())
    }
}

impl From<sled_overlay::sled::Error> for Error {
    fn from(err: sled_overlay::sled::Error) -> Self {
        Self::SledError(err.to_string())
    }
}

impl From<log::SetLoggerError> for Error {
    fn from(err: log::SetLoggerError) -> Self {
        Self::SetLoggerError(err.to_string())
    }
}

impl From<tonlib_core::cell::TonCellError> for Error {
    fn from(err: tonlib_core::cell::TonCellError) -> Self {
        Self::TonCellError(err.to_string())
    }
}

impl From<surf::Error> for Error {
    fn from(err: surf::Error) -> Self {
        Self::NetworkError(err.to_string())
    }
}
