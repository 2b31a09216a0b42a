use std::path::PathBuf;

use url::Url;

use crate::reqwest::{ReqwestErrorContext, ReqwestInnerError, ReqwestStage};

pub type Result<T> = std::result::Result<T, UtilsError>;

#[derive(Debug, thiserror::Error)]
pub enum UtilsError {
    #[error(transparent)]
    Common(#[from] setchart_common::Error),

    #[error("Network not found: {0}.")]
    NetworkNotFound(String),

    #[error("Alchemy API key not set, please set it in the config or export ALCHEMY_API_KEY.")]
    AlchemyApiKeyNotSet,

    #[error("Failed to get base directories.")]
    BaseDirsFailed,

    #[error("Failed to create directory: {0:?}. (Error: {1:?})")]
    CreateDirAllFailed(PathBuf, std::io::Error),

    #[error("Failed to read the file: {0}. (Error: {1:?})")]
    FileReadFailed(PathBuf, std::io::Error),

    #[error("Failed to write to the file: {0}. (Error: {1:?})")]
    FileWriteFailed(PathBuf, std::io::Error),

    #[error("Parsing the toml file failed: {0}. (Error: {1:?})")]
    TomlParsingFailed(PathBuf, toml::de::Error),

    #[error("Formatting to toml format failed: {0}. (Error: {1:?})")]
    TomlFormattingFailed(String, toml::ser::Error),

    #[error("Parsing the yaml file failed: {0}. (Error: {1:?})")]
    YamlParsingFailed(PathBuf, serde_yaml::Error),

    #[error("Formatting to yaml format failed: {0}. (Error: {1:?})")]
    YamlFormattingFailed(String, serde_yaml::Error),

    #[error("Registry is invalid: {0}.")]
    InvalidRegistry(String),

    #[error("Rpc URL not found for network {network} with chain id {chain_id}. Please add it in the networks.")]
    RpcUrlNotFound { network: String, chain_id: u64 },

    #[error("Failed to parse URL: {0}. (Error: {1:?})")]
    UrlParsingFailed(String, url::ParseError),

    #[error("Please check your internet connection, the URL seems to be unreachable: {0}")]
    Internet(Url),

    #[error("Request '{url}' failed at stage '{stage:?}' (Error='{inner:?}', Context='{context:?}')", url = context.url)]
    ReqwestFailed {
        stage: ReqwestStage,
        context: Box<ReqwestErrorContext>,
        inner: ReqwestInnerError,
    },

    #[error("Reqwest builder missing error context, this is a bug please report it.")]
    ReqwestErrorContextMissing,

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Failed to install the log subscriber. (Error: {0})")]
    LogInitFailed(String),
}
