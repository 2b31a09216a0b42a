pub type SerdePathError = serde_path_to_error::Error<serde_json::Error>;

/// Deserialise JSON text, reporting the path of the offending field on failure.
pub trait SerdeParse {
    fn serde_parse_custom<T>(self) -> Result<T, SerdePathError>
    where
        T: serde::de::DeserializeOwned;
}

impl SerdeParse for &str {
    fn serde_parse_custom<T>(self) -> Result<T, SerdePathError>
    where
        T: serde::de::DeserializeOwned,
    {
        serde_path_to_error::deserialize(&mut serde_json::Deserializer::from_str(self))
    }
}
