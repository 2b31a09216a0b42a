use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use std::fmt::Debug;
use url::Url;

use crate::serde::{SerdeParse, SerdePathError};

/// Request bodies are kept in the error context, clipped to this many chars.
const BODY_CONTEXT_LIMIT: usize = 512;

#[derive(Debug)]
pub enum ReqwestStage {
    Send,
    Status,
    DecodeText,
    Deserialise,
}

pub fn parse_url<U: ToString>(url: U) -> crate::Result<Url> {
    url.to_string()
        .parse::<Url>()
        .map_err(|_| crate::Error::InvalidUrl(url.to_string()))
}

#[derive(Debug)]
#[allow(dead_code)]
pub struct ReqwestErrorContext {
    pub url: Url,
    pub status: Option<StatusCode>,
    json_body: String,
}

#[derive(Debug)]
pub enum ReqwestInnerError {
    Reqwest(reqwest::Error),
    SerdePath(SerdePathError),
}

/// Thin wrapper over a reqwest builder which remembers enough about the request
/// to produce a useful error at whichever stage it fails.
pub struct Reqwest {
    builder: RequestBuilder,
    error_context: Option<ReqwestErrorContext>,
}

impl Reqwest {
    pub fn post<U: ToString>(client: &Client, url: U) -> crate::Result<Self> {
        let url = parse_url(url)?;
        let builder = client.post(url.clone());
        Ok(Self {
            builder,
            error_context: Some(ReqwestErrorContext {
                url,
                status: None,
                json_body: String::new(),
            }),
        })
    }

    pub fn json_body<T: serde::Serialize + Debug>(mut self, json_body: &T) -> Self {
        if let Some(context) = self.error_context.as_mut() {
            context.json_body = clip(
                serde_json::to_string(json_body).unwrap_or_else(|_| format!("{json_body:?}")),
            );
        }
        self.builder = self.builder.json(json_body);
        self
    }

    async fn receive_text_internal(mut self) -> crate::Result<(String, Box<ReqwestErrorContext>)> {
        let mut error_context = Box::new(
            self.error_context
                .take()
                .ok_or(crate::Error::ReqwestErrorContextMissing)?,
        );

        let response = match self.builder.send().await {
            Ok(response) => response,
            Err(err) if err.is_connect() => {
                return Err(crate::Error::Internet(error_context.url));
            }
            Err(err) => {
                return Err(crate::Error::ReqwestFailed {
                    stage: ReqwestStage::Send,
                    context: error_context,
                    inner: ReqwestInnerError::Reqwest(err),
                });
            }
        };

        error_context.status = Some(response.status());

        let response = match response.error_for_status() {
            Ok(response) => response,
            Err(err) => {
                return Err(crate::Error::ReqwestFailed {
                    stage: ReqwestStage::Status,
                    context: error_context,
                    inner: ReqwestInnerError::Reqwest(err),
                });
            }
        };

        match response.text().await {
            Ok(text) => Ok((text, error_context)),
            Err(err) => Err(crate::Error::ReqwestFailed {
                stage: ReqwestStage::DecodeText,
                context: error_context,
                inner: ReqwestInnerError::Reqwest(err),
            }),
        }
    }

    pub async fn receive_json<J: Debug + DeserializeOwned>(self) -> crate::Result<J> {
        let (text, error_context) = self.receive_text_internal().await?;

        text.as_str()
            .serde_parse_custom()
            .map_err(|err| crate::Error::ReqwestFailed {
                stage: ReqwestStage::Deserialise,
                context: error_context,
                inner: ReqwestInnerError::SerdePath(err),
            })
    }
}

fn clip(mut s: String) -> String {
    if let Some((index, _)) = s.char_indices().nth(BODY_CONTEXT_LIMIT) {
        let remaining = s[index..].chars().count();
        s.truncate(index);
        s.push_str(&format!("...({remaining} more chars)"));
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clip_keeps_short_bodies() {
        assert_eq!(clip("{\"a\":1}".to_string()), "{\"a\":1}");
    }

    #[test]
    fn test_clip_long_bodies() {
        let body = "x".repeat(BODY_CONTEXT_LIMIT + 6);
        let clipped = clip(body);
        assert!(clipped.ends_with("...(6 more chars)"));
        assert!(clipped.starts_with(&"x".repeat(BODY_CONTEXT_LIMIT)));
    }

    #[test]
    fn test_parse_url() {
        assert!(parse_url("http://localhost:3002/swap/v1").is_ok());
        assert!(matches!(
            parse_url("not a url"),
            Err(crate::Error::InvalidUrl(_))
        ));
    }
}
