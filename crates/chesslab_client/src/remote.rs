use chesslab_api::{
    AddNodeRequest, CreateLineRequest, CreateOpeningRequest, EvalOutcome, EvalQuery, EvalReply,
    EvalReplyError, ImportPgnRequest, ImportPgnResult, Line, LineId, Node, Opening, OpeningId, SubmitEvalAck,
    SubmitEvalRequest,
};
use reqwest::{Method, Url};
use serde::Serialize;
use serde::de::{DeserializeOwned, Error as _};
use std::future::Future;

#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    #[error("invalid url {url}: {message}")]
    InvalidUrl { url: String, message: String },

    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{method} {url} returned {status}: {body}")]
    Status {
        method: Method,
        url: String,
        status: u16,
        body: String,
    },

    #[error("failed to encode request for {url}: {source}")]
    Encode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{url} rejected the request: {message}")]
    Rejected { url: String, message: String },

    #[error("malformed payload from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Typed access to the remote opening/evaluation source. No retries; every
/// failure is returned to the caller.
pub trait RemoteSource: Send + Sync + 'static {
    fn list_openings(&self) -> impl Future<Output = Result<Vec<Opening>, RemoteError>> + Send;
    fn list_lines(
        &self,
        opening_id: OpeningId,
    ) -> impl Future<Output = Result<Vec<Line>, RemoteError>> + Send;
    fn list_nodes(
        &self,
        line_id: LineId,
    ) -> impl Future<Output = Result<Vec<Node>, RemoteError>> + Send;
    fn request_evaluation(
        &self,
        query: EvalQuery,
    ) -> impl Future<Output = Result<EvalOutcome, RemoteError>> + Send;
    fn submit_evaluation(
        &self,
        request: &SubmitEvalRequest,
    ) -> impl Future<Output = Result<SubmitEvalAck, RemoteError>> + Send;

    fn create_opening(
        &self,
        request: &CreateOpeningRequest,
    ) -> impl Future<Output = Result<Opening, RemoteError>> + Send;
    fn create_line(
        &self,
        opening_id: OpeningId,
        request: &CreateLineRequest,
    ) -> impl Future<Output = Result<Line, RemoteError>> + Send;
    fn add_node(
        &self,
        line_id: LineId,
        request: &AddNodeRequest,
    ) -> impl Future<Output = Result<Node, RemoteError>> + Send;
    fn import_pgn(
        &self,
        request: &ImportPgnRequest,
    ) -> impl Future<Output = Result<ImportPgnResult, RemoteError>> + Send;
    fn export_pgn(
        &self,
        line_id: LineId,
    ) -> impl Future<Output = Result<String, RemoteError>> + Send;
}

#[derive(Clone, Debug)]
pub struct HttpRemote {
    http: reqwest::Client,
    base: Url,
}

impl HttpRemote {
    /// `base_url` is the API root, e.g. `http://127.0.0.1:5000/api`.
    pub fn new(base_url: &str) -> Result<Self, RemoteError> {
        let trimmed = base_url.trim();
        let normalized = if trimmed.ends_with('/') {
            trimmed.to_owned()
        } else {
            format!("{trimmed}/")
        };
        let base = Url::parse(&normalized).map_err(|err| RemoteError::InvalidUrl {
            url: base_url.to_owned(),
            message: err.to_string(),
        })?;
        Ok(Self {
            http: reqwest::Client::new(),
            base,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, path: &str) -> Result<Url, RemoteError> {
        self.base.join(path).map_err(|err| RemoteError::InvalidUrl {
            url: format!("{}{path}", self.base),
            message: err.to_string(),
        })
    }

    async fn send_raw(
        &self,
        method: Method,
        url: Url,
        body: Option<Vec<u8>>,
    ) -> Result<Vec<u8>, RemoteError> {
        let url_text = url.to_string();
        let mut request = self.http.request(method.clone(), url);
        if let Some(body) = body {
            request = request
                .header(reqwest::header::CONTENT_TYPE, "application/json")
                .body(body);
        }

        let response = request.send().await.map_err(|source| RemoteError::Transport {
            url: url_text.clone(),
            source,
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RemoteError::Status {
                method,
                url: url_text,
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|source| RemoteError::Transport {
                url: url_text,
                source,
            })?;
        Ok(bytes.to_vec())
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, RemoteError> {
        let url_text = url.to_string();
        let bytes = self.send_raw(Method::GET, url, None).await?;
        decode(&url_text, &bytes)
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        url: Url,
        body: &B,
    ) -> Result<T, RemoteError> {
        let url_text = url.to_string();
        let payload = serde_json::to_vec(body).map_err(|source| RemoteError::Encode {
            url: url_text.clone(),
            source,
        })?;
        let bytes = self.send_raw(Method::POST, url, Some(payload)).await?;
        decode(&url_text, &bytes)
    }
}

fn decode<T: DeserializeOwned>(url: &str, bytes: &[u8]) -> Result<T, RemoteError> {
    serde_json::from_slice(bytes).map_err(|source| RemoteError::Decode {
        url: url.to_owned(),
        source,
    })
}

impl RemoteSource for HttpRemote {
    async fn list_openings(&self) -> Result<Vec<Opening>, RemoteError> {
        let url = self.endpoint("openings")?;
        self.get_json(url).await
    }

    async fn list_lines(&self, opening_id: OpeningId) -> Result<Vec<Line>, RemoteError> {
        let url = self.endpoint(&format!("openings/{}/lines", opening_id.0))?;
        self.get_json(url).await
    }

    async fn list_nodes(&self, line_id: LineId) -> Result<Vec<Node>, RemoteError> {
        let url = self.endpoint(&format!("lines/{}/nodes", line_id.0))?;
        self.get_json(url).await
    }

    async fn request_evaluation(&self, query: EvalQuery) -> Result<EvalOutcome, RemoteError> {
        let mut url = self.endpoint("eval")?;
        url.query_pairs_mut()
            .append_pair("node_id", &query.node_id.0.to_string())
            .append_pair("depth", &query.depth.to_string())
            .append_pair("multipv", &query.multipv.to_string())
            .append_pair("mode", query.mode.as_str());
        let url_text = url.to_string();
        let reply: EvalReply = self.get_json(url).await?;
        reply.into_outcome().map_err(|err| match err {
            EvalReplyError::Rejected(message) => RemoteError::Rejected {
                url: url_text,
                message,
            },
            EvalReplyError::MissingEvals => RemoteError::Decode {
                url: url_text,
                source: serde_json::Error::custom(
                    "evaluation reply carries neither evals nor pending",
                ),
            },
        })
    }

    async fn submit_evaluation(
        &self,
        request: &SubmitEvalRequest,
    ) -> Result<SubmitEvalAck, RemoteError> {
        let url = self.endpoint("eval")?;
        self.post_json(url, request).await
    }

    async fn create_opening(&self, request: &CreateOpeningRequest) -> Result<Opening, RemoteError> {
        let url = self.endpoint("openings")?;
        self.post_json(url, request).await
    }

    async fn create_line(
        &self,
        opening_id: OpeningId,
        request: &CreateLineRequest,
    ) -> Result<Line, RemoteError> {
        let url = self.endpoint(&format!("openings/{}/lines", opening_id.0))?;
        self.post_json(url, request).await
    }

    async fn add_node(&self, line_id: LineId, request: &AddNodeRequest) -> Result<Node, RemoteError> {
        let url = self.endpoint(&format!("lines/{}/nodes", line_id.0))?;
        self.post_json(url, request).await
    }

    async fn import_pgn(&self, request: &ImportPgnRequest) -> Result<ImportPgnResult, RemoteError> {
        let url = self.endpoint("import/pgn")?;
        self.post_json(url, request).await
    }

    async fn export_pgn(&self, line_id: LineId) -> Result<String, RemoteError> {
        let url = self.endpoint(&format!("export/pgn/{}", line_id.0))?;
        let bytes = self.send_raw(Method::GET, url, None).await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_gains_trailing_slash() {
        let remote = HttpRemote::new("http://127.0.0.1:5000/api").unwrap();
        assert_eq!(remote.base_url().as_str(), "http://127.0.0.1:5000/api/");
        assert_eq!(
            remote.endpoint("openings/3/lines").unwrap().as_str(),
            "http://127.0.0.1:5000/api/openings/3/lines"
        );
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let err = HttpRemote::new("not a url").unwrap_err();
        assert!(matches!(err, RemoteError::InvalidUrl { .. }));
    }
}
