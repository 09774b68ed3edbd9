use crate::{error::RequestError, query::Query, response::Response};

/// Header set sent with every query; only `Accept` varies with the query type.
pub type Headers = [(&'static str, &'static str); 3];

/// What is kept of an HTTP response before it is interpreted.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl RawResponse {
    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Issues one GET request.
pub trait Transport {
    fn get(&self, url: &str, headers: &Headers) -> Result<RawResponse, RequestError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn get(&self, url: &str, headers: &Headers) -> Result<RawResponse, RequestError> {
        (**self).get(url, headers)
    }
}

/// [`Transport`] over a blocking `reqwest` client.
pub struct HttpTransport {
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self, RequestError> {
        let client = reqwest::blocking::Client::builder()
            .build()
            .map_err(|e| RequestError::Transport(Box::new(e)))?;
        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    fn get(&self, url: &str, headers: &Headers) -> Result<RawResponse, RequestError> {
        let mut request = self.client.get(url);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }
        let response = request
            .send()
            .map_err(|e| RequestError::Transport(Box::new(e)))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        let body = response
            .bytes()
            .map_err(|e| RequestError::Transport(Box::new(e)))?
            .to_vec();

        Ok(RawResponse {
            status,
            headers,
            body,
        })
    }
}

/// One query bound to its URL, its headers and the transport that will send it.
pub struct Session<T = HttpTransport> {
    query: Query,
    url: String,
    transport: T,
}

impl Session<HttpTransport> {
    pub fn new(query: Query, api_root: &str) -> Result<Self, RequestError> {
        Ok(Self::with_transport(query, api_root, HttpTransport::new()?))
    }
}

impl<T: Transport> Session<T> {
    pub fn with_transport(query: Query, api_root: &str, transport: T) -> Self {
        let url = query.url(api_root);
        Self {
            query,
            url,
            transport,
        }
    }

    pub fn query(&self) -> &Query {
        &self.query
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn headers(&self) -> Headers {
        [
            ("Accept", self.query.query_type().accept_header()),
            ("Accept-Language", "en"),
            ("Accept-Encoding", "gzip, deflate, br"),
        ]
    }

    /// Sends the request once. Anything but `200 OK` is an error.
    pub fn get(&self) -> Result<Response, RequestError> {
        log::info!("sending request to {}", self.url);
        let raw = self.transport.get(&self.url, &self.headers())?;
        if raw.status != 200 {
            log::warn!("{} answered with status {}", self.url, raw.status);
            return Err(RequestError::Status(raw.status));
        }
        log::debug!("received {} bytes", raw.body.len());
        Response::from_raw(raw)
    }
}
