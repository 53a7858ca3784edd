use bytes::BytesMut;
use cookie::Cookie;
use http_body_util::Full;
use hyper::{
    HeaderMap, Response as HyperResponse, StatusCode,
    body::Bytes,
    header::{
        CONTENT_LENGTH, CONTENT_TYPE, HeaderName, HeaderValue, IntoHeaderName, LOCATION,
        SET_COOKIE,
    },
};
use std::str::FromStr;

pub mod error;

use error::ResponseError;

#[derive(Debug, Clone)]
pub struct Response {
    status: StatusCode,
    body: BytesMut,
    headers: HeaderMap,
    ended: bool,
}

impl Default for Response {
    fn default() -> Self {
        Self::new()
    }
}

impl Response {
    pub fn new() -> Self {
        Response {
            status: StatusCode::OK,
            body: BytesMut::with_capacity(512),
            headers: HeaderMap::with_capacity(8),
            ended: false,
        }
    }

    pub fn status(&mut self, status: StatusCode) -> &mut Self {
        self.status = status;
        self
    }

    pub fn status_code(&mut self, status: u16) -> Result<&mut Self, ResponseError> {
        self.status =
            StatusCode::from_u16(status).map_err(|_| ResponseError::InvalidStatusCode(status))?;
        Ok(self)
    }

    pub fn current_status(&self) -> StatusCode {
        self.status
    }

    pub fn set<K: IntoHeaderName, V: Into<HeaderValue>>(&mut self, key: K, val: V) -> &mut Self {
        self.headers.insert(key, val.into());
        self
    }

    pub fn append<K: IntoHeaderName, V: Into<HeaderValue>>(&mut self, key: K, val: V) -> &mut Self {
        self.headers.append(key, val.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&HeaderValue> {
        HeaderName::from_str(key)
            .ok()
            .and_then(|k| self.headers.get(&k))
    }

    pub fn write(&mut self, data: impl AsRef<[u8]>) -> &mut Self {
        self.body.extend_from_slice(data.as_ref());
        self
    }

    pub fn send(&mut self, data: impl AsRef<[u8]>) -> &mut Self {
        let data = data.as_ref();

        self.body.clear();
        self.body.reserve(data.len());
        self.body.extend_from_slice(data);

        self.set(CONTENT_LENGTH, HeaderValue::from(data.len()));

        if !self.headers.contains_key(CONTENT_TYPE) {
            // Best guess: plain text if it's utf8
            let mime = if std::str::from_utf8(data).is_ok() {
                "text/plain; charset=utf-8"
            } else {
                "application/octet-stream"
            };
            self.set(CONTENT_TYPE, HeaderValue::from_static(mime));
        }

        self.end()
    }

    pub fn json<T: serde::Serialize>(&mut self, value: T) -> Result<&mut Self, ResponseError> {
        let json = serde_json::to_vec(&value)?;
        self.r#type(HeaderValue::from_static("application/json; charset=utf-8"));
        Ok(self.send(json))
    }

    pub fn html(&mut self, html: impl AsRef<[u8]>) -> &mut Self {
        self.r#type(HeaderValue::from_static("text/html; charset=utf-8"));
        self.send(html)
    }

    #[inline]
    pub fn end(&mut self) -> &mut Self {
        self.ended = true;
        self
    }

    pub fn is_ended(&self) -> bool {
        self.ended
    }

    /// Ends the response with `302 Found` pointing at `location`.
    pub fn redirect(&mut self, location: &str) -> Result<&mut Self, ResponseError> {
        let location = HeaderValue::from_str(location)?;
        Ok(self.redirect_to(location))
    }

    pub fn redirect_to(&mut self, location: HeaderValue) -> &mut Self {
        self.status = StatusCode::FOUND;
        self.body.clear();
        self.set(LOCATION, location);
        self.set(CONTENT_LENGTH, HeaderValue::from_static("0"));
        self.end()
    }

    pub fn r#type(&mut self, mime: impl Into<HeaderValue>) -> &mut Self {
        self.set(CONTENT_TYPE, mime);
        self
    }

    /// Appends a `Set-Cookie` header.
    pub fn cookie(&mut self, cookie: &Cookie<'_>) -> Result<&mut Self, ResponseError> {
        let value = HeaderValue::from_str(&cookie.to_string())?;
        Ok(self.append(SET_COOKIE, value))
    }

    pub fn not_found(&mut self) -> &mut Self {
        self.status(StatusCode::NOT_FOUND).send("Not Found")
    }

    pub fn into_hyper(mut self) -> HyperResponse<Full<Bytes>> {
        #[inline(always)]
        fn build_error_response() -> HyperResponse<Full<Bytes>> {
            let mut response = HyperResponse::new(Full::new(Bytes::from_static(
                b"Internal Server Error",
            )));
            *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
            response
        }

        if !self.ended {
            self.end();
        }

        let mut builder = HyperResponse::builder();

        {
            let headers = std::mem::take(&mut self.headers);
            if let Some(target) = builder.headers_mut() {
                *target = headers;
            }
        }

        let body = self.body.freeze();

        let status = if body.is_empty() && self.status == StatusCode::OK {
            StatusCode::NO_CONTENT
        } else {
            self.status
        };

        builder
            .status(status)
            .body(Full::new(body))
            .unwrap_or_else(|e| {
                log::error!("failed to build response: {}", e);
                build_error_response()
            })
    }
}

impl From<Response> for HyperResponse<Full<Bytes>> {
    fn from(resp: Response) -> Self {
        resp.into_hyper()
    }
}
