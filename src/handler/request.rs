use bytes::Bytes;
use hyper::Request as HRequest;

/// Aliased request type. The body is collected before routing.
pub type Request = HRequest<Bytes>;

/// Convenience accessors used by handlers and middleware.
pub trait RequestExt {
    /// Returns the requested path and query exactly as received.
    fn path_and_query(&self) -> &str;

    /// Returns the first decoded value of a query parameter.
    fn query_param(&self, key: &str) -> Option<String>;

    /// Returns the decoded `application/x-www-form-urlencoded` body fields.
    fn form_fields(&self) -> Vec<(String, String)>;
}

impl RequestExt for Request {
    fn path_and_query(&self) -> &str {
        self.uri()
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or_else(|| self.uri().path())
    }

    fn query_param(&self, key: &str) -> Option<String> {
        let query = self.uri().query()?;

        form_urlencoded::parse(query.as_bytes())
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.into_owned())
    }

    fn form_fields(&self) -> Vec<(String, String)> {
        form_urlencoded::parse(self.body())
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(uri: &str, body: &'static str) -> Request {
        HRequest::builder()
            .uri(uri)
            .body(Bytes::from_static(body.as_bytes()))
            .unwrap()
    }

    #[test]
    fn path_and_query_keeps_query() {
        let req = request("/api/json?tag=cats&v=2", "");
        assert_eq!(req.path_and_query(), "/api/json?tag=cats&v=2");
    }

    #[test]
    fn query_param_decodes_value() {
        let req = request("/login-me?backUrl=%2Fapi%2Fjson%3Fa%3D1", "");
        assert_eq!(req.query_param("backUrl").as_deref(), Some("/api/json?a=1"));
        assert_eq!(req.query_param("missing"), None);
    }

    #[test]
    fn form_fields_parse_body() {
        let req = request("/login-me", "login=admin&password=s3cr%21t");
        let fields = req.form_fields();
        assert_eq!(
            fields,
            vec![
                ("login".to_string(), "admin".to_string()),
                ("password".to_string(), "s3cr!t".to_string()),
            ]
        );
    }
}
