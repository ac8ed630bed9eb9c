use http::Method;
use may_minihttp::HttpService;
use std::io::{self, Read};
use std::sync::Arc;
use tracing::warn;

use crate::error::HttpError;

use super::app::App;
use super::request::Request;
use super::response::{write_response, Response};

/// Bridges `may_minihttp` connections to an [`App`].
#[derive(Clone)]
pub struct AppService {
    pub app: Arc<App>,
}

impl AppService {
    pub fn new(app: Arc<App>) -> Self {
        Self { app }
    }
}

impl HttpService for AppService {
    fn call(&mut self, req: may_minihttp::Request, res: &mut may_minihttp::Response) -> io::Result<()> {
        let Ok(method) = Method::from_bytes(req.method().as_bytes()) else {
            warn!(method = %req.method(), "Unparseable request method");
            write_response(res, &Response::text(400, "Bad Request"), 0);
            return Ok(());
        };
        let url = req.path().to_string();
        let headers: Vec<(String, String)> = req
            .headers()
            .iter()
            .map(|h| {
                (
                    h.name.to_string(),
                    String::from_utf8_lossy(h.value).into_owned(),
                )
            })
            .collect();

        let body = match read_body(req.body()) {
            Ok(body) => body,
            Err(response) => {
                write_response(res, &response, self.app.json_spaces());
                return Ok(());
            }
        };

        let request = Request::from_parts(method, &url, headers, body);
        let response = self.app.handle(request);
        write_response(res, &response, self.app.json_spaces());
        Ok(())
    }
}

/// Drain the request body. A read error becomes a 400 rather than a
/// truncated body.
fn read_body(mut reader: impl Read) -> Result<Vec<u8>, Response> {
    let mut body = Vec::new();
    match reader.read_to_end(&mut body) {
        Ok(_) => Ok(body),
        Err(e) => {
            warn!(error = %e, "Failed to read request body");
            Err(HttpError::bad_request(format!("Unreadable request body: {e}")).into_response())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct BrokenBody;

    impl Read for BrokenBody {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::ConnectionReset, "reset"))
        }
    }

    #[test]
    fn test_read_body() {
        assert_eq!(read_body(&b"abc"[..]).unwrap(), b"abc".to_vec());

        let res = read_body(BrokenBody).unwrap_err();
        assert_eq!(res.status, 400);
        assert_eq!(res.json_body().unwrap()["errors"][0]["title"], json!("Bad Request"));
    }
}
