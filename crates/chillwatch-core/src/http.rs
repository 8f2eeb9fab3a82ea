//! Minimal HTTP/1.x framing
//!
//! Only what a `GET`-only JSON endpoint needs: find the end of the request
//! head, parse the request line, and build a response head. Headers and bodies
//! sent by clients are ignored. Every response closes the connection.

use core::fmt::{self, Write};

use thiserror_no_std::Error;

/// Requests whose head does not fit in this many bytes are rejected.
pub const MAX_REQUEST_SIZE: usize = 1024;

/// Capacity of a formatted response head.
pub const MAX_HEAD_SIZE: usize = 192;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpError {
    #[error("request line incomplete")]
    Incomplete,
    #[error("request line is not valid UTF-8")]
    NotUtf8,
    #[error("malformed request line")]
    MalformedRequestLine,
    #[error("response head does not fit")]
    HeadTooLarge,
}

/// Index just past the blank line ending the request head, if it has arrived.
pub fn find_head_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n").map(|i| i + 4)
}

/// A parsed request line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Request<'a> {
    pub method: &'a str,
    pub target: &'a str,
    pub version: &'a str,
}

impl<'a> Request<'a> {
    /// Parse the request line at the start of `buf`.
    pub fn parse(buf: &'a [u8]) -> Result<Self, HttpError> {
        let line_end = buf
            .windows(2)
            .position(|w| w == b"\r\n")
            .ok_or(HttpError::Incomplete)?;
        let line = core::str::from_utf8(&buf[..line_end]).map_err(|_| HttpError::NotUtf8)?;

        let mut parts = line.split(' ');
        let (Some(method), Some(target), Some(version), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(HttpError::MalformedRequestLine);
        };

        let method_ok = !method.is_empty() && method.bytes().all(|b| b.is_ascii_uppercase());
        if !method_ok || !target.starts_with('/') || !version.starts_with("HTTP/1.") {
            return Err(HttpError::MalformedRequestLine);
        }

        Ok(Self {
            method,
            target,
            version,
        })
    }

    /// The target without its query string or fragment.
    pub fn path(&self) -> &'a str {
        self.target
            .split(['?', '#'])
            .next()
            .unwrap_or(self.target)
    }

    pub fn is_get(&self) -> bool {
        self.method == "GET"
    }
}

impl fmt::Display for Request<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.method, self.target, self.version)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    BadRequest,
    NotFound,
    MethodNotAllowed,
    InternalServerError,
}

impl Status {
    pub const fn code(self) -> u16 {
        match self {
            Status::Ok => 200,
            Status::BadRequest => 400,
            Status::NotFound => 404,
            Status::MethodNotAllowed => 405,
            Status::InternalServerError => 500,
        }
    }

    pub const fn reason(self) -> &'static str {
        match self {
            Status::Ok => "OK",
            Status::BadRequest => "Bad Request",
            Status::NotFound => "Not Found",
            Status::MethodNotAllowed => "Method Not Allowed",
            Status::InternalServerError => "Internal Server Error",
        }
    }
}

pub const CONTENT_TYPE_JSON: &str = "application/json";
pub const CONTENT_TYPE_TEXT: &str = "text/plain";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Response<'b> {
    pub status: Status,
    pub content_type: &'static str,
    pub body: &'b [u8],
}

impl<'b> Response<'b> {
    pub fn json(body: &'b [u8]) -> Self {
        Self {
            status: Status::Ok,
            content_type: CONTENT_TYPE_JSON,
            body,
        }
    }

    /// A text response whose body is the status reason phrase.
    pub fn plain(status: Status) -> Self {
        Self {
            status,
            content_type: CONTENT_TYPE_TEXT,
            body: status.reason().as_bytes(),
        }
    }

    /// Status line and headers, including the terminating blank line.
    pub fn head(&self) -> Result<heapless::String<MAX_HEAD_SIZE>, HttpError> {
        let mut head = heapless::String::new();
        write!(
            head,
            "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n",
            self.status.code(),
            self.status.reason(),
            self.content_type,
            self.body.len()
        )
        .map_err(|_| HttpError::HeadTooLarge)?;
        if self.status == Status::MethodNotAllowed {
            head.push_str("Allow: GET\r\n")
                .map_err(|_| HttpError::HeadTooLarge)?;
        }
        head.push_str("\r\n").map_err(|_| HttpError::HeadTooLarge)?;
        Ok(head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_head_end() {
        let raw = b"GET / HTTP/1.1\r\nHost: fridge\r\n\r\nbody";
        assert_eq!(find_head_end(raw), Some(raw.len() - 4));
        assert_eq!(find_head_end(b"GET / HTTP/1.1\r\nHost: fr"), None);
    }

    #[test]
    fn test_parse_request_line() {
        let request = Request::parse(b"GET /fridge?units=f HTTP/1.1\r\nHost: x\r\n\r\n").unwrap();
        assert_eq!(request.method, "GET");
        assert_eq!(request.target, "/fridge?units=f");
        assert_eq!(request.path(), "/fridge");
        assert!(request.is_get());
        assert_eq!(std::format!("{}", request), "GET /fridge?units=f HTTP/1.1");
    }

    #[test]
    fn test_parse_rejects_malformed_lines() {
        assert_eq!(
            Request::parse(b"GET /\r\n\r\n"),
            Err(HttpError::MalformedRequestLine)
        );
        assert_eq!(
            Request::parse(b"GET fridge HTTP/1.1\r\n\r\n"),
            Err(HttpError::MalformedRequestLine)
        );
        assert_eq!(
            Request::parse(b"get / HTTP/1.1\r\n\r\n"),
            Err(HttpError::MalformedRequestLine)
        );
        assert_eq!(
            Request::parse(b"GET / SPDY/3\r\n\r\n"),
            Err(HttpError::MalformedRequestLine)
        );
        assert_eq!(Request::parse(b"GET / HTTP/1.1"), Err(HttpError::Incomplete));
        assert_eq!(
            Request::parse(b"GET /\xff HTTP/1.1\r\n\r\n"),
            Err(HttpError::NotUtf8)
        );
    }

    #[test]
    fn test_json_response_head() {
        let response = Response::json(br#"{"a":1}"#);
        assert_eq!(
            response.head().unwrap().as_str(),
            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 7\r\nConnection: close\r\n\r\n"
        );
    }

    #[test]
    fn test_method_not_allowed_lists_get() {
        let head = Response::plain(Status::MethodNotAllowed).head().unwrap();
        assert!(head.starts_with("HTTP/1.1 405 Method Not Allowed\r\n"));
        assert!(head.contains("Allow: GET\r\n"));
        assert!(head.ends_with("\r\n\r\n"));
    }
}
