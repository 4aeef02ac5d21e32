//! Release archive download over HTTP.
//!
//! Provides a trait-based transport so redirect handling and file
//! persistence can be tested without network access. Redirects are
//! followed here rather than inside the HTTP client so every hop is
//! visible and logged.

use log::debug;
use std::io::{Read, Write};
use std::path::Path;
use std::time::Duration;

/// Status codes that are followed by re-issuing the request.
const REDIRECT_STATUSES: &[u16] = &[301, 302];

/// A single HTTP response, with the body only read for non-redirects.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HttpReply {
    /// The HTTP status code.
    pub status: u16,
    /// The `Location` header, when present.
    pub location: Option<String>,
    /// The full response body, in arrival order.
    pub body: Vec<u8>,
}

impl HttpReply {
    /// Whether the status asks the client to follow `Location`.
    #[must_use]
    pub fn is_redirect(&self) -> bool {
        REDIRECT_STATUSES.contains(&self.status)
    }

    /// Whether the status is in the 2xx range.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Trait for issuing a single GET request without following redirects.
///
/// Abstractions allow tests to script HTTP behaviour without network access.
///
/// # Examples
///
/// ```
/// use setup_ispc::artefact::download::UreqTransport;
///
/// let transport = UreqTransport::new(None);
/// // Use transport.get("https://...") in production
/// ```
#[cfg_attr(test, mockall::automock)]
pub trait HttpTransport {
    /// Issue a GET request for `url`.
    ///
    /// Non-success statuses are returned as replies, not errors.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::Transport`] when no response was received.
    fn get(&self, url: &str) -> Result<HttpReply, DownloadError>;
}

/// Errors arising from archive and index downloads.
#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    /// The server answered with a non-redirect, non-success status.
    #[error("unexpected response: {status} at {url}")]
    HttpStatus {
        /// The HTTP status code received.
        status: u16,
        /// The URL that produced it.
        url: String,
    },

    /// The request could not be completed.
    #[error("request to {url} failed: {reason}")]
    Transport {
        /// The URL that was requested.
        url: String,
        /// A human-readable description of the failure.
        reason: String,
    },

    /// A redirect response had no usable `Location` header.
    #[error("redirect from {url} has invalid location {location:?}")]
    InvalidRedirect {
        /// The URL that returned the redirect.
        url: String,
        /// The raw `Location` header, if any.
        location: Option<String>,
    },

    /// I/O error writing the downloaded file.
    #[error("I/O error writing download: {0}")]
    Io(#[from] std::io::Error),
}

/// HTTP transport backed by a `ureq` agent.
///
/// The agent never follows redirects itself and reports every status as a
/// reply so [`fetch_following_redirects`] sees each hop.
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    /// Create a transport with an optional overall deadline per request.
    #[must_use]
    pub fn new(timeout: Option<Duration>) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(timeout)
            .max_redirects(0)
            .max_redirects_will_error(false)
            .http_status_as_error(false)
            .build();
        Self {
            agent: ureq::Agent::new_with_config(config),
        }
    }
}

impl HttpTransport for UreqTransport {
    fn get(&self, url: &str) -> Result<HttpReply, DownloadError> {
        let response = self
            .agent
            .get(url)
            .call()
            .map_err(|e| transport_error(url, &e))?;
        let status = response.status().as_u16();
        let location = response
            .headers()
            .get(ureq::http::header::LOCATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        let mut reply = HttpReply {
            status,
            location,
            body: Vec::new(),
        };
        if reply.is_redirect() {
            return Ok(reply);
        }
        response
            .into_body()
            .into_reader()
            .read_to_end(&mut reply.body)
            .map_err(|e| DownloadError::Transport {
                url: url.to_owned(),
                reason: e.to_string(),
            })?;
        Ok(reply)
    }
}

/// GET `url`, following 301/302 responses until a final response arrives.
///
/// There is no hop limit; a redirect loop never terminates.
///
/// # Errors
///
/// Returns [`DownloadError::HttpStatus`] for a final non-success status,
/// [`DownloadError::InvalidRedirect`] for a redirect without a usable
/// `Location`, or the transport's error.
pub fn fetch_following_redirects(
    transport: &dyn HttpTransport,
    url: &str,
) -> Result<Vec<u8>, DownloadError> {
    let mut current = url.to_owned();
    loop {
        let reply = transport.get(&current)?;
        if reply.is_redirect() {
            let next = resolve_location(&current, reply.location.as_deref())?;
            debug!("following {} redirect from {current} to {next}", reply.status);
            current = next;
            continue;
        }
        if !reply.is_success() {
            return Err(DownloadError::HttpStatus {
                status: reply.status,
                url: current,
            });
        }
        debug!("received {} bytes from {current}", reply.body.len());
        return Ok(reply.body);
    }
}

/// Download `url` into `dest`.
///
/// The whole body is buffered first, then written in one sequential pass
/// to a temporary file beside `dest`, flushed, synced, and renamed into
/// place. `dest` therefore only ever holds a complete archive.
///
/// Returns the number of bytes written.
///
/// # Errors
///
/// Returns any error from [`fetch_following_redirects`] or from writing
/// the file.
pub fn download_to_file(
    transport: &dyn HttpTransport,
    url: &str,
    dest: &Path,
) -> Result<u64, DownloadError> {
    let body = fetch_following_redirects(transport, url)?;
    let parent = dest
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut staged = tempfile::NamedTempFile::new_in(parent)?;
    staged.write_all(&body)?;
    staged.flush()?;
    staged.as_file().sync_all()?;
    staged.persist(dest).map_err(|e| DownloadError::Io(e.error))?;
    Ok(body.len() as u64)
}

/// Resolve a `Location` header against the URL that produced it.
fn resolve_location(current: &str, location: Option<&str>) -> Result<String, DownloadError> {
    let invalid = || DownloadError::InvalidRedirect {
        url: current.to_owned(),
        location: location.map(str::to_owned),
    };
    let raw = location.filter(|l| !l.trim().is_empty()).ok_or_else(invalid)?;
    let base = url::Url::parse(current).map_err(|_| invalid())?;
    base.join(raw).map(String::from).map_err(|_| invalid())
}

fn transport_error(url: &str, err: &ureq::Error) -> DownloadError {
    DownloadError::Transport {
        url: url.to_owned(),
        reason: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::Sequence;
    use rstest::rstest;

    const FINAL_URL: &str = "https://objects.example.test/ispc.tar.gz";

    fn redirect(location: &str) -> HttpReply {
        HttpReply {
            status: 302,
            location: Some(location.to_owned()),
            body: Vec::new(),
        }
    }

    fn ok(body: &[u8]) -> HttpReply {
        HttpReply {
            status: 200,
            location: None,
            body: body.to_vec(),
        }
    }

    #[test]
    fn direct_success_returns_body() {
        let mut transport = MockHttpTransport::new();
        transport
            .expect_get()
            .withf(|url| url == FINAL_URL)
            .times(1)
            .returning(|_| Ok(ok(b"archive")));

        let body = fetch_following_redirects(&transport, FINAL_URL).expect("fetch");
        assert_eq!(body, b"archive");
    }

    #[rstest]
    #[case::one(1)]
    #[case::three(3)]
    #[case::many(25)]
    fn redirect_chain_yields_same_content(#[case] hops: usize) {
        let mut transport = MockHttpTransport::new();
        let mut seq = Sequence::new();
        for hop in 0..hops {
            let from = format!("https://example.test/hop/{hop}");
            let to = if hop + 1 == hops {
                FINAL_URL.to_owned()
            } else {
                format!("https://example.test/hop/{}", hop + 1)
            };
            transport
                .expect_get()
                .withf(move |url| url == from)
                .times(1)
                .in_sequence(&mut seq)
                .returning(move |_| Ok(redirect(&to)));
        }
        transport
            .expect_get()
            .withf(|url| url == FINAL_URL)
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(ok(b"archive")));

        let body = fetch_following_redirects(&transport, "https://example.test/hop/0")
            .expect("fetch");
        assert_eq!(body, b"archive");
    }

    #[test]
    fn relative_location_is_resolved_against_current_url() {
        let mut transport = MockHttpTransport::new();
        let mut seq = Sequence::new();
        transport
            .expect_get()
            .withf(|url| url == "https://example.test/a/b")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(redirect("/c/d")));
        transport
            .expect_get()
            .withf(|url| url == "https://example.test/c/d")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(ok(b"done")));

        let body = fetch_following_redirects(&transport, "https://example.test/a/b")
            .expect("fetch");
        assert_eq!(body, b"done");
    }

    #[rstest]
    #[case::not_found(404)]
    #[case::server_error(500)]
    #[case::other_redirect(307)]
    fn non_success_status_is_reported_with_url(#[case] status: u16) {
        let mut transport = MockHttpTransport::new();
        transport.expect_get().returning(move |_| {
            Ok(HttpReply {
                status,
                ..HttpReply::default()
            })
        });

        let err = fetch_following_redirects(&transport, FINAL_URL).expect_err("failure");
        match err {
            DownloadError::HttpStatus { status: got, url } => {
                assert_eq!(got, status);
                assert_eq!(url, FINAL_URL);
            }
            other => panic!("expected HttpStatus, got {other:?}"),
        }
    }

    #[test]
    fn redirect_without_location_is_rejected() {
        let mut transport = MockHttpTransport::new();
        transport.expect_get().returning(|_| {
            Ok(HttpReply {
                status: 301,
                ..HttpReply::default()
            })
        });

        let err = fetch_following_redirects(&transport, FINAL_URL).expect_err("failure");
        assert!(matches!(err, DownloadError::InvalidRedirect { .. }));
    }

    #[test]
    fn download_to_file_writes_complete_body() {
        let temp = tempfile::tempdir().expect("temp dir");
        let dest = temp.path().join("ispc-v1.21.0-linux.tar.gz");
        let payload: Vec<u8> = (0..=255u8).cycle().take(64 * 1024).collect();
        let expected = payload.clone();

        let mut transport = MockHttpTransport::new();
        transport
            .expect_get()
            .returning(move |_| Ok(ok(&payload)));

        let written = download_to_file(&transport, FINAL_URL, &dest).expect("download");
        assert_eq!(written, expected.len() as u64);
        assert_eq!(std::fs::read(&dest).expect("read back"), expected);
    }

    #[test]
    fn failed_download_leaves_no_file() {
        let temp = tempfile::tempdir().expect("temp dir");
        let dest = temp.path().join("archive.zip");

        let mut transport = MockHttpTransport::new();
        transport.expect_get().returning(|_| {
            Ok(HttpReply {
                status: 404,
                ..HttpReply::default()
            })
        });

        let result = download_to_file(&transport, FINAL_URL, &dest);
        assert!(result.is_err());
        assert!(!dest.exists());
    }

    #[test]
    fn http_status_message_names_status_and_url() {
        let err = DownloadError::HttpStatus {
            status: 404,
            url: FINAL_URL.to_owned(),
        };
        let msg = err.to_string();
        assert!(msg.contains("404"));
        assert!(msg.contains(FINAL_URL));
    }
}
