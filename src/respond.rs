//! Error responder.
//!
//! Handlers return `Result<(), Error>` (or raise an [`Error`] as a panic with
//! [`Must::must`] / [`raise`]). [`recover_html`] and [`recover_json`] are the
//! single place where such a failure becomes a response.

use std::panic::{AssertUnwindSafe, catch_unwind};

use http::{HeaderValue, StatusCode, header::CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::{json::write_json_with_code, response::ResponseWriter, status::Error};

/// Body of a JSON error response: `{"error": {...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: u16,
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<String>,
}

impl From<&Error> for ErrorEnvelope {
    fn from(err: &Error) -> Self {
        Self {
            error: ErrorBody {
                code: err.status_code().as_u16(),
                message: err.to_string(),
                details: err.details().to_vec(),
            },
        }
    }
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            c => out.push(c),
        }
    }
    out
}

/// Writes `err` as `<h1>message</h1>` with the error's status.
pub fn write_html<W: ResponseWriter + ?Sized>(w: &mut W, err: &Error) {
    let body = format!("<h1>{}</h1>", escape_html(&err.to_string()));
    w.set_header(CONTENT_TYPE, HeaderValue::from_static("text/html; charset=utf-8"));
    w.write_status(err.status_code());
    w.write_body(body.as_bytes());
}

/// Writes `err` as an [`ErrorEnvelope`] with the error's status.
pub fn write_json_error<W: ResponseWriter + ?Sized>(w: &mut W, err: &Error) {
    let envelope = ErrorEnvelope::from(err);
    if let Err(e) = write_json_with_code(w, err.status_code(), &envelope) {
        error!(error = %e, "cannot encode error envelope");
        w.write_status(StatusCode::INTERNAL_SERVER_ERROR);
    }
}

/// Runs `handler` and renders any failure, returned or raised, as HTML.
pub fn recover_html<W, F>(w: &mut W, handler: F)
where
    W: ResponseWriter,
    F: FnOnce(&mut W) -> Result<(), Error>,
{
    recover(w, handler, write_html)
}

/// Runs `handler` and renders any failure, returned or raised, as a JSON
/// [`ErrorEnvelope`].
pub fn recover_json<W, F>(w: &mut W, handler: F)
where
    W: ResponseWriter,
    F: FnOnce(&mut W) -> Result<(), Error>,
{
    recover(w, handler, write_json_error)
}

fn recover<W, F>(w: &mut W, handler: F, render: fn(&mut W, &Error))
where
    W: ResponseWriter,
    F: FnOnce(&mut W) -> Result<(), Error>,
{
    let err = match catch_unwind(AssertUnwindSafe(|| handler(&mut *w))) {
        Ok(Ok(())) => return,
        Ok(Err(err)) => {
            warn!(status = %err.status_code(), error = %err, "handler failed");
            err
        }
        Err(payload) => {
            let err = Error::from_panic(payload);
            error!(status = %err.status_code(), error = %err, "handler panicked");
            err
        }
    };
    render(w, &err);
}

/// Unwraps a result, raising the error as a panic recovered by
/// [`recover_html`] / [`recover_json`].
///
/// Prefer `?` in handlers returning `Result<(), Error>`: both render the
/// same response, but a raised error also goes through the process panic
/// hook, which by default prints a `panicked at` line to stderr.
pub trait Must<T> {
    fn must(self) -> T;
}

impl<T, E: Into<Error>> Must<T> for Result<T, E> {
    #[track_caller]
    fn must(self) -> T {
        match self {
            Ok(value) => value,
            Err(err) => raise(err),
        }
    }
}

/// Aborts the current handler with `err`.
///
/// Runs the panic hook like any panic; see [`Must`].
#[track_caller]
pub fn raise(err: impl Into<Error>) -> ! {
    std::panic::panic_any(err.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        response::ResponseRecorder,
        status::{ForbiddenError, NotFoundError, ParamError},
    };

    fn envelope(w: &ResponseRecorder) -> ErrorEnvelope {
        serde_json::from_slice(w.body()).unwrap()
    }

    #[test]
    fn html_escapes_message() {
        let mut w = ResponseRecorder::new();
        write_html(&mut w, &ForbiddenError::new("no <b>access</b> & more").into());
        assert_eq!(w.status(), StatusCode::FORBIDDEN);
        assert_eq!(w.headers()[CONTENT_TYPE], "text/html; charset=utf-8");
        assert_eq!(w.body(), b"<h1>no &lt;b&gt;access&lt;/b&gt; &amp; more</h1>");
    }

    #[test]
    fn json_envelope_omits_empty_details() {
        let mut w = ResponseRecorder::new();
        write_json_error(&mut w, &NotFoundError::default().into());
        assert_eq!(w.status(), StatusCode::NOT_FOUND);
        assert_eq!(w.headers()[CONTENT_TYPE], "application/json");
        assert_eq!(
            w.body(),
            b"{\n  \"error\": {\n    \"code\": 404,\n    \"message\": \"Not Found\"\n  }\n}\n"
        );
    }

    #[test]
    fn json_envelope_keeps_details() {
        let err: Error = ForbiddenError::new("denied").with_details(["a", "b"]).into();
        let mut w = ResponseRecorder::new();
        write_json_error(&mut w, &err);

        let body = envelope(&w);
        assert_eq!(body.error.code, 403);
        assert_eq!(body.error.message, "denied");
        assert_eq!(body.error.details, ["a", "b"]);
    }

    #[test]
    fn recover_passes_success_through() {
        let mut w = ResponseRecorder::new();
        recover_json(&mut w, |w| {
            w.write_status(StatusCode::CREATED);
            Ok(())
        });
        assert_eq!(w.status(), StatusCode::CREATED);
        assert!(w.body().is_empty());
    }

    #[test]
    fn recover_renders_returned_errors() {
        let mut w = ResponseRecorder::new();
        recover_html(&mut w, |_| Err(ParamError::missing("id").into()));
        assert_eq!(w.status(), StatusCode::BAD_REQUEST);
        assert_eq!(w.body(), br#"<h1>Missing parameter "id"</h1>"#);
    }

    #[test]
    fn recover_renders_raised_errors() {
        let mut w = ResponseRecorder::new();
        recover_json(&mut w, |_| {
            let id: i64 = Err::<i64, _>(ParamError::invalid("id")).must();
            unreachable!("{id}")
        });
        let body = envelope(&w);
        assert_eq!(body.error.code, 400);
        assert_eq!(body.error.message, r#"Invalid parameter "id""#);
    }

    #[test]
    fn returned_and_raised_errors_render_alike() {
        let lookup = || -> Result<u32, ParamError> { Err(ParamError::missing("page")) };

        let mut returned = ResponseRecorder::new();
        recover_json(&mut returned, |_| {
            lookup()?;
            Ok(())
        });
        let mut raised = ResponseRecorder::new();
        recover_json(&mut raised, |_| {
            lookup().must();
            Ok(())
        });

        assert_eq!(returned.status(), raised.status());
        assert_eq!(returned.body(), raised.body());
    }

    #[test]
    fn recover_converts_plain_panics() {
        let mut w = ResponseRecorder::new();
        recover_json(&mut w, |_| panic!("boom"));
        let body = envelope(&w);
        assert_eq!(body.error.code, 500);
        assert_eq!(body.error.message, "boom");

        let mut w = ResponseRecorder::new();
        recover_html(&mut w, |_| raise(NotFoundError::new("gone")));
        assert_eq!(w.status(), StatusCode::NOT_FOUND);
        assert_eq!(w.body(), b"<h1>gone</h1>");
    }
}
