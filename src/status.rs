//! HTTP error taxonomy.
//!
//! Every 4xx/5xx status with a registered meaning has its own error kind
//! carrying a message, optional details and an optional shared cause. The
//! [`HttpError`] capability trait exposes the status code and details of any
//! error, with a 500 / no-details fallback for types that do not override
//! it. [`Error`] is the type-erased value handed to the responder.

use std::{any::Any, error::Error as StdError, fmt, sync::Arc};

use http::StatusCode;

/// A cause shared with the caller's error chain.
pub type Cause = Arc<dyn StdError + Send + Sync + 'static>;

/// Capability trait for errors that know how they map onto an HTTP response.
///
/// Both methods have defaults, so any error type can opt in with an empty
/// `impl HttpError for MyError {}` and be reported as a 500 without details.
pub trait HttpError: StdError + Send + Sync + 'static {
    /// The status code to answer with.
    fn status_code(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }

    /// Additional human-readable details, in order.
    fn details(&self) -> &[String] {
        &[]
    }
}

/// Returns the canonical reason phrase of `code`, or `fallback` when the
/// `http` crate has none registered.
pub(crate) fn reason_phrase(code: u16, fallback: &'static str) -> &'static str {
    StatusCode::from_u16(code)
        .ok()
        .and_then(|status| status.canonical_reason())
        .unwrap_or(fallback)
}

// Generates one error kind per status code. Each kind renders its message,
// or the reason phrase of its status when the message is empty.
macro_rules! http_errors {
    ( $( $(#[$docs:meta])* $name:ident => $code:literal, $reason:literal; )+ ) => {
        $(
            $(#[$docs])*
            #[derive(Debug, Clone, Default)]
            pub struct $name {
                /// Message shown to clients; the reason phrase is used when empty.
                pub message: String,
                /// Additional details, in order.
                pub details: Vec<String>,
                /// Underlying cause, if any.
                pub source: Option<Cause>,
            }

            impl $name {
                /// The numeric status code of this kind.
                pub const CODE: u16 = $code;

                /// Creates the error with the given message.
                pub fn new(message: impl Into<String>) -> Self {
                    Self {
                        message: message.into(),
                        ..Self::default()
                    }
                }

                /// The status code of this kind.
                pub fn status() -> StatusCode {
                    StatusCode::from_u16($code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
                }

                /// Appends details to the error.
                pub fn with_details<I, S>(mut self, details: I) -> Self
                where
                    I: IntoIterator<Item = S>,
                    S: Into<String>,
                {
                    self.details.extend(details.into_iter().map(Into::into));
                    self
                }

                /// Sets the underlying cause.
                pub fn with_source<E>(self, source: E) -> Self
                where
                    E: StdError + Send + Sync + 'static,
                {
                    self.with_shared_source(Arc::new(source))
                }

                /// Sets an underlying cause that is already shared elsewhere.
                pub fn with_shared_source(mut self, source: Cause) -> Self {
                    self.source = Some(source);
                    self
                }
            }

            impl fmt::Display for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    if self.message.is_empty() {
                        f.write_str(reason_phrase($code, $reason))
                    } else {
                        f.write_str(&self.message)
                    }
                }
            }

            impl StdError for $name {
                fn source(&self) -> Option<&(dyn StdError + 'static)> {
                    self.source.as_deref().map(|e| e as &(dyn StdError + 'static))
                }
            }

            impl HttpError for $name {
                fn status_code(&self) -> StatusCode {
                    Self::status()
                }

                fn details(&self) -> &[String] {
                    &self.details
                }
            }

            /// Two errors of the same kind are equal when message and details
            /// match; the cause is not compared.
            impl PartialEq for $name {
                fn eq(&self, other: &Self) -> bool {
                    self.message == other.message && self.details == other.details
                }
            }
        )+
    };
}

http_errors! {
    /// 400: the request is malformed.
    BadRequestError => 400, "Bad Request";
    /// 401: credentials are missing or invalid.
    UnauthorizedError => 401, "Unauthorized";
    /// 402
    PaymentRequiredError => 402, "Payment Required";
    /// 403: the caller may not access the resource.
    ForbiddenError => 403, "Forbidden";
    /// 404: the record or resource does not exist.
    NotFoundError => 404, "Not Found";
    /// 405: the HTTP method is not supported by the resource.
    MethodNotAllowedError => 405, "Method Not Allowed";
    /// 406
    NotAcceptableError => 406, "Not Acceptable";
    /// 407
    ProxyAuthRequiredError => 407, "Proxy Authentication Required";
    /// 408
    RequestTimeoutError => 408, "Request Timeout";
    /// 409: the request conflicts with the current state of the resource.
    ConflictError => 409, "Conflict";
    /// 410
    GoneError => 410, "Gone";
    /// 411
    LengthRequiredError => 411, "Length Required";
    /// 412
    PreconditionFailedError => 412, "Precondition Failed";
    /// 413: the request body exceeds what the server accepts.
    RequestEntityTooLargeError => 413, "Payload Too Large";
    /// 414
    RequestUriTooLongError => 414, "URI Too Long";
    /// 415
    UnsupportedMediaTypeError => 415, "Unsupported Media Type";
    /// 416
    RequestedRangeNotSatisfiableError => 416, "Range Not Satisfiable";
    /// 417
    ExpectationFailedError => 417, "Expectation Failed";
    /// 418
    TeapotError => 418, "I'm a teapot";
    /// 421
    MisdirectedRequestError => 421, "Misdirected Request";
    /// 422: the request parsed but failed semantic validation.
    UnprocessableEntityError => 422, "Unprocessable Entity";
    /// 423
    LockedError => 423, "Locked";
    /// 424
    FailedDependencyError => 424, "Failed Dependency";
    /// 425
    TooEarlyError => 425, "Too Early";
    /// 426
    UpgradeRequiredError => 426, "Upgrade Required";
    /// 428
    PreconditionRequiredError => 428, "Precondition Required";
    /// 429: the caller is being rate limited.
    TooManyRequestsError => 429, "Too Many Requests";
    /// 431
    RequestHeaderFieldsTooLargeError => 431, "Request Header Fields Too Large";
    /// 451
    UnavailableForLegalReasonsError => 451, "Unavailable For Legal Reasons";
    /// 500: any kind of internal server problem.
    InternalServerError => 500, "Internal Server Error";
    /// 501: the endpoint has yet to be implemented.
    NotImplementedError => 501, "Not Implemented";
    /// 502
    BadGatewayError => 502, "Bad Gateway";
    /// 503
    ServiceUnavailableError => 503, "Service Unavailable";
    /// 504: an upstream did not answer in time.
    GatewayTimeoutError => 504, "Gateway Timeout";
    /// 505
    HttpVersionNotSupportedError => 505, "HTTP Version Not Supported";
    /// 506
    VariantAlsoNegotiatesError => 506, "Variant Also Negotiates";
    /// 507
    InsufficientStorageError => 507, "Insufficient Storage";
    /// 508
    LoopDetectedError => 508, "Loop Detected";
    /// 510
    NotExtendedError => 510, "Not Extended";
    /// 511
    NetworkAuthenticationRequiredError => 511, "Network Authentication Required";
}

/// Former name of [`MethodNotAllowedError`].
pub type InvalidMethodError = MethodNotAllowedError;

/// Former name of [`InternalServerError`].
pub type ServerError = InternalServerError;

impl BadRequestError {
    /// The request carried no XSRF token, or one that does not match.
    pub fn invalid_xsrf_token() -> Self {
        Self::new("Invalid or missing XSRF token")
    }
}

/// A required parameter is missing or blank.
///
/// Renders as `Missing parameter "<name>"` and reports 400. Its source is a
/// [`BadRequestError`] with the same message, so walking the chain finds a
/// bad-request failure without matching on this type.
#[derive(Debug, Clone)]
pub struct MissingParameterError {
    name: String,
    bad_request: BadRequestError,
}

impl MissingParameterError {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let bad_request = BadRequestError::new(format!("Missing parameter {name:?}"));
        Self { name, bad_request }
    }

    /// Name of the missing parameter.
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// A parameter is present but cannot be converted to the requested type.
///
/// Renders as `Invalid parameter "<name>"` and reports 400; see
/// [`MissingParameterError`] for the chain behaviour.
#[derive(Debug, Clone)]
pub struct InvalidParameterError {
    name: String,
    bad_request: BadRequestError,
}

impl InvalidParameterError {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let bad_request = BadRequestError::new(format!("Invalid parameter {name:?}"));
        Self { name, bad_request }
    }

    /// Name of the offending parameter.
    pub fn name(&self) -> &str {
        &self.name
    }
}

macro_rules! parameter_errors {
    ( $($name:ident),+ ) => {
        $(
            impl fmt::Display for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    fmt::Display::fmt(&self.bad_request, f)
                }
            }

            impl StdError for $name {
                fn source(&self) -> Option<&(dyn StdError + 'static)> {
                    Some(&self.bad_request)
                }
            }

            impl HttpError for $name {
                fn status_code(&self) -> StatusCode {
                    StatusCode::BAD_REQUEST
                }
            }

            impl PartialEq for $name {
                fn eq(&self, other: &Self) -> bool {
                    self.name == other.name
                }
            }

            impl Eq for $name {}
        )+
    };
}

parameter_errors!(MissingParameterError, InvalidParameterError);

/// Failure of a Must-accessor: the parameter is missing or invalid.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParamError {
    #[error("{0}")]
    Missing(#[from] MissingParameterError),
    #[error("{0}")]
    Invalid(#[from] InvalidParameterError),
}

impl ParamError {
    pub(crate) fn missing(name: &str) -> Self {
        Self::Missing(MissingParameterError::new(name))
    }

    pub(crate) fn invalid(name: &str) -> Self {
        Self::Invalid(InvalidParameterError::new(name))
    }

    /// Name of the parameter that failed.
    pub fn name(&self) -> &str {
        match self {
            Self::Missing(err) => err.name(),
            Self::Invalid(err) => err.name(),
        }
    }
}

impl HttpError for ParamError {
    fn status_code(&self) -> StatusCode {
        StatusCode::BAD_REQUEST
    }
}

/// A failure without an HTTP classification, such as a panic message.
///
/// Relies on the [`HttpError`] defaults and is therefore reported as a 500
/// without details.
#[derive(Debug, Clone, Default)]
pub struct UnclassifiedError {
    pub message: String,
    pub source: Option<Cause>,
}

impl UnclassifiedError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }
}

impl fmt::Display for UnclassifiedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            f.write_str(reason_phrase(500, "Internal Server Error"))
        } else {
            f.write_str(&self.message)
        }
    }
}

impl StdError for UnclassifiedError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source.as_deref().map(|e| e as &(dyn StdError + 'static))
    }
}

impl HttpError for UnclassifiedError {}

/// Returns true if `err` or any error in its `source()` chain has the type
/// of `target` and compares equal to it.
pub fn chain_contains<E>(err: &(dyn StdError + 'static), target: &E) -> bool
where
    E: StdError + PartialEq + 'static,
{
    std::iter::successors(Some(err), |&e| e.source())
        .any(|e| e.downcast_ref::<E>().is_some_and(|e| e == target))
}

/// Type-erased HTTP error, the value handed to the responder.
///
/// Any [`HttpError`] converts into it, so handlers returning
/// `Result<_, Error>` can use `?` on accessor results directly.
pub struct Error {
    inner: Box<dyn HttpError>,
}

impl Error {
    pub fn new<E: HttpError>(err: E) -> Self {
        Self {
            inner: Box::new(err),
        }
    }

    /// An unclassified (500) error with the given message.
    pub fn msg(message: impl Into<String>) -> Self {
        Self::new(UnclassifiedError::new(message))
    }

    /// Wraps an arbitrary error as an unclassified (500) error, keeping it as
    /// the cause.
    pub fn other<E>(err: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self::new(UnclassifiedError {
            message: err.to_string(),
            source: Some(Arc::new(err)),
        })
    }

    /// Recovers an error from a panic payload.
    ///
    /// Payloads raised through [`crate::respond::raise`] come back unchanged;
    /// string payloads become an [`UnclassifiedError`] with that message.
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        match payload.downcast::<Error>() {
            Ok(err) => *err,
            Err(payload) => {
                let message = if let Some(s) = payload.downcast_ref::<&'static str>() {
                    (*s).to_owned()
                } else if let Some(s) = payload.downcast_ref::<String>() {
                    s.clone()
                } else {
                    String::from("handler panicked")
                };
                Self::msg(message)
            }
        }
    }

    pub fn status_code(&self) -> StatusCode {
        self.inner.status_code()
    }

    pub fn details(&self) -> &[String] {
        self.inner.details()
    }

    pub fn as_error(&self) -> &(dyn StdError + 'static) {
        &*self.inner
    }

    pub fn downcast_ref<E: StdError + 'static>(&self) -> Option<&E> {
        self.as_error().downcast_ref::<E>()
    }

    /// Iterates over this error and its causes, outermost first.
    pub fn chain(&self) -> impl Iterator<Item = &(dyn StdError + 'static)> {
        std::iter::successors(Some(self.as_error()), |&e| e.source())
    }

    /// See [`chain_contains`].
    pub fn is<E>(&self, target: &E) -> bool
    where
        E: StdError + PartialEq + 'static,
    {
        chain_contains(self.as_error(), target)
    }
}

impl<E: HttpError> From<E> for Error {
    fn from(err: E) -> Self {
        Self::new(err)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.inner, f)
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.inner, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check<E: HttpError + Default>(code: u16, reason: &str) {
        let err = E::default();
        assert_eq!(err.status_code().as_u16(), code);
        assert_eq!(err.to_string(), reason);
        assert!(err.details().is_empty());
        assert!(err.source().is_none());
    }

    #[test]
    fn status_codes_and_fallback_text() {
        check::<BadRequestError>(400, "Bad Request");
        check::<UnauthorizedError>(401, "Unauthorized");
        check::<PaymentRequiredError>(402, "Payment Required");
        check::<ForbiddenError>(403, "Forbidden");
        check::<NotFoundError>(404, "Not Found");
        check::<MethodNotAllowedError>(405, "Method Not Allowed");
        check::<NotAcceptableError>(406, "Not Acceptable");
        check::<ProxyAuthRequiredError>(407, "Proxy Authentication Required");
        check::<RequestTimeoutError>(408, "Request Timeout");
        check::<ConflictError>(409, "Conflict");
        check::<GoneError>(410, "Gone");
        check::<LengthRequiredError>(411, "Length Required");
        check::<PreconditionFailedError>(412, "Precondition Failed");
        check::<UnsupportedMediaTypeError>(415, "Unsupported Media Type");
        check::<ExpectationFailedError>(417, "Expectation Failed");
        check::<TeapotError>(418, "I'm a teapot");
        check::<MisdirectedRequestError>(421, "Misdirected Request");
        check::<UnprocessableEntityError>(422, "Unprocessable Entity");
        check::<LockedError>(423, "Locked");
        check::<FailedDependencyError>(424, "Failed Dependency");
        check::<TooEarlyError>(425, "Too Early");
        check::<UpgradeRequiredError>(426, "Upgrade Required");
        check::<PreconditionRequiredError>(428, "Precondition Required");
        check::<TooManyRequestsError>(429, "Too Many Requests");
        check::<RequestHeaderFieldsTooLargeError>(431, "Request Header Fields Too Large");
        check::<UnavailableForLegalReasonsError>(451, "Unavailable For Legal Reasons");
        check::<InternalServerError>(500, "Internal Server Error");
        check::<NotImplementedError>(501, "Not Implemented");
        check::<BadGatewayError>(502, "Bad Gateway");
        check::<ServiceUnavailableError>(503, "Service Unavailable");
        check::<GatewayTimeoutError>(504, "Gateway Timeout");
        check::<HttpVersionNotSupportedError>(505, "HTTP Version Not Supported");
        check::<VariantAlsoNegotiatesError>(506, "Variant Also Negotiates");
        check::<InsufficientStorageError>(507, "Insufficient Storage");
        check::<LoopDetectedError>(508, "Loop Detected");
        check::<NotExtendedError>(510, "Not Extended");
        check::<NetworkAuthenticationRequiredError>(511, "Network Authentication Required");
    }

    #[test]
    fn reason_phrases_follow_http_crate() {
        for code in [413u16, 414, 416] {
            let expected = StatusCode::from_u16(code).unwrap().canonical_reason().unwrap();
            assert_eq!(reason_phrase(code, "unused"), expected);
        }
        assert_eq!(
            RequestEntityTooLargeError::default().status_code(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(RequestUriTooLongError::CODE, 414);
        assert_eq!(RequestedRangeNotSatisfiableError::CODE, 416);
    }

    #[test]
    fn message_and_details() {
        let err = BadRequestError::new("Validation failed")
            .with_details(["Name required", "Price required"]);
        assert_eq!(err.to_string(), "Validation failed");
        assert_eq!(err.details(), ["Name required", "Price required"]);
    }

    #[test]
    fn aliases_behave_like_their_target() {
        let err = InvalidMethodError::default();
        assert_eq!(err.status_code(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(err.to_string(), "Method Not Allowed");

        let err = ServerError::new("database is down").with_details(["primary unreachable"]);
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "database is down");
        assert_eq!(err.details(), ["primary unreachable"]);
    }

    #[test]
    fn source_is_exposed() {
        let inner = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "eof");
        let err = TeapotError::new("I used to brew coffee").with_source(inner);
        let source = err.source().unwrap();
        assert_eq!(source.to_string(), "eof");
        assert!(source.downcast_ref::<std::io::Error>().is_some());
    }

    #[test]
    fn missing_parameter_is_a_bad_request() {
        let err = MissingParameterError::new("name");
        assert_eq!(err.to_string(), r#"Missing parameter "name""#);
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert!(chain_contains(
            &err,
            &BadRequestError::new(r#"Missing parameter "name""#)
        ));
        assert!(!chain_contains(
            &err,
            &BadRequestError::new(r#"Invalid parameter "name""#)
        ));
    }

    #[test]
    fn invalid_parameter_is_a_bad_request() {
        let err = InvalidParameterError::new("name");
        assert_eq!(err.to_string(), r#"Invalid parameter "name""#);
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert!(chain_contains(
            &err,
            &BadRequestError::new(r#"Invalid parameter "name""#)
        ));
    }

    #[test]
    fn param_error_chain_reaches_both_kinds() {
        let err = Error::from(ParamError::missing("id"));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), r#"Missing parameter "id""#);
        assert!(err.is(&MissingParameterError::new("id")));
        assert!(err.is(&BadRequestError::new(r#"Missing parameter "id""#)));
        assert!(!err.is(&InvalidParameterError::new("id")));
        assert_eq!(err.chain().count(), 3);
    }

    #[test]
    fn chain_contains_walks_plain_sources() {
        let wrapped = UnclassifiedError {
            message: "lookup failed".into(),
            source: Some(Arc::new(NotFoundError::new("user 7"))),
        };
        assert!(chain_contains(&wrapped, &NotFoundError::new("user 7")));
        assert!(!chain_contains(&wrapped, &NotFoundError::new("user 8")));

        let err = Error::new(wrapped);
        let texts: Vec<String> = err.chain().map(ToString::to_string).collect();
        assert_eq!(texts, ["lookup failed", "user 7"]);
    }

    #[test]
    fn invalid_xsrf_token_is_a_bad_request() {
        let err = BadRequestError::invalid_xsrf_token();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "Invalid or missing XSRF token");
    }

    #[test]
    fn unclassified_errors_default_to_500() {
        let err = Error::other(std::fmt::Error);
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.details().is_empty());
        assert_eq!(err.to_string(), std::fmt::Error.to_string());
        assert!(err.downcast_ref::<UnclassifiedError>().is_some());
        assert_eq!(UnclassifiedError::default().to_string(), "Internal Server Error");
    }

    #[test]
    fn from_panic_payloads() {
        let err = Error::from_panic(Box::new("kaboom"));
        assert_eq!(err.to_string(), "kaboom");
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);

        let err = Error::from_panic(Box::new(String::from("owned kaboom")));
        assert_eq!(err.to_string(), "owned kaboom");

        let err = Error::from_panic(Box::new(Error::from(NotFoundError::default())));
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);

        let err = Error::from_panic(Box::new(42u8));
        assert_eq!(err.to_string(), "handler panicked");
    }
}
