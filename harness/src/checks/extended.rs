//! Error-path checks, enabled with `--extended`.
//!
//! These follow the status codes a conforming static-file server answers with
//! when a request cannot be served: 404 for HEAD on a missing file, 415 and 400
//! for unusable POST bodies, 405 for unknown verbs, and a JSON status envelope
//! on writes.

use crate::checks::methods::{MISSING_PATH, TEXT_PATH};
use crate::checks::{Check, CheckContext, CheckError, CheckResult};
use probe::{Method, Payload, ProbeRequest};

pub const ENVELOPE_PATH: &str = "/envelope.txt";

pub struct HeadMissingCheck;

impl HeadMissingCheck {
    pub fn new() -> Self {
        Self
    }
}

impl Default for HeadMissingCheck {
    fn default() -> Self {
        Self::new()
    }
}

impl Check for HeadMissingCheck {
    fn name(&self) -> &str {
        "test_head_missing"
    }

    fn title(&self) -> &str {
        "HEAD missing"
    }

    fn run(&self, ctx: &CheckContext<'_>) -> CheckResult<()> {
        ctx.send(ProbeRequest::head(MISSING_PATH))?
            .expect_status(404)?
            .expect_empty_body()?;
        Ok(())
    }
}

/// HEAD must advertise the length GET actually returns.
pub struct HeadLengthCheck;

impl HeadLengthCheck {
    pub fn new() -> Self {
        Self
    }
}

impl Default for HeadLengthCheck {
    fn default() -> Self {
        Self::new()
    }
}

impl Check for HeadLengthCheck {
    fn name(&self) -> &str {
        "test_head_length"
    }

    fn title(&self) -> &str {
        "HEAD length"
    }

    fn run(&self, ctx: &CheckContext<'_>) -> CheckResult<()> {
        let head = ctx.send(ProbeRequest::head(TEXT_PATH))?;
        head.expect_status(200)?;
        let raw = head.expect_header("Content-Length")?;
        let advertised: usize = raw.trim().parse().map_err(|_| CheckError::HeaderMismatch {
            request: head.label.clone(),
            header: "Content-Length".to_string(),
            message: format!("is not a number: {:?}", raw),
        })?;

        let get = ctx.send(ProbeRequest::get(TEXT_PATH))?;
        get.expect_status(200)?;
        let actual = get.response.body.len();

        if advertised != actual {
            return Err(CheckError::HeaderMismatch {
                request: head.label.clone(),
                header: "Content-Length".to_string(),
                message: format!("advertises {} bytes, GET returned {}", advertised, actual),
            });
        }
        Ok(())
    }
}

pub struct PostErrorsCheck;

impl PostErrorsCheck {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PostErrorsCheck {
    fn default() -> Self {
        Self::new()
    }
}

impl Check for PostErrorsCheck {
    fn name(&self) -> &str {
        "test_post_errors"
    }

    fn title(&self) -> &str {
        "POST errors"
    }

    fn run(&self, ctx: &CheckContext<'_>) -> CheckResult<()> {
        let request = ProbeRequest::post("/api/test")
            .with_payload(Payload::text("application/octet-stream", vec![0u8, 1, 2, 3]));
        ctx.send(request)?.expect_status(415)?;

        let request =
            ProbeRequest::post("/api/test").with_payload(Payload::untyped("name=John"));
        ctx.send(request)?.expect_status(400)?;

        Ok(())
    }
}

pub struct MethodNotAllowedCheck;

impl MethodNotAllowedCheck {
    pub fn new() -> Self {
        Self
    }
}

impl Default for MethodNotAllowedCheck {
    fn default() -> Self {
        Self::new()
    }
}

impl Check for MethodNotAllowedCheck {
    fn name(&self) -> &str {
        "test_method_not_allowed"
    }

    fn title(&self) -> &str {
        "PATCH"
    }

    fn run(&self, ctx: &CheckContext<'_>) -> CheckResult<()> {
        let request = ProbeRequest::new(Method::Other("PATCH".to_string()), TEXT_PATH);
        ctx.send(request)?.expect_status(405)?;
        Ok(())
    }
}

/// PUT must answer 201 with `{"status": 201, ...}`; the resource is deleted afterwards.
pub struct PutEnvelopeCheck;

impl PutEnvelopeCheck {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PutEnvelopeCheck {
    fn default() -> Self {
        Self::new()
    }
}

impl Check for PutEnvelopeCheck {
    fn name(&self) -> &str {
        "test_put_envelope"
    }

    fn title(&self) -> &str {
        "PUT envelope"
    }

    fn run(&self, ctx: &CheckContext<'_>) -> CheckResult<()> {
        let request = ProbeRequest::put(ENVELOPE_PATH)
            .with_payload(Payload::text("text/plain", "envelope"));
        let put = ctx.send(request)?;
        // Delete before asserting; the resource must not outlive the check.
        let delete = ctx.send(ProbeRequest::delete(ENVELOPE_PATH));

        put.expect_status(201)?;
        let envelope = put.response.json().map_err(|e| CheckError::UnexpectedBody {
            request: put.label.clone(),
            message: format!("body is not JSON: {}", e),
        })?;
        if envelope["status"] != 201 {
            return Err(CheckError::UnexpectedBody {
                request: put.label.clone(),
                message: format!("envelope status is {}, expected 201", envelope["status"]),
            });
        }

        delete?.expect_status(200)?;
        Ok(())
    }
}
