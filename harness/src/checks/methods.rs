use crate::checks::{Check, CheckContext, CheckResult};
use fixtures::TEXT_FIXTURE;
use probe::{MultipartPart, Payload, ProbeRequest};
use serde_json::json;

pub const TEXT_PATH: &str = "/test.txt";
pub const MISSING_PATH: &str = "/nonexistent.txt";
pub const INDEX_PATH: &str = "/";
pub const UPLOAD_PATH: &str = "/uploaded.txt";
pub const UPLOAD_CONTENT: &str = "This is a test file content";

pub struct GetCheck;

impl GetCheck {
    pub fn new() -> Self {
        Self
    }
}

impl Default for GetCheck {
    fn default() -> Self {
        Self::new()
    }
}

impl Check for GetCheck {
    fn name(&self) -> &str {
        "test_get"
    }

    fn title(&self) -> &str {
        "GET"
    }

    fn run(&self, ctx: &CheckContext<'_>) -> CheckResult<()> {
        ctx.send(ProbeRequest::get(TEXT_PATH))?
            .expect_status(200)?
            .expect_trimmed_text(&ctx.expectations().test_body)?;

        ctx.send(ProbeRequest::get(MISSING_PATH))?
            .expect_status(404)?;

        ctx.send(ProbeRequest::get(INDEX_PATH))?.expect_status(200)?;

        Ok(())
    }
}

pub struct HeadCheck;

impl HeadCheck {
    pub fn new() -> Self {
        Self
    }
}

impl Default for HeadCheck {
    fn default() -> Self {
        Self::new()
    }
}

impl Check for HeadCheck {
    fn name(&self) -> &str {
        "test_head"
    }

    fn title(&self) -> &str {
        "HEAD"
    }

    fn run(&self, ctx: &CheckContext<'_>) -> CheckResult<()> {
        let exchange = ctx.send(ProbeRequest::head(TEXT_PATH))?;
        exchange.expect_status(200)?;
        exchange.expect_header("Content-Length")?;
        exchange.expect_header("Content-Type")?;
        exchange.expect_empty_body()?;
        Ok(())
    }
}

/// JSON, url-encoded and multipart bodies, each expected to be accepted with 200.
pub struct PostCheck;

impl PostCheck {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PostCheck {
    fn default() -> Self {
        Self::new()
    }
}

impl Check for PostCheck {
    fn name(&self) -> &str {
        "test_post"
    }

    fn title(&self) -> &str {
        "POST"
    }

    fn run(&self, ctx: &CheckContext<'_>) -> CheckResult<()> {
        let request = ProbeRequest::post("/api/test").with_json(json!({
            "name": "John",
            "age": 30
        }));
        ctx.send(request)?.expect_status(200)?;

        let request = ProbeRequest::post("/api/login")
            .with_payload(Payload::form([("username", "john"), ("password", "secret")]));
        ctx.send(request)?.expect_status(200)?;

        let contents = ctx.fixtures().read(TEXT_FIXTURE)?;
        let request = ProbeRequest::post("/api/upload").with_payload(Payload::Multipart(vec![
            MultipartPart::file("file", TEXT_FIXTURE, contents),
        ]));
        ctx.send(request)?.expect_status(200)?;

        Ok(())
    }
}

/// Uploads a resource and reads it back byte for byte.
pub struct PutCheck;

impl PutCheck {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PutCheck {
    fn default() -> Self {
        Self::new()
    }
}

impl Check for PutCheck {
    fn name(&self) -> &str {
        "test_put"
    }

    fn title(&self) -> &str {
        "PUT"
    }

    fn run(&self, ctx: &CheckContext<'_>) -> CheckResult<()> {
        let request = ProbeRequest::put(UPLOAD_PATH)
            .with_payload(Payload::text("text/plain", UPLOAD_CONTENT));
        ctx.send(request)?.expect_status(201)?;

        ctx.send(ProbeRequest::get(UPLOAD_PATH))?
            .expect_status(200)?
            .expect_body(UPLOAD_CONTENT.as_bytes())?;

        Ok(())
    }
}

/// Deletes the resource [`PutCheck`] uploaded, then a resource that never existed.
pub struct DeleteCheck;

impl DeleteCheck {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DeleteCheck {
    fn default() -> Self {
        Self::new()
    }
}

impl Check for DeleteCheck {
    fn name(&self) -> &str {
        "test_delete"
    }

    fn title(&self) -> &str {
        "DELETE"
    }

    fn run(&self, ctx: &CheckContext<'_>) -> CheckResult<()> {
        ctx.send(ProbeRequest::delete(UPLOAD_PATH))?
            .expect_status(200)?;

        ctx.send(ProbeRequest::get(UPLOAD_PATH))?.expect_status(404)?;

        ctx.send(ProbeRequest::delete(MISSING_PATH))?
            .expect_status(404)?;

        Ok(())
    }
}
