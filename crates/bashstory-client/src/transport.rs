//! The client's single outbound call.
//!
//! [`Transport`] is the seam between the terminal and the network. The
//! HTTP implementation keeps a cookie store so the session token set by a
//! successful login rides along on every later request.

use bashstory_types::error::{BashError, Result};
use bashstory_types::protocol::{CommandOutcome, CommandRequest};

/// Sends one request and waits for its outcome.
///
/// A non-success answer comes back as [`BashError::Status`] carrying the
/// server's outcome, so callers can choose to render or drop it.
pub trait Transport {
    fn send(&mut self, request: &CommandRequest) -> Result<CommandOutcome>;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(&mut self, request: &CommandRequest) -> Result<CommandOutcome> {
        (**self).send(request)
    }
}

/// Blocking JSON-over-HTTP transport.
pub struct HttpTransport {
    client: reqwest::blocking::Client,
    endpoint: String,
}

impl HttpTransport {
    pub fn new(endpoint: impl Into<String>) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .cookie_store(true)
            .build()
            .map_err(|e| BashError::Transport(format!("client setup: {e}")))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl Transport for HttpTransport {
    fn send(&mut self, request: &CommandRequest) -> Result<CommandOutcome> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .map_err(|e| BashError::Transport(format!("send: {e}")))?;
        let status = response.status();
        // Faults still carry a renderable body.
        let outcome = response
            .json::<CommandOutcome>()
            .map_err(|e| BashError::Transport(format!("{status}: {e}")))?;
        if !status.is_success() {
            return Err(BashError::Status {
                status: status.as_u16(),
                outcome: Box::new(outcome),
            });
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    impl Transport for Echo {
        fn send(&mut self, request: &CommandRequest) -> Result<CommandOutcome> {
            Ok(CommandOutcome::line(request.command.clone()))
        }
    }

    #[test]
    fn boxed_transport_delegates() {
        let mut t: Box<dyn Transport> = Box::new(Echo);
        let out = t.send(&CommandRequest::line("fortune")).unwrap();
        assert_eq!(out.output, vec!["fortune"]);
    }

    #[test]
    fn unreachable_server_is_transport_error() {
        let mut t = HttpTransport::new("http://127.0.0.1:9/api/command").unwrap();
        assert_eq!(t.endpoint(), "http://127.0.0.1:9/api/command");
        match t.send(&CommandRequest::line("ls")) {
            Err(BashError::Transport(_)) => {},
            other => panic!("expected transport error, got {other:?}"),
        }
    }
}
