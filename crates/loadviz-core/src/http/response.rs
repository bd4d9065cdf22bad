/// Outcome of one timed GET that reached the server.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeResponse {
    /// HTTP response status code (e.g. 200, 404).
    pub status: u16,

    /// Round-trip time in milliseconds, from just before `send()` to just
    /// after the body is fully received.
    pub elapsed_ms: f64,
}

impl ProbeResponse {
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}
