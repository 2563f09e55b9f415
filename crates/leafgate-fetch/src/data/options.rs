use std::time::Duration;

/// Time limits for remote content fetches.
///
/// Both bounds are measured from the connection attempt. Exceeding either
/// one fails the fetch instead of hanging the verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    /// Limit on establishing the TCP/TLS connection.
    ///
    /// Default: 5s
    pub connect: Duration,

    /// Limit on the whole request, body included.
    ///
    /// Default: 30s
    pub total: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(5),
            total:   Duration::from_secs(30),
        }
    }
}

impl Timeouts {
    #[must_use]
    pub fn connect(mut self, connect: Duration) -> Self {
        self.connect = connect;
        self
    }

    #[must_use]
    pub fn total(mut self, total: Duration) -> Self {
        self.total = total;
        self
    }
}
