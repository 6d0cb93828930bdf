use thiserror::Error;

#[derive(Debug, Error)]
pub enum SoapError {
    /// The request never produced a readable response
    #[error("request to {url} failed: {reason}")]
    Network { url: String, reason: String },

    /// The response was not a SOAP envelope we understand
    #[error("unreadable SOAP response: {0}")]
    Parse(String),

    /// The player answered with a `<s:Fault>`; `code` is the UPnP error code
    #[error("{action} rejected with UPnP error {code}")]
    Fault { action: String, code: u16 },
}
