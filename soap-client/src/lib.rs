//! Private SOAP client for UPnP device communication
//!
//! A minimal, blocking SOAP client for issuing control actions against UPnP
//! renderers (for example `AVTransport#GetPositionInfo`). Subscription
//! management is handled elsewhere; this crate only speaks request/response.

mod error;

pub use error::SoapError;

use std::time::Duration;
use xmltree::Element;

/// A minimal SOAP client for UPnP device communication
#[derive(Debug, Clone)]
pub struct SoapClient {
    agent: ureq::Agent,
}

impl SoapClient {
    /// Create a new SOAP client with default timeouts (5s connect, 10s read)
    pub fn new() -> Self {
        Self::with_timeouts(Duration::from_secs(5), Duration::from_secs(10))
    }

    /// Create a SOAP client with explicit connect and read timeouts
    pub fn with_timeouts(connect: Duration, read: Duration) -> Self {
        Self {
            agent: ureq::AgentBuilder::new()
                .timeout_connect(connect)
                .timeout_read(read)
                .build(),
        }
    }

    /// Send a SOAP request and return the `<{action}Response>` element
    ///
    /// # Arguments
    /// * `ip` - Device IP address
    /// * `port` - Device control port (1400 on Sonos players)
    /// * `endpoint` - Control path, e.g. `MediaRenderer/AVTransport/Control`
    /// * `service_uri` - Service type URN used for the SOAPACTION header
    /// * `action` - Action name, e.g. `GetPositionInfo`
    /// * `payload` - Inner XML of the action element
    pub fn call(
        &self,
        ip: &str,
        port: u16,
        endpoint: &str,
        service_uri: &str,
        action: &str,
        payload: &str,
    ) -> Result<Element, SoapError> {
        let body = format!(
            r#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/" s:encodingStyle="http://schemas.xmlsoap.org/soap/encoding/">
                <s:Body>
                    <u:{action} xmlns:u="{service_uri}">
                        {payload}
                    </u:{action}>
                </s:Body>
            </s:Envelope>"#,
            action = action,
            service_uri = service_uri,
            payload = payload
        );

        let url = format!("http://{}:{}/{}", ip, port, endpoint.trim_start_matches('/'));
        let soap_action = format!("\"{}#{}\"", service_uri, action);

        // Faults come back as HTTP 500 with a SOAP body, so read those too.
        let response = match self
            .agent
            .post(&url)
            .set("Content-Type", "text/xml; charset=\"utf-8\"")
            .set("SOAPACTION", &soap_action)
            .send_string(&body)
        {
            Ok(response) => response,
            Err(ureq::Error::Status(500, response)) => response,
            Err(e) => {
                return Err(SoapError::Network {
                    url,
                    reason: e.to_string(),
                })
            }
        };

        let xml_text = response.into_string().map_err(|e| SoapError::Network {
            url: url.clone(),
            reason: e.to_string(),
        })?;

        let xml = Element::parse(xml_text.as_bytes()).map_err(|e| SoapError::Parse(e.to_string()))?;

        self.extract_response(&xml, action)
    }

    fn extract_response(&self, xml: &Element, action: &str) -> Result<Element, SoapError> {
        let body = xml
            .get_child("Body")
            .ok_or_else(|| SoapError::Parse("Missing SOAP Body".to_string()))?;

        if let Some(fault) = body.get_child("Fault") {
            let error_code = fault
                .get_child("detail")
                .and_then(|d| d.get_child("UPnPError"))
                .and_then(|e| e.get_child("errorCode"))
                .and_then(|c| c.get_text())
                .and_then(|t| t.trim().parse::<u16>().ok())
                .unwrap_or(500);
            return Err(SoapError::Fault {
                action: action.to_string(),
                code: error_code,
            });
        }

        let response_name = format!("{}Response", action);
        body.get_child(response_name.as_str())
            .cloned()
            .ok_or_else(|| SoapError::Parse(format!("Missing {} element", response_name)))
    }
}

impl Default for SoapClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Text content of a direct child element, empty when missing
pub fn child_text(element: &Element, name: &str) -> String {
    element
        .get_child(name)
        .and_then(|c| c.get_text())
        .map(|t| t.into_owned())
        .unwrap_or_default()
}
