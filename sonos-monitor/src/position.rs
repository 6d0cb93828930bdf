//! Current playback position of a device.
//!
//! The query is a blocking SOAP round trip. Handlers go through
//! [`query_with_timeout`] so it runs on the blocking pool and is bounded.

use std::sync::Arc;
use std::time::Duration;

use soap_client::{child_text, SoapClient};

use crate::config::MonitorConfig;
use crate::error::HandlerError;
use crate::types::Device;

const AV_TRANSPORT_CONTROL: &str = "MediaRenderer/AVTransport/Control";
const AV_TRANSPORT_URN: &str = "urn:schemas-upnp-org:service:AVTransport:1";
const GET_POSITION_INFO: &str = "GetPositionInfo";

/// Result of `AVTransport#GetPositionInfo`, values as the player sent them.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PositionInfo {
    pub track_uri: String,
    /// `H:MM:SS`, or `NOT_IMPLEMENTED` for streams
    pub track_duration: String,
    /// Elapsed time in the current track, `H:MM:SS`
    pub rel_time: String,
}

/// Synchronous "where is this device in its track" call.
pub trait PositionQuery: Send + Sync {
    fn position_info(&self, device: &Device) -> Result<PositionInfo, HandlerError>;
}

/// [`PositionQuery`] over SOAP against the device's AVTransport service.
#[derive(Debug, Clone, Default)]
pub struct SoapPositionQuery {
    client: SoapClient,
}

impl SoapPositionQuery {
    pub fn new(client: SoapClient) -> Self {
        Self { client }
    }

    pub fn from_config(config: &MonitorConfig) -> Self {
        Self::new(SoapClient::with_timeouts(
            config.soap_connect_timeout,
            config.soap_read_timeout,
        ))
    }
}

impl PositionQuery for SoapPositionQuery {
    fn position_info(&self, device: &Device) -> Result<PositionInfo, HandlerError> {
        let response = self
            .client
            .call(
                &device.ip_address.to_string(),
                device.port,
                AV_TRANSPORT_CONTROL,
                AV_TRANSPORT_URN,
                GET_POSITION_INFO,
                "<InstanceID>0</InstanceID>",
            )
            .map_err(|e| HandlerError::RemoteCallFailed {
                operation: GET_POSITION_INFO.to_string(),
                reason: e.to_string(),
            })?;

        Ok(PositionInfo {
            track_uri: child_text(&response, "TrackURI"),
            track_duration: child_text(&response, "TrackDuration"),
            rel_time: child_text(&response, "RelTime"),
        })
    }
}

/// Run `query` for `device` on the blocking pool, giving up after `limit`.
///
/// On timeout the blocking call is left to finish on its own (the SOAP read
/// timeout bounds it) and its result is discarded.
pub async fn query_with_timeout(
    query: Arc<dyn PositionQuery>,
    device: Arc<Device>,
    limit: Duration,
) -> Result<PositionInfo, HandlerError> {
    let task = tokio::task::spawn_blocking(move || query.position_info(&device));

    match tokio::time::timeout(limit, task).await {
        Ok(Ok(result)) => result,
        Ok(Err(join_error)) => Err(HandlerError::RemoteCallFailed {
            operation: GET_POSITION_INFO.to_string(),
            reason: join_error.to_string(),
        }),
        Err(_) => Err(HandlerError::RemoteCallTimedOut {
            operation: GET_POSITION_INFO.to_string(),
            after: limit,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};

    struct FixedPosition;

    impl PositionQuery for FixedPosition {
        fn position_info(&self, device: &Device) -> Result<PositionInfo, HandlerError> {
            Ok(PositionInfo {
                track_uri: format!("x-file:{}", device.room_name),
                track_duration: "0:03:00".to_string(),
                rel_time: "0:01:00".to_string(),
            })
        }
    }

    struct SlowPosition(Duration);

    impl PositionQuery for SlowPosition {
        fn position_info(&self, _device: &Device) -> Result<PositionInfo, HandlerError> {
            std::thread::sleep(self.0);
            Ok(PositionInfo::default())
        }
    }

    fn kitchen() -> Arc<Device> {
        Arc::new(Device::new(
            "RINCON_A",
            "Kitchen",
            "svcA",
            IpAddr::V4(Ipv4Addr::LOCALHOST),
        ))
    }

    #[tokio::test]
    async fn test_query_with_timeout_returns_result() {
        let info = query_with_timeout(Arc::new(FixedPosition), kitchen(), Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(info.track_uri, "x-file:Kitchen");
        assert_eq!(info.rel_time, "0:01:00");
    }

    #[tokio::test]
    async fn test_query_with_timeout_times_out() {
        let limit = Duration::from_millis(50);
        let result = query_with_timeout(
            Arc::new(SlowPosition(Duration::from_millis(500))),
            kitchen(),
            limit,
        )
        .await;

        assert_eq!(
            result,
            Err(HandlerError::RemoteCallTimedOut {
                operation: "GetPositionInfo".to_string(),
                after: limit,
            })
        );
    }

    #[tokio::test]
    async fn test_soap_query_unreachable_device_fails() {
        // Nothing listens on port 1 of loopback.
        let device = Arc::new((*kitchen()).clone().with_port(1));
        let query = SoapPositionQuery::new(SoapClient::with_timeouts(
            Duration::from_millis(200),
            Duration::from_millis(200),
        ));

        let result = query_with_timeout(Arc::new(query), device, Duration::from_secs(2)).await;
        assert!(matches!(
            result,
            Err(HandlerError::RemoteCallFailed { operation, .. }) if operation == "GetPositionInfo"
        ));
    }
}
