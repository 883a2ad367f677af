//! gRPC downstream client

use crate::convert::{code_name, into_core_response};
use crate::errors::RpcError;
use crate::naming::method_path;
use crate::pb::emulator::{Request, Response};
use async_trait::async_trait;
use emulator_config::RpcConfig;
use emulator_core::{DownstreamCall, DownstreamClient, Protocol, TransportError, TransportReply};
use http::uri::PathAndQuery;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::Duration;
use tonic::client::Grpc;
use tonic::codec::ProstCodec;
use tonic::metadata::{AsciiMetadataKey, AsciiMetadataValue};
use tonic::transport::{Channel, Endpoint};
use tonic::Code;
use tracing::debug;

/// Downstream client for gRPC routes
///
/// Channels are created lazily and cached per `host[:port]`, so concurrent
/// calls to the same service share one HTTP/2 connection.
#[derive(Debug, Default)]
pub struct RpcClient {
    config: RpcConfig,
    channels: Mutex<HashMap<String, Channel>>,
}

impl RpcClient {
    pub fn new(config: RpcConfig) -> Self {
        Self {
            config,
            channels: Mutex::new(HashMap::new()),
        }
    }

    fn channel(&self, authority: &str) -> Result<Channel, RpcError> {
        let mut channels = self.channels.lock();
        if let Some(channel) = channels.get(authority) {
            return Ok(channel.clone());
        }

        let channel = Endpoint::from_shared(format!("http://{}", authority))
            .map_err(|_| RpcError::InvalidTarget(authority.to_string()))?
            .connect_timeout(self.config.connect_timeout)
            .connect_lazy();

        debug!("Opened gRPC channel to {}", authority);
        channels.insert(authority.to_string(), channel.clone());
        Ok(channel)
    }

    fn request(call: &DownstreamCall) -> Result<tonic::Request<Request>, RpcError> {
        let mut request = tonic::Request::new(Request {
            payload: call.payload.clone(),
        });

        for (name, value) in &call.headers {
            let key = AsciiMetadataKey::from_bytes(name.to_ascii_lowercase().as_bytes())
                .map_err(|_| RpcError::InvalidMetadata(name.clone()))?;
            let value = AsciiMetadataValue::try_from(value.as_str())
                .map_err(|_| RpcError::InvalidMetadata(name.clone()))?;
            request.metadata_mut().insert(key, value);
        }

        Ok(request)
    }

    async fn unary(&self, call: &DownstreamCall) -> Result<TransportReply, RpcError> {
        let path = method_path(&call.target.service, &call.target.endpoint);
        let path = PathAndQuery::try_from(path.as_str())
            .map_err(|_| RpcError::InvalidTarget(path.clone()))?;

        let mut grpc = Grpc::new(self.channel(&call.target.authority())?);
        grpc.ready().await?;

        debug!("gRPC {} on behalf of {}", path, call.source_endpoint);
        let codec: ProstCodec<Request, Response> = ProstCodec::default();
        let response = grpc.unary(Self::request(call)?, path, codec).await?;

        Ok(TransportReply {
            status: code_name(Code::Ok).to_string(),
            body: into_core_response(response.into_inner()),
        })
    }
}

#[async_trait]
impl DownstreamClient for RpcClient {
    fn protocol(&self) -> Protocol {
        Protocol::Grpc
    }

    fn default_timeout(&self) -> Duration {
        self.config.forward_timeout
    }

    async fn send(&self, call: &DownstreamCall) -> Result<TransportReply, TransportError> {
        self.unary(call).await.map_err(TransportError::from)
    }

    fn unavailable(&self) -> TransportError {
        TransportError::new(code_name(Code::Unavailable))
    }

    fn deadline_exceeded(&self) -> TransportError {
        TransportError::new(code_name(Code::DeadlineExceeded))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use emulator_core::CalledServiceRef;

    fn call(port: u16) -> DownstreamCall {
        DownstreamCall {
            source_endpoint: "ep1".to_string(),
            target: CalledServiceRef::new("127.0.0.1", "ep-1", Protocol::Grpc).with_port(port),
            payload: "abc".to_string(),
            headers: vec![("X-Request-Id".to_string(), "req-1".to_string())],
        }
    }

    #[test]
    fn test_request_carries_metadata() {
        let request = RpcClient::request(&call(1)).unwrap();
        assert_eq!(request.get_ref().payload, "abc");
        assert_eq!(
            request.metadata().get("x-request-id").unwrap().to_str().unwrap(),
            "req-1"
        );
    }

    #[test]
    fn test_invalid_metadata_rejected() {
        let mut call = call(1);
        call.headers = vec![("Bad Header".to_string(), "v".to_string())];
        assert!(matches!(
            RpcClient::request(&call),
            Err(RpcError::InvalidMetadata(_))
        ));
    }

    #[tokio::test]
    async fn test_channels_are_cached_per_authority() {
        let client = RpcClient::default();
        client.channel("127.0.0.1:1").unwrap();
        client.channel("127.0.0.1:1").unwrap();
        client.channel("127.0.0.1:2").unwrap();
        assert_eq!(client.channels.lock().len(), 2);
    }

    #[tokio::test]
    async fn test_unreachable_service_is_transport_error() {
        let port = {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap().port()
        };

        let client = RpcClient::default();
        let err = client.send(&call(port)).await.unwrap_err();
        assert_ne!(err.status, "OK");
        assert!(!err.status.is_empty());
    }

    #[test]
    fn test_synthetic_errors() {
        let client = RpcClient::default();
        assert_eq!(client.unavailable().status, "Unavailable");
        assert_eq!(client.deadline_exceeded().status, "DeadlineExceeded");
        assert_eq!(client.default_timeout(), Duration::from_secs(1));
    }
}
