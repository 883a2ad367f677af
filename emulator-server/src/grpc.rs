//! gRPC listener
//!
//! Method names only exist in the configuration, so instead of generated
//! service stubs a single tower service resolves the request path and runs
//! tonic's unary handling with the prost codec.

use crate::context::GrpcRequestContext;
use crate::state::AppState;
use axum::body::Body;
use axum::Router;
use emulator_rpc::pb::emulator::{Request, Response};
use emulator_rpc::{from_core_response, split_method_path};
use futures::future::BoxFuture;
use std::convert::Infallible;
use std::task::{Context, Poll};
use tonic::codec::ProstCodec;
use tonic::server::{Grpc, UnaryService};
use tonic::Status;
use tower_http::trace::TraceLayer;
use tracing::debug;

/// Status message of calls to methods this service does not serve
pub const UNKNOWN_METHOD: &str = "unknown service, endpoint combination";

/// Router of the gRPC listener
pub fn router(state: AppState) -> Router {
    Router::new()
        .fallback_service(GrpcEndpoints::new(state))
        .layer(TraceLayer::new_for_grpc())
}

/// Tower service dispatching `/emulator.{Service}/{Endpoint}` calls
#[derive(Debug, Clone)]
pub struct GrpcEndpoints {
    state: AppState,
}

impl GrpcEndpoints {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    fn resolve(&self, path: &str) -> Option<String> {
        let (service, method) = split_method_path(path)?;
        self.state
            .grpc_endpoint(service, method)
            .map(|endpoint| endpoint.name.clone())
    }
}

impl tower::Service<http::Request<Body>> for GrpcEndpoints {
    type Response = http::Response<Body>;
    type Error = Infallible;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: http::Request<Body>) -> Self::Future {
        let endpoint = self.resolve(request.uri().path());
        if endpoint.is_none() {
            debug!("No gRPC endpoint for {}", request.uri().path());
        }

        let method = EndpointMethod {
            state: self.state.clone(),
            endpoint,
        };

        Box::pin(async move {
            let mut grpc = Grpc::new(ProstCodec::<Response, Request>::default());
            let response = grpc.unary(method, request).await;
            Ok(response.map(Body::new))
        })
    }
}

struct EndpointMethod {
    state: AppState,
    endpoint: Option<String>,
}

impl UnaryService<Request> for EndpointMethod {
    type Response = Response;
    type Future = BoxFuture<'static, Result<tonic::Response<Response>, Status>>;

    fn call(&mut self, request: tonic::Request<Request>) -> Self::Future {
        let state = self.state.clone();
        let endpoint = self.endpoint.clone();

        Box::pin(async move {
            let Some(endpoint) = endpoint.as_deref().and_then(|name| state.endpoint(name)) else {
                return Err(Status::invalid_argument(UNKNOWN_METHOD));
            };

            let context = GrpcRequestContext::new(request.metadata().clone());
            let response = state.handle(&context, endpoint).await;
            Ok(tonic::Response::new(from_core_response(response)))
        })
    }
}
