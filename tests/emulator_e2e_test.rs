//! End-to-end tests: real services on ephemeral ports calling each other

use anyhow::Result;
use emulator_config::{CpuStrategyKind, EmulatorConfig};
use emulator_core::{
    AggregatedResponse, CalledServiceRef, CircuitBreakerSettings, EndpointDefinition,
    NetworkComplexity, Protocol,
};
use emulator_server::Server;
use reqwest::Client;
use std::net::SocketAddr;
use std::time::{Duration, Instant};
use tokio::sync::oneshot;

/// A service running in the background until dropped
struct RunningService {
    http: Option<SocketAddr>,
    grpc: Option<SocketAddr>,
    _shutdown: oneshot::Sender<()>,
}

fn service_config(name: &str, protocol: Protocol, endpoints: Vec<EndpointDefinition>) -> EmulatorConfig {
    let mut config = EmulatorConfig {
        service_name: name.to_string(),
        protocol,
        logging: true,
        endpoints,
        ..Default::default()
    };
    config.server.bind_address = "127.0.0.1".to_string();
    config.server.http_port = 0;
    config.server.grpc_port = 0;
    config.execution.cpu_strategy = CpuStrategyKind::Sleep;
    config
}

async fn spawn_service(config: EmulatorConfig) -> Result<RunningService> {
    let bound = Server::new(config)?.bind().await?;
    let (http, grpc) = (bound.http_addr(), bound.grpc_addr());

    let (shutdown, signal) = oneshot::channel::<()>();
    tokio::spawn(bound.serve(async move {
        let _ = signal.await;
    }));

    Ok(RunningService {
        http,
        grpc,
        _shutdown: shutdown,
    })
}

fn network(called_services: Vec<CalledServiceRef>) -> NetworkComplexity {
    NetworkComplexity {
        response_payload_size: 32,
        called_services,
        ..Default::default()
    }
}

async fn call_http(addr: SocketAddr, endpoint: &str) -> Result<(u16, AggregatedResponse)> {
    let client = Client::builder().timeout(Duration::from_secs(10)).build()?;
    let response = client
        .post(format!("http://{}/{}", addr, endpoint))
        .header("X-Request-Id", "req-1")
        .json(&serde_json::json!({ "payload": "abc" }))
        .send()
        .await?;

    let status = response.status().as_u16();
    Ok((status, response.json().await?))
}

#[tokio::test]
async fn test_http_chain_merges_downstream_tree() -> Result<()> {
    let svc_b = spawn_service(service_config(
        "svcB",
        Protocol::Http,
        vec![EndpointDefinition::new("ep1")
            .with_cpu(0.02, 1)
            .with_network(network(Vec::new()))],
    ))
    .await?;
    let b_port = svc_b.http.expect("svcB HTTP listener").port();

    let svc_a = spawn_service(service_config(
        "svcA",
        Protocol::Http,
        vec![EndpointDefinition::new("ep1")
            .with_cpu(0.01, 1)
            .with_network(network(vec![CalledServiceRef::new("127.0.0.1", "ep1", Protocol::Http)
                .with_port(b_port)
                .with_ratio(2)
                .with_request_payload_size(8)]))],
    ))
    .await?;

    let (status, response) = call_http(svc_a.http.expect("svcA HTTP listener"), "ep1").await?;

    assert_eq!(status, 200);
    assert_eq!(response.endpoint_name, "ep1");

    let tasks = response.task_results.expect("task results");
    let cpu = tasks.cpu_task.expect("cpu task");
    assert_eq!(cpu.services_consumed["svcA/ep1"], 0.01);
    assert_eq!(cpu.services_consumed["svcB/ep1"], 0.02);

    let network = tasks.network_task.expect("network task");
    assert_eq!(network.services_visited, vec!["svcA/ep1", "svcB/ep1", "svcB/ep1"]);
    assert_eq!(network.payload.len(), 32);

    let route = &network.responses_by_route["127.0.0.1/ep1"];
    assert_eq!(route.protocol, "HTTP");
    assert_eq!(route.status, "200 OK");
    Ok(())
}

#[tokio::test]
async fn test_unreachable_downstream_is_reported_not_raised() -> Result<()> {
    // Bind and drop to get a port nobody listens on
    let closed_port = std::net::TcpListener::bind("127.0.0.1:0")?.local_addr()?.port();

    let svc_a = spawn_service(service_config(
        "svcA",
        Protocol::Http,
        vec![EndpointDefinition::new("ep1").with_network(network(vec![CalledServiceRef::new(
            "127.0.0.1",
            "ep1",
            Protocol::Http,
        )
        .with_port(closed_port)]))],
    ))
    .await?;

    let (status, response) = call_http(svc_a.http.expect("svcA HTTP listener"), "ep1").await?;

    assert_eq!(status, 200);
    let network = response.task_results.unwrap().network_task.unwrap();
    assert_eq!(network.services_visited, vec!["svcA/ep1"]);

    let route = &network.responses_by_route["127.0.0.1/ep1"];
    assert_eq!(route.protocol, "HTTP");
    assert!(!route.is_success(), "unexpected status {}", route.status);
    Ok(())
}

#[tokio::test]
async fn test_grpc_hop() -> Result<()> {
    // The downstream service name doubles as its host name
    let svc_b = spawn_service(service_config(
        "localhost",
        Protocol::Grpc,
        vec![EndpointDefinition::new("get-user")
            .with_protocol(Protocol::Grpc)
            .with_cpu(0.01, 2)
            .with_network(network(Vec::new()))],
    ))
    .await?;
    let b_port = svc_b.grpc.expect("gRPC listener").port();
    assert!(svc_b.http.is_none());

    let svc_a = spawn_service(service_config(
        "svcA",
        Protocol::Http,
        vec![EndpointDefinition::new("ep1").with_network(network(vec![
            CalledServiceRef::new("localhost", "get-user", Protocol::Grpc).with_port(b_port),
            CalledServiceRef::new("localhost", "missing", Protocol::Grpc).with_port(b_port),
        ]))],
    ))
    .await?;

    let (status, response) = call_http(svc_a.http.expect("svcA HTTP listener"), "ep1").await?;
    assert_eq!(status, 200);

    let tasks = response.task_results.unwrap();
    assert_eq!(tasks.cpu_task.unwrap().services_consumed["localhost/get-user"], 0.01);

    let network = tasks.network_task.unwrap();
    assert_eq!(network.services_visited, vec!["svcA/ep1", "localhost/get-user"]);

    let served = &network.responses_by_route["localhost/get-user"];
    assert_eq!(served.protocol, "gRPC");
    assert_eq!(served.status, "OK");

    let unknown = &network.responses_by_route["localhost/missing"];
    assert_eq!(unknown.status, "InvalidArgument");
    Ok(())
}

#[tokio::test]
async fn test_circuit_breaker_opens_on_slow_downstream() -> Result<()> {
    let svc_b = spawn_service(service_config(
        "svcB",
        Protocol::Http,
        vec![EndpointDefinition::new("slow").with_cpu(1.0, 1)],
    ))
    .await?;
    let b_port = svc_b.http.expect("svcB HTTP listener").port();

    let breaker = CircuitBreakerSettings {
        timeout: Duration::from_millis(200),
        retry_timer: Duration::from_secs(30),
    };
    let svc_a = spawn_service(service_config(
        "svcA",
        Protocol::Http,
        vec![EndpointDefinition::new("ep1").with_network(network(vec![CalledServiceRef::new(
            "127.0.0.1",
            "slow",
            Protocol::Http,
        )
        .with_port(b_port)
        .with_circuit_breaker(breaker)]))],
    ))
    .await?;
    let a_addr = svc_a.http.expect("svcA HTTP listener");

    // First call waits out the breaker timeout and opens the circuit
    let (_, first) = call_http(a_addr, "ep1").await?;
    let network = first.task_results.unwrap().network_task.unwrap();
    assert_eq!(network.responses_by_route["127.0.0.1/slow"].status, "Service unavailable");

    // Second call is rejected without reaching svcB
    let started = Instant::now();
    let (status, second) = call_http(a_addr, "ep1").await?;
    assert_eq!(status, 200);
    assert!(started.elapsed() < Duration::from_millis(200));

    let network = second.task_results.unwrap().network_task.unwrap();
    assert_eq!(network.responses_by_route["127.0.0.1/slow"].status, "Service unavailable");
    assert_eq!(network.services_visited, vec!["svcA/ep1"]);
    Ok(())
}

#[tokio::test]
async fn test_unknown_endpoint_and_root() -> Result<()> {
    let svc = spawn_service(service_config(
        "svcA",
        Protocol::Http,
        vec![EndpointDefinition::new("ep1")],
    ))
    .await?;
    let addr = svc.http.expect("HTTP listener");
    let client = Client::new();

    let missing = client.post(format!("http://{}/nope", addr)).send().await?;
    assert_eq!(missing.status().as_u16(), 404);
    let body: serde_json::Value = missing.json().await?;
    assert_eq!(body["message"], "Endpoint nope doesn't exist");
    assert_eq!(body["endpoint"], "nope");

    let root = client.get(format!("http://{}/", addr)).send().await?;
    assert_eq!(root.status().as_u16(), 200);
    assert_eq!(root.json::<serde_json::Value>().await?, serde_json::json!({}));
    Ok(())
}
