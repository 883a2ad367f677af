//! Serve a service described by a YAML configuration file

use anyhow::Result;
use emulator_config::ConfigLoader;
use emulator_core::{ExecutionMode, ForwardMode, Protocol};
use emulator_server::Server;
use std::io::Write;
use tokio::sync::oneshot;

const SERVICE_YAML: &str = r#"
service_name: frontend
protocol: http
processes: 2
logging: false
execution:
  cpu_strategy: sleep
server:
  bind_address: 127.0.0.1
  http_port: 0
  grpc_port: 0
endpoints:
  - name: checkout
    execution_mode: parallel
    cpu_complexity:
      execution_time: 0.01
      threads: 2
    network_complexity:
      forward_requests: asynchronous
      response_payload_size: 64
      called_services: []
"#;

#[tokio::test]
async fn test_yaml_described_service_serves_endpoint() -> Result<()> {
    let mut file = tempfile::Builder::new().suffix(".yaml").tempfile()?;
    file.write_all(SERVICE_YAML.as_bytes())?;

    let config = ConfigLoader::new().from_file(file.path())?;
    assert_eq!(config.service_name, "frontend");
    assert_eq!(config.protocol, Protocol::Http);

    let endpoint = config.endpoint("checkout").expect("checkout endpoint");
    assert_eq!(endpoint.execution_mode, ExecutionMode::Parallel);
    assert_eq!(
        endpoint.network_complexity.as_ref().unwrap().forward_requests,
        ForwardMode::Asynchronous
    );

    let bound = Server::new(config)?.bind().await?;
    let addr = bound.http_addr().expect("HTTP listener");
    let (shutdown, signal) = oneshot::channel::<()>();
    let serving = tokio::spawn(bound.serve(async move {
        let _ = signal.await;
    }));

    let body: serde_json::Value = reqwest::Client::new()
        .post(format!("http://{}/checkout", addr))
        .send()
        .await?
        .json()
        .await?;

    assert_eq!(body["endpoint"], "checkout");
    assert_eq!(body["tasks"]["cpu_task"]["services"]["frontend/checkout"], 0.01);
    assert_eq!(body["tasks"]["network_task"]["services"][0], "frontend/checkout");
    assert_eq!(
        body["tasks"]["network_task"]["payload"].as_str().map(str::len),
        Some(64)
    );

    let _ = shutdown.send(());
    serving.await??;
    Ok(())
}
