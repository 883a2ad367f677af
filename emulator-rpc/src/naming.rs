//! gRPC service and method naming

/// Protobuf package of every emulated service
pub const PACKAGE: &str = "emulator";

/// `"service-1"` -> `"Service1"`, `"test_endpoint"` -> `"TestEndpoint"`
pub fn pascal_case(name: &str) -> String {
    name.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}

/// `/emulator.{Service}/{Endpoint}`
pub fn method_path(service: &str, endpoint: &str) -> String {
    format!("/{}.{}/{}", PACKAGE, pascal_case(service), pascal_case(endpoint))
}

/// Split a request path into its `(service, method)` parts
pub fn split_method_path(path: &str) -> Option<(&str, &str)> {
    let rest = path.strip_prefix('/')?;
    let (service, method) = rest.split_once('/')?;
    let service = service.strip_prefix(PACKAGE)?.strip_prefix('.')?;

    if service.is_empty() || method.is_empty() || method.contains('/') {
        return None;
    }
    Some((service, method))
}
