// @generated
// Generated from: proto/emulator.proto
// Manual check-in for offline builds.

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Request {
    #[prost(string, tag = "1")]
    pub payload: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CpuTaskResponse {
    #[prost(map = "string, double", tag = "1")]
    pub services: ::std::collections::HashMap<::prost::alloc::string::String, f64>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ServiceResponse {
    #[prost(string, tag = "1")]
    pub protocol: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub status: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct NetworkTaskResponse {
    #[prost(string, repeated, tag = "1")]
    pub services: ::prost::alloc::vec::Vec<::prost::alloc::string::String>,
    #[prost(map = "string, message", tag = "2")]
    pub responses:
        ::std::collections::HashMap<::prost::alloc::string::String, ServiceResponse>,
    #[prost(string, tag = "3")]
    pub payload: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TaskResponses {
    #[prost(message, optional, tag = "1")]
    pub cpu_task: ::core::option::Option<CpuTaskResponse>,
    #[prost(message, optional, tag = "2")]
    pub network_task: ::core::option::Option<NetworkTaskResponse>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Response {
    #[prost(string, tag = "1")]
    pub endpoint: ::prost::alloc::string::String,
    #[prost(message, optional, tag = "2")]
    pub tasks: ::core::option::Option<TaskResponses>,
    #[prost(string, tag = "3")]
    pub message: ::prost::alloc::string::String,
}
