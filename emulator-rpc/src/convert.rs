//! Conversions between protobuf messages and core types

use crate::pb::emulator::{
    CpuTaskResponse, NetworkTaskResponse, Response, ServiceResponse,
    TaskResponses as TaskResponsesMessage,
};
use emulator_core::{
    AggregatedResponse, CpuTaskResult, NetworkTaskResult, RouteResponse, TaskResponses,
};
use tonic::Code;

/// Status code name as reported in route responses
pub fn code_name(code: Code) -> &'static str {
    match code {
        Code::Ok => "OK",
        Code::Cancelled => "Canceled",
        Code::Unknown => "Unknown",
        Code::InvalidArgument => "InvalidArgument",
        Code::DeadlineExceeded => "DeadlineExceeded",
        Code::NotFound => "NotFound",
        Code::AlreadyExists => "AlreadyExists",
        Code::PermissionDenied => "PermissionDenied",
        Code::ResourceExhausted => "ResourceExhausted",
        Code::FailedPrecondition => "FailedPrecondition",
        Code::Aborted => "Aborted",
        Code::OutOfRange => "OutOfRange",
        Code::Unimplemented => "Unimplemented",
        Code::Internal => "Internal",
        Code::Unavailable => "Unavailable",
        Code::DataLoss => "DataLoss",
        Code::Unauthenticated => "Unauthenticated",
    }
}

pub fn into_core_response(response: Response) -> AggregatedResponse {
    AggregatedResponse {
        endpoint_name: response.endpoint,
        task_results: response.tasks.map(into_core_tasks),
        error_message: Some(response.message).filter(|message| !message.is_empty()),
    }
}

pub fn from_core_response(response: AggregatedResponse) -> Response {
    Response {
        endpoint: response.endpoint_name,
        tasks: response.task_results.map(from_core_tasks),
        message: response.error_message.unwrap_or_default(),
    }
}

fn into_core_tasks(tasks: TaskResponsesMessage) -> TaskResponses {
    TaskResponses {
        cpu_task: tasks.cpu_task.map(|cpu| CpuTaskResult {
            services_consumed: cpu.services.into_iter().collect(),
        }),
        network_task: tasks.network_task.map(|network| NetworkTaskResult {
            services_visited: network.services,
            responses_by_route: network
                .responses
                .into_iter()
                .map(|(route, response)| {
                    (route, RouteResponse::new(response.protocol, response.status))
                })
                .collect(),
            payload: network.payload,
        }),
    }
}

fn from_core_tasks(tasks: TaskResponses) -> TaskResponsesMessage {
    TaskResponsesMessage {
        cpu_task: tasks.cpu_task.map(|cpu| CpuTaskResponse {
            services: cpu.services_consumed.into_iter().collect(),
        }),
        network_task: tasks.network_task.map(|network| NetworkTaskResponse {
            services: network.services_visited,
            responses: network
                .responses_by_route
                .into_iter()
                .map(|(route, response)| {
                    (
                        route,
                        ServiceResponse {
                            protocol: response.protocol,
                            status: response.status,
                        },
                    )
                })
                .collect(),
            payload: network.payload,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use emulator_core::TaskResult;
    use prost::Message;

    #[test]
    fn test_wire_round_trip_preserves_tree() {
        let mut tasks = TaskResponses::default();
        tasks.apply(TaskResult::Cpu(CpuTaskResult::single("svcA/ep1", 0.5)));
        let mut network = NetworkTaskResult::new("svcA/ep1", "xyz".to_string());
        network.record_route("svcB/ep1".to_string(), RouteResponse::new("gRPC", "OK"));
        tasks.apply(TaskResult::Network(network));
        let original = AggregatedResponse::new("ep1", tasks);

        let bytes = from_core_response(original.clone()).encode_to_vec();
        let decoded = into_core_response(Response::decode(bytes.as_slice()).unwrap());

        assert_eq!(decoded, original);
    }

    #[test]
    fn test_empty_message_is_none() {
        let response = into_core_response(Response {
            endpoint: "ep1".to_string(),
            tasks: None,
            message: String::new(),
        });
        assert!(response.error_message.is_none());
    }

    #[test]
    fn test_code_names() {
        assert_eq!(code_name(Code::Ok), "OK");
        assert_eq!(code_name(Code::Unavailable), "Unavailable");
        assert_eq!(code_name(Code::DeadlineExceeded), "DeadlineExceeded");
    }
}
