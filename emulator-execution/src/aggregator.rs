//! Response aggregator
//!
//! Each request owns one [`AggregationState`]. Stressors merge their own
//! result together with the outcome of their downstream calls; the subtrees
//! embedded in child responses are flattened into a batch first, and the
//! whole batch is applied under a single lock acquisition.

use emulator_core::{EndpointCallResult, RouteResponse, TaskResponses, TaskResult};
use parking_lot::Mutex;

/// Per-request result tree shared by the stressors of one request
#[derive(Debug, Default)]
pub struct AggregationState {
    tasks: Mutex<TaskResponses>,
}

impl AggregationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a stressor's own result and the outcome of its downstream calls.
    ///
    /// The own result is applied first, so a node's payload is set before any
    /// child network result is absorbed. Every child call records its route
    /// status; children that answered with a task tree contribute their CPU
    /// and network results.
    pub fn merge(&self, own: TaskResult, child_calls: Vec<EndpointCallResult>) {
        let mut routes: Vec<(String, RouteResponse)> = Vec::with_capacity(child_calls.len());
        let mut subtrees: Vec<TaskResult> = Vec::new();

        for call in child_calls {
            routes.push((call.route_label(), call.route_response()));

            // Absent on transport error, or when the child ran no tasks
            if let Some(tasks) = call.response_data.and_then(|data| data.task_results) {
                subtrees.extend(tasks.into_results());
            }
        }

        let mut tasks = self.tasks.lock();
        tasks.apply(own);

        if !routes.is_empty() {
            let network = tasks.network_task.get_or_insert_with(Default::default);
            for (route, response) in routes {
                network.record_route(route, response);
            }
        }

        for subtree in subtrees {
            tasks.apply(subtree);
        }
    }

    /// Copy of the tree merged so far
    pub fn snapshot(&self) -> TaskResponses {
        self.tasks.lock().clone()
    }

    pub fn into_responses(self) -> TaskResponses {
        self.tasks.into_inner()
    }
}
