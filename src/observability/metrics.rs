use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder,
};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub list_loads_total: IntCounterVec,
    pub list_load_latency_seconds: HistogramVec,
    pub stale_responses_total: IntCounterVec,
    pub dispatch_transitions_total: IntCounterVec,
    pub backend_errors_total: IntCounterVec,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let list_loads_total = IntCounterVec::new(
            Opts::new("list_loads_total", "List loads by view and outcome"),
            &["view", "outcome"],
        )
        .expect("valid list_loads_total metric");

        let list_load_latency_seconds = HistogramVec::new(
            HistogramOpts::new(
                "list_load_latency_seconds",
                "Latency of list loads in seconds",
            ),
            &["view"],
        )
        .expect("valid list_load_latency_seconds metric");

        let stale_responses_total = IntCounterVec::new(
            Opts::new(
                "stale_responses_total",
                "Superseded list loads whose results were dropped",
            ),
            &["view"],
        )
        .expect("valid stale_responses_total metric");

        let dispatch_transitions_total = IntCounterVec::new(
            Opts::new("dispatch_transitions_total", "Dispatch status transitions"),
            &["status"],
        )
        .expect("valid dispatch_transitions_total metric");

        let backend_errors_total = IntCounterVec::new(
            Opts::new("backend_errors_total", "Failed backend calls by operation"),
            &["operation"],
        )
        .expect("valid backend_errors_total metric");

        registry
            .register(Box::new(list_loads_total.clone()))
            .expect("register list_loads_total");
        registry
            .register(Box::new(list_load_latency_seconds.clone()))
            .expect("register list_load_latency_seconds");
        registry
            .register(Box::new(stale_responses_total.clone()))
            .expect("register stale_responses_total");
        registry
            .register(Box::new(dispatch_transitions_total.clone()))
            .expect("register dispatch_transitions_total");
        registry
            .register(Box::new(backend_errors_total.clone()))
            .expect("register backend_errors_total");

        Self {
            registry,
            list_loads_total,
            list_load_latency_seconds,
            stale_responses_total,
            dispatch_transitions_total,
            backend_errors_total,
        }
    }

    pub fn encode(&self) -> Result<String, String> {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();

        TextEncoder::new()
            .encode(&metric_families, &mut buffer)
            .map_err(|err| format!("failed to encode metrics: {err}"))?;

        String::from_utf8(buffer).map_err(|err| format!("metrics are not valid utf8: {err}"))
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
