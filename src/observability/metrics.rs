use prometheus::{Encoder, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub claims_total: IntCounterVec,
    pub offers_open: IntGauge,
    pub location_updates_total: IntCounterVec,
    pub push_events_total: IntCounterVec,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let claims_total = IntCounterVec::new(
            Opts::new("claims_total", "Total claim attempts by outcome"),
            &["outcome"],
        )
        .expect("valid claims_total metric");

        let offers_open = IntGauge::new("offers_open", "Currently broadcasted offers")
            .expect("valid offers_open metric");

        let location_updates_total = IntCounterVec::new(
            Opts::new("location_updates_total", "Partner location reports"),
            &["partner_id"],
        )
        .expect("valid location_updates_total metric");

        let push_events_total = IntCounterVec::new(
            Opts::new("push_events_total", "Push events by kind and outcome"),
            &["kind", "outcome"],
        )
        .expect("valid push_events_total metric");

        registry
            .register(Box::new(claims_total.clone()))
            .expect("register claims_total");
        registry
            .register(Box::new(offers_open.clone()))
            .expect("register offers_open");
        registry
            .register(Box::new(location_updates_total.clone()))
            .expect("register location_updates_total");
        registry
            .register(Box::new(push_events_total.clone()))
            .expect("register push_events_total");

        Self {
            registry,
            claims_total,
            offers_open,
            location_updates_total,
            push_events_total,
        }
    }

    pub fn record_push(&self, kind: &str, delivered: bool) {
        let outcome = if delivered { "delivered" } else { "dropped" };
        self.push_events_total
            .with_label_values(&[kind, outcome])
            .inc();
    }

    pub fn encode(&self) -> Result<String, String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(|err| format!("failed to encode metrics: {err}"))?;
        String::from_utf8(buffer).map_err(|err| format!("metrics not utf-8: {err}"))
    }
}
