use anyhow::Context;
use shuttle_axum::axum::{routing::get, Router};
use metrics::{describe_counter, describe_gauge, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the global Prometheus recorder. Call once per process.
    pub fn init(spotlight_ttl_secs: u64) -> anyhow::Result<Self> {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("prometheus: install recorder")?;

        describe_counter!("spotlight_cache_hits_total", "Spotlight answers served from the slot.");
        describe_counter!(
            "spotlight_cache_misses_total",
            "Spotlight recomputations (expired, empty or forced)."
        );
        describe_gauge!("spotlight_topics", "Topics in the last Spotlight result.");
        describe_gauge!("livefeed_items_returned", "Items in the last live feed response.");
        describe_gauge!("spotlight_cache_ttl_secs", "Configured Spotlight cache TTL.");

        gauge!("spotlight_cache_ttl_secs").set(spotlight_ttl_secs as f64);

        Ok(Self { handle })
    }

    /// Router exposing `/metrics` in the Prometheus exposition format.
    pub fn router<S>(&self) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}
