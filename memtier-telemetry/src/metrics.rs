//! ## memtier-telemetry::metrics
//! **Prometheus counters and gauges for the memory manager**
//!
//! Every cache outcome bumps one counter. The gauges mirror the tier sizes
//! after each committed operation.

use prometheus::{IntCounter, IntGauge, Registry};

#[derive(Debug, Clone)]
pub struct MetricsRecorder {
    pub registry: Registry,
    pub stores: IntCounter,
    pub releases: IntCounter,
    pub lookup_hits: IntCounter,
    pub lookup_misses: IntCounter,
    pub swaps_out: IntCounter,
    pub swaps_in: IntCounter,
    pub resident_pages: IntGauge,
    pub disk_pages: IntGauge,
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsRecorder {
    pub fn new() -> Self {
        // Metric names and help strings are static, so registration cannot fail.
        Self::build().expect("static metric definitions are valid")
    }

    fn build() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let stores = IntCounter::new("memtier_stores_total", "Store operations committed")?;
        let releases = IntCounter::new("memtier_releases_total", "Release operations committed")?;
        let lookup_hits = IntCounter::new(
            "memtier_lookup_hits_total",
            "Lookups answered from main memory or disk",
        )?;
        let lookup_misses =
            IntCounter::new("memtier_lookup_misses_total", "Lookups for unknown variables")?;
        let swaps_out = IntCounter::new("memtier_swaps_out_total", "Pages evicted to disk")?;
        let swaps_in = IntCounter::new("memtier_swaps_in_total", "Pages promoted from disk")?;
        let resident_pages =
            IntGauge::new("memtier_resident_pages", "Pages currently in main memory")?;
        let disk_pages = IntGauge::new("memtier_disk_pages", "Pages currently on disk")?;

        registry.register(Box::new(stores.clone()))?;
        registry.register(Box::new(releases.clone()))?;
        registry.register(Box::new(lookup_hits.clone()))?;
        registry.register(Box::new(lookup_misses.clone()))?;
        registry.register(Box::new(swaps_out.clone()))?;
        registry.register(Box::new(swaps_in.clone()))?;
        registry.register(Box::new(resident_pages.clone()))?;
        registry.register(Box::new(disk_pages.clone()))?;

        Ok(Self {
            registry,
            stores,
            releases,
            lookup_hits,
            lookup_misses,
            swaps_out,
            swaps_in,
            resident_pages,
            disk_pages,
        })
    }

    pub fn gather_metrics(&self) -> Result<String, prometheus::Error> {
        use prometheus::Encoder;
        let encoder = prometheus::TextEncoder::new();
        let mut buffer = Vec::<u8>::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }

    #[inline]
    pub fn record_tiers(&self, resident: usize, disk: usize) {
        self.resident_pages.set(resident as i64);
        self.disk_pages.set(disk as i64);
    }
}
