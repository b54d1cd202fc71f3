use metrics::{describe_counter, Counter};

/// Relay list served from the cache
pub fn relay_list_cache_hits() -> Counter {
    metrics::counter!("relay_list_cache_hits")
}

/// Relay list missing from the cache or expired
pub fn relay_list_cache_misses() -> Counter {
    metrics::counter!("relay_list_cache_misses")
}

/// Entries dropped for age or to keep the cache bounded
pub fn relay_list_cache_evictions() -> Counter {
    metrics::counter!("relay_list_cache_evictions")
}

/// Queries sent to the event source
pub fn relay_list_queries() -> Counter {
    metrics::counter!("relay_list_queries")
}

/// Registers descriptions with the installed recorder, if any.
pub fn describe_metrics() {
    describe_counter!(
        "relay_list_cache_hits",
        "Relay list lookups answered from the cache"
    );
    describe_counter!(
        "relay_list_cache_misses",
        "Relay list lookups that required a network query"
    );
    describe_counter!(
        "relay_list_cache_evictions",
        "Relay list cache entries removed by expiry or size bound"
    );
    describe_counter!("relay_list_queries", "Relay list queries sent to relays");
}
