pub(crate) const METRIC_HOOK_INVOCATIONS: &str = "lifecycle_hook_invocations_total";
pub(crate) const METRIC_HOOK_DURATION: &str = "lifecycle_hook_duration_seconds";
pub(crate) const METRIC_STYLESHEET_SKIPPED: &str = "lifecycle_stylesheet_skipped_total";

pub(crate) fn emit_hook_result(hook: &str, result: &str, duration_secs: f64) {
    metrics::counter!(
        METRIC_HOOK_INVOCATIONS,
        "hook" => hook.to_string(),
        "result" => result.to_string()
    )
    .increment(1);
    metrics::histogram!(
        METRIC_HOOK_DURATION,
        "hook" => hook.to_string(),
        "result" => result.to_string()
    )
    .record(duration_secs);
}

pub(crate) fn emit_stylesheet_skipped() {
    metrics::counter!(METRIC_STYLESHEET_SKIPPED).increment(1);
}
