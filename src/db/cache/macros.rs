/// Read-through caching around an async computation.
///
/// Looks `$key` up in `$cache` and returns the decoded value on a hit. On a
/// miss it awaits `$block`, queues the result for a background write with
/// `$ttl` seconds to live, and returns it. A failed lookup (backend down, or
/// an entry that no longer decodes) is logged and treated as a miss. Errors
/// from `$block` are propagated with `?`, so the enclosing function must
/// return an `AppResult`.
///
/// ```rust,ignore
/// cached!(self.cache, key, self.cache_ttl, self.compute(user_id, filter, limit))
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $block:expr) => {{
        let lookup = match $cache.get_from_cache(&$key).await {
            Ok(lookup) => lookup,
            Err(e) => {
                tracing::warn!(key = %$key, error = %e, "Cache read failed, recomputing");
                None
            }
        };

        match lookup {
            Some(hit) => {
                tracing::debug!(key = %$key, "Cache hit");
                Ok(hit)
            }
            None => {
                tracing::debug!(key = %$key, "Cache miss");
                let value = $block.await?;
                $cache.set_in_background(&$key, &value, $ttl);
                Ok(value)
            }
        }
    }};
}
