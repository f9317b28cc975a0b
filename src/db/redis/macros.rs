/// Cache-or-compute over a [`RecommendationCache`](crate::db::RecommendationCache).
///
/// Returns the cached value when present. Otherwise awaits `$block`
/// (propagating its error with `?`), stores the result with `$ttl` and
/// returns it. Cache failures never fail the caller.
///
/// # Arguments
/// * `$cache`: cache exposing `get` and `set`.
/// * `$key`: the [`CacheKey`](crate::db::CacheKey) to read and write.
/// * `$ttl`: the [`std::time::Duration`] applied to a fresh value.
/// * `$block`: a future producing `AppResult<T>` on a miss.
///
/// # Example
/// ```rust,ignore
/// let catalog: Vec<Plan> = cached!(cache, key, ttl, async move {
///     source.fetch_catalog(&credential).await
/// })?;
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $block:expr) => {{
        if let Some(cached) = $cache.get(&$key).await {
            Ok(cached)
        } else {
            let value = $block.await?;
            $cache.set(&$key, &value, $ttl).await;
            Ok(value)
        }
    }};
}
