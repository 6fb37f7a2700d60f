/// Read-through caching over Redis.
///
/// Checks the cache for `$key`; on a hit the cached value is returned, on a
/// miss `$block` computes it and the result is queued for a background cache
/// write with the given TTL before being returned.
///
/// # Example
/// ```rust,ignore
/// cached!(self.cache, CacheKey::Popular(page), LIST_CACHE_TTL, async move {
///     self.fetch_popular(page).await
/// })
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $block:expr) => {{
        if let Some(cached) = $cache.get_from_cache(&$key).await? {
            Ok(cached)
        } else {
            let value = $block.await?;
            $cache.set_in_background(&$key, &value, $ttl);
            Ok(value)
        }
    }};
}
