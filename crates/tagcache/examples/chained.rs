//! A fast in-process tier in front of a second store
//!
//! Run with `--features redis` and a local Redis to put Redis behind memory.

use std::sync::Arc;
use std::time::Duration;
use tagcache::prelude::*;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tagcache=debug")),
        )
        .init();

    let l1 = MemoryBackend::new(MemoryConfig::with_cleanup_interval(Duration::from_secs(5)));
    let l2 = second_tier().await?;

    let chain = ChainBackend::new(vec![Arc::new(l1.clone()), l2]);
    let cache = TagCache::new(chain);

    cache.set("page:/home", &"<h1>home</h1>", &["pages"]).await?;
    cache.set("page:/about", &"<h1>about</h1>", &["pages"]).await?;

    // Drop the fast tier's copy; reads fall through to the second tier
    l1.del_all().await?;
    let html: String = cache.get("page:/home").await?;
    println!("served from second tier: {}", html);

    cache.del_by_tag("pages").await?;
    println!(
        "after invalidation: {}",
        cache.get::<String>("page:/about").await.unwrap_err()
    );

    // Releases every tier, reporting all failures together
    cache.close().await?;
    Ok(())
}

#[cfg(feature = "redis")]
async fn second_tier() -> Result<Arc<dyn Backend>> {
    let backend = RedisBackend::new(RedisConfig::default().prefix("tagcache-example:")).await?;
    Ok(Arc::new(backend))
}

#[cfg(not(feature = "redis"))]
async fn second_tier() -> Result<Arc<dyn Backend>> {
    Ok(Arc::new(MemoryBackend::new(MemoryConfig::without_sweeper())))
}
