//! Basic example demonstrating tagcache with the memory backend

use std::time::Duration;
use tagcache::prelude::*;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct User {
    id: u64,
    name: String,
    email: String,
}

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tagcache=debug")),
        )
        .init();

    println!("=== tagcache Basic Example ===\n");

    // Sweep expired entries every second
    let backend = MemoryBackend::new(MemoryConfig::with_cleanup_interval(Duration::from_secs(1)));
    let cache = TagCache::with_config(backend, TagCacheConfig::with_ttl(Duration::from_secs(300)));

    let alice = User {
        id: 1,
        name: "Alice".to_string(),
        email: "alice@example.com".to_string(),
    };
    let bob = User {
        id: 2,
        name: "Bob".to_string(),
        email: "bob@example.com".to_string(),
    };

    println!("Storing users with tags...");
    cache.set("user:1", &alice, &["users", "team:red"]).await?;
    cache.set("user:2", &bob, &["users"]).await?;

    let user: User = cache.get("user:1").await?;
    println!("Got {} <{}>", user.name, user.email);
    println!("Keys tagged 'users': {:?}", cache.keys_by_tag("users").await?);

    println!("\nInvalidating tag 'team:red'...");
    cache.del_by_tag("team:red").await?;

    match cache.get::<User>("user:1").await {
        Ok(user) => println!("Unexpected hit: {:?}", user),
        Err(e) if e.is_not_found() => println!("user:1 is gone ({})", e),
        Err(e) => return Err(e.into()),
    }
    println!("user:2 still cached: {}", cache.get::<User>("user:2").await?.name);
    println!("Keys tagged 'users': {:?}", cache.keys_by_tag("users").await?);

    println!("\nFlushing everything...");
    cache.del_all().await?;
    println!("Keys tagged 'users': {:?}", cache.keys_by_tag("users").await?);

    // Stops the sweeper
    cache.close().await?;

    println!("\n=== Example Complete ===");
    Ok(())
}
