//! Showcase of the query state API against the in-memory relay pool
//!
//! Run with: cargo run --example api_showcase

use nostr_query_core::testing::FakePool;
use nostr_query_core::{
    EventQuery, EventQueryByAuthor, EventQueryOptions, NostrEventBuilder, Result, find_all_tags,
};
use nostr_sdk::{Filter, Keys, Kind};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    println!("🚀 Nostr Query Core API Showcase\n");

    let pool = Arc::new(FakePool::new());

    // Feature 1: Single query with dedup
    println!("1️⃣  EventQuery");
    println!("   Feeding duplicated, unordered events...\n");

    let query = EventQuery::new(
        pool.clone(),
        vec![Filter::new().kind(Kind::TextNote)],
        EventQueryOptions::default(),
    );

    for (id, created_at) in [("n3", 30), ("n1", 10), ("n3", 30), ("n2", 20)] {
        let event = NostrEventBuilder::new()
            .id(id)
            .created_at(created_at)
            .kind(1)
            .content(format!("note {}", id))
            .add_tag(vec!["t", "showcase"])
            .build();
        pool.send_event(0, event);
    }
    pool.send_eose(0);

    let result = query.wait_for_eose().await;
    println!("   ✅ {}", result);
    for event in result.sorted() {
        println!("   • {} @ {}", event.content, event.created_at);
    }

    // Feature 2: Tag helpers
    println!("\n2️⃣  Tag helpers");
    if let Some(event) = result.most_recent() {
        println!("   Newest note tags: {:?}", find_all_tags(event, "t"));
    }

    // Feature 3: Grouped by author
    println!("\n3️⃣  EventQueryByAuthor");

    let alice = Keys::generate().public_key();
    let bob = Keys::generate().public_key();
    let grouped = EventQueryByAuthor::new(
        pool.clone(),
        vec![Filter::new().kind(Kind::TextNote)],
        vec![alice, bob],
        EventQueryOptions::default(),
    );

    for (author, count) in [(alice, 2), (bob, 1)] {
        if let Some(index) = pool.index_for_author(&author) {
            for i in 0..count {
                pool.send_event(
                    index,
                    NostrEventBuilder::new()
                        .id(format!("{}-{}", author.to_hex(), i))
                        .pubkey(author.to_hex())
                        .created_at(i)
                        .kind(1)
                        .build(),
                );
            }
            pool.send_eose(index);
        }
    }

    for (author, result) in grouped.wait_for_eose().await {
        println!("   ✅ {}…: {}", &author.to_hex()[..8], result);
    }

    println!("\n✨ Done");
    Ok(())
}
