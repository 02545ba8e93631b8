/* demos/demo.rs */

use realip::{HeaderSet, ReservedRanges, Resolver, is_local_address, real_ip};
use std::collections::HashMap;

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    println!("=== Real IP Resolution Examples ===\n");

    // Example 1: No proxy in front, peer address is used
    example_1_peer_address();

    // Example 2: X-Forwarded-For with internal hops
    example_2_forwarded_chain();

    // Example 3: Only internal hops, fall back to X-Real-Ip
    example_3_real_ip_fallback();

    // Example 4: Headers from a plain map
    example_4_header_map();

    // Example 5: Custom reserved ranges
    example_5_custom_ranges();

    // Example 6: Classifying single addresses
    example_6_classify();

    println!("=== All examples completed! ===");
}

fn example_1_peer_address() {
    println!("Example 1: Peer address without forwarding headers");

    let peer = "203.0.113.5:4000";
    println!("Peer {} -> {}", peer, real_ip(peer, &HeaderSet::default()));
    println!();
}

fn example_2_forwarded_chain() {
    println!("Example 2: X-Forwarded-For with internal hops");

    let headers = HeaderSet::new(None, Some("10.0.0.1, 203.0.113.9, 198.51.100.2"));
    let resolution = Resolver::new().resolve("10.0.0.254:41000", &headers);
    println!(
        "Resolved {} from {:?}",
        resolution.address, resolution.source
    );
    println!();
}

fn example_3_real_ip_fallback() {
    println!("Example 3: Internal-only chain falls back to X-Real-Ip");

    let headers = HeaderSet::new(Some("198.51.100.7"), Some("10.0.0.1, 192.168.1.1"));
    println!("Resolved {}", real_ip("10.0.0.254:41000", &headers));

    let headers = HeaderSet::new(None, Some("10.0.0.1, 192.168.1.1"));
    println!(
        "Without X-Real-Ip the result is empty: {:?}",
        real_ip("10.0.0.254:41000", &headers)
    );
    println!();
}

fn example_4_header_map() {
    println!("Example 4: Headers from a plain map");

    let mut headers = HashMap::new();
    headers.insert("X-Forwarded-For".to_string(), "garbage, 203.0.113.9".to_string());

    for (key, value) in &headers {
        println!("  {}: {}", key, value);
    }

    // Unparsable entries are not local, so they are not skipped.
    println!(
        "Resolved {:?}",
        real_ip("10.0.0.254:41000", &HeaderSet::from_map(&headers))
    );
    println!();
}

fn example_5_custom_ranges() {
    println!("Example 5: Custom reserved ranges");

    let ranges = match ReservedRanges::from_cidrs(["10.0.0.0/8", "100.64.0.0/10"]) {
        Ok(ranges) => ranges,
        Err(err) => {
            println!("Invalid table: {}", err);
            return;
        }
    };
    let resolver = Resolver::new().with_ranges(ranges);
    let headers = HeaderSet::new(None, Some("100.64.3.3, 10.0.0.1, 203.0.113.9"));
    println!("Resolved {}", resolver.real_ip("10.0.0.254:41000", &headers));

    if let Err(err) = ReservedRanges::from_cidrs(["10.0.0.0/33"]) {
        println!("Rejected table: {}", err);
    }
    println!();
}

fn example_6_classify() {
    println!("Example 6: Classifying addresses");

    for addr in ["127.0.0.1", "172.16.0.1", "172.32.0.1", "fd00::1", "147.12.56.11", "nope"] {
        println!("  {:<14} local = {}", addr, is_local_address(addr));
    }
    println!();
}
