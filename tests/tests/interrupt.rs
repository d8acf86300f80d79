#![cfg(unix)]
// Kept in its own test binary: SIGINT is delivered to the whole process.

mod utils;
use utils::*;

use ecommerce_load::prelude::*;
use std::process::Command;
use std::time::Duration;
use tokio::time::timeout;

#[tracing_test::traced_test]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn ctrl_c_stops_timed_run() {
    let h = init().await;
    h.state.seed_products(5);
    h.state.seed_categories(5);

    let run = LoadTest::new(h.gateway.clone())
        .users(2)
        .spawn_rate(100.)
        .wait_time(Duration::from_millis(5), Duration::from_millis(10))
        .duration(Duration::from_secs(60));

    let interrupt = async {
        // Let the run install its Ctrl-C listener first.
        tokio::time::sleep(Duration::from_millis(500)).await;
        Command::new("kill")
            .args(["-INT", &std::process::id().to_string()])
            .status()
            .unwrap()
    };

    let (stats, status) = timeout(Duration::from_secs(10), async { tokio::join!(run, interrupt) })
        .await
        .expect("run kept going after Ctrl-C");
    assert!(status.success());
    let stats = stats.unwrap();

    assert_eq!(stats.users, 2);
    assert!(stats.elapsed < Duration::from_secs(10));
    assert!(logs_contain("Ctrl-C received, stopping"));
}
