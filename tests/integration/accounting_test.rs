use chrono::Local;
use radgate_plugin::logfile::dated_file_name;
use radgate_tests::{accounting_request, wait_for_file, LibDir, RunningAccounting};
use std::time::Duration;
use tokio::net::UdpSocket;

#[tokio::test]
async fn test_accounting_records_are_logged() {
    let lib = LibDir::new();
    let sink = RunningAccounting::start(&lib, "plugins = ['logger', 'stats']").await;

    let client = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    client.send_to(b"garbage", sink.addr).await.unwrap();
    client
        .send_to(&accounting_request(1, "carol"), sink.addr)
        .await
        .unwrap();
    client
        .send_to(&accounting_request(2, "carol"), sink.addr)
        .await
        .unwrap();

    let stats = wait_for_file(&lib.logs().join("radgate.stats.accounting"), |s| {
        s.contains("count: 2")
    })
    .await
    .unwrap();
    assert!(stats.contains("name: accounting"));

    let log_path = lib
        .logs()
        .join(dated_file_name("accounting", None, Local::now().date_naive()));
    let log = wait_for_file(&log_path, |s| {
        s.matches("id -> accounting").count() == 2
    })
    .await
    .unwrap();
    assert!(log.contains("[ACCOUNTING] Value: carol"));

    let mut buf = [0u8; 64];
    assert!(
        tokio::time::timeout(Duration::from_millis(200), client.recv_from(&mut buf))
            .await
            .is_err()
    );
}

#[tokio::test]
async fn test_bad_authenticator_is_ignored() {
    let lib = LibDir::new();
    let sink = RunningAccounting::start(&lib, "plugins = ['stats']").await;

    let mut record = accounting_request(1, "dave");
    record[4] ^= 0xff;
    let client = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    client.send_to(&record, sink.addr).await.unwrap();
    client
        .send_to(&accounting_request(2, "dave"), sink.addr)
        .await
        .unwrap();

    let stats = wait_for_file(&lib.logs().join("radgate.stats.accounting"), |s| {
        s.contains("count: ")
    })
    .await
    .unwrap();
    assert!(stats.contains("count: 1"));

    sink.server.reload();
}
