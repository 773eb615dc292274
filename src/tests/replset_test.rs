use std::time::Duration;

use bson::{doc, Document};
use test_env_log::test;

use crate::clusterup::admin::Connector;
use crate::clusterup::config::Settings;
use crate::clusterup::replset::{count_healthy, healthy_members, initiate, wait_healthy, MemberState};
use crate::tests::common::FakeCluster;


fn status(members: &[(f64, i32)]) -> Document {
    let members: Vec<Document> = members.iter()
        .enumerate()
        .map(|(i, &(health, state))| doc! { "_id": i as i32, "health": health, "state": state })
        .collect();
    doc! { "set": "rs1", "members": members, "ok": 1.0 }
}

#[test]
fn test_member_state() {
    assert_eq!(MemberState::from(1), MemberState::Primary);
    assert_eq!(MemberState::from(2), MemberState::Secondary);
    assert_eq!(MemberState::from(5), MemberState::Startup2);
    assert_eq!(MemberState::from(4), MemberState::Unknown);
    assert_eq!(MemberState::from(42), MemberState::Unknown);
    assert!(MemberState::Primary.is_serving());
    assert!(!MemberState::Recovering.is_serving());
    assert_eq!(MemberState::Secondary.to_string(), "Secondary");
}

#[test]
fn test_healthy_members() {
    assert_eq!(healthy_members(&status(&[(1.0, 1), (1.0, 2), (1.0, 2)])), 3);
    // down, or up but not primary/secondary, doesn't count
    assert_eq!(healthy_members(&status(&[(1.0, 1), (0.0, 2), (1.0, 3)])), 1);
    assert_eq!(healthy_members(&status(&[(1.0, 7), (1.0, 5)])), 0);
    assert_eq!(healthy_members(&status(&[])), 0);
    // replies without members, like before the set is initiated
    assert_eq!(healthy_members(&doc! { "ok": 0.0, "errmsg": "no replset config has been received" }), 0);
    // integer health is accepted too
    assert_eq!(healthy_members(&doc! { "members": [{ "health": 1, "state": 1 }] }), 1);
}

#[test(tokio::test)]
async fn test_initiate_and_count() {
    let conf = Settings::default();
    let rs1 = &conf.replica_sets[1];
    let cluster = FakeCluster::new();
    let node = cluster.connect(rs1.seed().unwrap(), None).await.expect("connect");

    // not initiated yet
    assert_eq!(count_healthy(&node).await, 0);

    initiate(&node, rs1).await.expect("initiate");
    assert_eq!(count_healthy(&node).await, 3);

    // a second initiate is harmless
    initiate(&node, rs1).await.expect("already initialized is fine");
    assert_eq!(cluster.commands("replSetInitiate").len(), 2);
}

#[test(tokio::test)]
async fn test_wait_healthy() {
    let conf = Settings::default();
    let cluster = FakeCluster::new();
    cluster.healthy_after(3);

    let mut nodes = Vec::new();
    for rs in &conf.replica_sets {
        let node = cluster.connect(rs.seed().unwrap(), None).await.expect("connect");
        initiate(&node, rs).await.expect("initiate");
        nodes.push(node);
    }
    let seeds: Vec<_> = nodes.iter().collect();

    assert!(wait_healthy(&seeds, conf.total_members(), 10, Duration::ZERO).await);
    // 3 unhealthy polls and one healthy one, per set
    assert_eq!(cluster.commands("replSetGetStatus").len(), 8);
}

#[test(tokio::test)]
async fn test_wait_healthy_times_out() {
    let conf = Settings::default();
    let cluster = FakeCluster::new();
    cluster.never_healthy();

    let rs = &conf.replica_sets[0];
    let node = cluster.connect(rs.seed().unwrap(), None).await.expect("connect");
    initiate(&node, rs).await.expect("initiate");

    assert!(!wait_healthy(&[&node], rs.members.len(), 4, Duration::ZERO).await);
    assert_eq!(cluster.commands("replSetGetStatus").len(), 4);
}

#[test(tokio::test)]
async fn test_wait_healthy_sleeps_between_polls() {
    let conf = Settings::default();
    let cluster = FakeCluster::new();
    cluster.healthy_after(2);

    let rs = &conf.replica_sets[0];
    let node = cluster.connect(rs.seed().unwrap(), None).await.expect("connect");
    initiate(&node, rs).await.expect("initiate");

    let start = tokio::time::Instant::now();
    assert!(wait_healthy(&[&node], rs.members.len(), 5, Duration::from_millis(20)).await);
    // two unhealthy polls, each followed by a sleep
    assert!(start.elapsed() >= Duration::from_millis(40));
    assert_eq!(cluster.commands("replSetGetStatus").len(), 3);
}
