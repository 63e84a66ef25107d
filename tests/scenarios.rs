//! End-to-end behavior through the public client

use bytes::Bytes;
use memcache_rs::{args, Arg, CacheError, Client, ClientEvent, EngineConfig, ManualClock, Reply};
use std::collections::HashSet;
use std::sync::Arc;

fn client() -> (ManualClock, Client) {
    let clock = ManualClock::new(1_600_000_000_000);
    let config = EngineConfig::default().with_seed(42);
    let mut client = Client::with_clock(&config, Arc::new(clock.clone()));
    client.create_client();
    client.run_pending();
    (clock, client)
}

fn members(reply: Reply) -> HashSet<Bytes> {
    reply
        .as_array()
        .expect("array reply")
        .iter()
        .map(|r| r.as_bulk().expect("bulk member").clone())
        .collect()
}

#[test]
fn hset_overwrites_and_reports_new_fields() {
    let (_, mut client) = client();
    assert_eq!(client.call("hset", &args!["k", "f", 1]).unwrap(), Reply::integer(1));
    assert_eq!(client.call("hset", &args!["k", "f", 2]).unwrap(), Reply::integer(0));
    assert_eq!(client.call("hget", &args!["k", "f"]).unwrap(), Reply::bulk("2"));
}

#[test]
fn hsetnx_keeps_first_value() {
    let (_, mut client) = client();
    assert_eq!(client.call("hsetnx", &args!["k", "f", "a"]).unwrap(), Reply::integer(1));
    assert_eq!(client.call("hsetnx", &args!["k", "f", "b"]).unwrap(), Reply::integer(0));
    assert_eq!(client.call("hget", &args!["k", "f"]).unwrap(), Reply::bulk("a"));
}

#[test]
fn lpush_prepends() {
    let (_, mut client) = client();
    client.call("lpush", &args!["l", "a"]).unwrap();
    client.call("lpush", &args!["l", "b"]).unwrap();
    assert_eq!(
        client.call("lrange", &args!["l", 0, -1]).unwrap(),
        Reply::bulk_array(vec![Bytes::from("b"), Bytes::from("a")])
    );
}

#[test]
fn list_negative_indexes() {
    let (_, mut client) = client();
    client.call("rpush", &args!["l", "a", "b", "c", "d"]).unwrap();

    let last = client.call("lindex", &args!["l", -1]).unwrap();
    assert_eq!(last, client.call("lindex", &args!["l", 3]).unwrap());
    assert_eq!(last, Reply::bulk("d"));

    let all = client.call("lrange", &args!["l", 0, -1]).unwrap();
    assert_eq!(all.as_array().unwrap().len(), 4);
}

#[test]
fn sadd_ignores_duplicates() {
    let (_, mut client) = client();
    assert_eq!(client.call("sadd", &args!["s", "a", "b", "a"]).unwrap(), Reply::integer(2));
    assert_eq!(client.call("scard", &args!["s"]).unwrap(), Reply::integer(2));
}

#[test]
fn set_algebra_properties() {
    let (_, mut client) = client();
    client.call("sadd", &args!["a", "1", "2", "3", "4"]).unwrap();
    client.call("sadd", &args!["b", "3", "4", "5"]).unwrap();

    let union = members(client.call("sunion", &args!["a", "b"]).unwrap());
    let inter = members(client.call("sinter", &args!["a", "b"]).unwrap());
    let diff = members(client.call("sdiff", &args!["a", "b"]).unwrap());
    let b = members(client.call("smembers", &args!["b"]).unwrap());

    assert!(union.is_superset(&inter));
    assert!(diff.is_disjoint(&b));

    let stored = client.call("sunionstore", &args!["dest", "a", "b"]).unwrap();
    assert_eq!(stored, Reply::integer(union.len() as i64));
}

#[test]
fn expire_then_lookup() {
    let (clock, mut client) = client();
    client.call("set", &args!["k", "v"]).unwrap();
    assert_eq!(client.call("expire", &args!["k", 1]).unwrap(), Reply::integer(1));

    clock.advance(1_500);
    assert!(client.call("get", &args!["k"]).unwrap().is_nil());
    assert_eq!(client.call("ttl", &args!["k"]).unwrap(), Reply::integer(-2));
}

#[test]
fn expiry_boundary() {
    let (clock, mut client) = client();
    client.call("set", &args!["k", "v"]).unwrap();
    client.call("expire", &args!["k", 5]).unwrap();

    clock.advance(4_990);
    assert_eq!(client.call("get", &args!["k"]).unwrap(), Reply::bulk("v"));
    clock.advance(20);
    assert!(client.call("get", &args!["k"]).unwrap().is_nil());
}

#[test]
fn rename_errors_and_moves() {
    let (_, mut client) = client();
    assert_eq!(
        client.call("rename", &args!["absent", "x"]),
        Err(CacheError::NoSuchKey)
    );

    client.call("set", &args!["k", "v"]).unwrap();
    assert_eq!(client.call("rename", &args!["k", "x"]).unwrap(), Reply::ok());
    assert_eq!(client.call("exists", &args!["k"]).unwrap(), Reply::integer(0));
    assert_eq!(client.call("get", &args!["x"]).unwrap(), Reply::bulk("v"));
}

#[test]
fn select_isolates_until_move_or_swap() {
    let (_, mut client) = client();
    client.call("select", &args![5]).unwrap();
    client.call("set", &args!["a", "1"]).unwrap();
    client.call("set", &args!["b", "2"]).unwrap();

    client.call("select", &args![0]).unwrap();
    assert!(client.call("get", &args!["a"]).unwrap().is_nil());

    client.call("select", &args![5]).unwrap();
    assert_eq!(client.call("move", &args!["a", 0]).unwrap(), Reply::integer(1));
    client.call("select", &args![0]).unwrap();
    assert_eq!(client.call("get", &args!["a"]).unwrap(), Reply::bulk("1"));
    assert!(client.call("get", &args!["b"]).unwrap().is_nil());

    client.call("swapdb", &args![0, 5]).unwrap();
    assert_eq!(client.call("get", &args!["b"]).unwrap(), Reply::bulk("2"));
    assert!(client.call("get", &args!["a"]).unwrap().is_nil());
}

#[test]
fn dump_restore_reproduces_value() {
    let (clock, mut client) = client();
    client.call("zadd", &args!["z", 1, "one", 2.5, "two"]).unwrap();

    let payload = client.call("dump", &args!["z"]).unwrap();
    let payload = payload.as_bulk().unwrap().clone();
    assert_eq!(
        client.call("restore", &args!["z2", 10_000, payload]).unwrap(),
        Reply::ok()
    );

    assert_eq!(client.call("type", &args!["z2"]).unwrap(), Reply::status("zset"));
    assert_eq!(
        client.call("zrange", &args!["z2", 0, -1, "WITHSCORES"]).unwrap(),
        client.call("zrange", &args!["z", 0, -1, "WITHSCORES"]).unwrap()
    );
    assert_eq!(client.call("pttl", &args!["z2"]).unwrap(), Reply::integer(10_000));

    clock.advance(10_000);
    assert_eq!(client.call("exists", &args!["z2"]).unwrap(), Reply::integer(0));
}

#[test]
fn wrong_type_is_reported() {
    let (_, mut client) = client();
    client.call("sadd", &args!["s", "a"]).unwrap();
    assert_eq!(client.call("get", &args!["s"]), Err(CacheError::WrongType));
    assert_eq!(client.call("hget", &args!["s", "f"]), Err(CacheError::WrongType));
}

#[test]
fn emptied_collections_disappear() {
    let (_, mut client) = client();
    client.call("rpush", &args!["l", "x"]).unwrap();
    client.call("rpop", &args!["l"]).unwrap();
    assert_eq!(client.call("type", &args!["l"]).unwrap(), Reply::status("none"));

    client.call("hset", &args!["h", "f", "v"]).unwrap();
    client.call("hdel", &args!["h", "f"]).unwrap();
    assert_eq!(client.call("exists", &args!["h"]).unwrap(), Reply::integer(0));
}

#[test]
fn seeded_random_commands_are_repeatable() {
    let run = || {
        let (_, mut client) = client();
        client
            .call("sadd", &args!["s", "a", "b", "c", "d", "e", "f"])
            .unwrap();
        let sample = client.call("srandmember", &args!["s", 3]).unwrap();
        let popped = client.call("spop", &args!["s"]).unwrap();
        (sample, popped)
    };
    assert_eq!(run(), run());
}

#[test]
fn unsupported_commands() {
    let (_, mut client) = client();
    assert_eq!(
        client.call("eval", &args!["return 1", 0]),
        Err(CacheError::UnsupportedCommand("eval".into()))
    );

    let config = EngineConfig::default().bypass_unsupported(true);
    let mut bypassing = Client::new(&config);
    assert_eq!(bypassing.call("publish", &args!["chan", "msg"]).unwrap(), Reply::Nil);
}

#[test]
fn lifecycle_round_trip() {
    let mut client = Client::new(&EngineConfig::default());
    let mut events = client.subscribe();

    client.create_client();
    client.run_pending();
    assert_eq!(events.try_recv().unwrap(), ClientEvent::Connect);
    assert_eq!(events.try_recv().unwrap(), ClientEvent::Ready);
    assert!(client.is_connected());

    assert_eq!(client.quit(), Reply::ok());
    client.run_pending();
    assert_eq!(events.try_recv().unwrap(), ClientEvent::End);
    assert!(!client.is_connected());
}

#[test]
fn hmset_accepts_mapping() {
    let (_, mut client) = client();
    let fields = Arg::map([("a", "1"), ("b", "2")]);
    assert_eq!(client.call("hmset", &[Arg::from("h"), fields]).unwrap(), Reply::ok());
    assert_eq!(
        client.call("hmget", &args!["h", "b", "zz"]).unwrap(),
        Reply::array(vec![Reply::bulk("2"), Reply::Nil])
    );
}

#[test]
fn multi_exec_applies_queued_commands() {
    let (_, mut client) = client();
    assert_eq!(client.call("multi", &[]).unwrap(), Reply::ok());
    assert_eq!(client.call("rpush", &args!["l", "a", "b"]).unwrap(), Reply::status("QUEUED"));
    assert_eq!(client.call("lpop", &args!["l"]).unwrap(), Reply::status("QUEUED"));

    assert_eq!(
        client.call("exec", &[]).unwrap(),
        Reply::array(vec![Reply::integer(2), Reply::bulk("a")])
    );
    assert_eq!(client.call("llen", &args!["l"]).unwrap(), Reply::integer(1));

    client.call("multi", &[]).unwrap();
    client.call("del", &args!["l"]).unwrap();
    assert_eq!(client.call("discard", &[]).unwrap(), Reply::ok());
    assert_eq!(client.call("exists", &args!["l"]).unwrap(), Reply::integer(1));
    assert_eq!(client.call("exec", &[]), Err(CacheError::WithoutMulti("EXEC")));
}

#[test]
fn failed_calls_leave_no_partial_state() {
    let (_, mut client) = client();
    client.call("hset", &args!["h", "f", "v"]).unwrap();
    assert!(client.call("hdel", &[Arg::from("h"), Arg::from("f"), Arg::Nil]).is_err());
    assert_eq!(client.call("hlen", &args!["h"]).unwrap(), Reply::integer(1));

    let empty = r#"{"version":1,"ttl":null,"value":{"type":"list","data":[]}}"#;
    assert_eq!(client.call("restore", &args!["k", 0, empty]), Err(CacheError::BadPayload));
    assert_eq!(client.call("exists", &args!["k"]).unwrap(), Reply::integer(0));

    client.call("rpush", &args!["l", "a", "b"]).unwrap();
    assert_eq!(client.call("lset", &args!["l", -1, "z"]), Err(CacheError::OutOfRange));
}
