//! End-to-end satisfaction scenarios: machine-identity facts feeding a
//! composed condition tree, evaluated through the full fetch/cache/session
//! pipeline.

use std::net::{IpAddr, Ipv4Addr};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use time::macros::datetime;

use factum::{
    ActivationPolicy, AndCondition, Condition, ConditionProperties, EngineClock, EngineError, Fact,
    FactCache, FactCondition, FactSourceProperties, FactSourceRegistry, FixedClock,
    LeafCondition, OrCondition, Rule, RuleEvaluationResult, SatisfactionEngine,
    SatisfactionStatus, StaticFactSource,
};

const LOCAL_IP_ADDRESSES: &str = "net.local_ip_addresses";
const HOST_NAME: &str = "host.name";

struct HasIpAddress(IpAddr);

impl FactCondition for HasIpAddress {
    type Payload = Vec<IpAddr>;

    fn properties() -> ConditionProperties {
        ConditionProperties::new(
            LOCAL_IP_ADDRESSES,
            "HasIpAddress",
            "Whether the local machine has a given IP address",
        )
    }

    fn test(&self, payload: &Vec<IpAddr>) -> bool {
        payload.contains(&self.0)
    }
}

struct HasHostName(String);

impl FactCondition for HasHostName {
    type Payload = String;

    fn properties() -> ConditionProperties {
        ConditionProperties::new(
            HOST_NAME,
            "HasHostName",
            "Whether the local machine has a given name",
        )
    }

    fn test(&self, payload: &String) -> bool {
        *payload == self.0
    }
}

fn ip(a: u8, b: u8, c: u8, d: u8) -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(a, b, c, d))
}

fn setup(host_name: &str) -> (Arc<FixedClock>, SatisfactionEngine) {
    let clock = Arc::new(FixedClock::new(datetime!(2024-03-01 12:00 UTC)));
    let registry = Arc::new(FactSourceRegistry::new(clock.clone()));

    let addresses = vec![ip(127, 0, 0, 1), ip(192, 168, 0, 16)];
    registry
        .register(
            FactSourceProperties::new(
                LOCAL_IP_ADDRESSES,
                "LocalIpAddresses",
                "The IP addresses of the machine",
                ActivationPolicy::OnEngineStartup,
            ),
            move || Arc::new(StaticFactSource::new(addresses.clone(), Duration::from_secs(300))),
        )
        .unwrap()
        .register(
            FactSourceProperties::new(
                HOST_NAME,
                "HostName",
                "The name of the machine",
                ActivationPolicy::JustOnce,
            ),
            {
                let host_name = host_name.to_string();
                move || Arc::new(StaticFactSource::new(host_name.clone(), Duration::MAX))
            },
        )
        .unwrap();

    let engine = SatisfactionEngine::new(registry, clock.clone());
    (clock, engine)
}

fn machine_tree(expected_host: &str) -> AndCondition {
    AndCondition::new(vec![
        Box::new(OrCondition::new(vec![
            LeafCondition::boxed(HasIpAddress(ip(127, 0, 0, 1))),
            LeafCondition::boxed(HasIpAddress(ip(10, 0, 0, 5))),
        ])),
        LeafCondition::boxed(HasHostName(expected_host.to_string())),
    ])
}

#[tokio::test]
async fn matching_machine_satisfies_the_tree() {
    let (_, engine) = setup("h1");
    let tree = machine_tree("h1");
    let mut cache = FactCache::new();

    let status = engine.evaluate_condition(&tree, &mut cache).await.unwrap();
    assert_eq!(status, SatisfactionStatus::Satisfied);
}

#[tokio::test]
async fn wrong_host_name_fails_despite_matching_ip() {
    let (_, engine) = setup("h2");
    let tree = machine_tree("h1");
    let mut cache = FactCache::new();

    let status = engine.evaluate_condition(&tree, &mut cache).await.unwrap();
    assert_eq!(status, SatisfactionStatus::Failed);
}

#[tokio::test]
async fn shared_fact_ids_are_fetched_once_per_evaluation() {
    // Both OR branches declare the same fact id; the tree's required set
    // deduplicates it, so the producer runs once.
    let (_, engine) = setup("h1");
    let tree = machine_tree("h1");

    let required = tree.required_fact_ids().unwrap();
    assert_eq!(required, [LOCAL_IP_ADDRESSES, HOST_NAME]);

    let mut cache = FactCache::new();
    engine.evaluate_condition(&tree, &mut cache).await.unwrap();
    assert!(cache.get(LOCAL_IP_ADDRESSES).is_some());
    assert!(cache.get(HOST_NAME).is_some());
}

#[tokio::test]
async fn five_minute_ttl_round_trip() {
    let (clock, engine) = setup("h1");
    let tree = machine_tree("h1");
    let mut cache = FactCache::new();
    let t0 = clock.now();

    engine.evaluate_condition(&tree, &mut cache).await.unwrap();

    let fact = cache.get(LOCAL_IP_ADDRESSES).unwrap();
    assert_eq!(fact.valid_until, t0 + time::Duration::minutes(5));

    assert!(cache.is_fresh(LOCAL_IP_ADDRESSES, t0 + time::Duration::seconds(4 * 60 + 59)));
    assert!(!cache.is_fresh(LOCAL_IP_ADDRESSES, t0 + time::Duration::seconds(5 * 60 + 1)));

    // The host name fact never expires: its TTL saturated.
    assert!(cache.is_fresh(HOST_NAME, t0 + time::Duration::days(365_000)));
}

#[tokio::test]
async fn tree_instance_is_reusable_across_evaluations() {
    let (clock, engine) = setup("h1");
    let tree = machine_tree("h1");
    let mut cache = FactCache::new();

    let first = engine.evaluate_condition(&tree, &mut cache).await.unwrap();
    clock.advance(time::Duration::minutes(10));
    let second = engine.evaluate_condition(&tree, &mut cache).await.unwrap();

    assert_eq!(first, SatisfactionStatus::Satisfied);
    assert_eq!(second, SatisfactionStatus::Satisfied);
}

// ── Rule dispatch ───────────────────────────────────────────────────────────

struct GreetingRule {
    condition: AndCondition,
    greeted: Mutex<Vec<String>>,
    fired: AtomicUsize,
}

impl GreetingRule {
    fn new(expected_host: &str) -> Self {
        GreetingRule {
            condition: machine_tree(expected_host),
            greeted: Mutex::new(Vec::new()),
            fired: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl Rule for GreetingRule {
    fn priority(&self) -> i32 {
        1
    }

    fn condition(&self) -> &dyn Condition {
        &self.condition
    }

    fn fact_params(&self) -> Vec<String> {
        vec![HOST_NAME.to_string()]
    }

    async fn fire(&self, facts: &[Fact]) -> Result<RuleEvaluationResult, EngineError> {
        self.fired.fetch_add(1, Ordering::SeqCst);
        let host: &String = facts[0].data()?;
        self.greeted.lock().unwrap().push(format!("hello, {host}"));
        Ok(RuleEvaluationResult::EvaluateNext)
    }
}

#[tokio::test]
async fn satisfied_rule_fires_with_its_declared_facts() {
    let (_, engine) = setup("h1");
    let rule = GreetingRule::new("h1");
    let mut cache = FactCache::new();

    let outcome = engine.evaluate_rule(&rule, &mut cache).await.unwrap();
    assert_eq!(outcome, RuleEvaluationResult::EvaluateNext);
    assert_eq!(*rule.greeted.lock().unwrap(), vec!["hello, h1".to_string()]);
}

#[tokio::test]
async fn unsatisfied_rule_never_invokes_its_handler() {
    let (_, engine) = setup("h2");
    let rule = GreetingRule::new("h1");
    let mut cache = FactCache::new();

    let outcome = engine.evaluate_rule(&rule, &mut cache).await.unwrap();
    assert_eq!(outcome, RuleEvaluationResult::NotEvaluated);
    assert_eq!(rule.fired.load(Ordering::SeqCst), 0);
}
