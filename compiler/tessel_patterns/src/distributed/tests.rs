use super::*;
use crate::errors::EvalErrorKind;
use crate::test_helpers::{collect_factory, name};
use crate::context::EvalContext;
use pretty_assertions::assert_eq;

fn cluster(count: u32) -> (Vec<Arc<Locality>>, Arc<InProcessTransport>) {
    let hub = Arc::new(CollectiveHub::new(count as usize));
    let transport = Arc::new(InProcessTransport::new());
    let localities: Vec<_> = (0..count)
        .map(|id| Locality::new(id, count, Arc::clone(&hub), Duration::from_secs(5)).unwrap())
        .collect();
    for locality in &localities {
        transport.attach(locality);
        locality.set_transport(transport.clone());
    }
    (localities, transport)
}

#[test]
fn locality_membership_is_validated() {
    let hub = Arc::new(CollectiveHub::new(2));
    assert!(Locality::new(2, 2, Arc::clone(&hub), DEFAULT_COLLECTIVE_TIMEOUT).is_err());
    assert!(Locality::new(0, 0, Arc::clone(&hub), DEFAULT_COLLECTIVE_TIMEOUT).is_err());
    assert!(Locality::new(0, 3, Arc::clone(&hub), DEFAULT_COLLECTIVE_TIMEOUT).is_err());
    assert!(Locality::new(1, 2, hub, DEFAULT_COLLECTIVE_TIMEOUT).is_ok());
}

#[test]
fn registry_holds_weak_references() {
    let locality = Locality::single();
    let node = collect_factory(vec![Value::int(1)], name("collect", 0));
    locality.names().register(&node);
    let composed = node.name().compose();
    assert_eq!(locality.names().get(&composed), Some(node.clone()));

    drop(node);
    assert_eq!(locality.names().get(&composed), None);
    locality.names().prune();
    assert!(locality.names().is_empty());
}

#[test]
fn resolve_local_and_unknown_names() {
    let locality = Locality::single();
    let node = collect_factory(vec![], name("collect", 3));
    locality.names().register(&node);
    assert_eq!(locality.resolve(node.name()).unwrap(), node);

    let err = locality.resolve(&name("collect", 4)).unwrap_err();
    assert!(matches!(err.kind, EvalErrorKind::UnresolvedName { .. }));
    let err = locality.resolve(&name("collect", 3).on_locality(1)).unwrap_err();
    assert!(matches!(err.kind, EvalErrorKind::UnresolvedName { .. }));
    assert!(locality.resolve_str("not a name").is_err());
}

#[tokio::test(flavor = "multi_thread")]
async fn remote_names_forward_through_the_transport() {
    let (localities, _transport) = cluster(2);
    let remote_name = name("collect", 0).on_locality(1);
    let node = collect_factory(vec![Value::int(42)], remote_name.clone());
    localities[1].names().register(&node);

    let proxy = localities[0].resolve(&remote_name).unwrap();
    assert_ne!(proxy, node);
    let value = proxy
        .eval(Vec::new(), EvalContext::new(Arc::clone(&localities[0])))
        .await
        .unwrap();
    assert_eq!(value, Value::list(vec![Value::int(42)]));
}

#[tokio::test(flavor = "multi_thread")]
async fn all_to_all_uses_matching_generations() {
    let (localities, _transport) = cluster(2);
    let (a, b) = (Arc::clone(&localities[0]), Arc::clone(&localities[1]));
    let task = tokio::spawn(async move {
        let first = b.all_to_all("tile", Value::int(10)).await.unwrap();
        let second = b.all_to_all("tile", Value::int(11)).await.unwrap();
        (first, second)
    });
    let first = a.all_to_all("tile", Value::int(0)).await.unwrap();
    let second = a.all_to_all("tile", Value::int(1)).await.unwrap();
    assert_eq!(first, vec![Value::int(0), Value::int(10)]);
    assert_eq!(second, vec![Value::int(1), Value::int(11)]);
    assert_eq!(task.await.unwrap(), (first, second));
}

#[test]
fn generations_count_per_key() {
    let locality = Locality::single();
    assert_eq!(locality.next_generation("a"), 0);
    assert_eq!(locality.next_generation("a"), 1);
    assert_eq!(locality.next_generation("b"), 0);
}
