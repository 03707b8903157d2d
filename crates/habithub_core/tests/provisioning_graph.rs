use habithub_core::{ProvisionError, ProvisionState, ProvisioningGraph};
use std::convert::Infallible;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

struct Settings {
    name: &'static str,
}

struct Storage {
    settings: Arc<Settings>,
}

struct Accessor {
    storage: Arc<Storage>,
}

struct FirstFacade(Arc<Accessor>);
struct SecondFacade(Arc<Accessor>);

#[derive(Debug)]
struct StorageUnavailable;

impl Display for StorageUnavailable {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "storage unavailable")
    }
}

impl Error for StorageUnavailable {}

fn layered_graph(storage_builds: Arc<AtomicUsize>) -> ProvisioningGraph {
    let mut graph = ProvisioningGraph::new();
    graph
        .register_instance(Settings { name: "test" })
        .unwrap();
    graph
        .register(move |settings: Arc<Settings>| {
            storage_builds.fetch_add(1, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(20));
            Ok::<_, Infallible>(Storage { settings })
        })
        .unwrap();
    graph
        .register(|storage: Arc<Storage>| Ok::<_, Infallible>(Accessor { storage }))
        .unwrap();
    graph
        .register(|accessor: Arc<Accessor>| Ok::<_, Infallible>(FirstFacade(accessor)))
        .unwrap();
    graph
        .register(|accessor: Arc<Accessor>| Ok::<_, Infallible>(SecondFacade(accessor)))
        .unwrap();
    graph
}

#[test]
fn repeated_resolution_returns_identical_instance() {
    let graph = layered_graph(Arc::new(AtomicUsize::new(0)));

    let first = graph.resolve::<Accessor>().unwrap();
    let second = graph.resolve::<Accessor>().unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(graph.construction_count::<Accessor>(), 1);
}

#[test]
fn facades_share_one_accessor_and_one_storage() {
    let builds = Arc::new(AtomicUsize::new(0));
    let graph = layered_graph(Arc::clone(&builds));

    let first = graph.resolve::<FirstFacade>().unwrap();
    let second = graph.resolve::<SecondFacade>().unwrap();
    let storage = graph.resolve::<Storage>().unwrap();

    assert!(Arc::ptr_eq(&first.0, &second.0));
    assert!(Arc::ptr_eq(&first.0.storage, &storage));
    assert_eq!(storage.settings.name, "test");
    assert_eq!(builds.load(Ordering::SeqCst), 1);
    assert_eq!(graph.construction_count::<Accessor>(), 1);
}

#[test]
fn concurrent_first_resolution_runs_factory_once() {
    let builds = Arc::new(AtomicUsize::new(0));
    let graph = layered_graph(Arc::clone(&builds));
    let barrier = Barrier::new(50);
    let (graph_ref, barrier_ref) = (&graph, &barrier);

    let resolved = thread::scope(|scope| {
        let handles = (0..50)
            .map(|_| {
                scope.spawn(move || {
                    barrier_ref.wait();
                    graph_ref.resolve::<Storage>().unwrap()
                })
            })
            .collect::<Vec<_>>();
        handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .collect::<Vec<_>>()
    });

    assert_eq!(builds.load(Ordering::SeqCst), 1);
    assert_eq!(graph.construction_count::<Storage>(), 1);
    assert_eq!(resolved.len(), 50);
    assert!(resolved.iter().all(|storage| Arc::ptr_eq(storage, &resolved[0])));
}

#[test]
fn concurrent_resolution_of_different_facades_builds_shared_layers_once() {
    let builds = Arc::new(AtomicUsize::new(0));
    let graph = layered_graph(Arc::clone(&builds));
    let barrier = Barrier::new(20);
    let (graph_ref, barrier_ref) = (&graph, &barrier);

    let accessors = thread::scope(|scope| {
        let handles = (0..20)
            .map(|idx| {
                scope.spawn(move || {
                    barrier_ref.wait();
                    if idx % 2 == 0 {
                        Arc::clone(&graph_ref.resolve::<FirstFacade>().unwrap().0)
                    } else {
                        Arc::clone(&graph_ref.resolve::<SecondFacade>().unwrap().0)
                    }
                })
            })
            .collect::<Vec<_>>();
        handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .collect::<Vec<_>>()
    });

    assert_eq!(builds.load(Ordering::SeqCst), 1);
    assert!(accessors.iter().all(|accessor| Arc::ptr_eq(accessor, &accessors[0])));
}

#[test]
fn unregistered_type_is_a_configuration_error() {
    let graph = layered_graph(Arc::new(AtomicUsize::new(0)));

    let err = graph.resolve::<String>().err().unwrap();
    assert!(matches!(
        err,
        ProvisionError::Unregistered {
            required_by: None,
            ..
        }
    ));
    assert!(err.is_configuration_error());
}

#[test]
fn missing_dependency_names_its_dependent() {
    let mut graph = ProvisioningGraph::new();
    graph
        .register(|storage: Arc<Storage>| Ok::<_, Infallible>(Accessor { storage }))
        .unwrap();

    let validation = graph.validate().unwrap_err();
    match validation {
        ProvisionError::Unregistered {
            provided,
            required_by: Some(dependent),
        } => {
            assert!(provided.ends_with("Storage"));
            assert!(dependent.ends_with("Accessor"));
        }
        other => panic!("unexpected error: {other}"),
    }

    let resolution = graph.resolve::<Accessor>().err().unwrap();
    assert!(matches!(resolution, ProvisionError::Unregistered { .. }));
    assert_eq!(graph.state::<Accessor>(), Some(ProvisionState::Unresolved));
}

struct Left(#[allow(dead_code)] Arc<Right>);
struct Right(#[allow(dead_code)] Arc<Left>);

fn cyclic_graph() -> ProvisioningGraph {
    let mut graph = ProvisioningGraph::new();
    graph
        .register(|right: Arc<Right>| Ok::<_, Infallible>(Left(right)))
        .unwrap();
    graph
        .register(|left: Arc<Left>| Ok::<_, Infallible>(Right(left)))
        .unwrap();
    graph
}

#[test]
fn dependency_cycle_is_reported_by_resolution() {
    let graph = cyclic_graph();

    let err = graph.resolve::<Left>().err().unwrap();
    match &err {
        ProvisionError::DependencyCycle(path) => {
            assert_eq!(path.len(), 3);
            assert!(path[0].ends_with("Left"));
            assert!(path[1].ends_with("Right"));
            assert!(path[2].ends_with("Left"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(err.is_configuration_error());
    assert_eq!(graph.state::<Left>(), Some(ProvisionState::Unresolved));
    assert_eq!(graph.state::<Right>(), Some(ProvisionState::Unresolved));
}

#[test]
fn dependency_cycle_is_reported_by_validation() {
    let graph = cyclic_graph();
    let err = graph.validate().unwrap_err();
    assert!(matches!(err, ProvisionError::DependencyCycle(_)));
    assert!(err.to_string().contains(" -> "));
}

#[test]
fn acyclic_graph_validates() {
    let graph = layered_graph(Arc::new(AtomicUsize::new(0)));
    graph.validate().unwrap();
    assert_eq!(graph.state::<Storage>(), Some(ProvisionState::Unresolved));
}

#[test]
fn failed_factory_is_not_cached_and_runs_again() {
    let available = Arc::new(AtomicBool::new(false));
    let mut graph = ProvisioningGraph::new();
    graph
        .register_instance(Settings { name: "retry" })
        .unwrap();
    {
        let available = Arc::clone(&available);
        graph
            .register(move |settings: Arc<Settings>| {
                if available.load(Ordering::SeqCst) {
                    Ok(Storage { settings })
                } else {
                    Err(StorageUnavailable)
                }
            })
            .unwrap();
    }
    graph
        .register(|storage: Arc<Storage>| Ok::<_, Infallible>(Accessor { storage }))
        .unwrap();

    let err = graph.resolve::<Accessor>().err().unwrap();
    assert!(!err.is_configuration_error());
    match &err {
        ProvisionError::Factory { provided, source } => {
            assert!(provided.ends_with("Storage"));
            assert!(source.downcast_ref::<StorageUnavailable>().is_some());
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(err.source().is_some());
    assert_eq!(graph.state::<Storage>(), Some(ProvisionState::Unresolved));
    assert_eq!(graph.construction_count::<Accessor>(), 1);

    available.store(true, Ordering::SeqCst);
    let accessor = graph.resolve::<Accessor>().unwrap();
    assert_eq!(accessor.storage.settings.name, "retry");
    assert_eq!(graph.construction_count::<Storage>(), 2);
    assert_eq!(graph.construction_count::<Accessor>(), 2);
    assert_eq!(graph.state::<Accessor>(), Some(ProvisionState::Resolved));
}

#[test]
fn root_factory_builds_without_dependencies() {
    let mut graph = ProvisioningGraph::new();
    graph
        .register_root(|| Ok::<_, Infallible>(Settings { name: "root" }))
        .unwrap();

    assert!(graph.is_registered::<Settings>());
    assert!(!graph.is_registered::<Storage>());
    assert_eq!(graph.resolve::<Settings>().unwrap().name, "root");
    assert_eq!(graph.construction_count::<Settings>(), 1);
}

struct Report {
    settings: Arc<Settings>,
    accessor: Arc<Accessor>,
}

#[test]
fn two_dependency_factory_receives_shared_instances() {
    let builds = Arc::new(AtomicUsize::new(0));
    let mut graph = layered_graph(Arc::clone(&builds));
    graph
        .register2(|settings: Arc<Settings>, accessor: Arc<Accessor>| {
            Ok::<_, Infallible>(Report { settings, accessor })
        })
        .unwrap();
    graph.validate().unwrap();

    let report = graph.resolve::<Report>().unwrap();
    let accessor = graph.resolve::<Accessor>().unwrap();
    assert!(Arc::ptr_eq(&report.accessor, &accessor));
    assert!(Arc::ptr_eq(&report.settings, &accessor.storage.settings));
    assert_eq!(builds.load(Ordering::SeqCst), 1);
}

#[test]
fn missing_second_dependency_is_reported() {
    let mut graph = ProvisioningGraph::new();
    graph
        .register_instance(Settings { name: "partial" })
        .unwrap();
    graph
        .register2(|settings: Arc<Settings>, accessor: Arc<Accessor>| {
            Ok::<_, Infallible>(Report { settings, accessor })
        })
        .unwrap();

    match graph.validate().unwrap_err() {
        ProvisionError::Unregistered {
            provided,
            required_by: Some(dependent),
        } => {
            assert!(provided.ends_with("Accessor"));
            assert!(dependent.ends_with("Report"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(graph.resolve::<Report>().is_err());
    assert_eq!(graph.state::<Report>(), Some(ProvisionState::Unresolved));
}
