//! Lazily constructed, process-wide singletons keyed by type.
//!
//! # Responsibility
//! - Register one factory (or one prebuilt instance) per provided type.
//! - Resolve a type into its single shared `Arc<T>`, constructing it and its
//!   dependencies depth-first on first request.
//! - Detect missing registrations and dependency cycles.
//!
//! # Invariants
//! - A factory runs only while no instance is cached; once one call
//!   succeeds the instance is returned forever and the factory never runs
//!   again.
//! - Concurrent first requests for one type run its factory once; the other
//!   callers block until the instance exists.
//! - A failed factory caches nothing; the next request runs it again.
//! - Cycle detection follows the current resolution chain only, so a caller
//!   waiting on another thread's construction is not reported as a cycle.

use log::{error, info, trace};
use once_cell::sync::OnceCell;
use std::any::{Any, TypeId};
use std::collections::{HashMap, HashSet};
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

type Instance = Arc<dyn Any + Send + Sync>;
type ErasedFactory =
    Box<dyn Fn(&ProvisioningGraph, &mut Vec<TypeKey>) -> ProvisionResult<Instance> + Send + Sync>;

/// Error returned by a collaborator factory.
pub type FactoryError = Box<dyn Error + Send + Sync>;

pub type ProvisionResult<T> = Result<T, ProvisionError>;

/// Identity of a provided type.
#[derive(Debug, Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    pub fn of<T: 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Construction state of one provided type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisionState {
    Unresolved,
    Resolving,
    Resolved,
}

#[derive(Debug)]
pub enum ProvisionError {
    /// No factory registered for `provided`. Wiring bug.
    Unregistered {
        provided: &'static str,
        required_by: Option<&'static str>,
    },
    /// A type was registered twice. Wiring bug.
    DuplicateRegistration(&'static str),
    /// Resolution revisited a type still under construction. Wiring bug.
    DependencyCycle(Vec<&'static str>),
    /// A collaborator factory failed; `source` is its original error.
    Factory {
        provided: &'static str,
        source: FactoryError,
    },
    /// Cached instance had an unexpected concrete type.
    TypeMismatch(&'static str),
}

impl ProvisionError {
    /// Whether this error reports broken wiring rather than a runtime
    /// collaborator failure.
    pub fn is_configuration_error(&self) -> bool {
        !matches!(self, Self::Factory { .. })
    }
}

impl Display for ProvisionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unregistered {
                provided,
                required_by: Some(dependent),
            } => write!(
                f,
                "no provider registered for `{provided}` (required by `{dependent}`)"
            ),
            Self::Unregistered {
                provided,
                required_by: None,
            } => write!(f, "no provider registered for `{provided}`"),
            Self::DuplicateRegistration(provided) => {
                write!(f, "provider already registered for `{provided}`")
            }
            Self::DependencyCycle(path) => {
                write!(f, "dependency cycle: {}", path.join(" -> "))
            }
            Self::Factory { provided, source } => {
                write!(f, "failed to construct `{provided}`: {source}")
            }
            Self::TypeMismatch(provided) => {
                write!(f, "cached instance for `{provided}` has an unexpected type")
            }
        }
    }
}

impl Error for ProvisionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Factory { source, .. } => Some(&**source),
            _ => None,
        }
    }
}

struct Registration {
    key: TypeKey,
    dependencies: Vec<TypeKey>,
    factory: Option<ErasedFactory>,
    cell: OnceCell<Instance>,
    invocations: AtomicUsize,
    resolving: AtomicBool,
}

impl Registration {
    fn new(key: TypeKey, dependencies: Vec<TypeKey>, factory: ErasedFactory) -> Self {
        Self {
            key,
            dependencies,
            factory: Some(factory),
            cell: OnceCell::new(),
            invocations: AtomicUsize::new(0),
            resolving: AtomicBool::new(false),
        }
    }

    fn prebuilt(key: TypeKey, instance: Instance) -> Self {
        Self {
            key,
            dependencies: Vec::new(),
            factory: None,
            cell: OnceCell::with_value(instance),
            invocations: AtomicUsize::new(0),
            resolving: AtomicBool::new(false),
        }
    }

    fn state(&self) -> ProvisionState {
        if self.cell.get().is_some() {
            ProvisionState::Resolved
        } else if self.resolving.load(Ordering::Acquire) {
            ProvisionState::Resolving
        } else {
            ProvisionState::Unresolved
        }
    }
}

/// Registry of provided types and their cached singletons.
///
/// Register everything first (`&mut self`), then share the graph (usually
/// behind an `Arc`) and resolve from any thread (`&self`).
#[derive(Default)]
pub struct ProvisioningGraph {
    registrations: HashMap<TypeId, Registration>,
}

impl ProvisioningGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds an already constructed value as the instance of `T`.
    pub fn register_instance<T>(&mut self, value: T) -> ProvisionResult<()>
    where
        T: Send + Sync + 'static,
    {
        let key = TypeKey::of::<T>();
        self.insert(Registration::prebuilt(key, Arc::new(value)))
    }

    /// Registers a factory for `T` without dependencies.
    pub fn register_root<T, E, F>(&mut self, factory: F) -> ProvisionResult<()>
    where
        T: Send + Sync + 'static,
        E: Into<FactoryError>,
        F: Fn() -> Result<T, E> + Send + Sync + 'static,
    {
        let key = TypeKey::of::<T>();
        let erased: ErasedFactory = Box::new(
            move |_graph: &ProvisioningGraph,
                  _chain: &mut Vec<TypeKey>|
                  -> ProvisionResult<Instance> {
                let value = factory().map_err(|err| ProvisionError::Factory {
                    provided: key.name,
                    source: err.into(),
                })?;
                Ok(Arc::new(value) as Instance)
            },
        );
        self.insert(Registration::new(key, Vec::new(), erased))
    }

    /// Registers a factory for `T` that consumes the shared instance of `D`.
    ///
    /// Use `register2` when `T` needs two collaborators.
    pub fn register<T, D, E, F>(&mut self, factory: F) -> ProvisionResult<()>
    where
        T: Send + Sync + 'static,
        D: Send + Sync + 'static,
        E: Into<FactoryError>,
        F: Fn(Arc<D>) -> Result<T, E> + Send + Sync + 'static,
    {
        let key = TypeKey::of::<T>();
        let dependency_key = TypeKey::of::<D>();
        let erased: ErasedFactory = Box::new(
            move |graph: &ProvisioningGraph,
                  chain: &mut Vec<TypeKey>|
                  -> ProvisionResult<Instance> {
                let dependency = downcast::<D>(graph.resolve_key(dependency_key, chain)?)?;
                let value = factory(dependency).map_err(|err| ProvisionError::Factory {
                    provided: key.name,
                    source: err.into(),
                })?;
                Ok(Arc::new(value) as Instance)
            },
        );
        self.insert(Registration::new(key, vec![dependency_key], erased))
    }

    /// Registers a factory for `T` that consumes the shared instances of `D1`
    /// and `D2`, resolved in that order.
    pub fn register2<T, D1, D2, E, F>(&mut self, factory: F) -> ProvisionResult<()>
    where
        T: Send + Sync + 'static,
        D1: Send + Sync + 'static,
        D2: Send + Sync + 'static,
        E: Into<FactoryError>,
        F: Fn(Arc<D1>, Arc<D2>) -> Result<T, E> + Send + Sync + 'static,
    {
        let key = TypeKey::of::<T>();
        let first_key = TypeKey::of::<D1>();
        let second_key = TypeKey::of::<D2>();
        let erased: ErasedFactory = Box::new(
            move |graph: &ProvisioningGraph,
                  chain: &mut Vec<TypeKey>|
                  -> ProvisionResult<Instance> {
                let first = downcast::<D1>(graph.resolve_key(first_key, chain)?)?;
                let second = downcast::<D2>(graph.resolve_key(second_key, chain)?)?;
                let value = factory(first, second).map_err(|err| ProvisionError::Factory {
                    provided: key.name,
                    source: err.into(),
                })?;
                Ok(Arc::new(value) as Instance)
            },
        );
        self.insert(Registration::new(key, vec![first_key, second_key], erased))
    }

    /// Returns the shared instance of `T`, constructing it on first use.
    ///
    /// # Errors
    /// - `Unregistered` / `DependencyCycle` for wiring bugs.
    /// - `Factory` when `T` or one of its dependencies failed to construct.
    pub fn resolve<T>(&self) -> ProvisionResult<Arc<T>>
    where
        T: Send + Sync + 'static,
    {
        let mut chain = Vec::new();
        let instance = self.resolve_key(TypeKey::of::<T>(), &mut chain)?;
        downcast::<T>(instance)
    }

    pub fn is_registered<T: 'static>(&self) -> bool {
        self.registrations.contains_key(&TypeId::of::<T>())
    }

    /// Current construction state of `T`; `None` when not registered.
    pub fn state<T: 'static>(&self) -> Option<ProvisionState> {
        self.registrations
            .get(&TypeId::of::<T>())
            .map(Registration::state)
    }

    /// How many times the factory of `T` has run, failed attempts included.
    pub fn construction_count<T: 'static>(&self) -> usize {
        self.registrations
            .get(&TypeId::of::<T>())
            .map_or(0, |registration| registration.invocations.load(Ordering::Acquire))
    }

    /// Names of all provided types, sorted.
    pub fn provided_types(&self) -> Vec<&'static str> {
        let mut names = self
            .registrations
            .values()
            .map(|registration| registration.key.name)
            .collect::<Vec<_>>();
        names.sort_unstable();
        names
    }

    /// Checks declared dependencies without constructing anything.
    ///
    /// # Errors
    /// - `Unregistered` naming the missing type and its dependent.
    /// - `DependencyCycle` naming the cycle path.
    pub fn validate(&self) -> ProvisionResult<()> {
        let mut finished = HashSet::new();
        let mut roots = self.registrations.values().collect::<Vec<_>>();
        roots.sort_unstable_by_key(|registration| registration.key.name);

        for registration in roots {
            let mut path = Vec::new();
            self.visit(registration, &mut path, &mut finished)?;
        }
        Ok(())
    }

    fn visit(
        &self,
        registration: &Registration,
        path: &mut Vec<TypeKey>,
        finished: &mut HashSet<TypeKey>,
    ) -> ProvisionResult<()> {
        if finished.contains(&registration.key) {
            return Ok(());
        }
        if path.contains(&registration.key) {
            return Err(cycle_error(path, registration.key));
        }

        path.push(registration.key);
        for dependency in &registration.dependencies {
            let next = self.registrations.get(&dependency.id).ok_or(
                ProvisionError::Unregistered {
                    provided: dependency.name,
                    required_by: Some(registration.key.name),
                },
            )?;
            self.visit(next, path, finished)?;
        }
        path.pop();
        finished.insert(registration.key);
        Ok(())
    }

    fn insert(&mut self, registration: Registration) -> ProvisionResult<()> {
        let key = registration.key;
        if self.registrations.contains_key(&key.id) {
            return Err(ProvisionError::DuplicateRegistration(key.name));
        }
        trace!(
            "event=provision_register module=di status=ok type={} dependencies={}",
            key.name,
            registration.dependencies.len()
        );
        self.registrations.insert(key.id, registration);
        Ok(())
    }

    fn resolve_key(&self, key: TypeKey, chain: &mut Vec<TypeKey>) -> ProvisionResult<Instance> {
        let registration =
            self.registrations
                .get(&key.id)
                .ok_or_else(|| ProvisionError::Unregistered {
                    provided: key.name,
                    required_by: chain.last().map(TypeKey::name),
                })?;

        if let Some(instance) = registration.cell.get() {
            return Ok(Arc::clone(instance));
        }
        if chain.contains(&key) {
            return Err(cycle_error(chain, key));
        }
        let Some(factory) = registration.factory.as_ref() else {
            return Err(ProvisionError::Unregistered {
                provided: key.name,
                required_by: chain.last().map(TypeKey::name),
            });
        };

        chain.push(key);
        let outcome = registration.cell.get_or_try_init(|| {
            let started_at = Instant::now();
            let _resolving = ResolvingGuard::enter(&registration.resolving);
            registration.invocations.fetch_add(1, Ordering::AcqRel);
            let constructed = factory(self, chain);

            match &constructed {
                Ok(_) => info!(
                    "event=provision_resolve module=di status=ok type={} duration_ms={}",
                    key.name,
                    started_at.elapsed().as_millis()
                ),
                Err(err) => error!(
                    "event=provision_resolve module=di status=error type={} duration_ms={} error={}",
                    key.name,
                    started_at.elapsed().as_millis(),
                    err
                ),
            }
            constructed
        });
        chain.pop();

        outcome.map(Arc::clone)
    }
}

/// Marks a registration as under construction until dropped, including
/// when the factory unwinds.
struct ResolvingGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> ResolvingGuard<'a> {
    fn enter(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::Release);
        Self { flag }
    }
}

impl Drop for ResolvingGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

impl Debug for ProvisioningGraph {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProvisioningGraph")
            .field("provided_types", &self.provided_types())
            .finish()
    }
}

fn downcast<T: Send + Sync + 'static>(instance: Instance) -> ProvisionResult<Arc<T>> {
    instance
        .downcast::<T>()
        .map_err(|_| ProvisionError::TypeMismatch(std::any::type_name::<T>()))
}

fn cycle_error(chain: &[TypeKey], repeated: TypeKey) -> ProvisionError {
    let start = chain
        .iter()
        .position(|key| *key == repeated)
        .unwrap_or(0);
    let mut path = chain[start..].iter().map(TypeKey::name).collect::<Vec<_>>();
    path.push(repeated.name);
    ProvisionError::DependencyCycle(path)
}
