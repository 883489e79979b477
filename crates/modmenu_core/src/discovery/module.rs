//! Declarative entry-point tables exposed by loaded extension modules.
//!
//! # Responsibility
//! - Describe each module's types, their methods, visibility and markers.
//! - Enumerate modules from a host-provided source or the link-time table.
//!
//! # Invariants
//! - Markers are matched by name, so extensions never depend on a shared
//!   marker type.
//! - A type or module that cannot be described reports an error instead of
//!   partial data.

use crate::discovery::DiscoveryError;
use crate::extension::record::RenderFn;
use crate::render::dispatcher::panic_message;
use std::any::{type_name, Any};
use std::collections::BTreeMap;
use std::fmt::{Debug, Formatter};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

/// Instance produced by a type's default constructor.
pub type Instance = Arc<dyn Any + Send + Sync>;

type Constructor = Arc<dyn Fn() -> Result<Instance, String> + Send + Sync>;
type InstanceCall = Arc<dyn Fn(&Instance) + Send + Sync>;

/// Method accessibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Public,
    NonPublic,
}

/// Declarative marker attached to a method, e.g. `ModMenuEntryAttribute`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker {
    type_name: String,
    fields: BTreeMap<String, String>,
}

impl Marker {
    /// Marker named `type_name` with no payload fields.
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Adds one payload field, e.g. `MenuName`.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Marker type name as declared, possibly namespace-qualified.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Payload field value, if present.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}

/// How a method is invoked.
#[derive(Clone)]
pub enum MethodBinding {
    Static(RenderFn),
    Instance {
        receiver: &'static str,
        accepts: fn(&Instance) -> bool,
        call: InstanceCall,
    },
}

/// One method of a scanned type.
#[derive(Clone)]
pub struct MethodInfo {
    name: String,
    visibility: Visibility,
    binding: MethodBinding,
    markers: Vec<Marker>,
}

impl MethodInfo {
    /// Static method: callable without an instance.
    pub fn new_static(
        name: impl Into<String>,
        visibility: Visibility,
        call: impl Fn() + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            visibility,
            binding: MethodBinding::Static(Arc::new(call)),
            markers: Vec::new(),
        }
    }

    /// Instance method on receiver type `T`.
    pub fn new_instance<T: Any + Send + Sync>(
        name: impl Into<String>,
        visibility: Visibility,
        call: impl Fn(&T) + Send + Sync + 'static,
    ) -> Self {
        let call: InstanceCall = Arc::new(move |instance: &Instance| {
            if let Some(receiver) = instance.downcast_ref::<T>() {
                call(receiver);
            }
        });
        Self {
            name: name.into(),
            visibility,
            binding: MethodBinding::Instance {
                receiver: type_name::<T>(),
                accepts: |instance| instance.is::<T>(),
                call,
            },
            markers: Vec::new(),
        }
    }

    /// Attaches a marker to the method.
    pub fn with_marker(mut self, marker: Marker) -> Self {
        self.markers.push(marker);
        self
    }

    /// Method name, compared against the convention names.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared accessibility.
    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    /// Whether the method is public.
    pub fn is_public(&self) -> bool {
        self.visibility == Visibility::Public
    }

    /// Whether the method needs no receiver.
    pub fn is_static(&self) -> bool {
        matches!(self.binding, MethodBinding::Static(_))
    }

    /// How the method is invoked.
    pub fn binding(&self) -> &MethodBinding {
        &self.binding
    }

    /// Markers in declaration order.
    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }
}

impl Debug for MethodInfo {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MethodInfo")
            .field("name", &self.name)
            .field("visibility", &self.visibility)
            .field("is_static", &self.is_static())
            .field("markers", &self.markers)
            .finish()
    }
}

/// One type declared by a module.
#[derive(Clone)]
pub struct TypeInfo {
    name: String,
    namespace: Option<String>,
    constructor: Option<Constructor>,
    methods: Vec<MethodInfo>,
    load_error: Option<String>,
}

impl TypeInfo {
    /// Resolvable type with no constructor and no methods.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: None,
            constructor: None,
            methods: Vec::new(),
            load_error: None,
        }
    }

    /// Type whose members cannot be resolved; scanning it fails.
    pub fn unresolved(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            load_error: Some(reason.into()),
            ..Self::new(name)
        }
    }

    /// Sets the namespace shown in full names.
    pub fn in_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Registers `T::default` as the default constructor.
    pub fn with_default<T: Default + Any + Send + Sync>(self) -> Self {
        self.with_constructor(|| Ok(T::default()))
    }

    /// Registers a fallible default constructor.
    pub fn with_constructor<T, F>(mut self, construct: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn() -> Result<T, String> + Send + Sync + 'static,
    {
        self.constructor = Some(Arc::new(move || {
            construct().map(|value| Arc::new(value) as Instance)
        }));
        self
    }

    /// Declares one method on the type.
    pub fn with_method(mut self, method: MethodInfo) -> Self {
        self.methods.push(method);
        self
    }

    /// Simple name, e.g. `ExampleModMenu`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Namespace-qualified name used in log lines.
    pub fn full_name(&self) -> String {
        match &self.namespace {
            Some(namespace) => format!("{namespace}.{}", self.name),
            None => self.name.clone(),
        }
    }

    /// Declared methods, or the load error of an unresolved type.
    pub fn methods(&self) -> Result<&[MethodInfo], DiscoveryError> {
        match &self.load_error {
            Some(reason) => Err(DiscoveryError::TypeLoad {
                type_name: self.full_name(),
                reason: reason.clone(),
            }),
            None => Ok(&self.methods),
        }
    }

    /// Builds a fresh instance through the default constructor.
    ///
    /// A panicking constructor is reported as a construction failure.
    pub fn construct(&self) -> Result<Instance, DiscoveryError> {
        let constructor =
            self.constructor
                .as_ref()
                .ok_or_else(|| DiscoveryError::MissingConstructor {
                    type_name: self.full_name(),
                })?;
        catch_unwind(AssertUnwindSafe(|| constructor()))
            .unwrap_or_else(|payload| {
                Err(format!("constructor panicked: {}", panic_message(payload.as_ref())))
            })
            .map_err(|reason| DiscoveryError::Construction {
                type_name: self.full_name(),
                reason,
            })
    }
}

impl Debug for TypeInfo {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeInfo")
            .field("name", &self.full_name())
            .field("has_constructor", &self.constructor.is_some())
            .field("methods", &self.methods)
            .field("load_error", &self.load_error)
            .finish()
    }
}

/// A loaded unit of extension code.
pub trait ExtensionModule: Send + Sync {
    /// Identifying name, compared against exclusion prefixes.
    fn name(&self) -> &str;
    /// Types declared by the module.
    fn types(&self) -> Result<Vec<TypeInfo>, DiscoveryError>;
}

/// Enumerates every module reachable from the running process.
pub trait ModuleSource: Send + Sync {
    fn modules(&self) -> Vec<Arc<dyn ExtensionModule>>;
}

/// Module built from an in-memory type table.
#[derive(Debug, Clone)]
pub struct StaticModule {
    name: String,
    types: Vec<TypeInfo>,
}

impl StaticModule {
    /// Module `name` declaring `types`.
    pub fn new(name: impl Into<String>, types: Vec<TypeInfo>) -> Self {
        Self {
            name: name.into(),
            types,
        }
    }
}

impl ExtensionModule for StaticModule {
    fn name(&self) -> &str {
        &self.name
    }

    fn types(&self) -> Result<Vec<TypeInfo>, DiscoveryError> {
        Ok(self.types.clone())
    }
}

/// Fixed list of modules supplied by the host.
#[derive(Default, Clone)]
pub struct ModuleList {
    modules: Vec<Arc<dyn ExtensionModule>>,
}

impl ModuleList {
    /// Empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a module; modules are scanned in insertion order.
    pub fn with_module(mut self, module: impl ExtensionModule + 'static) -> Self {
        self.modules.push(Arc::new(module));
        self
    }
}

impl ModuleSource for ModuleList {
    fn modules(&self) -> Vec<Arc<dyn ExtensionModule>> {
        self.modules.clone()
    }
}

/// Link-time module table entry.
///
/// Extensions compiled into the host binary submit one of these with
/// `inventory::submit!`; [`LinkedModules`] enumerates them.
pub struct ModuleDescriptor {
    pub name: &'static str,
    /// Builds the module's type table on demand.
    pub types: fn() -> Vec<TypeInfo>,
}

inventory::collect!(ModuleDescriptor);

struct LinkedModule(&'static ModuleDescriptor);

impl ExtensionModule for LinkedModule {
    fn name(&self) -> &str {
        self.0.name
    }

    fn types(&self) -> Result<Vec<TypeInfo>, DiscoveryError> {
        Ok((self.0.types)())
    }
}

/// Modules registered through `inventory::submit!`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LinkedModules;

impl ModuleSource for LinkedModules {
    fn modules(&self) -> Vec<Arc<dyn ExtensionModule>> {
        let mut modules: Vec<Arc<dyn ExtensionModule>> = Vec::new();
        for descriptor in inventory::iter::<ModuleDescriptor> {
            modules.push(Arc::new(LinkedModule(descriptor)));
        }
        modules
    }
}
