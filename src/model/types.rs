//! Data model of an already-resolved binding graph.
//!
//! These types are the serde target for graph descriptions handed over by
//! the graph-construction front end, and the values every validator reads.
//! They are immutable once the graph is built.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::key::{Key, Scope, TypeName};
use crate::error::ValidationError;

// =============================================================================
// COMPONENT PATHS
// =============================================================================

/// Root-to-node sequence of component types. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "Vec<TypeName>", into = "Vec<TypeName>")]
pub struct ComponentPath(Vec<TypeName>);

impl ComponentPath {
    pub fn root(component: TypeName) -> Self {
        ComponentPath(vec![component])
    }

    pub fn new(components: Vec<TypeName>) -> Result<Self, ValidationError> {
        if components.is_empty() {
            return Err(ValidationError::EmptyComponentPath);
        }
        Ok(ComponentPath(components))
    }

    pub fn components(&self) -> &[TypeName] {
        &self.0
    }

    pub fn current_component(&self) -> &TypeName {
        self.0.last().expect("component paths are never empty")
    }

    pub fn root_component(&self) -> &TypeName {
        &self.0[0]
    }

    pub fn at_root(&self) -> bool {
        self.0.len() == 1
    }

    pub fn depth(&self) -> usize {
        self.0.len()
    }

    pub fn parent(&self) -> Result<ComponentPath, ValidationError> {
        if self.at_root() {
            return Err(ValidationError::RootHasNoParent);
        }
        Ok(ComponentPath(self.0[..self.0.len() - 1].to_vec()))
    }

    pub fn child(&self, component: TypeName) -> ComponentPath {
        let mut components = self.0.clone();
        components.push(component);
        ComponentPath(components)
    }

    /// True if `self` is a strict prefix of `other`.
    pub fn is_ancestor_of(&self, other: &ComponentPath) -> bool {
        self.0.len() < other.0.len() && other.0.starts_with(&self.0)
    }

    /// Strict ancestors, nearest first.
    pub fn ancestors(&self) -> impl Iterator<Item = ComponentPath> + '_ {
        (1..self.0.len())
            .rev()
            .map(|len| ComponentPath(self.0[..len].to_vec()))
    }
}

impl TryFrom<Vec<TypeName>> for ComponentPath {
    type Error = ValidationError;

    fn try_from(value: Vec<TypeName>) -> Result<Self, Self::Error> {
        ComponentPath::new(value)
    }
}

impl From<ComponentPath> for Vec<TypeName> {
    fn from(value: ComponentPath) -> Self {
        value.0
    }
}

impl fmt::Display for ComponentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, component) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, " → ")?;
            }
            write!(f, "{component}")?;
        }
        Ok(())
    }
}

// =============================================================================
// SOURCE ELEMENTS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ElementKind {
    #[default]
    Method,
    Constructor,
    Type,
    Field,
    Parameter,
}

/// Source-level identity of a declaration: a module method, a constructor, a type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceElement {
    #[serde(default)]
    pub kind: ElementKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enclosing_type: Option<TypeName>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<TypeName>,
}

impl SourceElement {
    pub fn method(enclosing: TypeName, name: impl Into<String>, parameters: Vec<TypeName>) -> Self {
        SourceElement {
            kind: ElementKind::Method,
            enclosing_type: Some(enclosing),
            name: name.into(),
            parameters,
        }
    }

    pub fn constructor(enclosing: TypeName, parameters: Vec<TypeName>) -> Self {
        SourceElement {
            kind: ElementKind::Constructor,
            name: enclosing.simple_name().to_string(),
            enclosing_type: Some(enclosing),
            parameters,
        }
    }

    /// Whether this element is declared in `outer` or a type nested inside it.
    pub fn is_enclosed_by(&self, outer: &TypeName) -> bool {
        let Some(enclosing) = &self.enclosing_type else {
            return false;
        };
        let outer = outer.raw_name();
        let enclosing = enclosing.raw_name();
        enclosing == outer
            || enclosing
                .strip_prefix(outer)
                .is_some_and(|rest| rest.starts_with('.') || rest.starts_with('$'))
    }
}

impl fmt::Display for SourceElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.kind, &self.enclosing_type) {
            (ElementKind::Constructor, Some(enclosing)) => {
                write!(f, "{enclosing}")?;
                write_parameters(f, &self.parameters)
            }
            (ElementKind::Method, Some(enclosing)) => {
                write!(f, "{enclosing}.{}", self.name)?;
                write_parameters(f, &self.parameters)
            }
            (ElementKind::Method, None) => {
                write!(f, "{}", self.name)?;
                write_parameters(f, &self.parameters)
            }
            (_, Some(enclosing)) => write!(f, "{enclosing}.{}", self.name),
            (_, None) => write!(f, "{}", self.name),
        }
    }
}

fn write_parameters(f: &mut fmt::Formatter<'_>, parameters: &[TypeName]) -> fmt::Result {
    write!(f, "(")?;
    for (i, p) in parameters.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{p}")?;
    }
    write!(f, ")")
}

// =============================================================================
// BINDINGS
// =============================================================================

/// How a binding produces its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BindingKind {
    Injection,
    AssistedInjection,
    AssistedFactory,
    Provision,
    Production,
    Delegate,
    MultiboundMap,
    MultiboundSet,
    Optional,
    Component,
    ComponentProvision,
    ComponentProduction,
    ComponentDependency,
    BoundInstance,
    SubcomponentCreator,
    MembersInjector,
    MembersInjection,
}

impl BindingKind {
    pub fn is_multibinding(self) -> bool {
        matches!(self, BindingKind::MultiboundMap | BindingKind::MultiboundSet)
    }

    pub fn is_production(self) -> bool {
        matches!(
            self,
            BindingKind::Production | BindingKind::ComponentProduction
        )
    }
}

/// Whether a binding is a unique binding or a contribution to a multibinding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContributionType {
    #[default]
    Unique,
    IntoSet,
    ElementsIntoSet,
    IntoMap,
}

impl ContributionType {
    fn annotation(self) -> Option<&'static str> {
        match self {
            ContributionType::Unique => None,
            ContributionType::IntoSet => Some("@IntoSet"),
            ContributionType::ElementsIntoSet => Some("@ElementsIntoSet"),
            ContributionType::IntoMap => Some("@IntoMap"),
        }
    }
}

/// The key under which a contribution is entered into a map multibinding.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapKey {
    /// The `@MapKey`-annotated annotation type, e.g. `dagger.multibindings.StringKey`.
    pub annotation_type: TypeName,
    /// Source form of the annotation value, e.g. `"a"`.
    pub value: String,
}

impl fmt::Display for MapKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}({})", self.annotation_type.simple_name(), self.value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestKind {
    #[default]
    Instance,
    Provider,
    Lazy,
    ProviderOfLazy,
    MembersInjection,
    Producer,
    Produced,
    Future,
}

/// One dependency of a binding or a component entry point.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyRequest {
    pub key: Key,
    #[serde(default)]
    pub kind: RequestKind,
    /// Whether the requesting site accepts `null`.
    #[serde(default)]
    pub nullable_allowed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element: Option<SourceElement>,
}

impl DependencyRequest {
    pub fn instance(key: Key) -> Self {
        DependencyRequest {
            key,
            kind: RequestKind::Instance,
            nullable_allowed: false,
            element: None,
        }
    }

    pub fn of_kind(key: Key, kind: RequestKind) -> Self {
        DependencyRequest {
            kind,
            ..DependencyRequest::instance(key)
        }
    }
}

/// A recipe for producing a value of a key, owned by one component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Binding {
    pub key: Key,
    pub kind: BindingKind,
    pub component_path: ComponentPath,
    #[serde(default)]
    pub contribution_type: ContributionType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<Scope>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub binding_element: Option<SourceElement>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contributing_module: Option<TypeName>,
    #[serde(default)]
    pub nullable: bool,
    #[serde(default)]
    pub requires_module_instance: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map_key: Option<MapKey>,
    #[serde(default)]
    pub dependencies: Vec<DependencyRequest>,
}

impl Binding {
    pub fn new(key: Key, kind: BindingKind, component_path: ComponentPath) -> Self {
        Binding {
            key,
            kind,
            component_path,
            contribution_type: ContributionType::Unique,
            scope: None,
            binding_element: None,
            contributing_module: None,
            nullable: false,
            requires_module_instance: false,
            map_key: None,
            dependencies: Vec::new(),
        }
    }

    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = Some(scope);
        self
    }

    pub fn with_element(mut self, element: SourceElement) -> Self {
        self.binding_element = Some(element);
        self
    }

    pub fn with_module(mut self, module: TypeName) -> Self {
        self.contributing_module = Some(module);
        self
    }

    pub fn with_contribution(mut self, contribution_type: ContributionType) -> Self {
        self.contribution_type = contribution_type;
        self
    }

    pub fn with_map_key(mut self, map_key: MapKey) -> Self {
        self.contribution_type = ContributionType::IntoMap;
        self.map_key = Some(map_key);
        self
    }

    pub fn with_dependency(mut self, request: DependencyRequest) -> Self {
        self.dependencies.push(request);
        self
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn requiring_module_instance(mut self) -> Self {
        self.requires_module_instance = true;
        self
    }

    fn declaring_annotation(&self) -> Option<&'static str> {
        match self.kind {
            BindingKind::Injection | BindingKind::AssistedInjection => Some("@Inject"),
            BindingKind::AssistedFactory => Some("@AssistedFactory"),
            BindingKind::Provision => Some("@Provides"),
            BindingKind::Production => Some("@Produces"),
            BindingKind::Delegate => Some("@Binds"),
            BindingKind::MultiboundMap | BindingKind::MultiboundSet => Some("@Multibinds"),
            BindingKind::Optional => Some("@BindsOptionalOf"),
            BindingKind::BoundInstance => Some("@BindsInstance"),
            BindingKind::Component
            | BindingKind::ComponentProvision
            | BindingKind::ComponentProduction
            | BindingKind::ComponentDependency
            | BindingKind::SubcomponentCreator
            | BindingKind::MembersInjector
            | BindingKind::MembersInjection => None,
        }
    }
}

/// Formats the binding's declaration, e.g. `@Provides @IntoMap @StringKey("a") M.provide1()`.
impl fmt::Display for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(element) = &self.binding_element else {
            return match self.kind {
                BindingKind::MultiboundSet => write!(f, "{} (multibound set)", self.key),
                BindingKind::MultiboundMap => write!(f, "{} (multibound map)", self.key),
                _ => write!(f, "{}", self.key),
            };
        };
        if let Some(annotation) = self.declaring_annotation() {
            write!(f, "{annotation} ")?;
        }
        if let Some(annotation) = self.contribution_type.annotation() {
            write!(f, "{annotation} ")?;
        }
        if let Some(map_key) = &self.map_key {
            write!(f, "{map_key} ")?;
        }
        if let Some(qualifier) = &self.key.qualifier {
            write!(f, "{qualifier} ")?;
        }
        write!(f, "{element}")
    }
}

/// A key requested from a component that has no visible binding.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MissingBinding {
    pub component_path: ComponentPath,
    pub key: Key,
}

// =============================================================================
// COMPONENTS
// =============================================================================

fn default_true() -> bool {
    true
}

/// One component or subcomponent in the tree, or a synthetic node for a
/// module when a module is validated on its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentNode {
    pub component_path: ComponentPath,
    #[serde(default)]
    pub scopes: Vec<Scope>,
    #[serde(default = "default_true")]
    pub real_component: bool,
    #[serde(default)]
    pub subcomponent: bool,
    /// Every module type installed by the component's descriptor.
    #[serde(default)]
    pub modules: Vec<TypeName>,
    /// Requests made directly on the component interface.
    #[serde(default)]
    pub entry_points: Vec<DependencyRequest>,
    /// The method on the parent component that creates this child.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub factory_method: Option<SourceElement>,
}

impl ComponentNode {
    pub fn new(component_path: ComponentPath) -> Self {
        let subcomponent = !component_path.at_root();
        ComponentNode {
            component_path,
            scopes: Vec::new(),
            real_component: true,
            subcomponent,
            modules: Vec::new(),
            entry_points: Vec::new(),
            factory_method: None,
        }
    }

    /// A synthetic node standing in for a module validated on its own.
    pub fn module(module: TypeName) -> Self {
        ComponentNode {
            real_component: false,
            ..ComponentNode::new(ComponentPath::root(module))
        }
    }

    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scopes.push(scope);
        self
    }

    pub fn with_module(mut self, module: TypeName) -> Self {
        self.modules.push(module);
        self
    }

    pub fn with_entry_point(mut self, request: DependencyRequest) -> Self {
        self.entry_points.push(request);
        self
    }

    pub fn with_factory_method(mut self, method: SourceElement) -> Self {
        self.factory_method = Some(method);
        self
    }

    pub fn is_real_component(&self) -> bool {
        self.real_component
    }

    pub fn is_subcomponent(&self) -> bool {
        self.subcomponent
    }
}

// =============================================================================
// TYPE MODEL
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TypeKind {
    #[default]
    Class,
    AbstractClass,
    Interface,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Visibility {
    #[default]
    Public,
    Protected,
    PackagePrivate,
    Private,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Nesting {
    #[default]
    TopLevel,
    StaticNested,
    Inner,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConstructorDescriptor {
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub inject: bool,
    #[serde(default)]
    pub parameters: Vec<TypeName>,
    #[serde(default)]
    pub thrown_checked: Vec<TypeName>,
    #[serde(default)]
    pub qualifiers: Vec<String>,
}

/// What the front end knows about a class or interface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeDescriptor {
    pub name: TypeName,
    #[serde(default)]
    pub kind: TypeKind,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub nesting: Nesting,
    #[serde(default)]
    pub scopes: Vec<Scope>,
    /// Declared constructors. Empty means only the implicit default constructor.
    #[serde(default)]
    pub constructors: Vec<ConstructorDescriptor>,
}

impl TypeDescriptor {
    pub fn class(name: TypeName) -> Self {
        TypeDescriptor {
            name,
            kind: TypeKind::Class,
            visibility: Visibility::Public,
            nesting: Nesting::TopLevel,
            scopes: Vec::new(),
            constructors: Vec::new(),
        }
    }

    pub fn with_constructor(mut self, constructor: ConstructorDescriptor) -> Self {
        self.constructors.push(constructor);
        self
    }

    pub fn inject_constructors(&self) -> impl Iterator<Item = &ConstructorDescriptor> {
        self.constructors.iter().filter(|c| c.inject)
    }

    /// Whether a component can create an instance itself, i.e. the type is a
    /// concrete, non-inner, non-private class with a visible no-arg constructor.
    pub fn component_can_make_new_instances(&self) -> bool {
        if self.kind != TypeKind::Class
            || self.nesting == Nesting::Inner
            || self.visibility == Visibility::Private
        {
            return false;
        }
        self.constructors.is_empty()
            || self
                .constructors
                .iter()
                .any(|c| c.parameters.is_empty() && c.visibility != Visibility::Private)
    }
}

// =============================================================================
// GRAPH DESCRIPTION
// =============================================================================

/// Serialized form of a resolved binding graph.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphDescription {
    /// Every component in the tree. Exactly one must be at the root.
    pub components: Vec<ComponentNode>,
    #[serde(default)]
    pub bindings: Vec<Binding>,
    #[serde(default)]
    pub types: Vec<TypeDescriptor>,
    /// Whether the graph includes every binding, not just reachable ones.
    #[serde(default)]
    pub full_binding_graph: bool,
}
