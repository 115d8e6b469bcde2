use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Canonical identity of a requested binding. Totally ordered so that
/// every iteration that reaches an output can be made deterministic.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TypeKey(String);

impl TypeKey {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TypeKey {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl From<String> for TypeKey {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// How a binding satisfies its key: its own materialization, or a pure
/// redirection to another key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BindingKind {
    Concrete,
    Alias { target: TypeKey },
}

impl BindingKind {
    pub fn alias_target(&self) -> Option<&TypeKey> {
        match self {
            BindingKind::Alias { target } => Some(target),
            BindingKind::Concrete => None,
        }
    }
}

/// Deferred producer of a binding's initialization expression. Owned and
/// invoked by the code generator; the engine only carries it through
/// partitioning untouched.
pub type Materializer = Arc<dyn Fn() -> String + Send + Sync>;

/// Name of the generated storage field holding a binding's value.
/// Opaque to the engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldHandle(String);

impl FieldHandle {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

/// Name of a generated initializer method. Opaque to the engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InitializerHandle(String);

impl InitializerHandle {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

/// Name of a materialized shard unit (the generated class or struct).
/// Opaque to the engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UnitHandle(String);

impl UnitHandle {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

/// A binding node destined for a generated storage property: its key and
/// kind, plus the generator-owned field, and optionally the deferred
/// materialization callback.
#[derive(Clone)]
pub struct PropertyBinding {
    pub key: TypeKey,
    pub kind: BindingKind,
    pub field: FieldHandle,
    pub materializer: Option<Materializer>,
}

impl fmt::Debug for PropertyBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyBinding")
            .field("key", &self.key)
            .field("kind", &self.kind)
            .field("field", &self.field)
            .field("materializer", &self.materializer.as_ref().map(|_| "Some(fn)"))
            .finish()
    }
}

impl PropertyBinding {
    pub fn concrete(key: impl Into<TypeKey>) -> Self {
        let key = key.into();
        let field = FieldHandle::new(format!("{}Provider", key.as_str()));
        Self {
            key,
            kind: BindingKind::Concrete,
            field,
            materializer: None,
        }
    }

    pub fn alias(key: impl Into<TypeKey>, target: impl Into<TypeKey>) -> Self {
        let key = key.into();
        let field = FieldHandle::new(format!("{}Provider", key.as_str()));
        Self {
            key,
            kind: BindingKind::Alias {
                target: target.into(),
            },
            field,
            materializer: None,
        }
    }

    pub fn with_field(mut self, field: FieldHandle) -> Self {
        self.field = field;
        self
    }

    pub fn with_materializer(mut self, materializer: Materializer) -> Self {
        self.materializer = Some(materializer);
        self
    }

    pub fn is_alias(&self) -> bool {
        matches!(self.kind, BindingKind::Alias { .. })
    }
}

/// Strongly connected component of the binding graph: keys mutually
/// reachable through dependency edges. Never split across shards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Component {
    pub id: usize,
    /// Member keys in canonical order.
    pub keys: Vec<TypeKey>,
}

impl Component {
    pub fn new(id: usize, mut keys: Vec<TypeKey>) -> Self {
        keys.sort();
        Self { id, keys }
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Bindings assigned to one shard, in the order the partitioner
/// constructed them.
#[derive(Debug, Clone, Default)]
pub struct ShardGroup {
    pub bindings: Vec<PropertyBinding>,
}

impl ShardGroup {
    pub fn new(bindings: Vec<PropertyBinding>) -> Self {
        Self { bindings }
    }

    pub fn keys(&self) -> impl Iterator<Item = &TypeKey> {
        self.bindings.iter().map(|b| &b.key)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

/// A shard group paired with its position in the partition and the
/// generator-owned identities of its materialized unit.
#[derive(Debug, Clone)]
pub struct ShardInfo {
    pub index: usize,
    pub group: ShardGroup,
    pub unit: UnitHandle,
    pub initializer: InitializerHandle,
}

impl ShardInfo {
    pub fn new(index: usize, group: ShardGroup) -> Self {
        Self {
            index,
            group,
            unit: UnitHandle::new(format!("Shard{}", index + 1)),
            initializer: InitializerHandle::new(format!("initShard{}", index + 1)),
        }
    }
}
