//! Configuration schema registry.
//!
//! An immutable tree of field descriptors describing the full configuration
//! structure: dotted path, value kind, access tag, default value. The tree
//! is assembled once at startup (normally by generated code from the schema
//! compiler, in tests by hand) and never mutated afterwards.
//!
//! Also hosts the write [`AccessPolicy`]: a comma-separated pattern list
//! evaluated against full dotted paths. The policy installed at the top
//! level applies to every write, no matter how deep the targeted sub-path.

use core::fmt;

use crate::value::ConfigValue;

// ── Access tags ───────────────────────────────────────────────

/// Per-node access tag. A read-only object gates its entire subtree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    ReadWrite,
    ReadOnly,
}

// ── Node descriptors ──────────────────────────────────────────

/// Scalar value kinds a leaf field can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    Bool,
    Int,
    Float,
    Str,
}

/// What a schema node describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Scalar(ScalarKind),
    /// Sub-object; children carry the fields.
    Object,
    /// Homogeneous list of scalars. Replaced whole on write.
    Array(ScalarKind),
}

/// One field or sub-object descriptor in the configuration tree.
///
/// Paths are assigned by [`SchemaNode::root`] when the tree is sealed;
/// until then nodes float free with empty paths.
#[derive(Debug, Clone)]
pub struct SchemaNode {
    name: String,
    path: String,
    kind: NodeKind,
    access: Access,
    default: Option<ConfigValue>,
    children: Vec<SchemaNode>,
}

/// Schema construction failures. All are programming errors in the schema
/// source, surfaced at build time rather than panicking at lookup time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// Two siblings share a name, which would alias a dotted path.
    DuplicatePath(String),
    /// A node name is empty or contains a path separator.
    BadName(String),
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicatePath(p) => write!(f, "duplicate schema path '{p}'"),
            Self::BadName(n) => write!(f, "bad schema node name '{n}'"),
        }
    }
}

impl SchemaNode {
    // ── Builders ──────────────────────────────────────────────

    pub fn bool(name: &str, access: Access, default: bool) -> Self {
        Self::leaf(name, NodeKind::Scalar(ScalarKind::Bool), access, ConfigValue::Bool(default))
    }

    pub fn int(name: &str, access: Access, default: i64) -> Self {
        Self::leaf(name, NodeKind::Scalar(ScalarKind::Int), access, ConfigValue::Int(default))
    }

    pub fn float(name: &str, access: Access, default: f64) -> Self {
        Self::leaf(name, NodeKind::Scalar(ScalarKind::Float), access, ConfigValue::Float(default))
    }

    pub fn string(name: &str, access: Access, default: &str) -> Self {
        Self::leaf(
            name,
            NodeKind::Scalar(ScalarKind::Str),
            access,
            ConfigValue::Str(default.to_string()),
        )
    }

    /// Homogeneous scalar list, empty by default.
    pub fn array(name: &str, access: Access, elem: ScalarKind) -> Self {
        Self::leaf(name, NodeKind::Array(elem), access, ConfigValue::Array(Vec::new()))
    }

    pub fn object(name: &str, access: Access, children: Vec<SchemaNode>) -> Self {
        Self {
            name: name.to_string(),
            path: String::new(),
            kind: NodeKind::Object,
            access,
            default: None,
            children,
        }
    }

    /// Seal a tree: assign dotted paths and validate name uniqueness.
    pub fn root(children: Vec<SchemaNode>) -> Result<Self, SchemaError> {
        Self::root_with_access(Access::ReadWrite, children)
    }

    /// Seal a tree with an explicit access tag on the root node. A
    /// read-only root makes the whole configuration immutable over RPC.
    pub fn root_with_access(access: Access, children: Vec<SchemaNode>) -> Result<Self, SchemaError> {
        let mut root = Self {
            name: String::new(),
            path: String::new(),
            kind: NodeKind::Object,
            access,
            default: None,
            children,
        };
        assign_paths(&mut root, "")?;
        Ok(root)
    }

    fn leaf(name: &str, kind: NodeKind, access: Access, default: ConfigValue) -> Self {
        Self {
            name: name.to_string(),
            path: String::new(),
            kind,
            access,
            default: Some(default),
            children: Vec::new(),
        }
    }

    // ── Accessors ─────────────────────────────────────────────

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Full dotted path from the root. Empty for the root itself.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn access(&self) -> Access {
        self.access
    }

    pub fn default_value(&self) -> Option<&ConfigValue> {
        self.default.as_ref()
    }

    pub fn children(&self) -> &[SchemaNode] {
        &self.children
    }

    /// Direct child by name, exact case-sensitive match.
    pub fn child(&self, name: &str) -> Option<&SchemaNode> {
        self.children.iter().find(|c| c.name == name)
    }
}

fn assign_paths(node: &mut SchemaNode, prefix: &str) -> Result<(), SchemaError> {
    node.path = prefix.to_string();
    for i in 0..node.children.len() {
        let name = node.children[i].name.clone();
        if name.is_empty() || name.contains('.') {
            return Err(SchemaError::BadName(name));
        }
        let path = if prefix.is_empty() {
            name.clone()
        } else {
            format!("{prefix}.{name}")
        };
        if node.children[..i].iter().any(|c| c.name == name) {
            return Err(SchemaError::DuplicatePath(path));
        }
        assign_paths(&mut node.children[i], &path)?;
    }
    Ok(())
}

// ── Lookup ────────────────────────────────────────────────────

/// Exact dotted-path lookup, case-sensitive, child order preserved.
pub fn find_by_path<'a>(root: &'a SchemaNode, key: &str) -> Option<&'a SchemaNode> {
    let mut node = root;
    for seg in key.split('.') {
        node = node.child(seg)?;
    }
    Some(node)
}

/// Resolve an optional command key: absent selects the whole tree,
/// present keys must match exactly or the command fails upstream.
pub fn resolve<'a>(root: &'a SchemaNode, key: Option<&str>) -> Option<&'a SchemaNode> {
    match key {
        None => Some(root),
        Some(k) => find_by_path(root, k),
    }
}

// ── Write access policy ───────────────────────────────────────

/// Pattern-list write ACL evaluated against full dotted paths.
///
/// Comma-separated glob patterns (`*` any run, `?` one char); a leading
/// `!` or `-` denies. Patterns are tried in order and the first match
/// decides; a path matching no pattern is denied. The default policy is
/// `"*"` (everything writable).
#[derive(Debug, Clone)]
pub struct AccessPolicy {
    patterns: Vec<(bool, String)>,
}

impl AccessPolicy {
    pub fn parse(spec: &str) -> Self {
        let patterns = spec
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(|p| match p.strip_prefix(['!', '-']) {
                Some(rest) => (true, rest.to_string()),
                None => (false, p.to_string()),
            })
            .collect();
        Self { patterns }
    }

    pub fn allow_all() -> Self {
        Self::parse("*")
    }

    /// Whether a write to `path` is permitted under this policy.
    pub fn allows_write(&self, path: &str) -> bool {
        for (deny, pattern) in &self.patterns {
            if glob_match(pattern, path) {
                return !deny;
            }
        }
        false
    }
}

impl Default for AccessPolicy {
    fn default() -> Self {
        Self::allow_all()
    }
}

/// Minimal glob over ASCII paths: `*` matches any run, `?` one byte.
fn glob_match(pattern: &str, text: &str) -> bool {
    let pat = pattern.as_bytes();
    let txt = text.as_bytes();
    let (mut pi, mut ti) = (0usize, 0usize);
    let mut star = usize::MAX;
    let mut mark = 0usize;
    while ti < txt.len() {
        if pi < pat.len() && (pat[pi] == b'?' || pat[pi] == txt[ti]) {
            pi += 1;
            ti += 1;
        } else if pi < pat.len() && pat[pi] == b'*' {
            star = pi;
            mark = ti;
            pi += 1;
        } else if star != usize::MAX {
            pi = star + 1;
            mark += 1;
            ti = mark;
        } else {
            return false;
        }
    }
    while pi < pat.len() && pat[pi] == b'*' {
        pi += 1;
    }
    pi == pat.len()
}
