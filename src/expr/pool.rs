//! Arena of expression nodes.

use std::collections::BTreeSet;
use std::fmt;

use slotmap::{new_key_type, SlotMap};

use crate::error::{Result, SfgError};

new_key_type! {
    /// Generational handle to a node inside an [`ExprPool`].
    pub struct ExprId;
}

/// Payload of an expression node.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Floating point constant
    Literal(f64),
    /// Named symbol
    Variable(String),
    /// Symbolic infinity (`oo`)
    Infinity,
    /// Unary minus
    Negate(ExprId),
    /// Binary sum
    Add(ExprId, ExprId),
    /// Binary product
    Mul(ExprId, ExprId),
    /// Base raised to an exponent
    Pow(ExprId, ExprId),
}

impl NodeKind {
    /// Child handles in left-to-right order.
    pub fn children(&self) -> [Option<ExprId>; 2] {
        match *self {
            NodeKind::Literal(_) | NodeKind::Variable(_) | NodeKind::Infinity => [None, None],
            NodeKind::Negate(x) => [Some(x), None],
            NodeKind::Add(l, r) | NodeKind::Mul(l, r) | NodeKind::Pow(l, r) => [Some(l), Some(r)],
        }
    }

    /// Returns the literal value if this is a literal node.
    pub fn as_literal(&self) -> Option<f64> {
        match *self {
            NodeKind::Literal(v) => Some(v),
            _ => None,
        }
    }
}

/// A node stored in the pool.
#[derive(Debug, Clone)]
pub struct ExprNode {
    /// What the node computes
    pub kind: NodeKind,
    /// Parent node, `None` for roots and orphaned nodes
    pub parent: Option<ExprId>,
}

/// Flat, index-addressed node used to export an expression tree.
///
/// Children always precede their parent, so the root is the last element.
#[derive(Debug, Clone, PartialEq)]
pub enum FlatNode {
    Literal(f64),
    Variable(String),
    Infinity,
    Negate(usize),
    Add(usize, usize),
    Mul(usize, usize),
    Pow(usize, usize),
}

/// Pool-independent encoding of one expression tree.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatExpr {
    /// Index of the root inside `nodes`
    pub root: usize,
    /// Nodes in post-order
    pub nodes: Vec<FlatNode>,
}

/// Arena owning the nodes of one or more expression trees.
///
/// Rewrites leave unreachable nodes behind; [`ExprPool::gc`] removes them.
/// Handles stay valid until the node they point to is collected, and a
/// collected handle is detected rather than silently aliased.
#[derive(Debug, Clone, Default)]
pub struct ExprPool {
    nodes: SlotMap<ExprId, ExprNode>,
}

impl ExprPool {
    /// Create an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of nodes, including unreachable ones.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if the pool has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Drop every node.
    pub fn clear(&mut self) {
        self.nodes.clear();
    }

    /// Check whether a handle still refers to a live node.
    pub fn contains(&self, id: ExprId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Get a node.
    pub fn node(&self, id: ExprId) -> &ExprNode {
        &self.nodes[id]
    }

    /// Get a node's payload.
    pub fn kind(&self, id: ExprId) -> &NodeKind {
        &self.nodes[id].kind
    }

    /// Get a node's parent.
    pub fn parent(&self, id: ExprId) -> Option<ExprId> {
        self.nodes[id].parent
    }

    /// Literal value of a node, if it is one.
    pub fn literal_value(&self, id: ExprId) -> Option<f64> {
        self.nodes[id].kind.as_literal()
    }

    /// Insert a node and adopt its children.
    pub fn insert(&mut self, kind: NodeKind) -> ExprId {
        let children = kind.children();
        let id = self.nodes.insert(ExprNode { kind, parent: None });
        for child in children.into_iter().flatten() {
            self.nodes[child].parent = Some(id);
        }
        id
    }

    pub fn literal(&mut self, value: f64) -> ExprId {
        self.insert(NodeKind::Literal(value))
    }

    pub fn variable(&mut self, name: impl Into<String>) -> ExprId {
        self.insert(NodeKind::Variable(name.into()))
    }

    pub fn infinity(&mut self) -> ExprId {
        self.insert(NodeKind::Infinity)
    }

    pub fn neg(&mut self, x: ExprId) -> ExprId {
        self.insert(NodeKind::Negate(x))
    }

    pub fn add(&mut self, left: ExprId, right: ExprId) -> ExprId {
        self.insert(NodeKind::Add(left, right))
    }

    pub fn mul(&mut self, left: ExprId, right: ExprId) -> ExprId {
        self.insert(NodeKind::Mul(left, right))
    }

    pub fn pow(&mut self, base: ExprId, exponent: ExprId) -> ExprId {
        self.insert(NodeKind::Pow(base, exponent))
    }

    /// `left - right`, stored as `left + -right`.
    pub fn sub(&mut self, left: ExprId, right: ExprId) -> ExprId {
        let negated = self.neg(right);
        self.add(left, negated)
    }

    /// `left / right`, stored as `left * right^-1`.
    pub fn div(&mut self, left: ExprId, right: ExprId) -> ExprId {
        let minus_one = self.literal(-1.0);
        let reciprocal = self.pow(right, minus_one);
        self.mul(left, reciprocal)
    }

    /// Overwrite a node in place, keeping its handle and parent link.
    ///
    /// The previous children are orphaned unless `kind` refers to them again.
    pub fn set_kind(&mut self, id: ExprId, kind: NodeKind) {
        let children = kind.children();
        self.nodes[id].kind = kind;
        for child in children.into_iter().flatten() {
            self.nodes[child].parent = Some(id);
        }
    }

    pub fn set_literal(&mut self, id: ExprId, value: f64) {
        self.set_kind(id, NodeKind::Literal(value));
    }

    /// Move `source` into the slot of `target`.
    ///
    /// `target` keeps its handle and parent; `source` is removed from the
    /// pool. Used to collapse an operator into one of its operands.
    pub fn replace(&mut self, target: ExprId, source: ExprId) {
        if target == source {
            return;
        }
        let kind = self.nodes[source].kind.clone();
        self.set_kind(target, kind);
        self.nodes.remove(source);
    }

    /// Deep copy of a subtree within this pool.
    pub fn dup(&mut self, id: ExprId) -> ExprId {
        let kind = self.nodes[id].kind.clone();
        let copied = match kind {
            NodeKind::Negate(x) => {
                let x = self.dup(x);
                NodeKind::Negate(x)
            }
            NodeKind::Add(l, r) => {
                let (l, r) = (self.dup(l), self.dup(r));
                NodeKind::Add(l, r)
            }
            NodeKind::Mul(l, r) => {
                let (l, r) = (self.dup(l), self.dup(r));
                NodeKind::Mul(l, r)
            }
            NodeKind::Pow(l, r) => {
                let (l, r) = (self.dup(l), self.dup(r));
                NodeKind::Pow(l, r)
            }
            leaf => leaf,
        };
        self.insert(copied)
    }

    /// Deep copy of a subtree from another pool into this one.
    pub fn dup_from(&mut self, other: &ExprPool, id: ExprId) -> ExprId {
        let copied = match other.kind(id) {
            NodeKind::Literal(v) => NodeKind::Literal(*v),
            NodeKind::Variable(name) => NodeKind::Variable(name.clone()),
            NodeKind::Infinity => NodeKind::Infinity,
            NodeKind::Negate(x) => NodeKind::Negate(self.dup_from(other, *x)),
            NodeKind::Add(l, r) => {
                let (l, r) = (self.dup_from(other, *l), self.dup_from(other, *r));
                NodeKind::Add(l, r)
            }
            NodeKind::Mul(l, r) => {
                let (l, r) = (self.dup_from(other, *l), self.dup_from(other, *r));
                NodeKind::Mul(l, r)
            }
            NodeKind::Pow(l, r) => {
                let (l, r) = (self.dup_from(other, *l), self.dup_from(other, *r));
                NodeKind::Pow(l, r)
            }
        };
        self.insert(copied)
    }

    /// Structural equality of two subtrees, possibly in different pools.
    pub fn equal(&self, a: ExprId, other: &ExprPool, b: ExprId) -> bool {
        match (self.kind(a), other.kind(b)) {
            (NodeKind::Literal(x), NodeKind::Literal(y)) => x == y,
            (NodeKind::Variable(x), NodeKind::Variable(y)) => x == y,
            (NodeKind::Infinity, NodeKind::Infinity) => true,
            (NodeKind::Negate(x), NodeKind::Negate(y)) => self.equal(*x, other, *y),
            (NodeKind::Add(l1, r1), NodeKind::Add(l2, r2))
            | (NodeKind::Mul(l1, r1), NodeKind::Mul(l2, r2))
            | (NodeKind::Pow(l1, r1), NodeKind::Pow(l2, r2)) => {
                self.equal(*l1, other, *l2) && self.equal(*r1, other, *r2)
            }
            _ => false,
        }
    }

    /// Structural equality of two subtrees of this pool.
    pub fn same(&self, a: ExprId, b: ExprId) -> bool {
        self.equal(a, self, b)
    }

    /// Check whether a variable occurs anywhere below `id`.
    pub fn contains_variable(&self, id: ExprId, name: &str) -> bool {
        match self.kind(id) {
            NodeKind::Variable(v) => v == name,
            kind => kind
                .children()
                .into_iter()
                .flatten()
                .any(|child| self.contains_variable(child, name)),
        }
    }

    /// Names of all variables below `id`, sorted.
    pub fn variables(&self, id: ExprId) -> BTreeSet<String> {
        let mut names = BTreeSet::new();
        self.collect_variables(id, &mut names);
        names
    }

    fn collect_variables(&self, id: ExprId, names: &mut BTreeSet<String>) {
        match self.kind(id) {
            NodeKind::Variable(v) => {
                names.insert(v.clone());
            }
            kind => {
                for child in kind.children().into_iter().flatten() {
                    self.collect_variables(child, names);
                }
            }
        }
    }

    /// All handles reachable from `root`, in pre-order.
    pub fn subtree(&self, root: ExprId) -> Vec<ExprId> {
        let mut order = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            order.push(id);
            let [left, right] = self.kind(id).children();
            stack.extend(right);
            stack.extend(left);
        }
        order
    }

    /// Remove every node not reachable from `roots`.
    ///
    /// Returns the number of collected nodes. Must not be called while a
    /// caller still holds a handle into an unreachable subtree.
    pub fn gc(&mut self, roots: &[ExprId]) -> usize {
        let mut live = BTreeSet::new();
        for &root in roots {
            live.extend(self.subtree(root));
        }
        let before = self.nodes.len();
        self.nodes.retain(|id, _| live.contains(&id));
        for &root in roots {
            self.nodes[root].parent = None;
        }
        before - self.nodes.len()
    }

    /// Export the tree below `root` as a flat node list.
    pub fn to_flat(&self, root: ExprId) -> FlatExpr {
        let mut nodes = Vec::new();
        let root = self.push_flat(root, &mut nodes);
        FlatExpr { root, nodes }
    }

    fn push_flat(&self, id: ExprId, nodes: &mut Vec<FlatNode>) -> usize {
        let flat = match self.kind(id) {
            NodeKind::Literal(v) => FlatNode::Literal(*v),
            NodeKind::Variable(name) => FlatNode::Variable(name.clone()),
            NodeKind::Infinity => FlatNode::Infinity,
            NodeKind::Negate(x) => FlatNode::Negate(self.push_flat(*x, nodes)),
            NodeKind::Add(l, r) => {
                let (l, r) = (self.push_flat(*l, nodes), self.push_flat(*r, nodes));
                FlatNode::Add(l, r)
            }
            NodeKind::Mul(l, r) => {
                let (l, r) = (self.push_flat(*l, nodes), self.push_flat(*r, nodes));
                FlatNode::Mul(l, r)
            }
            NodeKind::Pow(l, r) => {
                let (l, r) = (self.push_flat(*l, nodes), self.push_flat(*r, nodes));
                FlatNode::Pow(l, r)
            }
        };
        nodes.push(flat);
        nodes.len() - 1
    }

    /// Import a flat node list, returning the new root handle.
    ///
    /// Children must precede their parent and every node except the root
    /// must be referenced exactly once.
    pub fn import_flat(&mut self, flat: &FlatExpr) -> Result<ExprId> {
        if flat.root >= flat.nodes.len() {
            return Err(SfgError::malformed(format!(
                "root index {} out of range ({} nodes)",
                flat.root,
                flat.nodes.len()
            )));
        }

        let mut ids: Vec<Option<ExprId>> = Vec::with_capacity(flat.nodes.len());
        let take = |ids: &mut Vec<Option<ExprId>>, at: usize, child: usize| -> Result<ExprId> {
            if child >= at {
                return Err(SfgError::malformed(format!(
                    "node {} refers forward to node {}",
                    at, child
                )));
            }
            ids[child]
                .take()
                .ok_or_else(|| SfgError::malformed(format!("node {} is shared", child)))
        };

        let mut created = Vec::new();
        for (at, node) in flat.nodes.iter().enumerate() {
            let kind = match node {
                FlatNode::Literal(v) => Ok(NodeKind::Literal(*v)),
                FlatNode::Variable(name) => Ok(NodeKind::Variable(name.clone())),
                FlatNode::Infinity => Ok(NodeKind::Infinity),
                FlatNode::Negate(x) => take(&mut ids, at, *x).map(NodeKind::Negate),
                FlatNode::Add(l, r) => take(&mut ids, at, *l)
                    .and_then(|l| take(&mut ids, at, *r).map(|r| NodeKind::Add(l, r))),
                FlatNode::Mul(l, r) => take(&mut ids, at, *l)
                    .and_then(|l| take(&mut ids, at, *r).map(|r| NodeKind::Mul(l, r))),
                FlatNode::Pow(l, r) => take(&mut ids, at, *l)
                    .and_then(|l| take(&mut ids, at, *r).map(|r| NodeKind::Pow(l, r))),
            };
            match kind {
                Ok(kind) => {
                    let id = self.insert(kind);
                    created.push(id);
                    ids.push(Some(id));
                }
                Err(e) => {
                    for id in created {
                        self.nodes.remove(id);
                    }
                    return Err(e);
                }
            }
        }

        match ids[flat.root] {
            Some(root) => {
                self.gc_created(root, &created);
                Ok(root)
            }
            None => {
                for id in created {
                    self.nodes.remove(id);
                }
                Err(SfgError::malformed("root is referenced as a child"))
            }
        }
    }

    /// Drop nodes created by an import that ended up outside the root's tree.
    fn gc_created(&mut self, root: ExprId, created: &[ExprId]) {
        let live: BTreeSet<ExprId> = self.subtree(root).into_iter().collect();
        for id in created {
            if !live.contains(id) {
                self.nodes.remove(*id);
            }
        }
    }

    /// Displayable view of a subtree.
    pub fn display(&self, id: ExprId) -> DisplayExpr<'_> {
        DisplayExpr { pool: self, id }
    }
}

/// Binding strength used when printing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Precedence {
    Sum = 1,
    Product = 2,
    Unary = 3,
    Power = 4,
    Atom = 5,
}

/// Text rendering of an expression that parses back to the same tree.
pub struct DisplayExpr<'a> {
    pool: &'a ExprPool,
    id: ExprId,
}

impl DisplayExpr<'_> {
    fn precedence(&self, id: ExprId) -> Precedence {
        match self.pool.kind(id) {
            NodeKind::Literal(v) if v.is_sign_negative() => Precedence::Unary,
            NodeKind::Literal(_) | NodeKind::Variable(_) | NodeKind::Infinity => Precedence::Atom,
            NodeKind::Negate(_) => Precedence::Unary,
            NodeKind::Add(..) => Precedence::Sum,
            NodeKind::Mul(..) => Precedence::Product,
            NodeKind::Pow(..) => Precedence::Power,
        }
    }

    fn write_wrapped(&self, f: &mut fmt::Formatter<'_>, id: ExprId, wrap: bool) -> fmt::Result {
        if wrap {
            write!(f, "(")?;
            self.write(f, id)?;
            write!(f, ")")
        } else {
            self.write(f, id)
        }
    }

    fn write(&self, f: &mut fmt::Formatter<'_>, id: ExprId) -> fmt::Result {
        let pool = self.pool;
        match pool.kind(id) {
            NodeKind::Literal(v) if v.is_infinite() => {
                write!(f, "{}oo", if *v < 0.0 { "-" } else { "" })
            }
            NodeKind::Literal(v) => write!(f, "{}", v),
            NodeKind::Variable(name) => write!(f, "{}", name),
            NodeKind::Infinity => write!(f, "oo"),
            NodeKind::Negate(x) => {
                write!(f, "-")?;
                self.write_wrapped(f, *x, self.precedence(*x) < Precedence::Unary)
            }
            NodeKind::Add(l, r) => {
                self.write(f, *l)?;
                if let NodeKind::Negate(x) = pool.kind(*r) {
                    write!(f, " - ")?;
                    self.write_wrapped(f, *x, self.precedence(*x) <= Precedence::Sum)
                } else {
                    write!(f, " + ")?;
                    self.write_wrapped(f, *r, self.precedence(*r) <= Precedence::Sum)
                }
            }
            NodeKind::Mul(l, r) => {
                self.write_wrapped(f, *l, self.precedence(*l) < Precedence::Product)?;
                match pool.kind(*r) {
                    NodeKind::Pow(base, exp) if pool.literal_value(*exp) == Some(-1.0) => {
                        write!(f, " / ")?;
                        self.write_wrapped(f, *base, self.precedence(*base) <= Precedence::Product)
                    }
                    _ => {
                        write!(f, " * ")?;
                        self.write_wrapped(f, *r, self.precedence(*r) <= Precedence::Product)
                    }
                }
            }
            NodeKind::Pow(base, exp) => {
                self.write_wrapped(f, *base, self.precedence(*base) <= Precedence::Power)?;
                write!(f, "^")?;
                self.write_wrapped(f, *exp, self.precedence(*exp) < Precedence::Unary)
            }
        }
    }
}

impl fmt::Display for DisplayExpr<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write(f, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(pool: &mut ExprPool) -> ExprId {
        // (a + 2) * b^-1
        let a = pool.variable("a");
        let two = pool.literal(2.0);
        let sum = pool.add(a, two);
        let b = pool.variable("b");
        pool.div(sum, b)
    }

    #[test]
    fn test_insert_sets_parents() {
        let mut pool = ExprPool::new();
        let a = pool.variable("a");
        let b = pool.variable("b");
        let sum = pool.add(a, b);
        assert_eq!(pool.parent(a), Some(sum));
        assert_eq!(pool.parent(b), Some(sum));
        assert_eq!(pool.parent(sum), None);
    }

    #[test]
    fn test_dup_is_deep_and_equal() {
        let mut pool = ExprPool::new();
        let root = sample(&mut pool);
        let copy = pool.dup(root);
        assert_ne!(root, copy);
        assert!(pool.same(root, copy));
        let shared: BTreeSet<_> = pool.subtree(root).into_iter().collect();
        assert!(pool.subtree(copy).iter().all(|id| !shared.contains(id)));
    }

    #[test]
    fn test_dup_from_other_pool() {
        let mut source = ExprPool::new();
        let root = sample(&mut source);
        let mut target = ExprPool::new();
        let copy = target.dup_from(&source, root);
        assert!(target.equal(copy, &source, root));
        assert_eq!(target.len(), source.len());
    }

    #[test]
    fn test_replace_collapses_into_child() {
        let mut pool = ExprPool::new();
        let x = pool.variable("x");
        let one = pool.literal(1.0);
        let prod = pool.mul(one, x);
        let y = pool.variable("y");
        let root = pool.add(prod, y);

        pool.replace(prod, x);
        assert!(!pool.contains(x));
        assert_eq!(pool.kind(prod), &NodeKind::Variable("x".into()));
        assert_eq!(pool.parent(prod), Some(root));
        assert_eq!(pool.gc(&[root]), 1);
        assert_eq!(pool.display(root).to_string(), "x + y");
    }

    #[test]
    fn test_gc_invalidates_stale_handles() {
        let mut pool = ExprPool::new();
        let root = sample(&mut pool);
        let orphan = pool.variable("orphan");
        assert_eq!(pool.gc(&[root]), 1);
        assert!(!pool.contains(orphan));
        assert!(pool.contains(root));
    }

    #[test]
    fn test_display_minimal_parentheses() {
        let mut pool = ExprPool::new();
        let root = sample(&mut pool);
        assert_eq!(pool.display(root).to_string(), "(a + 2) / b");

        let a = pool.variable("a");
        let b = pool.variable("b");
        let c = pool.variable("c");
        let bc = pool.add(b, c);
        let diff = pool.sub(a, bc);
        assert_eq!(pool.display(diff).to_string(), "a - (b + c)");

        let x = pool.variable("x");
        let y = pool.variable("y");
        let z = pool.variable("z");
        let inner = pool.pow(x, y);
        let outer = pool.pow(inner, z);
        assert_eq!(pool.display(outer).to_string(), "(x^y)^z");

        let s = pool.variable("s");
        let m = pool.literal(-1.0);
        let inv = pool.pow(s, m);
        assert_eq!(pool.display(inv).to_string(), "s^-1");
    }

    #[test]
    fn test_flat_export_import() {
        let mut pool = ExprPool::new();
        let root = sample(&mut pool);
        let flat = pool.to_flat(root);
        assert_eq!(flat.root, flat.nodes.len() - 1);

        let mut other = ExprPool::new();
        let imported = other.import_flat(&flat).unwrap();
        assert!(other.equal(imported, &pool, root));
    }

    #[test]
    fn test_import_rejects_shared_nodes() {
        let flat = FlatExpr {
            root: 1,
            nodes: vec![FlatNode::Variable("a".into()), FlatNode::Add(0, 0)],
        };
        let mut pool = ExprPool::new();
        assert!(matches!(
            pool.import_flat(&flat),
            Err(SfgError::MalformedExpression { .. })
        ));
        assert!(pool.is_empty());
    }

    #[test]
    fn test_variables_sorted() {
        let mut pool = ExprPool::new();
        let root = sample(&mut pool);
        let names: Vec<_> = pool.variables(root).into_iter().collect();
        assert_eq!(names, vec!["a".to_string(), "b".to_string()]);
        assert!(pool.contains_variable(root, "b"));
        assert!(!pool.contains_variable(root, "s"));
    }
}
