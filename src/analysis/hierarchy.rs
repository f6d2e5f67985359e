use std::iter::successors;

use tracing::trace;

use crate::analysis::inheritance::InheritanceGraph;
use crate::ast::ty::Ty;
use crate::intern::{Symbol, WellKnown};

/// Answers subtyping queries over a validated inheritance graph.
pub struct ClassHierarchy<'a> {
    graph: &'a InheritanceGraph,
    object: Symbol,
}

impl<'a> ClassHierarchy<'a> {
    /// Creates an oracle for `graph`.
    ///
    /// The graph must be acyclic: `ancestors` would not terminate otherwise.
    pub fn new(graph: &'a InheritanceGraph, well_known: &WellKnown) -> Self {
        Self {
            graph,
            object: well_known.object,
        }
    }

    pub fn graph(&self) -> &'a InheritanceGraph {
        self.graph
    }

    pub fn object(&self) -> Symbol {
        self.object
    }

    /// Returns `true` if `class` is the root or has a validated parent.
    pub fn contains(&self, class: Symbol) -> bool {
        class == self.object || self.graph.has_edge(class)
    }

    /// Returns an iterator over `class` and its ancestors, ending with the root class.
    pub fn ancestors(&self, class: Symbol) -> impl Iterator<Item = Symbol> + 'a {
        let graph = self.graph;

        successors(Some(class), move |&class| graph.parent(class))
    }

    pub fn is_subclass(&self, class: Symbol, ancestor: Symbol) -> bool {
        self.ancestors(class).any(|name| name == ancestor)
    }

    /// Checks whether `ty` conforms to `expected` in the class `current_class`.
    ///
    /// Only `SELF_TYPE` conforms to `SELF_TYPE`.
    pub fn conforms(&self, ty: Ty, expected: Ty, current_class: Symbol) -> bool {
        match (ty, expected) {
            (Ty::SelfType, Ty::SelfType) => true,
            (_, Ty::SelfType) => false,
            (ty, Ty::Class(expected)) => self.is_subclass(ty.reify_self_ty(current_class), expected),
        }
    }

    /// Computes the least common ancestor of two types, substituting `SELF_TYPE` with `current_class`.
    pub fn join(&self, lhs: Ty, rhs: Ty, current_class: Symbol) -> Symbol {
        let lhs = lhs.reify_self_ty(current_class);
        let rhs = rhs.reify_self_ty(current_class);

        if lhs == rhs {
            return lhs;
        }

        let lhs_chain: Vec<_> = self.ancestors(lhs).collect();
        let rhs_chain: Vec<_> = self.ancestors(rhs).collect();

        let join = lhs_chain
            .into_iter()
            .rev()
            .zip(rhs_chain.into_iter().rev())
            .take_while(|(l, r)| l == r)
            .last()
            .map(|(class, _)| class)
            .unwrap_or(self.object);

        trace!(?lhs, ?rhs, ?join, "computed a join");

        join
    }

    /// Folds [`join`](Self::join) over `tys`. Returns `None` if `tys` is empty.
    pub fn join_all(&self, tys: impl IntoIterator<Item = Ty>, current_class: Symbol) -> Option<Symbol> {
        tys.into_iter()
            .map(|ty| ty.reify_self_ty(current_class))
            .reduce(|lhs, rhs| self.join(lhs.into(), rhs.into(), current_class))
    }
}
