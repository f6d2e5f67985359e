use std::collections::HashMap;

use indexmap::IndexMap;
use itertools::Itertools;
use tracing::{debug, trace};

use crate::analysis::error::{
    IllegalSelfTypePosition, InvalidOverride, MultipleDefinitionKind, OverrideMismatch,
    TypeckError,
};
use crate::analysis::hierarchy::ClassHierarchy;
use crate::ast::ty::Ty;
use crate::ast::{Attribute, Class, Method, TyName};
use crate::errors::Diagnostics;
use crate::intern::{Symbol, SymbolTables};
use crate::position::HasSpan;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodSig {
    pub params: Vec<Ty>,
    pub ret: Ty,
    /// The class that provides the definition.
    pub defined_in: Symbol,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeSig {
    pub ty: Ty,
    pub defined_in: Symbol,
}

/// The methods and attributes available in a class, including the inherited ones.
#[derive(Debug, Clone, Default)]
pub struct ClassIndex {
    parent: Option<Symbol>,
    methods: IndexMap<Symbol, MethodSig>,
    attributes: IndexMap<Symbol, AttributeSig>,
}

impl ClassIndex {
    fn inheriting(parent: Symbol, parent_index: Option<&ClassIndex>) -> Self {
        let mut result = parent_index.cloned().unwrap_or_default();
        result.parent = Some(parent);

        result
    }

    pub fn parent(&self) -> Option<Symbol> {
        self.parent
    }

    pub fn method(&self, name: Symbol) -> Option<&MethodSig> {
        self.methods.get(&name)
    }

    pub fn attribute(&self, name: Symbol) -> Option<&AttributeSig> {
        self.attributes.get(&name)
    }

    pub fn methods(&self) -> impl Iterator<Item = (Symbol, &MethodSig)> {
        self.methods.iter().map(|(&name, sig)| (name, sig))
    }

    pub fn attributes(&self) -> impl Iterator<Item = (Symbol, &AttributeSig)> {
        self.attributes.iter().map(|(&name, sig)| (name, sig))
    }
}

/// The program-wide method and attribute tables.
///
/// Built once before any expression is checked and read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct TypeCtx {
    classes: IndexMap<Symbol, ClassIndex>,
    self_type: Option<Symbol>,
}

impl TypeCtx {
    pub fn get_class(&self, name: Symbol) -> Option<&ClassIndex> {
        self.classes.get(&name)
    }

    pub fn contains(&self, name: Symbol) -> bool {
        self.classes.contains_key(&name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Symbol, &ClassIndex)> {
        self.classes.iter().map(|(&name, index)| (name, index))
    }

    pub fn method(&self, class: Symbol, name: Symbol) -> Option<&MethodSig> {
        self.get_class(class)?.method(name)
    }

    pub fn attribute(&self, class: Symbol, name: Symbol) -> Option<&AttributeSig> {
        self.get_class(class)?.attribute(name)
    }

    /// Resolves a type name to a declared class or `SELF_TYPE`.
    pub fn resolve_ty_name(&self, ty_name: &TyName) -> Option<Ty> {
        let sym = ty_name.sym();

        if Some(sym) == self.self_type {
            Some(Ty::SelfType)
        } else if self.contains(sym) {
            Some(Ty::Class(sym))
        } else {
            None
        }
    }

    /// Builds the tables for every class accepted by the inheritance validation.
    ///
    /// Reports undeclared types in signatures, repeated definitions, and invalid overrides.
    pub fn build(
        diagnostics: &mut Diagnostics<'_>,
        tables: &SymbolTables,
        hierarchy: &ClassHierarchy<'_>,
        classes: &[Class],
    ) -> TypeCtx {
        let mut builder = CtxBuilder {
            diagnostics,
            tables,
            hierarchy,
            ctx: TypeCtx {
                classes: IndexMap::new(),
                self_type: Some(tables.well_known().self_type),
            },
        };

        // parents must be processed before their children
        let sorted = classes
            .iter()
            .filter(|class| hierarchy.contains(class.name.sym()))
            .sorted_by_key(|class| hierarchy.ancestors(class.name.sym()).count());

        for class in sorted {
            builder.add_class(class);
        }

        debug!(classes = builder.ctx.classes.len(), "built the type context");

        builder.ctx
    }
}

struct CtxBuilder<'a, 'emt> {
    diagnostics: &'a mut Diagnostics<'emt>,
    tables: &'a SymbolTables,
    hierarchy: &'a ClassHierarchy<'a>,
    ctx: TypeCtx,
}

impl CtxBuilder<'_, '_> {
    fn report(&mut self, error: TypeckError) {
        self.diagnostics.error().with_span_and_error(error).emit();
    }

    fn name(&self, sym: Symbol) -> String {
        self.tables.name(sym).to_owned()
    }

    fn add_class(&mut self, class: &Class) {
        let name = class.name.sym();

        if self.ctx.contains(name) {
            return;
        }

        trace!(class = self.tables.name(name), "indexing a class");

        let mut index = match self.hierarchy.graph().parent(name) {
            Some(parent) => ClassIndex::inheriting(parent, self.ctx.get_class(parent)),
            None => ClassIndex::default(),
        };

        let is_builtin = class.file == self.tables.well_known().basic_file;

        for attr in class.attributes() {
            self.add_attribute(&mut index, name, attr, is_builtin);
        }

        for method in class.methods() {
            self.add_method(&mut index, name, method);
        }

        self.ctx.classes.insert(name, index);
    }

    fn resolve_ty_name(&mut self, ty_name: &TyName) -> Ty {
        let sym = ty_name.sym();

        if sym == self.tables.well_known().self_type {
            Ty::SelfType
        } else if self.hierarchy.contains(sym) {
            Ty::Class(sym)
        } else {
            self.report(TypeckError::UndeclaredType {
                ty_name: self.name(sym),
                span: ty_name.span(),
            });

            Ty::Class(self.hierarchy.object())
        }
    }

    fn add_attribute(&mut self, index: &mut ClassIndex, class: Symbol, attr: &Attribute, is_builtin: bool) {
        let binding = &attr.0;
        let name = binding.name.sym();

        let ty = if is_builtin && binding.ty_name.sym() == self.tables.well_known().prim_slot {
            Ty::Class(binding.ty_name.sym())
        } else {
            self.resolve_ty_name(&binding.ty_name)
        };

        if name == self.tables.well_known().self_ {
            self.report(TypeckError::IllegalSelf {
                span: binding.name.span(),
            });

            return;
        }

        if let Some(prev) = index.attributes.get(&name) {
            self.report(TypeckError::MultipleDefinition {
                kind: MultipleDefinitionKind::Attribute {
                    inherited: prev.defined_in != class,
                },
                name: self.name(name),
                span: binding.name.span(),
            });

            return;
        }

        index.attributes.insert(
            name,
            AttributeSig {
                ty,
                defined_in: class,
            },
        );
    }

    fn add_method(&mut self, index: &mut ClassIndex, class: Symbol, method: &Method) {
        let name = method.name.sym();

        let params = method
            .params
            .iter()
            .map(|formal| match self.resolve_ty_name(&formal.ty_name) {
                Ty::SelfType => {
                    self.report(TypeckError::IllegalSelfType {
                        position: IllegalSelfTypePosition::Parameter,
                        span: formal.ty_name.span(),
                    });

                    Ty::Class(self.hierarchy.object())
                }

                ty => ty,
            })
            .collect::<Vec<_>>();
        let ret = self.resolve_ty_name(&method.return_ty);

        let sig = MethodSig {
            params,
            ret,
            defined_in: class,
        };

        match index.methods.get(&name) {
            Some(prev) if prev.defined_in == class => {
                self.report(TypeckError::MultipleDefinition {
                    kind: MultipleDefinitionKind::Method,
                    name: self.name(name),
                    span: method.name.span(),
                });

                return;
            }

            Some(prev) => {
                if let Some(mismatch) = override_mismatch(prev, &sig) {
                    let ancestor = self.name(prev.defined_in);

                    self.report(TypeckError::InvalidOverride(Box::new(InvalidOverride {
                        span: method.name.span(),
                        method: self.name(name),
                        ancestor,
                        mismatch,
                    })));
                }
            }

            None => {}
        }

        index.methods.insert(name, sig);
    }
}

fn override_mismatch(inherited: &MethodSig, sig: &MethodSig) -> Option<OverrideMismatch> {
    if inherited.params.len() != sig.params.len() {
        return Some(OverrideMismatch::ParamCount {
            expected: inherited.params.len(),
            actual: sig.params.len(),
        });
    }

    if let Some(index) = inherited
        .params
        .iter()
        .zip(&sig.params)
        .position(|(lhs, rhs)| lhs != rhs)
    {
        return Some(OverrideMismatch::ParamTy { index });
    }

    (inherited.ret != sig.ret).then_some(OverrideMismatch::ReturnTy)
}

#[derive(Debug, Clone, Default)]
pub struct BindingMap {
    scopes: Vec<BindingScope>,
}

impl BindingMap {
    pub fn new() -> Self {
        Self {
            scopes: vec![BindingScope::new()],
        }
    }

    pub fn with_scope<F, R>(&mut self, f: F) -> R
    where
        F: FnOnce(&mut Self) -> R,
    {
        self.push_scope();
        let result = f(self);
        self.pop_scope();

        result
    }

    pub(super) fn push_scope(&mut self) {
        self.scopes.push(BindingScope::new());
    }

    pub(super) fn pop_scope(&mut self) {
        assert!(self.scopes.len() > 1, "the outermost scope cannot be popped");
        self.scopes.pop();
    }

    pub fn resolve(&self, name: Symbol) -> Option<Ty> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(name))
    }

    /// Binds `name` in the innermost scope, returning the type it previously had there.
    pub fn bind(&mut self, name: Symbol, ty: Ty) -> Option<Ty> {
        self.innermost_mut().bind(name, ty)
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    pub fn innermost(&self) -> &BindingScope {
        self.scopes.last().unwrap()
    }

    pub fn innermost_mut(&mut self) -> &mut BindingScope {
        self.scopes.last_mut().unwrap()
    }
}

#[derive(Debug, Clone, Default)]
pub struct BindingScope {
    local_bindings: HashMap<Symbol, Ty>,
}

impl BindingScope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: Symbol) -> Option<Ty> {
        self.local_bindings.get(&name).copied()
    }

    pub fn bind(&mut self, name: Symbol, ty: Ty) -> Option<Ty> {
        self.local_bindings.insert(name, ty)
    }
}
