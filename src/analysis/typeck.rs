use std::collections::HashSet;

use tracing::trace;

use crate::analysis::error::{
    IllegalSelfTypePosition, MismatchedTypes, MultipleDefinitionKind, TypeckError,
};
use crate::analysis::hierarchy::ClassHierarchy;
use crate::analysis::typectx::{BindingMap, TypeCtx};
use crate::ast::ty::{BuiltinClass, Ty, UnwrapTy};
use crate::ast::{self, AstRecurse, Class, Expr, Name, TyName, VisitorMut};
use crate::errors::Diagnostics;
use crate::intern::{Symbol, SymbolTables};
use crate::position::{HasSpan, Span};

/// Computes and checks the static types of every expression in a program.
///
/// Each expression node gets annotated with its type.
/// Violations are reported and replaced with `Object` so that checking can continue.
pub struct TypeChecker<'a, 'emt> {
    diagnostics: &'a mut Diagnostics<'emt>,
    tables: &'a SymbolTables,
    hierarchy: &'a ClassHierarchy<'a>,
    ctx: &'a TypeCtx,
    bindings: BindingMap,
    class_name: Symbol,
}

impl<'a, 'emt> TypeChecker<'a, 'emt> {
    pub fn new(
        diagnostics: &'a mut Diagnostics<'emt>,
        tables: &'a SymbolTables,
        hierarchy: &'a ClassHierarchy<'a>,
        ctx: &'a TypeCtx,
    ) -> Self {
        Self {
            diagnostics,
            tables,
            hierarchy,
            ctx,
            bindings: BindingMap::new(),
            class_name: hierarchy.object(),
        }
    }

    pub fn check(mut self, program: &mut ast::Program) {
        self.visit_program(program);
    }

    fn with_scope<F, R>(&mut self, f: F) -> R
    where
        F: FnOnce(&mut Self) -> R,
    {
        self.bindings.push_scope();
        let result = f(self);
        self.bindings.pop_scope();

        result
    }

    fn report(&mut self, error: TypeckError) {
        self.diagnostics.error().with_span_and_error(error).emit();
    }

    fn builtin_ty(&self, builtin: BuiltinClass) -> Ty {
        Ty::Class(builtin.sym(self.tables.well_known()))
    }

    fn object_ty(&self) -> Ty {
        Ty::Class(self.hierarchy.object())
    }

    fn ty_to_string(&self, ty: Ty) -> String {
        ty.display(self.tables).to_string()
    }

    fn is_self(&self, name: &Name) -> bool {
        name.sym() == self.tables.well_known().self_
    }

    /// Resolves a type name without reporting anything.
    ///
    /// Used for declarations whose types were reported while building the type context.
    fn declared_ty(&self, ty_name: &TyName) -> Ty {
        if ty_name.sym() == self.tables.well_known().prim_slot {
            return Ty::Class(ty_name.sym());
        }

        self.ctx
            .resolve_ty_name(ty_name)
            .unwrap_or_else(|| self.object_ty())
    }

    /// Resolves a type name, reporting it if it's undeclared or `SELF_TYPE` in a forbidden position.
    fn resolve_ty_name(
        &mut self,
        ty_name: &TyName,
        self_ty_position: Option<IllegalSelfTypePosition>,
    ) -> Ty {
        match (self.ctx.resolve_ty_name(ty_name), self_ty_position) {
            (Some(Ty::SelfType), Some(position)) => {
                self.report(TypeckError::IllegalSelfType {
                    position,
                    span: ty_name.span(),
                });

                self.object_ty()
            }

            (Some(ty), _) => ty,

            (None, _) => {
                self.report(TypeckError::UndeclaredType {
                    ty_name: self.tables.name(ty_name.sym()).to_owned(),
                    span: ty_name.span(),
                });

                self.object_ty()
            }
        }
    }

    /// Looks up an identifier in the enclosing scopes, then in the attributes of the current class.
    fn resolve_name(&self, name: &Name) -> Option<Ty> {
        self.bindings.resolve(name.sym()).or_else(|| {
            self.ctx
                .attribute(self.class_name, name.sym())
                .map(|attr| attr.ty)
        })
    }

    /// Reports an error if `name` is `self`, which cannot be bound or assigned to.
    fn check_not_self(&mut self, name: &Name) -> bool {
        if self.is_self(name) {
            self.report(TypeckError::IllegalSelf { span: name.span() });

            false
        } else {
            true
        }
    }

    fn check_conforms(&mut self, ty: Ty, span: Span, expected_ty: Ty) {
        if !self.hierarchy.conforms(ty, expected_ty, self.class_name) {
            self.report(TypeckError::MismatchedTypes(Box::new(MismatchedTypes {
                span,
                expected_ty: self.ty_to_string(expected_ty),
                actual_ty: self.ty_to_string(ty),
            })));
        }
    }

    fn check_expr_conforms(&mut self, expr: &Expr, expected_ty: Ty) {
        self.check_conforms(expr.unwrap_ty(), expr.span(), expected_ty);
    }

    fn is_primitive_ty(&self, ty: Ty) -> bool {
        [BuiltinClass::Int, BuiltinClass::String, BuiltinClass::Bool]
            .into_iter()
            .any(|builtin| ty.is_builtin(self.tables.well_known(), builtin))
    }

    fn check_equals(&mut self, lhs: &Expr, rhs: &Expr) {
        let lhs_ty = lhs.unwrap_ty();
        let rhs_ty = rhs.unwrap_ty();

        if !self.is_primitive_ty(lhs_ty) && !self.is_primitive_ty(rhs_ty) {
            return;
        }

        // at least one of the operands has a primitive type: ensure types match
        if lhs_ty != rhs_ty {
            let (span, expected_ty, actual_ty) = if self.is_primitive_ty(lhs_ty) {
                (rhs.span(), lhs_ty, rhs_ty)
            } else {
                (lhs.span(), rhs_ty, lhs_ty)
            };

            self.report(TypeckError::MismatchedTypes(Box::new(MismatchedTypes {
                span,
                expected_ty: self.ty_to_string(expected_ty),
                actual_ty: self.ty_to_string(actual_ty),
            })));
        }
    }

    fn bind_formal(&mut self, formal: &ast::Formal) {
        if !self.check_not_self(&formal.name) {
            return;
        }

        // reported while building the type context
        let ty = match self.declared_ty(&formal.ty_name) {
            Ty::SelfType => self.object_ty(),
            ty => ty,
        };

        if self.bindings.innermost().get(formal.name.sym()).is_some() {
            self.report(TypeckError::MultipleDefinition {
                kind: MultipleDefinitionKind::Parameter,
                name: self.tables.name(formal.name.sym()).to_owned(),
                span: formal.name.span(),
            });

            return;
        }

        self.bindings.bind(formal.name.sym(), ty);
    }

    /// Returns the static type of the receiver and the class to look the method up in.
    fn check_receiver(&mut self, recv: &mut ast::Receiver) -> (Ty, Option<Symbol>) {
        use ast::Receiver;

        recv.recurse_mut(self);

        match recv {
            Receiver::Implicit => (Ty::SelfType, Some(self.class_name)),

            Receiver::Dynamic(object) => {
                let ty = object.unwrap_ty();

                (ty, Some(ty.reify_self_ty(self.class_name)))
            }

            Receiver::Static { object, ty_name } => {
                let ty = object.unwrap_ty();

                let target = match self.ctx.resolve_ty_name(ty_name) {
                    Some(Ty::Class(target)) => {
                        self.check_expr_conforms(object, target.into());

                        Some(target)
                    }

                    Some(Ty::SelfType) => {
                        self.report(TypeckError::IllegalSelfType {
                            position: IllegalSelfTypePosition::StaticDispatch,
                            span: ty_name.span(),
                        });

                        None
                    }

                    None => {
                        self.report(TypeckError::UndeclaredType {
                            ty_name: self.tables.name(ty_name.sym()).to_owned(),
                            span: ty_name.span(),
                        });

                        None
                    }
                };

                (ty, target)
            }
        }
    }
}

impl VisitorMut for TypeChecker<'_, '_> {
    type Output = ();

    fn visit_program(&mut self, program: &mut ast::Program) {
        program.recurse_mut(self);
    }

    fn visit_class(&mut self, class: &mut Class) {
        let name = class.name.sym();

        if !self.ctx.contains(name) {
            return;
        }

        trace!(class = self.tables.name(name), "checking a class");
        self.class_name = name;

        self.with_scope(|this| {
            for feature in &mut class.features {
                this.visit_feature(feature);
            }
        });
    }

    fn visit_feature(&mut self, feature: &mut ast::Feature) {
        feature.recurse_mut(self);
    }

    fn visit_method(&mut self, method: &mut ast::Method) {
        let return_ty = self.declared_ty(&method.return_ty);

        self.with_scope(|this| {
            for param in &mut method.params {
                this.visit_formal(param);
            }

            this.with_scope(|this| {
                this.visit_expr(&mut method.body);
            });

            if !method.body.is_no_expr() {
                this.check_expr_conforms(&method.body, return_ty);
            }
        });
    }

    fn visit_attribute(&mut self, attr: &mut ast::Attribute) {
        let binding = &mut attr.0;
        let ty = self.declared_ty(&binding.ty_name);

        if let Some(init) = &mut binding.init {
            self.visit_expr(init);
            self.check_expr_conforms(init, ty);
        }
    }

    fn visit_expr(&mut self, expr: &mut Expr) {
        expr.recurse_mut(self);
    }

    fn visit_assignment(&mut self, expr: &mut ast::Assignment) {
        self.visit_expr(&mut expr.expr);
        let ty = expr.expr.unwrap_ty();

        if self.check_not_self(&expr.name) {
            match self.resolve_name(&expr.name) {
                Some(target_ty) => self.check_expr_conforms(&expr.expr, target_ty),

                None => self.report(TypeckError::UndeclaredIdentifier {
                    name: self.tables.name(expr.name.sym()).to_owned(),
                    span: expr.name.span(),
                }),
            }
        }

        expr.ty = Some(ty);
    }

    fn visit_call(&mut self, expr: &mut ast::Call) {
        let (recv_ty, class) = self.check_receiver(&mut expr.receiver);

        for arg in &mut expr.args {
            self.visit_expr(arg);
        }

        let ctx = self.ctx;
        let sig = class.map(|class| (class, ctx.method(class, expr.method.sym())));

        let ty = match sig {
            None => self.object_ty(),

            Some((class, None)) => {
                self.report(TypeckError::UndeclaredMethod {
                    class: self.tables.name(class).to_owned(),
                    method: self.tables.name(expr.method.sym()).to_owned(),
                    span: expr.method.span(),
                });

                self.object_ty()
            }

            Some((_, Some(sig))) => {
                if sig.params.len() != expr.args.len() {
                    self.report(TypeckError::InvalidNumberOfArguments {
                        span: expr.span,
                        expected_count: sig.params.len(),
                        supplied_count: expr.args.len(),
                    });
                }

                for (arg, &param_ty) in expr.args.iter().zip(&sig.params) {
                    self.check_expr_conforms(arg, param_ty);
                }

                sig.ret.reify_self_ty_with(recv_ty)
            }
        };

        expr.ty = Some(ty);
    }

    fn visit_if(&mut self, expr: &mut ast::If) {
        expr.recurse_mut(self);

        let bool_ty = self.builtin_ty(BuiltinClass::Bool);
        self.check_expr_conforms(&expr.antecedent, bool_ty);

        let ty = self.hierarchy.join(
            expr.consequent.unwrap_ty(),
            expr.alternative.unwrap_ty(),
            self.class_name,
        );
        expr.ty = Some(ty.into());
    }

    fn visit_while(&mut self, expr: &mut ast::While) {
        expr.recurse_mut(self);

        let bool_ty = self.builtin_ty(BuiltinClass::Bool);
        self.check_expr_conforms(&expr.condition, bool_ty);

        expr.ty = Some(self.object_ty());
    }

    fn visit_block(&mut self, expr: &mut ast::Block) {
        expr.recurse_mut(self);

        expr.ty = Some(match expr.body.last() {
            Some(last) => last.unwrap_ty(),
            None => self.object_ty(),
        });
    }

    fn visit_let(&mut self, expr: &mut ast::Let) {
        let binding = &mut expr.binding;
        let ty = self.resolve_ty_name(&binding.ty_name, None);

        // the initializer does not see the new binding
        if let Some(init) = &mut binding.init {
            self.visit_expr(init);
            self.check_expr_conforms(init, ty);
        }

        let name = binding.name.sym();
        let valid_name = self.check_not_self(&binding.name);

        expr.ty = Some(self.with_scope(|this| {
            if valid_name {
                this.bindings.bind(name, ty);
            }

            this.visit_expr(&mut expr.expr);

            expr.expr.unwrap_ty()
        }));
    }

    fn visit_case(&mut self, expr: &mut ast::Case) {
        self.visit_expr(&mut expr.scrutinee);

        let mut seen = HashSet::new();

        for arm in &expr.arms {
            if let Some(Ty::Class(class)) = self.ctx.resolve_ty_name(&arm.ty_name) {
                if !seen.insert(class) {
                    self.report(TypeckError::DuplicateCaseBranchType {
                        ty_name: self.tables.name(class).to_owned(),
                        span: arm.ty_name.span(),
                    });
                }
            }
        }

        for arm in &mut expr.arms {
            self.visit_case_arm(arm);
        }

        let ty = self
            .hierarchy
            .join_all(expr.arms.iter().map(|arm| arm.expr.unwrap_ty()), self.class_name)
            .map(Ty::Class)
            .unwrap_or_else(|| self.object_ty());
        expr.ty = Some(ty);
    }

    fn visit_new(&mut self, expr: &mut ast::New) {
        let ty = self.resolve_ty_name(&expr.ty_name, None);

        expr.ty = Some(ty.reify_self_ty(self.class_name).into());
    }

    fn visit_bin_op(&mut self, expr: &mut ast::BinOpExpr) {
        use ast::BinOpKind::*;

        expr.recurse_mut(self);

        let int_ty = self.builtin_ty(BuiltinClass::Int);
        let bool_ty = self.builtin_ty(BuiltinClass::Bool);

        let ty = match expr.op {
            Add | Subtract | Multiply | Divide | LessThan | LessEquals => {
                self.check_expr_conforms(&expr.lhs, int_ty);
                self.check_expr_conforms(&expr.rhs, int_ty);

                if let LessThan | LessEquals = expr.op {
                    bool_ty
                } else {
                    int_ty
                }
            }

            Equals => {
                self.check_equals(&expr.lhs, &expr.rhs);

                bool_ty
            }
        };

        expr.ty = Some(ty);
    }

    fn visit_un_op(&mut self, expr: &mut ast::UnOpExpr) {
        use ast::UnOpKind::*;

        expr.recurse_mut(self);

        let int_ty = self.builtin_ty(BuiltinClass::Int);
        let bool_ty = self.builtin_ty(BuiltinClass::Bool);

        let ty = match expr.op {
            IsVoid => bool_ty,

            Complement => {
                self.check_expr_conforms(&expr.expr, int_ty);

                int_ty
            }

            Not => {
                self.check_expr_conforms(&expr.expr, bool_ty);

                bool_ty
            }
        };

        expr.ty = Some(ty);
    }

    fn visit_name_expr(&mut self, expr: &mut ast::NameExpr) {
        if self.is_self(&expr.name) {
            expr.ty = Some(Ty::SelfType);

            return;
        }

        let ty = match self.resolve_name(&expr.name) {
            Some(ty) => ty,

            None => {
                self.report(TypeckError::UndeclaredIdentifier {
                    name: self.tables.name(expr.name.sym()).to_owned(),
                    span: expr.name.span(),
                });

                self.object_ty()
            }
        };

        expr.ty = Some(ty);
    }

    fn visit_formal(&mut self, formal: &mut ast::Formal) {
        // a scope has already been introduced in visit_method
        self.bind_formal(formal);
    }

    fn visit_receiver(&mut self, recv: &mut ast::Receiver) {
        recv.recurse_mut(self);
    }

    fn visit_case_arm(&mut self, arm: &mut ast::CaseArm) {
        let ty = self.resolve_ty_name(&arm.ty_name, Some(IllegalSelfTypePosition::CaseArm));
        let name = arm.name.sym();
        let valid_name = self.check_not_self(&arm.name);

        self.with_scope(|this| {
            if valid_name {
                this.bindings.bind(name, ty);
            }

            this.visit_expr(&mut arm.expr);
        });
    }

    fn visit_ty_name(&mut self, _ty_name: &mut TyName) {}

    fn visit_binding(&mut self, binding: &mut ast::Binding) {
        if let Some(init) = &mut binding.init {
            self.visit_expr(init);
        }
    }

    fn visit_name(&mut self, _name: &mut Name) {}

    fn visit_int_lit(&mut self, expr: &mut ast::IntLit) {
        expr.ty = Some(self.builtin_ty(BuiltinClass::Int));
    }

    fn visit_string_lit(&mut self, expr: &mut ast::StringLit) {
        expr.ty = Some(self.builtin_ty(BuiltinClass::String));
    }

    fn visit_bool_lit(&mut self, expr: &mut ast::BoolLit) {
        expr.ty = Some(self.builtin_ty(BuiltinClass::Bool));
    }

    fn visit_no_expr(&mut self, expr: &mut ast::NoExpr) {
        expr.ty = Some(self.object_ty());
    }
}
