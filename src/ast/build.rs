//! Helpers for constructing ASTs in code.
//!
//! Used to synthesize the built-in classes and to write tests without a parser.

use std::cell::{Cell, RefCell};

use crate::intern::{Symbol, SymbolTables};
use crate::position::{Position, Span, Spanned};

use super::*;

pub struct AstBuilder<'a> {
    tables: RefCell<&'a mut SymbolTables>,
    file: Symbol,
    span: Cell<Span>,
}

impl<'a> AstBuilder<'a> {
    pub fn new(tables: &'a mut SymbolTables, file: &str) -> Self {
        let file = tables.ids.add(file);

        Self {
            tables: RefCell::new(tables),
            file,
            span: Cell::new(Span::synthetic()),
        }
    }

    /// Sets the span assigned to the nodes created afterwards.
    pub fn at(&self, line: usize, col: usize) -> &Self {
        let pos = Position { line, col };
        self.span.set(Span::new(pos, pos));

        self
    }

    fn span(&self) -> Span {
        self.span.get()
    }

    pub fn sym(&self, text: &str) -> Symbol {
        self.tables.borrow_mut().ids.add(text)
    }

    pub fn name(&self, text: &str) -> Name {
        Name(Spanned {
            value: self.sym(text),
            span: self.span(),
        })
    }

    pub fn ty_name(&self, text: &str) -> TyName {
        TyName(self.name(text))
    }

    pub fn class(&self, name: &str, parent: &str, features: Vec<Feature>) -> Class {
        Class {
            name: self.ty_name(name),
            parent: self.ty_name(parent),
            file: self.file,
            features,
            span: self.span(),
        }
    }

    pub fn program(&self, classes: Vec<Class>) -> Program {
        Program {
            classes,
            span: self.span(),
        }
    }

    pub fn method(&self, name: &str, params: Vec<Formal>, return_ty: &str, body: Expr) -> Feature {
        Feature::Method(Method {
            name: self.name(name),
            params,
            return_ty: self.ty_name(return_ty),
            body: Box::new(body),
            span: self.span(),
        })
    }

    pub fn formal(&self, name: &str, ty: &str) -> Formal {
        Formal {
            name: self.name(name),
            ty_name: self.ty_name(ty),
            span: self.span(),
        }
    }

    pub fn attribute(&self, name: &str, ty: &str, init: Option<Expr>) -> Feature {
        Feature::Attribute(Attribute(self.binding(name, ty, init)))
    }

    fn binding(&self, name: &str, ty: &str, init: Option<Expr>) -> Binding {
        Binding {
            name: self.name(name),
            ty_name: self.ty_name(ty),
            init: init.map(Box::new),
            span: self.span(),
        }
    }

    pub fn int(&self, value: i32) -> Expr {
        let value = self.tables.borrow_mut().ints.add(&value.to_string());

        Expr::Int(IntLit {
            value,
            span: self.span(),
            ty: None,
        })
    }

    pub fn string(&self, text: &str) -> Expr {
        let value = self.tables.borrow_mut().strings.add(text);

        Expr::String(StringLit {
            value,
            span: self.span(),
            ty: None,
        })
    }

    pub fn bool(&self, value: bool) -> Expr {
        Expr::Bool(BoolLit {
            value,
            span: self.span(),
            ty: None,
        })
    }

    pub fn object(&self, name: &str) -> Expr {
        Expr::Name(NameExpr {
            name: self.name(name),
            ty: None,
        })
    }

    pub fn no_expr(&self) -> Expr {
        Expr::NoExpr(NoExpr {
            span: self.span(),
            ty: None,
        })
    }

    pub fn new_object(&self, ty: &str) -> Expr {
        Expr::New(New {
            ty_name: self.ty_name(ty),
            span: self.span(),
            ty: None,
        })
    }

    pub fn assign(&self, name: &str, expr: Expr) -> Expr {
        Expr::Assignment(Assignment {
            name: self.name(name),
            expr: Box::new(expr),
            span: self.span(),
            ty: None,
        })
    }

    pub fn block(&self, body: Vec<Expr>) -> Expr {
        Expr::Block(Block {
            body,
            span: self.span(),
            ty: None,
        })
    }

    pub fn if_(&self, antecedent: Expr, consequent: Expr, alternative: Expr) -> Expr {
        Expr::If(If {
            antecedent: Box::new(antecedent),
            consequent: Box::new(consequent),
            alternative: Box::new(alternative),
            span: self.span(),
            ty: None,
        })
    }

    pub fn while_(&self, condition: Expr, body: Expr) -> Expr {
        Expr::While(While {
            condition: Box::new(condition),
            body: Box::new(body),
            span: self.span(),
            ty: None,
        })
    }

    pub fn let_(&self, name: &str, ty: &str, init: Option<Expr>, body: Expr) -> Expr {
        Expr::Let(Let {
            binding: self.binding(name, ty, init),
            expr: Box::new(body),
            span: self.span(),
            ty: None,
        })
    }

    pub fn case(&self, scrutinee: Expr, arms: Vec<CaseArm>) -> Expr {
        Expr::Case(Case {
            scrutinee: Box::new(scrutinee),
            arms,
            span: self.span(),
            ty: None,
        })
    }

    pub fn arm(&self, name: &str, ty: &str, expr: Expr) -> CaseArm {
        CaseArm {
            name: self.name(name),
            ty_name: self.ty_name(ty),
            expr: Box::new(expr),
            span: self.span(),
        }
    }

    pub fn bin_op(&self, op: BinOpKind, lhs: Expr, rhs: Expr) -> Expr {
        Expr::BinOp(BinOpExpr {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
            span: self.span(),
            ty: None,
        })
    }

    pub fn un_op(&self, op: UnOpKind, expr: Expr) -> Expr {
        Expr::UnOp(UnOpExpr {
            op,
            expr: Box::new(expr),
            span: self.span(),
            ty: None,
        })
    }

    /// A dispatch on `object`, or on `self` if `object` is `None`.
    pub fn call(&self, object: Option<Expr>, method: &str, args: Vec<Expr>) -> Expr {
        let receiver = match object {
            Some(object) => Receiver::Dynamic(Box::new(object)),
            None => Receiver::Implicit,
        };

        self.make_call(receiver, method, args)
    }

    pub fn static_call(&self, object: Expr, ty: &str, method: &str, args: Vec<Expr>) -> Expr {
        let receiver = Receiver::Static {
            object: Box::new(object),
            ty_name: self.ty_name(ty),
        };

        self.make_call(receiver, method, args)
    }

    fn make_call(&self, receiver: Receiver, method: &str, args: Vec<Expr>) -> Expr {
        Expr::Call(Call {
            receiver,
            method: self.name(method),
            args,
            span: self.span(),
            ty: None,
        })
    }
}
