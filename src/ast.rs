pub mod build;
pub mod dump;
pub mod ty;
mod visit;

use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

use crate::intern::{Symbol, SymbolTables};
use crate::position::{HasSpan, Span, Spanned};

use self::ty::{HasTy, Ty};

pub use self::visit::*;

macro_rules! impl_recurse {
    (|$s:ident: $type:ty, $visitor:ident| { const => $body_const:expr, mut => $body_mut:expr $(,)?}) => {
        impl AstRecurse for $type {
            fn recurse<V: Visitor<Output = ()>>(&$s, $visitor: &mut V) {
                $body_const;
            }

            fn recurse_mut<V: VisitorMut<Output = ()>>(&mut $s, $visitor: &mut V) {
                $body_mut;
            }
        }
    };
}

macro_rules! impl_has_span {
    ($type:ty) => {
        impl HasSpan for $type {
            fn span(&self) -> Span {
                self.span
            }
        }
    };

    (|$s:ident: $type:ty| $body:expr) => {
        impl HasSpan for $type {
            fn span(&$s) -> Span {
                $body
            }
        }
    };
}

macro_rules! impl_has_ty {
    ($( $type:ty ),+ $(,)?) => {
        $(
            impl HasTy for $type {
                fn ty(&self) -> Option<Ty> {
                    self.ty
                }
            }
        )+
    };
}

/// A parsed program along with the symbol tables its names refer to.
///
/// This is the form in which an external parser hands over its output.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CompilationUnit {
    pub symbols: SymbolTables,
    pub program: Program,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Program {
    pub classes: Vec<Class>,
    #[serde(default)]
    pub span: Span,
}

impl_recurse!(|self: Program, visitor| {
    const => for class in &self.classes {
        visitor.visit_class(class);
    },

    mut => for class in &mut self.classes {
        visitor.visit_class(class);
    },
});

impl_has_span!(Program);

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Class {
    pub name: TyName,
    /// The parent class, or `_no_class` for the root of the hierarchy.
    pub parent: TyName,
    /// The file the class was declared in.
    pub file: Symbol,
    pub features: Vec<Feature>,
    #[serde(default)]
    pub span: Span,
}

impl_recurse!(|self: Class, visitor| {
    const => {
        visitor.visit_ty_name(&self.name);
        visitor.visit_ty_name(&self.parent);

        for feature in &self.features {
            visitor.visit_feature(feature);
        }
    },

    mut => {
        visitor.visit_ty_name(&mut self.name);
        visitor.visit_ty_name(&mut self.parent);

        for feature in &mut self.features {
            visitor.visit_feature(feature);
        }
    },
});

impl_has_span!(Class);

impl Class {
    pub fn methods(&self) -> impl Iterator<Item = &Method> {
        self.features.iter().filter_map(|feature| match feature {
            Feature::Method(method) => Some(method),
            Feature::Attribute(_) => None,
        })
    }

    pub fn attributes(&self) -> impl Iterator<Item = &Attribute> {
        self.features.iter().filter_map(|feature| match feature {
            Feature::Attribute(attr) => Some(attr),
            Feature::Method(_) => None,
        })
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Name(pub Spanned<Symbol>);

impl Name {
    pub fn sym(&self) -> Symbol {
        self.0.value
    }

    pub fn display<'a>(&self, tables: &'a SymbolTables) -> NameDisplay<'a> {
        NameDisplay(tables.name(self.sym()))
    }
}

impl_has_span!(|self: Name| self.0.span);

pub struct NameDisplay<'a>(&'a str);

impl Display for NameDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// A name occurring in a type position.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct TyName(pub Name);

impl TyName {
    pub fn sym(&self) -> Symbol {
        self.0.sym()
    }
}

impl_recurse!(|self: TyName, visitor| {
    const => visitor.visit_name(&self.0),
    mut => visitor.visit_name(&mut self.0),
});

impl_has_span!(|self: TyName| self.0.span());

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub enum Feature {
    Method(Method),
    Attribute(Attribute),
}

impl_recurse!(|self: Feature, visitor| {
    const => match self {
        Feature::Method(method) => visitor.visit_method(method),
        Feature::Attribute(attr) => visitor.visit_attribute(attr),
    },

    mut => match self {
        Feature::Method(method) => visitor.visit_method(method),
        Feature::Attribute(attr) => visitor.visit_attribute(attr),
    },
});

impl_has_span!(|self: Feature| match self {
    Self::Method(method) => method.span(),
    Self::Attribute(attr) => attr.span(),
});

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Method {
    pub name: Name,
    pub params: Vec<Formal>,
    pub return_ty: TyName,
    pub body: Box<Expr>,
    #[serde(default)]
    pub span: Span,
}

impl_recurse!(|self: Method, visitor| {
    const => {
        visitor.visit_name(&self.name);

        for param in &self.params {
            visitor.visit_formal(param);
        }

        visitor.visit_ty_name(&self.return_ty);
        visitor.visit_expr(&self.body);
    },

    mut => {
        visitor.visit_name(&mut self.name);

        for param in &mut self.params {
            visitor.visit_formal(param);
        }

        visitor.visit_ty_name(&mut self.return_ty);
        visitor.visit_expr(&mut self.body);
    },
});

impl_has_span!(Method);

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Formal {
    pub name: Name,
    pub ty_name: TyName,
    #[serde(default)]
    pub span: Span,
}

impl_recurse!(|self: Formal, visitor| {
    const => {
        visitor.visit_name(&self.name);
        visitor.visit_ty_name(&self.ty_name);
    },

    mut => {
        visitor.visit_name(&mut self.name);
        visitor.visit_ty_name(&mut self.ty_name);
    }
});

impl_has_span!(Formal);

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Attribute(pub Binding);

impl_recurse!(|self: Attribute, visitor| {
    const => visitor.visit_binding(&self.0),
    mut => visitor.visit_binding(&mut self.0),
});

impl_has_span!(|self: Attribute| self.0.span);

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub name: Name,
    pub ty_name: TyName,
    #[serde(default)]
    pub init: Option<Box<Expr>>,
    #[serde(default)]
    pub span: Span,
}

impl_recurse!(|self: Binding, visitor| {
    const => {
        visitor.visit_name(&self.name);
        visitor.visit_ty_name(&self.ty_name);

        if let Some(expr) = &self.init {
            visitor.visit_expr(expr);
        }
    },

    mut => {
        visitor.visit_name(&mut self.name);
        visitor.visit_ty_name(&mut self.ty_name);

        if let Some(expr) = &mut self.init {
            visitor.visit_expr(expr);
        }
    },
});

impl_has_span!(Binding);

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Assignment(Assignment),
    Call(Call),
    If(If),
    While(While),
    Block(Block),
    Let(Let),
    Case(Case),
    New(New),
    BinOp(BinOpExpr),
    UnOp(UnOpExpr),
    Name(NameExpr),
    Int(IntLit),
    String(StringLit),
    Bool(BoolLit),
    /// An absent expression, used as the body of built-in methods.
    NoExpr(NoExpr),
}

impl_recurse!(|self: Expr, visitor| {
    const => match self {
        Self::Assignment(expr) => visitor.visit_assignment(expr),
        Self::Call(expr) => visitor.visit_call(expr),
        Self::If(expr) => visitor.visit_if(expr),
        Self::While(expr) => visitor.visit_while(expr),
        Self::Block(expr) => visitor.visit_block(expr),
        Self::Let(expr) => visitor.visit_let(expr),
        Self::Case(expr) => visitor.visit_case(expr),
        Self::New(expr) => visitor.visit_new(expr),
        Self::BinOp(expr) => visitor.visit_bin_op(expr),
        Self::UnOp(expr) => visitor.visit_un_op(expr),
        Self::Name(expr) => visitor.visit_name_expr(expr),
        Self::Int(expr) => visitor.visit_int_lit(expr),
        Self::String(expr) => visitor.visit_string_lit(expr),
        Self::Bool(expr) => visitor.visit_bool_lit(expr),
        Self::NoExpr(expr) => visitor.visit_no_expr(expr),
    },

    mut => match self {
        Self::Assignment(expr) => visitor.visit_assignment(expr),
        Self::Call(expr) => visitor.visit_call(expr),
        Self::If(expr) => visitor.visit_if(expr),
        Self::While(expr) => visitor.visit_while(expr),
        Self::Block(expr) => visitor.visit_block(expr),
        Self::Let(expr) => visitor.visit_let(expr),
        Self::Case(expr) => visitor.visit_case(expr),
        Self::New(expr) => visitor.visit_new(expr),
        Self::BinOp(expr) => visitor.visit_bin_op(expr),
        Self::UnOp(expr) => visitor.visit_un_op(expr),
        Self::Name(expr) => visitor.visit_name_expr(expr),
        Self::Int(expr) => visitor.visit_int_lit(expr),
        Self::String(expr) => visitor.visit_string_lit(expr),
        Self::Bool(expr) => visitor.visit_bool_lit(expr),
        Self::NoExpr(expr) => visitor.visit_no_expr(expr),
    },
});

impl_has_span!(|self: Expr| match self {
    Self::Assignment(expr) => expr.span(),
    Self::Call(expr) => expr.span(),
    Self::If(expr) => expr.span(),
    Self::While(expr) => expr.span(),
    Self::Block(expr) => expr.span(),
    Self::Let(expr) => expr.span(),
    Self::Case(expr) => expr.span(),
    Self::New(expr) => expr.span(),
    Self::BinOp(expr) => expr.span(),
    Self::UnOp(expr) => expr.span(),
    Self::Name(expr) => expr.span(),
    Self::Int(expr) => expr.span(),
    Self::String(expr) => expr.span(),
    Self::Bool(expr) => expr.span(),
    Self::NoExpr(expr) => expr.span(),
});

impl HasTy for Expr {
    fn ty(&self) -> Option<Ty> {
        match self {
            Self::Assignment(expr) => expr.ty,
            Self::Call(expr) => expr.ty,
            Self::If(expr) => expr.ty,
            Self::While(expr) => expr.ty,
            Self::Block(expr) => expr.ty,
            Self::Let(expr) => expr.ty,
            Self::Case(expr) => expr.ty,
            Self::New(expr) => expr.ty,
            Self::BinOp(expr) => expr.ty,
            Self::UnOp(expr) => expr.ty,
            Self::Name(expr) => expr.ty,
            Self::Int(expr) => expr.ty,
            Self::String(expr) => expr.ty,
            Self::Bool(expr) => expr.ty,
            Self::NoExpr(expr) => expr.ty,
        }
    }
}

impl Expr {
    pub fn is_no_expr(&self) -> bool {
        matches!(self, Self::NoExpr(_))
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub name: Name,
    pub expr: Box<Expr>,
    #[serde(default)]
    pub span: Span,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ty: Option<Ty>,
}

impl_recurse!(|self: Assignment, visitor| {
    const => {
        visitor.visit_name(&self.name);
        visitor.visit_expr(&self.expr);
    },

    mut => {
        visitor.visit_name(&mut self.name);
        visitor.visit_expr(&mut self.expr);
    },
});

impl_has_span!(Assignment);

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub receiver: Receiver,
    pub method: Name,
    pub args: Vec<Expr>,
    #[serde(default)]
    pub span: Span,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ty: Option<Ty>,
}

impl_recurse!(|self: Call, visitor| {
    const => {
        visitor.visit_receiver(&self.receiver);
        visitor.visit_name(&self.method);

        for arg in &self.args {
            visitor.visit_expr(arg);
        }
    },

    mut => {
        visitor.visit_receiver(&mut self.receiver);
        visitor.visit_name(&mut self.method);

        for arg in &mut self.args {
            visitor.visit_expr(arg);
        }
    },
});

impl_has_span!(Call);

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub enum Receiver {
    /// No receiver was written: the method is called on `self`.
    Implicit,
    Dynamic(Box<Expr>),
    Static {
        object: Box<Expr>,
        ty_name: TyName,
    },
}

impl_recurse!(|self: Receiver, visitor| {
    const => match self {
        Self::Implicit => {},
        Self::Dynamic(expr) => visitor.visit_expr(expr),

        Self::Static { object, ty_name } => {
            visitor.visit_expr(object);
            visitor.visit_ty_name(ty_name);
        }
    },

    mut => match self {
        Self::Implicit => {},
        Self::Dynamic(expr) => visitor.visit_expr(expr),

        Self::Static { object, ty_name } => {
            visitor.visit_expr(object);
            visitor.visit_ty_name(ty_name);
        }
    },
});

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct If {
    pub antecedent: Box<Expr>,
    pub consequent: Box<Expr>,
    pub alternative: Box<Expr>,
    #[serde(default)]
    pub span: Span,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ty: Option<Ty>,
}

impl_recurse!(|self: If, visitor| {
    const => {
        visitor.visit_expr(&self.antecedent);
        visitor.visit_expr(&self.consequent);
        visitor.visit_expr(&self.alternative);
    },

    mut => {
        visitor.visit_expr(&mut self.antecedent);
        visitor.visit_expr(&mut self.consequent);
        visitor.visit_expr(&mut self.alternative);
    },
});

impl_has_span!(If);

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct While {
    pub condition: Box<Expr>,
    pub body: Box<Expr>,
    #[serde(default)]
    pub span: Span,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ty: Option<Ty>,
}

impl_recurse!(|self: While, visitor| {
    const => {
        visitor.visit_expr(&self.condition);
        visitor.visit_expr(&self.body);
    },

    mut => {
        visitor.visit_expr(&mut self.condition);
        visitor.visit_expr(&mut self.body);
    },
});

impl_has_span!(While);

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub body: Vec<Expr>,
    #[serde(default)]
    pub span: Span,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ty: Option<Ty>,
}

impl_recurse!(|self: Block, visitor| {
    const => for expr in &self.body {
        visitor.visit_expr(expr);
    },

    mut => for expr in &mut self.body {
        visitor.visit_expr(expr);
    },
});

impl_has_span!(Block);

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Let {
    pub binding: Binding,
    pub expr: Box<Expr>,
    #[serde(default)]
    pub span: Span,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ty: Option<Ty>,
}

impl_recurse!(|self: Let, visitor| {
    const => {
        visitor.visit_binding(&self.binding);
        visitor.visit_expr(&self.expr);
    },

    mut => {
        visitor.visit_binding(&mut self.binding);
        visitor.visit_expr(&mut self.expr);
    },
});

impl_has_span!(Let);

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Case {
    pub scrutinee: Box<Expr>,
    pub arms: Vec<CaseArm>,
    #[serde(default)]
    pub span: Span,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ty: Option<Ty>,
}

impl_recurse!(|self: Case, visitor| {
    const => {
        visitor.visit_expr(&self.scrutinee);

        for arm in &self.arms {
            visitor.visit_case_arm(arm);
        }
    },

    mut => {
        visitor.visit_expr(&mut self.scrutinee);

        for arm in &mut self.arms {
            visitor.visit_case_arm(arm);
        }
    },
});

impl_has_span!(Case);

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CaseArm {
    pub name: Name,
    pub ty_name: TyName,
    pub expr: Box<Expr>,
    #[serde(default)]
    pub span: Span,
}

impl_recurse!(|self: CaseArm, visitor| {
    const => {
        visitor.visit_name(&self.name);
        visitor.visit_ty_name(&self.ty_name);
        visitor.visit_expr(&self.expr);
    },

    mut => {
        visitor.visit_name(&mut self.name);
        visitor.visit_ty_name(&mut self.ty_name);
        visitor.visit_expr(&mut self.expr);
    },
});

impl_has_span!(CaseArm);

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct New {
    pub ty_name: TyName,
    #[serde(default)]
    pub span: Span,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ty: Option<Ty>,
}

impl_recurse!(|self: New, visitor| {
    const => visitor.visit_ty_name(&self.ty_name),
    mut => visitor.visit_ty_name(&mut self.ty_name),
});

impl_has_span!(New);

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct BinOpExpr {
    pub op: BinOpKind,
    pub lhs: Box<Expr>,
    pub rhs: Box<Expr>,
    #[serde(default)]
    pub span: Span,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ty: Option<Ty>,
}

impl_recurse!(|self: BinOpExpr, visitor| {
    const => {
        visitor.visit_expr(&self.lhs);
        visitor.visit_expr(&self.rhs);
    },

    mut => {
        visitor.visit_expr(&mut self.lhs);
        visitor.visit_expr(&mut self.rhs);
    },
});

impl_has_span!(BinOpExpr);

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum BinOpKind {
    Add,
    Subtract,
    Multiply,
    Divide,
    LessThan,
    LessEquals,
    Equals,
}

impl BinOpKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Subtract => "-",
            Self::Multiply => "*",
            Self::Divide => "/",
            Self::LessThan => "<",
            Self::LessEquals => "<=",
            Self::Equals => "=",
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct UnOpExpr {
    pub op: UnOpKind,
    pub expr: Box<Expr>,
    #[serde(default)]
    pub span: Span,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ty: Option<Ty>,
}

impl_recurse!(|self: UnOpExpr, visitor| {
    const => visitor.visit_expr(&self.expr),
    mut => visitor.visit_expr(&mut self.expr),
});

impl_has_span!(UnOpExpr);

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum UnOpKind {
    IsVoid,
    Complement,
    Not,
}

impl UnOpKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::IsVoid => "isvoid",
            Self::Complement => "~",
            Self::Not => "not",
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct NameExpr {
    pub name: Name,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ty: Option<Ty>,
}

impl_recurse!(|self: NameExpr, visitor| {
    const => visitor.visit_name(&self.name),
    mut => visitor.visit_name(&mut self.name),
});

impl_has_span!(|self: NameExpr| self.name.span());

/// An integer literal; the value is stored in the integer table.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct IntLit {
    pub value: Symbol,
    #[serde(default)]
    pub span: Span,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ty: Option<Ty>,
}

impl_has_span!(IntLit);

/// A string literal; the value is stored in the string table.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct StringLit {
    pub value: Symbol,
    #[serde(default)]
    pub span: Span,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ty: Option<Ty>,
}

impl_has_span!(StringLit);

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct BoolLit {
    pub value: bool,
    #[serde(default)]
    pub span: Span,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ty: Option<Ty>,
}

impl_has_span!(BoolLit);

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct NoExpr {
    #[serde(default)]
    pub span: Span,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ty: Option<Ty>,
}

impl_has_span!(NoExpr);

impl_has_ty!(
    Assignment, Call, If, While, Block, Let, Case, New, BinOpExpr, UnOpExpr, NameExpr, IntLit,
    StringLit, BoolLit, NoExpr,
);
