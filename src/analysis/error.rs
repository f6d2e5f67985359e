use std::error::Error;
use std::fmt::{self, Display};
use std::ops::Deref;

use crate::ast::ty::BuiltinClass;
use crate::position::{HasSpan, Span};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IllegalSelfTypePosition {
    ClassName,
    Parameter,
    StaticDispatch,
    CaseArm,
}

impl Display for IllegalSelfTypePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // NOTE: should make sense in the following context: `occur in {}`
        write!(
            f,
            "{}",
            match self {
                Self::ClassName => "a class name position",
                Self::Parameter => "a method parameter",
                Self::StaticDispatch => "a static dispatch type specifier",
                Self::CaseArm => "a case arm",
            }
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MultipleDefinitionKind {
    Attribute { inherited: bool },
    Method,
    Parameter,
}

impl Display for MultipleDefinitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::Attribute { .. } => "attribute",
                Self::Method => "method",
                Self::Parameter => "parameter",
            }
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverrideMismatch {
    ParamCount { expected: usize, actual: usize },
    ParamTy { index: usize },
    ReturnTy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MismatchedTypes {
    pub span: Span,
    pub expected_ty: String,
    pub actual_ty: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidOverride {
    pub span: Span,
    pub method: String,
    pub ancestor: String,
    pub mismatch: OverrideMismatch,
}

/// A semantic error found in a program.
///
/// Names are stored as text so that the error is self-contained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeckError {
    IllegalParent {
        class: String,
        parent: BuiltinClass,
        span: Span,
    },

    BuiltinRedefined {
        builtin: BuiltinClass,
        span: Span,
    },

    MultipleClassDefinition {
        class: String,
        span: Span,
    },

    UnresolvedParent {
        class: String,
        parent: String,
        span: Span,
    },

    NoMainClass,

    InheritanceCycle {
        class: String,
        span: Span,
    },

    IllegalSelfType {
        position: IllegalSelfTypePosition,
        span: Span,
    },

    UndeclaredType {
        ty_name: String,
        span: Span,
    },

    UndeclaredIdentifier {
        name: String,
        span: Span,
    },

    UndeclaredMethod {
        class: String,
        method: String,
        span: Span,
    },

    MismatchedTypes(Box<MismatchedTypes>),

    InvalidNumberOfArguments {
        span: Span,
        expected_count: usize,
        supplied_count: usize,
    },

    DuplicateCaseBranchType {
        ty_name: String,
        span: Span,
    },

    MultipleDefinition {
        kind: MultipleDefinitionKind,
        name: String,
        span: Span,
    },

    InvalidOverride(Box<InvalidOverride>),

    IllegalSelf {
        span: Span,
    },
}

impl Display for TypeckError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IllegalParent { class, parent, .. } => {
                write!(
                    f,
                    "class `{}` inherits from the built-in class `{}`, which is forbidden",
                    class, parent
                )
            }

            Self::BuiltinRedefined { builtin, .. } => {
                write!(f, "redefinition of the built-in class `{}`", builtin)
            }

            Self::MultipleClassDefinition { class, .. } => {
                write!(f, "class `{}` has multiple definitions", class)
            }

            Self::UnresolvedParent { class, parent, .. } => {
                write!(
                    f,
                    "class `{}` inherits from a class `{}` that doesn't exist",
                    class, parent
                )
            }

            Self::NoMainClass => write!(f, "no `Main` class found"),

            Self::InheritanceCycle { class, .. } => {
                write!(
                    f,
                    "an inheritance cycle containing `{}` has been detected",
                    class
                )
            }

            Self::IllegalSelfType { position, .. } => {
                write!(f, "`SELF_TYPE` cannot occur in {}", position)
            }

            Self::UndeclaredType { ty_name, .. } => {
                write!(f, "the type name `{}` is not declared", ty_name)
            }

            Self::UndeclaredIdentifier { name, .. } => {
                write!(f, "undeclared identifier `{}`", name)
            }

            Self::UndeclaredMethod { class, method, .. } => {
                write!(
                    f,
                    "class `{}` does not have a method named `{}`",
                    class, method
                )
            }

            Self::MismatchedTypes(err) => {
                let MismatchedTypes {
                    expected_ty,
                    actual_ty,
                    ..
                } = err.deref();

                write!(
                    f,
                    "mismatched types: expected `{}`, found `{}`",
                    expected_ty, actual_ty,
                )
            }

            Self::InvalidNumberOfArguments {
                expected_count,
                supplied_count,
                ..
            } => {
                write!(
                    f,
                    "this method takes {} argument{} but {} argument{} {} supplied",
                    expected_count,
                    if *expected_count != 1usize { "s" } else { "" },
                    supplied_count,
                    if *supplied_count != 1usize { "s" } else { "" },
                    if *supplied_count != 1usize {
                        "were"
                    } else {
                        "was"
                    },
                )
            }

            Self::DuplicateCaseBranchType { ty_name, .. } => {
                write!(
                    f,
                    "the type `{}` is matched by more than one case branch",
                    ty_name
                )
            }

            Self::MultipleDefinition { kind, name, .. } => {
                write!(
                    f,
                    "detected multiple definition: {} `{}` is already defined{}",
                    kind,
                    name,
                    match *kind {
                        MultipleDefinitionKind::Attribute { inherited: true } => " in a superclass",
                        _ => "",
                    },
                )
            }

            Self::InvalidOverride(err) => {
                let InvalidOverride {
                    method,
                    ancestor,
                    mismatch,
                    ..
                } = err.deref();

                write!(
                    f,
                    "method `{}` overrides the one defined in `{}` with a different signature: ",
                    method, ancestor
                )?;

                match mismatch {
                    OverrideMismatch::ParamCount { expected, actual } => write!(
                        f,
                        "expected {} parameter{}, found {}",
                        expected,
                        if *expected != 1usize { "s" } else { "" },
                        actual
                    ),

                    OverrideMismatch::ParamTy { index } => {
                        write!(f, "the type of parameter #{} differs", index + 1)
                    }

                    OverrideMismatch::ReturnTy => write!(f, "the return type differs"),
                }
            }

            Self::IllegalSelf { .. } => write!(f, "`self` cannot be used here"),
        }
    }
}

impl Error for TypeckError {}

impl HasSpan for TypeckError {
    fn span(&self) -> Span {
        match self {
            Self::IllegalParent { span, .. } => *span,
            Self::BuiltinRedefined { span, .. } => *span,
            Self::MultipleClassDefinition { span, .. } => *span,
            Self::UnresolvedParent { span, .. } => *span,
            Self::NoMainClass => Span::synthetic(),
            Self::InheritanceCycle { span, .. } => *span,
            Self::IllegalSelfType { span, .. } => *span,
            Self::UndeclaredType { span, .. } => *span,
            Self::UndeclaredIdentifier { span, .. } => *span,
            Self::UndeclaredMethod { span, .. } => *span,
            Self::MismatchedTypes(err) => err.span,
            Self::InvalidNumberOfArguments { span, .. } => *span,
            Self::DuplicateCaseBranchType { span, .. } => *span,
            Self::MultipleDefinition { span, .. } => *span,
            Self::InvalidOverride(err) => err.span,
            Self::IllegalSelf { span } => *span,
        }
    }
}
