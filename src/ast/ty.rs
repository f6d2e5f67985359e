use std::fmt::{self, Display};

use phf::phf_map;
use serde::{Deserialize, Serialize};

use crate::intern::{Symbol, SymbolTables, WellKnown};

/// A static type.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Ty {
    Class(Symbol),

    /// `SELF_TYPE`: the dynamic type of `self` in the enclosing class.
    SelfType,
}

impl Ty {
    pub fn is_self_ty(self) -> bool {
        matches!(self, Self::SelfType)
    }

    pub fn class(self) -> Option<Symbol> {
        match self {
            Self::Class(name) => Some(name),
            Self::SelfType => None,
        }
    }

    /// If `self` is `SelfType`, substitutes it for `current_class`.
    pub fn reify_self_ty(self, current_class: Symbol) -> Symbol {
        match self {
            Self::Class(name) => name,
            Self::SelfType => current_class,
        }
    }

    /// If `self` is `SelfType`, substitutes it with `substitute`.
    /// Otherwise returns `self`.
    pub fn reify_self_ty_with(self, substitute: Ty) -> Ty {
        if self.is_self_ty() {
            substitute
        } else {
            self
        }
    }

    pub fn is_builtin(self, well_known: &WellKnown, builtin: BuiltinClass) -> bool {
        self == Self::Class(builtin.sym(well_known))
    }

    pub fn display(self, tables: &SymbolTables) -> TyDisplay<'_> {
        TyDisplay { ty: self, tables }
    }
}

impl From<Symbol> for Ty {
    fn from(name: Symbol) -> Self {
        Self::Class(name)
    }
}

pub struct TyDisplay<'a> {
    ty: Ty,
    tables: &'a SymbolTables,
}

impl Display for TyDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.ty {
            Ty::Class(name) => f.write_str(self.tables.name(name)),
            Ty::SelfType => f.write_str("SELF_TYPE"),
        }
    }
}

/// A built-in class.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinClass {
    /// The top type, a superclass of every type.
    Object,
    IO,
    Int,
    Bool,
    String,
}

static BUILTIN_CLASSES: phf::Map<&'static str, BuiltinClass> = phf_map! {
    "Object" => BuiltinClass::Object,
    "IO" => BuiltinClass::IO,
    "Int" => BuiltinClass::Int,
    "Bool" => BuiltinClass::Bool,
    "String" => BuiltinClass::String,
};

impl BuiltinClass {
    pub fn from_name(name: &str) -> Option<Self> {
        BUILTIN_CLASSES.get(name).copied()
    }

    pub fn sym(self, well_known: &WellKnown) -> Symbol {
        match self {
            Self::Object => well_known.object,
            Self::IO => well_known.io,
            Self::Int => well_known.int,
            Self::Bool => well_known.bool,
            Self::String => well_known.string,
        }
    }

    /// Primitive classes are final and compared by value.
    pub fn is_primitive(self) -> bool {
        matches!(self, Self::Int | Self::Bool | Self::String)
    }
}

impl Display for BuiltinClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::Object => "Object",
                Self::IO => "IO",
                Self::Int => "Int",
                Self::Bool => "Bool",
                Self::String => "String",
            }
        )
    }
}

pub trait HasTy {
    fn ty(&self) -> Option<Ty>;
}

pub trait UnwrapTy: HasTy {
    fn unwrap_ty(&self) -> Ty;
}

impl<T: HasTy> UnwrapTy for T {
    fn unwrap_ty(&self) -> Ty {
        self.ty().expect("unwrap_ty called on an unchecked expression")
    }
}
