use std::error::Error;
use std::fmt::{self, Display};

use crate::ast::ty::{HasTy, Ty};
use crate::ast::{AstRecurse, Class, DefaultVisitor, Expr, IntLit, Name, Program, StringLit};
use crate::errors::Diagnostics;
use crate::intern::{Interner, Symbol, SymbolTables};
use crate::position::{HasSpan, Span};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolTable {
    Identifiers,
    Strings,
    Ints,
}

impl Display for SymbolTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Identifiers => "identifier",
            Self::Strings => "string",
            Self::Ints => "integer",
        })
    }
}

/// A symbol that has no entry in the table it refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownSymbol {
    pub table: SymbolTable,
    pub index: usize,
    pub table_len: usize,
    pub span: Span,
}

impl Display for UnknownSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "symbol #{} is out of range of the {} table ({} entries)",
            self.index, self.table, self.table_len
        )
    }
}

impl Error for UnknownSymbol {}

impl HasSpan for UnknownSymbol {
    fn span(&self) -> Span {
        self.span
    }
}

struct SymbolChecker<'a, 'emt> {
    diagnostics: &'a mut Diagnostics<'emt>,
    tables: &'a SymbolTables,
    success: bool,
}

impl SymbolChecker<'_, '_> {
    fn check(&mut self, table: SymbolTable, sym: Symbol, span: Span) {
        let tables = self.tables;
        let interner: &Interner = match table {
            SymbolTable::Identifiers => &tables.ids,
            SymbolTable::Strings => &tables.strings,
            SymbolTable::Ints => &tables.ints,
        };

        if interner.contains(sym) {
            return;
        }

        let error = UnknownSymbol {
            table,
            index: sym.index(),
            table_len: interner.len(),
            span,
        };

        self.success = false;
        self.diagnostics.error().with_span_and_error(error).emit();
    }
}

impl DefaultVisitor for SymbolChecker<'_, '_> {
    fn visit_class(&mut self, class: &Class) {
        self.check(SymbolTable::Identifiers, class.file, class.span);
        class.recurse(self);
    }

    fn visit_expr(&mut self, expr: &Expr) {
        // loaded units may carry annotations from an earlier run
        if let Some(Ty::Class(sym)) = expr.ty() {
            self.check(SymbolTable::Identifiers, sym, expr.span());
        }

        expr.recurse(self);
    }

    fn visit_name(&mut self, name: &Name) {
        self.check(SymbolTable::Identifiers, name.sym(), name.span());
    }

    fn visit_int_lit(&mut self, expr: &IntLit) {
        self.check(SymbolTable::Ints, expr.value, expr.span);
    }

    fn visit_string_lit(&mut self, expr: &StringLit) {
        self.check(SymbolTable::Strings, expr.value, expr.span);
    }
}

/// Checks that every symbol in an externally produced program refers to an existing table entry.
///
/// Must succeed before the program is analyzed: the analysis looks symbols up unchecked.
pub fn check_symbols(
    diagnostics: &mut Diagnostics<'_>,
    tables: &SymbolTables,
    program: &Program,
) -> bool {
    let mut checker = SymbolChecker {
        diagnostics,
        tables,
        success: true,
    };
    checker.visit_program(program);

    checker.success
}
