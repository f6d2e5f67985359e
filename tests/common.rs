#![allow(dead_code)]

use coolck::analysis::{self, AnalysisResult, TypeckError};
use coolck::ast::build::AstBuilder;
use coolck::ast::dump::dump_tree;
use coolck::ast::ty::{HasTy, Ty};
use coolck::ast::{Class, Expr, Feature, Method, Program};
use coolck::errors::Diagnostics;
use coolck::intern::SymbolTables;

pub const TEST_FILE: &str = "test.cl";

pub struct Analyzed {
    pub tables: SymbolTables,
    pub program: Program,
    pub result: AnalysisResult,
    /// The messages of the reported diagnostics, in order.
    pub messages: Vec<String>,
    pub errors: Vec<TypeckError>,
}

impl Analyzed {
    pub fn class(&self, name: &str) -> &Class {
        self.program
            .classes
            .iter()
            .find(|class| self.tables.name(class.name.sym()) == name)
            .unwrap_or_else(|| panic!("class {} not found", name))
    }

    pub fn method(&self, class: &str, name: &str) -> &Method {
        self.class(class)
            .methods()
            .find(|method| self.tables.name(method.name.sym()) == name)
            .unwrap_or_else(|| panic!("method {}.{} not found", class, name))
    }

    pub fn attribute_init(&self, class: &str, name: &str) -> &Expr {
        self.class(class)
            .features
            .iter()
            .find_map(|feature| match feature {
                Feature::Attribute(attr) if self.tables.name(attr.0.name.sym()) == name => {
                    attr.0.init.as_deref()
                }

                _ => None,
            })
            .unwrap_or_else(|| panic!("attribute {}.{} has no initializer", class, name))
    }

    /// The static type of the body of `class.method`.
    pub fn body_ty(&self, class: &str, method: &str) -> Option<Ty> {
        self.method(class, method).body.ty()
    }

    pub fn ty(&self, name: &str) -> Ty {
        Ty::Class(
            self.tables
                .ids
                .get(name)
                .unwrap_or_else(|| panic!("{} is not interned", name)),
        )
    }

    /// Dumps the user-defined classes as a tree.
    pub fn dump(&self) -> String {
        let basic_file = self.tables.well_known().basic_file;
        let program = Program {
            classes: self
                .program
                .classes
                .iter()
                .filter(|class| class.file != basic_file)
                .cloned()
                .collect(),
            span: self.program.span,
        };

        let mut buf = vec![];
        dump_tree(&self.tables, &program, &mut buf).unwrap();

        String::from_utf8(buf).unwrap()
    }
}

/// Builds a program with `build` and runs the full analysis on it.
pub fn analyze(build: impl FnOnce(&AstBuilder<'_>) -> Vec<Class>) -> Analyzed {
    let mut tables = SymbolTables::new();
    let program = {
        let b = AstBuilder::new(&mut tables, TEST_FILE);
        let classes = build(&b);

        b.program(classes)
    };

    analyze_program(tables, program)
}

pub fn analyze_program(mut tables: SymbolTables, mut program: Program) -> Analyzed {
    let mut diagnostics = Diagnostics::new();
    let result = analysis::analyze(&mut diagnostics, &mut tables, &mut program);

    let messages = diagnostics
        .iter()
        .map(|diagnostic| diagnostic.message.message.clone())
        .collect();
    let errors = diagnostics
        .iter()
        .filter_map(|diagnostic| diagnostic.source_as::<TypeckError>())
        .cloned()
        .collect();

    Analyzed {
        tables,
        program,
        result,
        messages,
        errors,
    }
}
