use tracing::debug;

use crate::ast::build::AstBuilder;
use crate::ast::ty::BuiltinClass;
use crate::ast::{Class, Program};
use crate::intern::SymbolTables;

const BASIC_CLASS_FILE: &str = "<basic class>";
const NO_CLASS: &str = "_no_class";
const PRIM_SLOT: &str = "_prim_slot";

fn builtin_classes(tables: &mut SymbolTables) -> Vec<Class> {
    let b = AstBuilder::new(tables, BASIC_CLASS_FILE);

    vec![
        b.class(
            "Object",
            NO_CLASS,
            vec![
                b.method("abort", vec![], "Object", b.no_expr()),
                b.method("type_name", vec![], "String", b.no_expr()),
                b.method("copy", vec![], "SELF_TYPE", b.no_expr()),
            ],
        ),
        b.class(
            "IO",
            "Object",
            vec![
                b.method(
                    "out_string",
                    vec![b.formal("arg", "String")],
                    "SELF_TYPE",
                    b.no_expr(),
                ),
                b.method(
                    "out_int",
                    vec![b.formal("arg", "Int")],
                    "SELF_TYPE",
                    b.no_expr(),
                ),
                b.method("in_string", vec![], "String", b.no_expr()),
                b.method("in_int", vec![], "Int", b.no_expr()),
            ],
        ),
        b.class("Int", "Object", vec![b.attribute("val", PRIM_SLOT, None)]),
        b.class("Bool", "Object", vec![b.attribute("val", PRIM_SLOT, None)]),
        b.class(
            "String",
            "Object",
            vec![
                b.attribute("val", PRIM_SLOT, None),
                b.attribute("str_field", PRIM_SLOT, None),
                b.method("length", vec![], "Int", b.no_expr()),
                b.method(
                    "concat",
                    vec![b.formal("arg", "String")],
                    "String",
                    b.no_expr(),
                ),
                b.method(
                    "substr",
                    vec![b.formal("arg", "Int"), b.formal("arg2", "Int")],
                    "String",
                    b.no_expr(),
                ),
            ],
        ),
    ]
}

/// Prepends the built-in classes to `program`.
///
/// Also adds the names of the built-in classes to the string table, which code generation relies on.
pub fn install_builtin_classes(tables: &mut SymbolTables, program: &mut Program) {
    let builtins = builtin_classes(tables);
    debug!(count = builtins.len(), "installing the built-in classes");

    program.classes.splice(0..0, builtins);

    for builtin in [
        BuiltinClass::Object,
        BuiltinClass::Bool,
        BuiltinClass::IO,
        BuiltinClass::Int,
        BuiltinClass::String,
    ] {
        tables.strings.add(&builtin.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_are_prepended() {
        let mut tables = SymbolTables::new();
        let b = AstBuilder::new(&mut tables, "main.cl");
        let main = b.class("Main", "Object", vec![]);
        let mut program = b.program(vec![main]);
        drop(b);

        install_builtin_classes(&mut tables, &mut program);

        let names = program
            .classes
            .iter()
            .map(|class| tables.name(class.name.sym()))
            .collect::<Vec<_>>();

        assert_eq!(names, ["Object", "IO", "Int", "Bool", "String", "Main"]);
        assert_eq!(
            program.classes[0].parent.sym(),
            tables.well_known().no_class
        );
        assert_eq!(program.classes[0].file, tables.well_known().basic_file);
    }

    #[test]
    fn builtin_names_are_in_the_string_table() {
        let mut tables = SymbolTables::new();
        let mut program = Program {
            classes: vec![],
            span: Default::default(),
        };

        install_builtin_classes(&mut tables, &mut program);

        for name in ["Object", "IO", "Int", "Bool", "String"] {
            assert!(tables.strings.get(name).is_some(), "{} is missing", name);
        }
    }

    #[test]
    fn builtin_bodies_are_empty() {
        let mut tables = SymbolTables::new();
        let mut program = Program {
            classes: vec![],
            span: Default::default(),
        };

        install_builtin_classes(&mut tables, &mut program);

        assert!(program
            .classes
            .iter()
            .flat_map(|class| class.methods())
            .all(|method| method.body.is_no_expr()));
    }
}
