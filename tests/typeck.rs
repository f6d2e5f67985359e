mod common;

use insta::assert_snapshot;
use paste::paste;
use pretty_assertions::assert_eq;

use coolck::ast::ty::{HasTy, Ty};
use coolck::ast::{AstRecurse, BinOpKind, DefaultVisitor, Expr, UnOpKind};

use self::common::analyze;

/// Generates tests that type-check a program and compare the reported messages.
///
/// Each program is given as a list of classes; a `Main` class is never added implicitly.
macro_rules! typeck_tests {
    {
        $(
            $name:ident: |$b:ident| [ $( $class:expr ),* $(,)? ] => [ $( $message:expr ),* $(,)? ];
        )+
    } => {
        $(
            paste! {
                #[test]
                fn [< test_ $name >]() {
                    let analyzed = analyze(|$b| vec![ $( $class ),* ]);
                    let expected: Vec<&str> = vec![ $( $message ),* ];

                    assert_eq!(analyzed.messages, expected);
                    assert_eq!(analyzed.result.success, expected.is_empty());
                }
            }
        )+
    };
}

typeck_tests! {
    arithmetic_on_strings: |b| [
        b.class("Main", "Object", vec![
            b.method("f", vec![], "Int", b.bin_op(BinOpKind::Add, b.int(1), b.string("x"))),
            b.method("g", vec![], "Bool", b.int(1)),
        ]),
    ] => [
        "mismatched types: expected `Int`, found `String`",
        "mismatched types: expected `Bool`, found `Int`",
    ];

    self_type_result_is_not_the_class: |b| [
        b.class("Main", "Object", vec![
            b.method("main", vec![], "SELF_TYPE", b.new_object("Main")),
        ]),
    ] => ["mismatched types: expected `SELF_TYPE`, found `Main`"];

    if_condition_must_be_bool: |b| [
        b.class("Main", "Object", vec![
            b.method("main", vec![], "Int", b.if_(b.int(1), b.int(2), b.int(3))),
        ]),
    ] => ["mismatched types: expected `Bool`, found `Int`"];

    while_condition_must_be_bool: |b| [
        b.class("Main", "Object", vec![
            b.method("main", vec![], "Object", b.while_(b.string("s"), b.int(0))),
        ]),
    ] => ["mismatched types: expected `Bool`, found `String`"];

    let_scope_does_not_leak: |b| [
        b.class("Main", "Object", vec![
            b.method("main", vec![], "Object", b.block(vec![
                b.let_("x", "Int", Some(b.int(1)), b.object("x")),
                b.object("x"),
            ])),
        ]),
    ] => ["undeclared identifier `x`"];

    let_initializer_does_not_see_its_binding: |b| [
        b.class("Main", "Object", vec![
            b.method("main", vec![], "Int", b.let_("y", "Int", Some(b.object("y")), b.object("y"))),
        ]),
    ] => [
        "undeclared identifier `y`",
        "mismatched types: expected `Int`, found `Object`",
    ];

    let_initializer_must_conform: |b| [
        b.class("Main", "Object", vec![
            b.method("main", vec![], "Object", b.let_("x", "Int", Some(b.bool(true)), b.object("x"))),
        ]),
    ] => ["mismatched types: expected `Int`, found `Bool`"];

    let_of_undeclared_type: |b| [
        b.class("Main", "Object", vec![
            b.method("main", vec![], "Object", b.let_("x", "Nope", Some(b.int(1)), b.object("x"))),
        ]),
    ] => ["the type name `Nope` is not declared"];

    too_many_arguments: |b| [
        b.class("Main", "Object", vec![
            b.method("f", vec![b.formal("a", "Int")], "Int", b.object("a")),
            b.method("main", vec![], "Int", b.call(None, "f", vec![b.int(1), b.int(2)])),
        ]),
    ] => ["this method takes 1 argument but 2 arguments were supplied"];

    too_few_arguments: |b| [
        b.class("Main", "Object", vec![
            b.method("f", vec![b.formal("a", "Int"), b.formal("b", "Int")], "Int", b.object("a")),
            b.method("main", vec![], "Int", b.call(None, "f", vec![b.int(1)])),
        ]),
    ] => ["this method takes 2 arguments but 1 argument was supplied"];

    argument_must_conform: |b| [
        b.class("Main", "Object", vec![
            b.method("f", vec![b.formal("a", "Int")], "Int", b.object("a")),
            b.method("main", vec![], "Int", b.call(None, "f", vec![b.string("s")])),
        ]),
    ] => ["mismatched types: expected `Int`, found `String`"];

    undeclared_method_still_checks_arguments: |b| [
        b.class("Main", "Object", vec![
            b.method("main", vec![], "Object", b.call(
                None,
                "foo",
                vec![b.bin_op(BinOpKind::Add, b.int(1), b.string("a"))],
            )),
        ]),
    ] => [
        "mismatched types: expected `Int`, found `String`",
        "class `Main` does not have a method named `foo`",
    ];

    undeclared_method_on_receiver: |b| [
        b.class("Main", "Object", vec![
            b.method("main", vec![], "Object", b.call(Some(b.new_object("A")), "bar", vec![])),
        ]),
        b.class("A", "Object", vec![]),
    ] => ["class `A` does not have a method named `bar`"];

    duplicate_case_branch_type: |b| [
        b.class("Main", "Object", vec![
            b.method("main", vec![], "Int", b.case(b.int(1), vec![
                b.arm("a", "Int", b.object("a")),
                b.arm("b", "Int", b.object("b")),
            ])),
        ]),
    ] => ["the type `Int` is matched by more than one case branch"];

    self_type_case_branch: |b| [
        b.class("Main", "Object", vec![
            b.method("main", vec![], "Object", b.case(b.int(1), vec![
                b.arm("a", "SELF_TYPE", b.object("a")),
            ])),
        ]),
    ] => ["`SELF_TYPE` cannot occur in a case arm"];

    self_cannot_be_bound: |b| [
        b.class("Main", "Object", vec![
            b.attribute("self", "Int", None),
            b.method("f", vec![b.formal("self", "Int")], "Int", b.int(1)),
            b.method("main", vec![], "Object", b.block(vec![
                b.assign("self", b.new_object("Main")),
                b.let_("self", "Int", Some(b.int(1)), b.object("self")),
            ])),
        ]),
    ] => [
        "`self` cannot be used here",
        "`self` cannot be used here",
        "`self` cannot be used here",
        "`self` cannot be used here",
    ];

    equality_of_primitives_must_match: |b| [
        b.class("Main", "Object", vec![
            b.method("main", vec![], "Bool", b.bin_op(BinOpKind::Equals, b.int(1), b.string("a"))),
        ]),
    ] => ["mismatched types: expected `Int`, found `String`"];

    equality_with_primitive_on_the_right: |b| [
        b.class("Main", "Object", vec![
            b.method("main", vec![], "Bool", b.bin_op(BinOpKind::Equals, b.new_object("Main"), b.int(1))),
        ]),
    ] => ["mismatched types: expected `Int`, found `Main`"];

    equality_of_objects: |b| [
        b.class("Main", "Object", vec![
            b.method("main", vec![], "Bool", b.bin_op(
                BinOpKind::Equals,
                b.new_object("A"),
                b.new_object("Main"),
            )),
        ]),
        b.class("A", "Object", vec![]),
    ] => [];

    static_dispatch_to_ancestor: |b| [
        b.class("A", "Object", vec![b.method("f", vec![], "Int", b.int(1))]),
        b.class("Main", "A", vec![
            b.method("main", vec![], "Int", b.static_call(b.new_object("Main"), "A", "f", vec![])),
        ]),
    ] => [];

    static_dispatch_to_descendant: |b| [
        b.class("A", "Object", vec![b.method("f", vec![], "Int", b.int(1))]),
        b.class("Main", "A", vec![
            b.method("main", vec![], "Int", b.static_call(b.new_object("A"), "Main", "f", vec![])),
        ]),
    ] => ["mismatched types: expected `Main`, found `A`"];

    static_dispatch_to_self_type: |b| [
        b.class("Main", "Object", vec![
            b.method("f", vec![], "Int", b.int(1)),
            b.method("main", vec![], "Object", b.static_call(b.new_object("Main"), "SELF_TYPE", "f", vec![])),
        ]),
    ] => ["`SELF_TYPE` cannot occur in a static dispatch type specifier"];

    static_dispatch_to_undeclared_type: |b| [
        b.class("Main", "Object", vec![
            b.method("main", vec![], "Object", b.static_call(b.new_object("Main"), "Nope", "f", vec![])),
        ]),
    ] => ["the type name `Nope` is not declared"];

    override_with_different_parameter_type: |b| [
        b.class("Main", "Object", vec![]),
        b.class("A", "Object", vec![b.method("f", vec![b.formal("x", "Int")], "Int", b.object("x"))]),
        b.class("B", "A", vec![b.method("f", vec![b.formal("x", "String")], "Int", b.int(1))]),
    ] => ["method `f` overrides the one defined in `A` with a different signature: the type of parameter #1 differs"];

    override_with_different_arity: |b| [
        b.class("Main", "Object", vec![]),
        b.class("A", "Object", vec![b.method("f", vec![b.formal("x", "Int")], "Int", b.object("x"))]),
        b.class("B", "A", vec![b.method("f", vec![], "Int", b.int(1))]),
    ] => ["method `f` overrides the one defined in `A` with a different signature: expected 1 parameter, found 0"];

    override_with_different_return_type: |b| [
        b.class("Main", "Object", vec![]),
        b.class("A", "Object", vec![b.method("f", vec![], "Int", b.int(1))]),
        b.class("B", "A", vec![b.method("f", vec![], "String", b.string("s"))]),
    ] => ["method `f` overrides the one defined in `A` with a different signature: the return type differs"];

    override_with_same_signature: |b| [
        b.class("Main", "Object", vec![]),
        b.class("A", "Object", vec![b.method("f", vec![b.formal("x", "Int")], "Int", b.object("x"))]),
        b.class("B", "A", vec![b.method("f", vec![b.formal("y", "Int")], "Int", b.int(1))]),
    ] => [];

    inherited_attribute_redefined: |b| [
        b.class("Main", "Object", vec![]),
        b.class("A", "Object", vec![b.attribute("a", "Int", None)]),
        b.class("B", "A", vec![b.attribute("a", "String", None)]),
    ] => ["detected multiple definition: attribute `a` is already defined in a superclass"];

    attribute_defined_twice: |b| [
        b.class("Main", "Object", vec![
            b.attribute("a", "Int", None),
            b.attribute("a", "Int", None),
        ]),
    ] => ["detected multiple definition: attribute `a` is already defined"];

    method_defined_twice: |b| [
        b.class("Main", "Object", vec![
            b.method("f", vec![], "Int", b.int(1)),
            b.method("f", vec![], "Int", b.int(2)),
        ]),
    ] => ["detected multiple definition: method `f` is already defined"];

    parameter_defined_twice: |b| [
        b.class("Main", "Object", vec![
            b.method("f", vec![b.formal("x", "Int"), b.formal("x", "Int")], "Int", b.object("x")),
        ]),
    ] => ["detected multiple definition: parameter `x` is already defined"];

    undeclared_types_in_signatures: |b| [
        b.class("Main", "Object", vec![
            b.attribute("a", "Foo", None),
            b.method("f", vec![b.formal("x", "Bar")], "Baz", b.object("x")),
        ]),
    ] => [
        "the type name `Foo` is not declared",
        "the type name `Bar` is not declared",
        "the type name `Baz` is not declared",
    ];

    self_type_parameter: |b| [
        b.class("Main", "Object", vec![
            b.method("f", vec![b.formal("x", "SELF_TYPE")], "Object", b.object("x")),
        ]),
    ] => ["`SELF_TYPE` cannot occur in a method parameter"];

    new_of_undeclared_type: |b| [
        b.class("Main", "Object", vec![
            b.method("main", vec![], "Object", b.new_object("Nope")),
        ]),
    ] => ["the type name `Nope` is not declared"];

    unary_operand_types: |b| [
        b.class("Main", "Object", vec![
            b.method("f", vec![], "Int", b.un_op(UnOpKind::Complement, b.bool(true))),
            b.method("g", vec![], "Bool", b.un_op(UnOpKind::Not, b.int(1))),
            b.method("h", vec![], "Bool", b.un_op(UnOpKind::IsVoid, b.int(1))),
        ]),
    ] => [
        "mismatched types: expected `Int`, found `Bool`",
        "mismatched types: expected `Bool`, found `Int`",
    ];

    assignment_must_conform: |b| [
        b.class("Main", "Object", vec![
            b.attribute("a", "A", None),
            b.method("f", vec![], "Object", b.assign("a", b.new_object("B"))),
            b.method("g", vec![], "Object", b.assign("a", b.int(1))),
            b.method("h", vec![], "Object", b.assign("z", b.int(1))),
        ]),
        b.class("A", "Object", vec![]),
        b.class("B", "A", vec![]),
    ] => [
        "mismatched types: expected `A`, found `Int`",
        "undeclared identifier `z`",
    ];

    attribute_initializer_must_conform: |b| [
        b.class("Main", "Object", vec![
            b.attribute("a", "Int", Some(b.string("s"))),
            b.attribute("b", "Main", Some(b.object("self"))),
        ]),
    ] => ["mismatched types: expected `Int`, found `String`"];

    inherited_attributes_are_visible: |b| [
        b.class("A", "Object", vec![b.attribute("a", "Int", None)]),
        b.class("Main", "A", vec![b.method("main", vec![], "Int", b.object("a"))]),
    ] => [];
}

#[test]
fn entry_method_instantiates_a_descendant() {
    let analyzed = analyze(|b| {
        vec![
            b.class("A", "Object", vec![]),
            b.class("B", "A", vec![]),
            b.class("C", "B", vec![]),
            b.class(
                "Main",
                "A",
                vec![b.method("run", vec![], "Object", b.new_object("C"))],
            ),
        ]
    });

    assert_eq!(analyzed.messages, Vec::<String>::new());
    assert_eq!(analyzed.body_ty("Main", "run"), Some(analyzed.ty("C")));
}

#[test]
fn case_joins_branch_types() {
    let analyzed = analyze(|b| {
        vec![
            b.class("A", "Object", vec![]),
            b.class("B", "A", vec![]),
            b.class(
                "Main",
                "Object",
                vec![b.method(
                    "main",
                    vec![],
                    "Object",
                    b.case(
                        b.new_object("B"),
                        vec![
                            b.arm("y", "A", b.object("y")),
                            b.arm("y", "B", b.object("y")),
                        ],
                    ),
                )],
            ),
        ]
    });

    assert!(analyzed.result.success);
    assert_eq!(analyzed.body_ty("Main", "main"), Some(analyzed.ty("A")));
}

#[test]
fn failed_operand_recovers_with_the_operator_type() {
    let analyzed = analyze(|b| {
        vec![b.class(
            "Main",
            "Object",
            vec![b.method(
                "f",
                vec![],
                "Int",
                b.bin_op(BinOpKind::Add, b.int(1), b.string("x")),
            )],
        )]
    });

    assert_eq!(analyzed.messages.len(), 1);
    assert_eq!(analyzed.body_ty("Main", "f"), Some(analyzed.ty("Int")));
}

#[test]
fn self_type_result_follows_the_receiver() {
    let analyzed = analyze(|b| {
        vec![
            b.class(
                "A",
                "Object",
                vec![b.method("me", vec![], "SELF_TYPE", b.object("self"))],
            ),
            b.class("B", "A", vec![]),
            b.class(
                "Main",
                "A",
                vec![
                    b.method(
                        "dynamic",
                        vec![],
                        "B",
                        b.call(Some(b.new_object("B")), "me", vec![]),
                    ),
                    b.method(
                        "static",
                        vec![],
                        "Main",
                        b.static_call(b.new_object("Main"), "A", "me", vec![]),
                    ),
                    b.method("implicit", vec![], "SELF_TYPE", b.call(None, "me", vec![])),
                    b.method("copied", vec![], "SELF_TYPE", b.call(None, "copy", vec![])),
                ],
            ),
        ]
    });

    assert_eq!(analyzed.messages, Vec::<String>::new());
    assert_eq!(analyzed.body_ty("A", "me"), Some(Ty::SelfType));
    assert_eq!(analyzed.body_ty("Main", "dynamic"), Some(analyzed.ty("B")));
    assert_eq!(analyzed.body_ty("Main", "static"), Some(analyzed.ty("Main")));
    assert_eq!(analyzed.body_ty("Main", "implicit"), Some(Ty::SelfType));
    assert_eq!(analyzed.body_ty("Main", "copied"), Some(Ty::SelfType));
}

#[test]
fn io_methods_return_self_type() {
    let analyzed = analyze(|b| {
        vec![b.class(
            "Main",
            "IO",
            vec![b.method(
                "main",
                vec![],
                "Main",
                b.call(
                    Some(b.call(None, "out_string", vec![b.string("hello")])),
                    "out_int",
                    vec![b.int(42)],
                ),
            )],
        )]
    });

    assert_eq!(analyzed.messages, Vec::<String>::new());
    assert_eq!(analyzed.body_ty("Main", "main"), Some(Ty::SelfType));
}

#[test]
fn new_self_type_is_the_current_class() {
    let analyzed = analyze(|b| {
        vec![b.class(
            "Main",
            "Object",
            vec![b.method("main", vec![], "Main", b.new_object("SELF_TYPE"))],
        )]
    });

    assert!(analyzed.result.success);
    assert_eq!(analyzed.body_ty("Main", "main"), Some(analyzed.ty("Main")));
}

#[test]
fn conditional_joins_branches() {
    let analyzed = analyze(|b| {
        vec![
            b.class("A", "Object", vec![]),
            b.class("B", "A", vec![]),
            b.class("C", "A", vec![]),
            b.class(
                "Main",
                "Object",
                vec![
                    b.method(
                        "related",
                        vec![],
                        "A",
                        b.if_(b.bool(true), b.new_object("B"), b.new_object("C")),
                    ),
                    b.method(
                        "unrelated",
                        vec![],
                        "Object",
                        b.if_(b.bool(false), b.int(1), b.string("s")),
                    ),
                ],
            ),
        ]
    });

    assert!(analyzed.result.success);
    assert_eq!(analyzed.body_ty("Main", "related"), Some(analyzed.ty("A")));
    assert_eq!(analyzed.body_ty("Main", "unrelated"), Some(analyzed.ty("Object")));
}

#[test]
fn inner_bindings_shadow_outer_ones() {
    let analyzed = analyze(|b| {
        vec![b.class(
            "Main",
            "Object",
            vec![
                b.attribute("x", "Int", None),
                b.method(
                    "param",
                    vec![b.formal("x", "String")],
                    "String",
                    b.object("x"),
                ),
                b.method(
                    "local",
                    vec![],
                    "Int",
                    b.block(vec![
                        b.let_("x", "String", Some(b.string("s")), b.object("x")),
                        b.object("x"),
                    ]),
                ),
                b.method(
                    "nested",
                    vec![],
                    "Bool",
                    b.let_(
                        "x",
                        "String",
                        None,
                        b.let_("x", "Bool", None, b.object("x")),
                    ),
                ),
            ],
        )]
    });

    assert_eq!(analyzed.messages, Vec::<String>::new());
    assert_eq!(analyzed.body_ty("Main", "param"), Some(analyzed.ty("String")));
    assert_eq!(analyzed.body_ty("Main", "local"), Some(analyzed.ty("Int")));
    assert_eq!(analyzed.body_ty("Main", "nested"), Some(analyzed.ty("Bool")));
}

#[test]
fn expression_types() {
    let analyzed = analyze(|b| {
        vec![b.class(
            "Main",
            "Object",
            vec![
                b.method("lt", vec![], "Bool", b.bin_op(BinOpKind::LessThan, b.int(1), b.int(2))),
                b.method("mul", vec![], "Int", b.bin_op(BinOpKind::Multiply, b.int(1), b.int(2))),
                b.method("loop", vec![], "Object", b.while_(b.bool(false), b.int(1))),
                b.method("isvoid", vec![], "Bool", b.un_op(UnOpKind::IsVoid, b.new_object("Main"))),
                b.method("seq", vec![], "String", b.block(vec![b.int(1), b.string("s")])),
                b.method("assign", vec![b.formal("x", "Object")], "Object", b.assign("x", b.int(1))),
                b.method("this", vec![], "SELF_TYPE", b.object("self")),
            ],
        )]
    });

    assert_eq!(analyzed.messages, Vec::<String>::new());

    for (method, ty) in [
        ("lt", analyzed.ty("Bool")),
        ("mul", analyzed.ty("Int")),
        ("loop", analyzed.ty("Object")),
        ("isvoid", analyzed.ty("Bool")),
        ("seq", analyzed.ty("String")),
        ("assign", analyzed.ty("Int")),
        ("this", Ty::SelfType),
    ] {
        assert_eq!(analyzed.body_ty("Main", method), Some(ty), "{}", method);
    }
}

#[test]
fn every_expression_is_annotated() {
    #[derive(Default)]
    struct Unannotated(usize);

    impl DefaultVisitor for Unannotated {
        fn visit_expr(&mut self, expr: &Expr) {
            if expr.ty().is_none() {
                self.0 += 1;
            }

            expr.recurse(self);
        }
    }

    let analyzed = analyze(|b| {
        vec![
            b.class("A", "IO", vec![b.attribute("a", "Int", Some(b.int(0)))]),
            b.class(
                "Main",
                "A",
                vec![
                    b.attribute("s", "String", Some(b.string("s"))),
                    b.method(
                        "main",
                        vec![b.formal("p", "Int")],
                        "Object",
                        b.block(vec![
                            b.assign("a", b.bin_op(BinOpKind::Subtract, b.object("p"), b.int(1))),
                            b.if_(
                                b.bin_op(BinOpKind::LessEquals, b.object("a"), b.int(2)),
                                b.call(None, "out_int", vec![b.object("a")]),
                                b.static_call(b.new_object("Main"), "IO", "out_string", vec![b.object("s")]),
                            ),
                            b.while_(
                                b.un_op(UnOpKind::Not, b.bool(true)),
                                b.un_op(UnOpKind::Complement, b.object("p")),
                            ),
                            b.let_(
                                "x",
                                "Int",
                                Some(b.bin_op(BinOpKind::Divide, b.int(6), b.int(3))),
                                b.case(
                                    b.object("x"),
                                    vec![
                                        b.arm("i", "Int", b.object("i")),
                                        b.arm("o", "Object", b.object("undeclared")),
                                    ],
                                ),
                            ),
                            b.call(Some(b.object("s")), "nope", vec![b.string("arg")]),
                        ]),
                    ),
                ],
            ),
        ]
    });

    assert_eq!(
        analyzed.messages,
        [
            "undeclared identifier `undeclared`",
            "class `String` does not have a method named `nope`",
        ]
    );

    let mut unannotated = Unannotated::default();
    unannotated.visit_program(&analyzed.program);

    assert_eq!(unannotated.0, 0);
}

#[test]
fn dump_annotated_tree() {
    let analyzed = analyze(|b| {
        vec![b.class(
            "Main",
            "IO",
            vec![
                b.attribute("x", "Int", Some(b.bin_op(BinOpKind::Add, b.int(1), b.int(2)))),
                b.method(
                    "main",
                    vec![],
                    "SELF_TYPE",
                    b.call(None, "out_string", vec![b.string("hi")]),
                ),
            ],
        )]
    });

    assert!(analyzed.result.success);
    assert_snapshot!(analyzed.dump().trim_end(), @r###"
-class (Main inherits IO)
 -attribute (x: Int)
  -plus : Int
   -int_const (1) : Int
   -int_const (2) : Int
 -method (main: SELF_TYPE)
  -dynamic_dispatch (out_string) : SELF_TYPE
   -self : SELF_TYPE
   -str_const ("hi") : String"###);
}
