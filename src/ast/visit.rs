use super::*;

/// Walks the children of a node in source order.
///
/// The symbol range check and the type checker override the node kinds they care about
/// and call `recurse` or `recurse_mut` for the rest.
/// Visitors with a non-unit output, like the tree dumper, walk the children themselves.
pub trait AstRecurse {
    fn recurse<V: Visitor<Output = ()>>(&self, visitor: &mut V);
    fn recurse_mut<V: VisitorMut<Output = ()>>(&mut self, visitor: &mut V);
}

macro_rules! define_visitor {
    ($( $type:ident { $( $name:ident ( $arg:ident : $ty:ty ) );+ $(;)? } )+) => {
        pub trait Visitor
        where
            Self: Sized,
        {
            type Output;

            $(
                $(
                    fn $name(&mut self, $arg: &$ty) -> Self::Output;
                )+
            )+
        }

        pub trait VisitorMut
        where
            Self: Sized,
        {
            type Output;

            $(
                $(
                    fn $name(&mut self, $arg: &mut $ty) -> Self::Output;
                )+
            )+
        }

        /// A [`Visitor`] that recurses into every node it doesn't override.
        pub trait DefaultVisitor
        where
            Self: Sized,
        {
            $( define_visitor!(@ $type { $( $name ( $arg : &$ty ) => recurse; )+ } ); )+
        }

        impl<T> Visitor for T
        where
            T: DefaultVisitor,
        {
            type Output = ();

            $(
                $(
                    fn $name(&mut self, $arg: &$ty) {
                        <Self as DefaultVisitor>::$name(self, $arg);
                    }
                )+
            )+
        }

        pub trait DefaultVisitorMut
        where
            Self: Sized,
        {
            $( define_visitor!(@ $type { $( $name ( $arg : &mut $ty ) => recurse_mut; )+ } ); )+
        }

        impl<T> VisitorMut for T
        where
            T: DefaultVisitorMut,
        {
            type Output = ();

            $(
                $(
                    fn $name(&mut self, $arg: &mut $ty) {
                        <Self as DefaultVisitorMut>::$name(self, $arg);
                    }
                )+
            )+
        }
    };

    (@ NonTerminal { $( $name:ident ( $arg:ident : $ty:ty ) => $recurse:ident; )+ }) => {
        $(
            fn $name(&mut self, $arg: $ty) {
                $arg.$recurse(self);
            }
        )+
    };

    (@ Terminal { $( $name:ident ( $arg:ident : $ty:ty ) => $recurse:ident; )+ }) => {
        $(
            #[allow(unused_variables)]
            fn $name(&mut self, $arg: $ty) {}
        )+
    };
}

define_visitor! {
    NonTerminal {
        // declarations
        visit_program(program: Program);
        visit_class(class: Class);
        visit_feature(feature: Feature);
        visit_method(method: Method);
        visit_attribute(attr: Attribute);

        // expr
        visit_expr(expr: Expr);
        visit_assignment(expr: Assignment);
        visit_call(expr: Call);
        visit_if(expr: If);
        visit_while(expr: While);
        visit_block(expr: Block);
        visit_let(expr: Let);
        visit_case(expr: Case);
        visit_new(expr: New);
        visit_bin_op(expr: BinOpExpr);
        visit_un_op(expr: UnOpExpr);
        visit_name_expr(expr: NameExpr);

        // neither declarations nor expr
        visit_formal(formal: Formal);
        visit_receiver(recv: Receiver);
        visit_case_arm(arm: CaseArm);
        visit_ty_name(ty_name: TyName);
        visit_binding(binding: Binding);
    }

    Terminal {
        visit_name(name: Name);
        visit_int_lit(expr: IntLit);
        visit_string_lit(expr: StringLit);
        visit_bool_lit(expr: BoolLit);
        visit_no_expr(expr: NoExpr);
    }
}
