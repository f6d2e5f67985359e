use std::fmt::Display;
use std::io::{self, Write};

use serde::Serialize;

use crate::intern::SymbolTables;

use super::ty::{HasTy, Ty};
use super::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DumpFormat {
    /// An indented outline with one node per line, annotated with static types if known.
    Tree,
    Debug,
    /// The serialized compilation unit, loadable again.
    Ron,
}

pub fn dump_program(
    tables: &SymbolTables,
    program: &Program,
    format: DumpFormat,
    mut out: impl Write,
) -> io::Result<()> {
    match format {
        DumpFormat::Tree => dump_tree(tables, program, out),
        DumpFormat::Debug => writeln!(out, "{:#?}", program),
        DumpFormat::Ron => dump_ron(tables, program, out),
    }
}

fn dump_ron(tables: &SymbolTables, program: &Program, mut out: impl Write) -> io::Result<()> {
    #[derive(Serialize)]
    struct UnitRef<'a> {
        symbols: &'a SymbolTables,
        program: &'a Program,
    }

    let unit = UnitRef {
        symbols: tables,
        program,
    };
    let text = ron::ser::to_string_pretty(&unit, Default::default())
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;

    writeln!(out, "{}", text)
}

pub fn dump_tree(tables: &SymbolTables, program: &Program, out: impl Write) -> io::Result<()> {
    let mut dumper = TreeDumper {
        tables,
        out,
        level: 0,
    };

    dumper.visit_program(program)
}

struct TreeDumper<'a, W: Write> {
    tables: &'a SymbolTables,
    out: W,
    level: usize,
}

impl<'a, W: Write> TreeDumper<'a, W> {
    fn line(&mut self, label: impl Display, ty: Option<Ty>) -> io::Result<()> {
        write!(self.out, "{:width$}-{}", "", label, width = self.level)?;

        if let Some(ty) = ty {
            write!(self.out, " : {}", ty.display(self.tables))?;
        }

        writeln!(self.out)
    }

    fn with_nested<F>(&mut self, f: F) -> io::Result<()>
    where
        F: FnOnce(&mut Self) -> io::Result<()>,
    {
        self.level += 1;
        let result = f(&mut *self);
        self.level -= 1;

        result
    }

    fn name(&self, name: &Name) -> &'a str {
        self.tables.name(name.sym())
    }
}

impl<W: Write> Visitor for TreeDumper<'_, W> {
    type Output = io::Result<()>;

    fn visit_program(&mut self, program: &Program) -> Self::Output {
        for class in &program.classes {
            self.visit_class(class)?;
        }

        Ok(())
    }

    fn visit_class(&mut self, class: &Class) -> Self::Output {
        self.line(
            format_args!(
                "class ({} inherits {})",
                self.name(&class.name.0),
                self.name(&class.parent.0)
            ),
            None,
        )?;
        self.with_nested(|this| {
            for feature in &class.features {
                this.visit_feature(feature)?;
            }

            Ok(())
        })
    }

    fn visit_feature(&mut self, feature: &Feature) -> Self::Output {
        match feature {
            Feature::Method(method) => self.visit_method(method),
            Feature::Attribute(attr) => self.visit_attribute(attr),
        }
    }

    fn visit_method(&mut self, method: &Method) -> Self::Output {
        self.line(
            format_args!(
                "method ({}: {})",
                self.name(&method.name),
                self.name(&method.return_ty.0)
            ),
            None,
        )?;
        self.with_nested(|this| {
            for param in &method.params {
                this.visit_formal(param)?;
            }

            this.visit_expr(&method.body)
        })
    }

    fn visit_attribute(&mut self, attr: &Attribute) -> Self::Output {
        self.line(
            format_args!(
                "attribute ({}: {})",
                self.name(&attr.0.name),
                self.name(&attr.0.ty_name.0)
            ),
            None,
        )?;
        self.with_nested(|this| this.visit_binding(&attr.0))
    }

    fn visit_expr(&mut self, expr: &Expr) -> Self::Output {
        match expr {
            Expr::Assignment(expr) => self.visit_assignment(expr),
            Expr::Call(expr) => self.visit_call(expr),
            Expr::If(expr) => self.visit_if(expr),
            Expr::While(expr) => self.visit_while(expr),
            Expr::Block(expr) => self.visit_block(expr),
            Expr::Let(expr) => self.visit_let(expr),
            Expr::Case(expr) => self.visit_case(expr),
            Expr::New(expr) => self.visit_new(expr),
            Expr::BinOp(expr) => self.visit_bin_op(expr),
            Expr::UnOp(expr) => self.visit_un_op(expr),
            Expr::Name(expr) => self.visit_name_expr(expr),
            Expr::Int(expr) => self.visit_int_lit(expr),
            Expr::String(expr) => self.visit_string_lit(expr),
            Expr::Bool(expr) => self.visit_bool_lit(expr),
            Expr::NoExpr(expr) => self.visit_no_expr(expr),
        }
    }

    fn visit_assignment(&mut self, expr: &Assignment) -> Self::Output {
        self.line(format_args!("assign ({})", self.name(&expr.name)), expr.ty())?;
        self.with_nested(|this| this.visit_expr(&expr.expr))
    }

    fn visit_call(&mut self, expr: &Call) -> Self::Output {
        let kind = match &expr.receiver {
            Receiver::Static { .. } => "static_dispatch",
            Receiver::Implicit | Receiver::Dynamic(_) => "dynamic_dispatch",
        };

        self.line(
            format_args!("{} ({})", kind, self.name(&expr.method)),
            expr.ty(),
        )?;
        self.with_nested(|this| {
            this.visit_receiver(&expr.receiver)?;

            for arg in &expr.args {
                this.visit_expr(arg)?;
            }

            Ok(())
        })
    }

    fn visit_if(&mut self, expr: &If) -> Self::Output {
        self.line("if", expr.ty())?;
        self.with_nested(|this| {
            this.visit_expr(&expr.antecedent)?;
            this.visit_expr(&expr.consequent)?;
            this.visit_expr(&expr.alternative)
        })
    }

    fn visit_while(&mut self, expr: &While) -> Self::Output {
        self.line("while", expr.ty())?;
        self.with_nested(|this| {
            this.visit_expr(&expr.condition)?;
            this.visit_expr(&expr.body)
        })
    }

    fn visit_block(&mut self, expr: &Block) -> Self::Output {
        self.line("block", expr.ty())?;
        self.with_nested(|this| {
            for expr in &expr.body {
                this.visit_expr(expr)?;
            }

            Ok(())
        })
    }

    fn visit_let(&mut self, expr: &Let) -> Self::Output {
        self.line(
            format_args!(
                "let ({}: {})",
                self.name(&expr.binding.name),
                self.name(&expr.binding.ty_name.0)
            ),
            expr.ty(),
        )?;
        self.with_nested(|this| {
            this.visit_binding(&expr.binding)?;
            this.visit_expr(&expr.expr)
        })
    }

    fn visit_case(&mut self, expr: &Case) -> Self::Output {
        self.line("case", expr.ty())?;
        self.with_nested(|this| {
            this.visit_expr(&expr.scrutinee)?;

            for arm in &expr.arms {
                this.visit_case_arm(arm)?;
            }

            Ok(())
        })
    }

    fn visit_new(&mut self, expr: &New) -> Self::Output {
        self.line(format_args!("new ({})", self.name(&expr.ty_name.0)), expr.ty())
    }

    fn visit_bin_op(&mut self, expr: &BinOpExpr) -> Self::Output {
        let label = match expr.op {
            BinOpKind::Add => "plus",
            BinOpKind::Subtract => "sub",
            BinOpKind::Multiply => "mul",
            BinOpKind::Divide => "div",
            BinOpKind::LessThan => "lt",
            BinOpKind::LessEquals => "lteq",
            BinOpKind::Equals => "eq",
        };

        self.line(label, expr.ty())?;
        self.with_nested(|this| {
            this.visit_expr(&expr.lhs)?;
            this.visit_expr(&expr.rhs)
        })
    }

    fn visit_un_op(&mut self, expr: &UnOpExpr) -> Self::Output {
        let label = match expr.op {
            UnOpKind::IsVoid => "isvoid",
            UnOpKind::Complement => "comp",
            UnOpKind::Not => "not",
        };

        self.line(label, expr.ty())?;
        self.with_nested(|this| this.visit_expr(&expr.expr))
    }

    fn visit_name_expr(&mut self, expr: &NameExpr) -> Self::Output {
        self.line(format_args!("object ({})", self.name(&expr.name)), expr.ty())
    }

    fn visit_formal(&mut self, formal: &Formal) -> Self::Output {
        self.line(
            format_args!(
                "formal ({}: {})",
                self.name(&formal.name),
                self.name(&formal.ty_name.0)
            ),
            None,
        )
    }

    fn visit_receiver(&mut self, recv: &Receiver) -> Self::Output {
        match recv {
            Receiver::Implicit => self.line("self", Some(Ty::SelfType)),
            Receiver::Dynamic(object) => self.visit_expr(object),

            Receiver::Static { object, ty_name } => {
                self.visit_expr(object)?;
                self.visit_ty_name(ty_name)
            }
        }
    }

    fn visit_case_arm(&mut self, arm: &CaseArm) -> Self::Output {
        self.line(
            format_args!(
                "casebranch ({}: {})",
                self.name(&arm.name),
                self.name(&arm.ty_name.0)
            ),
            None,
        )?;
        self.with_nested(|this| this.visit_expr(&arm.expr))
    }

    fn visit_ty_name(&mut self, ty_name: &TyName) -> Self::Output {
        self.line(format_args!("type ({})", self.name(&ty_name.0)), None)
    }

    fn visit_binding(&mut self, binding: &Binding) -> Self::Output {
        match &binding.init {
            Some(init) => self.visit_expr(init),
            None => Ok(()),
        }
    }

    fn visit_name(&mut self, _name: &Name) -> Self::Output {
        Ok(())
    }

    fn visit_int_lit(&mut self, expr: &IntLit) -> Self::Output {
        let value = self.tables.ints.lookup(expr.value);

        self.line(format_args!("int_const ({})", value), expr.ty())
    }

    fn visit_string_lit(&mut self, expr: &StringLit) -> Self::Output {
        let value = self.tables.strings.lookup(expr.value);

        self.line(format_args!("str_const ({:?})", value), expr.ty())
    }

    fn visit_bool_lit(&mut self, expr: &BoolLit) -> Self::Output {
        self.line(format_args!("bool_const ({})", expr.value), expr.ty())
    }

    fn visit_no_expr(&mut self, expr: &NoExpr) -> Self::Output {
        self.line("no_expr", expr.ty())
    }
}
