mod builtin;
pub mod error;
pub mod hierarchy;
pub mod inheritance;
pub mod symbols;
mod typeck;
pub mod typectx;

use tracing::{debug, info};

use crate::ast::Program;
use crate::errors::Diagnostics;
use crate::intern::SymbolTables;

pub use builtin::install_builtin_classes;
pub use error::TypeckError;
pub use hierarchy::ClassHierarchy;
pub use inheritance::{validate_inheritance, InheritanceGraph};
pub use symbols::check_symbols;
pub use typeck::TypeChecker;
pub use typectx::TypeCtx;

/// How far the analysis should proceed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum Stage {
    /// Stop after the inheritance graph has been validated.
    Inheritance,
    #[default]
    Typeck,
}

#[derive(Debug, Clone)]
pub struct AnalysisResult {
    /// `true` if no errors were reported during the analysis.
    pub success: bool,
    pub graph: InheritanceGraph,
    /// The method and attribute tables. Absent if the inheritance graph was invalid
    /// or the analysis stopped before type checking.
    pub ctx: Option<TypeCtx>,
}

/// Runs the semantic analysis of `program` up to the type checking stage.
///
/// See [`analyze_until`].
pub fn analyze(
    diagnostics: &mut Diagnostics<'_>,
    tables: &mut SymbolTables,
    program: &mut Program,
) -> AnalysisResult {
    analyze_until(diagnostics, tables, program, Stage::Typeck)
}

/// Installs the built-in classes, validates the inheritance graph, and, if it's well-formed,
/// type-checks every class, annotating each expression with its static type.
///
/// Type checking is skipped if the graph is invalid.
pub fn analyze_until(
    diagnostics: &mut Diagnostics<'_>,
    tables: &mut SymbolTables,
    program: &mut Program,
    stage: Stage,
) -> AnalysisResult {
    let initial_error_count = diagnostics.error_count();

    install_builtin_classes(tables, program);
    let tables = &*tables;

    let (graph, graph_valid) = validate_inheritance(diagnostics, tables, &program.classes);

    let ctx = if graph_valid && stage >= Stage::Typeck {
        let hierarchy = ClassHierarchy::new(&graph, tables.well_known());
        let ctx = TypeCtx::build(diagnostics, tables, &hierarchy, &program.classes);
        TypeChecker::new(diagnostics, tables, &hierarchy, &ctx).check(program);

        Some(ctx)
    } else {
        if !graph_valid {
            info!("the inheritance graph is invalid; skipping type checking");
        }

        None
    };

    let success = diagnostics.error_count() == initial_error_count;
    debug!(
        success,
        errors = diagnostics.error_count() - initial_error_count,
        "finished the semantic analysis"
    );

    AnalysisResult {
        success,
        graph,
        ctx,
    }
}
