use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info_span};

use coolck::analysis;
use coolck::ast::dump::dump_program;
use coolck::ast::CompilationUnit;

use super::{PassOutput, RunnerCtx};

pub struct LoadedUnit {
    pub path: PathBuf,
    pub unit: CompilationUnit,
}

/// Runs `f` with diagnostics attributed to the file at `path`.
fn with_path<'emt, R>(
    ctx: &mut RunnerCtx<'emt>,
    path: &Path,
    f: impl FnOnce(&mut RunnerCtx<'emt>) -> R,
) -> R {
    *ctx.current_path.borrow_mut() = Some(path.to_owned());
    let result = f(ctx);
    *ctx.current_path.borrow_mut() = None;

    result
}

pub fn load_units(ctx: &mut RunnerCtx<'_>) -> PassOutput<Vec<LoadedUnit>> {
    let mut units = Vec::with_capacity(ctx.config.paths.len());

    for path in ctx.config.paths.clone() {
        let _span = info_span!("load", path = %path.display()).entered();

        let text = match fs::read_to_string(&path) {
            Ok(text) => text,

            Err(e) => {
                ctx.diagnostics
                    .error()
                    .with_message(format!("could not load file {}", path.display()))
                    .with_source(Box::new(e))
                    .emit();

                continue;
            }
        };

        match ron::from_str::<CompilationUnit>(&text) {
            Ok(unit) => {
                debug!(classes = unit.program.classes.len(), "loaded a compilation unit");

                units.push(LoadedUnit { path, unit })
            }

            Err(e) => {
                with_path(ctx, &path, |ctx| {
                    ctx.diagnostics
                        .error()
                        .with_message(format!("malformed compilation unit: {}", e))
                        .emit();
                });
            }
        }
    }

    ctx.stop_if_errors(units)
}

/// Makes sure every symbol in the program refers to an existing table entry.
pub fn check_symbols(
    ctx: &mut RunnerCtx<'_>,
    units: Vec<LoadedUnit>,
) -> PassOutput<Vec<LoadedUnit>> {
    for unit in &units {
        with_path(ctx, &unit.path, |ctx| {
            analysis::check_symbols(&mut ctx.diagnostics, &unit.unit.symbols, &unit.unit.program)
        });
    }

    ctx.stop_if_errors(units)
}

pub fn analyze_all(
    ctx: &mut RunnerCtx<'_>,
    mut units: Vec<LoadedUnit>,
) -> PassOutput<Vec<LoadedUnit>> {
    let stage = ctx.config.stage;

    for loaded in &mut units {
        let _span = info_span!("analyze", path = %loaded.path.display()).entered();

        let result = with_path(ctx, &loaded.path, |ctx| {
            let CompilationUnit { symbols, program } = &mut loaded.unit;

            analysis::analyze_until(&mut ctx.diagnostics, symbols, program, stage)
        });

        debug!(
            success = result.success,
            classes = result.graph.len(),
            "analyzed a compilation unit"
        );
    }

    ctx.stop_if_errors(units)
}

pub fn dump_if_asked(ctx: &mut RunnerCtx<'_>, units: &[LoadedUnit]) -> PassOutput<()> {
    let Some(format) = ctx.config.format else {
        return PassOutput::r#continue();
    };

    for loaded in units {
        let CompilationUnit { symbols, program } = &loaded.unit;

        if let Err(e) = dump_program(symbols, program, format, io::stdout().lock()) {
            with_path(ctx, &loaded.path, |ctx| {
                ctx.diagnostics
                    .fatal()
                    .with_message("could not dump the program to stdout".to_owned())
                    .with_source(Box::new(e))
                    .emit();
            });
        }
    }

    ctx.stop_if_errors(())
}
