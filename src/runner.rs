use std::cell::RefCell;
use std::path::PathBuf;
use std::process::ExitCode;
use std::rc::Rc;

use coolck::errors::Diagnostics;

use self::config::{parse_args_or_exit, CoolckConfig};
use self::errors::print_diagnostic;

pub mod config;
mod errors;
mod passes;

pub enum CompilationControl {
    Continue,
    Stop,
}

pub struct PassOutput<O> {
    pub output: O,
    pub compilation_control: CompilationControl,
}

impl<O> PassOutput<O> {
    pub fn continue_with_output(output: O) -> Self {
        Self {
            output,
            compilation_control: CompilationControl::Continue,
        }
    }
}

impl PassOutput<()> {
    pub fn r#continue() -> Self {
        Self::continue_with_output(())
    }
}

pub struct RunnerCtx<'emt> {
    pub config: CoolckConfig,
    /// The file currently being processed, used to locate diagnostics.
    pub current_path: Rc<RefCell<Option<PathBuf>>>,
    pub diagnostics: Diagnostics<'emt>,
}

impl RunnerCtx<'_> {
    pub fn stop_if_errors<O>(&self, output: O) -> PassOutput<O> {
        PassOutput {
            output,
            compilation_control: if self.diagnostics.has_errors() {
                CompilationControl::Stop
            } else {
                CompilationControl::Continue
            },
        }
    }
}

macro_rules! return_if_stopped {
    ($ctx:expr, $e:expr) => {
        match $e {
            PassOutput {
                compilation_control: CompilationControl::Stop,
                ..
            } => {
                return if $ctx.diagnostics.has_errors() {
                    ExitCode::FAILURE
                } else {
                    ExitCode::SUCCESS
                }
            }

            PassOutput { output, .. } => output,
        }
    };
}

fn run(mut ctx: RunnerCtx<'_>) -> ExitCode {
    let units = return_if_stopped!(ctx, passes::load_units(&mut ctx));
    let units = return_if_stopped!(ctx, passes::check_symbols(&mut ctx, units));

    // semantic analysis
    let units = return_if_stopped!(ctx, passes::analyze_all(&mut ctx, units));
    return_if_stopped!(ctx, passes::dump_if_asked(&mut ctx, &units));

    if ctx.diagnostics.has_errors() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

pub fn prepare_and_run() -> ExitCode {
    let config = parse_args_or_exit();
    let current_path = Rc::new(RefCell::new(None));

    let mut diagnostics = Diagnostics::new();

    diagnostics.set_emitter({
        let current_path = current_path.clone();

        Box::new(move |diagnostic| {
            print_diagnostic(current_path.borrow().as_deref(), diagnostic);
        })
    });

    let ctx = RunnerCtx {
        config,
        current_path,
        diagnostics,
    };

    run(ctx)
}
