#![no_main]

use libfuzzer_sys::fuzz_target;

use coolck::analysis;
use coolck::ast::CompilationUnit;
use coolck::errors::Diagnostics;

fuzz_target!(|text: &str| {
    let Ok(unit) = ron::from_str::<CompilationUnit>(text) else { return };
    let CompilationUnit {
        mut symbols,
        mut program,
    } = unit;

    let mut diagnostics = Diagnostics::new();

    if analysis::check_symbols(&mut diagnostics, &symbols, &program) {
        analysis::analyze(&mut diagnostics, &mut symbols, &mut program);
    }
});
