use std::path::PathBuf;

use clap::{arg, command, value_parser, ValueEnum};

use coolck::analysis::Stage;
use coolck::ast::dump::DumpFormat;

#[derive(Debug, Clone)]
pub struct CoolckConfig {
    pub paths: Vec<PathBuf>,
    pub stage: Stage,
    /// If set, the (annotated) program is printed to stdout after the analysis.
    pub format: Option<DumpFormat>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum AnalysisStage {
    Inheritance,
    #[default]
    Typeck,
}

impl From<AnalysisStage> for Stage {
    fn from(stage: AnalysisStage) -> Self {
        match stage {
            AnalysisStage::Inheritance => Self::Inheritance,
            AnalysisStage::Typeck => Self::Typeck,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputFormat {
    Tree,
    Debug,
    Ron,
}

impl From<OutputFormat> for DumpFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Tree => Self::Tree,
            OutputFormat::Debug => Self::Debug,
            OutputFormat::Ron => Self::Ron,
        }
    }
}

pub fn parse_args_or_exit() -> CoolckConfig {
    use clap::Command;

    fn command() -> Command {
        command!()
            .arg(
                arg!(files: <FILE> ... "serialized compilation units (RON)")
                    .value_parser(value_parser!(PathBuf))
                    .required(true),
            )
            .arg(
                arg!(-s --stage <STAGE> "the analysis stage to stop after")
                    .value_parser(value_parser!(AnalysisStage))
                    .required(false),
            )
            .arg(
                arg!(-f --format <FORMAT> "print the analyzed program in this format")
                    .value_parser(value_parser!(OutputFormat)),
            )
    }

    let mut command = command();
    let matches = command.get_matches_mut();

    let paths = matches
        .get_many::<PathBuf>("files")
        .expect("files")
        .cloned()
        .collect();

    let stage = matches
        .get_one::<AnalysisStage>("stage")
        .copied()
        .unwrap_or_default()
        .into();
    let format = matches
        .get_one::<OutputFormat>("format")
        .copied()
        .map(Into::into);

    CoolckConfig {
        paths,
        stage,
        format,
    }
}
