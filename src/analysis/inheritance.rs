use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use tracing::{debug, trace};

use crate::analysis::error::{IllegalSelfTypePosition, TypeckError};
use crate::ast::ty::BuiltinClass;
use crate::ast::Class;
use crate::errors::Diagnostics;
use crate::intern::{Symbol, SymbolTables};
use crate::position::{HasSpan, Span};

/// The validated `class → parent` relation.
///
/// The root class has no entry, as does every class that failed validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InheritanceGraph {
    parents: IndexMap<Symbol, Symbol>,
}

impl InheritanceGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_edge(&mut self, class: Symbol, parent: Symbol) {
        self.parents.insert(class, parent);
    }

    pub fn parent(&self, class: Symbol) -> Option<Symbol> {
        self.parents.get(&class).copied()
    }

    pub fn has_edge(&self, class: Symbol) -> bool {
        self.parents.contains_key(&class)
    }

    /// Iterates over the edges in the order the classes were declared.
    pub fn iter(&self) -> impl Iterator<Item = (Symbol, Symbol)> + '_ {
        self.parents.iter().map(|(&class, &parent)| (class, parent))
    }

    pub fn len(&self) -> usize {
        self.parents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parents.is_empty()
    }
}

struct Validator<'a, 'emt> {
    diagnostics: &'a mut Diagnostics<'emt>,
    tables: &'a SymbolTables,
    graph: InheritanceGraph,
    /// Where each class name was first defined.
    defined: HashMap<Symbol, Span>,
    success: bool,
}

impl<'a, 'emt> Validator<'a, 'emt> {
    fn new(diagnostics: &'a mut Diagnostics<'emt>, tables: &'a SymbolTables) -> Self {
        Self {
            diagnostics,
            tables,
            graph: InheritanceGraph::new(),
            defined: HashMap::new(),
            success: true,
        }
    }

    fn report(&mut self, error: TypeckError) {
        self.success = false;
        self.diagnostics.error().with_span_and_error(error).emit();
    }

    fn check_class(&mut self, class: &Class, declared: &HashSet<Symbol>) {
        let well_known = *self.tables.well_known();
        let name = class.name.sym();
        let parent = class.parent.sym();
        let mut valid = true;

        if let Some(builtin) = BuiltinClass::from_name(self.tables.name(parent))
            .filter(|builtin| builtin.is_primitive())
        {
            valid = false;
            self.report(TypeckError::IllegalParent {
                class: self.tables.name(name).to_owned(),
                parent: builtin,
                span: class.parent.span(),
            });
        }

        if self.defined.contains_key(&name) {
            valid = false;

            match BuiltinClass::from_name(self.tables.name(name)) {
                Some(builtin) => self.report(TypeckError::BuiltinRedefined {
                    builtin,
                    span: class.name.span(),
                }),

                None => self.report(TypeckError::MultipleClassDefinition {
                    class: self.tables.name(name).to_owned(),
                    span: class.name.span(),
                }),
            }
        } else {
            self.defined.insert(name, class.name.span());
        }

        if name == well_known.self_type {
            valid = false;
            self.report(TypeckError::IllegalSelfType {
                position: IllegalSelfTypePosition::ClassName,
                span: class.name.span(),
            });
        }

        if name == well_known.object {
            // the root never gets an edge, even if its sentinel parent happens to be declared
            valid = false;
        } else if !declared.contains(&parent) {
            valid = false;
            self.report(TypeckError::UnresolvedParent {
                class: self.tables.name(name).to_owned(),
                parent: self.tables.name(parent).to_owned(),
                span: class.parent.span(),
            });
        }

        if valid {
            trace!(
                class = self.tables.name(name),
                parent = self.tables.name(parent),
                "recording an inheritance edge"
            );
            self.graph.add_edge(name, parent);
        }
    }

    fn check_has_main(&mut self) {
        if !self.defined.contains_key(&self.tables.well_known().main) {
            self.report(TypeckError::NoMainClass);
        }
    }

    fn check_cycles(&mut self) {
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        enum State {
            Visiting,
            Done,
            Cyclic,
        }

        use State::*;

        let root = self.tables.well_known().object;
        let mut states: HashMap<Symbol, State> = HashMap::new();
        let starts = self.graph.iter().map(|(class, _)| class).collect::<Vec<_>>();

        for start in starts {
            let mut path = vec![];
            let mut node = start;

            let outcome = loop {
                if node == root {
                    break Done;
                }

                match states.get(&node) {
                    Some(&Done) => break Done,
                    Some(&Cyclic) => break Cyclic,

                    Some(&Visiting) => {
                        self.report(TypeckError::InheritanceCycle {
                            class: self.tables.name(node).to_owned(),
                            span: self.defined.get(&node).copied().unwrap_or_default(),
                        });

                        break Cyclic;
                    }

                    None => {
                        states.insert(node, Visiting);
                        path.push(node);

                        match self.graph.parent(node) {
                            Some(parent) => node = parent,
                            // the class failed validation and has been reported already
                            None => break Done,
                        }
                    }
                }
            };

            if outcome == Cyclic {
                self.success = false;
            }

            for node in path {
                states.insert(node, outcome);
            }
        }
    }
}

/// Builds the inheritance graph of `classes` and checks that it forms a tree rooted at `Object`.
///
/// Every violation is reported to `diagnostics`.
/// Returns the graph along with a flag that is `true` if no violations were found.
pub fn validate_inheritance(
    diagnostics: &mut Diagnostics<'_>,
    tables: &SymbolTables,
    classes: &[Class],
) -> (InheritanceGraph, bool) {
    let declared = classes
        .iter()
        .map(|class| class.name.sym())
        .collect::<HashSet<_>>();
    let mut validator = Validator::new(diagnostics, tables);

    for class in classes {
        validator.check_class(class, &declared);
    }

    validator.check_has_main();
    validator.check_cycles();

    debug!(
        edges = validator.graph.len(),
        success = validator.success,
        "validated the inheritance graph"
    );

    (validator.graph, validator.success)
}
