//! Reports keys with more than one binding visible from the same component.

use std::collections::BTreeSet;

use indexmap::IndexMap;
use tracing::trace;

use super::BindingGraphPlugin;
use crate::diagnostics::format::write_declarations;
use crate::diagnostics::writer::MessageWriter;
use crate::diagnostics::{DiagnosticReporter, Severity};
use crate::error::ValidationError;
use crate::model::{Binding, BindingGraph, BindingKind, ComponentPath, Key, SourceElement, TypeName};
use crate::options::{
    EXPERIMENTAL_ERROR_MESSAGES, EXPLICIT_BINDING_CONFLICTS_WITH_INJECT, ValidationOptions, ValidationType,
};

/// Identity of a binding's declaration, independent of the component that
/// owns it. Copies of one declaration resolved in several components share it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
struct BindingElement<'a> {
    kind: BindingKind,
    element: Option<&'a SourceElement>,
    contributing_module: Option<&'a TypeName>,
}

impl<'a> From<&'a Binding> for BindingElement<'a> {
    fn from(binding: &'a Binding) -> Self {
        BindingElement {
            kind: binding.kind,
            element: binding.binding_element.as_ref(),
            contributing_module: binding.contributing_module.as_ref(),
        }
    }
}

pub struct DuplicateBindingsValidator {
    experimental_messages: bool,
    explicit_conflicts_with_inject: ValidationType,
}

impl Default for DuplicateBindingsValidator {
    fn default() -> Self {
        let options = ValidationOptions::default();
        DuplicateBindingsValidator {
            experimental_messages: options.experimental_dagger_error_messages,
            explicit_conflicts_with_inject: options.explicit_binding_conflicts_with_inject,
        }
    }
}

impl BindingGraphPlugin for DuplicateBindingsValidator {
    fn plugin_name(&self) -> &str {
        "Dagger/DuplicateBindings"
    }

    fn supported_options(&self) -> BTreeSet<String> {
        [EXPERIMENTAL_ERROR_MESSAGES, EXPLICIT_BINDING_CONFLICTS_WITH_INJECT]
            .into_iter()
            .map(String::from)
            .collect()
    }

    fn init(&mut self, options: &ValidationOptions) {
        self.experimental_messages = options.experimental_dagger_error_messages;
        self.explicit_conflicts_with_inject = options.explicit_binding_conflicts_with_inject;
    }

    fn visit_graph(
        &self,
        graph: &BindingGraph,
        reporter: &mut dyn DiagnosticReporter,
    ) -> Result<(), ValidationError> {
        let mut reported: BTreeSet<BTreeSet<BindingElement<'_>>> = BTreeSet::new();

        for (key, bindings) in bindings_by_key(graph) {
            for subset in mutually_visible_subsets(&bindings) {
                let mut by_element: IndexMap<BindingElement<'_>, Vec<&Binding>> = IndexMap::new();
                for &binding in &subset {
                    by_element.entry(BindingElement::from(binding)).or_default().push(binding);
                }
                if by_element.len() <= 1 {
                    continue;
                }
                if !reported.insert(by_element.keys().copied().collect()) {
                    trace!(%key, "duplicate binding set already reported");
                    continue;
                }

                if explicit_binding_conflicts_with_inject(&by_element) {
                    if let Some(severity) = self.explicit_conflicts_with_inject.severity() {
                        self.report_explicit_conflict(graph, key, &subset, severity, reporter)?;
                    }
                    continue;
                }
                self.report_duplicates(graph, key, &by_element, reporter)?;
            }
        }
        Ok(())
    }
}

impl DuplicateBindingsValidator {
    fn report_duplicates(
        &self,
        graph: &BindingGraph,
        key: &Key,
        by_element: &IndexMap<BindingElement<'_>, Vec<&Binding>>,
        reporter: &mut dyn DiagnosticReporter,
    ) -> Result<(), ValidationError> {
        // One declaration per element; the rootmost copy is the one written in source.
        let declarations: Vec<&Binding> = by_element
            .values()
            .filter_map(|copies| rootmost(copies.iter().copied()))
            .collect();
        let message = duplicate_message(key, &declarations);

        if self.experimental_messages {
            return reporter.report_component(Severity::Error, graph.root_component_node(), &message);
        }
        match declarations.first() {
            Some(binding) => reporter.report_binding(Severity::Error, binding, &message),
            None => Ok(()),
        }
    }

    fn report_explicit_conflict(
        &self,
        graph: &BindingGraph,
        key: &Key,
        bindings: &[&Binding],
        severity: Severity,
        reporter: &mut dyn DiagnosticReporter,
    ) -> Result<(), ValidationError> {
        let inject = rootmost(bindings.iter().copied().filter(|b| b.kind == BindingKind::Injection));
        let explicit = rootmost(bindings.iter().copied().filter(|b| b.kind != BindingKind::Injection));
        let (Some(inject), Some(explicit)) = (inject, explicit) else {
            return Ok(());
        };

        let mut writer = MessageWriter::new(format!("{key} is bound multiple times:"));
        writer.indent();
        write_declarations(&mut writer, [inject, explicit]);
        writer.dedent();
        writer.line("This condition was never validated before, and will soon be an error.");
        let message = writer.finish();

        if self.experimental_messages {
            reporter.report_component(severity, graph.root_component_node(), &message)
        } else {
            reporter.report_binding(severity, explicit, &message)
        }
    }
}

/// Bindings grouped by key, skipping members-injection bindings.
fn bindings_by_key(graph: &BindingGraph) -> IndexMap<&Key, Vec<&Binding>> {
    let mut grouped: IndexMap<&Key, Vec<&Binding>> = IndexMap::new();
    for binding in graph.bindings() {
        if binding.kind == BindingKind::MembersInjection {
            continue;
        }
        grouped.entry(&binding.key).or_default().push(binding);
    }
    grouped
}

/// For every component owning one of `bindings`, the bindings visible there:
/// those owned by the component itself or by one of its ancestors.
fn mutually_visible_subsets<'a>(bindings: &[&'a Binding]) -> Vec<Vec<&'a Binding>> {
    let mut paths: Vec<&ComponentPath> = Vec::new();
    for binding in bindings {
        if !paths.contains(&&binding.component_path) {
            paths.push(&binding.component_path);
        }
    }

    let mut subsets: Vec<Vec<&'a Binding>> = Vec::new();
    for path in paths {
        let subset: Vec<&'a Binding> = bindings
            .iter()
            .copied()
            .filter(|b| &b.component_path == path || b.component_path.is_ancestor_of(path))
            .collect();
        let seen = subsets.iter().any(|s| {
            s.len() == subset.len() && s.iter().zip(&subset).all(|(a, b)| std::ptr::eq(*a, *b))
        });
        if !seen {
            subsets.push(subset);
        }
    }
    subsets
}

/// Exactly one `@Inject` declaration conflicting with explicit bindings.
fn explicit_binding_conflicts_with_inject(by_element: &IndexMap<BindingElement<'_>, Vec<&Binding>>) -> bool {
    let injections = by_element
        .keys()
        .filter(|e| e.kind == BindingKind::Injection)
        .count();
    injections == 1 && by_element.len() > injections
}

fn rootmost<'a>(bindings: impl Iterator<Item = &'a Binding>) -> Option<&'a Binding> {
    bindings.min_by_key(|b| b.component_path.depth())
}

fn duplicate_message(key: &Key, declarations: &[&Binding]) -> String {
    let (multibindings, unique): (Vec<&Binding>, Vec<&Binding>) =
        declarations.iter().copied().partition(|b| b.kind.is_multibinding());

    if multibindings.is_empty() {
        let mut writer = MessageWriter::new(format!("{key} is bound multiple times:"));
        writer.indent();
        write_declarations(&mut writer, unique);
        return writer.finish();
    }

    let collection = if multibindings.iter().any(|b| b.kind == BindingKind::MultiboundMap) {
        "Map"
    } else {
        "Set"
    };
    let mut writer = MessageWriter::new(format!("{key} has incompatible bindings or declarations:"));
    writer.indent();
    writer.line(&format!("{collection} bindings and declarations:"));
    writer.indent();
    write_declarations(&mut writer, multibindings);
    writer.dedent();
    writer.line("Unique bindings and declarations:");
    writer.indent();
    write_declarations(&mut writer, unique);
    writer.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ty(s: &str) -> TypeName {
        s.parse().unwrap()
    }

    fn path(components: &[&str]) -> ComponentPath {
        ComponentPath::new(components.iter().map(|c| ty(c)).collect()).unwrap()
    }

    fn provision(method: &str, at: &[&str]) -> Binding {
        Binding::new(Key::new(ty("Foo")), BindingKind::Provision, path(at))
            .with_element(SourceElement::method(ty("M"), method, vec![]))
            .with_module(ty("M"))
    }

    #[test]
    fn copies_share_an_element() {
        let root = provision("foo", &["Root"]);
        let copy = provision("foo", &["Root", "Child"]);
        assert_eq!(BindingElement::from(&root), BindingElement::from(&copy));
        assert_ne!(
            BindingElement::from(&root),
            BindingElement::from(&provision("otherFoo", &["Root"]))
        );
    }

    #[test]
    fn subsets_follow_ancestry() {
        let root = provision("a", &["Root"]);
        let left = provision("b", &["Root", "Left"]);
        let right = provision("c", &["Root", "Right"]);
        let bindings = vec![&root, &left, &right];
        let subsets = mutually_visible_subsets(&bindings);
        assert_eq!(subsets.len(), 3);
        assert_eq!(subsets[0].len(), 1);
        assert_eq!(subsets[1].len(), 2);
        assert_eq!(subsets[2].len(), 2);
        assert!(subsets[2].iter().all(|b| !std::ptr::eq(*b, &left)));
    }

    #[test]
    fn multibinding_conflicts_are_split_into_sections() {
        let unique = provision("foo", &["Root"]);
        let set = Binding::new(Key::new(ty("Foo")), BindingKind::MultiboundSet, path(&["Root"]));
        let message = duplicate_message(&Key::new(ty("Foo")), &[&unique, &set]);
        assert_eq!(
            message,
            "Foo has incompatible bindings or declarations:\n    Set bindings and declarations:\n        Foo (multibound set)\n    Unique bindings and declarations:\n        @Provides M.foo()"
        );
    }
}
