//! Checks the contributions to map multibindings: one contribution per map
//! key, and one `@MapKey` annotation type per map.

use indexmap::{IndexMap, IndexSet};

use super::BindingGraphPlugin;
use crate::diagnostics::format::write_declarations;
use crate::diagnostics::writer::MessageWriter;
use crate::diagnostics::{DiagnosticReporter, Severity};
use crate::error::ValidationError;
use crate::model::key::{PRODUCER, PROVIDER};
use crate::model::{Binding, BindingGraph, BindingKind, ContributionType, Key, MapKey, TypeName};

pub struct MapMultibindingValidator;

impl BindingGraphPlugin for MapMultibindingValidator {
    fn plugin_name(&self) -> &str {
        "Dagger/MapKeys"
    }

    fn visit_graph(
        &self,
        graph: &BindingGraph,
        reporter: &mut dyn DiagnosticReporter,
    ) -> Result<(), ValidationError> {
        for binding in map_multibindings(graph) {
            let contributions = contributions(graph, binding)?;
            check_for_duplicate_map_keys(binding, &contributions, reporter)?;
            check_for_inconsistent_annotation_types(binding, &contributions, reporter)?;
        }
        Ok(())
    }
}

/// The map multibindings worth checking. `Map<K, V>`, `Map<K, Provider<V>>`
/// and `Map<K, Producer<V>>` share contributions, so only the first present
/// form in that order is kept.
fn map_multibindings(graph: &BindingGraph) -> Vec<&Binding> {
    let mut by_key: IndexMap<&Key, Vec<&Binding>> = IndexMap::new();
    for binding in graph.bindings().filter(|b| b.kind == BindingKind::MultiboundMap) {
        by_key.entry(&binding.key).or_default().push(binding);
    }

    let plain: IndexSet<&Key> = by_key
        .keys()
        .copied()
        .filter(|k| !k.type_name.map_values_are_framework_type())
        .collect();
    let provider: IndexSet<&Key> = by_key
        .keys()
        .copied()
        .filter(|k| k.type_name.map_values_are_type_of(PROVIDER))
        .filter(|k| !k.unwrap_map_value(PROVIDER).is_some_and(|u| plain.contains(&u)))
        .collect();
    let provider_unwrapped: Vec<Key> = provider
        .iter()
        .filter_map(|k| k.unwrap_map_value(PROVIDER))
        .collect();
    let producer: IndexSet<&Key> = by_key
        .keys()
        .copied()
        .filter(|k| k.type_name.map_values_are_type_of(PRODUCER))
        .filter(|k| match k.unwrap_map_value(PRODUCER) {
            Some(unwrapped) => !plain.contains(&unwrapped) && !provider_unwrapped.contains(&unwrapped),
            None => true,
        })
        .collect();

    by_key
        .iter()
        .filter(|(k, _)| plain.contains(*k) || provider.contains(*k) || producer.contains(*k))
        .flat_map(|(_, bindings)| bindings.iter().copied())
        .collect()
}

fn contributions<'g>(graph: &'g BindingGraph, map: &Binding) -> Result<Vec<(&'g MapKey, &'g Binding)>, ValidationError> {
    graph
        .requested_bindings(map)
        .into_iter()
        .filter(|b| b.contribution_type == ContributionType::IntoMap)
        .map(|b| match &b.map_key {
            Some(map_key) => Ok((map_key, b)),
            None => Err(ValidationError::MissingMapKey { key: b.key.to_string() }),
        })
        .collect()
}

fn check_for_duplicate_map_keys(
    map: &Binding,
    contributions: &[(&MapKey, &Binding)],
    reporter: &mut dyn DiagnosticReporter,
) -> Result<(), ValidationError> {
    let mut by_map_key: IndexMap<&MapKey, Vec<&Binding>> = IndexMap::new();
    for &(map_key, binding) in contributions {
        by_map_key.entry(map_key).or_default().push(binding);
    }
    for bindings in by_map_key.values().filter(|bindings| bindings.len() > 1) {
        let mut writer = MessageWriter::new(format!(
            "The same map key is bound more than once for {}",
            map.key
        ));
        writer.indent();
        write_declarations(&mut writer, bindings.iter().copied());
        reporter.report_binding(Severity::Error, map, &writer.finish())?;
    }
    Ok(())
}

fn check_for_inconsistent_annotation_types(
    map: &Binding,
    contributions: &[(&MapKey, &Binding)],
    reporter: &mut dyn DiagnosticReporter,
) -> Result<(), ValidationError> {
    let mut by_annotation: IndexMap<&TypeName, Vec<&Binding>> = IndexMap::new();
    for &(map_key, binding) in contributions {
        by_annotation
            .entry(&map_key.annotation_type)
            .or_default()
            .push(binding);
    }
    if by_annotation.len() <= 1 {
        return Ok(());
    }

    let mut writer = MessageWriter::new(format!("{} uses more than one @MapKey annotation type", map.key));
    writer.indent();
    for (annotation_type, bindings) in &by_annotation {
        writer.line(&format!("{annotation_type}:"));
        writer.indent();
        write_declarations(&mut writer, bindings.iter().copied());
        writer.dedent();
    }
    reporter.report_binding(Severity::Error, map, &writer.finish())
}
