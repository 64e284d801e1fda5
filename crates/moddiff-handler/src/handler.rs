use moddiff_diff::{diff_lists, diff_nodes};
use moddiff_patch::{DescriptorRegistry, DiffPatcher, FieldKind, SchemalessRegistry};
use moddiff_types::{DiffNode, Node};
use tracing::{debug, info};

use crate::config::HandlerConfig;
use crate::error::{HandlerError, HandlerResult};
use crate::printer;
use crate::resource::{Resource, ResourceDiff};
use crate::text_table::{apply_text_table_diff, diff_text_tables, TextEntry, TextTableDiff};

/// High-level moddiff API: diff and patch each resource kind with one
/// registry and configuration.
#[derive(Debug)]
pub struct DiffHandler<R> {
    registry: R,
    config: HandlerConfig,
}

impl DiffHandler<SchemalessRegistry> {
    /// A handler for plain trees with no declared classes.
    pub fn schemaless() -> Self {
        Self::new(SchemalessRegistry)
    }
}

impl<R: DescriptorRegistry> DiffHandler<R> {
    pub fn new(registry: R) -> Self {
        Self::with_config(registry, HandlerConfig::default())
    }

    pub fn with_config(registry: R, config: HandlerConfig) -> Self {
        Self { registry, config }
    }

    pub fn registry(&self) -> &R {
        &self.registry
    }

    pub fn config(&self) -> &HandlerConfig {
        &self.config
    }

    pub fn patcher(&self) -> DiffPatcher<'_, R> {
        DiffPatcher::with_config(&self.registry, self.config.patch.clone())
    }

    // ---- Objects ----

    pub fn diff_object(&self, target: &Node, source: &Node) -> Option<DiffNode> {
        diff_nodes(target, source)
    }

    /// Patch an object tree. `class` is the root's declared type.
    pub fn apply_object(
        &self,
        target: &mut Node,
        diff: &DiffNode,
        class: Option<&str>,
    ) -> HandlerResult<()> {
        self.patcher().apply(target, diff, class)?;
        Ok(())
    }

    // ---- Lists ----

    pub fn diff_list(&self, target: &[Node], source: &[Node]) -> Option<DiffNode> {
        diff_lists(target, source)
    }

    pub fn apply_list(
        &self,
        list: &mut Vec<Node>,
        diff: &DiffNode,
        element: &FieldKind,
    ) -> HandlerResult<()> {
        self.patcher().apply_array_diff(list, diff, element)?;
        Ok(())
    }

    // ---- Text tables ----

    pub fn diff_text_table(&self, target: &[TextEntry], source: &[TextEntry]) -> TextTableDiff {
        diff_text_tables(target, source)
    }

    pub fn apply_text_table(
        &self,
        table: &mut Vec<TextEntry>,
        diff: &TextTableDiff,
    ) -> HandlerResult<()> {
        apply_text_table_diff(table, diff)
    }

    // ---- Resources ----

    /// Diff two resources of the same kind. `None` means no change.
    pub fn diff_resource(
        &self,
        target: &Resource,
        source: &Resource,
    ) -> HandlerResult<Option<ResourceDiff>> {
        let diff = match (target, source) {
            (Resource::Object(t), Resource::Object(s)) => {
                self.diff_object(t, s).map(ResourceDiff::Object)
            }
            (Resource::List(t), Resource::List(s)) => self.diff_list(t, s).map(ResourceDiff::List),
            (Resource::TextTable(t), Resource::TextTable(s)) => {
                let diff = self.diff_text_table(t, s);
                (!diff.is_empty()).then_some(ResourceDiff::TextTable(diff))
            }
            _ => {
                return Err(HandlerError::KindMismatch {
                    expected: target.kind(),
                    found: source.kind(),
                })
            }
        };
        Ok(diff)
    }

    /// Patch a resource in place. Objects and list elements resolve fields
    /// through their own type tags; a replaced root takes the diff's value as
    /// it is, tag included.
    pub fn apply_resource(&self, target: &mut Resource, diff: &ResourceDiff) -> HandlerResult<()> {
        match (target, diff) {
            (Resource::Object(node), ResourceDiff::Object(d)) => self.apply_object(node, d, None),
            (Resource::List(list), ResourceDiff::List(d)) => {
                self.apply_list(list, d, &FieldKind::Dynamic)
            }
            (Resource::TextTable(table), ResourceDiff::TextTable(d)) => {
                self.apply_text_table(table, d)
            }
            (target, diff) => Err(HandlerError::KindMismatch {
                expected: target.kind(),
                found: diff.kind(),
            }),
        }
    }

    /// Apply several bundles' diffs to one baseline, in activation order.
    ///
    /// The baseline is left untouched. On failure the error names the
    /// position of the diff that failed.
    pub fn apply_chain<'a, I>(&self, baseline: &Resource, diffs: I) -> HandlerResult<Resource>
    where
        I: IntoIterator<Item = &'a ResourceDiff>,
    {
        let mut resource = baseline.clone();
        let mut applied = 0;
        for (position, diff) in diffs.into_iter().enumerate() {
            debug!(position, kind = %diff.kind(), "applying chained diff");
            self.apply_resource(&mut resource, diff)
                .map_err(|source| HandlerError::Chain {
                    position,
                    source: Box::new(source),
                })?;
            applied += 1;
        }
        info!(kind = %resource.kind(), applied, "applied diff chain");
        Ok(resource)
    }

    /// Render a resource diff for inspection.
    pub fn render(&self, diff: &ResourceDiff) -> String {
        printer::render_resource(diff)
    }
}
