//! Extension registry for plugin assessments and content filters.
//!
//! A [`Pluggable`] is shared by `Arc` between the pipeline and whoever
//! registers extensions. Assessors and researchers never hold its lock while
//! analyzing: each run takes a snapshot ([`Pluggable::assessments_for`],
//! [`Pluggable::filters`]), so registrations made during a run take effect
//! from the next one.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};

use crate::assessment::{Assessment, AssessmentRule};
use crate::assessor::AssessorKind;
use crate::error::{FilterError, PluggableError};

/// Points in the pipeline where content filters run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterHook {
    /// The body text, before it is parsed.
    Content,
    /// The SEO title.
    Title,
    /// The meta description.
    MetaDescription,
}

impl fmt::Display for FilterHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Content => "content",
            Self::Title => "title",
            Self::MetaDescription => "metaDescription",
        })
    }
}

type FilterFn = Arc<dyn Fn(&str) -> Result<String, FilterError> + Send + Sync>;

#[derive(Clone)]
struct RegisteredFilter {
    hook: FilterHook,
    plugin: String,
    filter: FilterFn,
}

/// Filters in registration order, detached from the registry.
#[derive(Clone, Default)]
pub struct FilterSet {
    filters: Vec<RegisteredFilter>,
}

impl fmt::Debug for FilterSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.filters.iter().map(|r| (r.hook, r.plugin.as_str())))
            .finish()
    }
}

impl FilterSet {
    /// Whether no filter is registered.
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Run every filter registered for `hook` over `input`, in order.
    ///
    /// A filter that errors or panics is skipped and the text it received
    /// goes on unchanged. Returns `None` when no filter produced output.
    pub fn apply(&self, hook: FilterHook, input: &str) -> Option<String> {
        let mut current: Option<String> = None;
        for registered in self.filters.iter().filter(|r| r.hook == hook) {
            let text = current.as_deref().unwrap_or(input);
            match catch_unwind(AssertUnwindSafe(|| (registered.filter)(text))) {
                Ok(Ok(output)) => current = Some(output),
                Ok(Err(error)) => tracing::warn!(
                    %hook,
                    plugin = %registered.plugin,
                    %error,
                    "filter failed, passing content through"
                ),
                Err(_) => tracing::warn!(
                    %hook,
                    plugin = %registered.plugin,
                    "filter panicked, passing content through"
                ),
            }
        }
        current
    }
}

/// A registered plugin and whether it declared itself ready.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PluginStatus {
    /// Plugin name.
    pub name: String,
    /// Set by [`Pluggable::plugin_ready`].
    pub ready: bool,
}

#[derive(Debug, Clone)]
struct RegisteredAssessment {
    plugin: String,
    assessment: Assessment,
}

#[derive(Default)]
struct State {
    plugins: BTreeMap<String, bool>,
    assessments: HashMap<AssessorKind, Vec<RegisteredAssessment>>,
    filters: Vec<RegisteredFilter>,
}

impl State {
    fn require_plugin(&self, plugin: &str) -> Result<(), PluggableError> {
        if self.plugins.contains_key(plugin) {
            Ok(())
        } else {
            Err(PluggableError::UnknownPlugin(plugin.to_string()))
        }
    }
}

/// Registry of plugins and the assessments and filters they contribute.
#[derive(Default)]
pub struct Pluggable {
    state: RwLock<State>,
}

impl fmt::Debug for Pluggable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.read();
        f.debug_struct("Pluggable")
            .field("plugins", &state.plugins)
            .field(
                "assessments",
                &state.assessments.values().map(Vec::len).sum::<usize>(),
            )
            .field("filters", &state.filters.len())
            .finish()
    }
}

impl Pluggable {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    // A panic while holding the lock cannot leave the state half-written,
    // so a poisoned lock is still usable.
    fn read(&self) -> RwLockReadGuard<'_, State> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, State> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a plugin by name.
    pub fn register_plugin(&self, name: &str) -> Result<(), PluggableError> {
        let mut state = self.write();
        if state.plugins.contains_key(name) {
            return Err(PluggableError::DuplicatePlugin(name.to_string()));
        }
        state.plugins.insert(name.to_string(), false);
        tracing::debug!(plugin = name, "plugin registered");
        Ok(())
    }

    /// Mark a registered plugin as ready.
    pub fn plugin_ready(&self, name: &str) -> Result<(), PluggableError> {
        let mut state = self.write();
        let ready = state
            .plugins
            .get_mut(name)
            .ok_or_else(|| PluggableError::UnknownPlugin(name.to_string()))?;
        *ready = true;
        tracing::debug!(plugin = name, "plugin ready");
        Ok(())
    }

    /// Registered plugins, sorted by name.
    pub fn plugins(&self) -> Vec<PluginStatus> {
        self.read()
            .plugins
            .iter()
            .map(|(name, ready)| PluginStatus {
                name: name.clone(),
                ready: *ready,
            })
            .collect()
    }

    /// Unregister a plugin together with its assessments and filters.
    ///
    /// Returns whether the plugin was registered.
    pub fn remove_plugin(&self, name: &str) -> bool {
        let mut state = self.write();
        if state.plugins.remove(name).is_none() {
            return false;
        }
        for list in state.assessments.values_mut() {
            list.retain(|r| r.plugin != name);
        }
        state.filters.retain(|r| r.plugin != name);
        tracing::debug!(plugin = name, "plugin removed");
        true
    }

    /// Add an assessment to every future run of the `assessor` profile.
    pub fn register_assessment(
        &self,
        assessor: AssessorKind,
        assessment: Assessment,
        plugin: &str,
    ) -> Result<(), PluggableError> {
        let mut state = self.write();
        state.require_plugin(plugin)?;
        let list = state.assessments.entry(assessor).or_default();
        let identifier = assessment.identifier();
        if list.iter().any(|r| r.assessment.identifier() == identifier) {
            return Err(PluggableError::DuplicateAssessment {
                assessor,
                identifier: identifier.to_string(),
            });
        }
        tracing::debug!(%assessor, identifier, plugin, "assessment registered");
        list.push(RegisteredAssessment {
            plugin: plugin.to_string(),
            assessment,
        });
        Ok(())
    }

    /// Remove a plugin's assessment. Does nothing when it is not registered.
    ///
    /// Returns whether an assessment was removed.
    pub fn remove_assessment(
        &self,
        assessor: AssessorKind,
        identifier: &str,
        plugin: &str,
    ) -> bool {
        let mut state = self.write();
        let Some(list) = state.assessments.get_mut(&assessor) else {
            return false;
        };
        let before = list.len();
        list.retain(|r| !(r.plugin == plugin && r.assessment.identifier() == identifier));
        before != list.len()
    }

    /// Snapshot of the plugin assessments for one profile, in registration order.
    pub fn assessments_for(&self, assessor: AssessorKind) -> Vec<Assessment> {
        self.read()
            .assessments
            .get(&assessor)
            .map(|list| list.iter().map(|r| r.assessment.clone()).collect())
            .unwrap_or_default()
    }

    /// Add a filter that runs after those already registered for `hook`.
    pub fn register_filter<F>(
        &self,
        hook: FilterHook,
        plugin: &str,
        filter: F,
    ) -> Result<(), PluggableError>
    where
        F: Fn(&str) -> Result<String, FilterError> + Send + Sync + 'static,
    {
        let mut state = self.write();
        state.require_plugin(plugin)?;
        state.filters.push(RegisteredFilter {
            hook,
            plugin: plugin.to_string(),
            filter: Arc::new(filter),
        });
        tracing::debug!(%hook, plugin, "filter registered");
        Ok(())
    }

    /// Remove a plugin's filters for one hook.
    pub fn remove_filters(&self, hook: FilterHook, plugin: &str) {
        self.write()
            .filters
            .retain(|r| !(r.hook == hook && r.plugin == plugin));
    }

    /// Snapshot of every registered filter.
    pub fn filters(&self) -> FilterSet {
        FilterSet {
            filters: self.read().filters.clone(),
        }
    }
}
