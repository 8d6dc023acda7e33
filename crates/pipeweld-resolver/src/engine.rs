//! Pipeline configuration resolution.
//!
//! The resolver walks a stream of records depth-first, expanding
//! virtual-pipeline references and template instantiations into one flat
//! document. All per-call state (template registry, visited paths,
//! accumulated statuses) lives in a walk value owned by the call, so
//! concurrent resolutions are independent.

use std::collections::HashSet;
use std::sync::Arc;

use serde_yaml::{Mapping, Value};

use pipeweld_core::record::{
    KIND_FROM_PIPELINE_TEMPLATE, KIND_TEMPLATE_PIPELINE, KIND_VIRTUAL_PIPELINE,
};
use pipeweld_core::{ContentProvider, ProviderError, Record, Repo, StatusEntry, document};

use crate::error::ResolveError;
use crate::template::{Template, TemplateRegistry};

/// Result of a successful resolution.
#[derive(Debug)]
pub struct Resolution {
    /// Flattened records in output order.
    pub records: Vec<Record>,
    /// One entry per expanded pipeline file, in expansion order.
    pub statuses: Vec<StatusEntry>,
}

impl Resolution {
    /// The flattened records encoded as one YAML stream.
    pub fn document(&self) -> Result<String, pipeweld_core::DocumentError> {
        document::encode_stream(&self.records)
    }
}

/// Per-call state for one resolution walk.
struct Walk<'a> {
    repo: &'a Repo,
    commit: &'a str,
    config_file: &'a str,
    registry: TemplateRegistry,
    /// Paths expanded so far; a path may be expanded at most once per call.
    visited: HashSet<String>,
    statuses: Vec<StatusEntry>,
    /// Names of child pipelines expanded at the top level.
    dependencies: Vec<String>,
}

/// Expands virtual pipelines and templates into a flat config document.
pub struct Resolver {
    provider: Arc<dyn ContentProvider>,
    inject_dependencies: bool,
}

impl Resolver {
    pub fn new(provider: Arc<dyn ContentProvider>) -> Self {
        Self {
            provider,
            inject_dependencies: false,
        }
    }

    /// Overwrite `depends_on` on records marked `injectDependencies: true`
    /// with the names of top-level expanded pipelines. Off by default;
    /// kept for configurations predating templates.
    pub fn with_dependency_injection(mut self, enabled: bool) -> Self {
        self.inject_dependencies = enabled;
        self
    }

    /// Resolve a root document belonging to `repo` at `commit`.
    ///
    /// `config_file` is the per-directory file name joined onto each
    /// virtual pipeline path. Returns the flattened records and the
    /// status entries for every expanded file; any failure aborts the
    /// whole call with no partial output.
    pub async fn resolve(
        &self,
        root: &str,
        repo: &Repo,
        commit: &str,
        config_file: &str,
    ) -> Result<Resolution, ResolveError> {
        let records = document::parse_stream(root).map_err(|e| ResolveError::DecodeFailed {
            path: config_file.to_string(),
            message: e.to_string(),
        })?;

        let mut walk = Walk {
            repo,
            commit,
            config_file,
            registry: TemplateRegistry::new(),
            visited: HashSet::new(),
            statuses: Vec::new(),
            dependencies: Vec::new(),
        };

        let mut output = Vec::new();
        for record in records {
            self.dispatch(record, &mut walk, &mut output, 0).await?;
        }

        if self.inject_dependencies {
            apply_dependency_injection(&mut output, &walk.dependencies);
        }

        Ok(Resolution {
            records: output,
            statuses: walk.statuses,
        })
    }

    /// Four-case dispatch on a record's `kind`.
    #[async_recursion::async_recursion]
    async fn dispatch(
        &self,
        record: Record,
        walk: &mut Walk<'_>,
        output: &mut Vec<Record>,
        depth: usize,
    ) -> Result<(), ResolveError> {
        let kind = record.kind().map(str::to_string);
        match kind.as_deref() {
            Some(KIND_VIRTUAL_PIPELINE) => self.expand_virtual(record, walk, output, depth).await,
            Some(KIND_TEMPLATE_PIPELINE) => {
                register_template(&record, walk);
                Ok(())
            }
            Some(KIND_FROM_PIPELINE_TEMPLATE) => instantiate_template(&record, walk, output),
            _ => {
                output.push(record);
                Ok(())
            }
        }
    }

    /// Expand each referenced pipeline in declared order.
    ///
    /// A malformed or missing `pipelines` field drops the whole record:
    /// no output, no status, no error.
    async fn expand_virtual(
        &self,
        record: Record,
        walk: &mut Walk<'_>,
        output: &mut Vec<Record>,
        depth: usize,
    ) -> Result<(), ResolveError> {
        let Some(paths) = record.string_sequence("pipelines") else {
            return Ok(());
        };

        for path in paths {
            if !walk.visited.insert(path.clone()) {
                return Err(ResolveError::CycleDetected(path));
            }

            let file = config_path(&path, walk.config_file);
            let bytes = self
                .provider
                .fetch(walk.repo, &file, walk.commit)
                .await
                .map_err(|e| fetch_error(&file, e))?;
            let text =
                String::from_utf8(bytes.to_vec()).map_err(|e| ResolveError::DecodeFailed {
                    path: file.clone(),
                    message: e.to_string(),
                })?;
            let child = document::parse_single(&text).map_err(|e| ResolveError::DecodeFailed {
                path: file.clone(),
                message: e.to_string(),
            })?;

            walk.statuses
                .push(StatusEntry::success(walk.repo, walk.commit, &file));
            if depth == 0 {
                if let Some(name) = child.str_field("name") {
                    walk.dependencies.push(name.to_string());
                }
            }

            self.dispatch(child, walk, output, depth + 1).await?;
        }

        Ok(())
    }
}

/// Repo-relative path of the config file inside a pipeline directory.
fn config_path(dir: &str, file: &str) -> String {
    format!("{}/{}", dir.trim_end_matches('/'), file)
}

fn fetch_error(path: &str, err: ProviderError) -> ResolveError {
    if matches!(err, ProviderError::Credential(_)) {
        ResolveError::CredentialFailed(err)
    } else {
        ResolveError::FetchFailed {
            path: path.to_string(),
            source: err,
        }
    }
}

/// Register a template definition; emits nothing.
///
/// Definitions with a non-string `name` or `template` are dropped,
/// matching the lenient handling of malformed virtual pipelines.
fn register_template(record: &Record, walk: &mut Walk<'_>) {
    let (Some(name), Some(body)) = (record.str_field("name"), record.str_field("template"))
    else {
        return;
    };
    walk.registry.register(name, Template::new(body));
}

/// Render a template instantiation into one terminal record.
///
/// The rendered record is appended as-is and never re-dispatched, even
/// when it carries a recognized `kind`.
fn instantiate_template(
    record: &Record,
    walk: &mut Walk<'_>,
    output: &mut Vec<Record>,
) -> Result<(), ResolveError> {
    let Some(name) = record.str_field("template") else {
        return Ok(());
    };
    let template = walk
        .registry
        .get(name)
        .ok_or_else(|| ResolveError::TemplateNotFound(name.to_string()))?;

    let empty = Mapping::new();
    let variables = record.mapping_field("variables").unwrap_or(&empty);
    let rendered = template.render(variables);
    let rendered =
        document::parse_single(&rendered).map_err(|e| ResolveError::TemplateRenderFailed {
            name: name.to_string(),
            message: e.to_string(),
        })?;

    output.push(rendered);
    Ok(())
}

/// Overwrite `depends_on` on every marked record with the accumulated
/// dependency names.
fn apply_dependency_injection(output: &mut [Record], dependencies: &[String]) {
    let deps: Vec<Value> = dependencies.iter().map(|d| Value::from(d.as_str())).collect();
    for record in output.iter_mut() {
        if record.bool_field("injectDependencies") == Some(true) {
            record.set("depends_on", Value::Sequence(deps.clone()));
        }
    }
}
