//! Handler for `deptree tree` and `deptree graph`.

use std::path::Path;

use miette::Result;

use deptree_core::artifact::Artifact;
use deptree_core::config::{BackendKind, TreeConfig};
use deptree_resolver::builder::{DependencyGraphBuilder, ProjectRequest};
use deptree_resolver::conflict::ConflictReport;
use deptree_resolver::serialize::{render, TreeTokens};
use deptree_util::errors::DepTreeError;

use crate::cli::TreeArgs;

pub fn exec(
    file: &Path,
    backend: Option<BackendKind>,
    opts: &TreeArgs,
    mut config: TreeConfig,
) -> Result<()> {
    apply_overrides(&mut config, opts)?;
    let kind = backend.unwrap_or(config.resolver.backend);
    tracing::debug!(file = %file.display(), ?kind, "reading recorded resolution");

    let input = deptree_util::fs::read_to_string(file)?;
    let builder = DependencyGraphBuilder::from_input(kind, &input)?;

    let project = match opts.project {
        Some(ref coords) => coords.parse::<Artifact>()?,
        None => builder.recorded_project().ok_or_else(|| DepTreeError::InvalidInput {
            message: format!("{} does not record a project", file.display()),
        })?,
    };
    let reactor = opts
        .reactor
        .iter()
        .map(|coords| coords.parse::<Artifact>())
        .collect::<Result<Vec<_>, _>>()?;
    let filter = config.filter.build()?;

    let mut request = ProjectRequest::new(&project).with_reactor_projects(&reactor);
    if let Some(ref filter) = filter {
        request = request.with_filter(filter.as_ref());
    }
    let root = builder.build_dependency_graph(&request)?;

    if config.output.legacy {
        print!("{}", root.to_tree_string());
    } else {
        print!("{}", render(&root, TreeTokens::from(config.output.tokens)));
    }

    if opts.conflicts {
        println!();
        println!("{}", ConflictReport::from_tree(&root).to_string().trim_end());
    }

    Ok(())
}

/// Command-line flags take precedence over the configuration file.
fn apply_overrides(config: &mut TreeConfig, opts: &TreeArgs) -> Result<()> {
    if let Some(ref tokens) = opts.tokens {
        config.output.tokens = tokens.parse()?;
    }
    if opts.legacy {
        config.output.legacy = true;
    }
    if let Some(ref scope) = opts.scope {
        config.filter.scope = Some(scope.parse()?);
    }
    if !opts.includes.is_empty() {
        config.filter.includes = opts.includes.clone();
    }
    if !opts.excludes.is_empty() {
        config.filter.excludes = opts.excludes.clone();
    }
    Ok(())
}
