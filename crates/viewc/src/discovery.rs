//! Finding templates and components on disk.

use crate::config::Config;
use camino::{Utf8Path, Utf8PathBuf};
use view_renderer::VIEW_EXTENSION;

/// A component template found in a component directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentFile {
    /// Tag name, taken from the file name (`x-card.view.html` is `x-card`).
    pub name: String,
    pub path: Utf8PathBuf,
    /// Whether the file lives under a `vendor` directory.
    pub is_vendor: bool,
}

/// Find every component file under the configured component directories,
/// sorted by path.
pub fn discover_components(config: &Config) -> Vec<ComponentFile> {
    let prefix = config.engine_options.component_prefix.as_str();
    let mut components = Vec::new();

    for dir in &config.component_dirs {
        for path in view_files(dir, config) {
            let Some(name) = component_name(&path, prefix) else {
                continue;
            };
            let is_vendor = path
                .strip_prefix(dir)
                .map(|relative| relative.components().any(|c| c.as_str() == "vendor"))
                .unwrap_or(false);
            components.push(ComponentFile {
                name: name.to_string(),
                path,
                is_vendor,
            });
        }
    }

    components.sort_by(|a, b| a.path.cmp(&b.path));
    components.dedup_by(|a, b| a.path == b.path);
    tracing::debug!(count = components.len(), "discovered view components");
    components
}

/// Find every page template (any view file that is not a component) under
/// the template roots, sorted by path.
pub fn discover_templates(config: &Config) -> Vec<Utf8PathBuf> {
    let prefix = config.engine_options.component_prefix.as_str();
    let mut templates: Vec<Utf8PathBuf> = config
        .template_roots
        .iter()
        .flat_map(|root| view_files(root, config))
        .filter(|path| component_name(path, prefix).is_none())
        .collect();

    templates.sort();
    templates.dedup();
    templates
}

/// The component name for a view file, if its name carries the prefix.
pub fn component_name<'p>(path: &'p Utf8Path, prefix: &str) -> Option<&'p str> {
    let name = path.file_name()?.strip_suffix(VIEW_EXTENSION)?.strip_suffix('.')?;
    (name.len() > prefix.len() && name.starts_with(prefix)).then_some(name)
}

/// Check whether a path names a view template.
pub fn is_view_file(path: &Utf8Path) -> bool {
    path.file_name()
        .is_some_and(|name| name.ends_with(&format!(".{}", VIEW_EXTENSION)))
}

fn view_files(dir: &Utf8Path, config: &Config) -> Vec<Utf8PathBuf> {
    walkdir::WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| Utf8PathBuf::from_path_buf(entry.into_path()).ok())
        .filter(|path| is_view_file(path) && !config.is_ignored(path))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Args;
    use clap::Parser;
    use pretty_assertions::assert_eq;

    fn write(root: &std::path::Path, path: &str) {
        let path = root.join(path);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, "<div></div>").unwrap();
    }

    #[test]
    fn test_component_name() {
        assert_eq!(component_name(Utf8Path::new("a/x-card.view.html"), "x-"), Some("x-card"));
        assert_eq!(component_name(Utf8Path::new("a/home.view.html"), "x-"), None);
        assert_eq!(component_name(Utf8Path::new("a/x-.view.html"), "x-"), None);
        assert_eq!(component_name(Utf8Path::new("a/x-card.html"), "x-"), None);
    }

    #[test]
    fn test_discovery() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "views/home.view.html");
        write(dir.path(), "views/blog/post.view.html");
        write(dir.path(), "views/x-card.view.html");
        write(dir.path(), "views/notes.txt");
        write(dir.path(), "vendor/acme/x-card.view.html");
        write(dir.path(), "node_modules/pkg/x-input.view.html");

        let config = Config::load(dir.path(), &Args::parse_from(["viewc"])).unwrap();
        let root = config.workspace.clone();

        let components = discover_components(&config);
        assert_eq!(
            components,
            vec![
                ComponentFile {
                    name: "x-card".into(),
                    path: root.join("vendor/acme/x-card.view.html"),
                    is_vendor: true,
                },
                ComponentFile {
                    name: "x-card".into(),
                    path: root.join("views/x-card.view.html"),
                    is_vendor: false,
                },
            ]
        );

        assert_eq!(
            discover_templates(&config),
            vec![root.join("views/blog/post.view.html"), root.join("views/home.view.html")]
        );
    }
}
