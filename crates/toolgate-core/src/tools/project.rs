//! `get_project_structure`: the file tree under the server's project root

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use walkdir::WalkDir;

use crate::registry::{BuiltinTool, HandlerError, ToolArgs, ToolContext, ToolSpec};

/// `get_project_structure()` → `{".": {"src": "Directory", ...}, "./src": {...}}`
#[derive(Debug, Clone)]
pub struct ProjectStructureTool {
    root: PathBuf,
}

impl ProjectStructureTool {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl Default for ProjectStructureTool {
    fn default() -> Self {
        Self::new(".")
    }
}

#[async_trait]
impl BuiltinTool for ProjectStructureTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec::new(
            "get_project_structure",
            "Returns the file and folder structure of the server's project directory, keyed by folder.",
        )
    }

    async fn run(&self, _args: ToolArgs, _ctx: &ToolContext) -> Result<Value, HandlerError> {
        let root = self.root.clone();
        tokio::task::spawn_blocking(move || project_structure(&root))
            .await
            .map_err(|e| HandlerError::failed(format!("Directory walk aborted: {}", e)))?
    }
}

fn project_structure(root: &Path) -> Result<Value, HandlerError> {
    let mut tree = Map::new();
    for entry in WalkDir::new(root).min_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|e| HandlerError::failed(e.to_string()))?;
        let folder = folder_key(root, entry.path().parent().unwrap_or(root));
        let kind = if entry.file_type().is_dir() {
            "Directory"
        } else {
            "File"
        };

        if let Value::Object(children) = tree.entry(folder).or_insert_with(|| json!({})) {
            children.insert(entry.file_name().to_string_lossy().into_owned(), json!(kind));
        }
    }
    Ok(Value::Object(tree))
}

/// `.` for the root itself, `./a/b` below it
fn folder_key(root: &Path, folder: &Path) -> String {
    match folder.strip_prefix(root) {
        Ok(rel) if rel.as_os_str().is_empty() => ".".to_string(),
        Ok(rel) => format!("./{}", rel.to_string_lossy().replace('\\', "/")),
        Err(_) => folder.to_string_lossy().into_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[tokio::test]
    async fn test_structure_keyed_by_folder() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("src/tools")).unwrap();
        fs::write(dir.path().join("Cargo.toml"), "").unwrap();
        fs::write(dir.path().join("src/lib.rs"), "").unwrap();
        fs::write(dir.path().join("src/tools/echo.rs"), "").unwrap();

        let tool = ProjectStructureTool::new(dir.path());
        let args = tool.spec().validate(&json!({})).unwrap();
        let out = tool.run(args, &ToolContext::default()).await.unwrap();

        assert_eq!(
            out,
            json!({
                ".": {"Cargo.toml": "File", "src": "Directory"},
                "./src": {"lib.rs": "File", "tools": "Directory"},
                "./src/tools": {"echo.rs": "File"}
            })
        );
    }

    #[tokio::test]
    async fn test_missing_root_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let tool = ProjectStructureTool::new(dir.path().join("absent"));
        let args = tool.spec().validate(&Value::Null).unwrap();
        let err = tool.run(args, &ToolContext::default()).await.unwrap_err();
        assert!(matches!(err, HandlerError::Failed(_)));
    }

    #[test]
    fn test_folder_key() {
        let root = Path::new("/work");
        assert_eq!(folder_key(root, Path::new("/work")), ".");
        assert_eq!(folder_key(root, Path::new("/work/src/tools")), "./src/tools");
    }
}
