use crate::model::TaskList;
use anyhow::{Context, Result};
use chrono::Utc;
use directories::ProjectDirs;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const PROJECT_DIR: &str = ".timeblock";
const LIST_FILE: &str = "tasks.yml";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListScope {
    Project,
    Global,
}

#[derive(Debug, Clone)]
pub struct ListLocation {
    pub path: PathBuf,
    pub scope: ListScope,
}

pub fn init_project_list(name: Option<String>) -> Result<ListLocation> {
    let cwd = env::current_dir()?;
    init_list_in(&cwd, name)
}

fn init_list_in(dir: &Path, name: Option<String>) -> Result<ListLocation> {
    let data_dir = dir.join(PROJECT_DIR);
    fs::create_dir_all(&data_dir).with_context(|| format!("creating {:?}", data_dir))?;
    let location = ListLocation {
        path: data_dir.join(LIST_FILE),
        scope: ListScope::Project,
    };
    if !location.path.exists() {
        let list_name = name.unwrap_or_else(|| {
            dir.file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("project")
                .to_string()
        });
        save_list(&location, &TaskList::default_named(list_name, Utc::now().date_naive()))?;
        info!(path = %location.path.display(), "initialized task list");
    }
    Ok(location)
}

pub fn locate_list(start: &Path) -> Result<ListLocation> {
    if let Some(project_path) = find_project_list(start) {
        return Ok(ListLocation {
            path: project_path,
            scope: ListScope::Project,
        });
    }
    Ok(ListLocation {
        path: global_list_path()?,
        scope: ListScope::Global,
    })
}

pub fn load_list(location: &ListLocation) -> Result<TaskList> {
    if location.path.exists() {
        let data = fs::read_to_string(&location.path)
            .with_context(|| format!("reading {:?}", location.path))?;
        let list: TaskList = serde_yaml::from_str(&data).context("parsing task list file")?;
        debug!(path = %location.path.display(), blocks = list.blocks().len(), "loaded task list");
        Ok(list)
    } else {
        let fallback_name = match location.scope {
            ListScope::Project => location
                .path
                .parent()
                .and_then(|p| p.parent())
                .and_then(|p| p.file_name())
                .and_then(|n| n.to_str())
                .unwrap_or("project")
                .to_string(),
            ListScope::Global => "default".to_string(),
        };
        let list = TaskList::default_named(fallback_name, Utc::now().date_naive());
        save_list(location, &list)?;
        Ok(list)
    }
}

pub fn save_list(location: &ListLocation, list: &TaskList) -> Result<()> {
    if let Some(parent) = location.path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("creating {:?}", parent))?;
    }
    let serialized = serde_yaml::to_string(list).context("serializing task list")?;
    fs::write(&location.path, serialized)
        .with_context(|| format!("writing {:?}", location.path))?;
    debug!(path = %location.path.display(), "saved task list");
    Ok(())
}

fn find_project_list(start: &Path) -> Option<PathBuf> {
    let mut dir = Some(start);
    while let Some(current) = dir {
        let candidate = current.join(PROJECT_DIR).join(LIST_FILE);
        if candidate.exists() {
            return Some(candidate);
        }
        dir = current.parent();
    }
    None
}

fn global_list_path() -> Result<PathBuf> {
    let dirs = ProjectDirs::from("", "", "timeblock").context("locating data directory")?;
    Ok(dirs.data_dir().join(LIST_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TimeBlockEntry;

    #[test]
    fn init_then_locate_from_nested_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let location = init_list_in(tmp.path(), Some("today".into())).unwrap();
        assert!(location.path.exists());

        let nested = tmp.path().join("a/b");
        fs::create_dir_all(&nested).unwrap();
        let found = locate_list(&nested).unwrap();
        assert_eq!(found.scope, ListScope::Project);
        assert_eq!(found.path, location.path);
        assert_eq!(load_list(&found).unwrap().name, "today");
    }

    #[test]
    fn init_keeps_an_existing_list() {
        let tmp = tempfile::tempdir().unwrap();
        let location = init_list_in(tmp.path(), Some("first".into())).unwrap();
        let mut list = load_list(&location).unwrap();
        list.add(TimeBlockEntry::new("x1".into(), "write")).unwrap();
        save_list(&location, &list).unwrap();

        init_list_in(tmp.path(), Some("second".into())).unwrap();
        let reloaded = load_list(&location).unwrap();
        assert_eq!(reloaded.name, "first");
        assert_eq!(reloaded.blocks().len(), 1);
    }

    #[test]
    fn missing_project_file_is_created_with_directory_name() {
        let tmp = tempfile::tempdir().unwrap();
        let project = tmp.path().join("garden");
        let location = ListLocation {
            path: project.join(PROJECT_DIR).join(LIST_FILE),
            scope: ListScope::Project,
        };
        let list = load_list(&location).unwrap();
        assert_eq!(list.name, "garden");
        assert!(location.path.exists());
    }

    #[test]
    fn save_and_load_preserve_blocks() {
        let tmp = tempfile::tempdir().unwrap();
        let location = ListLocation {
            path: tmp.path().join(LIST_FILE),
            scope: ListScope::Global,
        };
        let mut list = TaskList::default_named("g", Utc::now().date_naive());
        let mut block = TimeBlockEntry::new("b1".into(), "review");
        block.start = Some(list.time_on_day(0, "09:00").unwrap());
        block.is_complete = Some(true);
        list.add(block).unwrap();
        save_list(&location, &list).unwrap();
        assert_eq!(load_list(&location).unwrap(), list);
    }
}
