//! Skill bundle discovery and loading.
//!
//! The loader walks each configured directory (project before global), parses
//! every `SKILL.md` bundle it finds, and reports per-bundle failures instead of
//! aborting. An enabled skill id found in an earlier directory shadows the same
//! id in a later one; disabled bundles never shadow. Duplicates inside a single
//! directory are passed through so the catalog rejects them.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use skillgate_core::SkillsConfig;
use walkdir::WalkDir;

use crate::parser::{SKILL_FILE, parse_bundle};
use crate::types::{Skill, SkillError};

/// A bundle that could not be loaded.
#[derive(Debug)]
pub struct LoadFailure {
    pub path: PathBuf,
    pub error: SkillError,
}

/// Outcome of a load pass.
#[derive(Debug, Default)]
pub struct LoadReport {
    /// Loaded skills in discovery order
    pub skills: Vec<Skill>,
    pub failures: Vec<LoadFailure>,
    /// Ids of bundles marked `enabled: false`
    pub disabled: Vec<String>,
    /// Bundles hidden by a same-named bundle in an earlier directory
    pub shadowed: Vec<PathBuf>,
}

impl LoadReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct SkillLoader {
    /// Search directories, highest precedence first
    dirs: Vec<PathBuf>,
}

impl SkillLoader {
    pub fn new(dirs: Vec<PathBuf>) -> Self {
        Self { dirs }
    }

    /// Loader for the configured directories, followed by the global directory
    /// when enabled; discovery off means no directories.
    pub fn from_config(config: &SkillsConfig) -> Self {
        if !config.auto_discover {
            return Self::new(Vec::new());
        }
        let mut dirs = config.dirs.clone();
        if config.include_global {
            let global = Self::default_global_dir();
            if !dirs.contains(&global) {
                dirs.push(global);
            }
        }
        Self::new(dirs)
    }

    /// Get the default global skills directory.
    pub fn default_global_dir() -> PathBuf {
        dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")).join(".skillgate").join("skills")
    }

    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }

    /// Bundle directories directly under `dir`, sorted by path.
    pub fn discover_in_dir(dir: &Path) -> Vec<PathBuf> {
        if !dir.exists() {
            return Vec::new();
        }

        WalkDir::new(dir)
            .min_depth(1)
            .max_depth(2)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name() == SKILL_FILE)
            .filter_map(|e| e.path().parent().map(Path::to_path_buf))
            .collect()
    }

    /// Parse every discoverable bundle.
    pub fn load_all(&self) -> LoadReport {
        let mut report = LoadReport::default();
        let mut origin: HashMap<String, usize> = HashMap::new();

        for (dir_index, dir) in self.dirs.iter().enumerate() {
            if !dir.exists() {
                tracing::debug!(dir = %dir.display(), "skills directory does not exist");
                continue;
            }

            for bundle_dir in Self::discover_in_dir(dir) {
                let bundle = match parse_bundle(&bundle_dir) {
                    Ok(bundle) => bundle,
                    Err(error) => {
                        tracing::warn!(path = %bundle_dir.display(), error = %error, "failed to load skill bundle");
                        report.failures.push(LoadFailure { path: bundle_dir, error });
                        continue;
                    }
                };

                let id = bundle.skill.id.clone();
                if let Some(&first) = origin.get(&id)
                    && first < dir_index
                {
                    tracing::debug!(skill = %id, path = %bundle_dir.display(), "skill shadowed by earlier directory");
                    report.shadowed.push(bundle_dir);
                    continue;
                }
                if !bundle.enabled {
                    tracing::info!(skill = %id, "skill bundle disabled");
                    report.disabled.push(id);
                    continue;
                }
                origin.entry(id.clone()).or_insert(dir_index);

                tracing::debug!(skill = %id, tools = bundle.skill.tools.len(), "loaded skill bundle");
                report.skills.push(bundle.skill);
            }
        }

        tracing::info!(
            loaded = report.skills.len(),
            failed = report.failures.len(),
            disabled = report.disabled.len(),
            "skill discovery complete"
        );

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn create_test_skill(dir: &Path, name: &str, description: &str, tools: &[&str]) {
        let skill_dir = dir.join(name);
        fs::create_dir_all(&skill_dir).unwrap();

        let tools_str = tools.iter().map(|t| format!("  - name: {t}")).collect::<Vec<_>>().join("\n");

        fs::write(
            skill_dir.join("SKILL.md"),
            format!(
                r#"---
name: {name}
description: {description}
tools:
{tools_str}
---

# {name}
"#
            ),
        )
        .unwrap();
    }

    #[test]
    fn test_load_all() {
        let temp = TempDir::new().unwrap();
        create_test_skill(temp.path(), "web-search", "Search the web", &["search"]);
        create_test_skill(temp.path(), "data_analysis", "Analyze data", &["calculate_statistics"]);

        let report = SkillLoader::new(vec![temp.path().to_path_buf()]).load_all();
        assert!(report.is_clean());
        let ids: Vec<_> = report.skills.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["data_analysis", "web-search"]);
    }

    #[test]
    fn test_malformed_bundle_does_not_block_others() {
        let temp = TempDir::new().unwrap();
        create_test_skill(temp.path(), "good", "Works", &["t1"]);
        let broken = temp.path().join("broken");
        fs::create_dir_all(&broken).unwrap();
        fs::write(broken.join("SKILL.md"), "no frontmatter").unwrap();

        let report = SkillLoader::new(vec![temp.path().to_path_buf()]).load_all();
        assert_eq!(report.skills.len(), 1);
        assert_eq!(report.skills[0].id, "good");
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].path, broken);
    }

    #[test]
    fn test_project_shadows_global() {
        let temp = TempDir::new().unwrap();
        let global_dir = temp.path().join("global");
        let project_dir = temp.path().join("project");
        create_test_skill(&global_dir, "test-skill", "Global version", &["t1"]);
        create_test_skill(&project_dir, "test-skill", "Project version", &["t1"]);

        let report = SkillLoader::new(vec![project_dir, global_dir.clone()]).load_all();
        assert_eq!(report.skills.len(), 1);
        assert_eq!(report.skills[0].description, "Project version");
        assert_eq!(report.shadowed, vec![global_dir.join("test-skill")]);
    }

    #[test]
    fn test_duplicates_in_one_dir_are_kept_for_catalog() {
        let temp = TempDir::new().unwrap();
        create_test_skill(temp.path(), "a", "First", &["t1"]);
        let copy = temp.path().join("a-copy");
        fs::create_dir_all(&copy).unwrap();
        fs::copy(temp.path().join("a").join("SKILL.md"), copy.join("SKILL.md")).unwrap();

        let report = SkillLoader::new(vec![temp.path().to_path_buf()]).load_all();
        assert_eq!(report.skills.len(), 2);
        assert!(crate::SkillCatalog::new(Vec::new(), report.skills).is_err());
    }

    #[test]
    fn test_disabled_bundle_skipped() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("off");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("SKILL.md"), "---\nname: off\ndescription: Off\nenabled: false\ntools:\n  - name: t\n---\n")
            .unwrap();

        let report = SkillLoader::new(vec![temp.path().to_path_buf()]).load_all();
        assert!(report.skills.is_empty());
        assert_eq!(report.disabled, vec!["off".to_string()]);
    }

    #[test]
    fn test_missing_dir_and_discovery_off() {
        let temp = TempDir::new().unwrap();
        let report = SkillLoader::new(vec![temp.path().join("nope")]).load_all();
        assert!(report.skills.is_empty() && report.is_clean());

        let config = SkillsConfig { dirs: vec![temp.path().to_path_buf()], auto_discover: false, include_global: true };
        assert!(SkillLoader::from_config(&config).dirs().is_empty());
    }

    #[test]
    fn test_global_dir_searched_last() {
        let project = PathBuf::from("./skills");
        let config = SkillsConfig { dirs: vec![project.clone()], auto_discover: true, include_global: true };
        assert_eq!(SkillLoader::from_config(&config).dirs(), &[project.clone(), SkillLoader::default_global_dir()]);

        let listed = SkillsConfig { dirs: vec![SkillLoader::default_global_dir()], ..config.clone() };
        assert_eq!(SkillLoader::from_config(&listed).dirs().len(), 1);

        let local = SkillsConfig { include_global: false, ..config };
        assert_eq!(SkillLoader::from_config(&local).dirs(), &[project]);
    }

    #[test]
    fn test_disabled_bundle_does_not_shadow() {
        let temp = TempDir::new().unwrap();
        let project_dir = temp.path().join("project");
        let global_dir = temp.path().join("global");
        let off = project_dir.join("test-skill");
        fs::create_dir_all(&off).unwrap();
        fs::write(
            off.join("SKILL.md"),
            "---\nname: test-skill\ndescription: Off\nenabled: false\ntools:\n  - name: t1\n---\n",
        )
        .unwrap();
        create_test_skill(&global_dir, "test-skill", "Global version", &["t1"]);

        let report = SkillLoader::new(vec![project_dir, global_dir]).load_all();
        assert_eq!(report.disabled, vec!["test-skill".to_string()]);
        assert!(report.shadowed.is_empty());
        assert_eq!(report.skills.len(), 1);
        assert_eq!(report.skills[0].description, "Global version");
    }

    #[test]
    fn test_discovery_depth() {
        let temp = TempDir::new().unwrap();
        create_test_skill(temp.path(), "direct", "Direct", &["t1"]);
        create_test_skill(&temp.path().join("group"), "nested", "Nested", &["t2"]);

        let found = SkillLoader::discover_in_dir(temp.path());
        assert_eq!(found, vec![temp.path().join("direct")]);
    }
}
