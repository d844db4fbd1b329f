use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::code_builder::Language;

/// One listing to turn into generated code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub input: String,
    pub output: String,
    #[serde(rename = "enumName")]
    pub enum_name: String,
    pub namespace: String,
    #[serde(default)]
    pub language: Language,
    /// C++ source file receiving the lookup function; the output then only declares it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl Job {
    pub fn new(input: &str, output: &str, enum_name: &str, namespace: &str) -> Job {
        Job {
            input: input.to_string(),
            output: output.to_string(),
            enum_name: enum_name.to_string(),
            namespace: namespace.to_string(),
            language: Language::default(),
            source: None,
        }
    }
}

fn default_jobs() -> Vec<Job> {
    vec![
        Job::new("machines.txt", "machines.hpp", "e_machines", "elf"),
        Job::new(
            "section_attribute_flags.txt",
            "section_attribute_flags.hpp",
            "e_sh_flags",
            "elf",
        ),
        Job::new(
            "section_types.txt",
            "section_types.hpp",
            "e_section_types",
            "elf",
        ),
    ]
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Fail on diagnostics such as value collisions instead of only reporting them.
    #[serde(default)]
    pub strict: bool,
    #[serde(default = "default_jobs")]
    pub jobs: Vec<Job>,
}

impl GeneratorConfig {
    pub fn from_json(json: &str) -> serde_json::Result<GeneratorConfig> {
        serde_json::from_str(json)
    }

    /// Resolves the file paths of every job against `dir`, usually the
    /// directory holding the config file. Absolute paths are kept.
    pub fn relative_to(mut self, dir: &Path) -> GeneratorConfig {
        let resolve = |path: &mut String| {
            *path = dir.join(&*path).to_string_lossy().into_owned();
        };
        for job in &mut self.jobs {
            resolve(&mut job.input);
            resolve(&mut job.output);
            if let Some(source) = &mut job.source {
                resolve(source);
            }
        }
        self
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        GeneratorConfig {
            strict: false,
            jobs: default_jobs(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    pub fn empty_config_runs_the_elf_tables() {
        let config = GeneratorConfig::from_json("{}").unwrap();
        assert!(!config.strict);
        let names: Vec<&str> = config.jobs.iter().map(|job| job.enum_name.as_str()).collect();
        assert_eq!(names, ["e_machines", "e_sh_flags", "e_section_types"]);
        assert!(config
            .jobs
            .iter()
            .all(|job| job.namespace == "elf" && job.language == Language::Cpp));
        assert_eq!(config.jobs, GeneratorConfig::default().jobs);
    }

    #[test]
    pub fn jobs_from_json() {
        let config = GeneratorConfig::from_json(
            r#"{
                "strict": true,
                "jobs": [
                    {
                        "input": "data/section_types.txt",
                        "output": "gen/section_types.hpp",
                        "enumName": "e_section_types",
                        "namespace": "elf",
                        "source": "gen/section_types.cpp"
                    },
                    {
                        "input": "data/machines.txt",
                        "output": "gen/machines.rs",
                        "enumName": "e_machines",
                        "namespace": "elf",
                        "language": "Rust"
                    }
                ]
            }"#,
        )
        .unwrap();
        assert!(config.strict);
        assert_eq!(config.jobs.len(), 2);
        assert_eq!(config.jobs[0].language, Language::Cpp);
        assert_eq!(config.jobs[0].source.as_deref(), Some("gen/section_types.cpp"));
        assert_eq!(config.jobs[1].language, Language::Rust);
        assert_eq!(config.jobs[1].source, None);
    }

    #[test]
    pub fn job_paths_resolve_against_the_config_directory() {
        let mut config = GeneratorConfig::default();
        config.jobs[1].source = Some("section_attribute_flags.cpp".to_string());
        config.jobs[2].output = "/tmp/section_types.hpp".to_string();
        let config = config.relative_to(Path::new("data"));

        assert_eq!(config.jobs[0].input, Path::new("data").join("machines.txt").to_string_lossy());
        assert_eq!(config.jobs[0].output, Path::new("data").join("machines.hpp").to_string_lossy());
        assert_eq!(
            config.jobs[1].source.as_deref(),
            Some(&*Path::new("data").join("section_attribute_flags.cpp").to_string_lossy())
        );
        assert_eq!(config.jobs[2].output, "/tmp/section_types.hpp");

        let config = GeneratorConfig::default().relative_to(Path::new(""));
        assert_eq!(config.jobs, GeneratorConfig::default().jobs);
    }

    #[test]
    pub fn unknown_language_is_rejected() {
        let err = GeneratorConfig::from_json(
            r#"{"jobs": [{"input": "a", "output": "b", "enumName": "c", "namespace": "d", "language": "Go"}]}"#,
        );
        assert!(err.is_err());
    }
}
