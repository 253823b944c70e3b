//! The `config.json` read by the CLI and by the fixture harness.
//!
//! ```json
//! {
//!   "sourceDir": "include/SDL3",
//!   "outputDir": "include/SDL3pp",
//!   "namespace": "SDL",
//!   "prefixes": ["SDL_"],
//!   "ignoreTokens": ["SDL_DECLSPEC", "SDLCALL"],
//!   "includePrefix": "SDL3/",
//!   "outputNames": { "SDL_video.h": "SDL3pp_video.h" },
//!   "files": ["SDL_video.h", "SDL_rect.h"]
//! }
//! ```
//!
//! Relative directories are resolved against the directory holding the
//! config file.

use crate::error::Error;
use crate::gen::{self, fs, Input, Opt};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct Config {
    pub source_dir: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    /// `null` or absent means the wrappers go to the global namespace.
    pub namespace: Option<String>,
    pub prefixes: Vec<String>,
    pub ignore_tokens: Vec<String>,
    /// Replaces the built-in constructor verbs when present.
    pub constructor_verbs: Option<Vec<String>>,
    /// Replaces the built-in destructor verbs when present.
    pub destructor_verbs: Option<Vec<String>>,
    pub include_prefix: Option<String>,
    /// Input file name to output file name.
    pub output_names: BTreeMap<String, String>,
    /// Input file names relative to `sourceDir`. Absent means every `*.h`
    /// in `sourceDir`, sorted.
    pub files: Option<Vec<String>>,
}

impl Config {
    pub fn from_json(path: &Path, json: &str) -> Result<Self, Error> {
        match serde_json::from_str(json) {
            Ok(config) => Ok(config),
            Err(source) => Err(Error::from(gen::Error::Config {
                path: path.to_owned(),
                source,
            })),
        }
    }

    pub fn load(path: &Path) -> Result<Self, Error> {
        let json = fs::read_to_string(path)?;
        let mut config = Config::from_json(path, &json)?;
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        config.source_dir = Some(base.join(config.source_dir.as_deref().unwrap_or(Path::new(""))));
        config.output_dir = config.output_dir.map(|dir| base.join(dir));
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    pub fn opt(&self) -> Opt {
        let mut opt = Opt {
            namespace: self.namespace.clone(),
            prefixes: self.prefixes.clone(),
            ignore_tokens: self.ignore_tokens.clone(),
            include_prefix: self.include_prefix.clone(),
            ..Opt::default()
        };
        if let Some(verbs) = &self.constructor_verbs {
            opt.constructor_verbs = verbs.clone();
        }
        if let Some(verbs) = &self.destructor_verbs {
            opt.destructor_verbs = verbs.clone();
        }
        opt
    }

    pub fn output_name(&self, input: &str) -> String {
        match self.output_names.get(input) {
            Some(output) => output.clone(),
            None => gen::default_output_name(input, &self.prefixes),
        }
    }

    pub fn input_paths(&self) -> Result<Vec<PathBuf>, Error> {
        let dir = self.source_dir.as_deref().unwrap_or(Path::new(""));
        let paths = match &self.files {
            Some(files) => files.iter().map(|file| dir.join(file)).collect(),
            None => {
                let dir = if dir.as_os_str().is_empty() {
                    Path::new(".")
                } else {
                    dir
                };
                fs::read_dir_with_extension(dir, "h")?
            }
        };
        if paths.is_empty() {
            return Err(Error::from(gen::Error::NoInput));
        }
        Ok(paths)
    }

    /// Reads one input header, naming its output from this config.
    pub fn input(&self, path: &Path) -> Result<Input, Error> {
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let input = Input::from_path(path, self.output_name(&name))?;
        Ok(input)
    }

    /// Reads every input header of the run.
    pub fn inputs(&self) -> Result<Vec<Input>, Error> {
        let mut inputs = Vec::new();
        for path in self.input_paths()? {
            inputs.push(self.input(&path)?);
        }
        Ok(inputs)
    }
}

#[cfg(test)]
mod tests {
    use super::Config;
    use std::path::Path;

    #[test]
    fn test_parse() {
        let json = r#"{
            "namespace": "SDL",
            "prefixes": ["SDL_"],
            "ignoreTokens": ["SDL_DECLSPEC"],
            "destructorVerbs": ["Destroy"],
            "outputNames": {"SDL_video.h": "SDL3pp_video.h"}
        }"#;
        let config = Config::from_json(Path::new("config.json"), json).unwrap();
        let opt = config.opt();
        assert_eq!(opt.namespace.as_deref(), Some("SDL"));
        assert_eq!(opt.ignore_tokens, ["SDL_DECLSPEC"]);
        assert_eq!(opt.destructor_verbs, ["Destroy"]);
        assert!(opt.constructor_verbs.iter().any(|verb| verb == "Create"));
        assert_eq!(config.output_name("SDL_video.h"), "SDL3pp_video.h");
        assert_eq!(config.output_name("SDL_rect.h"), "rect.hpp");
    }

    #[test]
    fn test_null_namespace() {
        let config = Config::from_json(Path::new("config.json"), r#"{"namespace": null}"#).unwrap();
        assert_eq!(config.namespace, None);
    }

    #[test]
    fn test_unknown_field() {
        let err = Config::from_json(Path::new("config.json"), r#"{"namspace": "x"}"#).unwrap_err();
        assert!(err.to_string().contains("config.json"));
    }
}
