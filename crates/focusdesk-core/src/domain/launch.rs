//! Launch specification for tool-server scripts.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::ports::ToolServerError;

/// Runtime used to execute a tool-server script.
///
/// Resolved once from the script's extension; everything downstream of
/// [`LaunchSpec`] works with this value instead of the file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeKind {
    /// `.js` / `.mjs` scripts, run with the executable hosting the client
    JavaScript,
    /// `.py` scripts, run with `python3` (`python` on Windows)
    Python,
}

impl RuntimeKind {
    /// Extensions (without the dot) mapped to [`RuntimeKind::JavaScript`].
    pub const JAVASCRIPT_EXTENSIONS: &'static [&'static str] = &["js", "mjs"];

    /// Extensions (without the dot) mapped to [`RuntimeKind::Python`].
    pub const PYTHON_EXTENSIONS: &'static [&'static str] = &["py"];

    /// Map a file extension (without the dot) to a runtime.
    ///
    /// Matching is case-sensitive: `server.PY` is not a Python script.
    pub fn from_extension(extension: &str) -> Option<Self> {
        if Self::JAVASCRIPT_EXTENSIONS.contains(&extension) {
            Some(Self::JavaScript)
        } else if Self::PYTHON_EXTENSIONS.contains(&extension) {
            Some(Self::Python)
        } else {
            None
        }
    }

    /// Infer the runtime from a script path.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    /// Stable lowercase name, used in logs.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::JavaScript => "javascript",
            Self::Python => "python",
        }
    }
}

impl fmt::Display for RuntimeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A tool-server script whose runtime has been recognised.
///
/// Construction is the only place the extension is inspected, so holding a
/// `LaunchSpec` means the script can be handed to a launcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchSpec {
    script_path: PathBuf,
    runtime: RuntimeKind,
}

impl LaunchSpec {
    /// Build a launch spec, rejecting unsupported extensions.
    pub fn from_path(path: impl Into<PathBuf>) -> Result<Self, ToolServerError> {
        let script_path = path.into();
        let runtime = RuntimeKind::from_path(&script_path).ok_or_else(|| {
            ToolServerError::UnsupportedRuntime {
                path: script_path.display().to_string(),
            }
        })?;

        Ok(Self {
            script_path,
            runtime,
        })
    }

    /// Path of the server script.
    pub fn script_path(&self) -> &Path {
        &self.script_path
    }

    /// Runtime inferred from the script extension.
    pub const fn runtime(&self) -> RuntimeKind {
        self.runtime
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_javascript_extensions() {
        for path in ["server.js", "/opt/tools/server.mjs", "./build/index.js"] {
            let spec = LaunchSpec::from_path(path).unwrap();
            assert_eq!(spec.runtime(), RuntimeKind::JavaScript, "{path}");
            assert_eq!(spec.script_path(), Path::new(path));
        }
    }

    #[test]
    fn test_python_extension() {
        let spec = LaunchSpec::from_path("/srv/weather.py").unwrap();
        assert_eq!(spec.runtime(), RuntimeKind::Python);
    }

    #[test]
    fn test_unsupported_extensions_rejected() {
        for path in ["server.ts", "server.sh", "server", "server.PY", "server.js.bak"] {
            let err = LaunchSpec::from_path(path).unwrap_err();
            match err {
                ToolServerError::UnsupportedRuntime { path: rejected } => {
                    assert_eq!(rejected, path);
                }
                other => panic!("expected UnsupportedRuntime for {path}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_runtime_display() {
        assert_eq!(RuntimeKind::JavaScript.to_string(), "javascript");
        assert_eq!(RuntimeKind::Python.to_string(), "python");
    }
}
