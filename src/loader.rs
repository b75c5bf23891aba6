//! Generates the loader script that injects a build's output tags at runtime.
//!
//! The emitted source is an IIFE that finds its own `<script>` element through
//! `document.currentScript`, derives a base path from that element's `src`, and
//! appends one node per qualifying output to the element's parent. Output must
//! stay byte-stable for a given input since the artifact may be named after
//! its own hash.

use crate::manifest::{OutputBundle, OutputEntry};

const PRELUDE: &str = "
(function () {
  var scriptTag = document.currentScript;
  var src = scriptTag.src;
  var basePath = src.substring(0, src.lastIndexOf('/') + 1);
  var parent = scriptTag.parentNode;
";

const EPILOGUE: &str = "})()";

/// Generation inputs borrowed from the plugin configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScriptOptions<'a> {
    pub external_src: Option<&'a str>,
    /// Value for the `crossorigin` attribute on entry scripts; `None` omits it.
    pub crossorigin: Option<&'a str>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagKind {
    ModuleScript,
    ModulePreload,
    Stylesheet,
}

impl TagKind {
    /// Non-CSS assets have no tag.
    pub fn for_entry(entry: &OutputEntry) -> Option<Self> {
        match entry {
            OutputEntry::Chunk { is_entry: true, .. } => Some(Self::ModuleScript),
            OutputEntry::Chunk { is_entry: false, .. } => Some(Self::ModulePreload),
            OutputEntry::Asset { file_name } if file_name.ends_with(".css") => {
                Some(Self::Stylesheet)
            }
            OutputEntry::Asset { .. } => None,
        }
    }
}

/// Accumulates tag statements between the fixed prelude and epilogue.
#[derive(Debug)]
pub struct ScriptBuilder {
    code: String,
    counter: usize,
}

impl Default for ScriptBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptBuilder {
    pub fn new() -> Self {
        Self {
            code: PRELUDE.to_string(),
            counter: 0,
        }
    }

    /// Appends creation, attribute and append statements for one node whose
    /// URL is `basePath + path`.
    pub fn push_tag(&mut self, kind: TagKind, path: &str, crossorigin: Option<&str>) {
        let var = format!("file{}", self.counter);
        match kind {
            TagKind::ModuleScript => {
                self.create(&var, "script");
                self.set_url(&var, "src", path);
                self.set_attr(&var, "type", "module");
                if let Some(value) = crossorigin {
                    self.set_attr(&var, "crossorigin", value);
                }
            }
            TagKind::ModulePreload => {
                self.create(&var, "link");
                self.set_url(&var, "href", path);
                self.set_attr(&var, "rel", "modulepreload");
            }
            TagKind::Stylesheet => {
                self.create(&var, "link");
                self.set_url(&var, "href", path);
                self.set_attr(&var, "rel", "stylesheet");
            }
        }
        self.code.push_str(&format!("parent.appendChild({var});"));
        self.counter += 1;
    }

    pub fn tag_count(&self) -> usize {
        self.counter
    }

    pub fn finish(mut self) -> String {
        self.code.push_str(EPILOGUE);
        self.code
    }

    fn create(&mut self, var: &str, element: &str) {
        self.code.push_str(&format!(
            "const {var} = document.createElement('{element}');"
        ));
    }

    fn set_url(&mut self, var: &str, attr: &str, path: &str) {
        self.code.push_str(&format!(
            "{var}.setAttribute('{attr}', basePath + '{path}');"
        ));
    }

    fn set_attr(&mut self, var: &str, attr: &str, value: &str) {
        self.code
            .push_str(&format!("{var}.setAttribute('{attr}', '{value}');"));
    }
}

/// Builds the production loader for `bundle`.
///
/// Entries are visited in bundle order; file names and the external prefix
/// are inserted verbatim.
pub fn generate_loading_script(bundle: &OutputBundle, options: &ScriptOptions<'_>) -> String {
    let mut builder = ScriptBuilder::new();
    for (key, entry) in bundle.iter() {
        let Some(kind) = TagKind::for_entry(entry) else {
            tracing::trace!(%key, file = entry.file_name(), "no tag for output");
            continue;
        };
        let path = match options.external_src {
            Some(prefix) => format!("{prefix}{}", entry.file_name()),
            None => entry.file_name().to_string(),
        };
        builder.push_tag(kind, &path, options.crossorigin);
    }
    tracing::debug!(tags = builder.tag_count(), outputs = bundle.len(), "generated loader");
    builder.finish()
}

/// Builds the development loader: a single module script for `dev_entry`.
pub fn generate_dev_script(dev_entry: &str) -> String {
    let mut builder = ScriptBuilder::new();
    builder.push_tag(TagKind::ModuleScript, dev_entry, None);
    builder.finish()
}
