//! Project file (.csproj) registration.
//!
//! Generated content has to be listed in the game's project file to be
//! copied next to the build output. Every file the pipeline manages goes
//! into one labeled `ItemGroup`:
//!
//! ```xml
//! <ItemGroup Label="AutomatedGamePipeline">
//!   <None Include="Content/Sprites/hero.json">
//!     <CopyToOutputDirectory>PreserveNewest</CopyToOutputDirectory>
//!   </None>
//! </ItemGroup>
//! ```
//!
//! The public document functions never mutate their input; they hand back
//! a new document when something has to change. `CsProj` edits its own
//! document in place.

use std::fs;
use std::io::BufReader;
use std::path::{Component, Path, PathBuf};

use walkdir::WalkDir;
use xmltree::{Element, EmitterConfig, XMLNode};

use crate::config::DEFAULT_IGNORED_FILES;
use crate::error::{PipelineError, Result};

/// Directory, next to the project file, holding all content.
pub const CONTENT_DIR_NAME: &str = "Content";

/// Label of the pipeline's `ItemGroup`.
pub const PIPELINE_LABEL: &str = "AutomatedGamePipeline";

const ITEM_GROUP: &str = "ItemGroup";
const NONE: &str = "None";
const INCLUDE: &str = "Include";
const LABEL: &str = "Label";
const COPY_TO_OUTPUT: &str = "CopyToOutputDirectory";
const PRESERVE_NEWEST: &str = "PreserveNewest";

/// A loaded project file.
#[derive(Debug, Clone)]
pub struct CsProj {
    path: PathBuf,
    project_dir: PathBuf,
    root: Element,
    ignored_files: Vec<String>,
}

impl CsProj {
    pub fn load(path: &Path) -> Result<Self> {
        let file = fs::File::open(path)
            .map_err(|e| PipelineError::io(path, "Failed to open project file", e))?;
        let root = Element::parse(BufReader::new(file)).map_err(|e| PipelineError::Parse {
            message: format!("Invalid project XML in {}: {}", path.display(), e),
            help: None,
        })?;

        Ok(Self {
            path: path.to_path_buf(),
            project_dir: path.parent().map(Path::to_path_buf).unwrap_or_default(),
            root,
            ignored_files: DEFAULT_IGNORED_FILES.iter().map(|s| s.to_string()).collect(),
        })
    }

    /// Extra file names to leave out of `sync_content`.
    pub fn with_ignored_files(mut self, names: &[String]) -> Self {
        self.ignored_files.extend(names.iter().cloned());
        self
    }

    pub fn root(&self) -> &Element {
        &self.root
    }

    pub fn content_dir(&self) -> PathBuf {
        self.project_dir.join(CONTENT_DIR_NAME)
    }

    /// Register `Content/<asset_type>/<file name>` and write the project if
    /// it changed. Returns whether an entry was added.
    pub fn add_asset(&mut self, file_path: &Path, asset_type: &str) -> Result<bool> {
        let filename = file_path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| PipelineError::Build {
                message: format!("Not a file path: {}", file_path.display()),
                help: None,
            })?;
        let include = format!("{}/{}/{}", CONTENT_DIR_NAME, asset_type, filename);

        let added = self.register(&include);
        if added {
            self.write_changes()?;
        }
        Ok(added)
    }

    /// Register every file under the content directory. The project file is
    /// written only if at least one entry was new. Returns the number added.
    pub fn sync_content(&mut self) -> Result<usize> {
        let content_dir = self.content_dir();
        if !content_dir.exists() {
            return Ok(0);
        }

        let mut added = 0;
        for entry in WalkDir::new(&content_dir).sort_by_file_name() {
            let entry = entry.map_err(|e| PipelineError::Io {
                path: content_dir.clone(),
                message: format!("Failed to walk content directory: {}", e),
            })?;
            if !entry.file_type().is_file() {
                continue;
            }

            let name = entry.file_name().to_string_lossy();
            if !self.is_registrable(&name) {
                continue;
            }

            let include = include_path(&self.project_dir, entry.path());
            if self.register(&include) {
                added += 1;
            }
        }

        if added > 0 {
            self.write_changes()?;
        }
        Ok(added)
    }

    fn is_registrable(&self, name: &str) -> bool {
        !name.starts_with('.') && name.contains('.') && !self.ignored_files.iter().any(|f| f == name)
    }

    fn register(&mut self, include: &str) -> bool {
        insert_asset(&mut self.root, include)
    }

    /// Serialize the document, indented.
    pub fn to_xml_string(&self) -> Result<String> {
        let mut buf = Vec::new();
        let config = EmitterConfig::new().perform_indent(true).indent_string("  ");
        self.root
            .write_with_config(&mut buf, config)
            .map_err(|e| PipelineError::Build {
                message: format!("Failed to serialize project XML: {}", e),
                help: None,
            })?;
        String::from_utf8(buf).map_err(|e| PipelineError::Build {
            message: format!("Project XML is not UTF-8: {}", e),
            help: None,
        })
    }

    pub fn write_changes(&self) -> Result<()> {
        let xml = self.to_xml_string()?;
        fs::write(&self.path, xml)
            .map_err(|e| PipelineError::io(&self.path, "Failed to write project file", e))
    }
}

/// `path` relative to `project_dir`, `/`-separated, no leading separator.
pub fn include_path(project_dir: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(project_dir).unwrap_or(path);
    relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

fn same_ignoring_case(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

fn is_pipeline_group(element: &Element) -> bool {
    element.name == ITEM_GROUP
        && element
            .attributes
            .get(LABEL)
            .is_some_and(|label| same_ignoring_case(label, PIPELINE_LABEL))
}

fn child_elements(element: &Element) -> impl Iterator<Item = &Element> {
    element.children.iter().filter_map(XMLNode::as_element)
}

/// The labeled pipeline `ItemGroup`, searched depth-first.
pub fn find_pipeline_group(root: &Element) -> Option<&Element> {
    if is_pipeline_group(root) {
        return Some(root);
    }
    child_elements(root).find_map(find_pipeline_group)
}

fn find_pipeline_group_mut(root: &mut Element) -> Option<&mut Element> {
    if is_pipeline_group(root) {
        return Some(root);
    }
    for child in root.children.iter_mut() {
        if let XMLNode::Element(element) = child {
            if let Some(found) = find_pipeline_group_mut(element) {
                return Some(found);
            }
        }
    }
    None
}

/// Whether any `None` element in the document already includes `include`,
/// ignoring case.
pub fn contains_include(root: &Element, include: &str) -> bool {
    let matches = root.name == NONE
        && root
            .attributes
            .get(INCLUDE)
            .is_some_and(|existing| same_ignoring_case(existing, include));
    matches || child_elements(root).any(|child| contains_include(child, include))
}

fn none_entry(include: &str) -> Element {
    let mut copy = Element::new(COPY_TO_OUTPUT);
    copy.children.push(XMLNode::Text(PRESERVE_NEWEST.to_string()));

    let mut entry = Element::new(NONE);
    entry.attributes.insert(INCLUDE.to_string(), include.to_string());
    entry.children.push(XMLNode::Element(copy));
    entry
}

fn pipeline_group() -> Element {
    let mut group = Element::new(ITEM_GROUP);
    group.attributes.insert(LABEL.to_string(), PIPELINE_LABEL.to_string());
    group
}

/// The document with `include` registered, or `None` if it already is.
///
/// The pipeline `ItemGroup` is appended to the root on first use.
pub fn with_asset(root: &Element, include: &str) -> Option<Element> {
    if contains_include(root, trim_include(include)) {
        return None;
    }
    let mut doc = root.clone();
    insert_asset(&mut doc, include);
    Some(doc)
}

fn trim_include(include: &str) -> &str {
    include.trim_matches(|c: char| c == '/' || c == '\\')
}

/// In-place form of [`with_asset`]. Returns whether an entry was added.
fn insert_asset(root: &mut Element, include: &str) -> bool {
    let include = trim_include(include);
    if contains_include(root, include) {
        return false;
    }

    if find_pipeline_group(root).is_none() {
        root.children.push(XMLNode::Element(pipeline_group()));
    }
    match find_pipeline_group_mut(root) {
        Some(group) => {
            group.children.push(XMLNode::Element(none_entry(include)));
            true
        }
        None => false,
    }
}
