//! Topology library backed by a directory of JSON documents.
//!
//! Every `*.json` file under the registry directory describes one topology:
//! a `geometry` object with default parameters plus a `logic` object of
//! declarative generator programs, and an optional `meta` object carrying
//! the catalog fields (category, label, description, parameter list).
//! Documents are data, not code; programs are small expressions compiled by
//! [`crate::expr`], so a library file can never execute anything beyond
//! arithmetic.
//!
//! `reload` rescans the directory and replaces the whole table. Malformed
//! files are skipped and reported as [`RegistryEvent`]s so one broken
//! document never takes the library down.

use std::collections::HashMap;
use std::f64::consts::PI;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use rand::{Rng, RngCore};
use serde_json::{json, Map, Value};

use crate::config::{int, num, numeric_entries, text};
use crate::expr::{Chain, Expr, ExprError, Scope};
use crate::generators::{self, GeneratorFn};
use crate::point::Point3;

/// Category assigned to documents that declare none and sit at the
/// directory root.
pub const DEFAULT_CATEGORY: &str = "Library";

/// Point count used when neither the request, the document defaults nor the
/// cap pin one down.
const FALLBACK_TARGET: usize = 4096;

#[derive(Debug)]
pub enum RegistryError {
    Io(std::io::Error),
    /// `export_file` or `import_file` referenced a topology that is not in
    /// the table.
    UnknownTopology(String),
    /// `import_file` would overwrite an existing document and `overwrite`
    /// was not set.
    AlreadyExists(PathBuf),
    /// The file exists but does not describe a loadable topology.
    InvalidDocument { path: PathBuf, reason: String },
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "registry i/o error: {err}"),
            Self::UnknownTopology(name) => write!(f, "unknown topology `{name}`"),
            Self::AlreadyExists(path) => {
                write!(f, "`{}` already exists in the library", path.display())
            }
            Self::InvalidDocument { path, reason } => {
                write!(f, "invalid topology document `{}`: {reason}", path.display())
            }
        }
    }
}

impl std::error::Error for RegistryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for RegistryError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

/// Non-fatal observations collected during a reload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RegistryEvent {
    /// A file could not be loaded and was left out of the table.
    SkippedFile { path: PathBuf, reason: String },
    /// Two documents declared the same topology name; the later file wins.
    DuplicateName {
        name: String,
        kept: PathBuf,
        replaced: PathBuf,
    },
}

/// One loaded topology document. Immutable once built; `reload` swaps the
/// whole table instead of mutating entries.
#[derive(Clone, Debug)]
pub struct TopologyDefinition {
    pub name: String,
    pub path: PathBuf,
    /// The document's `geometry` object as loaded, including `logic` and
    /// `topology`.
    pub geometry: Map<String, Value>,
    pub category: String,
    pub label: String,
    pub description: String,
    pub parameter_names: Vec<String>,
}

impl TopologyDefinition {
    /// Default parameter values, without the bookkeeping keys.
    pub fn defaults(&self) -> Map<String, Value> {
        self.geometry
            .iter()
            .filter(|(key, _)| key.as_str() != "logic" && key.as_str() != "topology")
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }

    /// Parameter names to expose for editing: the explicit `meta.parameters`
    /// list when present, otherwise the default keys in sorted order.
    pub fn parameters(&self) -> Vec<String> {
        if !self.parameter_names.is_empty() {
            return self.parameter_names.clone();
        }
        let mut names: Vec<String> = self.defaults().keys().cloned().collect();
        names.sort();
        names
    }

    /// Reconstructs the on-disk document shape for this definition.
    pub fn raw_payload(&self) -> Value {
        json!({
            "geometry": Value::Object(self.geometry.clone()),
            "meta": {
                "category": self.category,
                "label": self.label,
                "description": self.description,
                "parameters": self.parameter_names,
            },
        })
    }

    /// Compiles this definition's entry program.
    ///
    /// The entry point is the program named `generate_{name}`; when that is
    /// absent the first program in the `logic` object is used.
    pub fn compile(&self) -> Result<DeclarativeGenerator, ExprError> {
        let logic = match self.geometry.get("logic") {
            Some(Value::Object(map)) if !map.is_empty() => map,
            _ => return Err(ExprError::Parse("missing `logic` programs".into())),
        };
        let entry_name = format!("generate_{}", self.name);
        let program = logic
            .get(&entry_name)
            .or_else(|| logic.values().next())
            .ok_or_else(|| ExprError::Parse("empty `logic` object".into()))?;
        let program = compile_program(program)?;
        Ok(DeclarativeGenerator {
            program,
            defaults: self.defaults(),
        })
    }
}

#[derive(Clone, Debug)]
enum Program {
    /// Sweeps `t` over `[0, 1]`; expressions also see `i` and `n`.
    Curve { x: Expr, y: Expr, z: Expr },
    /// Sweeps `u` over `[0, 2π)` and `v` over `[0, π]` on a lat/lon grid.
    Surface { x: Expr, y: Expr, z: Expr },
    /// Rejection-samples `|f(x, y, z)| <= thickness * R` in the bounding
    /// cube, with the same attempts budget as the built-in implicit
    /// surfaces.
    Implicit { f: Expr, thickness: f64 },
}

fn compile_program(program: &Value) -> Result<Program, ExprError> {
    let field = |key: &str| -> Result<Expr, ExprError> {
        match program.get(key) {
            Some(Value::String(src)) if !src.trim().is_empty() => Expr::parse(src),
            _ => Err(ExprError::Parse(format!("program is missing `{key}`"))),
        }
    };
    match text(program, "kind", "") {
        "curve" => Ok(Program::Curve {
            x: field("x")?,
            y: field("y")?,
            z: field("z")?,
        }),
        "surface" => Ok(Program::Surface {
            x: field("x")?,
            y: field("y")?,
            z: field("z")?,
        }),
        "implicit" => Ok(Program::Implicit {
            f: field("f")?,
            thickness: num(program, "thickness", 0.05).abs().max(1e-6),
        }),
        other => Err(ExprError::Parse(format!(
            "unknown program kind `{other}`"
        ))),
    }
}

/// A compiled library topology, ready to emit points.
#[derive(Clone, Debug)]
pub struct DeclarativeGenerator {
    program: Program,
    defaults: Map<String, Value>,
}

impl DeclarativeGenerator {
    /// Resolves the target point count: the request's `N`, then the
    /// document default, then the cap, then a fixed fallback; always capped.
    fn target_count(&self, geo: &Value, cap: usize) -> usize {
        let requested = int(geo, "N", 0).max(0) as usize;
        let default_n = int(&Value::Object(self.defaults.clone()), "N", 0).max(0) as usize;
        let mut target = if requested > 0 {
            requested
        } else if default_n > 0 {
            default_n
        } else if cap > 0 {
            cap
        } else {
            FALLBACK_TARGET
        };
        if cap > 0 {
            target = target.min(cap);
        }
        target
    }

    /// Evaluates the program against `geo`, falling back to the document
    /// defaults for any parameter the request leaves unset.
    pub fn generate(&self, geo: &Value, cap: usize, rng: &mut dyn RngCore) -> Vec<Point3> {
        let count = self.target_count(geo, cap).max(1);
        let radius = num(geo, "R", num(&Value::Object(self.defaults.clone()), "R", 1.0));
        let mut params: HashMap<String, f64> = numeric_entries(&Value::Object(self.defaults.clone()))
            .into_iter()
            .collect();
        for (key, value) in numeric_entries(geo) {
            params.insert(key, value);
        }
        let mut out = Vec::with_capacity(count);
        match &self.program {
            Program::Curve { x, y, z } => {
                let n = count.max(2);
                for i in 0..n {
                    let t = i as f64 / (n - 1) as f64;
                    let vars = [("t", t), ("i", i as f64), ("n", n as f64)];
                    let scope = Chain {
                        first: &vars,
                        second: &params,
                    };
                    if let Some(point) = eval_point(x, y, z, &scope) {
                        out.push(point);
                    }
                }
            }
            Program::Surface { x, y, z } => {
                // Grid shape follows the document's lat/lon when present.
                let lat = resolve_grid(&params, "lat", (count as f64 / 2.0).sqrt());
                let lon = resolve_grid(&params, "lon", 2.0 * (count as f64 / 2.0).sqrt());
                'rows: for row in 0..lat {
                    let v = PI * row as f64 / (lat - 1).max(1) as f64;
                    for col in 0..lon {
                        let u = 2.0 * PI * col as f64 / lon as f64;
                        let vars = [("u", u), ("v", v)];
                        let scope = Chain {
                            first: &vars,
                            second: &params,
                        };
                        if let Some(point) = eval_point(x, y, z, &scope) {
                            out.push(point);
                        }
                        if out.len() >= count {
                            break 'rows;
                        }
                    }
                }
            }
            Program::Implicit { f, thickness } => {
                let band = thickness * radius.abs().max(1e-6);
                let half = radius.abs().max(1e-6);
                let max_attempts = (count * 60).max(1000);
                let mut attempts = 0;
                while out.len() < count && attempts < max_attempts {
                    attempts += 1;
                    let x = rng.random_range(-half..=half);
                    let y = rng.random_range(-half..=half);
                    let z = rng.random_range(-half..=half);
                    let vars = [("x", x), ("y", y), ("z", z)];
                    let scope = Chain {
                        first: &vars,
                        second: &params,
                    };
                    if let Ok(value) = f.eval(&scope) {
                        if value.is_finite() && value.abs() <= band {
                            out.push(Point3::new(x, y, z));
                        }
                    }
                }
            }
        }
        if cap > 0 {
            out.truncate(cap);
        }
        out
    }
}

fn eval_point(x: &Expr, y: &Expr, z: &Expr, scope: &dyn Scope) -> Option<Point3> {
    let px = x.eval(scope).ok()?;
    let py = y.eval(scope).ok()?;
    let pz = z.eval(scope).ok()?;
    if px.is_finite() && py.is_finite() && pz.is_finite() {
        Some(Point3::new(px, py, pz))
    } else {
        None
    }
}

fn resolve_grid(params: &HashMap<String, f64>, key: &str, derived: f64) -> usize {
    let value = params.get(key).copied().unwrap_or(0.0);
    let value = if value >= 2.0 { value } else { derived };
    (value.round() as usize).max(2)
}

/// A generator resolved by name: either one of the built-in families or a
/// compiled library document.
#[derive(Clone)]
pub enum Generator {
    Builtin(GeneratorFn),
    Declarative(DeclarativeGenerator),
}

impl Generator {
    pub fn generate(&self, geo: &Value, cap: usize, rng: &mut dyn RngCore) -> Vec<Point3> {
        match self {
            Self::Builtin(f) => f(geo, cap, rng),
            Self::Declarative(compiled) => compiled.generate(geo, cap, rng),
        }
    }
}

/// The loaded topology table plus the directory it mirrors.
pub struct TopologyRegistry {
    directory: PathBuf,
    definitions: HashMap<String, TopologyDefinition>,
    category_order: Vec<String>,
    events: Vec<RegistryEvent>,
}

impl TopologyRegistry {
    /// Opens (creating if needed) a registry directory and loads it.
    pub fn new(directory: impl Into<PathBuf>) -> Result<Self, RegistryError> {
        let directory = directory.into();
        fs::create_dir_all(&directory)?;
        let mut registry = Self {
            directory,
            definitions: HashMap::new(),
            category_order: Vec::new(),
            events: Vec::new(),
        };
        registry.reload()?;
        Ok(registry)
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Rescans the directory and replaces the definition table. Files that
    /// fail to load are recorded in [`events`](Self::events) and skipped.
    pub fn reload(&mut self) -> Result<(), RegistryError> {
        let mut files = Vec::new();
        collect_json_files(&self.directory, &mut files)?;
        files.sort();

        let mut definitions: HashMap<String, TopologyDefinition> = HashMap::new();
        let mut category_order = Vec::new();
        let mut events = Vec::new();
        for path in files {
            match load_definition(&self.directory, &path) {
                Ok(definition) => {
                    if !category_order.contains(&definition.category) {
                        category_order.push(definition.category.clone());
                    }
                    if let Some(previous) =
                        definitions.insert(definition.name.clone(), definition)
                    {
                        let kept = definitions[&previous.name].path.clone();
                        events.push(RegistryEvent::DuplicateName {
                            name: previous.name,
                            kept,
                            replaced: previous.path,
                        });
                    }
                }
                Err(reason) => {
                    events.push(RegistryEvent::SkippedFile { path, reason });
                }
            }
        }
        self.definitions = definitions;
        self.category_order = category_order;
        self.events = events;
        Ok(())
    }

    /// Observations from the most recent reload.
    pub fn events(&self) -> &[RegistryEvent] {
        &self.events
    }

    pub fn get(&self, name: &str) -> Option<&TopologyDefinition> {
        self.definitions.get(name)
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// All loaded topology names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.definitions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Categories in the order they were first encountered on disk.
    pub fn categories(&self) -> &[String] {
        &self.category_order
    }

    /// Definitions for one category, sorted by display label.
    pub fn definitions_for_category(&self, category: &str) -> Vec<&TopologyDefinition> {
        let mut group: Vec<&TopologyDefinition> = self
            .definitions
            .values()
            .filter(|definition| definition.category == category)
            .collect();
        group.sort_by_key(|definition| definition.label.to_lowercase());
        group
    }

    /// The whole catalog grouped by category, for menu building.
    pub fn grouped_definitions(&self) -> Vec<(&str, Vec<&TopologyDefinition>)> {
        self.category_order
            .iter()
            .map(|category| (category.as_str(), self.definitions_for_category(category)))
            .collect()
    }

    /// Copies an external document into the library and reloads.
    ///
    /// Fails with [`RegistryError::AlreadyExists`] when a file of the same
    /// name is present and `overwrite` is false. Returns the freshly loaded
    /// definition.
    pub fn import_file(
        &mut self,
        source: &Path,
        overwrite: bool,
    ) -> Result<TopologyDefinition, RegistryError> {
        // Validate before touching the library directory.
        let candidate =
            load_definition(&self.directory, source).map_err(|reason| {
                RegistryError::InvalidDocument {
                    path: source.to_path_buf(),
                    reason,
                }
            })?;
        let file_name = source
            .file_name()
            .ok_or_else(|| RegistryError::InvalidDocument {
                path: source.to_path_buf(),
                reason: "source has no file name".into(),
            })?;
        let target = self.directory.join(file_name);
        if target.exists() && !overwrite {
            return Err(RegistryError::AlreadyExists(target));
        }
        fs::copy(source, &target)?;
        self.reload()?;
        self.get(&candidate.name)
            .cloned()
            .ok_or(RegistryError::UnknownTopology(candidate.name))
    }

    /// Copies one library document out to `destination` (a directory).
    /// Returns the path written.
    pub fn export_file(&self, name: &str, destination: &Path) -> Result<PathBuf, RegistryError> {
        let definition = self
            .get(name)
            .ok_or_else(|| RegistryError::UnknownTopology(name.to_string()))?;
        let file_name = definition
            .path
            .file_name()
            .ok_or_else(|| RegistryError::InvalidDocument {
                path: definition.path.clone(),
                reason: "definition has no file name".into(),
            })?;
        fs::create_dir_all(destination)?;
        let target = destination.join(file_name);
        fs::copy(&definition.path, &target)?;
        Ok(target)
    }

    /// Compiles every loaded definition. A failed compilation drops that
    /// one entry and never aborts the rest.
    pub fn generators(&self) -> HashMap<String, Generator> {
        let mut out = HashMap::new();
        for (name, definition) in &self.definitions {
            if let Ok(compiled) = definition.compile() {
                out.insert(name.clone(), Generator::Declarative(compiled));
            }
        }
        out
    }

    /// Looks a generator up by name: library documents shadow built-ins,
    /// and a document that fails to compile falls through to the built-in
    /// of the same name when one exists.
    pub fn resolve(&self, name: &str) -> Option<Generator> {
        if let Some(definition) = self.definitions.get(name) {
            if let Ok(compiled) = definition.compile() {
                return Some(Generator::Declarative(compiled));
            }
        }
        generators::builtin(name).map(Generator::Builtin)
    }
}

fn collect_json_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<(), RegistryError> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            collect_json_files(&path, out)?;
        } else if path.extension().is_some_and(|ext| ext == "json") {
            out.push(path);
        }
    }
    Ok(())
}

fn load_definition(root: &Path, path: &Path) -> Result<TopologyDefinition, String> {
    let raw = fs::read_to_string(path).map_err(|err| format!("read failed: {err}"))?;
    let payload: Value =
        serde_json::from_str(&raw).map_err(|err| format!("invalid JSON: {err}"))?;
    let geometry = match payload.get("geometry") {
        Some(Value::Object(map)) => map.clone(),
        _ => return Err("missing `geometry` object".into()),
    };
    match geometry.get("logic") {
        Some(Value::Object(map)) if !map.is_empty() => {}
        _ => return Err("missing or empty `logic` object".into()),
    }

    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_string();
    let name = match geometry.get("topology") {
        Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
        _ => stem,
    };
    if name.is_empty() {
        return Err("document has no usable name".into());
    }

    let meta = payload.get("meta").cloned().unwrap_or(Value::Null);
    let category = {
        let explicit = text(&meta, "category", "").trim().to_string();
        if !explicit.is_empty() {
            explicit
        } else {
            category_from_path(root, path)
        }
    };
    let label = {
        let explicit = text(&meta, "label", "").trim().to_string();
        if explicit.is_empty() {
            name.clone()
        } else {
            explicit
        }
    };
    let description = text(&meta, "description", "").trim().to_string();
    let parameter_names = match meta.get("parameters") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| item.as_str())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    };

    Ok(TopologyDefinition {
        name,
        path: path.to_path_buf(),
        geometry,
        category,
        label,
        description,
        parameter_names,
    })
}

/// Derives a category from the document's position under the registry
/// root: sub-directory names joined with " / ", or the default category
/// for files at the root (and for imports living outside it).
fn category_from_path(root: &Path, path: &Path) -> String {
    let relative = match path.strip_prefix(root) {
        Ok(relative) => relative,
        Err(_) => return DEFAULT_CATEGORY.to_string(),
    };
    let parts: Vec<&str> = relative
        .parent()
        .map(|parent| {
            parent
                .components()
                .filter_map(|c| c.as_os_str().to_str())
                .collect()
        })
        .unwrap_or_default();
    if parts.is_empty() {
        DEFAULT_CATEGORY.to_string()
    } else {
        parts.join(" / ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use tempfile::TempDir;

    fn write_doc(dir: &Path, rel: &str, payload: &Value) -> PathBuf {
        let path = dir.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, serde_json::to_string_pretty(payload).unwrap()).unwrap();
        path
    }

    fn ring_doc(name: &str) -> Value {
        json!({
            "geometry": {
                "topology": name,
                "R": 1.0,
                "N": 32,
                "logic": {
                    (format!("generate_{name}")): {
                        "kind": "curve",
                        "x": "R * cos(tau * t)",
                        "y": "0",
                        "z": "R * sin(tau * t)",
                    },
                },
            },
            "meta": {
                "category": "Curves",
                "label": "Unit Ring",
                "description": "A flat circle.",
                "parameters": ["R", "N"],
            },
        })
    }

    #[test]
    fn loads_documents_and_builds_the_catalog() {
        let dir = TempDir::new().unwrap();
        write_doc(dir.path(), "ring.json", &ring_doc("ring"));
        write_doc(
            dir.path(),
            "shells/orb.json",
            &json!({
                "geometry": {
                    "R": 1.0,
                    "logic": {
                        "main": {"kind": "surface",
                                 "x": "R * sin(v) * cos(u)",
                                 "y": "R * cos(v)",
                                 "z": "R * sin(v) * sin(u)"},
                    },
                },
            }),
        );

        let registry = TopologyRegistry::new(dir.path()).unwrap();
        assert_eq!(registry.names(), vec!["orb", "ring"]);
        assert!(registry.events().is_empty());

        let ring = registry.get("ring").unwrap();
        assert_eq!(ring.category, "Curves");
        assert_eq!(ring.label, "Unit Ring");
        assert_eq!(ring.parameters(), vec!["R", "N"]);
        assert!(!ring.defaults().contains_key("logic"));
        assert!(!ring.defaults().contains_key("topology"));

        // Name and category fall back to the file stem and sub-path.
        let orb = registry.get("orb").unwrap();
        assert_eq!(orb.category, "shells");
        assert_eq!(orb.label, "orb");
    }

    #[test]
    fn malformed_files_are_skipped_with_events() {
        let dir = TempDir::new().unwrap();
        write_doc(dir.path(), "good.json", &ring_doc("good"));
        fs::write(dir.path().join("broken.json"), "{ not json").unwrap();
        write_doc(dir.path(), "nologic.json", &json!({"geometry": {"R": 1.0}}));

        let registry = TopologyRegistry::new(dir.path()).unwrap();
        assert_eq!(registry.names(), vec!["good"]);
        assert_eq!(registry.events().len(), 2);
        assert!(registry.events().iter().all(|event| matches!(
            event,
            RegistryEvent::SkippedFile { .. }
        )));
    }

    #[test]
    fn duplicate_names_keep_the_later_file() {
        let dir = TempDir::new().unwrap();
        write_doc(dir.path(), "a_ring.json", &ring_doc("ring"));
        let mut second = ring_doc("ring");
        second["meta"]["label"] = json!("Second Ring");
        write_doc(dir.path(), "z_ring.json", &second);

        let registry = TopologyRegistry::new(dir.path()).unwrap();
        assert_eq!(registry.get("ring").unwrap().label, "Second Ring");
        assert!(matches!(
            registry.events()[0],
            RegistryEvent::DuplicateName { ref name, .. } if name == "ring"
        ));
    }

    #[test]
    fn curve_program_emits_the_parametric_sweep() {
        let dir = TempDir::new().unwrap();
        write_doc(dir.path(), "ring.json", &ring_doc("ring"));
        let registry = TopologyRegistry::new(dir.path()).unwrap();

        let generator = registry.resolve("ring").unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        let points = generator.generate(&json!({"R": 2.0, "N": 16}), 0, &mut rng);
        assert_eq!(points.len(), 16);
        for p in &points {
            assert!(((p.x * p.x + p.z * p.z).sqrt() - 2.0).abs() < 1e-9);
            assert_eq!(p.y, 0.0);
        }
    }

    #[test]
    fn implicit_program_respects_the_band() {
        let dir = TempDir::new().unwrap();
        write_doc(
            dir.path(),
            "shell.json",
            &json!({
                "geometry": {
                    "topology": "shell",
                    "R": 1.0,
                    "logic": {
                        "generate_shell": {
                            "kind": "implicit",
                            "f": "sqrt(x^2 + y^2 + z^2) - 0.7",
                            "thickness": 0.04,
                        },
                    },
                },
            }),
        );
        let registry = TopologyRegistry::new(dir.path()).unwrap();
        let generator = registry.resolve("shell").unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        let points = generator.generate(&json!({"R": 1.0, "N": 200}), 0, &mut rng);
        assert!(!points.is_empty());
        for p in &points {
            assert!((p.length() - 0.7).abs() <= 0.04 + 1e-12);
        }
    }

    #[test]
    fn target_count_falls_back_through_defaults_and_cap() {
        let doc = ring_doc("ring");
        let definition = TopologyDefinition {
            name: "ring".into(),
            path: PathBuf::from("ring.json"),
            geometry: doc["geometry"].as_object().unwrap().clone(),
            category: "Curves".into(),
            label: "ring".into(),
            description: String::new(),
            parameter_names: Vec::new(),
        };
        let compiled = definition.compile().unwrap();
        // Explicit request wins, capped.
        assert_eq!(compiled.target_count(&json!({"N": 100}), 40), 40);
        // Document default (N = 32) when the request is silent.
        assert_eq!(compiled.target_count(&json!({}), 0), 32);
        // Cap, then the fixed fallback, when nothing else pins it down.
        let bare = TopologyDefinition {
            geometry: Map::new(),
            ..definition
        };
        // A definition with no logic cannot compile; build the generator
        // directly to probe count resolution.
        let generator = DeclarativeGenerator {
            program: compiled.program.clone(),
            defaults: bare.defaults(),
        };
        assert_eq!(generator.target_count(&json!({}), 500), 500);
        assert_eq!(generator.target_count(&json!({}), 0), FALLBACK_TARGET);
    }

    #[test]
    fn import_respects_the_overwrite_flag_and_export_round_trips() {
        let library = TempDir::new().unwrap();
        let outside = TempDir::new().unwrap();
        let source = write_doc(outside.path(), "ring.json", &ring_doc("ring"));

        let mut registry = TopologyRegistry::new(library.path()).unwrap();
        let imported = registry.import_file(&source, false).unwrap();
        assert_eq!(imported.name, "ring");
        assert!(registry.get("ring").is_some());

        // Second import of the same file name requires overwrite.
        assert!(matches!(
            registry.import_file(&source, false),
            Err(RegistryError::AlreadyExists(_))
        ));
        assert!(registry.import_file(&source, true).is_ok());

        let exported = registry.export_file("ring", outside.path().join("out").as_path());
        let exported = exported.unwrap();
        assert!(exported.ends_with("out/ring.json"));
        let reread = load_definition(library.path(), &exported).unwrap();
        assert_eq!(reread.name, "ring");
    }

    #[test]
    fn broken_logic_falls_back_to_a_builtin_of_the_same_name() {
        let dir = TempDir::new().unwrap();
        write_doc(
            dir.path(),
            "torus.json",
            &json!({
                "geometry": {
                    "topology": "torus",
                    "logic": {"generate_torus": {"kind": "curve", "x": "((", "y": "0", "z": "0"}},
                },
            }),
        );
        let registry = TopologyRegistry::new(dir.path()).unwrap();
        // The document loads (structurally valid) but does not compile.
        assert!(registry.get("torus").is_some());
        assert!(registry.generators().is_empty());
        // resolve() still finds the built-in torus.
        let generator = registry.resolve("torus").unwrap();
        assert!(matches!(generator, Generator::Builtin(_)));
        // And a name known nowhere resolves to nothing.
        assert!(registry.resolve("no_such_topology").is_none());
    }
}
