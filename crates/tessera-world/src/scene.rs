//! Scene persistence.
//!
//! A scene document lists entities in creation order, each as its name plus
//! an entity template built from the live component state:
//!
//! ```json
//! { "Entities": [
//!     { "Name": "player", "GameObject": { "Components": { ... } } }
//! ] }
//! ```
//!
//! Only components registered with the world's
//! [`ComponentRegistry`](crate::ComponentRegistry) are written; an entity
//! holding two components of the same class keeps the first one's state.

use std::fs;
use std::path::Path;

use serde_json::{Map, Value};

use crate::factory::EntityTemplate;
use crate::handle::Handle;
use crate::world::World;
use crate::SceneError;

const ENTITIES_KEY: &str = "Entities";
const NAME_KEY: &str = "Name";

/// One entity of a scene: its name and its components.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneEntry {
    pub name: String,
    pub template: EntityTemplate,
}

/// Ordered list of entities making up a scene.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SceneDocument {
    pub entities: Vec<SceneEntry>,
}

impl SceneDocument {
    /// Number of entities.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Whether the scene has no entities.
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// The `{ "Entities": [...] }` document for this scene.
    pub fn to_value(&self) -> Value {
        let entities = self
            .entities
            .iter()
            .map(|entry| {
                let mut object = match entry.template.to_value() {
                    Value::Object(object) => object,
                    _ => Map::new(),
                };
                object.insert(NAME_KEY.to_owned(), Value::String(entry.name.clone()));
                Value::Object(object)
            })
            .collect();
        let mut document = Map::new();
        document.insert(ENTITIES_KEY.to_owned(), Value::Array(entities));
        Value::Object(document)
    }

    /// Read a scene from its JSON document.
    pub fn from_value(document: &Value) -> Result<Self, SceneError> {
        let entries = document
            .get(ENTITIES_KEY)
            .and_then(Value::as_array)
            .ok_or_else(|| SceneError::Malformed(format!("missing '{ENTITIES_KEY}' array")))?;

        let entities = entries
            .iter()
            .enumerate()
            .map(|(index, entry)| {
                let name = entry
                    .get(NAME_KEY)
                    .and_then(Value::as_str)
                    .ok_or_else(|| {
                        SceneError::Malformed(format!("entity {index} has no '{NAME_KEY}' string"))
                    })?;
                let template = EntityTemplate::from_value(entry).map_err(|error| {
                    SceneError::Malformed(format!("entity {index} ('{name}'): {error}"))
                })?;
                Ok(SceneEntry {
                    name: name.to_owned(),
                    template,
                })
            })
            .collect::<Result<Vec<_>, SceneError>>()?;

        Ok(Self { entities })
    }

    /// Read a scene file.
    pub fn load(path: &Path) -> Result<Self, SceneError> {
        let text = fs::read_to_string(path).map_err(|source| SceneError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let document: Value = serde_json::from_str(&text).map_err(|source| SceneError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_value(&document)
    }

    /// Write this scene to a file as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> Result<(), SceneError> {
        let text = serde_json::to_string_pretty(&self.to_value()).map_err(|source| {
            SceneError::Json {
                path: path.to_path_buf(),
                source,
            }
        })?;
        fs::write(path, text).map_err(|source| SceneError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl World {
    /// Capture every live entity's registered components.
    pub fn save_scene(&self) -> SceneDocument {
        let entities = self
            .entities()
            .map(|entity| {
                let mut template = EntityTemplate::new();
                for component in entity.components() {
                    let Some(info) = self.components().info_of(component) else {
                        continue;
                    };
                    if template.components().contains_key(info.name()) {
                        continue;
                    }
                    match info.meta.serialize_any(component.as_any()) {
                        Ok(fields) => template.insert(info.name(), fields),
                        Err(error) => tracing::warn!(
                            entity = ?entity.handle(),
                            component = info.name(),
                            %error,
                            "failed to serialize component; leaving it out of the scene"
                        ),
                    }
                }
                SceneEntry {
                    name: entity.name().to_owned(),
                    template,
                }
            })
            .collect();
        SceneDocument { entities }
    }

    /// Create one entity per scene entry, in order.
    ///
    /// Entries that do not fit in the world yield [`Handle::NULL`].
    pub fn load_scene(&mut self, scene: &SceneDocument) -> Vec<Handle> {
        let handles: Vec<Handle> = scene
            .entities
            .iter()
            .map(|entry| self.create_from_template(&entry.template, entry.name.clone()))
            .collect();
        tracing::debug!(
            entities = handles.len(),
            created = handles.iter().filter(|h| !h.is_null()).count(),
            "loaded scene"
        );
        handles
    }

    /// Save the current scene to a file.
    pub fn save_scene_to(&self, path: impl AsRef<Path>) -> Result<(), SceneError> {
        self.save_scene().save(path.as_ref())
    }

    /// Load a scene file into the world.
    pub fn load_scene_from(&mut self, path: impl AsRef<Path>) -> Result<Vec<Handle>, SceneError> {
        let scene = SceneDocument::load(path.as_ref())?;
        Ok(self.load_scene(&scene))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
