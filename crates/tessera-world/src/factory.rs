//! Entity templates and the factory that turns them into entities.
//!
//! A template is a JSON document of the form
//!
//! ```json
//! { "GameObject": { "Components": { "TransformComponent": { ... } } } }
//! ```
//!
//! Each key under `Components` names a reflected component class; its value
//! is deserialized into a fresh instance of that class. Content problems
//! (missing file, bad JSON, unknown class, wrong field shapes) are logged
//! and skipped so the entity is still produced.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::arena::{Arena, SlotIndex};
use crate::component::ComponentRegistry;
use crate::entity::Entity;
use crate::transform::Transform;
use crate::TemplateError;

const GAME_OBJECT_KEY: &str = "GameObject";
const COMPONENTS_KEY: &str = "Components";

// ---------------------------------------------------------------------------
// EntityTemplate
// ---------------------------------------------------------------------------

/// Parsed entity template: component class name -> field document.
///
/// Component order is preserved from the source document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityTemplate {
    components: Map<String, Value>,
}

impl EntityTemplate {
    /// Create a template with no components.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) the document for a component class.
    pub fn with_component(mut self, class: impl Into<String>, fields: Value) -> Self {
        self.insert(class, fields);
        self
    }

    /// Add (or replace) the document for a component class.
    pub fn insert(&mut self, class: impl Into<String>, fields: Value) {
        self.components.insert(class.into(), fields);
    }

    /// Component documents keyed by class name, in source order.
    pub fn components(&self) -> &Map<String, Value> {
        &self.components
    }

    /// Whether the template lists no components.
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Read the `GameObject.Components` object out of a template document.
    pub fn from_value(document: &Value) -> Result<Self, TemplateError> {
        let game_object = document
            .get(GAME_OBJECT_KEY)
            .and_then(Value::as_object)
            .ok_or(TemplateError::MissingGameObject)?;
        let components = match game_object.get(COMPONENTS_KEY) {
            None => Map::new(),
            Some(Value::Object(components)) => components.clone(),
            Some(_) => return Err(TemplateError::InvalidComponents),
        };
        Ok(Self { components })
    }

    /// The full `GameObject` document for this template.
    pub fn to_value(&self) -> Value {
        let mut game_object = Map::new();
        game_object.insert(
            COMPONENTS_KEY.to_owned(),
            Value::Object(self.components.clone()),
        );
        let mut document = Map::new();
        document.insert(GAME_OBJECT_KEY.to_owned(), Value::Object(game_object));
        Value::Object(document)
    }

    /// Read a template file.
    pub fn load(path: &Path) -> Result<Self, TemplateError> {
        let text = fs::read_to_string(path).map_err(|source| TemplateError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let document: Value = serde_json::from_str(&text).map_err(|source| TemplateError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_value(&document)
    }

    /// Write this template to a file as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> Result<(), TemplateError> {
        let text = serde_json::to_string_pretty(&self.to_value()).map_err(|source| {
            TemplateError::Json {
                path: path.to_path_buf(),
                source,
            }
        })?;
        fs::write(path, text).map_err(|source| TemplateError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

// ---------------------------------------------------------------------------
// EntityFactory
// ---------------------------------------------------------------------------

/// Builds entities from templates inside an arena.
pub struct EntityFactory;

impl EntityFactory {
    /// Allocate an entity and populate it from the template file at `path`.
    ///
    /// An empty path means no template. A template that cannot be read or
    /// parsed yields an entity with only the default transform. Returns
    /// `None` only when the arena is full.
    pub fn create(
        arena: &mut Arena<Entity>,
        components: &ComponentRegistry,
        path: &Path,
    ) -> Option<SlotIndex> {
        if arena.is_full() {
            return None;
        }
        let template = if path.as_os_str().is_empty() {
            None
        } else {
            match EntityTemplate::load(path) {
                Ok(template) => Some(template),
                Err(error) => {
                    tracing::warn!(
                        template = %path.display(),
                        %error,
                        "failed to load entity template; creating an empty entity"
                    );
                    None
                }
            }
        };
        Self::build(arena, components, template.as_ref(), Some(path))
    }

    /// Allocate an entity and populate it from an in-memory template.
    pub fn create_from_template(
        arena: &mut Arena<Entity>,
        components: &ComponentRegistry,
        template: &EntityTemplate,
    ) -> Option<SlotIndex> {
        if arena.is_full() {
            return None;
        }
        Self::build(arena, components, Some(template), None)
    }

    /// Release the entity at `slot` back to the arena.
    pub fn destroy(arena: &mut Arena<Entity>, slot: SlotIndex) -> Option<Entity> {
        arena.remove(slot)
    }

    fn build(
        arena: &mut Arena<Entity>,
        components: &ComponentRegistry,
        template: Option<&EntityTemplate>,
        source: Option<&Path>,
    ) -> Option<SlotIndex> {
        let mut entity = Entity::new();
        if let Some(template) = template {
            populate(&mut entity, components, template, source);
        }
        if !entity.has_component::<Transform>() {
            entity.add_component(Transform::default());
        }
        arena.insert(entity)
    }
}

fn populate(
    entity: &mut Entity,
    components: &ComponentRegistry,
    template: &EntityTemplate,
    source: Option<&Path>,
) {
    let source = source.map(PathBuf::from).unwrap_or_default();
    for (class_name, fields) in template.components() {
        let Some(class) = tessera_meta::find_meta_class(class_name) else {
            tracing::warn!(
                template = %source.display(),
                component = %class_name,
                "unknown component class; skipping"
            );
            continue;
        };
        let Some(info) = components.get_by_type(class.type_id()) else {
            tracing::warn!(
                template = %source.display(),
                component = %class_name,
                "class is not a registered component; skipping"
            );
            continue;
        };

        let mut component = (info.construct)();
        if let Err(error) = class.deserialize_any((*component).as_any_mut(), fields) {
            tracing::warn!(
                template = %source.display(),
                component = %class_name,
                %error,
                "component fields did not match their types; keeping defaults"
            );
        }
        entity.add_boxed(component);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collider::Collider;
    use crate::test_support::{install_registry, template_dir, Recorder};
    use crate::transform::Vec3;
    use serde_json::json;

    fn registry() -> ComponentRegistry {
        install_registry();
        let mut registry = ComponentRegistry::new();
        registry.register::<Transform>();
        registry.register::<Collider>();
        registry.register::<Recorder>();
        registry
    }

    #[test]
    fn template_from_value() {
        let template = EntityTemplate::from_value(&json!({
            "GameObject": { "Components": { "ColliderComponent": {}, "TransformComponent": {} } }
        }))
        .unwrap();
        let names: Vec<_> = template.components().keys().cloned().collect();
        assert_eq!(names, vec!["ColliderComponent", "TransformComponent"]);
        assert_eq!(EntityTemplate::from_value(&template.to_value()).unwrap(), template);
    }

    #[test]
    fn template_schema_errors() {
        assert!(matches!(
            EntityTemplate::from_value(&json!({ "Components": {} })),
            Err(TemplateError::MissingGameObject)
        ));
        assert!(matches!(
            EntityTemplate::from_value(&json!({ "GameObject": { "Components": [] } })),
            Err(TemplateError::InvalidComponents)
        ));
        assert!(EntityTemplate::from_value(&json!({ "GameObject": {} }))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn builds_components_in_template_order() {
        let components = registry();
        let mut arena = Arena::new(4);
        let template = EntityTemplate::new()
            .with_component(
                "ColliderComponent",
                json!({ "Extend": { "x": 1.0, "y": 2.0, "z": 3.0 } }),
            )
            .with_component("TransformComponent", json!({ "Position": { "x": 5.0 } }));

        let slot = EntityFactory::create_from_template(&mut arena, &components, &template).unwrap();
        let entity = arena.get(slot).unwrap();
        assert_eq!(entity.component_count(), 2);
        assert_eq!(
            entity.component::<Collider>().unwrap().extend,
            Vec3::new(1.0, 2.0, 3.0)
        );
        assert_eq!(entity.component::<Transform>().unwrap().position.x, 5.0);
    }

    #[test]
    fn synthesizes_missing_transform() {
        let components = registry();
        let mut arena = Arena::new(1);
        let template = EntityTemplate::new().with_component("ColliderComponent", json!({}));
        let slot = EntityFactory::create_from_template(&mut arena, &components, &template).unwrap();
        let entity = arena.get(slot).unwrap();
        assert_eq!(entity.component_count(), 2);
        assert_eq!(entity.component::<Transform>(), Some(&Transform::default()));
    }

    #[test]
    fn unknown_and_malformed_components_are_skipped_or_defaulted() {
        let components = registry();
        let mut arena = Arena::new(1);
        let template = EntityTemplate::new()
            .with_component("NoSuchComponent", json!({}))
            .with_component("Recorder", json!({ "Tag": 12, "Weight": 2.5 }));
        let slot = EntityFactory::create_from_template(&mut arena, &components, &template).unwrap();
        let entity = arena.get(slot).unwrap();
        let recorder = entity.component::<Recorder>().unwrap();
        assert_eq!(recorder.tag, "");
        assert_eq!(recorder.weight, 2.5);
        assert!(entity.has_component::<Transform>());
        assert_eq!(entity.component_count(), 2);
    }

    #[test]
    fn missing_or_empty_path_yields_default_entity() {
        let components = registry();
        let mut arena = Arena::new(2);
        for path in [Path::new(""), Path::new("does/not/exist.json")] {
            let slot = EntityFactory::create(&mut arena, &components, path).unwrap();
            let entity = arena.get(slot).unwrap();
            assert_eq!(entity.component_count(), 1);
            assert!(entity.has_component::<Transform>());
        }
    }

    #[test]
    fn loads_template_file() {
        let components = registry();
        let dir = template_dir("factory_loads_template_file");
        let path = dir.join("crate.json");
        fs::write(
            &path,
            r#"{ "GameObject": { "Components": {
                "TransformComponent": { "Scale": { "x": 2.0, "y": 2.0, "z": 2.0 } },
                "ColliderComponent": { "Center": { "x": 0.0, "y": 1.0, "z": 0.0 } }
            } } }"#,
        )
        .unwrap();

        let mut arena = Arena::new(1);
        let slot = EntityFactory::create(&mut arena, &components, &path).unwrap();
        let entity = arena.get(slot).unwrap();
        assert_eq!(entity.component::<Transform>().unwrap().scale, Vec3::splat(2.0));
        assert_eq!(entity.component::<Collider>().unwrap().center.y, 1.0);
    }

    #[test]
    fn bad_json_file_yields_default_entity() {
        let components = registry();
        let dir = template_dir("factory_bad_json_file");
        let path = dir.join("broken.json");
        fs::write(&path, "{ not json").unwrap();

        let mut arena = Arena::new(1);
        let slot = EntityFactory::create(&mut arena, &components, &path).unwrap();
        assert_eq!(arena.get(slot).unwrap().component_count(), 1);
    }

    #[test]
    fn full_arena_returns_none() {
        let components = registry();
        let mut arena = Arena::new(1);
        assert!(EntityFactory::create(&mut arena, &components, Path::new("")).is_some());
        assert!(EntityFactory::create(&mut arena, &components, Path::new("")).is_none());
        assert_eq!(arena.len(), 1);
    }

    #[test]
    fn template_file_round_trip() {
        let dir = template_dir("factory_template_file_round_trip");
        let path = dir.join("saved.json");
        let template = EntityTemplate::new()
            .with_component("TransformComponent", json!({ "Position": { "x": 1.0 } }));
        template.save(&path).unwrap();
        assert_eq!(EntityTemplate::load(&path).unwrap(), template);
    }
}
