//! Shared fixtures for unit tests.

use std::cell::RefCell;
use std::path::PathBuf;
use std::sync::OnceLock;

use tessera_meta::MetaRegistry;

use crate::component::{Component, ComponentContext};
use crate::factory::EntityTemplate;
use crate::handle::Handle;
use crate::transform::Transform;

thread_local! {
    static EVENTS: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
}

fn record(event: String) {
    EVENTS.with(|events| events.borrow_mut().push(event));
}

/// Lifecycle events recorded on this thread so far.
pub(crate) fn events() -> Vec<String> {
    EVENTS.with(|events| events.borrow().clone())
}

pub(crate) fn reset_events() {
    EVENTS.with(|events| events.borrow_mut().clear());
}

/// Install the process-wide reflection registry once for every test.
pub(crate) fn install_registry() {
    static INSTALLED: OnceLock<()> = OnceLock::new();
    INSTALLED.get_or_init(|| {
        let mut registry = MetaRegistry::new();
        crate::register_builtins(&mut registry).register::<Recorder>();
        registry.install().expect("registry installed once per test binary");
    });
}

/// A fresh per-test directory under the system temp dir.
pub(crate) fn template_dir(test: &str) -> PathBuf {
    let dir = std::env::temp_dir()
        .join(format!("tessera-world-{}", std::process::id()))
        .join(test);
    std::fs::create_dir_all(&dir).expect("create test directory");
    dir
}

// ---------------------------------------------------------------------------
// Recorder
// ---------------------------------------------------------------------------

/// Records its lifecycle into the thread's event log.
#[derive(Debug, Default)]
pub(crate) struct Recorder {
    pub tag: String,
    pub weight: f32,
    pub seen_owner: Handle,
    pub seen_name: String,
    pub seen_position: Option<f32>,
}

tessera_meta::reflect_class!(Recorder as "Recorder" {
    tag => "Tag",
    weight => "Weight",
});

impl Component for Recorder {
    fn initialize(&mut self, ctx: &mut ComponentContext<'_>) {
        self.seen_owner = ctx.owner();
        self.seen_name = ctx
            .owner_entity()
            .map(|entity| entity.name().to_owned())
            .unwrap_or_default();
        self.seen_position = ctx.sibling::<Transform>().map(|t| t.position.x);
        record(format!("init {}", self.tag));
    }

    fn update(&mut self, _ctx: &mut ComponentContext<'_>, _delta_time: f32) {
        record(format!("update {}", self.tag));
    }

    fn terminate(&mut self) {
        record(format!("terminate {}", self.tag));
    }
}

// ---------------------------------------------------------------------------
// Destroyer / Spawner
// ---------------------------------------------------------------------------

/// Destroys `target` on every update.
pub(crate) struct Destroyer {
    target: Handle,
}

impl Destroyer {
    pub fn new(target: Handle) -> Self {
        Self { target }
    }
}

impl Component for Destroyer {
    fn update(&mut self, ctx: &mut ComponentContext<'_>, _delta_time: f32) {
        ctx.destroy(self.target);
    }
}

/// Creates one entity on its first update.
pub(crate) struct Spawner {
    template: EntityTemplate,
    name: String,
    spawned: Option<Handle>,
}

impl Spawner {
    pub fn new(template: EntityTemplate, name: &str) -> Self {
        Self {
            template,
            name: name.to_owned(),
            spawned: None,
        }
    }
}

impl Component for Spawner {
    fn update(&mut self, ctx: &mut ComponentContext<'_>, _delta_time: f32) {
        if self.spawned.is_none() {
            self.spawned = Some(ctx.create_from_template(&self.template, self.name.clone()));
        }
    }
}
