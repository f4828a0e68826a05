use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{
    placement::Occupied,
    render::{FrameTargets, Surface},
    shape::ShapeEntity,
};

/// Default opacity of the bubble layer before any control value arrives.
pub const DEFAULT_BUBBLE_OPACITY: f32 = 0.9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LayerId {
    /// Growing shapes that hold until the next cycle wipes them.
    Persistent,
    /// Decaying bubbles, pruned one by one as they die.
    Bubbles,
}

#[derive(Debug, Clone)]
struct Layer {
    entities: Vec<ShapeEntity>,
    opacity: f32,
    /// Set when the layer was reset and its surface still shows old trails.
    stale_surface: bool,
}

impl Layer {
    fn new(opacity: f32) -> Self {
        Self {
            entities: Vec::new(),
            opacity,
            stale_surface: false,
        }
    }
}

/// Owns the live shapes of every layer and drives their per-frame update and
/// draw.
#[derive(Debug, Clone)]
pub struct SceneManager {
    persistent: Layer,
    bubbles: Layer,
}

impl Default for SceneManager {
    fn default() -> Self {
        Self {
            persistent: Layer::new(1.0),
            bubbles: Layer::new(DEFAULT_BUBBLE_OPACITY),
        }
    }
}

impl SceneManager {
    pub fn new() -> Self {
        Self::default()
    }

    fn layer_mut(&mut self, id: LayerId) -> &mut Layer {
        match id {
            LayerId::Persistent => &mut self.persistent,
            LayerId::Bubbles => &mut self.bubbles,
        }
    }

    fn layer_ref(&self, id: LayerId) -> &Layer {
        match id {
            LayerId::Persistent => &self.persistent,
            LayerId::Bubbles => &self.bubbles,
        }
    }

    pub fn push(&mut self, id: LayerId, entity: ShapeEntity) {
        self.layer_mut(id).entities.push(entity);
    }

    /// Swaps the layer's collection for an empty one.
    pub fn reset_layer(&mut self, id: LayerId) {
        let layer = self.layer_mut(id);
        layer.entities = Vec::new();
        layer.stale_surface = true;
    }

    pub fn set_opacity(&mut self, id: LayerId, opacity: f32) {
        self.layer_mut(id).opacity = opacity.clamp(0.0, 1.0);
    }

    pub fn opacity(&self, id: LayerId) -> f32 {
        self.layer_ref(id).opacity
    }

    pub fn entities(&self, id: LayerId) -> &[ShapeEntity] {
        &self.layer_ref(id).entities
    }

    pub fn len(&self) -> usize {
        self.persistent.entities.len() + self.bubbles.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bounding circles of a layer's shapes at the size they will settle at.
    pub fn occupied(&self, id: LayerId) -> Vec<Occupied> {
        self.layer_ref(id)
            .entities
            .iter()
            .map(|entity| Occupied::from_size(entity.position(), entity.max_size()))
            .collect()
    }

    /// Advances every shape to `now_ms` and drops the bubbles that died.
    pub fn update<R: Rng + ?Sized>(&mut self, now_ms: f64, rng: &mut R) {
        for entity in &mut self.persistent.entities {
            entity.update(now_ms, rng);
        }
        for entity in &mut self.bubbles.entities {
            entity.update(now_ms, rng);
        }
        self.bubbles.entities.retain(ShapeEntity::is_active);
    }

    /// Draws both layers onto their own targets, in insertion order.
    ///
    /// The main target is redrawn from scratch every frame. The bubble target
    /// keeps its contents so moving bubbles leave trails, and is only wiped
    /// after its layer was reset.
    pub fn draw(&mut self, targets: &mut FrameTargets<'_>) {
        if self.bubbles.stale_surface {
            targets.bubbles.clear();
            self.bubbles.stale_surface = false;
        }
        draw_layer(&self.bubbles, &mut *targets.bubbles);

        targets.main.clear();
        self.persistent.stale_surface = false;
        draw_layer(&self.persistent, &mut *targets.main);
    }

    pub fn frame<R: Rng + ?Sized>(
        &mut self,
        now_ms: f64,
        rng: &mut R,
        targets: &mut FrameTargets<'_>,
    ) {
        self.update(now_ms, rng);
        self.draw(targets);
    }
}

fn draw_layer(layer: &Layer, surface: &mut dyn Surface) {
    for entity in &layer.entities {
        entity.draw(surface, layer.opacity);
    }
}
