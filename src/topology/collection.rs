//! The set of entities shown in one topology view.
//!
//! `EntityCollection` deduplicates entities as discovery data arrives,
//! restores and saves their screen positions, keeps geographic pins in sync
//! with a background map, and hands the layout engine its per-type physics.
//!
//! Insertion order is display and simulation order; entities are never
//! reordered once added. A new view gets a new collection.

use serde_json::{Map, Value};
use std::f64::consts::PI;

use super::entity::{product, Entity, EntityInit};
use super::types::{self, NodeType, GRAVITY_RANGE};
use super::TopologyError;
use crate::discovery::{name_from_id, node_type_from_id, DiscoverySnapshot};
use crate::geo::Projection;
use crate::positions::{PositionStore, PositionStoreError, SavedPosition};

/// Starting offset used to pull saved positions that fall below the canvas back into view
const WRAP_Y_INIT: f64 = 50.0;
const WRAP_Y_BASE: f64 = 200.0;

/// Result of [`EntityCollection::get_or_create`]
#[derive(Debug)]
pub enum Lookup<'a> {
    /// An entity with the same name or container is already in the collection
    Existing(&'a mut Entity),
    /// A freshly built entity, not yet added
    New(Entity),
}

/// Where a merged client connection was found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalsPosition {
    pub collection_index: usize,
    pub normals_index: usize,
}

/// Ordered, deduplicated set of topology entities
#[derive(Debug, Clone, Default)]
pub struct EntityCollection {
    entities: Vec<Entity>,
}

impl EntityCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Entity> {
        self.entities.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Entity> {
        self.entities.iter_mut()
    }

    /// Entity at `index`; an out-of-range index is logged
    pub fn get(&self, index: usize) -> Option<&Entity> {
        let entity = self.entities.get(index);
        if entity.is_none() {
            log::error!(
                "Attempted to get entity[{}] but there were only {} entities",
                index,
                self.len()
            );
        }
        entity
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Entity> {
        let len = self.len();
        let entity = self.entities.get_mut(index);
        if entity.is_none() {
            log::error!("Attempted to get entity[{}] but there were only {} entities", index, len);
        }
        entity
    }

    /// Entity with the given display name
    pub fn node_for(&self, name: &str) -> Option<&Entity> {
        self.entities.iter().find(|e| e.name == name)
    }

    // Physical parameters

    /// Radius for a node type name, 15 for unknown names
    pub fn radius(type_name: &str) -> f64 {
        types::radius_for(type_name)
    }

    pub fn max_radius() -> f64 {
        types::max_radius()
    }

    pub fn discrete_radii() -> Vec<f64> {
        types::discrete_radii()
    }

    pub fn force_scale(node_count: usize, range: (f64, f64)) -> f64 {
        types::force_scale(node_count, range)
    }

    /// Link distance for a link ending at `target`
    pub fn link_distance(target: &Entity, node_count: usize) -> f64 {
        types::force_scale(node_count, target.node_type.params().link_distance)
    }

    pub fn charge(entity: &Entity, node_count: usize) -> f64 {
        types::force_scale(node_count, entity.node_type.params().charge)
    }

    /// Gravity does not depend on the entity's type
    pub fn gravity(_entity: &Entity, node_count: usize) -> f64 {
        types::force_scale(node_count, GRAVITY_RANGE)
    }

    // Lookup and creation

    fn position_of(&self, container: &str, name: &str) -> Option<usize> {
        self.entities
            .iter()
            .position(|e| e.name == name || e.container == container)
    }

    /// Index of the first match, replacing its properties when a product is supplied
    fn find_index(
        &mut self,
        container: &str,
        properties: Option<&Map<String, Value>>,
        name: &str,
    ) -> Option<usize> {
        let index = self.position_of(container, name)?;
        if let Some(properties) = properties.filter(|p| product(p).is_some()) {
            self.entities[index].properties = properties.clone();
        }
        Some(index)
    }

    /// First entity whose name or container matches.
    ///
    /// When found and `properties` carries a `product`, the entity's
    /// properties are replaced wholesale. A miss changes nothing.
    pub fn find(
        &mut self,
        container: &str,
        properties: Option<&Map<String, Value>>,
        name: &str,
    ) -> Option<&mut Entity> {
        let index = self.find_index(container, properties, name)?;
        Some(&mut self.entities[index])
    }

    fn create(init: EntityInit) -> Entity {
        let router_id = match name_from_id(&init.key) {
            Ok(router_id) => router_id,
            Err(_) => {
                log::debug!("Entity key {} is not a router address, owning router is {}", init.key, init.name);
                init.name.clone()
            }
        };
        Entity::new(init, router_id)
    }

    /// Reuse the matching entity, or build a new one without adding it
    pub fn get_or_create(&mut self, init: EntityInit) -> Lookup<'_> {
        if let Some(i) = self.find_index(&init.container, Some(&init.properties), &init.name) {
            return Lookup::Existing(&mut self.entities[i]);
        }
        Lookup::New(Self::create(init))
    }

    /// Append an entity and return it
    pub fn add(&mut self, entity: Entity) -> &mut Entity {
        self.entities.push(entity);
        let last = self.entities.len() - 1;
        &mut self.entities[last]
    }

    /// Add an entity unless one with the same name or container exists.
    ///
    /// Returns the existing entity on a match, otherwise the new one.
    pub fn add_using(&mut self, init: EntityInit) -> &mut Entity {
        if let Some(i) = self.find_index(&init.container, Some(&init.properties), &init.name) {
            return &mut self.entities[i];
        }
        self.add(Self::create(init))
    }

    /// Index of the entity created from `container`
    pub fn node_exists(&self, container: &str) -> Option<usize> {
        self.entities.iter().position(|e| e.container == container)
    }

    /// Locate a merged client connection by its container.
    ///
    /// A match is skipped when the entity's index equals the connection's
    /// index inside that entity's `normals`. Those indices come from
    /// unrelated ranges; the check is kept as-is for compatibility with
    /// existing callers.
    pub fn normals_exists(&self, container: &str) -> Option<NormalsPosition> {
        self.entities.iter().enumerate().find_map(|(i, entity)| {
            entity
                .normals
                .as_ref()?
                .iter()
                .enumerate()
                .find(|(j, normal)| normal.container == container && i != *j)
                .map(|(j, _)| NormalsPosition {
                    collection_index: i,
                    normals_index: j,
                })
        })
    }

    /// Pin or unpin the entity called `name`; unpinning forgets its geography
    pub fn set_fixed(&mut self, name: &str, fixed: bool) {
        if let Some(entity) = self.entities.iter_mut().find(|e| e.name == name) {
            entity.fixed = fixed;
            if !fixed {
                entity.lon = None;
                entity.lat = None;
            }
        }
    }

    pub fn clear_highlighted(&mut self) {
        for entity in self.entities.iter_mut() {
            entity.highlighted = false;
        }
    }

    /// Indices selected by `subset`, or every index. Out-of-range indices are logged and skipped.
    fn selected(&self, subset: Option<&[usize]>) -> Vec<usize> {
        match subset {
            None => (0..self.len()).collect(),
            Some(indices) => indices
                .iter()
                .copied()
                .filter(|&i| self.get(i).is_some())
                .collect(),
        }
    }

    /// Persist rounded positions for `subset` (default: every entity)
    pub fn save_positions<S>(&self, store: &mut S, subset: Option<&[usize]>) -> Result<(), PositionStoreError>
    where
        S: PositionStore + ?Sized,
    {
        let selected = self.selected(subset);
        for &i in &selected {
            let entity = &self.entities[i];
            let position = SavedPosition::new(entity.x.round(), entity.y.round(), entity.fixed)
                .with_lon_lat(entity.lon, entity.lat);
            store.save(&entity.name, &position)?;
        }
        log::debug!("Saved {} entity positions", selected.len());
        Ok(())
    }

    /// Record lon/lat for pinned entities in `subset`; unpinned ones lose theirs
    pub fn save_lon_lat(&mut self, projection: Option<&dyn Projection>, subset: Option<&[usize]>) {
        let Some(projection) = projection else {
            return;
        };
        for i in self.selected(subset) {
            let entity = &mut self.entities[i];
            if entity.fixed {
                if let Some((lon, lat)) = projection.to_lon_lat(entity.x, entity.y) {
                    entity.lon = Some(lon);
                    entity.lat = Some(lat);
                }
            } else {
                entity.lon = None;
                entity.lat = None;
            }
        }
    }

    /// Move every entity with a geographic pin to its projected screen position
    pub fn set_xy(&mut self, projection: Option<&dyn Projection>) {
        let Some(projection) = projection else {
            return;
        };
        for entity in self.entities.iter_mut() {
            let (Some(lon), Some(lat)) = (entity.lon, entity.lat) else {
                continue;
            };
            if let Some((x, y)) = projection.to_xy(lon, lat) {
                entity.x = x;
                entity.px = x;
                entity.y = y;
                entity.py = y;
            }
        }
    }

    /// Populate the collection from a discovery snapshot.
    ///
    /// Saved positions are restored from `store`, along with the geographic
    /// pin of fixed entities, so `set_xy` can re-project them onto a canvas of
    /// a different size. Entities without a saved position are
    /// spread across the canvas and the pass is flagged for animation; the
    /// returned flag tells the caller whether the layout needs to settle.
    /// Every id is validated before anything is added.
    pub fn initialize<S>(
        &mut self,
        snapshot: &DiscoverySnapshot,
        store: &S,
        width: f64,
        height: f64,
    ) -> Result<bool, TopologyError>
    where
        S: PositionStore + ?Sized,
    {
        let discovered = snapshot
            .keys()
            .map(|id| -> Result<(&String, String, NodeType), TopologyError> {
                Ok((id, name_from_id(id)?, node_type_from_id(id)?))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let node_count = discovered.len() as f64;
        let mut y_init = WRAP_Y_INIT;
        let mut animate = false;

        for (id, name, node_type) in discovered {
            let placed = self.len() as f64;
            let mut position = match store.load(&name) {
                Some(position) => position,
                None => {
                    animate = true;
                    SavedPosition::new(
                        (width / 4.0 + (width / 2.0) / node_count * placed).round(),
                        (height / 2.0 + (placed / (PI * 2.0)).sin() * height / 4.0).round(),
                        false,
                    )
                }
            };
            if position.y > height {
                position.y = WRAP_Y_BASE - y_init;
                y_init = -y_init;
            }

            let sequence_index = self.len();
            let entity = self.add_using(EntityInit {
                key: id.clone(),
                name: name.clone(),
                node_type,
                properties: Map::new(),
                x: position.x,
                y: position.y,
                sequence_index,
                result_index: None,
                fixed: position.fixed,
                container: name,
            });
            if position.fixed {
                entity.lon = position.lon;
                entity.lat = position.lat;
            }
        }

        log::debug!("Initialized topology with {} entities (animate: {})", self.len(), animate);
        Ok(animate)
    }
}

impl<'a> IntoIterator for &'a EntityCollection {
    type Item = &'a Entity;
    type IntoIter = std::slice::Iter<'a, Entity>;

    fn into_iter(self) -> Self::IntoIter {
        self.entities.iter()
    }
}
