use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::math::Vec2;

use super::tiled::{RawLayer, RawMap, RawProperty, RawTileData, RawTileLayer, RawTileset};

/// Tiled stores horizontal/vertical/diagonal flip (and hex rotation) in the
/// top four bits of every gid.
const GID_FLAG_MASK: u32 = 0xF000_0000;

/// Pixel extents above this lose integer precision once converted to `f32`.
const MAX_PIXEL_EXTENT: u32 = 1 << 24;

#[derive(Debug, Error)]
pub enum TilemapError {
    #[error("failed to read tilemap {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed tilemap JSON at '{json_path}': {message}")]
    Json { json_path: String, message: String },
    #[error("unsupported map orientation '{0}'; only orthogonal maps are supported")]
    UnsupportedOrientation(String),
    #[error("infinite maps are not supported; disable 'Infinite' in the map properties")]
    InfiniteMap,
    #[error("tile layer '{layer}' uses unsupported encoding '{encoding}'; save layer data as CSV")]
    UnsupportedEncoding { layer: String, encoding: String },
    #[error("tileset '{0}' is external; embed tilesets in the map file")]
    ExternalTileset(String),
    #[error("tile count mismatch in layer '{layer}': expected {expected}, got {actual}")]
    TileCountMismatch {
        layer: String,
        expected: usize,
        actual: usize,
    },
    #[error("tile size must be non-zero, got {width}x{height}")]
    InvalidTileSize { width: u32, height: u32 },
    #[error("tile layer '{layer}' is {found_width}x{found_height} tiles but the map is {expected_width}x{expected_height}")]
    LayerSizeMismatch {
        layer: String,
        expected_width: u32,
        expected_height: u32,
        found_width: u32,
        found_height: u32,
    },
    #[error("map of {width}x{height} tiles at {tile_width}x{tile_height}px exceeds the largest supported map size")]
    MapTooLarge {
        width: u32,
        height: u32,
        tile_width: u32,
        tile_height: u32,
    },
    #[error("tile layer '{0}' not found")]
    MissingTileLayer(String),
    #[error("object layer '{0}' not found")]
    MissingObjectLayer(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

pub type Properties = BTreeMap<String, PropertyValue>;

#[derive(Debug, Clone)]
pub struct Tileset {
    pub name: String,
    pub first_gid: u32,
    pub tile_count: u32,
    pub columns: u32,
    pub tile_width: u32,
    pub tile_height: u32,
    pub image: Option<String>,
    tile_properties: HashMap<u32, Properties>,
}

impl Tileset {
    pub fn local_id(&self, gid: u32) -> Option<u32> {
        let gid = gid & !GID_FLAG_MASK;
        if gid < self.first_gid {
            return None;
        }
        let local = gid - self.first_gid;
        (self.tile_count == 0 || local < self.tile_count).then_some(local)
    }

    pub fn tile_properties(&self, local_id: u32) -> Option<&Properties> {
        self.tile_properties.get(&local_id)
    }
}

#[derive(Debug, Clone)]
pub struct TileLayer {
    name: String,
    width: u32,
    height: u32,
    visible: bool,
    gids: Vec<u32>,
    solid: Vec<bool>,
}

impl TileLayer {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn visible(&self) -> bool {
        self.visible
    }

    pub fn index_of(&self, x: u32, y: u32) -> Option<usize> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }

    /// Gid of the tile at a cell, with flip flags stripped. Empty cells are `None`.
    pub fn gid_at(&self, x: u32, y: u32) -> Option<u32> {
        let gid = self.gids.get(self.index_of(x, y)?).copied()? & !GID_FLAG_MASK;
        (gid != 0).then_some(gid)
    }

    /// Out-of-range cells are never solid; world bounds handle the map edge.
    pub fn is_solid(&self, x: i32, y: i32) -> bool {
        if x < 0 || y < 0 {
            return false;
        }
        self.index_of(x as u32, y as u32)
            .map(|index| self.solid[index])
            .unwrap_or(false)
    }

    pub fn solid_count(&self) -> usize {
        self.solid.iter().filter(|solid| **solid).count()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapObject {
    pub id: u32,
    pub name: String,
    pub class: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub gid: Option<u32>,
    pub point: bool,
    pub visible: bool,
    pub properties: Properties,
}

#[derive(Debug, Clone)]
pub struct ObjectLayer {
    pub name: String,
    pub objects: Vec<MapObject>,
}

/// Where a sprite created from a map object should sit. Positions are
/// centre-anchored.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectPlacement {
    pub object_id: u32,
    pub name: String,
    pub center: Vec2,
    pub size: Vec2,
    pub gid: Option<u32>,
    /// Frame index inside the gid's tileset image, if the object is a tile object.
    pub frame: Option<u32>,
    pub visible: bool,
}

#[derive(Debug, Clone)]
pub struct Tilemap {
    width: u32,
    height: u32,
    tile_width: u32,
    tile_height: u32,
    pixel_width: u32,
    pixel_height: u32,
    tile_layers: Vec<TileLayer>,
    object_layers: Vec<ObjectLayer>,
    tilesets: Vec<Tileset>,
}

impl Tilemap {
    pub fn load(path: &Path) -> Result<Self, TilemapError> {
        let raw = fs::read_to_string(path).map_err(|source| TilemapError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    pub fn from_json_str(raw: &str) -> Result<Self, TilemapError> {
        let mut deserializer = serde_json::Deserializer::from_str(raw);
        let map: RawMap = serde_path_to_error::deserialize(&mut deserializer).map_err(|error| {
            TilemapError::Json {
                json_path: error.path().to_string(),
                message: error.inner().to_string(),
            }
        })?;
        Self::from_raw(map)
    }

    fn from_raw(raw: RawMap) -> Result<Self, TilemapError> {
        if raw.orientation != "orthogonal" {
            return Err(TilemapError::UnsupportedOrientation(raw.orientation));
        }
        if raw.infinite {
            return Err(TilemapError::InfiniteMap);
        }
        if raw.tilewidth == 0 || raw.tileheight == 0 {
            return Err(TilemapError::InvalidTileSize {
                width: raw.tilewidth,
                height: raw.tileheight,
            });
        }
        let too_large = || TilemapError::MapTooLarge {
            width: raw.width,
            height: raw.height,
            tile_width: raw.tilewidth,
            tile_height: raw.tileheight,
        };
        let pixel_width = raw
            .width
            .checked_mul(raw.tilewidth)
            .filter(|extent| *extent <= MAX_PIXEL_EXTENT)
            .ok_or_else(too_large)?;
        let pixel_height = raw
            .height
            .checked_mul(raw.tileheight)
            .filter(|extent| *extent <= MAX_PIXEL_EXTENT)
            .ok_or_else(too_large)?;

        let mut tilesets = raw
            .tilesets
            .into_iter()
            .map(convert_tileset)
            .collect::<Result<Vec<_>, _>>()?;
        tilesets.sort_by_key(|tileset| tileset.first_gid);

        let mut tile_layers = Vec::new();
        let mut object_layers = Vec::new();
        for layer in raw.layers {
            match layer {
                RawLayer::Tiles(layer) => {
                    if (layer.width, layer.height) != (raw.width, raw.height) {
                        return Err(TilemapError::LayerSizeMismatch {
                            layer: layer.name,
                            expected_width: raw.width,
                            expected_height: raw.height,
                            found_width: layer.width,
                            found_height: layer.height,
                        });
                    }
                    tile_layers.push(convert_tile_layer(layer)?)
                }
                RawLayer::Objects(group) => object_layers.push(ObjectLayer {
                    name: group.name,
                    objects: group
                        .objects
                        .into_iter()
                        .map(|object| MapObject {
                            id: object.id,
                            name: object.name,
                            class: object.class,
                            x: object.x,
                            y: object.y,
                            width: object.width,
                            height: object.height,
                            gid: object.gid.map(|gid| gid & !GID_FLAG_MASK),
                            point: object.point,
                            visible: object.visible,
                            properties: convert_properties(object.properties),
                        })
                        .collect(),
                }),
                RawLayer::Image(_) => {}
            }
        }

        Ok(Self {
            width: raw.width,
            height: raw.height,
            tile_width: raw.tilewidth,
            tile_height: raw.tileheight,
            pixel_width,
            pixel_height,
            tile_layers,
            object_layers,
            tilesets,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn tile_size(&self) -> Vec2 {
        Vec2::new(self.tile_width as f32, self.tile_height as f32)
    }

    pub fn width_in_pixels(&self) -> f32 {
        self.pixel_width as f32
    }

    pub fn height_in_pixels(&self) -> f32 {
        self.pixel_height as f32
    }

    pub fn tile_layers(&self) -> &[TileLayer] {
        &self.tile_layers
    }

    pub fn tile_layer(&self, name: &str) -> Option<&TileLayer> {
        self.tile_layers.iter().find(|layer| layer.name == name)
    }

    pub fn object_layer(&self, name: &str) -> Option<&ObjectLayer> {
        self.object_layers.iter().find(|layer| layer.name == name)
    }

    pub fn tilesets(&self) -> &[Tileset] {
        &self.tilesets
    }

    pub fn tileset_by_name(&self, name: &str) -> Option<&Tileset> {
        self.tilesets.iter().find(|tileset| tileset.name == name)
    }

    /// Resolves a gid to its tileset and local frame index.
    pub fn tileset_for_gid(&self, gid: u32) -> Option<(&Tileset, u32)> {
        self.tilesets
            .iter()
            .rev()
            .find_map(|tileset| tileset.local_id(gid).map(|local| (tileset, local)))
    }

    /// Marks every tile of `layer` whose tileset properties contain
    /// `property == value` as solid. Returns the number of solid cells.
    pub fn set_collision_by_property(
        &mut self,
        layer: &str,
        property: &str,
        value: impl Into<PropertyValue>,
    ) -> Result<usize, TilemapError> {
        let value = value.into();
        let index = self
            .tile_layers
            .iter()
            .position(|candidate| candidate.name == layer)
            .ok_or_else(|| TilemapError::MissingTileLayer(layer.to_string()))?;

        let mut solid = std::mem::take(&mut self.tile_layers[index].solid);
        for (cell, gid) in self.tile_layers[index].gids.iter().enumerate() {
            let gid = gid & !GID_FLAG_MASK;
            if gid == 0 {
                continue;
            }
            let matches = self
                .tileset_for_gid(gid)
                .and_then(|(tileset, local)| tileset.tile_properties(local))
                .and_then(|properties| properties.get(property))
                .is_some_and(|found| *found == value);
            if matches {
                solid[cell] = true;
            }
        }
        let layer = &mut self.tile_layers[index];
        layer.solid = solid;
        Ok(layer.solid_count())
    }

    pub fn find_object(
        &self,
        layer: &str,
        mut predicate: impl FnMut(&MapObject) -> bool,
    ) -> Option<&MapObject> {
        self.object_layer(layer)?
            .objects
            .iter()
            .find(|object| predicate(*object))
    }

    /// Placements for every object named `name` in `layer`. Tile objects are
    /// bottom-left anchored in the editor, plain shapes are top-left anchored.
    pub fn create_from_objects(
        &self,
        layer: &str,
        name: &str,
    ) -> Result<Vec<ObjectPlacement>, TilemapError> {
        let layer = self
            .object_layer(layer)
            .ok_or_else(|| TilemapError::MissingObjectLayer(layer.to_string()))?;

        Ok(layer
            .objects
            .iter()
            .filter(|object| object.name == name)
            .map(|object| {
                let size = Vec2::new(object.width, object.height);
                let center = match object.gid {
                    Some(_) => Vec2::new(object.x + size.x * 0.5, object.y - size.y * 0.5),
                    None => Vec2::new(object.x + size.x * 0.5, object.y + size.y * 0.5),
                };
                ObjectPlacement {
                    object_id: object.id,
                    name: object.name.clone(),
                    center,
                    size,
                    gid: object.gid,
                    frame: object
                        .gid
                        .and_then(|gid| self.tileset_for_gid(gid))
                        .map(|(_, local)| local),
                    visible: object.visible,
                }
            })
            .collect())
    }
}

fn convert_tileset(raw: RawTileset) -> Result<Tileset, TilemapError> {
    if let Some(source) = raw.source {
        return Err(TilemapError::ExternalTileset(source));
    }
    let tile_properties = raw
        .tiles
        .into_iter()
        .filter(|tile| !tile.properties.is_empty())
        .map(|tile| (tile.id, convert_properties(tile.properties)))
        .collect();
    Ok(Tileset {
        name: raw.name,
        first_gid: raw.firstgid,
        tile_count: raw.tilecount,
        columns: raw.columns,
        tile_width: raw.tilewidth,
        tile_height: raw.tileheight,
        image: raw.image,
        tile_properties,
    })
}

fn convert_tile_layer(raw: RawTileLayer) -> Result<TileLayer, TilemapError> {
    let gids = match (raw.data, raw.encoding) {
        (_, Some(encoding)) if encoding != "csv" => {
            return Err(TilemapError::UnsupportedEncoding {
                layer: raw.name,
                encoding,
            })
        }
        (Some(RawTileData::Gids(gids)), _) => gids,
        (Some(RawTileData::Encoded(_)), _) => {
            return Err(TilemapError::UnsupportedEncoding {
                layer: raw.name,
                encoding: "base64".to_string(),
            })
        }
        (None, _) => Vec::new(),
    };

    let expected = raw.width as usize * raw.height as usize;
    if gids.len() != expected {
        return Err(TilemapError::TileCountMismatch {
            layer: raw.name,
            expected,
            actual: gids.len(),
        });
    }

    Ok(TileLayer {
        name: raw.name,
        width: raw.width,
        height: raw.height,
        visible: raw.visible,
        solid: vec![false; gids.len()],
        gids,
    })
}

fn convert_properties(raw: Vec<RawProperty>) -> Properties {
    raw.into_iter()
        .filter_map(|property| {
            let value = match property.value {
                serde_json::Value::Bool(value) => PropertyValue::Bool(value),
                serde_json::Value::Number(number) => match number.as_i64() {
                    Some(int) => PropertyValue::Int(int),
                    None => PropertyValue::Float(number.as_f64()?),
                },
                serde_json::Value::String(text) => PropertyValue::Text(text),
                _ => return None,
            };
            Some((property.name, value))
        })
        .collect()
}
