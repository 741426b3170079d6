mod tiled;
mod tilemap;

pub use tilemap::{
    MapObject, ObjectLayer, ObjectPlacement, Properties, PropertyValue, TileLayer, Tilemap,
    TilemapError, Tileset,
};
