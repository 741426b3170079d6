//! Serde mirror of the Tiled JSON map format (`.tmj`).
//!
//! Only the subset the runtime consumes is modelled; unknown fields are
//! ignored so maps saved by newer editor versions still load.

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub(crate) struct RawMap {
    pub width: u32,
    pub height: u32,
    pub tilewidth: u32,
    pub tileheight: u32,
    #[serde(default = "default_orientation")]
    pub orientation: String,
    #[serde(default)]
    pub infinite: bool,
    #[serde(default)]
    pub layers: Vec<RawLayer>,
    #[serde(default)]
    pub tilesets: Vec<RawTileset>,
}

fn default_orientation() -> String {
    "orthogonal".to_string()
}

fn default_visible() -> bool {
    true
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
pub(crate) enum RawLayer {
    #[serde(rename = "tilelayer")]
    Tiles(RawTileLayer),
    #[serde(rename = "objectgroup")]
    Objects(RawObjectGroup),
    #[serde(rename = "imagelayer")]
    Image(RawImageLayer),
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawTileLayer {
    pub name: String,
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub data: Option<RawTileData>,
    #[serde(default)]
    pub encoding: Option<String>,
    #[serde(default = "default_visible")]
    pub visible: bool,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum RawTileData {
    Gids(Vec<u32>),
    Encoded(String),
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawObjectGroup {
    pub name: String,
    #[serde(default)]
    pub objects: Vec<RawObject>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawImageLayer {
    #[allow(dead_code)]
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawObject {
    #[serde(default)]
    pub id: u32,
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "type", alias = "class")]
    pub class: String,
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub width: f32,
    #[serde(default)]
    pub height: f32,
    #[serde(default)]
    pub gid: Option<u32>,
    #[serde(default)]
    pub point: bool,
    #[serde(default = "default_visible")]
    pub visible: bool,
    #[serde(default)]
    pub properties: Vec<RawProperty>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawProperty {
    pub name: String,
    pub value: serde_json::Value,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawTileset {
    pub firstgid: u32,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub tilecount: u32,
    #[serde(default)]
    pub columns: u32,
    #[serde(default)]
    pub tilewidth: u32,
    #[serde(default)]
    pub tileheight: u32,
    #[serde(default)]
    pub tiles: Vec<RawTile>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawTile {
    pub id: u32,
    #[serde(default)]
    pub properties: Vec<RawProperty>,
}
