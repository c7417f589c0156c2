use serde::{Deserialize, Serialize};

/// Pixel rectangle of a detected face inside the thumbnail it was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
    pub left: i32,
}

/// One face row to persist. `seq` numbers faces 0..N-1 within an asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewFace {
    pub asset_id: i64,
    pub seq: i32,
    pub bounding_box: BoundingBox,
    pub encoding: Vec<f32>,
}
