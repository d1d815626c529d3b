//! Serde model of PoseTrack `annolist` files.
//!
//! Scalar fields are usually wrapped in single-element arrays (`"x": [12.5]`),
//! but bare scalars are accepted too.

use serde::Deserialize;

/// A value written either as `v` or as `[v, ...]`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    pub(crate) fn first(&self) -> Option<&T> {
        match self {
            OneOrMany::One(v) => Some(v),
            OneOrMany::Many(vs) => vs.first(),
        }
    }
}

/// Get the first wrapped value of an optional field.
pub(crate) fn first<T: Copy>(field: &Option<OneOrMany<T>>) -> Option<T> {
    field.as_ref().and_then(|v| v.first()).copied()
}

/// `is_labeled` appears both as booleans and as 0/1.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(untagged)]
pub(crate) enum Flag {
    Bool(bool),
    Number(f64),
}

impl Flag {
    pub(crate) fn is_set(self) -> bool {
        match self {
            Flag::Bool(b) => b,
            Flag::Number(n) => n != 0.0,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct AnnotationFile {
    pub annolist: Vec<AnnotatedImage>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AnnotatedImage {
    #[serde(default)]
    pub image: Option<OneOrMany<ImageName>>,
    #[serde(default)]
    pub annorect: Option<Vec<AnnoRect>>,
    #[serde(default)]
    pub is_labeled: Option<OneOrMany<Flag>>,
    #[serde(default)]
    pub ignore_regions: Option<Vec<IgnoreRegion>>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ImageName {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AnnoRect {
    #[serde(default)]
    pub x1: Option<OneOrMany<f64>>,
    #[serde(default)]
    pub y1: Option<OneOrMany<f64>>,
    #[serde(default)]
    pub x2: Option<OneOrMany<f64>>,
    #[serde(default)]
    pub y2: Option<OneOrMany<f64>>,
    #[serde(default)]
    pub score: Option<OneOrMany<f64>>,
    #[serde(default)]
    pub track_id: Option<OneOrMany<i64>>,
    #[serde(default)]
    pub annopoints: Option<OneOrMany<AnnoPoints>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AnnoPoints {
    #[serde(default)]
    pub point: Option<Vec<AnnoPoint>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AnnoPoint {
    pub id: OneOrMany<i64>,
    pub x: OneOrMany<f64>,
    pub y: OneOrMany<f64>,
    #[serde(default)]
    pub score: Option<OneOrMany<f64>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct IgnoreRegion {
    #[serde(default)]
    pub point: Option<Vec<RegionPoint>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RegionPoint {
    pub x: OneOrMany<f64>,
    pub y: OneOrMany<f64>,
}
