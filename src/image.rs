//! The marshaled image value and its calibration metadata.

pub mod bindata;
pub mod calibration;

pub use bindata::{ElementType, ImageArray, MarshalError};
pub use calibration::Calibration;

use crate::tags::TagMap;

/// One image extracted from a container: the pixel array plus everything
/// needed to interpret it physically.
///
/// `dimensional_calibrations` is aligned to the native axis order and is
/// either empty or exactly `data.ndim()` long, never partial. A value of
/// this type is only ever built whole; any marshaling failure discards the
/// entire image.
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    pub data: ImageArray,
    pub dimensional_calibrations: Vec<Calibration>,
    pub intensity_calibration: Calibration,
    pub title: Option<String>,
    pub properties: TagMap,
}

impl Image {
    /// Wrap an array with identity calibrations, no title and no properties.
    pub fn new(data: ImageArray) -> Self {
        Self {
            data,
            dimensional_calibrations: Vec::new(),
            intensity_calibration: Calibration::default(),
            title: None,
            properties: TagMap::new(),
        }
    }

    pub fn with_calibrations(
        mut self,
        dimensional: Vec<Calibration>,
        intensity: Calibration,
    ) -> Self {
        self.dimensional_calibrations = dimensional;
        self.intensity_calibration = intensity;
        self
    }

    pub fn with_title<S: Into<String>>(mut self, title: S) -> Self {
        self.title = Some(title.into());
        self
    }
}
