//! A minimal in-memory host: a document made of layers and channels plus an optional
//! rectangular selection.

use std::collections::BTreeMap;
use std::fmt;

use curvebend_image::{
    ops::{gray_alpha_to_rgba, gray_to_rgba, rgb_to_rgba},
    Image, ImageError, ImageSize,
};

use crate::error::BendError;

/// Identifier of a drawable inside a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DrawableId(pub u32);

impl fmt::Display for DrawableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Colour model of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageBase {
    /// Red, green and blue channels.
    #[default]
    Rgb,
    /// A single grey channel, stored replicated in the red, green and blue channels.
    Gray,
}

/// A layer with RGBA pixels placed on the document canvas.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    /// Layer name.
    pub name: String,
    /// Pixel data, always RGBA.
    pub pixels: Image<u8, 4>,
    /// Whether the alpha channel carries information; opaque layers have it at 255.
    pub has_alpha: bool,
    /// Position of the top left corner on the canvas.
    pub offsets: (i32, i32),
    /// Visibility flag.
    pub visible: bool,
    /// Whether the layer carries a layer mask.
    pub has_mask: bool,
}

impl Layer {
    /// A visible RGBA layer at the canvas origin.
    pub fn new(name: impl Into<String>, pixels: Image<u8, 4>) -> Self {
        Self {
            name: name.into(),
            pixels,
            has_alpha: true,
            offsets: (0, 0),
            visible: true,
            has_mask: false,
        }
    }

    /// An opaque layer from RGB pixels.
    pub fn from_rgb(name: impl Into<String>, pixels: &Image<u8, 3>) -> Result<Self, ImageError> {
        Ok(Self {
            has_alpha: false,
            ..Self::new(name, rgb_to_rgba(pixels)?)
        })
    }

    /// An opaque layer from grey pixels.
    pub fn from_gray(name: impl Into<String>, pixels: &Image<u8, 1>) -> Result<Self, ImageError> {
        Ok(Self {
            has_alpha: false,
            ..Self::new(name, gray_to_rgba(pixels)?)
        })
    }

    /// A layer from grey pixels with alpha.
    pub fn from_gray_alpha(
        name: impl Into<String>,
        pixels: &Image<u8, 2>,
    ) -> Result<Self, ImageError> {
        Ok(Self::new(name, gray_alpha_to_rgba(pixels)?))
    }

    /// Move the layer.
    pub fn with_offsets(mut self, x: i32, y: i32) -> Self {
        self.offsets = (x, y);
        self
    }

    /// Size of the layer in pixels.
    pub fn size(&self) -> ImageSize {
        self.pixels.size()
    }

    /// Canvas position of the layer centre, rounded down.
    pub fn center(&self) -> (i32, i32) {
        (
            self.offsets.0 + self.pixels.width() as i32 / 2,
            self.offsets.1 + self.pixels.height() as i32 / 2,
        )
    }

    /// Canvas rectangle covered by the layer.
    pub fn bounds(&self) -> Rect {
        Rect {
            x: self.offsets.0,
            y: self.offsets.1,
            width: self.pixels.width() as i32,
            height: self.pixels.height() as i32,
        }
    }
}

/// A single grey channel, e.g. a saved selection.
#[derive(Debug, Clone, PartialEq)]
pub struct Channel {
    /// Channel name.
    pub name: String,
    /// Channel values.
    pub pixels: Image<u8, 1>,
}

/// Anything a procedure can be called on.
#[derive(Debug, Clone, PartialEq)]
pub enum Drawable {
    /// A layer.
    Layer(Layer),
    /// A channel.
    Channel(Channel),
}

/// An axis aligned rectangle in canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    /// Left edge.
    pub x: i32,
    /// Top edge.
    pub y: i32,
    /// Width in pixels.
    pub width: i32,
    /// Height in pixels.
    pub height: i32,
}

impl Rect {
    /// Whether the rectangle covers no pixel.
    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// The common part of two rectangles, `None` when they do not overlap.
    pub fn intersect(&self, other: &Rect) -> Option<Rect> {
        let x1 = self.x.max(other.x);
        let y1 = self.y.max(other.y);
        let x2 = (self.x + self.width).min(other.x + other.width);
        let y2 = (self.y + self.height).min(other.y + other.height);
        let rect = Rect {
            x: x1,
            y: y1,
            width: x2 - x1,
            height: y2 - y1,
        };
        (!rect.is_empty()).then_some(rect)
    }
}

/// An image document: a colour model, a stack of drawables and an optional selection.
#[derive(Debug, Clone, Default)]
pub struct Document {
    base: ImageBase,
    drawables: BTreeMap<DrawableId, Drawable>,
    next_id: u32,
    selection: Option<Rect>,
}

impl Document {
    /// An empty document.
    pub fn new(base: ImageBase) -> Self {
        Self {
            base,
            ..Default::default()
        }
    }

    /// The colour model.
    pub fn base(&self) -> ImageBase {
        self.base
    }

    fn insert(&mut self, drawable: Drawable) -> DrawableId {
        let id = DrawableId(self.next_id);
        self.next_id += 1;
        self.drawables.insert(id, drawable);
        id
    }

    /// Add a layer on top of the stack.
    pub fn add_layer(&mut self, layer: Layer) -> DrawableId {
        self.insert(Drawable::Layer(layer))
    }

    /// Add a channel.
    pub fn add_channel(&mut self, channel: Channel) -> DrawableId {
        self.insert(Drawable::Channel(channel))
    }

    /// Look up a drawable.
    pub fn get(&self, id: DrawableId) -> Option<&Drawable> {
        self.drawables.get(&id)
    }

    /// Look up a layer, `None` for channels and unknown ids.
    pub fn layer(&self, id: DrawableId) -> Option<&Layer> {
        match self.drawables.get(&id) {
            Some(Drawable::Layer(layer)) => Some(layer),
            _ => None,
        }
    }

    /// Look up a layer mutably.
    pub fn layer_mut(&mut self, id: DrawableId) -> Option<&mut Layer> {
        match self.drawables.get_mut(&id) {
            Some(Drawable::Layer(layer)) => Some(layer),
            _ => None,
        }
    }

    /// Remove a drawable from the document.
    pub fn remove(&mut self, id: DrawableId) -> Option<Drawable> {
        self.drawables.remove(&id)
    }

    /// Ids of all layers from bottom to top.
    pub fn layer_ids(&self) -> Vec<DrawableId> {
        self.drawables
            .iter()
            .filter(|(_, d)| matches!(d, Drawable::Layer(_)))
            .map(|(&id, _)| id)
            .collect()
    }

    /// Select a rectangle, an empty rectangle clears the selection.
    pub fn select(&mut self, rect: Rect) {
        self.selection = (!rect.is_empty()).then_some(rect);
    }

    /// Clear the selection.
    pub fn select_none(&mut self) {
        self.selection = None;
    }

    /// The current selection.
    pub fn selection(&self) -> Option<Rect> {
        self.selection
    }

    /// Copy the selected part of a layer into a new floating layer and return its id.
    ///
    /// Without a selection the layer itself is returned.
    ///
    /// # Errors
    ///
    /// [`BendError::UnknownDrawable`] when `id` is not a layer and
    /// [`BendError::EmptySelection`] when the selection misses the layer.
    pub fn float_selection(&mut self, id: DrawableId) -> Result<DrawableId, BendError> {
        let Some(selection) = self.selection else {
            return Ok(id);
        };
        let layer = self.layer(id).ok_or(BendError::UnknownDrawable(id))?;
        let area = selection
            .intersect(&layer.bounds())
            .ok_or(BendError::EmptySelection)?;

        let mut pixels = Image::from_size_val(
            ImageSize {
                width: area.width as usize,
                height: area.height as usize,
            },
            0u8,
        )?;
        let (ox, oy) = (area.x - layer.offsets.0, area.y - layer.offsets.1);
        for y in 0..area.height {
            for x in 0..area.width {
                if let Some(px) = layer.pixels.pixel((ox + x) as i64, (oy + y) as i64) {
                    pixels.set_pixel(x as i64, y as i64, px);
                }
            }
        }

        let floating = Layer {
            name: "Floating Selection".to_string(),
            pixels,
            has_alpha: true,
            offsets: (area.x, area.y),
            visible: true,
            has_mask: false,
        };
        log::debug!("floated {area:?} of layer {id}");
        Ok(self.add_layer(floating))
    }
}
