// SPDX-License-Identifier: MIT OR Apache-2.0
//! Named-property styling.
//!
//! Items expose their look as a flat set of named properties. A
//! [`StyleSheet`] maps a style key (`"Node"` or `"Node#output"`) to property
//! values and writes them through [`Styleable::set_property`], which runs the
//! same code as the typed setters, so layout follows automatically.

use crate::error::StyleError;
use crate::text::Font;
use egui::{Color32, Stroke};
use indexmap::IndexMap;

/// A value that can be read from or written to a styleable item
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    /// Flag
    Bool(bool),
    /// Integer
    Int(i64),
    /// Real number
    Float(f32),
    /// Text
    Text(String),
    /// Colour (brush)
    Color(Color32),
    /// Outline (pen)
    Stroke(Stroke),
    /// Font
    Font(Font),
}

impl PropertyValue {
    /// Interpret as a flag
    pub fn as_bool(&self, property: &str) -> Result<bool, StyleError> {
        match self {
            Self::Bool(b) => Ok(*b),
            Self::Int(i) => Ok(*i != 0),
            _ => Err(mismatch(property, "a bool")),
        }
    }

    /// Interpret as a real number
    pub fn as_f32(&self, property: &str) -> Result<f32, StyleError> {
        match self {
            Self::Float(f) => Ok(*f),
            Self::Int(i) => Ok(*i as f32),
            _ => Err(mismatch(property, "a number")),
        }
    }

    /// Interpret as an integer
    pub fn as_u32(&self, property: &str) -> Result<u32, StyleError> {
        match self {
            Self::Int(i) if *i >= 0 => Ok(u32::try_from(*i).unwrap_or(u32::MAX)),
            Self::Float(f) if *f >= 0.0 => Ok(f.round() as u32),
            _ => Err(mismatch(property, "a non-negative integer")),
        }
    }

    /// Interpret as text
    pub fn as_text(&self, property: &str) -> Result<String, StyleError> {
        match self {
            Self::Text(s) => Ok(s.clone()),
            _ => Err(mismatch(property, "text")),
        }
    }

    /// Interpret as a colour; a stroke yields its colour
    pub fn as_color(&self, property: &str) -> Result<Color32, StyleError> {
        match self {
            Self::Color(c) => Ok(*c),
            Self::Stroke(s) => Ok(s.color),
            _ => Err(mismatch(property, "a colour")),
        }
    }

    /// Interpret as a stroke
    pub fn as_stroke(&self, property: &str) -> Result<Stroke, StyleError> {
        match self {
            Self::Stroke(s) => Ok(*s),
            _ => Err(mismatch(property, "a stroke")),
        }
    }

    /// Interpret as a font
    pub fn as_font(&self, property: &str) -> Result<Font, StyleError> {
        match self {
            Self::Font(f) => Ok(f.clone()),
            _ => Err(mismatch(property, "a font")),
        }
    }
}

fn mismatch(property: &str, expected: &'static str) -> StyleError {
    StyleError::TypeMismatch {
        property: property.to_string(),
        expected,
    }
}

/// Capability of being targeted by a [`StyleSheet`]
pub trait Styleable {
    /// Class part of the style key, e.g. `"Node"`
    fn type_name(&self) -> &'static str;

    /// Instance part of the style key; empty when unnamed
    fn instance_name(&self) -> &str;

    /// Names of all readable/writable properties
    fn property_names(&self) -> &'static [&'static str];

    /// Read a property
    fn property(&self, name: &str) -> Option<PropertyValue>;

    /// Write a property through the item's normal setter
    fn set_property(&mut self, name: &str, value: &PropertyValue) -> Result<(), StyleError>;

    /// Full style key: `Type#name`, or `Type` when unnamed
    fn style_key(&self) -> String {
        let name = self.instance_name();
        if name.is_empty() {
            self.type_name().to_string()
        } else {
            format!("{}#{}", self.type_name(), name)
        }
    }
}

/// Property maps keyed by style key
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StyleSheet {
    entries: IndexMap<String, IndexMap<String, PropertyValue>>,
}

impl StyleSheet {
    /// Empty sheet
    pub fn new() -> Self {
        Self::default()
    }

    /// Set one property for a key, builder style
    pub fn with(mut self, key: impl Into<String>, property: impl Into<String>, value: PropertyValue) -> Self {
        self.set(key, property, value);
        self
    }

    /// Set one property for a key
    pub fn set(&mut self, key: impl Into<String>, property: impl Into<String>, value: PropertyValue) {
        self.entries
            .entry(key.into())
            .or_default()
            .insert(property.into(), value);
    }

    /// Property map for a key
    pub fn get(&self, key: &str) -> Option<&IndexMap<String, PropertyValue>> {
        self.entries.get(key)
    }

    /// Whether the sheet has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Apply the class map, then the instance map, to `item`.
    ///
    /// Returns the number of properties written. Properties the item does not
    /// know are skipped with a debug log rather than aborting the pass.
    pub fn apply(&self, item: &mut dyn Styleable) -> usize {
        let class_key = item.type_name().to_string();
        let instance_key = item.style_key();
        let mut written = 0;

        let mut keys = vec![class_key.as_str()];
        if instance_key != class_key {
            keys.push(instance_key.as_str());
        }

        for key in keys {
            let Some(properties) = self.entries.get(key) else {
                continue;
            };
            for (name, value) in properties {
                match item.set_property(name, value) {
                    Ok(()) => written += 1,
                    Err(err) => tracing::debug!("Style {key}: {err}"),
                }
            }
        }
        written
    }
}
