//! Hover tooltip state.
//!
//! Two states: hidden (opacity 0, no content) and visible (opacity 0.7, placed
//! at the pointer). The render pipeline owns the state; pointer handlers only
//! mutate it through [`Tooltip::enter`] and [`Tooltip::leave`].

use crate::error::ChoroplethError;
use crate::types::EducationRecord;
use serde::Serialize;
use tracing::warn;

pub const VISIBLE_OPACITY: f64 = 0.7;
/// Tooltip is lifted this far above the pointer.
pub const POINTER_OFFSET_Y: f64 = 32.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pointer {
    pub page_x: f64,
    pub page_y: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum Tooltip {
    #[default]
    Hidden,
    Visible {
        text: String,
        /// Raw attribute value mirrored into `data-education`
        education: f64,
        top: f64,
        left: f64,
    },
}

/// Text shown for a region, e.g. `Autauga, AL: 21.3%`.
pub fn label(record: &EducationRecord) -> String {
    format!(
        "{}, {}: {}%",
        record.area_name, record.state, record.bachelors_or_higher
    )
}

impl Tooltip {
    /// Pointer entered a region. Replaces whatever was shown before.
    ///
    /// A region without a record leaves the tooltip hidden and reports
    /// [`ChoroplethError::MissingRecord`].
    pub fn enter(
        &mut self,
        fips: Option<u32>,
        record: Option<&EducationRecord>,
        pointer: Pointer,
    ) -> Result<(), ChoroplethError> {
        let Some(record) = record else {
            warn!(?fips, "hovered region has no education record");
            *self = Tooltip::Hidden;
            return Err(ChoroplethError::MissingRecord { fips });
        };

        *self = Tooltip::Visible {
            text: label(record),
            education: record.bachelors_or_higher,
            top: pointer.page_y - POINTER_OFFSET_Y,
            left: pointer.page_x,
        };
        Ok(())
    }

    pub fn leave(&mut self) {
        *self = Tooltip::Hidden;
    }

    pub fn opacity(&self) -> f64 {
        match self {
            Tooltip::Hidden => 0.0,
            Tooltip::Visible { .. } => VISIBLE_OPACITY,
        }
    }

    pub fn text(&self) -> &str {
        match self {
            Tooltip::Hidden => "",
            Tooltip::Visible { text, .. } => text,
        }
    }

    /// Value for the `data-education` attribute, empty when hidden.
    pub fn data_education(&self) -> String {
        match self {
            Tooltip::Hidden => String::new(),
            Tooltip::Visible { education, .. } => education.to_string(),
        }
    }

    pub fn is_visible(&self) -> bool {
        matches!(self, Tooltip::Visible { .. })
    }
}
